//! Mutable session configuration.
//!
//! Mirrors the small-value-type style of the protocol crate's own format
//! types: a plain struct plus a `validate` that rejects nonsensical
//! values up front, rather than discovering them mid-session.

use core::net::Ipv4Addr;
use thiserror::Error;

/// Configuration for one endpoint session.
///
/// `peer_ip`, `peer_port`, and `local_block_size` require a full session
/// restart to take effect; `oneshot_mode` and `passthrough_test` are
/// live-tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Destination for outbound packets.
    pub peer_ip: Ipv4Addr,
    /// Destination port; the local bind port always matches it.
    pub peer_port: u16,
    /// Local host's callback chunk size, in samples. Affects
    /// segmentation.
    pub local_block_size: u16,
    /// Selects the oneshot path (`true`) or the ping-pong path (`false`).
    pub oneshot_mode: bool,
    /// Bypasses the wire entirely, copying input straight to both
    /// outputs.
    pub passthrough_test: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            peer_ip: Ipv4Addr::new(127, 0, 0, 1),
            peer_port: DEFAULT_PORT,
            local_block_size: 128,
            oneshot_mode: false,
            passthrough_test: false,
        }
    }
}

/// Default UDP port both endpoints bind to and send to by default.
pub const DEFAULT_PORT: u16 = 8321;

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("local block size {0} exceeds the maximum chunk size of {max}", max = pwar_proto::MAX_CHUNK_SAMPLES)]
    BlockSizeTooLarge(u16),
    #[error("local block size must be non-zero")]
    ZeroBlockSize,
    #[error("peer port must be non-zero")]
    ZeroPort,
}

impl Config {
    /// Validates that this configuration can be used to start a session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.local_block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        if self.local_block_size as usize > pwar_proto::MAX_CHUNK_SAMPLES {
            return Err(ConfigError::BlockSizeTooLarge(self.local_block_size));
        }
        if self.peer_port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        Ok(())
    }

    /// Whether moving from `self` to `new` requires a full session
    /// restart (a change to peer IP, peer port, or local block size).
    pub fn diff_requires_restart(&self, new: &Config) -> bool {
        self.peer_ip != new.peer_ip
            || self.peer_port != new.peer_port
            || self.local_block_size != new.local_block_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_oversized_block() {
        let mut c = Config::default();
        c.local_block_size = pwar_proto::MAX_CHUNK_SAMPLES as u16 + 1;
        assert_eq!(
            c.validate(),
            Err(ConfigError::BlockSizeTooLarge(c.local_block_size))
        );
    }

    #[test]
    fn only_restart_fields_trigger_restart() {
        let a = Config::default();
        let mut b = a;
        b.oneshot_mode = !a.oneshot_mode;
        b.passthrough_test = !a.passthrough_test;
        assert!(!a.diff_requires_restart(&b));

        let mut c = a;
        c.local_block_size += 1;
        assert!(a.diff_requires_restart(&c));
    }
}
