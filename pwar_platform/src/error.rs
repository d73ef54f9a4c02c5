use thiserror::Error;

/// Failures from the platform port: socket setup, scheduling requests,
/// and the small amount of OS-specific plumbing around them.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("failed to bind UDP socket on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to configure socket buffer: {0}")]
    SocketConfig(#[source] std::io::Error),

    #[error("failed to spawn thread {name:?}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}
