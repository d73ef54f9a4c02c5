//! The periodic latency-snapshot message.
//!
//! Distinct from [`crate::Packet`] purely by length: a `recvfrom` of
//! [`MetricsPacket::WIRE_SIZE`] bytes is a metrics report, anything of
//! [`crate::Packet::WIRE_SIZE`] is audio. The two sizes are required to
//! never collide; both crate-level constants are public precisely so a
//! caller can assert this if it ever changes the chunk size.

/// A snapshot of round-trip latency statistics, reported on a fixed
/// cadence by whichever side is measuring.
///
/// RTT itself is never carried on the wire: it is derived locally by the
/// side holding a packet's `seq_origin_ts_ns` once the matching reply
/// arrives. What this message carries is the *distribution* of two
/// separately tracked durations, accumulated since the last report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsPacket {
    /// Minimum observed audio processing time, in milliseconds.
    pub audio_proc_min_ms: u32,
    /// Maximum observed audio processing time, in milliseconds.
    pub audio_proc_max_ms: u32,
    /// Average observed audio processing time, in milliseconds.
    pub audio_proc_avg_ms: u32,
    /// Minimum observed jitter, in milliseconds.
    pub jitter_min_ms: u32,
    /// Maximum observed jitter, in milliseconds.
    pub jitter_max_ms: u32,
    /// Average observed jitter, in milliseconds.
    pub jitter_avg_ms: u32,
}

impl MetricsPacket {
    /// Byte-exact size of the encoded metrics report.
    pub const WIRE_SIZE: usize = 6 * 4;

    /// Encodes `self` into a fixed little-endian byte layout.
    pub fn encode(&self) -> [u8; Self::WIRE_SIZE] {
        let mut buf = [0u8; Self::WIRE_SIZE];
        let mut rest = buf.as_mut_slice();

        for field in [
            self.audio_proc_min_ms,
            self.audio_proc_max_ms,
            self.audio_proc_avg_ms,
            self.jitter_min_ms,
            self.jitter_max_ms,
            self.jitter_avg_ms,
        ] {
            let (slot, r) = rest.split_first_chunk_mut::<4>().unwrap();
            *slot = field.to_le_bytes();
            rest = r;
        }

        debug_assert!(rest.is_empty());

        buf
    }

    /// Decodes a metrics report from `bytes`, or `None` if `bytes` is not
    /// exactly [`MetricsPacket::WIRE_SIZE`] long.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::WIRE_SIZE {
            return None;
        }

        let mut rest = bytes;
        let mut fields = [0u32; 6];

        for field in &mut fields {
            let (&slot, r) = rest.split_first_chunk::<4>()?;
            *field = u32::from_le_bytes(slot);
            rest = r;
        }

        debug_assert!(rest.is_empty());

        Some(Self {
            audio_proc_min_ms: fields[0],
            audio_proc_max_ms: fields[1],
            audio_proc_avg_ms: fields[2],
            jitter_min_ms: fields[3],
            jitter_max_ms: fields[4],
            jitter_avg_ms: fields[5],
        })
    }
}
