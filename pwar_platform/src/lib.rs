//! Platform port: the seam where socket creation, real-time thread
//! scheduling, and monotonic clock access are abstracted away from the
//! engine and transport crates.
//!
//! This generalizes what used to be scattered host-specific code (JACK's
//! own thread and clock handling in a prior generation of this codebase)
//! into one named trait pair, so the engine can be driven by a real OS
//! (`StdPlatform`) or by an in-memory fake for tests without changing a
//! line of transport logic.

mod error;
mod std_platform;

pub use error::PlatformError;
pub use std_platform::{StdPlatform, StdPlatformSocket};

use std::io;
use std::net::SocketAddr;
use std::thread::JoinHandle;

/// Everything the transport layer needs from the host environment.
pub trait Platform: Send + Sync {
    type Socket: PlatformSocket;

    /// Binds a UDP socket on `local_port`, ready for `recv_from`/
    /// `send_to`.
    fn bind_udp(&self, local_port: u16) -> Result<Self::Socket, PlatformError>;

    /// A monotonic nanosecond timestamp. Must never move backwards
    /// within a process.
    fn now_ns(&self) -> u64;

    /// Spawns `f` on a new thread named `name`, requesting real-time
    /// scheduling priority if the platform supports it. The request is
    /// best-effort: a platform that refuses elevated scheduling still
    /// runs `f` on a normal thread, logging a warning rather than
    /// failing the call.
    fn spawn_realtime(
        &self,
        name: &str,
        f: impl FnOnce() + Send + 'static,
    ) -> Result<JoinHandle<()>, PlatformError>;
}

/// A bound UDP socket, abstracted for testability.
pub trait PlatformSocket: Send {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize>;
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
    fn set_recv_buffer_size(&self, bytes: usize) -> io::Result<()>;
    fn set_send_buffer_size(&self, bytes: usize) -> io::Result<()>;
}

/// Receive buffer size requested on platform sockets, per the wire
/// protocol's "tolerate bursts" guidance.
pub const RECV_BUFFER_BYTES: usize = 1024 * 1024;

/// Send buffer size requested on platform sockets, kept small to
/// minimize outbound queueing latency.
pub const SEND_BUFFER_BYTES: usize = 1024;
