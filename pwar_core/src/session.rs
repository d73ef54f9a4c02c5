//! The engine components owned by one running session.
//!
//! Each endpoint (client or server) owns exactly one [`Endpoint`] value
//! for the lifetime of a session — never a process-wide singleton, unlike
//! the static C buffers this engine is modeled on. This is what makes it
//! possible to run two endpoints in one process, which the integration
//! tests rely on.

use crate::accumulator::SendAccumulator;
use crate::jitter::JitterBuffer;
use crate::latency::LatencyManager;
use crate::oneshot::OneshotSlot;
use crate::router::Router;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex as StdMutex;

/// All per-session engine state for one endpoint, shared between the
/// audio callback, the receiver thread, and the control surface.
///
/// Both packet-flow strategies' state is always present; which one a
/// given callback commits to is decided once at its start by reading
/// [`Endpoint::oneshot_mode`] and is never switched mid-callback — the
/// flag itself is free to flip between callbacks, since `oneshotMode` is
/// a live-tunable configuration field.
pub struct Endpoint {
    /// Reassembles incoming packets into logical blocks. Touched only by
    /// the receiver thread; not performance-critical enough to need
    /// anything faster than the standard library's mutex.
    pub router: StdMutex<Router>,
    /// Double-buffered store the audio callback reads from and the
    /// receiver thread writes into; guarded by a `parking_lot::Mutex`
    /// since this is the one lock genuinely shared between the real-time
    /// callback and the receiver thread on every block.
    pub jitter: parking_lot::Mutex<JitterBuffer>,
    /// Concatenates outgoing callback chunks into remote-block-size
    /// buffers on the ping-pong send path. Touched only by the audio
    /// callback.
    pub accumulator: StdMutex<SendAccumulator>,
    /// Rendezvous slot for the oneshot path.
    pub oneshot: OneshotSlot,
    /// Audio-processing, jitter, and round-trip statistics.
    pub latency: LatencyManager,
    oneshot_mode: AtomicBool,
    next_seq: AtomicU64,
}

impl Endpoint {
    /// Creates a new session. `accumulator_capacity` should start out
    /// equal to the local block size; it is retargeted via
    /// [`Endpoint::set_remote_block_size`] once the remote's block size
    /// is observed.
    pub fn new(oneshot_mode: bool, accumulator_capacity: usize) -> Self {
        Self {
            router: StdMutex::new(Router::new()),
            jitter: parking_lot::Mutex::new(JitterBuffer::new()),
            accumulator: StdMutex::new(SendAccumulator::new(accumulator_capacity)),
            oneshot: OneshotSlot::new(),
            latency: LatencyManager::new(),
            oneshot_mode: AtomicBool::new(oneshot_mode),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Whether the oneshot path is currently selected.
    pub fn is_oneshot(&self) -> bool {
        self.oneshot_mode.load(Ordering::Relaxed)
    }

    /// Live-switches between the oneshot and ping-pong paths.
    pub fn set_oneshot(&self, oneshot: bool) {
        self.oneshot_mode.store(oneshot, Ordering::Relaxed);
    }

    /// Mints the next outgoing sequence number. The router never mints
    /// its own; whichever side originates a block does.
    pub fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Retargets the send accumulator's capacity to match a newly
    /// observed remote block size, discarding any partial fill. A no-op
    /// when `samples` already matches the current capacity: the receiver
    /// calls this on every arriving block, and resetting on an unchanged
    /// size would otherwise throw away in-progress accumulation on every
    /// single packet instead of only on an actual remote-size change.
    pub fn set_remote_block_size(&self, samples: usize) {
        let mut accumulator = self.accumulator.lock().unwrap_or_else(|e| e.into_inner());
        if accumulator.capacity() != samples {
            accumulator.reset(samples);
        }
    }
}
