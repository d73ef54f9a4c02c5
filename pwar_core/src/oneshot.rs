//! Synchronous one-packet-per-callback pipeline with a timed wait.
//!
//! Grounded on `libpwar.c`'s `process_one_shot`: the audio callback sends
//! immediately, then blocks on a condition variable for a short deadline
//! (the reference uses `pthread_cond_timedwait` with a 2ms budget) waiting
//! for the receiver thread to deliver a reply into a shared "latest
//! packet" slot. A timeout or stale reply means silence plus one recorded
//! underrun; there is no buffering or reordering tolerance in this path.

use core::time::Duration;
use pwar_proto::Packet;
use std::sync::{Condvar, Mutex};

/// Deadline the oneshot path waits for a reply before giving up,
/// matching the 2ms budget in the C reference implementation.
pub const ONESHOT_TIMEOUT: Duration = Duration::from_millis(2);

/// A single-slot rendezvous between the receiver thread (producer) and
/// the audio callback (consumer) used by the oneshot path.
pub struct OneshotSlot {
    packet: Mutex<Option<Packet>>,
    arrived: Condvar,
}

impl Default for OneshotSlot {
    fn default() -> Self {
        Self {
            packet: Mutex::new(None),
            arrived: Condvar::new(),
        }
    }
}

impl OneshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called from the receiver thread when a reply arrives. Overwrites
    /// whatever was previously waiting (unclaimed) in the slot.
    pub fn deliver(&self, packet: Packet) {
        let mut slot = self.packet.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(packet);
        self.arrived.notify_one();
    }

    /// Called from the audio callback after sending. Waits up to
    /// `timeout` for a reply; returns `None` if the deadline elapses
    /// first. Always clears the slot, matching the reference's
    /// "one waiter per packet" model: a late reply meant for a prior
    /// callback is not still sitting in the slot for the next call.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Packet> {
        let slot = self.packet.lock().unwrap_or_else(|e| e.into_inner());
        let (mut slot, _timeout_result) = self
            .arrived
            .wait_timeout_while(slot, timeout, |p| p.is_none())
            .unwrap_or_else(|e| e.into_inner());
        slot.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pwar_proto::{CHANNELS, MAX_CHUNK_SAMPLES};
    use std::sync::Arc;
    use std::thread;

    fn dummy_packet(seq: u64) -> Packet {
        Packet {
            chunk_len: 1,
            seq,
            count: 1,
            index: 0,
            seq_origin_ts_ns: 0,
            tx_ts_ns: 0,
            channels: [[0.0; MAX_CHUNK_SAMPLES]; CHANNELS],
        }
    }

    #[test]
    fn timeout_without_delivery_yields_silence() {
        let slot = OneshotSlot::new();
        assert!(slot.wait_timeout(Duration::from_millis(2)).is_none());
    }

    #[test]
    fn delivery_wakes_waiter() {
        let slot = Arc::new(OneshotSlot::new());
        let slot_clone = slot.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(1));
            slot_clone.deliver(dummy_packet(7));
        });

        let got = slot.wait_timeout(Duration::from_millis(50));
        handle.join().unwrap();
        assert_eq!(got.unwrap().seq, 7);
    }
}
