//! Collects audio-processing, jitter, and round-trip statistics, and
//! emits/applies periodic reports.
//!
//! Grounded on `latency_manager.c`: signed jitter collapsed to an absolute
//! value, round-trip time measured only on the last packet of a block
//! (`index == count - 1`), a 2-second wall-clock reporting cadence, and
//! `ApplyReport` latching the peer's reported audio-proc/jitter numbers as
//! what this side's `getLatencyMetrics` reports for those two fields (only
//! round-trip time is ever known locally, so it is never overwritten by an
//! incoming report).

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use pwar_proto::{MetricsPacket, Packet};

const REPORT_INTERVAL_NS: u64 = 2_000_000_000;
const NS_PER_MS: u64 = 1_000_000;

fn ns_to_ms(ns: u64) -> u32 {
    (ns / NS_PER_MS) as u32
}

/// A min/max/avg accumulator over nanosecond durations, updated with
/// relaxed atomics: these are coarse gauges read once every couple of
/// seconds, and torn reads across the three fields are an acceptable
/// (self-correcting) inaccuracy, not a correctness bug.
#[derive(Default)]
struct Stat {
    min: AtomicU64,
    max: AtomicU64,
    total: AtomicU64,
    count: AtomicU64,
}

impl Stat {
    fn record(&self, value_ns: u64) {
        if self.count.fetch_add(1, Ordering::Relaxed) == 0 {
            self.min.store(value_ns, Ordering::Relaxed);
            self.max.store(value_ns, Ordering::Relaxed);
        } else {
            self.min.fetch_min(value_ns, Ordering::Relaxed);
            self.max.fetch_max(value_ns, Ordering::Relaxed);
        }
        self.total.fetch_add(value_ns, Ordering::Relaxed);
    }

    fn snapshot_ms(&self) -> (u32, u32, u32) {
        let count = self.count.load(Ordering::Relaxed);
        let avg = if count > 0 {
            self.total.load(Ordering::Relaxed) / count
        } else {
            0
        };
        (
            ns_to_ms(self.min.load(Ordering::Relaxed)),
            ns_to_ms(self.max.load(Ordering::Relaxed)),
            ns_to_ms(avg),
        )
    }

    fn reset(&self) {
        self.min.store(0, Ordering::Relaxed);
        self.max.store(0, Ordering::Relaxed);
        self.total.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }
}

/// A min/max/avg triplet, already in whole milliseconds, as handed out by
/// [`LatencyManager::metrics`] and carried in [`MetricsPacket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Triplet {
    pub min_ms: u32,
    pub max_ms: u32,
    pub avg_ms: u32,
}

/// A full snapshot of this endpoint's measured latency, as returned by
/// the control surface's `getLatencyMetrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatencyMetrics {
    pub audio_proc: Triplet,
    pub jitter: Triplet,
    pub rtt: Triplet,
    pub underrun_count: u64,
    pub observed_remote_block_size: u32,
}

/// Collects latency statistics for one endpoint.
pub struct LatencyManager {
    audio_proc: Stat,
    jitter: Stat,
    rtt: Stat,

    peer_audio_proc_ms: (AtomicU32, AtomicU32, AtomicU32),
    peer_jitter_ms: (AtomicU32, AtomicU32, AtomicU32),

    last_report_ns: AtomicU64,
    last_local_packet_ts_ns: AtomicU64,
    last_remote_packet_ts_ns: AtomicU64,

    underrun_count: AtomicU64,
    observed_remote_block_size: AtomicU32,
}

impl Default for LatencyManager {
    fn default() -> Self {
        Self {
            audio_proc: Stat::default(),
            jitter: Stat::default(),
            rtt: Stat::default(),
            peer_audio_proc_ms: Default::default(),
            peer_jitter_ms: Default::default(),
            last_report_ns: AtomicU64::new(0),
            last_local_packet_ts_ns: AtomicU64::new(0),
            last_remote_packet_ts_ns: AtomicU64::new(0),
            underrun_count: AtomicU64::new(0),
            observed_remote_block_size: AtomicU32::new(0),
        }
    }
}

impl LatencyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one audio callback's processing duration.
    pub fn record_audio_proc(&self, duration_ns: u64) {
        self.audio_proc.record(duration_ns);
    }

    /// Records inter-arrival jitter for a received packet carrying
    /// `packet_ts_ns` (its `seq_origin_ts_ns`) and observed locally at
    /// `now_ns`. Jitter is the difference between the local and remote
    /// inter-arrival intervals, collapsed to an absolute value.
    pub fn record_jitter(&self, packet_ts_ns: u64, now_ns: u64) {
        let last_local = self.last_local_packet_ts_ns.swap(now_ns, Ordering::Relaxed);
        let last_remote = self
            .last_remote_packet_ts_ns
            .swap(packet_ts_ns, Ordering::Relaxed);

        if last_local == 0 || last_remote == 0 {
            // First packet: no prior interval to compare against.
            return;
        }

        let local_interval = now_ns.wrapping_sub(last_local) as i64;
        let remote_interval = packet_ts_ns.wrapping_sub(last_remote) as i64;
        let jitter = (local_interval - remote_interval).unsigned_abs();
        self.jitter.record(jitter);
    }

    /// Records round-trip time if `packet` is the last segment of its
    /// block (`index == count - 1`); otherwise a no-op. `now_ns` must be
    /// this endpoint's local clock reading at receipt time.
    pub fn record_rtt(&self, packet: &Packet, now_ns: u64) {
        if packet.index + 1 == packet.count {
            let rtt = now_ns.saturating_sub(packet.seq_origin_ts_ns);
            self.rtt.record(rtt);
        }
    }

    /// Counts one dropped/underrun event (oneshot deadline miss, jitter
    /// buffer underrun, or send failure).
    pub fn report_underrun(&self) {
        self.underrun_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Updates the observed remote block size, as inferred from a
    /// received packet's `count * chunk_len`.
    pub fn observe_remote_block_size(&self, samples: u32) {
        self.observed_remote_block_size
            .store(samples, Ordering::Relaxed);
    }

    /// Whether at least [`REPORT_INTERVAL_NS`] have elapsed since the last
    /// report was taken.
    pub fn report_due(&self, now_ns: u64) -> bool {
        now_ns.saturating_sub(self.last_report_ns.load(Ordering::Relaxed)) >= REPORT_INTERVAL_NS
    }

    /// Builds the outgoing metrics report (audio-proc and jitter only;
    /// round-trip time is never carried on the wire) and resets those two
    /// accumulators for the next interval.
    pub fn take_report(&self, now_ns: u64) -> MetricsPacket {
        let (audio_min, audio_max, audio_avg) = self.audio_proc.snapshot_ms();
        let (jitter_min, jitter_max, jitter_avg) = self.jitter.snapshot_ms();

        self.audio_proc.reset();
        self.jitter.reset();
        self.last_report_ns.store(now_ns, Ordering::Relaxed);

        MetricsPacket {
            audio_proc_min_ms: audio_min,
            audio_proc_max_ms: audio_max,
            audio_proc_avg_ms: audio_avg,
            jitter_min_ms: jitter_min,
            jitter_max_ms: jitter_max,
            jitter_avg_ms: jitter_avg,
        }
    }

    /// Applies an incoming report from the peer, latching its audio-proc
    /// and jitter numbers as what this side's [`metrics`](Self::metrics)
    /// reports for those two fields.
    pub fn apply_report(&self, report: &MetricsPacket) {
        self.peer_audio_proc_ms
            .0
            .store(report.audio_proc_min_ms, Ordering::Relaxed);
        self.peer_audio_proc_ms
            .1
            .store(report.audio_proc_max_ms, Ordering::Relaxed);
        self.peer_audio_proc_ms
            .2
            .store(report.audio_proc_avg_ms, Ordering::Relaxed);

        self.peer_jitter_ms
            .0
            .store(report.jitter_min_ms, Ordering::Relaxed);
        self.peer_jitter_ms
            .1
            .store(report.jitter_max_ms, Ordering::Relaxed);
        self.peer_jitter_ms
            .2
            .store(report.jitter_avg_ms, Ordering::Relaxed);
    }

    /// Returns the current full metrics snapshot.
    pub fn metrics(&self) -> LatencyMetrics {
        let (rtt_min, rtt_max, rtt_avg) = self.rtt.snapshot_ms();

        LatencyMetrics {
            audio_proc: Triplet {
                min_ms: self.peer_audio_proc_ms.0.load(Ordering::Relaxed),
                max_ms: self.peer_audio_proc_ms.1.load(Ordering::Relaxed),
                avg_ms: self.peer_audio_proc_ms.2.load(Ordering::Relaxed),
            },
            jitter: Triplet {
                min_ms: self.peer_jitter_ms.0.load(Ordering::Relaxed),
                max_ms: self.peer_jitter_ms.1.load(Ordering::Relaxed),
                avg_ms: self.peer_jitter_ms.2.load(Ordering::Relaxed),
            },
            rtt: Triplet {
                min_ms: rtt_min,
                max_ms: rtt_max,
                avg_ms: rtt_avg,
            },
            underrun_count: self.underrun_count.load(Ordering::Relaxed),
            observed_remote_block_size: self.observed_remote_block_size.load(Ordering::Relaxed),
        }
    }
}
