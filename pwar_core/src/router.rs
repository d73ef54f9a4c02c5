//! Segmentation of an outgoing block into packets, and reassembly of
//! incoming packets back into a block.
//!
//! Grounded on `pwar_router_process_packet`/`pwar_router_send_buffer`: the
//! C reference keeps one process-wide static buffer and resets it whenever
//! `packet_index == 0`. This reworks that into an owned value (so a client
//! and a server endpoint can each hold one, or two can coexist in a test
//! process) and resets on sequence mismatch rather than on `index == 0`,
//! matching the invariant in the system overview more directly than the
//! reference's index-based heuristic.

use arrayvec::ArrayVec;
use pwar_proto::{Packet, CHANNELS, MAX_CHUNK_SAMPLES};

/// Largest logical block this engine will segment or reassemble.
pub const MAX_BLOCK_SAMPLES: usize = 4096;

/// Largest number of packets a single block can be split into.
pub const MAX_PACKETS_PER_BLOCK: usize = MAX_BLOCK_SAMPLES / MAX_CHUNK_SAMPLES;

/// A reassembled logical block, still tagged with the sequence it was
/// reassembled from so the latency manager and jitter buffer can key off
/// it.
#[derive(Clone)]
pub struct AssembledBlock {
    pub seq: u64,
    pub seq_origin_ts_ns: u64,
    pub n_samples: usize,
    pub channels: [[f32; MAX_BLOCK_SAMPLES]; CHANNELS],
}

/// Splits `channels` (holding `n_samples` valid samples per channel) into
/// at most [`MAX_PACKETS_PER_BLOCK`] packets of `chunk_size` samples each,
/// the last possibly shorter.
///
/// The caller mints `seq`; this function only segments and stamps. Samples
/// beyond `n_samples` (or `MAX_BLOCK_SAMPLES`) are never read.
pub fn segment(
    channels: &[[f32; MAX_BLOCK_SAMPLES]; CHANNELS],
    n_samples: usize,
    chunk_size: u16,
    seq: u64,
    seq_origin_ts_ns: u64,
    tx_ts_ns: u64,
) -> ArrayVec<Packet, MAX_PACKETS_PER_BLOCK> {
    let mut packets = ArrayVec::new();

    if chunk_size == 0 || n_samples == 0 {
        return packets;
    }

    let chunk_size = chunk_size as usize;
    let n_samples = n_samples.min(MAX_BLOCK_SAMPLES);
    let total_packets = n_samples.div_ceil(chunk_size).min(MAX_PACKETS_PER_BLOCK);

    for index in 0..total_packets {
        let start = index * chunk_size;
        let this_chunk_len = (n_samples - start).min(chunk_size).min(MAX_CHUNK_SAMPLES);

        let mut payload = [[0f32; MAX_CHUNK_SAMPLES]; CHANNELS];
        for (ch, samples) in payload.iter_mut().enumerate() {
            samples[..this_chunk_len].copy_from_slice(&channels[ch][start..start + this_chunk_len]);
        }

        packets.push(Packet {
            chunk_len: this_chunk_len as u16,
            seq,
            count: total_packets as u32,
            index: index as u32,
            seq_origin_ts_ns,
            tx_ts_ns,
            channels: payload,
        });
    }

    packets
}

/// Reassembly state for one logical stream direction.
///
/// Exactly one sequence is ever in flight: a packet belonging to a
/// different sequence than the one currently being assembled resets state
/// to start tracking the new one, per the "at most one block in flight"
/// invariant.
pub struct Router {
    current_seq: Option<u64>,
    origin_ts_ns: u64,
    count: u32,
    received: u32,
    presence: [bool; MAX_PACKETS_PER_BLOCK],
    /// Each received packet's own `chunk_len`, indexed by its `index`.
    /// Only the last index of a block may differ from the rest, but we
    /// stage per-packet so packets may arrive in any order and the true
    /// stride of every preceding index is known once the block completes.
    chunk_lens: [u16; MAX_PACKETS_PER_BLOCK],
    /// Each received packet's raw payload, indexed by its `index`, staged
    /// until the block completes so samples can be laid out contiguously
    /// using the real per-packet lengths rather than an assumed stride.
    staging: [[[f32; MAX_CHUNK_SAMPLES]; CHANNELS]; MAX_PACKETS_PER_BLOCK],
    buffers: [[f32; MAX_BLOCK_SAMPLES]; CHANNELS],
}

impl Default for Router {
    fn default() -> Self {
        Self {
            current_seq: None,
            origin_ts_ns: 0,
            count: 0,
            received: 0,
            presence: [false; MAX_PACKETS_PER_BLOCK],
            chunk_lens: [0; MAX_PACKETS_PER_BLOCK],
            staging: [[[0f32; MAX_CHUNK_SAMPLES]; CHANNELS]; MAX_PACKETS_PER_BLOCK],
            buffers: [[0f32; MAX_BLOCK_SAMPLES]; CHANNELS],
        }
    }
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset_for(&mut self, packet: &Packet) {
        self.current_seq = Some(packet.seq);
        self.origin_ts_ns = packet.seq_origin_ts_ns;
        self.count = packet.count;
        self.received = 0;
        self.presence = [false; MAX_PACKETS_PER_BLOCK];
        self.chunk_lens = [0; MAX_PACKETS_PER_BLOCK];
    }

    /// Feeds one packet into the assembler.
    ///
    /// Returns `Some(block)` once every index `0..count` has been seen for
    /// the current sequence. A packet violating `index < count`,
    /// `count >= 1`, or `count > MAX_PACKETS_PER_BLOCK` is dropped silently
    /// (logged at debug level); the codec already guarantees the buffer
    /// shape, this only guards the cross-field semantics the codec does
    /// not check.
    ///
    /// Each packet's own `chunk_len` is staged rather than assumed to equal
    /// [`MAX_CHUNK_SAMPLES`]: a block segmented with `chunk_size <
    /// MAX_CHUNK_SAMPLES` (per an endpoint's configured `local_block_size`)
    /// carries that shorter length in every packet, and the contiguous
    /// reassembled offset for each index is only known once all of them
    /// have arrived.
    pub fn assemble(&mut self, packet: &Packet) -> Option<AssembledBlock> {
        if packet.count == 0
            || packet.index >= packet.count
            || packet.count as usize > MAX_PACKETS_PER_BLOCK
            || packet.chunk_len as usize > MAX_CHUNK_SAMPLES
        {
            log::debug!(
                "router: dropping packet with invalid header (seq={}, index={}, count={})",
                packet.seq,
                packet.index,
                packet.count
            );
            return None;
        }

        if self.current_seq != Some(packet.seq) {
            if self.current_seq.is_some() {
                log::debug!(
                    "router: sequence abandoned, switching from {:?} to {}",
                    self.current_seq,
                    packet.seq
                );
            }
            self.reset_for(packet);
        }

        let index = packet.index as usize;
        if self.presence[index] {
            // Idempotent: already have this index.
            return None;
        }

        self.staging[index] = packet.channels;
        self.chunk_lens[index] = packet.chunk_len;
        self.presence[index] = true;
        self.received += 1;

        if self.received != self.count {
            return None;
        }

        let mut offset = 0usize;
        for i in 0..self.count as usize {
            let len = self.chunk_lens[i] as usize;
            for (ch, samples) in self.buffers.iter_mut().enumerate() {
                samples[offset..offset + len].copy_from_slice(&self.staging[i][ch][..len]);
            }
            offset += len;
        }
        let n_samples = offset.min(MAX_BLOCK_SAMPLES);

        let block = AssembledBlock {
            seq: packet.seq,
            seq_origin_ts_ns: self.origin_ts_ns,
            n_samples,
            channels: self.buffers,
        };

        Some(block)
    }

    /// Streaming variant of [`assemble`](Self::assemble) for an endpoint
    /// whose own callback granularity doesn't line up with the remote
    /// block size it is receiving: a packet's `index` is trusted as-is
    /// only when it can't be related to the sequence already in flight.
    /// Otherwise the packet's position is
    /// *inferred* from how far its `seq` has advanced past the current
    /// one, which lets a responder recover the right slot even when the
    /// remote's packetization of a block doesn't match what `index` alone
    /// would suggest.
    ///
    /// Concretely: if a sequence is already in progress and
    /// `packet.seq - current_seq` falls in `[0, packet.count)`, that
    /// difference is used as the index instead of `packet.index` before
    /// delegating to [`assemble`](Self::assemble). Otherwise this is
    /// identical to `assemble` (typically the first packet of a new
    /// sequence, which resets state and uses its own `index` verbatim).
    pub fn assemble_streaming(&mut self, packet: &Packet) -> Option<AssembledBlock> {
        let Some(current_seq) = self.current_seq else {
            return self.assemble(packet);
        };

        if packet.count == 0 {
            return self.assemble(packet);
        }

        let diff = packet.seq.wrapping_sub(current_seq);
        if diff >= packet.count as u64 {
            return self.assemble(packet);
        }

        let mut inferred = *packet;
        inferred.index = diff as u32;
        self.assemble(&inferred)
    }
}
