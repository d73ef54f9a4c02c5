//! Double-buffered store of the most recently reassembled block, read
//! chunk-by-chunk by the audio callback.
//!
//! Grounded on `pwar_rcv_buffer.c`: a writer ("Add") fills the two slots in
//! round-robin order, one per call, independent of how far the reader has
//! drained; a reader ("GetChunk") reads whichever slot is next in line,
//! advancing to the other slot when it either finds nothing ready (and
//! emits silence) or exhausts the slot it was reading, and never advances
//! on an ordinary mid-buffer read. The always-advance-on-underrun behavior
//! is deliberate: it prevents a stalled reader from pinning the buffer to
//! a slot that can never become current again. With only two slots, a
//! reader that falls behind by more than one `add` call loses data, same
//! as the reference's fixed double buffer.

use crate::router::MAX_BLOCK_SAMPLES;
use pwar_proto::{CHANNELS, MAX_CHUNK_SAMPLES};

/// Per-channel chunk of audio, sized for one callback period.
pub type Chunk = [[f32; MAX_CHUNK_SAMPLES]; CHANNELS];

/// A ping-pong pair of reassembled blocks, read out one chunk at a time.
pub struct JitterBuffer {
    buffers: [[[f32; MAX_BLOCK_SAMPLES]; CHANNELS]; 2],
    n_samples: [usize; 2],
    ready: [bool; 2],
    write_idx: usize,
    read_idx: usize,
    chunk_pos: usize,
    underruns: u64,
}

impl Default for JitterBuffer {
    fn default() -> Self {
        Self {
            buffers: [[[0f32; MAX_BLOCK_SAMPLES]; CHANNELS]; 2],
            n_samples: [0, 0],
            ready: [false, false],
            write_idx: 0,
            read_idx: 0,
            chunk_pos: 0,
            underruns: 0,
        }
    }
}

impl JitterBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a freshly reassembled block into the current write slot,
    /// marking it ready, then advances the write slot to the other one.
    /// Two `add` calls in a row (no intervening `get_chunk`) therefore
    /// land in the two different slots rather than overwriting each other.
    pub fn add(&mut self, channels: &[[f32; MAX_BLOCK_SAMPLES]; CHANNELS], n_samples: usize) {
        let idx = self.write_idx;
        self.buffers[idx] = *channels;
        self.n_samples[idx] = n_samples.min(MAX_BLOCK_SAMPLES);
        self.ready[idx] = true;
        self.write_idx = 1 - idx;
    }

    /// Reads the next chunk. Returns `true` if it contains real audio,
    /// `false` if the buffer had nothing ready and the chunk is silence.
    /// Always advances, and on underrun or buffer exhaustion moves the
    /// read slot to the other one.
    pub fn get_chunk(&mut self, out: &mut Chunk) -> bool {
        let idx = self.read_idx;

        if !self.ready[idx] {
            for channel in out.iter_mut() {
                channel.fill(0.0);
            }
            self.underruns += 1;
            self.read_idx = 1 - idx;
            self.chunk_pos = 0;
            return false;
        }

        let n_samples = self.n_samples[idx];
        let start = self.chunk_pos * MAX_CHUNK_SAMPLES;
        let remaining = n_samples.saturating_sub(start);
        let to_copy = remaining.min(MAX_CHUNK_SAMPLES);

        for (ch, channel) in out.iter_mut().enumerate() {
            channel[..to_copy].copy_from_slice(&self.buffers[idx][ch][start..start + to_copy]);
            if to_copy < MAX_CHUNK_SAMPLES {
                channel[to_copy..].fill(0.0);
            }
        }

        self.chunk_pos += 1;
        if self.chunk_pos * MAX_CHUNK_SAMPLES >= n_samples {
            self.ready[idx] = false;
            self.chunk_pos = 0;
            self.read_idx = 1 - idx;
        }

        true
    }

    /// Total number of `get_chunk` calls that returned silence because no
    /// slot was ready.
    pub fn underrun_count(&self) -> u64 {
        self.underruns
    }
}
