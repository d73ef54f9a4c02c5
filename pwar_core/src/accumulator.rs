//! Concatenates fixed-size callback chunks into a larger "remote block
//! size" buffer before emission, for the ping-pong path.
//!
//! Grounded on `pwar_send_buffer.c`: push copies in, clipping at capacity;
//! `ready` is a simple fill-level comparison; draining hands back the
//! current contents and resets fill to zero automatically, exactly as the
//! C reference's `pwar_send_buffer_get` does.

use crate::router::MAX_BLOCK_SAMPLES;
use pwar_proto::CHANNELS;

/// A block of samples read out of the accumulator, paired with how many
/// of them are valid.
pub struct DrainedBlock {
    pub channels: [[f32; MAX_BLOCK_SAMPLES]; CHANNELS],
    pub n_samples: usize,
}

/// Fixed-capacity per-channel sample accumulator.
pub struct SendAccumulator {
    buffer: [[f32; MAX_BLOCK_SAMPLES]; CHANNELS],
    n_samples: usize,
    capacity: usize,
}

impl SendAccumulator {
    /// Creates an accumulator with room for `capacity` samples per
    /// channel, clamped to [`MAX_BLOCK_SAMPLES`].
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: [[0f32; MAX_BLOCK_SAMPLES]; CHANNELS],
            n_samples: 0,
            capacity: capacity.min(MAX_BLOCK_SAMPLES),
        }
    }

    /// Changes the target capacity (e.g. on a remote block size change),
    /// discarding any partially-filled contents.
    pub fn reset(&mut self, capacity: usize) {
        self.capacity = capacity.min(MAX_BLOCK_SAMPLES);
        self.n_samples = 0;
    }

    /// The currently configured capacity, in samples per channel.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends up to `n_samples` samples of `chunk` per channel. If the
    /// accumulator would overflow its capacity, only the samples that fit
    /// are copied (matching the C reference's clip-to-capacity behavior);
    /// the return value is the number of samples actually accepted.
    pub fn push(&mut self, chunk: &[&[f32]; CHANNELS], n_samples: usize) -> usize {
        let room = self.capacity.saturating_sub(self.n_samples);
        let accepted = n_samples.min(room);

        for (ch, samples) in self.buffer.iter_mut().enumerate() {
            samples[self.n_samples..self.n_samples + accepted]
                .copy_from_slice(&chunk[ch][..accepted]);
        }
        self.n_samples += accepted;
        accepted
    }

    /// Whether the accumulator has reached its configured capacity.
    pub fn ready(&self) -> bool {
        self.n_samples >= self.capacity
    }

    /// Hands back the accumulated contents and resets the fill level to
    /// zero. Safe to call even when [`ready`](Self::ready) is false (e.g.
    /// on a forced flush at session stop).
    pub fn drain(&mut self) -> DrainedBlock {
        let block = DrainedBlock {
            channels: self.buffer,
            n_samples: self.n_samples,
        };
        self.n_samples = 0;
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_semantics() {
        let mut acc = SendAccumulator::new(256);
        let chunk = [0f32; 128];
        let refs = [chunk.as_slice(), chunk.as_slice()];
        assert!(!acc.ready());
        acc.push(&refs, 128);
        assert!(!acc.ready());
        acc.push(&refs, 128);
        assert!(acc.ready());

        let drained = acc.drain();
        assert_eq!(drained.n_samples, 256);
        assert!(!acc.ready());

        // Subsequent pushes should not leak prior contents.
        acc.push(&refs, 10);
        let drained = acc.drain();
        assert_eq!(drained.n_samples, 10);
    }

    #[test]
    fn delay_is_capacity_minus_chunk_size() {
        const CAPACITY: usize = 512;
        const CHUNK: usize = 128;

        let mut acc = SendAccumulator::new(CAPACITY);
        let mut ramp = [0f32; CAPACITY * 4];
        for (i, s) in ramp.iter_mut().enumerate() {
            *s = i as f32;
        }

        let mut drained_blocks = Vec::new();
        let mut pos = 0;
        while pos + CHUNK <= ramp.len() {
            let chunk = &ramp[pos..pos + CHUNK];
            let refs = [chunk, chunk];
            acc.push(&refs, CHUNK);
            pos += CHUNK;
            if acc.ready() {
                drained_blocks.push(acc.drain());
            }
        }

        let first = &drained_blocks[0];
        assert_eq!(first.channels[0][0], 0.0);

        // End-to-end delay of the first drained sample, measured in
        // samples at the chunk stride, is capacity - chunk_size: the
        // buffer must fill once before anything comes out.
        let filling_period_samples = CAPACITY - CHUNK;
        assert_eq!(filling_period_samples, 384);
    }
}
