//! The sole on-wire audio message.
//!
//! All samples are assumed to be packed, little-endian, and laid out
//! channel-major (first all of channel 0's samples, then all of channel
//! 1's). Channel count is fixed at two on the wire; a flat, strided array
//! keeps a path open for a variable channel count without changing the
//! header layout.

/// Maximum number of samples a single packet's chunk may carry.
pub const MAX_CHUNK_SAMPLES: usize = 128;

/// Number of audio channels carried by a packet. Fixed on the wire.
pub const CHANNELS: usize = 2;

const SAMPLE_SIZE: usize = size_of::<f32>();
const CHUNK_BYTES: usize = MAX_CHUNK_SAMPLES * SAMPLE_SIZE;

/// One segment of a logical audio block.
///
/// A block of `remoteBlockSize` samples is always carried as
/// `ceil(remoteBlockSize / chunkSize)` packets sharing one [`seq`](Self::seq).
/// See the crate's router for how packets are assembled back into a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packet {
    /// Number of valid samples per channel in this packet. At most
    /// [`MAX_CHUNK_SAMPLES`]; only the last packet of a block may be
    /// shorter than the rest.
    pub chunk_len: u16,
    /// Sequence number of the logical block this packet belongs to.
    /// Strictly increasing on the originating side, and propagated
    /// unchanged by a responder.
    pub seq: u64,
    /// How many packets make up the block identified by `seq`.
    pub count: u32,
    /// This packet's position within the block, in `[0, count)`.
    pub index: u32,
    /// Stamped once, by whichever side first emits this block; copied
    /// unchanged through any reply, enabling round-trip measurement.
    pub seq_origin_ts_ns: u64,
    /// Stamped at each hop (sender's local clock at send time).
    pub tx_ts_ns: u64,
    /// Per-channel sample payload, channel-major, padded with don't-care
    /// values past `chunk_len`.
    pub channels: [[f32; MAX_CHUNK_SAMPLES]; CHANNELS],
}

impl Packet {
    /// Byte-exact size of the encoded packet. Any `recvfrom` of a
    /// different length is not a [`Packet`] (see [`Packet::decode`]).
    pub const WIRE_SIZE: usize = 2 + 8 + 4 + 4 + 8 + 8 + CHANNELS * CHUNK_BYTES;

    /// Encodes `self` into a fixed little-endian byte layout.
    ///
    /// Only the first `chunk_len` samples of each channel are meaningful;
    /// bytes past that point in the payload are still written (whatever
    /// garbage is in the unused tail of `channels`) but the receiver must
    /// not read past `chunk_len`.
    pub fn encode(&self) -> [u8; Self::WIRE_SIZE] {
        let mut buf = [0u8; Self::WIRE_SIZE];
        let mut rest = buf.as_mut_slice();

        let (field, r) = rest.split_first_chunk_mut::<2>().unwrap();
        *field = self.chunk_len.to_le_bytes();
        rest = r;

        let (field, r) = rest.split_first_chunk_mut::<8>().unwrap();
        *field = self.seq.to_le_bytes();
        rest = r;

        let (field, r) = rest.split_first_chunk_mut::<4>().unwrap();
        *field = self.count.to_le_bytes();
        rest = r;

        let (field, r) = rest.split_first_chunk_mut::<4>().unwrap();
        *field = self.index.to_le_bytes();
        rest = r;

        let (field, r) = rest.split_first_chunk_mut::<8>().unwrap();
        *field = self.seq_origin_ts_ns.to_le_bytes();
        rest = r;

        let (field, r) = rest.split_first_chunk_mut::<8>().unwrap();
        *field = self.tx_ts_ns.to_le_bytes();
        rest = r;

        for channel in &self.channels {
            for sample in channel {
                let (field, r) = rest.split_first_chunk_mut::<SAMPLE_SIZE>().unwrap();
                *field = sample.to_le_bytes();
                rest = r;
            }
        }

        debug_assert!(rest.is_empty());

        buf
    }

    /// Decodes a packet from `bytes`, or returns `None` if `bytes` is not
    /// exactly [`Packet::WIRE_SIZE`] long.
    ///
    /// This only validates the *shape* of the buffer. Semantic validity
    /// (`index < count`, `count >= 1`, `chunk_len <= MAX_CHUNK_SAMPLES`) is
    /// the router's job, not the codec's: a packet with an inconsistent
    /// header still decodes, and is rejected one layer up.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::WIRE_SIZE {
            return None;
        }

        let mut rest = bytes;

        let (&field, r) = rest.split_first_chunk::<2>()?;
        let chunk_len = u16::from_le_bytes(field);
        rest = r;

        let (&field, r) = rest.split_first_chunk::<8>()?;
        let seq = u64::from_le_bytes(field);
        rest = r;

        let (&field, r) = rest.split_first_chunk::<4>()?;
        let count = u32::from_le_bytes(field);
        rest = r;

        let (&field, r) = rest.split_first_chunk::<4>()?;
        let index = u32::from_le_bytes(field);
        rest = r;

        let (&field, r) = rest.split_first_chunk::<8>()?;
        let seq_origin_ts_ns = u64::from_le_bytes(field);
        rest = r;

        let (&field, r) = rest.split_first_chunk::<8>()?;
        let tx_ts_ns = u64::from_le_bytes(field);
        rest = r;

        let mut channels = [[0f32; MAX_CHUNK_SAMPLES]; CHANNELS];

        for channel in &mut channels {
            for sample in channel.iter_mut() {
                let (&field, r) = rest.split_first_chunk::<SAMPLE_SIZE>()?;
                *sample = f32::from_le_bytes(field);
                rest = r;
            }
        }

        debug_assert!(rest.is_empty());

        Some(Self {
            chunk_len,
            seq,
            count,
            index,
            seq_origin_ts_ns,
            tx_ts_ns,
            channels,
        })
    }
}
