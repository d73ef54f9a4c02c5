//! Asynchronous segmented pipeline backed by the send accumulator and
//! receive jitter buffer.
//!
//! Grounded on `libpwar.c`'s `process_ping_pong`, generalized with the
//! send accumulator so a local chunk smaller than the remote's block
//! size is batched up before segmentation, instead of emitting one
//! packet per callback regardless of the remote's configured block size.

use pwar_core::Endpoint;
use pwar_platform::PlatformSocket;
use pwar_proto::{CHANNELS, MAX_CHUNK_SAMPLES};
use std::net::SocketAddr;

/// Pushes `input` into the send accumulator (flushing a full segmented
/// block when it fills), then reads one chunk out of the jitter buffer
/// into `left_out`/`right_out`.
pub fn process<S: PlatformSocket>(
    endpoint: &Endpoint,
    socket: &S,
    peer_addr: SocketAddr,
    now_ns: u64,
    local_chunk_size: u16,
    input: &[f32],
    left_out: &mut [f32],
    right_out: &mut [f32],
) {
    let n = input.len().min(MAX_CHUNK_SAMPLES);
    let silent = [0f32; MAX_CHUNK_SAMPLES];
    let chunk_refs = [&input[..n], &silent[..n]];

    let drained = {
        let mut accumulator = endpoint
            .accumulator
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        accumulator.push(&chunk_refs, n);
        accumulator.ready().then(|| accumulator.drain())
    };

    if let Some(block) = drained {
        let seq = endpoint.next_seq();
        let packets = pwar_core::router::segment(
            &block.channels,
            block.n_samples,
            local_chunk_size,
            seq,
            now_ns,
            now_ns,
        );
        for packet in &packets {
            if socket.send_to(&packet.encode(), peer_addr).is_err() {
                log::warn!("ping-pong: send failed for seq {seq}");
                endpoint.latency.report_underrun();
            }
        }
    }

    let mut chunk = [[0f32; MAX_CHUNK_SAMPLES]; CHANNELS];
    let got = endpoint.jitter.lock().get_chunk(&mut chunk);
    if !got {
        endpoint.latency.report_underrun();
    }

    let len = left_out.len().min(right_out.len()).min(MAX_CHUNK_SAMPLES);
    left_out[..len].copy_from_slice(&chunk[0][..len]);
    right_out[..len].copy_from_slice(&chunk[1][..len]);
}
