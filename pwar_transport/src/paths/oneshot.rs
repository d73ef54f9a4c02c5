//! Synchronous one-packet-per-callback send/wait/receive, run inline from
//! the audio callback.
//!
//! Grounded on `libpwar.c`'s `process_one_shot`: send first, then block
//! on the shared rendezvous slot for up to
//! [`pwar_core::oneshot::ONESHOT_TIMEOUT`]; a timeout or no-arrival fills
//! the outputs with silence and counts one underrun.

use pwar_core::oneshot::ONESHOT_TIMEOUT;
use pwar_core::Endpoint;
use pwar_platform::PlatformSocket;
use pwar_proto::{Packet, CHANNELS, MAX_CHUNK_SAMPLES};
use std::net::SocketAddr;

/// Sends `input` as a single packet, then waits for a reply, writing it
/// (or silence, on timeout) into `left_out`/`right_out`.
pub fn process<S: PlatformSocket>(
    endpoint: &Endpoint,
    socket: &S,
    peer_addr: SocketAddr,
    now_ns: u64,
    input: &[f32],
    left_out: &mut [f32],
    right_out: &mut [f32],
) {
    let n = input.len().min(MAX_CHUNK_SAMPLES);
    let mut channels = [[0f32; MAX_CHUNK_SAMPLES]; CHANNELS];
    channels[0][..n].copy_from_slice(&input[..n]);

    let packet = Packet {
        chunk_len: n as u16,
        seq: endpoint.next_seq(),
        count: 1,
        index: 0,
        seq_origin_ts_ns: now_ns,
        tx_ts_ns: now_ns,
        channels,
    };

    if socket.send_to(&packet.encode(), peer_addr).is_err() {
        log::warn!("oneshot: send failed");
        endpoint.latency.report_underrun();
    }

    match endpoint.oneshot.wait_timeout(ONESHOT_TIMEOUT) {
        Some(reply) => {
            let len = (reply.chunk_len as usize).min(left_out.len()).min(right_out.len());
            left_out[..len].copy_from_slice(&reply.channels[0][..len]);
            right_out[..len].copy_from_slice(&reply.channels[1][..len]);
            left_out[len..].fill(0.0);
            right_out[len..].fill(0.0);
        }
        None => {
            log::debug!("oneshot: no reply within deadline, outputting silence");
            left_out.fill(0.0);
            right_out.fill(0.0);
            endpoint.latency.report_underrun();
        }
    }
}
