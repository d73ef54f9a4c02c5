//! The dedicated receiver thread: blocks in `recv_from`, dispatches
//! purely by datagram size, and never terminates on a transient error.
//!
//! Grounded on `syfala_jack::client`/`syfala_jack::server`'s
//! `audio_network_thread_run` split between a network-reading thread and
//! the inline audio-callback sender, generalized away from JACK specifics
//! and onto the `Platform` port.

use core::sync::atomic::{AtomicBool, Ordering};
use pwar_core::Endpoint;
use pwar_platform::{Platform, PlatformSocket};
use pwar_proto::{MetricsPacket, Packet};
use std::io;
use std::sync::Arc;

const RECV_BUFFER_SIZE: usize = Packet::WIRE_SIZE;

fn on_audio_packet(endpoint: &Endpoint, packet: Packet, now_ns: u64) {
    endpoint.latency.record_jitter(packet.seq_origin_ts_ns, now_ns);
    endpoint.latency.record_rtt(&packet, now_ns);

    let assembled = {
        let mut router = endpoint.router.lock().unwrap_or_else(|e| e.into_inner());
        router.assemble_streaming(&packet)
    };

    let Some(block) = assembled else {
        return;
    };

    endpoint
        .latency
        .observe_remote_block_size(block.n_samples as u32);
    // The remote's logical block size, as just observed, is also the
    // right capacity for this side's own send accumulator: that is the
    // size the ping-pong path batches chunks up to before segmenting
    // and sending.
    endpoint.set_remote_block_size(block.n_samples);

    if endpoint.is_oneshot() {
        endpoint.oneshot.deliver(packet);
    } else {
        endpoint.jitter.lock().add(&block.channels, block.n_samples);
    }
}

/// Handles one received datagram: audio-packet size routes to the
/// assembler, metrics-packet size applies an incoming report, anything
/// else is a silent drop.
pub fn dispatch_datagram(endpoint: &Endpoint, bytes: &[u8], now_ns: u64) {
    if bytes.len() == Packet::WIRE_SIZE {
        match Packet::decode(bytes) {
            Some(packet) => on_audio_packet(endpoint, packet, now_ns),
            None => log::debug!("receiver: audio-sized datagram failed to decode"),
        }
    } else if bytes.len() == MetricsPacket::WIRE_SIZE {
        match MetricsPacket::decode(bytes) {
            Some(report) => endpoint.latency.apply_report(&report),
            None => log::debug!("receiver: metrics-sized datagram failed to decode"),
        }
    } else {
        log::debug!(
            "receiver: dropping datagram of unrecognized length {}",
            bytes.len()
        );
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}

/// Runs the receiver loop until `stop` is set. A socket error is logged
/// and the loop continues (transient); this function only returns once
/// `stop` is observed true.
pub fn run<P: Platform>(
    endpoint: Arc<Endpoint>,
    socket: Arc<P::Socket>,
    platform: Arc<P>,
    stop: Arc<AtomicBool>,
) {
    let mut buf = [0u8; RECV_BUFFER_SIZE];
    while !stop.load(Ordering::Relaxed) {
        match socket.recv_from(&mut buf) {
            Ok((n, _addr)) => dispatch_datagram(&endpoint, &buf[..n], platform.now_ns()),
            Err(e) if is_transient(&e) => continue,
            Err(e) => {
                log::warn!("receiver: socket error: {e}");
                continue;
            }
        }
    }
}
