//! End-to-end scenarios driven against two in-process endpoints sharing
//! a [`FakePlatform`] network, per the "two endpoints in one process"
//! integration harness the design notes call for.

mod common;

use common::{FakeClock, FakeNetwork, FakePlatform};
use pwar_core::Config;
use pwar_transport::Session;
use std::net::Ipv4Addr;

const CLIENT_IP: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 1);
const SERVER_IP: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 2);
const PORT: u16 = 34000;

fn client_config(oneshot: bool, local_block_size: u16) -> Config {
    Config {
        peer_ip: SERVER_IP,
        peer_port: PORT,
        local_block_size,
        oneshot_mode: oneshot,
        passthrough_test: false,
    }
}

fn server_config(oneshot: bool, local_block_size: u16) -> Config {
    Config {
        peer_ip: CLIENT_IP,
        peer_port: PORT,
        local_block_size,
        oneshot_mode: oneshot,
        passthrough_test: false,
    }
}

/// Scenario 5: with no counterpart ever replying, ten oneshot callbacks
/// each miss their deadline, output silence, and count exactly one
/// underrun apiece.
#[test]
fn oneshot_deadline_miss_increments_underrun_by_exactly_ten() {
    let network = FakeNetwork::new();
    let clock = FakeClock::new();
    let platform = FakePlatform::new(clock, network, CLIENT_IP);

    let mut client = Session::new(platform);
    client
        .init(client_config(true, 128))
        .expect("client init should succeed");
    client.start().expect("client start should succeed");

    let input = [0f32; 128];
    let mut left = [1f32; 128];
    let mut right = [1f32; 128];

    for _ in 0..10 {
        client.process(&input, &mut left, &mut right);
        assert!(left.iter().all(|&s| s == 0.0));
        assert!(right.iter().all(|&s| s == 0.0));
    }

    let metrics = client.get_latency_metrics();
    assert_eq!(metrics.underrun_count, 10);
}

/// Waits (by polling a real, short sleep) until `pred` is true or the
/// budget of attempts is exhausted, for assertions that depend on the
/// receiver thread having drained the fake wire.
fn poll_until(mut pred: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if pred() {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    false
}

/// Scenario 2: a client segmenting at chunk 128 against a server whose
/// block size is 1024 should let the server observe exactly two
/// complete 1024-sample sequences from a 2048-sample push, once the
/// client has learned the remote block size from one round of traffic.
#[test]
fn block_size_mismatch_observed_by_server() {
    let network = FakeNetwork::new();
    let clock = FakeClock::new();

    let client_platform = FakePlatform::new(clock.clone(), network.clone(), CLIENT_IP);
    let server_platform = FakePlatform::new(clock, network, SERVER_IP);

    let mut client = Session::new(client_platform);
    client
        .init(client_config(false, 128))
        .expect("client init should succeed");
    client.start().expect("client start should succeed");

    let mut server = Session::new(server_platform);
    server
        .init(server_config(false, 1024))
        .expect("server init should succeed");
    server.start().expect("server start should succeed");

    let mut left = [0f32; 128];
    let mut right = [0f32; 128];

    // Prime the exchange: one full server-side callback (its own chunk
    // equals its configured 1024-sample block) sends a 1024-sample
    // block to the client, which lets the client's accumulator learn
    // and retarget to that remote block size before it starts batching
    // its own outgoing stream.
    let server_input = [0f32; 1024];
    let mut server_left = [0f32; 1024];
    let mut server_right = [0f32; 1024];
    server.process(&server_input, &mut server_left, &mut server_right);

    assert!(
        poll_until(|| client.get_latency_metrics().observed_remote_block_size == 1024),
        "client should have observed the server's 1024-sample block size"
    );

    // Now drive the client with 16 pushes of 128 samples (2048 total):
    // exactly two 1024-sample sequences once its accumulator batches to
    // the now-learned remote size.
    let input = [0f32; 128];
    for _ in 0..16 {
        client.process(&input, &mut left, &mut right);
    }

    assert!(
        poll_until(|| server.get_latency_metrics().observed_remote_block_size == 1024),
        "server should reassemble the client's batched sequences back to 1024 samples"
    );
}

/// Scenario 6: a metrics report is emitted once the 2-second cadence
/// elapses, and not before -- read directly off the wire with a raw
/// socket so the assertion doesn't depend on receiver-thread timing.
#[test]
fn metrics_report_emitted_on_two_second_cadence() {
    use pwar_platform::{Platform, PlatformSocket};
    use pwar_proto::MetricsPacket;

    let network = FakeNetwork::new();
    let clock = FakeClock::new();

    let client_platform = FakePlatform::new(clock.clone(), network.clone(), CLIENT_IP);
    // A raw socket standing in for the server, so this test can inspect
    // exactly what hits the wire without going through another Session.
    let server_platform = FakePlatform::new(clock.clone(), network, SERVER_IP);
    let server_socket = server_platform
        .bind_udp(PORT)
        .expect("server-side raw bind should succeed");

    let mut client = Session::new(client_platform);
    client
        .init(client_config(false, 128))
        .expect("client init should succeed");
    client.start().expect("client start should succeed");

    let input = [0f32; 128];
    let mut left = [0f32; 128];
    let mut right = [0f32; 128];
    let mut buf = [0u8; 2048];

    // Ping-pong mode with a chunk equal to its own capacity sends one
    // audio packet every callback; consume it so it isn't mistaken for
    // the (not-yet-due) metrics report.
    client.process(&input, &mut left, &mut right);
    let (n, _) = server_socket
        .recv_from(&mut buf)
        .expect("the ping-pong send should have reached the wire");
    assert_eq!(n, pwar_proto::Packet::WIRE_SIZE, "first datagram should be audio, not metrics");
    assert!(
        server_socket.recv_from(&mut buf).is_err(),
        "no metrics report should have been sent before the cadence elapses"
    );

    // Cross the 2-second threshold: the next callback emits an audio
    // packet followed by a metrics report, in that send order.
    clock.advance(2_100_000_000);
    client.process(&input, &mut left, &mut right);

    let (n, _) = server_socket
        .recv_from(&mut buf)
        .expect("the ping-pong send should have reached the wire");
    assert_eq!(n, pwar_proto::Packet::WIRE_SIZE);

    let (n, _from) = server_socket
        .recv_from(&mut buf)
        .expect("a metrics report should be on the wire once the cadence elapses");
    assert_eq!(n, MetricsPacket::WIRE_SIZE);
    let report = MetricsPacket::decode(&buf[..n]).expect("should decode as a metrics packet");
    assert!(report.audio_proc_min_ms <= report.audio_proc_avg_ms);
    assert!(report.audio_proc_avg_ms <= report.audio_proc_max_ms);
    assert!(report.jitter_min_ms <= report.jitter_avg_ms);
    assert!(report.jitter_avg_ms <= report.jitter_max_ms);
}

/// `updateConfig` signals a restart-requiring change while running without
/// touching state or configuration, and applies a live-tunable one in
/// place.
#[test]
fn update_config_distinguishes_restart_fields() {
    use pwar_transport::ConfigUpdate;

    let network = FakeNetwork::new();
    let clock = FakeClock::new();
    let platform = FakePlatform::new(clock, network, CLIENT_IP);

    let mut client = Session::new(platform);
    client
        .init(client_config(false, 128))
        .expect("init should succeed");
    client.start().expect("start should succeed");

    let mut live_tunable = client.config().clone();
    live_tunable.passthrough_test = true;
    let outcome = client
        .update_config(live_tunable)
        .expect("live-tunable change should apply without a restart");
    assert_eq!(outcome, ConfigUpdate::Applied);
    assert!(client.config().passthrough_test);
    assert!(client.is_running());

    // A restart-required field (local_block_size here) must not be
    // applied and must not change session state, even while Running.
    let before = *client.config();
    let mut needs_restart = before;
    needs_restart.local_block_size = 64;
    let outcome = client
        .update_config(needs_restart)
        .expect("validation itself should still succeed");
    assert_eq!(outcome, ConfigUpdate::NeedsRestart);
    assert_eq!(*client.config(), before, "config must be left untouched");
    assert!(
        client.is_running(),
        "session state must be left untouched"
    );
}

/// With `passthroughTest` enabled, both outputs equal the input
/// sample-for-sample, independent of any wire activity.
#[test]
fn passthrough_bypasses_the_wire() {
    let network = FakeNetwork::new();
    let clock = FakeClock::new();
    let platform = FakePlatform::new(clock, network, CLIENT_IP);

    let mut client = Session::new(platform);
    let mut config = client_config(false, 128);
    config.passthrough_test = true;
    client.init(config).expect("init should succeed");
    client.start().expect("start should succeed");

    let mut input = [0f32; 128];
    for (i, s) in input.iter_mut().enumerate() {
        *s = i as f32 * 0.01;
    }
    let mut left = [0f32; 128];
    let mut right = [0f32; 128];

    client.process(&input, &mut left, &mut right);
    assert_eq!(left, input);
    assert_eq!(right, input);
}
