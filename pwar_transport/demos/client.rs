//! Minimal runnable client: drives one session against a hardcoded peer,
//! feeding it silence and logging what comes back. No configuration
//! surface of its own — wiring a real host's audio callback into
//! [`pwar_transport::Session::process`] is left to that host.

use pwar_core::Config;
use pwar_platform::StdPlatform;
use pwar_transport::Session;
use std::net::Ipv4Addr;
use std::thread;
use std::time::Duration;

fn main() {
    env_logger::init();

    let mut session = Session::new(StdPlatform::new());
    let config = Config {
        peer_ip: Ipv4Addr::new(127, 0, 0, 1),
        peer_port: 6910,
        local_block_size: 128,
        oneshot_mode: false,
        passthrough_test: false,
    };

    session.init(config).expect("failed to initialize session");
    session.start().expect("failed to start session");

    let input = [0f32; 128];
    let mut left = [0f32; 128];
    let mut right = [0f32; 128];

    loop {
        session.process(&input, &mut left, &mut right);
        let metrics = session.get_latency_metrics();
        log::info!(
            "rtt avg={}ms jitter avg={}ms underruns={}",
            metrics.rtt.avg_ms,
            metrics.jitter.avg_ms,
            metrics.underrun_count
        );
        thread::sleep(Duration::from_millis(2));
    }
}
