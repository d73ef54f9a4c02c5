//! Minimal runnable server: the reflecting peer the client demo talks to,
//! echoing whatever it assembles straight back out.

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
        thread::sleep(Duration::from_millis(2));
    }
}
