//! A fake [`Platform`] for integration tests: UDP sockets become
//! in-process channels keyed by port, and the clock is a manually
//! advanced counter instead of wall time.
//!
//! This is the "fake in-memory Platform/PlatformSocket pair" the crate's
//! design notes call for so end-to-end scenarios (deadline misses,
//! metrics cadence, block-size mismatches) run deterministically without
//! real sockets or real time passing.

use pwar_platform::{Platform, PlatformError, PlatformSocket};
use std::collections::HashMap;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// A manually-advanced monotonic clock, shared between every endpoint in
/// a test that should agree on "now" (tests assume the two hosts' clocks
/// are locked to a common rate).
#[derive(Clone)]
pub struct FakeClock(Arc<AtomicU64>);

impl FakeClock {
    /// Starts at 1, not 0: the latency manager treats a `0` timestamp as
    /// "no prior sample yet" (see `LatencyManager::record_jitter`).
    pub fn new() -> Self {
        Self(Arc::new(AtomicU64::new(1)))
    }

    pub fn advance(&self, ns: u64) {
        self.0.fetch_add(ns, Ordering::SeqCst);
    }

    pub fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// The shared "wire": a registry of bound (IP, port) addresses to the
/// channel feeding datagrams sent to them. Real endpoints distinguish
/// peers purely by IP while sharing one port number: each binds to the
/// same local port, and sends to the configured peer IP and port. Since
/// this fake has no real network stack, each [`FakePlatform`] is given
/// its own loopback-range IP so two peers can coexist in one process
/// under the same port number.
#[derive(Clone, Default)]
pub struct FakeNetwork(Arc<Mutex<HashMap<SocketAddr, Sender<Vec<u8>>>>>);

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct FakeSocket {
    local_addr: SocketAddr,
    network: FakeNetwork,
    rx: Mutex<Receiver<Vec<u8>>>,
}

impl PlatformSocket for FakeSocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        let tx = self.network.0.lock().unwrap().get(&addr).cloned();
        if let Some(tx) = tx {
            // A receiver that has since been torn down is a normal
            // occurrence in these tests (session already stopped); dropping
            // the datagram matches how a real send into the void behaves.
            let _ = tx.send(buf.to_vec());
        }
        Ok(buf.len())
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let rx = self.rx.lock().unwrap();
        match rx.recv_timeout(Duration::from_millis(10)) {
            Ok(bytes) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok((n, self.local_addr))
            }
            Err(_) => Err(io::Error::from(io::ErrorKind::WouldBlock)),
        }
    }

    fn set_recv_buffer_size(&self, _bytes: usize) -> io::Result<()> {
        Ok(())
    }

    fn set_send_buffer_size(&self, _bytes: usize) -> io::Result<()> {
        Ok(())
    }
}

pub struct FakePlatform {
    clock: FakeClock,
    network: FakeNetwork,
    local_ip: Ipv4Addr,
}

impl FakePlatform {
    pub fn new(clock: FakeClock, network: FakeNetwork, local_ip: Ipv4Addr) -> Self {
        Self {
            clock,
            network,
            local_ip,
        }
    }
}

impl Platform for FakePlatform {
    type Socket = FakeSocket;

    fn bind_udp(&self, local_port: u16) -> Result<Self::Socket, PlatformError> {
        let (tx, rx) = mpsc::channel();
        let local_addr = SocketAddr::from((self.local_ip, local_port));
        self.network.0.lock().unwrap().insert(local_addr, tx);
        Ok(FakeSocket {
            local_addr,
            network: self.network.clone(),
            rx: Mutex::new(rx),
        })
    }

    fn now_ns(&self) -> u64 {
        self.clock.now()
    }

    fn spawn_realtime(
        &self,
        name: &str,
        f: impl FnOnce() + Send + 'static,
    ) -> Result<JoinHandle<()>, PlatformError> {
        std::thread::Builder::new()
            .name(name.to_string())
            .spawn(f)
            .map_err(|source| PlatformError::Spawn {
                name: name.to_string(),
                source,
            })
    }
}
