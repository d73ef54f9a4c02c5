use crate::{PlatformError, PlatformSocket};
use socket2::{Domain, Socket, Type};
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How long `recv_from` blocks before returning `WouldBlock`/`TimedOut`,
/// giving the receiver loop a chance to check its stop flag.
const RECV_POLL_TIMEOUT: Duration = Duration::from_millis(200);

/// The real platform: OS UDP sockets, `std::thread`, and a monotonic
/// clock anchored at process start.
pub struct StdPlatform {
    epoch: Instant,
}

impl Default for StdPlatform {
    fn default() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl StdPlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

impl crate::Platform for StdPlatform {
    type Socket = StdPlatformSocket;

    fn bind_udp(&self, local_port: u16) -> Result<Self::Socket, PlatformError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, None)
            .map_err(|source| PlatformError::Bind {
                port: local_port,
                source,
            })?;

        let addr: SocketAddr = SocketAddr::from(([0, 0, 0, 0], local_port));
        socket
            .bind(&addr.into())
            .map_err(|source| PlatformError::Bind {
                port: local_port,
                source,
            })?;

        if let Err(e) = socket.set_recv_buffer_size(crate::RECV_BUFFER_BYTES) {
            log::warn!("failed to raise SO_RCVBUF on port {local_port}: {e}");
        }
        if let Err(e) = socket.set_send_buffer_size(crate::SEND_BUFFER_BYTES) {
            log::warn!("failed to set SO_SNDBUF on port {local_port}: {e}");
        }

        let socket: UdpSocket = socket.into();
        suppress_connection_reset(&socket);

        // A bounded read timeout lets the receiver thread notice its stop
        // flag instead of blocking in `recv_from` forever.
        if let Err(e) = socket.set_read_timeout(Some(RECV_POLL_TIMEOUT)) {
            log::warn!("failed to set recv timeout on port {local_port}: {e}");
        }

        Ok(StdPlatformSocket { socket })
    }

    fn now_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    fn spawn_realtime(
        &self,
        name: &str,
        f: impl FnOnce() + Send + 'static,
    ) -> Result<JoinHandle<()>, PlatformError> {
        let name_owned = name.to_string();
        std::thread::Builder::new()
            .name(name_owned.clone())
            .spawn(move || {
                if let Err(e) = request_realtime_priority() {
                    log::warn!("could not elevate {name_owned} to real-time priority: {e}");
                }
                f();
            })
            .map_err(|source| PlatformError::Spawn {
                name: name.to_string(),
                source,
            })
    }
}

/// A `std`/`socket2`-backed UDP socket.
pub struct StdPlatformSocket {
    socket: UdpSocket,
}

impl PlatformSocket for StdPlatformSocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf)
    }

    fn set_recv_buffer_size(&self, bytes: usize) -> io::Result<()> {
        let sock = socket2::SockRef::from(&self.socket);
        sock.set_recv_buffer_size(bytes)
    }

    fn set_send_buffer_size(&self, bytes: usize) -> io::Result<()> {
        let sock = socket2::SockRef::from(&self.socket);
        sock.set_send_buffer_size(bytes)
    }
}

#[cfg(unix)]
fn request_realtime_priority() -> Result<(), String> {
    // SCHED_FIFO priority 90, best-effort, matching the reference
    // receiver thread's own request.
    let param = libc::sched_param { sched_priority: 90 };
    let rc = unsafe {
        libc::pthread_setschedparam(libc::pthread_self(), libc::SCHED_FIFO, &param)
    };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::from_raw_os_error(rc).to_string())
    }
}

#[cfg(not(unix))]
fn request_realtime_priority() -> Result<(), String> {
    Err("real-time scheduling requests are not implemented on this platform".to_string())
}

#[cfg(windows)]
fn suppress_connection_reset(socket: &UdpSocket) {
    use std::os::windows::io::AsRawSocket;
    use windows_sys::Win32::Networking::WinSock::{WSAIoctl, SIO_UDP_CONNRESET};

    let mut bytes_returned: u32 = 0;
    let mut enable: u32 = 0;
    unsafe {
        WSAIoctl(
            socket.as_raw_socket() as usize,
            SIO_UDP_CONNRESET,
            &mut enable as *mut _ as *mut core::ffi::c_void,
            size_of::<u32>() as u32,
            core::ptr::null_mut(),
            0,
            &mut bytes_returned,
            core::ptr::null_mut(),
            None,
        );
    }
}

#[cfg(not(windows))]
fn suppress_connection_reset(_socket: &UdpSocket) {
    // Unconnected UDP sockets on Unix platforms do not receive ICMP
    // "connection reset" errors the way Windows does; nothing to do.
}
