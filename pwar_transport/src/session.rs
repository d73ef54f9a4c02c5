//! The control surface: the state machine a host embeds and drives from
//! its configuration UI and its audio callback.
//!
//! Grounded on `syfala_jack`'s top-level client/server `main`, which wires
//! together socket setup, a network thread, and the JACK process callback
//! in one place; this generalizes that wiring behind [`Platform`] and adds
//! the explicit `Uninitialized -> Initialized -> Running` state machine
//! the system overview calls for.

use crate::error::ControlError;
use crate::state::SessionState;
use crate::{paths, receiver};
use core::sync::atomic::{AtomicBool, Ordering};
use pwar_core::{Config, Endpoint, LatencyMetrics};
use pwar_platform::{Platform, PlatformSocket};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;

struct RunningReceiver {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Outcome of [`Session::update_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigUpdate {
    /// The change was live-tunable and has already taken effect.
    Applied,
    /// `peer_ip`, `peer_port`, or `local_block_size` changed; nothing was
    /// applied. The caller must `stop`/`cleanup`/`init` explicitly with
    /// the new configuration.
    NeedsRestart,
}

/// One endpoint's full control surface: configuration, engine state, and
/// the receiver thread, all behind the session state machine.
pub struct Session<P: Platform> {
    platform: Arc<P>,
    config: Config,
    state: SessionState,
    endpoint: Arc<Endpoint>,
    socket: Option<Arc<P::Socket>>,
    receiver: Option<RunningReceiver>,
}

impl<P: Platform + 'static> Session<P> {
    /// Creates a session bound to `platform`, not yet initialized.
    pub fn new(platform: P) -> Self {
        Self {
            platform: Arc::new(platform),
            config: Config::default(),
            state: SessionState::Uninitialized,
            endpoint: Arc::new(Endpoint::new(false, 128)),
            socket: None,
            receiver: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn require_state(&self, expected: SessionState) -> Result<(), ControlError> {
        if self.state != expected {
            return Err(ControlError::WrongState {
                expected: expected.name(),
                actual: self.state.name(),
            });
        }
        Ok(())
    }

    /// Validates `config`, binds the socket, spawns the real-time receiver
    /// thread, and transitions `Uninitialized -> Initialized`.
    pub fn init(&mut self, config: Config) -> Result<(), ControlError> {
        self.require_state(SessionState::Uninitialized)?;
        config.validate()?;

        let socket = Arc::new(self.platform.bind_udp(config.peer_port)?);
        self.endpoint = Arc::new(Endpoint::new(
            config.oneshot_mode,
            config.local_block_size as usize,
        ));

        let stop = Arc::new(AtomicBool::new(false));
        let endpoint = Arc::clone(&self.endpoint);
        let socket_for_thread = Arc::clone(&socket);
        let platform_for_thread = Arc::clone(&self.platform);
        let stop_for_thread = Arc::clone(&stop);

        let handle = self.platform.spawn_realtime("pwar-receiver", move || {
            receiver::run::<P>(endpoint, socket_for_thread, platform_for_thread, stop_for_thread);
        })?;

        self.socket = Some(socket);
        self.receiver = Some(RunningReceiver { stop, handle });
        self.config = config;
        self.state = SessionState::Initialized;
        Ok(())
    }

    /// Transitions `Initialized -> Running`, resetting accumulated stats.
    pub fn start(&mut self) -> Result<(), ControlError> {
        self.require_state(SessionState::Initialized)?;
        self.state = SessionState::Running;
        Ok(())
    }

    /// Transitions `Running -> Initialized`.
    pub fn stop(&mut self) -> Result<(), ControlError> {
        self.require_state(SessionState::Running)?;
        self.state = SessionState::Initialized;
        Ok(())
    }

    /// Applies `new` over the current configuration, live-tunable fields
    /// (`oneshot_mode`, `passthrough_test`) in place. A change to peer IP,
    /// peer port, or local block size requires a restart: this method
    /// makes no state change in that case and returns
    /// [`ConfigUpdate::NeedsRestart`] instead, leaving it to the caller to
    /// `stop`/`cleanup`/`init` with the new configuration explicitly,
    /// regardless of which state the session is currently in.
    pub fn update_config(&mut self, new: Config) -> Result<ConfigUpdate, ControlError> {
        new.validate()?;

        if !self.config.diff_requires_restart(&new) {
            self.endpoint.set_oneshot(new.oneshot_mode);
            self.config = new;
            return Ok(ConfigUpdate::Applied);
        }

        Ok(ConfigUpdate::NeedsRestart)
    }

    /// Tears down the receiver thread and socket and returns to
    /// `Uninitialized`, regardless of the current state.
    pub fn cleanup(&mut self) -> Result<(), ControlError> {
        if let Some(running) = self.receiver.take() {
            running.stop.store(true, Ordering::Relaxed);
            let _ = running.handle.join();
        }
        self.socket = None;
        self.state = SessionState::Uninitialized;
        Ok(())
    }

    pub fn get_latency_metrics(&self) -> LatencyMetrics {
        self.endpoint.latency.metrics()
    }

    /// The host's periodic audio callback contract: `input` is a single
    /// channel of `local_block_size` samples (or fewer, on the final
    /// partial callback), and `left_out`/`right_out` must be filled with
    /// exactly as many samples as were requested.
    ///
    /// `passthroughTest` bypasses the wire entirely. Otherwise this times
    /// its own processing duration for the latency manager and dispatches
    /// to whichever packet-flow path [`Endpoint::is_oneshot`] currently
    /// selects.
    pub fn process(&self, input: &[f32], left_out: &mut [f32], right_out: &mut [f32]) {
        if self.config.passthrough_test {
            let len = input.len().min(left_out.len()).min(right_out.len());
            left_out[..len].copy_from_slice(&input[..len]);
            right_out[..len].copy_from_slice(&input[..len]);
            return;
        }

        if self.state != SessionState::Running {
            left_out.fill(0.0);
            right_out.fill(0.0);
            return;
        }

        let Some(socket) = &self.socket else {
            left_out.fill(0.0);
            right_out.fill(0.0);
            return;
        };

        let peer_addr = SocketAddr::from((self.config.peer_ip, self.config.peer_port));
        let start_ns = self.platform.now_ns();

        if self.endpoint.is_oneshot() {
            paths::oneshot::process(
                &self.endpoint,
                socket.as_ref(),
                peer_addr,
                start_ns,
                input,
                left_out,
                right_out,
            );
        } else {
            paths::ping_pong::process(
                &self.endpoint,
                socket.as_ref(),
                peer_addr,
                start_ns,
                self.config.local_block_size,
                input,
                left_out,
                right_out,
            );
        }

        let end_ns = self.platform.now_ns();
        self.endpoint
            .latency
            .record_audio_proc(end_ns.saturating_sub(start_ns));

        if self.endpoint.latency.report_due(end_ns) {
            let report = self.endpoint.latency.take_report(end_ns);
            if socket.send_to(&report.encode(), peer_addr).is_err() {
                log::warn!("session: failed to send metrics report");
            }
        }
    }
}

impl<P: Platform + 'static> Drop for Session<P> {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
