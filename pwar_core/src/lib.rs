//! The protocol and streaming engine: packet routing, buffering, and
//! latency measurement, independent of any particular transport or host
//! audio graph binding.
//!
//! This crate knows nothing about sockets or real-time thread scheduling
//! — that belongs to `pwar_platform` and `pwar_transport`. It owns the
//! pieces the system overview calls "leaves": the router, the send
//! accumulator, the receive jitter buffer, the latency manager, the two
//! processing-mode pipelines, and the configuration model that ties them
//! together into one [`session::Endpoint`].

pub mod accumulator;
pub mod config;
pub mod jitter;
pub mod latency;
pub mod oneshot;
pub mod router;
pub mod session;

pub use accumulator::SendAccumulator;
pub use config::{Config, ConfigError};
pub use jitter::JitterBuffer;
pub use latency::{LatencyManager, LatencyMetrics};
pub use oneshot::OneshotSlot;
pub use router::Router;
pub use session::Endpoint;
