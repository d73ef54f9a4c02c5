//! Transport layer: the control surface a host embeds, the receiver
//! thread, and the two packet-flow paths a running session picks between.
//!
//! `pwar_core` provides the engine; `pwar_platform` provides the OS seam;
//! this crate is where the two meet a concrete session lifecycle.

mod error;
mod receiver;
mod state;

pub mod paths;
pub mod session;

pub use error::ControlError;
pub use receiver::dispatch_datagram;
pub use session::{ConfigUpdate, Session};
pub use state::SessionState;
