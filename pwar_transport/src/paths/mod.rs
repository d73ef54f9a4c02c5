//! The two packet-flow strategies a session can be configured to run:
//! [`oneshot`] and [`ping_pong`]. Exactly one runs per callback, selected
//! by [`pwar_core::Endpoint::is_oneshot`].

pub mod oneshot;
pub mod ping_pong;
