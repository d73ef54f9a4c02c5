#![cfg_attr(not(test), no_std)]
//! Wire format for the real-time UDP audio relay.
//!
//! This crate defines the two message shapes that ever cross the wire
//! between a client and a server endpoint: [`Packet`], carrying one
//! segment of an audio block, and [`MetricsPacket`], carrying a periodic
//! latency snapshot. Both have a fixed, byte-exact little-endian layout
//! (see [`Packet::WIRE_SIZE`] / [`MetricsPacket::WIRE_SIZE`]), which is how
//! a receiver distinguishes the two purely by `recvfrom` length.
//!
//! Nothing in here touches a socket. Transport lives in `pwar_platform`
//! and `pwar_transport`; this crate only knows how to turn values into
//! bytes and back.

mod clock;
mod metrics;
mod packet;

pub use clock::Clock;
pub use metrics::MetricsPacket;
pub use packet::{Packet, CHANNELS, MAX_CHUNK_SAMPLES};
