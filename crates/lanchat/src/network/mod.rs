//! Network infrastructure for the chat application.
//!
//! A single module today: the UDP multicast transport that every chat
//! participant uses both to send and to receive.

pub mod multicast;

pub use multicast::{MulticastTransport, TransportError};
