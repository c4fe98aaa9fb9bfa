//! # lanchat-core
//!
//! Shared library for the LAN multicast chat containing the wire protocol
//! codec and the chat message types.
//!
//! This crate is pure: it has zero dependencies on sockets, threads, or the
//! terminal. Everything that touches the network lives in the `lanchat`
//! application crate.
//!
//! # Architecture overview
//!
//! LAN chat is a serverless chat utility: every participant on the local
//! network joins the same IP multicast group, and every message is a single
//! UDP datagram broadcast to that group. There is no central server, no
//! connection state, and no delivery guarantee beyond what UDP provides.
//!
//! This crate defines:
//!
//! - **`protocol::messages`** – The [`ChatMessage`] value type and its
//!   [`MessageKind`] (join, chat, leave).
//!
//! - **`protocol::codec`** – How a [`ChatMessage`] travels over the wire:
//!   a UTF-8 text format with four `|`-separated fields, encoded and
//!   decoded by [`encode_message`] and [`decode_message`].

pub mod protocol;

// Re-export the most-used items at the crate root so callers can write
// `lanchat_core::ChatMessage` instead of the full module path.
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::{ChatMessage, MessageKind, MAX_DATAGRAM_SIZE};
