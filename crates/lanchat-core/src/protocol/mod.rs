//! Protocol module containing the chat message types and the text codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_message, encode_message, ProtocolError};
pub use messages::{ChatMessage, MessageKind, MAX_DATAGRAM_SIZE, WIRE_DELIMITER};
