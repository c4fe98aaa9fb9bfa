//! Text codec for encoding and decoding chat messages.
//!
//! Wire format (UTF-8, exactly four delimiter-separated fields):
//! ```text
//! KIND|SENDER|TIMESTAMP|TEXT
//! ```
//! - `KIND` is the upper-case token of the [`MessageKind`] (`JOIN`, `CHAT`,
//!   `LEAVE`).
//! - `SENDER` is the sender identifier verbatim. It must not contain `|`;
//!   the codec does not escape it (see [`WIRE_DELIMITER`]).
//! - `TIMESTAMP` is the decimal epoch-millisecond integer.
//! - `TEXT` is everything after the third delimiter. Decoding splits into
//!   at most four parts, so `|` characters inside the text are harmless.
//!
//! The codec is stateless: both directions are free functions with no
//! shared state, safe to call from any thread.

use std::str;

use thiserror::Error;

use crate::protocol::messages::{ChatMessage, MessageKind, WIRE_DELIMITER};

/// Errors that can occur while decoding a datagram.
///
/// Encoding is infallible: every [`ChatMessage`] formats cleanly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The datagram is not valid UTF-8.
    #[error("datagram is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] str::Utf8Error),

    /// Fewer than four delimiter-separated fields were present, e.g. a
    /// truncated packet.
    #[error("malformed chat message: expected 4 fields, got {found}")]
    MissingFields { found: usize },

    /// The kind field is not one of the known wire tokens.
    #[error("unknown message kind: {0:?}")]
    UnknownKind(String),

    /// The timestamp field is not a valid decimal integer.
    #[error("invalid timestamp field: {0:?}")]
    InvalidTimestamp(String),
}

/// Encodes a [`ChatMessage`] into a UTF-8 byte vector suitable for
/// transmission as a single UDP datagram.
///
/// # Examples
///
/// ```rust
/// use lanchat_core::{encode_message, ChatMessage, MessageKind};
///
/// let msg = ChatMessage::new(MessageKind::Chat, "bob", 1000, Some("Hello LAN chat".into()));
/// assert_eq!(encode_message(&msg), b"CHAT|bob|1000|Hello LAN chat");
/// ```
pub fn encode_message(msg: &ChatMessage) -> Vec<u8> {
    format!(
        "{kind}{d}{sender}{d}{ts}{d}{text}",
        kind = msg.kind().wire_token(),
        sender = msg.sender(),
        ts = msg.timestamp_ms(),
        text = msg.text(),
        d = WIRE_DELIMITER,
    )
    .into_bytes()
}

/// Decodes a [`ChatMessage`] from the bytes of a received datagram.
///
/// # Errors
///
/// Returns [`ProtocolError`] when the bytes are not UTF-8, fewer than four
/// fields are present, the kind token is unrecognized, or the timestamp is
/// not a decimal integer.
///
/// # Examples
///
/// ```rust
/// use lanchat_core::{decode_message, MessageKind};
///
/// let msg = decode_message(b"JOIN|alice|1700000000000|").unwrap();
/// assert_eq!(msg.kind(), MessageKind::Join);
/// assert_eq!(msg.sender(), "alice");
/// assert_eq!(msg.text(), "");
/// ```
pub fn decode_message(bytes: &[u8]) -> Result<ChatMessage, ProtocolError> {
    let raw = str::from_utf8(bytes)?;

    // Cap the split at four parts so the text field may contain delimiters.
    let parts: Vec<&str> = raw.splitn(4, WIRE_DELIMITER).collect();
    if parts.len() < 4 {
        return Err(ProtocolError::MissingFields { found: parts.len() });
    }

    let kind = MessageKind::from_wire_token(parts[0])
        .ok_or_else(|| ProtocolError::UnknownKind(parts[0].to_string()))?;
    let sender = parts[1];
    let timestamp_ms: u64 = parts[2]
        .parse()
        .map_err(|_| ProtocolError::InvalidTimestamp(parts[2].to_string()))?;
    let text = parts[3];

    Ok(ChatMessage::new(
        kind,
        sender,
        timestamp_ms,
        Some(text.to_string()),
    ))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
