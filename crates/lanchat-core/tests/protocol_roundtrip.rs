//! Integration tests for the lanchat-core protocol codec.
//!
//! These tests exercise the codec and message types together through the
//! public API, the way the transport uses them: construct a message, encode
//! it to datagram bytes, decode the bytes on the "receiving" side, and
//! compare.

use lanchat_core::{decode_message, encode_message, ChatMessage, MessageKind, ProtocolError};

/// Encodes a message and decodes it back, asserting structural equality.
fn roundtrip(msg: ChatMessage) -> ChatMessage {
    let bytes = encode_message(&msg);
    decode_message(&bytes).expect("decode must succeed")
}

#[test]
fn test_roundtrip_join_message() {
    let original = ChatMessage::join("alice");

    let decoded = roundtrip(original.clone());

    assert_eq!(original, decoded);
}

#[test]
fn test_roundtrip_chat_message() {
    let original = ChatMessage::chat("bob", "Hello LAN chat");

    let decoded = roundtrip(original.clone());

    assert_eq!(original, decoded);
    assert_eq!(decoded.kind(), MessageKind::Chat);
    assert_eq!(decoded.sender(), "bob");
    assert_eq!(decoded.text(), "Hello LAN chat");
}

#[test]
fn test_roundtrip_leave_message() {
    let original = ChatMessage::leave("carol");

    assert_eq!(original, roundtrip(original.clone()));
}

#[test]
fn test_roundtrip_preserves_timestamp_exactly() {
    let original = ChatMessage::new(MessageKind::Chat, "bob", u64::MAX, Some("x".to_string()));

    let decoded = roundtrip(original.clone());

    assert_eq!(decoded.timestamp_ms(), u64::MAX);
}

#[test]
fn test_roundtrip_text_with_embedded_delimiters() {
    let original = ChatMessage::chat("bob", "pipes | in | text || everywhere");

    assert_eq!(original, roundtrip(original.clone()));
}

#[test]
fn test_decoding_a_truncated_datagram_fails_without_panicking() {
    // Simulate a packet cut off before the third delimiter.
    let full = encode_message(&ChatMessage::chat("bob", "this will be cut"));
    let truncated = &full[..10];

    let result = decode_message(truncated);

    assert!(matches!(
        result,
        Err(ProtocolError::MissingFields { .. }) | Err(ProtocolError::InvalidTimestamp(_))
    ));
}

#[test]
fn test_decode_failure_does_not_poison_subsequent_decodes() {
    // The codec is stateless: a malformed datagram must not affect the next.
    assert!(decode_message(b"PING|bob|1000|hi").is_err());

    let ok = decode_message(b"CHAT|bob|1000|still fine").expect("decode must succeed");
    assert_eq!(ok.text(), "still fine");
}
