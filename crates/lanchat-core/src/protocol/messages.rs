//! Chat message types exchanged over the multicast group.
//!
//! A [`ChatMessage`] is an immutable value created at the call site that
//! wants to announce a join, a leave, or a typed line. It is handed to the
//! transport for encoding and then discarded — there is no storage, no
//! mutation, and no identity beyond structural equality.

use std::time::{SystemTime, UNIX_EPOCH};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Field separator used by the wire format.
///
/// Sender identifiers must not contain this character. The codec does not
/// escape it; a `|` inside the sender field would shift every following
/// field on decode. The text field is exempt because it is always last
/// (decoding splits into at most four parts). This matches the reference
/// wire format and is kept for compatibility rather than fixed by escaping.
pub const WIRE_DELIMITER: char = '|';

/// Largest datagram the receive loop will read, in bytes.
///
/// Messages whose encoded form exceeds this are truncated by the receiving
/// socket. Truncation cuts off the tail of the text field (the last field on
/// the wire), so framing survives but content is silently lost.
pub const MAX_DATAGRAM_SIZE: usize = 4096;

// ── Message kind ──────────────────────────────────────────────────────────────

/// The semantic kind of a chat message.
///
/// This is a closed set: lifecycle announcements (`Join` / `Leave`) and
/// ordinary content messages (`Chat`). The wire token is the upper-case
/// symbolic name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// A user has joined the chat session.
    Join,
    /// A standard chat message typed by a user.
    Chat,
    /// A user has left the chat session.
    Leave,
}

impl MessageKind {
    /// Returns the token used for this kind on the wire.
    pub fn wire_token(self) -> &'static str {
        match self {
            MessageKind::Join => "JOIN",
            MessageKind::Chat => "CHAT",
            MessageKind::Leave => "LEAVE",
        }
    }

    /// Parses a wire token back into a kind.
    ///
    /// Returns `None` for anything other than the three known tokens —
    /// matching is exact and case-sensitive.
    pub fn from_wire_token(token: &str) -> Option<Self> {
        match token {
            "JOIN" => Some(MessageKind::Join),
            "CHAT" => Some(MessageKind::Chat),
            "LEAVE" => Some(MessageKind::Leave),
            _ => None,
        }
    }
}

// ── Chat message ──────────────────────────────────────────────────────────────

/// A single chat message exchanged over the network.
///
/// Carries everything a receiver needs to interpret and display it: the
/// [`MessageKind`], the sender identity, the creation timestamp (epoch
/// milliseconds, assigned by the producing side and not validated by the
/// receiver), and the text content.
///
/// The kind and sender are always present — the type system enforces this,
/// so there is no "missing field" state to defend against. The text is
/// never absent either: [`ChatMessage::new`] normalizes `None` to the
/// empty string.
///
/// # Examples
///
/// ```rust
/// use lanchat_core::{ChatMessage, MessageKind};
///
/// let msg = ChatMessage::chat("bob", "Hello LAN chat");
/// assert_eq!(msg.kind(), MessageKind::Chat);
/// assert_eq!(msg.sender(), "bob");
/// assert_eq!(msg.text(), "Hello LAN chat");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    kind: MessageKind,
    sender: String,
    timestamp_ms: u64,
    text: String,
}

impl ChatMessage {
    /// Constructs a message from its parts.
    ///
    /// An absent text (`None`) is normalized to the empty string so that
    /// [`text`](Self::text) never has a "missing" state.
    pub fn new(
        kind: MessageKind,
        sender: impl Into<String>,
        timestamp_ms: u64,
        text: Option<String>,
    ) -> Self {
        Self {
            kind,
            sender: sender.into(),
            timestamp_ms,
            text: text.unwrap_or_default(),
        }
    }

    /// Creates a [`MessageKind::Join`] announcement for `sender`, stamped
    /// with the current system time.
    pub fn join(sender: impl Into<String>) -> Self {
        Self::new(MessageKind::Join, sender, now_ms(), None)
    }

    /// Creates a [`MessageKind::Chat`] message with text content, stamped
    /// with the current system time.
    pub fn chat(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(MessageKind::Chat, sender, now_ms(), Some(text.into()))
    }

    /// Creates a [`MessageKind::Leave`] announcement for `sender`, stamped
    /// with the current system time.
    pub fn leave(sender: impl Into<String>) -> Self {
        Self::new(MessageKind::Leave, sender, now_ms(), None)
    }

    /// The semantic kind of this message.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// The sender's identifier.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Creation time in milliseconds since the Unix epoch.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// The text content. Empty for `Join` / `Leave`, arbitrary (possibly
    /// empty) for `Chat`. Never absent.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Returns the current time as milliseconds since the Unix epoch.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
