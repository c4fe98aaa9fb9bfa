//! UDP multicast transport for the LAN chat.
//!
//! A [`MulticastTransport`] owns one UDP socket bound to the configured
//! port and joined to the configured multicast group. Construction acquires
//! both together; [`shutdown`](MulticastTransport::shutdown) releases both
//! together. The transport never holds the socket without group membership
//! or vice versa.
//!
//! Receiving runs on a dedicated background thread started by
//! [`start`](MulticastTransport::start): it blocks on the socket, decodes
//! each datagram, and invokes the caller's handler for every well-formed
//! message. A malformed datagram from a misbehaving peer is logged and
//! dropped; it never crashes the loop or blocks the next message.
//!
//! # Shutdown
//!
//! The socket is configured with a 500 ms read timeout. The receive loop
//! re-checks the `running` flag on every timeout, so a shutdown call is
//! observed within one timeout interval without needing to interrupt a
//! blocked `recv_from`. Shutdown is idempotent: the flag is flipped with an
//! atomic swap and group membership is left exactly once.
//!
//! # Handler contract
//!
//! The handler passed to `start` executes on the receive thread. A handler
//! that blocks stalls all further inbound delivery; handlers that need to
//! do real work should forward to a channel or another execution context.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use lanchat_core::{decode_message, encode_message, ChatMessage, MAX_DATAGRAM_SIZE};
use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tracing::{debug, error, warn};

/// How long a blocking `recv_from` waits before re-checking the running flag.
const RECV_TIMEOUT: Duration = Duration::from_millis(500);

/// Name of the background receive thread.
const RECV_THREAD_NAME: &str = "lanchat-recv";

/// Errors produced by the multicast transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The configured group address is not a valid IPv4 address.
    #[error("invalid multicast group address {addr:?}: {source}")]
    InvalidGroupAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// The configured address is valid IPv4 but outside the multicast range.
    #[error("{0} is not a multicast address (must be in 224.0.0.0 – 239.255.255.255)")]
    NotMulticast(Ipv4Addr),

    /// The UDP socket could not be created.
    #[error("failed to create UDP socket: {0}")]
    Socket(#[source] std::io::Error),

    /// A socket option could not be applied.
    #[error("failed to set socket option {option}: {source}")]
    SocketOption {
        option: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The UDP socket could not be bound to the chat port.
    #[error("failed to bind chat socket on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The multicast group could not be joined.
    #[error("failed to join multicast group {group}: {source}")]
    JoinFailed {
        group: Ipv4Addr,
        #[source]
        source: std::io::Error,
    },

    /// A datagram could not be transmitted.
    #[error("failed to send datagram: {0}")]
    SendFailed(#[source] std::io::Error),

    /// The transport has been shut down.
    #[error("transport is shut down")]
    Closed,

    /// `start` was called more than once on the same transport.
    #[error("receive loop already started")]
    AlreadyStarted,
}

/// Subset of the application configuration the transport needs.
///
/// Re-exported from [`crate::config`]; defined there so the TOML schema and
/// the transport agree on field meanings.
pub use crate::config::NetworkConfig;

/// Handles UDP multicast communication for the LAN chat.
///
/// One instance owns one socket and one group membership. `send` is safe to
/// call concurrently from multiple threads; each call transmits exactly one
/// independent datagram.
pub struct MulticastTransport {
    group: Ipv4Addr,
    port: u16,
    socket: Arc<UdpSocket>,
    running: Arc<AtomicBool>,
    started: AtomicBool,
}

impl MulticastTransport {
    /// Creates the transport: binds the UDP socket, applies the multicast
    /// TTL, enables multicast loopback, and joins the group.
    ///
    /// The socket is created with `SO_REUSEADDR` so several chat processes
    /// (or several transports in one test process) can share the port on
    /// one host.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the group address is unparseable or not
    /// multicast, the socket cannot be created or bound, or group membership
    /// cannot be established. A transport that fails to construct holds no
    /// resources.
    pub fn new(config: &NetworkConfig) -> Result<Self, TransportError> {
        let group: Ipv4Addr =
            config
                .group_address
                .parse()
                .map_err(|source| TransportError::InvalidGroupAddress {
                    addr: config.group_address.clone(),
                    source,
                })?;
        if !group.is_multicast() {
            return Err(TransportError::NotMulticast(group));
        }

        let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));

        // std's UdpSocket::bind cannot set SO_REUSEADDR before binding, so
        // the socket is built through socket2 and then converted.
        let raw = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(TransportError::Socket)?;
        raw.set_reuse_address(true)
            .map_err(|source| TransportError::SocketOption {
                option: "SO_REUSEADDR",
                source,
            })?;
        raw.bind(&bind_addr.into())
            .map_err(|source| TransportError::BindFailed {
                addr: bind_addr,
                source,
            })?;

        let socket: UdpSocket = raw.into();
        socket
            .set_multicast_ttl_v4(config.ttl)
            .map_err(|source| TransportError::SocketOption {
                option: "IP_MULTICAST_TTL",
                source,
            })?;
        // Loopback on, so several participants on one host see each other.
        socket
            .set_multicast_loop_v4(true)
            .map_err(|source| TransportError::SocketOption {
                option: "IP_MULTICAST_LOOP",
                source,
            })?;
        socket
            .set_read_timeout(Some(RECV_TIMEOUT))
            .map_err(|source| TransportError::SocketOption {
                option: "SO_RCVTIMEO",
                source,
            })?;
        socket
            .join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)
            .map_err(|source| TransportError::JoinFailed { group, source })?;

        Ok(Self {
            group,
            port: config.port,
            socket: Arc::new(socket),
            running: Arc::new(AtomicBool::new(true)),
            started: AtomicBool::new(false),
        })
    }

    /// The multicast group this transport is joined to.
    pub fn group(&self) -> Ipv4Addr {
        self.group
    }

    /// The UDP port this transport is bound to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Starts the background receive loop. Returns immediately.
    ///
    /// `handler` is invoked synchronously on the receive thread for every
    /// successfully decoded inbound message (including messages this
    /// transport sent itself, via multicast loopback — filtering out the
    /// local sender is the caller's job).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::AlreadyStarted`] on a second call — one
    /// transport runs at most one receive loop — and
    /// [`TransportError::Closed`] if the transport was already shut down.
    pub fn start<F>(&self, handler: F) -> Result<(), TransportError>
    where
        F: Fn(ChatMessage) + Send + 'static,
    {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(TransportError::AlreadyStarted);
        }
        if !self.running.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }

        let socket = Arc::clone(&self.socket);
        let running = Arc::clone(&self.running);

        std::thread::Builder::new()
            .name(RECV_THREAD_NAME.to_string())
            .spawn(move || listen(&socket, &running, handler))
            .expect("failed to spawn receive thread");

        debug!("receive loop started on {}:{}", self.group, self.port);
        Ok(())
    }

    /// Encodes `message` and transmits it to the group as one datagram.
    ///
    /// Safe to call concurrently; datagram boundaries are preserved because
    /// each call maps to exactly one `send_to`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] after shutdown and
    /// [`TransportError::SendFailed`] if the underlying transmission fails.
    /// Send failures are not retried; UDP gives no delivery guarantee
    /// either way.
    pub fn send(&self, message: &ChatMessage) -> Result<(), TransportError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }

        let data = encode_message(message);
        self.socket
            .send_to(&data, (self.group, self.port))
            .map_err(TransportError::SendFailed)?;
        Ok(())
    }

    /// Stops the transport: clears the running flag and leaves the
    /// multicast group.
    ///
    /// Idempotent — extra calls are no-ops. The receive loop observes the
    /// cleared flag within one read timeout and exits; the socket itself is
    /// released when the last reference (transport or receive thread) is
    /// dropped. `send` calls racing with shutdown may fail with
    /// [`TransportError::Closed`], which callers should tolerate during
    /// teardown.
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return; // already shut down
        }

        // Best effort: membership is gone with the socket anyway.
        if let Err(e) = self
            .socket
            .leave_multicast_v4(&self.group, &Ipv4Addr::UNSPECIFIED)
        {
            debug!("failed to leave multicast group {}: {e}", self.group);
        }
        debug!("multicast transport on {}:{} shut down", self.group, self.port);
    }
}

impl Drop for MulticastTransport {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The receive loop executed on the background thread.
///
/// Runs until `running` is cleared. Decode failures and transient socket
/// errors are reported and skipped; a socket error observed after the flag
/// was cleared is the normal consequence of shutdown and ends the loop
/// silently.
fn listen<F>(socket: &UdpSocket, running: &AtomicBool, handler: F)
where
    F: Fn(ChatMessage),
{
    let mut buf = [0u8; MAX_DATAGRAM_SIZE];

    while running.load(Ordering::SeqCst) {
        let (len, src) = match socket.recv_from(&mut buf) {
            Ok(pair) => pair,
            Err(e) if is_timeout_error(&e) => continue,
            Err(e) => {
                if running.load(Ordering::SeqCst) {
                    error!("network receive error: {e}");
                    continue;
                }
                // Expected: shutdown tore the socket down mid-receive.
                break;
            }
        };

        match decode_message(&buf[..len]) {
            Ok(message) => handler(message),
            Err(e) => warn!("dropping malformed datagram from {src}: {e}"),
        }
    }

    debug!("receive loop stopped");
}

/// Returns `true` for OS timeout / would-block errors that should be retried.
fn is_timeout_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Config bound to an OS-assigned port so tests never collide.
    fn ephemeral_config() -> NetworkConfig {
        NetworkConfig {
            group_address: "230.0.0.1".to_string(),
            port: 0,
            ttl: 0,
        }
    }

    #[test]
    fn test_is_timeout_error_recognises_timed_out() {
        let e = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");

        assert!(is_timeout_error(&e));
    }

    #[test]
    fn test_is_timeout_error_recognises_would_block() {
        let e = std::io::Error::new(std::io::ErrorKind::WouldBlock, "would block");

        assert!(is_timeout_error(&e));
    }

    #[test]
    fn test_is_timeout_error_returns_false_for_other_errors() {
        let e = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");

        assert!(!is_timeout_error(&e));
    }

    #[test]
    fn test_new_rejects_unparseable_group_address() {
        let config = NetworkConfig {
            group_address: "not-an-address".to_string(),
            ..ephemeral_config()
        };

        let result = MulticastTransport::new(&config);

        assert!(matches!(
            result,
            Err(TransportError::InvalidGroupAddress { .. })
        ));
    }

    #[test]
    fn test_new_rejects_non_multicast_address() {
        let config = NetworkConfig {
            group_address: "192.168.1.1".to_string(),
            ..ephemeral_config()
        };

        let result = MulticastTransport::new(&config);

        assert!(matches!(result, Err(TransportError::NotMulticast(_))));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let transport =
            MulticastTransport::new(&ephemeral_config()).expect("transport must construct");

        transport.shutdown();
        transport.shutdown(); // second call must be a harmless no-op
    }

    #[test]
    fn test_send_after_shutdown_returns_closed() {
        let transport =
            MulticastTransport::new(&ephemeral_config()).expect("transport must construct");
        transport.shutdown();

        let result = transport.send(&ChatMessage::chat("tester", "too late"));

        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[test]
    fn test_second_start_fails_loudly() {
        let transport =
            MulticastTransport::new(&ephemeral_config()).expect("transport must construct");

        transport.start(|_| {}).expect("first start must succeed");
        let second = transport.start(|_| {});

        assert!(matches!(second, Err(TransportError::AlreadyStarted)));
        transport.shutdown();
    }

    #[test]
    fn test_start_after_shutdown_returns_closed() {
        let transport =
            MulticastTransport::new(&ephemeral_config()).expect("transport must construct");
        transport.shutdown();

        let result = transport.start(|_| {});

        assert!(matches!(result, Err(TransportError::Closed)));
    }
}
