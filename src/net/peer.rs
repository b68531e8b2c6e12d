//! A single non-blocking datagram connection to one remote peer.
//!
//! Redundant sends, inbound dedup, and the connect handshake all live
//! here; the coordinator above only ever sees decoded, deduplicated
//! messages.

use crate::net::codec::{decode, encode, dedup_key, DecodeError, Message};
use std::collections::HashSet;
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

/// Number of times a command-bearing or handshake-bearing frame is
/// resent, to survive datagram loss without an acknowledgement
/// protocol.
pub const REDUNDANCY: u32 = 3;

const MAX_DATAGRAM: usize = 2048;

/// Failures from socket setup. Per-packet I/O errors on send are logged
/// and swallowed, not surfaced as this type — redundancy and the next
/// tick cover for a dropped send.
#[derive(Debug)]
pub enum PeerError {
    /// Binding the local socket failed.
    Bind(std::io::Error),
    /// The given peer address failed to resolve.
    Resolve(std::io::Error),
    /// Setting the socket to non-blocking mode failed.
    NonBlocking(std::io::Error),
}

impl fmt::Display for PeerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerError::Bind(e) => write!(f, "failed to bind datagram socket: {e}"),
            PeerError::Resolve(e) => write!(f, "failed to resolve peer address: {e}"),
            PeerError::NonBlocking(e) => write!(f, "failed to set socket non-blocking: {e}"),
        }
    }
}

impl std::error::Error for PeerError {}

/// One datagram socket bound to talk to exactly one remote peer.
///
/// Reads are non-blocking; writes are opportunistic (a failed send is
/// logged and dropped — redundancy covers it).
#[derive(Debug)]
pub struct DatagramPeer {
    socket: UdpSocket,
    remote: Option<SocketAddr>,
    seen: HashSet<(u32, u8)>,
}

impl DatagramPeer {
    /// Bind a socket on `local_addr` (use port 0 for an ephemeral port).
    ///
    /// # Errors
    /// Returns [`PeerError::Bind`] or [`PeerError::NonBlocking`] if the
    /// underlying socket calls fail.
    pub fn bind(local_addr: impl ToSocketAddrs) -> Result<Self, PeerError> {
        let socket = UdpSocket::bind(local_addr).map_err(PeerError::Bind)?;
        socket.set_nonblocking(true).map_err(PeerError::NonBlocking)?;
        Ok(Self { socket, remote: None, seen: HashSet::new() })
    }

    /// Bind and immediately fix the remote peer address (used by the
    /// joiner, which already knows where to send).
    ///
    /// # Errors
    /// As [`DatagramPeer::bind`], plus [`PeerError::Resolve`] if
    /// `remote_addr` does not resolve.
    pub fn connect(local_addr: impl ToSocketAddrs, remote_addr: impl ToSocketAddrs) -> Result<Self, PeerError> {
        let mut peer = Self::bind(local_addr)?;
        let resolved = remote_addr.to_socket_addrs().map_err(PeerError::Resolve)?.next().ok_or_else(|| {
            PeerError::Resolve(std::io::Error::new(std::io::ErrorKind::InvalidInput, "no addresses resolved"))
        })?;
        peer.remote = Some(resolved);
        Ok(peer)
    }

    /// The peer address, once known (the host only learns it after the
    /// first inbound `CONNECT`).
    #[must_use]
    pub fn remote(&self) -> Option<SocketAddr> {
        self.remote
    }

    /// The local address this socket is bound to.
    ///
    /// # Errors
    /// Returns an error if the underlying socket query fails.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Record a newly-learned peer address (the host does this on first
    /// inbound `CONNECT`).
    pub fn set_remote(&mut self, addr: SocketAddr) {
        self.remote = Some(addr);
    }

    /// Send `message` [`REDUNDANCY`] times to the known remote address.
    /// A no-op if the remote address is not yet known.
    pub fn send_redundant(&self, message: &Message) {
        let Some(remote) = self.remote else { return };
        let frame = encode(message);
        for _ in 0..REDUNDANCY {
            if let Err(e) = self.socket.send_to(&frame, remote) {
                log::warn!("datagram send failed: {e}");
            }
        }
    }

    /// Send `message` once to `addr`, regardless of the currently known
    /// remote (used by the host replying to an unconfirmed joiner
    /// address during the handshake).
    pub fn send_redundant_to(&self, message: &Message, addr: SocketAddr) {
        let frame = encode(message);
        for _ in 0..REDUNDANCY {
            if let Err(e) = self.socket.send_to(&frame, addr) {
                log::warn!("datagram send failed: {e}");
            }
        }
    }

    /// Drain every pending datagram, decoding and deduplicating as it
    /// goes. Malformed frames are logged and dropped; duplicate
    /// `(tick, kind)` pairs are silently dropped.
    ///
    /// Returns each newly-seen message paired with its sender address.
    pub fn drain(&mut self) -> Vec<(Message, SocketAddr)> {
        let mut out = Vec::new();
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((len, from)) => match decode(&buf[..len]) {
                    Ok(message) => {
                        if self.seen.insert(dedup_key(&message)) {
                            out.push((message, from));
                        }
                    }
                    Err(DecodeError::UnknownMessageKind(kind)) => {
                        log::warn!("dropped datagram with unknown message kind {kind}");
                    }
                    Err(e) => {
                        log::warn!("dropped malformed datagram: {e}");
                    }
                },
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    log::warn!("datagram recv failed: {e}");
                    break;
                }
            }
        }
        out
    }
}

/// Outcome of the four-step connect handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Map-generation seed both peers must use.
    pub seed: u32,
    /// Ticks per second both peers run at.
    pub tick_rate: u32,
    /// This process's assigned player id (0 = host, 1 = joiner).
    pub player_id: u8,
}

/// Host side of the handshake: bind, wait for the first `CONNECT`,
/// record the sender as the peer, and reply with `CONNECT_ACK` until a
/// polling timeout for giving up is reached by the caller.
///
/// `seed` and `tick_rate` are supplied by the caller (the host
/// generates the seed from a non-simulation clock source before
/// calling this).
///
/// Blocks the calling thread, polling at a short interval, until a
/// `CONNECT` is seen. Returns the peer with its remote address set and
/// the info that was sent.
pub fn host_handshake(peer: &mut DatagramPeer, seed: u32, tick_rate: u32, poll_interval: Duration) -> ConnectionInfo {
    loop {
        for (message, from) in peer.drain() {
            if matches!(message, Message::Connect) {
                peer.set_remote(from);
                let ack = Message::ConnectAck { seed, tick_rate, your_player_id: 1 };
                peer.send_redundant_to(&ack, from);
                return ConnectionInfo { seed, tick_rate, player_id: 0 };
            }
        }
        std::thread::sleep(poll_interval);
    }
}

/// Joiner side of the handshake: resend `CONNECT` at `resend_interval`
/// until a `CONNECT_ACK` arrives.
pub fn join_handshake(peer: &mut DatagramPeer, resend_interval: Duration) -> ConnectionInfo {
    let mut last_sent = Instant::now() - resend_interval;
    loop {
        if last_sent.elapsed() >= resend_interval {
            peer.send_redundant(&Message::Connect);
            last_sent = Instant::now();
        }
        for (message, _) in peer.drain() {
            if let Message::ConnectAck { seed, tick_rate, your_player_id } = message {
                return ConnectionInfo { seed, tick_rate, player_id: your_player_id };
            }
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}
