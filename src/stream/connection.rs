//! connection.rs
//! Background connection state machine: connect → read → decode → publish → reconnect.
//!
//! ```text
//!   Disconnected ──► Connecting ──► Connected
//!        ▲               │              │  peer close / read error /
//!        │               │ budget spent │  heartbeat failure / shutdown
//!        │               ▼              │
//!        │        terminal failure      │
//!        └──────────────────────────────┘
//! ```
//!
//! - Fixed reconnect delay between attempts, no exponential backoff
//! - Every blocking call carries a timeout so shutdown is observed within one heartbeat interval
//! - The reassembly buffer and the socket never leave this thread

use log::{debug, error, info, warn};
use socket2::{Domain, Protocol, SockAddr, SockRef, Socket, Type};
use std::{
    io::{self, ErrorKind, Read},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    sync::Arc,
    time::Duration,
};

use crate::stream::{
    liveness::{ConnectionState, Liveness},
    mailbox::Mailbox,
    reassembler::Reassembler,
};
use crate::utils::{
    config::{ClientConfig, Endpoint},
    stats::StreamStats,
};

/// Bytes requested per read; a few dozen frames.
const READ_CHUNK: usize = 4096;

/// State shared between the background thread and `TelemetryClient`.
#[derive(Debug, Default)]
pub struct Shared {
    pub liveness: Liveness,
    pub mailbox: Mailbox,
    pub stats: StreamStats,
}

pub type SharedLink = Arc<Shared>;

/// Why a connected epoch ended.
#[derive(Debug)]
enum Disconnect {
    PeerClosed,
    ReadFailed(io::Error),
    HeartbeatFailed(io::Error),
    Shutdown,
}

pub struct Connection {
    config: ClientConfig,
    shared: SharedLink,
    reassembler: Reassembler,
}

impl Connection {
    pub fn new(config: ClientConfig, shared: SharedLink) -> Self {
        Self {
            config,
            shared,
            reassembler: Reassembler::new(),
        }
    }

    /// Thread body. Returns when shutdown is requested or the retry budget is spent.
    pub fn run(mut self) {
        info!("[Connection] worker started for {}", self.config.endpoint);

        while self.shared.liveness.is_running() {
            let Some(mut stream) = self.connect() else {
                break;
            };

            let reason = self.stream_frames(&mut stream);
            self.teardown(stream, reason);
        }

        info!("[Connection] worker stopped for {}", self.config.endpoint);
    }

    /// Connecting state: retry with a fixed delay until connected, shut down or out of budget.
    fn connect(&mut self) -> Option<TcpStream> {
        let policy = self.config.reconnect;
        let liveness = &self.shared.liveness;
        let mut attempts: u32 = 0;

        while liveness.is_running() && policy.allows(attempts) {
            liveness.set_state(ConnectionState::Connecting);
            self.shared.stats.record_connect_attempt();
            info!(
                "[Connection] Attempting to connect to {} (attempt {}/{})",
                self.config.endpoint,
                attempts + 1,
                policy.budget_label()
            );

            match open_stream(
                &self.config.endpoint,
                self.config.connect_timeout,
                self.config.heartbeat_interval,
            ) {
                Ok(stream) => {
                    liveness.set_state(ConnectionState::Connected);
                    self.shared.stats.record_connection();
                    info!("[Connection] Connected to {}", self.config.endpoint);
                    return Some(stream);
                }
                Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
                    warn!("[Connection] Connection refused by {}", self.config.endpoint);
                }
                Err(e) => {
                    warn!("[Connection] Socket error while connecting to {}: {}", self.config.endpoint, e);
                }
            }

            attempts = attempts.saturating_add(1);
            liveness.set_state(ConnectionState::Disconnected);

            if policy.allows(attempts) {
                debug!("[Connection] Retrying in {:?}", policy.delay);
                if !liveness.sleep_while_running(policy.delay) {
                    return None;
                }
            }
        }

        if liveness.is_running() {
            error!(
                "[Connection] Max reconnection attempts ({}) reached for {}; giving up",
                policy.budget_label(),
                self.config.endpoint
            );
            liveness.mark_exhausted();
        }
        None
    }

    /// Connected state: read, reassemble, publish. Returns once the epoch ends.
    fn stream_frames(&mut self, stream: &mut TcpStream) -> Disconnect {
        let shared = &self.shared;
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if !shared.liveness.is_running() {
                return Disconnect::Shutdown;
            }

            match stream.read(&mut chunk) {
                Ok(0) => return Disconnect::PeerClosed,
                Ok(n) => {
                    shared.stats.record_bytes(n);
                    self.reassembler.feed(&chunk[..n], |decoded| match decoded {
                        Ok(frame) => {
                            let overwrote = shared.mailbox.publish(frame);
                            shared.stats.record_decoded(overwrote);
                        }
                        Err(e) => {
                            shared.stats.record_decode_failure();
                            warn!("[Connection] Skipping malformed frame: {}", e);
                        }
                    });
                }
                // Read timeout: nothing arrived for a heartbeat interval.
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    if let Some(reason) = self.heartbeat(stream) {
                        return reason;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Disconnect::ReadFailed(e),
            }
        }
    }

    /// Idle link: probe the peer. `Some` ends the epoch.
    fn heartbeat(&self, stream: &TcpStream) -> Option<Disconnect> {
        match probe(stream) {
            Ok(()) => {
                debug!("[Connection] Heartbeat ok, producer idle");
                None
            }
            Err(e) => {
                self.shared.stats.record_heartbeat_failure();
                Some(Disconnect::HeartbeatFailed(e))
            }
        }
    }

    /// Connected → Disconnected: clear liveness, drop partial bytes, close the socket.
    fn teardown(&mut self, stream: TcpStream, reason: Disconnect) {
        self.shared.liveness.set_state(ConnectionState::Disconnected);
        self.shared.stats.record_disconnect();

        let discarded = self.reassembler.buffered();
        self.reassembler.clear();
        if discarded > 0 {
            debug!("[Connection] Discarded {} bytes of partial frame", discarded);
        }

        let _ = stream.shutdown(Shutdown::Both);
        drop(stream);

        match reason {
            Disconnect::PeerClosed => info!("[Connection] Producer closed connection (received 0 bytes)"),
            Disconnect::ReadFailed(e) => warn!("[Connection] Connection error: {}", e),
            Disconnect::HeartbeatFailed(e) => warn!("[Connection] Heartbeat failed: {}", e),
            Disconnect::Shutdown => {
                debug!("[Connection] Closing connection for shutdown");
                return;
            }
        }
        info!("[Connection] Connection lost, attempting to reconnect...");
    }
}

/// Resolve `endpoint` and connect to the first address that accepts, with bounded waits.
fn open_stream(endpoint: &Endpoint, connect_timeout: Duration, read_timeout: Duration) -> io::Result<TcpStream> {
    let addrs: Vec<SocketAddr> = (endpoint.host.as_str(), endpoint.port).to_socket_addrs()?.collect();

    let mut last_err = io::Error::new(
        ErrorKind::AddrNotAvailable,
        format!("{} did not resolve to any address", endpoint),
    );

    for addr in addrs {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        match socket.connect_timeout(&SockAddr::from(addr), connect_timeout) {
            Ok(()) => {
                socket.set_nodelay(true)?;
                socket.set_keepalive(true)?;
                socket.set_read_timeout(Some(read_timeout))?;
                return Ok(socket.into());
            }
            Err(e) => last_err = e,
        }
    }
    Err(last_err)
}

/// Zero-payload write probe. Detects half-open connections where the peer vanished
/// without a FIN: a pending socket error or a failing send both count as dead.
fn probe(stream: &TcpStream) -> io::Result<()> {
    let sock = SockRef::from(stream);
    if let Some(err) = sock.take_error()? {
        return Err(err);
    }
    sock.send(&[])?;
    Ok(())
}
