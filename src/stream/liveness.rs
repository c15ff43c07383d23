//! liveness.rs
//! Connection state shared between the background thread and callers.
//!
//! One mutex guards the connection state, the "ever connected" latch, the
//! running flag and the exhausted flag; a condition variable is signalled on
//! every change so blocked callers wake on connect, on terminal failure and on
//! shutdown without polling.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::utils::error::StreamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug)]
struct LinkState {
    connection: ConnectionState,
    ever_connected: bool,
    running: bool,
    // Retry budget spent; the background thread is gone for good.
    exhausted: bool,
}

#[derive(Debug)]
pub struct Liveness {
    state: Mutex<LinkState>,
    changed: Condvar,
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LinkState {
                connection: ConnectionState::Disconnected,
                ever_connected: false,
                running: true,
                exhausted: false,
            }),
            changed: Condvar::new(),
        }
    }

    /// Transition the connection state. Ignored after shutdown so a late
    /// `Connected` from the background thread cannot resurrect the flag.
    pub fn set_state(&self, next: ConnectionState) {
        let mut s = self.state.lock();
        if !s.running {
            return;
        }
        s.connection = next;
        if next == ConnectionState::Connected {
            s.ever_connected = true;
        }
        self.changed.notify_all();
    }

    pub fn state(&self) -> ConnectionState {
        self.state.lock().connection
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state.lock().connection == ConnectionState::Connected
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    pub fn is_exhausted(&self) -> bool {
        self.state.lock().exhausted
    }

    pub fn mark_exhausted(&self) {
        let mut s = self.state.lock();
        s.exhausted = true;
        s.connection = ConnectionState::Disconnected;
        self.changed.notify_all();
    }

    /// Clear the running flag and wake every waiter. Returns `true` on the first call only.
    pub fn request_shutdown(&self) -> bool {
        let mut s = self.state.lock();
        if !s.running {
            return false;
        }
        s.running = false;
        s.connection = ConnectionState::Disconnected;
        self.changed.notify_all();
        true
    }

    /// Block until the link has been `Connected` at least once.
    ///
    /// Fails fast with `Timeout` once the retry budget is spent (no connection
    /// can ever arrive) and with `Shutdown` after shutdown.
    pub fn wait_first_connection(&self, deadline: Instant) -> Result<(), StreamError> {
        let mut s = self.state.lock();
        loop {
            if !s.running {
                return Err(StreamError::Shutdown);
            }
            if s.ever_connected {
                return Ok(());
            }
            if s.exhausted {
                return Err(StreamError::Timeout(
                    "reconnect attempts exhausted before any connection".to_string(),
                ));
            }
            if Instant::now() >= deadline {
                return Err(StreamError::Timeout(
                    "failed to connect to the producer".to_string(),
                ));
            }
            self.changed.wait_until(&mut s, deadline);
        }
    }

    /// Sleep for `delay` unless shutdown is requested first. Returns `true` if still running.
    pub fn sleep_while_running(&self, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        let mut s = self.state.lock();
        while s.running {
            if self.changed.wait_until(&mut s, deadline).timed_out() {
                break;
            }
        }
        s.running
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}
