//! client.rs
//! Consumer-facing handle for the telemetry stream.
//!
//! Construction spawns the background connection thread immediately. Any number
//! of threads may call into a shared `&TelemetryClient`; all blocking calls are
//! deadline-bounded and return promptly after `shutdown()`.

use crossbeam::channel::{Receiver, RecvTimeoutError, bounded};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crate::stream::{
    connection::{Connection, Shared, SharedLink},
    frame::Frame,
    liveness::ConnectionState,
};
use crate::utils::{
    config::{ClientConfig, Endpoint},
    error::{Result, StreamError},
    stats::StatsSnapshot,
};

/// Lower bound on a consumer wait slice so a zero poll interval cannot spin.
const MIN_POLL: Duration = Duration::from_millis(1);

pub struct TelemetryClient {
    endpoint: Endpoint,
    shared: SharedLink,
    worker: Mutex<Option<JoinHandle<()>>>,
    // Disconnects when the worker thread returns (its sender is dropped).
    worker_done: Receiver<()>,
    shutdown_timeout: Duration,
}

impl TelemetryClient {
    /// Start streaming from `config.endpoint`. Fails only if the thread cannot be spawned.
    pub fn new(config: ClientConfig) -> io::Result<Self> {
        let shared: SharedLink = Arc::new(Shared::default());
        let (done_tx, done_rx) = bounded::<()>(1);

        let endpoint = config.endpoint.clone();
        let shutdown_timeout = config.shutdown_timeout;
        let connection = Connection::new(config, shared.clone());

        let handle = thread::Builder::new()
            .name("tm-telemetry-conn".to_string())
            .spawn(move || {
                let _done = done_tx;
                connection.run();
            })?;

        info!("[Client] Streaming client created for {}", endpoint);

        Ok(Self {
            endpoint,
            shared,
            worker: Mutex::new(Some(handle)),
            worker_done: done_rx,
            shutdown_timeout,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Block until the client has connected at least once, or `timeout` elapses.
    pub fn await_first_connection(&self, timeout: Duration) -> Result<()> {
        self.shared
            .liveness
            .wait_first_connection(Instant::now() + timeout)
    }

    /// Take the newest frame, waiting up to `timeout` for one to arrive.
    ///
    /// Requires a prior connection (the wait for it counts against `timeout`).
    /// While the mailbox is empty the caller sleeps at most `poll_interval`
    /// between checks; a publish wakes it early. Each frame is returned once.
    pub fn get_latest(&self, poll_interval: Duration, timeout: Duration) -> Result<Frame> {
        let deadline = Instant::now() + timeout;
        self.shared.liveness.wait_first_connection(deadline)?;

        let poll = poll_interval.max(MIN_POLL);
        loop {
            if !self.shared.liveness.is_running() {
                return Err(StreamError::Shutdown);
            }
            if let Some(frame) = self.shared.mailbox.take() {
                self.shared.stats.record_taken();
                return Ok(frame);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(StreamError::Timeout(format!(
                    "no data received for {:?}",
                    timeout
                )));
            }

            if let Some(frame) = self.shared.mailbox.wait_take(poll.min(deadline - now)) {
                if !self.shared.liveness.is_running() {
                    return Err(StreamError::Shutdown);
                }
                self.shared.stats.record_taken();
                return Ok(frame);
            }
        }
    }

    /// Take the newest frame without waiting. `None` if empty or shut down.
    pub fn try_latest(&self) -> Option<Frame> {
        if !self.shared.liveness.is_running() {
            return None;
        }
        let frame = self.shared.mailbox.take();
        if frame.is_some() {
            self.shared.stats.record_taken();
        }
        frame
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.shared.liveness.is_connected()
    }

    /// `true` once the background thread has spent its reconnect budget and exited.
    pub fn retries_exhausted(&self) -> bool {
        self.shared.liveness.is_exhausted()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.shared.liveness.state()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Stop the background thread and wake all waiters. Idempotent and terminal.
    ///
    /// Waits at most the configured shutdown timeout for the thread to exit;
    /// a thread that overruns is detached.
    pub fn shutdown(&self) {
        if self.shared.liveness.request_shutdown() {
            info!("[Client] Shutting down stream from {}", self.endpoint);
        }
        self.shared.mailbox.wake_all();

        let Some(handle) = self.worker.lock().take() else {
            return;
        };

        match self.worker_done.recv_timeout(self.shutdown_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    warn!("[Client] Connection thread panicked");
                }
                debug!("[Client] Connection thread joined");
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "[Client] Connection thread did not stop within {:?}; detaching",
                    self.shutdown_timeout
                );
            }
        }
    }
}

impl Drop for TelemetryClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::ReconnectPolicy;
    use std::net::TcpListener;

    fn unreachable_port() -> u16 {
        let l = TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    }

    fn quick_config(port: u16, attempts: u32) -> ClientConfig {
        ClientConfig::new("127.0.0.1", port)
            .with_reconnect(ReconnectPolicy::limited(attempts, Duration::from_millis(20)))
            .with_heartbeat_interval(Duration::from_millis(50))
            .with_connect_timeout(Duration::from_millis(200))
    }

    #[test]
    fn test_shutdown_idempotent() {
        let client = TelemetryClient::new(quick_config(unreachable_port(), 100)).unwrap();
        client.shutdown();
        client.shutdown();
        assert!(!client.is_connected());
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_calls_after_shutdown_are_prompt() {
        let client = TelemetryClient::new(quick_config(unreachable_port(), 100)).unwrap();
        client.shutdown();

        let start = Instant::now();
        assert_eq!(
            client.get_latest(Duration::from_millis(10), Duration::from_secs(30)),
            Err(StreamError::Shutdown)
        );
        assert_eq!(
            client.await_first_connection(Duration::from_secs(30)),
            Err(StreamError::Shutdown)
        );
        assert!(client.try_latest().is_none());
        assert!(!client.is_connected());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_get_latest_without_connection_times_out() {
        let client = TelemetryClient::new(quick_config(unreachable_port(), 1_000)).unwrap();
        let err = client
            .get_latest(Duration::from_millis(10), Duration::from_millis(100))
            .unwrap_err();
        assert!(matches!(err, StreamError::Timeout(_)));
    }
}
