//! stats.rs
//! Lock-free counters for the streaming pipeline.
//! - Background thread increments with `Ordering::Relaxed` (no ordering guarantees needed)
//! - Consumers read a point-in-time `StatsSnapshot` without blocking the writer

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct StreamStats {
    connect_attempts: AtomicU64,
    connections: AtomicU64,
    disconnects: AtomicU64,
    heartbeat_failures: AtomicU64,
    bytes_received: AtomicU64,
    frames_decoded: AtomicU64,
    frames_overwritten: AtomicU64,
    decode_failures: AtomicU64,
    frames_taken: AtomicU64,
}

/// Copy of every counter at one instant.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub connect_attempts: u64,
    pub connections: u64,
    pub disconnects: u64,
    pub heartbeat_failures: u64,
    pub bytes_received: u64,
    pub frames_decoded: u64,
    /// Frames replaced in the mailbox before any consumer took them.
    pub frames_overwritten: u64,
    pub decode_failures: u64,
    pub frames_taken: u64,
}

impl StreamStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_connect_attempt(&self) {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_connection(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_heartbeat_failure(&self) {
        self.heartbeat_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_bytes(&self, n: usize) {
        self.bytes_received.fetch_add(n as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_decoded(&self, overwrote_unread: bool) {
        self.frames_decoded.fetch_add(1, Ordering::Relaxed);
        if overwrote_unread {
            self.frames_overwritten.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_taken(&self) {
        self.frames_taken.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connections: self.connections.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
            heartbeat_failures: self.heartbeat_failures.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            frames_decoded: self.frames_decoded.load(Ordering::Relaxed),
            frames_overwritten: self.frames_overwritten.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            frames_taken: self.frames_taken.load(Ordering::Relaxed),
        }
    }
}
