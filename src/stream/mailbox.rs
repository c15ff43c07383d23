//! mailbox.rs
//! Single-slot "latest value wins" cell between the background thread and consumers.
//!
//! Not a queue: every publish overwrites the slot, so a consumer that polls
//! slower than the producer silently skips intermediate frames. The write is
//! one critical section, so readers see either the old frame or the new one,
//! never a mix.

use parking_lot::{Condvar, Mutex};
use std::time::Duration;

use crate::stream::frame::Frame;

#[derive(Debug, Default)]
pub struct Mailbox {
    slot: Mutex<Option<Frame>>,
    ready: Condvar,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot and wake waiting consumers.
    /// Returns `true` if an unread frame was replaced.
    pub fn publish(&self, frame: Frame) -> bool {
        let overwrote = self.slot.lock().replace(frame).is_some();
        self.ready.notify_all();
        overwrote
    }

    /// Take the frame if present, leaving the slot empty.
    pub fn take(&self) -> Option<Frame> {
        self.slot.lock().take()
    }

    /// Take the frame, waiting at most `wait` for a publish if the slot is empty.
    pub fn wait_take(&self, wait: Duration) -> Option<Frame> {
        let mut slot = self.slot.lock();
        if slot.is_none() {
            self.ready.wait_for(&mut slot, wait);
        }
        slot.take()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }

    /// Wake every blocked consumer (used on shutdown).
    pub fn wake_all(&self) {
        let _guard = self.slot.lock();
        self.ready.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread, time::Instant};

    fn frame(lap: i32) -> Frame {
        Frame { lap, ..Frame::default() }
    }

    #[test]
    fn test_take_clears_slot() {
        let m = Mailbox::new();
        assert!(!m.publish(frame(1)));
        assert_eq!(m.take().map(|f| f.lap), Some(1));
        assert!(m.take().is_none());
        assert!(m.is_empty());
    }

    #[test]
    fn test_latest_wins() {
        let m = Mailbox::new();
        assert!(!m.publish(frame(1)));
        assert!(m.publish(frame(2)));
        assert!(m.publish(frame(3)));
        assert_eq!(m.take().map(|f| f.lap), Some(3));
        assert!(m.take().is_none());
    }

    #[test]
    fn test_wait_take_times_out_empty() {
        let m = Mailbox::new();
        let start = Instant::now();
        assert!(m.wait_take(Duration::from_millis(30)).is_none());
        assert!(start.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn test_wait_take_woken_by_publish() {
        let m = Arc::new(Mailbox::new());
        let producer = m.clone();
        let h = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.publish(frame(9));
        });

        let start = Instant::now();
        let mut got = None;
        while got.is_none() && start.elapsed() < Duration::from_secs(5) {
            got = m.wait_take(Duration::from_secs(1));
        }
        assert_eq!(got.map(|f| f.lap), Some(9));
        h.join().unwrap();
    }

    #[test]
    fn test_concurrent_readers_take_once() {
        let m = Arc::new(Mailbox::new());
        m.publish(frame(42));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = m.clone();
                thread::spawn(move || m.take().is_some())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&took| took)
            .count();
        assert_eq!(winners, 1);
    }
}
