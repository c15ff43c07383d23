//! reassembler.rs
//! Turns an arbitrarily chunked byte stream into whole frames.
//!
//! TCP gives no message boundaries: a read may return half a frame or several
//! frames at once. Bytes accumulate here and are sliced off the front in exact
//! `FRAME_LEN` steps; the remainder (always < `FRAME_LEN`) waits for the next read.

use crate::stream::frame::{FRAME_LEN, Frame};
use crate::utils::error::DecodeError;

/// Enough for a burst of frames without reallocating.
const INITIAL_CAPACITY: usize = FRAME_LEN * 16;

#[derive(Debug)]
pub struct Reassembler {
    buf: Vec<u8>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Bytes held back waiting for the rest of a frame.
    #[inline]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partial frame. Called on every disconnect.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Append `chunk` and hand every complete slice to `emit`, oldest first.
    ///
    /// Returns the number of slices emitted. A decode error for one slice does
    /// not stop the following ones.
    pub fn feed<F>(&mut self, chunk: &[u8], mut emit: F) -> usize
    where
        F: FnMut(Result<Frame, DecodeError>),
    {
        self.buf.extend_from_slice(chunk);

        let mut offset = 0;
        while self.buf.len() - offset >= FRAME_LEN {
            emit(Frame::decode(&self.buf[offset..offset + FRAME_LEN]));
            offset += FRAME_LEN;
        }

        // Shift the leftover (< FRAME_LEN bytes) to the front.
        if offset > 0 {
            self.buf.drain(..offset);
        }
        offset / FRAME_LEN
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::frame::{FIELD_COUNT, encode_fields};

    fn frame_bytes(seed: f32) -> [u8; FRAME_LEN] {
        let mut fields = [0.0f32; FIELD_COUNT];
        for (i, f) in fields.iter_mut().enumerate() {
            *f = seed + i as f32 * 0.5;
        }
        encode_fields(&fields)
    }

    fn collect(r: &mut Reassembler, chunk: &[u8], out: &mut Vec<Frame>) -> usize {
        r.feed(chunk, |res| out.push(res.unwrap()))
    }

    #[test]
    fn test_two_and_a_half_then_half() {
        let mut stream = Vec::new();
        for seed in [1.0, 2.0, 3.0] {
            stream.extend_from_slice(&frame_bytes(seed));
        }
        let split = FRAME_LEN * 5 / 2;

        let mut r = Reassembler::new();
        let mut frames = Vec::new();

        assert_eq!(collect(&mut r, &stream[..split], &mut frames), 2);
        assert_eq!(frames.len(), 2);
        assert_eq!(r.buffered(), 38);

        assert_eq!(collect(&mut r, &stream[split..], &mut frames), 1);
        assert_eq!(frames.len(), 3);
        assert_eq!(r.buffered(), 0);
        assert_eq!(frames[2].speed, 3.0 + 2.0 * 0.5);
    }

    #[test]
    fn test_partial_never_emits() {
        let bytes = frame_bytes(7.0);
        let mut r = Reassembler::new();
        let mut frames = Vec::new();

        assert_eq!(collect(&mut r, &bytes[..FRAME_LEN - 1], &mut frames), 0);
        assert!(frames.is_empty());
        assert_eq!(r.buffered(), FRAME_LEN - 1);

        assert_eq!(collect(&mut r, &bytes[FRAME_LEN - 1..], &mut frames), 1);
        assert_eq!(r.buffered(), 0);
    }

    #[test]
    fn test_single_byte_chunks() {
        let mut stream = Vec::new();
        for seed in [10.0, 20.0] {
            stream.extend_from_slice(&frame_bytes(seed));
        }

        let mut r = Reassembler::new();
        let mut frames = Vec::new();
        for b in &stream {
            collect(&mut r, std::slice::from_ref(b), &mut frames);
        }

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], Frame::decode(&frame_bytes(10.0)).unwrap());
        assert_eq!(frames[1], Frame::decode(&frame_bytes(20.0)).unwrap());
    }

    #[test]
    fn test_clear_discards_partial() {
        let bytes = frame_bytes(1.0);
        let mut r = Reassembler::new();
        let mut frames = Vec::new();

        collect(&mut r, &bytes[..40], &mut frames);
        r.clear();
        assert_eq!(r.buffered(), 0);

        // Next epoch starts aligned at offset zero.
        collect(&mut r, &frame_bytes(5.0), &mut frames);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0], Frame::decode(&frame_bytes(5.0)).unwrap());
    }

    #[test]
    fn test_empty_chunk_is_noop() {
        let mut r = Reassembler::new();
        let mut frames = Vec::new();
        assert_eq!(collect(&mut r, &[], &mut frames), 0);
        assert_eq!(r.buffered(), 0);
    }
}
