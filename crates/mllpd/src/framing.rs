//! MLLP block framing.
//!
//! Every HL7 payload travels between a start byte and a two-byte terminator:
//!
//! ```text
//! 0x0B <payload> 0x1C 0x0D
//! ```
//!
//! [`Framer`] extracts payloads from a byte stream one byte at a time and
//! [`wrap`] produces the outbound block. Payload bytes are never escaped.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use mllp_config::DEFAULT_MAX_FRAME_BYTES;

/// Byte opening every block.
pub const START_BLOCK: u8 = 0x0B;
/// First terminator byte.
pub const END_BLOCK: u8 = 0x1C;
/// Second terminator byte.
pub const CARRIAGE_RETURN: u8 = 0x0D;

const SENTINEL_BYTES: usize = 3;

/// Raised when a partial frame outgrows the configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("frame exceeded {limit} bytes and was discarded")]
pub struct FrameError {
    /// Limit in effect, sentinels included.
    pub limit: usize,
}

/// Accumulates stream bytes and yields complete payloads.
#[derive(Debug)]
pub struct Framer {
    buffer: BytesMut,
    limit: usize,
}

impl Framer {
    /// Builds a framer whose frames, sentinels included, may not exceed
    /// `limit` bytes.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            limit: limit.max(SENTINEL_BYTES + 1),
        }
    }

    /// Feeds one byte.
    ///
    /// Bytes are collected once a start byte has been seen; anything before
    /// it is ignored. A start byte inside a frame is kept as payload. When the
    /// collected bytes end with `0x1C 0x0D` the payload between the sentinels
    /// is returned and the framer is idle again.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] when the partial frame reaches the limit without
    /// completing. The partial frame is dropped and the framer is idle.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Bytes>, FrameError> {
        if byte != START_BLOCK && self.buffer.is_empty() {
            return Ok(None);
        }
        self.buffer.put_u8(byte);

        if self.buffer.len() > SENTINEL_BYTES && self.buffer.ends_with(&[END_BLOCK, CARRIAGE_RETURN])
        {
            let mut frame = self.buffer.split().freeze();
            frame.truncate(frame.len() - 2);
            return Ok(Some(frame.slice(1..)));
        }

        if self.buffer.len() >= self.limit {
            self.buffer.clear();
            return Err(FrameError { limit: self.limit });
        }
        Ok(None)
    }

    /// Feeds a chunk and returns every payload it completes, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first [`FrameError`]; bytes after the offending one are
    /// not consumed and frames completed before it are lost.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Bytes>, FrameError> {
        let mut frames = Vec::new();
        for &byte in chunk {
            if let Some(frame) = self.feed(byte)? {
                frames.push(frame);
            }
        }
        Ok(frames)
    }

    /// Returns `true` when no partial frame is buffered.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of bytes of the current partial frame, start byte included.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

/// Encloses `payload` in MLLP sentinels.
#[must_use]
pub fn wrap(payload: &[u8]) -> Bytes {
    let mut block = BytesMut::with_capacity(payload.len() + SENTINEL_BYTES);
    block.put_u8(START_BLOCK);
    block.put_slice(payload);
    block.put_slice(&[END_BLOCK, CARRIAGE_RETURN]);
    block.freeze()
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn framer() -> Framer {
        Framer::default()
    }

    #[rstest]
    fn extracts_a_single_frame(mut framer: Framer) {
        let frames = framer.push(b"\x0BMSH|A\x1C\x0D").expect("within limit");
        assert_eq!(frames, vec![Bytes::from_static(b"MSH|A")]);
        assert!(framer.is_idle());
    }

    #[rstest]
    fn ignores_bytes_before_the_start_block(mut framer: Framer) {
        let frames = framer.push(b"noise\r\n\x0BX\x1C\x0D").expect("within limit");
        assert_eq!(frames, vec![Bytes::from_static(b"X")]);
    }

    #[rstest]
    fn extracts_back_to_back_frames(mut framer: Framer) {
        let frames = framer
            .push(b"\x0BA\x1C\x0D\x0BB\x1C\x0D")
            .expect("within limit");
        assert_eq!(
            frames,
            vec![Bytes::from_static(b"A"), Bytes::from_static(b"B")]
        );
    }

    #[rstest]
    fn keeps_a_start_byte_inside_the_payload(mut framer: Framer) {
        let frames = framer.push(b"\x0BA\x0BB\x1C\x0D").expect("within limit");
        assert_eq!(frames, vec![Bytes::from_static(b"A\x0BB")]);
    }

    #[rstest]
    fn emits_an_empty_payload_only_once_four_bytes_arrive(mut framer: Framer) {
        // Three bytes never satisfy the length check, so the terminator is
        // taken as payload and the frame stays open.
        assert!(framer.push(b"\x0B\x1C\x0D").expect("within limit").is_empty());
        assert!(!framer.is_idle());
        let frames = framer.push(b"\x1C\x0D").expect("within limit");
        assert_eq!(frames, vec![Bytes::from_static(b"\x1C\x0D")]);
    }

    #[rstest]
    fn a_lone_end_block_is_payload(mut framer: Framer) {
        let frames = framer.push(b"\x0BA\x1CB\x1C\x0D").expect("within limit");
        assert_eq!(frames, vec![Bytes::from_static(b"A\x1CB")]);
    }

    #[rstest]
    fn partial_frames_stay_buffered(mut framer: Framer) {
        assert!(framer.push(b"\x0BMSH|").expect("within limit").is_empty());
        assert_eq!(framer.buffered_len(), 5);
        let frames = framer.push(b"A\x1C\x0D").expect("within limit");
        assert_eq!(frames, vec![Bytes::from_static(b"MSH|A")]);
    }

    #[test]
    fn oversized_frames_are_discarded() {
        let mut framer = Framer::new(8);
        let error = framer.push(b"\x0B0123456789").expect_err("limit exceeded");
        assert_eq!(error, FrameError { limit: 8 });
        assert!(framer.is_idle());

        let frames = framer.push(b"\x0BOK\x1C\x0D").expect("within limit");
        assert_eq!(frames, vec![Bytes::from_static(b"OK")]);
    }

    #[test]
    fn frames_at_the_limit_complete() {
        let mut framer = Framer::new(6);
        let frames = framer.push(b"\x0BABC\x1C\x0D").expect("exactly at limit");
        assert_eq!(frames, vec![Bytes::from_static(b"ABC")]);
    }

    #[test]
    fn wrap_adds_sentinels_without_escaping() {
        let block = wrap(b"A\x0BB");
        assert_eq!(block.as_ref(), b"\x0BA\x0BB\x1C\x0D");
    }

    #[rstest]
    fn wrapped_payloads_frame_back(mut framer: Framer) {
        let payload = b"MSH|^~\\&|LAB\rMSA|AA|1\r";
        let frames = framer.push(&wrap(payload)).expect("within limit");
        assert_eq!(frames, vec![Bytes::copy_from_slice(payload)]);
    }
}
