//! Component C: recover discrete messages from an octet-counted stream.
//!
//! Wire convention: `<decimal-length><SPACE><payload-bytes>`. Tolerates
//! arbitrary fragmentation of reads. Unlike newline-delimited framing, this
//! mode never falls back to scanning for a terminator — a malformed prefix
//! is a fatal, connection-ending error (spec §4.C).

use thiserror::Error;

/// Default cap on the framer's internal buffer (spec default 1 MiB).
pub const DEFAULT_MAX_BUFFER: usize = 1024 * 1024;
/// Default cap on how many bytes may precede the length-prefix space
/// before the prefix is declared malformed (spec default 16).
pub const DEFAULT_MAX_PREFIX: usize = 16;
/// Default cap on an individual frame's payload length (spec default 64 KiB).
pub const DEFAULT_MAX_FRAME: usize = 64 * 1024;

/// A connection-fatal framing error. The connection must be closed; the
/// framer does not attempt to resynchronize.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame buffer exceeded {limit} bytes")]
    BufferOverflow { limit: usize },

    #[error("malformed length prefix")]
    MalformedLengthPrefix,
}

impl FrameError {
    /// Hyphenated reason token for log correlation (spec §8 scenario 5 names
    /// `malformed-length-prefix` as the reason operators grep for).
    pub fn reason(&self) -> &'static str {
        match self {
            FrameError::BufferOverflow { .. } => "buffer-overflow",
            FrameError::MalformedLengthPrefix => "malformed-length-prefix",
        }
    }
}

/// Bounded length-prefix framer, owned exclusively by one connection.
pub struct Framer {
    buf: Vec<u8>,
    max_buffer: usize,
    max_prefix: usize,
    max_frame: usize,
}

impl Framer {
    /// Construct a framer with the spec's default limits.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_BUFFER, DEFAULT_MAX_PREFIX, DEFAULT_MAX_FRAME)
    }

    /// Construct a framer with explicit limits (used by the supervisor when
    /// `Settings` overrides the defaults).
    pub fn with_limits(max_buffer: usize, max_prefix: usize, max_frame: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_buffer,
            max_prefix,
            max_frame,
        }
    }

    /// Append a fresh chunk and drain as many complete frames as are now
    /// available. A `Vec::len() == 0` return with `Ok` means "need more
    /// data"; `Err` is always connection-fatal.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>, FrameError> {
        self.buf.extend_from_slice(chunk);
        if self.buf.len() > self.max_buffer {
            return Err(FrameError::BufferOverflow {
                limit: self.max_buffer,
            });
        }

        let mut frames = Vec::new();
        loop {
            match self.try_take_frame()? {
                Some(frame) => frames.push(frame),
                None => break,
            }
        }
        Ok(frames)
    }

    fn try_take_frame(&mut self) -> Result<Option<String>, FrameError> {
        let Some(space_idx) = self.buf.iter().position(|&b| b == b' ') else {
            if self.buf.len() > self.max_prefix {
                return Err(FrameError::MalformedLengthPrefix);
            }
            return Ok(None);
        };

        if space_idx == 0 {
            return Err(FrameError::MalformedLengthPrefix);
        }

        let digits = &self.buf[..space_idx];
        if digits.len() > 10 || !digits.iter().all(u8::is_ascii_digit) {
            return Err(FrameError::MalformedLengthPrefix);
        }

        let length: usize = std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(FrameError::MalformedLengthPrefix)?;

        if length == 0 || length > self.max_frame {
            return Err(FrameError::MalformedLengthPrefix);
        }

        let payload_start = space_idx + 1;
        let payload_end = payload_start + length;
        if self.buf.len() < payload_end {
            return Ok(None);
        }

        let payload = String::from_utf8_lossy(&self.buf[payload_start..payload_end]).into_owned();
        self.buf.drain(..payload_end);
        Ok(Some(payload))
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}
