//! Fixed-size reply buffer written back on the command channel.
//!
//! Layout: big-endian status word first, then (only for a produced signature)
//! a length byte and the signature blob.

use common::constants::REPLY_BUFFER_SIZE;
use common::{Error, StatusWord};
use zeroize::Zeroize;

/// Channel output buffer with explicit length tracking.
pub struct ReplyBuffer {
    buf: [u8; REPLY_BUFFER_SIZE],
    len: usize,
}

impl ReplyBuffer {
    /// Creates an empty buffer.
    pub const fn new() -> Self {
        Self {
            buf: [0u8; REPLY_BUFFER_SIZE],
            len: 0,
        }
    }

    /// Zeroes the buffer and resets the length.
    pub fn clear(&mut self) {
        self.buf.zeroize();
        self.len = 0;
    }

    /// Appends one byte.
    pub fn push(&mut self, byte: u8) -> Result<(), Error> {
        self.extend_from_slice(&[byte])
    }

    /// Appends bytes, failing without writing anything if they do not fit.
    pub fn extend_from_slice(&mut self, data: &[u8]) -> Result<(), Error> {
        let end = self.len.checked_add(data.len()).ok_or(Error::BufferOverflow)?;
        if end > REPLY_BUFFER_SIZE {
            return Err(Error::BufferOverflow);
        }
        self.buf[self.len..end].copy_from_slice(data);
        self.len = end;
        Ok(())
    }

    /// Replaces the content with a bare status word.
    pub fn set_status(&mut self, sw: StatusWord) {
        self.clear();
        self.buf[..2].copy_from_slice(&sw.to_be_bytes());
        self.len = 2;
    }

    /// Status word at the start of the reply, if any.
    pub fn status(&self) -> Option<StatusWord> {
        if self.len < 2 {
            return None;
        }
        StatusWord::try_from(u16::from_be_bytes([self.buf[0], self.buf[1]])).ok()
    }

    /// Bytes following the status word.
    pub fn data(&self) -> &[u8] {
        self.as_slice().get(2..).unwrap_or(&[])
    }

    /// The reply as it goes on the wire.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Length of the reply.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for ReplyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for ReplyBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReplyBuffer")
            .field("status", &self.status())
            .field("len", &self.len)
            .finish()
    }
}
