//! A fixed-capacity staging buffer over caller-owned memory.
//!
//! Flash-side data becomes usable by resident-only APIs exactly once it has
//! been staged. [`RamBuf`] is the receiving end of that copy: it borrows a
//! caller-provided byte slice, tracks how much of it is filled, and accepts
//! input from either memory space. No allocation, no hidden capacity.

use core::fmt;

use crate::ops::{self, ByteSource};
use crate::types::Error;

/// Append-only view over a borrowed byte slice.
///
/// Overflow is an error, never a quiet truncation. The filled prefix is
/// reachable as `&[u8]` at any time and as `&str` after a UTF-8 check.
pub struct RamBuf<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> RamBuf<'a> {
    /// Wrap `buf`, initially empty. Existing contents are ignored and
    /// overwritten as data is appended.
    #[inline]
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    /// Bytes appended so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total capacity of the underlying slice.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Capacity still available.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.len
    }

    /// Forget the contents, keeping the borrow.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// The filled prefix.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// The filled prefix as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Result<&str, Error> {
        core::str::from_utf8(self.as_bytes()).map_err(|_| Error::InvalidUtf8)
    }

    /// Append resident bytes.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if bytes.len() > self.remaining() {
            return Err(Error::BufferTooSmall);
        }
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }

    /// Append a byte source from either memory space.
    pub fn push_source<S: ByteSource>(&mut self, src: S) -> Result<(), Error> {
        let n = ops::copy(src, &mut self.buf[self.len..])?;
        self.len += n;
        Ok(())
    }
}

impl fmt::Write for RamBuf<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_bytes(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

impl fmt::Debug for RamBuf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RamBuf")
            .field("len", &self.len)
            .field("capacity", &self.buf.len())
            .finish()
    }
}
