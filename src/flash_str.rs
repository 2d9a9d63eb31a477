//! Length-prefixed UTF-8 text in the flash space.
//!
//! [`FlashStr`] is the text counterpart of [`FlashBytes`]: a sized handle
//! whose construction promises valid UTF-8 behind it. It renders through
//! [`core::fmt`] without ever holding the whole string resident, staging
//! through a small stack window instead, so `write!("{}", s)` works for a
//! string of any length on a machine with a few dozen bytes of stack to
//! spare.

use core::fmt;
use core::str;

use crate::blob::{FlashBytes, FlashCStr};
use crate::ops::{ByteSource, STAGE_CHUNK};
use crate::types::{Error, MemSpace};

/// UTF-8 string data in the flash space, with an explicit byte length.
///
/// Produced by [`flash_str!`](crate::flash_str!). Not a `&str`: the bytes
/// are not addressable as resident memory, so every use goes through an
/// explicit staging copy or the chunked [`Display`](fmt::Display) path.
#[derive(Clone, Copy)]
pub struct FlashStr {
    bytes: FlashBytes,
}

impl FlashStr {
    /// Build a handle from a raw flash pointer and byte length.
    ///
    /// # Safety
    ///
    /// `ptr..ptr + len` must lie in constant storage readable through the
    /// flash access path for the program's lifetime, and the bytes must be
    /// valid UTF-8.
    #[inline]
    pub const unsafe fn from_raw_parts(ptr: *const u8, len: usize) -> Self {
        Self {
            bytes: FlashBytes::from_raw_parts(ptr, len),
        }
    }

    /// Length in bytes.
    #[inline]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The underlying bytes, UTF-8 guarantee erased.
    #[inline]
    pub const fn as_bytes(&self) -> FlashBytes {
        self.bytes
    }

    /// Address of the first byte.
    #[inline]
    pub fn addr(&self) -> crate::types::FlashAddr {
        self.bytes.addr()
    }

    /// Stage the string into `buf` and borrow it back as resident `&str`.
    ///
    /// `buf` must hold at least [`len`](Self::len) bytes.
    pub fn load_into<'b>(&self, buf: &'b mut [u8]) -> Result<&'b str, Error> {
        let n = self.bytes.copy_into(buf)?;
        // Construction guarantees UTF-8 and flash is immutable, so the
        // staged prefix is valid as well.
        Ok(unsafe { str::from_utf8_unchecked(&buf[..n]) })
    }
}

impl ByteSource for FlashStr {
    #[inline]
    fn space(&self) -> MemSpace {
        MemSpace::Flash
    }

    #[inline]
    fn byte_len(&self) -> usize {
        self.len()
    }

    #[inline]
    fn read_chunk(&self, offset: usize, buf: &mut [u8]) -> usize {
        self.bytes.read_chunk(offset, buf)
    }
}

impl fmt::Display for FlashStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        stream_utf8(self.bytes, f)
    }
}

impl fmt::Debug for FlashStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        stream_utf8(self.bytes, f)?;
        f.write_str("\"")
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FlashStr {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "FlashStr({=usize} bytes @ {})", self.len(), self.addr());
    }
}

/// NUL-terminated entries render the same way once their extent is known;
/// the terminator itself is never part of the output.
impl fmt::Display for FlashCStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        stream_utf8(self.bytes(), f)
    }
}

impl fmt::Debug for FlashCStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        stream_utf8(self.bytes(), f)?;
        f.write_str("\"")
    }
}

/// Stream flash bytes to a formatter in [`STAGE_CHUNK`] windows.
///
/// A window may end mid UTF-8 sequence; the split character is carried into
/// the next window rather than emitted broken, so the formatter only ever
/// sees whole characters. Bytes that are not UTF-8 at all surface as
/// `fmt::Error`.
fn stream_utf8(bytes: FlashBytes, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut buf = [0u8; STAGE_CHUNK];
    let mut offset = 0;
    while offset < bytes.len() {
        let take = bytes.read_chunk(offset, &mut buf);
        match str::from_utf8(&buf[..take]) {
            Ok(s) => {
                f.write_str(s)?;
                offset += take;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                if valid == 0 {
                    return Err(fmt::Error);
                }
                // Verified up to `valid` just above.
                f.write_str(unsafe { str::from_utf8_unchecked(&buf[..valid]) })?;
                offset += valid;
            }
        }
    }
    Ok(())
}
