//! Operations whose operands may live in either memory space.
//!
//! The platform genuinely needs a different instruction sequence per space,
//! but that choice belongs to the operand, not to the caller's memory of a
//! naming convention. [`ByteSource`] is the one seam: resident slices and
//! flash handles implement it, and every operation here is written once
//! against it. Passing a flash handle where a resident slice was meant (or
//! the reverse) is a type error, not a silent wrong read.

use core::cmp::{min, Ordering};

use crate::blob::{FlashBytes, FlashCStr};
use crate::reader;
use crate::types::{Error, MemSpace};

/// Staging chunk size for operations that stream through the stack.
pub(crate) const STAGE_CHUNK: usize = 16;

/// A readable run of bytes in either memory space.
///
/// Implemented by `&[u8]` and `&str` (resident) and by [`FlashBytes`],
/// [`FlashCStr`] and [`crate::FlashStr`] (flash). Results are byte-identical
/// across spaces for identical content; only the read path differs.
pub trait ByteSource {
    /// Which space the bytes live in.
    fn space(&self) -> MemSpace;

    /// Total length in bytes.
    ///
    /// For NUL-terminated sources this scans for the terminator.
    fn byte_len(&self) -> usize;

    /// Copy bytes starting at `offset` into `buf`, returning how many were
    /// copied. Fills `buf` completely unless fewer bytes remain; a short
    /// count therefore means the source is exhausted. Sources that know
    /// their length read zero bytes at any offset past the end;
    /// NUL-terminated sources cannot check this, so for them `offset` must
    /// not exceed the length.
    fn read_chunk(&self, offset: usize, buf: &mut [u8]) -> usize;
}

impl ByteSource for &[u8] {
    #[inline]
    fn space(&self) -> MemSpace {
        MemSpace::Ram
    }

    #[inline]
    fn byte_len(&self) -> usize {
        self.len()
    }

    fn read_chunk(&self, offset: usize, buf: &mut [u8]) -> usize {
        let rest = self.get(offset..).unwrap_or(&[]);
        let n = min(rest.len(), buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        n
    }
}

impl ByteSource for &str {
    #[inline]
    fn space(&self) -> MemSpace {
        MemSpace::Ram
    }

    #[inline]
    fn byte_len(&self) -> usize {
        self.len()
    }

    #[inline]
    fn read_chunk(&self, offset: usize, buf: &mut [u8]) -> usize {
        self.as_bytes().read_chunk(offset, buf)
    }
}

impl ByteSource for FlashBytes {
    #[inline]
    fn space(&self) -> MemSpace {
        MemSpace::Flash
    }

    #[inline]
    fn byte_len(&self) -> usize {
        self.len()
    }

    fn read_chunk(&self, offset: usize, buf: &mut [u8]) -> usize {
        let rest = self.len().saturating_sub(offset);
        let n = min(rest, buf.len());
        if n > 0 {
            // In bounds: offset + n <= len, and the handle's construction
            // contract covers addr..addr+len.
            unsafe { reader::read_bytes(self.addr().offset(offset), &mut buf[..n]) };
        }
        n
    }
}

impl ByteSource for FlashCStr {
    #[inline]
    fn space(&self) -> MemSpace {
        MemSpace::Flash
    }

    #[inline]
    fn byte_len(&self) -> usize {
        self.len()
    }

    fn read_chunk(&self, offset: usize, buf: &mut [u8]) -> usize {
        // Bounded by the terminator instead of a stored length, so the
        // source need only be scanned as far as the caller consumes.
        let mut n = 0;
        while n < buf.len() {
            let byte = unsafe { reader::read_u8(self.addr().offset(offset + n)) };
            if byte == 0 {
                break;
            }
            buf[n] = byte;
            n += 1;
        }
        n
    }
}

/// Compare two byte sources lexicographically by unsigned byte value.
///
/// The result matches what comparing two resident slices of the same
/// content would produce, whichever spaces the operands live in.
pub fn compare<A: ByteSource, B: ByteSource>(a: A, b: B) -> Ordering {
    let mut buf_a = [0u8; STAGE_CHUNK];
    let mut buf_b = [0u8; STAGE_CHUNK];
    let mut offset = 0;
    loop {
        let na = a.read_chunk(offset, &mut buf_a);
        let nb = b.read_chunk(offset, &mut buf_b);
        if na == 0 && nb == 0 {
            return Ordering::Equal;
        }
        let n = min(na, nb);
        match buf_a[..n].cmp(&buf_b[..n]) {
            Ordering::Equal => {
                if na != nb {
                    // Equal prefix; the exhausted side is the smaller one.
                    return na.cmp(&nb);
                }
            }
            other => return other,
        }
        offset += n;
    }
}

/// Whether `haystack` begins with the bytes of `prefix`.
pub fn starts_with<A: ByteSource, B: ByteSource>(haystack: A, prefix: B) -> bool {
    let mut buf_h = [0u8; STAGE_CHUNK];
    let mut buf_p = [0u8; STAGE_CHUNK];
    let mut offset = 0;
    loop {
        let np = prefix.read_chunk(offset, &mut buf_p);
        if np == 0 {
            return true;
        }
        let nh = haystack.read_chunk(offset, &mut buf_h[..np]);
        if nh < np || buf_h[..np] != buf_p[..np] {
            return false;
        }
        offset += np;
    }
}

/// Stage a full byte source into `dst`, overwriting its prefix.
///
/// This is the one sanctioned space crossing: an explicit copy into a
/// caller-owned resident buffer. `dst` must be at least
/// [`byte_len`](ByteSource::byte_len) bytes; the number of bytes written is
/// returned.
pub fn copy<S: ByteSource>(src: S, dst: &mut [u8]) -> Result<usize, Error> {
    let total = src.byte_len();
    if dst.len() < total {
        return Err(Error::BufferTooSmall);
    }
    let mut offset = 0;
    while offset < total {
        let got = src.read_chunk(offset, &mut dst[offset..total]);
        debug_assert!(got > 0, "byte source shrank during copy");
        if got == 0 {
            break;
        }
        offset += got;
    }
    trace!("staged {} bytes from {:?} source", total, src.space());
    Ok(total)
}

/// Stream a byte source into an [`embedded_io::Write`] sink.
///
/// Stages through a small stack buffer, so arbitrarily long flash data can
/// reach a console or transport without a resident copy of the whole blob.
pub fn write_all_to<S: ByteSource, W: embedded_io::Write>(src: S, w: &mut W) -> Result<(), W::Error> {
    let mut buf = [0u8; STAGE_CHUNK];
    let mut offset = 0;
    loop {
        let n = src.read_chunk(offset, &mut buf);
        if n == 0 {
            return Ok(());
        }
        w.write_all(&buf[..n])?;
        offset += n;
    }
}
