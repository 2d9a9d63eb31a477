//! Handles to data resident in the flash address space.
//!
//! - [`Flash`]: typed handle to a single `T` in flash
//! - [`FlashBytes`]: byte blob with statically-known length
//! - [`FlashCStr`]: NUL-terminated byte string, length discovered by scanning
//!
//! Handles are created at image build time by the placement macros
//! ([`flash_static!`](crate::flash_static), [`flash_str!`](crate::flash_str!))
//! or, for externally linked data, through the `unsafe` constructors. They
//! are plain `Copy` values: nothing is ever allocated, mutated or freed, and
//! a handle stays valid for the whole program lifetime.

use core::fmt;
use core::marker::PhantomData;
use core::mem::size_of;

use crate::arch;
use crate::reader;
use crate::types::{Error, FlashAddr};

/// Typed handle to a `T` stored in the flash space.
///
/// The pointee can only be observed by staging it out with [`load`](Self::load);
/// there is no `Deref`, so a flash value can never be used where a resident
/// reference is expected.
///
/// # Usage
///
/// ```ignore
/// flashref::flash_static! {
///     static CAL_FACTOR: u16 = 1250;
/// }
///
/// let factor = CAL_FACTOR.load();
/// ```
#[repr(transparent)]
pub struct Flash<T> {
    ptr: *const T,
    _marker: PhantomData<T>,
}

impl<T> Clone for Flash<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Flash<T> {}

// The pointee lives in flash and is never written, so handles may be shared
// and placed in statics.
unsafe impl<T> Send for Flash<T> {}
unsafe impl<T> Sync for Flash<T> {}

impl<T> Flash<T> {
    /// Wrap a pointer to a `T` placed in the flash space.
    ///
    /// # Safety
    ///
    /// `p` must point to a properly initialized `T` in the flash address
    /// space, valid for the whole program lifetime.
    #[inline]
    pub const unsafe fn new(p: *const T) -> Self {
        Self {
            ptr: p,
            _marker: PhantomData,
        }
    }

    /// The qualified address of the value.
    #[inline]
    pub fn addr(&self) -> FlashAddr {
        unsafe { FlashAddr::new(self.ptr as *const u8) }
    }

    /// Stage the whole value out of flash.
    #[inline]
    pub fn load(&self) -> T
    where
        T: Copy,
    {
        unsafe { arch::read_scalar(self.ptr) }
    }
}

impl<T: Copy, const N: usize> Flash<[T; N]> {
    /// Number of elements in the array.
    #[inline]
    pub const fn len(&self) -> usize {
        N
    }

    /// Whether the array is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Stage a single element out of flash.
    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        if index < N {
            Some(unsafe { arch::read_scalar((self.ptr as *const T).add(index)) })
        } else {
            None
        }
    }
}

impl<const N: usize> Flash<[u8; N]> {
    /// View the array as an untyped byte blob.
    #[inline]
    pub const fn as_bytes(&self) -> FlashBytes {
        unsafe { FlashBytes::from_raw_parts(self.ptr as *const u8, N) }
    }
}

impl<T> fmt::Debug for Flash<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flash")
            .field("addr", &self.addr())
            .field("size", &size_of::<T>())
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl<T> defmt::Format for Flash<T> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Flash {{ addr: {:?}, size: {} }}", self.addr(), size_of::<T>());
    }
}

/// Byte blob in the flash space with a statically-known length.
///
/// The fixed-size counterpart of [`FlashCStr`]. All safe accessors are
/// bounds-checked against `len`; the only unchecked path is the raw
/// [`crate::reader`] layer underneath.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashBytes {
    addr: FlashAddr,
    len: usize,
}

// See `FlashAddr`: flash contents are immutable for the program lifetime.
unsafe impl Send for FlashBytes {}
unsafe impl Sync for FlashBytes {}

impl FlashBytes {
    /// Build a blob handle from a raw flash pointer and a length.
    ///
    /// # Safety
    ///
    /// `p..p+len` must be valid flash-space addresses for the whole program
    /// lifetime.
    #[inline]
    pub const unsafe fn from_raw_parts(p: *const u8, len: usize) -> Self {
        Self {
            addr: FlashAddr::new(p),
            len,
        }
    }

    /// Length in bytes.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the blob is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The qualified address of the first byte.
    #[inline]
    pub const fn addr(&self) -> FlashAddr {
        self.addr
    }

    /// Stage a single byte out of flash.
    #[inline]
    pub fn get(&self, index: usize) -> Option<u8> {
        if index < self.len {
            Some(unsafe { reader::read_u8(self.addr.offset(index)) })
        } else {
            None
        }
    }

    /// Stage the byte at `index` out of flash.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[inline]
    pub fn load_at(&self, index: usize) -> u8 {
        assert!(index < self.len, "index out of bounds of flash blob");
        unsafe { reader::read_u8(self.addr.offset(index)) }
    }

    /// Stage the whole blob into `dst`, overwriting its prefix.
    ///
    /// `dst` must be at least [`len`](Self::len) bytes; the number of bytes
    /// written is returned.
    pub fn copy_into(&self, dst: &mut [u8]) -> Result<usize, Error> {
        if dst.len() < self.len {
            return Err(Error::BufferTooSmall);
        }
        unsafe { reader::read_bytes(self.addr, &mut dst[..self.len]) };
        trace!("staged {} bytes from {:?}", self.len, self.addr);
        Ok(self.len)
    }

    /// Sub-blob covering `offset..offset + len`.
    pub fn slice(&self, offset: usize, len: usize) -> Result<FlashBytes, Error> {
        let end = offset.checked_add(len).ok_or(Error::OutOfBounds)?;
        if end > self.len {
            return Err(Error::OutOfBounds);
        }
        Ok(Self {
            addr: self.addr.offset(offset),
            len,
        })
    }

    /// Iterate the bytes, staging one at a time.
    #[inline]
    pub fn iter(&self) -> FlashBytesIter {
        FlashBytesIter {
            blob: *self,
            next: 0,
        }
    }
}

/// Byte iterator over a [`FlashBytes`] blob.
#[derive(Clone, Debug)]
pub struct FlashBytesIter {
    blob: FlashBytes,
    next: usize,
}

impl Iterator for FlashBytesIter {
    type Item = u8;

    #[inline]
    fn next(&mut self) -> Option<u8> {
        let byte = self.blob.get(self.next)?;
        self.next += 1;
        Some(byte)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.blob.len() - self.next;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for FlashBytesIter {}

impl IntoIterator for FlashBytes {
    type Item = u8;
    type IntoIter = FlashBytesIter;

    #[inline]
    fn into_iter(self) -> FlashBytesIter {
        self.iter()
    }
}

/// NUL-terminated byte string in the flash space.
///
/// This is the form stored behind pointer-table entries, where only a bare
/// address fits: the length is not recorded anywhere and is rediscovered by
/// scanning for the terminator through the reader.
///
/// The terminator is part of the storage, never part of the contents:
/// [`len`](Self::len) and [`bytes`](Self::bytes) exclude it.
#[derive(Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashCStr {
    addr: FlashAddr,
}

// See `FlashAddr`: flash contents are immutable for the program lifetime.
unsafe impl Send for FlashCStr {}
unsafe impl Sync for FlashCStr {}

impl FlashCStr {
    /// Build a handle from a raw flash pointer to a NUL-terminated sequence.
    ///
    /// # Safety
    ///
    /// `p` must point into the flash space at a sequence that contains a NUL
    /// byte before the end of the addressable image. An unterminated sequence
    /// makes [`len`](Self::len) scan into whatever follows.
    #[inline]
    pub const unsafe fn from_raw(p: *const u8) -> Self {
        Self {
            addr: FlashAddr::new(p),
        }
    }

    /// The qualified address of the first byte.
    #[inline]
    pub const fn addr(&self) -> FlashAddr {
        self.addr
    }

    /// Length in bytes, excluding the terminator. Scans the flash space.
    pub fn len(&self) -> usize {
        let mut n = 0;
        while unsafe { reader::read_u8(self.addr.offset(n)) } != 0 {
            n += 1;
        }
        n
    }

    /// Whether the string is empty (the first byte is the terminator).
    #[inline]
    pub fn is_empty(&self) -> bool {
        let first = unsafe { reader::read_u8(self.addr) };
        first == 0
    }

    /// The contents as a sized blob, terminator excluded.
    #[inline]
    pub fn bytes(&self) -> FlashBytes {
        FlashBytes {
            addr: self.addr,
            len: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static WORD: u16 = 0x1234;
    static ARRAY: [u8; 6] = *b"abcdef";
    static PAIRS: [u16; 3] = [10, 20, 30];
    static GREETING_Z: [u8; 6] = *b"hello\0";
    static EMPTY_Z: [u8; 1] = [0];

    #[test]
    fn typed_load_round_trips() {
        let value = unsafe { Flash::new(&WORD as *const u16) };
        assert_eq!(value.load(), 0x1234);
    }

    #[test]
    fn array_handle_indexes_elements() {
        let pairs = unsafe { Flash::new(&PAIRS as *const [u16; 3]) };
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs.get(0), Some(10));
        assert_eq!(pairs.get(2), Some(30));
        assert_eq!(pairs.get(3), None);
    }

    #[test]
    fn blob_copy_out_matches_content() {
        let blob = unsafe { FlashBytes::from_raw_parts(ARRAY.as_ptr(), ARRAY.len()) };
        let mut out = [0u8; 6];
        assert_eq!(blob.copy_into(&mut out), Ok(6));
        assert_eq!(&out, b"abcdef");
    }

    #[test]
    fn blob_copy_rejects_short_destination() {
        let blob = unsafe { FlashBytes::from_raw_parts(ARRAY.as_ptr(), ARRAY.len()) };
        let mut out = [0u8; 4];
        assert_eq!(blob.copy_into(&mut out), Err(Error::BufferTooSmall));
    }

    #[test]
    fn indexed_load_reads_in_bounds() {
        let blob = unsafe { FlashBytes::from_raw_parts(ARRAY.as_ptr(), ARRAY.len()) };
        assert_eq!(blob.load_at(0), b'a');
        assert_eq!(blob.load_at(5), b'f');
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn indexed_load_panics_past_the_end() {
        let blob = unsafe { FlashBytes::from_raw_parts(ARRAY.as_ptr(), ARRAY.len()) };
        let _ = blob.load_at(6);
    }

    #[test]
    fn blob_slice_and_iter() {
        let blob = unsafe { FlashBytes::from_raw_parts(ARRAY.as_ptr(), ARRAY.len()) };
        let mid = blob.slice(2, 3).unwrap();
        let staged: std::vec::Vec<u8> = mid.iter().collect();
        assert_eq!(staged, b"cde");
        // Handles compare by window, so the full-width slice is the blob itself.
        assert_eq!(blob.slice(0, blob.len()), Ok(blob));
        assert_eq!(blob.slice(5, 2), Err(Error::OutOfBounds));
        assert_eq!(blob.slice(6, 0).map(|b| b.len()), Ok(0));
    }

    #[test]
    fn zero_length_blob_is_valid() {
        let blob = unsafe { FlashBytes::from_raw_parts(ARRAY.as_ptr(), 0) };
        assert!(blob.is_empty());
        assert_eq!(blob.iter().count(), 0);
        let mut out = [0u8; 0];
        assert_eq!(blob.copy_into(&mut out), Ok(0));
    }

    #[test]
    fn cstr_scans_to_terminator() {
        let s = unsafe { FlashCStr::from_raw(GREETING_Z.as_ptr()) };
        assert_eq!(s.len(), 5);
        assert!(!s.is_empty());
        let mut out = [0u8; 5];
        assert_eq!(s.bytes().copy_into(&mut out), Ok(5));
        assert_eq!(&out, b"hello");
    }

    #[test]
    fn empty_cstr_is_valid() {
        let s = unsafe { FlashCStr::from_raw(EMPTY_Z.as_ptr()) };
        assert_eq!(s.len(), 0);
        assert!(s.is_empty());
        assert!(s.bytes().is_empty());
    }
}
