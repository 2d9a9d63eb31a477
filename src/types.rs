//! Shared types: the memory-space tag, space-qualified flash addresses, and
//! the error set for fallible staging and lookup operations.

use core::fmt;

use embedded_storage::nor_flash::{NorFlashError, NorFlashErrorKind};

/// Which address space a run of bytes lives in.
///
/// `Ram` operands are ordinary references, directly usable. `Flash` operands
/// are handle types whose bytes can only be observed through [`crate::reader`].
/// The two are never implicitly convertible; the only sanctioned crossing is
/// an explicit staging copy into a caller-owned resident buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemSpace {
    /// Resident read/write memory.
    Ram,
    /// The flash (program) address space: immutable, lives as long as the
    /// program image, and on Harvard targets not reachable by a plain load.
    Flash,
}

/// Address of a byte in the flash address space.
///
/// A thin space qualifier around a raw pointer. It deliberately has no
/// `Deref` and no safe way to materialize the pointee: dereferencing a flash
/// address with a normal load is the classic cross-space bug on targets where
/// pointers do not encode their space. All access goes through
/// [`crate::reader`].
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct FlashAddr(*const u8);

// Flash contents are immutable for the lifetime of the program image, so a
// qualified address may be shared freely.
unsafe impl Send for FlashAddr {}
unsafe impl Sync for FlashAddr {}

impl FlashAddr {
    /// Qualify a raw pointer as a flash-space address.
    ///
    /// # Safety
    ///
    /// `p` must point into the flash address space of the running image.
    /// A resident pointer wrapped here will read garbage (or fault) on
    /// Harvard targets.
    #[inline]
    pub const unsafe fn new(p: *const u8) -> Self {
        Self(p)
    }

    /// The raw pointer value, for handing to the platform read primitives.
    #[inline]
    pub const fn as_raw(self) -> *const u8 {
        self.0
    }

    /// Address `n` bytes further into the flash space.
    #[inline]
    pub fn offset(self, n: usize) -> Self {
        Self(self.0.wrapping_add(n))
    }
}

impl fmt::Debug for FlashAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlashAddr({:#x})", self.0 as usize)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FlashAddr {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "FlashAddr({:#x})", self.0 as usize);
    }
}

/// Errors returned by the safe, bounds-aware operations.
///
/// The raw [`crate::reader`] layer never checks anything; these come from the
/// handle types and [`crate::RamBuf`], which do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Destination buffer is shorter than the data to stage into it.
    BufferTooSmall,
    /// Offset or length lies beyond the extent of a blob, region or table.
    OutOfBounds,
    /// Resident bytes were expected to be UTF-8 and are not.
    InvalidUtf8,
}

impl NorFlashError for Error {
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            Self::OutOfBounds => NorFlashErrorKind::OutOfBounds,
            Self::BufferTooSmall | Self::InvalidUtf8 => NorFlashErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_addr_offsets_by_bytes() {
        static DATA: [u8; 4] = [1, 2, 3, 4];
        let base = unsafe { FlashAddr::new(DATA.as_ptr()) };
        assert_eq!(base.offset(0).as_raw(), DATA.as_ptr());
        assert_eq!(base.offset(3).as_raw() as usize, DATA.as_ptr() as usize + 3);
    }

    #[test]
    fn flash_addr_debug_prints_hex() {
        static BYTE: u8 = 0;
        let addr = unsafe { FlashAddr::new(&BYTE) };
        let text = std::format!("{:?}", addr);
        assert!(text.starts_with("FlashAddr(0x"));
    }
}
