//! Raw scalar and block reads from the flash address space.
//!
//! This is the unchecked layer: nothing here validates bounds, and every
//! function is `unsafe`. An out-of-range address is undefined behavior, the
//! same as handing a bad pointer to the hardware access sequence itself.
//! Safe, bounds-aware access lives on the handle types ([`crate::Flash`],
//! [`crate::FlashBytes`], [`crate::FlashStr`], [`crate::FlashStrTable`]).
//!
//! Scalars come back in the image's native representation. The data being
//! read is this program's own image, not a foreign wire format, so there is
//! no byte-order conversion anywhere.

use crate::arch;
use crate::types::FlashAddr;

/// Read one byte.
///
/// # Safety
///
/// `addr` must be valid for a 1-byte read in the flash space.
#[inline]
pub unsafe fn read_u8(addr: FlashAddr) -> u8 {
    arch::read_u8(addr.as_raw())
}

/// Read a 2-byte scalar.
///
/// # Safety
///
/// `addr` must be valid for a 2-byte read in the flash space, and aligned to
/// 2 bytes on memory-mapped ports (AVR reads byte-wise and has no alignment
/// requirement).
#[inline]
pub unsafe fn read_u16(addr: FlashAddr) -> u16 {
    arch::read_scalar(addr.as_raw() as *const u16)
}

/// Read a 4-byte scalar.
///
/// # Safety
///
/// `addr` must be valid for a 4-byte read in the flash space, and aligned to
/// 4 bytes on memory-mapped ports.
#[inline]
pub unsafe fn read_u32(addr: FlashAddr) -> u32 {
    arch::read_scalar(addr.as_raw() as *const u32)
}

/// Read one reference-width word.
///
/// This is the element read used by flash-resident pointer tables: the word
/// stored at `addr` is itself a flash-space address (2 bytes on AVR, the
/// native pointer width elsewhere). The returned pointer value has not been
/// dereferenced; it must be re-qualified before use.
///
/// # Safety
///
/// `addr` must be valid for a pointer-width read in the flash space, and
/// aligned to the pointer width on memory-mapped ports.
#[inline]
pub unsafe fn read_ptr(addr: FlashAddr) -> *const u8 {
    arch::read_scalar(addr.as_raw() as *const *const u8)
}

/// Block-copy `dst.len()` bytes starting at `addr` into resident memory,
/// fully overwriting `dst`.
///
/// # Safety
///
/// `addr..addr + dst.len()` must be valid flash-space addresses.
#[inline]
pub unsafe fn read_bytes(addr: FlashAddr, dst: &mut [u8]) {
    arch::read_block(addr.as_raw(), dst.as_mut_ptr(), dst.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    static IMAGE: [u8; 8] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];

    fn base() -> FlashAddr {
        unsafe { FlashAddr::new(IMAGE.as_ptr()) }
    }

    #[test]
    fn one_byte_width() {
        assert_eq!(unsafe { read_u8(base()) }, 0x11);
        assert_eq!(unsafe { read_u8(base().offset(7)) }, 0x88);
    }

    #[test]
    fn two_and_four_byte_widths_native_repr() {
        static HALF: u16 = 0xBEEF;
        static WORD: u32 = 0xDEAD_BEEF;
        let h = unsafe { read_u16(FlashAddr::new(&HALF as *const u16 as *const u8)) };
        let w = unsafe { read_u32(FlashAddr::new(&WORD as *const u32 as *const u8)) };
        assert_eq!(h, 0xBEEF);
        assert_eq!(w, 0xDEAD_BEEF);
    }

    #[test]
    fn pointer_width_read_returns_stored_reference() {
        static TARGET: u8 = 0x5A;
        static SLOT: &u8 = &TARGET;
        let stored = unsafe { read_ptr(FlashAddr::new(&SLOT as *const &u8 as *const u8)) };
        assert_eq!(stored as usize, &TARGET as *const u8 as usize);
        assert_eq!(unsafe { read_u8(FlashAddr::new(stored)) }, 0x5A);
    }

    #[test]
    fn block_copy_overwrites_destination() {
        let mut out = [0xAA; 5];
        unsafe { read_bytes(base().offset(2), &mut out) };
        assert_eq!(out, [0x33, 0x44, 0x55, 0x66, 0x77]);
    }
}
