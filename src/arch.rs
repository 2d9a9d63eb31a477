//! Per-target primitives for reading the flash address space.
//!
//! On AVR, program memory is a separate address space and a byte is fetched
//! with the `lpm` instruction; a plain load through the same pointer value
//! would hit data memory instead. On every other supported target the image
//! is memory-mapped (Cortex-M XIP flash, or the host when running tests) and
//! a volatile load is the entire access sequence.
//!
//! This module is the single seam for a port: a target whose constant store
//! sits behind paging or banking hardware would wrap its bank switch and
//! critical section around these functions and nothing else.

#[cfg(not(target_arch = "avr"))]
mod port {
    /// Read one byte from the flash space.
    ///
    /// # Safety
    ///
    /// `p` must be a valid flash-space address for a 1-byte read.
    #[inline(always)]
    pub(crate) unsafe fn read_u8(p: *const u8) -> u8 {
        core::ptr::read_volatile(p)
    }

    /// Read a scalar of type `T` from the flash space.
    ///
    /// # Safety
    ///
    /// `p` must be valid and aligned for a `T`-sized read in the flash space.
    #[inline(always)]
    pub(crate) unsafe fn read_scalar<T: Copy>(p: *const T) -> T {
        core::ptr::read_volatile(p)
    }

    /// Copy `len` bytes out of the flash space into resident memory.
    ///
    /// # Safety
    ///
    /// `src..src+len` must be valid flash-space addresses and `dst` must be
    /// writable for `len` bytes; the ranges must not overlap.
    #[inline]
    pub(crate) unsafe fn read_block(src: *const u8, dst: *mut u8, len: usize) {
        core::ptr::copy_nonoverlapping(src, dst, len);
    }
}

#[cfg(target_arch = "avr")]
mod port {
    use core::arch::asm;
    use core::mem::{size_of, MaybeUninit};

    /// Read one byte from program memory via `lpm`.
    ///
    /// # Safety
    ///
    /// `p` must be a valid program-space address for a 1-byte read.
    #[inline(always)]
    pub(crate) unsafe fn read_u8(p: *const u8) -> u8 {
        let byte: u8;
        asm!(
            "lpm {out}, Z",
            out = out(reg) byte,
            in("Z") p,
            options(pure, readonly, nostack),
        );
        byte
    }

    /// Read a scalar of type `T` from program memory, one byte at a time.
    ///
    /// `lpm` has no alignment requirement, so none is imposed here.
    ///
    /// # Safety
    ///
    /// `p` must be valid for a `T`-sized read in the program space, and the
    /// bytes there must be a valid `T` (they are, when the handle was created
    /// by this crate's placement macros).
    #[inline]
    pub(crate) unsafe fn read_scalar<T: Copy>(p: *const T) -> T {
        let mut out = MaybeUninit::<T>::uninit();
        read_block(p as *const u8, out.as_mut_ptr() as *mut u8, size_of::<T>());
        out.assume_init()
    }

    /// Copy `len` bytes out of program memory into data memory.
    ///
    /// # Safety
    ///
    /// `src..src+len` must be valid program-space addresses and `dst` must be
    /// writable for `len` bytes.
    #[inline]
    pub(crate) unsafe fn read_block(src: *const u8, dst: *mut u8, len: usize) {
        for i in 0..len {
            dst.add(i).write(read_u8(src.add(i)));
        }
    }
}

pub(crate) use port::{read_block, read_scalar, read_u8};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_read_matches_static() {
        static WORD: u32 = 0xA5C3_00FF;
        let read = unsafe { read_scalar(&WORD as *const u32) };
        assert_eq!(read, 0xA5C3_00FF);
    }

    #[test]
    fn block_read_copies_everything() {
        static DATA: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];
        let mut out = [0xFFu8; 8];
        unsafe { read_block(DATA.as_ptr(), out.as_mut_ptr(), 8) };
        assert_eq!(out, DATA);
    }
}
