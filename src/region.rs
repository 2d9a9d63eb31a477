//! Bounds-checked windows over a span of the flash space.
//!
//! Handles produced by the placement macros carry their own extent, but data
//! laid out by a linker script, a partition table or an external image tool
//! arrives as a bare base address and size. [`FlashRegion`] wraps such a
//! span once, at the single point where the layout knowledge lives, and
//! every read after that is offset-checked against it. It also implements
//! [`ReadNorFlash`], so region-shaped flash constants plug into drivers and
//! filesystems written against `embedded-storage`.

use embedded_storage::nor_flash::{ErrorType, ReadNorFlash};

use crate::blob::{FlashBytes, FlashCStr};
use crate::reader;
use crate::types::{Error, FlashAddr};

/// A contiguous, immutable span of the flash space with a known size.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashRegion {
    base: FlashAddr,
    size: usize,
}

// Flash contents never change while the program runs.
unsafe impl Send for FlashRegion {}
unsafe impl Sync for FlashRegion {}

impl FlashRegion {
    /// Describe a region of the flash space.
    ///
    /// # Safety
    ///
    /// `base..base + size` must lie in constant storage readable through
    /// the flash access path for the program's lifetime.
    #[inline]
    pub const unsafe fn new(base: *const u8, size: usize) -> Self {
        Self {
            base: FlashAddr::new(base),
            size,
        }
    }

    /// Address of the first byte.
    #[inline]
    pub const fn base(&self) -> FlashAddr {
        self.base
    }

    /// Size in bytes.
    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Whether `addr` falls inside this region.
    pub fn contains(&self, addr: FlashAddr) -> bool {
        let base = self.base.as_raw() as usize;
        let at = addr.as_raw() as usize;
        at >= base && at - base < self.size
    }

    fn checked(&self, offset: usize, len: usize) -> Result<FlashAddr, Error> {
        let end = offset.checked_add(len).ok_or(Error::OutOfBounds)?;
        if end > self.size {
            return Err(Error::OutOfBounds);
        }
        Ok(self.base.offset(offset))
    }

    /// Stage `out.len()` bytes starting at `offset` into `out`.
    pub fn read_at(&self, offset: usize, out: &mut [u8]) -> Result<(), Error> {
        let addr = self.checked(offset, out.len())?;
        unsafe { reader::read_bytes(addr, out) };
        Ok(())
    }

    /// A sized blob handle over `offset..offset + len` of this region.
    pub fn blob(&self, offset: usize, len: usize) -> Result<FlashBytes, Error> {
        let addr = self.checked(offset, len)?;
        Ok(unsafe { FlashBytes::from_raw_parts(addr.as_raw(), len) })
    }

    /// A NUL-terminated string handle starting at `offset`.
    ///
    /// The region is scanned to confirm a terminator exists before its end;
    /// without one the string would run past the span this handle vouches
    /// for, so that case is [`Error::OutOfBounds`].
    pub fn cstr(&self, offset: usize) -> Result<FlashCStr, Error> {
        let mut at = offset;
        loop {
            if at >= self.size {
                return Err(Error::OutOfBounds);
            }
            let byte = unsafe { reader::read_u8(self.base.offset(at)) };
            if byte == 0 {
                break;
            }
            at += 1;
        }
        Ok(unsafe { FlashCStr::from_raw(self.base.offset(offset).as_raw()) })
    }
}

impl ErrorType for FlashRegion {
    type Error = Error;
}

impl ReadNorFlash for FlashRegion {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        // `usize` is narrower than the offset type on 16-bit targets.
        let offset = usize::try_from(offset).map_err(|_| Error::OutOfBounds)?;
        self.read_at(offset, bytes)
    }

    fn capacity(&self) -> usize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_storage::nor_flash::{NorFlashError, NorFlashErrorKind};
    use std::string::ToString;

    // A little settings image: magic, version, a name, then padding.
    static IMAGE: [u8; 24] = *b"CFG1\x02\x00thermostat\0\xff\xff\xff\xff\xff\xff\xff";

    fn region() -> FlashRegion {
        unsafe { FlashRegion::new(IMAGE.as_ptr(), IMAGE.len()) }
    }

    #[test]
    fn reads_at_offset() {
        let mut magic = [0u8; 4];
        region().read_at(0, &mut magic).unwrap();
        assert_eq!(&magic, b"CFG1");

        let mut version = [0u8; 2];
        region().read_at(4, &mut version).unwrap();
        assert_eq!(version, [2, 0]);
    }

    #[test]
    fn rejects_reads_past_the_end() {
        let mut buf = [0u8; 8];
        assert_eq!(region().read_at(20, &mut buf), Err(Error::OutOfBounds));
        assert_eq!(region().read_at(usize::MAX, &mut buf), Err(Error::OutOfBounds));
    }

    #[test]
    fn blob_carves_a_sized_window() {
        let name = region().blob(6, 10).unwrap();
        let mut out = [0u8; 10];
        name.copy_into(&mut out).unwrap();
        assert_eq!(&out, b"thermostat");
        assert!(region().blob(6, 19).is_err());
    }

    #[test]
    fn cstr_requires_terminator_inside_region() {
        let name = region().cstr(6).unwrap();
        assert_eq!(name.to_string(), "thermostat");
        // Padding bytes carry no terminator before the end.
        assert_eq!(region().cstr(17).unwrap_err(), Error::OutOfBounds);
        assert_eq!(region().cstr(IMAGE.len()).unwrap_err(), Error::OutOfBounds);
    }

    #[test]
    fn contains_checks_span_membership() {
        let r = region();
        assert!(r.contains(r.base()));
        assert!(r.contains(r.base().offset(IMAGE.len() - 1)));
        assert!(!r.contains(r.base().offset(IMAGE.len())));
    }

    #[test]
    fn exposes_the_storage_read_interface() {
        let mut r = region();
        let mut buf = [0u8; 4];
        ReadNorFlash::read(&mut r, 0, &mut buf).unwrap();
        assert_eq!(&buf, b"CFG1");
        assert_eq!(ReadNorFlash::capacity(&r), 24);
        assert_eq!(FlashRegion::READ_SIZE, 1);
    }

    #[test]
    fn storage_read_rejects_offsets_past_capacity() {
        let mut r = region();
        let mut buf = [0u8; 1];
        // Offsets above 16 bits must error, never wrap to a low address.
        assert_eq!(
            ReadNorFlash::read(&mut r, 0x1_0000, &mut buf),
            Err(Error::OutOfBounds)
        );
        assert_eq!(
            ReadNorFlash::read(&mut r, u32::MAX, &mut buf),
            Err(Error::OutOfBounds)
        );
    }

    #[test]
    fn error_kinds_map_to_storage_vocabulary() {
        assert_eq!(
            Error::OutOfBounds.kind(),
            NorFlashErrorKind::OutOfBounds
        );
        assert_eq!(Error::BufferTooSmall.kind(), NorFlashErrorKind::Other);
    }
}
