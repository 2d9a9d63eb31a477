//! Tables of flash-space pointers to flash-space strings.
//!
//! A string table placed in constant storage is two levels of flash: the
//! slot array itself, and the character data each slot points at. Reading a
//! slot yields a pointer value, and that value is itself a flash address,
//! never dereferenceable directly. [`FlashStrTable`] keeps the two steps
//! apart in the types: indexing produces a [`TableEntry`] (a located slot),
//! and only [`TableEntry::resolve`] reads the slot and re-qualifies the
//! stored pointer as a [`FlashCStr`].
//!
//! A table whose slots point at resident strings needs none of this; that
//! is just a `[&str; N]` in constant storage, and the language already
//! types it correctly.

use crate::blob::FlashCStr;
use crate::reader;
use crate::types::FlashAddr;

const SLOT_SIZE: usize = core::mem::size_of::<*const u8>();

/// Storage for one table slot, used by [`flash_str_table!`](crate::flash_str_table!)
/// expansions. Layout-identical to the raw pointer it wraps, so an array of
/// slots reads back at pointer stride.
#[doc(hidden)]
#[repr(transparent)]
pub struct TableSlot(pub *const u8);

// Slot values are addresses of immutable flash data; sharing them is what a
// table in constant storage is for.
unsafe impl Sync for TableSlot {}

/// An array of pointer-width slots in flash, each holding the address of a
/// NUL-terminated string elsewhere in flash.
///
/// Produced by [`flash_str_table!`](crate::flash_str_table!).
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashStrTable {
    base: FlashAddr,
    len: usize,
}

// Flash contents never change while the program runs.
unsafe impl Send for FlashStrTable {}
unsafe impl Sync for FlashStrTable {}

impl FlashStrTable {
    /// Build a table handle from the address of the first slot.
    ///
    /// # Safety
    ///
    /// `base` must point at `len` consecutive pointer-width slots in
    /// constant storage, and every slot must hold the flash address of a
    /// NUL-terminated byte string, all readable through the flash access
    /// path for the program's lifetime.
    #[inline]
    pub const unsafe fn from_raw_parts(base: *const u8, len: usize) -> Self {
        Self {
            base: FlashAddr::new(base),
            len,
        }
    }

    /// Number of entries.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Locate slot `index` without reading it.
    #[inline]
    pub fn entry(&self, index: usize) -> Option<TableEntry> {
        if index >= self.len {
            return None;
        }
        Some(TableEntry {
            addr: self.base.offset(index * SLOT_SIZE),
        })
    }

    /// Resolve entry `index` to the string it points at.
    ///
    /// `None` when `index` is out of range.
    #[inline]
    pub fn get(&self, index: usize) -> Option<FlashCStr> {
        self.entry(index).map(|e| e.resolve())
    }

    /// Iterate the entries in slot order, resolving each.
    #[inline]
    pub fn iter(&self) -> FlashStrTableIter {
        FlashStrTableIter {
            table: *self,
            next: 0,
        }
    }
}

impl IntoIterator for FlashStrTable {
    type Item = FlashCStr;
    type IntoIter = FlashStrTableIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A located but unread table slot.
///
/// The slot's own address is available immediately; the pointer stored in
/// it only becomes usable through [`resolve`](Self::resolve), which is the
/// read that crosses into the slot's target.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TableEntry {
    addr: FlashAddr,
}

unsafe impl Send for TableEntry {}
unsafe impl Sync for TableEntry {}

impl TableEntry {
    /// Address of the slot itself (not of the string it points at).
    #[inline]
    pub const fn addr(&self) -> FlashAddr {
        self.addr
    }

    /// Read the slot and re-qualify the stored pointer as a flash string.
    #[inline]
    pub fn resolve(&self) -> FlashCStr {
        // The table's construction contract covers both the slot and its
        // target, so the loaded value is a valid flash string address.
        let target = unsafe { reader::read_ptr(self.addr) };
        unsafe { FlashCStr::from_raw(target) }
    }
}

/// Iterator over a [`FlashStrTable`], yielding resolved entries.
#[derive(Clone, Debug)]
pub struct FlashStrTableIter {
    table: FlashStrTable,
    next: usize,
}

impl Iterator for FlashStrTableIter {
    type Item = FlashCStr;

    fn next(&mut self) -> Option<FlashCStr> {
        let item = self.table.get(self.next)?;
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.table.len() - self.next;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for FlashStrTableIter {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;
    use std::vec::Vec;

    static APPLE_Z: [u8; 6] = *b"apple\0";
    static BANANA_Z: [u8; 7] = *b"banana\0";
    static CHERRY_Z: [u8; 7] = *b"cherry\0";
    // Thin references keep the slot array at pointer stride.
    static SLOTS: [&u8; 3] = [&APPLE_Z[0], &BANANA_Z[0], &CHERRY_Z[0]];

    fn table() -> FlashStrTable {
        unsafe { FlashStrTable::from_raw_parts(SLOTS.as_ptr() as *const u8, SLOTS.len()) }
    }

    #[test]
    fn resolves_each_entry_to_its_string() {
        let t = table();
        assert_eq!(t.len(), 3);
        assert_eq!(t.get(0).unwrap().to_string(), "apple");
        assert_eq!(t.get(1).unwrap().to_string(), "banana");
        assert_eq!(t.get(2).unwrap().to_string(), "cherry");
    }

    #[test]
    fn out_of_range_is_none() {
        assert!(table().get(3).is_none());
        assert!(table().entry(usize::MAX).is_none());
    }

    #[test]
    fn entry_addresses_step_by_slot_size() {
        let t = table();
        let first = t.entry(0).unwrap().addr().as_raw() as usize;
        let second = t.entry(1).unwrap().addr().as_raw() as usize;
        assert_eq!(second - first, core::mem::size_of::<*const u8>());
    }

    #[test]
    fn entry_then_resolve_matches_get() {
        let t = table();
        let via_entry = t.entry(1).unwrap().resolve();
        let via_get = t.get(1).unwrap();
        assert_eq!(via_entry.addr().as_raw(), via_get.addr().as_raw());
    }

    #[test]
    fn iterates_in_slot_order() {
        let words: Vec<_> = table().iter().map(|s| s.to_string()).collect();
        assert_eq!(words, ["apple", "banana", "cherry"]);
    }

    #[test]
    fn zero_length_table_is_valid() {
        let t = unsafe { FlashStrTable::from_raw_parts(SLOTS.as_ptr() as *const u8, 0) };
        assert!(t.is_empty());
        assert!(t.get(0).is_none());
        assert_eq!(t.iter().count(), 0);
    }
}
