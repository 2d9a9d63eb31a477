#![cfg_attr(not(test), no_std)]
#![doc = "Typed access to constant data stored in a separate flash address space."]
#![doc = ""]
#![doc = "On Harvard-style targets (AVR being the common case) program memory is"]
#![doc = "not reachable through ordinary loads, so a pointer alone does not say"]
#![doc = "how to read it. This crate keeps the two spaces apart in the type"]
#![doc = "system: data placed by the `flash_static!` family of macros comes back"]
#![doc = "as a handle (`Flash<T>`, `FlashBytes`, `FlashStr`, `FlashCStr`,"]
#![doc = "`FlashStrTable`) that can only be read through the explicit staging"]
#![doc = "paths, while resident data keeps its ordinary reference types. On"]
#![doc = "memory-mapped targets the same handles read through volatile loads, so"]
#![doc = "one source tree serves both."]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

// Per-target read primitives; everything else is portable.
mod arch;

pub mod blob;
pub mod flash_str;
#[doc(hidden)]
pub mod macros;
pub mod ops;
pub mod rambuf;
pub mod reader;
pub mod region;
pub mod table;
pub mod types;

pub use blob::{Flash, FlashBytes, FlashCStr};
pub use flash_str::FlashStr;
pub use ops::{compare, copy, starts_with, write_all_to, ByteSource};
pub use rambuf::RamBuf;
pub use region::FlashRegion;
pub use table::{FlashStrTable, TableEntry};
pub use types::{Error, FlashAddr, MemSpace};
