//! Placement macros and their const support functions.
//!
//! The macros are the safe front door of the crate: they place the data and
//! mint the matching handle in one step, so the unsafe constructors on the
//! handle types never need to appear in user code. On AVR the hidden statics
//! carry `link_section = ".progmem.data"`; on mapped targets they are plain
//! statics and the handles read them through the volatile path.

/// Place one or more `static` items in the flash space.
///
/// Each item becomes a [`Flash<T>`](crate::Flash) handle; the value itself
/// is stored in a hidden static that only the handle can reach. Attributes
/// and visibility pass through.
///
/// ```
/// flashref::flash_static! {
///     /// Per-channel gain, fixed at build time.
///     pub static GAIN: [u16; 4] = [100, 200, 400, 800];
///     static ANSWER: u8 = 42;
/// }
///
/// assert_eq!(ANSWER.load(), 42);
/// assert_eq!(GAIN.get(2), Some(400));
/// assert_eq!(GAIN.get(4), None);
/// ```
#[macro_export]
macro_rules! flash_static {
    (
        $(#[$attr:meta])*
        $vis:vis static $name:ident: $ty:ty = $value:expr;
        $($rest:tt)*
    ) => {
        $(#[$attr])*
        $vis static $name: $crate::Flash<$ty> = {
            #[cfg_attr(target_arch = "avr", link_section = ".progmem.data")]
            static VALUE: $ty = $value;
            // VALUE is placed in constant storage above; the handle is the
            // only name that escapes this block.
            unsafe { $crate::Flash::new(::core::ptr::addr_of!(VALUE)) }
        };
        $crate::flash_static! { $($rest)* }
    };
    () => {};
}

/// Stage a string literal in the flash space, yielding a
/// [`FlashStr`](crate::FlashStr).
///
/// Usable in expression position or as a `static` initializer. Every
/// expansion site stages its own copy, including sites repeating the same
/// literal; hoist shared text into one `static` when that matters.
///
/// ```
/// static BANNER: flashref::FlashStr = flashref::flash_str!("boot ok");
///
/// assert_eq!(BANNER.len(), 7);
/// assert_eq!(BANNER.to_string(), "boot ok");
/// ```
#[macro_export]
macro_rules! flash_str {
    ($s:expr) => {{
        const LEN: usize = $s.len();
        #[cfg_attr(target_arch = "avr", link_section = ".progmem.data")]
        static BYTES: [u8; LEN] = $crate::macros::str_bytes::<LEN>($s);
        // BYTES is the literal's UTF-8, staged verbatim.
        unsafe { $crate::FlashStr::from_raw_parts(::core::ptr::addr_of!(BYTES) as *const u8, LEN) }
    }};
}

/// Stage a string literal in the flash space with a trailing NUL, yielding
/// a [`FlashCStr`](crate::FlashCStr).
///
/// The literal must not contain interior NUL bytes; that is rejected at
/// compile time.
#[macro_export]
macro_rules! flash_cstr {
    ($s:expr) => {{
        const LEN: usize = $s.len() + 1;
        #[cfg_attr(target_arch = "avr", link_section = ".progmem.data")]
        static BYTES: [u8; LEN] = $crate::macros::cstr_bytes::<LEN>($s);
        unsafe { $crate::FlashCStr::from_raw(::core::ptr::addr_of!(BYTES) as *const u8) }
    }};
}

/// Place a table of NUL-terminated strings in the flash space.
///
/// Both levels go to flash: each literal is staged with a terminator, and
/// the slot array holding their addresses is itself a hidden static. The
/// named item is a [`FlashStrTable`](crate::FlashStrTable) handle.
///
/// ```
/// flashref::flash_str_table! {
///     static COMMANDS = ["get", "set", "reset"];
/// }
///
/// assert_eq!(COMMANDS.len(), 3);
/// assert_eq!(COMMANDS.get(1).unwrap().to_string(), "set");
/// ```
#[macro_export]
macro_rules! flash_str_table {
    (
        $(#[$attr:meta])*
        $vis:vis static $name:ident = [$($s:expr),* $(,)?];
        $($rest:tt)*
    ) => {
        $(#[$attr])*
        $vis static $name: $crate::FlashStrTable = {
            const LEN: usize = <[&str]>::len(&[$($s),*]);
            #[cfg_attr(target_arch = "avr", link_section = ".progmem.data")]
            static SLOTS: [$crate::table::TableSlot; LEN] = [
                $(
                    {
                        const TLEN: usize = $s.len() + 1;
                        #[cfg_attr(target_arch = "avr", link_section = ".progmem.data")]
                        static ENTRY: [u8; TLEN] = $crate::macros::cstr_bytes::<TLEN>($s);
                        $crate::table::TableSlot(::core::ptr::addr_of!(ENTRY) as *const u8)
                    }
                ),*
            ];
            unsafe {
                $crate::FlashStrTable::from_raw_parts(
                    ::core::ptr::addr_of!(SLOTS) as *const u8,
                    LEN,
                )
            }
        };
        $crate::flash_str_table! { $($rest)* }
    };
    () => {};
}

/// Copy a const `&str` into a fixed array, checking the length.
#[doc(hidden)]
pub const fn str_bytes<const N: usize>(s: &str) -> [u8; N] {
    let src = s.as_bytes();
    // `defmt`'s assert has no const form, so skip the logging shim here.
    ::core::assert!(src.len() == N, "length mismatch");
    let mut out = [0u8; N];
    let mut i = 0;
    while i < N {
        out[i] = src[i];
        i += 1;
    }
    out
}

/// Copy a const `&str` into a fixed array of its length plus one, leaving
/// the final byte as the NUL terminator.
#[doc(hidden)]
pub const fn cstr_bytes<const N: usize>(s: &str) -> [u8; N] {
    let src = s.as_bytes();
    ::core::assert!(src.len() + 1 == N, "length mismatch");
    let mut out = [0u8; N];
    let mut i = 0;
    while i < src.len() {
        ::core::assert!(src[i] != 0, "interior NUL in NUL-terminated string");
        out[i] = src[i];
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use std::string::ToString;
    use std::vec::Vec;

    use crate::ops;

    flash_static! {
        /// Scalar placed by the item form.
        static ANSWER: u16 = 0xBEEF;
        static LIMITS: [u8; 4] = [10, 20, 30, 40];
        pub(crate) static PAIR: (u8, u8) = (3, 7);
    }

    flash_str_table! {
        static FRUIT = ["apple", "banana", "cherry"];
        static EMPTY = [];
    }

    #[test]
    fn scalar_round_trips() {
        assert_eq!(ANSWER.load(), 0xBEEF);
        assert_eq!(PAIR.load(), (3, 7));
    }

    #[test]
    fn array_elements_are_indexable() {
        assert_eq!(LIMITS.len(), 4);
        assert_eq!(LIMITS.get(0), Some(10));
        assert_eq!(LIMITS.get(3), Some(40));
        assert_eq!(LIMITS.get(4), None);
        let mut staged = [0u8; 4];
        LIMITS.as_bytes().copy_into(&mut staged).unwrap();
        assert_eq!(staged, [10, 20, 30, 40]);
    }

    #[test]
    fn str_literal_round_trips() {
        let s = flash_str!("hello, world!");
        assert_eq!(s.len(), 13);
        assert_eq!(s.to_string(), "hello, world!");
    }

    #[test]
    fn str_works_as_static_initializer() {
        static BANNER: crate::FlashStr = flash_str!("boot ok");
        assert_eq!(BANNER.to_string(), "boot ok");
    }

    #[test]
    fn duplicate_literals_stage_separate_copies() {
        let a = flash_str!("same text");
        let b = flash_str!("same text");
        assert_ne!(a.addr().as_raw(), b.addr().as_raw());
        assert_eq!(ops::compare(a, b), core::cmp::Ordering::Equal);
    }

    #[test]
    fn cstr_literal_gets_terminator() {
        let c = flash_cstr!("status");
        assert_eq!(c.len(), 6);
        assert_eq!(c.to_string(), "status");
        // The byte after the content is the terminator itself.
        let terminator = unsafe { crate::reader::read_u8(c.addr().offset(6)) };
        assert_eq!(terminator, 0);
    }

    #[test]
    fn empty_cstr_is_just_a_terminator() {
        let c = flash_cstr!("");
        assert!(c.is_empty());
        assert_eq!(c.to_string(), "");
    }

    #[test]
    fn table_resolves_in_declaration_order() {
        assert_eq!(FRUIT.len(), 3);
        let words: Vec<_> = FRUIT.iter().map(|s| s.to_string()).collect();
        assert_eq!(words, ["apple", "banana", "cherry"]);
        assert!(FRUIT.get(3).is_none());
    }

    #[test]
    fn table_entries_resolve_in_two_steps() {
        let entry = FRUIT.entry(2).unwrap();
        // The slot's own address differs from the string it points at.
        assert_ne!(entry.addr().as_raw(), entry.resolve().addr().as_raw());
        assert_eq!(entry.resolve().to_string(), "cherry");
    }

    #[test]
    fn empty_table_is_valid() {
        assert!(EMPTY.is_empty());
        assert!(EMPTY.get(0).is_none());
    }

    #[test]
    fn resident_table_of_flash_strings_needs_no_slot_read() {
        // The two levels are independent: here the slot array is ordinary
        // resident data (indexed directly, no reader involved), while the
        // strings it holds still live behind flash handles.
        static NAMES: [crate::FlashCStr; 2] = [flash_cstr!("up"), flash_cstr!("down")];
        assert_eq!(NAMES[0].to_string(), "up");
        assert_eq!(NAMES[1].to_string(), "down");
    }
}
