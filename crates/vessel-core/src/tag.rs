//! Type tag registry — the 16 logical types shared by every value cell.
//!
//! The numeric code of a [`TypeTag`] *is* its wire byte *is* its in-memory
//! discriminant (invariant T1): there is exactly one place, here, where the
//! mapping from code to tag is defined, and every codec in the workspace
//! goes through it instead of re-deriving its own table.

use core::fmt;

/// One of the 16 logical types a value cell can hold.
///
/// Tags 8 (`LLong`) and 9 (`ULLong`) exist only on the wire: Rust has no
/// native distinction between a platform's `long` and `long long` aliases
/// (both are `i64`/`u64` on every target Rust supports), so invariant T2
/// always collapses — [`TypeTag::normalize`] folds `LLong`/`ULLong` into
/// `Long`/`ULong` unconditionally. The wire codes are kept distinct so that
/// producers from a platform that *does* distinguish them still round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TypeTag {
    /// Absence of a value.
    Null = 0,
    /// Single bit boolean.
    Bool = 1,
    /// Signed 16-bit integer.
    Short = 2,
    /// Unsigned 16-bit integer.
    UShort = 3,
    /// Signed 32-bit integer.
    Int = 4,
    /// Unsigned 32-bit integer.
    UInt = 5,
    /// Signed 64-bit integer.
    Long = 6,
    /// Unsigned 64-bit integer.
    ULong = 7,
    /// Signed 64-bit integer, wire-distinct alias of `long` (see T2).
    LLong = 8,
    /// Unsigned 64-bit integer, wire-distinct alias of `ulong` (see T2).
    ULLong = 9,
    /// IEEE-754 binary32.
    Float = 10,
    /// IEEE-754 binary64.
    Double = 11,
    /// UTF-8 string.
    String = 12,
    /// Arbitrary byte sequence.
    Bytes = 13,
    /// Nested, owned value store.
    Container = 14,
    /// Ordered, heterogeneous sequence of cells.
    Array = 15,
}

impl TypeTag {
    /// All 16 tags, in code order. Useful for exhaustive property tests.
    pub const ALL: [TypeTag; 16] = [
        TypeTag::Null,
        TypeTag::Bool,
        TypeTag::Short,
        TypeTag::UShort,
        TypeTag::Int,
        TypeTag::UInt,
        TypeTag::Long,
        TypeTag::ULong,
        TypeTag::LLong,
        TypeTag::ULLong,
        TypeTag::Float,
        TypeTag::Double,
        TypeTag::String,
        TypeTag::Bytes,
        TypeTag::Container,
        TypeTag::Array,
    ];

    /// The wire/discriminant code (invariant T1).
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Recovers a tag from its numeric code, if valid.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(TypeTag::Null),
            1 => Some(TypeTag::Bool),
            2 => Some(TypeTag::Short),
            3 => Some(TypeTag::UShort),
            4 => Some(TypeTag::Int),
            5 => Some(TypeTag::UInt),
            6 => Some(TypeTag::Long),
            7 => Some(TypeTag::ULong),
            8 => Some(TypeTag::LLong),
            9 => Some(TypeTag::ULLong),
            10 => Some(TypeTag::Float),
            11 => Some(TypeTag::Double),
            12 => Some(TypeTag::String),
            13 => Some(TypeTag::Bytes),
            14 => Some(TypeTag::Container),
            15 => Some(TypeTag::Array),
            _ => None,
        }
    }

    /// Applies invariant T2: on every Rust target `long`/`long long` (and
    /// their unsigned counterparts) are the same native type, so the alias
    /// tags always collapse into the canonical ones.
    #[must_use]
    pub const fn normalize(self) -> Self {
        match self {
            TypeTag::LLong => TypeTag::Long,
            TypeTag::ULLong => TypeTag::ULong,
            other => other,
        }
    }

    /// The one-character wire code used by the textual envelope grammar
    /// (`'0'..='9'`, `'a'..='f'`).
    #[must_use]
    pub const fn wire_char(self) -> char {
        match self.code() {
            c @ 0..=9 => (b'0' + c) as char,
            c => (b'a' + (c - 10)) as char,
        }
    }

    /// Parses a textual envelope wire character back into a tag.
    #[must_use]
    pub fn from_wire_char(c: char) -> Option<Self> {
        let code = match c {
            '0'..='9' => c as u8 - b'0',
            'a'..='f' => c as u8 - b'a' + 10,
            _ => return None,
        };
        Self::from_code(code)
    }

    /// True for the four non-alias 64-bit integer tags and their aliases,
    /// i.e. everything [`TypeTag::normalize`] treats as 64-bit.
    #[must_use]
    pub const fn is_64_bit_integer(self) -> bool {
        matches!(self, TypeTag::Long | TypeTag::ULong | TypeTag::LLong | TypeTag::ULLong)
    }

    /// Short, stable name (used by JSON/XML projections and diagnostics).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TypeTag::Null => "null",
            TypeTag::Bool => "bool",
            TypeTag::Short => "short",
            TypeTag::UShort => "ushort",
            TypeTag::Int => "int",
            TypeTag::UInt => "uint",
            TypeTag::Long => "long",
            TypeTag::ULong => "ulong",
            TypeTag::LLong => "llong",
            TypeTag::ULLong => "ullong",
            TypeTag::Float => "float",
            TypeTag::Double => "double",
            TypeTag::String => "string",
            TypeTag::Bytes => "bytes",
            TypeTag::Container => "container",
            TypeTag::Array => "array",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_round_trips_for_all_tags() {
        for tag in TypeTag::ALL {
            assert_eq!(TypeTag::from_code(tag.code()), Some(tag));
        }
    }

    #[test]
    fn wire_char_round_trips() {
        for tag in TypeTag::ALL {
            assert_eq!(TypeTag::from_wire_char(tag.wire_char()), Some(tag));
        }
    }

    #[test]
    fn alias_collapse_is_total_on_this_target() {
        assert_eq!(TypeTag::LLong.normalize(), TypeTag::Long);
        assert_eq!(TypeTag::ULLong.normalize(), TypeTag::ULong);
        assert_eq!(TypeTag::Long.normalize(), TypeTag::Long);
    }

    #[test]
    fn invalid_code_is_none() {
        assert_eq!(TypeTag::from_code(16), None);
        assert_eq!(TypeTag::from_wire_char('g'), None);
    }
}
