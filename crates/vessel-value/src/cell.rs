//! The typed value cell (C2): a single tagged payload plus lightweight
//! read/write instrumentation.

use std::sync::atomic::{AtomicU64, Ordering};

use vessel_core::TypeTag;

use crate::store::Store;

/// The 16-type payload a [`Cell`] can hold. `LLong`/`ULLong` collapse into
/// `Long`/`ULong` in memory (invariant T2, see [`TypeTag::normalize`]) — the
/// wire-only aliases are reconstructed by the binary codec, never stored
/// here.
#[derive(Debug, Clone)]
enum Payload {
    Null,
    Bool(bool),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Container(Store),
    Array(Vec<Cell>),
}

/// A single self-describing value.
///
/// Equality and ordering compare only the payload; the instrumentation
/// counters are observational and never participate in `PartialEq`.
#[derive(Debug)]
pub struct Cell {
    payload: Payload,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl Clone for Cell {
    fn clone(&self) -> Self {
        Self {
            payload: self.payload.clone(),
            reads: AtomicU64::new(self.reads.load(Ordering::Relaxed)),
            writes: AtomicU64::new(self.writes.load(Ordering::Relaxed)),
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.tag() == other.tag() && self.bits_eq(other)
    }
}

impl Cell {
    fn new(payload: Payload) -> Self {
        Self { payload, reads: AtomicU64::new(0), writes: AtomicU64::new(0) }
    }

    /// Builds a `Null` cell.
    #[must_use]
    pub fn null() -> Self { Self::new(Payload::Null) }
    /// Builds a `Bool` cell.
    #[must_use]
    pub fn from_bool(v: bool) -> Self { Self::new(Payload::Bool(v)) }
    /// Builds a `Short` (i16) cell.
    #[must_use]
    pub fn from_short(v: i16) -> Self { Self::new(Payload::Short(v)) }
    /// Builds a `UShort` (u16) cell.
    #[must_use]
    pub fn from_ushort(v: u16) -> Self { Self::new(Payload::UShort(v)) }
    /// Builds an `Int` (i32) cell.
    #[must_use]
    pub fn from_int(v: i32) -> Self { Self::new(Payload::Int(v)) }
    /// Builds a `UInt` (u32) cell.
    #[must_use]
    pub fn from_uint(v: u32) -> Self { Self::new(Payload::UInt(v)) }
    /// Builds a `Long` (i64) cell. Also the in-memory home of the wire `LLong` alias.
    #[must_use]
    pub fn from_long(v: i64) -> Self { Self::new(Payload::Long(v)) }
    /// Builds a `ULong` (u64) cell. Also the in-memory home of the wire `ULLong` alias.
    #[must_use]
    pub fn from_ulong(v: u64) -> Self { Self::new(Payload::ULong(v)) }
    /// Builds a `Float` (f32) cell.
    #[must_use]
    pub fn from_float(v: f32) -> Self { Self::new(Payload::Float(v)) }
    /// Builds a `Double` (f64) cell.
    #[must_use]
    pub fn from_double(v: f64) -> Self { Self::new(Payload::Double(v)) }
    /// Builds a `String` cell.
    #[must_use]
    pub fn from_string(v: impl Into<String>) -> Self { Self::new(Payload::String(v.into())) }
    /// Builds a `Bytes` cell.
    #[must_use]
    pub fn from_bytes(v: impl Into<Vec<u8>>) -> Self { Self::new(Payload::Bytes(v.into())) }
    /// Builds a `Container` cell wrapping an owned nested [`Store`].
    #[must_use]
    pub fn from_container(v: Store) -> Self { Self::new(Payload::Container(v)) }
    /// Builds an `Array` cell from a vector of cells.
    #[must_use]
    pub fn from_array(v: Vec<Cell>) -> Self { Self::new(Payload::Array(v)) }

    /// Builds a cell from a raw wire type-tag byte and its payload bytes
    /// (§4.1 "construct from wire"), degrading to [`Cell::null`] on any
    /// malformed input rather than failing construction.
    #[must_use]
    pub fn from_wire(tag_code: u8, raw: &[u8]) -> Self { crate::binary::from_wire(tag_code, raw) }

    /// This cell's logical type tag.
    #[must_use]
    pub fn tag(&self) -> TypeTag {
        match &self.payload {
            Payload::Null => TypeTag::Null,
            Payload::Bool(_) => TypeTag::Bool,
            Payload::Short(_) => TypeTag::Short,
            Payload::UShort(_) => TypeTag::UShort,
            Payload::Int(_) => TypeTag::Int,
            Payload::UInt(_) => TypeTag::UInt,
            Payload::Long(_) => TypeTag::Long,
            Payload::ULong(_) => TypeTag::ULong,
            Payload::Float(_) => TypeTag::Float,
            Payload::Double(_) => TypeTag::Double,
            Payload::String(_) => TypeTag::String,
            Payload::Bytes(_) => TypeTag::Bytes,
            Payload::Container(_) => TypeTag::Container,
            Payload::Array(_) => TypeTag::Array,
        }
    }

    /// Total number of typed-getter calls observed on this cell.
    #[must_use]
    pub fn read_count(&self) -> u64 { self.reads.load(Ordering::Relaxed) }
    /// Total number of constructor/replace calls observed on this cell.
    #[must_use]
    pub fn write_count(&self) -> u64 { self.writes.load(Ordering::Relaxed) }

    fn bump_read(&self) { self.reads.fetch_add(1, Ordering::Relaxed); }

    /// Replaces the payload in place, bumping the write counter.
    pub fn replace(&mut self, payload_from: Cell) {
        self.payload = payload_from.payload;
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    fn bits_eq(&self, other: &Self) -> bool {
        use Payload::{Array, Bool, Bytes, Container, Double, Float, Int, Long, Null, Short, String as Str, UInt, ULong, UShort};
        match (&self.payload, &other.payload) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (UShort(a), UShort(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (UInt(a), UInt(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (ULong(a), ULong(b)) => a == b,
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Double(a), Double(b)) => a.to_bits() == b.to_bits(),
            (Str(a), Str(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Container(a), Container(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            _ => false,
        }
    }

    /* ───────────────────────── Coerced getters ─────────────────────────
     * Every getter is total: it never panics and degrades to a type's
     * natural zero value rather than failing, mirroring the store's
     * "malformed data never aborts the read" guarantee (V2/S1).
     */

    /// Coerces to `bool`: numeric non-zero is `true`, `"true"`/`"1"`
    /// (case-insensitive) parse as `true`, everything else not already
    /// handled is `false`.
    #[must_use]
    pub fn to_bool(&self) -> bool {
        self.bump_read();
        match &self.payload {
            Payload::Null => false,
            Payload::Bool(b) => *b,
            Payload::Short(n) => *n != 0,
            Payload::UShort(n) => *n != 0,
            Payload::Int(n) => *n != 0,
            Payload::UInt(n) => *n != 0,
            Payload::Long(n) => *n != 0,
            Payload::ULong(n) => *n != 0,
            Payload::Float(n) => *n != 0.0,
            Payload::Double(n) => *n != 0.0,
            Payload::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "t"),
            Payload::Bytes(b) => !b.is_empty(),
            Payload::Container(s) => !s.is_empty(),
            Payload::Array(a) => !a.is_empty(),
        }
    }

    /// Coerces to `i16`, saturating on narrowing, truncating fractional floats.
    #[must_use]
    pub fn to_short(&self) -> i16 { self.bump_read(); self.as_i64().clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16 }
    /// Coerces to `u16`, saturating to `0..=u16::MAX`.
    #[must_use]
    pub fn to_ushort(&self) -> u16 { self.bump_read(); self.as_i64().clamp(0, i64::from(u16::MAX)) as u16 }
    /// Coerces to `i32`, saturating on narrowing.
    #[must_use]
    pub fn to_int(&self) -> i32 { self.bump_read(); self.as_i64().clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32 }
    /// Coerces to `u32`, saturating to `0..=u32::MAX`.
    #[must_use]
    pub fn to_uint(&self) -> u32 { self.bump_read(); self.as_i64().clamp(0, i64::from(u32::MAX)) as u32 }
    /// Coerces to `i64` (also serves the wire `LLong` alias).
    #[must_use]
    pub fn to_long(&self) -> i64 { self.bump_read(); self.as_i64() }
    /// Coerces to `u64` (also serves the wire `ULLong` alias), saturating negatives to 0.
    #[must_use]
    pub fn to_ulong(&self) -> u64 { self.bump_read(); self.as_i64().max(0) as u64 }
    /// Coerces to `f32`.
    #[must_use]
    pub fn to_float(&self) -> f32 { self.bump_read(); self.as_f64() as f32 }
    /// Coerces to `f64`.
    #[must_use]
    pub fn to_double(&self) -> f64 { self.bump_read(); self.as_f64() }

    /// Coerces to `i16`, reporting whether the source value fell outside
    /// `i16`'s range (§4.1: "sets an overflow flag on the result").
    #[must_use]
    pub fn to_short_checked(&self) -> Coercion<i16> {
        self.bump_read();
        let (v, overflowed) = clamp128(self.as_i128(), i128::from(i16::MIN), i128::from(i16::MAX));
        Coercion { value: v as i16, overflowed }
    }
    /// Coerces to `u16`, reporting whether the source value fell outside `0..=u16::MAX`.
    #[must_use]
    pub fn to_ushort_checked(&self) -> Coercion<u16> {
        self.bump_read();
        let (v, overflowed) = clamp128(self.as_i128(), 0, i128::from(u16::MAX));
        Coercion { value: v as u16, overflowed }
    }
    /// Coerces to `i32`, reporting whether the source value fell outside `i32`'s range.
    #[must_use]
    pub fn to_int_checked(&self) -> Coercion<i32> {
        self.bump_read();
        let (v, overflowed) = clamp128(self.as_i128(), i128::from(i32::MIN), i128::from(i32::MAX));
        Coercion { value: v as i32, overflowed }
    }
    /// Coerces to `u32`, reporting whether the source value fell outside `0..=u32::MAX`.
    #[must_use]
    pub fn to_uint_checked(&self) -> Coercion<u32> {
        self.bump_read();
        let (v, overflowed) = clamp128(self.as_i128(), 0, i128::from(u32::MAX));
        Coercion { value: v as u32, overflowed }
    }
    /// Coerces to `i64`, reporting whether the source value (only possible from
    /// an out-of-range `ULong`) fell outside `i64`'s range.
    #[must_use]
    pub fn to_long_checked(&self) -> Coercion<i64> {
        self.bump_read();
        let (v, overflowed) = clamp128(self.as_i128(), i128::from(i64::MIN), i128::from(i64::MAX));
        Coercion { value: v as i64, overflowed }
    }
    /// Coerces to `u64`, reporting whether the source value fell outside `0..=u64::MAX`.
    #[must_use]
    pub fn to_ulong_checked(&self) -> Coercion<u64> {
        self.bump_read();
        let (v, overflowed) = clamp128(self.as_i128(), 0, i128::from(u64::MAX));
        Coercion { value: v as u64, overflowed }
    }

    /// Coerces to an owned `String` per §4.1's to-string rules: numeric
    /// types use Rust's shortest-round-trip `Display`, `Bytes` renders as
    /// lowercase hex with no separators, `Container` renders its JSON
    /// projection, and `Array` renders `[e1,e2,...]` with each element's own
    /// `to_string_lossy`.
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        self.bump_read();
        match &self.payload {
            Payload::Null => String::new(),
            Payload::Bool(b) => b.to_string(),
            Payload::Short(n) => n.to_string(),
            Payload::UShort(n) => n.to_string(),
            Payload::Int(n) => n.to_string(),
            Payload::UInt(n) => n.to_string(),
            Payload::Long(n) => n.to_string(),
            Payload::ULong(n) => n.to_string(),
            Payload::Float(n) => n.to_string(),
            Payload::Double(n) => n.to_string(),
            Payload::String(s) => s.clone(),
            Payload::Bytes(b) => vessel_core::hex::encode_lower(b),
            Payload::Container(s) => crate::json_lite::store_to_json_text(s),
            Payload::Array(a) => {
                let mut out = String::from("[");
                for (i, e) in a.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&e.to_string_lossy());
                }
                out.push(']');
                out
            }
        }
    }

    /// Coerces to `Vec<u8>`: `String`/`Bytes` copy their bytes, everything
    /// else copies the little-endian bytes of its textual form.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bump_read();
        match &self.payload {
            Payload::String(s) => s.as_bytes().to_vec(),
            Payload::Bytes(b) => b.clone(),
            _ => self.to_string_lossy().into_bytes(),
        }
    }

    /// Borrows the nested store if this is a `Container` cell.
    #[must_use]
    pub fn as_container(&self) -> Option<&Store> {
        self.bump_read();
        match &self.payload {
            Payload::Container(s) => Some(s),
            _ => None,
        }
    }

    /// Mutably borrows the nested store if this is a `Container` cell.
    pub fn as_container_mut(&mut self) -> Option<&mut Store> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        match &mut self.payload {
            Payload::Container(s) => Some(s),
            _ => None,
        }
    }

    /// Borrows the element slice if this is an `Array` cell.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Cell]> {
        self.bump_read();
        match &self.payload {
            Payload::Array(a) => Some(a),
            _ => None,
        }
    }

    fn as_i64(&self) -> i64 {
        match &self.payload {
            Payload::Null => 0,
            Payload::Bool(b) => i64::from(*b),
            Payload::Short(n) => i64::from(*n),
            Payload::UShort(n) => i64::from(*n),
            Payload::Int(n) => i64::from(*n),
            Payload::UInt(n) => i64::from(*n),
            Payload::Long(n) => *n,
            Payload::ULong(n) => i64::try_from(*n).unwrap_or(i64::MAX),
            Payload::Float(n) => *n as i64,
            Payload::Double(n) => *n as i64,
            Payload::String(s) => s.trim().parse::<i64>().unwrap_or(0),
            Payload::Bytes(_) | Payload::Container(_) | Payload::Array(_) => 0,
        }
    }

    /// Widened variant of [`Cell::as_i64`] that never itself clamps, so the
    /// `_checked` coercions can tell a genuine out-of-range source value
    /// apart from one that merely needed narrowing to fit `i64`.
    fn as_i128(&self) -> i128 {
        match &self.payload {
            Payload::Null => 0,
            Payload::Bool(b) => i128::from(*b),
            Payload::Short(n) => i128::from(*n),
            Payload::UShort(n) => i128::from(*n),
            Payload::Int(n) => i128::from(*n),
            Payload::UInt(n) => i128::from(*n),
            Payload::Long(n) => i128::from(*n),
            Payload::ULong(n) => i128::from(*n),
            Payload::Float(n) => *n as i128,
            Payload::Double(n) => *n as i128,
            Payload::String(s) => s.trim().parse::<i128>().unwrap_or(0),
            Payload::Bytes(_) | Payload::Container(_) | Payload::Array(_) => 0,
        }
    }

    fn as_f64(&self) -> f64 {
        match &self.payload {
            Payload::Float(n) => f64::from(*n),
            Payload::Double(n) => *n,
            Payload::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            _ => self.as_i64() as f64,
        }
    }

    /// Strict typed get (§4.1 "Typed get"): returns the payload only if the
    /// stored tag matches `T` exactly, with no coercion — unlike the
    /// `to_*` family, a `String` cell never satisfies `T = i32` here even
    /// though it would parse. Absent/mismatched tags are both "absent"
    /// (`None`); see [`Store::must_get`] for a variant that distinguishes
    /// the two as errors.
    #[must_use]
    pub fn get_typed<T: FromCell>(&self) -> Option<T> {
        self.bump_read();
        T::from_cell(self)
    }

    /// Dispatches to the matching [`Visitor`] method for this cell's payload.
    pub fn accept<V: Visitor>(&self, visitor: &mut V) {
        match &self.payload {
            Payload::Null => visitor.visit_null(),
            Payload::Bool(v) => visitor.visit_bool(*v),
            Payload::Short(v) => visitor.visit_short(*v),
            Payload::UShort(v) => visitor.visit_ushort(*v),
            Payload::Int(v) => visitor.visit_int(*v),
            Payload::UInt(v) => visitor.visit_uint(*v),
            Payload::Long(v) => visitor.visit_long(*v),
            Payload::ULong(v) => visitor.visit_ulong(*v),
            Payload::Float(v) => visitor.visit_float(*v),
            Payload::Double(v) => visitor.visit_double(*v),
            Payload::String(v) => visitor.visit_string(v),
            Payload::Bytes(v) => visitor.visit_bytes(v),
            Payload::Container(v) => visitor.visit_container(v),
            Payload::Array(v) => visitor.visit_array(v),
        }
    }
}

/// The result of a saturating numeric coercion (§4.1, testable property 9):
/// the clamped value, plus whether the source fell outside the destination
/// range and had to be clamped to produce it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coercion<T> {
    /// The saturated value.
    pub value: T,
    /// `true` when the source value was outside the destination range.
    pub overflowed: bool,
}

fn clamp128(raw: i128, lo: i128, hi: i128) -> (i128, bool) {
    if raw < lo {
        (lo, true)
    } else if raw > hi {
        (hi, true)
    } else {
        (raw, false)
    }
}

/// Backs [`Cell::get_typed`]/[`Store::must_get`](crate::store::Store::must_get):
/// extracts `Self` from a cell only when its tag exactly matches, without
/// any of the `to_*` coercions. One impl per scalar/owned payload type; no
/// blanket numeric-widening impl, so `i32::from_cell` rejects a `Short` cell
/// just as it rejects a `String` one.
pub trait FromCell: Sized {
    /// Returns `Some` only if `cell`'s tag is exactly this type's tag.
    fn from_cell(cell: &Cell) -> Option<Self>;
}

macro_rules! impl_from_cell {
    ($ty:ty, $variant:ident) => {
        impl FromCell for $ty {
            fn from_cell(cell: &Cell) -> Option<Self> {
                match &cell.payload {
                    Payload::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_from_cell!(bool, Bool);
impl_from_cell!(i16, Short);
impl_from_cell!(u16, UShort);
impl_from_cell!(i32, Int);
impl_from_cell!(u32, UInt);
impl_from_cell!(i64, Long);
impl_from_cell!(u64, ULong);
impl_from_cell!(String, String);
impl_from_cell!(Vec<u8>, Bytes);

impl FromCell for f32 {
    fn from_cell(cell: &Cell) -> Option<Self> {
        match &cell.payload {
            Payload::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromCell for f64 {
    fn from_cell(cell: &Cell) -> Option<Self> {
        match &cell.payload {
            Payload::Double(v) => Some(*v),
            _ => None,
        }
    }
}

/// One no-op-by-default method per logical type, so a codec or projection
/// only has to implement the arms it actually cares about (cf. [`Cell::accept`]).
pub trait Visitor {
    /// Visits `Null`.
    fn visit_null(&mut self) {}
    /// Visits `Bool`.
    fn visit_bool(&mut self, _v: bool) {}
    /// Visits `Short`.
    fn visit_short(&mut self, _v: i16) {}
    /// Visits `UShort`.
    fn visit_ushort(&mut self, _v: u16) {}
    /// Visits `Int`.
    fn visit_int(&mut self, _v: i32) {}
    /// Visits `UInt`.
    fn visit_uint(&mut self, _v: u32) {}
    /// Visits `Long`.
    fn visit_long(&mut self, _v: i64) {}
    /// Visits `ULong`.
    fn visit_ulong(&mut self, _v: u64) {}
    /// Visits `Float`.
    fn visit_float(&mut self, _v: f32) {}
    /// Visits `Double`.
    fn visit_double(&mut self, _v: f64) {}
    /// Visits `String`.
    fn visit_string(&mut self, _v: &str) {}
    /// Visits `Bytes`.
    fn visit_bytes(&mut self, _v: &[u8]) {}
    /// Visits `Container`.
    fn visit_container(&mut self, _v: &Store) {}
    /// Visits `Array`.
    fn visit_array(&mut self, _v: &[Cell]) {}
}

/// `Cell` (de)serializes as its payload alone — the read/write instrumentation
/// counters are observational and never cross the wire (mirrors their
/// exclusion from `PartialEq`).
#[cfg(feature = "serde")]
mod serde_impl {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{Cell, Payload};
    use crate::store::Store;

    #[derive(Serialize, Deserialize)]
    enum Wire {
        Null,
        Bool(bool),
        Short(i16),
        UShort(u16),
        Int(i32),
        UInt(u32),
        Long(i64),
        ULong(u64),
        Float(f32),
        Double(f64),
        String(String),
        Bytes(Vec<u8>),
        Container(Store),
        Array(Vec<Cell>),
    }

    impl From<&Payload> for Wire {
        fn from(p: &Payload) -> Self {
            match p {
                Payload::Null => Wire::Null,
                Payload::Bool(v) => Wire::Bool(*v),
                Payload::Short(v) => Wire::Short(*v),
                Payload::UShort(v) => Wire::UShort(*v),
                Payload::Int(v) => Wire::Int(*v),
                Payload::UInt(v) => Wire::UInt(*v),
                Payload::Long(v) => Wire::Long(*v),
                Payload::ULong(v) => Wire::ULong(*v),
                Payload::Float(v) => Wire::Float(*v),
                Payload::Double(v) => Wire::Double(*v),
                Payload::String(v) => Wire::String(v.clone()),
                Payload::Bytes(v) => Wire::Bytes(v.clone()),
                Payload::Container(v) => Wire::Container(v.clone()),
                Payload::Array(v) => Wire::Array(v.clone()),
            }
        }
    }

    impl From<Wire> for Payload {
        fn from(w: Wire) -> Self {
            match w {
                Wire::Null => Payload::Null,
                Wire::Bool(v) => Payload::Bool(v),
                Wire::Short(v) => Payload::Short(v),
                Wire::UShort(v) => Payload::UShort(v),
                Wire::Int(v) => Payload::Int(v),
                Wire::UInt(v) => Payload::UInt(v),
                Wire::Long(v) => Payload::Long(v),
                Wire::ULong(v) => Payload::ULong(v),
                Wire::Float(v) => Payload::Float(v),
                Wire::Double(v) => Payload::Double(v),
                Wire::String(v) => Payload::String(v),
                Wire::Bytes(v) => Payload::Bytes(v),
                Wire::Container(v) => Payload::Container(v),
                Wire::Array(v) => Payload::Array(v),
            }
        }
    }

    impl Serialize for Cell {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            Wire::from(&self.payload).serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Cell {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let wire = Wire::deserialize(deserializer)?;
            Ok(Cell::new(Payload::from(wire)))
        }
    }
}
