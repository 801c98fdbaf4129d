//! Zero-copy view (C8, §6.4) over an already-decoded textual envelope data
//! block: records byte spans instead of allocating [`vessel_value::Cell`]s,
//! so a caller that only needs a handful of fields out of a large envelope
//! doesn't pay for parsing the rest.
//!
//! Built on the same structural walker the header-only parse uses to skip
//! past cells it isn't materializing ([`crate::text::scan_top_level_cells`]),
//! so the span recording can never desynchronize from the real grammar (no
//! separate brace-counting pass that could disagree with the parser).

use std::ops::Range;
use std::str::FromStr;

use vessel_value::TypeTag;

/// A scalar type `as_parsed` can extract from a [`CellView`], paired with the
/// single [`TypeTag`] its source cell must carry (§4.7: "on mismatch or parse
/// failure returns absent" — mismatch is checked before parsing is attempted).
pub trait ViewScalar: FromStr {
    /// The only tag a view may hold for `as_parsed::<Self>()` to proceed.
    fn view_tag() -> TypeTag;
}

macro_rules! impl_view_scalar {
    ($ty:ty, $tag:expr) => {
        impl ViewScalar for $ty {
            fn view_tag() -> TypeTag { $tag }
        }
    };
}

impl_view_scalar!(bool, TypeTag::Bool);
impl_view_scalar!(i16, TypeTag::Short);
impl_view_scalar!(u16, TypeTag::UShort);
impl_view_scalar!(i32, TypeTag::Int);
impl_view_scalar!(u32, TypeTag::UInt);
impl_view_scalar!(i64, TypeTag::Long);
impl_view_scalar!(u64, TypeTag::ULong);
impl_view_scalar!(f32, TypeTag::Float);
impl_view_scalar!(f64, TypeTag::Double);
impl_view_scalar!(String, TypeTag::String);

use crate::escape;
use crate::text::scan_top_level_cells;

/// The byte ranges (into the original source string) of one top-level
/// cell's name and raw (still-escaped) value, plus its resolved tag.
#[derive(Debug, Clone)]
pub struct CellSpan {
    pub(crate) name: Range<usize>,
    pub(crate) value: Range<usize>,
    pub(crate) tag: Option<TypeTag>,
}

/// A lazily-scanned view over a data block's top-level cells.
#[derive(Debug, Clone)]
pub struct ValueView<'a> {
    source: &'a str,
    span: Range<usize>,
}

impl<'a> ValueView<'a> {
    pub(crate) fn new(source: &'a str, span: Range<usize>) -> Self {
        Self { source, span }
    }

    /// Scans the top-level cells without materializing any value, returning
    /// a handle per cell for selective inspection.
    #[must_use]
    pub fn cells(&self) -> Vec<CellView<'a>> {
        scan_top_level_cells(self.source, self.span.clone())
            .into_iter()
            .map(|span| CellView { source: self.source, span })
            .collect()
    }

    /// Finds the first top-level cell named `name`, scanning lazily.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<CellView<'a>> {
        self.cells().into_iter().find(|c| c.name() == name)
    }
}

/// A single top-level cell's name, tag, and raw value, without having
/// parsed the value into a [`vessel_value::Cell`].
#[derive(Debug, Clone)]
pub struct CellView<'a> {
    source: &'a str,
    span: CellSpan,
}

impl<'a> CellView<'a> {
    /// The cell's (unescaped) name.
    #[must_use]
    pub fn name(&self) -> String {
        escape::unescape(&self.source[self.span.name.clone()])
    }

    /// The cell's resolved type tag, or `None` if the wire code was invalid.
    #[must_use]
    pub fn tag(&self) -> Option<TypeTag> {
        self.span.tag
    }

    /// The cell's raw (still-escaped) value text, with no allocation.
    #[must_use]
    pub fn as_string_view(&self) -> &'a str {
        &self.source[self.span.value.clone()]
    }

    /// The cell's unescaped value as an owned `String`.
    #[must_use]
    pub fn value(&self) -> String {
        escape::unescape(self.as_string_view())
    }

    /// Typed extraction (§4.7 `as<T>()`): `None` unless this cell's tag is
    /// exactly `T::view_tag()`, and `None` again if the text then fails to
    /// parse as `T` — a tag mismatch never falls through to a parse attempt.
    #[must_use]
    pub fn as_parsed<T: ViewScalar>(&self) -> Option<T> {
        if self.tag() != Some(T::view_tag()) {
            return None;
        }
        self.value().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use vessel_value::{Cell, Store};

    use super::*;
    use crate::header::MessageHeader;
    use crate::text::{decode_header_only, encode};

    #[test]
    fn view_lazily_exposes_top_level_cells() {
        let mut s = Store::new();
        s.add("symbol", Cell::from_string("AAPL"));
        s.add("price", Cell::from_double(175.25));
        let text = encode(&MessageHeader::new(), &s);

        let parsed = decode_header_only(&text).unwrap();
        let view = parsed.view();
        let cells = view.cells();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].name(), "symbol");
        assert_eq!(cells[0].tag(), Some(TypeTag::String));
        assert_eq!(cells[0].value(), "AAPL");

        let price = view.find("price").unwrap();
        let parsed_price: f64 = price.as_parsed().unwrap();
        assert!((parsed_price - 175.25).abs() < f64::EPSILON);
    }

    #[test]
    fn view_skips_over_nested_containers_without_materializing_them() {
        let mut inner = Store::new();
        inner.add("x", Cell::from_int(1));
        let mut outer = Store::new();
        outer.add("nested", Cell::from_container(inner));
        outer.add("flag", Cell::from_bool(true));
        let text = encode(&MessageHeader::new(), &outer);

        let parsed = decode_header_only(&text).unwrap();
        let cells = parsed.view().cells();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[1].name(), "flag");
        assert_eq!(cells[1].value(), "true");
    }

    #[test]
    fn view_preserves_escaped_characters_raw() {
        let mut s = Store::new();
        s.add("msg", Cell::from_string("a]b;c"));
        let text = encode(&MessageHeader::new(), &s);
        let parsed = decode_header_only(&text).unwrap();
        let cell = parsed.view().find("msg").unwrap();
        assert_eq!(cell.as_string_view(), "a\\]b\\;c");
        assert_eq!(cell.value(), "a]b;c");
    }
}
