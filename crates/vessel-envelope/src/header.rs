//! §3.4 Messaging header — a thin, unvalidated routing header that always
//! travels alongside a value store in the textual envelope.

/// Source/target routing identifiers plus a message type and protocol
/// version. Intentionally minimal: no schema, no validation — callers are
/// free to put whatever routing convention they like into these fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageHeader {
    /// Identifier of the sending component.
    pub source_id: String,
    /// Sub-identifier of the sending component (e.g. a session or shard id).
    pub source_sub_id: String,
    /// Identifier of the receiving component.
    pub target_id: String,
    /// Sub-identifier of the receiving component.
    pub target_sub_id: String,
    /// Application-defined message type tag.
    pub message_type: String,
    /// Protocol version string, defaulting to `"1.0.0.0"`.
    pub version: String,
}

impl MessageHeader {
    /// Builds a header with every field empty except `version`, which
    /// defaults to `"1.0.0.0"`.
    #[must_use]
    pub fn new() -> Self {
        Self { version: "1.0.0.0".to_owned(), ..Default::default() }
    }

    /// Swaps the source and target pairs in place — used to address a
    /// reply at the sender of the message that carried this header.
    pub fn swap_header(&mut self) {
        std::mem::swap(&mut self.source_id, &mut self.target_id);
        std::mem::swap(&mut self.source_sub_id, &mut self.target_sub_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults_version_only() {
        let h = MessageHeader::new();
        assert_eq!(h.version, "1.0.0.0");
        assert!(h.source_id.is_empty());
    }

    #[test]
    fn swap_header_exchanges_source_and_target() {
        let mut h = MessageHeader::new();
        h.source_id = "a".into();
        h.target_id = "b".into();
        h.source_sub_id = "a1".into();
        h.target_sub_id = "b1".into();
        h.swap_header();
        assert_eq!(h.source_id, "b");
        assert_eq!(h.target_id, "a");
        assert_eq!(h.source_sub_id, "b1");
        assert_eq!(h.target_sub_id, "a1");
    }
}
