//! Meta segments: zero-width markers in the leaf stream.
//!
//! Metas never contribute characters to the raw concatenation, but they
//! participate in reflow (indent hints) and mark structure the lexer or
//! grammar knows about (template placeholders, end of file).

use smol_str::SmolStr;

use crate::base::PositionMarker;
use crate::segments::{LeafKind, Segment};

/// The kind of a meta segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaKind {
    /// Indentation should increase after this point.
    Indent,
    /// Indentation should decrease before this point.
    Dedent,
    /// A zero-width stand-in for source-only template material.
    Placeholder {
        /// The source text of the tag this placeholder stands for.
        source_str: SmolStr,
        /// The slice type of the tag, e.g. `block_start`.
        block_type: SmolStr,
    },
    /// Marks the end of the lexed sequence.
    EndOfFile,
}

impl MetaKind {
    /// The segment type tag for a meta of this kind.
    pub fn seg_type(&self) -> &'static str {
        match self {
            Self::Indent => "indent",
            Self::Dedent => "dedent",
            Self::Placeholder { .. } => "placeholder",
            Self::EndOfFile => "end_of_file",
        }
    }

    /// The change in indent balance this meta implies.
    pub fn indent_delta(&self) -> i32 {
        match self {
            Self::Indent => 1,
            Self::Dedent => -1,
            _ => 0,
        }
    }
}

/// Construct a meta segment of the given kind at a point position.
pub fn meta_segment(kind: MetaKind, marker: Option<PositionMarker>) -> Segment {
    Segment::leaf(kind.seg_type(), "", LeafKind::Meta(kind), marker)
}

/// An `Indent` meta at the given point.
pub fn indent(marker: Option<PositionMarker>) -> Segment {
    meta_segment(MetaKind::Indent, marker)
}

/// A `Dedent` meta at the given point.
pub fn dedent(marker: Option<PositionMarker>) -> Segment {
    meta_segment(MetaKind::Dedent, marker)
}

/// An `EndOfFile` meta at the given point.
pub fn end_of_file(marker: Option<PositionMarker>) -> Segment {
    meta_segment(MetaKind::EndOfFile, marker)
}

/// A template placeholder standing in for source-only material.
pub fn placeholder(
    source_str: impl Into<SmolStr>,
    block_type: impl Into<SmolStr>,
    marker: Option<PositionMarker>,
) -> Segment {
    meta_segment(
        MetaKind::Placeholder {
            source_str: source_str.into(),
            block_type: block_type.into(),
        },
        marker,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_is_zero_width() {
        let seg = indent(None);
        assert_eq!(seg.raw(), "");
        assert!(seg.is_meta());
        assert!(seg.is_type("indent"));
        assert!(seg.is_type("meta"));
    }

    #[test]
    fn test_indent_deltas() {
        assert_eq!(MetaKind::Indent.indent_delta(), 1);
        assert_eq!(MetaKind::Dedent.indent_delta(), -1);
        assert_eq!(MetaKind::EndOfFile.indent_delta(), 0);
    }

    #[test]
    fn test_placeholder_carries_source() {
        let seg = placeholder("{% if x %}", "block_start", None);
        match seg.meta_kind() {
            Some(MetaKind::Placeholder {
                source_str,
                block_type,
            }) => {
                assert_eq!(source_str.as_str(), "{% if x %}");
                assert_eq!(block_type.as_str(), "block_start");
            }
            other => panic!("unexpected meta kind: {other:?}"),
        }
    }
}
