//! The reflow engine: all whitespace decisions live here.
//!
//! Layout rules don't edit whitespace themselves; they build a
//! [`ReflowSequence`] over (a slice of) the tree and ask for one of the
//! three operations - [`respace`], [`rebreak`] or [`reindent`] - which
//! return ordinary lint results. Keeping the decisions in one place is
//! what keeps the layout rules composable.
//!
//! Every fix the engine emits touches only whitespace or newline leaves
//! and is template-safe.

mod rebreak;
mod reindent;
mod respace;

use crate::config::{LayoutConfig, SpacingSpec};
use crate::segments::{LeafKind, Segment};

pub use rebreak::rebreak;
pub use reindent::reindent;
pub use respace::respace;

/// A code (or comment) leaf with its resolved spacing configuration.
#[derive(Debug, Clone)]
pub struct ReflowBlock {
    pub seg: Segment,
    pub spec: SpacingSpec,
}

/// The zero-or-more whitespace/newline/meta leaves between two blocks.
#[derive(Debug, Clone, Default)]
pub struct ReflowPoint {
    pub segments: Vec<Segment>,
}

impl ReflowPoint {
    pub fn has_newline(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s.leaf_kind(), Some(LeafKind::Newline)))
    }

    pub fn whitespace_leaves(&self) -> Vec<&Segment> {
        self.segments
            .iter()
            .filter(|s| matches!(s.leaf_kind(), Some(LeafKind::Whitespace)))
            .collect()
    }

    /// The visible whitespace text of the point.
    pub fn raw(&self) -> String {
        self.segments
            .iter()
            .filter(|s| !s.is_meta())
            .map(Segment::raw)
            .collect()
    }
}

/// Alternating points and blocks over the raw leaf stream.
///
/// The sequence always starts and ends with a point (possibly empty),
/// so every block has a gap on both sides to reason about.
#[derive(Debug, Clone)]
pub enum ReflowElement {
    Block(ReflowBlock),
    Point(ReflowPoint),
}

#[derive(Debug, Clone)]
pub struct ReflowSequence {
    pub elements: Vec<ReflowElement>,
}

impl ReflowSequence {
    /// Build a sequence from the whole tree.
    pub fn from_root(root: &Segment, layout: &LayoutConfig) -> Self {
        let leaves = root.raw_segments();
        let mut elements: Vec<ReflowElement> = Vec::with_capacity(leaves.len());
        let mut point = ReflowPoint::default();
        for leaf in leaves {
            let is_block = matches!(
                leaf.leaf_kind(),
                Some(LeafKind::Code) | Some(LeafKind::Comment)
            );
            if is_block {
                elements.push(ReflowElement::Point(std::mem::take(&mut point)));
                let spec = resolve_spec(&leaf, layout);
                elements.push(ReflowElement::Block(ReflowBlock { seg: leaf, spec }));
            } else {
                point.segments.push(leaf);
            }
        }
        elements.push(ReflowElement::Point(point));
        Self { elements }
    }

    /// The flat leaf stream, in order.
    pub fn leaves(&self) -> Vec<&Segment> {
        let mut out = Vec::new();
        for el in &self.elements {
            match el {
                ReflowElement::Block(b) => out.push(&b.seg),
                ReflowElement::Point(p) => out.extend(p.segments.iter()),
            }
        }
        out
    }
}

/// Resolve the spacing spec for a leaf from its class types, most
/// specific first.
fn resolve_spec(seg: &Segment, layout: &LayoutConfig) -> SpacingSpec {
    for class in seg.class_types() {
        if let Some(spec) = layout.spec_for_type(class) {
            return spec;
        }
    }
    SpacingSpec::default()
}

/// A fresh (markerless) whitespace leaf for fix edits.
pub(crate) fn new_whitespace(raw: &str) -> Segment {
    Segment::leaf("whitespace", raw, LeafKind::Whitespace, None)
}

/// A fresh newline leaf for fix edits.
pub(crate) fn new_newline() -> Segment {
    Segment::leaf("newline", "\n", LeafKind::Newline, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::PositionMarker;
    use crate::templater::TemplatedFile;
    use std::sync::Arc;

    pub(crate) fn leaf_stream(input: &str) -> Segment {
        // A minimal hand-rolled leaf stream: words, commas, whitespace
        // and newlines, wrapped in a file branch.
        let tf = Arc::new(TemplatedFile::from_string(input));
        let mut leaves = Vec::new();
        let mut start = 0;
        let chars: Vec<char> = input.chars().collect();
        let mut idx = 0;
        while idx < chars.len() {
            let c = chars[idx];
            let (kind, seg_type): (LeafKind, &str) = match c {
                ' ' | '\t' => (LeafKind::Whitespace, "whitespace"),
                '\n' => (LeafKind::Newline, "newline"),
                ',' => (LeafKind::Code, "comma"),
                _ => (LeafKind::Code, "word"),
            };
            let mut end = idx + 1;
            if matches!(kind, LeafKind::Whitespace) || seg_type == "word" {
                while end < chars.len() {
                    let next = chars[end];
                    let same = match seg_type {
                        "whitespace" => next == ' ' || next == '\t',
                        _ => next.is_alphanumeric() || next == '_',
                    };
                    if !same {
                        break;
                    }
                    end += 1;
                }
            }
            let raw: String = chars[idx..end].iter().collect();
            leaves.push(
                Segment::leaf(
                    seg_type,
                    raw,
                    kind,
                    Some(PositionMarker::new(start..start + (end - idx), start..start + (end - idx), tf.clone())),
                ),
            );
            start += end - idx;
            idx = end;
        }
        Segment::branch("file", &[], leaves)
    }

    #[test]
    fn test_sequence_alternates() {
        let root = leaf_stream("a, b");
        let seq = ReflowSequence::from_root(&root, &LayoutConfig::default());
        // point, a, point, comma, point, b, point
        assert_eq!(seq.elements.len(), 7);
        assert!(matches!(seq.elements[0], ReflowElement::Point(_)));
        assert!(matches!(seq.elements[1], ReflowElement::Block(_)));
    }

    #[test]
    fn test_comma_spec_resolution() {
        let root = leaf_stream("a , b");
        let seq = ReflowSequence::from_root(&root, &LayoutConfig::default());
        let comma = seq
            .elements
            .iter()
            .find_map(|el| match el {
                ReflowElement::Block(b) if b.seg.raw() == "," => Some(b),
                _ => None,
            })
            .unwrap();
        assert_eq!(comma.spec.before, crate::config::Spacing::Touch);
    }
}
