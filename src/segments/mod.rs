//! The segment tree.
//!
//! Everything the parser produces is a [`Segment`]: either a leaf
//! (carrying raw text) or a branch (carrying an ordered child sequence).
//! Segments are immutable after construction and cheap to clone (the
//! payload is shared behind an `Arc`). Edits produce new segments; when
//! an edit logically replaces a segment in place the replacement keeps
//! the original's stable identity.
//!
//! Invariants:
//! - Concatenating the raw text of all leaves, in order, reproduces the
//!   templated input exactly.
//! - Class-type sets are monotone: a segment's set always contains its
//!   own type plus every ancestor type.

mod meta;

use std::fmt::Write as _;
use std::ops::Range;
use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use uuid::Uuid;

use crate::base::PositionMarker;

pub use meta::{MetaKind, dedent, end_of_file, indent, meta_segment, placeholder};

/// Classification of a leaf segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafKind {
    Code,
    Whitespace,
    Newline,
    Comment,
    /// Zero-width marker (indent hints, placeholders, end-of-file).
    Meta(MetaKind),
}

/// The payload of a segment: raw text or children.
#[derive(Debug, Clone)]
pub enum SegmentPayload {
    Leaf {
        raw: SmolStr,
        kind: LeafKind,
        /// Characters stripped from each end for `raw_trimmed` (quoted
        /// identifiers and literals).
        trim_chars: Option<Box<[char]>>,
    },
    Branch { children: Vec<Segment> },
}

#[derive(Debug)]
struct SegmentInner {
    seg_type: SmolStr,
    /// The type plus ancestor types, most specific first.
    class_types: Vec<SmolStr>,
    /// Finer discriminators attached at lex/parse time (e.g. a keyword's
    /// canonical name).
    instance_types: Vec<SmolStr>,
    marker: Option<PositionMarker>,
    id: Uuid,
    payload: SegmentPayload,
    descendant_types: OnceLock<FxHashSet<SmolStr>>,
    raw_cache: OnceLock<Box<str>>,
}

/// A node in the parse tree. Cheap to clone.
#[derive(Clone)]
pub struct Segment {
    inner: Arc<SegmentInner>,
}

impl Segment {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Construct a leaf segment.
    pub fn leaf(
        seg_type: impl Into<SmolStr>,
        raw: impl Into<SmolStr>,
        kind: LeafKind,
        marker: Option<PositionMarker>,
    ) -> Self {
        let seg_type = seg_type.into();
        let mut class_types = vec![seg_type.clone()];
        match &kind {
            LeafKind::Whitespace | LeafKind::Newline => {}
            LeafKind::Comment => push_unique(&mut class_types, "comment"),
            LeafKind::Meta(_) => push_unique(&mut class_types, "meta"),
            LeafKind::Code => {}
        }
        push_unique(&mut class_types, "raw");
        Self {
            inner: Arc::new(SegmentInner {
                seg_type,
                class_types,
                instance_types: Vec::new(),
                marker,
                id: Uuid::new_v4(),
                payload: SegmentPayload::Leaf {
                    raw: raw.into(),
                    kind,
                    trim_chars: None,
                },
                descendant_types: OnceLock::new(),
                raw_cache: OnceLock::new(),
            }),
        }
    }

    /// Construct a branch segment. The marker is derived from the
    /// children's markers where available.
    pub fn branch(
        seg_type: impl Into<SmolStr>,
        parent_types: &[SmolStr],
        children: Vec<Segment>,
    ) -> Self {
        let seg_type = seg_type.into();
        let mut class_types = vec![seg_type.clone()];
        for t in parent_types {
            push_unique(&mut class_types, t.as_str());
        }
        push_unique(&mut class_types, "base");
        let marker =
            PositionMarker::from_child_markers(children.iter().filter_map(|c| c.marker()));
        Self {
            inner: Arc::new(SegmentInner {
                seg_type,
                class_types,
                instance_types: Vec::new(),
                marker,
                id: Uuid::new_v4(),
                payload: SegmentPayload::Branch { children },
                descendant_types: OnceLock::new(),
                raw_cache: OnceLock::new(),
            }),
        }
    }

    /// Add instance types (finer discriminators) to a freshly-built leaf.
    pub fn with_instance_types(self, types: Vec<SmolStr>) -> Self {
        let mut inner = self.unshare();
        inner.instance_types = types;
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Attach trim characters to a leaf (no-op for branches).
    pub fn with_trim_chars(self, chars: &[char]) -> Self {
        let mut inner = self.unshare();
        if let SegmentPayload::Leaf { trim_chars, .. } = &mut inner.payload {
            *trim_chars = Some(chars.into());
        }
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Attach extra class types (used when a parser recasts a leaf).
    pub fn with_class_types(self, extra: &[SmolStr]) -> Self {
        let mut inner = self.unshare();
        for t in extra {
            push_unique(&mut inner.class_types, t.as_str());
        }
        Self {
            inner: Arc::new(inner),
        }
    }

    /// A copy of this leaf with a new segment type, preserving raw text,
    /// marker and identity. Used by parsers which re-type raw tokens
    /// (e.g. a word becoming a keyword).
    pub fn recast(
        &self,
        seg_type: impl Into<SmolStr>,
        extra_class_types: &[SmolStr],
        instance_types: Vec<SmolStr>,
    ) -> Self {
        let seg_type = seg_type.into();
        let mut inner = self.unshare();
        let mut class_types = vec![seg_type.clone()];
        for t in extra_class_types {
            push_unique(&mut class_types, t.as_str());
        }
        // Monotone typing: keep the previous classification too.
        for t in &inner.class_types {
            push_unique(&mut class_types, t.as_str());
        }
        inner.seg_type = seg_type;
        inner.class_types = class_types;
        inner.instance_types = instance_types;
        Self {
            inner: Arc::new(inner),
        }
    }

    /// A copy of this branch with new children, *preserving identity*.
    ///
    /// This is the in-place edit primitive: the result represents the
    /// same logical node, so it keeps the UUID.
    pub fn with_children(&self, children: Vec<Segment>) -> Self {
        let marker =
            PositionMarker::from_child_markers(children.iter().filter_map(|c| c.marker()));
        Self {
            inner: Arc::new(SegmentInner {
                seg_type: self.inner.seg_type.clone(),
                class_types: self.inner.class_types.clone(),
                instance_types: self.inner.instance_types.clone(),
                marker,
                id: self.inner.id,
                payload: SegmentPayload::Branch { children },
                descendant_types: OnceLock::new(),
                raw_cache: OnceLock::new(),
            }),
        }
    }

    fn unshare(&self) -> SegmentInner {
        SegmentInner {
            seg_type: self.inner.seg_type.clone(),
            class_types: self.inner.class_types.clone(),
            instance_types: self.inner.instance_types.clone(),
            marker: self.inner.marker.clone(),
            id: self.inner.id,
            payload: self.inner.payload.clone(),
            descendant_types: OnceLock::new(),
            raw_cache: OnceLock::new(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn seg_type(&self) -> &SmolStr {
        &self.inner.seg_type
    }

    pub fn class_types(&self) -> &[SmolStr] {
        &self.inner.class_types
    }

    pub fn instance_types(&self) -> &[SmolStr] {
        &self.inner.instance_types
    }

    pub fn marker(&self) -> Option<&PositionMarker> {
        self.inner.marker.as_ref()
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn payload(&self) -> &SegmentPayload {
        &self.inner.payload
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.inner.payload, SegmentPayload::Leaf { .. })
    }

    pub fn children(&self) -> &[Segment] {
        match &self.inner.payload {
            SegmentPayload::Branch { children } => children,
            SegmentPayload::Leaf { .. } => &[],
        }
    }

    pub fn leaf_kind(&self) -> Option<&LeafKind> {
        match &self.inner.payload {
            SegmentPayload::Leaf { kind, .. } => Some(kind),
            SegmentPayload::Branch { .. } => None,
        }
    }

    /// Is this a code leaf, or a branch containing any code?
    pub fn is_code(&self) -> bool {
        match &self.inner.payload {
            SegmentPayload::Leaf { kind, .. } => matches!(kind, LeafKind::Code),
            SegmentPayload::Branch { children } => children.iter().any(Segment::is_code),
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(
            self.leaf_kind(),
            Some(LeafKind::Whitespace) | Some(LeafKind::Newline)
        )
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.leaf_kind(), Some(LeafKind::Comment))
    }

    pub fn is_meta(&self) -> bool {
        matches!(self.leaf_kind(), Some(LeafKind::Meta(_)))
    }

    pub fn meta_kind(&self) -> Option<&MetaKind> {
        match self.leaf_kind() {
            Some(LeafKind::Meta(kind)) => Some(kind),
            _ => None,
        }
    }

    /// Does the class-type set contain `seg_type`?
    pub fn is_type(&self, seg_type: &str) -> bool {
        self.inner.class_types.iter().any(|t| t == seg_type)
    }

    /// Does the class-type set intersect any of the given types?
    pub fn is_type_any(&self, types: &[&str]) -> bool {
        types.iter().any(|t| self.is_type(t))
    }

    /// The raw text of this segment: leaf text, or the in-order
    /// concatenation of all leaf text beneath a branch.
    pub fn raw(&self) -> &str {
        match &self.inner.payload {
            SegmentPayload::Leaf { raw, .. } => raw.as_str(),
            SegmentPayload::Branch { children } => self.inner.raw_cache.get_or_init(|| {
                let mut buf = String::new();
                for child in children {
                    buf.push_str(child.raw());
                }
                buf.into_boxed_str()
            }),
        }
    }

    /// Raw text with any declared trim characters stripped from each end.
    pub fn raw_trimmed(&self) -> &str {
        match &self.inner.payload {
            SegmentPayload::Leaf {
                raw,
                trim_chars: Some(chars),
                ..
            } => raw
                .as_str()
                .trim_matches(|c| chars.contains(&c)),
            _ => self.raw(),
        }
    }

    /// Upper-cased raw text, handy for keyword comparisons.
    pub fn raw_upper(&self) -> String {
        self.raw().to_uppercase()
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// The set of all class types appearing anywhere beneath this segment.
    pub fn descendant_type_set(&self) -> &FxHashSet<SmolStr> {
        self.inner.descendant_types.get_or_init(|| {
            let mut set = FxHashSet::default();
            for child in self.children() {
                set.extend(child.class_types().iter().cloned());
                set.extend(child.descendant_type_set().iter().cloned());
            }
            set
        })
    }

    /// The class types of direct children only.
    pub fn direct_descendant_type_set(&self) -> FxHashSet<SmolStr> {
        let mut set = FxHashSet::default();
        for child in self.children() {
            set.extend(child.class_types().iter().cloned());
        }
        set
    }

    /// All leaves beneath this segment, in order.
    pub fn raw_segments(&self) -> Vec<Segment> {
        let mut buf = Vec::new();
        self.collect_raws(&mut buf);
        buf
    }

    fn collect_raws(&self, buf: &mut Vec<Segment>) {
        match &self.inner.payload {
            SegmentPayload::Leaf { .. } => buf.push(self.clone()),
            SegmentPayload::Branch { children } => {
                for child in children {
                    child.collect_raws(buf);
                }
            }
        }
    }

    /// Depth-first search for descendants matching any of `types`.
    ///
    /// If `recurse_into` is false, matching segments are returned without
    /// searching inside them.
    pub fn recursive_crawl(&self, types: &[&str], recurse_into: bool) -> Vec<Segment> {
        let mut buf = Vec::new();
        self.crawl_into(types, recurse_into, &mut buf);
        buf
    }

    fn crawl_into(&self, types: &[&str], recurse_into: bool, buf: &mut Vec<Segment>) {
        for child in self.children() {
            let matched = child.is_type_any(types);
            if matched {
                buf.push(child.clone());
            }
            if !matched || recurse_into {
                // Prune subtrees which cannot contain a match.
                if types
                    .iter()
                    .any(|t| child.descendant_type_set().contains(*t))
                {
                    child.crawl_into(types, recurse_into, buf);
                }
            }
        }
    }

    /// The first direct child of the given type.
    pub fn get_child(&self, seg_type: &str) -> Option<&Segment> {
        self.children().iter().find(|c| c.is_type(seg_type))
    }

    /// All direct children of the given type.
    pub fn get_children(&self, seg_type: &str) -> Vec<&Segment> {
        self.children()
            .iter()
            .filter(|c| c.is_type(seg_type))
            .collect()
    }

    /// The chain of ancestors from this segment down to (and excluding)
    /// the target, identified by UUID. Empty if not found.
    pub fn path_to(&self, target: &Segment) -> Vec<Segment> {
        let mut path = Vec::new();
        if self.find_path(target.id(), &mut path) {
            path.reverse();
            path
        } else {
            Vec::new()
        }
    }

    fn find_path(&self, target: Uuid, path: &mut Vec<Segment>) -> bool {
        for child in self.children() {
            if child.id() == target || child.find_path(target, path) {
                path.push(self.clone());
                return true;
            }
        }
        false
    }

    /// A cross-phase anchor: `(source_slice, seg_type)`.
    ///
    /// Identities regenerate when the tree is re-parsed after a fix
    /// phase; fingerprints let rules holding references across phases
    /// degrade gracefully.
    pub fn fingerprint(&self) -> Option<(Range<usize>, SmolStr)> {
        self.marker()
            .map(|m| (m.source_slice.clone(), self.seg_type().clone()))
    }

    /// Render the tree for debugging and test assertions.
    pub fn stringify(&self) -> String {
        let mut buf = String::new();
        self.stringify_into(&mut buf, 0);
        buf
    }

    fn stringify_into(&self, buf: &mut String, depth: usize) {
        for _ in 0..depth {
            buf.push_str("    ");
        }
        match &self.inner.payload {
            SegmentPayload::Leaf { raw, .. } => {
                let _ = writeln!(buf, "{}: {:?}", self.seg_type(), raw.as_str());
            }
            SegmentPayload::Branch { children } => {
                let _ = writeln!(buf, "{}:", self.seg_type());
                for child in children {
                    child.stringify_into(buf, depth + 1);
                }
            }
        }
    }

    /// Identity comparison (same logical node).
    pub fn same_identity(&self, other: &Segment) -> bool {
        self.inner.id == other.inner.id
    }
}

impl PartialEq for Segment {
    /// Structural equality: type, raw text and position.
    fn eq(&self, other: &Self) -> bool {
        self.seg_type() == other.seg_type()
            && self.raw() == other.raw()
            && self.marker() == other.marker()
    }
}

impl Eq for Segment {}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner.payload {
            SegmentPayload::Leaf { raw, .. } => {
                write!(f, "<{}: {:?}>", self.seg_type(), raw.as_str())
            }
            SegmentPayload::Branch { children } => {
                write!(f, "<{}: {} children>", self.seg_type(), children.len())
            }
        }
    }
}

fn push_unique(types: &mut Vec<SmolStr>, t: &str) {
    if !types.iter().any(|existing| existing == t) {
        types.push(SmolStr::new(t));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templater::TemplatedFile;
    use std::sync::Arc;

    fn marker(tf: &Arc<TemplatedFile>, range: Range<usize>) -> PositionMarker {
        PositionMarker::new(range.clone(), range, tf.clone())
    }

    fn sample_tree() -> Segment {
        let tf = Arc::new(TemplatedFile::from_string("SELECT a"));
        let kw = Segment::leaf("keyword", "SELECT", LeafKind::Code, Some(marker(&tf, 0..6)));
        let ws = Segment::leaf(
            "whitespace",
            " ",
            LeafKind::Whitespace,
            Some(marker(&tf, 6..7)),
        );
        let col = Segment::leaf(
            "naked_identifier",
            "a",
            LeafKind::Code,
            Some(marker(&tf, 7..8)),
        );
        let clause = Segment::branch(
            "select_clause",
            &[SmolStr::new("clause")],
            vec![kw, ws, col],
        );
        Segment::branch("file", &[], vec![clause])
    }

    #[test]
    fn test_raw_concatenation() {
        let tree = sample_tree();
        assert_eq!(tree.raw(), "SELECT a");
    }

    #[test]
    fn test_is_type_monotone() {
        let tree = sample_tree();
        let clause = &tree.children()[0];
        assert!(clause.is_type("select_clause"));
        assert!(clause.is_type("clause"));
        assert!(clause.is_type("base"));
        assert!(!clause.is_type("keyword"));
    }

    #[test]
    fn test_recursive_crawl() {
        let tree = sample_tree();
        let keywords = tree.recursive_crawl(&["keyword"], false);
        assert_eq!(keywords.len(), 1);
        assert_eq!(keywords[0].raw(), "SELECT");
    }

    #[test]
    fn test_descendant_type_set() {
        let tree = sample_tree();
        assert!(tree.descendant_type_set().contains("keyword"));
        assert!(tree.descendant_type_set().contains("select_clause"));
        assert!(!tree.descendant_type_set().contains("file"));
    }

    #[test]
    fn test_with_children_preserves_identity() {
        let tree = sample_tree();
        let edited = tree.with_children(tree.children().to_vec());
        assert!(tree.same_identity(&edited));
    }

    #[test]
    fn test_recast_keeps_prior_types() {
        let tf = Arc::new(TemplatedFile::from_string("select"));
        let word = Segment::leaf("word", "select", LeafKind::Code, Some(marker(&tf, 0..6)));
        let kw = word.recast("keyword", &[], vec![]);
        assert!(kw.is_type("keyword"));
        assert!(kw.is_type("word"));
        assert_eq!(kw.raw(), "select");
        assert!(kw.same_identity(&word));
    }

    #[test]
    fn test_path_to() {
        let tree = sample_tree();
        let kw = tree.recursive_crawl(&["keyword"], false).remove(0);
        let path = tree.path_to(&kw);
        assert_eq!(path.len(), 2);
        assert_eq!(path[0].seg_type(), "file");
        assert_eq!(path[1].seg_type(), "select_clause");
    }

    #[test]
    fn test_raw_trimmed() {
        let seg = Segment::leaf("quoted_identifier", "\"col\"", LeafKind::Code, None)
            .with_trim_chars(&['"']);
        assert_eq!(seg.raw_trimmed(), "col");
        assert_eq!(seg.raw(), "\"col\"");
    }
}
