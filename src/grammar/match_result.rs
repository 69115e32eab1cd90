//! Span-based match results.
//!
//! A match references a slice of the flat raw-segment array and carries
//! enough information to build the nested tree, without allocating any
//! segments until [`MatchResult::apply`]. Unmatched gaps inside the span
//! (whitespace, comments) pass through unchanged, which preserves the
//! lossless concatenation invariant.

use std::ops::Range;

use smol_str::SmolStr;

use crate::base::PositionMarker;
use crate::base::slices::{slice_len, zero_slice};
use crate::dialects::Dialect;
use crate::grammar::{NodeId, Recast};
use crate::segments::{MetaKind, Segment, meta_segment};

/// What a successful match turns its span into.
#[derive(Debug, Clone, PartialEq)]
pub enum Matched {
    /// A plain span: children are attached to the parent as-is.
    None,
    /// Wrap the span in a branch of the given segment class.
    Node(NodeId),
    /// Re-type a single matched leaf.
    Recast(Recast),
    /// Wrap the span in an `unparsable` branch.
    Unparsable { expected: SmolStr },
}

/// The result of a matching operation.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// The consumed slice of the reference segment array.
    pub matched_slice: Range<usize>,
    pub matched: Matched,
    /// Zero-width metas to insert, as `(index, kind)` pairs.
    pub insert_segments: Vec<(usize, MetaKind)>,
    /// Nested child matches, in index order.
    pub child_matches: Vec<MatchResult>,
}

impl MatchResult {
    /// An unmatched (empty) result at the given index.
    pub fn empty_at(idx: usize) -> Self {
        Self {
            matched_slice: zero_slice(idx),
            matched: Matched::None,
            insert_segments: Vec::new(),
            child_matches: Vec::new(),
        }
    }

    /// A plain match over a slice.
    pub fn from_span(span: Range<usize>) -> Self {
        Self {
            matched_slice: span,
            matched: Matched::None,
            insert_segments: Vec::new(),
            child_matches: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        slice_len(&self.matched_slice)
    }

    /// Did anything match? Zero-width results with meta insertions
    /// still count as matches.
    pub fn has_match(&self) -> bool {
        self.len() > 0 || !self.insert_segments.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_match()
    }

    /// Wrap this match in a segment class.
    pub fn wrap(self, node: NodeId) -> Self {
        if self.is_empty() {
            return self;
        }
        // If this is already a plain span, annotate in place; otherwise
        // nest the existing match as a child.
        match self.matched {
            Matched::None => Self {
                matched: Matched::Node(node),
                ..self
            },
            _ => Self {
                matched_slice: self.matched_slice.clone(),
                matched: Matched::Node(node),
                insert_segments: Vec::new(),
                child_matches: vec![self],
            },
        }
    }

    /// Concatenate an adjacent match onto this one, producing a plain
    /// span. Wrapped results (nodes, recasts) nest as children.
    pub fn append(self, other: MatchResult) -> Self {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        debug_assert!(other.matched_slice.start >= self.matched_slice.end);
        let start = self.matched_slice.start;
        let end = other.matched_slice.end;
        // Flatten both sides into a plain accumulator.
        let mut acc = match self.matched {
            Matched::None => self,
            _ => MatchResult {
                matched_slice: self.matched_slice.clone(),
                matched: Matched::None,
                insert_segments: Vec::new(),
                child_matches: vec![self],
            },
        };
        match other.matched {
            Matched::None => {
                acc.insert_segments.extend(other.insert_segments);
                acc.child_matches.extend(other.child_matches);
            }
            _ => acc.child_matches.push(other),
        }
        acc.matched_slice = start..end;
        acc
    }

    /// Build segments from this match against the reference array.
    pub fn apply(&self, segments: &[Segment], dialect: &Dialect) -> Vec<Segment> {
        // Gather trigger points: meta insertions and child matches.
        let mut triggers: Vec<(usize, Trigger<'_>)> = Vec::with_capacity(
            self.insert_segments.len() + self.child_matches.len(),
        );
        for (idx, kind) in &self.insert_segments {
            triggers.push((*idx, Trigger::Meta(kind)));
        }
        for child in &self.child_matches {
            triggers.push((child.matched_slice.start, Trigger::Match(child)));
        }
        triggers.sort_by_key(|(idx, t)| (*idx, matches!(t, Trigger::Match(_))));

        let mut result: Vec<Segment> = Vec::new();
        let mut max_idx = self.matched_slice.start;
        for (idx, trigger) in triggers {
            let idx = idx.clamp(self.matched_slice.start, self.matched_slice.end);
            if idx > max_idx {
                result.extend(segments[max_idx..idx].iter().cloned());
                max_idx = idx;
            }
            match trigger {
                Trigger::Match(child) => {
                    result.extend(child.apply(segments, dialect));
                    max_idx = child.matched_slice.end.max(max_idx);
                }
                Trigger::Meta(kind) => {
                    let marker = point_marker_at(segments, idx);
                    result.push(meta_segment(kind.clone(), marker));
                }
            }
        }
        if max_idx < self.matched_slice.end {
            result.extend(segments[max_idx..self.matched_slice.end].iter().cloned());
        }

        match &self.matched {
            Matched::None => result,
            Matched::Recast(recast) => {
                debug_assert_eq!(result.len(), 1, "recast applies to a single leaf");
                result
                    .into_iter()
                    .map(|seg| {
                        seg.recast(
                            recast.seg_type.clone(),
                            &recast.extra_class_types,
                            recast.instance_types.clone(),
                        )
                    })
                    .collect()
            }
            Matched::Node(node) => {
                let def = dialect.node(*node);
                vec![Segment::branch(
                    def.seg_type.clone(),
                    &def.parent_types,
                    result,
                )]
            }
            Matched::Unparsable { .. } => {
                vec![Segment::branch(
                    "unparsable",
                    &[SmolStr::new("unparsable")],
                    result,
                )]
            }
        }
    }
}

enum Trigger<'a> {
    Match(&'a MatchResult),
    Meta(&'a MetaKind),
}

/// A point marker at a boundary in the segment array, for meta segments.
fn point_marker_at(segments: &[Segment], idx: usize) -> Option<PositionMarker> {
    if let Some(seg) = segments.get(idx) {
        seg.marker().map(PositionMarker::start_point_marker)
    } else {
        segments
            .last()
            .and_then(Segment::marker)
            .map(PositionMarker::end_point_marker)
    }
}
