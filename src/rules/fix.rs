//! Lint results and structural fixes.
//!
//! Rules never mutate the tree: they return [`LintResult`]s carrying
//! zero or more [`LintFix`]es. The applicator dedupes fixes per anchor,
//! resolves conflicts first-writer-wins, screens out template-unsafe
//! edits, and converts the winners into textual edits for the templated
//! file. The tree itself is rebuilt by re-lexing and re-parsing the
//! patched text, which re-establishes position markers and identities.

use smol_str::SmolStr;
use tracing::debug;
use uuid::Uuid;

use crate::segments::Segment;
use crate::templater::{TemplatedEdit, TemplatedFile};

/// The four structural edit operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixOp {
    CreateBefore,
    CreateAfter,
    Replace,
    Delete,
}

/// A structural edit anchored on a specific segment.
#[derive(Debug, Clone)]
pub struct LintFix {
    pub op: FixOp,
    pub anchor: Segment,
    /// New segments for create/replace operations.
    pub edit: Vec<Segment>,
    /// Set by rules which guarantee their edit is safe even though it
    /// touches a non-literal region.
    pub template_safe_override: bool,
}

impl LintFix {
    pub fn create_before(anchor: Segment, edit: Vec<Segment>) -> Self {
        Self {
            op: FixOp::CreateBefore,
            anchor,
            edit,
            template_safe_override: false,
        }
    }

    pub fn create_after(anchor: Segment, edit: Vec<Segment>) -> Self {
        Self {
            op: FixOp::CreateAfter,
            anchor,
            edit,
            template_safe_override: false,
        }
    }

    pub fn replace(anchor: Segment, edit: Vec<Segment>) -> Self {
        Self {
            op: FixOp::Replace,
            anchor,
            edit,
            template_safe_override: false,
        }
    }

    pub fn delete(anchor: Segment) -> Self {
        Self {
            op: FixOp::Delete,
            anchor,
            edit: Vec::new(),
            template_safe_override: false,
        }
    }

    /// The raw text this fix would insert.
    pub fn edit_raw(&self) -> String {
        self.edit.iter().map(Segment::raw).collect()
    }

    /// Fix identity: `(operation, anchor uuid, edit raws)`. Two fixes
    /// with equal identity are duplicates of one another.
    pub fn identity(&self) -> (FixOp, Uuid, Vec<SmolStr>) {
        (
            self.op,
            self.anchor.id(),
            self.edit.iter().map(|s| SmolStr::new(s.raw())).collect(),
        )
    }

    /// Is this fix safe to apply through the template mapping?
    ///
    /// Deletes and replacements must cover a fully-literal region;
    /// insertions must land at a point inside a literal region.
    pub fn is_template_safe(&self, tf: &TemplatedFile) -> bool {
        if self.template_safe_override {
            return true;
        }
        let Some(marker) = self.anchor.marker() else {
            return false;
        };
        match self.op {
            FixOp::Replace | FixOp::Delete => marker.is_literal(),
            FixOp::CreateBefore => {
                let point = marker.templated_slice.start;
                tf.is_source_slice_literal(
                    &tf.templated_slice_to_source_slice(&(point..point)),
                )
            }
            FixOp::CreateAfter => {
                let point = marker.templated_slice.end;
                tf.is_source_slice_literal(
                    &tf.templated_slice_to_source_slice(&(point..point)),
                )
            }
        }
    }

    /// Convert to a textual edit in templated coordinates.
    pub fn to_templated_edit(&self) -> Option<TemplatedEdit> {
        let marker = self.anchor.marker()?;
        let slice = &marker.templated_slice;
        Some(match self.op {
            FixOp::Replace => TemplatedEdit::new(slice.clone(), self.edit_raw()),
            FixOp::Delete => TemplatedEdit::new(slice.clone(), ""),
            FixOp::CreateBefore => {
                TemplatedEdit::new(slice.start..slice.start, self.edit_raw())
            }
            FixOp::CreateAfter => TemplatedEdit::new(slice.end..slice.end, self.edit_raw()),
        })
    }
}

impl PartialEq for LintFix {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

/// A single finding from a rule: an anchor, a description and the fixes
/// which would repair it.
#[derive(Debug, Clone)]
pub struct LintResult {
    pub anchor: Segment,
    pub description: String,
    pub fixes: Vec<LintFix>,
}

impl LintResult {
    pub fn new(anchor: Segment, description: impl Into<String>) -> Self {
        Self {
            anchor,
            description: description.into(),
            fixes: Vec::new(),
        }
    }

    pub fn with_fixes(mut self, fixes: Vec<LintFix>) -> Self {
        self.fixes = fixes;
        self
    }
}

/// A fix bundle queued for application, retaining its provenance for
/// the deterministic conflict policy.
#[derive(Debug, Clone)]
pub struct QueuedFixes {
    pub crawl_order: usize,
    pub rule_code: &'static str,
    pub fixes: Vec<LintFix>,
}

/// The outcome of one application pass.
#[derive(Debug, Default)]
pub struct FixOutcome {
    /// Textual edits for the winning fixes, ready for
    /// `TemplatedFile::patch`.
    pub edits: Vec<TemplatedEdit>,
    /// Anchor ids whose fixes were applied.
    pub applied_anchors: Vec<Uuid>,
    /// `(rule_code, anchor)` pairs demoted to diagnostics-only by the
    /// conflict policy.
    pub demoted: Vec<(&'static str, Uuid)>,
    /// Number of fixes dropped as template-unsafe.
    pub unsafe_dropped: usize,
}

/// Dedupe, resolve conflicts, and convert fixes to textual edits.
///
/// Policy: fixes are grouped by anchor; exact duplicates collapse; the
/// first-queued bundle (by `(crawl_order, rule_code)`) wins an anchor
/// and later conflicting bundles are demoted to diagnostics-only.
pub fn resolve_fixes(queued: Vec<QueuedFixes>, tf: &TemplatedFile) -> FixOutcome {
    let mut outcome = FixOutcome::default();
    let mut ordered = queued;
    ordered.sort_by_key(|q| (q.crawl_order, q.rule_code));

    // Anchor ownership: first writer wins.
    let mut owners: Vec<(Uuid, usize)> = Vec::new();
    let mut winners: Vec<&QueuedFixes> = Vec::new();
    for (qi, bundle) in ordered.iter().enumerate() {
        let mut demoted = false;
        for fix in &bundle.fixes {
            let anchor = fix.anchor.id();
            match owners.iter().find(|(id, _)| *id == anchor) {
                None => owners.push((anchor, qi)),
                Some(&(_, owner)) if owner == qi => {}
                Some(_) => {
                    // Another bundle already owns this anchor. If the
                    // fixes are exact duplicates they are compatible;
                    // otherwise this bundle loses the anchor.
                    let owner_bundle = &ordered[owners
                        .iter()
                        .find(|(id, _)| *id == anchor)
                        .map(|(_, o)| *o)
                        .unwrap_or(qi)];
                    let duplicate = owner_bundle
                        .fixes
                        .iter()
                        .any(|other| other == fix);
                    if !duplicate {
                        demoted = true;
                    }
                }
            }
        }
        if demoted {
            for fix in &bundle.fixes {
                outcome.demoted.push((bundle.rule_code, fix.anchor.id()));
            }
        } else {
            winners.push(bundle);
        }
    }

    // Collect winning fixes, dropping duplicates and unsafe edits.
    let mut seen: Vec<(FixOp, Uuid, Vec<SmolStr>)> = Vec::new();
    for bundle in winners {
        for fix in &bundle.fixes {
            let identity = fix.identity();
            if seen.contains(&identity) {
                continue;
            }
            seen.push(identity);
            if !fix.is_template_safe(tf) {
                outcome.unsafe_dropped += 1;
                debug!(rule = bundle.rule_code, "dropping template-unsafe fix");
                continue;
            }
            if let Some(edit) = fix.to_templated_edit() {
                outcome.edits.push(edit);
                outcome.applied_anchors.push(fix.anchor.id());
            }
        }
    }
    outcome
        .edits
        .sort_by_key(|e| (e.templated_slice.start, e.templated_slice.end));
    // Overlapping edits cannot both apply; keep the earlier one.
    let mut filtered: Vec<TemplatedEdit> = Vec::with_capacity(outcome.edits.len());
    for edit in std::mem::take(&mut outcome.edits) {
        let overlaps = filtered
            .last()
            .is_some_and(|prev: &TemplatedEdit| edit.templated_slice.start < prev.templated_slice.end);
        if !overlaps {
            filtered.push(edit);
        }
    }
    outcome.edits = filtered;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::PositionMarker;
    use crate::segments::LeafKind;
    use std::sync::Arc;

    fn ws_segment(tf: &Arc<TemplatedFile>, range: std::ops::Range<usize>) -> Segment {
        Segment::leaf(
            "whitespace",
            &tf.templated_str()[range.clone()],
            LeafKind::Whitespace,
            Some(PositionMarker::new(range.clone(), range, tf.clone())),
        )
    }

    #[test]
    fn test_fix_identity_dedupes() {
        let tf = Arc::new(TemplatedFile::from_string("a  b"));
        let anchor = ws_segment(&tf, 1..3);
        let a = LintFix::replace(
            anchor.clone(),
            vec![Segment::leaf("whitespace", " ", LeafKind::Whitespace, None)],
        );
        let b = LintFix::replace(
            anchor.clone(),
            vec![Segment::leaf("whitespace", " ", LeafKind::Whitespace, None)],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolve_dedupes_and_converts() {
        let tf = Arc::new(TemplatedFile::from_string("a  b"));
        let anchor = ws_segment(&tf, 1..3);
        let fix = LintFix::replace(
            anchor,
            vec![Segment::leaf("whitespace", " ", LeafKind::Whitespace, None)],
        );
        let queued = vec![
            QueuedFixes {
                crawl_order: 0,
                rule_code: "LT01",
                fixes: vec![fix.clone()],
            },
            QueuedFixes {
                crawl_order: 1,
                rule_code: "LT01",
                fixes: vec![fix],
            },
        ];
        let outcome = resolve_fixes(queued, &tf);
        assert_eq!(outcome.edits.len(), 1);
        assert_eq!(outcome.edits[0].templated_slice, 1..3);
        assert_eq!(outcome.edits[0].replacement, " ");
        assert!(outcome.demoted.is_empty());
    }

    #[test]
    fn test_conflicting_fixes_first_writer_wins() {
        let tf = Arc::new(TemplatedFile::from_string("a  b"));
        let anchor = ws_segment(&tf, 1..3);
        let first = LintFix::replace(
            anchor.clone(),
            vec![Segment::leaf("whitespace", " ", LeafKind::Whitespace, None)],
        );
        let second = LintFix::delete(anchor);
        let queued = vec![
            QueuedFixes {
                crawl_order: 0,
                rule_code: "LT01",
                fixes: vec![first],
            },
            QueuedFixes {
                crawl_order: 1,
                rule_code: "LT99",
                fixes: vec![second],
            },
        ];
        let outcome = resolve_fixes(queued, &tf);
        assert_eq!(outcome.edits.len(), 1);
        assert_eq!(outcome.edits[0].replacement, " ");
        assert_eq!(outcome.demoted.len(), 1);
        assert_eq!(outcome.demoted[0].0, "LT99");
    }

    #[test]
    fn test_template_unsafe_fix_dropped() {
        use crate::templater::{RawFileSlice, SliceType, TemplatedFileSlice};
        let tf = Arc::new(
            TemplatedFile::new(
                "SELECT {{ c }}".to_string(),
                "t.sql",
                Some("SELECT col".to_string()),
                Some(vec![
                    TemplatedFileSlice::new(SliceType::Literal, 0..7, 0..7),
                    TemplatedFileSlice::new(SliceType::Templated, 7..14, 7..10),
                ]),
                Some(vec![
                    RawFileSlice::new("SELECT ", SliceType::Literal, 0),
                    RawFileSlice::new("{{ c }}", SliceType::Templated, 7),
                ]),
            )
            .unwrap(),
        );
        // Anchor inside the templated region.
        let anchor = Segment::leaf(
            "word",
            "col",
            LeafKind::Code,
            Some(PositionMarker::new(7..14, 7..10, tf.clone())),
        );
        let queued = vec![QueuedFixes {
            crawl_order: 0,
            rule_code: "CP01",
            fixes: vec![LintFix::replace(
                anchor,
                vec![Segment::leaf("word", "COL", LeafKind::Code, None)],
            )],
        }];
        let outcome = resolve_fixes(queued, &tf);
        assert!(outcome.edits.is_empty());
        assert_eq!(outcome.unsafe_dropped, 1);
    }
}
