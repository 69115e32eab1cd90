//! The rebreak operation: enforce line position for configured types.
//!
//! Operators configured `leading` should start lines; commas configured
//! `trailing` should end them. Fixes move the offending token to the
//! other side of the break; the whitespace left behind is cleaned up by
//! the respace pass of the following fix phase.

use crate::config::LinePosition;
use crate::reflow::{ReflowElement, ReflowSequence, new_whitespace};
use crate::rules::fix::{LintFix, LintResult};
use crate::segments::{LeafKind, Segment};

/// A fresh copy of a leaf for re-insertion elsewhere.
fn clone_leaf(seg: &Segment) -> Segment {
    Segment::leaf(seg.seg_type().clone(), seg.raw(), LeafKind::Code, None)
}

/// Check every configured block's line position, emitting move fixes.
pub fn rebreak(sequence: &ReflowSequence) -> Vec<LintResult> {
    let mut results = Vec::new();
    let elements = &sequence.elements;

    for idx in 0..elements.len() {
        let ReflowElement::Block(block) = &elements[idx] else {
            continue;
        };
        let Some(position) = block.spec.line_position else {
            continue;
        };
        // The surrounding points, and the blocks beyond them.
        let (Some(ReflowElement::Point(before)), Some(ReflowElement::Point(after))) =
            (idx.checked_sub(1).map(|i| &elements[i]), elements.get(idx + 1))
        else {
            continue;
        };
        let prev_block = idx.checked_sub(2).and_then(|i| match &elements[i] {
            ReflowElement::Block(b) => Some(b),
            _ => None,
        });
        let next_block = elements.get(idx + 2).and_then(|el| match el {
            ReflowElement::Block(b) => Some(b),
            _ => None,
        });

        match position {
            LinePosition::Leading => {
                // A leading token stranded at the end of its line.
                if !before.has_newline() && after.has_newline() {
                    let Some(next_block) = next_block else { continue };
                    let description = format!(
                        "Found trailing {:?}. Expected it to lead the next line.",
                        block.seg.raw()
                    );
                    let fixes = vec![
                        LintFix::delete(block.seg.clone()),
                        LintFix::create_before(
                            next_block.seg.clone(),
                            vec![clone_leaf(&block.seg), new_whitespace(" ")],
                        ),
                    ];
                    results.push(LintResult::new(block.seg.clone(), description).with_fixes(fixes));
                }
            }
            LinePosition::Trailing => {
                // A trailing token stranded at the start of its line.
                if before.has_newline() && !after.has_newline() {
                    let Some(prev_block) = prev_block else { continue };
                    let description = format!(
                        "Found leading {:?}. Expected it to trail the previous line.",
                        block.seg.raw()
                    );
                    let fixes = vec![
                        LintFix::delete(block.seg.clone()),
                        LintFix::create_after(prev_block.seg.clone(), vec![clone_leaf(&block.seg)]),
                    ];
                    results.push(LintResult::new(block.seg.clone(), description).with_fixes(fixes));
                }
            }
            LinePosition::Alone => {
                // No default layout uses `alone`; nothing to enforce yet.
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::reflow::ReflowSequence;
    use crate::reflow::tests::leaf_stream;

    fn rebreak_input(input: &str) -> Vec<LintResult> {
        let root = leaf_stream(input);
        let seq = ReflowSequence::from_root(&root, &LayoutConfig::default());
        rebreak(&seq)
    }

    #[test]
    fn test_leading_comma_flagged() {
        // Commas are configured trailing by default.
        let results = rebreak_input("SELECT a\n, b");
        assert_eq!(results.len(), 1);
        assert!(results[0].description.contains("leading"));
        assert_eq!(results[0].fixes.len(), 2);
    }

    #[test]
    fn test_trailing_comma_ok() {
        assert!(rebreak_input("SELECT a,\nb").is_empty());
    }

    #[test]
    fn test_single_line_ok() {
        assert!(rebreak_input("SELECT a, b").is_empty());
    }
}
