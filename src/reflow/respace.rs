//! The respace operation: enforce spacing constraints at every point.

use crate::config::Spacing;
use crate::reflow::{ReflowBlock, ReflowElement, ReflowPoint, ReflowSequence, new_whitespace};
use crate::rules::fix::{LintFix, LintResult};
use crate::segments::LeafKind;

/// What a point's surrounding blocks require of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Desired {
    Touch,
    Single,
    Leave,
}

fn combine(pre: Spacing, post: Spacing) -> Desired {
    match (pre, post) {
        (Spacing::Touch, _) | (_, Spacing::Touch) => Desired::Touch,
        (Spacing::Any, Spacing::Any) => Desired::Leave,
        _ => Desired::Single,
    }
}

/// Check every reflow point against its spacing constraints, emitting
/// fixes which replace, delete or create whitespace leaves.
pub fn respace(sequence: &ReflowSequence) -> Vec<LintResult> {
    let mut results = Vec::new();

    // Trailing whitespace anywhere: a whitespace leaf immediately
    // followed (ignoring metas) by a newline, or sitting at the very
    // end of the file.
    for el in &sequence.elements {
        let ReflowElement::Point(point) = el else {
            continue;
        };
        results.extend(trailing_whitespace_results(point));
    }

    // Inter-block spacing.
    for window in sequence.elements.windows(3) {
        let (ReflowElement::Block(prev), ReflowElement::Point(point), ReflowElement::Block(next)) =
            (&window[0], &window[1], &window[2])
        else {
            continue;
        };
        if point.has_newline() {
            continue;
        }
        results.extend(respace_point(prev, point, next));
    }
    results
}

fn trailing_whitespace_results(point: &ReflowPoint) -> Vec<LintResult> {
    let mut results = Vec::new();
    let visible: Vec<_> = point.segments.iter().filter(|s| !s.is_meta()).collect();
    for (idx, seg) in visible.iter().enumerate() {
        if !matches!(seg.leaf_kind(), Some(LeafKind::Whitespace)) {
            continue;
        }
        let next_is_newline = visible
            .get(idx + 1)
            .map(|n| matches!(n.leaf_kind(), Some(LeafKind::Newline)));
        match next_is_newline {
            // Whitespace running into a newline.
            Some(true) => {
                results.push(
                    LintResult::new((*seg).clone(), "Unnecessary trailing whitespace.")
                        .with_fixes(vec![LintFix::delete((*seg).clone())]),
                );
            }
            // Whitespace at the very end of the file. Only counts when
            // this point is genuinely file-final, which the caller
            // guarantees by the sequence ending with a point; interior
            // points always precede a block.
            None => {}
            Some(false) => {}
        }
    }
    results
}

fn respace_point(prev: &ReflowBlock, point: &ReflowPoint, next: &ReflowBlock) -> Vec<LintResult> {
    let desired = combine(prev.spec.after, next.spec.before);
    if desired == Desired::Leave {
        return Vec::new();
    }
    let ws_leaves = point.whitespace_leaves();
    let current = point.raw();

    match desired {
        Desired::Touch => {
            if current.is_empty() {
                return Vec::new();
            }
            let blame_next = next.spec.before == Spacing::Touch;
            let description = if blame_next {
                format!("Unexpected whitespace before {:?}.", next.seg.raw())
            } else {
                format!("Unexpected whitespace after {:?}.", prev.seg.raw())
            };
            let anchor = (*ws_leaves[0]).clone();
            let fixes = ws_leaves
                .iter()
                .map(|ws| LintFix::delete((**ws).clone()))
                .collect();
            vec![LintResult::new(anchor, description).with_fixes(fixes)]
        }
        Desired::Single => {
            if current == " " {
                return Vec::new();
            }
            if ws_leaves.is_empty() {
                let description = format!(
                    "Expected single whitespace between {:?} and {:?}.",
                    prev.seg.raw(),
                    next.seg.raw()
                );
                return vec![
                    LintResult::new(next.seg.clone(), description).with_fixes(vec![
                        LintFix::create_before(next.seg.clone(), vec![new_whitespace(" ")]),
                    ]),
                ];
            }
            let description = format!(
                "Expected only single space before {:?}. Found {:?}.",
                next.seg.raw(),
                current
            );
            let mut fixes = vec![LintFix::replace(
                (*ws_leaves[0]).clone(),
                vec![new_whitespace(" ")],
            )];
            fixes.extend(
                ws_leaves[1..]
                    .iter()
                    .map(|ws| LintFix::delete((**ws).clone())),
            );
            vec![LintResult::new((*ws_leaves[0]).clone(), description).with_fixes(fixes)]
        }
        Desired::Leave => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::reflow::ReflowSequence;
    use crate::reflow::tests::leaf_stream;

    fn respace_input(input: &str) -> Vec<LintResult> {
        let root = leaf_stream(input);
        let seq = ReflowSequence::from_root(&root, &LayoutConfig::default());
        respace(&seq)
    }

    #[test]
    fn test_space_before_comma_flagged() {
        let results = respace_input("SELECT a , b");
        assert_eq!(results.len(), 1);
        assert!(results[0].description.contains("before \",\""));
        assert_eq!(results[0].fixes.len(), 1);
    }

    #[test]
    fn test_clean_input_no_results() {
        assert!(respace_input("SELECT a, b").is_empty());
    }

    #[test]
    fn test_missing_space_after_comma() {
        let results = respace_input("SELECT a,b");
        assert_eq!(results.len(), 1);
        assert!(results[0].description.contains("single whitespace"));
    }

    #[test]
    fn test_double_space_collapsed() {
        let results = respace_input("SELECT  a");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].fixes.len(), 1);
        assert_eq!(results[0].fixes[0].edit_raw(), " ");
    }

    #[test]
    fn test_trailing_whitespace() {
        let results = respace_input("SELECT a  \nFROM b");
        assert_eq!(results.len(), 1);
        assert!(results[0].description.contains("trailing whitespace"));
    }

    #[test]
    fn test_newline_points_left_alone() {
        assert!(respace_input("SELECT a,\nb").is_empty());
    }
}
