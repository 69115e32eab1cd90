//! The reindent operation: two-pass indentation layout.
//!
//! Pass one walks the leaf stream tracking the indent balance implied
//! by `Indent`/`Dedent` metas (emitted by the grammar around brackets
//! and clause bodies). Pass two compares each line's leading whitespace
//! with the target implied by its balance, emitting fixes which rewrite
//! the leading whitespace only.

use crate::config::LintConfig;
use crate::reflow::{ReflowSequence, new_whitespace};
use crate::rules::fix::{LintFix, LintResult};
use crate::segments::{LeafKind, MetaKind, Segment};

/// One physical line of the leaf stream.
#[derive(Debug, Default)]
struct Line {
    /// Balance at the newline which opened this line.
    start_balance: i32,
    /// Dedents seen before the first code leaf pull the line back out
    /// (closing brackets sit at the outer level).
    leading_dedent: i32,
    leading_ws: Option<Segment>,
    first_code: Option<Segment>,
}

impl Line {
    fn target_balance(&self) -> i32 {
        (self.start_balance + self.leading_dedent).max(0)
    }
}

/// Compare each line's indent to its balance-implied target.
pub fn reindent(sequence: &ReflowSequence, config: &LintConfig) -> Vec<LintResult> {
    let single = config.indent_unit.single_indent(config.tab_space_size);
    let mut lines: Vec<Line> = Vec::new();
    let mut balance: i32 = 0;
    let mut current = Line::default();
    let mut at_line_start = true;

    for leaf in sequence.leaves() {
        match leaf.leaf_kind() {
            Some(LeafKind::Newline) => {
                lines.push(std::mem::take(&mut current));
                current.start_balance = balance;
                at_line_start = true;
            }
            Some(LeafKind::Meta(meta)) => {
                let delta = meta.indent_delta();
                balance += delta;
                if at_line_start && current.first_code.is_none() && delta < 0 {
                    current.leading_dedent += delta;
                }
                if matches!(meta, MetaKind::EndOfFile) {
                    break;
                }
            }
            Some(LeafKind::Whitespace) => {
                if at_line_start && current.leading_ws.is_none() && current.first_code.is_none() {
                    current.leading_ws = Some((*leaf).clone());
                }
            }
            Some(LeafKind::Code) | Some(LeafKind::Comment) => {
                if current.first_code.is_none() {
                    current.first_code = Some((*leaf).clone());
                }
                at_line_start = false;
            }
            None => {}
        }
    }
    lines.push(current);

    let mut results = Vec::new();
    for line in &lines {
        let Some(first_code) = &line.first_code else {
            // Blank lines keep whatever they have.
            continue;
        };
        let desired = single.repeat(line.target_balance() as usize);
        let current_ws = line
            .leading_ws
            .as_ref()
            .map(|ws| ws.raw().to_string())
            .unwrap_or_default();
        if current_ws == desired {
            continue;
        }

        let description = if desired.is_empty() {
            "Line should not be indented.".to_string()
        } else {
            format!(
                "Expected indent of {} spaces; found {}.",
                desired.len(),
                current_ws.len()
            )
        };
        let fixes = match (&line.leading_ws, desired.is_empty()) {
            (Some(ws), true) => vec![LintFix::delete(ws.clone())],
            (Some(ws), false) => vec![LintFix::replace(ws.clone(), vec![new_whitespace(&desired)])],
            (None, false) => vec![LintFix::create_before(
                first_code.clone(),
                vec![new_whitespace(&desired)],
            )],
            (None, true) => continue,
        };
        results.push(LintResult::new(first_code.clone(), description).with_fixes(fixes));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::PositionMarker;
    use crate::config::LayoutConfig;
    use crate::reflow::ReflowSequence;
    use crate::segments::{LeafKind, Segment, dedent, indent};
    use crate::templater::TemplatedFile;
    use std::sync::Arc;

    /// SELECT<indent>\n    a\n<dedent>FROM b - correctly indented.
    fn indented_tree(column_ws: &str) -> Segment {
        let text = format!("SELECT\n{column_ws}a\nFROM b");
        let tf = Arc::new(TemplatedFile::from_string(&text));
        let mut pos = 0;
        let mut leaf = |raw: &str, seg_type: &str, kind: LeafKind| {
            let marker = PositionMarker::new(pos..pos + raw.len(), pos..pos + raw.len(), tf.clone());
            pos += raw.len();
            Segment::leaf(seg_type, raw, kind, Some(marker))
        };
        let mut leaves = vec![
            leaf("SELECT", "keyword", LeafKind::Code),
            indent(None),
            leaf("\n", "newline", LeafKind::Newline),
        ];
        if !column_ws.is_empty() {
            leaves.push(leaf(column_ws, "whitespace", LeafKind::Whitespace));
        }
        leaves.extend([
            leaf("a", "naked_identifier", LeafKind::Code),
            dedent(None),
            leaf("\n", "newline", LeafKind::Newline),
            leaf("FROM", "keyword", LeafKind::Code),
            leaf(" ", "whitespace", LeafKind::Whitespace),
            leaf("b", "naked_identifier", LeafKind::Code),
        ]);
        Segment::branch("file", &[], leaves)
    }

    fn reindent_tree(root: &Segment) -> Vec<LintResult> {
        let seq = ReflowSequence::from_root(root, &LayoutConfig::default());
        reindent(&seq, &LintConfig::default())
    }

    #[test]
    fn test_correct_indent_passes() {
        let results = reindent_tree(&indented_tree("    "));
        assert!(results.is_empty(), "unexpected: {results:?}");
    }

    #[test]
    fn test_short_indent_flagged() {
        let results = reindent_tree(&indented_tree("  "));
        assert_eq!(results.len(), 1);
        assert!(results[0].description.contains("4 spaces"));
        assert_eq!(results[0].fixes[0].edit_raw(), "    ");
    }

    #[test]
    fn test_missing_indent_created() {
        let results = reindent_tree(&indented_tree(""));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].fixes[0].edit_raw(), "    ");
    }

    #[test]
    fn test_dedent_line_back_out() {
        // The FROM line must sit at balance zero thanks to the dedent.
        let results = reindent_tree(&indented_tree("    "));
        assert!(results.is_empty());
    }
}
