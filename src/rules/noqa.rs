//! In-source violation suppression via `noqa` comments.
//!
//! Syntax (case-insensitive, inside any line comment):
//! - `-- noqa`                  - ignore everything on this line
//! - `-- noqa: LT01,LT02`      - ignore the listed codes on this line
//! - `-- noqa: disable=LT01`   - disable from this line onward
//! - `-- noqa: disable=all`    - disable everything onward
//! - `-- noqa: enable=LT01`    - re-enable from this line onward

use once_cell::sync::Lazy;
use regex::Regex;

use crate::base::PositionMarker;
use crate::errors::Violation;
use crate::segments::Segment;

static NOQA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bnoqa\b(?:\s*:\s*(?P<rules>[^\n]*))?").expect("static regex"));

/// The range action of a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoQaAction {
    Disable,
    Enable,
}

/// A parsed `noqa` comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoQaDirective {
    /// Source line the comment sits on.
    pub line_no: usize,
    /// Affected rule codes; `None` means all rules.
    pub rules: Option<Vec<String>>,
    /// `None` for single-line directives; otherwise a range toggle.
    pub action: Option<NoQaAction>,
}

/// The set of directives for one file.
#[derive(Debug, Default, Clone)]
pub struct IgnoreMask {
    directives: Vec<NoQaDirective>,
}

impl IgnoreMask {
    /// Extract directives from the comment leaves of a parsed tree.
    pub fn from_tree(root: &Segment) -> Self {
        let mut directives = Vec::new();
        for comment in root.recursive_crawl(&["inline_comment", "block_comment"], false) {
            let Some(marker) = comment.marker() else {
                continue;
            };
            if let Some(directive) = parse_noqa(comment.raw(), marker) {
                directives.push(directive);
            }
        }
        Self { directives }
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Filter a violation list against the mask.
    pub fn ignore_masked_violations(&self, violations: Vec<Violation>) -> Vec<Violation> {
        let line_directives: Vec<&NoQaDirective> = self
            .directives
            .iter()
            .filter(|d| d.action.is_none())
            .collect();
        let range_directives: Vec<&NoQaDirective> = self
            .directives
            .iter()
            .filter(|d| d.action.is_some())
            .collect();

        violations
            .into_iter()
            .filter(|v| {
                !Self::masked_by_line(v, &line_directives)
                    && !Self::masked_by_range(v, &range_directives)
            })
            .collect()
    }

    fn masked_by_line(violation: &Violation, directives: &[&NoQaDirective]) -> bool {
        directives.iter().any(|d| {
            d.line_no == violation.source_line
                && d.rules
                    .as_ref()
                    .is_none_or(|rules| rules.iter().any(|r| r == &violation.code))
        })
    }

    fn masked_by_range(violation: &Violation, directives: &[&NoQaDirective]) -> bool {
        // Find the state of this rule at the violation's line: the last
        // relevant directive at or before it wins.
        let mut relevant: Vec<&&NoQaDirective> = directives
            .iter()
            .filter(|d| {
                d.rules
                    .as_ref()
                    .is_none_or(|rules| rules.iter().any(|r| r == &violation.code))
            })
            .collect();
        relevant.sort_by_key(|d| d.line_no);
        let mut disabled = false;
        for directive in relevant {
            if directive.line_no > violation.source_line {
                break;
            }
            disabled = directive.action == Some(NoQaAction::Disable);
        }
        disabled
    }
}

/// Parse one comment for a directive.
fn parse_noqa(comment: &str, marker: &PositionMarker) -> Option<NoQaDirective> {
    let captures = NOQA_RE.captures(comment)?;
    let (line_no, _) = marker.source_position();

    let Some(rules_raw) = captures.name("rules") else {
        // Bare `noqa`: mask everything on this line.
        return Some(NoQaDirective {
            line_no,
            rules: None,
            action: None,
        });
    };
    let rules_raw = rules_raw.as_str().trim();

    let (action, rule_part) = if let Some(rest) = strip_prefix_ci(rules_raw, "disable=") {
        (Some(NoQaAction::Disable), rest)
    } else if let Some(rest) = strip_prefix_ci(rules_raw, "enable=") {
        (Some(NoQaAction::Enable), rest)
    } else {
        (None, rules_raw)
    };

    let rules = if rule_part.eq_ignore_ascii_case("all") || rule_part.is_empty() {
        None
    } else {
        Some(
            rule_part
                .split(',')
                .map(|r| r.trim().to_uppercase())
                .filter(|r| !r.is_empty())
                .collect(),
        )
    };

    Some(NoQaDirective {
        line_no,
        rules,
        action,
    })
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if text.len() >= prefix.len() && text[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::templater::TemplatedFile;

    fn directive(comment: &str, line: usize) -> Option<NoQaDirective> {
        // Place the comment at the start of the requested line.
        let padding = "\n".repeat(line - 1);
        let text = format!("{padding}{comment}");
        let tf = Arc::new(TemplatedFile::from_string(&text));
        let start = padding.len();
        let marker = PositionMarker::new(
            start..start + comment.len(),
            start..start + comment.len(),
            tf,
        );
        parse_noqa(comment, &marker)
    }

    fn violation(code: &str, line: usize) -> Violation {
        Violation::new(code, "test", "test", (line, 1, 0))
    }

    #[test]
    fn test_parse_bare_noqa() {
        let d = directive("-- noqa", 3).unwrap();
        assert_eq!(d.line_no, 3);
        assert_eq!(d.rules, None);
        assert_eq!(d.action, None);
    }

    #[test]
    fn test_parse_specific_rules() {
        let d = directive("-- NOQA: LT01, lt02", 1).unwrap();
        assert_eq!(
            d.rules,
            Some(vec!["LT01".to_string(), "LT02".to_string()])
        );
    }

    #[test]
    fn test_parse_disable_enable() {
        let d = directive("-- noqa: disable=LT01", 2).unwrap();
        assert_eq!(d.action, Some(NoQaAction::Disable));
        let d = directive("-- noqa: enable=all", 5).unwrap();
        assert_eq!(d.action, Some(NoQaAction::Enable));
        assert_eq!(d.rules, None);
    }

    #[test]
    fn test_non_noqa_comment_ignored() {
        assert!(directive("-- just a note", 1).is_none());
    }

    #[test]
    fn test_single_line_masking() {
        let mask = IgnoreMask {
            directives: vec![directive("-- noqa: LT01", 2).unwrap()],
        };
        let kept = mask.ignore_masked_violations(vec![
            violation("LT01", 2),
            violation("LT02", 2),
            violation("LT01", 3),
        ]);
        let codes: Vec<(usize, &str)> = kept
            .iter()
            .map(|v| (v.source_line, v.code.as_str()))
            .collect();
        assert_eq!(codes, vec![(2, "LT02"), (3, "LT01")]);
    }

    #[test]
    fn test_range_masking() {
        let mask = IgnoreMask {
            directives: vec![
                directive("-- noqa: disable=LT01", 2).unwrap(),
                directive("-- noqa: enable=LT01", 5).unwrap(),
            ],
        };
        let kept = mask.ignore_masked_violations(vec![
            violation("LT01", 1),
            violation("LT01", 3),
            violation("LT01", 6),
            violation("LT02", 3),
        ]);
        let lines: Vec<(usize, &str)> = kept
            .iter()
            .map(|v| (v.source_line, v.code.as_str()))
            .collect();
        assert_eq!(lines, vec![(1, "LT01"), (6, "LT01"), (3, "LT02")]);
    }
}
