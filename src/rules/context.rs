//! The context handed to a rule at each evaluation point.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::config::LintConfig;
use crate::dialects::Dialect;
use crate::segments::Segment;
use crate::templater::TemplatedFile;

/// Per-rule-per-file state carried between evaluations.
///
/// A typed slot rather than an opaque blob: each variant belongs to the
/// rule that declares it, so no untyped shared state exists.
#[derive(Debug, Clone, Default)]
pub enum RuleMemory {
    #[default]
    None,
    /// The capitalisation observed so far (`capitalisation.keywords`).
    CaseState { inferred: Option<Case> },
    /// Names seen so far (reference-style rules).
    SeenNames(FxHashSet<SmolStr>),
}

/// A detected capitalisation style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Upper,
    Lower,
    Capitalise,
}

impl Case {
    /// Detect the style of a word, if it has one.
    pub fn detect(raw: &str) -> Option<Case> {
        if raw.is_empty() || !raw.chars().any(|c| c.is_alphabetic()) {
            return None;
        }
        if raw == raw.to_uppercase() {
            Some(Case::Upper)
        } else if raw == raw.to_lowercase() {
            Some(Case::Lower)
        } else {
            let mut chars = raw.chars();
            let first_upper = chars.next().is_some_and(char::is_uppercase);
            let rest_lower = chars.all(|c| !c.is_uppercase());
            (first_upper && rest_lower).then_some(Case::Capitalise)
        }
    }

    /// Apply the style to a word.
    pub fn apply(&self, raw: &str) -> String {
        match self {
            Case::Upper => raw.to_uppercase(),
            Case::Lower => raw.to_lowercase(),
            Case::Capitalise => {
                let mut chars = raw.chars();
                match chars.next() {
                    Some(first) => {
                        first.to_uppercase().collect::<String>()
                            + &chars.as_str().to_lowercase()
                    }
                    None => String::new(),
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Case::Upper => "upper",
            Case::Lower => "lower",
            Case::Capitalise => "capitalise",
        }
    }
}

/// Everything a rule can see at one evaluation point.
pub struct RuleContext<'a> {
    /// The segment under evaluation.
    pub segment: Segment,
    /// Ancestors from the root down to (excluding) `segment`.
    pub parent_stack: &'a [Segment],
    /// Raw leaves already passed, left of the current position.
    pub raw_stack: &'a [Segment],
    /// Index of `segment` within its parent.
    pub segment_idx: usize,
    pub dialect: &'a Dialect,
    pub config: &'a LintConfig,
    /// The code of the rule being evaluated (for option lookup).
    pub rule_code: &'a str,
    pub templated_file: &'a Arc<TemplatedFile>,
    /// The rule's typed memory slot for this file.
    pub memory: &'a mut RuleMemory,
}

impl<'a> RuleContext<'a> {
    /// Read a string option for the current rule, falling back to the
    /// schema default supplied by the caller.
    pub fn option_str(&self, name: &str, default: &'a str) -> &'a str {
        self.config
            .rule_option(self.rule_code, name)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_detection() {
        assert_eq!(Case::detect("SELECT"), Some(Case::Upper));
        assert_eq!(Case::detect("select"), Some(Case::Lower));
        assert_eq!(Case::detect("Select"), Some(Case::Capitalise));
        assert_eq!(Case::detect("SeLeCt"), None);
        assert_eq!(Case::detect("123"), None);
    }

    #[test]
    fn test_case_application() {
        assert_eq!(Case::Upper.apply("select"), "SELECT");
        assert_eq!(Case::Lower.apply("SELECT"), "select");
        assert_eq!(Case::Capitalise.apply("sELECT"), "Select");
    }
}
