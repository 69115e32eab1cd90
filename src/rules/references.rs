//! Reference rules.

use crate::errors::RuleError;
use crate::rules::context::RuleContext;
use crate::rules::crawlers::Crawl;
use crate::rules::fix::LintResult;
use crate::rules::{ConfigOption, OptionKind, Rule};

/// RF04: keywords should not be used as identifiers.
///
/// Naked identifiers are flagged when they collide with the active
/// dialect's *reserved* keyword set (reserved words which are not
/// structural still parse as identifiers, so the rule - not the parser
/// - reports them). The `unquoted_identifiers_policy` option narrows
/// where the rule looks; `ignore_words` is a comma-separated allowlist.
pub struct RuleRF04;

const POLICIES: &[&str] = &["all", "aliases", "column_aliases"];

impl Rule for RuleRF04 {
    fn code(&self) -> &'static str {
        "RF04"
    }

    fn name(&self) -> &'static str {
        "references.keywords"
    }

    fn description(&self) -> &'static str {
        "Keywords should not be used as identifiers."
    }

    fn groups(&self) -> &'static [&'static str] {
        &["all", "core", "references"]
    }

    fn crawl_behaviour(&self) -> Crawl {
        Crawl::SegmentSeeker {
            types: vec!["naked_identifier".into(), "quoted_identifier".into()],
            provide_raw_stack: false,
            allow_recurse: true,
        }
    }

    fn config_schema(&self) -> &'static [ConfigOption] {
        &[
            ConfigOption {
                name: "unquoted_identifiers_policy",
                kind: OptionKind::Choice(POLICIES),
                default: "all",
            },
            ConfigOption {
                name: "ignore_words",
                kind: OptionKind::Str,
                default: "",
            },
        ]
    }

    fn eval(&self, ctx: &mut RuleContext) -> Result<Vec<LintResult>, RuleError> {
        let raw = ctx.segment.raw_trimmed();
        // Single-character names are common scratch identifiers.
        if raw.len() <= 1 {
            return Ok(Vec::new());
        }

        let ignore_words = ctx.option_str("ignore_words", "");
        if ignore_words
            .split(',')
            .any(|w| w.trim().eq_ignore_ascii_case(raw))
        {
            return Ok(Vec::new());
        }

        let policy = ctx.option_str("unquoted_identifiers_policy", "all");
        if !policy_applies(policy, ctx.parent_stack) {
            return Ok(Vec::new());
        }

        let flagged = if ctx.segment.is_type("naked_identifier") {
            ctx.dialect.is_reserved_keyword(raw)
        } else {
            // Quoting doesn't make a keyword a good name.
            ctx.dialect.is_keyword(raw)
        };

        if flagged {
            Ok(vec![LintResult::new(
                ctx.segment.clone(),
                format!("Keyword {raw:?} used as an identifier."),
            )])
        } else {
            Ok(Vec::new())
        }
    }
}

fn policy_applies(policy: &str, parent_stack: &[crate::segments::Segment]) -> bool {
    match policy {
        "aliases" => parent_stack
            .iter()
            .any(|p| p.is_type("alias_expression") || p.is_type("common_table_expression")),
        "column_aliases" => {
            parent_stack.iter().any(|p| p.is_type("alias_expression"))
                && parent_stack
                    .iter()
                    .any(|p| p.is_type("select_clause_element"))
        }
        _ => true,
    }
}
