//! Capitalisation rules.

use crate::errors::RuleError;
use crate::rules::context::{Case, RuleContext, RuleMemory};
use crate::rules::crawlers::Crawl;
use crate::rules::fix::{LintFix, LintResult};
use crate::rules::{ConfigOption, OptionKind, Rule};
use crate::segments::{LeafKind, Segment};

/// CP01: keywords must be capitalised consistently.
///
/// With the default `consistent` policy the first cased keyword in the
/// file sets the style; an explicit `upper`/`lower`/`capitalise`
/// policy enforces that style everywhere.
pub struct RuleCP01;

const POLICIES: &[&str] = &["consistent", "upper", "lower", "capitalise"];

impl Rule for RuleCP01 {
    fn code(&self) -> &'static str {
        "CP01"
    }

    fn name(&self) -> &'static str {
        "capitalisation.keywords"
    }

    fn description(&self) -> &'static str {
        "Inconsistent capitalisation of keywords."
    }

    fn groups(&self) -> &'static [&'static str] {
        &["all", "core", "capitalisation"]
    }

    fn crawl_behaviour(&self) -> Crawl {
        Crawl::seeker(&["keyword"])
    }

    fn is_fix_compatible(&self) -> bool {
        true
    }

    fn config_schema(&self) -> &'static [ConfigOption] {
        &[ConfigOption {
            name: "capitalisation_policy",
            kind: OptionKind::Choice(POLICIES),
            default: "consistent",
        }]
    }

    fn eval(&self, ctx: &mut RuleContext) -> Result<Vec<LintResult>, RuleError> {
        let raw = ctx.segment.raw().to_string();
        let Some(actual) = Case::detect(&raw) else {
            // Mixed case matches no policy; flag it against whatever the
            // policy resolves to, defaulting to upper.
            let target = match ctx.option_str("capitalisation_policy", "consistent") {
                "lower" => Case::Lower,
                "capitalise" => Case::Capitalise,
                "consistent" => match ctx.memory {
                    RuleMemory::CaseState {
                        inferred: Some(case),
                    } => *case,
                    _ => Case::Upper,
                },
                _ => Case::Upper,
            };
            return Ok(vec![self.result_for(ctx, &raw, target)]);
        };

        let policy = ctx.option_str("capitalisation_policy", "consistent");
        let expected = match policy {
            "upper" => Some(Case::Upper),
            "lower" => Some(Case::Lower),
            "capitalise" => Some(Case::Capitalise),
            _ => {
                // Consistent: infer from the first cased keyword.
                match ctx.memory {
                    RuleMemory::CaseState {
                        inferred: Some(case),
                    } => Some(*case),
                    _ => {
                        *ctx.memory = RuleMemory::CaseState {
                            inferred: Some(actual),
                        };
                        None
                    }
                }
            }
        };

        match expected {
            Some(expected) if expected != actual => {
                Ok(vec![self.result_for(ctx, &raw, expected)])
            }
            _ => Ok(Vec::new()),
        }
    }
}

impl RuleCP01 {
    fn result_for(&self, ctx: &RuleContext, raw: &str, target: Case) -> LintResult {
        let fixed = target.apply(raw);
        let description = format!(
            "Keyword {raw:?} capitalisation should be {}.",
            target.as_str()
        );
        let mut result = LintResult::new(ctx.segment.clone(), description);
        if fixed != raw {
            let replacement =
                Segment::leaf(ctx.segment.seg_type().clone(), fixed, LeafKind::Code, None);
            result = result.with_fixes(vec![LintFix::replace(
                ctx.segment.clone(),
                vec![replacement],
            )]);
        }
        result
    }
}
