//! Layout rules: spacing, indentation, operator breaks, end of file.
//!
//! These rules own no whitespace logic themselves; they defer to the
//! reflow engine so that layout decisions stay in one place.

use crate::errors::RuleError;
use crate::reflow::{ReflowSequence, new_newline, rebreak, reindent, respace};
use crate::rules::context::RuleContext;
use crate::rules::crawlers::Crawl;
use crate::rules::fix::{LintFix, LintResult};
use crate::rules::{ConfigOption, Rule};
use crate::segments::{LeafKind, Segment};

/// LT01: inappropriate spacing between tokens.
pub struct RuleLT01;

impl Rule for RuleLT01 {
    fn code(&self) -> &'static str {
        "LT01"
    }

    fn name(&self) -> &'static str {
        "layout.spacing"
    }

    fn description(&self) -> &'static str {
        "Inappropriate spacing."
    }

    fn groups(&self) -> &'static [&'static str] {
        &["all", "core", "layout"]
    }

    fn crawl_behaviour(&self) -> Crawl {
        Crawl::RootOnly
    }

    fn is_fix_compatible(&self) -> bool {
        true
    }

    fn eval(&self, ctx: &mut RuleContext) -> Result<Vec<LintResult>, RuleError> {
        let sequence = ReflowSequence::from_root(&ctx.segment, &ctx.config.layout);
        Ok(respace(&sequence))
    }
}

/// LT02: incorrect line indentation.
pub struct RuleLT02;

impl Rule for RuleLT02 {
    fn code(&self) -> &'static str {
        "LT02"
    }

    fn name(&self) -> &'static str {
        "layout.indent"
    }

    fn description(&self) -> &'static str {
        "Incorrect indentation."
    }

    fn groups(&self) -> &'static [&'static str] {
        &["all", "core", "layout"]
    }

    fn crawl_behaviour(&self) -> Crawl {
        Crawl::RootOnly
    }

    fn is_fix_compatible(&self) -> bool {
        true
    }

    fn eval(&self, ctx: &mut RuleContext) -> Result<Vec<LintResult>, RuleError> {
        let sequence = ReflowSequence::from_root(&ctx.segment, &ctx.config.layout);
        Ok(reindent(&sequence, ctx.config))
    }
}

/// LT03: operators and commas on the wrong end of a line break.
pub struct RuleLT03;

impl Rule for RuleLT03 {
    fn code(&self) -> &'static str {
        "LT03"
    }

    fn name(&self) -> &'static str {
        "layout.operators"
    }

    fn description(&self) -> &'static str {
        "Operators should follow the configured line position."
    }

    fn groups(&self) -> &'static [&'static str] {
        &["all", "layout"]
    }

    fn crawl_behaviour(&self) -> Crawl {
        Crawl::RootOnly
    }

    fn is_fix_compatible(&self) -> bool {
        true
    }

    fn eval(&self, ctx: &mut RuleContext) -> Result<Vec<LintResult>, RuleError> {
        let sequence = ReflowSequence::from_root(&ctx.segment, &ctx.config.layout);
        Ok(rebreak(&sequence))
    }
}

/// LT12: files should end with a single trailing newline.
pub struct RuleLT12;

impl Rule for RuleLT12 {
    fn code(&self) -> &'static str {
        "LT12"
    }

    fn name(&self) -> &'static str {
        "layout.end_of_file"
    }

    fn description(&self) -> &'static str {
        "Files must end with a single trailing newline."
    }

    fn groups(&self) -> &'static [&'static str] {
        &["all", "core", "layout"]
    }

    fn crawl_behaviour(&self) -> Crawl {
        Crawl::RootOnly
    }

    fn is_fix_compatible(&self) -> bool {
        true
    }

    fn config_schema(&self) -> &'static [ConfigOption] {
        &[]
    }

    fn eval(&self, ctx: &mut RuleContext) -> Result<Vec<LintResult>, RuleError> {
        let leaves: Vec<Segment> = ctx
            .segment
            .raw_segments()
            .into_iter()
            .filter(|s| !s.is_meta())
            .collect();

        // Find the last leaf with substance.
        let Some(last_content_idx) = leaves
            .iter()
            .rposition(|s| s.is_code() || s.is_comment())
        else {
            // An empty (or whitespace-only) file is left alone.
            return Ok(Vec::new());
        };

        let trailing = &leaves[last_content_idx + 1..];
        let newline_count = trailing
            .iter()
            .filter(|s| matches!(s.leaf_kind(), Some(LeafKind::Newline)))
            .count();

        if newline_count == 1 {
            return Ok(Vec::new());
        }

        let anchor = leaves[last_content_idx].clone();
        if newline_count == 0 {
            // Missing final newline.
            let insert_after = trailing.last().cloned().unwrap_or_else(|| anchor.clone());
            return Ok(vec![
                LintResult::new(anchor, "Files must end with a single trailing newline.")
                    .with_fixes(vec![LintFix::create_after(
                        insert_after,
                        vec![new_newline()],
                    )]),
            ]);
        }

        // Too many trailing newlines: delete all but the first.
        let mut fixes = Vec::new();
        let mut seen_first = false;
        for seg in trailing {
            match seg.leaf_kind() {
                Some(LeafKind::Newline) => {
                    if seen_first {
                        fixes.push(LintFix::delete(seg.clone()));
                    }
                    seen_first = true;
                }
                Some(LeafKind::Whitespace) if seen_first => {
                    fixes.push(LintFix::delete(seg.clone()));
                }
                _ => {}
            }
        }
        Ok(vec![
            LintResult::new(anchor, "Files must end with a single trailing newline.")
                .with_fixes(fixes),
        ])
    }
}
