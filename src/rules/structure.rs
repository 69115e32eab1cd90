//! Structure rules.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::errors::RuleError;
use crate::rules::context::RuleContext;
use crate::rules::crawlers::Crawl;
use crate::rules::fix::LintResult;
use crate::rules::Rule;
use crate::segments::Segment;

/// ST03: query defines a CTE but never uses it.
pub struct RuleST03;

impl Rule for RuleST03 {
    fn code(&self) -> &'static str {
        "ST03"
    }

    fn name(&self) -> &'static str {
        "structure.unused_cte"
    }

    fn description(&self) -> &'static str {
        "Query defines a CTE but does not use it."
    }

    fn groups(&self) -> &'static [&'static str] {
        &["all", "core", "structure"]
    }

    fn crawl_behaviour(&self) -> Crawl {
        Crawl::seeker(&["with_compound_statement"])
    }

    fn eval(&self, ctx: &mut RuleContext) -> Result<Vec<LintResult>, RuleError> {
        let with_statement = &ctx.segment;

        // Definitions: each CTE's name identifier.
        let ctes = with_statement.recursive_crawl(&["common_table_expression"], false);
        // (comparison key, display name, anchor)
        let mut definitions: Vec<(SmolStr, SmolStr, Segment)> = Vec::new();
        for cte in &ctes {
            if let Some(name_seg) = cte.get_child("identifier") {
                definitions.push((
                    SmolStr::new(name_seg.raw_trimmed().to_uppercase()),
                    SmolStr::new(name_seg.raw_trimmed()),
                    name_seg.clone(),
                ));
            }
        }
        if definitions.is_empty() {
            return Ok(Vec::new());
        }

        // References: the leading part of every table reference in the
        // statement, including references between CTEs.
        let mut referenced: FxHashSet<SmolStr> = FxHashSet::default();
        for table_ref in with_statement.recursive_crawl(&["table_reference"], true) {
            if let Some(first_part) = table_ref
                .raw_segments()
                .into_iter()
                .find(|s| s.is_code())
            {
                referenced.insert(SmolStr::new(first_part.raw_trimmed().to_uppercase()));
            }
        }

        let results = definitions
            .into_iter()
            .filter(|(key, _, _)| !referenced.contains(key))
            .map(|(_, name, anchor)| {
                LintResult::new(
                    anchor,
                    format!("Query defines CTE {name:?} but does not use it."),
                )
            })
            .collect();
        Ok(results)
    }
}
