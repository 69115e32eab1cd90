//! Crawl strategies: which segments a rule gets to see.

use std::sync::Arc;

use smol_str::SmolStr;
use tracing::warn;

use crate::config::LintConfig;
use crate::dialects::Dialect;
use crate::errors::{Severity, Violation};
use crate::rules::context::{RuleContext, RuleMemory};
use crate::rules::fix::LintResult;
use crate::rules::Rule;
use crate::segments::Segment;
use crate::templater::TemplatedFile;

/// How a rule is crawled over the tree.
#[derive(Debug, Clone)]
pub enum Crawl {
    /// Invoked once, at the file root.
    RootOnly,
    /// Invoked for every descendant whose type set intersects `types`.
    SegmentSeeker {
        types: Vec<SmolStr>,
        /// Maintain the flat left-hand raw stack (costs bookkeeping, so
        /// rules opt in).
        provide_raw_stack: bool,
        /// If false, a matching segment's own subtree is not searched.
        allow_recurse: bool,
    },
    /// Invoked at every segment.
    Recursive,
}

impl Crawl {
    pub fn seeker(types: &[&str]) -> Self {
        Crawl::SegmentSeeker {
            types: types.iter().map(|t| SmolStr::new(t)).collect(),
            provide_raw_stack: false,
            allow_recurse: true,
        }
    }
}

/// One rule finding, tagged with its position in the crawl for the
/// deterministic fix policy.
#[derive(Debug, Clone)]
pub struct RuleFinding {
    pub rule_code: &'static str,
    pub rule_name: &'static str,
    pub crawl_order: usize,
    pub result: LintResult,
}

/// Run every rule over the tree in pre-order, collecting findings and
/// internal errors. Rules run one at a time so each observes a
/// deterministic visit order; findings carry a global crawl index.
pub fn run_rules(
    rules: &[Arc<dyn Rule>],
    root: &Segment,
    dialect: &Dialect,
    config: &LintConfig,
    templated_file: &Arc<TemplatedFile>,
) -> (Vec<RuleFinding>, Vec<Violation>) {
    let mut findings = Vec::new();
    let mut internal = Vec::new();
    let mut crawl_order = 0usize;

    for rule in rules {
        let mut memory = RuleMemory::default();
        let behaviour = rule.crawl_behaviour();
        match behaviour {
            Crawl::RootOnly => {
                let mut ctx = RuleContext {
                    segment: root.clone(),
                    parent_stack: &[],
                    raw_stack: &[],
                    segment_idx: 0,
                    dialect,
                    config,
                    rule_code: rule.code(),
                    templated_file,
                    memory: &mut memory,
                };
                eval_one(
                    rule.as_ref(),
                    &mut ctx,
                    &mut crawl_order,
                    &mut findings,
                    &mut internal,
                );
            }
            Crawl::Recursive => {
                let mut walker = Walker::new(rule.as_ref(), dialect, config, templated_file, true);
                walker.crawl_base = crawl_order;
                walker.walk(root, &mut Vec::new(), &mut memory);
                crawl_order += walker.visited;
                findings.extend(walker.findings.drain(..));
                internal.extend(walker.internal.drain(..));
            }
            Crawl::SegmentSeeker {
                ref types,
                provide_raw_stack,
                allow_recurse,
            } => {
                let mut walker =
                    Walker::new(rule.as_ref(), dialect, config, templated_file, provide_raw_stack);
                walker.seek_types = types.clone();
                walker.allow_recurse = allow_recurse;
                walker.crawl_base = crawl_order;
                walker.walk(root, &mut Vec::new(), &mut memory);
                crawl_order += walker.visited;
                findings.extend(walker.findings.drain(..));
                internal.extend(walker.internal.drain(..));
            }
        }
    }

    (findings, internal)
}

fn eval_one(
    rule: &dyn Rule,
    ctx: &mut RuleContext,
    crawl_order: &mut usize,
    findings: &mut Vec<RuleFinding>,
    internal: &mut Vec<Violation>,
) {
    match rule.eval(ctx) {
        Ok(results) => {
            for result in results {
                findings.push(RuleFinding {
                    rule_code: rule.code(),
                    rule_name: rule.name(),
                    crawl_order: *crawl_order,
                    result,
                });
            }
        }
        Err(err) => {
            warn!(rule = rule.code(), error = %err, "rule raised an error");
            internal.push(
                Violation::new(
                    rule.code(),
                    rule.name(),
                    format!("Unexpected error in rule {}: {}", rule.code(), err),
                    (1, 1, 0),
                )
                .with_severity(Severity::Error),
            );
        }
    }
    *crawl_order += 1;
}

/// Pre-order tree walker for seeker and recursive crawls.
struct Walker<'a> {
    rule: &'a dyn Rule,
    dialect: &'a Dialect,
    config: &'a LintConfig,
    templated_file: &'a Arc<TemplatedFile>,
    seek_types: Vec<SmolStr>,
    allow_recurse: bool,
    track_raw_stack: bool,
    raw_stack: Vec<Segment>,
    crawl_base: usize,
    visited: usize,
    findings: Vec<RuleFinding>,
    internal: Vec<Violation>,
}

impl<'a> Walker<'a> {
    fn new(
        rule: &'a dyn Rule,
        dialect: &'a Dialect,
        config: &'a LintConfig,
        templated_file: &'a Arc<TemplatedFile>,
        track_raw_stack: bool,
    ) -> Self {
        Self {
            rule,
            dialect,
            config,
            templated_file,
            seek_types: Vec::new(),
            allow_recurse: true,
            track_raw_stack,
            raw_stack: Vec::new(),
            crawl_base: 0,
            visited: 0,
            findings: Vec::new(),
            internal: Vec::new(),
        }
    }

    fn is_match(&self, segment: &Segment) -> bool {
        if self.seek_types.is_empty() {
            // Recursive crawl: everything matches.
            return true;
        }
        self.seek_types.iter().any(|t| segment.is_type(t))
    }

    fn could_contain_match(&self, segment: &Segment) -> bool {
        if self.seek_types.is_empty() {
            return true;
        }
        let descendants = segment.descendant_type_set();
        self.seek_types.iter().any(|t| descendants.contains(t))
    }

    fn walk(&mut self, segment: &Segment, parents: &mut Vec<Segment>, memory: &mut RuleMemory) {
        // Rules don't see inside unparsable sections.
        if segment.is_type("unparsable") {
            if self.track_raw_stack {
                self.raw_stack.extend(segment.raw_segments());
            }
            return;
        }

        let self_match = self.is_match(segment);
        if self_match {
            let crawl_order = self.crawl_base + self.visited;
            let mut order = crawl_order;
            let mut ctx = RuleContext {
                segment: segment.clone(),
                parent_stack: parents.as_slice(),
                raw_stack: &self.raw_stack,
                segment_idx: 0,
                dialect: self.dialect,
                config: self.config,
                rule_code: self.rule.code(),
                templated_file: self.templated_file,
                memory,
            };
            eval_one(
                self.rule,
                &mut ctx,
                &mut order,
                &mut self.findings,
                &mut self.internal,
            );
            self.visited += 1;
        }

        if segment.is_leaf() {
            if self.track_raw_stack {
                self.raw_stack.push(segment.clone());
            }
            return;
        }

        if (self_match && !self.allow_recurse) || !self.could_contain_match(segment) {
            if self.track_raw_stack {
                self.raw_stack.extend(segment.raw_segments());
            }
            return;
        }

        parents.push(segment.clone());
        for child in segment.children() {
            self.walk(child, parents, memory);
        }
        parents.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::LeafKind;

    struct CollectRule;

    impl Rule for CollectRule {
        fn code(&self) -> &'static str {
            "TT01"
        }
        fn name(&self) -> &'static str {
            "test.collect"
        }
        fn description(&self) -> &'static str {
            "collects keywords"
        }
        fn groups(&self) -> &'static [&'static str] {
            &["all"]
        }
        fn crawl_behaviour(&self) -> Crawl {
            Crawl::seeker(&["keyword"])
        }
        fn eval(&self, ctx: &mut RuleContext) -> Result<Vec<LintResult>, crate::errors::RuleError> {
            Ok(vec![LintResult::new(
                ctx.segment.clone(),
                format!("saw {}", ctx.segment.raw()),
            )])
        }
    }

    #[test]
    fn test_seeker_visits_in_preorder() {
        let kw1 = Segment::leaf("keyword", "SELECT", LeafKind::Code, None);
        let kw2 = Segment::leaf("keyword", "FROM", LeafKind::Code, None);
        let word = Segment::leaf("word", "a", LeafKind::Code, None);
        let clause = Segment::branch("select_clause", &[], vec![kw1, word]);
        let root = Segment::branch("file", &[], vec![clause, kw2]);

        let dialect = crate::dialects::dialect_by_name("ansi").unwrap();
        let config = LintConfig::default();
        let tf = Arc::new(crate::templater::TemplatedFile::from_string("SELECT a FROM"));
        let rules: Vec<Arc<dyn Rule>> = vec![Arc::new(CollectRule)];
        let (findings, internal) = run_rules(&rules, &root, &dialect, &config, &tf);
        assert!(internal.is_empty());
        let seen: Vec<&str> = findings
            .iter()
            .map(|f| f.result.description.as_str())
            .collect();
        assert_eq!(seen, vec!["saw SELECT", "saw FROM"]);
        assert!(findings[0].crawl_order < findings[1].crawl_order);
    }
}
