//! The linter facade: lex → parse → lint → fix.
//!
//! One [`Linter`] holds an expanded dialect, a frozen rule registry and
//! a configuration. Each file is processed end-to-end on one thread;
//! [`Linter::lint_strings`] fans multiple files out over a pool, which
//! is safe because expanded dialects are immutable.
//!
//! The fix loop: each *phase* crawls all rules over the current tree,
//! applies the winning fixes as textual edits to the templated file,
//! then re-lexes and re-parses to re-establish markers and identities.
//! The loop stops when a phase applies nothing, the text stabilises, or
//! the phase limit trips (surfaced as an `LNT` diagnostic).

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::LintConfig;
use crate::dialects::{Dialect, dialect_by_name};
use crate::errors::{CoreError, Severity, Violation};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::rules::crawlers::{RuleFinding, run_rules};
use crate::rules::fix::{QueuedFixes, resolve_fixes};
use crate::rules::noqa::IgnoreMask;
use crate::rules::{CorePlugin, RuleRegistry};
use crate::segments::Segment;
use crate::templater::{RawTemplater, Templater, TemplatedFile};

/// The outcome of parsing a string, without linting.
#[derive(Debug, Clone)]
pub struct ParsedString {
    pub tree: Segment,
    pub violations: Vec<Violation>,
    pub templated_file: Arc<TemplatedFile>,
}

/// The outcome of linting (and optionally fixing) one file.
#[derive(Debug, Clone)]
pub struct LintedFile {
    pub tree: Segment,
    /// Ordered by source position, then code.
    pub violations: Vec<Violation>,
    /// Equals the original source iff no fixes were applied.
    pub fixed_source: String,
    pub templated_file: Arc<TemplatedFile>,
}

impl LintedFile {
    /// Were any violations found?
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// Orchestrates lexing, parsing, rule evaluation and fixing.
pub struct Linter {
    config: LintConfig,
    dialect: Arc<Dialect>,
    registry: RuleRegistry,
}

impl Linter {
    pub fn new(config: LintConfig) -> Result<Self, CoreError> {
        let dialect = dialect_by_name(&config.dialect)?;
        let registry = RuleRegistry::from_plugins(&[&CorePlugin], &config)?;
        Ok(Self {
            config,
            dialect,
            registry,
        })
    }

    pub fn config(&self) -> &LintConfig {
        &self.config
    }

    pub fn dialect(&self) -> &Arc<Dialect> {
        &self.dialect
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Run the templater over a raw string.
    pub fn render_string(&self, sql: &str, name: &str) -> Result<TemplatedFile, Violation> {
        match self.registry.get_templaters().first() {
            Some(templater) => templater.process(sql, name, &self.config),
            None => RawTemplater.process(sql, name, &self.config),
        }
    }

    /// Lex and parse without linting.
    pub fn parse_string(&self, sql: &str) -> ParsedString {
        match self.render_string(sql, "<string>") {
            Ok(tf) => {
                let tf = Arc::new(tf);
                let lexer = Lexer::new(
                    self.dialect.lexer_matchers().to_vec(),
                    self.config.template_blocks_indent,
                );
                let (segments, mut violations) = lexer.lex(&tf);
                let parsed = Parser::new(&self.dialect, &self.config).parse(&segments, &tf);
                violations.extend(parsed.violations);
                ParsedString {
                    tree: parsed.root,
                    violations,
                    templated_file: tf,
                }
            }
            Err(violation) => ParsedString {
                tree: Segment::branch("file", &[], Vec::new()),
                violations: vec![violation],
                templated_file: Arc::new(TemplatedFile::from_string(sql)),
            },
        }
    }

    /// Lint a raw string, optionally applying fixes.
    pub fn lint_string(&self, sql: &str, fix: bool) -> LintedFile {
        match self.render_string(sql, "<string>") {
            Ok(tf) => self.lint_templated(tf, fix),
            Err(violation) => {
                // Templater failure: no parse is attempted.
                let tf = Arc::new(TemplatedFile::from_string(sql));
                LintedFile {
                    tree: Segment::branch("file", &[], Vec::new()),
                    violations: vec![violation],
                    fixed_source: sql.to_string(),
                    templated_file: tf,
                }
            }
        }
    }

    /// Lint many strings, fanned out over a worker pool.
    pub fn lint_strings(&self, inputs: &[&str], fix: bool) -> Vec<LintedFile> {
        inputs
            .par_iter()
            .map(|sql| self.lint_string(sql, fix))
            .collect()
    }

    /// Lint a pre-templated file, optionally applying fixes.
    pub fn lint_templated(&self, templated_file: TemplatedFile, fix: bool) -> LintedFile {
        let lexer = Lexer::new(
            self.dialect.lexer_matchers().to_vec(),
            self.config.template_blocks_indent,
        );
        let parser = Parser::new(&self.dialect, &self.config);

        let mut tf = Arc::new(templated_file);
        let mut reported: Vec<Violation> = Vec::new();
        let mut tree = Segment::branch("file", &[], Vec::new());
        let mut loop_limit_hit = false;
        let mut mask = IgnoreMask::default();

        for phase in 1..=self.config.phase_limit.max(1) {
            let (segments, lex_violations) = lexer.lex(&tf);
            let parsed = parser.parse(&segments, &tf);
            tree = parsed.root;

            let (findings, internal_errors) =
                run_rules(self.registry.get_rules(), &tree, &self.dialect, &self.config, &tf);

            if phase == 1 {
                mask = IgnoreMask::from_tree(&tree);
                let mut violations = lex_violations;
                violations.extend(parsed.violations);
                violations.extend(internal_errors);
                violations.extend(
                    findings
                        .iter()
                        .filter(|f| self.violation_reportable(f))
                        .map(|f| self.finding_to_violation(f)),
                );
                reported = mask.ignore_masked_violations(violations);
            }

            if !fix {
                break;
            }

            // Queue fixes from fix-compatible rules, skipping findings
            // the mask or templated-area policy suppresses.
            let queued: Vec<QueuedFixes> = findings
                .iter()
                .filter(|f| !f.result.fixes.is_empty())
                .filter(|f| self.fixes_applicable(f, &mask))
                .map(|f| QueuedFixes {
                    crawl_order: f.crawl_order,
                    rule_code: f.rule_code,
                    fixes: f.result.fixes.clone(),
                })
                .collect();

            let outcome = resolve_fixes(queued, &tf);
            if outcome.edits.is_empty() {
                debug!(phase, "no applicable fixes; converged");
                break;
            }
            if phase == 1 {
                // Mark first-phase violations whose fixes were applied.
                for violation in &mut reported {
                    if findings.iter().any(|f| {
                        f.rule_code == violation.code
                            && !f.result.fixes.is_empty()
                            && f.result
                                .fixes
                                .iter()
                                .any(|fx| outcome.applied_anchors.contains(&fx.anchor.id()))
                            && self.finding_to_violation(f).sort_key() == violation.sort_key()
                    }) {
                        violation.fixes_applied = true;
                    }
                }
            }

            let patched = match tf.patch(&outcome.edits) {
                Ok(patched) => patched,
                Err(err) => {
                    debug!(%err, "fix application failed; keeping last stable text");
                    break;
                }
            };
            if patched.templated_str() == tf.templated_str() {
                break;
            }
            info!(
                phase,
                edits = outcome.edits.len(),
                "applied fixes; re-parsing"
            );
            tf = Arc::new(patched);

            if phase == self.config.phase_limit.max(1) {
                loop_limit_hit = true;
            }
        }

        if loop_limit_hit {
            reported.push(
                Violation::new(
                    "LNT",
                    "linter.loop_limit",
                    format!(
                        "Fix loop did not converge within {} phases.",
                        self.config.phase_limit
                    ),
                    (1, 1, 0),
                )
                .with_severity(Severity::Error),
            );
        }

        reported.sort_by(|a, b| {
            a.sort_key()
                .cmp(&b.sort_key())
                .then_with(|| a.description.cmp(&b.description))
        });

        LintedFile {
            tree,
            violations: reported,
            fixed_source: tf.source_str().to_string(),
            templated_file: tf,
        }
    }

    /// Should this finding be reported at all?
    fn violation_reportable(&self, finding: &RuleFinding) -> bool {
        if !self.config.ignore_templated_areas {
            return true;
        }
        finding
            .result
            .anchor
            .marker()
            .is_none_or(|marker| marker.is_literal())
    }

    /// Should this finding's fixes be applied?
    fn fixes_applicable(&self, finding: &RuleFinding, mask: &IgnoreMask) -> bool {
        if !self.violation_reportable(finding) {
            return false;
        }
        let rule_is_fixable = self
            .registry
            .get_rules()
            .iter()
            .any(|r| r.code() == finding.rule_code && r.is_fix_compatible());
        if !rule_is_fixable {
            return false;
        }
        if mask.is_empty() {
            return true;
        }
        let candidate = self.finding_to_violation(finding);
        !mask
            .ignore_masked_violations(vec![candidate])
            .is_empty()
    }

    fn finding_to_violation(&self, finding: &RuleFinding) -> Violation {
        let (line, col) = finding
            .result
            .anchor
            .marker()
            .map(|m| m.source_position())
            .unwrap_or((1, 1));
        let char_pos = finding
            .result
            .anchor
            .marker()
            .map(|m| m.source_slice.start)
            .unwrap_or(0);
        Violation::new(
            finding.rule_code,
            finding.rule_name,
            finding.result.description.clone(),
            (line, col, char_pos),
        )
    }
}
