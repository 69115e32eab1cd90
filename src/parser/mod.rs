//! The parser: drives the file-level grammar over the lexed stream.
//!
//! Parsing is two-phase where a segment class declares it: the
//! `match_grammar` establishes outer bounds cheaply (producing a branch
//! with leaf children), then the `parse_grammar` is applied recursively
//! to those children to establish inner structure. Unconsumed token
//! runs always end up wrapped in `unparsable` branches rather than
//! failing the file; parsing consumes the whole input.

use std::sync::Arc;

use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::base::PositionMarker;
use crate::config::LintConfig;
use crate::dialects::Dialect;
use crate::errors::{Severity, Violation};
use crate::grammar::{Grammar, ParseContext, match_grammar, skip_gap};
use crate::segments::Segment;
use crate::templater::TemplatedFile;

/// The outcome of parsing one file.
#[derive(Debug, Clone)]
pub struct Parse {
    pub root: Segment,
    pub violations: Vec<Violation>,
}

impl Parse {
    pub fn ok(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Parses lexed segments with a dialect's root grammar.
pub struct Parser<'a> {
    dialect: &'a Dialect,
    config: &'a LintConfig,
}

impl<'a> Parser<'a> {
    pub fn new(dialect: &'a Dialect, config: &'a LintConfig) -> Self {
        Self { dialect, config }
    }

    /// Parse a lexed segment sequence into a `file` tree.
    pub fn parse(&self, segments: &[Segment], templated_file: &Arc<TemplatedFile>) -> Parse {
        let mut ctx = ParseContext::new(self.dialect, self.config.indent_flags.clone());

        // An input with no code at all is a valid (if empty) file; the
        // file root is the only segment allowed to be empty or to
        // begin/end with non-code.
        let has_code = segments.iter().any(Segment::is_code);
        let mut children: Vec<Segment>;
        if !has_code {
            children = segments.to_vec();
        } else {
            let root_match_grammar = match self.dialect.grammar(self.dialect.root_grammar()) {
                Grammar::Node(node_id) => self.dialect.node(*node_id).match_grammar,
                _ => self.dialect.root_grammar(),
            };
            let start = skip_gap(segments, 0);
            let matched = match_grammar(root_match_grammar, segments, start, &mut ctx);
            debug!(
                consumed = matched.len(),
                total = segments.len(),
                "root grammar match"
            );

            children = segments[..matched.matched_slice.start].to_vec();
            let after = matched.matched_slice.end;
            if matched.has_match() {
                children.extend(matched.apply(segments, self.dialect));
            }
            children.extend(wrap_leftovers(&segments[after..]));
        }

        // Second phase: apply parse grammars to freshly-matched nodes.
        children = children
            .into_iter()
            .map(|child| self.refine(child, &mut ctx))
            .collect();

        let root = Segment::branch("file", &[], children);

        if root.raw() != templated_file.templated_str() {
            // Broken invariant; surface loudly in development builds.
            warn!("parse tree does not reproduce its input");
            debug_assert_eq!(root.raw(), templated_file.templated_str());
        }

        let mut violations = violations_from_tree(&root);
        if ctx.depth_was_exceeded() {
            violations.push(
                Violation::new(
                    "PRS",
                    "parser.recursion_limit",
                    "Parsing recursion limit reached; some structure was not resolved",
                    (1, 1, 0),
                )
                .with_severity(Severity::Error),
            );
        }

        Parse { root, violations }
    }

    /// Apply `parse_grammar` to a match-phase branch (all-leaf children)
    /// and recurse into the result.
    fn refine(&self, segment: Segment, ctx: &mut ParseContext) -> Segment {
        if segment.is_leaf() {
            return segment;
        }

        let needs_parse = self
            .dialect
            .nodes()
            .iter()
            .find(|n| n.seg_type == *segment.seg_type())
            .and_then(|n| n.parse_grammar);

        // A match-phase branch has only leaf children; once the parse
        // grammar has run, structure (branches) appears and the node is
        // final.
        let unrefined = segment.children().iter().all(Segment::is_leaf);

        let segment = if let (Some(parse_grammar), true) = (needs_parse, unrefined) {
            let children = segment.children().to_vec();
            let start = skip_gap(&children, 0);
            let matched = match_grammar(parse_grammar, &children, start, ctx);
            let mut new_children: Vec<Segment> = children[..matched.matched_slice.start].to_vec();
            let after = matched.matched_slice.end;
            if matched.has_match() {
                new_children.extend(matched.apply(&children, self.dialect));
            }
            new_children.extend(wrap_leftovers(&children[after..]));
            segment.with_children(new_children)
        } else {
            segment
        };

        let refined: Vec<Segment> = segment
            .children()
            .iter()
            .map(|c| self.refine(c.clone(), ctx))
            .collect();
        if refined.iter().zip(segment.children()).all(|(a, b)| a.same_identity(b)) {
            segment
        } else {
            segment.with_children(refined)
        }
    }
}

/// Wrap any unconsumed *code* in an `unparsable` branch, passing
/// non-code through untouched.
fn wrap_leftovers(leftover: &[Segment]) -> Vec<Segment> {
    let first_code = leftover.iter().position(Segment::is_code);
    let Some(first) = first_code else {
        return leftover.to_vec();
    };
    let last = leftover
        .iter()
        .rposition(Segment::is_code)
        .unwrap_or(first);

    let mut out: Vec<Segment> = leftover[..first].to_vec();
    out.push(Segment::branch(
        "unparsable",
        &[SmolStr::new("unparsable")],
        leftover[first..=last].to_vec(),
    ));
    out.extend(leftover[last + 1..].iter().cloned());
    out
}

/// One `PRS` violation per unparsable branch, anchored at its first
/// token in source coordinates.
fn violations_from_tree(root: &Segment) -> Vec<Violation> {
    root.recursive_crawl(&["unparsable"], false)
        .into_iter()
        .map(|seg| {
            let (line, col) = seg
                .marker()
                .map(PositionMarker::source_position)
                .unwrap_or((1, 1));
            let char_pos = seg.marker().map(|m| m.source_slice.start).unwrap_or(0);
            let preview: String = seg.raw().chars().take(32).collect();
            Violation::new(
                "PRS",
                "parser.unparsable",
                format!("Found unparsable section: {preview:?}"),
                (line, col, char_pos),
            )
            .with_severity(Severity::Error)
        })
        .collect()
}
