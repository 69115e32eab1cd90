//! The matching engine: drives compiled grammars over the leaf stream.
//!
//! All matching operates over the original flat array of raw segments
//! with explicit indices; no tree is built until a [`MatchResult`] is
//! applied. Gaps (whitespace, comments, metas) between sub-matches are
//! skipped when advancing but remain inside the matched span, so they
//! re-attach in their original positions.

use tracing::trace;

use crate::grammar::context::ParseContext;
use crate::grammar::match_result::{MatchResult, Matched};
use crate::grammar::{Grammar, GrammarId};
use crate::segments::Segment;

/// Advance past non-code segments (whitespace, comments, metas).
pub fn skip_gap(segments: &[Segment], mut idx: usize) -> usize {
    while idx < segments.len() && !segments[idx].is_code() {
        idx += 1;
    }
    idx
}

/// Does any terminator currently in scope match at `idx`?
fn at_terminator(segments: &[Segment], idx: usize, ctx: &mut ParseContext) -> bool {
    let stops: Vec<GrammarId> = ctx.terminators().to_vec();
    stops
        .iter()
        .any(|&stop| match_grammar(stop, segments, idx, ctx).has_match())
}

/// Attempt to match grammar `id` at `idx`. Returns an empty result on
/// failure; failed alternatives never produce diagnostics.
pub fn match_grammar(
    id: GrammarId,
    segments: &[Segment],
    idx: usize,
    ctx: &mut ParseContext,
) -> MatchResult {
    // The clone here is cheap: grammar nodes hold ids, small strings and
    // pre-compiled regexes (which are reference counted).
    let grammar = ctx.dialect.grammar(id).clone();
    match grammar {
        Grammar::StringParser {
            template,
            case_sensitive,
            recast,
        } => {
            let Some(seg) = segments.get(idx) else {
                return MatchResult::empty_at(idx);
            };
            if !seg.is_code() {
                return MatchResult::empty_at(idx);
            }
            let hit = if case_sensitive {
                seg.raw() == template.as_str()
            } else {
                seg.raw_upper() == template.as_str()
            };
            if hit {
                MatchResult {
                    matched_slice: idx..idx + 1,
                    matched: Matched::Recast(recast),
                    insert_segments: Vec::new(),
                    child_matches: Vec::new(),
                }
            } else {
                MatchResult::empty_at(idx)
            }
        }

        Grammar::MultiStringParser { templates, recast } => {
            let Some(seg) = segments.get(idx) else {
                return MatchResult::empty_at(idx);
            };
            if seg.is_code() && templates.iter().any(|t| seg.raw_upper() == t.as_str()) {
                MatchResult {
                    matched_slice: idx..idx + 1,
                    matched: Matched::Recast(recast),
                    insert_segments: Vec::new(),
                    child_matches: Vec::new(),
                }
            } else {
                MatchResult::empty_at(idx)
            }
        }

        Grammar::TypedParser { match_type, recast } => {
            let Some(seg) = segments.get(idx) else {
                return MatchResult::empty_at(idx);
            };
            if seg.is_type(&match_type) {
                MatchResult {
                    matched_slice: idx..idx + 1,
                    matched: recast.map_or(Matched::None, Matched::Recast),
                    insert_segments: Vec::new(),
                    child_matches: Vec::new(),
                }
            } else {
                MatchResult::empty_at(idx)
            }
        }

        Grammar::RegexParser { regex, anti, recast } => {
            let Some(seg) = segments.get(idx) else {
                return MatchResult::empty_at(idx);
            };
            if !seg.is_code() || !regex.is_match(seg.raw()) {
                return MatchResult::empty_at(idx);
            }
            if let Some(anti) = &anti {
                if anti.is_match(seg.raw()) {
                    return MatchResult::empty_at(idx);
                }
            }
            MatchResult {
                matched_slice: idx..idx + 1,
                matched: Matched::Recast(recast),
                insert_segments: Vec::new(),
                child_matches: Vec::new(),
            }
        }

        Grammar::Node(node_id) => {
            let key = (id, idx, ctx.terminator_fingerprint());
            if let Some(cached) = ctx.memo_get(key) {
                return cached.clone();
            }
            let match_grammar_id = ctx.dialect.node(node_id).match_grammar;
            let result = ctx.deeper(MatchResult::empty_at(idx), |ctx| {
                match_grammar(match_grammar_id, segments, idx, ctx)
            });
            let result = if result.has_match() {
                result.wrap(node_id)
            } else {
                MatchResult::empty_at(idx)
            };
            ctx.memo_put(key, result.clone());
            result
        }

        Grammar::Wrapper {
            target, exclude, ..
        } => {
            if let Some(exclude) = exclude {
                if match_grammar(exclude, segments, idx, ctx).has_match() {
                    return MatchResult::empty_at(idx);
                }
            }
            ctx.deeper(MatchResult::empty_at(idx), |ctx| {
                match_grammar(target, segments, idx, ctx)
            })
        }

        Grammar::Sequence {
            elements,
            allow_gaps,
            terminators,
            ..
        } => ctx.deeper(MatchResult::empty_at(idx), |ctx| {
            ctx.with_terminators(&terminators, false, |ctx| {
                match_sequence(&elements, allow_gaps, segments, idx, ctx)
            })
        }),

        Grammar::OneOf {
            options,
            terminators,
            ..
        } => ctx.deeper(MatchResult::empty_at(idx), |ctx| {
            ctx.with_terminators(&terminators, false, |ctx| {
                let p = skip_gap(segments, idx);
                longest_match(&options, segments, p, ctx)
            })
        }),

        Grammar::AnyNumberOf {
            options,
            min_times,
            max_times,
            allow_gaps,
            terminators,
            ..
        } => ctx.deeper(MatchResult::empty_at(idx), |ctx| {
            ctx.with_terminators(&terminators, false, |ctx| {
                let mut acc = MatchResult::empty_at(idx);
                let mut working = idx;
                let mut count = 0usize;
                loop {
                    if max_times.is_some_and(|max| count >= max) {
                        break;
                    }
                    let p = if allow_gaps {
                        skip_gap(segments, working)
                    } else {
                        working
                    };
                    if p >= segments.len() || at_terminator(segments, p, ctx) {
                        break;
                    }
                    let m = longest_match(&options, segments, p, ctx);
                    // A zero-width (insert-only) match makes no progress.
                    if m.is_empty() || m.matched_slice.end <= p {
                        break;
                    }
                    working = m.matched_slice.end;
                    acc = acc.append(m);
                    count += 1;
                }
                if count < min_times {
                    MatchResult::empty_at(idx)
                } else {
                    acc
                }
            })
        }),

        Grammar::Delimited {
            element,
            delimiter,
            allow_trailing,
            min_delimiters,
            allow_gaps,
            terminators,
            ..
        } => ctx.deeper(MatchResult::empty_at(idx), |ctx| {
            ctx.with_terminators(&terminators, false, |ctx| {
                match_delimited(
                    element,
                    delimiter,
                    allow_trailing,
                    min_delimiters,
                    allow_gaps,
                    segments,
                    idx,
                    ctx,
                )
            })
        }),

        Grammar::Bracketed {
            content,
            bracket_kind,
            ..
        } => ctx.deeper(MatchResult::empty_at(idx), |ctx| {
            match_bracketed(content, &bracket_kind, segments, idx, ctx)
        }),

        Grammar::GreedyUntil { stops } => greedy_until(&stops, segments, idx, ctx),

        Grammar::StartsWith { head, terminators } => {
            ctx.deeper(MatchResult::empty_at(idx), |ctx| {
                let p = skip_gap(segments, idx);
                let head_match = match_grammar(head, segments, p, ctx);
                if head_match.is_empty() {
                    return MatchResult::empty_at(idx);
                }
                let rest = greedy_until(&terminators, segments, head_match.matched_slice.end, ctx);
                head_match.append(rest)
            })
        }

        Grammar::Anything { terminators } => {
            let stops: Vec<GrammarId> = if terminators.is_empty() {
                ctx.terminators().to_vec()
            } else {
                terminators
            };
            if stops.is_empty() {
                // Consume everything (trimmed of trailing non-code).
                let end = trim_trailing_non_code(segments, idx, segments.len());
                if end > idx {
                    MatchResult::from_span(idx..end)
                } else {
                    MatchResult::empty_at(idx)
                }
            } else {
                greedy_until(&stops, segments, idx, ctx)
            }
        }

        Grammar::Nothing => MatchResult::empty_at(idx),

        Grammar::Meta(kind) => MatchResult {
            matched_slice: idx..idx,
            matched: Matched::None,
            insert_segments: vec![(idx, kind)],
            child_matches: Vec::new(),
        },

        Grammar::Conditional { meta, config_key } => {
            if ctx.indent_flag(&config_key) {
                MatchResult {
                    matched_slice: idx..idx,
                    matched: Matched::None,
                    insert_segments: vec![(idx, meta)],
                    child_matches: Vec::new(),
                }
            } else {
                // Not enabled: match trivially without inserting.
                MatchResult::empty_at(idx)
            }
        }
    }
}

/// Sequence matching: each element in order, skipping gaps between.
fn match_sequence(
    elements: &[GrammarId],
    allow_gaps: bool,
    segments: &[Segment],
    idx: usize,
    ctx: &mut ParseContext,
) -> MatchResult {
    let mut working = idx;
    let mut first_start: Option<usize> = None;
    let mut acc = MatchResult::empty_at(idx);

    for &el_id in elements {
        let el = ctx.dialect.grammar(el_id);
        // Zero-width metas insert at the current position (before any
        // gap), so indents hug the preceding code.
        if let Grammar::Meta(kind) = el {
            acc.insert_segments.push((working, kind.clone()));
            continue;
        }
        if let Grammar::Conditional { meta, config_key } = el {
            if ctx.indent_flag(config_key) {
                acc.insert_segments.push((working, meta.clone()));
            }
            continue;
        }

        let optional = el.is_optional();
        let p = if allow_gaps {
            skip_gap(segments, working)
        } else {
            working
        };
        let m = match_grammar(el_id, segments, p, ctx);
        if m.is_empty() {
            if optional {
                continue;
            }
            trace!(element = el_id, at = p, "sequence element failed");
            return MatchResult::empty_at(idx);
        }
        if first_start.is_none() {
            first_start = Some(m.matched_slice.start);
        }
        working = m.matched_slice.end;
        acc = acc.append(m);
    }

    match first_start {
        Some(start) => MatchResult {
            matched_slice: start..working,
            ..acc
        },
        // Nothing consumed; only legitimate if metas were inserted.
        None if !acc.insert_segments.is_empty() => acc,
        None => MatchResult::empty_at(idx),
    }
}

/// Longest-match alternation with simple-hint pruning.
fn longest_match(
    options: &[GrammarId],
    segments: &[Segment],
    idx: usize,
    ctx: &mut ParseContext,
) -> MatchResult {
    let mut best: Option<MatchResult> = None;
    for &opt in options {
        if let Some(hint) = ctx.dialect.simple_hint(opt) {
            if let Some(seg) = segments.get(idx) {
                if !hint.admits(seg) {
                    continue;
                }
            } else {
                continue;
            }
        }
        let m = match_grammar(opt, segments, idx, ctx);
        if m.is_empty() {
            continue;
        }
        // Declared order breaks ties, so only strictly-longer wins.
        let better = best
            .as_ref()
            .is_none_or(|b| m.matched_slice.end > b.matched_slice.end);
        if better {
            best = Some(m);
        }
    }
    best.unwrap_or_else(|| MatchResult::empty_at(idx))
}

#[allow(clippy::too_many_arguments)]
fn match_delimited(
    element: GrammarId,
    delimiter: GrammarId,
    allow_trailing: bool,
    min_delimiters: usize,
    allow_gaps: bool,
    segments: &[Segment],
    idx: usize,
    ctx: &mut ParseContext,
) -> MatchResult {
    let mut acc = MatchResult::empty_at(idx);
    let mut working = idx;
    let mut delimiter_count = 0usize;
    let mut matched_any = false;
    // Snapshot taken before each delimiter so a dangling one can be
    // rewound when trailing delimiters are not allowed.
    let mut pre_delimiter: Option<MatchResult> = None;

    loop {
        let p = if allow_gaps {
            skip_gap(segments, working)
        } else {
            working
        };
        if p >= segments.len() || at_terminator(segments, p, ctx) {
            break;
        }
        let m = match_grammar(element, segments, p, ctx);
        if m.is_empty() || m.matched_slice.end <= p {
            // A delimiter with no element after it.
            if !allow_trailing {
                if let Some(snapshot) = pre_delimiter.take() {
                    acc = snapshot;
                    delimiter_count -= 1;
                }
            }
            break;
        }
        pre_delimiter = None;
        matched_any = true;
        working = m.matched_slice.end;
        acc = acc.append(m);

        let p2 = if allow_gaps {
            skip_gap(segments, working)
        } else {
            working
        };
        if p2 >= segments.len() || at_terminator(segments, p2, ctx) {
            break;
        }
        let d = match_grammar(delimiter, segments, p2, ctx);
        if d.is_empty() {
            break;
        }
        pre_delimiter = Some(acc.clone());
        delimiter_count += 1;
        working = d.matched_slice.end;
        acc = acc.append(d);
    }

    if !matched_any || delimiter_count < min_delimiters {
        MatchResult::empty_at(idx)
    } else {
        acc
    }
}

fn match_bracketed(
    content: GrammarId,
    bracket_kind: &str,
    segments: &[Segment],
    idx: usize,
    ctx: &mut ParseContext,
) -> MatchResult {
    let Some(pair) = ctx.dialect.bracket_pair(bracket_kind) else {
        return MatchResult::empty_at(idx);
    };
    let (start_id, end_id) = (pair.start, pair.end);

    let p = skip_gap(segments, idx);
    let start_match = match_grammar(start_id, segments, p, ctx);
    if start_match.is_empty() {
        return MatchResult::empty_at(idx);
    }
    let content_start = start_match.matched_slice.end;

    // Outer terminators no longer apply inside the brackets.
    let content_match = ctx.with_terminators(&[end_id], true, |ctx| {
        match_grammar(content, segments, skip_gap(segments, content_start), ctx)
    });
    let after_content = if content_match.has_match() {
        content_match.matched_slice.end
    } else {
        content_start
    };

    let q = skip_gap(segments, after_content);
    let mut end_match = match_grammar(end_id, segments, q, ctx);
    let mut unparsable: Option<MatchResult> = None;
    if end_match.is_empty() {
        // The content grammar didn't reach the closing bracket. Find it
        // by depth counting and mark the leftover range unparsable.
        let Some(close_idx) = find_matching_close(segments, p, ctx) else {
            return MatchResult::empty_at(idx);
        };
        let span_start = after_content;
        if close_idx > span_start {
            unparsable = Some(MatchResult {
                matched_slice: span_start..close_idx,
                matched: Matched::Unparsable {
                    expected: "closing bracket".into(),
                },
                insert_segments: Vec::new(),
                child_matches: Vec::new(),
            });
        }
        end_match = match_grammar(end_id, segments, close_idx, ctx);
        if end_match.is_empty() {
            return MatchResult::empty_at(idx);
        }
    }

    let mut acc = start_match;
    acc.insert_segments
        .push((acc.matched_slice.end, crate::segments::MetaKind::Indent));
    if content_match.has_match() {
        acc = acc.append(content_match);
    }
    if let Some(unparsable) = unparsable {
        acc = acc.append(unparsable);
    }
    acc.insert_segments
        .push((end_match.matched_slice.start, crate::segments::MetaKind::Dedent));
    acc.append(end_match)
}

/// Scan forward from an opening bracket to its matching close.
fn find_matching_close(
    segments: &[Segment],
    open_idx: usize,
    ctx: &ParseContext,
) -> Option<usize> {
    let mut depth = 0i32;
    for (i, seg) in segments.iter().enumerate().skip(open_idx) {
        if ctx.dialect.is_open_bracket(seg) {
            depth += 1;
        } else if ctx.dialect.is_close_bracket(seg) {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Consume tokens up to (not including) the first stop match, bracket
/// aware and trimmed of trailing non-code.
fn greedy_until(
    stops: &[GrammarId],
    segments: &[Segment],
    idx: usize,
    ctx: &mut ParseContext,
) -> MatchResult {
    let mut depth = 0i32;
    let mut p = idx;
    while p < segments.len() {
        let seg = &segments[p];
        if depth == 0 && seg.is_code() {
            let stopped = stops
                .iter()
                .any(|&stop| match_grammar(stop, segments, p, ctx).has_match());
            if stopped {
                break;
            }
        }
        if ctx.dialect.is_open_bracket(seg) {
            depth += 1;
        } else if ctx.dialect.is_close_bracket(seg) {
            depth -= 1;
            if depth < 0 {
                // An unbalanced close belongs to an enclosing scope.
                break;
            }
        }
        p += 1;
    }
    let end = trim_trailing_non_code(segments, idx, p);
    if end > idx {
        MatchResult::from_span(idx..end)
    } else {
        MatchResult::empty_at(idx)
    }
}

/// Shrink `end` back past any trailing non-code segments.
fn trim_trailing_non_code(segments: &[Segment], start: usize, mut end: usize) -> usize {
    while end > start && !segments[end - 1].is_code() {
        end -= 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialects::dialect_by_name;
    use crate::grammar::match_result::Matched;
    use crate::lexer::Lexer;
    use crate::segments::Segment;
    use crate::templater::TemplatedFile;
    use rustc_hash::FxHashSet;
    use std::sync::Arc;

    fn lex(sql: &str) -> Vec<Segment> {
        let dialect = dialect_by_name("ansi").unwrap();
        let tf = Arc::new(TemplatedFile::from_string(sql));
        let (segments, violations) = Lexer::new(dialect.lexer_matchers().to_vec(), true).lex(&tf);
        assert!(violations.is_empty(), "{violations:?}");
        segments
    }

    fn match_named(name: &str, sql: &str) -> (MatchResult, Vec<Segment>) {
        let dialect = dialect_by_name("ansi").unwrap();
        let segments = lex(sql);
        let id = dialect.ref_id(name).unwrap();
        let mut ctx = ParseContext::new(&dialect, FxHashSet::default());
        let result = match_grammar(id, &segments, 0, &mut ctx);
        (result, segments)
    }

    #[test]
    fn test_keyword_parser_case_insensitive() {
        let (result, _) = match_named("SelectClauseSegment", "select 1");
        assert!(result.has_match());
    }

    #[test]
    fn test_sequence_skips_gaps() {
        let (result, segments) = match_named("SelectClauseSegment", "SELECT   a");
        assert!(result.has_match());
        // The span reaches the final identifier despite the wide gap.
        assert_eq!(result.matched_slice.end, segments.len() - 1);
    }

    #[test]
    fn test_one_of_longest_wins() {
        // A function reference is longer than a bare column reference.
        let (result, _) = match_named("Expression_D_Grammar", "count(a)");
        assert!(result.has_match());
        let applied = {
            let dialect = dialect_by_name("ansi").unwrap();
            result.apply(&lex("count(a)"), &dialect)
        };
        assert!(applied.iter().any(|s| s.is_type("function")));
    }

    #[test]
    fn test_delimited_trailing_not_consumed() {
        // Without a following element the delimiter is rewound.
        let dialect = dialect_by_name("ansi").unwrap();
        let segments = lex("a, b,");
        let element = dialect.ref_id("NakedIdentifierSegment").unwrap();
        let delimiter = dialect.ref_id("CommaSegment").unwrap();
        let mut ctx = ParseContext::new(&dialect, FxHashSet::default());
        let result = match_delimited(
            element, delimiter, false, 0, true, &segments, 0, &mut ctx,
        );
        // Matches "a, b" but leaves the dangling comma.
        assert_eq!(segments[result.matched_slice.end].raw(), ",");
    }

    #[test]
    fn test_bracketed_nesting() {
        let (result, segments) = match_named("Expression_D_Grammar", "((a))");
        assert!(result.has_match());
        assert_eq!(result.matched_slice.end, segments.len() - 1);
    }

    #[test]
    fn test_greedy_until_is_bracket_aware() {
        let dialect = dialect_by_name("ansi").unwrap();
        // The FROM inside the brackets must not stop the scan.
        let segments = lex("a (SELECT x FROM t) b FROM c");
        let stop = dialect.ref_id("FromClauseSegment").unwrap();
        let mut ctx = ParseContext::new(&dialect, FxHashSet::default());
        let result = greedy_until(&[stop], &segments, 0, &mut ctx);
        let consumed: String = segments[result.matched_slice.clone()]
            .iter()
            .map(Segment::raw)
            .collect();
        assert_eq!(consumed.trim_end(), "a (SELECT x FROM t) b");
    }

    #[test]
    fn test_unmatched_alternative_is_silent() {
        let (result, _) = match_named("SelectClauseSegment", "UPDATE t");
        assert!(result.is_empty());
    }

    #[test]
    fn test_meta_insertion_in_sequence() {
        let (result, _) = match_named("SelectClauseSegment", "SELECT a");
        assert!(result.has_match());
        fn count_inserts(m: &MatchResult) -> usize {
            m.insert_segments.len() + m.child_matches.iter().map(count_inserts).sum::<usize>()
        }
        // At least the indent and dedent hints.
        assert!(count_inserts(&result) >= 2);
    }

    #[test]
    fn test_node_match_wraps() {
        let (result, _) = match_named("SelectClauseSegment", "SELECT a");
        assert!(matches!(result.matched, Matched::Node(_)));
    }

    #[test]
    fn test_anything_and_nothing() {
        use crate::dialects::{RegistryEntry, ansi_dialect_kit};
        use crate::grammar::{g_anything, g_nothing};
        let mut kit = ansi_dialect_kit().unwrap().copy_as("universal");
        kit.grammar("UniversalGrammar", g_anything()).unwrap();
        kit.grammar("RejectGrammar", g_nothing()).unwrap();
        // Keep the registry honest about replace vs add.
        assert!(
            kit.add("UniversalGrammar", RegistryEntry::Grammar(g_anything()))
                .is_err()
        );
        let dialect = kit.expand().unwrap();
        let segments = lex("a b c");
        let mut ctx = ParseContext::new(&dialect, FxHashSet::default());
        let universal = dialect.ref_id("UniversalGrammar").unwrap();
        let result = match_grammar(universal, &segments, 0, &mut ctx);
        assert_eq!(result.matched_slice, 0..5);
        let reject = dialect.ref_id("RejectGrammar").unwrap();
        assert!(match_grammar(reject, &segments, 0, &mut ctx).is_empty());
    }

    #[test]
    fn test_recursion_limit_is_diagnostic_not_fault() {
        let dialect = dialect_by_name("ansi").unwrap();
        let segments = lex("SELECT a");
        let id = dialect.ref_id("SelectClauseSegment").unwrap();
        let mut ctx = ParseContext::new(&dialect, FxHashSet::default()).with_max_depth(2);
        let result = match_grammar(id, &segments, 0, &mut ctx);
        assert!(result.is_empty());
        assert!(ctx.depth_was_exceeded());
    }
}
