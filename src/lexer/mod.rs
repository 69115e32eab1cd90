//! The lexer: raw string → flat sequence of typed leaf segments.
//!
//! Matchers are tried in declared order against the front of the
//! remaining string; the first match wins. A last-resort matcher
//! guarantees progress by consuming an unlexable run and emitting a
//! diagnostic. The lexer never drops input: whitespace and comments are
//! emitted as leaves, and zero-width template material becomes
//! placeholder metas.

use std::ops::Range;
use std::sync::Arc;

use regex::Regex;
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::base::PositionMarker;
use crate::base::slices::{is_zero_slice, offset_slice};
use crate::errors::{Severity, Violation};
use crate::segments::{LeafKind, Segment, dedent, end_of_file, indent, placeholder};
use crate::templater::{SliceType, TemplatedFile, TemplatedFileSlice};

/// How a matcher recognises a prefix.
#[derive(Debug, Clone)]
enum Pattern {
    /// Exact prefix match.
    Literal(String),
    /// Regex anchored at the start of the remaining string.
    Regex(Regex),
}

/// A single lexer matcher: a named pattern producing typed leaves.
#[derive(Debug, Clone)]
pub struct Matcher {
    name: SmolStr,
    pattern: Pattern,
    seg_type: SmolStr,
    kind: LeafKind,
    /// Split a match around an inner matcher (e.g. newlines inside
    /// block comments), so downstream layout sees the pieces.
    subdivider: Option<Box<Matcher>>,
    /// After subdivision, trim leading/trailing inner matches off each
    /// piece (e.g. trailing newlines on inline comments).
    trim_post_subdivide: Option<Box<Matcher>>,
    /// Characters stripped from each end for trimmed-raw access.
    trim_chars: Vec<char>,
}

impl Matcher {
    pub fn literal(
        name: &str,
        template: &str,
        seg_type: &str,
        kind: LeafKind,
    ) -> Self {
        Self {
            name: SmolStr::new(name),
            pattern: Pattern::Literal(template.to_string()),
            seg_type: SmolStr::new(seg_type),
            kind,
            subdivider: None,
            trim_post_subdivide: None,
            trim_chars: Vec::new(),
        }
    }

    /// Build a regex matcher. The pattern is anchored at the start of
    /// the remaining string and `.` matches newlines.
    ///
    /// # Panics
    /// Panics if the pattern is invalid; matcher sets are static dialect
    /// definitions, so this is a programming error, caught by tests.
    pub fn regex(name: &str, pattern: &str, seg_type: &str, kind: LeafKind) -> Self {
        let compiled = Regex::new(&format!(r"(?s)\A(?:{pattern})"))
            .unwrap_or_else(|e| panic!("invalid lexer pattern {name:?}: {e}"));
        Self {
            name: SmolStr::new(name),
            pattern: Pattern::Regex(compiled),
            seg_type: SmolStr::new(seg_type),
            kind,
            subdivider: None,
            trim_post_subdivide: None,
            trim_chars: Vec::new(),
        }
    }

    pub fn with_subdivider(mut self, sub: Matcher) -> Self {
        self.subdivider = Some(Box::new(sub));
        self
    }

    pub fn with_trim_post_subdivide(mut self, trim: Matcher) -> Self {
        self.trim_post_subdivide = Some(Box::new(trim));
        self
    }

    pub fn with_trim_chars(mut self, chars: &[char]) -> Self {
        self.trim_chars = chars.to_vec();
        self
    }

    pub fn name(&self) -> &SmolStr {
        &self.name
    }

    /// Length of the prefix this matcher consumes, or `None`.
    fn match_len(&self, forward: &str) -> Option<usize> {
        match &self.pattern {
            Pattern::Literal(template) => {
                forward.starts_with(template.as_str()).then(|| template.len())
            }
            Pattern::Regex(re) => re.find(forward).map(|m| m.end()).filter(|&l| l > 0),
        }
    }

    /// Find the first occurrence anywhere in the string (for subdivision).
    fn search(&self, haystack: &str) -> Option<Range<usize>> {
        match &self.pattern {
            Pattern::Literal(template) => haystack
                .find(template.as_str())
                .map(|loc| loc..loc + template.len()),
            Pattern::Regex(re) => {
                // Strip the anchor by scanning successive suffixes.
                for (idx, _) in haystack.char_indices() {
                    if let Some(m) = re.find(&haystack[idx..]) {
                        if m.start() == 0 && m.end() > 0 {
                            return Some(idx..idx + m.end());
                        }
                    }
                }
                None
            }
        }
    }

    /// Match the front of `forward`, returning lexed elements.
    fn match_forward<'a>(&'a self, forward: &'a str) -> Vec<LexedElement<'a>> {
        match self.match_len(forward) {
            Some(len) => self.subdivide(&forward[..len]),
            None => Vec::new(),
        }
    }

    fn subdivide<'a>(&'a self, matched: &'a str) -> Vec<LexedElement<'a>> {
        let Some(sub) = &self.subdivider else {
            return vec![LexedElement {
                raw: matched,
                matcher: self,
            }];
        };
        let mut elements = Vec::new();
        let mut buf = matched;
        let mut offset = 0;
        while !buf.is_empty() {
            match sub.search(buf) {
                Some(div) => {
                    elements.extend(self.trim_match(&matched[offset..offset + div.start]));
                    elements.push(LexedElement {
                        raw: &matched[offset + div.start..offset + div.end],
                        matcher: sub,
                    });
                    offset += div.end;
                    buf = &matched[offset..];
                }
                None => {
                    elements.extend(self.trim_match(buf));
                    break;
                }
            }
        }
        elements
    }

    fn trim_match<'a>(&'a self, piece: &'a str) -> Vec<LexedElement<'a>> {
        if piece.is_empty() {
            return Vec::new();
        }
        let Some(trim) = &self.trim_post_subdivide else {
            return vec![LexedElement {
                raw: piece,
                matcher: self,
            }];
        };
        let mut elements = Vec::new();
        let mut start = 0;
        let mut end = piece.len();
        // Leading trims.
        while start < end {
            match trim.search(&piece[start..end]) {
                Some(r) if r.start == 0 => {
                    elements.push(LexedElement {
                        raw: &piece[start..start + r.end],
                        matcher: trim,
                    });
                    start += r.end;
                }
                _ => break,
            }
        }
        // Trailing trim.
        let mut trailing = Vec::new();
        if start < end {
            if let Some(r) = trim.search(&piece[start..end]) {
                if start + r.end == end {
                    trailing.push(LexedElement {
                        raw: &piece[start + r.start..end],
                        matcher: trim,
                    });
                    end = start + r.start;
                }
            }
        }
        if start < end {
            elements.push(LexedElement {
                raw: &piece[start..end],
                matcher: self,
            });
        }
        elements.extend(trailing);
        elements
    }

    /// Construct a leaf segment from a matched raw.
    fn construct_segment(&self, raw: &str, marker: PositionMarker) -> Segment {
        let mut seg = Segment::leaf(
            self.seg_type.clone(),
            raw,
            self.kind.clone(),
            Some(marker),
        );
        if self.name != self.seg_type {
            seg = seg.with_instance_types(vec![self.name.clone()]);
        }
        if !self.trim_chars.is_empty() {
            seg = seg.with_trim_chars(&self.trim_chars);
        }
        seg
    }
}

/// An element matched during lexing, before positions are assigned.
#[derive(Debug, Clone, Copy)]
struct LexedElement<'a> {
    raw: &'a str,
    matcher: &'a Matcher,
}

/// A lexed element bundled with its slice in the templated file.
#[derive(Debug, Clone)]
struct TemplateElement<'a> {
    raw: &'a str,
    template_slice: Range<usize>,
    matcher: &'a Matcher,
}

impl<'a> TemplateElement<'a> {
    fn to_segment(&self, marker: PositionMarker, subslice: Option<Range<usize>>) -> Segment {
        let raw = match subslice {
            Some(r) => &self.raw[r],
            None => self.raw,
        };
        self.matcher.construct_segment(raw, marker)
    }
}

/// The lexer: walks the templated string with the dialect's matcher list.
pub struct Lexer {
    matchers: Vec<Matcher>,
    last_resort: Matcher,
    template_blocks_indent: bool,
}

impl Lexer {
    pub fn new(matchers: Vec<Matcher>, template_blocks_indent: bool) -> Self {
        Self {
            matchers,
            last_resort: Matcher::regex(
                "unlexable",
                r"[^\t\n ]*",
                "unlexable",
                LeafKind::Code,
            ),
            template_blocks_indent,
        }
    }

    /// Lex a templated file into leaf segments plus any `LXR` diagnostics.
    pub fn lex(&self, templated_file: &Arc<TemplatedFile>) -> (Vec<Segment>, Vec<Violation>) {
        let input = templated_file.templated_str();
        debug!(len = input.len(), "lexing templated string");

        // Phase 1: split the whole string into lexed elements.
        let mut elements: Vec<LexedElement<'_>> = Vec::new();
        let mut cursor = 0;
        'outer: while cursor < input.len() {
            let forward = &input[cursor..];
            for matcher in &self.matchers {
                let matched = matcher.match_forward(forward);
                if !matched.is_empty() {
                    cursor += matched.iter().map(|e| e.raw.len()).sum::<usize>();
                    elements.extend(matched);
                    continue 'outer;
                }
            }
            // Nothing matched: fall back to the unlexable matcher, or a
            // single character if even that fails to advance.
            let matched = self.last_resort.match_forward(forward);
            if matched.is_empty() {
                let char_len = forward.chars().next().map_or(1, char::len_utf8);
                elements.push(LexedElement {
                    raw: &forward[..char_len],
                    matcher: &self.last_resort,
                });
                cursor += char_len;
            } else {
                cursor += matched.iter().map(|e| e.raw.len()).sum::<usize>();
                elements.extend(matched);
            }
        }

        // Phase 2: assign templated slices.
        let mut idx = 0;
        let templated: Vec<TemplateElement<'_>> = elements
            .into_iter()
            .map(|e| {
                let slice = offset_slice(idx, e.raw.len());
                idx += e.raw.len();
                TemplateElement {
                    raw: e.raw,
                    template_slice: slice,
                    matcher: e.matcher,
                }
            })
            .collect();

        // Phase 3: map to source positions, inserting template metas.
        let mut segments = self.elements_to_segments(&templated, templated_file);

        // Close with an end-of-file meta.
        let eof_marker = segments
            .last()
            .and_then(|s| s.marker())
            .map(PositionMarker::end_point_marker)
            .unwrap_or_else(|| PositionMarker::from_point(0, 0, templated_file.clone()));
        segments.push(end_of_file(Some(eof_marker)));

        let violations = violations_from_segments(&segments);
        (segments, violations)
    }

    /// Walk lexed elements against the templated slice map, assigning
    /// source slices and emitting placeholder metas for zero-width
    /// template material.
    fn elements_to_segments(
        &self,
        elements: &[TemplateElement<'_>],
        tf: &Arc<TemplatedFile>,
    ) -> Vec<Segment> {
        let slices = tf.sliced_file();
        let mut out: Vec<Segment> = Vec::with_capacity(elements.len());
        let mut tfs_idx = 0;
        let mut block_depth = 0usize;

        for element in elements {
            trace!(raw = element.raw, slice = ?element.template_slice, "mapping element");
            // How much of this element has already been consumed, and a
            // stashed source start for segments which span slices.
            let mut consumed = 0usize;
            let mut stashed_source_idx: Option<usize> = None;

            while tfs_idx < slices.len() {
                let tfs = &slices[tfs_idx];

                if is_zero_slice(&tfs.templated_slice) {
                    self.handle_zero_length_slice(tfs, tf, &mut block_depth, &mut out);
                    tfs_idx += 1;
                    continue;
                }

                match tfs.slice_type {
                    SliceType::Literal => {
                        let offset =
                            tfs.source_slice.start as isize - tfs.templated_slice.start as isize;
                        if element.template_slice.end <= tfs.templated_slice.end {
                            // Whole element fits in this literal slice.
                            let slice_start = stashed_source_idx.unwrap_or_else(|| {
                                (element.template_slice.start as isize + consumed as isize + offset)
                                    as usize
                            });
                            let source_slice = slice_start
                                ..(element.template_slice.end as isize + offset) as usize;
                            out.push(element.to_segment(
                                PositionMarker::new(
                                    source_slice,
                                    element.template_slice.clone(),
                                    tf.clone(),
                                ),
                                Some(consumed..element.raw.len()),
                            ));
                            if element.template_slice.end == tfs.templated_slice.end {
                                tfs_idx += 1;
                            }
                            break;
                        } else if element.matcher.name() == "whitespace" {
                            // Whitespace can split across slices.
                            let through = tfs.templated_slice.end - element.template_slice.start;
                            let source_slice = (element.template_slice.start as isize
                                + consumed as isize
                                + offset) as usize
                                ..(tfs.templated_slice.end as isize + offset) as usize;
                            out.push(element.to_segment(
                                PositionMarker::new(
                                    source_slice,
                                    element.template_slice.clone(),
                                    tf.clone(),
                                ),
                                Some(consumed..through),
                            ));
                            consumed = through;
                            tfs_idx += 1;
                            continue;
                        } else {
                            // Element spills over this literal slice; stash
                            // the source start and widen later.
                            if stashed_source_idx.is_none() {
                                stashed_source_idx = Some(
                                    (element.template_slice.start as isize + offset) as usize,
                                );
                            }
                            tfs_idx += 1;
                            continue;
                        }
                    }
                    SliceType::Templated | SliceType::BlockStart | SliceType::Escaped => {
                        if tfs.slice_type == SliceType::BlockStart {
                            block_depth += 1;
                        }
                        if element.template_slice.end <= tfs.templated_slice.end {
                            // The element is contained; its source slice is
                            // the whole span of the enclosing tag.
                            let slice_start = stashed_source_idx
                                .unwrap_or(tfs.source_slice.start + consumed);
                            out.push(element.to_segment(
                                PositionMarker::new(
                                    slice_start..tfs.source_slice.end,
                                    element.template_slice.clone(),
                                    tf.clone(),
                                ),
                                Some(consumed..element.raw.len()),
                            ));
                            if element.template_slice.end == tfs.templated_slice.end {
                                tfs_idx += 1;
                            }
                            break;
                        } else {
                            if stashed_source_idx.is_none() {
                                stashed_source_idx = Some(tfs.source_slice.start);
                            }
                            tfs_idx += 1;
                            continue;
                        }
                    }
                    // Source-only kinds always have zero templated width,
                    // handled above.
                    _ => {
                        tfs_idx += 1;
                        continue;
                    }
                }
            }
        }

        // Any remaining slices are zero length; emit their placeholders.
        while tfs_idx < slices.len() {
            let tfs = &slices[tfs_idx];
            if is_zero_slice(&tfs.templated_slice) {
                self.handle_zero_length_slice(tfs, tf, &mut block_depth, &mut out);
            }
            tfs_idx += 1;
        }

        out
    }

    /// Zero-width templated slices become placeholder metas, with indent
    /// hints around block tags when configured.
    fn handle_zero_length_slice(
        &self,
        tfs: &TemplatedFileSlice,
        tf: &Arc<TemplatedFile>,
        block_depth: &mut usize,
        out: &mut Vec<Segment>,
    ) {
        let start_marker = PositionMarker::from_point(
            tfs.source_slice.start,
            tfs.templated_slice.start,
            tf.clone(),
        );
        let source_str = &tf.source_str()[tfs.source_slice.clone()];

        if tfs.slice_type.is_block() {
            if tfs.slice_type == SliceType::BlockStart {
                *block_depth += 1;
            } else if self.template_blocks_indent {
                out.push(dedent(Some(start_marker.clone())));
            }
            out.push(placeholder(
                source_str,
                tfs.slice_type.as_str(),
                Some(PositionMarker::new(
                    tfs.source_slice.clone(),
                    tfs.templated_slice.clone(),
                    tf.clone(),
                )),
            ));
            if tfs.slice_type == SliceType::BlockEnd {
                *block_depth = block_depth.saturating_sub(1);
            } else if self.template_blocks_indent {
                out.push(indent(Some(PositionMarker::from_point(
                    tfs.source_slice.end,
                    tfs.templated_slice.end,
                    tf.clone(),
                ))));
            }
        } else {
            out.push(placeholder(
                source_str,
                tfs.slice_type.as_str(),
                Some(PositionMarker::new(
                    tfs.source_slice.clone(),
                    tfs.templated_slice.clone(),
                    tf.clone(),
                )),
            ));
        }
    }
}

/// Generate `LXR` diagnostics for any unlexable segments.
fn violations_from_segments(segments: &[Segment]) -> Vec<Violation> {
    segments
        .iter()
        .filter(|s| s.is_type("unlexable"))
        .map(|s| {
            let (line, col) = s
                .marker()
                .map(PositionMarker::source_position)
                .unwrap_or((1, 1));
            let char_pos = s.marker().map(|m| m.source_slice.start).unwrap_or(0);
            let raw = s.raw();
            let preview = if raw.chars().count() > 9 {
                format!("{}...", raw.chars().take(9).collect::<String>())
            } else {
                raw.to_string()
            };
            Violation::new(
                "LXR",
                "lexer.unlexable",
                format!("Unable to lex characters: {preview:?}"),
                (line, col, char_pos),
            )
            .with_severity(Severity::Error)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templater::{RawFileSlice, TemplatedFileSlice};

    fn test_matchers() -> Vec<Matcher> {
        vec![
            Matcher::regex("whitespace", r"[^\S\r\n]+", "whitespace", LeafKind::Whitespace),
            Matcher::regex(
                "inline_comment",
                r"(--|#)[^\n]*",
                "inline_comment",
                LeafKind::Comment,
            ),
            Matcher::regex("newline", r"\r\n|\n", "newline", LeafKind::Newline),
            Matcher::regex("word", r"[0-9a-zA-Z_]+", "word", LeafKind::Code),
            Matcher::literal("comma", ",", "comma", LeafKind::Code),
            Matcher::regex("code", r"[^\s]", "code", LeafKind::Code),
        ]
    }

    fn lex_raw(input: &str) -> (Vec<Segment>, Vec<Violation>) {
        let tf = Arc::new(TemplatedFile::from_string(input));
        Lexer::new(test_matchers(), true).lex(&tf)
    }

    #[test]
    fn test_lex_simple_select() {
        let (segments, violations) = lex_raw("SELECT a, b\n");
        assert!(violations.is_empty());
        let raws: Vec<&str> = segments.iter().map(|s| s.raw()).collect();
        assert_eq!(raws, vec!["SELECT", " ", "a", ",", " ", "b", "\n", ""]);
        assert_eq!(segments.last().unwrap().seg_type(), "end_of_file");
    }

    #[test]
    fn test_lossless_concatenation() {
        let input = "SELECT a , b FROM foo -- note\n";
        let (segments, _) = lex_raw(input);
        let rebuilt: String = segments.iter().map(Segment::raw).collect();
        assert_eq!(rebuilt, input);
    }

    #[test]
    fn test_marker_coherence() {
        let input = "SELECT a,b\n";
        let (segments, _) = lex_raw(input);
        for seg in &segments {
            let marker = seg.marker().expect("lexed leaf must carry a marker");
            assert_eq!(
                &input[marker.templated_slice.clone()],
                seg.raw(),
                "templated slice must reproduce the raw"
            );
        }
    }

    #[test]
    fn test_comment_classified() {
        let (segments, _) = lex_raw("a -- trailing\n");
        assert!(segments.iter().any(|s| s.is_comment()));
    }

    #[test]
    fn test_templated_region_widens_source_slice() {
        // Source: SELECT {{ col }} FROM t / Templated: SELECT my_col FROM t
        let source = "SELECT {{ col }} FROM t";
        let templated = "SELECT my_col FROM t";
        let tf = Arc::new(
            TemplatedFile::new(
                source.to_string(),
                "t.sql",
                Some(templated.to_string()),
                Some(vec![
                    TemplatedFileSlice::new(SliceType::Literal, 0..7, 0..7),
                    TemplatedFileSlice::new(SliceType::Templated, 7..16, 7..13),
                    TemplatedFileSlice::new(SliceType::Literal, 16..23, 13..20),
                ]),
                Some(vec![
                    RawFileSlice::new("SELECT ", SliceType::Literal, 0),
                    RawFileSlice::new("{{ col }}", SliceType::Templated, 7),
                    RawFileSlice::new(" FROM t", SliceType::Literal, 16),
                ]),
            )
            .unwrap(),
        );
        let (segments, violations) = Lexer::new(test_matchers(), true).lex(&tf);
        assert!(violations.is_empty());
        let rendered = segments
            .iter()
            .find(|s| s.raw() == "my_col")
            .expect("rendered token present");
        // The source slice covers the whole tag.
        assert_eq!(rendered.marker().unwrap().source_slice, 7..16);
        assert!(!rendered.marker().unwrap().is_literal());
        // Literal tokens map linearly.
        let from = segments.iter().find(|s| s.raw() == "FROM").unwrap();
        assert_eq!(from.marker().unwrap().source_slice, 17..21);
        assert!(from.marker().unwrap().is_literal());
    }

    #[test]
    fn test_zero_width_slice_yields_placeholder() {
        // A comment tag renders to nothing.
        let source = "{# hi #}SELECT 1";
        let templated = "SELECT 1";
        let tf = Arc::new(
            TemplatedFile::new(
                source.to_string(),
                "t.sql",
                Some(templated.to_string()),
                Some(vec![
                    TemplatedFileSlice::new(SliceType::Comment, 0..8, 0..0),
                    TemplatedFileSlice::new(SliceType::Literal, 8..16, 0..8),
                ]),
                Some(vec![
                    RawFileSlice::new("{# hi #}", SliceType::Comment, 0),
                    RawFileSlice::new("SELECT 1", SliceType::Literal, 8),
                ]),
            )
            .unwrap(),
        );
        let (segments, _) = Lexer::new(test_matchers(), true).lex(&tf);
        assert_eq!(segments[0].seg_type(), "placeholder");
        assert_eq!(segments[0].raw(), "");
    }

    #[test]
    fn test_block_tags_add_indents() {
        // {% if x %}SELECT 1{% endif %} with both tags zero-width.
        let source = "{% if x %}SELECT 1{% endif %}";
        let templated = "SELECT 1";
        let tf = Arc::new(
            TemplatedFile::new(
                source.to_string(),
                "t.sql",
                Some(templated.to_string()),
                Some(vec![
                    TemplatedFileSlice::new(SliceType::BlockStart, 0..10, 0..0),
                    TemplatedFileSlice::new(SliceType::Literal, 10..18, 0..8),
                    TemplatedFileSlice::new(SliceType::BlockEnd, 18..29, 8..8),
                ]),
                Some(vec![
                    RawFileSlice::new("{% if x %}", SliceType::BlockStart, 0),
                    RawFileSlice::new("SELECT 1", SliceType::Literal, 10),
                    RawFileSlice::new("{% endif %}", SliceType::BlockEnd, 18),
                ]),
            )
            .unwrap(),
        );
        let (segments, _) = Lexer::new(test_matchers(), true).lex(&tf);
        let types: Vec<&str> = segments.iter().map(|s| s.seg_type().as_str()).collect();
        assert!(types.contains(&"placeholder"));
        assert!(types.contains(&"indent"));
        assert!(types.contains(&"dedent"));
    }

    #[test]
    fn test_unlexable_emits_violation_and_consumes() {
        let matchers = vec![Matcher::regex(
            "word",
            r"[a-z]+",
            "word",
            LeafKind::Code,
        )];
        let tf = Arc::new(TemplatedFile::from_string("abc £££ def"));
        let (segments, violations) = Lexer::new(matchers, true).lex(&tf);
        assert!(!violations.is_empty());
        assert_eq!(violations[0].code, "LXR");
        // Input is still fully covered.
        let rebuilt: String = segments.iter().map(Segment::raw).collect();
        assert_eq!(rebuilt, "abc £££ def");
    }

    #[test]
    fn test_block_comment_subdivided_by_newline() {
        let matchers = vec![
            Matcher::regex("whitespace", r"[^\S\r\n]+", "whitespace", LeafKind::Whitespace),
            Matcher::regex(
                "block_comment",
                r"\/\*([^\*]|\*(?!\/))*\*\/",
                "block_comment",
                LeafKind::Comment,
            )
            .with_subdivider(Matcher::regex(
                "newline",
                r"\r\n|\n",
                "newline",
                LeafKind::Newline,
            )),
            Matcher::regex("newline", r"\r\n|\n", "newline", LeafKind::Newline),
            Matcher::regex("word", r"[0-9a-zA-Z_]+", "word", LeafKind::Code),
        ];
        let tf = Arc::new(TemplatedFile::from_string("/* a\nb */ x"));
        let (segments, _) = Lexer::new(matchers, true).lex(&tf);
        let rebuilt: String = segments.iter().map(Segment::raw).collect();
        assert_eq!(rebuilt, "/* a\nb */ x");
        // The newline inside the comment is its own segment.
        assert!(
            segments
                .iter()
                .any(|s| s.seg_type() == "newline" && s.raw() == "\n")
        );
    }
}
