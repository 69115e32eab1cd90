//! The templated file model.
//!
//! Templating happens *before* the core sees a file: a templater expands
//! the source string into the templated string the lexer consumes, and
//! records how slices of one map onto slices of the other. The core
//! needs that map in both directions - forwards to assign source
//! positions while lexing, backwards to apply fixes to the true source.
//!
//! Templater implementations themselves (Jinja, dbt, ...) are external
//! collaborators; only the pass-through [`RawTemplater`] lives here.

mod patch;

use std::ops::Range;

use tracing::debug;

use crate::base::LineIndex;
use crate::base::slices::{is_zero_slice, zero_slice};
use crate::config::LintConfig;
use crate::errors::{CoreError, Violation};

pub use patch::TemplatedEdit;

/// The kind of a templated or raw file slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceType {
    Literal,
    Templated,
    BlockStart,
    BlockEnd,
    BlockMid,
    Escaped,
    Comment,
}

impl SliceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Literal => "literal",
            Self::Templated => "templated",
            Self::BlockStart => "block_start",
            Self::BlockEnd => "block_end",
            Self::BlockMid => "block_mid",
            Self::Escaped => "escaped",
            Self::Comment => "comment",
        }
    }

    /// Block tags (`{% ... %}`) in any position.
    pub fn is_block(&self) -> bool {
        matches!(self, Self::BlockStart | Self::BlockEnd | Self::BlockMid)
    }

    /// Does this slice kind only ever appear in the *source*?
    pub fn is_source_only(&self) -> bool {
        matches!(
            self,
            Self::BlockStart | Self::BlockEnd | Self::BlockMid | Self::Comment
        )
    }
}

/// A slice of the raw (source) file, as carved up by the templater.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFileSlice {
    /// The source text of this slice.
    pub raw: String,
    pub slice_type: SliceType,
    /// Offset from the beginning of the source string.
    pub source_idx: usize,
    /// Block nesting index, incremented on start/end tags.
    pub block_idx: usize,
}

impl RawFileSlice {
    pub fn new(raw: impl Into<String>, slice_type: SliceType, source_idx: usize) -> Self {
        Self {
            raw: raw.into(),
            slice_type,
            source_idx,
            block_idx: 0,
        }
    }

    pub fn end_source_idx(&self) -> usize {
        self.source_idx + self.raw.len()
    }

    pub fn source_slice(&self) -> Range<usize> {
        self.source_idx..self.end_source_idx()
    }
}

/// A slice of the templated file, mapped back to its source slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatedFileSlice {
    pub slice_type: SliceType,
    pub source_slice: Range<usize>,
    pub templated_slice: Range<usize>,
}

impl TemplatedFileSlice {
    pub fn new(
        slice_type: SliceType,
        source_slice: Range<usize>,
        templated_slice: Range<usize>,
    ) -> Self {
        Self {
            slice_type,
            source_slice,
            templated_slice,
        }
    }
}

/// A templated SQL file: the source string, the templated string, and the
/// slice maps between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatedFile {
    source_str: String,
    templated_str: String,
    name: String,
    sliced_file: Vec<TemplatedFileSlice>,
    raw_sliced: Vec<RawFileSlice>,
    source_newlines: LineIndex,
    templated_newlines: LineIndex,
}

impl TemplatedFile {
    /// Construct a templated file, validating slice consistency.
    pub fn new(
        source_str: String,
        name: impl Into<String>,
        templated_str: Option<String>,
        sliced_file: Option<Vec<TemplatedFileSlice>>,
        raw_sliced: Option<Vec<RawFileSlice>>,
    ) -> Result<Self, CoreError> {
        let templated_str = templated_str.unwrap_or_else(|| source_str.clone());

        let (sliced_file, raw_sliced) = match (sliced_file, raw_sliced) {
            (None, None) => {
                if templated_str != source_str {
                    return Err(CoreError::Templating(
                        "cannot instantiate a templated file unsliced".into(),
                    ));
                }
                (
                    vec![TemplatedFileSlice::new(
                        SliceType::Literal,
                        0..source_str.len(),
                        0..source_str.len(),
                    )],
                    vec![RawFileSlice::new(
                        source_str.clone(),
                        SliceType::Literal,
                        0,
                    )],
                )
            }
            (Some(sliced), Some(raw)) => (sliced, raw),
            _ => {
                return Err(CoreError::Templating(
                    "sliced_file and raw_sliced must be provided together".into(),
                ));
            }
        };

        // Consistency check raw slices against the source string.
        let mut pos = 0;
        for rfs in &raw_sliced {
            if rfs.source_idx != pos {
                return Err(CoreError::Templating(format!(
                    "raw slices non-contiguous at source index {pos}"
                )));
            }
            pos += rfs.raw.len();
        }
        if pos != source_str.len() {
            return Err(CoreError::Templating(format!(
                "raw slices cover {pos} of {} source characters",
                source_str.len()
            )));
        }

        // Consistency check templated slices for contiguity.
        let mut expected = 0;
        for tfs in &sliced_file {
            if tfs.templated_slice.start != expected {
                return Err(CoreError::Templating(format!(
                    "templated slices non-contiguous at {expected} (found {:?})",
                    tfs.templated_slice
                )));
            }
            expected = tfs.templated_slice.end;
        }
        if expected != templated_str.len() {
            return Err(CoreError::Templating(format!(
                "templated slices cover {expected} of {} templated characters",
                templated_str.len()
            )));
        }

        let source_newlines = LineIndex::new(&source_str);
        let templated_newlines = LineIndex::new(&templated_str);

        Ok(Self {
            source_str,
            templated_str,
            name: name.into(),
            sliced_file,
            raw_sliced,
            source_newlines,
            templated_newlines,
        })
    }

    /// A trivially-templated file: templated and source views are equal.
    pub fn from_string(raw: &str) -> Self {
        // A single literal slice can never fail the consistency checks.
        Self::new(raw.to_string(), "<string>", None, None, None)
            .unwrap_or_else(|_| unreachable!("untemplated file is always consistent"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_str(&self) -> &str {
        &self.source_str
    }

    pub fn templated_str(&self) -> &str {
        &self.templated_str
    }

    pub fn sliced_file(&self) -> &[TemplatedFileSlice] {
        &self.sliced_file
    }

    pub fn raw_sliced(&self) -> &[RawFileSlice] {
        &self.raw_sliced
    }

    /// `(line, column)` of a character position, 1-indexed, in either the
    /// source (`source = true`) or the templated file.
    pub fn get_line_pos_of_char_pos(&self, char_pos: usize, source: bool) -> (usize, usize) {
        if source {
            self.source_newlines.line_col(char_pos)
        } else {
            self.templated_newlines.line_col(char_pos)
        }
    }

    /// Find the range of `sliced_file` indices which touch `templated_pos`.
    ///
    /// The returned end index is exclusive.
    fn find_slice_indices_of_templated_pos(
        &self,
        templated_pos: usize,
        inclusive: bool,
    ) -> Option<(usize, usize)> {
        let mut first_idx: Option<usize> = None;
        let mut last_idx = 0;
        let mut broke = false;
        for (idx, elem) in self.sliced_file.iter().enumerate() {
            last_idx = idx;
            if elem.templated_slice.end >= templated_pos {
                if first_idx.is_none() {
                    first_idx = Some(idx);
                }
                if elem.templated_slice.start > templated_pos
                    || (!inclusive && elem.templated_slice.start >= templated_pos)
                {
                    broke = true;
                    break;
                }
            }
        }
        if !broke {
            last_idx += 1;
        }
        first_idx.map(|first| (first, last_idx))
    }

    /// Convert a templated slice to a source slice.
    ///
    /// For a purely literal range this is a linear offset; any range
    /// containing a non-literal slice returns the minimal source slice
    /// enclosing all involved source slices.
    pub fn templated_slice_to_source_slice(&self, template_slice: &Range<usize>) -> Range<usize> {
        if self.sliced_file.is_empty() {
            return template_slice.clone();
        }

        let Some((start_first, start_last)) =
            self.find_slice_indices_of_templated_pos(template_slice.start, true)
        else {
            // Past the end of the file; clamp to the final source position.
            let end = self.source_str.len();
            return end..end;
        };

        let start_subsliced = &self.sliced_file[start_first..start_last];

        // Work out the insertion point: the lowest source position of any
        // slice boundary exactly at the start of the templated slice.
        let mut insertion_point: Option<usize> = None;
        for elem in start_subsliced {
            for (t_bound, s_bound) in [
                (elem.templated_slice.start, elem.source_slice.start),
                (elem.templated_slice.end, elem.source_slice.end),
            ] {
                if t_bound == template_slice.start
                    && insertion_point.is_none_or(|p| s_bound < p)
                {
                    insertion_point = Some(s_bound);
                }
            }
        }

        // Zero length slice.
        if is_zero_slice(template_slice) {
            if let Some(point) = insertion_point {
                return zero_slice(point);
            }
            if let Some(first) = start_subsliced.first() {
                if first.slice_type == SliceType::Literal {
                    let offset = template_slice.start - first.templated_slice.start;
                    return zero_slice(first.source_slice.start + offset);
                }
                // A point inside a templated section; widen to the tag.
                return first.source_slice.clone();
            }
            return zero_slice(self.source_str.len());
        }

        // A slice with length: find the stop non-inclusively.
        let (stop_first, stop_last) = self
            .find_slice_indices_of_templated_pos(template_slice.end, false)
            .unwrap_or((self.sliced_file.len() - 1, self.sliced_file.len()));

        // If we found an insertion point, walk the start index forward to
        // the slice which actually starts there.
        let mut start_first = start_first;
        if let Some(point) = insertion_point {
            for elem in &self.sliced_file[start_first..] {
                if elem.source_slice.start != point {
                    start_first += 1;
                } else {
                    break;
                }
            }
        }

        let subslices = &self.sliced_file
            [start_first.min(stop_first)..start_last.max(stop_last).min(self.sliced_file.len())];

        let start_slices = if start_first < start_last {
            &self.sliced_file[start_first..start_last]
        } else {
            std::slice::from_ref(&self.sliced_file[start_first.min(self.sliced_file.len() - 1)])
        };
        let stop_slices = if stop_first < stop_last {
            &self.sliced_file[stop_first..stop_last]
        } else {
            std::slice::from_ref(&self.sliced_file[stop_first.min(self.sliced_file.len() - 1)])
        };

        // If either end is literal we can be exact; otherwise be greedy.
        let source_start = if let Some(point) = insertion_point {
            point
        } else {
            let first = &start_slices[0];
            if first.slice_type == SliceType::Literal {
                first.source_slice.start + (template_slice.start - first.templated_slice.start)
            } else {
                first.source_slice.start
            }
        };
        let last = &stop_slices[stop_slices.len() - 1];
        let source_stop = if last.slice_type == SliceType::Literal {
            last.source_slice.end - (last.templated_slice.end - template_slice.end)
        } else {
            last.source_slice.end
        };

        if source_start > source_stop {
            // Templating reordered things; take the widest possible span.
            let min = subslices
                .iter()
                .map(|e| e.source_slice.start)
                .min()
                .unwrap_or(source_stop);
            let max = subslices
                .iter()
                .map(|e| e.source_slice.end)
                .max()
                .unwrap_or(source_start);
            return min..max;
        }

        source_start..source_stop
    }

    /// Convert a source slice to a templated slice.
    ///
    /// The inverse of [`Self::templated_slice_to_source_slice`], used when
    /// applying source-text fixes. Literal ranges map linearly; ranges
    /// touching any non-literal slice return the minimal enclosing
    /// templated span.
    pub fn source_slice_to_templated_slice(&self, source_slice: &Range<usize>) -> Range<usize> {
        let mut touched: Vec<&TemplatedFileSlice> = Vec::new();
        for elem in &self.sliced_file {
            let overlaps = if is_zero_slice(source_slice) {
                elem.source_slice.start <= source_slice.start
                    && source_slice.start <= elem.source_slice.end
            } else {
                elem.source_slice.start < source_slice.end
                    && source_slice.start < elem.source_slice.end
            };
            if overlaps {
                touched.push(elem);
            }
        }
        match touched.as_slice() {
            [] => zero_slice(self.templated_str.len()),
            [single] if single.slice_type == SliceType::Literal => {
                let offset = single.templated_slice.start as isize
                    - single.source_slice.start as isize;
                let start = (source_slice.start as isize + offset) as usize;
                let end = (source_slice.end as isize + offset) as usize;
                start..end
            }
            several => {
                let start = several
                    .iter()
                    .map(|e| e.templated_slice.start)
                    .min()
                    .unwrap_or(0);
                let end = several
                    .iter()
                    .map(|e| e.templated_slice.end)
                    .max()
                    .unwrap_or(start);
                start..end
            }
        }
    }

    /// Work out whether a slice of the source file is wholly literal.
    pub fn is_source_slice_literal(&self, source_slice: &Range<usize>) -> bool {
        if self.raw_sliced.is_empty() {
            return true;
        }
        // A zero length slice is never templated.
        if is_zero_slice(source_slice) {
            return true;
        }
        let mut is_literal = true;
        for raw_slice in &self.raw_sliced {
            if raw_slice.source_idx <= source_slice.start {
                is_literal = raw_slice.slice_type == SliceType::Literal;
            } else if raw_slice.source_idx >= source_slice.end {
                break;
            } else if raw_slice.slice_type != SliceType::Literal {
                is_literal = false;
            }
        }
        is_literal
    }

    /// Raw slices which appear only in the source (block tags, comments).
    ///
    /// These all have zero length in the templated file, and arrive
    /// necessarily sorted.
    pub fn source_only_slices(&self) -> Vec<&RawFileSlice> {
        self.raw_sliced
            .iter()
            .filter(|elem| elem.slice_type.is_source_only())
            .collect()
    }
}

/// The interface a templater implementation satisfies.
///
/// Implementations other than [`RawTemplater`] live outside the core and
/// are surfaced through the plugin registry.
pub trait Templater: Send + Sync {
    fn name(&self) -> &'static str;

    /// Expand `in_str`, returning the templated file or a `TMP` violation.
    fn process(
        &self,
        in_str: &str,
        fname: &str,
        config: &LintConfig,
    ) -> Result<TemplatedFile, Violation>;
}

/// A templater which does nothing: one literal slice covers the file.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawTemplater;

impl Templater for RawTemplater {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn process(
        &self,
        in_str: &str,
        fname: &str,
        _config: &LintConfig,
    ) -> Result<TemplatedFile, Violation> {
        debug!(file = fname, "raw templater pass-through");
        let mut tf = TemplatedFile::from_string(in_str);
        tf.name = fname.to_string();
        Ok(tf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A templated file equivalent to `SELECT {{ col }}  ,  1 FROM t`
    /// rendered with `col = my_col`.
    fn jinja_style_file() -> TemplatedFile {
        let source = "SELECT {{ col }}  ,  1 FROM t";
        let templated = "SELECT my_col  ,  1 FROM t";
        let sliced = vec![
            TemplatedFileSlice::new(SliceType::Literal, 0..7, 0..7),
            TemplatedFileSlice::new(SliceType::Templated, 7..16, 7..13),
            TemplatedFileSlice::new(SliceType::Literal, 16..29, 13..26),
        ];
        let raw = vec![
            RawFileSlice::new("SELECT ", SliceType::Literal, 0),
            RawFileSlice::new("{{ col }}", SliceType::Templated, 7),
            RawFileSlice::new("  ,  1 FROM t", SliceType::Literal, 16),
        ];
        TemplatedFile::new(
            source.to_string(),
            "test.sql",
            Some(templated.to_string()),
            Some(sliced),
            Some(raw),
        )
        .unwrap()
    }

    #[test]
    fn test_from_string_single_literal() {
        let tf = TemplatedFile::from_string("SELECT 1\n");
        assert_eq!(tf.sliced_file().len(), 1);
        assert_eq!(tf.raw_sliced().len(), 1);
        assert_eq!(tf.source_str(), tf.templated_str());
    }

    #[test]
    fn test_inconsistent_slices_rejected() {
        let result = TemplatedFile::new(
            "ab".to_string(),
            "bad.sql",
            Some("ab".to_string()),
            Some(vec![TemplatedFileSlice::new(SliceType::Literal, 0..2, 1..2)]),
            Some(vec![RawFileSlice::new("ab", SliceType::Literal, 0)]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_literal_mapping_is_linear() {
        let tf = jinja_style_file();
        // "FROM" in templated (20..24) is at source 23..27.
        assert_eq!(tf.templated_slice_to_source_slice(&(20..24)), 23..27);
    }

    #[test]
    fn test_templated_region_widens_to_tag() {
        let tf = jinja_style_file();
        // "my_col" in the templated string maps to the whole tag.
        assert_eq!(tf.templated_slice_to_source_slice(&(7..13)), 7..16);
    }

    #[test]
    fn test_source_to_templated_literal() {
        let tf = jinja_style_file();
        assert_eq!(tf.source_slice_to_templated_slice(&(23..27)), 20..24);
    }

    #[test]
    fn test_is_source_slice_literal() {
        let tf = jinja_style_file();
        assert!(tf.is_source_slice_literal(&(0..7)));
        assert!(!tf.is_source_slice_literal(&(5..12)));
        assert!(tf.is_source_slice_literal(&(16..29)));
        // Zero length slices are always literal.
        assert!(tf.is_source_slice_literal(&(9..9)));
    }

    #[test]
    fn test_line_pos() {
        let tf = TemplatedFile::from_string("SELECT 1\nFROM foo\n");
        assert_eq!(tf.get_line_pos_of_char_pos(9, true), (2, 1));
        assert_eq!(tf.get_line_pos_of_char_pos(0, false), (1, 1));
    }

    #[test]
    fn test_source_only_slices() {
        let source = "{# note #}SELECT 1";
        let templated = "SELECT 1";
        let tf = TemplatedFile::new(
            source.to_string(),
            "c.sql",
            Some(templated.to_string()),
            Some(vec![
                TemplatedFileSlice::new(SliceType::Comment, 0..10, 0..0),
                TemplatedFileSlice::new(SliceType::Literal, 10..18, 0..8),
            ]),
            Some(vec![
                RawFileSlice::new("{# note #}", SliceType::Comment, 0),
                RawFileSlice::new("SELECT 1", SliceType::Literal, 10),
            ]),
        )
        .unwrap();
        let source_only = tf.source_only_slices();
        assert_eq!(source_only.len(), 1);
        assert_eq!(source_only[0].slice_type, SliceType::Comment);
    }

    #[test]
    fn test_raw_templater() {
        let tf = RawTemplater
            .process("SELECT 1", "q.sql", &LintConfig::default())
            .unwrap();
        assert_eq!(tf.name(), "q.sql");
        assert_eq!(tf.templated_str(), "SELECT 1");
    }
}
