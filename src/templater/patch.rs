//! Applying template-safe edits to a templated file.
//!
//! Between fix phases the engine rewrites the templated string and needs
//! a consistent [`TemplatedFile`] for the result. Every edit the fix
//! applicator produces is template-safe (contained in a literal slice),
//! so each one maps linearly onto the source and shifts both coordinate
//! systems by the same delta.

use std::ops::Range;

use tracing::trace;

use crate::base::slices::slice_len;
use crate::errors::CoreError;
use crate::templater::{RawFileSlice, SliceType, TemplatedFile, TemplatedFileSlice};

/// A single textual edit in templated coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatedEdit {
    pub templated_slice: Range<usize>,
    pub replacement: String,
}

impl TemplatedEdit {
    pub fn new(templated_slice: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            templated_slice,
            replacement: replacement.into(),
        }
    }

    fn delta(&self) -> isize {
        self.replacement.len() as isize - slice_len(&self.templated_slice) as isize
    }
}

impl TemplatedFile {
    /// Apply a set of template-safe edits, producing a new file with both
    /// strings rewritten and every slice offset adjusted.
    ///
    /// Edits must be non-overlapping; they are sorted internally. An edit
    /// which is not contained in a literal slice is an error here - the
    /// fix applicator screens those out beforehand.
    pub fn patch(&self, edits: &[TemplatedEdit]) -> Result<TemplatedFile, CoreError> {
        if edits.is_empty() {
            return Ok(self.clone());
        }
        let mut edits: Vec<TemplatedEdit> = edits.to_vec();
        edits.sort_by_key(|e| (e.templated_slice.start, e.templated_slice.end));
        for pair in edits.windows(2) {
            if pair[1].templated_slice.start < pair[0].templated_slice.end {
                return Err(CoreError::Templating(format!(
                    "overlapping edits: {:?} and {:?}",
                    pair[0].templated_slice, pair[1].templated_slice
                )));
            }
        }

        // Locate the literal slice containing each edit and derive the
        // matching source-coordinate edit.
        let mut source_edits: Vec<(Range<usize>, &str)> = Vec::with_capacity(edits.len());
        for edit in &edits {
            let lit = self
                .sliced_file()
                .iter()
                .find(|s| {
                    s.slice_type == SliceType::Literal
                        && s.templated_slice.start <= edit.templated_slice.start
                        && edit.templated_slice.end <= s.templated_slice.end
                })
                .ok_or_else(|| {
                    CoreError::Templating(format!(
                        "edit at {:?} is not contained in a literal slice",
                        edit.templated_slice
                    ))
                })?;
            let offset = lit.source_slice.start as isize - lit.templated_slice.start as isize;
            let start = (edit.templated_slice.start as isize + offset) as usize;
            let end = (edit.templated_slice.end as isize + offset) as usize;
            source_edits.push((start..end, &edit.replacement));
        }

        let new_templated = splice(
            self.templated_str(),
            edits
                .iter()
                .map(|e| (e.templated_slice.clone(), e.replacement.as_str())),
        );
        let new_source = splice(self.source_str(), source_edits.iter().cloned());

        // Rebuild the templated slice map: shift both coordinate systems
        // by the accumulated delta, growing the slice that holds an edit.
        let mut new_sliced: Vec<TemplatedFileSlice> = Vec::with_capacity(self.sliced_file().len());
        let mut delta_in: isize = 0;
        for s in self.sliced_file() {
            let gain: isize = edits
                .iter()
                .filter(|e| {
                    s.slice_type == SliceType::Literal
                        && s.templated_slice.start <= e.templated_slice.start
                        && e.templated_slice.end <= s.templated_slice.end
                })
                .map(TemplatedEdit::delta)
                .sum();
            let t_start = (s.templated_slice.start as isize + delta_in) as usize;
            let t_end = (s.templated_slice.end as isize + delta_in + gain) as usize;
            let s_start = (s.source_slice.start as isize + delta_in) as usize;
            let s_end = (s.source_slice.end as isize + delta_in + gain) as usize;
            new_sliced.push(TemplatedFileSlice::new(
                s.slice_type,
                s_start..s_end,
                t_start..t_end,
            ));
            delta_in += gain;
        }

        // Rebuild raw slices by re-slicing the new source at shifted offsets.
        let mut new_raw: Vec<RawFileSlice> = Vec::with_capacity(self.raw_sliced().len());
        let mut delta_in: isize = 0;
        for r in self.raw_sliced() {
            let old_slice = r.source_slice();
            let gain: isize = source_edits
                .iter()
                .filter(|(s, _)| {
                    r.slice_type == SliceType::Literal
                        && old_slice.start <= s.start
                        && s.end <= old_slice.end
                })
                .map(|(s, repl)| repl.len() as isize - slice_len(s) as isize)
                .sum();
            let start = (old_slice.start as isize + delta_in) as usize;
            let end = (old_slice.end as isize + delta_in + gain) as usize;
            let mut slice = RawFileSlice::new(&new_source[start..end], r.slice_type, start);
            slice.block_idx = r.block_idx;
            new_raw.push(slice);
            delta_in += gain;
        }

        trace!(
            edits = edits.len(),
            old_len = self.templated_str().len(),
            new_len = new_templated.len(),
            "patched templated file"
        );

        TemplatedFile::new(
            new_source,
            self.name().to_string(),
            Some(new_templated),
            Some(new_sliced),
            Some(new_raw),
        )
    }
}

/// Splice sorted, non-overlapping edits into a string.
fn splice<'a>(text: &str, edits: impl Iterator<Item = (Range<usize>, &'a str)>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (slice, replacement) in edits {
        out.push_str(&text[cursor..slice.start]);
        out.push_str(replacement);
        cursor = slice.end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_raw_file() {
        let tf = TemplatedFile::from_string("SELECT a , b\n");
        // Remove the space before the comma.
        let patched = tf
            .patch(&[TemplatedEdit::new(8..9, "")])
            .unwrap();
        assert_eq!(patched.templated_str(), "SELECT a, b\n");
        assert_eq!(patched.source_str(), "SELECT a, b\n");
        assert_eq!(patched.sliced_file().len(), 1);
        assert_eq!(patched.sliced_file()[0].templated_slice, 0..12);
    }

    #[test]
    fn test_patch_insertion_at_end() {
        let tf = TemplatedFile::from_string("SELECT 1");
        let patched = tf
            .patch(&[TemplatedEdit::new(8..8, "\n")])
            .unwrap();
        assert_eq!(patched.templated_str(), "SELECT 1\n");
        assert_eq!(patched.raw_sliced()[0].raw, "SELECT 1\n");
    }

    #[test]
    fn test_patch_preserves_templated_slices() {
        let source = "SELECT {{ col }}  ,  1";
        let templated = "SELECT my_col  ,  1";
        let tf = TemplatedFile::new(
            source.to_string(),
            "t.sql",
            Some(templated.to_string()),
            Some(vec![
                TemplatedFileSlice::new(SliceType::Literal, 0..7, 0..7),
                TemplatedFileSlice::new(SliceType::Templated, 7..16, 7..13),
                TemplatedFileSlice::new(SliceType::Literal, 16..22, 13..19),
            ]),
            Some(vec![
                RawFileSlice::new("SELECT ", SliceType::Literal, 0),
                RawFileSlice::new("{{ col }}", SliceType::Templated, 7),
                RawFileSlice::new("  ,  1", SliceType::Literal, 16),
            ]),
        )
        .unwrap();
        // Collapse "  ," to "," and "  1" to " 1" in the trailing literal.
        let patched = tf
            .patch(&[
                TemplatedEdit::new(13..15, ""),
                TemplatedEdit::new(16..18, " "),
            ])
            .unwrap();
        assert_eq!(patched.templated_str(), "SELECT my_col, 1");
        assert_eq!(patched.source_str(), "SELECT {{ col }}, 1");
        // The templated tag slice is untouched.
        assert_eq!(patched.sliced_file()[1].slice_type, SliceType::Templated);
        assert_eq!(patched.sliced_file()[1].source_slice, 7..16);
    }

    #[test]
    fn test_patch_rejects_edit_in_templated_region() {
        let source = "SELECT {{ col }}";
        let templated = "SELECT my_col";
        let tf = TemplatedFile::new(
            source.to_string(),
            "t.sql",
            Some(templated.to_string()),
            Some(vec![
                TemplatedFileSlice::new(SliceType::Literal, 0..7, 0..7),
                TemplatedFileSlice::new(SliceType::Templated, 7..16, 7..13),
            ]),
            Some(vec![
                RawFileSlice::new("SELECT ", SliceType::Literal, 0),
                RawFileSlice::new("{{ col }}", SliceType::Templated, 7),
            ]),
        )
        .unwrap();
        assert!(tf.patch(&[TemplatedEdit::new(8..10, "xx")]).is_err());
    }
}
