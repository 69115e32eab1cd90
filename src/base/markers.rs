//! Position markers binding tree nodes to the source.
//!
//! A marker carries two character slices: the *templated* slice (into the
//! post-expansion string the parser consumed) and the *source* slice (into
//! the original pre-expansion string). Line/column positions in either
//! coordinate system are derived on demand from the templated file's
//! newline tables.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::base::slices::{slice_len, zero_slice};
use crate::templater::TemplatedFile;

/// The location of a segment, in both templated and source coordinates.
#[derive(Clone)]
pub struct PositionMarker {
    pub source_slice: Range<usize>,
    pub templated_slice: Range<usize>,
    templated_file: Arc<TemplatedFile>,
}

impl PositionMarker {
    pub fn new(
        source_slice: Range<usize>,
        templated_slice: Range<usize>,
        templated_file: Arc<TemplatedFile>,
    ) -> Self {
        Self {
            source_slice,
            templated_slice,
            templated_file,
        }
    }

    /// A zero-width marker at a single point in both coordinate systems.
    pub fn from_point(
        source_pos: usize,
        templated_pos: usize,
        templated_file: Arc<TemplatedFile>,
    ) -> Self {
        Self::new(
            zero_slice(source_pos),
            zero_slice(templated_pos),
            templated_file,
        )
    }

    /// Derive a marker spanning a sequence of child markers.
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_child_markers<'a, I>(markers: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a PositionMarker>,
    {
        let mut iter = markers.into_iter();
        let first = iter.next()?;
        let mut source = first.source_slice.clone();
        let mut templated = first.templated_slice.clone();
        let file = first.templated_file.clone();
        for m in iter {
            source.start = source.start.min(m.source_slice.start);
            source.end = source.end.max(m.source_slice.end);
            templated.start = templated.start.min(m.templated_slice.start);
            templated.end = templated.end.max(m.templated_slice.end);
        }
        Some(Self::new(source, templated, file))
    }

    pub fn templated_file(&self) -> &Arc<TemplatedFile> {
        &self.templated_file
    }

    /// True when the marked region maps 1-to-1 onto source characters,
    /// i.e. no macro expansion intervened.
    pub fn is_literal(&self) -> bool {
        self.templated_file
            .is_source_slice_literal(&self.source_slice)
            && slice_len(&self.source_slice) == slice_len(&self.templated_slice)
    }

    /// True when the marker covers no characters in the templated file.
    pub fn is_point(&self) -> bool {
        slice_len(&self.templated_slice) == 0
    }

    /// `(line, column)` of the start in the *source* file, 1-indexed.
    pub fn source_position(&self) -> (usize, usize) {
        self.templated_file
            .get_line_pos_of_char_pos(self.source_slice.start, true)
    }

    /// `(line, column)` of the start in the *templated* file, 1-indexed.
    pub fn templated_position(&self) -> (usize, usize) {
        self.templated_file
            .get_line_pos_of_char_pos(self.templated_slice.start, false)
    }

    /// A zero-width marker at the start of this one.
    pub fn start_point_marker(&self) -> Self {
        Self::from_point(
            self.source_slice.start,
            self.templated_slice.start,
            self.templated_file.clone(),
        )
    }

    /// A zero-width marker at the end of this one.
    pub fn end_point_marker(&self) -> Self {
        Self::from_point(
            self.source_slice.end,
            self.templated_slice.end,
            self.templated_file.clone(),
        )
    }

    /// Sort key: source position first, then templated position.
    fn key(&self) -> (usize, usize, usize, usize) {
        (
            self.source_slice.start,
            self.source_slice.end,
            self.templated_slice.start,
            self.templated_slice.end,
        )
    }
}

impl PartialEq for PositionMarker {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PositionMarker {}

impl PartialOrd for PositionMarker {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PositionMarker {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Debug for PositionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PositionMarker(src {:?}, tmpl {:?})",
            self.source_slice, self.templated_slice
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_marker() {
        let tf = Arc::new(TemplatedFile::from_string("SELECT 1\n"));
        let m = PositionMarker::from_point(3, 3, tf);
        assert!(m.is_point());
        assert_eq!(m.source_position(), (1, 4));
    }

    #[test]
    fn test_literal_marker() {
        let tf = Arc::new(TemplatedFile::from_string("SELECT 1\n"));
        let m = PositionMarker::new(0..6, 0..6, tf);
        assert!(m.is_literal());
        assert!(!m.is_point());
    }

    #[test]
    fn test_from_child_markers() {
        let tf = Arc::new(TemplatedFile::from_string("SELECT a FROM b\n"));
        let a = PositionMarker::new(0..6, 0..6, tf.clone());
        let b = PositionMarker::new(9..13, 9..13, tf);
        let merged = PositionMarker::from_child_markers([&a, &b]).unwrap();
        assert_eq!(merged.source_slice, 0..13);
        assert_eq!(merged.templated_slice, 0..13);
    }

    #[test]
    fn test_ordering() {
        let tf = Arc::new(TemplatedFile::from_string("SELECT 1\n"));
        let a = PositionMarker::new(0..2, 0..2, tf.clone());
        let b = PositionMarker::new(3..5, 3..5, tf);
        assert!(a < b);
    }
}
