//! Newline table for character position → line/column conversion.

/// A precomputed table of newline offsets for a string.
///
/// Built once per string and queried many times, both coordinates
/// are 1-indexed to match how editors report positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineIndex {
    newlines: Vec<usize>,
}

impl LineIndex {
    /// Build an index from the given text.
    pub fn new(text: &str) -> Self {
        Self {
            newlines: text
                .char_indices()
                .filter(|&(_, c)| c == '\n')
                .map(|(i, _)| i)
                .collect(),
        }
    }

    /// Convert a character offset to a `(line, column)` pair, both 1-indexed.
    pub fn line_col(&self, char_pos: usize) -> (usize, usize) {
        let nl_idx = self.newlines.partition_point(|&nl| nl < char_pos);
        if nl_idx > 0 {
            (nl_idx + 1, char_pos - self.newlines[nl_idx - 1])
        } else {
            (1, char_pos + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string() {
        let idx = LineIndex::new("");
        assert_eq!(idx.line_col(0), (1, 1));
    }

    #[test]
    fn test_single_line() {
        let idx = LineIndex::new("SELECT 1");
        assert_eq!(idx.line_col(0), (1, 1));
        assert_eq!(idx.line_col(7), (1, 8));
    }

    #[test]
    fn test_multi_line() {
        let idx = LineIndex::new("SELECT 1\nFROM foo\n");
        assert_eq!(idx.line_col(0), (1, 1));
        // The newline itself is still on line 1.
        assert_eq!(idx.line_col(8), (1, 9));
        assert_eq!(idx.line_col(9), (2, 1));
        assert_eq!(idx.line_col(13), (2, 5));
        assert_eq!(idx.line_col(18), (3, 1));
    }
}
