//! Source positions.
//!
//! Positions are `(line, column)` pairs, both 1-based, matching the way
//! editors and diagnostic tooling normally report locations. `\n` always
//! increments the line; column counts logical characters since the start
//! of the line, not bytes.

/// A 1-based `(line, column)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Precomputed line-start table so `compute(i)` doesn't rescan from zero.
///
/// Built once per parse from the source text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the first character of each line. Always starts with 0.
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// `(line, column)` for byte offset `i`, both 1-based.
    pub fn compute(&self, text: &str, i: usize) -> Position {
        let line_idx = match self.line_starts.binary_search(&i) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_start = self.line_starts[line_idx];
        let column = text[line_start..i].chars().count() + 1;
        Position::new((line_idx + 1) as u32, column as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_first_column() {
        let idx = LineIndex::new("hello\nworld");
        assert_eq!(idx.compute("hello\nworld", 0), Position::new(1, 1));
    }

    #[test]
    fn after_newline_resets_column() {
        let text = "hi\nthere";
        let idx = LineIndex::new(text);
        assert_eq!(idx.compute(text, 3), Position::new(2, 1));
    }

    #[test]
    fn mid_line_column_counts_chars() {
        let text = "abc\ndef";
        let idx = LineIndex::new(text);
        assert_eq!(idx.compute(text, 5), Position::new(2, 2));
    }
}
