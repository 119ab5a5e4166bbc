//! # Scanner — the cursor over raw source text
//!
//! Every recognizer reads and advances through one shared [`Scanner`].
//! It owns the text, the current read position (`caret`), and the
//! exclusive upper bound (`end`). Recognizers never own the cursor
//! themselves; the dispatcher lends out `&mut Scanner` one recognizer
//! at a time.
//!
//! `caret` is a byte offset into `text`. All indices handed back by
//! [`Scanner::find`] and [`Scanner::match_at`] are byte offsets taken
//! from the same string, so they always land on char boundaries.

use regex::Regex;

use crate::position::{LineIndex, Position};

/// Cursor-driven scanner over a single source text.
pub struct Scanner {
    text: String,
    line_index: LineIndex,
    caret: usize,
    end: usize,
    uri: String,
}

impl Scanner {
    pub fn new(text: impl Into<String>, uri: impl Into<String>) -> Self {
        let text = text.into();
        let line_index = LineIndex::new(&text);
        let end = text.len();
        Self {
            text,
            line_index,
            caret: 0,
            end,
            uri: uri.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn at_end(&self) -> bool {
        self.caret >= self.end
    }

    /// Byte slice `text[caret..caret+n]`, clamped to `end` and to the
    /// nearest preceding char boundary so it never panics.
    pub fn peek(&self, n: usize) -> &str {
        let mut stop = (self.caret + n).min(self.end);
        while stop > self.caret && !self.text.is_char_boundary(stop) {
            stop -= 1;
        }
        &self.text[self.caret..stop]
    }

    /// The single character at `caret`, if any.
    pub fn current_char(&self) -> Option<char> {
        self.text[self.caret..].chars().next()
    }

    /// The character at an arbitrary byte offset.
    pub fn char_at(&self, index: usize) -> Option<char> {
        if index >= self.text.len() {
            return None;
        }
        self.text[index..].chars().next()
    }

    pub fn startswith(&self, s: &str) -> bool {
        self.text[self.caret..self.end.min(self.text.len())].starts_with(s)
    }

    pub fn startswith_at(&self, index: usize, s: &str) -> bool {
        index + s.len() <= self.text.len() && &self.text[index..index + s.len()] == s
    }

    /// `text.find(s)` restricted to `[from, to)`. `to` may exceed `end`;
    /// callers that need to stay inside the scan region pass `self.end`.
    pub fn find(&self, s: &str, from: usize, to: usize) -> Option<usize> {
        let to = to.min(self.text.len());
        if from >= to {
            return None;
        }
        self.text[from..to].find(s).map(|i| i + from)
    }

    pub fn rfind(&self, s: &str, from: usize, to: usize) -> Option<usize> {
        let to = to.min(self.text.len());
        if from >= to {
            return None;
        }
        self.text[from..to].rfind(s).map(|i| i + from)
    }

    /// Regex match anchored exactly at `from` (Python `re.match(pat, from)`
    /// semantics), not a search starting at `from`.
    pub fn match_at(&self, re: &Regex, from: usize) -> Option<regex::Match<'_>> {
        if from > self.text.len() {
            return None;
        }
        let m = re.find(&self.text[from..])?;
        if m.start() == 0 { Some(m) } else { None }
    }

    /// Advance the caret to `i`, recomputing `pos`. Rewinding is a bug:
    /// recognizers only ever move forward once they've committed a
    /// result, and `make_node` that declines must never have called
    /// `update` at all.
    pub fn update(&mut self, i: usize) {
        debug_assert!(
            i >= self.caret,
            "{}",
            crate::error::ParserBug::ScannerRewound { from: self.caret, to: i }
        );
        self.caret = i.min(self.text.len());
    }

    /// Advance past a run of characters drawn from `chars`, return the
    /// new caret.
    pub fn skip_space(&mut self, chars: &str) -> usize {
        let mut i = self.caret;
        while let Some(c) = self.char_at(i) {
            if chars.contains(c) {
                i += c.len_utf8();
            } else {
                break;
            }
        }
        self.update(i);
        i
    }

    pub fn copy_pos(&self) -> Position {
        self.compute(self.caret)
    }

    pub fn compute(&self, i: usize) -> Position {
        self.line_index.compute(&self.text, i.min(self.text.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_clamps_to_end() {
        let s = Scanner::new("hi", "test");
        assert_eq!(s.peek(10), "hi");
    }

    #[test]
    fn find_restricted_to_range() {
        let s = Scanner::new("aXbXc", "test");
        assert_eq!(s.find("X", 0, 5), Some(1));
        assert_eq!(s.find("X", 2, 5), Some(3));
    }

    #[test]
    fn match_at_requires_anchor() {
        let s = Scanner::new("  ## not here", "test");
        let re = Regex::new(r"#+").unwrap();
        assert!(s.match_at(&re, 0).is_none());
        assert!(s.match_at(&re, 2).is_some());
    }

    #[test]
    fn skip_space_advances_and_stops() {
        let mut s = Scanner::new("   x", "test");
        let i = s.skip_space(" \t");
        assert_eq!(i, 3);
        assert_eq!(s.current_char(), Some('x'));
    }
}
