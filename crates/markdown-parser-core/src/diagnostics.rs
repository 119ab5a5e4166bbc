//! # Diagnostic sink
//!
//! Recognizers never fail with an error — they log a [`Diagnostic`] and
//! recover. This module is the append-only log each recognizer module
//! pushes into via its own `MSG` table.

use crate::position::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub module: &'static str,
    pub code: &'static str,
    pub pos: Position,
    pub args: Vec<String>,
}

/// Append-only log, ordered by emission (which is document order, since
/// the scan is single-pass).
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, module: &'static str, code: &'static str, pos: Position, args: Vec<String>) {
        self.entries.push(Diagnostic {
            module,
            code,
            pos,
            args,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shorthand used throughout the `recognizers` modules:
/// `diag!(sink, "element", "E100", pos, ["arg"])`.
macro_rules! diag {
    ($sink:expr, $module:expr, $code:expr, $pos:expr) => {
        $sink.push($module, $code, $pos, Vec::new())
    };
    ($sink:expr, $module:expr, $code:expr, $pos:expr, [$($arg:expr),* $(,)?]) => {
        $sink.push($module, $code, $pos, vec![$($arg.to_string()),*])
    };
}
pub(crate) use diag;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn push_then_iter_preserves_emission_order() {
        let mut diags = Diagnostics::new();
        diags.push("entity", "E100", Position::new(1, 1), vec!["a".to_string()]);
        diags.push("entity", "E100", Position::new(2, 1), vec!["b".to_string()]);
        let codes: Vec<&str> = diags.iter().map(|d| d.code).collect();
        assert_eq!(codes, vec!["E100", "E100"]);
    }

    #[test]
    fn rendered_message_matches_module_template() {
        let diag = Diagnostic {
            module: "entity",
            code: "E100",
            pos: Position::new(1, 5),
            args: vec!["</p>".to_string()],
        };
        insta::assert_snapshot!(crate::render_diagnostic(&diag), @"1:5 entity E100: ignoring stray end tag `</p>`");
    }
}
