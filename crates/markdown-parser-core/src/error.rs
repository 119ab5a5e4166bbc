//! Internal invariant violations — parser bugs, not malformed input.
//! Malformed input always goes through [`crate::diagnostics`] instead;
//! a [`ParserBug`] only ever surfaces via `panic!`/`debug_assert!` in a
//! debug build, never as a `Result` a caller has to handle.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserBug {
    #[error("scanner caret rewound from {from} to {to} — recognizer bug")]
    ScannerRewound { from: usize, to: usize },
    #[error("{recognizer} declined but moved the caret")]
    DeclinedButMoved { recognizer: &'static str },
}
