//! Single-pass, cursor-driven parser for a hybrid Markdown + LaTeX +
//! HTML-like markup language.
//!
//! [`parse`] runs the default grammar ([`style::default_style`]) over
//! a source string and returns a typed [`node::Tree`] plus a
//! [`diagnostics::Diagnostics`] log. The tree and the log are
//! independent: a malformed construct never aborts the parse, it logs
//! a diagnostic and the [`dispatcher`] recovers (see `dispatcher`'s
//! module doc for the recovery rules).

pub mod attributes;
pub mod diagnostics;
pub mod dispatcher;
pub mod error;
pub mod node;
pub mod position;
pub mod recognizer;
pub mod recognizers;
pub mod scanner;
pub mod style;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use node::{Node, NodeId, NodeKind, Tree};
pub use position::Position;
pub use recognizer::CodeSink;
pub use style::{Style, StyleDefaults, default_style, default_style_with};

/// Parses `text` (identified as `uri` for diagnostics) with the
/// default grammar and no code sink, so any `?py`/`?py_eval`/`<% %>`
/// construct always falls back to a `python_pi_error` node.
pub fn parse(text: impl Into<String>, uri: impl Into<String>) -> (Tree, Diagnostics) {
    let style = default_style();
    dispatcher::run(text, uri, &style, None)
}

/// Parses with an injected [`CodeSink`], so embedding hosts can wire
/// up a real Python interpreter for processing instructions and eval
/// blocks.
pub fn parse_with_code_sink(
    text: impl Into<String>,
    uri: impl Into<String>,
    code_sink: &dyn CodeSink,
) -> (Tree, Diagnostics) {
    let style = default_style();
    dispatcher::run(text, uri, &style, Some(code_sink))
}

/// Every recognizer module's `MSG` table, keyed by `(module, code)`.
/// Used to render a [`Diagnostic`] into the message template its
/// module declared, with `{0}`, `{1}`, ... substituted from `args`.
fn message_template(module: &str, code: &str) -> Option<&'static str> {
    let table: &[(&str, &str)] = match module {
        "attributes" => attributes::MSG,
        "cdata" => recognizers::cdata::MSG,
        "code" => recognizers::code::MSG,
        "comment" => recognizers::comment::MSG,
        "doctype" => recognizers::doctype::MSG,
        "element" => recognizers::element::MSG,
        "entity" => recognizers::entity::MSG,
        "eval" => recognizers::eval::MSG,
        "latex" => recognizers::latex::MSG,
        "macro_def" => recognizers::macro_def::MSG,
        "meta" => recognizers::meta::MSG,
        "paragraph" => recognizers::paragraph::MSG,
        "pi" => recognizers::pi::MSG,
        "reference" => recognizers::reference::MSG,
        "dispatcher" => dispatcher::MSG,
        _ => return None,
    };
    table.iter().find(|(c, _)| *c == code).map(|(_, msg)| *msg)
}

/// Renders `diag` as `module:line:col code: message` with `{n}`
/// placeholders in the module's template filled in from `diag.args`.
pub fn render_diagnostic(diag: &Diagnostic) -> String {
    let body = match message_template(diag.module, diag.code) {
        Some(template) => {
            let mut rendered = template.to_string();
            for (i, arg) in diag.args.iter().enumerate() {
                rendered = rendered.replace(&format!("{{{i}}}"), arg);
            }
            rendered
        }
        None => format!("unknown diagnostic {} {}", diag.module, diag.code),
    };
    format!("{}:{} {} {}: {}", diag.pos.line, diag.pos.column, diag.module, diag.code, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_paragraph_into_document_tree() {
        let (tree, diagnostics) = parse("hello world\n", "t.mx");
        assert_eq!(tree.node(tree.root()).name, "#document");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn render_diagnostic_fills_in_template_args() {
        let (_, diagnostics) = parse("`unterminated", "t.mx");
        assert!(!diagnostics.is_empty());
        let diag = diagnostics.iter().next().unwrap();
        let rendered = render_diagnostic(diag);
        assert!(rendered.contains(diag.code));
    }
}
