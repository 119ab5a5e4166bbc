//! LaTeX math spans: display (`$$...$$`, `\[...\]`) and inline
//! (`$...$`, `\(...\)`). Both close in `make_node` itself (no open
//! frame) since the closing delimiter is found by a forward scan
//! rather than by the dispatcher's close-per-step protocol.

use crate::node::{Node, NodeId, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

const MODULE: &str = "latex";
const EMPTY: &str = " \t\n\r\x0c\x0b";

fn entity(cx: &mut ParseCx<'_>, ch: char) -> NodeId {
    let pos = cx.scanner.copy_pos();
    cx.tree.alloc(Node {
        kind: NodeKind::Entity,
        name: String::new(),
        data: ch.to_string(),
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    })
}

fn raw(cx: &mut ParseCx<'_>, content: String, kind: &str, ch: char) -> NodeId {
    let pos = cx.scanner.copy_pos();
    let node = cx.tree.alloc(Node {
        kind: NodeKind::RawText,
        name: "latex".to_string(),
        data: content,
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    });
    cx.tree.node_mut(node).attrs.set_text("type", kind);
    cx.tree.node_mut(node).attrs.set_text("char", ch.to_string());
    node
}

pub struct LatexDisplay;

impl Recognizer for LatexDisplay {
    fn name(&self) -> &'static str {
        "latex_display"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        let Some(c0) = cx.scanner.current_char() else {
            return MakeResult::None;
        };
        if c0 != '$' && c0 != '\\' {
            return MakeResult::None;
        }
        let start = cx.scanner.peek(2).to_string();
        let close_delim = match start.as_str() {
            "$$" => "$$",
            "\\[" => "\\]",
            _ => return MakeResult::None,
        };
        match cx.scanner.find(close_delim, caret + 2, cx.scanner.end()) {
            None => {
                let pos = cx.scanner.copy_pos();
                crate::diagnostics::diag!(cx.diagnostics, MODULE, "E100", pos);
                cx.scanner.update(caret + 1);
                let first = start.chars().next().unwrap();
                MakeResult::List(vec![entity(cx, first)])
            }
            Some(index) => {
                let content = cx.scanner.text()[caret + 2..index].to_string();
                cx.scanner.update(index + close_delim.len());
                let first = start.chars().next().unwrap();
                MakeResult::List(vec![raw(cx, content, "display", first)])
            }
        }
    }
}

pub struct LatexInline;

impl Recognizer for LatexInline {
    fn name(&self) -> &'static str {
        "latex_inline"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        let start: &'static str = if cx.scanner.peek(2) == "\\(" {
            "\\("
        } else if cx.scanner.current_char() == Some('$') {
            "$"
        } else {
            return MakeResult::None;
        };
        if start == "$" && cx.scanner.char_at(caret + 1).is_some_and(|c| EMPTY.contains(c)) {
            cx.scanner.update(caret + 1);
            return MakeResult::List(vec![entity(cx, '$')]);
        }
        let close_delim = if start == "\\(" { "\\)" } else { "$" };
        let search_from = caret + start.len();
        let first_index = cx.scanner.find(close_delim, search_from, cx.scanner.end());
        if start == "\\(" {
            return match first_index {
                Some(index) => {
                    let content = cx.scanner.text()[caret + 2..index].to_string();
                    cx.scanner.update(index + 2);
                    MakeResult::List(vec![raw(cx, content, "inline", '\\')])
                }
                None => {
                    cx.scanner.update(caret + 1);
                    MakeResult::List(vec![entity(cx, '$')])
                }
            };
        }
        let mut index = first_index;
        while let Some(idx) = index {
            let before = cx.scanner.char_at(idx.wrapping_sub(1));
            if before == Some('\\') {
                index = cx.scanner.find("$", idx + 1, cx.scanner.end());
            } else if !before.is_some_and(|c| EMPTY.contains(c)) {
                let content = cx.scanner.text()[caret + 1..idx].to_string();
                cx.scanner.update(idx + 1);
                return MakeResult::List(vec![raw(cx, content, "inline", '$')]);
            } else {
                break;
            }
        }
        cx.scanner.update(caret + 1);
        MakeResult::List(vec![entity(cx, '$')])
    }
}

pub const MSG: &[(&str, &str)] = &[("E100", "unfinished display LaTeX environment")];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::node::Tree;
    use crate::scanner::Scanner;

    struct Noop;
    impl crate::recognizer::CodeSink for Noop {
        fn compile(&self, _: &str, _: &str, _: &str) -> Result<(), String> {
            Err("n/a".into())
        }
    }

    #[test]
    fn display_dollar_dollar() {
        let mut scanner = Scanner::new("$$x^2$$rest", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match LatexDisplay.make_node(&mut cx) {
            MakeResult::List(ids) => {
                assert_eq!(tree.node(ids[0]).data, "x^2");
                assert_eq!(tree.node(ids[0]).attrs.get_text("type"), Some("display"));
            }
            _ => panic!("expected latex display"),
        }
    }

    #[test]
    fn inline_dollar_with_trailing_space_is_entity() {
        let mut scanner = Scanner::new("$ not math", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match LatexInline.make_node(&mut cx) {
            MakeResult::List(ids) => assert_eq!(tree.node(ids[0]).kind, NodeKind::Entity),
            _ => panic!("expected entity"),
        }
    }

    #[test]
    fn inline_paren_form() {
        let mut scanner = Scanner::new(r"\(x\)rest", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match LatexInline.make_node(&mut cx) {
            MakeResult::List(ids) => assert_eq!(tree.node(ids[0]).data, "x"),
            _ => panic!("expected latex inline"),
        }
    }
}
