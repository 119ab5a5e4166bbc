//! Special characters borrowed from HTML (`&amp;`, stray `<`) and from
//! LaTeX escapes (`\$`, `\%`, ...), plus the `\\` hard line break.
//! Tried last in the inline context — everything more specific gets a
//! chance first.

use crate::node::{Node, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

const MODULE: &str = "entity";
const TEX: &str = "\\{}$&#^_%~";
const ESCAPE: &str = "<`*_[]()+-.!";

fn entity_node(data: impl Into<String>, pos: crate::position::Position) -> Node {
    Node {
        kind: NodeKind::Entity,
        name: String::new(),
        data: data.into(),
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    }
}

fn text_node(data: impl Into<String>, pos: crate::position::Position) -> Node {
    Node {
        kind: NodeKind::Text,
        name: String::new(),
        data: data.into(),
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    }
}

fn handle_amp(cx: &mut ParseCx<'_>, caret: usize) -> NodeKindResult {
    let pos = cx.scanner.copy_pos();
    match crate::attributes::find_any(cx.scanner, caret, cx.scanner.end(), " \t\n\r\x0c\x0b;") {
        Some(idx) if cx.scanner.char_at(idx) == Some(';') => {
            cx.scanner.update(idx + 1);
            let data = cx.scanner.text()[caret..idx + 1].to_string();
            NodeKindResult::Entity(data, pos)
        }
        _ => {
            cx.scanner.update(caret + 1);
            NodeKindResult::Entity("&".to_string(), pos)
        }
    }
}

enum NodeKindResult {
    Entity(String, crate::position::Position),
    Text(String, crate::position::Position),
}

fn handle_lt(cx: &mut ParseCx<'_>, caret: usize) -> NodeKindResult {
    let pos = cx.scanner.copy_pos();
    if cx.scanner.char_at(caret + 1) == Some('/') {
        match cx.scanner.find(">", caret + 2, cx.scanner.end()) {
            None => {
                cx.scanner.update(caret + 1);
                NodeKindResult::Entity("<".to_string(), pos)
            }
            Some(close) => {
                let stray = cx.scanner.text()[caret..close + 1].to_string();
                crate::diagnostics::diag!(cx.diagnostics, MODULE, "E100", pos, [stray]);
                cx.scanner.update(close + 1);
                NodeKindResult::Text(String::new(), pos)
            }
        }
    } else {
        cx.scanner.update(caret + 1);
        NodeKindResult::Entity("<".to_string(), pos)
    }
}

fn handle_escape(cx: &mut ParseCx<'_>, caret: usize) -> NodeKindResult {
    let pos = cx.scanner.copy_pos();
    let Some(c) = cx.scanner.char_at(caret + 1) else {
        cx.scanner.update(caret + 1);
        return NodeKindResult::Text("\\".to_string(), pos);
    };
    if TEX.contains(c) {
        cx.scanner.update(caret + 1 + c.len_utf8());
        NodeKindResult::Entity(format!("\\{c}"), pos)
    } else if cx.scanner.startswith_at(caret, "\\backslash") {
        cx.scanner.update(caret + "\\backslash".len());
        NodeKindResult::Entity("\\backslash".to_string(), pos)
    } else if ESCAPE.contains(c) {
        cx.scanner.update(caret + 1 + c.len_utf8());
        NodeKindResult::Entity(format!("\\{c}"), pos)
    } else {
        cx.scanner.update(caret + 1);
        NodeKindResult::Text("\\".to_string(), pos)
    }
}

pub struct Entity;

impl Recognizer for Entity {
    fn name(&self) -> &'static str {
        "entity"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        let c = cx.scanner.current_char();
        let result = match c {
            Some('&') => handle_amp(cx, caret),
            Some('<') => handle_lt(cx, caret),
            Some('\\') => handle_escape(cx, caret),
            _ => return MakeResult::None,
        };
        let node = match result {
            NodeKindResult::Entity(data, pos) => entity_node(data, pos),
            NodeKindResult::Text(data, pos) => text_node(data, pos),
        };
        MakeResult::List(vec![cx.tree.alloc(node)])
    }
}

/// `\\` — hard line break, represented as a void `br` element.
pub struct Break;

impl Recognizer for Break {
    fn name(&self) -> &'static str {
        "break"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        if !cx.scanner.startswith("\\\\") {
            return MakeResult::None;
        }
        let pos = cx.scanner.copy_pos();
        cx.scanner.update(cx.scanner.caret() + 2);
        let id = cx.tree.alloc(Node {
            kind: NodeKind::Void,
            name: "br".to_string(),
            data: String::new(),
            attrs: Default::default(),
            children: Vec::new(),
            parent: None,
            pos,
        });
        MakeResult::List(vec![id])
    }
}

pub const MSG: &[(&str, &str)] = &[("E100", "ignoring stray end tag `{0}`")];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::node::Tree;
    use crate::scanner::Scanner;
    use rstest::rstest;

    struct Noop;
    impl crate::recognizer::CodeSink for Noop {
        fn compile(&self, _: &str, _: &str, _: &str) -> Result<(), String> {
            Err("n/a".into())
        }
    }

    fn ctx<'a>(
        scanner: &'a mut Scanner,
        tree: &'a mut Tree,
        diags: &'a mut Diagnostics,
        sink: &'a Noop,
    ) -> ParseCx<'a> {
        ParseCx {
            scanner,
            tree,
            diagnostics: diags,
            code_sink: sink,
        }
    }

    #[test]
    fn named_entity_consumes_through_semicolon() {
        let mut scanner = Scanner::new("&amp;x", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ctx(&mut scanner, &mut tree, &mut diags, &sink);
        match Entity.make_node(&mut cx) {
            MakeResult::List(ids) => assert_eq!(tree.node(ids[0]).data, "&amp;"),
            _ => panic!(),
        }
        assert_eq!(scanner.caret(), 5);
    }

    #[test]
    fn stray_end_tag_logs_e100() {
        let mut scanner = Scanner::new("</p>rest", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ctx(&mut scanner, &mut tree, &mut diags, &sink);
        Entity.make_node(&mut cx);
        assert_eq!(diags.iter().next().unwrap().code, "E100");
    }

    #[test]
    fn tex_escape_produces_entity() {
        let mut scanner = Scanner::new("\\$x", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ctx(&mut scanner, &mut tree, &mut diags, &sink);
        match Entity.make_node(&mut cx) {
            MakeResult::List(ids) => assert_eq!(tree.node(ids[0]).data, "\\$"),
            _ => panic!(),
        }
    }

    #[rstest]
    #[case('$')]
    #[case('%')]
    #[case('*')]
    #[case('[')]
    fn escape_of_known_char_produces_matching_entity(#[case] c: char) {
        let input = format!("\\{c}x");
        let mut scanner = Scanner::new(input, "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ctx(&mut scanner, &mut tree, &mut diags, &sink);
        match Entity.make_node(&mut cx) {
            MakeResult::List(ids) => assert_eq!(tree.node(ids[0]).data, format!("\\{c}")),
            _ => panic!("expected an entity"),
        }
    }

    #[rstest]
    #[case('q')]
    #[case('z')]
    fn escape_of_unknown_char_falls_back_to_literal_backslash_text(#[case] c: char) {
        let input = format!("\\{c}x");
        let mut scanner = Scanner::new(input, "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ctx(&mut scanner, &mut tree, &mut diags, &sink);
        match Entity.make_node(&mut cx) {
            MakeResult::List(ids) => assert_eq!(tree.node(ids[0]).data, "\\"),
            _ => panic!("expected a text run"),
        }
    }

    #[test]
    fn double_backslash_is_a_break() {
        let mut scanner = Scanner::new("\\\\x", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ctx(&mut scanner, &mut tree, &mut diags, &sink);
        match Break.make_node(&mut cx) {
            MakeResult::List(ids) => assert_eq!(tree.node(ids[0]).name, "br"),
            _ => panic!(),
        }
    }
}
