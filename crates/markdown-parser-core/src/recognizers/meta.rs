//! Front-matter metadata block: `key: value` lines at the very start
//! of the document, continued by 4+-space indented lines, terminated
//! by a blank line or a horizontal rule.

use regex::Regex;
use std::sync::OnceLock;

use super::hr;
use crate::node::{Node, NodeId, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

const MODULE: &str = "meta";

fn entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<b1>[ ]{0,3})(?P<key>[A-Za-z0-9_-]+)(?P<b2>:\s*)(?P<value>.*)$").unwrap())
}

fn more_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<blank>[ ]{4,})(?P<value>.*)$").unwrap())
}

fn item_node(value: &str, pos: crate::position::Position) -> Node {
    Node {
        kind: NodeKind::RawText,
        name: "item".to_string(),
        data: value.trim().to_string(),
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    }
}

fn get_entry(cx: &mut ParseCx<'_>, warn: bool) -> Option<NodeId> {
    let caret = cx.scanner.caret();
    let end = cx.scanner.find("\n", caret, cx.scanner.text().len())?;
    let raw_line = &cx.scanner.text()[caret..end];
    let line = raw_line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(caps) = entry_re().captures(line) else {
        if hr::try_make(cx).is_none() && warn {
            let pos = cx.scanner.copy_pos();
            crate::diagnostics::diag!(cx.diagnostics, MODULE, "E100", pos);
        }
        return None;
    };
    let pos = cx.scanner.copy_pos();
    let b1 = caps.name("b1").unwrap().as_str();
    let key = caps.name("key").unwrap().as_str().to_lowercase();
    let b2 = caps.name("b2").unwrap().as_str();
    let value = caps.name("value").unwrap().as_str();
    let node = cx.tree.alloc(Node {
        kind: NodeKind::Element,
        name: "entry".to_string(),
        data: String::new(),
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    });
    cx.tree.node_mut(node).attrs.set_text("name", key);
    let blank = b1.len() + caps.name("key").unwrap().as_str().len() + b2.len();
    let value_pos = cx.scanner.compute(caret + blank);
    let val = cx.tree.alloc(item_node(value, value_pos));
    cx.tree.append_child(node, val);
    cx.scanner.update(end + 1);

    loop {
        let caret = cx.scanner.caret();
        let Some(next_end) = cx.scanner.find("\n", caret, cx.scanner.text().len()) else {
            return Some(node);
        };
        let raw = &cx.scanner.text()[caret..next_end];
        match more_re().captures(raw) {
            Some(more) => {
                let value = more.name("value").unwrap().as_str();
                let blank = more.name("blank").unwrap().as_str().len();
                let value_pos = cx.scanner.compute(caret + blank);
                let val = cx.tree.alloc(item_node(value, value_pos));
                cx.tree.append_child(node, val);
                cx.scanner.update(next_end + 1);
            }
            None => {
                let count = raw.chars().take_while(|c| *c == ' ').count();
                if count > 0 {
                    let pos = cx.scanner.copy_pos();
                    crate::diagnostics::diag!(cx.diagnostics, MODULE, "E101", pos, [count]);
                }
                return Some(node);
            }
        }
    }
}

pub struct Meta;

impl Recognizer for Meta {
    fn name(&self) -> &'static str {
        "meta"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        if cx.scanner.caret() != 0 {
            return MakeResult::None;
        }
        let pos = cx.scanner.copy_pos();
        let delimiter = hr::try_make(cx);
        let Some(mut entry) = get_entry(cx, false) else {
            return match delimiter {
                Some(id) => MakeResult::List(vec![id]),
                None => MakeResult::None,
            };
        };
        let node = cx.tree.alloc(Node {
            kind: NodeKind::Element,
            name: "lexor-meta".to_string(),
            data: String::new(),
            attrs: Default::default(),
            children: Vec::new(),
            parent: None,
            pos,
        });
        loop {
            cx.tree.append_child(node, entry);
            match get_entry(cx, true) {
                Some(next) => entry = next,
                None => break,
            }
        }
        MakeResult::List(vec![node])
    }
}

pub const MSG: &[(&str, &str)] = &[
    ("E100", "meta block not properly finished"),
    ("E101", "indentation of {0} spaces not enough for meta value"),
];

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
    fn parses_two_entries_then_blank_line() {
        let mut scanner = Scanner::new("title: Hi\nauthor: Me\n\nbody", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match Meta.make_node(&mut cx) {
            MakeResult::List(ids) => {
                let meta = ids[0];
                assert_eq!(tree.node(meta).name, "lexor-meta");
                assert_eq!(tree.node(meta).children.len(), 2);
            }
            _ => panic!("expected lexor-meta"),
        }
    }

    #[test]
    fn not_at_document_start_declines() {
        let mut scanner = Scanner::new("xtitle: Hi\n", "t");
        scanner.update(1);
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        assert!(Meta.make_node(&mut cx).is_none());
    }
}
