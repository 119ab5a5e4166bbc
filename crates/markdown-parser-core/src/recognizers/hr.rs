//! Horizontal rules: three or more of `-`, `*` or `_` (optionally
//! space-separated), preceded by a newline (or start of input) and
//! followed by a newline or end of input.

use regex::Regex;
use std::sync::OnceLock;

use crate::node::{Node, NodeId, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

fn re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^((-+[ ]{0,2}){3,}|(_+[ ]{0,2}){3,}|(\*+[ ]{0,2}){3,})[ ]*(\n|$)").unwrap()
    })
}

/// Shared with [`crate::recognizers::meta`], which needs to try (and
/// consume) a horizontal rule without going through the dispatcher.
pub fn try_make(cx: &mut ParseCx<'_>) -> Option<NodeId> {
    let caret = cx.scanner.caret();
    if caret > 1 && cx.scanner.char_at(caret - 1) != Some('\n') {
        return None;
    }
    let m = cx.scanner.match_at(re(), caret)?;
    let pos = cx.scanner.copy_pos();
    let end = caret + m.end();
    let node = cx.tree.alloc(Node {
        kind: NodeKind::Void,
        name: "hr".to_string(),
        data: String::new(),
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    });
    cx.scanner.update(end);
    Some(node)
}

pub struct Hr;

impl Recognizer for Hr {
    fn name(&self) -> &'static str {
        "hr"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        match try_make(cx) {
            Some(id) => MakeResult::List(vec![id]),
            None => MakeResult::None,
        }
    }
}

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
    fn three_dashes_is_a_rule() {
        let mut scanner = Scanner::new("- - -\nrest", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match Hr.make_node(&mut cx) {
            MakeResult::List(ids) => assert_eq!(tree.node(ids[0]).name, "hr"),
            _ => panic!("expected hr"),
        }
    }

    #[test]
    fn two_dashes_is_not_a_rule() {
        let mut scanner = Scanner::new("--\n", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        assert!(Hr.make_node(&mut cx).is_none());
    }
}
