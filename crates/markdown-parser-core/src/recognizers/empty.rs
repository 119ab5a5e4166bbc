//! Collapses a run of trailing whitespace up to and including the next
//! newline into a single `Text` node. Tried first in every context so
//! blank lines never fall through to the paragraph/element recognizers.

use crate::node::{Node, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

pub struct Empty;

impl Recognizer for Empty {
    fn name(&self) -> &'static str {
        "empty"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        let text = cx.scanner.text();
        let mut i = caret;
        let bytes = text.as_bytes();
        while i < text.len() && matches!(bytes[i], b' ' | b'\t') {
            i += 1;
        }
        if i >= text.len() || bytes[i] != b'\n' {
            return MakeResult::None;
        }
        i += 1;
        let pos = cx.scanner.copy_pos();
        let data = text[caret..i].to_string();
        cx.scanner.update(i);
        let id = cx.tree.alloc(Node {
            kind: NodeKind::Text,
            name: String::new(),
            data,
            attrs: Default::default(),
            children: Vec::new(),
            parent: None,
            pos,
        });
        MakeResult::List(vec![id])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::recognizer::CodeSink;
    use crate::scanner::Scanner;
    use crate::node::Tree;

    struct Noop;
    impl CodeSink for Noop {
        fn compile(&self, _: &str, _: &str, _: &str) -> Result<(), String> {
            Err("n/a".into())
        }
    }

    #[test]
    fn collects_blank_line() {
        let mut scanner = Scanner::new("  \nrest", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match Empty.make_node(&mut cx) {
            MakeResult::List(ids) => assert_eq!(tree.node(ids[0]).data, "  \n"),
            _ => panic!("expected a Text node"),
        }
        assert_eq!(scanner.caret(), 3);
    }

    #[test]
    fn declines_on_nonblank_line() {
        let mut scanner = Scanner::new("abc\n", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        assert!(Empty.make_node(&mut cx).is_none());
    }
}
