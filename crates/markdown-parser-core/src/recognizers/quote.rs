//! Smart quotes: `'` or `"` opens a `quoted` element when it hugs its
//! content (no whitespace/start-of-text before it, no whitespace right
//! after) and a matching, non-escaped close quote can be found before
//! the next whitespace-preceded occurrence degrades it back to a
//! plain `Entity`.

use crate::node::{Node, NodeId, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

const EMPTY: &str = " \t\n\r\x0c\x0b";

fn entity(data: char, pos: crate::position::Position) -> Node {
    Node {
        kind: NodeKind::Entity,
        name: String::new(),
        data: data.to_string(),
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    }
}

pub struct Quote;

impl Recognizer for Quote {
    fn name(&self) -> &'static str {
        "quote"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        let Some(qchar) = cx.scanner.current_char().filter(|c| *c == '\'' || *c == '"') else {
            return MakeResult::None;
        };
        let pos = cx.scanner.copy_pos();
        let preceding = if caret == 0 {
            None
        } else {
            cx.scanner.char_at(caret - 1)
        };
        if preceding.is_none_or(|c| !EMPTY.contains(c)) && caret != 0 {
            cx.scanner.update(caret + 1);
            return MakeResult::List(vec![cx.tree.alloc(entity(qchar, pos))]);
        }
        if cx
            .scanner
            .char_at(caret + 1)
            .is_some_and(|c| EMPTY.contains(c))
        {
            cx.scanner.update(caret + 1);
            return MakeResult::List(vec![cx.tree.alloc(entity(qchar, pos))]);
        }
        let target = qchar.to_string();
        let mut index = cx.scanner.find(&target, caret + 1, cx.scanner.end());
        loop {
            match index {
                None => {
                    cx.scanner.update(cx.scanner.end());
                    return MakeResult::List(vec![cx.tree.alloc(entity(qchar, pos))]);
                }
                Some(i) => {
                    let before = cx.scanner.char_at(i - 1);
                    if before == Some('\\') {
                        index = cx.scanner.find(&target, i + 1, cx.scanner.end());
                        continue;
                    }
                    if before.is_some_and(|c| !EMPTY.contains(c)) {
                        let node = cx.tree.alloc(Node {
                            kind: NodeKind::Element,
                            name: "quoted".to_string(),
                            data: String::new(),
                            attrs: Default::default(),
                            children: Vec::new(),
                            parent: None,
                            pos,
                        });
                        cx.tree.node_mut(node).attrs.set_text("char", qchar.to_string());
                        cx.scanner.update(caret + 1);
                        let mut scratch = crate::dispatcher::Scratch::default();
                        scratch.end_pos = Some(i);
                        return MakeResult::NodeWithScratch(node, scratch);
                    }
                    cx.scanner.update(cx.scanner.end());
                    return MakeResult::List(vec![cx.tree.alloc(entity(qchar, pos))]);
                }
            }
        }
    }

    fn close(
        &self,
        _node: NodeId,
        cx: &mut ParseCx<'_>,
        scratch: &mut crate::dispatcher::Scratch,
    ) -> Option<crate::position::Position> {
        if Some(cx.scanner.caret()) != scratch.end_pos {
            return None;
        }
        let pos = cx.scanner.copy_pos();
        cx.scanner.update(cx.scanner.caret() + 1);
        Some(pos)
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
    fn hugging_quotes_open_a_quoted_element() {
        let mut scanner = Scanner::new("\"hi\" there", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match Quote.make_node(&mut cx) {
            MakeResult::NodeWithScratch(id, scratch) => {
                assert_eq!(tree.node(id).name, "quoted");
                assert_eq!(scratch.end_pos, Some(3));
            }
            _ => panic!("expected quoted element"),
        }
    }

    #[test]
    fn quote_followed_by_space_degrades_to_entity() {
        let mut scanner = Scanner::new("\" hi\"", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match Quote.make_node(&mut cx) {
            MakeResult::List(ids) => assert_eq!(tree.node(ids[0]).kind, NodeKind::Entity),
            _ => panic!("expected a degraded Entity"),
        }
    }
}
