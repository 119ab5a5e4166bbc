//! Tight inline emphasis patterns (`**strong**`, `*em*`, `***both***`,
//! `__strong__`, `___both___`) plus the "smart" `_em_` form that only
//! fires at a word boundary and tolerates an `&entity;` or letter run
//! immediately after the closing `_`.

use crate::attributes::get_attribute_list;
use crate::dispatcher::Scratch;
use crate::node::{Node, NodeId, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

const EMPTY: &str = " \t\n\r\x0c\x0b";

struct InlinePattern {
    pattern: &'static str,
    tight: bool,
    tagname: &'static str,
}

impl InlinePattern {
    fn make(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        let content_start = caret + self.pattern.len();
        if cx.scanner.peek(self.pattern.len()) != self.pattern {
            return MakeResult::None;
        }
        let Some(content_end) = cx.scanner.find(self.pattern, content_start, cx.scanner.end()) else {
            return MakeResult::None;
        };
        if content_start == content_end {
            return MakeResult::None;
        }
        if self.tight {
            let char_start = cx.scanner.char_at(content_start);
            let char_end = cx.scanner.char_at(content_end - 1);
            if char_start.is_some_and(|c| EMPTY.contains(c)) || char_end.is_some_and(|c| EMPTY.contains(c)) {
                return MakeResult::None;
            }
        }
        let pos = cx.scanner.copy_pos();
        let node = cx.tree.alloc(Node {
            kind: NodeKind::Element,
            name: self.tagname.to_string(),
            data: String::new(),
            attrs: Default::default(),
            children: Vec::new(),
            parent: None,
            pos,
        });
        cx.scanner.update(content_start);
        let mut scratch = Scratch::default();
        scratch.content_end = Some(content_end);
        MakeResult::NodeWithScratch(node, scratch)
    }

    fn close(&self, node: NodeId, cx: &mut ParseCx<'_>, scratch: &mut Scratch) -> Option<crate::position::Position> {
        if scratch.content_end != Some(cx.scanner.caret()) {
            return None;
        }
        let pos = cx.scanner.copy_pos();
        cx.scanner.update(cx.scanner.caret() + self.pattern.len());
        get_attribute_list(cx.scanner, cx.diagnostics, cx.tree, node, '{', '}');
        Some(pos)
    }
}

macro_rules! inline_pattern_recognizer {
    ($struct_name:ident, $name:literal, $pattern:literal, $tight:literal, $tagname:literal) => {
        pub struct $struct_name;

        impl Recognizer for $struct_name {
            fn name(&self) -> &'static str {
                $name
            }

            fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
                InlinePattern {
                    pattern: $pattern,
                    tight: $tight,
                    tagname: $tagname,
                }
                .make(cx)
            }

            fn close(
                &self,
                node: NodeId,
                cx: &mut ParseCx<'_>,
                scratch: &mut Scratch,
            ) -> Option<crate::position::Position> {
                InlinePattern {
                    pattern: $pattern,
                    tight: $tight,
                    tagname: $tagname,
                }
                .close(node, cx, scratch)
            }
        }
    };
}

inline_pattern_recognizer!(Strong, "strong", "**", true, "strong");
inline_pattern_recognizer!(Strong2, "strong2", "__", true, "strong");
inline_pattern_recognizer!(Em, "em", "*", true, "em");
inline_pattern_recognizer!(StrongEm, "strong_em", "***", true, "strong_em");
inline_pattern_recognizer!(EmStrong, "em_strong", "___", true, "em_strong");

pub struct SmartEm;

impl Recognizer for SmartEm {
    fn name(&self) -> &'static str {
        "smart_em"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        if cx.scanner.current_char() != Some('_') {
            return MakeResult::None;
        }
        if caret != 0 && !cx.scanner.char_at(caret - 1).is_some_and(|c| EMPTY.contains(c)) {
            return MakeResult::None;
        }
        let mut index = caret;
        let end_index = loop {
            let Some(next) = cx.scanner.find("_", index + 1, cx.scanner.end()) else {
                return MakeResult::None;
            };
            if cx.scanner.char_at(next - 1).is_some_and(|c| EMPTY.contains(c)) {
                return MakeResult::None;
            }
            let after = cx.scanner.char_at(next + 1);
            let continues = after.is_some_and(|c| c.is_alphabetic() || c == '&');
            if continues {
                index = next;
            } else {
                break next;
            }
        };
        if caret + 1 == end_index {
            return MakeResult::None;
        }
        let pos = cx.scanner.copy_pos();
        cx.scanner.update(caret + 1);
        let node = cx.tree.alloc(Node {
            kind: NodeKind::Element,
            name: "em".to_string(),
            data: String::new(),
            attrs: Default::default(),
            children: Vec::new(),
            parent: None,
            pos,
        });
        let mut scratch = Scratch::default();
        scratch.content_end = Some(end_index);
        MakeResult::NodeWithScratch(node, scratch)
    }

    fn close(&self, node: NodeId, cx: &mut ParseCx<'_>, scratch: &mut Scratch) -> Option<crate::position::Position> {
        if scratch.content_end != Some(cx.scanner.caret()) {
            return None;
        }
        let pos = cx.scanner.copy_pos();
        cx.scanner.update(cx.scanner.caret() + 1);
        get_attribute_list(cx.scanner, cx.diagnostics, cx.tree, node, '{', '}');
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
    fn strong_opens_and_records_close() {
        let mut scanner = Scanner::new("**bold** rest", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match Strong.make_node(&mut cx) {
            MakeResult::NodeWithScratch(id, scratch) => {
                assert_eq!(tree.node(id).name, "strong");
                assert_eq!(scratch.content_end, Some(8));
            }
            _ => panic!("expected strong"),
        }
    }

    #[test]
    fn loose_em_declines_due_to_leading_space() {
        let mut scanner = Scanner::new("* not tight *", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        assert!(Em.make_node(&mut cx).is_none());
    }

    #[test]
    fn smart_em_requires_preceding_whitespace() {
        let mut scanner = Scanner::new("word_not_em_", "t");
        scanner.update(4);
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        assert!(SmartEm.make_node(&mut cx).is_none());
    }
}
