//! List markers: `*`/`+` (unordered/ordered) optionally prefixed by
//! `^` to mark the closing item of a definition-style list, each
//! producing a `list_item` element. Per-item attributes can be given
//! in two bracket blocks right after the marker run:
//!
//! ```text
//! +[#ol_id]{#first_item} Item 1
//! ```
//!
//! `[...]` attributes get a `__` prefix, `{...}` attributes get a `_`
//! prefix, so they never collide with the item's own `level`/`type`.

use crate::attributes::get_attribute_list;
use crate::node::Node;
use crate::node::NodeKind;
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

pub struct List;

impl Recognizer for List {
    fn name(&self) -> &'static str {
        "list"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        let index = caret + 1;
        let Some(mut c) = cx.scanner.char_at(index) else {
            return MakeResult::None;
        };
        let preceding_ok = caret == 0 || cx.scanner.char_at(caret) == Some('\n');
        if !preceding_ok || !"*+^".contains(c) {
            return MakeResult::None;
        }
        let mut index = index;
        let flag_close = c == '^';
        if flag_close {
            index += 1;
            let Some(next) = cx.scanner.char_at(index) else {
                return MakeResult::None;
            };
            if !"*+".contains(next) {
                return MakeResult::None;
            }
            c = next;
        }
        let marker = c;
        let mut total = 0u32;
        while cx.scanner.char_at(index) == Some(marker) {
            index += 1;
            total += 1;
        }

        let pos = cx.scanner.copy_pos();
        let node = cx.tree.alloc(Node {
            kind: NodeKind::Element,
            name: "list_item".to_string(),
            data: String::new(),
            attrs: Default::default(),
            children: Vec::new(),
            parent: None,
            pos,
        });
        if flag_close {
            cx.tree.node_mut(node).attrs.set_text("flag", "close");
        }
        cx.tree.node_mut(node).attrs.set_text("level", total.to_string());
        cx.tree
            .node_mut(node)
            .attrs
            .set_text("type", if marker == '*' { "ul" } else { "ol" });

        cx.scanner.update(index);

        let before = cx.tree.node(node).attrs.len();
        get_attribute_list(cx.scanner, cx.diagnostics, cx.tree, node, '[', ']');
        let after = cx.tree.node(node).attrs.len();
        cx.tree.node_mut(node).attrs.rename_tail(before, "__");
        let _ = after;

        let before = cx.tree.node(node).attrs.len();
        get_attribute_list(cx.scanner, cx.diagnostics, cx.tree, node, '{', '}');
        let after = cx.tree.node(node).attrs.len();
        cx.tree.node_mut(node).attrs.rename_tail(before, "_");
        let _ = after;

        if cx.scanner.current_char() == Some(' ') {
            cx.scanner.update(cx.scanner.caret() + 1);
        }
        MakeResult::Node(node)
    }

    fn close(
        &self,
        _node: crate::node::NodeId,
        cx: &mut ParseCx<'_>,
        _scratch: &mut crate::dispatcher::Scratch,
    ) -> Option<crate::position::Position> {
        let caret = cx.scanner.caret();
        if cx.scanner.startswith_at(caret, "\n%%") {
            let pos = cx.scanner.copy_pos();
            cx.scanner.update(caret + 1);
            return Some(pos);
        }
        if cx.scanner.char_at(caret) == Some('\n')
            && cx.scanner.char_at(caret + 1).is_some_and(|c| "*+^".contains(c))
        {
            return Some(cx.scanner.copy_pos());
        }
        None
    }
}
