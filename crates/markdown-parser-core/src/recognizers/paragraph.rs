//! Paragraphs. Opens unless the content ahead starts with an autolink,
//! an auto-mail, or an element whose tag isn't one of the few allowed
//! inline tags; closes on a blank line, EOF, or an opening tag that
//! isn't allowed as paragraph content.

use crate::dispatcher::Scratch;
use crate::node::{Node, NodeId, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};
use crate::recognizers::auto;
use crate::recognizers::element::get_tagname;

const MODULE: &str = "paragraph";
const WS: &str = " \t\n\r\x0c\x0b";

const VALID_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "b", "basefont", "bdo", "big", "br", "button", "cite", "code", "dfn",
    "em", "font", "i", "img", "input", "kbd", "label", "map", "object", "q", "s", "samp", "select",
    "small", "span", "strike", "strong", "sub", "sup", "textarea", "tt", "u", "var",
];
const INVALID_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dir", "div", "dl", "fieldset", "footer", "form",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup", "hr", "main", "menu", "nav", "ol", "p",
    "pre", "section", "table", "ul",
];

pub struct Paragraph;

impl Recognizer for Paragraph {
    fn name(&self) -> &'static str {
        "paragraph"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let mut index = cx.scanner.caret();
        loop {
            match cx.scanner.char_at(index) {
                Some(c) if WS.contains(c) => index += c.len_utf8(),
                Some(_) => break,
                None => {
                    cx.scanner.update(index);
                    return MakeResult::None;
                }
            }
        }
        let end = cx.scanner.end();
        if auto::is_auto_link(cx, index, end).is_none() && auto::is_auto_mail(cx, index, end).is_none() {
            if let Some(tag) = get_tagname(cx, index) {
                if !VALID_TAGS.contains(&tag.as_str()) {
                    return MakeResult::None;
                }
            }
        }
        let pos = cx.scanner.copy_pos();
        let node = cx.tree.alloc(Node {
            kind: NodeKind::Element,
            name: "p".to_string(),
            data: String::new(),
            attrs: Default::default(),
            children: Vec::new(),
            parent: None,
            pos,
        });
        MakeResult::NodeWithScratch(node, Scratch::default())
    }

    fn close(&self, node: NodeId, cx: &mut ParseCx<'_>, _scratch: &mut Scratch) -> Option<crate::position::Position> {
        let caret = cx.scanner.caret();
        if let Some(tag) = get_tagname(cx, caret) {
            if INVALID_TAGS.contains(&tag.as_str()) {
                let open_pos = cx.tree.node(node).pos;
                crate::diagnostics::diag!(cx.diagnostics, MODULE, "E100", cx.scanner.copy_pos(), [open_pos, tag]);
                return Some(cx.scanner.copy_pos());
            }
        }
        if cx.scanner.current_char() != Some('\n') {
            return None;
        }
        let mut i = caret + 1;
        while cx.scanner.char_at(i).is_some_and(|c| c.is_whitespace() && c != '\n') {
            i += 1;
        }
        if cx.scanner.char_at(i) == Some('\n') {
            let match_end = i + 1;
            if match_end - caret > 1 || match_end == cx.scanner.end() {
                cx.scanner.update(match_end - 1);
                return Some(cx.scanner.copy_pos());
            }
        }
        let parent = cx.tree.node(node).parent;
        if parent.is_some_and(|p| cx.tree.node(p).name == "list_item") {
            let after_newline = cx.scanner.text()[(caret + 1).min(cx.scanner.text().len())..].to_string();
            let is_list_close = after_newline.starts_with("%%") || after_newline.starts_with("</list>");
            let is_first_child = cx.tree.node(parent.unwrap()).children.first() == Some(&node);
            let starts_new_marker = is_first_child
                && after_newline
                    .chars()
                    .next()
                    .is_some_and(|c| c == '^' || c == '+' || c == '*');
            if is_list_close || starts_new_marker {
                cx.tree.node_mut(node).attrs.set_text("lx-remove-wrap", "true");
                return Some(cx.scanner.copy_pos());
            }
        }
        None
    }
}

pub const MSG: &[(&str, &str)] = &[("E100", "paragraph at {0} closed due to opening tag `{1}`")];

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
    fn opens_paragraph_on_plain_text() {
        let mut scanner = Scanner::new("Hello there\n", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match Paragraph.make_node(&mut cx) {
            MakeResult::NodeWithScratch(id, _) => assert_eq!(tree.node(id).name, "p"),
            _ => panic!("expected p"),
        }
    }

    #[test]
    fn declines_before_invalid_leading_tag() {
        let mut scanner = Scanner::new("<div>block</div>", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        assert!(Paragraph.make_node(&mut cx).is_none());
    }
}
