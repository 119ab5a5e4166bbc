//! Code spans and blocks: backtick-delimited inline code, `~~~`-fenced
//! blocks (with an optional language-hint first line), and 4-space /
//! tab indented blocks.
//!
//! Unlike [`CodeInline`] (ported closely from the reference backtick
//! parser), [`CodeBlock`]'s fenced/indented forms have no reference
//! implementation to check against; they're built directly from the
//! prose description of the two forms.

use crate::attributes::get_attribute_list;
use crate::node::{Node, NodeId, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

const MODULE: &str = "code";
const MIN_FENCE: usize = 3;

fn code_element(cx: &mut ParseCx<'_>, content: String) -> Vec<NodeId> {
    let pos = cx.scanner.copy_pos();
    let node = cx.tree.alloc(Node {
        kind: NodeKind::Element,
        name: "code".to_string(),
        data: String::new(),
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    });
    let text = cx.tree.alloc(Node {
        kind: NodeKind::Text,
        name: String::new(),
        data: content,
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    });
    cx.tree.append_child(node, text);
    get_attribute_list(cx.scanner, cx.diagnostics, cx.tree, node, '{', '}');
    vec![node]
}

fn obtain_content(cx: &mut ParseCx<'_>, index: usize, mut end_index: usize, count: usize, pos: crate::position::Position) -> String {
    let mut ambiguous = false;
    if cx.scanner.startswith_at(end_index + count, "`") {
        ambiguous = true;
        while cx.scanner.startswith_at(end_index + count, "`") {
            end_index += 1;
        }
    }
    if ambiguous {
        crate::diagnostics::diag!(cx.diagnostics, MODULE, "E100", pos, [cx.scanner.compute(end_index)]);
    }
    cx.scanner.update(end_index + count);
    let content = cx.scanner.text()[index..end_index].trim().to_string();
    if content.is_empty() { " ".to_string() } else { content }
}

pub struct CodeInline;

impl Recognizer for CodeInline {
    fn name(&self) -> &'static str {
        "code_inline"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        if cx.scanner.current_char() != Some('`') {
            return MakeResult::None;
        }
        let pos = cx.scanner.copy_pos();
        let mut count = 1usize;
        let mut index = caret + 1;
        while cx.scanner.char_at(index) == Some('`') {
            count += 1;
            index += 1;
        }
        let total = count;
        let run: String = "`".repeat(count);
        if let Some(end_index) = cx.scanner.find(&run, index, cx.scanner.end()) {
            let content = obtain_content(cx, index, end_index, count, pos);
            return MakeResult::List(code_element(cx, content));
        }
        let start = index;
        let mut count = count;
        while count > 0 {
            let run: String = "`".repeat(count);
            if let Some(end_index) = cx.scanner.find(&run, index, cx.scanner.end()) {
                if end_index > 0 {
                    let close_pos = cx.scanner.compute(end_index);
                    crate::diagnostics::diag!(cx.diagnostics, MODULE, "E100", pos, [close_pos]);
                    cx.scanner.update(end_index + count);
                    let content = cx.scanner.text()[start..end_index].trim().to_string();
                    return MakeResult::List(code_element(cx, content));
                }
            }
            count -= 1;
        }
        let close_pos = cx.scanner.compute(caret + total);
        crate::diagnostics::diag!(cx.diagnostics, MODULE, "E101", pos, [close_pos]);
        cx.scanner.update(caret + total);
        let text = cx.tree.alloc(Node {
            kind: NodeKind::Text,
            name: String::new(),
            data: "`".repeat(total),
            attrs: Default::default(),
            children: Vec::new(),
            parent: None,
            pos,
        });
        MakeResult::List(vec![text])
    }
}

fn codeblock_element(cx: &mut ParseCx<'_>, class: String, body: String, pos: crate::position::Position) -> NodeId {
    let node = cx.tree.alloc(Node {
        kind: NodeKind::Element,
        name: "codeblock".to_string(),
        data: String::new(),
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    });
    cx.tree.node_mut(node).attrs.set_text("class", class);
    let text = cx.tree.alloc(Node {
        kind: NodeKind::Text,
        name: String::new(),
        data: body,
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    });
    cx.tree.append_child(node, text);
    node
}

/// Splits a fence's language-hint line into `(class, body_offset)`.
/// A true shebang (`#!/path`) is left as code content, not a hint.
fn classify_hint(hint: &str) -> Option<String> {
    let hint = hint.trim();
    if hint.is_empty() {
        return None;
    }
    if let Some(rest) = hint.strip_prefix("#!") {
        if rest.contains('/') {
            return None;
        }
        return Some(format!("brush: {rest}; gutter: true;"));
    }
    if let Some(rest) = hint.strip_prefix(':') {
        return Some(format!("brush: {rest}; gutter: false;"));
    }
    None
}

pub struct CodeBlock;

impl Recognizer for CodeBlock {
    fn name(&self) -> &'static str {
        "code_block"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        if let Some(result) = self.try_fenced(cx, caret) {
            return result;
        }
        self.try_indented(cx, caret)
    }
}

impl CodeBlock {
    fn try_fenced(&self, cx: &mut ParseCx<'_>, caret: usize) -> Option<MakeResult> {
        if caret != 0 && cx.scanner.char_at(caret - 1) != Some('\n') {
            return None;
        }
        let mut count = 0usize;
        while cx.scanner.char_at(caret + count) == Some('~') {
            count += 1;
        }
        if count < MIN_FENCE {
            return None;
        }
        let pos = cx.scanner.copy_pos();
        let hint_end = cx
            .scanner
            .find("\n", caret + count, cx.scanner.end())
            .unwrap_or(cx.scanner.end());
        let hint_line = cx.scanner.text()[caret + count..hint_end].to_string();
        let class = classify_hint(&hint_line).unwrap_or_else(|| "brush: plain; gutter: false;".to_string());
        let body_start = if classify_hint(&hint_line).is_some() {
            (hint_end + 1).min(cx.scanner.text().len())
        } else {
            caret + count
        };
        let fence = "~".repeat(count);
        let mut search_from = body_start;
        loop {
            let Some(idx) = cx.scanner.find(&fence, search_from, cx.scanner.end()) else {
                crate::diagnostics::diag!(cx.diagnostics, MODULE, "E200", pos);
                let body = cx.scanner.text()[body_start..cx.scanner.end()].trim_end_matches('\n').to_string();
                cx.scanner.update(cx.scanner.end());
                let node = codeblock_element(cx, class, body, pos);
                return Some(MakeResult::List(vec![node]));
            };
            let line_start = cx.scanner.text()[..idx].rfind('\n').map(|i| i + 1).unwrap_or(0);
            if cx.scanner.text()[line_start..idx].trim().is_empty() {
                let line_end = cx
                    .scanner
                    .find("\n", idx, cx.scanner.end())
                    .unwrap_or(cx.scanner.end());
                let body = cx.scanner.text()[body_start..line_start].trim_end_matches('\n').to_string();
                cx.scanner.update((line_end + 1).min(cx.scanner.text().len()));
                let node = codeblock_element(cx, class, body, pos);
                return Some(MakeResult::List(vec![node]));
            }
            search_from = idx + fence.len();
        }
    }

    fn try_indented(&self, cx: &mut ParseCx<'_>, caret: usize) -> MakeResult {
        if caret != 0 && cx.scanner.char_at(caret - 1) != Some('\n') {
            return MakeResult::None;
        }
        let leads_with_indent = cx.scanner.peek(4) == "    " || cx.scanner.char_at(caret) == Some('\t');
        if !leads_with_indent {
            return MakeResult::None;
        }
        let pos = cx.scanner.copy_pos();
        let mut body = String::new();
        let mut cursor = caret;
        loop {
            let line_end = cx
                .scanner
                .find("\n", cursor, cx.scanner.end())
                .unwrap_or(cx.scanner.end());
            let line = &cx.scanner.text()[cursor..line_end];
            if line.trim().is_empty() {
                body.push('\n');
                if line_end >= cx.scanner.end() {
                    cursor = line_end;
                    break;
                }
                cursor = line_end + 1;
                continue;
            }
            let dedented = if let Some(rest) = line.strip_prefix('\t') {
                rest
            } else if let Some(rest) = line.strip_prefix("    ") {
                rest
            } else {
                break;
            };
            body.push_str(dedented);
            if line_end >= cx.scanner.end() {
                cursor = line_end;
                break;
            }
            body.push('\n');
            cursor = line_end + 1;
        }
        let body = body.trim_end_matches('\n').to_string();
        cx.scanner.update(cursor);
        let node = codeblock_element(cx, "brush: plain; gutter: false;".to_string(), body, pos);
        MakeResult::List(vec![node])
    }
}

pub const MSG: &[(&str, &str)] = &[
    ("E100", "ambiguous inline code ends at {0}"),
    ("E101", "no more backticks after {0} to match"),
    ("E200", "fenced code block closing fence not found"),
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
    fn inline_code_strips_content() {
        let mut scanner = Scanner::new("`a < b`rest", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match CodeInline.make_node(&mut cx) {
            MakeResult::List(ids) => {
                let child = tree.node(ids[0]).children[0];
                assert_eq!(tree.node(child).data, "a < b");
            }
            _ => panic!("expected code"),
        }
        assert!(diags.is_empty());
    }

    #[test]
    fn fenced_block_with_no_hint_uses_plain_class() {
        let mut scanner = Scanner::new("~~~~\nprint 'hello'\n~~~~\n", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match CodeBlock.make_node(&mut cx) {
            MakeResult::List(ids) => {
                let node = ids[0];
                assert_eq!(tree.node(node).name, "codeblock");
                assert_eq!(tree.node(node).attrs.get_text("class"), Some("brush: plain; gutter: false;"));
                let child = tree.node(node).children[0];
                assert_eq!(tree.node(child).data, "print 'hello'");
            }
            _ => panic!("expected codeblock"),
        }
    }

    #[test]
    fn indented_block_dedents_four_spaces() {
        let mut scanner = Scanner::new("    a = 1\n    b = 2\nrest", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match CodeBlock.make_node(&mut cx) {
            MakeResult::List(ids) => {
                let child = tree.node(ids[0]).children[0];
                assert_eq!(tree.node(child).data, "a = 1\nb = 2");
            }
            _ => panic!("expected codeblock"),
        }
    }
}
