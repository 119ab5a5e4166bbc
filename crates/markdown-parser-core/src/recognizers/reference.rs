//! Link/attribute reference blocks (`[ref]: url "title"`, `{ref}:
//! attrs`) and inline references (`[text](url)`, `[text][ref]`,
//! `![alt](url)`).

use regex::Regex;
use std::sync::OnceLock;

use crate::attributes::{get_attribute_list, read_attributes};
use crate::dispatcher::Scratch;
use crate::node::{Node, NodeId, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};
use crate::position::Position;

const MODULE: &str = "reference";
const NOSPACE_WS: &str = " \t\n\r\x0c\x0b";

fn inline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^.*?[ \t\n\r\x0c\x0b)]").unwrap())
}

fn nospace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^.*?[ \t\n\r\x0c\x0b]").unwrap())
}

/// Whitespace-collapsing `\s+` → ' ' for title text.
fn collapse_ws(s: &str) -> String {
    let mut out = String::new();
    let mut in_ws = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_ws {
                out.push(' ');
                in_ws = true;
            }
        } else {
            out.push(c);
            in_ws = false;
        }
    }
    out
}

/// `(title, continue_index)`.
fn is_title(cx: &mut ParseCx<'_>, line_end: Option<usize>) -> Option<(String, usize)> {
    let caret = cx.scanner.caret();
    let ch = cx.scanner.current_char()?;
    if ch != '"' && ch != '\'' {
        return None;
    }
    let line_end = match line_end {
        Some(e) => e,
        None => cx
            .scanner
            .find("\n", caret, cx.scanner.text().len())
            .unwrap_or(cx.scanner.end()),
    };
    let index = cx.scanner.find(&ch.to_string(), caret + 1, line_end)?;
    let title = collapse_ws(&cx.scanner.text()[caret + 1..index]);
    Some((title, index + 1))
}

/// Byte offset `n` *characters* (not bytes) before `index`, clamped to
/// the start of the string. Walking back by character, rather than by
/// a fixed byte count, keeps this safe on multi-byte UTF-8 input.
fn back_n_chars(text: &str, index: usize, n: usize) -> usize {
    text[..index]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Counts `[`/`]` bracket parity from `index`, treating `\left[`/
/// `\right]` as not counting (LaTeX-aware).
fn check_parity(cx: &ParseCx<'_>, mut index: usize) -> (i32, usize) {
    let mut parity = 1i32;
    let end = cx.scanner.end();
    let text = cx.scanner.text();
    while index < end {
        let Some(c) = cx.scanner.char_at(index) else { break };
        if c == '[' {
            let back = back_n_chars(text, index, 5);
            if &text[back..index] != "\\left" {
                parity += 1;
            }
        } else if c == ']' {
            let back = back_n_chars(text, index, 6);
            if &text[back..index] != "\\right" {
                parity -= 1;
            }
        }
        if parity == 0 {
            break;
        }
        index += c.len_utf8();
    }
    (parity, index)
}

fn skip_space(cx: &mut ParseCx<'_>) {
    cx.scanner.skip_space(" \t\n\r\x0c\x0b");
}

/// Assumes caret is at `[` (for `[ref]`) or ` [`.
fn get_inline_id(cx: &mut ParseCx<'_>, node: NodeId) {
    let caret = cx.scanner.caret();
    let ref_begin = if cx.scanner.char_at(caret) == Some('[') {
        caret + 1
    } else if cx.scanner.peek(2) == " [" {
        caret + 2
    } else {
        return;
    };
    let (parity, ref_end) = check_parity(cx, ref_begin);
    if parity != 0 {
        return;
    }
    cx.scanner.update(ref_begin);
    match nospace_re().find(&cx.scanner.text()[cx.scanner.caret()..ref_end]) {
        Some(m) if !m.as_str().is_empty() => {
            let match_end = cx.scanner.caret() + m.end();
            let id = cx.scanner.text()[cx.scanner.caret()..match_end - 1].to_string();
            cx.tree.node_mut(node).attrs.set_text("_reference_id", id);
            cx.scanner.update(match_end);
            skip_space(cx);
            if !cx.scanner.text()[cx.scanner.caret()..ref_end].trim().is_empty() {
                read_attributes(cx.scanner, cx.diagnostics, cx.tree, node, ref_end, 0, false);
            }
            cx.scanner.update(ref_end + 1);
        }
        _ => {
            let id = cx.scanner.text()[cx.scanner.caret()..ref_end].to_string();
            cx.tree.node_mut(node).attrs.set_text("_reference_id", id);
            cx.scanner.update(ref_end + 1);
        }
    }
}

fn is_block_reference(cx: &mut ParseCx<'_>) -> Option<(NodeId, usize, Position)> {
    let mut empty = 0u32;
    let mut index = cx.scanner.caret();
    loop {
        match cx.scanner.char_at(index) {
            Some(' ') => {
                empty += 1;
                index += 1;
            }
            Some('\t') => {
                empty += 4;
                index += 1;
            }
            _ => break,
        }
    }
    let c = cx.scanner.char_at(index)?;
    if empty > 3 || (c != '[' && c != '{') {
        return None;
    }
    cx.scanner.update(index);
    let ref_begin = index + 1;
    let (closing_char, tagname) = if c == '[' {
        (']', "address_reference")
    } else {
        ('}', "attribute_reference")
    };
    let line_end = cx
        .scanner
        .find("\n", ref_begin, cx.scanner.text().len())
        .unwrap_or(cx.scanner.end());
    let rb_index = cx.scanner.rfind(&closing_char.to_string(), ref_begin, line_end)?;
    if cx.scanner.char_at(rb_index + 1) != Some(':') {
        return None;
    }
    let pos = cx.scanner.copy_pos();
    let node = cx.tree.alloc(Node {
        kind: NodeKind::Void,
        name: tagname.to_string(),
        data: String::new(),
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    });
    cx.tree
        .node_mut(node)
        .attrs
        .set_text("_reference_name", cx.scanner.text()[ref_begin..rb_index].to_string());
    cx.scanner.update(rb_index + 2);
    skip_space(cx);
    Some((node, line_end, pos))
}

fn update_link_ref(cx: &mut ParseCx<'_>, node: NodeId, line_end: usize, pos: Position) {
    let caret = cx.scanner.caret();
    let search_end = (line_end + 1).min(cx.scanner.text().len());
    let end = match nospace_re().find(&cx.scanner.text()[caret..search_end]) {
        Some(m) => caret + m.end(),
        None => {
            if line_end != cx.scanner.end() {
                crate::diagnostics::diag!(cx.diagnostics, MODULE, "E101", pos);
                cx.tree.node_mut(node).attrs.set_text("_address", "");
                return;
            }
            cx.scanner.end() + 1
        }
    };
    let address = cx.scanner.text()[caret..end - 1].to_string();
    if address.is_empty() {
        crate::diagnostics::diag!(cx.diagnostics, MODULE, "E101", pos);
    }
    cx.tree.node_mut(node).attrs.set_text("_address", address);
    cx.scanner.update(end - 1);
    skip_space(cx);
    if let Some((title, cont)) = is_title(cx, None) {
        cx.tree.node_mut(node).attrs.set_text("title", title);
        cx.scanner.update(cont);
    }
    let mut index = cx.scanner.find("{", cx.scanner.caret(), line_end);
    let mut title_under = false;
    if index.is_none() {
        title_under = true;
        index = Some(line_end);
    }
    let index = index.unwrap();
    if !cx.scanner.text()[cx.scanner.caret()..index].trim().is_empty() {
        read_attributes(cx.scanner, cx.diagnostics, cx.tree, node, index, 1, false);
    }
    skip_space(cx);
    get_attribute_list(cx.scanner, cx.diagnostics, cx.tree, node, '{', '}');
    if title_under && !cx.tree.node(node).attrs.contains_key("title") {
        cx.scanner.update((line_end + 1).min(cx.scanner.text().len()));
        skip_space(cx);
        if let Some((title, cont)) = is_title(cx, None) {
            let next_line_end = cx
                .scanner
                .find("\n", cont, cx.scanner.text().len())
                .unwrap_or(cx.scanner.end());
            if !cx.scanner.text()[cont..next_line_end].trim().is_empty() {
                crate::diagnostics::diag!(cx.diagnostics, MODULE, "E102", cx.scanner.copy_pos());
            } else {
                cx.tree.node_mut(node).attrs.set_text("title", title);
                cx.scanner.update(cont);
            }
        }
    }
}

pub struct ReferenceBlock;

impl Recognizer for ReferenceBlock {
    fn name(&self) -> &'static str {
        "reference_block"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let Some((node, line_end, pos)) = is_block_reference(cx) else {
            return MakeResult::None;
        };
        if cx.tree.node(node).name == "attribute_reference" {
            if cx.scanner.current_char() != Some('{') {
                read_attributes(cx.scanner, cx.diagnostics, cx.tree, node, line_end, 0, false);
            } else {
                get_attribute_list(cx.scanner, cx.diagnostics, cx.tree, node, '{', '}');
            }
        } else {
            update_link_ref(cx, node, line_end, pos);
        }
        MakeResult::List(vec![node])
    }
}

fn get_inline_info(cx: &mut ParseCx<'_>, node: NodeId, pos: Position) {
    let caret = cx.scanner.caret();
    let Some(end_info) = cx.scanner.find(")", caret + 1, cx.scanner.end()) else {
        crate::diagnostics::diag!(cx.diagnostics, MODULE, "E103", pos, [pos]);
        let name = format!("failed_{}", cx.tree.node(node).name);
        cx.tree.node_mut(node).name = name;
        return;
    };
    cx.scanner.update(caret + 1);
    match inline_re().find(&cx.scanner.text()[cx.scanner.caret()..(end_info + 1).min(cx.scanner.text().len())]) {
        Some(m) => {
            let match_end = cx.scanner.caret() + m.end();
            let url = cx.scanner.text()[cx.scanner.caret()..match_end - 1].to_string();
            let attr = if cx.tree.node(node).name == "img" { "src" } else { "href" };
            cx.tree.node_mut(node).attrs.set_text(attr, url);
            cx.scanner.update(match_end);
            skip_space(cx);
            if let Some((title, cont)) = is_title(cx, Some(end_info)) {
                cx.tree.node_mut(node).attrs.set_text("title", title);
                cx.scanner.update(cont);
            }
            if !cx.scanner.text()[cx.scanner.caret()..end_info].trim().is_empty() {
                read_attributes(cx.scanner, cx.diagnostics, cx.tree, node, end_info, 0, false);
            }
            cx.scanner.update(end_info + 1);
        }
        None => {}
    }
}

pub struct ReferenceInline;

impl Recognizer for ReferenceInline {
    fn name(&self) -> &'static str {
        "reference_inline"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        let c = cx.scanner.current_char();
        if c != Some('!') && c != Some('[') {
            return MakeResult::None;
        }
        let (is_img, ref_begin) = if c == Some('!') {
            if cx.scanner.char_at(caret + 1) != Some('[') {
                return MakeResult::None;
            }
            (true, caret + 2)
        } else {
            (false, caret + 1)
        };
        let (parity, ref_end) = check_parity(cx, ref_begin);
        if parity != 0 {
            return MakeResult::None;
        }

        if is_img {
            let pos = cx.scanner.copy_pos();
            let node = cx.tree.alloc(Node {
                kind: NodeKind::Void,
                name: "reference".to_string(),
                data: String::new(),
                attrs: Default::default(),
                children: Vec::new(),
                parent: None,
                pos,
            });
            cx.tree
                .node_mut(node)
                .attrs
                .set_text("alt", cx.scanner.text()[ref_begin..ref_end].to_string());
            cx.scanner.update(ref_end + 1);
            let ch = cx.scanner.char_at(ref_end + 1);
            match ch {
                Some('(') => {
                    cx.tree.node_mut(node).name = "img".to_string();
                    get_inline_info(cx, node, pos);
                }
                Some('[') | Some(' ') => get_inline_id(cx, node),
                _ => cx.scanner.update(ref_end + 1),
            }
            get_attribute_list(cx.scanner, cx.diagnostics, cx.tree, node, '{', '}');
            return MakeResult::List(vec![node]);
        }

        let pos = cx.scanner.copy_pos();
        let node = cx.tree.alloc(Node {
            kind: NodeKind::Element,
            name: "reference".to_string(),
            data: String::new(),
            attrs: Default::default(),
            children: Vec::new(),
            parent: None,
            pos,
        });
        cx.scanner.update(caret + 1);
        let mut scratch = Scratch::default();
        scratch.ref_end = Some(ref_end);
        MakeResult::NodeWithScratch(node, scratch)
    }

    fn close(&self, node: NodeId, cx: &mut ParseCx<'_>, scratch: &mut Scratch) -> Option<Position> {
        let ref_end = scratch.ref_end?;
        if cx.scanner.caret() != ref_end {
            return None;
        }
        cx.scanner.update(cx.scanner.caret() + 1);
        let ch = cx.scanner.char_at(ref_end + 1);
        match ch {
            Some('(') => {
                let pos = cx.tree.node(node).pos;
                cx.tree.node_mut(node).name = "a".to_string();
                get_inline_info(cx, node, pos);
            }
            Some('[') | Some(' ') => get_inline_id(cx, node),
            _ => cx.scanner.update(ref_end + 1),
        }
        get_attribute_list(cx.scanner, cx.diagnostics, cx.tree, node, '{', '}');
        Some(cx.scanner.copy_pos())
    }
}

pub const MSG: &[(&str, &str)] = &[
    ("E100", "no newline at end of file"),
    ("E101", "invalid link reference"),
    ("E102", "possible reference title detected"),
    ("E103", "incomplete inline reference at {0}"),
];
