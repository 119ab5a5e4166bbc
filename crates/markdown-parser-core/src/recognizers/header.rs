//! ATX (`# Heading {#id}`) and Setext (`Heading\n===`) style headers.
//! Both share the same trailing-attribute-block detection: a `{...}`
//! block on the same line as the content, immediately before the
//! newline, with nothing but whitespace between it and the newline,
//! preceded by a character appropriate to that header style.

use regex::Regex;
use std::sync::OnceLock;

use crate::attributes::get_attribute_list;
use crate::dispatcher::Scratch;
use crate::node::{Node, NodeId, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

fn setext_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^.*?\n[=-]+[ ]*(\n|$)").unwrap())
}

/// Shared trailing `{...}` detection. `boundary_chars` is the set of
/// characters allowed immediately before `{` for the block to count
/// (ATX allows a trailing `#`, Setext doesn't).
fn detect_attribute_block(
    cx: &ParseCx<'_>,
    caret: usize,
    content_start: usize,
    line_end: usize,
    boundary_chars: &str,
) -> (bool, Option<usize>) {
    let Some(right_b) = cx.scanner.rfind("}", content_start, line_end) else {
        return (false, None);
    };
    if !cx.scanner.text()[right_b + 1..line_end].trim().is_empty() {
        return (false, None);
    }
    let Some(left_b) = cx.scanner.rfind("{", caret, right_b) else {
        return (false, None);
    };
    if left_b == 0 {
        return (false, None);
    }
    let boundary = cx.scanner.char_at(left_b - 1);
    if boundary.is_some_and(|c| boundary_chars.contains(c)) {
        (true, Some(left_b))
    } else {
        (false, None)
    }
}

/// Strips trailing `#`s (and the whitespace before them) from the ATX
/// content end, the way a closing `## Heading ##` only decorates.
fn trim_trailing_hashes(cx: &ParseCx<'_>, content_end: usize) -> usize {
    let mut index = content_end;
    if index == 0 {
        return content_end;
    }
    index -= 1;
    while index > 0 && matches!(cx.scanner.char_at(index), Some(' ' | '\t' | '\r' | '\x0c' | '\x0b')) {
        index -= 1;
    }
    while index > 0 && cx.scanner.char_at(index) == Some('#') {
        index -= 1;
    }
    if cx.scanner.char_at(index + 1) == Some('#') {
        index + 1
    } else {
        content_end
    }
}

fn finish_close(
    cx: &mut ParseCx<'_>,
    node: NodeId,
    scratch: &Scratch,
) -> Option<crate::position::Position> {
    if scratch.att {
        cx.scanner.update(scratch.left_b.unwrap());
        get_attribute_list(cx.scanner, cx.diagnostics, cx.tree, node, '{', '}');
    }
    let pos = cx.scanner.copy_pos();
    cx.scanner.update(scratch.final_pos.unwrap());
    get_attribute_list(cx.scanner, cx.diagnostics, cx.tree, node, '{', '}');
    Some(pos)
}

pub struct AtxHeader;

impl Recognizer for AtxHeader {
    fn name(&self) -> &'static str {
        "atx_header"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        if cx.scanner.current_char() != Some('#') {
            return MakeResult::None;
        }
        let mut index = caret + 1;
        let mut level = 1u32;
        while cx.scanner.char_at(index) == Some('#') {
            index += 1;
            level += 1;
            if level == 6 {
                break;
            }
        }
        let pos = cx.scanner.copy_pos();
        let node = cx.tree.alloc(Node {
            kind: NodeKind::Element,
            name: format!("h{level}"),
            data: String::new(),
            attrs: Default::default(),
            children: Vec::new(),
            parent: None,
            pos,
        });
        cx.scanner.update(index);
        get_attribute_list(cx.scanner, cx.diagnostics, cx.tree, node, '{', '}');
        let content_start = cx.scanner.skip_space(" \t");
        let line_end = cx
            .scanner
            .find("\n", content_start, cx.scanner.end())
            .unwrap_or_else(|| cx.scanner.end());
        let final_pos = (line_end + 1).min(cx.scanner.text().len());
        let (att, left_b) = detect_attribute_block(cx, caret, content_start, line_end, " \t#");
        let raw_content_end = if att { left_b.unwrap() } else { line_end };
        let content_end = trim_trailing_hashes(cx, raw_content_end);

        let mut scratch = Scratch::default();
        scratch.content_end = Some(content_end);
        scratch.att = att;
        scratch.left_b = left_b;
        scratch.final_pos = Some(final_pos);
        MakeResult::NodeWithScratch(node, scratch)
    }

    fn close(&self, node: NodeId, cx: &mut ParseCx<'_>, scratch: &mut Scratch) -> Option<crate::position::Position> {
        if scratch.content_end != Some(cx.scanner.caret()) {
            return None;
        }
        finish_close(cx, node, scratch)
    }
}

pub struct SetextHeader;

impl Recognizer for SetextHeader {
    fn name(&self) -> &'static str {
        "setext_header"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        let Some(m) = cx.scanner.match_at(setext_re(), caret) else {
            return MakeResult::None;
        };
        let end = m.end();
        let Some(line_end) = cx.scanner.find("\n", caret, cx.scanner.end()) else {
            return MakeResult::None;
        };
        let level = if cx.scanner.char_at(line_end + 1) == Some('-') { 2 } else { 1 };
        let pos = cx.scanner.copy_pos();
        let node = cx.tree.alloc(Node {
            kind: NodeKind::Element,
            name: format!("h{level}"),
            data: String::new(),
            attrs: Default::default(),
            children: Vec::new(),
            parent: None,
            pos,
        });
        let content_start = cx.scanner.skip_space(" \t");
        let final_pos = caret + end;
        let (att, left_b) = detect_attribute_block(cx, caret, content_start, line_end, " \t");
        let content_end = if att { left_b.unwrap() } else { line_end };

        let mut scratch = Scratch::default();
        scratch.content_end = Some(content_end);
        scratch.att = att;
        scratch.left_b = left_b;
        scratch.final_pos = Some(final_pos);
        MakeResult::NodeWithScratch(node, scratch)
    }

    fn close(&self, node: NodeId, cx: &mut ParseCx<'_>, scratch: &mut Scratch) -> Option<crate::position::Position> {
        if scratch.content_end != Some(cx.scanner.caret()) {
            return None;
        }
        finish_close(cx, node, scratch)
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
    fn atx_level_and_content_bounds() {
        let mut scanner = Scanner::new("### Title\nbody", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match AtxHeader.make_node(&mut cx) {
            MakeResult::NodeWithScratch(id, scratch) => {
                assert_eq!(tree.node(id).name, "h3");
                assert_eq!(scratch.content_end, Some(9));
            }
            _ => panic!("expected h3"),
        }
    }

    #[test]
    fn setext_dashes_mean_h2() {
        let mut scanner = Scanner::new("Title\n---\nbody", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match SetextHeader.make_node(&mut cx) {
            MakeResult::NodeWithScratch(id, _) => assert_eq!(tree.node(id).name, "h2"),
            _ => panic!("expected h2"),
        }
    }
}
