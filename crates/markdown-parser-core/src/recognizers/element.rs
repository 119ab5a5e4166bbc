//! HTML-like elements in either bracket form:
//!
//! ```text
//! <tagname att1="val1">...</tagname>
//! %%{tagname #id .class1}...%%
//! %%{#id .class1}...%%
//! ```
//!
//! A bare `%%{...}` (no leading name, or one starting with a shortcut
//! character) defaults to `span`. This is the busiest recognizer: it
//! owns void/rawtext classification, auto-closing of optional end
//! tags, and delegates attribute parsing to [`crate::attributes`].

use crate::attributes::{find_any, read_attributes};
use crate::node::{Node, NodeId, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

const MODULE: &str = "element";

const VOID_ELEMENT: &[&str] = &[
    "area", "base", "basefont", "br", "col", "frame", "hr", "img", "input", "isindex", "link",
    "meta", "param", "command", "embed", "keygen", "source", "track", "wbr", "include",
    "documentclass", "bibliography",
];
const RAWTEXT_ELEMENT: &[&str] = &["script", "style", "textarea", "title", "undef", "usepackage"];

fn auto_close(name: &str) -> &'static [&'static str] {
    match name {
        "p" => &[
            "address", "article", "aside", "blockquote", "dir", "div", "dl", "fieldset",
            "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup", "hr",
            "main", "menu", "nav", "ol", "p", "pre", "section", "table", "ul",
        ],
        "a" => &["a"],
        _ => &[],
    }
}

fn auto_close_first(name: &str) -> &'static [&'static str] {
    match name {
        "li" => &["li"],
        "dt" => &["dt", "dd"],
        "dd" => &["dt", "dd"],
        "rt" => &["rt", "rp"],
        "rp" => &["rt", "rp"],
        "optgroup" => &["optgroup"],
        "option" => &["optgroup", "option"],
        "thead" => &["tbody", "tfoot"],
        "tbody" => &["tbody", "tfoot"],
        "tfoot" => &["tbody"],
        "tr" => &["tr"],
        "td" => &["td", "th"],
        "th" => &["td", "th"],
        _ => &[],
    }
}

fn end_char(shift: usize) -> char {
    if shift == 1 { '>' } else { '}' }
}

/// `Some((endindex, shift))` if the caret sits at the start of an
/// opening tag. `shift` is `1` for `<name`, `3` for `%%{name`.
fn is_element(cx: &mut ParseCx<'_>) -> Option<(usize, usize)> {
    let caret = cx.scanner.caret();
    let mut search = false;
    let shift;
    if cx.scanner.char_at(caret) == Some('<') {
        shift = 1;
    } else if cx.scanner.startswith("%%{") {
        shift = 3;
        if cx.scanner.char_at(caret + 3) == Some('}') {
            return Some((caret + 4, shift));
        }
        if matches!(cx.scanner.char_at(caret + 3), Some('.' | '#' | '@' | '[')) {
            search = true;
        }
    } else {
        return None;
    }
    let c = cx.scanner.char_at(caret + shift);
    let ok = search || c.is_some_and(|c| c.is_alphabetic() || c == ':' || c == '_');
    if !ok {
        return None;
    }
    let target = end_char(shift).to_string();
    let Some(end_idx) = cx.scanner.find(&target, caret + shift, cx.scanner.end()) else {
        return None;
    };
    if let Some(lt) = cx.scanner.find("<", caret + 1, cx.scanner.end()) {
        if lt < end_idx {
            let pos = cx.scanner.compute(lt);
            crate::diagnostics::diag!(
                cx.diagnostics,
                MODULE,
                "E100",
                cx.scanner.copy_pos(),
                [pos]
            );
            return None;
        }
    }
    Some((end_idx, shift))
}

/// If `from` sits at the start of an opening tag, returns its lowercased
/// tag name without consuming the scanner or emitting diagnostics.
/// Unlike [`is_element`], this never commits to a parse decision — it's
/// a pure lookahead other recognizers use to decide whether to yield.
pub fn get_tagname(cx: &ParseCx<'_>, from: usize) -> Option<String> {
    let shift;
    if cx.scanner.char_at(from) == Some('<') {
        shift = 1;
    } else if cx.scanner.startswith_at(from, "%%{") {
        shift = 3;
        if cx.scanner.char_at(from + 3) == Some('}') {
            return Some("span".to_string());
        }
    } else {
        return None;
    }
    let c = cx.scanner.char_at(from + shift);
    let search = shift == 3 && matches!(c, Some('.' | '#' | '@' | '['));
    let ok = search || c.is_some_and(|c| c.is_alphabetic() || c == ':' || c == '_');
    if !ok {
        return None;
    }
    let end = cx.scanner.end();
    let raw = match find_any(cx.scanner, from + shift, end, " \t\n\r\x0c\x0b/>}") {
        Some(term) => cx.scanner.text()[from + shift..term].to_string(),
        None => cx.scanner.text()[from + shift..end].to_string(),
    };
    let mut tagname = raw.to_lowercase();
    if tagname.is_empty() || matches!(tagname.chars().next(), Some('.' | '#' | '!' | '@')) {
        tagname = "span".to_string();
    }
    Some(tagname)
}

fn tagname_at(cx: &mut ParseCx<'_>, from: usize) -> (String, usize) {
    let end = cx.scanner.end();
    match find_any(cx.scanner, from, end, " \t\n\r\x0c\x0b/>}") {
        Some(term) => (cx.scanner.text()[from..term].to_string(), term),
        None => (cx.scanner.text()[from..end].to_string(), end),
    }
}

fn get_raw_text(cx: &mut ParseCx<'_>, tagname: &str, pos: crate::position::Position, shift: usize) -> String {
    let caret = cx.scanner.caret();
    let (content, next) = if shift == 3 {
        match cx.scanner.find("%%", caret, cx.scanner.end()) {
            Some(idx) => (cx.scanner.text()[caret..idx].to_string(), Some(idx + 2)),
            None => (String::new(), None),
        }
    } else {
        let end_tag = format!("</{tagname}>");
        let mut idx = cx.scanner.find("<", caret, cx.scanner.end());
        loop {
            match idx {
                Some(i) => {
                    if cx
                        .scanner
                        .text()
                        .get(i..i + end_tag.len())
                        .map(|s| s.eq_ignore_ascii_case(&end_tag))
                        .unwrap_or(false)
                    {
                        break (cx.scanner.text()[caret..i].to_string(), Some(i + end_tag.len()));
                    }
                    idx = cx.scanner.find("<", i + 1, cx.scanner.end());
                }
                None => break (String::new(), None),
            }
        }
    };
    match next {
        Some(n) => {
            cx.scanner.update(n);
            content
        }
        None => {
            let start_marker = if shift == 3 { "%%{" } else { "<" };
            let end_marker = if shift == 3 { "%%".to_string() } else { format!("</{tagname}>") };
            crate::diagnostics::diag!(
                cx.diagnostics,
                MODULE,
                "E110",
                pos,
                [start_marker, tagname, end_marker]
            );
            let rest = cx.scanner.text()[caret..].to_string();
            cx.scanner.update(cx.scanner.end());
            rest
        }
    }
}

pub struct Element;

impl Element {
    /// `None` = not closable yet, keep scanning; `Some(None)` = closed
    /// with no further tag to re-trial; `Some(Some(tmptag))` = closed
    /// because `tmptag` (the next opening tag's name) triggers
    /// auto-close and must still be matched against this context.
    fn is_done(cx: &mut ParseCx<'_>, name: &str, shift: u8) -> Option<()> {
        let caret = cx.scanner.caret();
        if shift == 1 {
            if cx.scanner.char_at(caret) != Some('<') {
                return None;
            }
            if cx.scanner.char_at(caret + 1) == Some('/') {
                let Some(idx) = cx.scanner.find(">", caret + 2, cx.scanner.end()) else {
                    return None;
                };
                let tmptag = cx.scanner.text()[caret + 2..idx].to_lowercase();
                if name == tmptag {
                    return Some(());
                }
                None
            } else if is_element(cx).is_some() {
                Some(())
            } else {
                None
            }
        } else {
            if cx.scanner.startswith("%%?") || cx.scanner.startswith("%%!") {
                return None;
            }
            if is_element(cx).is_some() {
                Some(())
            } else if cx.scanner.startswith("%%") {
                Some(())
            } else {
                None
            }
        }
    }
}

impl Recognizer for Element {
    fn name(&self) -> &'static str {
        "element"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        let Some((endindex, shift)) = is_element(cx) else {
            return MakeResult::None;
        };
        let pos = cx.scanner.copy_pos();
        let (raw_name, term) = tagname_at(cx, caret + shift);
        let mut tagname = raw_name.to_lowercase();
        if tagname.is_empty() || matches!(tagname.chars().next(), Some('.' | '#' | '!' | '@')) {
            tagname = "span".to_string();
            cx.scanner.update(caret + 3);
        } else {
            cx.scanner.update(term);
        }

        let is_void = VOID_ELEMENT.contains(&tagname.as_str());
        let is_raw = RAWTEXT_ELEMENT.contains(&tagname.as_str());
        let kind = if is_void {
            NodeKind::Void
        } else if is_raw {
            NodeKind::RawText
        } else {
            NodeKind::Element
        };
        let node = cx.tree.alloc(Node {
            kind,
            name: tagname.clone(),
            data: String::new(),
            attrs: Default::default(),
            children: Vec::new(),
            parent: None,
            pos,
        });

        if cx.scanner.current_char() == Some(end_char(shift)) {
            cx.scanner.update(cx.scanner.caret() + 1);
        } else if cx.scanner.current_char() == Some('/') {
            cx.scanner.update(endindex + 1);
        } else {
            read_attributes(cx.scanner, cx.diagnostics, cx.tree, node, endindex, 1, is_void);
        }

        if is_void {
            return MakeResult::List(vec![node]);
        }
        if is_raw {
            let data = get_raw_text(cx, &tagname, pos, shift);
            cx.tree.node_mut(node).data = data;
            return MakeResult::List(vec![node]);
        }
        let mut scratch = crate::dispatcher::Scratch::default();
        scratch.type_ = Some(shift as u8);
        MakeResult::NodeWithScratch(node, scratch)
    }

    fn close(
        &self,
        node: NodeId,
        cx: &mut ParseCx<'_>,
        scratch: &mut crate::dispatcher::Scratch,
    ) -> Option<crate::position::Position> {
        let shift = scratch.type_.unwrap_or(1);
        let name = cx.tree.node(node).name.clone();
        Self::is_done(cx, &name, shift)?;
        let caret = cx.scanner.caret();
        if cx.scanner.char_at(caret) == Some('<') && cx.scanner.char_at(caret + 1) == Some('/') {
            let idx = cx.scanner.find(">", caret + 2, cx.scanner.end())?;
            let tmptag = cx.scanner.text()[caret + 2..idx].to_lowercase();
            if name == tmptag {
                let pos = cx.scanner.copy_pos();
                cx.scanner.update(idx + 1);
                return Some(pos);
            }
        }
        let (tmptag, _) = tagname_at(cx, caret + shift as usize);
        let tmptag = tmptag.to_lowercase();
        if auto_close(&name).contains(&tmptag.as_str()) {
            return Some(cx.scanner.copy_pos());
        }
        if !auto_close_first(&name).is_empty() {
            let has_element = cx
                .tree
                .node(node)
                .children
                .iter()
                .any(|&c| cx.tree.node(c).is_element_like());
            if !has_element && auto_close_first(&name).contains(&tmptag.as_str()) {
                return Some(cx.scanner.copy_pos());
            }
        }
        None
    }
}

pub const MSG: &[(&str, &str)] = &[
    ("E100", "element discarded due to `<` at {0}"),
    ("E110", "`RawText` {0}{1} closing tag `{2}` not found"),
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
    fn parses_simple_element_with_attribute() {
        let mut scanner = Scanner::new(r#"<div id="x">body</div>"#, "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match Element.make_node(&mut cx) {
            MakeResult::NodeWithScratch(id, _) => {
                assert_eq!(tree.node(id).name, "div");
                assert_eq!(tree.node(id).attrs.get_text("id"), Some("x"));
            }
            _ => panic!("expected open Element node"),
        }
    }

    #[test]
    fn void_element_is_self_contained() {
        let mut scanner = Scanner::new(r#"<br>"#, "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match Element.make_node(&mut cx) {
            MakeResult::List(ids) => assert_eq!(tree.node(ids[0]).kind, NodeKind::Void),
            _ => panic!("expected Void list"),
        }
    }

    #[test]
    fn bracket_form_defaults_to_span() {
        let mut scanner = Scanner::new("%%{#a}x%%", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match Element.make_node(&mut cx) {
            MakeResult::NodeWithScratch(id, _) => {
                assert_eq!(tree.node(id).name, "span");
                assert_eq!(tree.node(id).attrs.get_text("id"), Some("a"));
            }
            _ => panic!("expected open span"),
        }
    }
}
