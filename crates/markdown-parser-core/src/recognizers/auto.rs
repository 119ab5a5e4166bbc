//! `<user@domain>` and `<scheme://...>` autolinks.

use regex::Regex;
use std::sync::OnceLock;

use crate::attributes::get_attribute_list;
use crate::node::{Node, NodeId, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

fn mail_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([^> !]*@[^> ]*)").unwrap())
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^((?:f|ht)tps?://[^>]*)").unwrap())
}

fn anchor(cx: &mut ParseCx<'_>, href: String, text: String) -> NodeId {
    let pos = cx.scanner.copy_pos();
    let node = cx.tree.alloc(Node {
        kind: NodeKind::Element,
        name: "a".to_string(),
        data: String::new(),
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    });
    cx.tree.node_mut(node).attrs.set_text("href", href);
    let text_node = cx.tree.alloc(Node {
        kind: NodeKind::Text,
        name: String::new(),
        data: text,
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    });
    cx.tree.append_child(node, text_node);
    node
}

fn bracketed(cx: &ParseCx<'_>, begin: usize, end: usize) -> Option<usize> {
    if cx.scanner.char_at(begin) != Some('<') {
        return None;
    }
    cx.scanner.find(">", begin, end)
}

/// If the scanner holds a well-formed `<user@domain>` at `begin`, returns
/// the index just past the closing `>` without consuming the scanner.
pub fn is_auto_mail(cx: &ParseCx<'_>, begin: usize, end: usize) -> Option<usize> {
    let index = bracketed(cx, begin, end)?;
    let candidate = &cx.scanner.text()[begin + 1..index];
    mail_re().find(candidate)?;
    Some(index + 1)
}

/// If the scanner holds a well-formed `<scheme://...>` at `begin`, returns
/// the index just past the closing `>` without consuming the scanner.
pub fn is_auto_link(cx: &ParseCx<'_>, begin: usize, end: usize) -> Option<usize> {
    let index = bracketed(cx, begin, end)?;
    let candidate = &cx.scanner.text()[begin + 1..index];
    url_re().find(candidate)?;
    Some(index + 1)
}

pub struct AutoMail;

impl Recognizer for AutoMail {
    fn name(&self) -> &'static str {
        "auto_mail"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        let Some(index) = bracketed(cx, caret, cx.scanner.end()) else {
            return MakeResult::None;
        };
        let candidate = &cx.scanner.text()[caret + 1..index];
        if mail_re().find(candidate).is_none() {
            return MakeResult::None;
        }
        let email = candidate.to_string();
        let node = anchor(cx, format!("mailto:{email}"), email);
        cx.scanner.update(index + 1);
        get_attribute_list(cx.scanner, cx.diagnostics, cx.tree, node, '{', '}');
        MakeResult::List(vec![node])
    }
}

pub struct AutoLink;

impl Recognizer for AutoLink {
    fn name(&self) -> &'static str {
        "auto_link"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        let Some(index) = bracketed(cx, caret, cx.scanner.end()) else {
            return MakeResult::None;
        };
        let candidate = &cx.scanner.text()[caret + 1..index];
        if url_re().find(candidate).is_none() {
            return MakeResult::None;
        }
        let url = candidate.to_string();
        let node = anchor(cx, url.clone(), url);
        cx.scanner.update(index + 1);
        get_attribute_list(cx.scanner, cx.diagnostics, cx.tree, node, '{', '}');
        MakeResult::List(vec![node])
    }
}
