//! # Attribute sub-parser
//!
//! Shared routine used by every recognizer that opens a tag-shaped
//! region (`<name …>`, `%%{name …}`, trailing header `{…}` blocks,
//! list item `[…]`/`{…}` blocks, and reference attribute tails):
//! `name="v"`, `name=v`, implied booleans, and the shortcut forms
//! `#id`, `.class`, `[alref]`, `@pyref`.

use crate::diagnostics::{Diagnostics, diag};
use crate::node::{NodeId, Tree};
use crate::scanner::Scanner;

const MODULE: &str = "attributes";
const WS: &str = " \t\n\r\x0c\x0b";

/// First index in `[from, limit)` whose character is in `terms`.
pub fn find_any(scanner: &Scanner, from: usize, limit: usize, terms: &str) -> Option<usize> {
    let mut i = from;
    while i < limit {
        let c = scanner.char_at(i)?;
        if terms.contains(c) {
            return Some(i);
        }
        i += c.len_utf8();
    }
    None
}

fn skip_ws_from(scanner: &Scanner, from: usize, limit: usize) -> usize {
    let mut i = from;
    while i < limit {
        match scanner.char_at(i) {
            Some(c) if WS.contains(c) => i += c.len_utf8(),
            _ => break,
        }
    }
    i
}

/// Checks for a self-closing `/` at `index`. If found, advances the
/// scanner past `end` and logs E120 (stray chars before `>`) / E121
/// (self-close on a non-void element) as appropriate.
fn is_empty(
    scanner: &mut Scanner,
    diags: &mut Diagnostics,
    index: usize,
    end: usize,
    is_void: bool,
) -> bool {
    if scanner.char_at(index) != Some('/') {
        return false;
    }
    scanner.update(end + 1);
    if end > index + 1 {
        diag!(diags, MODULE, "E120", scanner.compute(index));
    }
    if !is_void {
        diag!(diags, MODULE, "E121", scanner.compute(index));
    }
    true
}

/// `(prop, prop_index, implied, empty)`. `prop` of `None` means the
/// region is exhausted.
#[allow(clippy::type_complexity)]
fn read_prop(
    scanner: &mut Scanner,
    diags: &mut Diagnostics,
    end: usize,
    attlen_before: usize,
    attlen_now: usize,
    is_void: bool,
) -> (Option<String>, usize, bool, bool) {
    let caret = scanner.caret();
    let ws_end = skip_ws_from(scanner, caret, end);
    if is_empty(scanner, diags, ws_end, end, is_void) {
        return (None, ws_end, false, true);
    }
    if matches!(scanner.char_at(ws_end), Some('>') | Some('}')) {
        scanner.update(end + 1);
        return (None, ws_end, false, false);
    }
    let prop_index = ws_end;
    if prop_index == caret && attlen_now > attlen_before {
        diag!(diags, MODULE, "E130", scanner.copy_pos());
    }
    match find_any(scanner, prop_index, end, " \t\n\r\x0c\x0b/>=") {
        None => {
            let prop = scanner.text()[prop_index..end].to_string();
            scanner.update(end + 1);
            (Some(prop), prop_index, true, false)
        }
        Some(term_idx) => {
            let prop = scanner.text()[prop_index..term_idx].to_string();
            if is_empty(scanner, diags, term_idx, end, is_void) {
                return (Some(prop), prop_index, true, true);
            }
            if scanner.char_at(term_idx) == Some('=') {
                scanner.update(term_idx + 1);
                return (Some(prop), prop_index, false, false);
            }
            let ws2 = skip_ws_from(scanner, term_idx, end);
            if scanner.char_at(ws2) == Some('=') {
                scanner.update(ws2 + 1);
                (Some(prop), prop_index, false, false)
            } else {
                scanner.update(term_idx);
                (Some(prop), prop_index, true, false)
            }
        }
    }
}

fn read_val(scanner: &mut Scanner, diags: &mut Diagnostics, end: usize, is_void: bool) -> String {
    let caret = scanner.caret();
    let ws_end = skip_ws_from(scanner, caret, end);
    if is_empty(scanner, diags, ws_end, end, is_void) {
        return String::new();
    }
    if matches!(scanner.char_at(ws_end), Some('>') | Some('}')) {
        scanner.update(end + 1);
        return String::new();
    }
    let val_index = ws_end;
    match scanner.char_at(val_index) {
        Some(q @ ('\'' | '"')) => {
            let quote = q.to_string();
            match scanner.find(&quote, val_index + 1, end) {
                Some(idx) => {
                    scanner.update(idx + 1);
                    scanner.text()[val_index + 1..idx].to_string()
                }
                None => {
                    let pos = scanner.compute(end);
                    diag!(diags, MODULE, "E150", scanner.copy_pos(), [pos]);
                    scanner.update(end + 1);
                    scanner.text()[val_index + 1..end].to_string()
                }
            }
        }
        _ => {
            let pos = scanner.copy_pos();
            match find_any(scanner, val_index, end, " \t\n\r\x0c\x0b/>}") {
                None => {
                    let val = scanner.text()[val_index..end].to_string();
                    for item in ['\'', '"', '='] {
                        if val.contains(item) {
                            diag!(diags, MODULE, "E140", pos, [item]);
                        }
                    }
                    scanner.update(end + 1);
                    val
                }
                Some(term_idx) => {
                    if scanner.char_at(term_idx) == Some('/') {
                        diag!(diags, MODULE, "E141", pos);
                        scanner.update(term_idx);
                    } else {
                        scanner.update(term_idx);
                    }
                    let val = scanner.text()[val_index..term_idx].to_string();
                    for item in ['\'', '"', '='] {
                        if val.contains(item) {
                            diag!(diags, MODULE, "E140", pos, [item]);
                        }
                    }
                    val
                }
            }
        }
    }
}

fn handle_id_ref(
    diags: &mut Diagnostics,
    tree: &mut Tree,
    node: NodeId,
    prop: &str,
    prop_index: usize,
    pos_at: impl Fn(usize) -> crate::position::Position,
    prop_type: &str,
) {
    let label = |t: &str| match t {
        "id" => "element IDs",
        "_pyref" => "python references",
        _ => unreachable!(),
    };
    let pair = |c: char| if c == '#' { '@' } else { '#' };
    if prop.chars().count() == 1 {
        diag!(diags, MODULE, "E170", pos_at(prop_index), [label(prop_type)]);
        return;
    }
    let first = prop.chars().next().unwrap();
    let last = prop.chars().last().unwrap();
    if last == pair(first) {
        let val = &prop[first.len_utf8()..prop.len() - last.len_utf8()];
        if !val.is_empty() {
            tree.node_mut(node).attrs.set_text("_pyref", val);
            tree.node_mut(node).attrs.set_text("id", val);
        } else {
            diag!(diags, MODULE, "E171", pos_at(prop_index));
        }
    } else {
        tree.node_mut(node)
            .attrs
            .set_text(prop_type, &prop[first.len_utf8()..]);
    }
}

fn prop_shortcut(
    scanner: &Scanner,
    diags: &mut Diagnostics,
    tree: &mut Tree,
    node: NodeId,
    prop: &str,
    prop_index: usize,
) {
    let pos_at = |i: usize| scanner.compute(i);
    let first = prop.chars().next().unwrap_or(' ');
    match first {
        '@' => handle_id_ref(diags, tree, node, prop, prop_index, pos_at, "_pyref"),
        '#' => handle_id_ref(diags, tree, node, prop, prop_index, pos_at, "id"),
        _ if prop == "id" => {
            diag!(diags, MODULE, "E170", pos_at(prop_index), ["element IDs"]);
        }
        '.' => tree.node_mut(node).attrs.append_class(&prop[1..]),
        '[' if prop.ends_with(']') => {
            let val = prop[1..prop.len() - 1].to_lowercase();
            tree.node_mut(node).attrs.push_alref(pos_at(prop_index), val);
        }
        _ => {
            tree.node_mut(node).attrs.set_text(prop, "");
        }
    }
}

/// Parses `name="v" name=v name @ref #id .cls [alref]` style attributes
/// out of `scanner.text()[caret..end]` and writes them onto `node`.
/// Returns `true` if the region ended with a self-closing `/`.
pub fn read_attributes(
    scanner: &mut Scanner,
    diags: &mut Diagnostics,
    tree: &mut Tree,
    node: NodeId,
    end: usize,
    skip: usize,
    is_void: bool,
) -> bool {
    let attlen_before = tree.node(node).attrs.len();
    loop {
        if scanner.caret() >= end {
            break;
        }
        let attlen_now = tree.node(node).attrs.len();
        let (prop, prop_index, implied, empty) =
            read_prop(scanner, diags, end, attlen_before, attlen_now, is_void);
        let Some(prop) = prop.filter(|p| !p.is_empty()) else {
            scanner.update(end + skip);
            return empty;
        };
        if tree.node(node).attrs.contains_key(&prop) {
            diag!(diags, MODULE, "E160", scanner.compute(prop_index), [prop]);
        }
        if implied {
            prop_shortcut(scanner, diags, tree, node, &prop, prop_index);
            if empty {
                scanner.update(end + skip);
                return empty;
            }
        } else {
            let val = read_val(scanner, diags, end, is_void);
            tree.node_mut(node).attrs.set_text(prop, val);
        }
    }
    scanner.update(end + skip);
    false
}

/// Looks for a `{…}` block at the caret and, if present, parses it as
/// an attribute region (used for trailing header/inline-pattern
/// attribute blocks).
pub fn get_attribute_list(
    scanner: &mut Scanner,
    diags: &mut Diagnostics,
    tree: &mut Tree,
    node: NodeId,
    start: char,
    end_char: char,
) {
    if scanner.current_char() != Some(start) {
        return;
    }
    let caret = scanner.caret();
    let Some(index) = scanner.find(&end_char.to_string(), caret, scanner.end()) else {
        return;
    };
    scanner.update(caret + start.len_utf8());
    read_attributes(scanner, diags, tree, node, index, 1, false);
}

pub const MSG: &[(&str, &str)] = &[
    ("E120", "`/` not immediately followed by `>`"),
    ("E121", "self-closing syntax (`/>`) used in non-void element"),
    ("E130", "no space between attributes"),
    ("E140", "`{0}` found in unquoted attribute value"),
    ("E141", "`/` found in unquoted attribute value"),
    ("E150", "assuming quoted attribute to close at {0}"),
    ("E160", "attribute name \"{0}\" has already been declared"),
    ("E170", "{0} cannot be empty"),
    ("E171", "python references and element ids cannot be empty"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{AttrValue, Node, NodeKind};
    use crate::position::Position;

    fn new_node(tree: &mut Tree, name: &str) -> NodeId {
        tree.alloc(Node {
            kind: NodeKind::Element,
            name: name.to_string(),
            data: String::new(),
            attrs: Default::default(),
            children: Vec::new(),
            parent: None,
            pos: Position::default(),
        })
    }

    #[test]
    fn parses_quoted_attribute() {
        let mut scanner = Scanner::new(r#"att1="val1">"#, "t");
        let mut diags = Diagnostics::new();
        let mut tree = Tree::new();
        let node = new_node(&mut tree, "div");
        let end = scanner.text().find('>').unwrap();
        read_attributes(&mut scanner, &mut diags, &mut tree, node, end, 1, false);
        assert_eq!(tree.node(node).attrs.get_text("att1"), Some("val1"));
        assert!(diags.is_empty());
    }

    #[test]
    fn duplicate_attribute_logs_e160() {
        let mut scanner = Scanner::new(r#"a="1" a="2">"#, "t");
        let mut diags = Diagnostics::new();
        let mut tree = Tree::new();
        let node = new_node(&mut tree, "div");
        let end = scanner.text().find('>').unwrap();
        read_attributes(&mut scanner, &mut diags, &mut tree, node, end, 1, false);
        assert_eq!(tree.node(node).attrs.get_text("a"), Some("2"));
        assert_eq!(diags.iter().filter(|d| d.code == "E160").count(), 1);
    }

    #[test]
    fn shortcut_id_and_class() {
        let mut scanner = Scanner::new("#intro .lead>", "t");
        let mut diags = Diagnostics::new();
        let mut tree = Tree::new();
        let node = new_node(&mut tree, "div");
        let end = scanner.text().find('>').unwrap();
        read_attributes(&mut scanner, &mut diags, &mut tree, node, end, 1, false);
        assert_eq!(tree.node(node).attrs.get_text("id"), Some("intro"));
        assert_eq!(tree.node(node).attrs.get_text("class"), Some("lead"));
    }

    #[test]
    fn paired_id_pyref_shortcut() {
        let mut scanner = Scanner::new("#sec3@>", "t");
        let mut diags = Diagnostics::new();
        let mut tree = Tree::new();
        let node = new_node(&mut tree, "h3");
        let end = scanner.text().find('>').unwrap();
        read_attributes(&mut scanner, &mut diags, &mut tree, node, end, 1, false);
        assert_eq!(tree.node(node).attrs.get_text("id"), Some("sec3"));
        assert_eq!(tree.node(node).attrs.get_text("_pyref"), Some("sec3"));
    }

    #[test]
    fn empty_id_shortcut_logs_e170() {
        let mut scanner = Scanner::new("#>", "t");
        let mut diags = Diagnostics::new();
        let mut tree = Tree::new();
        let node = new_node(&mut tree, "h1");
        let end = scanner.text().find('>').unwrap();
        read_attributes(&mut scanner, &mut diags, &mut tree, node, end, 1, false);
        assert_eq!(diags.iter().next().unwrap().code, "E170");
    }

    #[test]
    fn alref_shortcut_accumulates() {
        let mut scanner = Scanner::new("[one] [two]>", "t");
        let mut diags = Diagnostics::new();
        let mut tree = Tree::new();
        let node = new_node(&mut tree, "div");
        let end = scanner.text().find('>').unwrap();
        read_attributes(&mut scanner, &mut diags, &mut tree, node, end, 1, false);
        match tree.node(node).attrs.get("_alref") {
            Some(AttrValue::AlRefs(v)) => assert_eq!(v.len(), 2),
            other => panic!("expected AlRefs, got {other:?}"),
        }
    }
}
