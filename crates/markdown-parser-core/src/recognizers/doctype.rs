//! `<!doctype html>` / `%%!doctype html%%`, case-insensitively.

use crate::node::{Node, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

const MODULE: &str = "doctype";

fn doctype_node(data: String, pos: crate::position::Position) -> Node {
    Node {
        kind: NodeKind::DocumentType,
        name: String::new(),
        data,
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    }
}

fn regular(cx: &mut ParseCx<'_>, caret: usize) -> Option<MakeResult> {
    if !matches!(cx.scanner.char_at(caret + 9), Some(' ' | '\t' | '\n' | '\r' | '\x0c' | '\x0b')) {
        return None;
    }
    let pos = cx.scanner.copy_pos();
    match cx.scanner.find(">", caret + 10, cx.scanner.end()) {
        Some(idx) => {
            let data = cx.scanner.text()[caret + 10..idx].to_string();
            cx.scanner.update(idx + 1);
            Some(MakeResult::List(vec![cx.tree.alloc(doctype_node(data, pos))]))
        }
        None => {
            crate::diagnostics::diag!(cx.diagnostics, MODULE, "E100", pos, [">"]);
            let data = cx.scanner.text()[caret + 10..].to_string();
            cx.scanner.update(cx.scanner.end());
            Some(MakeResult::List(vec![cx.tree.alloc(doctype_node(data, pos))]))
        }
    }
}

fn new_form(cx: &mut ParseCx<'_>, caret: usize) -> Option<MakeResult> {
    if !matches!(cx.scanner.char_at(caret + 10), Some(' ' | '\t' | '\n' | '\r' | '\x0c' | '\x0b')) {
        return None;
    }
    let pos = cx.scanner.copy_pos();
    match cx.scanner.find("%%", caret + 11, cx.scanner.end()) {
        Some(idx) => {
            let data = cx.scanner.text()[caret + 11..idx].to_string();
            cx.scanner.update(idx + 2);
            Some(MakeResult::List(vec![cx.tree.alloc(doctype_node(data, pos))]))
        }
        None => {
            crate::diagnostics::diag!(cx.diagnostics, MODULE, "E100", pos, ["%%"]);
            let data = cx.scanner.text()[caret + 11..].to_string();
            cx.scanner.update(cx.scanner.end());
            Some(MakeResult::List(vec![cx.tree.alloc(doctype_node(data, pos))]))
        }
    }
}

pub struct DocType;

impl Recognizer for DocType {
    fn name(&self) -> &'static str {
        "doctype"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        let nine = cx.scanner.peek(9).to_lowercase();
        if nine == "<!doctype" {
            if let Some(result) = regular(cx, caret) {
                return result;
            }
            return MakeResult::None;
        }
        let ten = cx.scanner.peek(10).to_lowercase();
        if ten == "%%!doctype" {
            if let Some(result) = new_form(cx, caret) {
                return result;
            }
        }
        MakeResult::None
    }
}

pub const MSG: &[(&str, &str)] = &[("E100", "`{0}` not found")];

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
    fn parses_regular_doctype() {
        let mut scanner = Scanner::new("<!doctype html>rest", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match DocType.make_node(&mut cx) {
            MakeResult::List(ids) => assert_eq!(tree.node(ids[0]).data, "html"),
            _ => panic!("expected DocumentType"),
        }
    }
}
