//! `<![CDATA[...]]>` sections, passed through verbatim.

use crate::node::{Node, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

const MODULE: &str = "cdata";
const OPEN: &str = "<![CDATA[";
const CLOSE: &str = "]]>";

pub struct CData;

impl Recognizer for CData {
    fn name(&self) -> &'static str {
        "cdata"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        if !cx.scanner.startswith_at(caret, OPEN) {
            return MakeResult::None;
        }
        let pos = cx.scanner.copy_pos();
        let content_start = caret + OPEN.len();
        match cx.scanner.find(CLOSE, content_start, cx.scanner.end()) {
            Some(idx) => {
                let data = cx.scanner.text()[content_start..idx].to_string();
                cx.scanner.update(idx + CLOSE.len());
                let node = cx.tree.alloc(Node {
                    kind: NodeKind::CData,
                    name: String::new(),
                    data,
                    attrs: Default::default(),
                    children: Vec::new(),
                    parent: None,
                    pos,
                });
                MakeResult::List(vec![node])
            }
            None => {
                crate::diagnostics::diag!(cx.diagnostics, MODULE, "E100", pos);
                let data = cx.scanner.text()[content_start..].to_string();
                cx.scanner.update(cx.scanner.end());
                let node = cx.tree.alloc(Node {
                    kind: NodeKind::CData,
                    name: String::new(),
                    data,
                    attrs: Default::default(),
                    children: Vec::new(),
                    parent: None,
                    pos,
                });
                MakeResult::List(vec![node])
            }
        }
    }
}

pub const MSG: &[(&str, &str)] = &[("E100", "`]]>` not found, CDATA section runs to end of input")];

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
    fn parses_cdata_section() {
        let mut scanner = Scanner::new("<![CDATA[a < b]]>rest", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match CData.make_node(&mut cx) {
            MakeResult::List(ids) => assert_eq!(tree.node(ids[0]).data, "a < b"),
            _ => panic!("expected CData"),
        }
        assert_eq!(scanner.caret(), "<![CDATA[a < b]]>".len());
    }

    #[test]
    fn missing_close_logs_e100() {
        let mut scanner = Scanner::new("<![CDATA[oops", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        CData.make_node(&mut cx);
        assert_eq!(diags.len(), 1);
    }
}
