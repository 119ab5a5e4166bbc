//! `<% expr %>`, a shorthand for the `?py_eval` processing instruction.

use crate::node::{Node, NodeId, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

const MODULE: &str = "eval";
const TARGET: &str = "?py_eval";

fn assemble_node(cx: &mut ParseCx<'_>, content: &str, pos: crate::position::Position) -> Vec<NodeId> {
    let mut body = content.trim().to_string();
    body.push('\n');
    if let Err(message) = cx.code_sink.compile(cx.scanner.uri(), &body, "eval") {
        crate::diagnostics::diag!(cx.diagnostics, MODULE, "E103", pos);
        let err_node = cx.tree.alloc(Node {
            kind: NodeKind::Element,
            name: "python_pi_error".to_string(),
            data: String::new(),
            attrs: Default::default(),
            children: Vec::new(),
            parent: None,
            pos,
        });
        let err_data = cx.tree.alloc(Node {
            kind: NodeKind::CData,
            name: String::new(),
            data: message,
            attrs: Default::default(),
            children: Vec::new(),
            parent: None,
            pos: crate::position::Position::new(pos.line, pos.column + 1 + TARGET.chars().count() as u32),
        });
        cx.tree.append_child(err_node, err_data);
        return vec![err_node];
    }
    vec![cx.tree.alloc(Node {
        kind: NodeKind::ProcessingInstruction,
        name: TARGET.to_string(),
        data: body,
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    })]
}

pub struct Eval;

impl Recognizer for Eval {
    fn name(&self) -> &'static str {
        "eval"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        if cx.scanner.peek(2) != "<%" {
            return MakeResult::None;
        }
        let pos = cx.scanner.copy_pos();
        let start = caret + 2;
        match cx.scanner.find("%>", start, cx.scanner.end()) {
            None => {
                crate::diagnostics::diag!(cx.diagnostics, MODULE, "E101", pos);
                let content = cx.scanner.text()[start..cx.scanner.end()].to_string();
                cx.scanner.update(cx.scanner.end());
                MakeResult::List(assemble_node(cx, &content, pos))
            }
            Some(index) => {
                let content = cx.scanner.text()[start..index].to_string();
                cx.scanner.update(index + 2);
                MakeResult::List(assemble_node(cx, &content, pos))
            }
        }
    }
}

pub const MSG: &[(&str, &str)] = &[
    ("E101", "`<%` was started but `%>` was not found"),
    ("E103", "errors in py_eval processing instruction"),
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
    fn unterminated_eval_logs_e101_and_still_assembles() {
        let mut scanner = Scanner::new("<%a + b", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        Eval.make_node(&mut cx);
        assert_eq!(diags.iter().filter(|d| d.code == "E101").count(), 1);
    }
}
