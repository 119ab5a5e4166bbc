//! Processing instructions: `<?target content?>` or the bracket form
//! `%%?target content%%`. `?py`/`?python`/`?py_eval` targets are run
//! through the injected [`crate::recognizer::CodeSink`]; a failure
//! becomes a `python_pi_error` element wrapping the failure message as
//! `CData`.

use regex::Regex;
use std::sync::OnceLock;

use crate::node::{Node, NodeId, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

const MODULE: &str = "pi";

fn target_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\n\r\x0c]").unwrap())
}

fn assemble_node(cx: &mut ParseCx<'_>, target: &str, content: &str, pos: crate::position::Position) -> Vec<NodeId> {
    if matches!(target, "?py" | "?python" | "?py_eval") {
        let mode = if target == "?py_eval" { "eval" } else { "exec" };
        if let Err(message) = cx.code_sink.compile(cx.scanner.uri(), content, mode) {
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
                pos: crate::position::Position::new(pos.line, pos.column + 1 + target.chars().count() as u32),
            });
            cx.tree.append_child(err_node, err_data);
            return vec![err_node];
        }
    }
    vec![cx.tree.alloc(Node {
        kind: NodeKind::ProcessingInstruction,
        name: target.to_string(),
        data: content.to_string(),
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    })]
}

pub struct ProcessingInstruction;

impl Recognizer for ProcessingInstruction {
    fn name(&self) -> &'static str {
        "processing_instruction"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        let shift = if cx.scanner.peek(2) == "<?" {
            1
        } else if cx.scanner.peek(3) == "%%?" {
            2
        } else {
            return MakeResult::None;
        };
        let pos = cx.scanner.copy_pos();
        let search_from = caret + shift;
        let Some(m) = target_re().find(&cx.scanner.text()[search_from..]) else {
            crate::diagnostics::diag!(cx.diagnostics, MODULE, "E100", pos);
            cx.scanner.update(cx.scanner.end());
            let text_node = cx.tree.alloc(Node {
                kind: NodeKind::Text,
                name: String::new(),
                data: cx.scanner.text()[caret..].to_string(),
                attrs: Default::default(),
                children: Vec::new(),
                parent: None,
                pos,
            });
            return MakeResult::List(vec![text_node]);
        };
        let match_end = search_from + m.end();
        let target = cx.scanner.text()[caret + shift..match_end - 1].to_string();
        let mut start = match_end - 1;
        if matches!(cx.scanner.char_at(start), Some(' ' | '\t')) {
            start += 1;
        }
        if shift == 1 {
            match cx.scanner.find("?>", match_end, cx.scanner.end()) {
                None => {
                    crate::diagnostics::diag!(cx.diagnostics, MODULE, "E101", pos, [target]);
                    let content = cx.scanner.text()[start..cx.scanner.end()].to_string();
                    cx.scanner.update(cx.scanner.end());
                    return MakeResult::List(assemble_node(cx, &target, &content, pos));
                }
                Some(index) => {
                    let content = cx.scanner.text()[start..index].to_string();
                    cx.scanner.update(index + 2);
                    return MakeResult::List(assemble_node(cx, &target, &content, pos));
                }
            }
        }
        match cx.scanner.find("%%", match_end, cx.scanner.end()) {
            None => {
                crate::diagnostics::diag!(cx.diagnostics, MODULE, "E102", pos, [target]);
                let content = cx.scanner.text()[start..cx.scanner.end()].to_string();
                cx.scanner.update(cx.scanner.end());
                MakeResult::List(assemble_node(cx, &target, &content, pos))
            }
            Some(index) => {
                let content = cx.scanner.text()[start..index].to_string();
                cx.scanner.update(index + 2);
                MakeResult::List(assemble_node(cx, &target, &content, pos))
            }
        }
    }
}

pub const MSG: &[(&str, &str)] = &[
    ("E100", "ignoring processing instruction"),
    ("E101", "`<{0}` was started but `?>` was not found"),
    ("E102", "`%%{0}` was started but `%%` was not found"),
    ("E103", "errors in python processing instruction"),
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
    fn parses_plain_target_and_content() {
        let mut scanner = Scanner::new("<?php echo 1;?>rest", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match ProcessingInstruction.make_node(&mut cx) {
            MakeResult::List(ids) => {
                assert_eq!(tree.node(ids[0]).name, "?php");
                assert_eq!(tree.node(ids[0]).data, "echo 1;");
            }
            _ => panic!("expected PI"),
        }
    }

    #[test]
    fn python_target_with_failing_compile_becomes_error_element() {
        let mut scanner = Scanner::new("<?py 1 +?>rest", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match ProcessingInstruction.make_node(&mut cx) {
            MakeResult::List(ids) => assert_eq!(tree.node(ids[0]).name, "python_pi_error"),
            _ => panic!("expected error element"),
        }
    }
}
