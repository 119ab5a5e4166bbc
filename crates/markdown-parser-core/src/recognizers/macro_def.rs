//! `name = value` / `name := value` lines inside a `define` container,
//! plus the `\name{p1:d1,p2:d2,...}` parameterized-macro head form.

use crate::node::{Node, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

const MODULE: &str = "macro_def";

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

/// Parses `\name{p1:d1,p2,...}` into `(name, "p1=d1;p2=;...")`, where
/// the parameter map is serialized ordered-pair text since the node
/// attribute model has no nested-map value.
fn get_function(pos: crate::position::Position, diags: &mut crate::diagnostics::Diagnostics, exp: &str) -> (String, String) {
    let Some(brace) = exp.find('{') else {
        crate::diagnostics::diag!(diags, MODULE, "E101", pos, ["{"]);
        return (exp.to_string(), String::new());
    };
    let name = exp[..brace].to_string();
    if !exp.ends_with('}') {
        crate::diagnostics::diag!(diags, MODULE, "E101", pos, ["}"]);
    }
    let inner = &exp[brace + 1..exp.len().saturating_sub(1)];
    let mut pairs = Vec::new();
    for item in inner.split(',') {
        if item.is_empty() {
            continue;
        }
        match item.split_once(':') {
            Some((k, v)) => pairs.push(format!("{k}={v}")),
            None => pairs.push(format!("{item}=")),
        }
    }
    (name, pairs.join(";"))
}

pub struct MacroDef;

impl Recognizer for MacroDef {
    fn name(&self) -> &'static str {
        "macro_def"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        if cx.scanner.peek(3) == "\n%%" {
            return MakeResult::None;
        }
        let mut index = cx.scanner.find("\n", caret + 1, cx.scanner.text().len());
        while let Some(i) = index {
            if cx.scanner.char_at(i - 1) == Some('\\') {
                index = cx.scanner.find("\n", i + 1, cx.scanner.text().len());
            } else {
                break;
            }
        }
        let Some(line_end) = index else {
            cx.scanner.update(caret + 1);
            return MakeResult::None;
        };
        let pos = cx.scanner.compute(caret + 1);
        let content = cx.scanner.text()[caret..line_end].trim().to_string();
        cx.scanner.update(line_end);

        let (flag, sep_index) = match content.find(":=") {
            Some(i) => ("set_delayed", Some(i)),
            None => ("set", content.find('=')),
        };
        let Some(sep_index) = sep_index else {
            crate::diagnostics::diag!(cx.diagnostics, MODULE, "E100", pos);
            let node = cx.tree.alloc(Node {
                kind: NodeKind::Void,
                name: "macro".to_string(),
                data: String::new(),
                attrs: Default::default(),
                children: Vec::new(),
                parent: None,
                pos,
            });
            cx.tree.node_mut(node).attrs.set_text("flag", "failed");
            return MakeResult::List(vec![node]);
        };

        let raw_name = content[..sep_index].trim().to_string();
        let value_start = sep_index + if flag == "set_delayed" { 2 } else { 1 };
        let replaced = content[value_start..].trim().replace("\\\n", "");
        let value = collapse_ws(replaced.trim());

        let node = cx.tree.alloc(Node {
            kind: NodeKind::Void,
            name: "macro".to_string(),
            data: String::new(),
            attrs: Default::default(),
            children: Vec::new(),
            parent: None,
            pos,
        });
        cx.tree.node_mut(node).attrs.set_text("flag", flag);
        if raw_name.starts_with('\\') {
            let (name, arg) = get_function(pos, cx.diagnostics, &raw_name);
            cx.tree.node_mut(node).attrs.set_text("name", name);
            cx.tree.node_mut(node).attrs.set_text("arg", arg);
        } else {
            cx.tree.node_mut(node).attrs.set_text("name", raw_name);
        }
        cx.tree.node_mut(node).attrs.set_text("value", value);
        MakeResult::List(vec![node])
    }
}

pub const MSG: &[(&str, &str)] = &[
    ("E100", "no `=` or `:=` found in macro declaration"),
    ("E101", "missing `{0}` in macro function definition"),
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
    fn parses_immediate_assignment() {
        let mut scanner = Scanner::new("x = 100\nrest", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match MacroDef.make_node(&mut cx) {
            MakeResult::List(ids) => {
                let node = ids[0];
                assert_eq!(tree.node(node).attrs.get_text("flag"), Some("set"));
                assert_eq!(tree.node(node).attrs.get_text("name"), Some("x"));
                assert_eq!(tree.node(node).attrs.get_text("value"), Some("100"));
            }
            _ => panic!("expected macro"),
        }
    }

    #[test]
    fn missing_separator_logs_e100_and_fails() {
        let mut scanner = Scanner::new("x 100\nrest", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match MacroDef.make_node(&mut cx) {
            MakeResult::List(ids) => assert_eq!(tree.node(ids[0]).attrs.get_text("flag"), Some("failed")),
            _ => panic!("expected macro"),
        }
        assert_eq!(diags.iter().filter(|d| d.code == "E100").count(), 1);
    }
}
