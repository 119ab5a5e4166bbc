//! Comments, in the regular HTML sense (`<!--...-->`, or the looser
//! `<!...>` form which may not contain `>`) and the bracket form
//! (`%%!...%%`, which may not contain `%%`).

use crate::node::{Node, NodeKind};
use crate::recognizer::{MakeResult, ParseCx, Recognizer};

const MODULE: &str = "comment";

fn comment_node(data: String, pos: crate::position::Position) -> Node {
    Node {
        kind: NodeKind::Comment,
        name: String::new(),
        data,
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos,
    }
}

fn replace_double_hyphen(s: &str) -> String {
    s.replace("--", "- ")
}

fn regular_comment(cx: &mut ParseCx<'_>, caret: usize) -> MakeResult {
    let pos = cx.scanner.copy_pos();
    if !cx.scanner.startswith_at(caret + 2, "--") {
        return match cx.scanner.find(">", caret + 2, cx.scanner.end()) {
            None => {
                crate::diagnostics::diag!(cx.diagnostics, MODULE, "E100", pos);
                let content = replace_double_hyphen(&cx.scanner.text()[caret + 2..]);
                cx.scanner.update(cx.scanner.end());
                MakeResult::List(vec![cx.tree.alloc(comment_node(content, pos))])
            }
            Some(idx) => {
                let content = replace_double_hyphen(&cx.scanner.text()[caret + 2..idx]);
                cx.scanner.update(idx + 1);
                MakeResult::List(vec![cx.tree.alloc(comment_node(content, pos))])
            }
        };
    }
    let Some(mut index) = cx.scanner.find("--", caret + 4, cx.scanner.end()) else {
        crate::diagnostics::diag!(cx.diagnostics, MODULE, "E200", pos);
        let content = cx.scanner.text()[caret + 4..].to_string();
        cx.scanner.update(cx.scanner.end());
        return MakeResult::List(vec![cx.tree.alloc(comment_node(content, pos))]);
    };
    let mut content = cx.scanner.text()[caret + 4..index].to_string();
    loop {
        if cx.scanner.startswith_at(index, "-->") {
            cx.scanner.update(index + 3);
            return MakeResult::List(vec![cx.tree.alloc(comment_node(content, pos))]);
        }
        content.push_str("- ");
        match cx.scanner.find("--", index + 1, cx.scanner.end()) {
            None => {
                content.push_str(&cx.scanner.text()[index + 2..cx.scanner.end()]);
                crate::diagnostics::diag!(cx.diagnostics, MODULE, "E200", pos);
                cx.scanner.update(cx.scanner.end());
                return MakeResult::List(vec![cx.tree.alloc(comment_node(content, pos))]);
            }
            Some(new_index) => {
                content.push_str(&cx.scanner.text()[index + 2..new_index]);
                index = new_index;
            }
        }
    }
}

fn new_comment(cx: &mut ParseCx<'_>, caret: usize) -> MakeResult {
    let pos = cx.scanner.copy_pos();
    match cx.scanner.find("%%", caret + 3, cx.scanner.end()) {
        None => {
            crate::diagnostics::diag!(cx.diagnostics, MODULE, "E100", pos);
            let content = cx.scanner.text()[caret + 3..].to_string();
            cx.scanner.update(cx.scanner.end());
            MakeResult::List(vec![cx.tree.alloc(comment_node(content, pos))])
        }
        Some(idx) => {
            let content = replace_double_hyphen(&cx.scanner.text()[caret + 3..idx]);
            cx.scanner.update(idx + 2);
            MakeResult::List(vec![cx.tree.alloc(comment_node(content, pos))])
        }
    }
}

pub struct Comment;

impl Recognizer for Comment {
    fn name(&self) -> &'static str {
        "comment"
    }

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult {
        let caret = cx.scanner.caret();
        if cx.scanner.startswith_at(caret, "<!") {
            regular_comment(cx, caret)
        } else if cx.scanner.startswith_at(caret, "%%!") {
            new_comment(cx, caret)
        } else {
            MakeResult::None
        }
    }
}

pub const MSG: &[(&str, &str)] = &[
    ("E100", "comment closing delimiter not found"),
    ("E200", "`-->` not found"),
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
    fn standard_html_comment() {
        let mut scanner = Scanner::new("<!--hi-->rest", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match Comment.make_node(&mut cx) {
            MakeResult::List(ids) => assert_eq!(tree.node(ids[0]).data, "hi"),
            _ => panic!("expected Comment"),
        }
    }

    #[test]
    fn short_form_comment_cannot_contain_gt() {
        let mut scanner = Scanner::new("<!hi>rest", "t");
        let mut tree = Tree::new();
        let mut diags = Diagnostics::new();
        let sink = Noop;
        let mut cx = ParseCx {
            scanner: &mut scanner,
            tree: &mut tree,
            diagnostics: &mut diags,
            code_sink: &sink,
        };
        match Comment.make_node(&mut cx) {
            MakeResult::List(ids) => assert_eq!(tree.node(ids[0]).data, "hi"),
            _ => panic!("expected Comment"),
        }
    }
}
