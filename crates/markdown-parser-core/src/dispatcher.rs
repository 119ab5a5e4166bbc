//! # Dispatcher — the single-pass scan loop
//!
//! Drives one shared [`Scanner`] through the open-node stack:
//!
//! 1. Ask the node at the top of the stack's recognizer whether it
//!    closes here.
//! 2. Otherwise try each recognizer registered for the current
//!    context, in order, stopping at the first one that produces
//!    something.
//! 3. If none match, consume a single character as `Text` (or append
//!    to the previous `Text` sibling).
//! 4. At EOF, close everything still open, bottom-up, best-effort.
//!
//! Per-open-node scratch state (the bookkeeping a recognizer needs
//! between its `make_node` and its `close`, e.g. "where did the
//! opening delimiter's content start") lives in [`Scratch`] on the
//! [`OpenFrame`], never on the [`crate::node::Node`] itself. That is
//! what keeps nodes clean of transient parser state once the document
//! is done (no field to remember to delete).

use crate::diagnostics::{Diagnostics, diag};
use crate::node::{Node, NodeId, NodeKind, Tree};
use crate::position::Position;
use crate::recognizer::{CodeSink, MakeResult, ParseCx, Recognizer};
use crate::scanner::Scanner;
use crate::style::Style;

const MODULE: &str = "dispatcher";

/// Transient per-open-node bookkeeping. Every field here is something a
/// recognizer's `make_node` stashes and its own `close` reads back;
/// the dispatcher never interprets these itself. Optional because most
/// recognizers need none of them.
#[derive(Debug, Default, Clone)]
pub struct Scratch {
    pub content_end: Option<usize>,
    pub left_b: Option<usize>,
    pub att: bool,
    pub ref_end: Option<usize>,
    pub pattern_end: Option<usize>,
    pub line_end: Option<usize>,
    pub final_pos: Option<usize>,
    pub type_: Option<u8>,
    pub end_pos: Option<usize>,
}

/// One entry on the open-node stack.
pub struct OpenFrame {
    pub node: NodeId,
    /// Index into the style's repository; identifies which recognizer
    /// opened (and must be asked to close) this frame.
    pub recognizer: usize,
    pub scratch: Scratch,
}

struct NoopCodeSink;

impl CodeSink for NoopCodeSink {
    fn compile(&self, _uri: &str, _source: &str, _mode: &str) -> Result<(), String> {
        Err("no code sink configured".to_string())
    }
}

/// Runs the full single-pass scan described above and returns the
/// finished tree plus the diagnostic log. `code_sink` is `None` to use
/// the always-fails default.
pub fn run(
    text: impl Into<String>,
    uri: impl Into<String>,
    style: &Style,
    code_sink: Option<&dyn CodeSink>,
) -> (Tree, Diagnostics) {
    let mut scanner = Scanner::new(text, uri);
    let mut tree = Tree::new();
    let mut diagnostics = Diagnostics::new();
    let noop = NoopCodeSink;
    let code_sink = code_sink.unwrap_or(&noop);

    let root = tree.alloc(Node {
        kind: NodeKind::Document,
        name: "#document".to_string(),
        data: String::new(),
        attrs: Default::default(),
        children: Vec::new(),
        parent: None,
        pos: Position::new(1, 1),
    });

    let mut stack: Vec<OpenFrame> = vec![OpenFrame {
        node: root,
        recognizer: usize::MAX,
        scratch: Scratch::default(),
    }];

    while !scanner.at_end() {
        let top = stack.last().unwrap();
        let containing_name = if top.node == root {
            "#document"
        } else {
            tree.node(top.node).name.as_str()
        };

        // Step 1: ask the open node's own recognizer whether it closes here.
        if top.recognizer != usize::MAX {
            let recognizer = style.repository[top.recognizer].as_ref();
            let node = top.node;
            let mut scratch = std::mem::take(&mut stack.last_mut().unwrap().scratch);
            let mut cx = ParseCx {
                scanner: &mut scanner,
                tree: &mut tree,
                diagnostics: &mut diagnostics,
                code_sink,
            };
            let closed = recognizer.close(node, &mut cx, &mut scratch).is_some();
            stack.last_mut().unwrap().scratch = scratch;
            if closed {
                stack.pop();
                continue;
            }
        }

        // Step 2: on a trigger character, try each recognizer registered
        // for this context, in order. A non-trigger character skips
        // straight to step 3's text accumulation — this is the
        // quadratic-scanning guard: plain prose never pays for a trial
        // of every recognizer at every character.
        let mut matched = false;
        let is_trigger = scanner.current_char().is_some_and(|c| style.trigger_chars_for(containing_name).contains(c));
        if is_trigger {
            let candidates = style.triggers_for(containing_name);
            for &idx in candidates {
                let recognizer = style.repository[idx].as_ref();
                let before = scanner.caret();
                let mut cx = ParseCx {
                    scanner: &mut scanner,
                    tree: &mut tree,
                    diagnostics: &mut diagnostics,
                    code_sink,
                };
                let result = recognizer.make_node(&mut cx);
                match result {
                    MakeResult::None => {
                        debug_assert_eq!(
                            scanner.caret(),
                            before,
                            "{}",
                            crate::error::ParserBug::DeclinedButMoved { recognizer: recognizer.name() }
                        );
                        continue;
                    }
                    MakeResult::Node(id) => {
                        let parent = stack.last().unwrap().node;
                        tree.append_child(parent, id);
                        stack.push(OpenFrame {
                            node: id,
                            recognizer: idx,
                            scratch: Scratch::default(),
                        });
                        matched = true;
                        break;
                    }
                    MakeResult::NodeWithScratch(id, scratch) => {
                        let parent = stack.last().unwrap().node;
                        tree.append_child(parent, id);
                        stack.push(OpenFrame {
                            node: id,
                            recognizer: idx,
                            scratch,
                        });
                        matched = true;
                        break;
                    }
                    MakeResult::List(ids) => {
                        let parent = stack.last().unwrap().node;
                        for id in ids {
                            tree.append_child(parent, id);
                        }
                        matched = true;
                        break;
                    }
                }
            }
        }
        if matched {
            continue;
        }

        // Step 3: single-character text fallback.
        let pos = scanner.copy_pos();
        let caret = scanner.caret();
        let Some(c) = scanner.current_char() else {
            break;
        };
        let next = caret + c.len_utf8();
        let parent = stack.last().unwrap().node;
        if let Some(&last) = tree.node(parent).children.last() {
            if tree.node(last).kind == NodeKind::Text {
                tree.node_mut(last).data.push(c);
                scanner.update(next);
                continue;
            }
        }
        let text_node = tree.alloc(Node {
            kind: NodeKind::Text,
            name: String::new(),
            data: c.to_string(),
            attrs: Default::default(),
            children: Vec::new(),
            parent: None,
            pos,
        });
        tree.append_child(parent, text_node);
        scanner.update(next);
    }

    // Step 4: EOF — close everything still open, bottom-up, best-effort.
    while stack.len() > 1 {
        let frame = stack.pop().unwrap();
        if frame.recognizer != usize::MAX {
            let name = tree.node(frame.node).name.clone();
            diag!(
                diagnostics,
                MODULE,
                "E900",
                tree.node(frame.node).pos,
                [name]
            );
        }
    }

    (tree, diagnostics)
}

pub const MSG: &[(&str, &str)] = &[("E900", "\"{0}\" was never closed before end of input")];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::default_style;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_prose_still_opens_a_paragraph_under_trigger_gating() {
        let style = default_style();
        let (tree, _) = run("hello world\n", "t.mx", &style, None);
        let root = tree.root();
        let p = tree.node(root).children[0];
        assert_eq!(tree.node(p).name, "p");
    }

    #[test]
    fn inline_emphasis_still_fires_inside_a_trigger_gated_paragraph() {
        let style = default_style();
        let (tree, _) = run("a *b* c\n", "t.mx", &style, None);
        let root = tree.root();
        let p = tree.node(root).children[0];
        let names: Vec<&str> = tree.node(p).children.iter().map(|&id| tree.node(id).name.as_str()).collect();
        assert_eq!(names, vec!["", "em", ""]);
    }
}
