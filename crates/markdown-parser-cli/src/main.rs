//! Reads a file (or stdin) and prints the parsed tree and diagnostic
//! log. Carries none of the parsing logic itself — it exists only so
//! the core is reachable from a terminal.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use anyhow::{Context, Result};
use markdown_parser_core::node::AttrValue;
use markdown_parser_core::{Node, NodeId, NodeKind, Tree, parse, render_diagnostic};

fn main() {
    if let Err(err) = run() {
        eprintln!("markdown-parser-cli: {err:?}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let (uri, text) = match args.len() {
        1 => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading source from stdin")?;
            ("<stdin>".to_string(), buf)
        }
        2 => {
            let path = &args[1];
            let text = fs::read_to_string(path).with_context(|| format!("reading '{path}'"))?;
            (path.clone(), text)
        }
        _ => {
            eprintln!("Usage: {} [file]", args[0]);
            process::exit(2);
        }
    };

    let (tree, diagnostics) = parse(text, uri);

    print_node(&tree, tree.root(), 0);

    if !diagnostics.is_empty() {
        eprintln!("\n{} diagnostic(s):", diagnostics.len());
        for diag in diagnostics.iter() {
            eprintln!("  {}", render_diagnostic(diag));
        }
    }

    Ok(())
}

fn print_node(tree: &Tree, id: NodeId, depth: usize) {
    let node = tree.node(id);
    let indent = "  ".repeat(depth);
    match node.kind {
        NodeKind::Document => println!("{indent}#document"),
        NodeKind::Text => println!("{indent}#text {}", escape_text(&node.data)),
        NodeKind::Entity => println!("{indent}#entity {}", escape_text(&node.data)),
        NodeKind::Comment => println!("{indent}#comment {}", escape_text(&node.data)),
        NodeKind::CData => println!("{indent}#cdata {}", escape_text(&node.data)),
        NodeKind::DocumentType => println!("{indent}#doctype {}", escape_text(&node.data)),
        NodeKind::ProcessingInstruction => {
            println!("{indent}<{} ...?> {}", node.name, escape_text(&node.data))
        }
        NodeKind::Void => println!("{indent}<{}/> {}", node.name, format_attrs(node)),
        NodeKind::RawText => {
            println!("{indent}<{}> {} {}", node.name, escape_text(&node.data), format_attrs(node))
        }
        NodeKind::Element => println!("{indent}<{}> {}", node.name, format_attrs(node)),
    }
    for &child in &node.children {
        print_node(tree, child, depth + 1);
    }
}

/// HTML-escapes `text` and wraps it in quotes, the printable analogue of
/// `{:?}`'s debug-quoting but safe to paste back into an HTML document.
fn escape_text(text: &str) -> String {
    format!("\"{}\"", html_escape::encode_text(text))
}

fn format_attrs(node: &Node) -> String {
    node.attrs
        .iter()
        .map(|(k, v)| match v {
            AttrValue::Text(s) => format!("{k}=\"{}\"", html_escape::encode_double_quoted_attribute(s)),
            AttrValue::AlRefs(refs) => {
                let joined = refs
                    .iter()
                    .map(|(_, r)| html_escape::encode_double_quoted_attribute(r).to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{k}=\"{joined}\"")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
