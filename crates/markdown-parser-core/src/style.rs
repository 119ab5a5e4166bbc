//! # Style module
//!
//! A [`Style`] bundles the ordered recognizer repository with the
//! context-trigger table that decides, for a given containing
//! element's name, which recognizers are tried and in what order.
//! [`default_style`] is the one shipped configuration — the hybrid
//! Markdown/LaTeX/HTML-like grammar this crate implements.

use std::collections::{HashMap, HashSet};

use crate::recognizer::Recognizer;

/// The characters that interrupt literal text accumulation and send the
/// dispatcher to try a context's recognizer list. `All` means every
/// character is a trigger (used where a context's recognizer list has
/// no fixed leading character of its own, e.g. the catch-all paragraph
/// opener in block context) — it costs nothing over the untriggered
/// loop but keeps the dispatch loop honest about "no optimization
/// applies here" rather than silently picking an unsafe narrow set.
pub enum TriggerChars {
    All,
    Chars(HashSet<char>),
}

impl TriggerChars {
    fn chars(cs: &[char]) -> Self {
        Self::Chars(cs.iter().copied().collect())
    }

    pub fn contains(&self, c: char) -> bool {
        match self {
            TriggerChars::All => true,
            TriggerChars::Chars(set) => set.contains(&c),
        }
    }
}

/// What a context name maps to: either a direct, ordered list of
/// recognizer names to try (paired with the characters that trigger
/// them), or an alias pointing at another context (resolved away
/// before parsing starts).
enum MappingValue {
    Alias(&'static str),
    Recognizers(Vec<&'static str>, TriggerChars),
}

/// A fully resolved context entry: which recognizer indices (into
/// [`Style::repository`]) apply when the open node's name is this key,
/// and which characters trigger consulting them at all.
pub struct TriggerEntry {
    order: Vec<usize>,
    trigger_chars: TriggerChars,
}

pub struct StyleDefaults {
    /// Mirrors the original style contract's only honored option:
    /// restrict the mapping to `__default__` only (inline-only parse).
    pub inline: bool,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self { inline: false }
    }
}

pub struct Style {
    pub repository: Vec<Box<dyn Recognizer>>,
    mapping: HashMap<&'static str, TriggerEntry>,
    empty: Vec<usize>,
    empty_triggers: TriggerChars,
}

impl Style {
    fn entry_for(&self, context: &str) -> Option<&TriggerEntry> {
        self.mapping.get(context).or_else(|| self.mapping.get("__default__"))
    }

    /// Ordered recognizer indices to try when the open node's name is
    /// `context`, falling back to `__default__`.
    pub fn triggers_for(&self, context: &str) -> &[usize] {
        self.entry_for(context).map(|e| e.order.as_slice()).unwrap_or(&self.empty)
    }

    /// The characters that interrupt text-run accumulation for `context`
    /// (falling back to `__default__`, same as [`Style::triggers_for`]).
    pub fn trigger_chars_for(&self, context: &str) -> &TriggerChars {
        self.entry_for(context).map(|e| &e.trigger_chars).unwrap_or(&self.empty_triggers)
    }
}

/// Builds a [`Style`] from an ordered repository (name must match each
/// recognizer's [`Recognizer::name`]) and a raw mapping table that may
/// still contain aliases. Aliases are resolved eagerly; a cycle is a
/// programmer error in the table, not a parse-time failure, so it
/// panics (this only runs once, at construction, over a fixed table).
fn build(
    repository: Vec<Box<dyn Recognizer>>,
    raw_mapping: Vec<(&'static str, MappingValue)>,
    defaults: StyleDefaults,
) -> Style {
    let index_of: HashMap<&'static str, usize> = repository
        .iter()
        .enumerate()
        .map(|(i, r)| (r.name(), i))
        .collect();

    let mut raw: HashMap<&'static str, MappingValue> = raw_mapping.into_iter().collect();
    if defaults.inline {
        raw.retain(|k, _| *k == "__default__");
    }

    fn resolve<'a>(
        raw: &'a HashMap<&'static str, MappingValue>,
        key: &'static str,
        seen: &mut Vec<&'static str>,
    ) -> (&'a [&'static str], &'a TriggerChars) {
        if seen.contains(&key) {
            panic!("context alias cycle involving {key:?}");
        }
        seen.push(key);
        match raw.get(key) {
            Some(MappingValue::Recognizers(names, triggers)) => (names, triggers),
            Some(MappingValue::Alias(target)) => resolve(raw, target, seen),
            None => panic!("unresolved context alias target {key:?}"),
        }
    }

    let mut mapping = HashMap::new();
    for key in raw.keys().copied().collect::<Vec<_>>() {
        let (names, triggers) = resolve(&raw, key, &mut Vec::new());
        let order = names
            .iter()
            .map(|n| {
                *index_of
                    .get(n)
                    .unwrap_or_else(|| panic!("context table references unknown recognizer {n:?}"))
            })
            .collect();
        let trigger_chars = match triggers {
            TriggerChars::All => TriggerChars::All,
            TriggerChars::Chars(set) => TriggerChars::Chars(set.clone()),
        };
        mapping.insert(key, TriggerEntry { order, trigger_chars });
    }

    Style {
        repository,
        mapping,
        empty: Vec::new(),
        empty_triggers: TriggerChars::Chars(HashSet::new()),
    }
}

/// The shipped grammar: Markdown block/inline structure, LaTeX math and
/// macros, and an HTML-like element/entity layer, all dispatched
/// through a single context-trigger table.
pub fn default_style() -> Style {
    default_style_with(StyleDefaults::default())
}

pub fn default_style_with(defaults: StyleDefaults) -> Style {
    use crate::recognizers::*;

    let repository: Vec<Box<dyn Recognizer>> = vec![
        Box::new(auto::AutoLink),
        Box::new(auto::AutoMail),
        Box::new(cdata::CData),
        Box::new(comment::Comment),
        Box::new(code::CodeInline),
        Box::new(code::CodeBlock),
        Box::new(macro_def::MacroDef),
        Box::new(doctype::DocType),
        Box::new(element::Element),
        Box::new(empty::Empty),
        Box::new(entity::Entity),
        Box::new(entity::Break),
        Box::new(eval::Eval),
        Box::new(header::AtxHeader),
        Box::new(header::SetextHeader),
        Box::new(hr::Hr),
        Box::new(emphasis::StrongEm),
        Box::new(emphasis::EmStrong),
        Box::new(emphasis::Strong),
        Box::new(emphasis::Strong2),
        Box::new(emphasis::Em),
        Box::new(emphasis::SmartEm),
        Box::new(latex::LatexDisplay),
        Box::new(latex::LatexInline),
        Box::new(list::List),
        Box::new(meta::Meta),
        Box::new(paragraph::Paragraph),
        Box::new(pi::ProcessingInstruction),
        Box::new(quote::Quote),
        Box::new(reference::ReferenceBlock),
        Box::new(reference::ReferenceInline),
    ];

    // Mirrors the shipped grammar table: an inline `__default__`
    // context tried inside any ordinary element, a block `#document`
    // context for the document root (and its `body`/`section`
    // aliases), and a handful of narrow single-purpose contexts that
    // restrict which recognizers may fire inside them.
    let default_names = vec![
        "code_inline",
        "reference_inline",
        "latex_display",
        "latex_inline",
        "strong_em",
        "em_strong",
        "strong",
        "strong2",
        "em",
        "smart_em",
        "quote",
        "break",
        "auto_mail",
        "auto_link",
        "element",
        "cdata",
        "doctype",
        "comment",
        "processing_instruction",
        "eval",
        "entity",
    ];
    let document_names = vec![
        "meta",
        "empty",
        "reference_block",
        "code_block",
        "atx_header",
        "setext_header",
        "latex_display",
        "break",
        "cdata",
        "hr",
        "doctype",
        "comment",
        "processing_instruction",
        "eval",
        "paragraph",
        "element",
    ];

    // Every inline recognizer has a fixed leading character (or one of a
    // couple), so `__default__` gets a real narrow trigger set: plain
    // letters/digits/spaces never reach the recognizer list at all and
    // go straight to text-run accumulation.
    let default_triggers = TriggerChars::chars(&[
        '`', '[', '!', '$', '*', '_', '\'', '"', '\\', '<', '%', '&',
    ]);
    // Block context's own recognizer list includes `paragraph`, which
    // opens on ordinary prose with no fixed leading character — so
    // every character here is potentially significant.
    let document_triggers = TriggerChars::All;

    let raw_mapping = vec![
        ("__default__", MappingValue::Recognizers(default_names, default_triggers)),
        ("#document", MappingValue::Recognizers(document_names, document_triggers)),
        ("body", MappingValue::Alias("#document")),
        ("section", MappingValue::Alias("#document")),
        // `list`'s own recognizer re-checks from a newline, the same
        // block-anchored shape as `#document`.
        ("list", MappingValue::Recognizers(vec!["list"], TriggerChars::All)),
        ("list_item", MappingValue::Alias("#document")),
        // Math/codeblock environments are raw content: no recognizer
        // fires inside them except the owning node's own `close`, so
        // every other character falls through to the text fallback.
        ("align", MappingValue::Recognizers(vec![], TriggerChars::chars(&[]))),
        ("equation", MappingValue::Recognizers(vec![], TriggerChars::chars(&[]))),
        // `macro_def` reads the rest of its own line unconditionally
        // (declining only on a following `\n%%`), so it too needs every
        // character tried rather than a fixed leading one.
        ("define", MappingValue::Recognizers(vec!["macro_def"], TriggerChars::All)),
        ("codeblock", MappingValue::Recognizers(vec![], TriggerChars::chars(&[]))),
    ];

    build(repository, raw_mapping, defaults)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_document_recognizers() {
        let style = default_style();
        let body = style.triggers_for("body");
        let document = style.triggers_for("#document");
        assert_eq!(body, document);
        assert!(!body.is_empty());
    }

    #[test]
    fn unknown_context_falls_back_to_default() {
        let style = default_style();
        let fallback = style.triggers_for("paragraph");
        assert_eq!(fallback, style.triggers_for("__default__"));
    }

    #[test]
    fn inline_only_defaults_restricts_mapping() {
        let style = default_style_with(StyleDefaults { inline: true });
        assert_eq!(style.triggers_for("#document"), style.triggers_for("__default__"));
    }

    #[test]
    fn default_context_trigger_chars_cover_inline_openers_but_not_plain_letters() {
        let style = default_style();
        let triggers = style.trigger_chars_for("__default__");
        for c in ['`', '[', '!', '$', '*', '_', '\'', '"', '\\', '<', '%', '&'] {
            assert!(triggers.contains(c), "expected {c:?} to be a trigger");
        }
        assert!(!triggers.contains('a'));
        assert!(!triggers.contains(' '));
    }

    #[test]
    fn document_context_triggers_on_every_character() {
        let style = default_style();
        let triggers = style.trigger_chars_for("#document");
        assert!(triggers.contains('a'));
        assert!(triggers.contains('\n'));
    }

    #[test]
    fn raw_content_contexts_never_trigger() {
        let style = default_style();
        let triggers = style.trigger_chars_for("align");
        assert!(!triggers.contains('a'));
        assert!(!triggers.contains('$'));
    }
}
