//! Whitespace normalization for deterministic, diff-friendly output.
//!
//! Two passes run over the tree:
//!
//! 1. [`indent`] - a generic structural indenter: every element with
//!    children gets indented text and child tails, and the last child's tail
//!    is dedented to the parent's level.
//! 2. [`canonicalize`] - the canonical pass, which forces the text of every
//!    element with children to `depth + 1` units and the tail of every node
//!    (except a childless root) to `depth` units.
//!
//! Both only replace character data that is absent or whitespace-only, so
//! meaningful text such as a base64 block is never touched. The canonical
//! pass decides the final layout on its own, which makes
//! `canonicalize(indent(t)) == canonicalize(t)` and makes it idempotent.

use tracing::debug;

use crate::objects::{Document, NodeId};

/// Default indentation unit
pub const INDENT: &str = "  ";

/// Returns the replacement for existing character data, or `None` if the
/// existing data carries non-whitespace content and must be kept.
pub fn normalize(existing: Option<&str>, spacing: &str) -> Option<String> {
    match existing {
        Some(text) if !text.trim().is_empty() => None,
        Some(text) if text == spacing => None,
        _ => Some(spacing.to_string()),
    }
}

fn spacing(level: usize, unit: &str) -> String {
    format!("\n{}", unit.repeat(level))
}

fn apply(slot: &mut Option<String>, spacing: &str) -> bool {
    match normalize(slot.as_deref(), spacing) {
        Some(value) => {
            *slot = Some(value);
            true
        }
        None => false,
    }
}

/// Generic structural indentation with a dedented closing tail.
pub fn indent(doc: &mut Document, unit: &str) {
    let root = doc.root();
    if doc.children(root).is_empty() {
        return;
    }
    indent_children(doc, root, 0, unit);
}

fn indent_children(doc: &mut Document, id: NodeId, level: usize, unit: &str) {
    let child_spacing = spacing(level + 1, unit);
    apply(&mut doc.node_mut(id).text, &child_spacing);

    let children = doc.children(id).to_vec();
    for &child in &children {
        if !doc.children(child).is_empty() {
            indent_children(doc, child, level + 1, unit);
        }
        apply(&mut doc.node_mut(child).tail, &child_spacing);
    }
    if let Some(&last) = children.last() {
        apply(&mut doc.node_mut(last).tail, &spacing(level, unit));
    }
}

/// Canonical pass. Returns the number of text/tail slots it changed.
pub fn canonicalize(doc: &mut Document, unit: &str) -> usize {
    let root = doc.root();
    canonicalize_node(doc, root, 0, unit)
}

fn canonicalize_node(doc: &mut Document, id: NodeId, level: usize, unit: &str) -> usize {
    let own = spacing(level, unit);
    let mut changed = 0;

    if !doc.children(id).is_empty() {
        changed += usize::from(apply(&mut doc.node_mut(id).text, &spacing(level + 1, unit)));
        changed += usize::from(apply(&mut doc.node_mut(id).tail, &own));
        let children = doc.children(id).to_vec();
        for child in children {
            changed += canonicalize_node(doc, child, level + 1, unit);
        }
    } else if level > 0 {
        changed += usize::from(apply(&mut doc.node_mut(id).tail, &own));
    }
    changed
}

/// Runs the baseline indenter followed by the canonical pass.
pub fn format_document(doc: &mut Document, unit: &str) {
    indent(doc, unit);
    let changed = canonicalize(doc, unit);
    debug!(changed, "normalized document whitespace");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse;

    fn text(doc: &Document, id: NodeId) -> Option<&str> {
        doc.node(id).text.as_deref()
    }

    fn tail(doc: &Document, id: NodeId) -> Option<&str> {
        doc.node(id).tail.as_deref()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(None, "\n  "), Some("\n  ".to_string()));
        assert_eq!(normalize(Some(""), "\n  "), Some("\n  ".to_string()));
        assert_eq!(normalize(Some("   \n\t"), "\n  "), Some("\n  ".to_string()));
        assert_eq!(normalize(Some("\n  "), "\n  "), None);
        assert_eq!(normalize(Some(" data "), "\n  "), None);
    }

    #[test]
    fn test_canonicalize_compact_tree() {
        let mut doc = parse(b"<a><b><c/></b><d>keep</d></a>").unwrap();
        canonicalize(&mut doc, INDENT);

        let a = doc.root();
        let b = doc.children(a)[0];
        let c = doc.children(b)[0];
        let d = doc.children(a)[1];

        assert_eq!(text(&doc, a), Some("\n  "));
        assert_eq!(tail(&doc, a), Some("\n"));
        assert_eq!(text(&doc, b), Some("\n    "));
        assert_eq!(tail(&doc, b), Some("\n  "));
        assert_eq!(tail(&doc, c), Some("\n    "));
        assert_eq!(text(&doc, d), Some("keep"));
        assert_eq!(tail(&doc, d), Some("\n  "));
    }

    #[test]
    fn test_meaningful_text_is_kept() {
        let mut doc = parse(b"<a> lead <b/> trailing </a>").unwrap();
        canonicalize(&mut doc, INDENT);
        let b = doc.children(doc.root())[0];
        assert_eq!(text(&doc, doc.root()), Some(" lead "));
        assert_eq!(tail(&doc, b), Some(" trailing "));
    }

    #[test]
    fn test_childless_root_untouched() {
        let mut doc = parse(b"<a/>").unwrap();
        assert_eq!(canonicalize(&mut doc, INDENT), 0);
        assert_eq!(tail(&doc, doc.root()), None);
        indent(&mut doc, INDENT);
        assert_eq!(text(&doc, doc.root()), None);
    }

    #[test]
    fn test_indent_dedents_last_child() {
        let mut doc = parse(b"<a><b/><c/></a>").unwrap();
        indent(&mut doc, INDENT);
        let b = doc.children(doc.root())[0];
        let c = doc.children(doc.root())[1];
        assert_eq!(text(&doc, doc.root()), Some("\n  "));
        assert_eq!(tail(&doc, b), Some("\n  "));
        assert_eq!(tail(&doc, c), Some("\n"));
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let mut doc = parse(
            b"<a>\n<b>\n\n<c x=\"1\"/>   <c>v</c></b><!--note--><d/>\t</a>",
        )
        .unwrap();
        format_document(&mut doc, INDENT);
        let first = doc.clone();

        assert_eq!(canonicalize(&mut doc, INDENT), 0);
        assert_eq!(doc, first);
        format_document(&mut doc, INDENT);
        assert_eq!(doc, first);
    }

    #[test]
    fn test_tolerates_prior_indentation() {
        let source: &[u8] = b"<a><b><c/></b><d/></a>";

        let mut direct = parse(source).unwrap();
        canonicalize(&mut direct, INDENT);

        let mut indented = parse(source).unwrap();
        indent(&mut indented, INDENT);
        canonicalize(&mut indented, INDENT);

        assert_eq!(direct, indented);
    }
}
