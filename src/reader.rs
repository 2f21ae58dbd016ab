//! XML reader building an arena [`Document`].
//!
//! This module parses a complete FOXML object with `quick-xml`'s namespace
//! aware reader. Element names and attributes are kept exactly as written and
//! every element records its resolved namespace URI, so lookups can match on
//! namespace while serialization keeps the source prefixes.
//!
//! # Example
//!
//! ```rust
//! use foxml_inject::reader::parse;
//!
//! let xml = br#"<foxml:digitalObject xmlns:foxml="info:fedora/fedora-system:def/foxml#">
//!   <foxml:datastream ID="OBJ"/>
//! </foxml:digitalObject>"#;
//! let doc = parse(xml).unwrap();
//! let root = doc.element(doc.root()).unwrap();
//! assert_eq!(root.name.local, "digitalObject");
//! ```

use std::str;

use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use crate::error::{Error, Result};
use crate::objects::{Attribute, Document, Element, NodeId, NodeKind, QName};

/// Intermediate parsed event data (owned, to avoid borrow conflicts).
enum ParsedEvent {
    Start(Element),
    Empty(Element),
    End,
    Text(String),
    Comment(String),
    Pi(String),
    Eof,
}

/// Incremental tree builder fed by [`ParsedEvent`]s.
#[derive(Default)]
struct TreeBuilder {
    doc: Option<Document>,
    stack: Vec<NodeId>,
    /// Last closed child of the current element, which receives tail text
    last_closed: Option<NodeId>,
}

impl TreeBuilder {
    fn open(&mut self, element: Element, position: u64) -> Result<()> {
        let id = match (self.stack.last().copied(), self.doc.as_mut()) {
            (Some(parent), Some(doc)) => doc.append_element(parent, element),
            (None, None) => {
                let doc = Document::new(element);
                let root = doc.root();
                self.doc = Some(doc);
                root
            }
            _ => return Err(Error::malformed("multiple root elements", position)),
        };
        self.stack.push(id);
        self.last_closed = None;
        Ok(())
    }

    fn close(&mut self) {
        self.last_closed = self.stack.pop();
    }

    fn leaf(&mut self, kind: NodeKind) {
        // Prolog and epilog nodes outside the root are not kept
        if let (Some(parent), Some(doc)) = (self.stack.last().copied(), self.doc.as_mut()) {
            self.last_closed = Some(doc.append(parent, kind));
        }
    }

    fn text(&mut self, text: &str, position: u64) -> Result<()> {
        let (parent, doc) = match (self.stack.last().copied(), self.doc.as_mut()) {
            (Some(parent), Some(doc)) => (parent, doc),
            _ if text.trim().is_empty() => return Ok(()),
            _ => {
                return Err(Error::malformed(
                    "character data outside root element",
                    position,
                ))
            }
        };
        let slot = match self.last_closed {
            Some(sibling) => &mut doc.node_mut(sibling).tail,
            None => &mut doc.node_mut(parent).text,
        };
        slot.get_or_insert_with(String::new).push_str(text);
        Ok(())
    }

    fn finish(self, position: u64) -> Result<Document> {
        if !self.stack.is_empty() {
            return Err(Error::malformed("unclosed element at end of document", position));
        }
        self.doc
            .ok_or_else(|| Error::malformed("no root element", position))
    }
}

/// Parses a complete XML document into an arena tree.
///
/// Fails with [`Error::MalformedInput`] on any well-formedness error,
/// including undeclared prefixes and unbalanced tags.
pub fn parse(xml: &[u8]) -> Result<Document> {
    let mut reader = NsReader::from_reader(xml);
    let mut buf = Vec::with_capacity(4096);
    let mut builder = TreeBuilder::default();

    loop {
        buf.clear();
        let position = reader.buffer_position();

        // Read the event and immediately extract what we need as owned data
        let parsed = {
            let (resolved, event) = reader
                .read_resolved_event_into(&mut buf)
                .map_err(|e| Error::malformed(e, position))?;
            match event {
                XmlEvent::Start(ref e) => {
                    Some(ParsedEvent::Start(extract_element(resolved, e, position)?))
                }
                XmlEvent::Empty(ref e) => {
                    Some(ParsedEvent::Empty(extract_element(resolved, e, position)?))
                }
                XmlEvent::End(_) => Some(ParsedEvent::End),
                XmlEvent::Text(ref e) => {
                    let text = e.unescape().map_err(|err| Error::malformed(err, position))?;
                    Some(ParsedEvent::Text(text.into_owned()))
                }
                XmlEvent::CData(ref e) => {
                    let text = str::from_utf8(e).map_err(|err| Error::malformed(err, position))?;
                    Some(ParsedEvent::Text(text.to_string()))
                }
                XmlEvent::Comment(ref e) => {
                    let text = str::from_utf8(e).map_err(|err| Error::malformed(err, position))?;
                    Some(ParsedEvent::Comment(text.to_string()))
                }
                XmlEvent::PI(ref e) => {
                    let text = str::from_utf8(e).map_err(|err| Error::malformed(err, position))?;
                    Some(ParsedEvent::Pi(text.to_string()))
                }
                XmlEvent::Eof => Some(ParsedEvent::Eof),
                _ => None,
            }
        };

        match parsed {
            Some(ParsedEvent::Start(element)) => {
                builder.open(element, position)?;
            }
            Some(ParsedEvent::Empty(element)) => {
                builder.open(element, position)?;
                builder.close();
            }
            Some(ParsedEvent::End) => builder.close(),
            Some(ParsedEvent::Text(text)) => builder.text(&text, position)?,
            Some(ParsedEvent::Comment(text)) => builder.leaf(NodeKind::Comment(text)),
            Some(ParsedEvent::Pi(text)) => builder.leaf(NodeKind::ProcessingInstruction(text)),
            Some(ParsedEvent::Eof) => return builder.finish(position),
            None => {}
        }
    }
}

/// Extracts an element's name, resolved namespace and attributes as owned data.
fn extract_element(
    resolved: ResolveResult<'_>,
    e: &BytesStart<'_>,
    position: u64,
) -> Result<Element> {
    let raw = str::from_utf8(e.name().as_ref())
        .map_err(|err| Error::malformed(err, position))?
        .to_string();

    let namespace = match resolved {
        ResolveResult::Bound(Namespace(uri)) => Some(
            str::from_utf8(uri)
                .map_err(|err| Error::malformed(err, position))?
                .to_string(),
        ),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(prefix) => {
            return Err(Error::malformed(
                format!(
                    "undeclared namespace prefix '{}' on <{}>",
                    String::from_utf8_lossy(&prefix),
                    raw
                ),
                position,
            ));
        }
    };

    let mut element = Element::new(QName::parse(&raw), namespace);
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::malformed(err, position))?;
        let name = str::from_utf8(attr.key.as_ref())
            .map_err(|err| Error::malformed(err, position))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| Error::malformed(err, position))?
            .into_owned();
        element.attributes.push(Attribute { name, value });
    }
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::XMLNS_FOXML;

    const SIMPLE_FOXML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- leading comment -->
<foxml:digitalObject xmlns:foxml="info:fedora/fedora-system:def/foxml#" PID="test:1">
  <foxml:datastream ID="OBJ" STATE="A">
    <foxml:datastreamVersion ID="OBJ.0" LABEL="orig">
      <foxml:binaryContent>AQID</foxml:binaryContent>
    </foxml:datastreamVersion>
    <!-- trailing -->
  </foxml:datastream>
</foxml:digitalObject>
"#;

    #[test]
    fn test_parse_structure() {
        let doc = parse(SIMPLE_FOXML.as_bytes()).unwrap();
        let root = doc.element(doc.root()).unwrap();

        assert_eq!(root.name.as_raw(), "foxml:digitalObject");
        assert_eq!(root.namespace.as_deref(), Some(XMLNS_FOXML));
        assert_eq!(root.attribute("PID"), Some("test:1"));
        assert_eq!(root.attributes[0].name, "xmlns:foxml");

        let ds = doc.children(doc.root())[0];
        assert!(doc.element(ds).unwrap().is(XMLNS_FOXML, "datastream"));
        // datastreamVersion + comment
        assert_eq!(doc.children(ds).len(), 2);
        assert!(matches!(
            doc.node(doc.children(ds)[1]).kind,
            NodeKind::Comment(ref c) if c == " trailing "
        ));
    }

    #[test]
    fn test_text_and_tail() {
        let doc = parse(SIMPLE_FOXML.as_bytes()).unwrap();
        let ds = doc.children(doc.root())[0];
        let version = doc.children(ds)[0];
        let content = doc.children(version)[0];

        assert_eq!(doc.node(doc.root()).text.as_deref(), Some("\n  "));
        assert_eq!(doc.node(content).text.as_deref(), Some("AQID"));
        assert_eq!(doc.node(content).tail.as_deref(), Some("\n    "));
        assert_eq!(doc.node(version).tail.as_deref(), Some("\n    "));
        assert_eq!(doc.node(ds).tail.as_deref(), Some("\n"));
        assert_eq!(doc.node(doc.root()).tail, None);
    }

    #[test]
    fn test_entities_are_unescaped() {
        let xml = r#"<a t="x &amp; y">1 &lt; 2<b/>&#65;</a>"#;
        let doc = parse(xml.as_bytes()).unwrap();
        let root = doc.element(doc.root()).unwrap();
        assert_eq!(root.attribute("t"), Some("x & y"));
        assert_eq!(doc.node(doc.root()).text.as_deref(), Some("1 < 2"));
        let b = doc.children(doc.root())[0];
        assert_eq!(doc.node(b).tail.as_deref(), Some("A"));
    }

    #[test]
    fn test_default_namespace_resolution() {
        let xml = r#"<digitalObject xmlns="info:fedora/fedora-system:def/foxml#"><datastream ID="X"/></digitalObject>"#;
        let doc = parse(xml.as_bytes()).unwrap();
        let ds = doc.children(doc.root())[0];
        let element = doc.element(ds).unwrap();
        assert!(element.is(XMLNS_FOXML, "datastream"));
        assert_eq!(element.name.prefix, None);
    }

    #[test]
    fn test_malformed_inputs() {
        let cases = [
            "",
            "<a>",
            "<a></b>",
            "<a/><b/>",
            "text<a/>",
            "<x:a/>",
            r#"<a b="1" b="2"/>"#,
        ];
        for case in cases {
            let err = parse(case.as_bytes()).unwrap_err();
            assert!(
                matches!(err, Error::MalformedInput(_)),
                "expected MalformedInput for {:?}, got {:?}",
                case,
                err
            );
        }
    }
}
