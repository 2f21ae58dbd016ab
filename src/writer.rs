//! Document writer for serializing the arena tree back to XML.
//!
//! Elements and attributes are written with the names they were parsed
//! with, in their original order, so prefixes survive a round trip. The
//! writer tracks namespace scope while it walks the tree: a prefix that is
//! used but not declared in scope is declared from the [`NamespaceRegistry`],
//! and anything the registry cannot resolve is a
//! [`Error::SerializationFailure`].
//!
//! # Example
//!
//! ```rust
//! use foxml_inject::namespaces::NamespaceRegistry;
//! use foxml_inject::reader::parse;
//! use foxml_inject::writer::DocumentWriter;
//!
//! let xml = br#"<foxml:digitalObject xmlns:foxml="info:fedora/fedora-system:def/foxml#"/>"#;
//! let registry = NamespaceRegistry::discover(xml).unwrap();
//! let doc = parse(xml).unwrap();
//!
//! let out = DocumentWriter::new().write_to_string(&doc, &registry).unwrap();
//! assert!(out.contains("<foxml:digitalObject"));
//! ```

use std::borrow::Cow;
use std::io::Write;

use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::attributes::Attribute as XmlAttribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::name::QName as XmlName;
use quick_xml::Writer;

use crate::error::{Error, Result};
use crate::formatter::INDENT;
use crate::namespaces::NamespaceRegistry;
use crate::objects::{Document, Element, NodeId, NodeKind};

/// Configuration options for the document writer.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Whether to normalize indentation before writing
    pub indent: bool,
    /// Indentation unit (default: two spaces)
    pub indent_string: String,
    /// Whether to include the XML declaration
    pub xml_declaration: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            indent: true,
            indent_string: INDENT.to_string(),
            xml_declaration: true,
        }
    }
}

impl WriterConfig {
    /// Creates a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration that leaves whitespace as parsed.
    pub fn compact() -> Self {
        Self {
            indent: false,
            indent_string: String::new(),
            xml_declaration: true,
        }
    }

    /// Sets whether to indent the output.
    pub fn with_indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the indentation string.
    pub fn with_indent_string(mut self, s: impl Into<String>) -> Self {
        self.indent_string = s.into();
        self
    }
}

/// Namespace bindings declared by the elements currently open.
#[derive(Default)]
struct ScopeStack {
    frames: Vec<Vec<(String, String)>>,
}

impl ScopeStack {
    fn push(&mut self, element: &Element) {
        let frame = element
            .attributes
            .iter()
            .filter_map(|a| a.namespace_declaration())
            .map(|(p, u)| (p.to_string(), u.to_string()))
            .collect();
        self.frames.push(frame);
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    fn declare(&mut self, prefix: &str, uri: &str) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push((prefix.to_string(), uri.to_string()));
        }
    }

    fn lookup(&self, prefix: &str) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|(p, _)| p == prefix)
            .map(|(_, u)| u.as_str())
    }
}

/// XML writer for [`Document`] trees.
pub struct DocumentWriter {
    config: WriterConfig,
}

impl DocumentWriter {
    /// Creates a new writer with default configuration.
    pub fn new() -> Self {
        Self {
            config: WriterConfig::default(),
        }
    }

    /// Creates a new writer with the specified configuration.
    pub fn with_config(config: WriterConfig) -> Self {
        Self { config }
    }

    /// Returns the writer's configuration.
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Writes a document to a byte buffer.
    pub fn write_to_vec(&self, doc: &Document, registry: &NamespaceRegistry) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write(doc, registry, &mut buffer)?;
        Ok(buffer)
    }

    /// Writes a document to a string.
    pub fn write_to_string(&self, doc: &Document, registry: &NamespaceRegistry) -> Result<String> {
        let buffer = self.write_to_vec(doc, registry)?;
        String::from_utf8(buffer).map_err(Error::serialization)
    }

    /// Writes a document to any Write implementation.
    pub fn write<W: Write>(
        &self,
        doc: &Document,
        registry: &NamespaceRegistry,
        writer: W,
    ) -> Result<()> {
        let mut xml_writer = Writer::new(writer);

        if self.config.xml_declaration {
            xml_writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(Error::serialization)?;
            xml_writer.get_mut().write_all(b"\n")?;
        }

        let mut scopes = ScopeStack::default();
        self.write_node(&mut xml_writer, doc, doc.root(), registry, &mut scopes)
    }

    /// Writes a node, its subtree and its tail.
    fn write_node<W: Write>(
        &self,
        writer: &mut Writer<W>,
        doc: &Document,
        id: NodeId,
        registry: &NamespaceRegistry,
        scopes: &mut ScopeStack,
    ) -> Result<()> {
        let node = doc.node(id);
        match &node.kind {
            NodeKind::Element(element) => {
                self.write_element(writer, doc, id, element, registry, scopes)?;
            }
            NodeKind::Comment(content) => {
                writer
                    .write_event(Event::Comment(BytesText::from_escaped(content.as_str())))
                    .map_err(Error::serialization)?;
            }
            NodeKind::ProcessingInstruction(content) => {
                writer
                    .write_event(Event::PI(BytesPI::new(content.as_str())))
                    .map_err(Error::serialization)?;
            }
        }
        if let Some(tail) = &node.tail {
            self.write_text(writer, tail)?;
        }
        Ok(())
    }

    /// Writes an element with its children.
    fn write_element<W: Write>(
        &self,
        writer: &mut Writer<W>,
        doc: &Document,
        id: NodeId,
        element: &Element,
        registry: &NamespaceRegistry,
        scopes: &mut ScopeStack,
    ) -> Result<()> {
        scopes.push(element);
        let declarations = self.missing_declarations(element, registry, scopes)?;

        let raw = element.name.as_raw();
        let mut start = BytesStart::new(raw.as_str());
        for attr in &element.attributes {
            start.push_attribute(escaped_attribute(&attr.name, &attr.value));
        }
        for (name, uri) in &declarations {
            start.push_attribute(escaped_attribute(name, uri));
        }

        let node = doc.node(id);
        let has_text = node.text.as_deref().is_some_and(|t| !t.is_empty());
        if node.children.is_empty() && !has_text {
            writer
                .write_event(Event::Empty(start))
                .map_err(Error::serialization)?;
        } else {
            writer
                .write_event(Event::Start(start))
                .map_err(Error::serialization)?;
            if let Some(text) = &node.text {
                self.write_text(writer, text)?;
            }
            for &child in &node.children {
                self.write_node(writer, doc, child, registry, scopes)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(raw.as_str())))
                .map_err(Error::serialization)?;
        }

        scopes.pop();
        Ok(())
    }

    /// Checks every prefix the element uses against the bindings in scope and
    /// returns declarations to add for prefixes only the registry knows.
    fn missing_declarations(
        &self,
        element: &Element,
        registry: &NamespaceRegistry,
        scopes: &mut ScopeStack,
    ) -> Result<Vec<(String, String)>> {
        let mut declarations = Vec::new();
        let raw = element.name.as_raw();
        let prefix = element.name.prefix.as_deref().unwrap_or("");

        if prefix != "xml" {
            let in_scope = scopes.lookup(prefix).filter(|uri| !uri.is_empty());
            let expected = element.namespace.as_deref();
            if in_scope != expected {
                match (in_scope, expected) {
                    (None, Some(uri)) if registry.uri(prefix) == Some(uri) => {
                        declarations.push((declaration_name(prefix), uri.to_string()));
                        scopes.declare(prefix, uri);
                    }
                    _ => {
                        return Err(Error::SerializationFailure(format!(
                            "element <{}> expects namespace {:?} but prefix '{}' is bound to {:?}",
                            raw, expected, prefix, in_scope
                        )));
                    }
                }
            }
        }

        for attr in &element.attributes {
            let Some((attr_prefix, _)) = attr.name.split_once(':') else {
                continue;
            };
            if attr_prefix == "xmlns" || attr_prefix == "xml" {
                continue;
            }
            if scopes.lookup(attr_prefix).is_some() {
                continue;
            }
            match registry.uri(attr_prefix) {
                Some(uri) if !attr_prefix.is_empty() => {
                    declarations.push((declaration_name(attr_prefix), uri.to_string()));
                    scopes.declare(attr_prefix, uri);
                }
                _ => {
                    return Err(Error::SerializationFailure(format!(
                        "attribute {} on <{}> uses an undeclared prefix",
                        attr.name, raw
                    )));
                }
            }
        }

        Ok(declarations)
    }

    /// Writes character data, escaping only what markup requires.
    fn write_text<W: Write>(&self, writer: &mut Writer<W>, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let escaped = partial_escape(text).replace('\r', "&#13;");
        writer
            .write_event(Event::Text(BytesText::from_escaped(escaped)))
            .map_err(Error::serialization)?;
        Ok(())
    }
}

impl Default for DocumentWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Escapes an attribute value so it survives attribute-value normalization:
/// markup characters plus tab, newline and carriage return as character
/// references.
fn escape_attribute_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in escape(value).chars() {
        match c {
            '\t' => escaped.push_str("&#9;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn escaped_attribute<'a>(name: &'a str, value: &str) -> XmlAttribute<'a> {
    XmlAttribute {
        key: XmlName(name.as_bytes()),
        value: Cow::Owned(escape_attribute_value(value).into_bytes()),
    }
}

fn declaration_name(prefix: &str) -> String {
    if prefix.is_empty() {
        "xmlns".to_string()
    } else {
        format!("xmlns:{}", prefix)
    }
}

/// Convenience function to write a document to bytes with default settings.
pub fn to_vec(doc: &Document, registry: &NamespaceRegistry) -> Result<Vec<u8>> {
    DocumentWriter::new().write_to_vec(doc, registry)
}

/// Convenience function to write a document to a string with default settings.
pub fn to_string(doc: &Document, registry: &NamespaceRegistry) -> Result<String> {
    DocumentWriter::new().write_to_string(doc, registry)
}
