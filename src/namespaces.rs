//! Namespace prefix discovery.
//!
//! The [`NamespaceRegistry`] is built by scanning the raw source once for
//! every `xmlns` / `xmlns:prefix` declaration, wherever it appears. The
//! registry is passed explicitly to the injector (to pick the prefix for new
//! elements) and to the writer (to declare a prefix that is used but not in
//! scope), so output keeps the source's prefixes instead of synthesizing new
//! ones.

use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::error::{Error, Result};
use crate::objects::{Document, NodeId, FOXML_NAMESPACES};

/// Prefix to URI bindings in discovery order.
///
/// A prefix declared more than once keeps its first position and its last
/// URI. The default namespace is stored under the empty prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceRegistry {
    bindings: Vec<(String, String)>,
}

impl NamespaceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the conventional FOXML prefixes.
    pub fn foxml_defaults() -> Self {
        Self::new().with_foxml_defaults()
    }

    /// Adds the conventional FOXML prefixes as fallbacks. A default is
    /// skipped when its prefix or its URI is already bound, so discovered
    /// bindings always win.
    pub fn with_foxml_defaults(mut self) -> Self {
        for (prefix, uri) in FOXML_NAMESPACES {
            if self.uri(prefix).is_none() && self.prefix(uri).is_none() {
                self.bindings.push((prefix.to_string(), uri.to_string()));
            }
        }
        self
    }

    /// Scans an XML source for every namespace declaration.
    ///
    /// Fails with [`Error::MalformedInput`] if the source is not well-formed.
    pub fn discover(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();
        let mut registry = Self::new();

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| Error::malformed(e, reader.error_position()))?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    registry.register_declarations(e, reader.buffer_position())?;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        debug!(count = registry.len(), "discovered namespace bindings");
        Ok(registry)
    }

    /// Collects the bindings in scope at a node: declarations on the node
    /// and its ancestors, nearer ones shadowing outer ones.
    pub fn in_scope(doc: &Document, id: NodeId) -> Self {
        let mut registry = Self::new();
        for ancestor in doc.path_to(id).unwrap_or_default() {
            if let Some(element) = doc.element(ancestor) {
                for attr in &element.attributes {
                    if let Some((prefix, uri)) = attr.namespace_declaration() {
                        registry.register(prefix, uri);
                    }
                }
            }
        }
        registry
    }

    fn register_declarations(&mut self, e: &BytesStart<'_>, position: u64) -> Result<()> {
        for attr in e.attributes() {
            let attr = attr.map_err(|err| Error::malformed(err, position))?;
            let key = str::from_utf8(attr.key.as_ref()).map_err(|err| Error::malformed(err, position))?;
            let prefix = if key == "xmlns" {
                ""
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                prefix
            } else {
                continue;
            };
            let uri = attr
                .unescape_value()
                .map_err(|err| Error::malformed(err, position))?;
            self.register(prefix, uri.into_owned());
        }
        Ok(())
    }

    /// Binds `prefix` to `uri`, replacing any earlier binding for the prefix.
    pub fn register(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let prefix = prefix.into();
        let uri = uri.into();
        match self.bindings.iter_mut().find(|(p, _)| *p == prefix) {
            Some(binding) => binding.1 = uri,
            None => self.bindings.push((prefix, uri)),
        }
    }

    /// Returns the URI bound to a prefix (`""` for the default namespace).
    pub fn uri(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Returns the first prefix bound to a URI. Named prefixes are preferred
    /// over the default namespace.
    pub fn prefix(&self, uri: &str) -> Option<&str> {
        self.bindings
            .iter()
            .filter(|(_, u)| u == uri)
            .map(|(p, _)| p.as_str())
            .min_by_key(|p| p.is_empty())
    }

    /// Iterates bindings in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// Returns the number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if no bindings are registered.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
