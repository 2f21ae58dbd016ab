//! Datastream version injection.
//!
//! Locates a `foxml:datastream` anywhere in the tree by its `ID`, resolves
//! the label, assigns the next version identifier from the current number of
//! versions, and appends a new `foxml:datastreamVersion` holding one
//! `foxml:binaryContent` child.
//!
//! # Example
//!
//! ```rust
//! use foxml_inject::encoder::encode_content;
//! use foxml_inject::injector::{inject, InjectRequest};
//! use foxml_inject::namespaces::NamespaceRegistry;
//! use foxml_inject::reader::parse;
//!
//! let xml = br#"<foxml:digitalObject xmlns:foxml="info:fedora/fedora-system:def/foxml#">
//!   <foxml:datastream ID="OBJ"/>
//! </foxml:digitalObject>"#;
//! let registry = NamespaceRegistry::discover(xml).unwrap();
//! let mut doc = parse(xml).unwrap();
//!
//! let request = InjectRequest::new("OBJ", encode_content(b"hello"), "text/plain");
//! let injected = inject(&mut doc, &registry, &request).unwrap();
//! assert_eq!(injected.version.id, "OBJ.0");
//! assert_eq!(injected.version.label, "default_label");
//! ```

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::encoder::EncodedContent;
use crate::error::{Error, Result};
use crate::namespaces::NamespaceRegistry;
use crate::objects::{
    DatastreamVersion, Document, Element, NodeId, QName, BINARY_CONTENT, DATASTREAM,
    DATASTREAM_VERSION, DEFAULT_LABEL, XMLNS_FOXML,
};

/// Whitespace placed around the base64 block inside `binaryContent`
pub const CONTENT_PAD: &str = "\n    ";

/// Everything needed to add one version to one datastream.
#[derive(Debug, Clone)]
pub struct InjectRequest {
    /// ID of the target datastream
    pub dsid: String,
    /// Encoded payload
    pub content: EncodedContent,
    /// Mimetype of the payload
    pub mimetype: String,
    /// Explicit label; when absent the latest version's label is reused
    pub label: Option<String>,
    /// Fixed creation time for `CREATED`; when absent the version is
    /// stamped with the current time as it is built
    pub created: Option<DateTime<Utc>>,
}

impl InjectRequest {
    /// Creates a request with no label and no fixed creation time.
    pub fn new(
        dsid: impl Into<String>,
        content: EncodedContent,
        mimetype: impl Into<String>,
    ) -> Self {
        Self {
            dsid: dsid.into(),
            content,
            mimetype: mimetype.into(),
            label: None,
            created: None,
        }
    }

    /// Sets an explicit label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets an optional label.
    pub fn with_optional_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    /// Fixes the creation time instead of stamping at injection.
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }
}

/// The result of a successful injection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedVersion {
    /// The datastream element that received the version
    pub datastream: NodeId,
    /// The new `datastreamVersion` element
    pub node: NodeId,
    /// The attributes written on it
    pub version: DatastreamVersion,
}

/// Finds the FOXML datastream whose `ID` equals `dsid`, searching the whole tree.
pub fn find_datastream(doc: &Document, dsid: &str) -> Option<NodeId> {
    doc.descendants(doc.root()).find(|id| {
        doc.element(*id)
            .map(|e| e.is(XMLNS_FOXML, DATASTREAM) && e.attribute("ID") == Some(dsid))
            .unwrap_or(false)
    })
}

/// Returns the version elements of a datastream in document order.
pub fn versions(doc: &Document, datastream: NodeId) -> Vec<NodeId> {
    doc.child_elements(datastream, XMLNS_FOXML, DATASTREAM_VERSION)
        .collect()
}

/// Resolves the label for a new version: explicit, else the latest
/// version's `LABEL`, else [`DEFAULT_LABEL`].
fn resolve_label(doc: &Document, existing: &[NodeId], explicit: Option<&str>) -> String {
    if let Some(label) = explicit {
        return label.to_string();
    }
    existing
        .last()
        .and_then(|id| doc.element(*id))
        .and_then(|e| e.attribute("LABEL"))
        .unwrap_or(DEFAULT_LABEL)
        .to_string()
}

/// Picks the prefix for new FOXML elements under `datastream`: the
/// registry's prefix for the FOXML namespace when it is bound to that
/// namespace in scope, else the prefix the datastream itself is written with.
fn foxml_prefix(doc: &Document, datastream: NodeId, registry: &NamespaceRegistry) -> Option<String> {
    let in_scope = NamespaceRegistry::in_scope(doc, datastream);
    if let Some(preferred) = registry.prefix(XMLNS_FOXML) {
        if in_scope.uri(preferred) == Some(XMLNS_FOXML) {
            return Some(preferred.to_string());
        }
    }
    doc.element(datastream).and_then(|e| e.name.prefix.clone())
}

/// Appends a new version to the requested datastream.
///
/// Fails with [`Error::DatastreamNotFound`] and leaves the tree untouched if
/// no datastream carries the requested ID.
pub fn inject(
    doc: &mut Document,
    registry: &NamespaceRegistry,
    request: &InjectRequest,
) -> Result<InjectedVersion> {
    let datastream = find_datastream(doc, &request.dsid).ok_or_else(|| {
        Error::DatastreamNotFound {
            dsid: request.dsid.clone(),
        }
    })?;

    let existing = versions(doc, datastream);
    let label = resolve_label(doc, &existing, request.label.as_deref());
    let version = DatastreamVersion {
        id: DatastreamVersion::make_id(&request.dsid, existing.len()),
        label,
        mimetype: request.mimetype.clone(),
        size: request.content.size,
        created: request.created.unwrap_or_else(Utc::now),
    };
    debug!(
        dsid = %request.dsid,
        existing = existing.len(),
        id = %version.id,
        "resolved new datastream version"
    );

    let prefix = foxml_prefix(doc, datastream, registry);

    let mut element = Element::new(
        QName::new(prefix.as_deref(), DATASTREAM_VERSION),
        Some(XMLNS_FOXML.to_string()),
    );
    for (name, value) in version.attributes() {
        element.set_attribute(name, value);
    }
    let node = doc.append_element(datastream, element);

    let content = Element::new(
        QName::new(prefix.as_deref(), BINARY_CONTENT),
        Some(XMLNS_FOXML.to_string()),
    );
    let content_node = doc.append_element(node, content);
    doc.node_mut(content_node).text =
        Some(format!("{}{}{}", CONTENT_PAD, request.content.text, CONTENT_PAD));

    info!(
        dsid = %request.dsid,
        id = %version.id,
        size = version.size,
        mimetype = %version.mimetype,
        "added datastream version"
    );

    Ok(InjectedVersion {
        datastream,
        node,
        version,
    })
}
