//! Document and FOXML object types.
//!
//! - [`Document`] - The arena tree a FOXML object is parsed into
//! - [`DatastreamVersion`] - The attribute record of a new version
//! - [`DatastreamSummary`] - A read-only view of an existing datastream
//!
//! Also provides the FOXML namespace constants and element names.

mod foxml;
mod tree;

pub use foxml::{
    format_created, DatastreamSummary, DatastreamVersion, VersionSummary, BINARY_CONTENT,
    DATASTREAM, DATASTREAM_VERSION, DEFAULT_LABEL, DEFAULT_MIMETYPE, FOXML_NAMESPACES,
    XMLNS_AUDIT, XMLNS_FEDORA, XMLNS_FEDORA_MODEL, XMLNS_FOXML, XMLNS_ISLANDORA, XMLNS_RDF,
    XMLNS_XSI,
};
pub use tree::{Attribute, Descendants, Document, Element, Node, NodeId, NodeKind, QName};
