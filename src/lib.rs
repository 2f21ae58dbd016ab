//! Datastream version injection for FOXML digital objects.
//!
//! This crate adds a new, versioned binary payload to an existing datastream
//! of a FOXML object: the payload is base64-encoded into a
//! `foxml:binaryContent` element inside a new `foxml:datastreamVersion`,
//! and the document is re-serialized with deterministic indentation so that
//! repeated runs produce byte-stable, diff-friendly output.
//!
//! # Features
//!
//! - **Namespace Registry**: Discovers every prefix declared in the source so
//!   output keeps the original prefixes.
//! - **Content Encoder**: Base64 wrapped at 80 characters, plus the decoder.
//! - **Version Injector**: Finds the datastream anywhere in the tree and
//!   appends `{dsid}.{n}` where `n` is the current number of versions.
//! - **Canonical Formatter**: Idempotent whitespace normalization that never
//!   overwrites meaningful character data.
//! - **Serde Support**: Optional serialization of version records with the
//!   `serde` feature.
//!
//! # Quick Start
//!
//! ```rust
//! use foxml_inject::encoder::encode_content;
//! use foxml_inject::injector::InjectRequest;
//! use foxml_inject::pipeline::inject_bytes;
//!
//! let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
//! <foxml:digitalObject xmlns:foxml="info:fedora/fedora-system:def/foxml#">
//!   <foxml:datastream ID="OBJ">
//!     <foxml:datastreamVersion ID="OBJ.0" LABEL="orig"/>
//!   </foxml:datastream>
//! </foxml:digitalObject>"#;
//!
//! let request = InjectRequest::new("OBJ", encode_content(&[1, 2, 3]), "image/png");
//! let output = inject_bytes(xml, &request).unwrap();
//! assert_eq!(output.injected.version.id, "OBJ.1");
//! assert_eq!(output.injected.version.label, "orig");
//! ```
//!
//! # Module Structure
//!
//! - [`objects`] - Arena document tree and FOXML vocabulary
//! - [`namespaces`] - Namespace prefix discovery
//! - [`encoder`] - Base64 content encoding
//! - [`reader`] - XML parser building the tree
//! - [`injector`] - Datastream version injection
//! - [`formatter`] - Whitespace normalization
//! - [`writer`] - XML serializer
//! - [`pipeline`] - End-to-end operations
//! - [`error`] - Error types
//!
//! # Optional Features
//!
//! - `serde` - Enable serde serialization/deserialization support
//! - `cli` - Build the `ds_inject` command-line tool

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod encoder;
pub mod error;
pub mod formatter;
pub mod injector;
pub mod mimetype;
pub mod namespaces;
pub mod objects;
pub mod pipeline;
pub mod reader;
pub mod writer;

// Re-export commonly used types at the crate root
pub use encoder::{decode_content, encode_content, EncodedContent};
pub use error::{Error, Result};
pub use injector::{inject, InjectRequest, InjectedVersion};
pub use namespaces::NamespaceRegistry;
pub use objects::{DatastreamSummary, DatastreamVersion, Document};
pub use pipeline::{inject_bytes, inject_file, list_datastreams, InjectOutput};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
