//! End-to-end injection: discover namespaces, parse, inject, format, write.
//!
//! Nothing is produced unless every step succeeds.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::encoder::encode_content;
use crate::error::Result;
use crate::formatter::format_document;
use crate::injector::{inject, InjectRequest, InjectedVersion};
use crate::mimetype;
use crate::namespaces::NamespaceRegistry;
use crate::objects::DatastreamSummary;
use crate::reader::parse;
use crate::writer::{DocumentWriter, WriterConfig};

/// The serialized document and the version that was added to it.
#[derive(Debug, Clone)]
pub struct InjectOutput {
    /// Serialized UTF-8 XML, declaration included
    pub xml: Vec<u8>,
    /// The added version
    pub injected: InjectedVersion,
}

/// Injects a version into an in-memory FOXML document with default settings.
pub fn inject_bytes(xml: &[u8], request: &InjectRequest) -> Result<InjectOutput> {
    inject_bytes_with(xml, request, &WriterConfig::default())
}

/// Injects a version into an in-memory FOXML document.
pub fn inject_bytes_with(
    xml: &[u8],
    request: &InjectRequest,
    config: &WriterConfig,
) -> Result<InjectOutput> {
    let registry = NamespaceRegistry::discover(xml)?.with_foxml_defaults();
    let mut doc = parse(xml)?;
    debug!(nodes = doc.len(), "parsed source document");

    let injected = inject(&mut doc, &registry, request)?;

    if config.indent {
        format_document(&mut doc, &config.indent_string);
    }
    let xml = DocumentWriter::with_config(config.clone()).write_to_vec(&doc, &registry)?;
    Ok(InjectOutput { xml, injected })
}

/// Reads a FOXML file and a content file and injects the content as a new
/// version of `dsid`. The mimetype is guessed from the content path when
/// not given.
pub fn inject_file(
    xml_path: &Path,
    content_path: &Path,
    dsid: &str,
    label: Option<String>,
    mimetype: Option<String>,
) -> Result<InjectOutput> {
    let data = fs::read(content_path)?;
    let mimetype =
        mimetype.unwrap_or_else(|| mimetype::guess_or_default(content_path).to_string());
    let xml = fs::read(xml_path)?;

    let request =
        InjectRequest::new(dsid, encode_content(&data), mimetype).with_optional_label(label);
    inject_bytes(&xml, &request)
}

/// Lists every datastream in a FOXML document with its versions.
pub fn list_datastreams(xml: &[u8]) -> Result<Vec<DatastreamSummary>> {
    let doc = parse(xml)?;
    Ok(DatastreamSummary::collect(&doc))
}
