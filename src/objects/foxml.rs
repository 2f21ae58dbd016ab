//! FOXML vocabulary: namespaces, element names and version records.

use chrono::{DateTime, SecondsFormat, Utc};

use super::tree::{Document, NodeId};

// ============================================================================
// FOXML Namespaces and Constants
// ============================================================================

/// FOXML namespace
pub const XMLNS_FOXML: &str = "info:fedora/fedora-system:def/foxml#";

/// XML Schema instance namespace
pub const XMLNS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Fedora audit namespace
pub const XMLNS_AUDIT: &str = "info:fedora/fedora-system:def/audit#";

/// RDF namespace
pub const XMLNS_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// Fedora external relations namespace
pub const XMLNS_FEDORA: &str = "info:fedora/fedora-system:def/relations-external#";

/// Fedora model namespace
pub const XMLNS_FEDORA_MODEL: &str = "info:fedora/fedora-system:def/model#";

/// Islandora relations namespace
pub const XMLNS_ISLANDORA: &str = "http://islandora.ca/ontology/relsext#";

/// Conventional prefixes for the namespaces a FOXML object uses.
pub const FOXML_NAMESPACES: &[(&str, &str)] = &[
    ("foxml", XMLNS_FOXML),
    ("xsi", XMLNS_XSI),
    ("audit", XMLNS_AUDIT),
    ("rdf", XMLNS_RDF),
    ("fedora", XMLNS_FEDORA),
    ("fedora-model", XMLNS_FEDORA_MODEL),
    ("islandora", XMLNS_ISLANDORA),
];

/// Local name of a datastream element
pub const DATASTREAM: &str = "datastream";

/// Local name of a datastream version element
pub const DATASTREAM_VERSION: &str = "datastreamVersion";

/// Local name of an inline base64 content element
pub const BINARY_CONTENT: &str = "binaryContent";

/// Label used when none is supplied and no earlier version carries one
pub const DEFAULT_LABEL: &str = "default_label";

/// Mimetype used when none can be determined
pub const DEFAULT_MIMETYPE: &str = "application/octet-stream";

/// Formats a timestamp the way FOXML `CREATED` attributes expect:
/// UTC, millisecond precision, literal `Z`.
pub fn format_created(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The attributes of a `datastreamVersion` element.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatastreamVersion {
    /// Version identifier, `{dsid}.{sequence}`
    pub id: String,
    /// Human-readable label
    pub label: String,
    /// Content mimetype
    pub mimetype: String,
    /// Size in bytes of the decoded payload
    pub size: u64,
    /// Creation time
    pub created: DateTime<Utc>,
}

impl DatastreamVersion {
    /// Builds the identifier for a given datastream and sequence number.
    pub fn make_id(dsid: &str, sequence: usize) -> String {
        format!("{}.{}", dsid, sequence)
    }

    /// Returns the attributes in the order they are written:
    /// `ID`, `LABEL`, `MIMETYPE`, `SIZE`, then `CREATED`.
    pub fn attributes(&self) -> [(&'static str, String); 5] {
        [
            ("ID", self.id.clone()),
            ("LABEL", self.label.clone()),
            ("MIMETYPE", self.mimetype.clone()),
            ("SIZE", self.size.to_string()),
            ("CREATED", format_created(&self.created)),
        ]
    }
}

/// A datastream version as written in an existing document. Values are kept
/// verbatim; FOXML does not require every attribute on every version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VersionSummary {
    /// `ID` attribute
    pub id: Option<String>,
    /// `LABEL` attribute
    pub label: Option<String>,
    /// `MIMETYPE` attribute
    pub mimetype: Option<String>,
    /// `SIZE` attribute
    pub size: Option<u64>,
    /// `CREATED` attribute
    pub created: Option<String>,
}

/// A datastream and its versions in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatastreamSummary {
    /// `ID` attribute of the datastream
    pub id: String,
    /// Versions in document order
    pub versions: Vec<VersionSummary>,
}

impl DatastreamSummary {
    /// Returns the most recent version (last in document order).
    pub fn latest(&self) -> Option<&VersionSummary> {
        self.versions.last()
    }

    /// Collects summaries for every FOXML datastream in the document.
    pub fn collect(doc: &Document) -> Vec<DatastreamSummary> {
        doc.descendants(doc.root())
            .filter(|id| {
                doc.element(*id)
                    .map(|e| e.is(XMLNS_FOXML, DATASTREAM))
                    .unwrap_or(false)
            })
            .filter_map(|id| Self::from_node(doc, id))
            .collect()
    }

    fn from_node(doc: &Document, id: NodeId) -> Option<Self> {
        let element = doc.element(id)?;
        let versions = doc
            .child_elements(id, XMLNS_FOXML, DATASTREAM_VERSION)
            .filter_map(|v| doc.element(v))
            .map(|v| VersionSummary {
                id: v.attribute("ID").map(str::to_string),
                label: v.attribute("LABEL").map(str::to_string),
                mimetype: v.attribute("MIMETYPE").map(str::to_string),
                size: v.attribute("SIZE").and_then(|s| s.parse().ok()),
                created: v.attribute("CREATED").map(str::to_string),
            })
            .collect();
        Some(Self {
            id: element.attribute("ID").unwrap_or_default().to_string(),
            versions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_created_millis_with_z() {
        let time = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
            + chrono::Duration::microseconds(123_456);
        assert_eq!(format_created(&time), "2024-01-15T10:30:00.123Z");

        let whole = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_created(&whole), "2024-01-15T10:30:00.000Z");
    }

    #[test]
    fn test_version_attributes_order() {
        let version = DatastreamVersion {
            id: DatastreamVersion::make_id("OBJ", 1),
            label: "orig".to_string(),
            mimetype: "image/png".to_string(),
            size: 3,
            created: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
        };
        let names: Vec<_> = version.attributes().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["ID", "LABEL", "MIMETYPE", "SIZE", "CREATED"]);
        assert_eq!(version.attributes()[0].1, "OBJ.1");
        assert_eq!(version.attributes()[3].1, "3");
    }

    #[test]
    fn test_collect_summaries() {
        let xml = r#"<foxml:digitalObject xmlns:foxml="info:fedora/fedora-system:def/foxml#">
  <foxml:datastream ID="DC">
    <foxml:datastreamVersion ID="DC.0" LABEL="Dublin Core" SIZE="12"/>
    <foxml:datastreamVersion ID="DC.1" CREATED="2024-01-15T10:30:00.000Z"/>
  </foxml:datastream>
  <foxml:datastream ID="TN"/>
</foxml:digitalObject>"#;
        let doc = crate::reader::parse(xml.as_bytes()).unwrap();
        let summaries = DatastreamSummary::collect(&doc);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, "DC");
        assert_eq!(summaries[0].versions[0].size, Some(12));
        let latest = summaries[0].latest().unwrap();
        assert_eq!(latest.id.as_deref(), Some("DC.1"));
        assert_eq!(latest.label, None);
        assert_eq!(latest.created.as_deref(), Some("2024-01-15T10:30:00.000Z"));
        assert!(summaries[1].latest().is_none());
    }
}
