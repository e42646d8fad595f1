//! Provider extract XML parsing.
//!
//! Only the well-formedness probe is implemented, to the same shallow depth
//! as the upstream system (file exists and carries an `.xml` extension). The
//! real parsing operations are typed stubs returning
//! [`XmlError::NotImplemented`]. The record shapes below are data holders
//! for the future parser; no working code populates them.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised by XML parsing operations.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The operation has no implementation yet.
    #[error("XML {operation} not yet implemented")]
    NotImplemented {
        /// The operation that was requested.
        operation: &'static str,
    },
}

/// A provider location as it will appear in parsed extracts.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProviderLocation {
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Province or territory.
    pub province: String,
    /// Postal code.
    pub postal_code: String,
    /// Contact phone number.
    pub phone: String,
}

/// A provider record as it will appear in parsed extracts.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProviderRecord {
    /// Stable provider identifier.
    pub provider_id: String,
    /// Display name.
    pub provider_name: String,
    /// Provider category.
    pub provider_type: String,
    /// Declared specialties.
    pub specialties: Vec<String>,
    /// Practice locations.
    pub locations: Vec<ProviderLocation>,
}

/// Parser for provider extract XML files.
#[derive(Debug, Default)]
pub struct ProviderXmlParser;

impl ProviderXmlParser {
    /// Creates the parser.
    #[must_use]
    pub fn new() -> Self {
        info!("Provider XML parser initialized (stub implementation)");
        Self
    }

    /// Returns true if the file is plausibly well-formed XML.
    ///
    /// Matches the upstream depth: the file exists and has a
    /// case-insensitive `.xml` extension. A real implementation would run an
    /// actual well-formedness scan.
    #[must_use]
    pub fn is_well_formed(&self, path: &Path) -> bool {
        debug!(path = %path.display(), "checking XML well-formedness");
        path.exists()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
    }

    /// Parses a provider extract into records.
    ///
    /// # Errors
    ///
    /// Always returns [`XmlError::NotImplemented`].
    pub fn parse_provider_xml(&self, path: &Path) -> Result<Vec<ProviderRecord>, XmlError> {
        warn!("XML parsing not yet implemented - stub method called");
        info!(path = %path.display(), "would parse extract");
        Err(XmlError::NotImplemented {
            operation: "parsing",
        })
    }

    /// Validates an extract against an optional schema file.
    ///
    /// # Errors
    ///
    /// Always returns [`XmlError::NotImplemented`].
    pub fn validate(&self, path: &Path, schema: Option<&Path>) -> Result<bool, XmlError> {
        warn!("XML validation not yet implemented - stub method called");
        info!(path = %path.display(), schema = ?schema, "would validate extract");
        Err(XmlError::NotImplemented {
            operation: "validation",
        })
    }

    /// Extracts document metadata (record counts, creation timestamps).
    ///
    /// # Errors
    ///
    /// Always returns [`XmlError::NotImplemented`].
    pub fn extract_metadata(&self, path: &Path) -> Result<BTreeMap<String, String>, XmlError> {
        warn!("XML metadata extraction not yet implemented - stub method called");
        info!(path = %path.display(), "would extract metadata");
        Err(XmlError::NotImplemented {
            operation: "metadata extraction",
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_well_formed_requires_existing_xml_file() {
        let parser = ProviderXmlParser::new();
        let dir = tempfile::tempdir().unwrap();

        let xml = dir.path().join("extract.xml");
        std::fs::write(&xml, "<providers/>").unwrap();
        assert!(parser.is_well_formed(&xml));

        let upper = dir.path().join("EXTRACT.XML");
        std::fs::write(&upper, "<providers/>").unwrap();
        assert!(parser.is_well_formed(&upper));

        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, "hello").unwrap();
        assert!(!parser.is_well_formed(&txt));

        assert!(!parser.is_well_formed(&dir.path().join("missing.xml")));
    }

    #[test]
    fn test_parse_reports_not_implemented() {
        let error = ProviderXmlParser::new()
            .parse_provider_xml(Path::new("extract.xml"))
            .unwrap_err();
        assert!(matches!(
            error,
            XmlError::NotImplemented {
                operation: "parsing"
            }
        ));
    }

    #[test]
    fn test_validate_reports_not_implemented() {
        let error = ProviderXmlParser::new()
            .validate(Path::new("extract.xml"), None)
            .unwrap_err();
        assert!(matches!(error, XmlError::NotImplemented { .. }));
    }

    #[test]
    fn test_extract_metadata_reports_not_implemented() {
        let error = ProviderXmlParser::new()
            .extract_metadata(Path::new("extract.xml"))
            .unwrap_err();
        assert!(matches!(error, XmlError::NotImplemented { .. }));
    }

    #[test]
    fn test_record_shapes_default_empty() {
        let record = ProviderRecord::default();
        assert!(record.provider_id.is_empty());
        assert!(record.specialties.is_empty());
        assert!(record.locations.is_empty());

        let location = ProviderLocation::default();
        assert!(location.postal_code.is_empty());
    }
}
