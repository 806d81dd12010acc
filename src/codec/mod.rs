//! XML codec for the journal metadata schema.
//!
//! - [`export`]: Document → XML
//! - [`import`]: XML → Document, all-or-nothing
//! - [`tree`]: the minimal element tree both directions are tested against

pub mod export;
pub mod import;
pub mod tree;

pub use export::{to_xml_string, write_document, ElementWriter, WriteOptions};
pub use import::{import_str, parse_document, ParsedDocument, ROOT_ELEMENT};
pub use tree::Element;

/// Errors produced while reading or writing XML
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Input is not well-formed XML
    #[error("Malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    /// Input has no root element
    #[error("Document has no root element")]
    Empty,

    /// Well-formed, but not a journal document
    #[error("Expected <{expected}> root element, found <{found}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },

    /// A key cannot be used as an element name
    #[error("Invalid element name: {0:?}")]
    InvalidElementName(String),

    /// IO error while writing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by the XML writer
    #[error("XML error: {0}")]
    Xml(String),
}

impl From<quick_xml::Error> for CodecError {
    fn from(err: quick_xml::Error) -> Self {
        CodecError::Xml(err.to_string())
    }
}

/// Check that a key can be written as an XML element name.
///
/// Letters, digits, `_`, `-` and `.`; must start with a letter or `_`.
pub fn is_valid_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    if name.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("xml")) {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
