//! Document → XML.

use super::import::ROOT_ELEMENT;
use super::{is_valid_element_name, CodecError};
use crate::models::schema::{AuthorField, FieldKind, PUBDATE_FIELDS};
use crate::models::Document;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Serialization settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Spaces per nesting level (0 writes everything on one line)
    pub indent: usize,

    /// Emit `<?xml version="1.0" encoding="UTF-8"?>`
    pub declaration: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent: 3,
            declaration: false,
        }
    }
}

impl WriteOptions {
    /// Options used for the workbook path: same indentation, with declaration
    pub fn with_declaration(mut self) -> Self {
        self.declaration = true;
        self
    }
}

/// Thin wrapper over `quick_xml::Writer` for leaf-field documents.
pub struct ElementWriter<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> ElementWriter<W> {
    /// Start a document, writing the declaration if requested
    pub fn new(out: W, options: &WriteOptions) -> Result<Self, CodecError> {
        let writer = if options.indent > 0 {
            Writer::new_with_indent(out, b' ', options.indent)
        } else {
            Writer::new(out)
        };
        let mut this = Self { writer };
        if options.declaration {
            this.writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        }
        Ok(this)
    }

    /// Open a container element
    pub fn start(&mut self, name: &str) -> Result<(), CodecError> {
        check_name(name)?;
        self.writer.write_event(Event::Start(BytesStart::new(name)))?;
        Ok(())
    }

    /// Close a container element
    pub fn end(&mut self, name: &str) -> Result<(), CodecError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Write a leaf element. Empty values become `<name/>`, never an omitted element.
    pub fn field(&mut self, name: &str, value: &str) -> Result<(), CodecError> {
        check_name(name)?;
        if value.is_empty() {
            self.writer.write_event(Event::Empty(BytesStart::new(name)))?;
        } else {
            self.writer.write_event(Event::Start(BytesStart::new(name)))?;
            self.writer.write_event(Event::Text(BytesText::new(value)))?;
            self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        Ok(())
    }

    /// Terminate the document with a newline and hand back the sink
    pub fn finish(mut self) -> Result<W, CodecError> {
        self.writer.get_mut().write_all(b"\n")?;
        Ok(self.writer.into_inner())
    }
}

fn check_name(name: &str) -> Result<(), CodecError> {
    if is_valid_element_name(name) {
        Ok(())
    } else {
        Err(CodecError::InvalidElementName(name.to_string()))
    }
}

/// Write a document in the journal schema
pub fn write_document<W: Write>(
    document: &Document,
    out: W,
    options: &WriteOptions,
) -> Result<W, CodecError> {
    let mut w = ElementWriter::new(out, options)?;

    w.start(ROOT_ELEMENT)?;
    for (spec, value) in document.journal().iter() {
        w.field(spec.key, value)?;
    }

    for date in document.publication_dates() {
        w.start("pubdate")?;
        for spec in PUBDATE_FIELDS {
            w.field(spec.key, date.get(spec.key).unwrap_or(""))?;
        }
        w.end("pubdate")?;
    }

    w.start("article")?;
    for (spec, value) in document.article().iter() {
        let value = match spec.kind {
            FieldKind::Multiline => value.trim(),
            FieldKind::Text => value,
        };
        w.field(spec.key, value)?;
    }
    w.end("article")?;

    w.start("author_list")?;
    for (_, author) in document.authors() {
        w.start("author")?;
        for field in AuthorField::ALL {
            w.field(field.key(), author.text(field))?;
        }
        w.end("author")?;
    }
    w.end("author_list")?;

    w.end(ROOT_ELEMENT)?;
    let out = w.finish()?;

    tracing::debug!(
        "Serialized document with {} publication date(s) and {} author(s)",
        document.publication_dates().len(),
        document.author_count()
    );
    Ok(out)
}

/// Serialize a document to a UTF-8 string
pub fn to_xml_string(document: &Document, options: &WriteOptions) -> Result<String, CodecError> {
    let bytes = write_document(document, Vec::new(), options)?;
    String::from_utf8(bytes).map_err(|e| CodecError::Xml(e.to_string()))
}
