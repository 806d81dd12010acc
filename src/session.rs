//! The editing session: one Document, the selected input file, output settings.

use crate::codec::{self, CodecError, WriteOptions};
use crate::models::{Document, UNTITLED_STEM};
use crate::workbook::{self, ReadOptions, Workbook, WorkbookError};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Shape of the XML written for a workbook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// The journal schema, same as the form path
    #[default]
    Form,
    /// Workbook rows written verbatim under `<article>`
    Sheet,
}

/// Errors surfaced to the user by session actions
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// An action needs an input file and none was selected
    #[error("No input file selected. Please select a file first")]
    NoInputSelected,

    /// Reading or writing a file failed
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The XML input could not be imported
    #[error("Failed to open {}: {source}", path.display())]
    Import {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// Reading the workbook failed
    #[error("Failed to generate XML: {0}")]
    Workbook(#[from] WorkbookError),

    /// Serialization failed
    #[error("Failed to generate XML: {0}")]
    Codec(#[from] CodecError),
}

/// Settings for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Options for documents written from the form path
    pub write: WriteOptions,
    /// Options for documents written from a workbook
    pub workbook_write: WriteOptions,
    pub read: ReadOptions,
    pub layout: Layout,
    /// File stem used when the article has no title
    pub fallback_stem: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            write: WriteOptions::default(),
            workbook_write: WriteOptions::default().with_declaration(),
            read: ReadOptions::default(),
            layout: Layout::Form,
            fallback_stem: UNTITLED_STEM.to_string(),
        }
    }
}

/// Where the rendered XML came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Form,
    Workbook,
}

/// Explicit context for import/export actions
#[derive(Debug)]
pub struct Session {
    document: Document,
    input: Option<PathBuf>,
    workbook: Option<Workbook>,
    origin: Origin,
    options: SessionOptions,
}

impl Session {
    /// Start a session with an empty document
    pub fn new(options: SessionOptions) -> Self {
        Self {
            document: Document::new(),
            input: None,
            workbook: None,
            origin: Origin::Form,
            options,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Currently selected input file
    pub fn input(&self) -> Option<&Path> {
        self.input.as_deref()
    }

    /// Reset to an empty document and forget the selected input
    pub fn new_document(&mut self) {
        self.document.clear_all();
        self.input = None;
        self.workbook = None;
        self.origin = Origin::Form;
    }

    /// Import an XML file. On any error the document is left as it was.
    pub fn open_xml(&mut self, path: &Path) -> Result<(), SessionError> {
        let xml = std::fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = codec::parse_document(&xml).map_err(|source| SessionError::Import {
            path: path.to_path_buf(),
            source,
        })?;
        self.document.load_from(&parsed);
        self.input = Some(path.to_path_buf());
        self.origin = Origin::Form;
        tracing::info!("Opened {}", path.display());
        Ok(())
    }

    /// Remember a workbook to generate from
    pub fn select_workbook(&mut self, path: &Path) {
        tracing::info!("Selected file: {}", path.display());
        self.input = Some(path.to_path_buf());
    }

    /// Read the selected workbook into a fresh document
    pub fn generate_from_workbook(&mut self) -> Result<&Document, SessionError> {
        let path = self.input.clone().ok_or(SessionError::NoInputSelected)?;
        let workbook = workbook::read_workbook(&path, &self.options.read)?;

        let mut document = Document::new();
        document.load_from(&workbook);
        self.document = document;
        self.workbook = Some(workbook);
        self.origin = Origin::Workbook;
        Ok(&self.document)
    }

    /// Serialize the current state with the options that fit its origin
    pub fn render(&self) -> Result<String, SessionError> {
        let bytes = match (self.origin, &self.workbook) {
            (Origin::Workbook, Some(workbook)) => match self.options.layout {
                Layout::Form => codec::write_document(
                    &self.document,
                    Vec::new(),
                    &self.options.workbook_write,
                )?,
                Layout::Sheet => workbook::write_sheet_layout(
                    workbook,
                    Vec::new(),
                    &self.options.workbook_write,
                )?,
            },
            _ => codec::write_document(&self.document, Vec::new(), &self.options.write)?,
        };
        String::from_utf8(bytes).map_err(|e| SessionError::Codec(CodecError::Xml(e.to_string())))
    }

    /// Output path offered when the user gives none, inside `dir`
    pub fn default_output_path(&self, dir: &Path) -> PathBuf {
        let name = match (self.origin, &self.input) {
            (Origin::Workbook, Some(input)) => input
                .file_stem()
                .map(|stem| format!("{}.xml", stem.to_string_lossy()))
                .unwrap_or_else(|| "output.xml".to_string()),
            _ => self.document.suggested_file_name(&self.options.fallback_stem),
        };
        dir.join(name)
    }

    /// Render and write to `path`, replacing it atomically
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let xml = self.render()?;
        write_atomic(path, xml.as_bytes())?;
        tracing::info!("XML file generated and saved to: {}", path.display());
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

/// Write through a temp file in the target directory, then rename over the target
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), SessionError> {
    let io_err = |source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(contents).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;
    file.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
