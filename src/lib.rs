//! # Journal XML
//!
//! Build and edit journal article metadata and exchange it as XML.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Record Model (journal, publication dates, article, authors) and presets
//! - [`codec`]: XML export and all-or-nothing import
//! - [`workbook`]: `.xlsx` reader for the three-sheet metadata workbook
//! - [`session`]: the document being edited, input selection and atomic saves
//! - [`config`]: Configuration management
//! - [`ui`]: terminal tables and status lines

pub mod codec;
pub mod config;
pub mod models;
pub mod session;
pub mod ui;
pub mod workbook;

// Re-export commonly used types
pub use codec::{CodecError, WriteOptions};
pub use models::{Author, Document, JournalPreset, PresetRegistry, PublicationDate};
pub use session::{Layout, Session, SessionError, SessionOptions};
pub use workbook::{ReadOptions, Workbook, WorkbookError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
