//! Record Model: journal, article, publication dates and authors.

mod document;
pub mod presets;
pub mod schema;

pub use document::{
    format_flag, parse_flag, Author, AuthorId, CalendarType, Document, FieldSet, ModelError,
    PublicationDate, RecordSource, UNTITLED_STEM,
};
pub use presets::{builtin_presets, JournalPreset, PresetRegistry};
pub use schema::{AuthorField, FieldKind, FieldSpec};
