//! Reading journal metadata from an `.xlsx` workbook.
//!
//! The workbook has three sheets. In each, the first row is a header, column 0
//! holds field keys, and the columns to its right hold values: one value column
//! for `Journal` and `Article`, one column per author for `Author(s)`.
//!
//! ```text
//! Journal            Author(s)
//! | field | value |  | field      | 1   | 2   |
//! | title | JIDS  |  | first_name | Ann | Bob |
//! ```

mod package;
mod sheet;

pub use package::SheetEntry;
pub use sheet::{format_number, parse_cell_ref, Grid};

use crate::codec::{CodecError, ElementWriter, WriteOptions};
use crate::models::schema::{find_field, AuthorField, ARTICLE_FIELDS, JOURNAL_FIELDS};
use crate::models::{Author, Document, RecordSource};
use package::Package;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

/// Ordered `(key, value)` pairs read from one column of a sheet
pub type Fields = Vec<(String, String)>;

/// Errors produced while reading a workbook
#[derive(Debug, thiserror::Error)]
pub enum WorkbookError {
    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a readable zip package
    #[error("Not a valid xlsx package: {0}")]
    Package(String),

    /// A required package part is missing
    #[error("Missing workbook part: {0}")]
    MissingPart(String),

    /// A required sheet is missing
    #[error("Worksheet not found: {0}")]
    MissingSheet(String),

    /// A package part could not be parsed
    #[error("Malformed {part}: {message}")]
    Malformed { part: String, message: String },
}

impl From<zip::result::ZipError> for WorkbookError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => WorkbookError::Io(e),
            other => WorkbookError::Package(other.to_string()),
        }
    }
}

/// Names of the three sheets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    pub journal: String,
    pub article: String,
    pub authors: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            journal: "Journal".to_string(),
            article: "Article".to_string(),
            authors: "Author(s)".to_string(),
        }
    }
}

/// How a workbook is read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    pub sheets: SheetNames,

    /// Skip the first row of every sheet
    pub header_row: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            sheets: SheetNames::default(),
            header_row: true,
        }
    }
}

/// The three sheets as key/value records, in sheet order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    pub journal: Fields,
    pub article: Fields,
    pub authors: Vec<Fields>,
}

impl Workbook {
    /// Build records from the three sheet grids
    pub fn from_grids(journal: &Grid, article: &Grid, authors: &Grid, header_row: bool) -> Self {
        Self {
            journal: column_fields(journal, 1, header_row),
            article: column_fields(article, 1, header_row),
            authors: (1..authors.width().max(1))
                .map(|col| column_fields(authors, col, header_row))
                .collect(),
        }
    }
}

/// Read a workbook from disk
pub fn read_workbook(path: &Path, options: &ReadOptions) -> Result<Workbook, WorkbookError> {
    let file = File::open(path)?;
    let workbook = read_workbook_from(BufReader::new(file), options)?;
    tracing::info!(
        "Read workbook {}: {} journal field(s), {} article field(s), {} author(s)",
        path.display(),
        workbook.journal.len(),
        workbook.article.len(),
        workbook.authors.len()
    );
    Ok(workbook)
}

/// Read a workbook from any seekable source
pub fn read_workbook_from<R: Read + Seek>(
    reader: R,
    options: &ReadOptions,
) -> Result<Workbook, WorkbookError> {
    let mut package = Package::open(reader)?;
    let sheets = package.sheets()?;
    let shared = package.shared_strings()?;

    let mut load = |name: &str| -> Result<Grid, WorkbookError> {
        let entry = sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| WorkbookError::MissingSheet(name.to_string()))?;
        let xml = package
            .read_part(&entry.part)?
            .ok_or_else(|| WorkbookError::MissingPart(entry.part.clone()))?;
        sheet::parse_sheet(&xml, &shared, &entry.part)
    };

    let journal = load(&options.sheets.journal)?;
    let article = load(&options.sheets.article)?;
    let authors = load(&options.sheets.authors)?;

    Ok(Workbook::from_grids(
        &journal,
        &article,
        &authors,
        options.header_row,
    ))
}

/// Key/value pairs from column 0 and the given value column. Rows with a blank key are skipped.
fn column_fields(grid: &Grid, value_col: usize, header_row: bool) -> Fields {
    let skip = usize::from(header_row);
    grid.rows()
        .iter()
        .enumerate()
        .skip(skip)
        .filter_map(|(idx, row)| {
            let key = row.first().map(|k| k.trim()).unwrap_or("");
            if key.is_empty() {
                if row.iter().any(|c| !c.is_empty()) {
                    tracing::warn!("Skipping row {} with no field name", idx + 1);
                }
                return None;
            }
            Some((key.to_string(), grid.cell(idx, value_col).to_string()))
        })
        .collect()
}

impl RecordSource for Workbook {
    fn apply_to(&self, document: &mut Document) {
        for (key, value) in &self.journal {
            if let Some((idx, _)) = find_field(JOURNAL_FIELDS, key) {
                document.journal_mut().set_at(idx, value.as_str());
            } else {
                tracing::debug!("Ignoring unknown journal field {:?}", key);
            }
        }

        for (key, value) in &self.article {
            if let Some((idx, _)) = find_field(ARTICLE_FIELDS, key) {
                document.article_mut().set_at(idx, value.as_str());
            } else {
                tracing::debug!("Ignoring unknown article field {:?}", key);
            }
        }

        let authors = self.authors.iter().map(|fields| {
            let mut author = Author::new();
            for (key, value) in fields {
                match AuthorField::from_key(key) {
                    Some(field) => author.set_text(field, value),
                    None => tracing::debug!("Ignoring unknown author field {:?}", key),
                }
            }
            author
        });
        document.replace_authors(authors);
    }
}

/// Write workbook rows verbatim in the spreadsheet tool's layout:
/// `<article>` with `<journal>`, `<article_info>` and `<author_list>`.
pub fn write_sheet_layout<W: Write>(
    workbook: &Workbook,
    out: W,
    options: &WriteOptions,
) -> Result<W, CodecError> {
    let mut w = ElementWriter::new(out, options)?;
    w.start("article")?;

    w.start("journal")?;
    for (key, value) in &workbook.journal {
        w.field(key, value)?;
    }
    w.end("journal")?;

    w.start("article_info")?;
    for (key, value) in &workbook.article {
        w.field(key, value)?;
    }
    w.end("article_info")?;

    w.start("author_list")?;
    for fields in &workbook.authors {
        w.start("author")?;
        for (key, value) in fields {
            w.field(key, value)?;
        }
        w.end("author")?;
    }
    w.end("author_list")?;

    w.end("article")?;
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tree;

    fn grid(rows: &[&[&str]]) -> Grid {
        Grid::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn sample() -> Workbook {
        let journal = grid(&[
            &["Field", "Value"],
            &["title", "Test Journal"],
            &["volume", "20"],
            &["publisher", "Someone"],
            &["number"],
        ]);
        let article = grid(&[&["Field", "Value"], &["article_title", "On Teeth"]]);
        let authors = grid(&[
            &["Field", "Author 1", "Author 2"],
            &["first_name", "Ann", "Bob"],
            &["coreauthor", "Yes", "No"],
            &["email", "", "bob@example.org"],
        ]);
        Workbook::from_grids(&journal, &article, &authors, true)
    }

    #[test]
    fn test_from_grids() {
        let wb = sample();
        assert_eq!(
            wb.journal,
            vec![
                ("title".to_string(), "Test Journal".to_string()),
                ("volume".to_string(), "20".to_string()),
                ("publisher".to_string(), "Someone".to_string()),
                ("number".to_string(), String::new()),
            ]
        );
        assert_eq!(wb.authors.len(), 2);
        assert_eq!(wb.authors[0][2], ("email".to_string(), String::new()));
        assert_eq!(wb.authors[1][0], ("first_name".to_string(), "Bob".to_string()));
    }

    #[test]
    fn test_without_header_row() {
        let journal = grid(&[&["title", "T"]]);
        let wb = Workbook::from_grids(&journal, &Grid::default(), &Grid::default(), false);
        assert_eq!(wb.journal, vec![("title".to_string(), "T".to_string())]);
        assert!(wb.authors.is_empty());
    }

    #[test]
    fn test_blank_keys_skipped() {
        let journal = grid(&[&["Field", "Value"], &["", "orphan"], &["  title ", "T"]]);
        let fields = column_fields(&journal, 1, true);
        assert_eq!(fields, vec![("title".to_string(), "T".to_string())]);
    }

    #[test]
    fn test_apply_to_document() {
        let mut doc = Document::new();
        doc.load_from(&sample());

        assert_eq!(doc.journal().get("title"), Some("Test Journal"));
        assert_eq!(doc.journal().get("volume"), Some("20"));
        assert_eq!(doc.journal().get("number"), Some(""));
        assert_eq!(doc.article().get("article_title"), Some("On Teeth"));

        let authors: Vec<_> = doc.authors().map(|(_, a)| a.clone()).collect();
        assert_eq!(authors.len(), 2);
        assert!(authors[0].core_author);
        assert_eq!(authors[0].email, "");
        assert_eq!(authors[1].email, "bob@example.org");
        assert!(!authors[1].core_author);
    }

    #[test]
    fn test_sheet_layout() {
        let options = WriteOptions::default().with_declaration();
        let bytes = write_sheet_layout(&sample(), Vec::new(), &options).unwrap();
        let xml = String::from_utf8(bytes).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));

        let root = tree::parse(&xml).unwrap();
        assert_eq!(root.name, "article");
        let journal = root.child("journal").unwrap();
        assert_eq!(journal.child("publisher").unwrap().text, "Someone");
        assert_eq!(journal.child("number").unwrap().text, "");
        let article = root.child("article_info").unwrap();
        assert!(article.child("article_title").is_some());
        let authors = root.child("author_list").unwrap();
        assert_eq!(authors.children_named("author").count(), 2);
    }

    #[test]
    fn test_sheet_layout_rejects_bad_keys() {
        let wb = Workbook {
            journal: vec![("journal title".to_string(), "x".to_string())],
            ..Workbook::default()
        };
        let err = write_sheet_layout(&wb, Vec::new(), &WriteOptions::default()).unwrap_err();
        assert!(matches!(err, CodecError::InvalidElementName(_)));
    }

    #[test]
    fn test_sheet_layout_non_ascii_keys() {
        let wb = Workbook {
            journal: vec![
                ("عنوان".to_string(), "مجله".to_string()),
                ("ناشر".to_string(), String::new()),
            ],
            authors: vec![vec![("نام".to_string(), "علی".to_string())]],
            ..Workbook::default()
        };
        let bytes = write_sheet_layout(&wb, Vec::new(), &WriteOptions::default()).unwrap();
        let root = tree::parse(&String::from_utf8(bytes).unwrap()).unwrap();

        let journal = root.child("journal").unwrap();
        assert_eq!(journal.child("عنوان").unwrap().text, "مجله");
        assert_eq!(journal.child("ناشر").unwrap().text, "");
        let author = root.child("author_list").unwrap().child("author").unwrap();
        assert_eq!(author.child("نام").unwrap().text, "علی");
    }
}
