//! The Record Model: one journal issue, one article and its authors.

use super::presets::JournalPreset;
use super::schema::{find_field, AuthorField, FieldSpec, ARTICLE_FIELDS, JOURNAL_FIELDS};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// File stem used when the article has no title
pub const UNTITLED_STEM: &str = "Untitled_Article";

/// Errors raised by Record Model mutations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ModelError {
    /// The key is not part of the section's schema
    #[error("Unknown {section} field: {key}")]
    UnknownField { section: &'static str, key: String },
}

/// Ordered key/value collection backed by a static schema table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    section: &'static str,
    table: &'static [FieldSpec],
    values: Vec<String>,
}

impl FieldSet {
    /// Create an empty field set for a schema table
    pub fn new(section: &'static str, table: &'static [FieldSpec]) -> Self {
        Self {
            section,
            table,
            values: vec![String::new(); table.len()],
        }
    }

    /// Journal fields, all empty
    pub fn journal() -> Self {
        Self::new("journal", JOURNAL_FIELDS)
    }

    /// Article fields, all empty
    pub fn article() -> Self {
        Self::new("article", ARTICLE_FIELDS)
    }

    /// The schema table this set follows
    pub fn schema(&self) -> &'static [FieldSpec] {
        self.table
    }

    /// Get the current value for a key, `None` if the key is not in the schema
    pub fn get(&self, key: &str) -> Option<&str> {
        find_field(self.table, key).map(|(idx, _)| self.values[idx].as_str())
    }

    /// Set a value by key
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), ModelError> {
        match find_field(self.table, key) {
            Some((idx, _)) => {
                self.values[idx] = value.into();
                Ok(())
            }
            None => Err(ModelError::UnknownField {
                section: self.section,
                key: key.to_string(),
            }),
        }
    }

    /// Set a value by its position in [`schema`](Self::schema).
    ///
    /// # Panics
    ///
    /// If `index` is outside the schema table.
    pub fn set_at(&mut self, index: usize, value: impl Into<String>) {
        self.values[index] = value.into();
    }

    /// Iterate over `(spec, value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&'static FieldSpec, &str)> + '_ {
        self.table
            .iter()
            .zip(self.values.iter().map(String::as_str))
    }

    /// Reset every value to empty
    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(String::clear);
    }

    /// True if every value is empty
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|v| v.is_empty())
    }
}

impl Serialize for FieldSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.table.len()))?;
        for (spec, value) in self.iter() {
            map.serialize_entry(spec.key, value)?;
        }
        map.end()
    }
}

/// Calendar a publication date is expressed in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarType {
    Jalali,
    Gregorian,
    #[serde(untagged)]
    Other(String),
}

impl CalendarType {
    /// Parse the text of a `<type>` element. Empty text means no calendar.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "" => None,
            "jalali" => Some(CalendarType::Jalali),
            "gregorian" => Some(CalendarType::Gregorian),
            other => Some(CalendarType::Other(other.to_string())),
        }
    }

    /// Text written to the `<type>` element
    pub fn as_str(&self) -> &str {
        match self {
            CalendarType::Jalali => "jalali",
            CalendarType::Gregorian => "gregorian",
            CalendarType::Other(s) => s,
        }
    }
}

impl std::fmt::Display for CalendarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One `<pubdate>` entry. Values are free text; nothing is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationDate {
    #[serde(rename = "type")]
    pub calendar: Option<CalendarType>,
    pub year: String,
    pub month: String,
    pub day: String,
}

impl PublicationDate {
    /// Build a date from its four text parts
    pub fn new(
        calendar: &str,
        year: impl Into<String>,
        month: impl Into<String>,
        day: impl Into<String>,
    ) -> Self {
        Self {
            calendar: CalendarType::parse(calendar),
            year: year.into(),
            month: month.into(),
            day: day.into(),
        }
    }

    /// Text value for a `PUBDATE_FIELDS` key
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "type" => Some(self.calendar.as_ref().map(|c| c.as_str()).unwrap_or("")),
            "year" => Some(&self.year),
            "month" => Some(&self.month),
            "day" => Some(&self.day),
            _ => None,
        }
    }

    /// Set a value by `PUBDATE_FIELDS` key
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ModelError> {
        match key {
            "type" => self.calendar = CalendarType::parse(value),
            "year" => self.year = value.to_string(),
            "month" => self.month = value.to_string(),
            "day" => self.day = value.to_string(),
            _ => {
                return Err(ModelError::UnknownField {
                    section: "pubdate",
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }
}

/// Parse the textual form of the core-author flag.
///
/// Accepts yes/no, true/false, y/n and 1/0 in any case. Anything else is false.
pub fn parse_flag(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "yes" | "y" | "true" | "1"
    )
}

/// Render the core-author flag. Only ever `Yes` or `No`.
pub fn format_flag(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// One author of the article
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub suffix: String,
    pub first_name_fa: String,
    pub middle_name_fa: String,
    pub last_name_fa: String,
    pub suffix_fa: String,
    pub email: String,
    pub code: String,
    pub orcid: String,
    #[serde(rename = "coreauthor")]
    pub core_author: bool,
    pub affiliation: String,
    pub affiliation_fa: String,
}

impl Author {
    /// Create an empty author
    pub fn new() -> Self {
        Self::default()
    }

    /// Textual value of a field, with the core-author flag rendered as `Yes`/`No`
    pub fn text(&self, field: AuthorField) -> &str {
        match field {
            AuthorField::CoreAuthor => format_flag(self.core_author),
            other => self.slot(other).map(String::as_str).unwrap_or(""),
        }
    }

    /// Set a field from text. The core-author flag is parsed with [`parse_flag`].
    pub fn set_text(&mut self, field: AuthorField, value: &str) {
        match field {
            AuthorField::CoreAuthor => self.core_author = parse_flag(value),
            other => {
                if let Some(slot) = self.slot_mut(other) {
                    *slot = value.to_string();
                }
            }
        }
    }

    /// Display name, Latin script first, falling back to the Persian parts
    pub fn display_name(&self) -> String {
        let latin = join_names(&[&self.first_name, &self.middle_name, &self.last_name]);
        if !latin.is_empty() {
            return latin;
        }
        join_names(&[
            &self.first_name_fa,
            &self.middle_name_fa,
            &self.last_name_fa,
        ])
    }

    fn slot(&self, field: AuthorField) -> Option<&String> {
        Some(match field {
            AuthorField::FirstName => &self.first_name,
            AuthorField::MiddleName => &self.middle_name,
            AuthorField::LastName => &self.last_name,
            AuthorField::Suffix => &self.suffix,
            AuthorField::FirstNameFa => &self.first_name_fa,
            AuthorField::MiddleNameFa => &self.middle_name_fa,
            AuthorField::LastNameFa => &self.last_name_fa,
            AuthorField::SuffixFa => &self.suffix_fa,
            AuthorField::Email => &self.email,
            AuthorField::Code => &self.code,
            AuthorField::Orcid => &self.orcid,
            AuthorField::Affiliation => &self.affiliation,
            AuthorField::AffiliationFa => &self.affiliation_fa,
            AuthorField::CoreAuthor => return None,
        })
    }

    fn slot_mut(&mut self, field: AuthorField) -> Option<&mut String> {
        Some(match field {
            AuthorField::FirstName => &mut self.first_name,
            AuthorField::MiddleName => &mut self.middle_name,
            AuthorField::LastName => &mut self.last_name,
            AuthorField::Suffix => &mut self.suffix,
            AuthorField::FirstNameFa => &mut self.first_name_fa,
            AuthorField::MiddleNameFa => &mut self.middle_name_fa,
            AuthorField::LastNameFa => &mut self.last_name_fa,
            AuthorField::SuffixFa => &mut self.suffix_fa,
            AuthorField::Email => &mut self.email,
            AuthorField::Code => &mut self.code,
            AuthorField::Orcid => &mut self.orcid,
            AuthorField::Affiliation => &mut self.affiliation,
            AuthorField::AffiliationFa => &mut self.affiliation_fa,
            AuthorField::CoreAuthor => return None,
        })
    }
}

fn join_names(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stable identity of an author within one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AuthorId(u64);

impl std::fmt::Display for AuthorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something a [`Document`] can be populated from (a parsed XML tree, workbook rows).
pub trait RecordSource {
    /// Copy this source's values into the document
    fn apply_to(&self, document: &mut Document);
}

/// The root aggregate: journal, publication dates, article and authors.
///
/// Authors are keyed by monotonically increasing ids, so map order is
/// insertion order and removal by id leaves the others in place.
#[derive(Debug, Clone)]
pub struct Document {
    journal: FieldSet,
    pub_dates: Vec<PublicationDate>,
    article: FieldSet,
    authors: BTreeMap<AuthorId, Author>,
    next_author_id: u64,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            journal: FieldSet::journal(),
            pub_dates: Vec::new(),
            article: FieldSet::article(),
            authors: BTreeMap::new(),
            next_author_id: 0,
        }
    }

    pub fn journal(&self) -> &FieldSet {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut FieldSet {
        &mut self.journal
    }

    pub fn article(&self) -> &FieldSet {
        &self.article
    }

    pub fn article_mut(&mut self) -> &mut FieldSet {
        &mut self.article
    }

    pub fn publication_dates(&self) -> &[PublicationDate] {
        &self.pub_dates
    }

    /// Append an empty publication date and return it for editing
    pub fn add_publication_date(&mut self) -> &mut PublicationDate {
        self.pub_dates.push(PublicationDate::default());
        let last = self.pub_dates.len() - 1;
        &mut self.pub_dates[last]
    }

    /// Replace every publication date
    pub fn replace_publication_dates(&mut self, dates: Vec<PublicationDate>) {
        self.pub_dates = dates;
    }

    /// Append an empty author and return its id
    pub fn add_author(&mut self) -> AuthorId {
        self.push_author(Author::new())
    }

    /// Append a filled-in author and return its id
    pub fn push_author(&mut self, author: Author) -> AuthorId {
        let id = AuthorId(self.next_author_id);
        self.next_author_id += 1;
        self.authors.insert(id, author);
        id
    }

    /// Remove an author by id. Returns false if no such author exists.
    pub fn remove_author(&mut self, id: AuthorId) -> bool {
        self.authors.remove(&id).is_some()
    }

    pub fn author(&self, id: AuthorId) -> Option<&Author> {
        self.authors.get(&id)
    }

    pub fn author_mut(&mut self, id: AuthorId) -> Option<&mut Author> {
        self.authors.get_mut(&id)
    }

    /// Authors in insertion order
    pub fn authors(&self) -> impl Iterator<Item = (AuthorId, &Author)> + '_ {
        self.authors.iter().map(|(id, author)| (*id, author))
    }

    /// Id of the author at a zero-based position
    pub fn author_id_at(&self, position: usize) -> Option<AuthorId> {
        self.authors.keys().nth(position).copied()
    }

    pub fn author_count(&self) -> usize {
        self.authors.len()
    }

    /// Drop every author and insert the given ones, in order
    pub fn replace_authors(&mut self, authors: impl IntoIterator<Item = Author>) {
        self.authors.clear();
        for author in authors {
            self.push_author(author);
        }
    }

    /// Reset everything to empty
    pub fn clear_all(&mut self) {
        self.clear_journal();
        self.pub_dates.clear();
        self.clear_article();
        self.clear_authors();
    }

    /// Reset the journal fields. Publication dates are kept.
    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Reset the article fields, abstracts included
    pub fn clear_article(&mut self) {
        self.article.clear();
    }

    /// Remove every author
    pub fn clear_authors(&mut self) {
        self.authors.clear();
    }

    /// Populate from a parsed XML tree or workbook rows
    pub fn load_from<S: RecordSource + ?Sized>(&mut self, source: &S) {
        source.apply_to(self);
    }

    /// Overwrite every journal field from a preset. Fields the preset omits become empty.
    pub fn apply_preset(&mut self, preset: &JournalPreset) {
        self.journal.clear();
        for (key, value) in preset.fields() {
            if let Err(e) = self.journal.set(key, value.as_str()) {
                tracing::warn!("Preset {}: {}", preset.name(), e);
            }
        }
    }

    /// File name offered when saving: the article title, or `fallback_stem`
    pub fn suggested_file_name(&self, fallback_stem: &str) -> String {
        let title = self.article.get("article_title").unwrap_or("").trim();
        let stem = if title.is_empty() { fallback_stem } else { title };
        let stem: String = stem
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        format!("{}.xml", stem)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.journal == other.journal
            && self.pub_dates == other.pub_dates
            && self.article == other.article
            && self.authors.len() == other.authors.len()
            && self
                .authors
                .values()
                .zip(other.authors.values())
                .all(|(a, b)| a == b)
    }
}

impl Eq for Document {}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let authors: Vec<&Author> = self.authors.values().collect();
        let mut state = serializer.serialize_struct("Document", 4)?;
        state.serialize_field("journal", &self.journal)?;
        state.serialize_field("pubdates", &self.pub_dates)?;
        state.serialize_field("article", &self.article)?;
        state.serialize_field("authors", &authors)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_is_blank() {
        let doc = Document::new();
        assert!(doc.journal().is_blank());
        assert!(doc.article().is_blank());
        assert!(doc.publication_dates().is_empty());
        assert_eq!(doc.author_count(), 0);
    }

    #[test]
    fn test_field_set_get_set() {
        let mut doc = Document::new();
        doc.journal_mut().set("title", "Test Journal").unwrap();
        assert_eq!(doc.journal().get("title"), Some("Test Journal"));
        assert_eq!(doc.journal().get("volume"), Some(""));
        assert_eq!(doc.journal().get("abstract"), None);

        let err = doc.article_mut().set("volume", "3").unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownField {
                section: "article",
                key: "volume".to_string()
            }
        );
        assert_eq!(err.to_string(), "Unknown article field: volume");
    }

    #[test]
    fn test_field_set_iter_follows_schema() {
        let set = FieldSet::journal();
        let keys: Vec<_> = set.iter().map(|(spec, _)| spec.key).collect();
        let expected: Vec<_> = JOURNAL_FIELDS.iter().map(|f| f.key).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_field_set_set_at_uses_schema_position() {
        let mut set = FieldSet::article();
        let (idx, _) = find_field(ARTICLE_FIELDS, "start_page").unwrap();
        set.set_at(idx, "7");
        assert_eq!(set.get("start_page"), Some("7"));
        assert_eq!(set.iter().filter(|(_, v)| !v.is_empty()).count(), 1);
    }

    #[test]
    fn test_add_and_remove_authors_keeps_order() {
        let mut doc = Document::new();
        let a = doc.add_author();
        let b = doc.add_author();
        let c = doc.add_author();
        doc.author_mut(a).unwrap().first_name = "Ann".into();
        doc.author_mut(b).unwrap().first_name = "Bob".into();
        doc.author_mut(c).unwrap().first_name = "Cyd".into();

        assert!(doc.remove_author(b));
        assert!(!doc.remove_author(b));

        let names: Vec<_> = doc.authors().map(|(_, a)| a.first_name.clone()).collect();
        assert_eq!(names, vec!["Ann", "Cyd"]);

        let d = doc.add_author();
        assert_eq!(doc.author_id_at(2), Some(d));
        assert_ne!(d, b);
    }

    #[test]
    fn test_add_publication_date_is_empty() {
        let mut doc = Document::new();
        let date = doc.add_publication_date();
        assert_eq!(*date, PublicationDate::default());
        date.year = "1402".into();
        assert_eq!(doc.publication_dates()[0].year, "1402");
    }

    #[test]
    fn test_clear_operations_are_independent() {
        let mut doc = Document::new();
        doc.journal_mut().set("title", "J").unwrap();
        doc.article_mut().set("article_title", "A").unwrap();
        doc.add_publication_date().year = "2024".into();
        doc.add_author();

        doc.clear_article();
        assert!(doc.article().is_blank());
        assert_eq!(doc.journal().get("title"), Some("J"));
        assert_eq!(doc.author_count(), 1);

        doc.clear_authors();
        assert_eq!(doc.author_count(), 0);
        assert_eq!(doc.journal().get("title"), Some("J"));

        doc.clear_journal();
        assert!(doc.journal().is_blank());
        assert_eq!(doc.publication_dates().len(), 1);

        doc.clear_all();
        assert_eq!(doc, Document::new());
    }

    #[test]
    fn test_core_author_text_is_yes_or_no() {
        let mut author = Author::new();
        assert_eq!(author.text(AuthorField::CoreAuthor), "No");
        author.set_text(AuthorField::CoreAuthor, "TRUE");
        assert!(author.core_author);
        assert_eq!(author.text(AuthorField::CoreAuthor), "Yes");
        author.set_text(AuthorField::CoreAuthor, "maybe");
        assert!(!author.core_author);
    }

    #[test]
    fn test_parse_flag_variants() {
        for yes in ["Yes", "yes", " Y ", "true", "1"] {
            assert!(parse_flag(yes), "{yes}");
        }
        for no in ["No", "", "0", "false", "si"] {
            assert!(!parse_flag(no), "{no}");
        }
    }

    #[test]
    fn test_author_text_round_trip() {
        let mut author = Author::new();
        for field in AuthorField::ALL {
            if field != AuthorField::CoreAuthor {
                author.set_text(field, field.key());
            }
        }
        for field in AuthorField::ALL {
            if field != AuthorField::CoreAuthor {
                assert_eq!(author.text(field), field.key());
            }
        }
    }

    #[test]
    fn test_display_name_fallback() {
        let mut author = Author::new();
        author.first_name_fa = "علی".into();
        author.last_name_fa = "رضایی".into();
        assert_eq!(author.display_name(), "علی رضایی");
        author.first_name = "Ali".into();
        author.last_name = "Rezaei".into();
        assert_eq!(author.display_name(), "Ali Rezaei");
    }

    #[test]
    fn test_calendar_type_parse() {
        assert_eq!(CalendarType::parse(""), None);
        assert_eq!(CalendarType::parse("jalali"), Some(CalendarType::Jalali));
        assert_eq!(
            CalendarType::parse("hijri"),
            Some(CalendarType::Other("hijri".into()))
        );
        let date = PublicationDate::new("gregorian", "2024", "5", "1");
        assert_eq!(date.get("type"), Some("gregorian"));
        assert_eq!(date.get("day"), Some("1"));
        assert_eq!(date.get("hour"), None);
    }

    #[test]
    fn test_suggested_file_name() {
        let mut doc = Document::new();
        assert_eq!(
            doc.suggested_file_name(UNTITLED_STEM),
            "Untitled_Article.xml"
        );
        doc.article_mut()
            .set("article_title", "Caries: a review/update")
            .unwrap();
        assert_eq!(
            doc.suggested_file_name(UNTITLED_STEM),
            "Caries_ a review_update.xml"
        );
    }

    #[test]
    fn test_equality_ignores_author_ids() {
        let mut a = Document::new();
        let mut b = Document::new();
        let first = a.add_author();
        a.remove_author(first);
        a.push_author(Author {
            first_name: "Ann".into(),
            ..Author::default()
        });
        b.push_author(Author {
            first_name: "Ann".into(),
            ..Author::default()
        });
        assert_eq!(a, b);
    }

    #[test]
    fn test_json_shape() {
        let mut doc = Document::new();
        doc.journal_mut().set("title", "T").unwrap();
        doc.push_author(Author {
            first_name: "Ann".into(),
            core_author: true,
            ..Author::default()
        });
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["journal"]["title"], "T");
        assert_eq!(value["authors"][0]["first_name"], "Ann");
        assert_eq!(value["authors"][0]["coreauthor"], true);
        assert!(value["pubdates"].as_array().unwrap().is_empty());
    }
}
