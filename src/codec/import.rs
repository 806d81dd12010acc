//! XML → Document.

use super::tree::{self, Element};
use super::CodecError;
use crate::models::schema::{AuthorField, FieldKind, PUBDATE_FIELDS};
use crate::models::{Author, Document, FieldSet, PublicationDate, RecordSource};

/// Name of the root element of a journal document
pub const ROOT_ELEMENT: &str = "journal";

/// A parsed journal document, ready to be applied to a [`Document`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    root: Element,
}

/// Parse XML text into a [`ParsedDocument`] without touching any Document
pub fn parse_document(xml: &str) -> Result<ParsedDocument, CodecError> {
    let root = tree::parse(xml)?;
    if root.name != ROOT_ELEMENT {
        return Err(CodecError::UnexpectedRoot {
            expected: ROOT_ELEMENT,
            found: root.name,
        });
    }
    Ok(ParsedDocument { root })
}

/// Parse and apply in one step. On error the document is unchanged.
pub fn import_str(document: &mut Document, xml: &str) -> Result<(), CodecError> {
    let parsed = parse_document(xml)?;
    document.load_from(&parsed);
    Ok(())
}

impl RecordSource for ParsedDocument {
    fn apply_to(&self, document: &mut Document) {
        let root = &self.root;

        copy_fields(root, document.journal_mut());

        let dates: Vec<PublicationDate> = root
            .children_named("pubdate")
            .map(read_pubdate)
            .collect();
        document.replace_publication_dates(dates);

        match root.child("article") {
            Some(article) => copy_fields(article, document.article_mut()),
            None => tracing::debug!("No <article> element; article fields left as they were"),
        }

        let authors: Vec<Author> = root
            .child("author_list")
            .map(|list| list.children_named("author").map(read_author).collect())
            .unwrap_or_default();
        tracing::debug!("Imported {} author(s)", authors.len());
        document.replace_authors(authors);
    }
}

/// Copy every schema field that has a matching child element.
/// Absent elements leave the value alone.
fn copy_fields(parent: &Element, fields: &mut FieldSet) {
    for (idx, spec) in fields.schema().iter().enumerate() {
        let Some(element) = parent.child(spec.key) else {
            continue;
        };
        let value = match spec.kind {
            FieldKind::Multiline => element.text.trim(),
            FieldKind::Text => element.text.as_str(),
        };
        fields.set_at(idx, value);
    }
}

fn read_pubdate(element: &Element) -> PublicationDate {
    let mut date = PublicationDate::default();
    for spec in PUBDATE_FIELDS {
        if let Some(child) = element.child(spec.key) {
            let result = date.set(spec.key, &child.text);
            debug_assert!(result.is_ok(), "pubdate schema key {} rejected", spec.key);
        }
    }
    date
}

fn read_author(element: &Element) -> Author {
    let mut author = Author::new();
    for field in AuthorField::ALL {
        if let Some(child) = element.child(field.key()) {
            author.set_text(field, &child.text);
        }
    }
    author
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{to_xml_string, WriteOptions};
    use crate::models::CalendarType;

    const SAMPLE: &str = r#"<journal>
   <title>Test Journal</title>
   <volume>12</volume>
   <pubdate>
      <type>jalali</type>
      <year>1402</year>
      <month>7</month>
      <day/>
   </pubdate>
   <article>
      <article_title>On Teeth</article_title>
      <abstract>
         Indented abstract.
      </abstract>
   </article>
   <author_list>
      <author>
         <first_name>Ann</first_name>
         <coreauthor>Yes</coreauthor>
      </author>
      <author>
         <first_name>Bob</first_name>
         <coreauthor>No</coreauthor>
      </author>
   </author_list>
</journal>"#;

    #[test]
    fn test_import_sample() {
        let mut doc = Document::new();
        import_str(&mut doc, SAMPLE).unwrap();

        assert_eq!(doc.journal().get("title"), Some("Test Journal"));
        assert_eq!(doc.journal().get("volume"), Some("12"));
        assert_eq!(doc.article().get("article_title"), Some("On Teeth"));
        assert_eq!(doc.article().get("abstract"), Some("Indented abstract."));

        let dates = doc.publication_dates();
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].calendar, Some(CalendarType::Jalali));
        assert_eq!(dates[0].month, "7");
        assert_eq!(dates[0].day, "");

        let authors: Vec<_> = doc.authors().map(|(_, a)| a.clone()).collect();
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].first_name, "Ann");
        assert!(authors[0].core_author);
        assert_eq!(authors[1].first_name, "Bob");
        assert!(!authors[1].core_author);
    }

    #[test]
    fn test_absent_elements_leave_fields_untouched() {
        let mut doc = Document::new();
        doc.journal_mut().set("subject", "Dentistry").unwrap();
        doc.article_mut().set("keywords", "enamel").unwrap();

        import_str(&mut doc, SAMPLE).unwrap();

        assert_eq!(doc.journal().get("subject"), Some("Dentistry"));
        assert_eq!(doc.article().get("keywords"), Some("enamel"));
    }

    #[test]
    fn test_missing_article_keeps_article_fields() {
        let mut doc = Document::new();
        doc.article_mut().set("article_title", "Kept").unwrap();
        doc.article_mut().set("abstract", "Also kept").unwrap();

        import_str(&mut doc, "<journal><title>New</title></journal>").unwrap();

        assert_eq!(doc.journal().get("title"), Some("New"));
        assert_eq!(doc.article().get("article_title"), Some("Kept"));
        assert_eq!(doc.article().get("abstract"), Some("Also kept"));
    }

    #[test]
    fn test_present_but_blank_clears_field() {
        let mut doc = Document::new();
        doc.journal_mut().set("title", "Old").unwrap();
        import_str(&mut doc, "<journal><title/></journal>").unwrap();
        assert_eq!(doc.journal().get("title"), Some(""));
    }

    #[test]
    fn test_authors_rebuilt_from_scratch() {
        let mut doc = Document::new();
        doc.push_author(Author {
            first_name: "Old".into(),
            ..Author::default()
        });
        import_str(&mut doc, SAMPLE).unwrap();
        let names: Vec<_> = doc.authors().map(|(_, a)| a.first_name.clone()).collect();
        assert_eq!(names, vec!["Ann", "Bob"]);

        import_str(&mut doc, "<journal/>").unwrap();
        assert_eq!(doc.author_count(), 0);
    }

    #[test]
    fn test_malformed_leaves_document_unchanged() {
        let mut doc = Document::new();
        doc.journal_mut().set("title", "Keep me").unwrap();
        doc.add_author();
        let before = doc.clone();

        let err = import_str(&mut doc, "<journal><title>Broken</journal>").unwrap_err();
        assert!(matches!(err, CodecError::Malformed { .. }));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_wrong_root_rejected() {
        let mut doc = Document::new();
        let err = import_str(&mut doc, "<article><journal/></article>").unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedRoot { .. }));
    }

    #[test]
    fn test_unknown_elements_ignored() {
        let mut doc = Document::new();
        import_str(
            &mut doc,
            "<journal><publisher>X</publisher><title>T</title></journal>",
        )
        .unwrap();
        assert_eq!(doc.journal().get("title"), Some("T"));
    }

    #[test]
    fn test_round_trip() {
        let mut original = Document::new();
        original.journal_mut().set("title", "Test Journal").unwrap();
        original.journal_mut().set("title_fa", "مجله آزمایشی").unwrap();
        original.journal_mut().set("journal_id_issn", "1735-255X").unwrap();
        original
            .replace_publication_dates(vec![PublicationDate::new("gregorian", "2024", "3", "21")]);
        original.article_mut().set("start_page", "1").unwrap();
        original
            .article_mut()
            .set("abstract", "First line.\nSecond & last.")
            .unwrap();
        original.push_author(Author {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: "ann@example.org".into(),
            core_author: true,
            ..Author::default()
        });
        original.push_author(Author {
            first_name_fa: "رضا".into(),
            orcid: "0000-0002-1825-0097".into(),
            ..Author::default()
        });

        let xml = to_xml_string(&original, &WriteOptions::default()).unwrap();
        let mut imported = Document::new();
        import_str(&mut imported, &xml).unwrap();

        assert_eq!(imported, original);
    }
}
