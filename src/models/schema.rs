//! Static field tables shared by the XML codec, the workbook loader and the CLI.
//!
//! Every key here is an XML element name. Export walks these tables in order and
//! import looks keys up in them, so the two directions cannot drift apart.

/// How a field's value is edited and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line text, written verbatim
    Text,
    /// Multi-line text, trimmed on export
    Multiline,
}

/// One entry of a schema table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// XML element name
    pub key: &'static str,
    /// Human-readable label for the presentation layer
    pub label: &'static str,
    /// Editing/serialization behaviour
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn text(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Text,
        }
    }

    const fn multiline(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Multiline,
        }
    }
}

/// Journal fields, in export order.
pub static JOURNAL_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("title", "Journal Title"),
    FieldSpec::text("title_fa", "Journal Title (FA)"),
    FieldSpec::text("short_title", "Short Title"),
    FieldSpec::text("subject", "Subject"),
    FieldSpec::text("web_url", "Web URL"),
    FieldSpec::text("journal_hbi_system_id", "Journal HBI System ID"),
    FieldSpec::text("journal_hbi_system_user", "Journal HBI System User"),
    FieldSpec::text("journal_id_issn", "Journal ISSN"),
    FieldSpec::text("journal_id_issn_online", "Journal ISSN Online"),
    FieldSpec::text("journal_id_pii", "Journal ID PII"),
    FieldSpec::text("journal_id_doi", "Journal DOI"),
    FieldSpec::text("journal_id_iranmedex", "Journal ID IranMedex"),
    FieldSpec::text("journal_id_magiran", "Journal ID Magiran"),
    FieldSpec::text("journal_id_sid", "Journal ID SID"),
    FieldSpec::text("journal_id_nlai", "Journal ID NLAI"),
    FieldSpec::text("journal_id_science", "Journal ID Science"),
    FieldSpec::text("language", "Language"),
    FieldSpec::text("volume", "Volume"),
    FieldSpec::text("number", "Number"),
];

/// Article fields, in export order. The two abstracts always come last.
pub static ARTICLE_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("article_title", "Article Title"),
    FieldSpec::text("article_title_fa", "Article Title (FA)"),
    FieldSpec::text("subject_fa", "Subject (FA)"),
    FieldSpec::text("subject", "Subject"),
    FieldSpec::text("content_type_fa", "Content Type (FA)"),
    FieldSpec::text("content_type", "Content Type"),
    FieldSpec::text("start_page", "Start Page"),
    FieldSpec::text("end_page", "End Page"),
    FieldSpec::text("web_url", "Web URL"),
    FieldSpec::text("keywords", "Keywords"),
    FieldSpec::text("keywords_fa", "Keywords (FA)"),
    FieldSpec::multiline("abstract", "Abstract"),
    FieldSpec::multiline("abstract_fa", "Abstract (FA)"),
];

/// Publication date fields, in export order.
pub static PUBDATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("type", "Type"),
    FieldSpec::text("year", "Year"),
    FieldSpec::text("month", "Month"),
    FieldSpec::text("day", "Day"),
];

/// Author fields, in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorField {
    FirstName,
    MiddleName,
    LastName,
    Suffix,
    FirstNameFa,
    MiddleNameFa,
    LastNameFa,
    SuffixFa,
    Email,
    Code,
    Orcid,
    CoreAuthor,
    Affiliation,
    AffiliationFa,
}

impl AuthorField {
    /// All author fields in export order
    pub const ALL: [AuthorField; 14] = [
        AuthorField::FirstName,
        AuthorField::MiddleName,
        AuthorField::LastName,
        AuthorField::Suffix,
        AuthorField::FirstNameFa,
        AuthorField::MiddleNameFa,
        AuthorField::LastNameFa,
        AuthorField::SuffixFa,
        AuthorField::Email,
        AuthorField::Code,
        AuthorField::Orcid,
        AuthorField::CoreAuthor,
        AuthorField::Affiliation,
        AuthorField::AffiliationFa,
    ];

    /// XML element name
    pub fn key(&self) -> &'static str {
        match self {
            AuthorField::FirstName => "first_name",
            AuthorField::MiddleName => "middle_name",
            AuthorField::LastName => "last_name",
            AuthorField::Suffix => "suffix",
            AuthorField::FirstNameFa => "first_name_fa",
            AuthorField::MiddleNameFa => "middle_name_fa",
            AuthorField::LastNameFa => "last_name_fa",
            AuthorField::SuffixFa => "suffix_fa",
            AuthorField::Email => "email",
            AuthorField::Code => "code",
            AuthorField::Orcid => "orcid",
            AuthorField::CoreAuthor => "coreauthor",
            AuthorField::Affiliation => "affiliation",
            AuthorField::AffiliationFa => "affiliation_fa",
        }
    }

    /// Label shown next to the field
    pub fn label(&self) -> &'static str {
        match self {
            AuthorField::FirstName => "First Name",
            AuthorField::MiddleName => "Middle Name",
            AuthorField::LastName => "Last Name",
            AuthorField::Suffix => "Suffix",
            AuthorField::FirstNameFa => "First Name (FA)",
            AuthorField::MiddleNameFa => "Middle Name (FA)",
            AuthorField::LastNameFa => "Last Name (FA)",
            AuthorField::SuffixFa => "Suffix (FA)",
            AuthorField::Email => "Email",
            AuthorField::Code => "Code",
            AuthorField::Orcid => "ORCID",
            AuthorField::CoreAuthor => "Core Author (Yes/No)",
            AuthorField::Affiliation => "Affiliation",
            AuthorField::AffiliationFa => "Affiliation (FA)",
        }
    }

    /// Look a field up by its XML element name
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }
}

impl std::fmt::Display for AuthorField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Find a field in a schema table by key
pub fn find_field(table: &'static [FieldSpec], key: &str) -> Option<(usize, &'static FieldSpec)> {
    table.iter().enumerate().find(|(_, spec)| spec.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_sizes() {
        assert_eq!(JOURNAL_FIELDS.len(), 19);
        assert_eq!(ARTICLE_FIELDS.len(), 13);
        assert_eq!(AuthorField::ALL.len(), 14);
        assert_eq!(PUBDATE_FIELDS.len(), 4);
    }

    #[test]
    fn test_keys_are_unique() {
        for table in [JOURNAL_FIELDS, ARTICLE_FIELDS, PUBDATE_FIELDS] {
            let keys: HashSet<_> = table.iter().map(|f| f.key).collect();
            assert_eq!(keys.len(), table.len());
        }
        let author_keys: HashSet<_> = AuthorField::ALL.iter().map(|f| f.key()).collect();
        assert_eq!(author_keys.len(), 14);
    }

    #[test]
    fn test_abstracts_are_last_and_multiline() {
        let n = ARTICLE_FIELDS.len();
        assert_eq!(ARTICLE_FIELDS[n - 2].key, "abstract");
        assert_eq!(ARTICLE_FIELDS[n - 1].key, "abstract_fa");
        assert!(ARTICLE_FIELDS[..n - 2]
            .iter()
            .all(|f| f.kind == FieldKind::Text));
        assert!(ARTICLE_FIELDS[n - 2..]
            .iter()
            .all(|f| f.kind == FieldKind::Multiline));
    }

    #[test]
    fn test_author_field_lookup() {
        assert_eq!(
            AuthorField::from_key("coreauthor"),
            Some(AuthorField::CoreAuthor)
        );
        assert_eq!(AuthorField::from_key("orcid"), Some(AuthorField::Orcid));
        assert_eq!(AuthorField::from_key("nickname"), None);
        assert_eq!(AuthorField::ALL[11], AuthorField::CoreAuthor);
    }

    #[test]
    fn test_find_field() {
        let (idx, spec) = find_field(JOURNAL_FIELDS, "journal_id_issn").unwrap();
        assert_eq!(idx, 7);
        assert_eq!(spec.label, "Journal ISSN");
        assert!(find_field(JOURNAL_FIELDS, "article_title").is_none());
    }
}
