//! Terminal output: status lines and document tables.

use crate::models::schema::{AuthorField, FieldSpec};
use crate::models::{Document, FieldSet, PresetRegistry, PublicationDate};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use owo_colors::OwoColorize;

/// Longest value shown in a table cell before it is cut
const MAX_CELL_WIDTH: usize = 60;

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
    }
}

/// Print a styled status message.
#[macro_export]
macro_rules! print_status {
    ($status:expr, $msg:expr) => {{
        use owo_colors::OwoColorize;
        use $crate::ui::{status_icon, Status};
        let status: Status = $status;
        let icon = status_icon(status);
        match status {
            Status::Success => println!("{} {}", icon.green().bold(), $msg),
            Status::Error => eprintln!("{} {}", icon.red().bold(), $msg),
            Status::Warning => eprintln!("{} {}", icon.yellow().bold(), $msg),
            Status::Info => println!("{} {}", icon.cyan().bold(), $msg),
        }
    }};
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    let char_widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, unicode_width::UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    let total_width: usize = char_widths.iter().map(|(_, w)| *w).sum();
    if total_width <= max_width {
        return text.to_string();
    }

    let mut current_width = 0;
    let mut end_idx = 0;
    for (i, (_, w)) in char_widths.iter().enumerate() {
        if current_width + w > max_width - 3 {
            break;
        }
        current_width += w;
        end_idx = i + 1;
    }

    let truncated: String = char_widths[..end_idx].iter().map(|(c, _)| *c).collect();
    format!("{}...", truncated)
}

/// Multi-line values are shown on one line
fn cell_text(value: &str) -> String {
    let flat = value.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_with_ellipsis(&flat, MAX_CELL_WIDTH)
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Journal or article fields, one row each, in schema order
pub fn fields_table(fields: &FieldSet) -> Table {
    let mut table = new_table(vec!["Field", "Key", "Value"]);
    for (spec, value) in fields.iter() {
        table.add_row(vec![
            Cell::new(spec.label).add_attribute(Attribute::Bold),
            Cell::new(spec.key),
            Cell::new(cell_text(value)),
        ]);
    }
    table
}

pub fn dates_table(dates: &[PublicationDate]) -> Table {
    let mut table = new_table(vec!["#", "Type", "Year", "Month", "Day"]);
    for (i, date) in dates.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(date.calendar.as_ref().map(|c| c.as_str()).unwrap_or("")),
            Cell::new(&date.year),
            Cell::new(&date.month),
            Cell::new(&date.day),
        ]);
    }
    table
}

/// One row per author, showing the fields people scan for
pub fn authors_table(document: &Document) -> Table {
    let mut table = new_table(vec!["#", "Name", "Email", "ORCID", "Affiliation", "Core"]);
    for (position, (_, author)) in document.authors().enumerate() {
        table.add_row(vec![
            Cell::new(position + 1),
            Cell::new(cell_text(&author.display_name())).add_attribute(Attribute::Bold),
            Cell::new(&author.email),
            Cell::new(&author.orcid),
            Cell::new(cell_text(&author.affiliation)),
            Cell::new(author.text(AuthorField::CoreAuthor)),
        ]);
    }
    table
}

/// Schema listing for `fields`
pub fn schema_table(specs: &[FieldSpec]) -> Table {
    let mut table = new_table(vec!["Key", "Label", "Kind"]);
    for spec in specs {
        table.add_row(vec![
            Cell::new(spec.key).add_attribute(Attribute::Bold),
            Cell::new(spec.label),
            Cell::new(format!("{:?}", spec.kind).to_lowercase()),
        ]);
    }
    table
}

pub fn author_schema_table() -> Table {
    let mut table = new_table(vec!["Key", "Label"]);
    for field in AuthorField::ALL {
        table.add_row(vec![
            Cell::new(field.key()).add_attribute(Attribute::Bold),
            Cell::new(field.label()),
        ]);
    }
    table
}

pub fn presets_table(registry: &PresetRegistry) -> Table {
    let mut table = new_table(vec!["Name", "Title", "ISSN", "Language"]);
    for preset in registry.iter() {
        let field = |key: &str| preset.fields.get(key).map(String::as_str).unwrap_or("");
        table.add_row(vec![
            Cell::new(preset.name()).add_attribute(Attribute::Bold),
            Cell::new(field("title")),
            Cell::new(field("journal_id_issn")),
            Cell::new(field("language")),
        ]);
    }
    table
}

/// Print every section of a document
pub fn print_document(document: &Document) {
    print_section("Journal");
    println!("{}", fields_table(document.journal()));

    print_section("Publication Dates");
    if document.publication_dates().is_empty() {
        println!("{}", "(none)".dimmed());
    } else {
        println!("{}", dates_table(document.publication_dates()));
    }

    print_section("Article");
    println!("{}", fields_table(document.article()));

    print_section(&format!("Authors ({})", document.author_count()));
    if document.author_count() == 0 {
        println!("{}", "(none)".dimmed());
    } else {
        println!("{}", authors_table(document));
    }
}
