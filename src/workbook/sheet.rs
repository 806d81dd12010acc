//! Worksheet XML → grid of display strings.

use super::WorkbookError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// Excel's own limits; cell references beyond them are rejected
const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// Rows of cell text. Missing cells read as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Cell text, empty if the cell is absent
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Number of columns in the widest row
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn set(&mut self, row: usize, col: usize, value: String) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize_with(col + 1, String::new);
        }
        cells[col] = value;
    }
}

/// Parse an A1-style reference into zero-based `(row, column)`
pub fn parse_cell_ref(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let col = letters
        .chars()
        .try_fold(0usize, |acc, c| {
            let n = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
            acc.checked_mul(26)?.checked_add(n)
        })?
        .checked_sub(1)?;
    let row = digits.parse::<usize>().ok()?.checked_sub(1)?;
    Some((row, col))
}

/// Render a numeric cell the way a person typed it: `20`, not `20.0`
pub fn format_number(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", n as i64),
        _ => raw.to_string(),
    }
}

#[derive(Default)]
struct PendingCell {
    row: usize,
    col: usize,
    kind: Option<String>,
    value: String,
    inline: String,
}

/// Parse `xl/worksheets/sheetN.xml` against the shared string table
pub fn parse_sheet(xml: &str, shared: &[String], part: &str) -> Result<Grid, WorkbookError> {
    let mut reader = Reader::from_str(xml);
    let mut grid = Grid::default();

    let mut next_row = 0usize;
    let mut next_col = 0usize;
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_inline_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"row" => start_row(e, &mut next_row, &mut next_col, part)?,
                b"c" => cell = Some(start_cell(e, next_row, &mut next_col, part)?),
                b"v" => in_value = true,
                b"t" => in_inline_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"row" => {
                    start_row(e, &mut next_row, &mut next_col, part)?;
                    next_row += 1;
                }
                b"c" => {
                    let pending = start_cell(e, next_row, &mut next_col, part)?;
                    grid.set(pending.row, pending.col, String::new());
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(ref mut pending) = cell {
                    if in_value || in_inline_text {
                        let text = e
                            .unescape()
                            .map_err(|err| malformed(part, err.to_string()))?;
                        if in_value {
                            pending.value.push_str(&text);
                        } else {
                            pending.inline.push_str(&text);
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"row" => next_row += 1,
                b"v" => in_value = false,
                b"t" => in_inline_text = false,
                b"c" => {
                    if let Some(pending) = cell.take() {
                        let text = cell_text(&pending, shared, part)?;
                        grid.set(pending.row, pending.col, text);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(malformed(part, e.to_string())),
        }
    }

    Ok(grid)
}

fn start_row(
    e: &BytesStart<'_>,
    next_row: &mut usize,
    next_col: &mut usize,
    part: &str,
) -> Result<(), WorkbookError> {
    if let Some(r) = attr(e, b"r", part)? {
        let index = r
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .filter(|n| *n < MAX_ROWS)
            .ok_or_else(|| malformed(part, format!("bad row number {}", r)))?;
        *next_row = index;
    }
    *next_col = 0;
    Ok(())
}

fn start_cell(
    e: &BytesStart<'_>,
    row: usize,
    next_col: &mut usize,
    part: &str,
) -> Result<PendingCell, WorkbookError> {
    let (row, col) = match attr(e, b"r", part)? {
        Some(reference) => parse_cell_ref(&reference)
            .ok_or_else(|| malformed(part, format!("bad cell reference {}", reference)))?,
        None => (row, *next_col),
    };
    if row >= MAX_ROWS || col >= MAX_COLUMNS {
        return Err(malformed(
            part,
            format!(
                "cell outside sheet bounds at row {} column {}",
                row + 1,
                col + 1
            ),
        ));
    }
    *next_col = col + 1;
    Ok(PendingCell {
        row,
        col,
        kind: attr(e, b"t", part)?,
        ..PendingCell::default()
    })
}

fn cell_text(cell: &PendingCell, shared: &[String], part: &str) -> Result<String, WorkbookError> {
    let text = match cell.kind.as_deref() {
        Some("s") => {
            let index: usize = cell
                .value
                .trim()
                .parse()
                .map_err(|_| malformed(part, format!("bad shared string index {:?}", cell.value)))?;
            shared
                .get(index)
                .cloned()
                .ok_or_else(|| malformed(part, format!("shared string {} out of range", index)))?
        }
        Some("inlineStr") => cell.inline.clone(),
        Some("b") => {
            if cell.value.trim() == "1" {
                "True".to_string()
            } else {
                "False".to_string()
            }
        }
        Some("str") | Some("e") => cell.value.clone(),
        _ if cell.value.is_empty() => String::new(),
        _ => format_number(&cell.value),
    };
    Ok(text)
}

fn attr(e: &BytesStart<'_>, local: &[u8], part: &str) -> Result<Option<String>, WorkbookError> {
    for a in e.attributes() {
        let a = a.map_err(|err| malformed(part, err.to_string()))?;
        if a.key.local_name().as_ref() == local && a.key.prefix().is_none() {
            let value = a
                .unescape_value()
                .map_err(|err| malformed(part, err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn malformed(part: &str, message: impl Into<String>) -> WorkbookError {
    WorkbookError::Malformed {
        part: part.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PART: &str = "xl/worksheets/sheet1.xml";

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse_cell_ref("A1"), Some((0, 0)));
        assert_eq!(parse_cell_ref("B3"), Some((2, 1)));
        assert_eq!(parse_cell_ref("Z10"), Some((9, 25)));
        assert_eq!(parse_cell_ref("AA1"), Some((0, 26)));
        assert_eq!(parse_cell_ref("ab2"), Some((1, 27)));
        assert_eq!(parse_cell_ref("A0"), None);
        assert_eq!(parse_cell_ref("12"), None);
        assert_eq!(parse_cell_ref("A"), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number("20"), "20");
        assert_eq!(format_number("20.0"), "20");
        assert_eq!(format_number("1402"), "1402");
        assert_eq!(format_number("0.25"), "0.25");
        assert_eq!(format_number("1E+20"), "1E+20");
    }

    #[test]
    fn test_parse_sheet_cell_kinds() {
        let shared = vec!["title".to_string(), "Test Journal".to_string()];
        let xml = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>
  <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
  <row r="2"><c r="A2" t="inlineStr"><is><t>volume</t></is></c><c r="B2"><v>20</v></c></row>
  <row r="4"><c r="A4" t="str"><f>CONCAT("a","b")</f><v>ab</v></c><c r="C4" t="b"><v>1</v></c></row>
</sheetData>
</worksheet>"#;
        let grid = parse_sheet(xml, &shared, PART).unwrap();
        assert_eq!(grid.cell(0, 0), "title");
        assert_eq!(grid.cell(0, 1), "Test Journal");
        assert_eq!(grid.cell(1, 0), "volume");
        assert_eq!(grid.cell(1, 1), "20");
        assert_eq!(grid.rows()[2], Vec::<String>::new());
        assert_eq!(grid.cell(3, 0), "ab");
        assert_eq!(grid.cell(3, 1), "");
        assert_eq!(grid.cell(3, 2), "True");
        assert_eq!(grid.width(), 3);
    }

    #[test]
    fn test_parse_sheet_without_references() {
        let xml = "<worksheet><sheetData><row><c><v>1</v></c><c><v>2</v></c></row><row><c t=\"inlineStr\"><is><t>x</t></is></c></row></sheetData></worksheet>";
        let grid = parse_sheet(xml, &[], PART).unwrap();
        assert_eq!(grid.cell(0, 0), "1");
        assert_eq!(grid.cell(0, 1), "2");
        assert_eq!(grid.cell(1, 0), "x");
    }

    #[test]
    fn test_shared_string_out_of_range() {
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>5</v></c></row></sheetData></worksheet>"#;
        let err = parse_sheet(xml, &["only".to_string()], PART).unwrap_err();
        assert!(matches!(err, WorkbookError::Malformed { .. }));
    }
}
