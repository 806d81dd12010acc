//! Access to the parts of an `.xlsx` package.

use super::WorkbookError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::result::ZipError;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// A sheet listed in the workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub part: String,
}

/// An opened xlsx zip container
pub struct Package<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> Package<R> {
    pub fn open(reader: R) -> Result<Self, WorkbookError> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive })
    }

    /// Read a part as UTF-8 text, `None` if the package does not contain it
    pub fn read_part(&mut self, name: &str) -> Result<Option<String>, WorkbookError> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        Ok(Some(content))
    }

    fn require_part(&mut self, name: &str) -> Result<String, WorkbookError> {
        self.read_part(name)?
            .ok_or_else(|| WorkbookError::MissingPart(name.to_string()))
    }

    /// Sheets in workbook order, with their resolved part paths
    pub fn sheets(&mut self) -> Result<Vec<SheetEntry>, WorkbookError> {
        let workbook = self.require_part(WORKBOOK_PART)?;
        let rels = self.require_part(WORKBOOK_RELS_PART)?;
        let targets = parse_relationships(&rels)?;

        parse_sheet_list(&workbook)?
            .into_iter()
            .map(|(name, rel_id)| {
                let target = targets.get(&rel_id).ok_or_else(|| WorkbookError::Malformed {
                    part: WORKBOOK_RELS_PART.to_string(),
                    message: format!("no relationship {} for sheet {}", rel_id, name),
                })?;
                Ok(SheetEntry {
                    name,
                    part: resolve_target(target),
                })
            })
            .collect()
    }

    /// The shared string table, empty if the package has none
    pub fn shared_strings(&mut self) -> Result<Vec<String>, WorkbookError> {
        match self.read_part(SHARED_STRINGS_PART)? {
            Some(xml) => parse_shared_strings(&xml),
            None => Ok(Vec::new()),
        }
    }
}

/// Relationship targets are relative to `xl/` unless absolute
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

fn attribute(
    e: &BytesStart<'_>,
    local: &[u8],
    part: &str,
) -> Result<Option<String>, WorkbookError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| malformed(part, err.to_string()))?;
        if attr.key.local_name().as_ref() == local {
            let value = attr
                .unescape_value()
                .map_err(|err| malformed(part, err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// `(sheet name, relationship id)` pairs from `xl/workbook.xml`
fn parse_sheet_list(xml: &str) -> Result<Vec<(String, String)>, WorkbookError> {
    let mut reader = Reader::from_str(xml);
    let mut sheets = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"sheet" =>
            {
                let name = attribute(e, b"name", WORKBOOK_PART)?;
                // r:id; the namespace prefix varies between writers
                let rel_id = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.local_name().as_ref() == b"id" && a.key.prefix().is_some())
                    .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
                match (name, rel_id) {
                    (Some(name), Some(rel_id)) => sheets.push((name, rel_id)),
                    _ => return Err(malformed(WORKBOOK_PART, "sheet without name or r:id")),
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(malformed(WORKBOOK_PART, e.to_string())),
        }
    }

    Ok(sheets)
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, String>, WorkbookError> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let id = attribute(e, b"Id", WORKBOOK_RELS_PART)?;
                let target = attribute(e, b"Target", WORKBOOK_RELS_PART)?;
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(malformed(WORKBOOK_RELS_PART, e.to_string())),
        }
    }

    Ok(targets)
}

/// Shared strings: each `<si>` is either a plain `<t>` or rich-text runs.
/// Phonetic hints (`<rPh>`) are not part of the value.
fn parse_shared_strings(xml: &str) -> Result<Vec<String>, WorkbookError> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => phonetic_depth += 1,
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::Text(e)) => {
                if in_text && phonetic_depth == 0 {
                    if let Some(ref mut s) = current {
                        let text = e
                            .unescape()
                            .map_err(|err| malformed(SHARED_STRINGS_PART, err.to_string()))?;
                        s.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => strings.push(current.take().unwrap_or_default()),
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(malformed(SHARED_STRINGS_PART, e.to_string())),
        }
    }

    Ok(strings)
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

    #[test]
    fn test_parse_sheet_list() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
          xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Journal" sheetId="1" r:id="rId1"/>
    <sheet name="Author(s)" sheetId="3" r:id="rId3"/>
  </sheets>
</workbook>"#;
        let sheets = parse_sheet_list(xml).unwrap();
        assert_eq!(
            sheets,
            vec![
                ("Journal".to_string(), "rId1".to_string()),
                ("Author(s)".to_string(), "rId3".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_relationships_and_resolve() {
        let xml = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet2.xml"/>
</Relationships>"#;
        let rels = parse_relationships(xml).unwrap();
        assert_eq!(resolve_target(&rels["rId1"]), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target(&rels["rId2"]), "xl/worksheets/sheet2.xml");
    }

    #[test]
    fn test_parse_shared_strings() {
        let xml = r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="4">
  <si><t>title</t></si>
  <si><r><rPr><b/></rPr><t>Rich </t></r><r><t xml:space="preserve">text</t></r></si>
  <si><t>漢字</t><rPh sb="0" eb="2"><t>カンジ</t></rPh></si>
  <si/>
  <si><t>A &amp; B</t></si>
</sst>"#;
        let strings = parse_shared_strings(xml).unwrap();
        assert_eq!(strings, vec!["title", "Rich text", "漢字", "", "A & B"]);
    }
}
