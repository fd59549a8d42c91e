//! Spreadsheet encoding: [`Table`] → single-sheet `.xlsx` workbook.
//!
//! An OOXML workbook is a zip archive of XML parts. Only the five parts Excel
//! and LibreOffice require are written; every cell is an inline string, so no
//! shared-strings table or stylesheet is needed. Row 1 is the header row,
//! data rows follow in table order.

use crate::error::PipelineError;
use crate::pipeline::{SpreadsheetArtifact, SpreadsheetEncoder};
use crate::table::Table;
use async_trait::async_trait;
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// [`SpreadsheetEncoder`] writing a minimal OOXML workbook.
#[derive(Debug, Clone)]
pub struct XlsxEncoder {
    sheet_name: String,
}

impl XlsxEncoder {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
        }
    }
}

impl Default for XlsxEncoder {
    fn default() -> Self {
        Self::new("Sheet1")
    }
}

#[async_trait]
impl SpreadsheetEncoder for XlsxEncoder {
    async fn encode(&self, table: &Table) -> Result<SpreadsheetArtifact, PipelineError> {
        let bytes = encode_workbook(table, &self.sheet_name)
            .map_err(|e| PipelineError::unknown(format!("Spreadsheet encoding failed: {}", e)))?;
        Ok(SpreadsheetArtifact::xlsx(bytes))
    }
}

/// Write `table` as a workbook with one sheet named `sheet_name`.
pub fn encode_workbook(table: &Table, sheet_name: &str) -> Result<Vec<u8>, zip::result::ZipError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", workbook_xml(sheet_name)),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/worksheets/sheet1.xml", sheet_xml(table)),
    ];
    for (name, body) in parts {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
    }

    let bytes = zip.finish()?.into_inner();
    debug!(
        "Encoded {}x{} table → {} bytes xlsx",
        table.rows.len() + 1,
        table.headers.len(),
        bytes.len()
    );
    Ok(bytes)
}

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        escape(sheet_name)
    )
}

fn sheet_xml(table: &Table) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    let all_rows = std::iter::once(&table.headers).chain(table.rows.iter());
    for (r, row) in all_rows.enumerate() {
        let row_num = r + 1;
        xml.push_str(&format!(r#"<row r="{}">"#, row_num));
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            xml.push_str(&format!(
                r#"<c r="{}{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                column_name(c),
                row_num,
                escape(xml_safe(value).as_str())
            ));
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Spreadsheet column letters for a 0-indexed column: 0 → A, 25 → Z, 26 → AA.
pub fn column_name(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().map(|&b| b as char).collect()
}

/// Drop characters XML 1.0 cannot carry (control codes from PDF text layers).
fn xml_safe(value: &str) -> String {
    value
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || c >= '\u{20}')
        .filter(|&c| c != '\u{FFFE}' && c != '\u{FFFF}')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::events::Event;
    use quick_xml::Reader;
    use std::io::Read;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
        let mut part = archive.by_name(name).expect("part present");
        let mut xml = String::new();
        part.read_to_string(&mut xml).unwrap();
        xml
    }

    fn assert_well_formed(xml: &str) {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => panic!("malformed XML: {e}\n{xml}"),
            }
        }
    }

    #[test]
    fn column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn workbook_has_required_parts() {
        let bytes = encode_workbook(&table(&["A"], &[]), "Sheet1").unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "xl/_rels/workbook.xml.rels",
                "xl/workbook.xml",
                "xl/worksheets/sheet1.xml",
            ]
        );
    }

    #[test]
    fn header_row_comes_first() {
        let t = table(&["Name", "Qty"], &[&["Bolt", "4"], &["Nut", "9"]]);
        let bytes = encode_workbook(&t, "Sheet1").unwrap();
        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");

        let name = sheet.find(">Name<").unwrap();
        let bolt = sheet.find(">Bolt<").unwrap();
        let nut = sheet.find(">Nut<").unwrap();
        assert!(name < bolt && bolt < nut);
        assert!(sheet.contains(r#"<c r="B3" t="inlineStr"><is><t xml:space="preserve">9</t>"#));
        assert_well_formed(&sheet);
    }

    #[test]
    fn cells_are_escaped() {
        let t = table(&["a<b", "R&D"], &[&["\"q\"", "x\u{1}y"]]);
        let bytes = encode_workbook(&t, "Q&A").unwrap();
        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains("a&lt;b"));
        assert!(sheet.contains("R&amp;D"));
        assert!(sheet.contains(">xy<"));
        assert_well_formed(&sheet);

        let workbook = read_part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"name="Q&amp;A""#));
        assert_well_formed(&workbook);
    }

    #[test]
    fn non_latin_text_survives() {
        let t = table(&["نام", "مبلغ"], &[&["پیچ", "۴۰۰"]]);
        let bytes = encode_workbook(&t, "Sheet1").unwrap();
        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains("پیچ"));
    }

    #[test]
    fn empty_cells_are_skipped() {
        let t = table(&["A", "B"], &[&["", "x"]]);
        let bytes = encode_workbook(&t, "Sheet1").unwrap();
        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(!sheet.contains(r#"r="A2""#));
        assert!(sheet.contains(r#"r="B2""#));
    }

    #[tokio::test]
    async fn encoder_tags_xlsx_mime() {
        let artifact = XlsxEncoder::default()
            .encode(&table(&["A"], &[&["1"]]))
            .await
            .unwrap();
        assert_eq!(artifact.mime_type, crate::pipeline::XLSX_MIME);
        assert_eq!(&artifact.bytes[..2], b"PK");
    }
}
