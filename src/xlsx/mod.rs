// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Workbook archive plumbing shared by the extraction and painting paths.

mod sheet;
mod style_parser;

pub(crate) use sheet::{KeyRow, RowScanner};
pub(crate) use style_parser::{read_style_sheet, StyleTable};

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::attributes::{Attribute, Attributes};
use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader as XmlReader;
use zip::read::{ZipArchive, ZipFile};
use zip::result::ZipError;

use crate::errors::Error;
use crate::theme::{self, ThemePalette};
use crate::utils::push_entity;

/// Maximum number of columns in a worksheet.
pub(crate) const MAX_COLUMNS: u32 = 16_384;

pub(crate) const WORKBOOK_PART: &str = "xl/workbook.xml";
pub(crate) const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
pub(crate) const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
pub(crate) const STYLES_PART: &str = "xl/styles.xml";

type XlReader<'a, RS> = XmlReader<BufReader<ZipFile<'a, RS>>>;

/// An xlsx archive with its bookkeeping parts parsed.
pub struct Xlsx<RS> {
    zip: ZipArchive<RS>,
    /// Shared string table
    strings: Vec<String>,
    /// Sheet name to path within the archive, in workbook order
    sheets: Vec<(String, String)>,
    styles: StyleTable,
}

impl Xlsx<BufReader<File>> {
    /// Opens the workbook at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Xlsx::new(BufReader::new(File::open(path)?))
    }
}

impl<RS: Read + Seek> Xlsx<RS> {
    /// Parses the bookkeeping parts of a workbook read from `reader`.
    pub fn new(reader: RS) -> Result<Self, Error> {
        let mut xlsx = Xlsx {
            zip: ZipArchive::new(reader)?,
            strings: Vec::new(),
            sheets: Vec::new(),
            styles: StyleTable::default(),
        };
        xlsx.read_shared_strings()?;
        xlsx.read_styles()?;
        let relationships = xlsx.read_relationships()?;
        xlsx.read_workbook(&relationships)?;
        Ok(xlsx)
    }

    /// Sheet names in workbook order, hidden sheets included.
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Reads the workbook theme palette.
    ///
    /// `None` when the workbook has no usable theme part, `Some` with an
    /// empty palette when the part exists but defines no direct colors.
    pub fn theme_palette(&mut self) -> Option<ThemePalette> {
        theme::theme_from_zip(&mut self.zip)
    }

    pub(crate) fn styles(&self) -> &StyleTable {
        &self.styles
    }

    /// Scanner over the key columns of one worksheet.
    pub(crate) fn key_rows<'a>(
        &'a mut self,
        name: &str,
    ) -> Result<RowScanner<'a, BufReader<ZipFile<'a, RS>>>, Error> {
        let (_, path) = self
            .sheets
            .iter()
            .find(|&(n, _)| n == name)
            .ok_or_else(|| Error::WorksheetNotFound(name.into()))?;
        let xml = xml_reader(&mut self.zip, path)
            .ok_or_else(|| Error::WorksheetNotFound(name.into()))??;
        RowScanner::new(xml, &self.strings)
    }

    fn read_shared_strings(&mut self) -> Result<(), Error> {
        let mut xml = match xml_reader(&mut self.zip, SHARED_STRINGS_PART) {
            None => return Ok(()),
            Some(x) => x?,
        };
        self.strings = read_shared_strings_from(&mut xml)?;
        Ok(())
    }

    fn read_styles(&mut self) -> Result<(), Error> {
        let mut xml = match xml_reader(&mut self.zip, STYLES_PART) {
            None => return Ok(()),
            Some(x) => x?,
        };
        self.styles = read_style_sheet(&mut xml)?;
        Ok(())
    }

    fn read_relationships(&mut self) -> Result<BTreeMap<Vec<u8>, String>, Error> {
        let mut xml = match xml_reader(&mut self.zip, WORKBOOK_RELS_PART) {
            None => return Err(Error::FileNotFound(WORKBOOK_RELS_PART.to_string())),
            Some(x) => x?,
        };
        read_relationships_from(&mut xml)
    }

    fn read_workbook(&mut self, relationships: &BTreeMap<Vec<u8>, String>) -> Result<(), Error> {
        let mut xml = match xml_reader(&mut self.zip, WORKBOOK_PART) {
            None => return Ok(()),
            Some(x) => x?,
        };
        self.sheets = read_sheet_list(&mut xml, relationships)?;
        Ok(())
    }
}

/// Returns a reader over an archive part, `None` when the part is absent.
///
/// Part lookup ignores case, matching how consumers treat package names.
fn xml_reader<'a, RS: Read + Seek>(
    zip: &'a mut ZipArchive<RS>,
    path: &str,
) -> Option<Result<XlReader<'a, RS>, Error>> {
    let actual_path = zip
        .file_names()
        .find(|n| n.eq_ignore_ascii_case(path))?
        .to_owned();
    match zip.by_name(&actual_path) {
        Ok(f) => {
            let mut r = XmlReader::from_reader(BufReader::new(f));
            let config = r.config_mut();
            config.check_end_names = false;
            config.trim_text(false);
            config.check_comments = false;
            config.expand_empty_elements = true;
            Some(Ok(r))
        }
        Err(ZipError::FileNotFound) => None,
        Err(e) => Some(Err(e.into())),
    }
}

/// Reader over raw part bytes with the same configuration as [`xml_reader`].
pub(crate) fn xml_reader_from_bytes(bytes: &[u8]) -> XmlReader<&[u8]> {
    let mut r = XmlReader::from_reader(bytes);
    let config = r.config_mut();
    config.check_end_names = false;
    config.trim_text(false);
    config.check_comments = false;
    config.expand_empty_elements = true;
    r
}

pub(crate) fn get_attribute<'a>(atts: Attributes<'a>, n: QName) -> Result<Option<&'a [u8]>, Error> {
    for a in atts {
        match a {
            Ok(Attribute {
                key,
                value: Cow::Borrowed(value),
            }) if key == n => return Ok(Some(value)),
            Err(e) => return Err(Error::XmlAttr(e)),
            _ => {} // ignore other attributes
        }
    }
    Ok(None)
}

/// Converts a "A1"-style reference to a 0-based row index.
pub(crate) fn get_row(range: &[u8]) -> Result<u32, Error> {
    get_row_and_optional_column(range).map(|(row, _)| row)
}

/// Converts a "A1"-style reference to 0-based `(row, column)` indexes.
///
/// The column component is optional; a bare row number yields `None`.
pub(crate) fn get_row_and_optional_column(range: &[u8]) -> Result<(u32, Option<u32>), Error> {
    let (mut row, mut col) = (0_u32, 0_u32);
    let mut pow = 1_u32;
    let mut readrow = true;
    for c in range.iter().rev() {
        match *c {
            c @ b'0'..=b'9' => {
                if readrow {
                    row = ((c - b'0') as u32)
                        .checked_mul(pow)
                        .and_then(|v| row.checked_add(v))
                        .ok_or(Error::Unexpected("row reference overflow"))?;
                    pow = pow.saturating_mul(10);
                } else {
                    return Err(Error::NumericColumn(c));
                }
            }
            c @ b'A'..=b'Z' => {
                if readrow {
                    if row == 0 {
                        return Err(Error::RangeWithoutRowComponent);
                    }
                    pow = 1;
                    readrow = false;
                }
                col = ((c - b'A') as u32 + 1)
                    .checked_mul(pow)
                    .and_then(|v| col.checked_add(v))
                    .ok_or(Error::Unexpected("column reference overflow"))?;
                pow = pow.saturating_mul(26);
            }
            c @ b'a'..=b'z' => {
                if readrow {
                    if row == 0 {
                        return Err(Error::RangeWithoutRowComponent);
                    }
                    pow = 1;
                    readrow = false;
                }
                col = ((c - b'a') as u32 + 1)
                    .checked_mul(pow)
                    .and_then(|v| col.checked_add(v))
                    .ok_or(Error::Unexpected("column reference overflow"))?;
                pow = pow.saturating_mul(26);
            }
            _ => return Err(Error::Alphanumeric(*c)),
        }
    }
    let row = row
        .checked_sub(1)
        .ok_or(Error::RangeWithoutRowComponent)?;
    Ok((row, if col == 0 { None } else { Some(col - 1) }))
}

/// Converts a 0-based column number to its letter name.
pub(crate) fn column_number_to_name(num: u32) -> Result<Vec<u8>, Error> {
    if num >= MAX_COLUMNS {
        return Err(Error::Unexpected("column number overflow"));
    }
    let mut col: Vec<u8> = Vec::new();
    let mut num = num + 1;
    while num > 0 {
        let integer = ((num - 1) % 26 + 65) as u8;
        col.push(integer);
        num = (num - 1) / 26;
    }
    col.reverse();
    Ok(col)
}

/// Converts 0-based `(row, column)` indexes to a "A1"-style reference.
pub(crate) fn coordinate_to_name(cell: (u32, u32)) -> Result<Vec<u8>, Error> {
    let row = cell
        .0
        .checked_add(1)
        .ok_or(Error::Unexpected("row number overflow"))?;
    let cell = &[column_number_to_name(cell.1)?, row.to_string().into_bytes()];
    Ok(cell.concat())
}

/// Reads the text of a string element, handling rich text runs and
/// skipping phonetic hints. `closing` is the name of the enclosing
/// element, `si` or `is`.
pub(crate) fn read_string<R: BufRead>(
    xml: &mut XmlReader<R>,
    closing: QName,
) -> Result<Option<String>, Error> {
    let mut buf = Vec::with_capacity(1024);
    let mut val_buf = Vec::with_capacity(1024);
    let mut rich_buffer: Option<String> = None;
    let mut is_phonetic_text = false;
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"r" => {
                if rich_buffer.is_none() {
                    // use a buffer since richtext has multiples <r> and <t> for the same cell
                    rich_buffer = Some(String::new());
                }
            }
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"rPh" => {
                is_phonetic_text = true;
            }
            Ok(Event::End(ref e)) if e.name() == closing => {
                return Ok(rich_buffer);
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"rPh" => {
                is_phonetic_text = false;
            }
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"t" && !is_phonetic_text => {
                val_buf.clear();
                let mut value = String::new();
                loop {
                    match xml.read_event_into(&mut val_buf)? {
                        Event::Text(t) => value.push_str(&t.xml10_content()?),
                        Event::GeneralRef(r) => push_entity(&r, &mut value)?,
                        Event::End(end) if end.name() == e.name() => break,
                        Event::Eof => return Err(Error::XmlEof("t")),
                        _ => (),
                    }
                }
                if let Some(s) = rich_buffer.as_mut() {
                    s.push_str(&value);
                } else {
                    // consume any remaining events up to the closing tag
                    val_buf.clear();
                    xml.read_to_end_into(closing, &mut val_buf)?;
                    return Ok(Some(value));
                }
            }
            Ok(Event::Eof) => return Err(Error::XmlEof("si")),
            Err(e) => return Err(Error::Xml(e)),
            _ => (),
        }
    }
}

/// Parses a shared string table part into its list of strings.
pub(crate) fn read_shared_strings_from<R: BufRead>(
    xml: &mut XmlReader<R>,
) -> Result<Vec<String>, Error> {
    let mut strings = Vec::new();
    let mut buf = Vec::with_capacity(1024);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"si" => {
                // an empty item still occupies its index
                strings.push(read_string(xml, e.name())?.unwrap_or_default());
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"sst" => break,
            Ok(Event::Eof) => return Err(Error::XmlEof("sst")),
            Err(e) => return Err(Error::Xml(e)),
            _ => (),
        }
    }
    Ok(strings)
}

/// Parses a relationships part into an Id to Target map.
pub(crate) fn read_relationships_from<R: BufRead>(
    xml: &mut XmlReader<R>,
) -> Result<BTreeMap<Vec<u8>, String>, Error> {
    let mut relationships = BTreeMap::new();
    let mut buf = Vec::with_capacity(64);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = Vec::new();
                let mut target = String::new();
                for a in e.attributes() {
                    let a = a?;
                    match a.key {
                        QName(b"Id") => id.extend_from_slice(&a.value),
                        QName(b"Target") => {
                            target = a.decode_and_unescape_value(xml.decoder())?.to_string();
                        }
                        _ => (),
                    }
                }
                relationships.insert(id, target);
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"Relationships" => break,
            Ok(Event::Eof) => return Err(Error::XmlEof("Relationships")),
            Err(e) => return Err(Error::Xml(e)),
            _ => (),
        }
    }
    Ok(relationships)
}

/// Parses the workbook part into `(name, part path)` pairs, one per sheet.
pub(crate) fn read_sheet_list<R: BufRead>(
    xml: &mut XmlReader<R>,
    relationships: &BTreeMap<Vec<u8>, String>,
) -> Result<Vec<(String, String)>, Error> {
    let mut sheets = Vec::new();
    let mut buf = Vec::with_capacity(1024);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"sheet" => {
                let mut name = String::new();
                let mut path = String::new();
                for a in e.attributes() {
                    let a = a?;
                    match a.key {
                        QName(b"name") => {
                            name = a.decode_and_unescape_value(xml.decoder())?.to_string();
                        }
                        QName(b"r:id") | QName(b"relationships:id") => {
                            let r = relationships
                                .get(&*a.value)
                                .ok_or(Error::RelationshipNotFound)?
                                .as_str();
                            // target may be absolute or relative to xl/
                            path = if r.starts_with("/xl/") {
                                r[1..].to_string()
                            } else if r.starts_with("xl/") {
                                r.to_string()
                            } else {
                                format!("xl/{r}")
                            };
                        }
                        _ => (),
                    }
                }
                sheets.push((name, path));
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"workbook" => break,
            Ok(Event::Eof) => return Err(Error::XmlEof("workbook")),
            Err(e) => return Err(Error::Xml(e)),
            _ => (),
        }
    }
    Ok(sheets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"A1", (0, Some(0)))]
    #[case(b"C107", (106, Some(2)))]
    #[case(b"aB32", (31, Some(27)))]
    #[case(b"AA99", (98, Some(26)))]
    #[case(b"XFD1048576", (1_048_575, Some(16_383)))]
    #[case(b"7", (6, None))]
    fn row_and_column_parsing(#[case] reference: &[u8], #[case] expected: (u32, Option<u32>)) {
        assert_eq!(get_row_and_optional_column(reference).unwrap(), expected);
    }

    #[rstest]
    #[case(b"")]
    #[case(b"A")]
    #[case(b"A0")]
    #[case(b"1A")]
    #[case(b"A-1")]
    #[case(b"99999999999999999999")]
    fn bad_references_are_errors(#[case] reference: &[u8]) {
        assert!(get_row_and_optional_column(reference).is_err());
    }

    #[rstest]
    #[case(0, b"A")]
    #[case(25, b"Z")]
    #[case(26, b"AA")]
    #[case(701, b"ZZ")]
    #[case(702, b"AAA")]
    fn column_names(#[case] num: u32, #[case] expected: &[u8]) {
        assert_eq!(column_number_to_name(num).unwrap(), expected);
    }

    #[test]
    fn coordinate_names_are_one_based() {
        assert_eq!(coordinate_to_name((0, 0)).unwrap(), b"A1");
        assert_eq!(coordinate_to_name((4, 1)).unwrap(), b"B5");
        assert!(coordinate_to_name((0, MAX_COLUMNS)).is_err());
    }

    #[test]
    fn shared_strings_keep_empty_items_in_place() {
        let doc = br#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="4">
            <si><t>plain</t></si>
            <si/>
            <si><r><rPr><b/></rPr><t>ri</t></r><r><t>ch</t></r></si>
            <si><t>a&amp;b</t></si>
        </sst>"#;
        let mut xml = xml_reader_from_bytes(doc);
        let strings = read_shared_strings_from(&mut xml).unwrap();
        assert_eq!(strings, ["plain", "", "rich", "a&b"]);
    }

    #[test]
    fn phonetic_runs_are_skipped() {
        let doc = "<sst><si><rPh sb=\"0\" eb=\"1\"><t>\u{30DB}</t></rPh><t>text</t></si></sst>";
        let mut xml = xml_reader_from_bytes(doc.as_bytes());
        let strings = read_shared_strings_from(&mut xml).unwrap();
        assert_eq!(strings, ["text"]);
    }

    #[test]
    fn relationship_targets_are_resolved() {
        let doc = br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
            <Relationship Id="rId1" Type="t" Target="worksheets/sheet1.xml"/>
            <Relationship Id="rId2" Type="t" Target="/xl/worksheets/sheet2.xml"/>
        </Relationships>"#;
        let mut xml = xml_reader_from_bytes(doc);
        let rels = read_relationships_from(&mut xml).unwrap();
        assert_eq!(rels[&b"rId1".to_vec()], "worksheets/sheet1.xml");
        assert_eq!(rels[&b"rId2".to_vec()], "/xl/worksheets/sheet2.xml");
    }

    #[test]
    fn sheet_list_keeps_workbook_order_and_hidden_sheets() {
        let mut rels = BTreeMap::new();
        rels.insert(b"rId1".to_vec(), "worksheets/sheet1.xml".to_string());
        rels.insert(b"rId2".to_vec(), "/xl/worksheets/sheet2.xml".to_string());
        let doc = br#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
            <sheets>
                <sheet name="Feuille &amp; une" sheetId="1" r:id="rId1"/>
                <sheet name="Cach&#233;e" sheetId="2" state="hidden" r:id="rId2"/>
            </sheets>
        </workbook>"#;
        let mut xml = xml_reader_from_bytes(doc);
        let sheets = read_sheet_list(&mut xml, &rels).unwrap();
        assert_eq!(
            sheets,
            [
                (
                    "Feuille & une".to_string(),
                    "xl/worksheets/sheet1.xml".to_string()
                ),
                (
                    "Cach\u{e9}e".to_string(),
                    "xl/worksheets/sheet2.xml".to_string()
                ),
            ]
        );
    }

    #[test]
    fn unknown_relationship_id_is_an_error() {
        let rels = BTreeMap::new();
        let doc = br#"<workbook><sheets><sheet name="S" r:id="rId9"/></sheets></workbook>"#;
        let mut xml = xml_reader_from_bytes(doc);
        assert!(matches!(
            read_sheet_list(&mut xml, &rels),
            Err(Error::RelationshipNotFound)
        ));
    }
}
