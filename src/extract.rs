// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Reading the key to color map out of a source workbook.

use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

use log::debug;

use crate::color::Rgb;
use crate::datatype::CellValue;
use crate::errors::Error;
use crate::style::{CellFill, FillColor};
use crate::theme::ThemePalette;
use crate::xlsx::Xlsx;

/// Number of leading columns a row key is drawn from.
pub const KEY_COLUMNS: usize = 3;

/// Identity of a row, the cached values of its leading columns.
///
/// Two rows match when all three fields compare equal, which for numbers
/// means bit-for-bit. A key is only ever built from rows where all three
/// fields are present and non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey([CellValue; KEY_COLUMNS]);

impl RowKey {
    /// Builds a key from the three leading cell values.
    ///
    /// `None` when any field is absent; such rows never take part in
    /// color transfer.
    pub fn new(values: [CellValue; KEY_COLUMNS]) -> Option<RowKey> {
        if values.iter().any(CellValue::is_absent) {
            return None;
        }
        Some(RowKey(values))
    }

    pub(crate) fn from_cells(values: &[CellValue; KEY_COLUMNS]) -> Option<RowKey> {
        RowKey::new(values.clone())
    }

    /// The key fields in column order.
    pub fn values(&self) -> &[CellValue; KEY_COLUMNS] {
        &self.0
    }
}

/// Row colors harvested from a source sheet, indexed by row key.
///
/// An entry holding `None` marks a row that is visibly filled but whose
/// color could not be resolved; consumers must treat such rows as
/// unusable rather than fall back to a default color.
pub type ColorMap = HashMap<RowKey, Option<Rgb>>;

/// Reads the workbook at `path` once and builds the color map of `sheet_name`.
///
/// Data rows start at the second row, the first is taken to be headers.
/// Rows with an incomplete key are skipped, rows without a fill leave no
/// entry, and when several rows share a key the last one read wins.
pub fn extract_colors<P: AsRef<Path>>(path: P, sheet_name: &str) -> Result<ColorMap, Error> {
    let mut workbook = Xlsx::open(path)?;
    let theme = workbook.theme_palette();
    workbook.row_colors(sheet_name, theme.as_ref())
}

impl<RS: Read + Seek> Xlsx<RS> {
    /// Builds the key to color map of one sheet of this workbook.
    ///
    /// The fill is taken from the first key column; a fill naming a color
    /// that cannot be resolved (a malformed hex string, a theme position
    /// the palette does not define, no palette at all) is recorded with
    /// no color so a later match does not paint stale data.
    pub fn row_colors(
        &mut self,
        sheet_name: &str,
        theme: Option<&ThemePalette>,
    ) -> Result<ColorMap, Error> {
        let fills = self.styles().resolved_fills();
        let mut scanner = self.key_rows(sheet_name)?;
        let mut colors = ColorMap::new();
        while let Some(row) = scanner.next_row()? {
            // the first row holds the headers
            if row.row < 1 {
                continue;
            }
            let Some(key) = RowKey::from_cells(&row.values) else {
                continue;
            };
            let style_id = row.styles[0].unwrap_or(0);
            let fill = fills.get(style_id as usize).unwrap_or(&CellFill::None);
            match fill {
                CellFill::None => (),
                CellFill::Solid(FillColor::Rgb(hex)) => {
                    colors.insert(key, Rgb::parse(hex));
                }
                CellFill::Solid(FillColor::Theme(position)) => {
                    let resolved = theme.and_then(|t| t.get(*position)).and_then(Rgb::parse);
                    colors.insert(key, resolved);
                }
            }
        }
        debug!("collected {} keyed colors from '{sheet_name}'", colors.len());
        Ok(colors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
        <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
    </Relationships>"#;

    const WORKBOOK: &str = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
        <sheets><sheet name="Feuil1" sheetId="1" r:id="rId1"/></sheets>
    </workbook>"#;

    // xf 0: unfilled, xf 1: red rgb fill, xf 2: theme 4 fill,
    // xf 3: malformed hex, xf 4: theme 0 (a position real palettes skip)
    const STYLES: &str = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
        <fills count="6">
            <fill><patternFill patternType="none"/></fill>
            <fill><patternFill patternType="gray125"/></fill>
            <fill><patternFill patternType="solid"><fgColor rgb="FFFF0000"/></patternFill></fill>
            <fill><patternFill patternType="solid"><fgColor theme="4"/></patternFill></fill>
            <fill><patternFill patternType="solid"><fgColor rgb="ZZZ"/></patternFill></fill>
            <fill><patternFill patternType="solid"><fgColor theme="0"/></patternFill></fill>
        </fills>
        <cellXfs count="5">
            <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
            <xf numFmtId="0" fontId="0" fillId="2" borderId="0" applyFill="1"/>
            <xf numFmtId="0" fontId="0" fillId="3" borderId="0" applyFill="1"/>
            <xf numFmtId="0" fontId="0" fillId="4" borderId="0" applyFill="1"/>
            <xf numFmtId="0" fontId="0" fillId="5" borderId="0" applyFill="1"/>
        </cellXfs>
    </styleSheet>"#;

    const THEME: &str = r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
        <a:themeElements><a:clrScheme name="Office">
            <a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>
            <a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>
            <a:dk2><a:srgbClr val="44546A"/></a:dk2>
            <a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>
            <a:accent1><a:srgbClr val="4472C4"/></a:accent1>
        </a:clrScheme></a:themeElements>
    </a:theme>"#;

    fn book(sheet: &str, with_theme: bool) -> Xlsx<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let mut parts = vec![
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", RELS),
            ("xl/styles.xml", STYLES),
            ("xl/worksheets/sheet1.xml", sheet),
        ];
        if with_theme {
            parts.push(("xl/theme/theme1.xml", THEME));
        }
        for (name, body) in parts {
            writer.start_file(name, options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        Xlsx::new(writer.finish().unwrap()).unwrap()
    }

    fn colors_of(sheet: &str, with_theme: bool) -> ColorMap {
        let mut workbook = book(sheet, with_theme);
        let theme = workbook.theme_palette();
        workbook.row_colors("Feuil1", theme.as_ref()).unwrap()
    }

    fn key(a: &str, b: &str, c: &str) -> RowKey {
        RowKey::new([
            CellValue::String(a.into()),
            CellValue::String(b.into()),
            CellValue::String(c.into()),
        ])
        .unwrap()
    }

    fn row(r: u32, s: u32, a: &str, b: &str, c: &str) -> String {
        format!(
            r#"<row r="{r}"><c r="A{r}" s="{s}" t="inlineStr"><is><t>{a}</t></is></c><c r="B{r}" s="{s}" t="inlineStr"><is><t>{b}</t></is></c><c r="C{r}" s="{s}" t="inlineStr"><is><t>{c}</t></is></c></row>"#
        )
    }

    fn sheet_of(rows: &[String]) -> String {
        format!(
            "<worksheet><sheetData>{}</sheetData></worksheet>",
            rows.concat()
        )
    }

    #[test]
    fn filled_rows_land_in_the_map_and_headers_do_not() {
        let sheet = sheet_of(&[
            row(1, 1, "Implantation", "Nom", "Pr\u{e9}nom"),
            row(2, 1, "Nord", "Durand", "Paul"),
            row(3, 0, "Sud", "Martin", "Jean"),
        ]);
        let colors = colors_of(&sheet, true);
        assert_eq!(colors.len(), 1);
        assert_eq!(
            colors[&key("Nord", "Durand", "Paul")],
            Some(Rgb::new(255, 0, 0))
        );
        // the header row was filled red yet must not appear
        assert!(!colors.contains_key(&key("Implantation", "Nom", "Pr\u{e9}nom")));
        // unfilled rows leave no entry
        assert!(!colors.contains_key(&key("Sud", "Martin", "Jean")));
    }

    #[test]
    fn theme_fills_resolve_through_the_palette() {
        let sheet = sheet_of(&[row(2, 2, "Nord", "Durand", "Paul")]);
        let colors = colors_of(&sheet, true);
        assert_eq!(
            colors[&key("Nord", "Durand", "Paul")],
            Some(Rgb::new(0x44, 0x72, 0xC4))
        );
    }

    #[test]
    fn unresolved_colors_are_recorded_without_a_color() {
        // malformed hex
        let sheet = sheet_of(&[row(2, 3, "A", "B", "C")]);
        assert_eq!(colors_of(&sheet, true)[&key("A", "B", "C")], None);
        // theme position 0 is a system color slot, absent from the palette
        let sheet = sheet_of(&[row(2, 4, "A", "B", "C")]);
        assert_eq!(colors_of(&sheet, true)[&key("A", "B", "C")], None);
        // theme fill with no theme part at all
        let sheet = sheet_of(&[row(2, 2, "A", "B", "C")]);
        assert_eq!(colors_of(&sheet, false)[&key("A", "B", "C")], None);
    }

    #[test]
    fn incomplete_keys_are_skipped() {
        let sheet = sheet_of(&[
            row(2, 1, "", "Durand", "Paul"),
            row(3, 1, "Nord", "", "Paul"),
            r#"<row r="4"><c r="A4" s="1" t="inlineStr"><is><t>Nord</t></is></c><c r="B4" s="1" t="inlineStr"><is><t>Durand</t></is></c></row>"#.to_string(),
        ]);
        assert!(colors_of(&sheet, true).is_empty());
    }

    #[test]
    fn duplicate_keys_keep_the_last_row() {
        let sheet = sheet_of(&[
            row(2, 1, "Nord", "Durand", "Paul"),
            row(3, 0, "Nord", "Durand", "Paul"),
        ]);
        // an unfilled later row adds nothing, the earlier entry survives
        let colors = colors_of(&sheet, true);
        assert_eq!(
            colors[&key("Nord", "Durand", "Paul")],
            Some(Rgb::new(255, 0, 0))
        );

        let sheet = sheet_of(&[
            row(2, 1, "Nord", "Durand", "Paul"),
            row(3, 2, "Nord", "Durand", "Paul"),
        ]);
        let colors = colors_of(&sheet, true);
        assert_eq!(
            colors[&key("Nord", "Durand", "Paul")],
            Some(Rgb::new(0x44, 0x72, 0xC4))
        );
    }

    #[test]
    fn the_first_key_column_carries_the_row_fill() {
        // B and C are filled red but A is unfilled: no entry
        let sheet = sheet_of(&[format!(
            r#"<row r="2"><c r="A2" t="inlineStr"><is><t>Nord</t></is></c><c r="B2" s="1" t="inlineStr"><is><t>Durand</t></is></c><c r="C2" s="1" t="inlineStr"><is><t>Paul</t></is></c></row>"#
        )]);
        assert!(colors_of(&sheet, true).is_empty());
    }

    #[test]
    fn missing_sheet_is_an_error() {
        let mut workbook = book("<worksheet><sheetData/></worksheet>", true);
        match workbook.row_colors("Feuil2", None) {
            Err(Error::WorksheetNotFound(name)) => assert_eq!(name, "Feuil2"),
            other => panic!("expected WorksheetNotFound, got {other:?}"),
        }
    }

    #[test]
    fn numeric_keys_match_by_bits() {
        let sheet = sheet_of(&[format!(
            r#"<row r="2"><c r="A2" s="1"><v>12.5</v></c><c r="B2" s="1" t="inlineStr"><is><t>Durand</t></is></c><c r="C2" s="1"><v>3</v></c></row>"#
        )]);
        let colors = colors_of(&sheet, true);
        let k = RowKey::new([
            CellValue::Float(12.5),
            CellValue::String("Durand".into()),
            CellValue::Float(3.0),
        ])
        .unwrap();
        assert_eq!(colors[&k], Some(Rgb::new(255, 0, 0)));
    }
}
