// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Painting matched rows of a target workbook.
//!
//! The target is handled as a part map: every archive entry is read into
//! memory, only the style sheet and the painted worksheet are rewritten,
//! and everything else goes back byte for byte. Painting itself happens
//! in two passes over the worksheet, one to plan (which rows, which
//! colors, which cell formats to clone) and one to splice the plan in.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read, Write};
use std::path::Path;

use log::debug;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader as XmlReader, Writer as XmlWriter};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::color::Rgb;
use crate::errors::Error;
use crate::extract::{extract_colors, ColorMap, RowKey, KEY_COLUMNS};
use crate::xlsx::{
    coordinate_to_name, get_attribute, get_row, get_row_and_optional_column,
    read_relationships_from, read_shared_strings_from, read_sheet_list, read_style_sheet,
    xml_reader_from_bytes, KeyRow, RowScanner, StyleTable, SHARED_STRINGS_PART, STYLES_PART,
    WORKBOOK_PART, WORKBOOK_RELS_PART,
};

/// Style sheet used when the target carries none, so painting always has
/// a section to extend. Slots 0 and 1 are the stock no-fill and gray125
/// fills every writer emits.
const MINIMAL_STYLES: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border/></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs></styleSheet>"#;

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const STYLES_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";

/// Copies row colors from a source workbook onto the matching rows of a
/// target workbook, then rewrites the target in place.
///
/// Matching goes by the cached values of the three leading columns;
/// matched rows have those three cells painted with the source row's
/// color. Rows that match a source row whose color could not be resolved
/// are left untouched. The target file is only replaced once the whole
/// rewrite succeeded in memory.
pub fn apply_colors<P, Q>(
    source: P,
    source_sheet: &str,
    target: Q,
    target_sheet: &str,
) -> Result<(), Error>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let colors = extract_colors(source, source_sheet)?;
    let mut package = Package::load(target.as_ref())?;
    package.paint_rows(target_sheet, &colors)?;
    package.save(target.as_ref())?;
    Ok(())
}

/// A workbook archive held in memory as `part name -> bytes`.
pub(crate) struct Package {
    parts: BTreeMap<String, Vec<u8>>,
}

impl Package {
    pub(crate) fn load(path: &Path) -> Result<Package, Error> {
        let file = File::open(path)?;
        let mut zip = ZipArchive::new(BufReader::new(file))?;
        let mut parts = BTreeMap::new();
        for index in 0..zip.len() {
            let mut entry = zip.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut bytes)?;
            parts.insert(entry.name().to_string(), bytes);
        }
        Ok(Package { parts })
    }

    pub(crate) fn save(&self, path: &Path) -> Result<(), Error> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, bytes) in &self.parts {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }
        let cursor = zip.finish()?;
        fs::write(path, cursor.into_inner())?;
        Ok(())
    }

    fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .get(name)
            .or_else(|| {
                self.parts
                    .iter()
                    .find(|(n, _)| n.eq_ignore_ascii_case(name))
                    .map(|(_, b)| b)
            })
            .map(|b| b.as_slice())
    }

    fn part_name(&self, name: &str) -> Option<String> {
        if self.parts.contains_key(name) {
            return Some(name.to_string());
        }
        self.parts
            .keys()
            .find(|n| n.eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Paints every row of `sheet_name` whose key has a resolved color in
    /// `colors`. The part map is updated in memory; nothing is written
    /// out here.
    pub(crate) fn paint_rows(&mut self, sheet_name: &str, colors: &ColorMap) -> Result<(), Error> {
        let sheet_part = {
            let rels_bytes = self
                .part(WORKBOOK_RELS_PART)
                .ok_or_else(|| Error::FileNotFound(WORKBOOK_RELS_PART.to_string()))?;
            let relationships = read_relationships_from(&mut xml_reader_from_bytes(rels_bytes))?;
            let workbook_bytes = self
                .part(WORKBOOK_PART)
                .ok_or_else(|| Error::FileNotFound(WORKBOOK_PART.to_string()))?;
            let sheets =
                read_sheet_list(&mut xml_reader_from_bytes(workbook_bytes), &relationships)?;
            let (_, sheet_path) = sheets
                .iter()
                .find(|(n, _)| n == sheet_name)
                .ok_or_else(|| Error::WorksheetNotFound(sheet_name.to_string()))?;
            self.part_name(sheet_path)
                .ok_or_else(|| Error::FileNotFound(sheet_path.clone()))?
        };

        let (styles_part, styles_is_new) = match self.part_name(STYLES_PART) {
            Some(name) => (name, false),
            None => (STYLES_PART.to_string(), true),
        };

        let strings = match self.part(SHARED_STRINGS_PART) {
            Some(bytes) => read_shared_strings_from(&mut xml_reader_from_bytes(bytes))?,
            None => Vec::new(),
        };
        let style_table = match self.part(&styles_part) {
            Some(bytes) => read_style_sheet(&mut xml_reader_from_bytes(bytes))?,
            None => read_style_sheet(&mut xml_reader_from_bytes(MINIMAL_STYLES))?,
        };

        let mut plan = PaintPlan::new(&style_table);
        {
            let sheet_bytes = self
                .part(&sheet_part)
                .ok_or_else(|| Error::FileNotFound(sheet_part.clone()))?;
            let mut scanner = RowScanner::new(xml_reader_from_bytes(sheet_bytes), &strings)?;
            while let Some(row) = scanner.next_row()? {
                // the first row holds the headers
                if row.row < 1 {
                    continue;
                }
                let Some(key) = RowKey::from_cells(&row.values) else {
                    continue;
                };
                // unresolved source colors leave the row untouched
                let Some(Some(color)) = colors.get(&key) else {
                    continue;
                };
                plan.add(&row, *color);
            }
        }
        if plan.is_empty() {
            debug!("no rows to paint in '{sheet_name}'");
            return Ok(());
        }

        let new_styles = {
            let styles_bytes = self.part(&styles_part).unwrap_or(MINIMAL_STYLES);
            rewrite_styles(styles_bytes, &plan, &style_table)?
        };
        let new_sheet = {
            let sheet_bytes = self
                .part(&sheet_part)
                .ok_or_else(|| Error::FileNotFound(sheet_part.clone()))?;
            rewrite_sheet(sheet_bytes, &plan)?
        };
        debug!(
            "painting {} rows in '{sheet_name}' with {} distinct colors",
            plan.rows.len(),
            plan.colors.len()
        );
        self.parts.insert(styles_part, new_styles);
        self.parts.insert(sheet_part, new_sheet);
        // a part the book never carried must also be declared
        if styles_is_new {
            if let Some(types_part) = self.part_name(CONTENT_TYPES_PART) {
                let declared = {
                    let bytes = self
                        .part(&types_part)
                        .ok_or_else(|| Error::FileNotFound(types_part.clone()))?;
                    declare_styles_part(bytes)?
                };
                self.parts.insert(types_part, declared);
            }
        }
        Ok(())
    }
}

/// One painted row: the style each key cell must end up with, and which
/// of those cells have to be created first.
struct RowPaint {
    styles: [u32; KEY_COLUMNS],
    create: [bool; KEY_COLUMNS],
}

/// Everything the rewrite passes need to know, gathered in one scan.
///
/// New fills are one per distinct color, appended after the existing
/// ones. New cell formats are one per `(existing format, color)` pair so
/// painted cells keep their fonts, borders and number formats.
struct PaintPlan {
    base_fills: usize,
    base_xfs: usize,
    colors: Vec<Rgb>,
    color_ids: HashMap<Rgb, usize>,
    xf_clones: Vec<(u32, usize)>,
    clone_ids: HashMap<(u32, usize), usize>,
    rows: BTreeMap<u32, RowPaint>,
}

impl PaintPlan {
    fn new(table: &StyleTable) -> PaintPlan {
        PaintPlan {
            base_fills: table.fills.len(),
            base_xfs: table.xfs.len(),
            colors: Vec::new(),
            color_ids: HashMap::new(),
            xf_clones: Vec::new(),
            clone_ids: HashMap::new(),
            rows: BTreeMap::new(),
        }
    }

    fn add(&mut self, row: &KeyRow, color: Rgb) {
        let slot = match self.color_ids.get(&color) {
            Some(&slot) => slot,
            None => {
                let slot = self.colors.len();
                self.colors.push(color);
                self.color_ids.insert(color, slot);
                slot
            }
        };
        let mut styles = [0_u32; KEY_COLUMNS];
        let mut create = [false; KEY_COLUMNS];
        for col in 0..KEY_COLUMNS {
            let base = row.styles[col].unwrap_or(0);
            // dangling style ids degrade to the default format
            let base = if (base as usize) < self.base_xfs { base } else { 0 };
            let pair = (base, slot);
            let clone_id = match self.clone_ids.get(&pair) {
                Some(&id) => id,
                None => {
                    let id = self.xf_clones.len();
                    self.xf_clones.push(pair);
                    self.clone_ids.insert(pair, id);
                    id
                }
            };
            styles[col] = (self.base_xfs + clone_id) as u32;
            create[col] = !row.present[col];
        }
        self.rows.insert(row.row, RowPaint { styles, create });
    }

    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Rewrites the style sheet, appending one solid fill per color and one
/// cloned cell format per `(format, color)` pair, with section counts
/// raised to match. A sheet lacking the `fills` or `cellXfs` section
/// grows it, so planned style ids always have a record to land on.
/// Untouched events round trip as written.
fn rewrite_styles(original: &[u8], plan: &PaintPlan, table: &StyleTable) -> Result<Vec<u8>, Error> {
    let mut reader = XmlReader::from_reader(original);
    let mut writer = XmlWriter::new(Vec::with_capacity(original.len() + 256 * plan.colors.len()));
    let mut saw_fills = false;
    let mut saw_xfs = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"fills" => {
                saw_fills = true;
                writer.write_event(Event::Start(bump_count(e, plan.colors.len())?))?;
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"fills" => {
                write_new_fills(&mut writer, plan);
                writer.write_event(Event::End(e.to_owned()))?;
            }
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"fills" => {
                saw_fills = true;
                writer.write_event(Event::Start(bump_count(e, plan.colors.len())?))?;
                write_new_fills(&mut writer, plan);
                writer.write_event(Event::End(e.to_end().into_owned()))?;
            }
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"cellXfs" => {
                // fills precede cell formats in the schema
                if !saw_fills && table.fills.is_empty() {
                    write_fills_section(&mut writer, plan)?;
                    saw_fills = true;
                }
                saw_xfs = true;
                writer.write_event(Event::Start(bump_count(e, plan.xf_clones.len())?))?;
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"cellXfs" => {
                write_new_xfs(&mut writer, plan, table)?;
                writer.write_event(Event::End(e.to_owned()))?;
            }
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"cellXfs" => {
                if !saw_fills && table.fills.is_empty() {
                    write_fills_section(&mut writer, plan)?;
                    saw_fills = true;
                }
                saw_xfs = true;
                writer.write_event(Event::Start(bump_count(e, plan.xf_clones.len())?))?;
                write_new_xfs(&mut writer, plan, table)?;
                writer.write_event(Event::End(e.to_end().into_owned()))?;
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"styleSheet" => {
                if !saw_fills {
                    write_fills_section(&mut writer, plan)?;
                    saw_fills = true;
                }
                if !saw_xfs {
                    write_xfs_section(&mut writer, plan, table)?;
                    saw_xfs = true;
                }
                writer.write_event(Event::End(e.to_owned()))?;
            }
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"styleSheet" => {
                writer.write_event(Event::Start(e.to_owned()))?;
                write_fills_section(&mut writer, plan)?;
                write_xfs_section(&mut writer, plan, table)?;
                writer.write_event(Event::End(e.to_end().into_owned()))?;
                saw_fills = true;
                saw_xfs = true;
            }
            Ok(Event::Eof) => break,
            Ok(ev) => writer.write_event(ev.into_owned())?,
            Err(e) => return Err(Error::Xml(e)),
        }
        buf.clear();
    }
    Ok(writer.into_inner())
}

fn write_new_fills(writer: &mut XmlWriter<Vec<u8>>, plan: &PaintPlan) {
    for color in &plan.colors {
        let fill = format!(
            r#"<fill><patternFill patternType="solid"><fgColor rgb="FF{color}"/><bgColor rgb="FF{color}"/></patternFill></fill>"#
        );
        writer.get_mut().extend_from_slice(fill.as_bytes());
    }
}

fn write_new_xfs(
    writer: &mut XmlWriter<Vec<u8>>,
    plan: &PaintPlan,
    table: &StyleTable,
) -> Result<(), Error> {
    for &(base_id, slot) in &plan.xf_clones {
        let fill_id = plan.base_fills + slot;
        let base = table.xfs.get(base_id as usize);
        let mut tag = String::from("<xf");
        match base {
            Some(base) => {
                for (key, value) in &base.raw_attrs {
                    if key.as_slice() == b"fillId" || key.as_slice() == b"applyFill" {
                        continue;
                    }
                    let key = std::str::from_utf8(key)
                        .map_err(|_| Error::Unexpected("non UTF-8 attribute in style sheet"))?;
                    let value = std::str::from_utf8(value)
                        .map_err(|_| Error::Unexpected("non UTF-8 attribute in style sheet"))?;
                    tag.push(' ');
                    tag.push_str(key);
                    tag.push_str("=\"");
                    tag.push_str(value);
                    tag.push('"');
                }
            }
            None => tag.push_str(r#" numFmtId="0" fontId="0" borderId="0" xfId="0""#),
        }
        tag.push_str(&format!(" fillId=\"{fill_id}\" applyFill=\"1\""));
        match base {
            Some(base) if !base.inner.is_empty() => {
                tag.push('>');
                writer.get_mut().extend_from_slice(tag.as_bytes());
                writer.get_mut().extend_from_slice(&base.inner);
                writer.get_mut().extend_from_slice(b"</xf>");
            }
            _ => {
                tag.push_str("/>");
                writer.get_mut().extend_from_slice(tag.as_bytes());
            }
        }
    }
    Ok(())
}

/// Writes a whole `fills` section for sheets that had none.
fn write_fills_section(writer: &mut XmlWriter<Vec<u8>>, plan: &PaintPlan) -> Result<(), Error> {
    let mut start = BytesStart::new("fills");
    let count = (plan.base_fills + plan.colors.len()).to_string();
    start.push_attribute(("count", count.as_str()));
    writer.write_event(Event::Start(start))?;
    write_new_fills(writer, plan);
    writer.write_event(Event::End(BytesEnd::new("fills")))?;
    Ok(())
}

/// Writes a whole `cellXfs` section for sheets that had none.
fn write_xfs_section(
    writer: &mut XmlWriter<Vec<u8>>,
    plan: &PaintPlan,
    table: &StyleTable,
) -> Result<(), Error> {
    let mut start = BytesStart::new("cellXfs");
    let count = (plan.base_xfs + plan.xf_clones.len()).to_string();
    start.push_attribute(("count", count.as_str()));
    writer.write_event(Event::Start(start))?;
    write_new_xfs(writer, plan, table)?;
    writer.write_event(Event::End(BytesEnd::new("cellXfs")))?;
    Ok(())
}

/// Copy of a section start tag with its `count` attribute raised by `add`.
fn bump_count(e: &BytesStart<'_>, add: usize) -> Result<BytesStart<'static>, Error> {
    let name = String::from_utf8(e.name().as_ref().to_vec())
        .map_err(|_| Error::Unexpected("non UTF-8 element name"))?;
    let mut out = BytesStart::new(name);
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"count" {
            let count: u64 = atoi_simd::parse(&attr.value).unwrap_or(0);
            let bumped = (count + add as u64).to_string();
            out.push_attribute((b"count".as_slice(), bumped.as_bytes()));
        } else {
            out.push_attribute((attr.key.as_ref(), attr.value.as_ref()));
        }
    }
    Ok(out)
}

/// Adds the style sheet Override to a content types part, so consumers
/// acknowledge the part painting synthesized. A part that already
/// declares it round trips unchanged.
fn declare_styles_part(original: &[u8]) -> Result<Vec<u8>, Error> {
    let mut reader = XmlReader::from_reader(original);
    let mut writer = XmlWriter::new(Vec::with_capacity(original.len() + 128));
    let mut declared = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"Override" => {
                declared |= overrides_styles(e)?;
                writer.write_event(Event::Start(e.to_owned()))?;
            }
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"Override" => {
                declared |= overrides_styles(e)?;
                writer.write_event(Event::Empty(e.to_owned()))?;
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"Types" => {
                if !declared {
                    let mut over = BytesStart::new("Override");
                    over.push_attribute(("PartName", "/xl/styles.xml"));
                    over.push_attribute(("ContentType", STYLES_CONTENT_TYPE));
                    writer.write_event(Event::Empty(over))?;
                    declared = true;
                }
                writer.write_event(Event::End(e.to_owned()))?;
            }
            Ok(Event::Eof) => break,
            Ok(ev) => writer.write_event(ev.into_owned())?,
            Err(e) => return Err(Error::Xml(e)),
        }
        buf.clear();
    }
    Ok(writer.into_inner())
}

fn overrides_styles(e: &BytesStart<'_>) -> Result<bool, Error> {
    Ok(matches!(
        get_attribute(e.attributes(), QName(b"PartName"))?,
        Some(part) if part.eq_ignore_ascii_case(b"/xl/styles.xml")
    ))
}

/// Rewrites the worksheet, restyling the key cells of planned rows and
/// creating the ones the row does not have. Everything else round trips
/// as written.
fn rewrite_sheet(original: &[u8], plan: &PaintPlan) -> Result<Vec<u8>, Error> {
    let mut reader = XmlReader::from_reader(original);
    let mut writer = XmlWriter::new(Vec::with_capacity(original.len() + 64 * plan.rows.len()));
    let mut row_index = 0_u32;
    let mut col_index = 0_u32;
    let mut painting: Option<&RowPaint> = None;
    let mut pending: [Option<u32>; KEY_COLUMNS] = [None; KEY_COLUMNS];
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"row" => {
                if let Some(r) = get_attribute(e.attributes(), QName(b"r"))? {
                    row_index = get_row(r)?;
                }
                col_index = 0;
                painting = plan.rows.get(&row_index);
                pending = [None; KEY_COLUMNS];
                if let Some(paint) = painting {
                    for col in 0..KEY_COLUMNS {
                        if paint.create[col] {
                            pending[col] = Some(paint.styles[col]);
                        }
                    }
                }
                writer.write_event(Event::Start(e.to_owned()))?;
            }
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"row" => {
                // a self closing row has no cells and completes at once
                if let Some(r) = get_attribute(e.attributes(), QName(b"r"))? {
                    row_index = get_row(r)?;
                }
                writer.write_event(Event::Empty(e.to_owned()))?;
                row_index = row_index.saturating_add(1);
                col_index = 0;
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"row" => {
                if painting.is_some() {
                    flush_pending(&mut writer, row_index, &mut pending, KEY_COLUMNS as u32)?;
                }
                painting = None;
                row_index = row_index.saturating_add(1);
                col_index = 0;
                writer.write_event(Event::End(e.to_owned()))?;
            }
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"c" => {
                let col = next_cell_column(e, col_index)?;
                let restyled = plan_cell(&mut writer, painting, &mut pending, row_index, col)?;
                col_index = col.saturating_add(1);
                match restyled {
                    Some(style) => writer.write_event(Event::Start(restyled_cell(e, style)?))?,
                    None => writer.write_event(Event::Start(e.to_owned()))?,
                }
            }
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"c" => {
                let col = next_cell_column(e, col_index)?;
                let restyled = plan_cell(&mut writer, painting, &mut pending, row_index, col)?;
                col_index = col.saturating_add(1);
                match restyled {
                    Some(style) => writer.write_event(Event::Empty(restyled_cell(e, style)?))?,
                    None => writer.write_event(Event::Empty(e.to_owned()))?,
                }
            }
            Ok(Event::Eof) => break,
            Ok(ev) => writer.write_event(ev.into_owned())?,
            Err(e) => return Err(Error::Xml(e)),
        }
        buf.clear();
    }
    Ok(writer.into_inner())
}

/// Flushes creation cells owed before `col` and decides whether the cell
/// at `col` must change style. Returns the new style id if so.
fn plan_cell(
    writer: &mut XmlWriter<Vec<u8>>,
    painting: Option<&RowPaint>,
    pending: &mut [Option<u32>; KEY_COLUMNS],
    row: u32,
    col: u32,
) -> Result<Option<u32>, Error> {
    let Some(paint) = painting else {
        return Ok(None);
    };
    if (col as usize) < KEY_COLUMNS {
        flush_pending(writer, row, pending, col)?;
        Ok(Some(paint.styles[col as usize]))
    } else {
        flush_pending(writer, row, pending, KEY_COLUMNS as u32)?;
        Ok(None)
    }
}

/// Writes `<c r=".." s=".."/>` for still-missing key cells below `upto`,
/// keeping cells in column order.
fn flush_pending(
    writer: &mut XmlWriter<Vec<u8>>,
    row: u32,
    pending: &mut [Option<u32>; KEY_COLUMNS],
    upto: u32,
) -> Result<(), Error> {
    for col in 0..KEY_COLUMNS.min(upto as usize) {
        if let Some(style) = pending[col].take() {
            let mut cell = Vec::with_capacity(24);
            cell.extend_from_slice(b"<c r=\"");
            cell.extend_from_slice(&coordinate_to_name((row, col as u32))?);
            cell.extend_from_slice(format!("\" s=\"{style}\"/>").as_bytes());
            writer.get_mut().extend_from_slice(&cell);
        }
    }
    Ok(())
}

fn next_cell_column(e: &BytesStart<'_>, running: u32) -> Result<u32, Error> {
    match get_attribute(e.attributes(), QName(b"r"))? {
        Some(reference) => {
            let (_, col) = get_row_and_optional_column(reference)?;
            col.ok_or(Error::RangeWithoutColumnComponent)
        }
        None => Ok(running),
    }
}

/// Copy of a cell tag with its `s` attribute replaced.
fn restyled_cell(e: &BytesStart<'_>, style: u32) -> Result<BytesStart<'static>, Error> {
    let name = String::from_utf8(e.name().as_ref().to_vec())
        .map_err(|_| Error::Unexpected("non UTF-8 element name"))?;
    let mut out = BytesStart::new(name);
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() != b"s" {
            out.push_attribute((attr.key.as_ref(), attr.value.as_ref()));
        }
    }
    let style = style.to_string();
    out.push_attribute((b"s".as_slice(), style.as_bytes()));
    Ok(out)
}
