// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Streaming scanner over the key columns of a worksheet part.

use std::io::BufRead;

use log::warn;
use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader as XmlReader;

use crate::datatype::CellValue;
use crate::errors::Error;
use crate::extract::KEY_COLUMNS;
use crate::utils::push_entity;
use crate::xlsx::{get_attribute, get_row, get_row_and_optional_column, read_string};

/// The key-relevant slice of one worksheet row.
#[derive(Debug, Clone, Default)]
pub(crate) struct KeyRow {
    /// 0-based row index.
    pub row: u32,
    /// Cached values of the key columns.
    pub values: [CellValue; KEY_COLUMNS],
    /// Style ids (`s` attributes) of the key columns.
    pub styles: [Option<u32>; KEY_COLUMNS],
    /// Which of the key cells exist in the file.
    pub present: [bool; KEY_COLUMNS],
}

impl KeyRow {
    fn new(row: u32) -> Self {
        KeyRow {
            row,
            ..Default::default()
        }
    }
}

/// Streams `<row>` records out of a worksheet part.
///
/// Only the first [`KEY_COLUMNS`] cells of each row are materialized;
/// everything to their right is skipped over without decoding.
pub(crate) struct RowScanner<'a, R: BufRead> {
    xml: XmlReader<R>,
    strings: &'a [String],
    row_index: u32,
    col_index: u32,
    done: bool,
    buf: Vec<u8>,
    cell_buf: Vec<u8>,
}

impl<'a, R: BufRead> RowScanner<'a, R> {
    /// Positions the scanner at the start of `sheetData`.
    ///
    /// A part without `sheetData` (a chartsheet for instance) yields no
    /// rows at all.
    pub(crate) fn new(mut xml: XmlReader<R>, strings: &'a [String]) -> Result<Self, Error> {
        let mut buf = Vec::with_capacity(1024);
        let mut done = false;
        loop {
            buf.clear();
            match xml.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"sheetData" => break,
                Ok(Event::Eof) => {
                    done = true;
                    break;
                }
                Err(e) => return Err(Error::Xml(e)),
                _ => (),
            }
        }
        Ok(RowScanner {
            xml,
            strings,
            row_index: 0,
            col_index: 0,
            done,
            buf,
            cell_buf: Vec::with_capacity(1024),
        })
    }

    /// Next row of the sheet, `None` once `sheetData` is exhausted.
    pub(crate) fn next_row(&mut self) -> Result<Option<KeyRow>, Error> {
        if self.done {
            return Ok(None);
        }
        let mut current: Option<KeyRow> = None;
        loop {
            self.buf.clear();
            match self.xml.read_event_into(&mut self.buf) {
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"row" => {
                    if let Some(range) = get_attribute(e.attributes(), QName(b"r"))? {
                        self.row_index = get_row(range)?;
                    }
                    self.col_index = 0;
                    current = Some(KeyRow::new(self.row_index));
                }
                Ok(Event::End(ref e)) if e.local_name().as_ref() == b"row" => {
                    self.row_index = self.row_index.saturating_add(1);
                    self.col_index = 0;
                    if let Some(row) = current.take() {
                        return Ok(Some(row));
                    }
                }
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"c" => {
                    let mut col = self.col_index;
                    let mut style: Option<u32> = None;
                    let mut type_attr: Option<Vec<u8>> = None;
                    for a in e.attributes() {
                        let a = a?;
                        match a.key {
                            QName(b"r") => {
                                let (_, c) = get_row_and_optional_column(&a.value)?;
                                col = c.ok_or(Error::RangeWithoutColumnComponent)?;
                            }
                            QName(b"s") => {
                                if let Ok(s) = atoi_simd::parse::<u32>(&a.value) {
                                    style = Some(s);
                                }
                            }
                            QName(b"t") => type_attr = Some(a.value.to_vec()),
                            _ => (),
                        }
                    }
                    let value = if (col as usize) < KEY_COLUMNS {
                        read_cell_value(
                            &mut self.xml,
                            self.strings,
                            type_attr.as_deref(),
                            &mut self.cell_buf,
                        )?
                    } else {
                        skip_cell(&mut self.xml, &mut self.cell_buf)?;
                        CellValue::Empty
                    };
                    self.col_index = col.saturating_add(1);
                    if let Some(rec) = current.as_mut() {
                        if (col as usize) < KEY_COLUMNS {
                            rec.present[col as usize] = true;
                            rec.styles[col as usize] = style;
                            rec.values[col as usize] = value;
                        }
                    }
                }
                Ok(Event::End(ref e)) if e.local_name().as_ref() == b"sheetData" => {
                    self.done = true;
                    return Ok(current.take());
                }
                Ok(Event::Eof) => return Err(Error::XmlEof("sheetData")),
                Err(e) => return Err(Error::Xml(e)),
                _ => (),
            }
        }
    }
}

/// Reads the content of one `<c>` element up to its closing tag.
fn read_cell_value<R: BufRead>(
    xml: &mut XmlReader<R>,
    strings: &[String],
    type_attr: Option<&[u8]>,
    cell_buf: &mut Vec<u8>,
) -> Result<CellValue, Error> {
    let mut value = CellValue::Empty;
    loop {
        cell_buf.clear();
        match xml.read_event_into(cell_buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"is" => {
                value = read_string(xml, e.name())?.map_or(CellValue::Empty, CellValue::String);
            }
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"v" => {
                let mut v_buf = Vec::with_capacity(512);
                let mut text = String::new();
                loop {
                    v_buf.clear();
                    match xml.read_event_into(&mut v_buf)? {
                        Event::Text(t) => text.push_str(&t.xml10_content()?),
                        Event::GeneralRef(r) => push_entity(&r, &mut text)?,
                        Event::End(end) if end.name() == e.name() => break,
                        Event::Eof => return Err(Error::XmlEof("v")),
                        _ => (),
                    }
                }
                value = convert_value(&text, type_attr, strings)?;
            }
            Ok(Event::Start(ref e)) => {
                // formulas and extensions are irrelevant, only the cached
                // value matters
                let mut skip_buf = Vec::new();
                xml.read_to_end_into(e.name(), &mut skip_buf)?;
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"c" => break,
            Ok(Event::Eof) => return Err(Error::XmlEof("c")),
            Err(e) => return Err(Error::Xml(e)),
            _ => (),
        }
    }
    Ok(value)
}

/// Consumes a `<c>` element without decoding anything.
fn skip_cell<R: BufRead>(xml: &mut XmlReader<R>, cell_buf: &mut Vec<u8>) -> Result<(), Error> {
    loop {
        cell_buf.clear();
        match xml.read_event_into(cell_buf) {
            Ok(Event::Start(ref e)) => {
                let mut skip_buf = Vec::new();
                xml.read_to_end_into(e.name(), &mut skip_buf)?;
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"c" => break,
            Ok(Event::Eof) => return Err(Error::XmlEof("c")),
            Err(e) => return Err(Error::Xml(e)),
            _ => (),
        }
    }
    Ok(())
}

/// Interprets a `<v>` text according to the cell's `t` attribute.
fn convert_value(v: &str, type_attr: Option<&[u8]>, strings: &[String]) -> Result<CellValue, Error> {
    let value = match type_attr {
        Some(b"s") => {
            if v.is_empty() {
                CellValue::Empty
            } else {
                let index: usize = atoi_simd::parse(v.as_bytes())
                    .map_err(|_| Error::Unexpected("invalid shared string index"))?;
                let s = strings
                    .get(index)
                    .ok_or(Error::Unexpected("shared string index out of bounds"))?;
                CellValue::String(s.clone())
            }
        }
        Some(b"b") => CellValue::Bool(v != "0"),
        Some(b"e") => CellValue::Error(v.to_string()),
        Some(b"str") | Some(b"d") | Some(b"inlineStr") => CellValue::String(v.to_string()),
        Some(b"n") | None => {
            if v.is_empty() {
                CellValue::Empty
            } else {
                fast_float2::parse::<f64, _>(v)
                    .map(CellValue::Float)
                    .unwrap_or_else(|_| CellValue::String(v.to_string()))
            }
        }
        Some(unknown) => {
            warn!(
                "unknown cell type '{}', value ignored",
                String::from_utf8_lossy(unknown)
            );
            CellValue::Empty
        }
    };
    Ok(value)
}
