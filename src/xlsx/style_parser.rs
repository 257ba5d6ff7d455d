// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Style sheet parsing, reduced to fills and the cell formats that
//! reference them.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;

use crate::errors::Error;
use crate::style::{CellFill, FillColor};

/// A cell format record from `cellXfs`.
///
/// Besides the resolved fill reference, the raw attributes and serialized
/// children are kept so the record can later be cloned into a variant
/// pointing at another fill without losing fonts, borders or alignment.
#[derive(Debug, Default, Clone)]
pub(crate) struct Xf {
    pub fill_id: u32,
    pub raw_attrs: Vec<(Vec<u8>, Vec<u8>)>,
    pub inner: Vec<u8>,
}

/// The fills and cell formats of one style sheet.
#[derive(Debug, Default, Clone)]
pub(crate) struct StyleTable {
    pub fills: Vec<CellFill>,
    pub xfs: Vec<Xf>,
}

impl StyleTable {
    /// Fill of every cell format, resolved in xf order.
    ///
    /// Dangling fill ids degrade to no fill rather than an error; files
    /// produced by sloppy writers reference fills they never define.
    pub fn resolved_fills(&self) -> Vec<CellFill> {
        self.xfs
            .iter()
            .map(|xf| {
                self.fills
                    .get(xf.fill_id as usize)
                    .cloned()
                    .unwrap_or(CellFill::None)
            })
            .collect()
    }
}

/// Parses a style sheet part.
///
/// Only the `fills` and `cellXfs` sections are read; `cellStyleXfs` and
/// `dxfs` hold look-alike records that must not land in the tables.
pub(crate) fn read_style_sheet<R: BufRead>(xml: &mut Reader<R>) -> Result<StyleTable, Error> {
    let mut table = StyleTable::default();
    let mut buf = Vec::with_capacity(1024);
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"styleSheet" | b"fills" | b"cellXfs" => (),
                b"fill" => {
                    let fill = parse_fill(xml)?;
                    table.fills.push(fill);
                }
                b"xf" => {
                    let xf = parse_xf(xml, e)?;
                    table.xfs.push(xf);
                }
                _ => {
                    let mut skip_buf = Vec::new();
                    xml.read_to_end_into(e.name(), &mut skip_buf)?;
                }
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"styleSheet" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => (),
        }
    }
    Ok(table)
}

/// Parses one `fill` element into the reduced model.
fn parse_fill<R: BufRead>(xml: &mut Reader<R>) -> Result<CellFill, Error> {
    let mut pattern: Option<String> = None;
    let mut foreground: Option<FillColor> = None;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"patternFill" => {
                    for attr in e.attributes() {
                        let attr = attr?;
                        if attr.key.as_ref() == b"patternType" {
                            pattern = Some(xml.decoder().decode(&attr.value)?.into_owned());
                        }
                    }
                }
                b"fgColor" => {
                    foreground = parse_fill_color(xml, e)?;
                }
                b"bgColor" => (),
                _ => {
                    // gradient fills and extensions carry no row color
                    let mut skip_buf = Vec::new();
                    xml.read_to_end_into(e.name(), &mut skip_buf)?;
                }
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"fill" => break,
            Ok(Event::Eof) => return Err(Error::XmlEof("fill")),
            Err(e) => return Err(Error::Xml(e)),
            _ => (),
        }
    }
    Ok(CellFill::from_pattern(pattern.as_deref(), foreground))
}

/// Reads a color element's attributes.
///
/// A direct `rgb` value wins over a `theme` reference; indexed and
/// automatic colors yield nothing. The hex string is kept as stored,
/// its validity is only judged when a color is actually decoded.
fn parse_fill_color<R: BufRead>(
    xml: &mut Reader<R>,
    e: &BytesStart<'_>,
) -> Result<Option<FillColor>, Error> {
    let mut rgb: Option<String> = None;
    let mut theme: Option<u32> = None;
    for attr in e.attributes() {
        let attr = attr?;
        match attr.key {
            QName(b"rgb") => {
                rgb = Some(xml.decoder().decode(&attr.value)?.into_owned());
            }
            QName(b"theme") => {
                if let Ok(t) = atoi_simd::parse::<u32>(&attr.value) {
                    theme = Some(t);
                }
            }
            _ => (),
        }
    }
    Ok(match (rgb, theme) {
        (Some(hex), _) => Some(FillColor::Rgb(hex)),
        (None, Some(t)) => Some(FillColor::Theme(t)),
        (None, None) => None,
    })
}

/// Captures one `cellXfs/xf` record.
fn parse_xf<R: BufRead>(xml: &mut Reader<R>, e: &BytesStart<'_>) -> Result<Xf, Error> {
    let mut xf = Xf::default();
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"fillId" {
            if let Ok(id) = atoi_simd::parse::<u32>(&attr.value) {
                xf.fill_id = id;
            }
        }
        xf.raw_attrs
            .push((attr.key.as_ref().to_vec(), attr.value.to_vec()));
    }
    // keep the children serialized for later cloning
    let mut writer = quick_xml::Writer::new(Vec::new());
    let mut depth = 0_usize;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(child)) => {
                depth += 1;
                writer.write_event(Event::Start(child.into_owned()))?;
            }
            Ok(Event::End(child)) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                writer.write_event(Event::End(child.into_owned()))?;
            }
            Ok(Event::Eof) => return Err(Error::XmlEof("xf")),
            Ok(ev) => writer.write_event(ev.into_owned())?,
            Err(e) => return Err(Error::Xml(e)),
        }
    }
    xf.inner = writer.into_inner();
    Ok(xf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xlsx::xml_reader_from_bytes;

    const STYLES: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
  <fills count="5">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FFFF0000"/><bgColor indexed="64"/></patternFill></fill>
    <fill><patternFill patternType="solid"><fgColor theme="4"/><bgColor indexed="64"/></patternFill></fill>
    <fill><patternFill patternType="solid"><fgColor indexed="12"/></patternFill></fill>
  </fills>
  <borders count="1"><border/></borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="0" fillId="2" borderId="0" xfId="0" applyFill="1"/>
    <xf numFmtId="14" fontId="0" fillId="3" borderId="0" xfId="0" applyFill="1" applyAlignment="1">
      <alignment horizontal="center"/>
    </xf>
  </cellXfs>
  <dxfs count="1"><dxf><fill><patternFill patternType="solid"><fgColor rgb="FF00FF00"/></patternFill></fill></dxf></dxfs>
</styleSheet>"#;

    fn parsed() -> StyleTable {
        let mut xml = xml_reader_from_bytes(STYLES);
        read_style_sheet(&mut xml).unwrap()
    }

    #[test]
    fn fills_reduce_to_the_model() {
        let table = parsed();
        assert_eq!(table.fills.len(), 5);
        assert_eq!(table.fills[0], CellFill::None);
        assert_eq!(table.fills[1], CellFill::None);
        assert_eq!(
            table.fills[2],
            CellFill::Solid(FillColor::Rgb("FFFF0000".into()))
        );
        assert_eq!(table.fills[3], CellFill::Solid(FillColor::Theme(4)));
        assert_eq!(table.fills[4], CellFill::None);
    }

    #[test]
    fn gray125_has_no_foreground_hence_no_color() {
        // slot 1 is the stock gray125 fill every Excel file carries
        assert_eq!(parsed().fills[1], CellFill::None);
    }

    #[test]
    fn only_cell_xfs_records_are_captured() {
        let table = parsed();
        assert_eq!(table.xfs.len(), 3);
        assert_eq!(table.xfs[0].fill_id, 0);
        assert_eq!(table.xfs[1].fill_id, 2);
        assert_eq!(table.xfs[2].fill_id, 3);
    }

    #[test]
    fn dxf_fills_do_not_leak_into_the_table() {
        let table = parsed();
        assert!(!table
            .fills
            .iter()
            .any(|f| *f == CellFill::Solid(FillColor::Rgb("FF00FF00".into()))));
    }

    #[test]
    fn resolution_follows_the_xf_fill_chain() {
        let table = parsed();
        let fills = table.resolved_fills();
        assert_eq!(fills.len(), 3);
        assert_eq!(fills[0], CellFill::None);
        assert_eq!(
            fills[1],
            CellFill::Solid(FillColor::Rgb("FFFF0000".into()))
        );
        assert_eq!(fills[2], CellFill::Solid(FillColor::Theme(4)));
    }

    #[test]
    fn dangling_fill_ids_degrade_to_no_fill() {
        let doc = br#"<styleSheet><fills count="1"><fill><patternFill patternType="none"/></fill></fills><cellXfs count="1"><xf numFmtId="0" fillId="42"/></cellXfs></styleSheet>"#;
        let mut xml = xml_reader_from_bytes(doc);
        let table = read_style_sheet(&mut xml).unwrap();
        assert_eq!(table.resolved_fills(), [CellFill::None]);
    }

    #[test]
    fn xf_capture_keeps_attributes_and_children() {
        let table = parsed();
        let keys: Vec<&[u8]> = table.xfs[2]
            .raw_attrs
            .iter()
            .map(|(k, _)| k.as_slice())
            .collect();
        assert!(keys.contains(&b"numFmtId".as_slice()));
        assert!(keys.contains(&b"applyAlignment".as_slice()));
        let inner = String::from_utf8(table.xfs[2].inner.clone()).unwrap();
        assert!(inner.contains("alignment"));
        assert!(inner.contains("center"));
        assert!(table.xfs[0].inner.is_empty());
    }

    #[test]
    fn empty_style_sheet_parses_to_empty_tables() {
        let mut xml = xml_reader_from_bytes(b"<styleSheet/>");
        let table = read_style_sheet(&mut xml).unwrap();
        assert!(table.fills.is_empty());
        assert!(table.xfs.is_empty());
        assert!(table.resolved_fills().is_empty());
    }
}
