// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Workbook theme palette extraction.
//!
//! The color scheme of `xl/theme/theme1.xml` defines the colors cells can
//! reference by position. The index space is positional: children of the
//! scheme are numbered in document order and only those carrying a direct
//! `srgbClr` value land in the table, so gaps are normal (the stock Office
//! scheme opens with two system-color slots that resolve to nothing).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::warn;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, QName, ResolveResult};
use quick_xml::NsReader;
use zip::ZipArchive;

use crate::errors::Error;
use crate::xlsx::get_attribute;

/// The DrawingML namespace theme parts live in.
const DRAWINGML_NS: &[u8] = b"http://schemas.openxmlformats.org/drawingml/2006/main";

const THEME_PART: &str = "xl/theme/theme1.xml";

/// Scheme position to hex color string table parsed from a workbook theme.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ThemePalette {
    colors: BTreeMap<u32, String>,
}

impl ThemePalette {
    /// Looks up the hex string recorded at a scheme position.
    pub fn get(&self, index: u32) -> Option<&str> {
        self.colors.get(&index).map(String::as_str)
    }

    /// Number of positions holding a direct RGB color.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether no position resolved to a direct RGB color.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Iterates `(position, hex)` pairs in position order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.colors.iter().map(|(&i, hex)| (i, hex.as_str()))
    }

    /// Parses a theme part.
    ///
    /// Only `themeElements/clrScheme` directly under the document root is
    /// considered, and only elements bound to the DrawingML namespace;
    /// look-alike names from other namespaces do not count. Every child
    /// of a scheme advances the position counter whether or not it yields
    /// a color, and a later scheme overwrites the positions of an earlier
    /// one. A truncated document yields the part parsed so far.
    pub fn from_xml(xml: &[u8]) -> Result<ThemePalette, Error> {
        enum Frame {
            Root,
            ThemeElements,
            Scheme,
            SchemeChild(u32),
            Other,
        }

        let mut reader = NsReader::from_reader(xml);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.trim_text(false);
        config.check_comments = false;
        config.expand_empty_elements = true;

        let mut colors = BTreeMap::new();
        let mut stack: Vec<Frame> = Vec::new();
        let mut position = 0_u32;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_resolved_event_into(&mut buf) {
                Ok((ns, Event::Start(ref e))) => {
                    let in_drawing_ns =
                        matches!(ns, ResolveResult::Bound(Namespace(n)) if n == DRAWINGML_NS);
                    let frame = match (stack.last(), e.local_name().as_ref()) {
                        (None, _) => Frame::Root,
                        (Some(Frame::Root), b"themeElements") if in_drawing_ns => {
                            Frame::ThemeElements
                        }
                        (Some(Frame::ThemeElements), b"clrScheme") if in_drawing_ns => {
                            position = 0;
                            Frame::Scheme
                        }
                        (Some(Frame::Scheme), _) => {
                            let slot = position;
                            position = position.saturating_add(1);
                            Frame::SchemeChild(slot)
                        }
                        (Some(Frame::SchemeChild(slot)), b"srgbClr") if in_drawing_ns => {
                            let slot = *slot;
                            if let Some(v) = get_attribute(e.attributes(), QName(b"val"))? {
                                let hex = reader.decoder().decode(v)?.into_owned();
                                colors.insert(slot, hex);
                            }
                            Frame::Other
                        }
                        _ => Frame::Other,
                    };
                    stack.push(frame);
                }
                Ok((_, Event::End(_))) => {
                    stack.pop();
                }
                Ok((_, Event::Eof)) => break,
                Err(e) => return Err(Error::Xml(e)),
                _ => (),
            }
        }
        Ok(ThemePalette { colors })
    }
}

/// Reads the theme palette of the workbook at `path`.
///
/// Every failure along the way is absorbed: an unreadable file, an
/// archive that is not a workbook or a broken theme part all yield `None`
/// with a warning in the log, never an error. `Some` with an empty
/// palette means the theme part exists but defines no direct RGB colors.
/// A workbook without a theme part yields `None` silently.
pub fn resolve_theme<P: AsRef<Path>>(path: P) -> Option<ThemePalette> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!("cannot open '{}': {e}", path.display());
            return None;
        }
    };
    let mut zip = match ZipArchive::new(BufReader::new(file)) {
        Ok(z) => z,
        Err(e) => {
            warn!("'{}' is not a readable workbook: {e}", path.display());
            return None;
        }
    };
    theme_from_zip(&mut zip)
}

/// Same as [`resolve_theme`] for an already opened archive.
pub(crate) fn theme_from_zip<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Option<ThemePalette> {
    let actual_path = zip
        .file_names()
        .find(|n| n.eq_ignore_ascii_case(THEME_PART))?
        .to_owned();
    let mut part = match zip.by_name(&actual_path) {
        Ok(p) => p,
        Err(e) => {
            warn!("cannot read theme part: {e}");
            return None;
        }
    };
    let mut bytes = Vec::with_capacity(part.size() as usize);
    if let Err(e) = part.read_to_end(&mut bytes) {
        warn!("cannot read theme part: {e}");
        return None;
    }
    match ThemePalette::from_xml(&bytes) {
        Ok(palette) => Some(palette),
        Err(e) => {
            warn!("ignoring malformed theme part: {e}");
            None
        }
    }
}
