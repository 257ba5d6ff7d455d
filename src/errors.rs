// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

use std::fmt;

/// All the ways reading or rewriting a workbook can fail.
#[derive(Debug)]
pub enum Error {
    /// Io error
    Io(std::io::Error),
    /// Zip error
    Zip(zip::result::ZipError),
    /// Xml error
    Xml(quick_xml::Error),
    /// Xml attribute error
    XmlAttr(quick_xml::events::attributes::AttrError),
    /// Xml encoding error
    Encoding(quick_xml::encoding::EncodingError),
    /// Unexpected end of xml
    XmlEof(&'static str),
    /// Archive entry expected but missing
    FileNotFound(String),
    /// Relationship not found
    RelationshipNotFound,
    /// Expecting alphanumeric character
    Alphanumeric(u8),
    /// Numeric column
    NumericColumn(u8),
    /// There is no row component in the reference
    RangeWithoutRowComponent,
    /// There is no column component in the reference
    RangeWithoutColumnComponent,
    /// Worksheet not found
    WorksheetNotFound(String),
    /// Unexpected error
    Unexpected(&'static str),
}

from_err!(std::io::Error, Error, Io);
from_err!(zip::result::ZipError, Error, Zip);
from_err!(quick_xml::Error, Error, Xml);
from_err!(quick_xml::events::attributes::AttrError, Error, XmlAttr);
from_err!(quick_xml::encoding::EncodingError, Error, Encoding);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Zip(e) => write!(f, "Zip error: {e}"),
            Error::Xml(e) => write!(f, "Xml error: {e}"),
            Error::XmlAttr(e) => write!(f, "Xml attribute error: {e}"),
            Error::Encoding(e) => write!(f, "Encoding error: {e}"),
            Error::XmlEof(e) => write!(f, "Unexpected end of xml, expecting '</{e}>'"),
            Error::FileNotFound(file) => write!(f, "File not found: '{file}'"),
            Error::RelationshipNotFound => write!(f, "Relationship not found"),
            Error::Alphanumeric(e) => write!(f, "Expecting alphanumeric character, got {e:X}"),
            Error::NumericColumn(e) => {
                write!(f, "Numeric character is not allowed for column name, got {e}")
            }
            Error::RangeWithoutRowComponent => {
                write!(f, "Invalid reference: no row component")
            }
            Error::RangeWithoutColumnComponent => {
                write!(f, "Invalid reference: no column component")
            }
            Error::WorksheetNotFound(name) => write!(f, "Worksheet '{name}' not found"),
            Error::Unexpected(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Zip(e) => Some(e),
            Error::Xml(e) => Some(e),
            Error::XmlAttr(e) => Some(e),
            Error::Encoding(e) => Some(e),
            _ => None,
        }
    }
}
