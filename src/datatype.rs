// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A cached cell value as stored in a worksheet part.
///
/// Values are read as stored: numbers stay raw `f64` serials even when a
/// number format would display them as dates, and formula cells yield
/// their cached result. Equality and hashing of `Float` go through the
/// raw bit pattern so values can serve as lookup keys; as a consequence
/// `1.0` and `"1"` are distinct, and a NaN equals itself.
#[derive(Debug, Clone, Default)]
pub enum CellValue {
    /// No stored value.
    #[default]
    Empty,
    /// Shared, inline or formula-cached string.
    String(String),
    /// Number, including date and time serials.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Error literal such as `#DIV/0!`, kept as its display text.
    Error(String),
}

impl CellValue {
    /// A key field is absent when the cell holds nothing or an empty string.
    pub fn is_absent(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => true,
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => a.to_bits() == b.to_bits(),
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::Error(a), CellValue::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            CellValue::Empty => {}
            CellValue::String(s) => s.hash(state),
            CellValue::Float(v) => v.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Error(e) => e.hash(state),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Error(e) => write!(f, "{e}"),
        }
    }
}
