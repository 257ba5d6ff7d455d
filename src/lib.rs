// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

#![deny(missing_docs)]

//! A reader and painter for xlsx row background colors.
//!
//! `teinte` reads the per row background fill of every data row in one
//! workbook and paints it onto the matching rows of another. Rows match
//! when the cached values of their three leading columns are equal, the
//! first data row being row 2 (row 1 holds headers). Fills that name a
//! theme slot are resolved against the source workbook's theme before
//! matching.
//!
//! The target workbook is rewritten in place. Only the style sheet and
//! the painted worksheet change; every other archive part round trips
//! byte for byte.
//!
//! ```no_run
//! use teinte::apply_colors;
//!
//! # fn run() -> Result<(), teinte::Error> {
//! apply_colors("palette.xlsx", "Sheet1", "report.xlsx", "Sheet1")?;
//! # Ok(())
//! # }
//! ```
//!
//! Extraction alone returns the colors keyed by row:
//!
//! ```no_run
//! use teinte::{extract_colors, Rgb};
//!
//! # fn run() -> Result<(), teinte::Error> {
//! let colors = extract_colors("palette.xlsx", "Sheet1")?;
//! for (key, color) in &colors {
//!     match color {
//!         Some(Rgb { r, g, b }) => println!("{key:?} -> #{r:02X}{g:02X}{b:02X}"),
//!         None => println!("{key:?} -> unresolved"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod utils;

mod apply;
mod color;
mod datatype;
mod errors;
mod extract;
mod style;
mod theme;
mod xlsx;

use std::path::Path;

pub use crate::apply::apply_colors;
pub use crate::color::Rgb;
pub use crate::datatype::CellValue;
pub use crate::errors::Error;
pub use crate::extract::{extract_colors, ColorMap, RowKey, KEY_COLUMNS};
pub use crate::style::{CellFill, FillColor};
pub use crate::theme::{resolve_theme, ThemePalette};
pub use crate::xlsx::Xlsx;

/// Lists the worksheet names of a workbook, in workbook order.
pub fn sheet_names<P: AsRef<Path>>(path: P) -> Result<Vec<String>, Error> {
    Ok(Xlsx::open(path)?.sheet_names())
}
