// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Internal macros and small helpers shared across modules.

use crate::errors::Error;

macro_rules! from_err {
    ($from:ty, $to:tt, $var:tt) => {
        impl From<$from> for $to {
            fn from(e: $from) -> $to {
                $to::$var(e)
            }
        }
    };
}

/// Appends the replacement text of a general entity reference to `out`.
///
/// Handles decimal and hexadecimal character references and the five
/// predefined XML entities. Anything else has no known replacement in
/// spreadsheet parts and is reported as an error.
pub(crate) fn push_entity(raw: &[u8], out: &mut String) -> Result<(), Error> {
    if let Some(code) = raw.strip_prefix(b"#") {
        let code_point = match code.strip_prefix(b"x").or_else(|| code.strip_prefix(b"X")) {
            Some(hex) => std::str::from_utf8(hex)
                .ok()
                .and_then(|h| u32::from_str_radix(h, 16).ok()),
            None => atoi_simd::parse::<u32>(code).ok(),
        };
        match code_point.and_then(char::from_u32) {
            Some(c) => out.push(c),
            None => return Err(Error::Unexpected("invalid character reference")),
        }
    } else {
        let name = std::str::from_utf8(raw)
            .map_err(|_| Error::Unexpected("non UTF-8 entity reference"))?;
        match quick_xml::escape::resolve_predefined_entity(name) {
            Some(text) => out.push_str(text),
            None => return Err(Error::Unexpected("unknown entity reference")),
        }
    }
    Ok(())
}
