// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

/// How a cell is filled, reduced to what row coloring needs.
///
/// Anything that cannot yield a concrete color collapses to `None`: an
/// explicit `"none"` pattern, a pattern without a foreground color, or a
/// foreground expressed as an indexed or automatic color. `None` cells
/// never contribute to the color map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellFill {
    /// No fill, or nothing a row color can be derived from.
    None,
    /// A patterned fill with a usable foreground color.
    Solid(FillColor),
}

/// The foreground color carried by a solid fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillColor {
    /// Direct color, kept as the raw hex string stored in the file.
    Rgb(String),
    /// Position in the workbook theme palette.
    Theme(u32),
}

impl CellFill {
    /// Reduces a parsed `patternFill` to the model.
    ///
    /// `pattern` is the raw `patternType` attribute (`None` when absent).
    /// Any pattern other than `"none"` counts as filled when it carries a
    /// foreground color; the pattern shape itself is not retained.
    pub(crate) fn from_pattern(pattern: Option<&str>, foreground: Option<FillColor>) -> CellFill {
        match (pattern, foreground) {
            (Some("none"), _) => CellFill::None,
            (_, Some(color)) => CellFill::Solid(color),
            (_, None) => CellFill::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CellFill, FillColor};

    #[test]
    fn none_pattern_wins_over_foreground() {
        let fill = CellFill::from_pattern(Some("none"), Some(FillColor::Rgb("FFFF0000".into())));
        assert_eq!(fill, CellFill::None);
    }

    #[test]
    fn any_other_pattern_keeps_its_foreground() {
        for pattern in [Some("solid"), Some("lightGray"), None] {
            let fill = CellFill::from_pattern(pattern, Some(FillColor::Theme(4)));
            assert_eq!(fill, CellFill::Solid(FillColor::Theme(4)));
        }
    }

    #[test]
    fn missing_foreground_is_not_a_fill() {
        assert_eq!(CellFill::from_pattern(Some("solid"), None), CellFill::None);
        assert_eq!(CellFill::from_pattern(None, None), CellFill::None);
    }
}
