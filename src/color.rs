// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

use std::fmt;

/// A resolved cell color as three 8-bit channels.
///
/// Colors travel through xlsx parts as `"RRGGBB"` or `"AARRGGBB"` hex
/// strings; [`Rgb::parse`] accepts both forms and drops the alpha prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

impl Rgb {
    /// Create a color from its three channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Decodes a 6 or 8 character hex color string.
    ///
    /// An 8 character string loses its first two characters before
    /// decoding; the prefix is ignored, not validated, so `"FF12AB56"`
    /// and `"0012AB56"` decode to the same color. Any other length or a
    /// non-hex digit yields `None`.
    pub fn parse(hex: &str) -> Option<Rgb> {
        let hex = if hex.len() == 8 { hex.get(2..)? } else { hex };
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
        Some(Rgb { r, g, b })
    }
}

impl fmt::Display for Rgb {
    /// Renders the canonical 6 character uppercase hex form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::Rgb;
    use rstest::rstest;

    #[rstest]
    #[case("FF0000", Some(Rgb::new(255, 0, 0)))]
    #[case("00ff00", Some(Rgb::new(0, 255, 0)))]
    #[case("FF12AB56", Some(Rgb::new(0x12, 0xAB, 0x56)))]
    #[case("0012AB56", Some(Rgb::new(0x12, 0xAB, 0x56)))]
    #[case("12345", None)]
    #[case("1234567", None)]
    #[case("123456789", None)]
    #[case("GGGGGG", None)]
    #[case("", None)]
    fn parse_cases(#[case] hex: &str, #[case] expected: Option<Rgb>) {
        assert_eq!(Rgb::parse(hex), expected);
    }

    #[test]
    fn alpha_prefix_is_dropped_not_validated() {
        assert_eq!(Rgb::parse("ZZ12AB56"), Rgb::parse("12AB56"));
    }

    #[test]
    fn multibyte_input_is_rejected_without_panicking() {
        assert_eq!(Rgb::parse("€€ab"), None);
        assert_eq!(Rgb::parse("ééé"), None);
        assert_eq!(Rgb::parse("é2AB56"), None);
    }

    #[test]
    fn display_is_uppercase_and_zero_padded() {
        assert_eq!(Rgb::new(0xFF, 0x00, 0xAA).to_string(), "FF00AA");
        assert_eq!(Rgb::new(1, 2, 3).to_string(), "010203");
    }

    #[test]
    fn display_round_trips_through_parse() {
        let color = Rgb::new(0x4F, 0x81, 0xBD);
        assert_eq!(Rgb::parse(&color.to_string()), Some(color));
    }
}
