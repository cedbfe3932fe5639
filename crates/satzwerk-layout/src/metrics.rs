// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text width measurement used for automatic column widths.

/// Measures rendered text width in points.
pub trait TextMeasure: Send + Sync {
    fn text_width(&self, text: &str, font_name: &str, font_size: f32) -> f32;
}

/// Width of an unknown glyph, per 1000 em.
const FALLBACK_WIDTH: u16 = 556;

/// Every Courier glyph is this wide, per 1000 em.
const COURIER_WIDTH: u16 = 600;

/// Helvetica advance widths for ASCII 32..=126, per 1000 em (AFM).
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

/// Built-in metrics for the base-14 families.
///
/// Courier faces are monospaced; every other family is measured with the
/// Helvetica table. Non-ASCII characters use an average glyph width.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinMetrics;

impl BuiltinMetrics {
    fn glyph_width(ch: char, monospace: bool) -> u16 {
        if monospace {
            return COURIER_WIDTH;
        }
        match ch as u32 {
            code @ 32..=126 => HELVETICA_WIDTHS[(code - 32) as usize],
            _ => FALLBACK_WIDTH,
        }
    }
}

impl TextMeasure for BuiltinMetrics {
    fn text_width(&self, text: &str, font_name: &str, font_size: f32) -> f32 {
        let monospace = font_name.to_ascii_lowercase().starts_with("courier");
        let units: u32 = text
            .chars()
            .map(|ch| u32::from(Self::glyph_width(ch, monospace)))
            .sum();
        units as f32 * font_size / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_widths() {
        let m = BuiltinMetrics;
        assert_eq!(m.text_width("", "Helvetica", 10.0), 0.0);
        // T=611 i=222 c=500 k=500 e=556 r=333
        let expected = (611 + 222 + 500 + 500 + 556 + 333) as f32 * 10.0 / 1000.0;
        assert!((m.text_width("Ticker", "Helvetica-Bold", 10.0) - expected).abs() < 1e-4);
    }

    #[test]
    fn courier_is_monospaced() {
        let m = BuiltinMetrics;
        assert_eq!(
            m.text_width("iiii", "Courier", 10.0),
            m.text_width("WWWW", "Courier-Bold", 10.0)
        );
        assert!((m.text_width("abc", "Courier", 12.0) - 21.6).abs() < 1e-4);
    }

    #[test]
    fn digits_share_a_width() {
        let m = BuiltinMetrics;
        assert_eq!(
            m.text_width("1111", "Helvetica", 10.0),
            m.text_width("8888", "Helvetica", 10.0)
        );
        assert!(m.text_width("€", "Helvetica", 10.0) > 0.0);
    }

    #[test]
    fn table_covers_printable_ascii() {
        assert_eq!(HELVETICA_WIDTHS.len(), ('~' as usize) - (' ' as usize) + 1);
        assert_eq!(HELVETICA_WIDTHS[('A' as usize) - 32], 667);
        assert_eq!(HELVETICA_WIDTHS[('~' as usize) - 32], 584);
    }
}
