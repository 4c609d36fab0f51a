//! Text measurement for label placement and flip offsets.

use glam::{DVec2, dvec2};

/// Style parameters that affect measured size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels (cap height plus descent)
    pub font_size: f64,
    /// Line advance as a multiple of the font size
    pub line_height: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: crate::render::defaults::LABEL_FONT_SIZE,
            line_height: 1.2,
        }
    }
}

pub trait TextMetrics: Send + Sync {
    /// Width and height of `text` in pixels. Lines are split on `\n`.
    fn measure(&self, text: &str, style: &TextStyle) -> DVec2;
}

/// Proportional character widths in hundredths of an em-ish unit, indexed
/// from `' '` (0x20) to `'~'` (0x7e).
#[rustfmt::skip]
pub const AW_CHAR: [u8; 95] = [
    45,  55,  62, 115,  90, 132, 125,  40,
    55,  55,  71, 115,  45,  48,  45,  50,
    91,  91,  91,  91,  91,  91,  91,  91,
    91,  91,  50,  50, 120, 120, 120,  78,
   142, 102, 105, 110, 115, 105,  98, 105,
   125,  58,  58, 107,  95, 145, 125, 115,
    95, 115, 107,  95,  97, 118, 102, 150,
   100,  93, 100,  58,  50,  58, 119,  72,
    72,  86,  92,  80,  92,  85,  52,  92,
    92,  47,  47,  88,  48, 135,  92,  86,
    92,  92,  69,  75,  58,  92,  80, 121,
    81,  80,  76,  91,  49,  91, 118,
];

/// Character width relative to font size for a width entry of 100
const CHAR_WIDTH_RATIO: f64 = 0.08 / 0.14;

/// Sum of proportional widths for one line
pub fn text_length(text: &str) -> u32 {
    text.chars()
        .map(|c| {
            if (' '..='~').contains(&c) {
                AW_CHAR[(c as usize) - 0x20] as u32
            } else {
                100
            }
        })
        .sum()
}

/// Width table based metrics; no font files involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProportionalMetrics;

impl TextMetrics for ProportionalMetrics {
    fn measure(&self, text: &str, style: &TextStyle) -> DVec2 {
        if text.is_empty() {
            return DVec2::ZERO;
        }
        let lines: Vec<&str> = text.split('\n').collect();
        let widest = lines.iter().map(|l| text_length(l)).max().unwrap_or(0);
        let width = widest as f64 * 0.01 * style.font_size * CHAR_WIDTH_RATIO;
        let height = style.font_size
            + (lines.len() as f64 - 1.0) * style.font_size * style.line_height;
        dvec2(width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proportional_lengths() {
        assert_eq!(text_length("i"), 47);
        assert_eq!(text_length("W"), 150);
        assert_eq!(text_length("PL"), 95 + 95);
        assert_eq!(text_length("é"), 100);
    }

    #[test]
    fn measures_single_line() {
        let style = TextStyle {
            font_size: 14.0,
            line_height: 1.2,
        };
        let size = ProportionalMetrics.measure("PL", &style);
        assert!((size.x - 190.0 * 0.01 * 14.0 * CHAR_WIDTH_RATIO).abs() < 1e-12);
        assert_eq!(size.y, 14.0);
    }

    #[test]
    fn measures_widest_of_several_lines() {
        let style = TextStyle {
            font_size: 10.0,
            line_height: 1.5,
        };
        let one = ProportionalMetrics.measure("MAX ALT: 5000", &style);
        let two = ProportionalMetrics.measure("MIN\nMAX ALT: 5000", &style);
        assert_eq!(one.x, two.x);
        assert_eq!(two.y, 25.0);
        assert_eq!(ProportionalMetrics.measure("", &style), DVec2::ZERO);
    }
}
