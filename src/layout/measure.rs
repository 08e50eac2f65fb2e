//! Label text metrics.

/// Measures the rendered width of a label, in pixels.
pub trait TextMeasure {
    fn text_width(&self, text: &str) -> f64;
}

/// Advance widths for printable ASCII (0x20..=0x7E) in a Helvetica-like
/// sans-serif face, in thousandths of an em.
const ADVANCES: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333,
    500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

/// Used for characters outside the table.
const FALLBACK_ADVANCE: u16 = 556;

/// Approximate sans-serif metrics without a font rasterizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproxTextMeasure {
    font_size: f64,
}

impl ApproxTextMeasure {
    pub fn new(font_size: f64) -> Self {
        Self { font_size }
    }

    fn advance(c: char) -> u16 {
        match c as u32 {
            code @ 0x20..=0x7E => ADVANCES[(code - 0x20) as usize],
            _ => FALLBACK_ADVANCE,
        }
    }
}

impl Default for ApproxTextMeasure {
    fn default() -> Self {
        Self::new(12.0)
    }
}

impl TextMeasure for ApproxTextMeasure {
    fn text_width(&self, text: &str) -> f64 {
        let units: u32 = text.chars().map(|c| u32::from(Self::advance(c))).sum();
        f64::from(units) / 1000.0 * self.font_size
    }
}
