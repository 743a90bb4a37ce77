//! # Font Measurement
//!
//! The engine draws with the standard PDF Helvetica family, which ships with
//! every PDF viewer and needs no embedding. All the layout code requires from
//! a font is advance widths — line breaking and title centering are width
//! arithmetic, nothing more.

mod metrics;

/// The standard fonts the report engine draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
}

impl StandardFont {
    /// The PDF BaseFont name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
        }
    }

    fn is_bold(&self) -> bool {
        matches!(self, Self::HelveticaBold)
    }
}

/// Shared measurement context used by the layout engine and the box renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontContext;

impl FontContext {
    pub fn new() -> Self {
        Self
    }

    /// Advance width of a single character in points.
    pub fn char_width(&self, ch: char, font: StandardFont, font_size: f64) -> f64 {
        metrics::advance_millis(ch, font.is_bold()) as f64 / 1000.0 * font_size
    }

    /// Width of a string in points.
    pub fn measure_string(&self, text: &str, font: StandardFont, font_size: f64) -> f64 {
        text.chars()
            .map(|ch| self.char_width(ch, font, font_size))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_width_space() {
        let ctx = FontContext::new();
        let w = ctx.char_width(' ', StandardFont::Helvetica, 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_bold_wider_than_regular() {
        let ctx = FontContext::new();
        let regular = ctx.char_width('A', StandardFont::Helvetica, 12.0);
        let bold = ctx.char_width('A', StandardFont::HelveticaBold, 12.0);
        assert!(bold > regular, "Bold A should be wider than regular A");
    }

    #[test]
    fn test_oblique_shares_upright_widths() {
        let ctx = FontContext::new();
        let upright = ctx.char_width('A', StandardFont::Helvetica, 12.0);
        let oblique = ctx.char_width('A', StandardFont::HelveticaOblique, 12.0);
        assert!((upright - oblique).abs() < f64::EPSILON);
    }

    #[test]
    fn test_measure_string() {
        let ctx = FontContext::new();
        let w = ctx.measure_string("Hello", StandardFont::Helvetica, 12.0);
        assert!(w > 0.0);
        let wider = ctx.measure_string("Hello!", StandardFont::Helvetica, 12.0);
        assert!(wider > w);
    }
}
