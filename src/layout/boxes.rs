//! # Box Renderer
//!
//! Draws one titled, bordered element box at a rectangle the engine has
//! already chosen: a filled title bar, a hairline border around bar plus
//! body, and either an embedded chart image or wrapped text lines inside.
//!
//! All element-level failure handling lives here. Empty chart bytes and
//! undecodable images both degrade to a centered placeholder message — a
//! single bad chart must never abort report generation.

use crate::canvas::{Canvas, Color};
use crate::font::{FontContext, StandardFont};
use crate::model::{ElementBody, Rect, TEXT_FONT_SIZE, TEXT_LINE_HEIGHT};
use crate::text;

pub(crate) const TITLE_BAR_BG: Color = Color {
    r: 236.0 / 255.0,
    g: 240.0 / 255.0,
    b: 241.0 / 255.0,
};
pub(crate) const TITLE_INK: Color = Color {
    r: 52.0 / 255.0,
    g: 73.0 / 255.0,
    b: 94.0 / 255.0,
};
pub(crate) const BORDER_GRAY: Color = Color {
    r: 189.0 / 255.0,
    g: 195.0 / 255.0,
    b: 199.0 / 255.0,
};

const TITLE_FONT_SIZE: f64 = 11.0;
const IMAGE_INSET: f64 = 5.0;
const TEXT_INSET: f64 = 10.0;

/// Draws titled element boxes onto a canvas.
pub struct BoxRenderer<'a, C: Canvas> {
    canvas: &'a mut C,
    fonts: &'a FontContext,
    title_bar_height: f64,
}

impl<'a, C: Canvas> BoxRenderer<'a, C> {
    pub fn new(canvas: &'a mut C, fonts: &'a FontContext, title_bar_height: f64) -> Self {
        Self {
            canvas,
            fonts,
            title_bar_height,
        }
    }

    /// Draw the complete box. `rect.y` is the TOP edge; the rect height
    /// covers title bar plus body.
    pub fn render(&mut self, rect: Rect, title: &str, body: &ElementBody) {
        self.render_title(rect.x, rect.y, rect.width, title);
        self.render_border(rect.x, rect.y, rect.width, rect.height);

        let body_top = rect.y - self.title_bar_height;
        let body_height = rect.height - self.title_bar_height;
        match body {
            ElementBody::Chart { image, .. } => {
                self.render_image(rect.x, body_top, rect.width, body_height, title, image);
            }
            ElementBody::TextBlock { lines } => {
                self.render_text_lines(rect.x, body_top, rect.width, body_height, lines);
            }
        }
    }

    /// Filled title bar with the title left-aligned, vertically centered.
    fn render_title(&mut self, x: f64, y_top: f64, width: f64, title: &str) {
        self.canvas.fill_rect(
            x,
            y_top - self.title_bar_height,
            width,
            self.title_bar_height,
            TITLE_BAR_BG,
        );
        self.canvas.draw_text(
            x + 5.0,
            y_top - self.title_bar_height / 2.0 - 4.0,
            title,
            StandardFont::HelveticaBold,
            TITLE_FONT_SIZE,
            TITLE_INK,
        );
    }

    /// Hairline border enclosing title bar and body.
    fn render_border(&mut self, x: f64, y_top: f64, width: f64, height: f64) {
        self.canvas
            .stroke_rect(x, y_top - height, width, height, BORDER_GRAY, 0.5);
    }

    /// Embed the chart image, or fall back to a placeholder when the bytes
    /// are empty (no data) or the backend cannot decode them.
    fn render_image(
        &mut self,
        x: f64,
        body_top: f64,
        width: f64,
        height: f64,
        title: &str,
        image: &[u8],
    ) {
        if image.is_empty() {
            log::warn!("empty chart image for '{}', drawing placeholder", title);
            self.render_placeholder(x, body_top, width, height, "(no data available for this chart)");
            return;
        }

        let result = self.canvas.draw_image(
            x + IMAGE_INSET,
            body_top - height + IMAGE_INSET,
            width - 2.0 * IMAGE_INSET,
            height - 2.0 * IMAGE_INSET,
            image,
        );
        if let Err(e) = result {
            log::warn!("chart image for '{}' failed to decode: {}", title, e);
            self.render_placeholder(x, body_top, width, height, "(chart image could not be shown)");
        }
    }

    /// Wrap the logical lines into the box and draw them with fixed leading.
    /// Overflow past the box height is cut off with an ellipsis by the
    /// wrapping step; nothing here can grow the box.
    fn render_text_lines(
        &mut self,
        x: f64,
        body_top: f64,
        width: f64,
        height: f64,
        lines: &[String],
    ) {
        let fonts = *self.fonts;
        let wrapped = text::wrap_to_box(
            lines,
            width - 2.0 * TEXT_INSET,
            height,
            TEXT_LINE_HEIGHT,
            |ch| fonts.char_width(ch, StandardFont::Helvetica, TEXT_FONT_SIZE),
        );

        let mut baseline = body_top - TEXT_LINE_HEIGHT + (TEXT_LINE_HEIGHT - TEXT_FONT_SIZE) / 2.0;
        for line in &wrapped.lines {
            self.canvas.draw_text(
                x + TEXT_INSET,
                baseline,
                line,
                StandardFont::Helvetica,
                TEXT_FONT_SIZE,
                Color::BLACK,
            );
            baseline -= TEXT_LINE_HEIGHT;
        }
    }

    /// Centered oblique message standing in for a missing or broken chart.
    fn render_placeholder(&mut self, x: f64, body_top: f64, width: f64, height: f64, message: &str) {
        let size = TEXT_FONT_SIZE + 1.0;
        let text_width = self
            .fonts
            .measure_string(message, StandardFont::HelveticaOblique, size);
        self.canvas.draw_text(
            x + (width - text_width) / 2.0,
            body_top - height / 2.0,
            message,
            StandardFont::HelveticaOblique,
            size,
            TITLE_INK,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{RecordedOp, RecordingCanvas};

    fn rect() -> Rect {
        Rect {
            x: 40.0,
            y: 700.0,
            width: 247.0,
            height: 225.0,
        }
    }

    fn render(body: &ElementBody, fail_decode: bool) -> RecordingCanvas {
        let mut canvas = RecordingCanvas::new();
        canvas.fail_image_decode = fail_decode;
        let fonts = FontContext::new();
        let mut boxes = BoxRenderer::new(&mut canvas, &fonts, 25.0);
        boxes.render(rect(), "Revenue split", body);
        canvas
    }

    #[test]
    fn test_title_and_border_always_drawn() {
        let body = ElementBody::TextBlock { lines: vec![] };
        let canvas = render(&body, false);
        assert!(canvas.texts().contains(&"Revenue split"));
        assert!(canvas
            .ops
            .iter()
            .any(|op| matches!(op, RecordedOp::FillRect { .. })));
        assert!(canvas
            .ops
            .iter()
            .any(|op| matches!(op, RecordedOp::StrokeRect { .. })));
    }

    #[test]
    fn test_image_body_embeds_bytes() {
        let body = ElementBody::Chart {
            kind: crate::chart::ChartKind::Pie,
            image: vec![1, 2, 3, 4],
        };
        let canvas = render(&body, false);
        assert!(canvas
            .ops
            .iter()
            .any(|op| matches!(op, RecordedOp::Image { len: 4, .. })));
    }

    #[test]
    fn test_empty_image_becomes_placeholder() {
        let body = ElementBody::Chart {
            kind: crate::chart::ChartKind::Pie,
            image: vec![],
        };
        let canvas = render(&body, false);
        assert!(!canvas
            .ops
            .iter()
            .any(|op| matches!(op, RecordedOp::Image { .. })));
        assert!(canvas
            .texts()
            .iter()
            .any(|t| t.contains("no data available")));
    }

    #[test]
    fn test_decode_failure_becomes_placeholder() {
        let body = ElementBody::Chart {
            kind: crate::chart::ChartKind::Bar,
            image: vec![0xFF, 0xD8, 0x00],
        };
        let canvas = render(&body, true);
        assert!(canvas
            .texts()
            .iter()
            .any(|t| t.contains("could not be shown")));
    }

    #[test]
    fn test_text_block_lines_drawn_top_down() {
        let body = ElementBody::TextBlock {
            lines: vec!["first".to_string(), "second".to_string()],
        };
        let canvas = render(&body, false);
        let ys: Vec<f64> = canvas
            .ops
            .iter()
            .filter_map(|op| match op {
                RecordedOp::Text { y, text, .. } if text != "Revenue split" => Some(*y),
                _ => None,
            })
            .collect();
        assert_eq!(ys.len(), 2);
        assert!(ys[0] > ys[1], "second line must sit below the first");
    }
}
