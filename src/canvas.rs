//! # Canvas Boundary
//!
//! The drawing surface the layout engine renders into. The engine never
//! talks to a PDF (or anything else) directly — it issues page lifecycle
//! calls and primitive draw calls through this trait, which keeps the
//! page-flow logic testable against a recording double and keeps the
//! document backend swappable.
//!
//! Coordinates are PDF-style: points, origin at the bottom-left of the
//! page, y increasing upwards.

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::font::StandardFont;

/// An RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };

    /// Build a color from 8-bit components.
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }
}

/// Image bytes could not be decoded by the canvas backend.
///
/// This error never crosses the document boundary: the box renderer catches
/// it and draws a placeholder instead.
#[derive(Debug, Error)]
#[error("image decode failure: {0}")]
pub struct DecodeError(pub String);

/// A page-level canvas operation failed. Fatal for the whole report.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CanvasError(pub String);

/// The drawing primitives the page-flow engine consumes.
pub trait Canvas {
    /// Open a fresh page, closing the current one if any. Pages are numbered
    /// from 1 in creation order.
    fn new_page(&mut self) -> Result<(), CanvasError>;

    /// Close the current page. Idempotent; also implied by `new_page` and
    /// `save`.
    fn close_page(&mut self);

    /// Number of pages created so far (including the open one).
    fn page_count(&self) -> usize;

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color);

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color, line_width: f64);

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Color, line_width: f64);

    /// Draw a single line of text with its baseline at `y`.
    fn draw_text(&mut self, x: f64, y: f64, text: &str, font: StandardFont, size: f64, color: Color);

    /// Embed raster image bytes (PNG or JPEG) scaled into the given rect.
    fn draw_image(&mut self, x: f64, y: f64, w: f64, h: f64, bytes: &[u8])
        -> Result<(), DecodeError>;

    /// Persist the finished document. The document lives in memory until this
    /// call, so a failed report leaves no partial file behind.
    fn save(&mut self, path: &Path) -> io::Result<()>;
}

/// A canvas that records draw calls instead of rendering them.
///
/// Used by the engine tests to assert what was drawn where without going
/// through a real document backend.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub ops: Vec<RecordedOp>,
    pages: usize,
    /// When set, `draw_image` rejects every byte payload with a decode error.
    pub fail_image_decode: bool,
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedOp {
    NewPage,
    ClosePage,
    FillRect { x: f64, y: f64, w: f64, h: f64 },
    StrokeRect { x: f64, y: f64, w: f64, h: f64 },
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    Text { x: f64, y: f64, text: String, size: f64 },
    Image { x: f64, y: f64, w: f64, h: f64, len: usize },
    Save,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// All text drawn across the whole document, in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                RecordedOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn new_page(&mut self) -> Result<(), CanvasError> {
        self.pages += 1;
        self.ops.push(RecordedOp::NewPage);
        Ok(())
    }

    fn close_page(&mut self) {
        self.ops.push(RecordedOp::ClosePage);
    }

    fn page_count(&self) -> usize {
        self.pages
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, _color: Color) {
        self.ops.push(RecordedOp::FillRect { x, y, w, h });
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, _color: Color, _line_width: f64) {
        self.ops.push(RecordedOp::StrokeRect { x, y, w, h });
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, _color: Color, _line_width: f64) {
        self.ops.push(RecordedOp::Line { x1, y1, x2, y2 });
    }

    fn draw_text(
        &mut self,
        x: f64,
        y: f64,
        text: &str,
        _font: StandardFont,
        size: f64,
        _color: Color,
    ) {
        self.ops.push(RecordedOp::Text {
            x,
            y,
            text: text.to_string(),
            size,
        });
    }

    fn draw_image(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        bytes: &[u8],
    ) -> Result<(), DecodeError> {
        if self.fail_image_decode {
            return Err(DecodeError("forced decode failure".to_string()));
        }
        self.ops.push(RecordedOp::Image {
            x,
            y,
            w,
            h,
            len: bytes.len(),
        });
        Ok(())
    }

    fn save(&mut self, _path: &Path) -> io::Result<()> {
        self.ops.push(RecordedOp::Save);
        Ok(())
    }
}
