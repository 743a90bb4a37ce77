//! # Chart Rendering
//!
//! The engine consumes charts as finished raster bytes; how they are painted
//! is a collaborator concern behind the [`ChartRenderer`] trait. The contract
//! is deliberately forgiving: empty or degenerate input yields a zero-length
//! byte vector, never an error — the layout engine draws those as "no data"
//! placeholder boxes and moves on.
//!
//! [`RasterChartRenderer`] is the built-in implementation: a small painter
//! over an RGBA pixel buffer, encoded to PNG with the `image` crate. It draws
//! pies, bars, and trend lines with a fixed categorical palette and a compact
//! built-in 5x7 pixel font for labels. The element title is NOT painted into
//! the chart — the box renderer draws it in the title bar.

use image::{ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::model::LabeledValue;

/// The chart families the engine knows default heights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    /// Category share breakdown.
    Pie,
    /// Distribution / ranking bars.
    Bar,
    /// A date-bucketed series; always laid out full width.
    Trend,
}

impl ChartKind {
    /// serde default helper for spec entries that omit the kind.
    pub fn pie() -> Self {
        ChartKind::Pie
    }

    /// Default body height in points. Bars run taller than pies to leave
    /// room for category labels; trend charts have one fixed height and
    /// always span the full content width.
    pub fn default_height(&self, full_width: bool) -> f64 {
        match self {
            ChartKind::Pie => {
                if full_width {
                    400.0
                } else {
                    200.0
                }
            }
            ChartKind::Bar => {
                if full_width {
                    560.0
                } else {
                    280.0
                }
            }
            ChartKind::Trend => 300.0,
        }
    }
}

/// Turns aggregated numeric data into a finished raster image.
///
/// Implementations must return a zero-length vector for empty or invalid
/// input rather than failing; the engine interprets that as "no data".
pub trait ChartRenderer {
    fn render_chart(
        &self,
        kind: ChartKind,
        title: &str,
        data: &[LabeledValue],
        width: u32,
        height: u32,
    ) -> Vec<u8>;
}

/// A renderer that produces no image for any input. Every chart built
/// through it becomes a placeholder box — useful in tests and dry runs.
#[derive(Debug, Default)]
pub struct NullChartRenderer;

impl ChartRenderer for NullChartRenderer {
    fn render_chart(&self, _: ChartKind, _: &str, _: &[LabeledValue], _: u32, _: u32) -> Vec<u8> {
        Vec::new()
    }
}

// ── Built-in raster painter ─────────────────────────────────────

type Rgba = [u8; 4];

const BACKGROUND: Rgba = [255, 255, 255, 255];
const PLOT_BACKGROUND: Rgba = [248, 248, 248, 255];
const GRID_LINE: Rgba = [220, 220, 220, 255];
const AXIS_LINE: Rgba = [90, 90, 90, 255];
const LABEL_INK: Rgba = [60, 60, 60, 255];

/// Categorical palette, cycled per slice/point.
const PALETTE: [Rgba; 10] = [
    [31, 119, 180, 255],
    [255, 127, 14, 255],
    [44, 160, 44, 255],
    [214, 39, 40, 255],
    [148, 103, 189, 255],
    [140, 86, 75, 255],
    [227, 119, 194, 255],
    [127, 127, 127, 255],
    [188, 189, 34, 255],
    [23, 190, 207, 255],
];

/// The built-in chart painter.
#[derive(Debug, Default)]
pub struct RasterChartRenderer;

impl RasterChartRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ChartRenderer for RasterChartRenderer {
    fn render_chart(
        &self,
        kind: ChartKind,
        title: &str,
        data: &[LabeledValue],
        width: u32,
        height: u32,
    ) -> Vec<u8> {
        if width < 40 || height < 40 {
            return Vec::new();
        }
        let usable: Vec<&LabeledValue> = data.iter().filter(|d| d.value.is_finite()).collect();
        let degenerate = match kind {
            // A pie of zeros has no shares to show.
            ChartKind::Pie => usable.iter().all(|d| d.value <= 0.0),
            _ => usable.is_empty(),
        };
        if degenerate {
            log::warn!("no usable data for chart '{}'", title);
            return Vec::new();
        }

        let mut img = RgbaImage::from_pixel(width, height, image::Rgba(BACKGROUND));
        match kind {
            ChartKind::Pie => paint_pie(&mut img, &usable),
            ChartKind::Bar => paint_bars(&mut img, &usable),
            ChartKind::Trend => paint_trend(&mut img, &usable),
        }
        encode_png(&img)
    }
}

fn encode_png(img: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    if let Err(e) =
        encoder.write_image(img.as_raw(), img.width(), img.height(), image::ColorType::Rgba8)
    {
        log::warn!("png encode failed: {}", e);
        return Vec::new();
    }
    buf
}

// ── Pixel helpers ───────────────────────────────────────────────

fn put(img: &mut RgbaImage, x: i64, y: i64, color: Rgba) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, image::Rgba(color));
    }
}

fn fill_rect(img: &mut RgbaImage, x: i64, y: i64, w: i64, h: i64, color: Rgba) {
    for yy in y..y + h {
        for xx in x..x + w {
            put(img, xx, yy, color);
        }
    }
}

fn draw_line(img: &mut RgbaImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba) {
    // Bresenham.
    let (mut x, mut y) = (x0, y0);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put(img, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn fill_circle(img: &mut RgbaImage, cx: i64, cy: i64, r: i64, color: Rgba) {
    for y in -r..=r {
        for x in -r..=r {
            if x * x + y * y <= r * r {
                put(img, cx + x, cy + y, color);
            }
        }
    }
}

// ── 5x7 pixel font ──────────────────────────────────────────────
//
// Each glyph is 7 rows of 5 bits, MSB on the left. Lowercase maps onto
// uppercase; anything unknown renders as a blank cell.

const GLYPH_W: i64 = 5;
const GLYPH_H: i64 = 7;

fn glyph(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x1B, 0x11],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '%' => [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03],
        '<' => [0x02, 0x04, 0x08, 0x10, 0x08, 0x04, 0x02],
        '>' => [0x08, 0x04, 0x02, 0x01, 0x02, 0x04, 0x08],
        '=' => [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00],
        '/' => [0x01, 0x01, 0x02, 0x04, 0x08, 0x10, 0x10],
        _ => [0x00; 7],
    }
}

fn draw_label(img: &mut RgbaImage, x: i64, y: i64, text: &str, color: Rgba) {
    let mut cx = x;
    for ch in text.chars() {
        let rows = glyph(ch);
        for (ry, row) in rows.iter().enumerate() {
            for bit in 0..GLYPH_W {
                if row & (1 << (GLYPH_W - 1 - bit)) != 0 {
                    put(img, cx + bit, y + ry as i64, color);
                }
            }
        }
        cx += GLYPH_W + 1;
    }
}

fn label_width(text: &str) -> i64 {
    text.chars().count() as i64 * (GLYPH_W + 1)
}

/// Shorten a label to fit a pixel budget, cutting with a bare hyphen-free cut.
fn clip_label(text: &str, max_px: i64) -> String {
    let max_chars = (max_px / (GLYPH_W + 1)).max(1) as usize;
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

// ── Painters ────────────────────────────────────────────────────

fn paint_pie(img: &mut RgbaImage, data: &[&LabeledValue]) {
    let w = img.width() as i64;
    let h = img.height() as i64;
    // Legend strip on the right, plot square on the left.
    let legend_w = (w / 3).clamp(60, 160);
    let cx = (w - legend_w) / 2;
    let cy = h / 2;
    let r = ((w - legend_w).min(h) / 2 - 10).max(10);

    let total: f64 = data.iter().map(|d| d.value.max(0.0)).sum();
    // Cumulative angle bounds per slice, starting at 12 o'clock, clockwise.
    let mut bounds = Vec::with_capacity(data.len() + 1);
    let mut acc = 0.0;
    bounds.push(0.0);
    for d in data {
        acc += d.value.max(0.0) / total;
        bounds.push(acc);
    }

    for y in -r..=r {
        for x in -r..=r {
            if x * x + y * y > r * r {
                continue;
            }
            let angle = (x as f64).atan2(-y as f64); // 0 at top, clockwise positive
            let frac = (angle / std::f64::consts::TAU).rem_euclid(1.0);
            let idx = match bounds.windows(2).position(|b| frac >= b[0] && frac < b[1]) {
                Some(i) => i,
                None => data.len() - 1,
            };
            put(img, cx + x, cy + y, PALETTE[idx % PALETTE.len()]);
        }
    }

    // Legend: swatch + label + percent share.
    let row_h = GLYPH_H + 5;
    let mut ly = (h - data.len() as i64 * row_h).max(4) / 2;
    let lx = w - legend_w + 4;
    for (i, d) in data.iter().enumerate() {
        fill_rect(img, lx, ly, 8, 8, PALETTE[i % PALETTE.len()]);
        let pct = (d.value.max(0.0) / total * 100.0).round() as i64;
        let text = format!("{} {}%", clip_label(&d.label, legend_w - 50), pct);
        draw_label(img, lx + 12, ly, &text, LABEL_INK);
        ly += row_h;
    }
}

fn paint_bars(img: &mut RgbaImage, data: &[&LabeledValue]) {
    let w = img.width() as i64;
    let h = img.height() as i64;
    let left = 10;
    let bottom = h - GLYPH_H - 8;
    let top = 10;
    let plot_w = w - left - 10;
    let plot_h = bottom - top;

    fill_rect(img, left, top, plot_w, plot_h, PLOT_BACKGROUND);
    for i in 1..5 {
        let gy = bottom - plot_h * i / 5;
        draw_line(img, left, gy, left + plot_w, gy, GRID_LINE);
    }

    let max = data.iter().map(|d| d.value.max(0.0)).fold(0.0_f64, f64::max);
    let n = data.len() as i64;
    let slot = plot_w / n.max(1);
    let bar_w = (slot * 3 / 5).max(2);

    for (i, d) in data.iter().enumerate() {
        let frac = if max > 0.0 { d.value.max(0.0) / max } else { 0.0 };
        let bar_h = (plot_h as f64 * frac * 0.92) as i64;
        let x = left + i as i64 * slot + (slot - bar_w) / 2;
        fill_rect(img, x, bottom - bar_h, bar_w, bar_h, PALETTE[i % PALETTE.len()]);

        let label = clip_label(&d.label, slot - 2);
        let lx = left + i as i64 * slot + (slot - label_width(&label)) / 2;
        draw_label(img, lx, bottom + 2, &label, LABEL_INK);
    }
    draw_line(img, left, bottom, left + plot_w, bottom, AXIS_LINE);
}

fn paint_trend(img: &mut RgbaImage, data: &[&LabeledValue]) {
    let w = img.width() as i64;
    let h = img.height() as i64;
    let left = 14;
    let bottom = h - GLYPH_H - 8;
    let top = 10;
    let plot_w = w - left - 14;
    let plot_h = bottom - top;

    fill_rect(img, left, top, plot_w, plot_h, PLOT_BACKGROUND);
    for i in 1..5 {
        let gy = bottom - plot_h * i / 5;
        draw_line(img, left, gy, left + plot_w, gy, GRID_LINE);
    }
    draw_line(img, left, bottom, left + plot_w, bottom, AXIS_LINE);

    let max = data.iter().map(|d| d.value.max(0.0)).fold(0.0_f64, f64::max);
    let n = data.len() as i64;
    let step = if n > 1 { plot_w / (n - 1) } else { 0 };

    let point = |i: i64, v: f64| -> (i64, i64) {
        let frac = if max > 0.0 { v.max(0.0) / max } else { 0.0 };
        let x = if n > 1 { left + i * step } else { left + plot_w / 2 };
        let y = bottom - (plot_h as f64 * frac * 0.9) as i64 - 4;
        (x, y)
    };

    for i in 1..n {
        let (x0, y0) = point(i - 1, data[(i - 1) as usize].value);
        let (x1, y1) = point(i, data[i as usize].value);
        draw_line(img, x0, y0, x1, y1, PALETTE[0]);
    }
    for (i, d) in data.iter().enumerate() {
        let (x, y) = point(i as i64, d.value);
        fill_circle(img, x, y, 3, PALETTE[0]);
    }

    // First and last bucket labels anchor the x axis.
    if let Some(first) = data.first() {
        draw_label(img, left, bottom + 2, &clip_label(&first.label, plot_w / 2), LABEL_INK);
    }
    if let Some(last) = data.last() {
        let label = clip_label(&last.label, plot_w / 2);
        draw_label(img, left + plot_w - label_width(&label), bottom + 2, &label, LABEL_INK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, f64)]) -> Vec<LabeledValue> {
        pairs.iter().map(|(l, v)| LabeledValue::new(*l, *v)).collect()
    }

    fn is_png(bytes: &[u8]) -> bool {
        bytes.len() >= 4 && bytes[0] == 0x89 && bytes[1] == 0x50 && bytes[2] == 0x4E && bytes[3] == 0x47
    }

    #[test]
    fn test_empty_input_yields_zero_length() {
        let r = RasterChartRenderer::new();
        assert!(r.render_chart(ChartKind::Pie, "t", &[], 200, 200).is_empty());
        assert!(r.render_chart(ChartKind::Bar, "t", &[], 200, 200).is_empty());
        assert!(r.render_chart(ChartKind::Trend, "t", &[], 200, 200).is_empty());
    }

    #[test]
    fn test_all_zero_pie_is_no_data() {
        let r = RasterChartRenderer::new();
        let d = data(&[("a", 0.0), ("b", 0.0)]);
        assert!(r.render_chart(ChartKind::Pie, "t", &d, 200, 200).is_empty());
    }

    #[test]
    fn test_degenerate_size_is_no_data() {
        let r = RasterChartRenderer::new();
        let d = data(&[("a", 1.0)]);
        assert!(r.render_chart(ChartKind::Bar, "t", &d, 10, 10).is_empty());
    }

    #[test]
    fn test_valid_inputs_yield_png() {
        let r = RasterChartRenderer::new();
        let d = data(&[("alpha", 3.0), ("beta", 5.0), ("gamma", 2.0)]);
        for kind in [ChartKind::Pie, ChartKind::Bar, ChartKind::Trend] {
            let bytes = r.render_chart(kind, "t", &d, 248, 200);
            assert!(is_png(&bytes), "{:?} should produce a PNG", kind);
        }
    }

    #[test]
    fn test_null_renderer_always_empty() {
        let r = NullChartRenderer;
        let d = data(&[("a", 1.0)]);
        assert!(r.render_chart(ChartKind::Pie, "t", &d, 200, 200).is_empty());
    }

    #[test]
    fn test_default_heights() {
        assert_eq!(ChartKind::Pie.default_height(false), 200.0);
        assert_eq!(ChartKind::Pie.default_height(true), 400.0);
        assert_eq!(ChartKind::Bar.default_height(false), 280.0);
        assert_eq!(ChartKind::Trend.default_height(true), 300.0);
    }
}
