//! # Report Model
//!
//! The input representation for the page-flow engine. A report is a flat
//! sequence of sections, each a stream of self-contained elements: charts
//! (pre-rendered raster images) and short bulleted text blocks. Elements are
//! immutable once constructed and consumed exactly once by the engine.
//!
//! Also here: the page geometry constants that shape every layout decision,
//! and the serde-deserializable `ReportSpec` document that the CLI and
//! `render_spec` accept as JSON.

use serde::{Deserialize, Serialize};

use crate::chart::{ChartKind, ChartRenderer};

/// Leading between text block lines, in points.
pub const TEXT_LINE_HEIGHT: f64 = 14.0;
/// Body text size for text blocks, in points.
pub const TEXT_FONT_SIZE: f64 = 9.0;

/// Fixed page measurements, in points. Set once per document, never mutated.
///
/// The defaults describe an A4 portrait page with a colored header band at
/// the top, a footer strip at the bottom, and two columns of content between
/// the side margins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub page_width: f64,
    pub page_height: f64,
    /// Left and right margin.
    pub margin_side: f64,
    /// Header band depth reserved at the top of every content page.
    pub margin_top: f64,
    pub margin_bottom: f64,
    /// Distance from the page top down to the first row of content.
    pub content_start_offset: f64,
    /// Horizontal gap between the two half-width columns.
    pub column_gap: f64,
    /// Vertical gap between successive rows.
    pub row_gap: f64,
    /// Height of the filled title bar above each element body.
    pub title_bar_height: f64,
    /// Extra clearance kept above the bottom margin when testing for room.
    pub safety_margin: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_width: 595.28,
            page_height: 841.89,
            margin_side: 40.0,
            margin_top: 90.0,
            margin_bottom: 50.0,
            content_start_offset: 100.0,
            column_gap: 20.0,
            row_gap: 25.0,
            title_bar_height: 25.0,
            safety_margin: 30.0,
        }
    }
}

impl PageGeometry {
    /// Usable width between the side margins.
    pub fn content_width(&self) -> f64 {
        self.page_width - 2.0 * self.margin_side
    }

    /// Width of one of the two columns.
    pub fn half_width(&self) -> f64 {
        (self.content_width() - self.column_gap) / 2.0
    }

    /// The fixed y below the page header where the first row begins (y-up).
    pub fn content_start_y(&self) -> f64 {
        self.page_height - self.content_start_offset
    }

    /// The lowest y a row may reach before a page break is required.
    pub fn break_floor(&self) -> f64 {
        self.margin_bottom + self.safety_margin
    }
}

/// How much horizontal space an element claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// One of the two side-by-side columns.
    HalfWidth,
    /// The entire content width; always starts and ends its own row.
    FullWidth,
}

/// The drawable content of an element.
#[derive(Debug, Clone)]
pub enum ElementBody {
    /// A chart pre-rendered to raster bytes (PNG or JPEG). Zero-length bytes
    /// mean "no data" and are drawn as a placeholder box.
    Chart { kind: ChartKind, image: Vec<u8> },
    /// A short bulleted text block, one logical line per bullet.
    TextBlock { lines: Vec<String> },
}

/// One self-contained visual element of a report section.
#[derive(Debug, Clone)]
pub struct ReportElement {
    pub title: String,
    pub placement: Placement,
    pub body: ElementBody,
    /// Explicit body height in points; `None` uses the kind-based default.
    pub height: Option<f64>,
}

impl ReportElement {
    /// A chart element. Trend charts default to full width, everything else
    /// to a column slot.
    pub fn chart(title: &str, kind: ChartKind, image: Vec<u8>) -> Self {
        let placement = if kind == ChartKind::Trend {
            Placement::FullWidth
        } else {
            Placement::HalfWidth
        };
        Self {
            title: title.to_string(),
            placement,
            body: ElementBody::Chart { kind, image },
            height: None,
        }
    }

    /// A text block element.
    pub fn text_block(title: &str, lines: Vec<String>) -> Self {
        Self {
            title: title.to_string(),
            placement: Placement::HalfWidth,
            body: ElementBody::TextBlock { lines },
            height: None,
        }
    }

    pub fn full_width(mut self) -> Self {
        self.placement = Placement::FullWidth;
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// Body height in points, excluding the title bar: the explicit override
    /// if set, otherwise the kind-based default (bar charts taller than pies,
    /// trend charts taller still; full-width placements double the column
    /// defaults), or the line count for a text block.
    pub fn content_height(&self) -> f64 {
        if let Some(h) = self.height {
            return h;
        }
        match &self.body {
            ElementBody::Chart { kind, .. } => {
                kind.default_height(self.placement == Placement::FullWidth)
            }
            ElementBody::TextBlock { lines } => lines.len() as f64 * TEXT_LINE_HEIGHT + 20.0,
        }
    }
}

/// A placed rectangle, y-up: `y` is the TOP edge of the rect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Where one element landed: the element-by-page placement map entry the
/// engine returns on success.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPlacement {
    pub section: String,
    pub title: String,
    /// 1-based global page number.
    pub page: usize,
    /// Column index (0 left, 1 right); `None` for full-width elements.
    pub column: Option<usize>,
    pub rect: Rect,
}

/// The full placement record for a document, in element order.
pub type PlacementMap = Vec<ElementPlacement>;

/// Document metadata embedded in the output file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

// ── Report spec: the JSON input document ────────────────────────

/// A label/value pair. Order of appearance is meaningful (ranked series,
/// distribution buckets), so the spec uses arrays of these rather than maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledValue {
    pub label: String,
    pub value: f64,
}

impl LabeledValue {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// A complete report described as data, ready to be rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSpec {
    #[serde(default)]
    pub metadata: Metadata,
    /// Optional cover page drawn before the first section.
    #[serde(default)]
    pub cover: Option<CoverSpec>,
    pub sections: Vec<SectionSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverSpec {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSpec {
    pub title: String,
    pub elements: Vec<ElementSpec>,
}

/// One element of a section, as written in the JSON input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ElementSpec {
    /// A pie chart over labeled slices.
    Pie {
        title: String,
        slices: Vec<LabeledValue>,
        #[serde(default)]
        full_width: bool,
        #[serde(default)]
        height: Option<f64>,
    },

    /// A bar chart over labeled categories.
    Bar {
        title: String,
        bars: Vec<LabeledValue>,
        #[serde(default)]
        full_width: bool,
        #[serde(default)]
        height: Option<f64>,
    },

    /// A monthly trend line; labels are "YYYY-MM" buckets, drawn in order.
    /// Always rendered full width.
    Trend {
        title: String,
        points: Vec<LabeledValue>,
        #[serde(default)]
        height: Option<f64>,
    },

    /// A bulleted text block.
    Text {
        title: String,
        lines: Vec<String>,
        #[serde(default)]
        full_width: bool,
        #[serde(default)]
        height: Option<f64>,
    },

    /// A pre-rendered chart image, base64-encoded PNG or JPEG.
    Image {
        title: String,
        data: String,
        #[serde(default = "ChartKind::pie")]
        kind: ChartKind,
        #[serde(default)]
        full_width: bool,
        #[serde(default)]
        height: Option<f64>,
    },
}

impl ElementSpec {
    /// Turn a spec entry into a concrete element, rendering chart data to
    /// image bytes through the given renderer.
    ///
    /// Undecodable base64 in an `Image` entry degrades to empty bytes — the
    /// engine draws those as a "no data" placeholder rather than failing the
    /// document.
    pub fn build(&self, renderer: &dyn ChartRenderer, geometry: &PageGeometry) -> ReportElement {
        match self {
            ElementSpec::Pie {
                title,
                slices,
                full_width,
                height,
            } => {
                let kind = ChartKind::Pie;
                let (w, h) = chart_pixel_size(kind, *full_width, *height, geometry);
                let image = renderer.render_chart(kind, title, slices, w, h);
                finish(ReportElement::chart(title, kind, image), *full_width, *height)
            }

            ElementSpec::Bar {
                title,
                bars,
                full_width,
                height,
            } => {
                let kind = ChartKind::Bar;
                let (w, h) = chart_pixel_size(kind, *full_width, *height, geometry);
                let image = renderer.render_chart(kind, title, bars, w, h);
                finish(ReportElement::chart(title, kind, image), *full_width, *height)
            }

            ElementSpec::Trend { title, points, height } => {
                let kind = ChartKind::Trend;
                let (w, h) = chart_pixel_size(kind, true, *height, geometry);
                let image = renderer.render_chart(kind, title, points, w, h);
                finish(ReportElement::chart(title, kind, image), true, *height)
            }

            ElementSpec::Text {
                title,
                lines,
                full_width,
                height,
            } => finish(
                ReportElement::text_block(title, lines.clone()),
                *full_width,
                *height,
            ),

            ElementSpec::Image {
                title,
                data,
                kind,
                full_width,
                height,
            } => {
                use base64::Engine;
                let image = base64::engine::general_purpose::STANDARD
                    .decode(data.trim())
                    .unwrap_or_else(|e| {
                        log::warn!("undecodable base64 image for '{}': {}", title, e);
                        Vec::new()
                    });
                finish(ReportElement::chart(title, *kind, image), *full_width, *height)
            }
        }
    }
}

fn finish(mut element: ReportElement, full_width: bool, height: Option<f64>) -> ReportElement {
    if full_width {
        element.placement = Placement::FullWidth;
    }
    element.height = height;
    element
}

/// Pixel dimensions to render a chart at, matching the box it will occupy.
fn chart_pixel_size(
    kind: ChartKind,
    full_width: bool,
    height: Option<f64>,
    geometry: &PageGeometry,
) -> (u32, u32) {
    let w = if full_width {
        geometry.content_width()
    } else {
        geometry.half_width()
    };
    let h = height.unwrap_or_else(|| kind.default_height(full_width));
    (w as u32, h as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_derived_values() {
        let g = PageGeometry::default();
        assert!((g.content_width() - 515.28).abs() < 0.01);
        assert!((g.half_width() - 247.64).abs() < 0.01);
        assert!((g.content_start_y() - 741.89).abs() < 0.01);
        assert!((g.break_floor() - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_trend_chart_defaults_full_width() {
        let e = ReportElement::chart("Monthly volume", ChartKind::Trend, vec![1]);
        assert_eq!(e.placement, Placement::FullWidth);
        let p = ReportElement::chart("Split", ChartKind::Pie, vec![1]);
        assert_eq!(p.placement, Placement::HalfWidth);
    }

    #[test]
    fn test_default_heights_by_kind() {
        let pie = ReportElement::chart("a", ChartKind::Pie, vec![]);
        let bar = ReportElement::chart("b", ChartKind::Bar, vec![]);
        let trend = ReportElement::chart("c", ChartKind::Trend, vec![]);
        assert!(bar.content_height() > pie.content_height());
        assert!(trend.content_height() > pie.content_height());
    }

    #[test]
    fn test_explicit_height_wins() {
        let e = ReportElement::chart("a", ChartKind::Pie, vec![]).with_height(123.0);
        assert!((e.content_height() - 123.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_text_block_height_tracks_line_count() {
        let short = ReportElement::text_block("t", vec!["a".to_string()]);
        let long = ReportElement::text_block("t", vec!["a".to_string(); 5]);
        let delta = long.content_height() - short.content_height();
        assert!((delta - 4.0 * TEXT_LINE_HEIGHT).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_spec_roundtrip() {
        let json = r#"{
            "metadata": { "title": "Quarterly" },
            "sections": [{
                "title": "Accounts",
                "elements": [
                    { "type": "pie", "title": "By tier",
                      "slices": [ { "label": "Basic", "value": 4.0 } ] },
                    { "type": "text", "title": "Top accounts",
                      "lines": ["- Acme"], "fullWidth": true }
                ]
            }]
        }"#;
        let spec: ReportSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.sections.len(), 1);
        assert_eq!(spec.sections[0].elements.len(), 2);
        match &spec.sections[0].elements[1] {
            ElementSpec::Text { full_width, .. } => assert!(*full_width),
            other => panic!("expected text element, got {:?}", other),
        }
    }
}
