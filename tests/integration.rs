//! Integration tests for the pageflow layout pipeline.
//!
//! These tests exercise the full path from report elements to placements
//! and PDF output. They verify:
//! - Column alternation and row-closing for half-width elements
//! - Page breaks happen at the right places, with the cursor reset
//! - Full-width elements own their row and force-close pending rows
//! - Element-level failures (no data, broken images) become placeholders
//! - The PDF backend produces structurally valid output

use std::sync::mpsc;

use pageflow::canvas::{RecordedOp, RecordingCanvas};
use pageflow::chart::{ChartKind, NullChartRenderer, RasterChartRenderer};
use pageflow::layout::PageFlowEngine;
use pageflow::model::{
    ElementSpec, LabeledValue, Metadata, PageGeometry, PlacementMap, ReportElement, ReportSpec,
    SectionSpec,
};

// ─── Helpers ────────────────────────────────────────────────────

fn half_chart(title: &str, height: f64) -> ReportElement {
    // Non-empty bytes: the recording canvas embeds anything.
    ReportElement::chart(title, ChartKind::Pie, vec![1, 2, 3]).with_height(height)
}

fn layout(elements: &[ReportElement]) -> (RecordingCanvas, PlacementMap) {
    layout_on(RecordingCanvas::new(), elements)
}

fn layout_on(canvas: RecordingCanvas, elements: &[ReportElement]) -> (RecordingCanvas, PlacementMap) {
    let mut engine = PageFlowEngine::new(canvas, PageGeometry::default());
    engine.layout_section("Section", elements).unwrap();
    engine.into_parts()
}

fn temp_pdf(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("pageflow_test_{}.pdf", name))
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 50, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "Missing PDF header");
    assert!(
        bytes.windows(5).any(|w| w == b"%%EOF"),
        "Missing %%EOF marker"
    );
    assert!(bytes.windows(4).any(|w| w == b"xref"), "Missing xref table");
    assert!(bytes.windows(7).any(|w| w == b"trailer"), "Missing trailer");
}

// ─── Column Flow ────────────────────────────────────────────────

#[test]
fn test_half_width_elements_alternate_columns() {
    let elements: Vec<_> = (0..4).map(|i| half_chart(&format!("c{}", i), 100.0)).collect();
    let (_, placements) = layout(&elements);
    let columns: Vec<Option<usize>> = placements.iter().map(|p| p.column).collect();
    assert_eq!(columns, vec![Some(0), Some(1), Some(0), Some(1)]);
}

#[test]
fn test_y_moves_only_when_row_closes() {
    let elements: Vec<_> = (0..4).map(|i| half_chart(&format!("c{}", i), 100.0)).collect();
    let (_, placements) = layout(&elements);

    assert_eq!(placements[0].rect.y, placements[1].rect.y, "row mates share y");
    assert!(
        placements[2].rect.y < placements[0].rect.y,
        "next row sits below the closed one"
    );
    assert_eq!(placements[2].rect.y, placements[3].rect.y);
}

#[test]
fn test_row_closes_at_tallest_member() {
    let g = PageGeometry::default();
    let elements = vec![
        half_chart("short", 100.0),
        half_chart("tall", 180.0),
        half_chart("next", 100.0),
    ];
    let (_, placements) = layout(&elements);
    let expected = placements[0].rect.y - (180.0 + g.title_bar_height + g.row_gap);
    assert!((placements[2].rect.y - expected).abs() < 1e-9);
}

#[test]
fn test_columns_have_distinct_x() {
    let g = PageGeometry::default();
    let elements = vec![half_chart("l", 100.0), half_chart("r", 100.0)];
    let (_, placements) = layout(&elements);
    assert!((placements[0].rect.x - g.margin_side).abs() < f64::EPSILON);
    let right_x = g.margin_side + g.half_width() + g.column_gap;
    assert!((placements[1].rect.x - right_x).abs() < f64::EPSILON);
}

// ─── Page Breaks ────────────────────────────────────────────────

#[test]
fn test_three_tall_half_elements_break_to_second_page() {
    // Three 300pt elements: the first two share a row; the third no longer
    // fits above the floor and must open a new page at the content start.
    let g = PageGeometry::default();
    let elements = vec![
        half_chart("a", 300.0),
        half_chart("b", 300.0),
        half_chart("c", 300.0),
    ];
    let (_, placements) = layout(&elements);

    assert_eq!(placements[0].page, 1);
    assert_eq!(placements[1].page, 1);
    assert_eq!(placements[0].rect.y, placements[1].rect.y);

    assert_eq!(placements[2].page, 2, "third element belongs on a new page");
    assert_eq!(placements[2].column, Some(0));
    assert!((placements[2].rect.y - g.content_start_y()).abs() < f64::EPSILON);
}

#[test]
fn test_full_width_stream_breaks_pages() {
    let g = PageGeometry::default();
    let elements: Vec<_> = (0..3)
        .map(|i| half_chart(&format!("f{}", i), 200.0).full_width())
        .collect();
    let (_, placements) = layout(&elements);

    assert_eq!(placements[0].page, 1);
    assert_eq!(placements[1].page, 1);
    assert_eq!(placements[2].page, 2);
    assert!((placements[2].rect.y - g.content_start_y()).abs() < f64::EPSILON);
}

#[test]
fn test_tall_right_sibling_restarts_on_new_page() {
    // The left element fits the remaining space but its would-be right
    // sibling is taller than what is left. The right-column fit test runs
    // against the row's eventual height, so the element opens a new page
    // and starts a fresh row there at column 0.
    let g = PageGeometry::default();
    let elements = vec![
        half_chart("filler", 500.0).full_width(),
        half_chart("left", 80.0),
        half_chart("right", 300.0),
    ];
    let (_, placements) = layout(&elements);

    assert_eq!(placements[1].page, 1);
    assert_eq!(placements[1].column, Some(0));
    assert_eq!(placements[2].page, 2, "oversized sibling opens a new page");
    assert_eq!(placements[2].column, Some(0), "fresh page restarts at the left column");
    assert!((placements[2].rect.y - g.content_start_y()).abs() < f64::EPSILON);
}

// ─── Full-Width Policy ──────────────────────────────────────────

#[test]
fn test_full_width_owns_its_row() {
    let g = PageGeometry::default();
    let elements = vec![
        half_chart("left", 100.0),
        half_chart("wide", 120.0).full_width(),
        half_chart("after", 100.0),
    ];
    let (_, placements) = layout(&elements);

    let wide = &placements[1];
    assert_eq!(wide.column, None);
    assert!((wide.rect.x - g.margin_side).abs() < f64::EPSILON);
    assert!((wide.rect.width - g.content_width()).abs() < f64::EPSILON);
    assert!(
        wide.rect.y < placements[0].rect.y,
        "pending row must be force-closed before the full-width element"
    );

    let after = &placements[2];
    assert_eq!(after.column, Some(0), "column state restarts after a full row");
    assert!(after.rect.y < wide.rect.y);
}

// ─── Failure Containment ────────────────────────────────────────

#[test]
fn test_empty_chart_bytes_become_placeholder() {
    let elements = vec![
        ReportElement::chart("Empty pie", ChartKind::Pie, Vec::new()),
        half_chart("next", 100.0),
    ];
    let (canvas, placements) = layout(&elements);

    assert!(
        !canvas.ops.iter().any(|op| matches!(op, RecordedOp::Image { .. })),
        "no image must be embedded for empty bytes"
    );
    assert!(
        canvas.texts().iter().any(|t| t.contains("no data available")),
        "placeholder text missing"
    );
    assert_eq!(placements.len(), 2, "layout proceeds past the placeholder");
    assert_eq!(placements[1].column, Some(1), "flow state is unaffected");
}

#[test]
fn test_decode_failure_becomes_placeholder_not_error() {
    let mut canvas = RecordingCanvas::new();
    canvas.fail_image_decode = true;
    let elements = vec![half_chart("broken", 100.0), half_chart("next", 100.0)];
    let (canvas, placements) = layout_on(canvas, &elements);

    assert_eq!(placements.len(), 2);
    assert!(canvas.texts().iter().any(|t| t.contains("could not be shown")));
}

#[test]
fn test_truncated_text_block_ends_with_marker() {
    let lines: Vec<String> = (0..30).map(|i| format!("bullet line number {}", i)).collect();
    let elements = vec![ReportElement::text_block("Notes", lines).with_height(60.0)];
    let (canvas, _) = layout(&elements);

    let drawn: Vec<&str> = canvas.texts();
    let last_body_line = drawn
        .iter()
        .rev()
        .find(|t| t.starts_with("bullet"))
        .expect("some body text drawn");
    assert!(
        last_body_line.ends_with("..."),
        "last visible line must carry the truncation marker, got '{}'",
        last_body_line
    );
}

// ─── Placement Map & Progress ───────────────────────────────────

#[test]
fn test_placement_map_records_section_and_titles() {
    let elements = vec![half_chart("Revenue", 100.0)];
    let (_, placements) = layout(&elements);
    assert_eq!(placements[0].section, "Section");
    assert_eq!(placements[0].title, "Revenue");
    assert_eq!(placements[0].page, 1);
}

#[test]
fn test_sections_start_on_fresh_pages() {
    let mut engine = PageFlowEngine::new(RecordingCanvas::new(), PageGeometry::default());
    engine.layout_section("First", &[half_chart("a", 100.0)]).unwrap();
    engine.layout_section("Second", &[half_chart("b", 100.0)]).unwrap();
    let (_, placements) = engine.into_parts();
    assert_eq!(placements[0].page, 1);
    assert_eq!(placements[1].page, 2);
}

#[test]
fn test_progress_channel_receives_updates() {
    let (tx, rx) = mpsc::channel();
    let mut engine =
        PageFlowEngine::new(RecordingCanvas::new(), PageGeometry::default()).with_progress(tx);
    engine.layout_section("Watched", &[half_chart("a", 100.0)]).unwrap();
    drop(engine);

    let messages: Vec<String> = rx.try_iter().collect();
    assert!(
        messages.iter().any(|m| m.contains("Watched")),
        "expected a section progress message, got {:?}",
        messages
    );
}

// ─── End-to-End PDF Pipeline ────────────────────────────────────

fn small_spec() -> ReportSpec {
    ReportSpec {
        metadata: Metadata {
            title: Some("Activity Report".to_string()),
            author: None,
            subject: None,
        },
        cover: None,
        sections: vec![SectionSpec {
            title: "Accounts".to_string(),
            elements: vec![
                ElementSpec::Pie {
                    title: "By tier".to_string(),
                    slices: vec![
                        LabeledValue::new("Basic", 12.0),
                        LabeledValue::new("Premium", 5.0),
                    ],
                    full_width: false,
                    height: None,
                },
                ElementSpec::Text {
                    title: "Top accounts".to_string(),
                    lines: vec!["- Acme - 120 k".to_string(), "- Globex - 80 k".to_string()],
                    full_width: true,
                    height: None,
                },
            ],
        }],
    }
}

#[test]
fn test_render_spec_writes_valid_pdf() {
    let path = temp_pdf("render_spec");
    let placements =
        pageflow::render_spec(&small_spec(), &RasterChartRenderer::new(), &path).unwrap();
    assert_eq!(placements.len(), 2);

    let bytes = std::fs::read(&path).unwrap();
    assert_valid_pdf(&bytes);
    assert!(
        bytes.windows(4).any(|w| w == b"/Im0"),
        "chart image should be embedded"
    );
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_render_spec_with_null_renderer_still_completes() {
    // Every chart collapses to "no data" — the document must still come out
    // complete and paginated.
    let path = temp_pdf("null_renderer");
    let placements = pageflow::render_spec(&small_spec(), &NullChartRenderer, &path).unwrap();
    assert_eq!(placements.len(), 2);
    let bytes = std::fs::read(&path).unwrap();
    assert_valid_pdf(&bytes);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_render_json_with_cover() {
    let json = r#"{
        "metadata": { "title": "Covered" },
        "cover": { "title": "Covered", "subtitle": "2026" },
        "sections": [{
            "title": "S",
            "elements": [
                { "type": "bar", "title": "B",
                  "bars": [ { "label": "x", "value": 1.0 } ] }
            ]
        }]
    }"#;
    let path = temp_pdf("with_cover");
    let placements = pageflow::render_json(json, &path).unwrap();
    // The cover occupies page 1; the section starts on page 2.
    assert_eq!(placements[0].page, 2);
    assert_valid_pdf(&std::fs::read(&path).unwrap());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_render_json_rejects_bad_input() {
    let path = temp_pdf("bad_input");
    let err = pageflow::render_json("{ not json", &path).unwrap_err();
    assert!(matches!(err, pageflow::ReportError::Parse(_)));
    assert!(!path.exists(), "no partial file may be left behind");
}

// ─── Statistics → Spec Pipeline ─────────────────────────────────

#[test]
fn test_stats_feed_report_elements() {
    use pageflow::stats;

    let revenues = [1200.0, 7400.0, 23000.0, 61000.0, 9800.0];
    let bars = stats::bucket_sums(&revenues, &[5000.0, 15000.0, 50000.0]);

    let accounts = vec![
        LabeledValue::new("Northwind", 412_000.0),
        LabeledValue::new("Contoso", 201_000.0),
        LabeledValue::new("Fabrikam", 268_000.0),
    ];
    let mut lines = vec!["Based on total invoiced and paid amounts:".to_string()];
    for entry in stats::top_n(&accounts, 2) {
        lines.push(format!("- {} - {}", entry.label, stats::format_amount(entry.value)));
    }
    assert!(lines[1].starts_with("- Northwind"));

    let spec = ReportSpec {
        metadata: Metadata::default(),
        cover: None,
        sections: vec![SectionSpec {
            title: "Revenue".to_string(),
            elements: vec![
                ElementSpec::Bar {
                    title: "Revenue by account band".to_string(),
                    bars,
                    full_width: false,
                    height: None,
                },
                ElementSpec::Text {
                    title: "Top accounts".to_string(),
                    lines,
                    full_width: true,
                    height: None,
                },
            ],
        }],
    };

    let path = temp_pdf("stats_pipeline");
    let placements = pageflow::render_spec(&spec, &RasterChartRenderer::new(), &path).unwrap();
    assert_eq!(placements.len(), 2);
    assert_valid_pdf(&std::fs::read(&path).unwrap());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_base64_image_element_embeds() {
    use base64::Engine;
    use image::ImageEncoder;

    let mut img = image::RgbaImage::new(2, 2);
    for p in img.pixels_mut() {
        *p = image::Rgba([30, 120, 200, 255]);
    }
    let mut png = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png);
    encoder
        .write_image(img.as_raw(), 2, 2, image::ColorType::Rgba8)
        .unwrap();
    let data = base64::engine::general_purpose::STANDARD.encode(&png);

    let spec = ReportSpec {
        metadata: Metadata::default(),
        cover: None,
        sections: vec![SectionSpec {
            title: "Pre-rendered".to_string(),
            elements: vec![ElementSpec::Image {
                title: "External chart".to_string(),
                data,
                kind: ChartKind::Pie,
                full_width: false,
                height: None,
            }],
        }],
    };

    let path = temp_pdf("base64_image");
    pageflow::render_spec(&spec, &NullChartRenderer, &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_valid_pdf(&bytes);
    assert!(bytes.windows(4).any(|w| w == b"/Im0"), "image not embedded");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_invalid_base64_image_degrades_to_placeholder() {
    let spec = ReportSpec {
        metadata: Metadata::default(),
        cover: None,
        sections: vec![SectionSpec {
            title: "Broken".to_string(),
            elements: vec![ElementSpec::Image {
                title: "Bad data".to_string(),
                data: "%%not-base64%%".to_string(),
                kind: ChartKind::Pie,
                full_width: false,
                height: None,
            }],
        }],
    };

    let path = temp_pdf("bad_base64");
    let placements = pageflow::render_spec(&spec, &NullChartRenderer, &path).unwrap();
    assert_eq!(placements.len(), 1, "document still completes");
    assert_valid_pdf(&std::fs::read(&path).unwrap());
    let _ = std::fs::remove_file(&path);
}
