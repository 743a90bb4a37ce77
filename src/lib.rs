//! # pageflow
//!
//! A two-column page-flow engine for paginated chart reports.
//!
//! Dashboards scroll; reports paginate. A report is a stream of
//! self-contained elements — charts rendered to raster images, short
//! bulleted text blocks — and the hard part is deciding where each one
//! lands: which page, which column, at what vertical offset, with page
//! breaks that never slice an element in half. pageflow makes the page the
//! fundamental unit of layout: elements flow INTO fixed-size pages, two
//! columns at a time, and a row closes at the height of its tallest member.
//!
//! ## Architecture
//!
//! ```text
//! Input (ReportSpec JSON / API)
//!       ↓
//!   [model]    — elements, page geometry, placements
//!       ↓
//!   [stats]    — label/value aggregation for chart data
//!       ↓
//!   [chart]    — chart data rendered to raster bytes
//!       ↓
//!   [layout]   — cursor + box renderer + page-flow engine
//!       ↓
//!   [pdf]      — canvas backend, serializes to PDF bytes
//! ```
//!
//! The engine draws through the [`canvas::Canvas`] trait, so the layout
//! logic is testable against a recording double and the PDF writer is just
//! one backend.

pub mod canvas;
pub mod chart;
pub mod error;
pub mod font;
pub mod image_data;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod stats;
pub mod text;

use std::path::Path;
use std::sync::mpsc;

use chart::{ChartRenderer, RasterChartRenderer};
use layout::PageFlowEngine;
use model::{PageGeometry, PlacementMap, ReportElement, ReportSpec};
use pdf::PdfCanvas;

pub use error::ReportError;

/// Render a report spec to a PDF file at `path`.
///
/// This is the primary entry point. Success returns the element-by-page
/// placement map; failure returns the first document-level error without
/// leaving a partial file behind.
pub fn render_spec(
    spec: &ReportSpec,
    renderer: &dyn ChartRenderer,
    path: &Path,
) -> Result<PlacementMap, ReportError> {
    render_spec_inner(spec, renderer, path, None)
}

/// Like [`render_spec`], with textual progress updates streamed into the
/// given channel while generation runs (typically on a worker thread).
pub fn render_spec_with_progress(
    spec: &ReportSpec,
    renderer: &dyn ChartRenderer,
    path: &Path,
    progress: mpsc::Sender<String>,
) -> Result<PlacementMap, ReportError> {
    render_spec_inner(spec, renderer, path, Some(progress))
}

/// Render a report described as JSON, painting charts with the built-in
/// raster renderer.
pub fn render_json(json: &str, path: &Path) -> Result<PlacementMap, ReportError> {
    let spec: ReportSpec = serde_json::from_str(json)?;
    render_spec(&spec, &RasterChartRenderer::new(), path)
}

fn render_spec_inner(
    spec: &ReportSpec,
    renderer: &dyn ChartRenderer,
    path: &Path,
    progress: Option<mpsc::Sender<String>>,
) -> Result<PlacementMap, ReportError> {
    let geometry = PageGeometry::default();
    let canvas = PdfCanvas::new(
        geometry.page_width,
        geometry.page_height,
        spec.metadata.clone(),
    );
    let mut engine = PageFlowEngine::new(canvas, geometry.clone());
    if let Some(tx) = progress {
        engine = engine.with_progress(tx);
    }

    if let Some(cover) = &spec.cover {
        engine.cover_page(&cover.title, cover.subtitle.as_deref())?;
    }

    for section in &spec.sections {
        let elements: Vec<ReportElement> = section
            .elements
            .iter()
            .map(|e| e.build(renderer, &geometry))
            .collect();
        engine.layout_section(&section.title, &elements)?;
    }

    engine.finalize(path)
}
