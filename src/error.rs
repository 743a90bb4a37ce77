//! Structured error types for the pageflow report engine.
//!
//! Only document-level failures surface here. Element-level problems (a chart
//! with no data, an image that fails to decode) are contained inside the box
//! renderer and turn into visible placeholder boxes — a report with some
//! missing data still produces a complete, correctly paginated file.

use thiserror::Error;

/// The unified error type returned by the public pageflow API.
#[derive(Debug, Error)]
pub enum ReportError {
    /// JSON input failed to parse as a report spec.
    #[error("failed to parse report spec: {0}")]
    Parse(#[from] serde_json::Error),

    /// A page- or document-level canvas operation failed.
    #[error("canvas error: {0}")]
    Canvas(String),

    /// Writing the finished document to disk failed. No partial file is left
    /// behind: the document only exists in memory until the final write.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A placed element extends past the bottom margin. Unreachable while the
    /// page-break algorithm holds its invariants; if it fires, it is a bug in
    /// the engine, not a condition to recover from.
    #[error("layout overflow on page {page}: element '{title}' bottom edge at {bottom:.1}pt is below the margin")]
    LayoutOverflow {
        page: usize,
        title: String,
        bottom: f64,
    },
}

impl From<crate::canvas::CanvasError> for ReportError {
    fn from(e: crate::canvas::CanvasError) -> Self {
        ReportError::Canvas(e.0)
    }
}
