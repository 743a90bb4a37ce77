//! # Page-Flow Engine
//!
//! This is the heart of pageflow and the reason it exists.
//!
//! A report is a stream of elements of known (or estimated) height. The
//! engine walks that stream exactly once and decides, for each element,
//! where it lands: which page, which column, which vertical offset. Pages
//! are the fundamental unit — an element is never sliced, it either fits in
//! the space that remains or it opens the next page.
//!
//! The placement policy:
//!
//! 1. Half-width elements fill a row left slot first, right slot second.
//!    The row stays open after the left element — y does not move until the
//!    row closes, and it closes at the height of its TALLEST member.
//! 2. Full-width elements own their row. If a row is half-open when one
//!    arrives, that row is force-closed first so nothing overlaps.
//! 3. Before placing, the engine asks the cursor whether the element fits
//!    above the page floor. If not, the open page is flushed and the next
//!    page of the same section starts with a fresh header, footer, and
//!    cursor.
//!
//! Element-level rendering problems (no data, broken image bytes) are
//! handled inside the box renderer and become placeholder boxes; the engine
//! itself only fails on page/file-level canvas errors, which abort the whole
//! report.

pub mod boxes;
pub mod cursor;

use std::path::Path;
use std::sync::mpsc;

use crate::canvas::{Canvas, Color};
use crate::error::ReportError;
use crate::font::{FontContext, StandardFont};
use crate::model::{
    ElementPlacement, PageGeometry, Placement, PlacementMap, Rect, ReportElement,
};
use boxes::{BoxRenderer, BORDER_GRAY};
use cursor::LayoutCursor;

pub(crate) const HEADER_BG: Color = Color {
    r: 41.0 / 255.0,
    g: 128.0 / 255.0,
    b: 185.0 / 255.0,
};
const FOOTER_INK: Color = Color {
    r: 0.25,
    g: 0.25,
    b: 0.25,
};

const HEADER_FONT_SIZE: f64 = 18.0;
const FOOTER_FONT_SIZE: f64 = 9.0;

/// Lays out one document. Strictly sequential, one instance per document —
/// column and row assignment is order-dependent, so the element stream of a
/// document must never be processed concurrently.
pub struct PageFlowEngine<C: Canvas> {
    canvas: C,
    geometry: PageGeometry,
    fonts: FontContext,
    cursor: LayoutCursor,
    page_open: bool,
    /// Page counter within the current section, shown in the header.
    section_page: usize,
    placements: PlacementMap,
    progress: Option<mpsc::Sender<String>>,
}

impl<C: Canvas> PageFlowEngine<C> {
    pub fn new(canvas: C, geometry: PageGeometry) -> Self {
        let cursor = LayoutCursor::new(geometry.clone());
        Self {
            canvas,
            geometry,
            fonts: FontContext::new(),
            cursor,
            page_open: false,
            section_page: 0,
            placements: Vec::new(),
            progress: None,
        }
    }

    /// Attach a progress stream. Generation emits short textual updates into
    /// it (section starts, page breaks, completion); a dropped receiver is
    /// silently ignored.
    pub fn with_progress(mut self, sender: mpsc::Sender<String>) -> Self {
        self.progress = Some(sender);
        self
    }

    fn emit(&self, message: String) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(message);
        }
    }

    /// Draw a standalone cover page before the first section: a colored
    /// banner with the report title, an optional subtitle, and a footer
    /// notice. Counts in the global page numbering.
    pub fn cover_page(&mut self, title: &str, subtitle: Option<&str>) -> Result<(), ReportError> {
        self.emit(format!("cover page: {}", title));
        if self.page_open {
            self.canvas.close_page();
            self.page_open = false;
        }
        self.canvas.new_page()?;

        let g = &self.geometry;
        self.canvas
            .fill_rect(0.0, g.page_height - 180.0, g.page_width, 180.0, HEADER_BG);

        let title_size = 32.0;
        let title_width = self
            .fonts
            .measure_string(title, StandardFont::HelveticaBold, title_size);
        self.canvas.draw_text(
            (g.page_width - title_width) / 2.0,
            g.page_height - 100.0,
            title,
            StandardFont::HelveticaBold,
            title_size,
            Color::WHITE,
        );

        if let Some(subtitle) = subtitle.filter(|s| !s.is_empty()) {
            let sub_size = 18.0;
            let sub_width = self
                .fonts
                .measure_string(subtitle, StandardFont::Helvetica, sub_size);
            self.canvas.draw_text(
                (g.page_width - sub_width) / 2.0,
                g.page_height - 130.0,
                subtitle,
                StandardFont::Helvetica,
                sub_size,
                Color::WHITE,
            );
        }

        let notice = "Confidential document";
        let notice_width = self
            .fonts
            .measure_string(notice, StandardFont::Helvetica, FOOTER_FONT_SIZE);
        self.canvas.draw_text(
            (g.page_width - notice_width) / 2.0,
            g.margin_bottom - 20.0,
            notice,
            StandardFont::Helvetica,
            FOOTER_FONT_SIZE,
            FOOTER_INK,
        );

        self.canvas.close_page();
        Ok(())
    }

    /// Lay out one section: a named group of elements sharing a running
    /// header. Always starts on a fresh page; spills onto as many pages as
    /// the element stream needs.
    pub fn layout_section(
        &mut self,
        section_title: &str,
        elements: &[ReportElement],
    ) -> Result<(), ReportError> {
        log::info!(
            "laying out section '{}' ({} elements)",
            section_title,
            elements.len()
        );
        self.emit(format!("section: {}", section_title));
        self.section_page = 0;
        self.start_page(section_title)?;

        for element in elements {
            let full_width = element.placement == Placement::FullWidth;
            let body_height = element.content_height();

            // A full-width element never shares a row: close a half-open one
            // before asking whether there is room.
            if full_width {
                self.cursor.close_row();
            }

            if !self.cursor.has_room_for(body_height) {
                self.start_page(section_title)?;
            }

            let g = &self.geometry;
            let (x, width, column) = if full_width {
                (g.margin_side, g.content_width(), None)
            } else {
                let col = self.cursor.column();
                (self.cursor.x_for(col), g.half_width(), Some(col.index()))
            };
            let rect = Rect {
                x,
                y: self.cursor.current_y(),
                width,
                height: body_height + g.title_bar_height,
            };

            // Unreachable while has_room_for holds its bound; fires only for
            // an element taller than a whole fresh page.
            if rect.y - rect.height < g.margin_bottom {
                return Err(ReportError::LayoutOverflow {
                    page: self.canvas.page_count(),
                    title: element.title.clone(),
                    bottom: rect.y - rect.height,
                });
            }

            let title_bar = g.title_bar_height;
            BoxRenderer::new(&mut self.canvas, &self.fonts, title_bar).render(
                rect,
                &element.title,
                &element.body,
            );

            self.placements.push(ElementPlacement {
                section: section_title.to_string(),
                title: element.title.clone(),
                page: self.canvas.page_count(),
                column,
                rect,
            });

            self.cursor.advance(body_height, full_width);
        }
        Ok(())
    }

    /// Flush the last page and persist the document. Success returns the
    /// element-by-page placement map; failure leaves no file behind.
    pub fn finalize(mut self, path: &Path) -> Result<PlacementMap, ReportError> {
        if self.page_open {
            self.canvas.close_page();
            self.page_open = false;
        }
        self.canvas.save(path)?;
        log::info!(
            "report written to {} ({} pages, {} elements)",
            path.display(),
            self.canvas.page_count(),
            self.placements.len()
        );
        self.emit(format!("report written to {}", path.display()));
        Ok(self.placements)
    }

    /// Flush the last page and hand back the canvas together with the
    /// placement map, without persisting anything. Lets tests inspect the
    /// recorded draw calls next to where each element landed.
    pub fn into_parts(mut self) -> (C, PlacementMap) {
        if self.page_open {
            self.canvas.close_page();
            self.page_open = false;
        }
        (self.canvas, self.placements)
    }

    /// Close any open page and open the next one in the section: header
    /// band, section title with page-in-section counter, divider rule,
    /// footer page number. Resets the cursor to the content start.
    fn start_page(&mut self, section_title: &str) -> Result<(), ReportError> {
        if self.page_open {
            self.canvas.close_page();
        }
        self.canvas.new_page()?;
        self.page_open = true;
        self.section_page += 1;

        let g = &self.geometry;
        self.canvas.fill_rect(
            0.0,
            g.page_height - g.margin_top + 20.0,
            g.page_width,
            g.margin_top - 20.0,
            HEADER_BG,
        );
        self.canvas.draw_text(
            g.margin_side,
            g.page_height - g.margin_top / 2.0 - 5.0,
            &format!("{} (page {})", section_title, self.section_page),
            StandardFont::HelveticaBold,
            HEADER_FONT_SIZE,
            Color::WHITE,
        );
        self.canvas.line(
            g.margin_side,
            g.page_height - g.margin_top,
            g.page_width - g.margin_side,
            g.page_height - g.margin_top,
            BORDER_GRAY,
            1.0,
        );

        let page_number = self.canvas.page_count();
        let footer = format!("Page {}", page_number);
        let footer_width = self
            .fonts
            .measure_string(&footer, StandardFont::Helvetica, FOOTER_FONT_SIZE);
        self.canvas.draw_text(
            (g.page_width - footer_width) / 2.0,
            g.margin_bottom - 20.0,
            &footer,
            StandardFont::Helvetica,
            FOOTER_FONT_SIZE,
            FOOTER_INK,
        );

        self.cursor.reset();
        if self.section_page > 1 {
            self.emit(format!(
                "section '{}' continues on page {}",
                section_title, page_number
            ));
        }
        Ok(())
    }
}
