//! # PDF Canvas
//!
//! The canvas backend that turns the engine's draw calls into a PDF file.
//!
//! This is a from-scratch PDF 1.7 writer. Writing the raw bytes ourselves
//! keeps the crate self-contained and the output fully under our control;
//! the subset of the spec a chart report needs — text in the standard
//! Helvetica fonts, rectangles, lines, and image XObjects — is small.
//!
//! ## Structure of the output
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- Catalog
//! 2 0 obj ... endobj  <- Pages tree
//! 3..5                <- the three Helvetica font objects
//! ...                 <- image XObjects, then per page: content + page dict
//! xref                <- byte offsets of every object
//! trailer             <- points at the Catalog (and Info, if any)
//! %%EOF
//! ```
//!
//! The whole document accumulates in memory; nothing touches the filesystem
//! until `save`, so a failed report never leaves a partial file behind.

use std::fmt::Write as FmtWrite;
use std::io;
use std::path::Path;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::canvas::{Canvas, CanvasError, Color, DecodeError};
use crate::font::StandardFont;
use crate::image_data::{self, EmbeddableImage, ImageData};
use crate::model::Metadata;

/// Compression level for content streams and pixel data.
const DEFLATE_LEVEL: u8 = 6;

/// A canvas that renders into an in-memory PDF document.
pub struct PdfCanvas {
    page_width: f64,
    page_height: f64,
    metadata: Metadata,
    finished: Vec<PageRecord>,
    current: Option<PageRecord>,
    images: Vec<EmbeddableImage>,
}

/// One page's accumulated content stream plus the images it references.
struct PageRecord {
    stream: String,
    image_refs: Vec<usize>,
}

impl PageRecord {
    fn new() -> Self {
        Self {
            stream: String::new(),
            image_refs: Vec::new(),
        }
    }
}

impl PdfCanvas {
    pub fn new(page_width: f64, page_height: f64, metadata: Metadata) -> Self {
        Self {
            page_width,
            page_height,
            metadata,
            finished: Vec::new(),
            current: None,
            images: Vec::new(),
        }
    }

    /// The serialized document. Exposed for tests; `save` is the normal path.
    pub fn to_bytes(&mut self) -> Vec<u8> {
        self.close_page();
        self.serialize()
    }

    fn font_resource(font: StandardFont) -> &'static str {
        match font {
            StandardFont::Helvetica => "F1",
            StandardFont::HelveticaBold => "F2",
            StandardFont::HelveticaOblique => "F3",
        }
    }

    /// Escape a string for a PDF literal string: backslash the delimiters,
    /// octal-escape the Latin-1 range, drop anything beyond it to '?'.
    fn escape_text(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match ch {
                '(' => out.push_str("\\("),
                ')' => out.push_str("\\)"),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                c if (c as u32) < 0x80 => out.push(c),
                c if (c as u32) <= 0xFF => {
                    let _ = write!(out, "\\{:03o}", c as u32);
                }
                _ => out.push('?'),
            }
        }
        out
    }

    fn serialize(&self) -> Vec<u8> {
        // Index 0 is the conventional free object; 1 = Catalog, 2 = Pages.
        let mut objects: Vec<Vec<u8>> = vec![Vec::new(), Vec::new(), Vec::new()];

        // The three standard fonts, objects 3..=5.
        for font in [
            StandardFont::Helvetica,
            StandardFont::HelveticaBold,
            StandardFont::HelveticaOblique,
        ] {
            objects.push(
                format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} >>",
                    font.pdf_name()
                )
                .into_bytes(),
            );
        }

        // Image XObjects. Each entry maps image index -> object id.
        let mut image_obj_ids: Vec<usize> = Vec::with_capacity(self.images.len());
        for img in &self.images {
            image_obj_ids.push(Self::push_image_objects(&mut objects, img));
        }

        // Pages: content stream object followed by the page dictionary.
        let mut page_obj_ids: Vec<usize> = Vec::new();
        for page in &self.finished {
            let compressed = compress_to_vec_zlib(page.stream.as_bytes(), DEFLATE_LEVEL);
            let content_id = objects.len();
            let mut content = format!(
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            )
            .into_bytes();
            content.extend_from_slice(&compressed);
            content.extend_from_slice(b"\nendstream");
            objects.push(content);

            let mut resources = String::from("/Font << /F1 3 0 R /F2 4 0 R /F3 5 0 R >>");
            if !page.image_refs.is_empty() {
                let xobjects: String = page
                    .image_refs
                    .iter()
                    .map(|i| format!("/Im{} {} 0 R", i, image_obj_ids[*i]))
                    .collect::<Vec<_>>()
                    .join(" ");
                let _ = write!(resources, " /XObject << {} >>", xobjects);
            }

            let page_id = objects.len();
            objects.push(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                     /Contents {} 0 R /Resources << {} >> >>",
                    self.page_width, self.page_height, content_id, resources
                )
                .into_bytes(),
            );
            page_obj_ids.push(page_id);
        }

        objects[1] = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        objects[2] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_id = self.push_info_object(&mut objects);

        // Assemble: header, objects with recorded offsets, xref, trailer.
        let mut out: Vec<u8> = Vec::new();
        out.extend_from_slice(b"%PDF-1.7\n");
        let mut offsets: Vec<usize> = vec![0; objects.len()];
        for (id, data) in objects.iter().enumerate().skip(1) {
            offsets[id] = out.len();
            out.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
            out.extend_from_slice(data);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_offset = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", objects.len()).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }

        let info_entry = info_id
            .map(|id| format!(" /Info {} 0 R", id))
            .unwrap_or_default();
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R{} >>\nstartxref\n{}\n%%EOF\n",
                objects.len(),
                info_entry,
                xref_offset
            )
            .as_bytes(),
        );
        out
    }

    /// Append the XObject(s) for one image; returns the main object id.
    /// A translucent PNG contributes two objects: the SMask first, then the
    /// color data referencing it.
    fn push_image_objects(objects: &mut Vec<Vec<u8>>, img: &EmbeddableImage) -> usize {
        match &img.data {
            ImageData::Jpeg { bytes, grayscale } => {
                let color_space = if *grayscale { "DeviceGray" } else { "DeviceRGB" };
                let id = objects.len();
                let mut obj = format!(
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /{} /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
                    img.width_px,
                    img.height_px,
                    color_space,
                    bytes.len()
                )
                .into_bytes();
                obj.extend_from_slice(bytes);
                obj.extend_from_slice(b"\nendstream");
                objects.push(obj);
                id
            }
            ImageData::Rgb { rgb, alpha } => {
                let smask_ref = alpha.as_ref().map(|alpha| {
                    let compressed = compress_to_vec_zlib(alpha, DEFLATE_LEVEL);
                    let id = objects.len();
                    let mut obj = format!(
                        "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode /Length {} >>\nstream\n",
                        img.width_px,
                        img.height_px,
                        compressed.len()
                    )
                    .into_bytes();
                    obj.extend_from_slice(&compressed);
                    obj.extend_from_slice(b"\nendstream");
                    objects.push(obj);
                    id
                });

                let compressed = compress_to_vec_zlib(rgb, DEFLATE_LEVEL);
                let smask_entry = smask_ref
                    .map(|id| format!(" /SMask {} 0 R", id))
                    .unwrap_or_default();
                let id = objects.len();
                let mut obj = format!(
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode{} /Length {} >>\nstream\n",
                    img.width_px,
                    img.height_px,
                    smask_entry,
                    compressed.len()
                )
                .into_bytes();
                obj.extend_from_slice(&compressed);
                obj.extend_from_slice(b"\nendstream");
                objects.push(obj);
                id
            }
        }
    }

    fn push_info_object(&self, objects: &mut Vec<Vec<u8>>) -> Option<usize> {
        let m = &self.metadata;
        if m.title.is_none() && m.author.is_none() && m.subject.is_none() {
            return None;
        }
        let mut info = String::from("<< ");
        if let Some(title) = &m.title {
            let _ = write!(info, "/Title ({}) ", Self::escape_text(title));
        }
        if let Some(author) = &m.author {
            let _ = write!(info, "/Author ({}) ", Self::escape_text(author));
        }
        if let Some(subject) = &m.subject {
            let _ = write!(info, "/Subject ({}) ", Self::escape_text(subject));
        }
        info.push_str("/Producer (pageflow) >>");
        let id = objects.len();
        objects.push(info.into_bytes());
        Some(id)
    }
}

impl Canvas for PdfCanvas {
    fn new_page(&mut self) -> Result<(), CanvasError> {
        self.close_page();
        self.current = Some(PageRecord::new());
        Ok(())
    }

    fn close_page(&mut self) {
        if let Some(page) = self.current.take() {
            self.finished.push(page);
        }
    }

    fn page_count(&self) -> usize {
        self.finished.len() + usize::from(self.current.is_some())
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color) {
        let Some(page) = self.current.as_mut() else {
            return;
        };
        let _ = write!(
            page.stream,
            "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
            color.r, color.g, color.b, x, y, w, h
        );
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color, line_width: f64) {
        let Some(page) = self.current.as_mut() else {
            return;
        };
        let _ = write!(
            page.stream,
            "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n{:.2} {:.2} {:.2} {:.2} re\nS\nQ\n",
            color.r, color.g, color.b, line_width, x, y, w, h
        );
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Color, line_width: f64) {
        let Some(page) = self.current.as_mut() else {
            return;
        };
        let _ = write!(
            page.stream,
            "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
            color.r, color.g, color.b, line_width, x1, y1, x2, y2
        );
    }

    fn draw_text(&mut self, x: f64, y: f64, text: &str, font: StandardFont, size: f64, color: Color) {
        let escaped = Self::escape_text(text);
        let Some(page) = self.current.as_mut() else {
            return;
        };
        let _ = write!(
            page.stream,
            "BT\n/{} {:.1} Tf\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} Td\n({}) Tj\nET\n",
            Self::font_resource(font),
            size,
            color.r,
            color.g,
            color.b,
            x,
            y,
            escaped
        );
    }

    fn draw_image(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        bytes: &[u8],
    ) -> Result<(), DecodeError> {
        let decoded = image_data::decode(bytes)?;
        let index = self.images.len();
        self.images.push(decoded);

        let Some(page) = self.current.as_mut() else {
            return Ok(());
        };
        page.image_refs.push(index);
        let _ = write!(
            page.stream,
            "q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
            w, h, x, y, index
        );
        Ok(())
    }

    fn save(&mut self, path: &Path) -> io::Result<()> {
        let bytes = self.to_bytes();
        std::fs::write(path, bytes)
    }
}
