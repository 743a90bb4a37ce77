//! # Chart Image Decoding
//!
//! Prepares the raster bytes a chart renderer produced for PDF embedding.
//! JPEG data passes through untouched — the PDF format carries DCTDecode
//! streams natively — while PNG data is decoded to RGB pixels with the alpha
//! channel split off for SMask transparency.

use std::io::Cursor;

use crate::canvas::DecodeError;

/// A decoded image ready to become a PDF XObject.
#[derive(Debug, Clone)]
pub struct EmbeddableImage {
    pub width_px: u32,
    pub height_px: u32,
    pub data: ImageData,
}

/// Pixel payload in the form the PDF serializer writes directly.
#[derive(Debug, Clone)]
pub enum ImageData {
    /// Raw JPEG bytes, embedded as-is with DCTDecode.
    Jpeg { bytes: Vec<u8>, grayscale: bool },
    /// Decoded RGB triples plus an optional grayscale alpha channel.
    Rgb {
        rgb: Vec<u8>,
        alpha: Option<Vec<u8>>,
    },
}

/// Sniff the format from magic bytes and decode accordingly.
pub fn decode(bytes: &[u8]) -> Result<EmbeddableImage, DecodeError> {
    if bytes.len() < 4 {
        return Err(DecodeError("image data too short".to_string()));
    }
    if is_jpeg(bytes) {
        decode_jpeg(bytes)
    } else if is_png(bytes) {
        decode_png(bytes)
    } else {
        Err(DecodeError(
            "unsupported image format (expected JPEG or PNG)".to_string(),
        ))
    }
}

fn is_jpeg(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xD8
}

fn is_png(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes[0] == 0x89 && bytes[1] == 0x50 && bytes[2] == 0x4E && bytes[3] == 0x47
}

/// JPEG: read dimensions only, pass the bytes through.
fn decode_jpeg(bytes: &[u8]) -> Result<EmbeddableImage, DecodeError> {
    let reader = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError(format!("jpeg format detection: {}", e)))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| DecodeError(format!("jpeg dimensions: {}", e)))?;

    Ok(EmbeddableImage {
        width_px: width,
        height_px: height,
        data: ImageData::Jpeg {
            bytes: bytes.to_vec(),
            grayscale: jpeg_is_grayscale(bytes),
        },
    })
}

/// Walk the JPEG marker segments to the SOF header and read the component
/// count: 1 means DeviceGray, anything else is treated as DeviceRGB.
fn jpeg_is_grayscale(bytes: &[u8]) -> bool {
    let mut i = 2; // past SOI
    while i + 1 < bytes.len() {
        if bytes[i] != 0xFF {
            break;
        }
        let marker = bytes[i + 1];
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof {
            if i + 9 < bytes.len() {
                return bytes[i + 9] == 1;
            }
            break;
        }
        if i + 3 < bytes.len() {
            let seg_len = u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]) as usize;
            i += 2 + seg_len;
        } else {
            break;
        }
    }
    false
}

/// PNG: decode to RGBA, split into RGB and (if any pixel is translucent) a
/// separate alpha channel.
fn decode_png(bytes: &[u8]) -> Result<EmbeddableImage, DecodeError> {
    let reader = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError(format!("png format detection: {}", e)))?;
    let img = reader
        .decode()
        .map_err(|e| DecodeError(format!("png decode: {}", e)))?;

    let rgba = img.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());

    let pixel_count = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    let mut has_transparency = false;

    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel[3]);
        if pixel[3] != 255 {
            has_transparency = true;
        }
    }

    Ok(EmbeddableImage {
        width_px: width,
        height_px: height,
        data: ImageData::Rgb {
            rgb,
            alpha: if has_transparency { Some(alpha) } else { None },
        },
    })
}
