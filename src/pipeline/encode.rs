//! Image codec stage: bring raw image bytes into an embeddable form.
//!
//! PDF can carry JPEG data verbatim (`DCTDecode`), so JPEGs are never
//! decoded: only their frame header is read for size and component count.
//! PNGs are decoded to raw samples plus an optional alpha plane. Every other
//! format (GIF, BMP, WebP, TIFF) is decoded once and re-encoded to JPEG.

use crate::error::RenderIssue;
use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;
use tracing::debug;

/// How an image ends up embedded in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedFormat {
    Jpeg,
    Png,
}

/// Whether `mime` must be re-encoded to JPEG before embedding.
pub fn needs_reencode(mime: &str) -> bool {
    let m = mime.to_lowercase();
    !(m.contains("jpeg") || m.contains("png"))
}

/// Embed codec for an image whose (final) MIME type is `mime`.
pub fn embed_format(mime: &str) -> EmbedFormat {
    if mime.to_lowercase().contains("png") {
        EmbedFormat::Png
    } else {
        EmbedFormat::Jpeg
    }
}

/// Decode any supported raster format and re-encode it as baseline RGB JPEG.
///
/// Alpha is dropped.
pub fn reencode_to_jpeg(bytes: &[u8], quality: u8) -> Result<Vec<u8>, RenderIssue> {
    let img = image::load_from_memory(bytes).map_err(|e| RenderIssue::Reencode(e.to_string()))?;
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))
        .map_err(|e| RenderIssue::Reencode(e.to_string()))?;
    debug!(
        "Re-encoded {}x{} image → {} bytes JPEG (q={})",
        rgb.width(),
        rgb.height(),
        out.len(),
        quality
    );
    Ok(out)
}

/// Frame parameters of a JPEG stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegInfo {
    pub width: u32,
    pub height: u32,
    pub components: u8,
    pub bits_per_component: u8,
}

/// Read the SOFn frame header of a JPEG without decoding the scan data.
pub fn read_jpeg_header(bytes: &[u8]) -> Result<JpegInfo, RenderIssue> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return Err(RenderIssue::Jpeg("missing SOI marker".into()));
    }

    let mut pos = 2;
    while pos + 1 < bytes.len() {
        if bytes[pos] != 0xFF {
            return Err(RenderIssue::Jpeg(format!("expected marker at offset {pos}")));
        }
        let marker = bytes[pos + 1];
        match marker {
            // Fill byte.
            0xFF => {
                pos += 1;
                continue;
            }
            // Standalone markers carry no length.
            0x01 | 0xD0..=0xD8 => {
                pos += 2;
                continue;
            }
            0xD9 | 0xDA => break,
            _ => {}
        }

        if pos + 3 >= bytes.len() {
            break;
        }
        let seg_len = usize::from(u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]));

        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            if pos + 9 >= bytes.len() || seg_len < 8 {
                return Err(RenderIssue::Jpeg("truncated frame header".into()));
            }
            return Ok(JpegInfo {
                bits_per_component: bytes[pos + 4],
                height: u32::from(u16::from_be_bytes([bytes[pos + 5], bytes[pos + 6]])),
                width: u32::from(u16::from_be_bytes([bytes[pos + 7], bytes[pos + 8]])),
                components: bytes[pos + 9],
            });
        }

        pos += 2 + seg_len;
    }

    Err(RenderIssue::Jpeg("no SOF marker before scan data".into()))
}

/// Sample layout of a decoded PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelSpace {
    Gray,
    Rgb,
}

/// 8-bit samples of a PNG, ready for a raw image XObject.
#[derive(Debug, Clone)]
pub struct DecodedPng {
    pub width: u32,
    pub height: u32,
    pub space: PixelSpace,
    pub pixels: Vec<u8>,
    /// Present only when at least one pixel is not fully opaque.
    pub alpha: Option<Vec<u8>>,
}

/// Decode PNG bytes into 8-bit gray or RGB samples plus an optional alpha plane.
pub fn decode_png(bytes: &[u8]) -> Result<DecodedPng, RenderIssue> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| RenderIssue::Decode(e.to_string()))?;
    let color = img.color();

    let alpha = if color.has_alpha() {
        let plane: Vec<u8> = img.to_rgba8().pixels().map(|p| p.0[3]).collect();
        Some(plane).filter(|a| a.iter().any(|&v| v != u8::MAX))
    } else {
        None
    };

    let (space, pixels) = if color.has_color() {
        (PixelSpace::Rgb, img.to_rgb8().into_raw())
    } else {
        (PixelSpace::Gray, img.to_luma8().into_raw())
    };

    Ok(DecodedPng {
        width: img.width(),
        height: img.height(),
        space,
        pixels,
        alpha,
    })
}
