//! Image page stage: place one image on its own page.
//!
//! ## Page geometry
//!
//! An image keeps its natural size in points (1 px = 1 pt) unless it would
//! not fit inside the reference page minus the margin on every side. In that
//! case it is scaled down uniformly by
//! `min(usable_w / img_w, usable_h / img_h)`. The page is then sized to the
//! final image plus the margin, so a small image gets a small page.
//!
//! ## Failure
//!
//! Image problems never abort a merge. Anything that goes wrong between the
//! downloaded bytes and the embedded XObject turns into a single placeholder
//! page on the reference page size carrying a red "Error loading image" line.

use crate::config::{MergeConfig, PageSize};
use crate::error::RenderIssue;
use crate::pipeline::classify::DEFAULT_IMAGE_MIME;
use crate::pipeline::document::OutputDocument;
use crate::pipeline::encode::{
    decode_png, embed_format, needs_reencode, read_jpeg_header, reencode_to_jpeg, DecodedPng,
    EmbedFormat, JpegInfo,
};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object};
use tracing::{debug, warn};

/// Text drawn on a placeholder page.
pub const PLACEHOLDER_TEXT: &str = "Error loading image";

/// Outcome of appending one image item. Either way, exactly one page was added.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePage {
    Rendered {
        page_width: f32,
        page_height: f32,
        scale: f32,
    },
    Placeholder {
        reason: RenderIssue,
    },
}

/// Where and how large an image is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageLayout {
    pub page: PageSize,
    pub draw_width: f32,
    pub draw_height: f32,
    pub offset: f32,
    /// 1.0 when the image fits unscaled.
    pub scale: f32,
}

/// Compute the page for an image of `img_w` × `img_h` points.
pub fn fit_image(
    img_w: f32,
    img_h: f32,
    reference: PageSize,
    margin: f32,
) -> Result<ImageLayout, RenderIssue> {
    if !(img_w > 0.0 && img_h > 0.0) {
        return Err(RenderIssue::Layout(format!(
            "image has no area ({img_w}×{img_h})"
        )));
    }
    let (max_w, max_h) = reference.usable_area(margin);

    let scale = if img_w > max_w || img_h > max_h {
        (max_w / img_w).min(max_h / img_h)
    } else {
        1.0
    };
    let draw_width = img_w * scale;
    let draw_height = img_h * scale;

    Ok(ImageLayout {
        page: PageSize {
            width: draw_width + 2.0 * margin,
            height: draw_height + 2.0 * margin,
        },
        draw_width,
        draw_height,
        offset: margin,
        scale,
    })
}

/// Image data ready to become an XObject.
enum Prepared {
    Jpeg(Vec<u8>, JpegInfo),
    Png(DecodedPng),
}

impl Prepared {
    fn dimensions(&self) -> (u32, u32) {
        match self {
            Prepared::Jpeg(_, info) => (info.width, info.height),
            Prepared::Png(png) => (png.width, png.height),
        }
    }
}

fn prepare(bytes: &[u8], mime: &str, quality: u8) -> Result<Prepared, RenderIssue> {
    if needs_reencode(mime) {
        debug!("Re-encoding {} to JPEG", mime);
        let jpeg = reencode_to_jpeg(bytes, quality)?;
        let info = read_jpeg_header(&jpeg)?;
        return Ok(Prepared::Jpeg(jpeg, info));
    }
    match embed_format(mime) {
        EmbedFormat::Png => Ok(Prepared::Png(decode_png(bytes)?)),
        EmbedFormat::Jpeg => {
            let info = read_jpeg_header(bytes)?;
            Ok(Prepared::Jpeg(bytes.to_vec(), info))
        }
    }
}

fn encode_content(operations: Vec<Operation>) -> Result<Vec<u8>, RenderIssue> {
    Content { operations }
        .encode()
        .map_err(|e| RenderIssue::Layout(e.to_string()))
}

fn try_append(
    out: &mut OutputDocument,
    bytes: &[u8],
    mime: &str,
    config: &MergeConfig,
) -> Result<ImageLayout, RenderIssue> {
    let prepared = prepare(bytes, mime, config.jpeg_quality)?;
    let (w, h) = prepared.dimensions();
    let layout = fit_image(w as f32, h as f32, config.reference_page, config.page_margin)?;

    // Nothing is added to the document until every fallible step succeeded.
    let content = encode_content(vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                Object::Real(layout.draw_width),
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(layout.draw_height),
                Object::Real(layout.offset),
                Object::Real(layout.offset),
            ],
        ),
        Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
        Operation::new("Q", vec![]),
    ])?;

    let xobject = match prepared {
        Prepared::Jpeg(data, info) => out.embed_jpeg(data, &info),
        Prepared::Png(png) => out.embed_png(png),
    };
    let resources = Dictionary::from_iter([(
        "XObject",
        Object::Dictionary(Dictionary::from_iter([("Im0", Object::Reference(xobject))])),
    )]);
    out.add_page(layout.page, resources, content);
    Ok(layout)
}

/// Append a placeholder page of `size` with the error text.
pub fn append_placeholder(out: &mut OutputDocument, size: PageSize) {
    let font = out.helvetica();
    let operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(20)]),
        Operation::new(
            "rg",
            vec![Object::Integer(1), Object::Integer(0), Object::Integer(0)],
        ),
        Operation::new(
            "Td",
            vec![Object::Integer(50), Object::Real(size.height - 100.0)],
        ),
        Operation::new("Tj", vec![Object::string_literal(PLACEHOLDER_TEXT)]),
        Operation::new("ET", vec![]),
    ];
    // Fixed operator list; encoding cannot fail, but an empty page is still a page.
    let content = encode_content(operations).unwrap_or_default();
    let resources = Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font))])),
    )]);
    out.add_page(size, resources, content);
}

/// Append one image item as exactly one page.
///
/// `mime` falls back to `image/jpeg` when unknown.
pub fn append_image_page(
    out: &mut OutputDocument,
    bytes: &[u8],
    mime: Option<&str>,
    config: &MergeConfig,
) -> ImagePage {
    let mime = mime.unwrap_or(DEFAULT_IMAGE_MIME);
    match try_append(out, bytes, mime, config) {
        Ok(layout) => {
            debug!(
                "Image page {:.0}×{:.0}pt (scale {:.3})",
                layout.page.width, layout.page.height, layout.scale
            );
            ImagePage::Rendered {
                page_width: layout.page.width,
                page_height: layout.page.height,
                scale: layout.scale,
            }
        }
        Err(reason) => {
            warn!("Image could not be embedded ({}), adding placeholder page", reason);
            append_placeholder(out, config.reference_page);
            ImagePage::Placeholder { reason }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use lopdf::Document;
    use std::io::Cursor;

    fn jpeg(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([200, 100, 50])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .unwrap();
        buf
    }

    #[test]
    fn small_image_is_not_scaled() {
        let l = fit_image(100.0, 50.0, PageSize::LEGAL, 20.0).unwrap();
        assert_eq!(l.scale, 1.0);
        assert_eq!(l.page, PageSize { width: 140.0, height: 90.0 });
        assert_eq!(l.offset, 20.0);
    }

    #[test]
    fn oversized_image_is_scaled_to_usable_area() {
        // 1144 wide → 572 usable, scale 0.5
        let l = fit_image(1144.0, 800.0, PageSize::LEGAL, 20.0).unwrap();
        assert!((l.scale - 0.5).abs() < 1e-6);
        assert!((l.draw_width - 572.0).abs() < 1e-3);
        assert!((l.page.width - 612.0).abs() < 1e-3);
        assert!(l.page.height <= PageSize::LEGAL.height);
    }

    #[test]
    fn tall_image_limited_by_height() {
        let l = fit_image(100.0, 1936.0, PageSize::LEGAL, 20.0).unwrap();
        assert!((l.draw_height - 968.0).abs() < 1e-3);
        assert!((l.page.height - 1008.0).abs() < 1e-3);
    }

    #[test]
    fn zero_sized_image_rejected() {
        assert!(matches!(
            fit_image(0.0, 10.0, PageSize::LEGAL, 20.0),
            Err(RenderIssue::Layout(_))
        ));
    }

    #[test]
    fn jpeg_becomes_one_page() {
        let mut out = OutputDocument::new();
        let page = append_image_page(&mut out, &jpeg(30, 20), Some("image/jpeg"), &MergeConfig::default());
        assert_eq!(
            page,
            ImagePage::Rendered {
                page_width: 70.0,
                page_height: 60.0,
                scale: 1.0
            }
        );
        assert_eq!(out.page_count(), 1);
    }

    #[test]
    fn corrupt_image_becomes_placeholder() {
        let mut out = OutputDocument::new();
        let page = append_image_page(&mut out, b"not an image", Some("image/jpeg"), &MergeConfig::default());
        assert!(matches!(page, ImagePage::Placeholder { reason: RenderIssue::Jpeg(_) }));
        assert_eq!(out.page_count(), 1);

        let doc = Document::load_mem(&out.finish().unwrap()).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        let needle = PLACEHOLDER_TEXT.as_bytes();
        assert!(content.windows(needle.len()).any(|w| w == needle));
        let media_box = doc.get_dictionary(page_id).unwrap().get(b"MediaBox").unwrap().as_array().unwrap().clone();
        assert_eq!(media_box[3].as_float().unwrap(), 1008.0);
    }

    #[test]
    fn unknown_mime_treated_as_jpeg() {
        let mut out = OutputDocument::new();
        let page = append_image_page(&mut out, &jpeg(10, 10), None, &MergeConfig::default());
        assert!(matches!(page, ImagePage::Rendered { .. }));
    }
}
