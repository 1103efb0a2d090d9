//! The merged PDF under construction.
//!
//! [`OutputDocument`] wraps a `lopdf::Document` and owns its single page
//! tree. Pages are only ever appended, so the order of `kids` is the order
//! of the final document. The page-tree node, catalog and Info dictionary
//! are written once, by [`OutputDocument::finish`], which consumes the
//! document.

use crate::config::{DocumentInfo, PageSize};
use crate::error::MergeError;
use crate::pipeline::encode::{DecodedPng, JpegInfo, PixelSpace};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

/// Accumulating output document. Single writer; never shared.
pub struct OutputDocument {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    helvetica: Option<ObjectId>,
    info: Option<DocumentInfo>,
}

impl Default for OutputDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputDocument {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            helvetica: None,
            info: None,
        }
    }

    /// Pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// First object number that is guaranteed not to collide with existing objects.
    pub fn next_object_number(&self) -> u32 {
        self.doc.max_id + 1
    }

    /// Insert an object under an id chosen by the caller (imported objects).
    pub fn insert_object(&mut self, id: ObjectId, object: Object) {
        self.doc.max_id = self.doc.max_id.max(id.0);
        self.doc.objects.insert(id, object);
    }

    /// Add an object under a fresh id.
    pub fn add_object(&mut self, object: impl Into<Object>) -> ObjectId {
        self.doc.add_object(object)
    }

    /// Append an existing page dictionary under `id` at the end of the page tree.
    pub fn push_page(&mut self, id: ObjectId, mut page: Dictionary) {
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(self.pages_id));
        self.insert_object(id, Object::Dictionary(page));
        self.kids.push(id);
    }

    /// Create a new page of `size` with the given resources and content stream.
    pub fn add_page(&mut self, size: PageSize, resources: Dictionary, content: Vec<u8>) -> ObjectId {
        let content_id = self.add_object(Stream::new(Dictionary::new(), content));
        let page = Dictionary::from_iter([
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(size.width),
                    Object::Real(size.height),
                ]),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]);
        let id = self.doc.new_object_id();
        self.push_page(id, page);
        id
    }

    /// Shared standard Helvetica font resource, created on first use.
    pub fn helvetica(&mut self) -> ObjectId {
        if let Some(id) = self.helvetica {
            return id;
        }
        let id = self.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));
        self.helvetica = Some(id);
        id
    }

    /// Embed JPEG data verbatim as a `DCTDecode` image XObject.
    pub fn embed_jpeg(&mut self, data: Vec<u8>, info: &JpegInfo) -> ObjectId {
        let mut dict = image_dict(info.width, info.height, info.bits_per_component);
        let space: &[u8] = match info.components {
            1 => b"DeviceGray",
            4 => b"DeviceCMYK",
            _ => b"DeviceRGB",
        };
        dict.set("ColorSpace", Object::Name(space.to_vec()));
        if info.components == 4 {
            // Adobe CMYK JPEGs store inverted samples.
            dict.set(
                "Decode",
                Object::Array([1, 0, 1, 0, 1, 0, 1, 0].into_iter().map(Object::Integer).collect()),
            );
        }
        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        self.add_object(Stream::new(dict, data).with_compression(false))
    }

    /// Embed decoded PNG pixels as an image XObject, with an `SMask` for alpha.
    ///
    /// The raw samples are Flate-compressed when the document is finished.
    pub fn embed_png(&mut self, png: DecodedPng) -> ObjectId {
        let mut dict = image_dict(png.width, png.height, 8);
        let space: &[u8] = match png.space {
            PixelSpace::Gray => b"DeviceGray",
            PixelSpace::Rgb => b"DeviceRGB",
        };
        dict.set("ColorSpace", Object::Name(space.to_vec()));

        if let Some(alpha) = png.alpha {
            let mut mask = image_dict(png.width, png.height, 8);
            mask.set("ColorSpace", Object::Name(b"DeviceGray".to_vec()));
            let mask_id = self.add_object(Stream::new(mask, alpha));
            dict.set("SMask", Object::Reference(mask_id));
        }

        self.add_object(Stream::new(dict, png.pixels))
    }

    /// Record the Info dictionary written by [`finish`](Self::finish).
    pub fn set_info(&mut self, info: &DocumentInfo) {
        self.info = Some(info.clone());
    }

    /// Close the page tree and serialise the document. Consumes `self`.
    pub fn finish(mut self) -> Result<Vec<u8>, MergeError> {
        let page_count = self.kids.len();
        let pages = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            (
                "Kids",
                Object::Array(self.kids.iter().copied().map(Object::Reference).collect()),
            ),
            ("Count", Object::Integer(page_count as i64)),
        ]);
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        if let Some(info) = self.info.take() {
            let info_id = self.doc.add_object(Dictionary::from_iter([
                ("Title", text_string(&info.title)),
                ("Creator", text_string(&info.creator)),
                ("Producer", text_string(&info.producer)),
            ]));
            self.doc.trailer.set("Info", Object::Reference(info_id));
        }

        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| MergeError::SerializeFailed(e.to_string()))?;
        debug!("Serialised {} pages → {} bytes", page_count, bytes.len());
        Ok(bytes)
    }
}

fn image_dict(width: u32, height: u32, bits: u8) -> Dictionary {
    Dictionary::from_iter([
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(i64::from(width))),
        ("Height", Object::Integer(i64::from(height))),
        ("BitsPerComponent", Object::Integer(i64::from(bits))),
    ])
}

/// PDF text string: literal for ASCII, UTF-16BE with BOM otherwise.
fn text_string(s: &str) -> Object {
    if s.is_ascii() {
        return Object::string_literal(s);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}
