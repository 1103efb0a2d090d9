//! PDF import stage: copy every page of a source PDF into the output.
//!
//! The source is parsed, its object numbers shifted above everything already
//! in the output, and its objects moved across. Catalog, page-tree and
//! outline objects are left behind; the output has its own. Attributes a page
//! inherits from its page-tree ancestors are copied onto the page first, since
//! those ancestors do not survive the move.

use crate::error::MergeError;
use crate::pipeline::document::OutputDocument;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

/// Page attributes that PDF lets a page inherit from its page-tree parents.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Deepest page tree walked when resolving inherited attributes.
const MAX_TREE_DEPTH: usize = 32;

/// US Letter, assumed when neither a page nor its ancestors carry a MediaBox.
const DEFAULT_MEDIA_BOX: [i64; 4] = [0, 0, 612, 792];

/// Append all pages of the PDF in `bytes`, in source order.
///
/// Returns the number of pages appended. On error the output is unchanged.
pub fn append_pdf(out: &mut OutputDocument, bytes: &[u8], url: &str) -> Result<usize, MergeError> {
    let malformed = |detail: String| MergeError::MalformedPdf {
        url: url.to_string(),
        detail,
    };

    let mut src = Document::load_mem(bytes).map_err(|e| malformed(e.to_string()))?;
    if src.is_encrypted() {
        return Err(malformed("document is encrypted".into()));
    }

    src.renumber_objects_with(out.next_object_number());

    let page_ids: Vec<ObjectId> = src.get_pages().into_values().collect();
    let mut pages = Vec::with_capacity(page_ids.len());
    for id in page_ids {
        let dict = src
            .get_dictionary(id)
            .map_err(|e| malformed(format!("page {} {}: {}", id.0, id.1, e)))?;
        pages.push((id, flatten_page(&src, dict)));
    }

    for (id, object) in src.objects {
        match object.type_name().unwrap_or(b"") {
            b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
            // Cross-reference and object streams describe the source file's layout.
            b"XRef" | b"ObjStm" => {}
            _ => out.insert_object(id, object),
        }
    }

    let count = pages.len();
    for (id, page) in pages {
        out.push_page(id, page);
    }
    debug!("Appended {} pages from {}", count, url);
    Ok(count)
}

/// Copy of `page` with inherited attributes made explicit and `Parent` removed.
fn flatten_page(doc: &Document, page: &Dictionary) -> Dictionary {
    let mut flat = page.clone();
    for key in INHERITABLE {
        if flat.has(key) {
            continue;
        }
        if let Some(value) = inherited(doc, page, key) {
            flat.set(key, value);
        }
    }
    if !flat.has(b"MediaBox") {
        flat.set(
            "MediaBox",
            Object::Array(DEFAULT_MEDIA_BOX.into_iter().map(Object::Integer).collect()),
        );
    }
    flat.remove(b"Parent");
    flat
}

fn inherited(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut node = page;
    for _ in 0..MAX_TREE_DEPTH {
        let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent_id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::Stream;

    /// Build a PDF whose pages inherit MediaBox and Resources from the tree root.
    fn sample_pdf(page_count: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Courier".to_vec())),
        ]));
        let mut kids = Vec::new();
        for i in 0..page_count {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Tj", vec![Object::string_literal(format!("page {i}"))]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
            let page_id = doc.add_object(Dictionary::from_iter([
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
            ]));
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Count", Object::Integer(page_count as i64)),
                ("Kids", Object::Array(kids)),
                (
                    "MediaBox",
                    Object::Array(vec![0.into(), 0.into(), 300.into(), 400.into()]),
                ),
                (
                    "Resources",
                    Object::Dictionary(Dictionary::from_iter([(
                        "Font",
                        Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
                    )])),
                ),
            ])),
        );
        let catalog_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    /// `sample_pdf` plus a cross-reference stream and an object stream, as
    /// left behind by PDF 1.5 writers.
    fn sample_pdf_with_layout_streams() -> Vec<u8> {
        let mut doc = Document::load_mem(&sample_pdf(1)).unwrap();
        let root = doc.trailer.get(b"Root").unwrap().clone();
        doc.add_object(Stream::new(
            Dictionary::from_iter([
                ("Type", Object::Name(b"XRef".to_vec())),
                ("Root", root),
                ("W", Object::Array(vec![1.into(), 2.into(), 1.into()])),
            ]),
            vec![1, 0, 15, 0],
        ));
        let packed = b"900 0 << /Note (packed) >>".to_vec();
        doc.add_object(Stream::new(
            Dictionary::from_iter([
                ("Type", Object::Name(b"ObjStm".to_vec())),
                ("N", Object::Integer(1)),
                ("First", Object::Integer(6)),
            ]),
            packed,
        ));
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn appends_every_page_in_order() {
        let mut out = OutputDocument::new();
        assert_eq!(append_pdf(&mut out, &sample_pdf(3), "a.pdf").unwrap(), 3);
        assert_eq!(append_pdf(&mut out, &sample_pdf(2), "b.pdf").unwrap(), 2);
        assert_eq!(out.page_count(), 5);

        let doc = Document::load_mem(&out.finish().unwrap()).unwrap();
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        assert_eq!(pages.len(), 5);

        let first_of_second = doc.get_page_content(pages[3]).unwrap();
        let needle = b"page 0";
        assert!(first_of_second.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn inherited_attributes_are_copied_to_pages() {
        let mut out = OutputDocument::new();
        append_pdf(&mut out, &sample_pdf(1), "a.pdf").unwrap();
        let doc = Document::load_mem(&out.finish().unwrap()).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();

        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_float().unwrap(), 300.0);
        assert_eq!(media_box[3].as_float().unwrap(), 400.0);
        assert!(page.get(b"Resources").is_ok());
    }

    #[test]
    fn layout_streams_are_not_copied() {
        let source = sample_pdf_with_layout_streams();
        let mut out = OutputDocument::new();
        assert_eq!(append_pdf(&mut out, &source, "a.pdf").unwrap(), 1);
        assert_eq!(append_pdf(&mut out, &source, "b.pdf").unwrap(), 1);

        let doc = Document::load_mem(&out.finish().unwrap()).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
        for (id, object) in &doc.objects {
            let kind = object.type_name().unwrap_or(b"");
            assert!(kind != b"XRef" && kind != b"ObjStm", "{id:?} is {:?}", String::from_utf8_lossy(kind));
        }
        // Objects packed inside the object stream still arrive.
        let packed = doc
            .objects
            .values()
            .filter(|o| o.as_dict().map(|d| d.has(b"Note")).unwrap_or(false))
            .count();
        assert_eq!(packed, 2);
    }

    #[test]
    fn garbage_is_malformed() {
        let mut out = OutputDocument::new();
        let err = append_pdf(&mut out, b"this is not a pdf", "https://x/bad.pdf").unwrap_err();
        match err {
            MergeError::MalformedPdf { url, .. } => assert_eq!(url, "https://x/bad.pdf"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(out.page_count(), 0);
    }
}
