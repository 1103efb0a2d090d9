//! Static usage documentation for both route groups.

use axum::Json;
use serde_json::{json, Value};

pub async fn pdf_merge_help() -> Json<Value> {
    Json(json!({
        "endpoints": {
            "POST /merge-urls/two": {
                "description": "Merge two PDFs from URLs",
                "body": {
                    "url1": "https://example.com/file1.pdf",
                    "url2": "https://example.com/file2.pdf",
                    "filename": "merged.pdf (optional)",
                },
            },
            "POST /merge-urls/multiple": {
                "description": "Merge multiple PDFs from URLs. Every URL must end in .pdf or contain 'pdf'.",
                "body": {
                    "urls": [
                        "https://example.com/file1.pdf",
                        "https://example.com/file2.pdf",
                        "https://example.com/file3.pdf",
                    ],
                    "filename": "merged.pdf (optional)",
                },
            },
        },
        "examples": {
            "twoUrls": {
                "url1": "https://www.w3.org/WAI/ER/tests/xhtml/testfiles/resources/pdf/dummy.pdf",
                "url2": "https://www.africau.edu/images/default/sample.pdf",
            },
        },
    }))
}

pub async fn mixed_merge_help() -> Json<Value> {
    Json(json!({
        "endpoint": "POST /merge-mixed/all",
        "description": "Merge PDFs and images into one PDF",
        "body": {
            "urls": [
                "https://example.com/document.pdf",
                "https://example.com/image1.jpg",
                "https://example.com/image2.png",
                "https://example.com/another-doc.pdf",
            ],
            "filename": "merged-content.pdf (optional)",
            "type": "mixed | pdf-only | images-only (optional, default: mixed)",
        },
        "supportedFormats": {
            "pdfs": [".pdf"],
            "images": [".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".tiff", ".tif"],
        },
        "notes": [
            "Each image becomes one page sized to the image, capped at US Legal.",
            "An image that cannot be decoded becomes an 'Error loading image' page.",
            "A failed download or unreadable PDF fails the whole request.",
        ],
        "examples": {
            "mixed": {
                "urls": [
                    "https://www.w3.org/WAI/ER/tests/xhtml/testfiles/resources/pdf/dummy.pdf",
                    "https://via.placeholder.com/800x600/FF0000/FFFFFF?text=Image+1",
                ],
                "type": "mixed",
            },
            "imagesOnly": {
                "urls": [
                    "https://via.placeholder.com/800x600.jpg",
                    "https://via.placeholder.com/600x800.png",
                ],
                "type": "images-only",
            },
        },
    }))
}
