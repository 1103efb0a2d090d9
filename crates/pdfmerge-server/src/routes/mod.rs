pub mod health;
pub mod help;
pub mod mixed_merge;
pub mod pdf_merge;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Attachment name used when the request names none.
pub const DEFAULT_FILENAME: &str = "merged.pdf";

/// `application/pdf` attachment response with an explicit length.
pub fn pdf_response(bytes: Vec<u8>, filename: Option<&str>) -> Response {
    let name = sanitize_filename(filename.unwrap_or(DEFAULT_FILENAME));
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{name}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"merged.pdf\""));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(bytes.len())),
        ],
        bytes,
    )
        .into_response()
}

/// Keep a filename safe inside a quoted header parameter.
///
/// Drops quotes, backslashes, path separators and anything outside printable
/// ASCII. Falls back to [`DEFAULT_FILENAME`] when nothing is left.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| (c.is_ascii_graphic() || *c == ' ') && !matches!(c, '"' | '\\' | '/'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_is_sanitized() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("../etc/\"x\".pdf"), "..etcx.pdf");
        assert_eq!(sanitize_filename("résumé.pdf"), "rsum.pdf");
        assert_eq!(sanitize_filename("  "), DEFAULT_FILENAME);
    }

    #[test]
    fn pdf_response_headers() {
        let res = pdf_response(b"%PDF-1.7".to_vec(), None);
        assert_eq!(res.status(), StatusCode::OK);
        let headers = res.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(headers[header::CONTENT_LENGTH], "8");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"merged.pdf\""
        );
    }
}
