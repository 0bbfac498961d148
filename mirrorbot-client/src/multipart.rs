//! Minimal `multipart/form-data` encoder for the upload endpoint.
//!
//! ureq has no multipart support of its own; the upload call is the only
//! place that needs it, so the body is assembled by hand.

use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) struct MultipartBody {
    boundary: String,
    buf: Vec<u8>,
}

impl MultipartBody {
    pub(crate) fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        Self {
            boundary: format!("mirrorbot-{nanos:032x}"),
            buf: Vec::new(),
        }
    }

    pub(crate) fn text(&mut self, name: &str, value: &str) {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
    }

    pub(crate) fn file(&mut self, name: &str, filename: &str, bytes: &[u8]) {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                self.boundary, name, filename
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(bytes);
        self.buf.extend_from_slice(b"\r\n");
    }

    /// Close the body and hand back `(content type header value, body)`.
    pub(crate) fn finish(mut self) -> (String, Vec<u8>) {
        self.buf
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.buf,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_fields_and_file_between_boundaries() {
        let mut body = MultipartBody::new();
        body.text("action", "upload");
        body.file("file", "Image.png", &[0xFF, 0xD8]);
        let (content_type, bytes) = body.finish();

        let boundary = content_type
            .split("boundary=")
            .nth(1)
            .expect("boundary in content type");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with(&format!("--{boundary}\r\n")));
        assert!(text.contains("name=\"action\"\r\n\r\nupload\r\n"));
        assert!(text.contains("name=\"file\"; filename=\"Image.png\""));
        assert!(text.contains("Content-Type: application/octet-stream"));
        assert!(text.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn file_bytes_are_embedded_verbatim() {
        let mut body = MultipartBody::new();
        body.file("file", "a.bin", &[0x00, 0x01, 0x02]);
        let (_, bytes) = body.finish();
        assert!(bytes
            .windows(3)
            .any(|w| w == [0x00, 0x01, 0x02]));
    }
}
