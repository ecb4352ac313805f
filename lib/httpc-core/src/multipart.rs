//! Incremental `multipart/form-data` writer.
//!
//! Form fields and file parts are appended one after the other; an
//! [`Attachment`](crate::Attachment) writes itself through
//! [`MultipartWriter::create_form_file`].
//!
//! # Example
//!
//! ```
//! use std::io::Write;
//! use httpc_core::MultipartWriter;
//!
//! let mut writer = MultipartWriter::with_boundary("xyz");
//! writer.write_field("name", "John Doe")?;
//! writer.create_form_file("avatar", "photo.png")?.write_all(b"\x89PNG")?;
//!
//! let (content_type, body) = writer.finish();
//! assert_eq!(content_type, "multipart/form-data; boundary=xyz");
//! assert!(body.ends_with(b"\r\n--xyz--\r\n"));
//! # Ok::<(), httpc_core::Error>(())
//! ```

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::{BufMut, Bytes, BytesMut};

use crate::{Error, Result};

/// Writer producing a `multipart/form-data` body.
#[derive(Debug)]
pub struct MultipartWriter {
    boundary: String,
    buf: BytesMut,
    parts: usize,
}

impl Default for MultipartWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartWriter {
    /// Create a writer with a generated boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(generate_boundary())
    }

    /// Create a writer with a custom boundary.
    ///
    /// The boundary should be a unique string that doesn't appear in any part data.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            buf: BytesMut::new(),
            parts: 0,
        }
    }

    /// Get the boundary string.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Number of parts written so far.
    #[must_use]
    pub const fn part_count(&self) -> usize {
        self.parts
    }

    /// Get the Content-Type header value for this body.
    ///
    /// Returns `multipart/form-data; boundary=<boundary>`.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Write a plain form field.
    pub fn write_field(&mut self, name: &str, value: &str) -> Result<()> {
        let disposition = format!("form-data; name=\"{}\"", escape_quotes(name)?);
        self.begin_part(&disposition, None);
        self.buf.put_slice(value.as_bytes());
        Ok(())
    }

    /// Start a file part and return a writer for its content.
    ///
    /// The content type of the part is guessed from the file name extension.
    pub fn create_form_file(&mut self, field: &str, file_name: &str) -> Result<PartWriter<'_>> {
        let disposition = format!(
            "form-data; name=\"{}\"; filename=\"{}\"",
            escape_quotes(field)?,
            escape_quotes(file_name)?
        );
        self.begin_part(&disposition, Some(guess_content_type(file_name)));
        Ok(PartWriter { buf: &mut self.buf })
    }

    /// Close the body with the final boundary.
    ///
    /// Returns a tuple of (content-type header value, body bytes).
    #[must_use]
    pub fn finish(mut self) -> (String, Bytes) {
        if self.parts > 0 {
            self.buf.put_slice(b"\r\n");
        }
        self.buf.put_slice(b"--");
        self.buf.put_slice(self.boundary.as_bytes());
        self.buf.put_slice(b"--\r\n");

        let content_type = self.content_type();
        (content_type, self.buf.freeze())
    }

    fn begin_part(&mut self, disposition: &str, content_type: Option<&str>) {
        if self.parts > 0 {
            self.buf.put_slice(b"\r\n");
        }
        self.parts += 1;

        self.buf.put_slice(b"--");
        self.buf.put_slice(self.boundary.as_bytes());
        self.buf.put_slice(b"\r\n");

        self.buf.put_slice(b"Content-Disposition: ");
        self.buf.put_slice(disposition.as_bytes());
        self.buf.put_slice(b"\r\n");

        if let Some(content_type) = content_type {
            self.buf.put_slice(b"Content-Type: ");
            self.buf.put_slice(content_type.as_bytes());
            self.buf.put_slice(b"\r\n");
        }

        // Empty line before data
        self.buf.put_slice(b"\r\n");
    }
}

/// Writer for the content of one file part.
///
/// Obtained from [`MultipartWriter::create_form_file`]; the part ends when the
/// next part starts or the writer is finished.
#[derive(Debug)]
pub struct PartWriter<'a> {
    buf: &'a mut BytesMut,
}

impl io::Write for PartWriter<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.put_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn escape_quotes(value: &str) -> Result<String> {
    if value.contains(['\r', '\n']) {
        return Err(Error::invalid_request(format!(
            "line break in multipart name {value:?}"
        )));
    }
    Ok(value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Guess the content type from a filename extension.
fn guess_content_type(filename: &str) -> &'static str {
    let extension = filename
        .rsplit('.')
        .next()
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "json" => "application/json",
        "xml" => "application/xml",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        _ => "application/octet-stream",
    }
}

/// Generate a boundary unique within the process.
fn generate_boundary() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let sequence = COUNTER.fetch_add(1, Ordering::Relaxed);

    format!("----HttpcBoundary{timestamp:x}{sequence:04x}")
}
