//! Attachments embedded as file parts of a multipart body.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use bytes::Bytes;

use crate::{MultipartWriter, Result};

/// A named data source that writes itself into a multipart body.
///
/// `attach_to` consumes the attachment: any resource it holds (an open file
/// handle...) is released when the call returns, whether it succeeded or not.
///
/// # Example
///
/// ```
/// use std::io::Write;
/// use httpc_core::{Attachment, MultipartWriter, Result};
///
/// struct Greeting;
///
/// impl Attachment for Greeting {
///     fn attach_to(self: Box<Self>, writer: &mut MultipartWriter) -> Result<()> {
///         writer.create_form_file("greeting", "hello.txt")?.write_all(b"hello")?;
///         Ok(())
///     }
/// }
/// ```
pub trait Attachment: Send {
    /// Write this attachment as a file part.
    fn attach_to(self: Box<Self>, writer: &mut MultipartWriter) -> Result<()>;
}

/// In-memory attachment.
#[derive(Debug, Clone)]
pub struct BytesAttachment {
    field: String,
    file_name: String,
    data: Bytes,
}

impl BytesAttachment {
    /// Create an attachment for `field` with the given file name and content.
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        file_name: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    /// Box the attachment, ready to be passed to a multipart call.
    #[must_use]
    pub fn boxed(self) -> Box<dyn Attachment> {
        Box::new(self)
    }
}

impl Attachment for BytesAttachment {
    fn attach_to(self: Box<Self>, writer: &mut MultipartWriter) -> Result<()> {
        let mut part = writer.create_form_file(&self.field, &self.file_name)?;
        io::Write::write_all(&mut part, &self.data)?;
        Ok(())
    }
}

/// File-backed attachment.
///
/// The file is opened by [`FileAttachment::open`] and closed once it has
/// been written (or has failed to be written).
#[derive(Debug)]
pub struct FileAttachment {
    field: String,
    file_name: String,
    file: File,
}

impl FileAttachment {
    /// Open `path` as an attachment for `field`.
    ///
    /// The part's file name is the last component of `path`.
    pub fn open(field: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            field: field.into(),
            file_name,
            file,
        })
    }

    /// Override the file name sent in the part header.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Box the attachment, ready to be passed to a multipart call.
    #[must_use]
    pub fn boxed(self) -> Box<dyn Attachment> {
        Box::new(self)
    }
}

impl Attachment for FileAttachment {
    fn attach_to(self: Box<Self>, writer: &mut MultipartWriter) -> Result<()> {
        let Self {
            field,
            file_name,
            mut file,
        } = *self;
        copy_part(writer, &field, &file_name, &mut file)?;
        Ok(())
    }
}

/// Write every attachment in order, stopping at the first failure.
///
/// Attachments after a failing one are dropped without being written.
pub fn attach_all(
    writer: &mut MultipartWriter,
    attachments: impl IntoIterator<Item = Box<dyn Attachment>>,
) -> Result<()> {
    for attachment in attachments {
        attachment.attach_to(writer)?;
    }
    Ok(())
}

/// Copy `reader` into a new file part named `field`.
///
/// Convenience for custom attachments wrapping a reader.
pub fn copy_part(
    writer: &mut MultipartWriter,
    field: &str,
    file_name: &str,
    reader: &mut impl Read,
) -> Result<u64> {
    let mut part = writer.create_form_file(field, file_name)?;
    Ok(io::copy(reader, &mut part)?)
}
