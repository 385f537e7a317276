//! Streaming `multipart/form-data` framing over an [`AsyncWrite`].

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

pub struct MultipartWriter<W> {
    inner: W,
    boundary: String,
    parts: usize,
}

impl<W: AsyncWrite + Unpin> MultipartWriter<W> {
    pub fn with_boundary(inner: W, boundary: impl Into<String>) -> Self {
        Self {
            inner,
            boundary: boundary.into(),
            parts: 0,
        }
    }

    /// The part's body ends when the next part is created or the writer is
    /// finished.
    pub async fn create_part(&mut self, header: &[(&str, &str)]) -> io::Result<&mut W> {
        let mut preamble = String::new();
        if self.parts > 0 {
            preamble.push_str("\r\n");
        }
        preamble.push_str("--");
        preamble.push_str(&self.boundary);
        preamble.push_str("\r\n");
        for (name, value) in header {
            preamble.push_str(name);
            preamble.push_str(": ");
            preamble.push_str(value);
            preamble.push_str("\r\n");
        }
        preamble.push_str("\r\n");

        self.inner.write_all(preamble.as_bytes()).await?;
        self.parts += 1;
        Ok(&mut self.inner)
    }

    /// Does not shut the inner writer down.
    pub async fn finish(&mut self) -> io::Result<()> {
        let mut trailer = String::new();
        if self.parts > 0 {
            trailer.push_str("\r\n");
        }
        trailer.push_str("--");
        trailer.push_str(&self.boundary);
        trailer.push_str("--\r\n");

        self.inner.write_all(trailer.as_bytes()).await?;
        self.inner.flush().await
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

pub fn random_boundary() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn form_data_content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}

/// Escapes a value for use inside a quoted header parameter.
pub fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
