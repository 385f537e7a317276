//! Errors returned by the content client.

use std::io;

use crate::rest_types::{Code, Status};

/// A specialized `Result` type for this crate.
pub type Result<T, E = Error> = ::std::result::Result<T, E>;

/// Boxed error produced by an [`HttpClient`](crate::transport::HttpClient).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading the content source or writing the request body failed.
    #[error(transparent)]
    Io(io::Error),

    /// The metadata part was not written in full.
    #[error("wrote {written} of {expected} metadata bytes")]
    PartialWrite { written: usize, expected: usize },

    #[error("upload cancelled")]
    Cancelled,

    /// The HTTP round trip itself failed.
    #[error(transparent)]
    Transport(BoxError),

    #[error("failed to read response body: {0}")]
    ReadBody(#[source] reqwest::Error),

    #[error("received unsupported response content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    /// The service answered with a non-200 status and a decodable [`Status`].
    #[error("content service returned status {0}")]
    Status(Status),

    #[error(transparent)]
    Decode(#[from] prost::DecodeError),

    #[error("upload metadata has no checksum")]
    MissingChecksum,

    #[error("invalid upload request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// The remote status, if the service rejected the upload.
    pub fn status(&self) -> Option<&Status> {
        match self {
            Error::Status(status) => Some(status),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<Code> {
        self.status().map(Status::code)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Marker carried inside an [`io::Error`] when a read observes cancellation.
#[derive(Debug, thiserror::Error)]
#[error("read cancelled")]
pub(crate) struct ReadCancelled;

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        let cancelled = err
            .get_ref()
            .is_some_and(|inner| inner.is::<ReadCancelled>());
        if cancelled {
            Error::Cancelled
        } else {
            Error::Io(err)
        }
    }
}
