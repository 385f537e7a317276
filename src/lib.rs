//! Client for the Griot content service.
//!
//! [`ContentClient::upload_content`] streams a file's protobuf metadata and
//! raw bytes to the service as a two-part `multipart/form-data` request and
//! returns the identifier the service assigned to the stored content.

pub mod checksum;
pub mod client;
pub mod error;
pub mod media_type;
pub mod multipart;
pub mod progress;
pub mod rest_types;
pub mod transport;

pub use client::{ContentClient, UploadContentRequest, UploadContentResponse};
pub use error::{BoxError, Error, Result};
pub use transport::HttpClient;
