//! Protobuf payloads exchanged with the content service's REST endpoints.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// Content type of every protobuf request part and response body.
pub const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";

/// Hash function used to compute a content checksum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum HashFunc {
    Sha256 = 0,
}

impl HashFunc {
    pub const ALL: &'static [HashFunc] = &[HashFunc::Sha256];

    pub fn as_str_name(&self) -> &'static str {
        match self {
            HashFunc::Sha256 => "SHA256",
        }
    }

    pub fn from_str_name(value: &str) -> Option<Self> {
        match value {
            "SHA256" => Some(Self::Sha256),
            _ => None,
        }
    }
}

impl Display for HashFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str_name())
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Checksum {
    #[prost(enumeration = "HashFunc", optional, tag = "1")]
    pub hash_func: Option<i32>,
    #[prost(bytes = "vec", tag = "2")]
    pub hash: Vec<u8>,
}

impl Checksum {
    pub fn new(hash_func: HashFunc, hash: Vec<u8>) -> Self {
        Self {
            hash_func: Some(hash_func as i32),
            hash,
        }
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MediaType {
    #[prost(string, optional, tag = "1")]
    pub r#type: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub subtype: Option<String>,
    #[prost(btree_map = "string, string", tag = "3")]
    pub parameters: BTreeMap<String, String>,
}

/// Describes uploaded content. `checksum` must be the digest of the exact
/// bytes sent in the content part.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Metadata {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(message, optional, tag = "2")]
    pub media_type: Option<MediaType>,
    #[prost(message, optional, tag = "3")]
    pub checksum: Option<Checksum>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ContentId {
    #[prost(string, optional, tag = "1")]
    pub value: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UploadContentV1Response {
    #[prost(message, optional, tag = "1")]
    pub id: Option<ContentId>,
}

/// Status codes carried by [`Status`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Code {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl Code {
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Code::Ok => "OK",
            Code::Cancelled => "CANCELLED",
            Code::Unknown => "UNKNOWN",
            Code::InvalidArgument => "INVALID_ARGUMENT",
            Code::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Code::NotFound => "NOT_FOUND",
            Code::AlreadyExists => "ALREADY_EXISTS",
            Code::PermissionDenied => "PERMISSION_DENIED",
            Code::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Code::FailedPrecondition => "FAILED_PRECONDITION",
            Code::Aborted => "ABORTED",
            Code::OutOfRange => "OUT_OF_RANGE",
            Code::Unimplemented => "UNIMPLEMENTED",
            Code::Internal => "INTERNAL",
            Code::Unavailable => "UNAVAILABLE",
            Code::DataLoss => "DATA_LOSS",
            Code::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

/// Error payload returned by the service with any non-200 response.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Status {
    #[prost(enumeration = "Code", optional, tag = "1")]
    pub code: Option<i32>,
    #[prost(string, optional, tag = "2")]
    pub message: Option<String>,
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.code().as_str_name(), message),
            None => f.write_str(self.code().as_str_name()),
        }
    }
}

impl std::error::Error for Status {}
