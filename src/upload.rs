use std::{
    fmt::{self, Display},
    io::{self, SeekFrom, Write},
    path::PathBuf,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Args, ValueHint};
use griot::{
    ContentClient, HttpClient, UploadContentRequest, UploadContentResponse,
    checksum::digest_reader,
    media_type::{MediaTypeError, parse_media_type},
    rest_types::{HashFunc, MediaType, Metadata},
};
use tokio::{
    fs::File,
    io::{AsyncRead, AsyncSeekExt},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Args, Debug, Default)]
pub struct UploadArgs {
    /// Provide an optional name to help identify this content later
    #[arg(long)]
    pub name: Option<String>,
    /// Specify the content media type, e.g. "text/plain; charset=utf-8"
    #[arg(long)]
    pub media_type: Option<String>,
    /// Specify the content source file
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub source_file: Option<PathBuf>,
    #[arg(long, default_value = "SHA256", help = hash_func_help())]
    pub hash_func: String,
    /// Give up on the upload after this long, e.g. "30s" or "5m"
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,
}

fn hash_func_help() -> String {
    let names: Vec<_> = HashFunc::ALL.iter().map(HashFunc::as_str_name).collect();
    format!(
        "Hash function used for calculating the content checksum (values {})",
        names.join(",")
    )
}

#[derive(Debug, thiserror::Error)]
pub enum FlagErrorCause {
    #[error("flag is required")]
    Required,
    #[error("must be a file")]
    NotAFile,
    #[error("unknown hash func value: {0}")]
    UnknownHashFunc(String),
    #[error(transparent)]
    MediaType(#[from] MediaTypeError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
#[error("invalid flag --{name}: {cause}")]
pub struct InvalidFlagError {
    pub name: &'static str,
    pub cause: FlagErrorCause,
}

/// Every flag problem found in one pass.
#[derive(Debug)]
pub struct ValidationErrors(pub Vec<InvalidFlagError>);

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, thiserror::Error)]
#[error("bytes read do not match bytes seeked: {bytes_read}:{position}")]
pub struct SeekMismatchError {
    pub bytes_read: u64,
    pub position: u64,
}

/// Flags after validation.
#[derive(Debug)]
pub struct Upload {
    pub name: Option<String>,
    pub media_type: MediaType,
    pub source_file: PathBuf,
    pub hash_func: HashFunc,
}

impl UploadArgs {
    pub fn validate(&self) -> Result<Upload, ValidationErrors> {
        let mut errors = Vec::new();
        let mut invalid = |name: &'static str, cause: FlagErrorCause| {
            errors.push(InvalidFlagError { name, cause })
        };

        let media_type = match self.media_type.as_deref() {
            None | Some("") => {
                invalid("media-type", FlagErrorCause::Required);
                None
            }
            Some(value) => parse_media_type(value)
                .map_err(|e| invalid("media-type", e.into()))
                .ok(),
        };

        let source_file = match &self.source_file {
            None => {
                invalid("source-file", FlagErrorCause::Required);
                None
            }
            Some(path) => match std::fs::metadata(path) {
                Ok(meta) if meta.is_file() => Some(path.clone()),
                Ok(_) => {
                    invalid("source-file", FlagErrorCause::NotAFile);
                    None
                }
                Err(e) => {
                    invalid("source-file", e.into());
                    None
                }
            },
        };

        let hash_func = if self.hash_func.is_empty() {
            invalid("hash-func", FlagErrorCause::Required);
            None
        } else {
            let found = HashFunc::from_str_name(&self.hash_func);
            if found.is_none() {
                invalid(
                    "hash-func",
                    FlagErrorCause::UnknownHashFunc(self.hash_func.clone()),
                );
            }
            found
        };

        match (media_type, source_file, hash_func) {
            (Some(media_type), Some(source_file), Some(hash_func)) if errors.is_empty() => {
                Ok(Upload {
                    name: self.name.clone().filter(|name| !name.is_empty()),
                    media_type,
                    source_file,
                    hash_func,
                })
            }
            _ => Err(ValidationErrors(errors)),
        }
    }
}

/// The part of the content client the upload command uses.
pub trait UploadClient {
    async fn upload_content<R>(
        &self,
        cancel: &CancellationToken,
        req: UploadContentRequest<R>,
    ) -> griot::Result<UploadContentResponse>
    where
        R: AsyncRead + Send + Unpin;
}

impl<H: HttpClient> UploadClient for ContentClient<H> {
    async fn upload_content<R>(
        &self,
        cancel: &CancellationToken,
        req: UploadContentRequest<R>,
    ) -> griot::Result<UploadContentResponse>
    where
        R: AsyncRead + Send + Unpin,
    {
        ContentClient::upload_content(self, cancel, req).await
    }
}

/// Hashes the source file, uploads it and prints the response as JSON.
pub async fn handle<C: UploadClient, W: Write>(
    client: &C,
    cancel: &CancellationToken,
    upload: Upload,
    out: &mut W,
) -> Result<()> {
    let mut src = File::open(&upload.source_file)
        .await
        .with_context(|| format!("Failed to open {}", upload.source_file.display()))?;

    let (checksum, bytes_read) = digest_reader(upload.hash_func, &mut src)
        .await
        .inspect_err(|e| error!(error = %e, "failed to compute hash"))
        .context("Failed to compute content checksum")?;

    let position = src.stream_position().await?;
    if position != bytes_read {
        let err = SeekMismatchError {
            bytes_read,
            position,
        };
        error!(error = %err, "failed to seek to the start of the source file");
        return Err(err.into());
    }
    src.seek(SeekFrom::Start(0))
        .await
        .inspect_err(|e| error!(error = %e, "failed to perform seek on the source file"))?;

    let req = UploadContentRequest {
        metadata: Metadata {
            name: upload.name,
            media_type: Some(upload.media_type),
            checksum: Some(checksum),
        },
        content: src,
    };
    let resp = client
        .upload_content(cancel, req)
        .await
        .inspect_err(|e| error!(error = %e, "failed to upload content"))?;
    info!(id = %resp.id, bytes = bytes_read, "content uploaded");

    serde_json::to_writer(&mut *out, &resp)?;
    writeln!(out)?;
    Ok(())
}
