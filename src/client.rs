use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use opentelemetry::global;
use opentelemetry::metrics::Counter;
use prost::Message;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::multipart::{self, MultipartWriter};
use crate::progress::{self, ProgressReader};
use crate::rest_types::{Metadata, PROTOBUF_CONTENT_TYPE, Status, UploadContentV1Response};
use crate::transport::HttpClient;

const UPLOAD_CONTENT_ROUTE: &str = "content/upload";

pub const DEFAULT_PIPE_CAPACITY: usize = 64 * 1024;

pub struct UploadContentRequest<R> {
    pub metadata: Metadata,
    pub content: R,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadContentResponse {
    pub id: String,
}

pub struct ContentClient<H> {
    http: H,
    upload_url: Url,
    pipe_capacity: usize,
    bytes_read: Counter<u64>,
}

impl<H: HttpClient> ContentClient<H> {
    pub fn new(http: H, base_url: &Url) -> Result<Self> {
        let upload_url = base_url
            .join(UPLOAD_CONTENT_ROUTE)
            .map_err(|e| Error::InvalidRequest(format!("bad content service url: {e}")))?;

        Ok(Self {
            http,
            upload_url,
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
            bytes_read: progress::io_counter(&global::meter("content")),
        })
    }

    pub fn with_pipe_capacity(mut self, capacity: usize) -> Self {
        self.pipe_capacity = capacity.max(1);
        self
    }

    /// Cancelling `cancel` aborts both the encoding and the HTTP request and
    /// yields [`Error::Cancelled`].
    #[tracing::instrument(skip_all, fields(url = %self.upload_url))]
    pub async fn upload_content<R>(
        &self,
        cancel: &CancellationToken,
        req: UploadContentRequest<R>,
    ) -> Result<UploadContentResponse>
    where
        R: AsyncRead + Send + Unpin,
    {
        if req.metadata.checksum.is_none() {
            return Err(Error::MissingChecksum);
        }

        let group = cancel.child_token();
        let _group_guard = group.clone().drop_guard();

        let boundary = multipart::random_boundary();
        let (body_writer, body_reader) = tokio::io::duplex(self.pipe_capacity);
        let (resp_tx, mut resp_rx) = mpsc::channel::<reqwest::Response>(1);

        let encode = self.encode_body(&group, body_writer, &boundary, req);
        let request = self.send_request(&group, body_reader, &boundary, resp_tx);
        tokio::try_join!(encode, request)?;

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            response = resp_rx.recv() => response.ok_or(Error::Cancelled)?,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = read_upload_response(response) => result,
        }
    }

    async fn encode_body<R>(
        &self,
        group: &CancellationToken,
        mut pipe: DuplexStream,
        boundary: &str,
        req: UploadContentRequest<R>,
    ) -> Result<()>
    where
        R: AsyncRead + Send + Unpin,
    {
        let result = tokio::select! {
            biased;
            _ = group.cancelled() => Err(Error::Cancelled),
            result = self.write_framed(group, &mut pipe, boundary, req) => result,
        };

        match result {
            Ok(()) => {
                pipe.shutdown().await?;
                debug!("upload body written");
                Ok(())
            }
            Err(e) => {
                group.cancel();
                Err(e)
            }
        }
    }

    async fn write_framed<R>(
        &self,
        group: &CancellationToken,
        pipe: &mut DuplexStream,
        boundary: &str,
        req: UploadContentRequest<R>,
    ) -> Result<()>
    where
        R: AsyncRead + Send + Unpin,
    {
        let mut mw = MultipartWriter::with_boundary(pipe, boundary);
        let content = ProgressReader::new(req.content, group.clone(), self.bytes_read.clone());
        write_upload_request(&mut mw, &req.metadata, content).await?;
        mw.finish().await?;
        Ok(())
    }

    async fn send_request(
        &self,
        group: &CancellationToken,
        body: DuplexStream,
        boundary: &str,
        resp_tx: mpsc::Sender<reqwest::Response>,
    ) -> Result<()> {
        let mut request = reqwest::Request::new(Method::POST, self.upload_url.clone());
        let content_type = HeaderValue::from_str(&multipart::form_data_content_type(boundary))
            .map_err(|e| Error::InvalidRequest(e.to_string()))?;
        request.headers_mut().insert(CONTENT_TYPE, content_type);
        *request.body_mut() = Some(reqwest::Body::wrap_stream(ReaderStream::new(body)));

        let result = tokio::select! {
            biased;
            _ = group.cancelled() => Err(Error::Cancelled),
            result = self.http.send(request) => result.map_err(Error::Transport),
        };
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                group.cancel();
                return Err(e);
            }
        };
        debug!(status = %response.status(), "upload response received");

        tokio::select! {
            biased;
            _ = group.cancelled() => Err(Error::Cancelled),
            sent = resp_tx.send(response) => sent.map_err(|_| Error::Cancelled),
        }
    }
}

/// Writes the metadata part followed by the content part. Finishing the
/// multipart body and closing `mw`'s writer are left to the caller.
pub async fn write_upload_request<W, R>(
    mw: &mut MultipartWriter<W>,
    metadata: &Metadata,
    content: R,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    write_metadata(mw, metadata).await?;

    let hash = metadata
        .checksum
        .as_ref()
        .map(|checksum| checksum.hash.as_slice())
        .ok_or(Error::MissingChecksum)?;
    write_content(mw, hash, content).await
}

#[tracing::instrument(skip_all)]
pub async fn write_metadata<W>(mw: &mut MultipartWriter<W>, metadata: &Metadata) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let encoded = metadata.encode_to_vec();

    let part = mw
        .create_part(&[
            ("Content-Disposition", r#"form-data; name="metadata""#),
            ("Content-Type", PROTOBUF_CONTENT_TYPE),
        ])
        .await?;

    let mut written = 0;
    while written < encoded.len() {
        let n = part.write(&encoded[written..]).await?;
        if n == 0 {
            break;
        }
        written += n;
    }
    if written != encoded.len() {
        return Err(Error::PartialWrite {
            written,
            expected: encoded.len(),
        });
    }
    Ok(())
}

#[tracing::instrument(skip_all)]
pub async fn write_content<W, R>(mw: &mut MultipartWriter<W>, hash: &[u8], mut content: R) -> Result<()>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    let filename = BASE64.encode(hash);
    let disposition = format!(
        r#"form-data; name="content"; filename="{}""#,
        multipart::escape_quotes(&filename)
    );

    let part = mw
        .create_part(&[
            ("Content-Disposition", disposition.as_str()),
            ("Content-Type", "application/octet-stream"),
        ])
        .await?;

    let n = tokio::io::copy(&mut content, part).await?;
    debug!(bytes = n, "content part written");
    Ok(())
}

async fn read_upload_response(response: reqwest::Response) -> Result<UploadContentResponse> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_default();
    if content_type != PROTOBUF_CONTENT_TYPE {
        return Err(Error::UnsupportedContentType { content_type });
    }

    let status = response.status();
    let body = response.bytes().await.map_err(Error::ReadBody)?;

    if status != StatusCode::OK {
        let status = Status::decode(body)?;
        warn!(%status, "content service rejected upload");
        return Err(Error::Status(status));
    }

    let resp = UploadContentV1Response::decode(body)?;
    let id = resp.id.and_then(|id| id.value).unwrap_or_default();
    Ok(UploadContentResponse { id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::rest_types::{Checksum, Code, ContentId, HashFunc, MediaType};
    use bytes::Bytes;
    use http_body_util::BodyExt;
    use std::future::Future;
    use std::io;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::task::{Context, Poll};
    use std::time::Duration;
    use tokio::io::ReadBuf;

    struct FnClient<F>(F);

    impl<F, Fut> HttpClient for FnClient<F>
    where
        F: Fn(reqwest::Request) -> Fut + Send + Sync,
        Fut: Future<Output = std::result::Result<reqwest::Response, BoxError>> + Send,
    {
        fn send(
            &self,
            request: reqwest::Request,
        ) -> impl Future<Output = std::result::Result<reqwest::Response, BoxError>> + Send {
            (self.0)(request)
        }
    }

    fn client<F, Fut>(f: F) -> ContentClient<FnClient<F>>
    where
        F: Fn(reqwest::Request) -> Fut + Send + Sync,
        Fut: Future<Output = std::result::Result<reqwest::Response, BoxError>> + Send,
    {
        let base_url = Url::parse("http://content.test/").unwrap();
        ContentClient::new(FnClient(f), &base_url).unwrap()
    }

    async fn drain(mut request: reqwest::Request) -> std::result::Result<Bytes, BoxError> {
        let body = request.body_mut().take().expect("request has a body");
        Ok(body.collect().await?.to_bytes())
    }

    fn response(status: u16, content_type: &str, body: Vec<u8>) -> reqwest::Response {
        http::Response::builder()
            .status(status)
            .header("content-type", content_type)
            .body(body)
            .unwrap()
            .into()
    }

    fn streaming_response(body: reqwest::Body) -> reqwest::Response {
        http::Response::builder()
            .header("content-type", PROTOBUF_CONTENT_TYPE)
            .body(body)
            .unwrap()
            .into()
    }

    fn id_response(id: &str) -> reqwest::Response {
        let body = UploadContentV1Response {
            id: Some(ContentId {
                value: Some(id.to_string()),
            }),
        };
        response(200, PROTOBUF_CONTENT_TYPE, body.encode_to_vec())
    }

    fn metadata(hash: Vec<u8>) -> Metadata {
        Metadata {
            name: Some("example-content".to_string()),
            media_type: Some(MediaType {
                r#type: Some("text".to_string()),
                subtype: Some("plain".to_string()),
                parameters: Default::default(),
            }),
            checksum: Some(Checksum::new(HashFunc::Sha256, hash)),
        }
    }

    fn request(content: &'static [u8]) -> UploadContentRequest<&'static [u8]> {
        UploadContentRequest {
            metadata: metadata(vec![0xab, 0xcd, 0xef]),
            content,
        }
    }

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::other("failed to read")))
        }
    }

    /// Yields `left` bytes of ones, then fails.
    struct FailsAfter {
        left: usize,
    }

    impl AsyncRead for FailsAfter {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.left == 0 {
                return Poll::Ready(Err(io::Error::other("failed mid-stream")));
            }
            let n = buf.remaining().min(self.left);
            buf.put_slice(&vec![1u8; n]);
            self.left -= n;
            Poll::Ready(Ok(()))
        }
    }

    /// Endless zeros that cancel the token on every read.
    struct CancellingReader(CancellationToken);

    impl AsyncRead for CancellingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            self.0.cancel();
            let zeros = vec![0u8; buf.remaining()];
            buf.put_slice(&zeros);
            Poll::Ready(Ok(()))
        }
    }

    /// Accepts `budget` bytes, then reports zero-length writes.
    struct ShortWriter {
        budget: usize,
    }

    impl AsyncWrite for ShortWriter {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let n = buf.len().min(self.budget);
            self.budget -= n;
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_upload_content_returns_id() {
        let c = client(|req| async move {
            drain(req).await?;
            Ok::<_, BoxError>(id_response("example-id"))
        });

        let resp = c
            .upload_content(&CancellationToken::new(), request(b"hello world"))
            .await
            .unwrap();

        assert_eq!(
            resp,
            UploadContentResponse {
                id: "example-id".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_upload_content_request_framing() {
        let captured = Arc::new(Mutex::new(None));
        let c = {
            let captured = captured.clone();
            client(move |req| {
                let captured = captured.clone();
                async move {
                    assert_eq!(req.method(), Method::POST);
                    assert_eq!(req.url().as_str(), "http://content.test/content/upload");
                    let content_type = req.headers()[CONTENT_TYPE].to_str()?.to_string();
                    let body = drain(req).await?;
                    *captured.lock().unwrap() = Some((content_type, body));
                    Ok::<_, BoxError>(id_response("id"))
                }
            })
        };

        let req = request(b"hello world");
        let encoded_metadata = req.metadata.encode_to_vec();
        c.upload_content(&CancellationToken::new(), req).await.unwrap();

        let (content_type, body) = captured.lock().unwrap().take().unwrap();
        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .expect("form data content type");

        let mut expected = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"metadata\"\r\n\
             Content-Type: application/x-protobuf\r\n\
             \r\n"
        )
        .into_bytes();
        expected.extend_from_slice(&encoded_metadata);
        expected.extend_from_slice(
            format!(
                "\r\n--{boundary}\r\n\
                 Content-Disposition: form-data; name=\"content\"; filename=\"q83v\"\r\n\
                 Content-Type: application/octet-stream\r\n\
                 \r\n\
                 hello world\r\n\
                 --{boundary}--\r\n"
            )
            .as_bytes(),
        );
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn test_upload_content_streams_large_content_through_small_pipe() {
        static CONTENT: [u8; 256 * 1024] = [7u8; 256 * 1024];
        let c = client(|req| async move {
            let body = drain(req).await?;
            assert!(body.len() > CONTENT.len());
            Ok::<_, BoxError>(id_response("large"))
        })
        .with_pipe_capacity(1024);

        let resp = c
            .upload_content(&CancellationToken::new(), request(&CONTENT))
            .await
            .unwrap();
        assert_eq!(resp.id, "large");
    }

    #[tokio::test]
    async fn test_content_read_error_is_returned() {
        let c = client(|req| async move {
            drain(req).await?;
            Ok::<_, BoxError>(id_response("unused"))
        });

        let err = c
            .upload_content(
                &CancellationToken::new(),
                UploadContentRequest {
                    metadata: metadata(vec![1]),
                    content: FailingReader,
                },
            )
            .await
            .unwrap_err();

        match err {
            Error::Io(e) => assert_eq!(e.to_string(), "failed to read"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_content_read_error_after_partial_stream_is_returned() {
        let accepted = Arc::new(AtomicBool::new(false));
        let c = {
            let accepted = accepted.clone();
            client(move |req| {
                let accepted = accepted.clone();
                async move {
                    let body = drain(req).await?;
                    if !body.ends_with(b"--\r\n") {
                        return Err::<reqwest::Response, BoxError>("truncated body".into());
                    }
                    accepted.store(true, Ordering::SeqCst);
                    Ok(id_response("unused"))
                }
            })
        }
        .with_pipe_capacity(1024);

        let err = c
            .upload_content(
                &CancellationToken::new(),
                UploadContentRequest {
                    metadata: metadata(vec![1]),
                    content: FailsAfter { left: 200_000 },
                },
            )
            .await
            .unwrap_err();

        match err {
            Error::Io(e) => assert_eq!(e.to_string(), "failed mid-stream"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!accepted.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_transport_error_is_returned() {
        let c = client(|_req| async move {
            Err::<reqwest::Response, BoxError>("failed to do http request".into())
        });

        let err = c
            .upload_content(&CancellationToken::new(), request(b"hello world"))
            .await
            .unwrap_err();

        match err {
            Error::Transport(e) => assert_eq!(e.to_string(), "failed to do http request"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancel_while_streaming_content() {
        let c = client(|req| async move {
            drain(req).await?;
            Ok::<_, BoxError>(id_response("unused"))
        });

        let cancel = CancellationToken::new();
        let err = c
            .upload_content(
                &cancel,
                UploadContentRequest {
                    metadata: metadata(vec![1]),
                    content: CancellingReader(cancel.clone()),
                },
            )
            .await
            .unwrap_err();

        assert!(err.is_cancelled(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_cancel_before_handoff_drops_response() {
        let cancel = CancellationToken::new();
        let dropped = Arc::new(AtomicBool::new(false));
        let c = {
            let cancel = cancel.clone();
            let dropped = dropped.clone();
            client(move |req| {
                let cancel = cancel.clone();
                let guard = DropFlag(dropped.clone());
                async move {
                    drain(req).await?;
                    cancel.cancel();
                    let body = futures::stream::once(async move {
                        let _guard = guard;
                        Ok::<_, io::Error>(Bytes::new())
                    });
                    Ok::<_, BoxError>(streaming_response(reqwest::Body::wrap_stream(body)))
                }
            })
        };

        let err = c
            .upload_content(&cancel, request(b"hello world"))
            .await
            .unwrap_err();

        assert!(err.is_cancelled(), "unexpected error: {err:?}");
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_response() {
        let c = client(|req| async move {
            drain(req).await?;
            std::future::pending::<()>().await;
            Ok::<_, BoxError>(id_response("unreachable"))
        });

        let cancel = CancellationToken::new();
        let timer = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                cancel.cancel();
            })
        };

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            c.upload_content(&cancel, request(b"hello world")),
        )
        .await
        .expect("upload did not observe cancellation")
        .unwrap_err();

        assert!(err.is_cancelled(), "unexpected error: {err:?}");
        timer.await.unwrap();
    }

    #[tokio::test]
    async fn test_already_cancelled() {
        let c = client(|req| async move {
            drain(req).await?;
            Ok::<_, BoxError>(id_response("unused"))
        });

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = c
            .upload_content(&cancel, request(b"hello world"))
            .await
            .unwrap_err();

        assert!(err.is_cancelled(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_missing_checksum_sends_nothing() {
        let called = Arc::new(AtomicBool::new(false));
        let c = {
            let called = called.clone();
            client(move |_req| {
                called.store(true, Ordering::SeqCst);
                async move { Ok::<_, BoxError>(id_response("unused")) }
            })
        };

        let mut req = request(b"hello world");
        req.metadata.checksum = None;
        let err = c
            .upload_content(&CancellationToken::new(), req)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MissingChecksum));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_unsupported_response_content_type() {
        let c = client(|req| async move {
            drain(req).await?;
            Ok::<_, BoxError>(response(200, "application/json", b"{}".to_vec()))
        });

        let err = c
            .upload_content(&CancellationToken::new(), request(b"hello world"))
            .await
            .unwrap_err();

        match &err {
            Error::UnsupportedContentType { content_type } => {
                assert_eq!(content_type, "application/json")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn test_response_body_read_error() {
        let c = client(|req| async move {
            drain(req).await?;
            let body = futures::stream::once(async {
                Err::<Bytes, io::Error>(io::Error::other("failed to read"))
            });
            Ok::<_, BoxError>(streaming_response(reqwest::Body::wrap_stream(body)))
        });

        let err = c
            .upload_content(&CancellationToken::new(), request(b"hello world"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ReadBody(_)), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_non_200_returns_status() {
        let c = client(|req| async move {
            drain(req).await?;
            let status = Status {
                code: Some(Code::Internal as i32),
                message: Some("boom".to_string()),
            };
            Ok::<_, BoxError>(response(500, PROTOBUF_CONTENT_TYPE, status.encode_to_vec()))
        });

        let err = c
            .upload_content(&CancellationToken::new(), request(b"hello world"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), Some(Code::Internal));
        assert_eq!(err.status().unwrap().message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_malformed_status_body() {
        let c = client(|req| async move {
            drain(req).await?;
            Ok::<_, BoxError>(response(500, PROTOBUF_CONTENT_TYPE, vec![0xff]))
        });

        let err = c
            .upload_content(&CancellationToken::new(), request(b"hello world"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Decode(_)), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let c = client(|req| async move {
            drain(req).await?;
            Ok::<_, BoxError>(response(200, PROTOBUF_CONTENT_TYPE, vec![0x0a, 0x05, 0x01]))
        });

        let err = c
            .upload_content(&CancellationToken::new(), request(b"hello world"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Decode(_)), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_write_metadata_partial_write() {
        let boundary = "b";
        let preamble = "--b\r\n\
                        Content-Disposition: form-data; name=\"metadata\"\r\n\
                        Content-Type: application/x-protobuf\r\n\
                        \r\n";
        let meta = metadata(vec![9; 32]);
        let expected = meta.encode_to_vec().len();

        let mut mw = MultipartWriter::with_boundary(
            ShortWriter {
                budget: preamble.len() + 2,
            },
            boundary,
        );
        let err = write_metadata(&mut mw, &meta).await.unwrap_err();

        match err {
            Error::PartialWrite {
                written,
                expected: want,
            } => {
                assert_eq!(written, 2);
                assert_eq!(want, expected);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_content_filename_is_base64_of_digest() {
        for (hash, filename) in [
            (vec![], String::new()),
            (vec![0xab, 0xcd, 0xef], "q83v".to_string()),
            (vec![0xff; 64], BASE64.encode([0xff; 64])),
        ] {
            let mut mw = MultipartWriter::with_boundary(Vec::new(), "b");
            write_content(&mut mw, &hash, &b"x"[..]).await.unwrap();

            let body = String::from_utf8(mw.into_inner()).unwrap();
            let header = format!(r#"Content-Disposition: form-data; name="content"; filename="{filename}""#);
            assert!(body.contains(&header), "{body}");
            assert!(body.ends_with("\r\n\r\nx"), "{body}");
        }
    }
}
