use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Meter};
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::sync::CancellationToken;

use crate::error::ReadCancelled;

pub const IO_COUNTER_NAME: &str = "griot.content.io";
const DIRECTION_ATTRIBUTE: &str = "griot.content.io.direction";

/// Counts the bytes read through it and refuses to read once `cancel` fires.
#[pin_project::pin_project]
pub struct ProgressReader<R> {
    #[pin]
    inner: R,
    cancel: CancellationToken,
    bytes_read: Counter<u64>,
}

impl<R> ProgressReader<R> {
    pub fn new(inner: R, cancel: CancellationToken, bytes_read: Counter<u64>) -> Self {
        Self {
            inner,
            cancel,
            bytes_read,
        }
    }
}

impl<R: AsyncRead> AsyncRead for ProgressReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.project();
        if this.cancel.is_cancelled() {
            return Poll::Ready(Err(io::Error::other(ReadCancelled)));
        }

        let before = buf.filled().len();
        let result = this.inner.poll_read(cx, buf);
        let n = (buf.filled().len() - before) as u64;
        if n > 0 {
            this.bytes_read
                .add(n, &[KeyValue::new(DIRECTION_ATTRIBUTE, "read")]);
        }
        result
    }
}

pub fn io_counter(meter: &Meter) -> Counter<u64> {
    meter.u64_counter(IO_COUNTER_NAME).with_unit("By").build()
}
