//! Transport streams with first-byte detection

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

/// Records the instant of the first successful read after being armed.
///
/// Shared between the request path (which arms and collects) and the
/// connection task (which performs the reads).
#[derive(Debug)]
pub struct ReadMarker {
    origin: Instant,
    armed: AtomicBool,
    /// Nanoseconds since `origin`, plus one; zero means unset
    first_read: AtomicU64,
}

impl Default for ReadMarker {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadMarker {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            armed: AtomicBool::new(false),
            first_read: AtomicU64::new(0),
        }
    }

    /// Start watching for the next read
    pub fn arm(&self) {
        self.first_read.store(0, Ordering::Release);
        self.armed.store(true, Ordering::Release);
    }

    /// Stop watching and return the observed instant, if any
    pub fn take(&self) -> Option<Instant> {
        self.armed.store(false, Ordering::Release);
        match self.first_read.swap(0, Ordering::AcqRel) {
            0 => None,
            stamp => Some(self.origin + Duration::from_nanos(stamp - 1)),
        }
    }

    fn on_read(&self) {
        if self.armed.swap(false, Ordering::AcqRel) {
            let nanos = u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX - 1);
            self.first_read.store(nanos + 1, Ordering::Release);
        }
    }
}

/// Plain TCP or TLS-over-TCP connection to the target
pub enum TargetStream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for TargetStream {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TargetStream::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            TargetStream::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for TargetStream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            TargetStream::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            TargetStream::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TargetStream::Plain(stream) => Pin::new(stream).poll_flush(cx),
            TargetStream::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TargetStream::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            TargetStream::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Stream wrapper that notifies a `ReadMarker` whenever bytes arrive
pub struct TracedIo<S> {
    inner: S,
    marker: Arc<ReadMarker>,
}

impl<S> TracedIo<S> {
    pub fn new(inner: S, marker: Arc<ReadMarker>) -> Self {
        Self { inner, marker }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for TracedIo<S> {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if matches!(poll, Poll::Ready(Ok(()))) && buf.filled().len() > before {
            this.marker.on_read();
        }
        poll
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TracedIo<S> {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
