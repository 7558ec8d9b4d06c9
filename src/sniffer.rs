//! Non-destructive protocol classification of the first bytes of a session.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

const PEEK_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Json,
    Binary,
    Unknown,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Protocol::Json => "json",
            Protocol::Binary => "binary",
            Protocol::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Wraps a readable stream, peeking up to [`PEEK_SIZE`] bytes to classify
/// it without consuming them. The peeked bytes are transparently replayed
/// to whichever handler the router selects, by virtue of `Sniffer` itself
/// implementing `AsyncRead`.
pub struct Sniffer<R> {
    inner: R,
    peek_buf: Vec<u8>,
    peek_pos: usize,
}

impl<R: AsyncRead + Unpin> Sniffer<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            peek_buf: Vec::new(),
            peek_pos: 0,
        }
    }

    /// Peeks at the stream and classifies it. Safe to call more than once;
    /// subsequent calls return the same verdict without re-reading.
    ///
    /// Reads one byte at a time and re-checks [`classify_partial`] after
    /// each one, so a verdict that's decidable from a short prefix (a
    /// leading `{`, a control byte, a `Content-Length:` header) returns
    /// without waiting to fill the whole [`PEEK_SIZE`] window. A session
    /// whose first message is shorter than that window and that then
    /// blocks waiting for a reply would otherwise leave `poll_read`
    /// pending forever.
    pub async fn detect(&mut self) -> io::Result<Protocol> {
        if let Some(verdict) = classify_partial(&self.peek_buf) {
            return Ok(verdict);
        }
        while self.peek_buf.len() < PEEK_SIZE {
            let mut byte = [0u8; 1];
            let mut read_buf = ReadBuf::new(&mut byte);
            std::future::poll_fn(|cx| Pin::new(&mut self.inner).poll_read(cx, &mut read_buf)).await?;
            if read_buf.filled().is_empty() {
                break;
            }
            self.peek_buf.push(byte[0]);
            if let Some(verdict) = classify_partial(&self.peek_buf) {
                return Ok(verdict);
            }
        }
        Ok(classify(&self.peek_buf))
    }
}

const CONTENT_LENGTH_PREFIX: &[u8] = b"Content-Length:";

/// Returns a verdict as soon as `bytes` determines one, or `None` if more
/// bytes are needed before the stream can be classified.
fn classify_partial(bytes: &[u8]) -> Option<Protocol> {
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if i >= bytes.len() {
        return None;
    }
    let rest = &bytes[i..];

    if rest[0] == b'{' {
        return Some(Protocol::Json);
    }
    if rest[0] <= 0x1F {
        return Some(Protocol::Binary);
    }

    let prefix_len = rest.len().min(CONTENT_LENGTH_PREFIX.len());
    if !rest[..prefix_len].eq_ignore_ascii_case(&CONTENT_LENGTH_PREFIX[..prefix_len]) {
        return Some(Protocol::Unknown);
    }
    if rest.len() >= CONTENT_LENGTH_PREFIX.len() {
        return Some(Protocol::Json);
    }
    None
}

/// Pure classification logic for a buffer that's already known to be
/// complete (full peek window, or clean EOF), exposed standalone for unit
/// testing.
pub fn classify(bytes: &[u8]) -> Protocol {
    classify_partial(bytes).unwrap_or(Protocol::Unknown)
}

impl<R: AsyncRead + Unpin> AsyncRead for Sniffer<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.peek_pos < this.peek_buf.len() {
            let remaining = &this.peek_buf[this.peek_pos..];
            let n = remaining.len().min(buf.remaining());
            buf.put_slice(&remaining[..n]);
            this.peek_pos += n;
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}
