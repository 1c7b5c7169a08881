//! Socket abstraction so `ws://` and `wss://` look the same to the WebSocket layer.
//!
//! The handshake and both session loops only need `AsyncRead + AsyncWrite`;
//! whether bytes travel over plain TCP or a BoringSSL session is decided once
//! by the connect job and hidden behind [`BoxedSocket`].

use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_boring::SslStream;

/// Any byte stream the WebSocket can run over.
pub trait StreamSocket: AsyncRead + AsyncWrite + Unpin + Send + Sync + 'static {
    /// Whether the stream carries a TLS session.
    fn is_secure(&self) -> bool {
        false
    }
}

impl StreamSocket for TcpStream {}

impl<S: StreamSocket> StreamSocket for SslStream<S> {
    fn is_secure(&self) -> bool {
        true
    }
}

/// Object-safe owner of the connected stream.
pub struct BoxedSocket {
    inner: Pin<Box<dyn StreamSocket>>,
    secure: bool,
}

impl std::fmt::Debug for BoxedSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxedSocket").field("secure", &self.secure).finish()
    }
}

impl BoxedSocket {
    pub fn new<S: StreamSocket>(socket: S) -> Self {
        let secure = socket.is_secure();
        Self {
            inner: Box::pin(socket),
            secure,
        }
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }
}

impl AsyncRead for BoxedSocket {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        self.inner.as_mut().poll_read(cx, buf)
    }
}

impl AsyncWrite for BoxedSocket {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        self.inner.as_mut().poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        self.inner.as_mut().poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        self.inner.as_mut().poll_shutdown(cx)
    }
}
