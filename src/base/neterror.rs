use thiserror::Error;

/// Boxed transport/TLS failure carried inside [`NetError::ConnectionFailed`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every failure the client can observe, from argument checking to the
/// steady-state read/write loops.
#[derive(Debug, Error)]
pub enum NetError {
    // Configuration Errors (before any I/O)
    #[error("invalid WebSocket URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid origin {origin:?}: {reason}")]
    InvalidOrigin { origin: String, reason: String },
    #[error("invalid subprotocol {0:?}")]
    InvalidSubprotocol(String),

    // Connection Errors (startup, fatal)
    #[error("{config}: {source}")]
    ConnectionFailed {
        config: String,
        #[source]
        source: BoxError,
    },
    #[error("name not resolved: {0}")]
    NameNotResolved(String),
    #[error("SSL protocol error: {0}")]
    SslProtocolError(String),

    // Certificate Errors (raised from inside the handshake)
    #[error("certificate #{index} could not be parsed: {reason}")]
    CertificateParse { index: usize, reason: String },
    #[error("failed to print certificate: {0}")]
    CertificateOutput(String),

    // Steady-state Errors
    #[error("{0}")]
    Read(#[source] tokio_tungstenite::tungstenite::Error),
    #[error("{0}")]
    Write(#[source] tokio_tungstenite::tungstenite::Error),
    #[error("EOF")]
    CleanClose,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`NetError`] used by the session and the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input detected before any network I/O.
    Configuration,
    /// Dial, TLS or WebSocket handshake failure.
    Connection,
    /// A handshake certificate could not be decoded.
    CertificateParse,
    /// Per-operation read/write failure; the session keeps running.
    Transient,
    /// Orderly shutdown initiated by the peer.
    CleanClose,
}

impl NetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NetError::InvalidUrl { .. }
            | NetError::InvalidOrigin { .. }
            | NetError::InvalidSubprotocol(_) => ErrorKind::Configuration,
            NetError::ConnectionFailed { .. }
            | NetError::NameNotResolved(_)
            | NetError::SslProtocolError(_) => ErrorKind::Connection,
            NetError::CertificateParse { .. } | NetError::CertificateOutput(_) => {
                ErrorKind::CertificateParse
            }
            NetError::Read(_) | NetError::Write(_) | NetError::Io(_) => ErrorKind::Transient,
            NetError::CleanClose => ErrorKind::CleanClose,
        }
    }

    /// True for the sentinel that ends the session successfully.
    pub fn is_clean_close(&self) -> bool {
        matches!(self, NetError::CleanClose)
    }

    /// Startup errors end the process; steady-state ones are only reported.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Transient | ErrorKind::CleanClose)
    }

    /// Walk the source chain looking for a certificate decoding failure.
    pub fn certificate_cause(&self) -> Option<&NetError> {
        if let NetError::CertificateParse { .. } = self {
            return Some(self);
        }
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            if let Some(net) = err.downcast_ref::<NetError>() {
                if matches!(net, NetError::CertificateParse { .. }) {
                    return Some(net);
                }
            }
            source = err.source();
        }
        None
    }
}
