//! Socket and connection setup.
//!
//! - [`connectjob`]: DNS → TCP → TLS connection flow
//! - [`stream`]: one byte-stream type for plain and TLS sockets
//! - [`tls`]: BoringSSL configuration and the peer inspection hook

pub mod connectjob;
pub mod stream;
pub mod tls;

pub use connectjob::ConnectJob;
pub use stream::{BoxedSocket, StreamSocket};
pub use tls::{ChainCapture, PeerVerifier, TlsConfig};
