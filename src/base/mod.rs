//! Base types and error handling.
//!
//! - [`NetError`]: every failure the client reports, from flag validation
//!   to per-message read/write errors
//! - [`ErrorKind`]: the coarse classification the session acts on

pub mod neterror;

pub use neterror::{BoxError, ErrorKind, NetError};
