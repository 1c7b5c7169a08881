//! # wsd
//!
//! An interactive command-line WebSocket client.
//!
//! `wsd` connects to a `ws://` or `wss://` endpoint, sends every line typed
//! on stdin as one message and prints every message it receives. For `wss`
//! targets it dumps the certificates the server presented, and the chains
//! BoringSSL verified, before the WebSocket upgrade.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wsd::ws::WebSocketBuilder;
//!
//! #[tokio::main]
//! async fn main() {
//!     let conn = WebSocketBuilder::new()
//!         .url("ws://localhost:1337/ws")
//!         .unwrap()
//!         .origin("http://localhost/")
//!         .unwrap()
//!         .connect()
//!         .await
//!         .unwrap();
//!     println!("connected to {}", conn.url());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error type and error classes
//! - [`config`] - Command line flags and the client configuration
//! - [`console`] - Prompt and line protocol on stdout
//! - [`session`] - The send/receive/print loops and their coordinator
//! - [`socket`] - TCP and BoringSSL transports
//! - [`tls`] - Certificate decoding and the chain dump
//! - [`ws`] - WebSocket connector and frame mapping

pub mod base;
pub mod config;
pub mod console;
pub mod session;
pub mod socket;
pub mod tls;
pub mod ws;

/// Version printed by `-version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
