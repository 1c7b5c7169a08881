//! WebSocket client support.
//!
//! Provides the connector over tokio-tungstenite with BoringSSL underneath.
//!
//! # Example
//! ```ignore
//! use wsd::ws::WebSocketBuilder;
//!
//! let conn = WebSocketBuilder::new()
//!     .url("wss://echo.example.com/ws")?
//!     .origin("https://example.com")?
//!     .subprotocol("chat")?
//!     .connect()
//!     .await?;
//! ```

mod connection;
pub mod message;

pub use connection::{Connection, WebSocketBuilder, WsSink, WsSource, WsStream};
pub use message::Inbound;
