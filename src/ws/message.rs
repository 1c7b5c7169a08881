//! Mapping between session payloads and tungstenite frames.
//!
//! The session treats every message as opaque bytes. Outbound bytes go out
//! as a text frame when they are valid UTF-8 (operator input always is) and
//! as binary otherwise.

use tokio_tungstenite::tungstenite::{self, Message};

use crate::base::neterror::NetError;

/// What one read from the socket means to the session.
#[derive(Debug, PartialEq, Eq)]
pub enum Inbound {
    /// Payload bytes to print.
    Data(Vec<u8>),
    /// Peer sent a close frame.
    Closed,
    /// Ping/pong and raw frames; the transport answers pings itself.
    Control,
}

/// Wrap outbound bytes in a frame.
pub fn outbound(payload: Vec<u8>) -> Message {
    match String::from_utf8(payload) {
        Ok(text) => Message::Text(text),
        Err(e) => Message::Binary(e.into_bytes()),
    }
}

/// Classify a received frame, cutting data to `limit` bytes when set.
pub fn inbound(msg: Message, limit: Option<usize>) -> Inbound {
    let mut data = match msg {
        Message::Text(s) => s.into_bytes(),
        Message::Binary(b) => b,
        Message::Close(frame) => {
            if let Some(frame) = frame {
                tracing::debug!(
                    code = u16::from(frame.code),
                    reason = %frame.reason,
                    "close frame"
                );
            }
            return Inbound::Closed;
        }
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => return Inbound::Control,
    };
    if let Some(limit) = limit {
        if data.len() > limit {
            tracing::debug!(len = data.len(), limit, "truncating received message");
            data.truncate(limit);
        }
    }
    Inbound::Data(data)
}

/// Map a transport read error; the "connection is gone" family becomes
/// [`NetError::CleanClose`].
pub fn read_error(err: tungstenite::Error) -> NetError {
    match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            NetError::CleanClose
        }
        other => NetError::Read(other),
    }
}
