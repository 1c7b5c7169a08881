//! WebSocket connector.
//!
//! Validates the target and origin before touching the network, dials
//! through [`ConnectJob`] (TCP, optionally BoringSSL) and performs the
//! client handshake with tokio-tungstenite.

use crate::base::neterror::NetError;
use crate::socket::{BoxedSocket, ConnectJob, PeerVerifier, TlsConfig};
use boring::x509::X509;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use http::header::{HeaderValue, ORIGIN, SEC_WEBSOCKET_PROTOCOL};
use std::sync::Arc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{client_async, WebSocketStream};
use url::Url;

/// Type alias for the WebSocket stream.
pub type WsStream = WebSocketStream<BoxedSocket>;

/// Write half of a [`Connection`].
pub type WsSink = SplitSink<WsStream, Message>;

/// Read half of a [`Connection`].
pub type WsSource = SplitStream<WsStream>;

/// An open client connection.
#[derive(Debug)]
pub struct Connection {
    stream: WsStream,
    url: Url,
    protocol: Option<String>,
}

impl Connection {
    /// Connect with default options.
    ///
    /// # Example
    /// ```ignore
    /// let conn = Connection::connect("ws://localhost:1337/ws", "http://localhost/").await?;
    /// ```
    pub async fn connect(url: &str, origin: &str) -> Result<Self, NetError> {
        WebSocketBuilder::new().url(url)?.origin(origin)?.connect().await
    }

    /// Get the URL this WebSocket is connected to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Subprotocol the server selected, if any.
    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    /// Check if the socket runs over TLS.
    pub fn is_secure(&self) -> bool {
        self.stream.get_ref().is_secure()
    }

    /// Send one message.
    pub async fn send(&mut self, msg: Message) -> Result<(), NetError> {
        self.stream.send(msg).await.map_err(NetError::Write)
    }

    /// Receive one message; `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<Result<Message, NetError>> {
        self.stream
            .next()
            .await
            .map(|r| r.map_err(super::message::read_error))
    }

    /// Hand the two halves to the session loops.
    pub fn split(self) -> (WsSink, WsSource) {
        self.stream.split()
    }
}

/// WebSocket connection builder.
#[derive(Debug, Clone)]
pub struct WebSocketBuilder {
    url: Option<Url>,
    origin: Option<String>,
    subprotocol: Option<String>,
    tls: TlsConfig,
}

impl Default for WebSocketBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSocketBuilder {
    /// Create a new WebSocket builder.
    pub fn new() -> Self {
        Self {
            url: None,
            origin: None,
            subprotocol: None,
            tls: TlsConfig::default(),
        }
    }

    /// Set the URL to connect to. Only `ws` and `wss` with a host are accepted.
    pub fn url(mut self, url: &str) -> Result<Self, NetError> {
        let invalid = |reason: String| NetError::InvalidUrl {
            url: url.to_string(),
            reason,
        };
        let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;

        if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
            return Err(invalid(format!("unsupported scheme {:?}", parsed.scheme())));
        }
        if parsed.host_str().is_none() {
            return Err(invalid("missing host".into()));
        }

        self.url = Some(parsed);
        Ok(self)
    }

    /// Set the Origin header. Must be an absolute URL; it is sent as given.
    pub fn origin(mut self, origin: &str) -> Result<Self, NetError> {
        let invalid = |reason: String| NetError::InvalidOrigin {
            origin: origin.to_string(),
            reason,
        };
        Url::parse(origin).map_err(|e| invalid(e.to_string()))?;
        HeaderValue::from_str(origin).map_err(|e| invalid(e.to_string()))?;

        self.origin = Some(origin.to_string());
        Ok(self)
    }

    /// Offer a single subprotocol. An empty name offers none.
    pub fn subprotocol(mut self, protocol: &str) -> Result<Self, NetError> {
        if protocol.is_empty() {
            self.subprotocol = None;
            return Ok(self);
        }
        let is_token = protocol
            .bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b));
        if !is_token {
            return Err(NetError::InvalidSubprotocol(protocol.to_string()));
        }
        self.subprotocol = Some(protocol.to_string());
        Ok(self)
    }

    /// Disable certificate and host name verification for `wss`.
    pub fn insecure_skip_verify(mut self, skip: bool) -> Self {
        self.tls = self.tls.insecure(skip);
        self
    }

    /// Trust `cert` as an additional root for `wss`.
    pub fn root_certificate(mut self, cert: X509) -> Self {
        self.tls = self.tls.with_root_certificate(cert);
        self
    }

    /// Run `verifier` once per TLS handshake.
    pub fn verifier(mut self, verifier: Arc<dyn PeerVerifier>) -> Self {
        self.tls = self.tls.with_verifier(verifier);
        self
    }

    /// Get the URL if set.
    pub fn get_url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Get the origin if set.
    pub fn get_origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Get the offered subprotocol if set.
    pub fn get_subprotocol(&self) -> Option<&str> {
        self.subprotocol.as_deref()
    }

    /// Check if secure (wss://).
    pub fn is_secure(&self) -> bool {
        self.url.as_ref().is_some_and(|u| u.scheme() == "wss")
    }

    /// Dial and perform the handshake. One attempt, no retry.
    pub async fn connect(self) -> Result<Connection, NetError> {
        let url = self.url.clone().ok_or_else(|| NetError::InvalidUrl {
            url: String::new(),
            reason: "no URL configured".into(),
        })?;
        let origin = self.origin.clone().ok_or_else(|| NetError::InvalidOrigin {
            origin: String::new(),
            reason: "no origin configured".into(),
        })?;

        let request = self.request(&url, &origin)?;
        let config = format!("{:?}", self);
        let wrap = |source: NetError| NetError::ConnectionFailed {
            config: config.clone(),
            source: Box::new(source),
        };

        tracing::debug!(%url, %origin, protocol = ?self.subprotocol, "dialing");
        let socket = ConnectJob::connect(&url, &self.tls).await.map_err(wrap)?;

        let (stream, response) = client_async(request, socket).await.map_err(|e| {
            tracing::debug!("WebSocket handshake error: {:?}", e);
            NetError::ConnectionFailed {
                config: config.clone(),
                source: Box::new(e),
            }
        })?;

        let protocol = response
            .headers()
            .get(SEC_WEBSOCKET_PROTOCOL)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if let Some(p) = &protocol {
            tracing::info!(protocol = %p, "server selected subprotocol");
        }

        Ok(Connection {
            stream,
            url,
            protocol,
        })
    }

    fn request(
        &self,
        url: &Url,
        origin: &str,
    ) -> Result<tungstenite::handshake::client::Request, NetError> {
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| NetError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let headers = request.headers_mut();
        let origin_value = HeaderValue::from_str(origin).map_err(|e| NetError::InvalidOrigin {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;
        headers.insert(ORIGIN, origin_value);

        if let Some(protocol) = &self.subprotocol {
            let value = HeaderValue::from_str(protocol)
                .map_err(|_| NetError::InvalidSubprotocol(protocol.clone()))?;
            headers.insert(SEC_WEBSOCKET_PROTOCOL, value);
        }

        Ok(request)
    }
}
