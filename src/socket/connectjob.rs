use crate::base::neterror::NetError;
use crate::socket::stream::BoxedSocket;
use crate::socket::tls::TlsConfig;
use tokio::net::TcpStream;
use url::Url;

/// Manages the connection process: DNS -> TCP -> SSL -> peer inspection.
pub struct ConnectJob;

impl ConnectJob {
    pub async fn connect(url: &Url, tls: &TlsConfig) -> Result<BoxedSocket, NetError> {
        let host = url
            .host_str()
            .ok_or_else(|| NetError::InvalidUrl {
                url: url.to_string(),
                reason: "missing host".into(),
            })?
            .to_string();
        let port = url.port_or_known_default().ok_or_else(|| NetError::InvalidUrl {
            url: url.to_string(),
            reason: "missing port".into(),
        })?;

        // 1. DNS Resolution
        let addr_str = format!("{}:{}", host, port);
        let addrs: Vec<_> = tokio::net::lookup_host(&addr_str)
            .await
            .map_err(|e| NetError::NameNotResolved(format!("{addr_str}: {e}")))?
            .collect();
        if addrs.is_empty() {
            return Err(NetError::NameNotResolved(addr_str));
        }

        // 2. TCP Connect, first address that answers
        let mut last_err = None;
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(s) => {
                    tracing::debug!(%addr, "tcp connected");
                    stream = Some(s);
                    break;
                }
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "tcp connect failed");
                    last_err = Some(e);
                }
            }
        }
        let stream = match (stream, last_err) {
            (Some(s), _) => s,
            (None, Some(e)) => return Err(NetError::Io(e)),
            (None, None) => return Err(NetError::NameNotResolved(addr_str)),
        };

        if url.scheme() != "wss" {
            return Ok(BoxedSocket::new(stream));
        }

        // 3. SSL Handshake
        let (connector, capture) = tls.connector()?;
        let mut config = connector
            .configure()
            .map_err(|e| NetError::SslProtocolError(e.to_string()))?;
        let bare_host = host.trim_start_matches('[').trim_end_matches(']');
        config.set_use_server_name_indication(TlsConfig::should_set_sni(bare_host));
        if tls.insecure_skip_verify {
            config.set_verify_hostname(false);
        }

        let tls_stream = tokio_boring::connect(config, bare_host, stream)
            .await
            .map_err(|e| {
                tracing::debug!("SSL handshake failed: {:?}", e);
                NetError::SslProtocolError(e.to_string())
            })?;

        // 4. Peer inspection, exactly once per handshake. It runs on the
        // finished session: a verifier error drops the TLS connection here,
        // before the WebSocket upgrade, with no alert sent to the peer.
        if let Some(verifier) = &tls.verifier {
            let raw_certs = tls_stream
                .ssl()
                .peer_cert_chain()
                .map(|chain| {
                    chain
                        .iter()
                        .map(|cert| cert.to_der())
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()
                .map_err(|e| NetError::SslProtocolError(e.to_string()))?
                .unwrap_or_default();
            let verified_chains = if tls.insecure_skip_verify {
                Vec::new()
            } else {
                capture.take()
            };
            verifier.verify(&raw_certs, &verified_chains)?;
        }

        Ok(BoxedSocket::new(tls_stream))
    }
}
