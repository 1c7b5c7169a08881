use crate::base::neterror::NetError;
use boring::ssl::{SslConnector, SslConnectorBuilder, SslMethod, SslVerifyMode, SslVersion};
use boring::x509::X509;
use std::sync::{Arc, Mutex};

/// Hook run once per TLS connection with the certificates the peer presented
/// (leaf first) and the chains BoringSSL verified, all DER-encoded.
///
/// Returning an error aborts the connection attempt.
pub trait PeerVerifier: Send + Sync {
    fn verify(&self, raw_certs: &[Vec<u8>], verified_chains: &[Vec<Vec<u8>>])
        -> Result<(), NetError>;
}

/// Client TLS settings for `wss://` connections.
#[derive(Clone)]
pub struct TlsConfig {
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
    /// Accept any certificate chain and any host name.
    pub insecure_skip_verify: bool,
    /// Extra trust anchors on top of the system store.
    pub root_certificates: Vec<X509>,
    pub verifier: Option<Arc<dyn PeerVerifier>>,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("min_version", &self.min_version)
            .field("max_version", &self.max_version)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("root_certificates", &self.root_certificates.len())
            .field("verifier", &self.verifier.as_ref().map(|_| "PeerVerifier"))
            .finish()
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            min_version: Some(SslVersion::TLS1_2),
            max_version: Some(SslVersion::TLS1_3),
            insecure_skip_verify: false,
            root_certificates: Vec::new(),
            verifier: None,
        }
    }
}

#[derive(Debug, Default)]
struct ChainState {
    rejected: bool,
    chain: Option<Vec<Vec<u8>>>,
}

/// Chain recorded by the verify callback during one handshake.
///
/// BoringSSL walks the built chain from the trust anchor down to the leaf;
/// the chain is only kept if every depth verified.
#[derive(Debug, Clone, Default)]
pub struct ChainCapture(Arc<Mutex<ChainState>>);

impl ChainCapture {
    fn record(
        &self,
        preverify_ok: bool,
        depth: u32,
        chain: impl FnOnce() -> Option<Vec<Vec<u8>>>,
    ) {
        let mut state = self.0.lock().unwrap_or_else(|e| e.into_inner());
        if !preverify_ok {
            state.rejected = true;
            state.chain = None;
        }
        if depth == 0 && !state.rejected {
            state.chain = chain();
        }
    }

    /// The verified chains, leaf first. Empty when verification did not pass.
    pub fn take(&self) -> Vec<Vec<Vec<u8>>> {
        let mut state = self.0.lock().unwrap_or_else(|e| e.into_inner());
        state.chain.take().into_iter().collect()
    }
}

impl TlsConfig {
    pub fn insecure(mut self, skip: bool) -> Self {
        self.insecure_skip_verify = skip;
        self
    }

    /// Trust `cert` as an additional root.
    pub fn with_root_certificate(mut self, cert: X509) -> Self {
        self.root_certificates.push(cert);
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn PeerVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Build a connector plus the capture its verify callback writes into.
    pub fn connector(&self) -> Result<(SslConnector, ChainCapture), NetError> {
        let mut builder = SslConnector::builder(SslMethod::tls())
            .map_err(|e| NetError::SslProtocolError(e.to_string()))?;
        let capture = ChainCapture::default();
        self.apply_to_builder(&mut builder, &capture)?;
        Ok((builder.build(), capture))
    }

    /// Apply this configuration to an SSL connector builder.
    pub fn apply_to_builder(
        &self,
        builder: &mut SslConnectorBuilder,
        capture: &ChainCapture,
    ) -> Result<(), NetError> {
        if let Some(min) = self.min_version {
            builder
                .set_min_proto_version(Some(min))
                .map_err(|e| NetError::SslProtocolError(e.to_string()))?;
        }
        if let Some(max) = self.max_version {
            builder
                .set_max_proto_version(Some(max))
                .map_err(|e| NetError::SslProtocolError(e.to_string()))?;
        }

        for cert in &self.root_certificates {
            builder
                .cert_store_mut()
                .add_cert(cert.clone())
                .map_err(|e| NetError::SslProtocolError(e.to_string()))?;
        }

        // WebSocket upgrades are HTTP/1.1 only.
        builder
            .set_alpn_protos(b"\x08http/1.1")
            .map_err(|e| NetError::SslProtocolError(e.to_string()))?;

        let skip = self.insecure_skip_verify;
        let capture = capture.clone();
        builder.set_verify_callback(SslVerifyMode::PEER, move |preverify_ok, ctx| {
            let depth = ctx.error_depth();
            if !preverify_ok {
                tracing::debug!(depth, skip, "peer certificate failed verification");
            }
            capture.record(preverify_ok, depth, || {
                ctx.chain()
                    .map(|chain| chain.iter().filter_map(|cert| cert.to_der().ok()).collect())
            });
            preverify_ok || skip
        });

        Ok(())
    }

    /// Check if SNI should be set for this host.
    /// Per RFC 6066, SNI MUST NOT be set for raw IP addresses.
    pub fn should_set_sni(host: &str) -> bool {
        host.trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<std::net::IpAddr>()
            .is_err()
    }
}
