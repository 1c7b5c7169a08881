//! Read-only projection of one X.509 certificate.
//!
//! BoringSSL does the verifying; this is only the view that gets printed.
//! `x509-parser` is used because it exposes every extension with its
//! criticality flag and raw value.

use time::OffsetDateTime;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::objects::{oid2sn, oid_registry};
use x509_parser::oid_registry::Oid;
use x509_parser::prelude::FromDer;

use crate::base::neterror::NetError;

/// One certificate extension as it appeared on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRecord {
    /// Dotted object identifier.
    pub oid: String,
    pub critical: bool,
    pub value: Vec<u8>,
    /// Whether the decoder knows this extension type.
    pub recognized: bool,
}

/// Fields of a parsed certificate, in the order they are printed.
#[derive(Debug, Clone)]
pub struct CertificateRecord {
    pub subject: String,
    pub common_name: Option<String>,
    pub issuer: String,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    pub dns_names: Vec<String>,
    /// Human version number (1, 2 or 3).
    pub version: u32,
    /// Decimal serial number.
    pub serial: String,
    pub extensions: Vec<ExtensionRecord>,
    pub public_key_algorithm: String,
    pub signature_algorithm: String,
    pub signature: Vec<u8>,
}

impl CertificateRecord {
    /// Decode a DER certificate. `index` only labels the error.
    pub fn parse(index: usize, der: &[u8]) -> Result<Self, NetError> {
        let parse_err = |reason: String| NetError::CertificateParse { index, reason };

        let (rest, cert) = X509Certificate::from_der(der).map_err(|e| parse_err(e.to_string()))?;
        if !rest.is_empty() {
            return Err(parse_err(format!("{} trailing bytes after certificate", rest.len())));
        }

        let dns_names = match cert.subject_alternative_name() {
            Ok(Some(san)) => san
                .value
                .general_names
                .iter()
                .filter_map(|name| match name {
                    GeneralName::DNSName(dns) => Some(dns.to_string()),
                    _ => None,
                })
                .collect(),
            Ok(None) => Vec::new(),
            Err(e) => return Err(parse_err(e.to_string())),
        };

        let extensions = cert
            .extensions()
            .iter()
            .map(|ext| ExtensionRecord {
                oid: ext.oid.to_id_string(),
                critical: ext.critical,
                value: ext.value.to_vec(),
                recognized: !matches!(
                    ext.parsed_extension(),
                    ParsedExtension::UnsupportedExtension { .. }
                ),
            })
            .collect();

        Ok(Self {
            subject: cert.subject().to_string(),
            common_name: cert
                .subject()
                .iter_common_name()
                .next()
                .and_then(|cn| cn.as_str().ok())
                .map(str::to_string),
            issuer: cert.issuer().to_string(),
            not_before: cert.validity().not_before.to_datetime(),
            not_after: cert.validity().not_after.to_datetime(),
            dns_names,
            version: cert.version().0 + 1,
            serial: cert.tbs_certificate.serial.to_string(),
            extensions,
            public_key_algorithm: oid_name(&cert.public_key().algorithm.algorithm),
            signature_algorithm: oid_name(&cert.signature_algorithm.algorithm),
            signature: cert.signature_value.data.to_vec(),
        })
    }

    /// Extensions the decoder does not recognise.
    pub fn extra_extensions(&self) -> impl Iterator<Item = &ExtensionRecord> {
        self.extensions.iter().filter(|ext| !ext.recognized)
    }

    /// Critical extensions the decoder does not recognise.
    pub fn unhandled_critical_extensions(&self) -> impl Iterator<Item = &ExtensionRecord> {
        self.extensions
            .iter()
            .filter(|ext| ext.critical && !ext.recognized)
    }
}

fn oid_name(oid: &Oid) -> String {
    oid2sn(oid, oid_registry())
        .map(str::to_string)
        .unwrap_or_else(|_| oid.to_id_string())
}

/// Lowercase hex without separators.
pub fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}
