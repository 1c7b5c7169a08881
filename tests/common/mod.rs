//! Shared helpers for the integration tests.

#![allow(dead_code)]

use boring::asn1::Asn1Time;
use boring::bn::BigNum;
use boring::ec::{EcGroup, EcKey};
use boring::hash::MessageDigest;
use boring::nid::Nid;
use boring::pkey::{PKey, Private};
use boring::ssl::{SslAcceptor, SslMethod};
use boring::x509::extension::{BasicConstraints, SubjectAlternativeName};
use boring::x509::{X509Builder, X509Name, X509NameBuilder, X509NameRef, X509};
use std::net::SocketAddr;
use std::sync::Mutex;
use tokio::net::TcpListener;
use wsd::base::NetError;
use wsd::socket::PeerVerifier;

fn key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn name(org: Option<&str>, cn: &str) -> X509Name {
    let mut name = X509NameBuilder::new().unwrap();
    if let Some(org) = org {
        name.append_entry_by_nid(Nid::ORGANIZATIONNAME, org).unwrap();
    }
    name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    name.build()
}

/// v3 certificate skeleton valid for 30 days from now.
fn builder(
    subject: &X509NameRef,
    issuer: &X509NameRef,
    key: &PKey<Private>,
    serial: u32,
) -> X509Builder {
    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(serial).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(subject).unwrap();
    builder.set_issuer_name(issuer).unwrap();
    builder.set_pubkey(key).unwrap();
    let not_before = Asn1Time::days_from_now(0).unwrap();
    builder.set_not_before(&not_before).unwrap();
    let not_after = Asn1Time::days_from_now(30).unwrap();
    builder.set_not_after(&not_after).unwrap();
    builder
}

/// Self-signed P-256 certificate whose subject is just `CN=<cn>`.
pub fn self_signed(cn: &str, serial: u32) -> (X509, PKey<Private>) {
    let key = key();
    let subject = name(None, cn);
    let mut builder = builder(&subject, &subject, &key, serial);
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    (builder.build(), key)
}

/// DER bytes of a fresh self-signed certificate.
pub fn der(cn: &str, serial: u32) -> Vec<u8> {
    self_signed(cn, serial).0.to_der().unwrap()
}

/// DER bytes of a self-signed certificate with subject `O=<org>, CN=<cn>`.
pub fn der_with_org(org: &str, cn: &str, serial: u32) -> Vec<u8> {
    let key = key();
    let subject = name(Some(org), cn);
    let mut builder = builder(&subject, &subject, &key, serial);
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    builder.build().to_der().unwrap()
}

/// Self-signed root allowed to issue certificates.
pub fn certificate_authority(cn: &str) -> (X509, PKey<Private>) {
    let key = key();
    let subject = name(Some("wsd tests"), cn);
    let mut builder = builder(&subject, &subject, &key, 1);
    builder
        .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    (builder.build(), key)
}

/// Server certificate for `ip`, issued by `ca`.
pub fn issued_for_ip(ca: &X509, ca_key: &PKey<Private>, ip: &str) -> (X509, PKey<Private>) {
    let key = key();
    let subject = name(None, ip);
    let mut builder = builder(&subject, ca.subject_name(), &key, 2);
    let san = SubjectAlternativeName::new()
        .ip(ip)
        .build(&builder.x509v3_context(Some(&**ca), None))
        .unwrap();
    builder.append_extension(san).unwrap();
    builder.sign(ca_key, MessageDigest::sha256()).unwrap();
    (builder.build(), key)
}

pub fn acceptor(cert: &X509, key: &PKey<Private>) -> SslAcceptor {
    acceptor_with_chain(cert, key, &[])
}

/// Acceptor that also sends `chain` after the leaf.
pub fn acceptor_with_chain(cert: &X509, key: &PKey<Private>, chain: &[X509]) -> SslAcceptor {
    let mut builder = SslAcceptor::mozilla_intermediate(SslMethod::tls()).unwrap();
    builder.set_private_key(key).unwrap();
    builder.set_certificate(cert).unwrap();
    for extra in chain {
        builder.add_extra_chain_cert(extra.clone()).unwrap();
    }
    builder.check_private_key().unwrap();
    builder.build()
}

pub async fn listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// What one verifier call received.
#[derive(Debug, Clone)]
pub struct VerifyCall {
    pub raw_certs: Vec<Vec<u8>>,
    pub verified_chains: Vec<Vec<Vec<u8>>>,
}

/// Records every call instead of printing.
#[derive(Debug, Default)]
pub struct RecordingVerifier {
    pub calls: Mutex<Vec<VerifyCall>>,
}

impl RecordingVerifier {
    /// `(raw certificate count, verified chain count)` per call.
    pub fn calls(&self) -> Vec<(usize, usize)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| (call.raw_certs.len(), call.verified_chains.len()))
            .collect()
    }

    pub fn last(&self) -> Option<VerifyCall> {
        self.calls.lock().unwrap().last().cloned()
    }
}

impl PeerVerifier for RecordingVerifier {
    fn verify(
        &self,
        raw_certs: &[Vec<u8>],
        verified_chains: &[Vec<Vec<u8>>],
    ) -> Result<(), NetError> {
        self.calls.lock().unwrap().push(VerifyCall {
            raw_certs: raw_certs.to_vec(),
            verified_chains: verified_chains.to_vec(),
        });
        Ok(())
    }
}
