//! Certificate chain dump run during the TLS handshake.
//!
//! The inspector prints every certificate the server presented, then every
//! chain BoringSSL verified. It never rejects a chain on its own; the only
//! error it reports is a certificate it cannot decode, and that error is not
//! swallowed.

use std::fmt::Write as _;
use std::io::{self, Write};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::base::neterror::NetError;
use crate::console::Palette;
use crate::socket::tls::PeerVerifier;
use crate::tls::certinfo::{hex, CertificateRecord, ExtensionRecord};
use crate::tls::humanize;

/// Prints certificate details to stdout from inside the handshake.
#[derive(Debug, Clone, Copy, Default)]
pub struct CertificateInspector {
    palette: Palette,
}

impl CertificateInspector {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    /// Write the dump to `out`, relative times measured against `now`.
    ///
    /// Everything rendered before a parse failure is still written.
    pub fn inspect<W: Write>(
        &self,
        out: &mut W,
        raw_certs: &[Vec<u8>],
        verified_chains: &[Vec<Vec<u8>>],
        now: OffsetDateTime,
    ) -> Result<(), NetError> {
        let mut dump = String::new();
        let result = self.render(&mut dump, raw_certs, verified_chains, now);
        if let Err(e) = out.write_all(dump.as_bytes()).and_then(|()| out.flush()) {
            tracing::warn!(error = %e, "failed to print certificate dump");
        }
        if let Err(e) = &result {
            tracing::warn!(error = %e, "certificate inspection aborted");
        }
        result
    }

    fn render(
        &self,
        dump: &mut String,
        raw_certs: &[Vec<u8>],
        verified_chains: &[Vec<Vec<u8>>],
        now: OffsetDateTime,
    ) -> Result<(), NetError> {
        let fmt_err = |_| NetError::CertificateOutput("formatting failed".into());

        dump.push_str(&banner("Raw Certificates Received", |s| self.palette.cyan(s)));
        for (i, der) in raw_certs.iter().enumerate() {
            let record = CertificateRecord::parse(i, der)?;
            self.write_record(dump, i, i == 0, &record, now).map_err(fmt_err)?;
            dump.push('\n');
        }

        dump.push_str(&banner("Verified Certificate Chains", |s| self.palette.green(s)));
        for (k, chain) in verified_chains.iter().enumerate() {
            writeln!(dump, "Verified Chain #{}:", k + 1).map_err(fmt_err)?;
            for (j, der) in chain.iter().enumerate() {
                let record = CertificateRecord::parse(j, der)?;
                self.write_record(dump, j, false, &record, now).map_err(fmt_err)?;
                dump.push('\n');
            }
        }

        Ok(())
    }

    fn write_record(
        &self,
        dump: &mut String,
        index: usize,
        leaf: bool,
        record: &CertificateRecord,
        now: OffsetDateTime,
    ) -> std::fmt::Result {
        writeln!(dump, "Certificate #{}:", index + 1)?;
        let subject = match (&record.common_name, leaf) {
            (Some(cn), true) => format!("CN={}", self.palette.magenta(cn)),
            _ => record.subject.clone(),
        };
        writeln!(dump, "\tSubject: {subject}")?;
        writeln!(dump, "\tIssuer: {}", record.issuer)?;
        writeln!(
            dump,
            "\tValid from: {} ({})",
            timestamp(record.not_before),
            humanize::relative(record.not_before, now)
        )?;
        writeln!(
            dump,
            "\tValid until: {} ({})",
            timestamp(record.not_after),
            self.palette
                .magenta(&humanize::relative(record.not_after, now))
        )?;
        writeln!(dump, "\tSANs: [{}]", record.dns_names.join(", "))?;
        writeln!(dump, "\tVersion: {}", record.version)?;
        writeln!(dump, "\tSerial number: {}", record.serial)?;

        writeln!(dump, "\tExtensions:")?;
        write_extensions(dump, record.extensions.iter())?;
        writeln!(dump, "\tExtra Extensions:")?;
        write_extensions(dump, record.extra_extensions())?;
        writeln!(dump, "\tUnhandled Critical Extensions:")?;
        for (n, ext) in record.unhandled_critical_extensions().enumerate() {
            writeln!(dump, "\t\t{}: ID:{}", n, ext.oid)?;
        }

        writeln!(dump, "\tPublic key algorithm: {}", record.public_key_algorithm)?;
        writeln!(dump, "\tSignature algorithm: {}", record.signature_algorithm)?;
        writeln!(dump, "\tSignature: {}", hex(&record.signature))
    }
}

impl PeerVerifier for CertificateInspector {
    fn verify(
        &self,
        raw_certs: &[Vec<u8>],
        verified_chains: &[Vec<Vec<u8>>],
    ) -> Result<(), NetError> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.inspect(&mut out, raw_certs, verified_chains, OffsetDateTime::now_utc())
    }
}

fn write_extensions<'a>(
    dump: &mut String,
    extensions: impl Iterator<Item = &'a ExtensionRecord>,
) -> std::fmt::Result {
    for (n, ext) in extensions.enumerate() {
        writeln!(
            dump,
            "\t\t{}: ID:{} ; Critical:{} ; Value:{}",
            n,
            ext.oid,
            ext.critical,
            hex(&ext.value)
        )?;
    }
    Ok(())
}

fn banner(title: &str, paint: impl Fn(&str) -> String) -> String {
    let middle = format!("# {title} #");
    let border = "#".repeat(middle.chars().count());
    format!("{}\n{}\n{}\n", paint(&border), paint(&middle), paint(&border))
}

fn timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump(raw: &[Vec<u8>], chains: &[Vec<Vec<u8>>]) -> (String, Result<(), NetError>) {
        let inspector = CertificateInspector::new(Palette::plain());
        let mut out = Vec::new();
        let result = inspector.inspect(&mut out, raw, chains, OffsetDateTime::UNIX_EPOCH);
        (String::from_utf8(out).unwrap(), result)
    }

    #[test]
    fn test_banner() {
        let b = banner("Raw Certificates Received", str::to_string);
        assert_eq!(
            b,
            "#############################\n\
             # Raw Certificates Received #\n\
             #############################\n"
        );
    }

    #[test]
    fn test_empty_lists_print_both_headers() {
        let (out, result) = dump(&[], &[]);
        assert!(result.is_ok());
        assert!(out.contains("# Raw Certificates Received #"));
        assert!(out.contains("# Verified Certificate Chains #"));
        assert!(!out.contains("Certificate #1"));
    }

    #[test]
    fn test_undecodable_first_certificate_aborts() {
        let (out, result) = dump(&[b"junk".to_vec()], &[]);
        assert!(matches!(result, Err(NetError::CertificateParse { index: 0, .. })));
        assert!(out.contains("# Raw Certificates Received #"));
        assert!(!out.contains("Verified Certificate Chains"));
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        assert_eq!(timestamp(OffsetDateTime::UNIX_EPOCH), "1970-01-01T00:00:00Z");
    }
}
