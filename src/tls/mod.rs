//! Certificate inspection: parsing, relative times and the handshake dump.

pub mod certinfo;
pub mod humanize;
pub mod inspector;

pub use certinfo::{CertificateRecord, ExtensionRecord};
pub use inspector::CertificateInspector;
