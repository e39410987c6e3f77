//! Certificate file and CA-portal export parsers
//!
//! This crate turns raw certificate bytes (PEM, DER, PKCS12) and portal HTML
//! exports into normalized records. It knows nothing about employees or
//! storage; callers decide what a decoded certificate means.

pub mod pkcs12;
pub mod portal;
pub mod x509;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub use portal::{extract_stubs, HtmlCertificateStub};
pub use x509::decode_certificate;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unsupported certificate format")]
    UnsupportedFormat,

    #[error("corrupt certificate data: {0}")]
    CorruptData(String),

    #[error("PKCS12 container requires a password")]
    PasswordRequired,

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("structural mismatch: {0}")]
    Structural(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Normalized view of a decoded X.509 certificate.
///
/// Produced once per input file; every field is owned so the record outlives
/// the raw bytes it was read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedCertificate {
    /// Serial number, uppercase hex without separators.
    pub serial: String,
    /// SHA-1 fingerprint of the DER encoding, uppercase hex, no separators.
    /// This is the de-facto identity key for a certificate.
    pub fingerprint: String,
    /// First day of the validity window.
    pub valid_from: NaiveDate,
    /// Last day of the validity window.
    pub expiry_date: NaiveDate,
    /// Subject distinguished-name attributes keyed by friendly name.
    /// Attributes with no well-known name are keyed by their dotted OID.
    pub subject_attributes: BTreeMap<String, String>,
    /// Full name derived from the subject (commonName, else surname +
    /// givenName + initials). None when the subject carries no usable name.
    pub subject_name: Option<String>,
    /// Issuer commonName, when present.
    pub issuer_name: Option<String>,
}
