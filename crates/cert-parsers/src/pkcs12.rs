//! PKCS12 (`.pfx`) container handling
//!
//! Imports arrive without a password, so only containers protected by the
//! empty password can be opened; anything else is reported as
//! [`ParseError::PasswordRequired`] rather than a generic decode failure.

use crate::{ParseError, ParseResult};
use p12::PFX;

const EMPTY_PASSWORD: &str = "";

/// Pull the DER encoding of the first certificate bag out of a PKCS12
/// container.
pub fn extract_first_certificate(data: &[u8]) -> ParseResult<Vec<u8>> {
    let pfx = PFX::parse(data)
        .map_err(|e| ParseError::CorruptData(format!("PKCS12 decode failed: {e}")))?;

    if !pfx.verify_mac(EMPTY_PASSWORD) {
        return Err(ParseError::PasswordRequired);
    }

    let certs = pfx
        .cert_x509_bags(EMPTY_PASSWORD)
        .map_err(|e| ParseError::CorruptData(format!("PKCS12 certificate bags: {e}")))?;

    certs
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::CorruptData("no certificate bag in PKCS12 container".into()))
}
