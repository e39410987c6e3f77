//! X.509 certificate decoding
//!
//! Format detection is a priority cascade: PEM armor wins, then the filename
//! extension picks DER (`.cer`) or PKCS12 (`.pfx`), then DER is attempted
//! with PEM as the last resort.

use crate::{pkcs12, DecodedCertificate, ParseError, ParseResult};
use chrono::NaiveDate;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::fmt::Write;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::*;

const PEM_MARKER: &[u8] = b"-----BEGIN";

/// Decode a certificate file into a [`DecodedCertificate`].
///
/// `filename` is only a format hint; the bytes themselves always win when
/// they carry a PEM armor marker. Any failure surfaces as a single classified
/// [`ParseError`], never a partial record.
pub fn decode_certificate(
    data: &[u8],
    filename: Option<&str>,
) -> ParseResult<DecodedCertificate> {
    if data.starts_with(PEM_MARKER) {
        return decode_pem(data);
    }

    let hint = filename.map(|f| f.to_ascii_lowercase());
    match hint.as_deref() {
        Some(name) if name.ends_with(".cer") => decode_der(data),
        Some(name) if name.ends_with(".pfx") => {
            let der = pkcs12::extract_first_certificate(data)?;
            decode_der(&der)
        }
        _ => decode_der(data)
            .or_else(|_| decode_pem(data))
            .map_err(|_| ParseError::UnsupportedFormat),
    }
}

fn decode_pem(data: &[u8]) -> ParseResult<DecodedCertificate> {
    let (_, pem) = parse_x509_pem(data)
        .map_err(|e| ParseError::CorruptData(format!("PEM decode failed: {e}")))?;
    decode_der(&pem.contents)
}

fn decode_der(data: &[u8]) -> ParseResult<DecodedCertificate> {
    let (_, cert) = X509Certificate::from_der(data)
        .map_err(|e| ParseError::CorruptData(format!("DER decode failed: {e}")))?;
    extract(&cert, data)
}

fn extract(cert: &X509Certificate, der: &[u8]) -> ParseResult<DecodedCertificate> {
    let serial_bytes = cert.serial.to_bytes_be();
    let mut serial = String::with_capacity(serial_bytes.len() * 2);
    for b in &serial_bytes {
        let _ = write!(serial, "{:02X}", b);
    }

    let fingerprint = hex::encode_upper(Sha1::digest(der));

    let valid_from = calendar_date(cert.validity().not_before.timestamp())
        .ok_or_else(|| ParseError::CorruptData("validity start out of range".into()))?;
    let expiry_date = calendar_date(cert.validity().not_after.timestamp())
        .ok_or_else(|| ParseError::CorruptData("validity end out of range".into()))?;

    let subject_attributes = dn_attributes(cert.subject());
    let subject_name = subject_full_name(&subject_attributes);
    let issuer_name = dn_attributes(cert.issuer()).remove("commonName");

    Ok(DecodedCertificate {
        serial,
        fingerprint,
        valid_from,
        expiry_date,
        subject_attributes,
        subject_name,
        issuer_name,
    })
}

fn calendar_date(timestamp: i64) -> Option<NaiveDate> {
    chrono::DateTime::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}

/// Flatten a distinguished name into a friendly-name to value map.
fn dn_attributes(name: &X509Name) -> BTreeMap<String, String> {
    let mut attrs = BTreeMap::new();
    for rdn in name.iter() {
        for attr in rdn.iter() {
            let oid = attr.attr_type().to_id_string();
            let value = attr
                .attr_value()
                .as_str()
                .ok()
                .or_else(|| std::str::from_utf8(attr.attr_value().data).ok());
            if let Some(value) = value {
                attrs.insert(attribute_name(&oid).to_string(), value.to_string());
            }
        }
    }
    attrs
}

fn attribute_name(oid: &str) -> &str {
    match oid {
        "2.5.4.3" => "commonName",
        "2.5.4.4" => "surname",
        "2.5.4.5" => "serialNumber",
        "2.5.4.6" => "countryName",
        "2.5.4.7" => "localityName",
        "2.5.4.8" => "stateOrProvinceName",
        "2.5.4.9" => "streetAddress",
        "2.5.4.10" => "organizationName",
        "2.5.4.11" => "organizationalUnitName",
        "2.5.4.12" => "title",
        "2.5.4.42" => "givenName",
        "2.5.4.43" => "initials",
        "1.2.840.113549.1.9.1" => "emailAddress",
        other => other,
    }
}

/// Derive a person's full name from subject attributes: commonName wins,
/// else surname + givenName (+ initials).
fn subject_full_name(attrs: &BTreeMap<String, String>) -> Option<String> {
    if let Some(cn) = attrs.get("commonName") {
        return Some(cn.clone());
    }
    let surname = attrs.get("surname")?;
    let given = attrs.get("givenName")?;
    Some(match attrs.get("initials") {
        Some(initials) => format!("{surname} {given} {initials}"),
        None => format!("{surname} {given}"),
    })
}
