//! Domain model shared by ingestion, matching and storage

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Employee record as the directory exposes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub last_name: String,
    pub first_name: String,
    /// Patronymic; empty string when the employee has none.
    pub middle_name: String,
    pub is_active: bool,
}

impl Employee {
    pub fn full_name(&self) -> String {
        if self.middle_name.is_empty() {
            format!("{} {}", self.last_name, self.first_name)
        } else {
            format!("{} {} {}", self.last_name, self.first_name, self.middle_name)
        }
    }
}

/// Catalog entry a portal type label resolves against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateType {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
}

/// Usability state of a certificate relative to its expiry date.
///
/// `Revoked` is never produced by ingestion; it is set by manual edits only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Active,
    Revoked,
    NeedsUpdate,
}

impl LifecycleStatus {
    /// Certificates expiring within this many days are flagged for renewal.
    pub const RENEWAL_GRACE_DAYS: i64 = 30;

    /// Derive the status from an expiry date: expired or expiring within the
    /// grace window means `NeedsUpdate`.
    pub fn from_expiry(expiry: NaiveDate, today: NaiveDate) -> Self {
        if expiry <= today + Duration::days(Self::RENEWAL_GRACE_DAYS) {
            LifecycleStatus::NeedsUpdate
        } else {
            LifecycleStatus::Active
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::Active => "active",
            LifecycleStatus::Revoked => "revoked",
            LifecycleStatus::NeedsUpdate => "needs_update",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(LifecycleStatus::Active),
            "revoked" => Some(LifecycleStatus::Revoked),
            "needs_update" => Some(LifecycleStatus::NeedsUpdate),
            _ => None,
        }
    }
}

impl std::fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A certificate about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCertificate {
    pub employee_id: Uuid,
    pub certificate_type_id: Uuid,
    /// Serial as decoded (uppercase hex) or the portal number as given.
    pub serial: String,
    /// SHA-1 fingerprint; portal records carry none.
    pub fingerprint: Option<String>,
    pub valid_from: Option<NaiveDate>,
    pub expiry_date: NaiveDate,
    pub carrier_serial: Option<String>,
    /// Raw certificate file; portal records carry none.
    pub file: Option<Vec<u8>>,
    pub status: LifecycleStatus,
    pub notes: String,
}

/// A persisted certificate row (file blob not loaded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub certificate_type_id: Uuid,
    pub serial: String,
    pub fingerprint: Option<String>,
    pub valid_from: Option<NaiveDate>,
    pub expiry_date: NaiveDate,
    pub carrier_serial: Option<String>,
    pub status: LifecycleStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CertificateRecord {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }
}

/// Derived field set for pre-populating a certificate form from one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefill {
    pub serial: String,
    pub fingerprint: String,
    pub valid_from: NaiveDate,
    pub expiry_date: NaiveDate,
    pub status: LifecycleStatus,
    pub subject_name: Option<String>,
    pub issuer_name: Option<String>,
    /// Matched employee, when the subject name resolved to exactly one.
    pub employee_id: Option<Uuid>,
}
