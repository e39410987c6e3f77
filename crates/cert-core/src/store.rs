//! Storage trait seams
//!
//! The pipeline only ever talks to these traits; `cert-store` provides the
//! PostgreSQL implementation, tests provide in-memory ones.

use crate::model::{CertificateType, Employee, NewCertificate};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The normalized serial already exists. Raised by the storage layer's
    /// uniqueness constraint, which is the authoritative duplicate signal; any
    /// pre-insert lookup is only an optimization.
    #[error("certificate serial already stored as record {existing_id}")]
    Duplicate { existing_id: Uuid },

    #[error("record not found")]
    NotFound,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Comparison key for certificate serials: whitespace and punctuation
/// dropped, uppercased. `"AB 12-34"`, `"ab1234"` and `"AB1234"` all
/// normalize to `"AB1234"`.
pub fn normalize_serial(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// Every employee whose surname and given name match case-insensitively.
    /// Patronymic filtering is the matcher's job.
    async fn find_by_name(
        &self,
        surname: &str,
        given_name: &str,
    ) -> Result<Vec<Employee>, StoreError>;
}

#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Resolve a portal type label against the active type catalog.
    async fn find_type_by_label(
        &self,
        label: &str,
    ) -> Result<Option<CertificateType>, StoreError>;

    /// Id of the record whose normalized serial equals `serial`'s normal
    /// form, if any.
    async fn find_by_serial(&self, serial: &str) -> Result<Option<Uuid>, StoreError>;

    /// Insert one record and return its id. A uniqueness violation on the
    /// normalized serial maps to [`StoreError::Duplicate`].
    async fn insert(&self, certificate: NewCertificate) -> Result<Uuid, StoreError>;

    /// Insert a batch inside one transaction: all inserted, or none.
    /// Returned ids are in input order.
    async fn insert_bulk(
        &self,
        certificates: Vec<NewCertificate>,
    ) -> Result<Vec<Uuid>, StoreError>;
}
