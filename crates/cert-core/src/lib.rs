//! Certificate inventory core engine
//!
//! This crate links decoded certificates and portal stubs to employee
//! records, deduplicates them against storage, and classifies every input
//! item into an ingestion outcome. Persistence stays behind the traits in
//! [`store`]; the decoding itself lives in `cert-parsers`.

pub mod ingestion;
pub mod matching;
pub mod model;
pub mod report;
pub mod store;

use thiserror::Error;

pub use ingestion::{ImportPipeline, ImportSummary, IngestionOutcome, UploadedFile};
pub use matching::{MatchOutcome, NameQuery, TieBreakPolicy};
pub use model::{
    CertificateRecord, CertificateType, Employee, LifecycleStatus, NewCertificate, Prefill,
};
pub use store::{normalize_serial, CertificateStore, EmployeeDirectory, StoreError};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("parse error: {0}")]
    Parse(#[from] cert_parsers::ParseError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("report error: {0}")]
    Report(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
