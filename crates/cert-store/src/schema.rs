//! Database row types

use cert_core::{CertificateRecord, CertificateType, Employee, LifecycleStatus, StoreError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct EmployeeRow {
    pub id: Uuid,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub is_active: bool,
}

impl EmployeeRow {
    pub fn into_model(self) -> Employee {
        Employee {
            id: self.id,
            last_name: self.last_name,
            first_name: self.first_name,
            middle_name: self.middle_name,
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct CertificateTypeRow {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
}

impl CertificateTypeRow {
    pub fn into_model(self) -> CertificateType {
        CertificateType {
            id: self.id,
            name: self.name,
            is_active: self.is_active,
        }
    }
}

/// Certificate row without the file blob; exports and listings never need it.
#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct CertificateRow {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub certificate_type_id: Uuid,
    pub serial: String,
    pub serial_normalized: String,
    pub fingerprint: Option<String>,
    pub valid_from: Option<NaiveDate>,
    pub expiry_date: NaiveDate,
    pub carrier_serial: Option<String>,
    pub status: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CertificateRow {
    pub fn into_model(self) -> Result<CertificateRecord, StoreError> {
        let status = LifecycleStatus::parse(&self.status).ok_or_else(|| {
            StoreError::Backend(format!("unknown lifecycle status '{}'", self.status))
        })?;
        Ok(CertificateRecord {
            id: self.id,
            employee_id: self.employee_id,
            certificate_type_id: self.certificate_type_id,
            serial: self.serial,
            fingerprint: self.fingerprint,
            valid_from: self.valid_from,
            expiry_date: self.expiry_date,
            carrier_serial: self.carrier_serial,
            status,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
