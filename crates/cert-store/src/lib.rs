//! PostgreSQL storage for the certificate inventory
//!
//! Implements the `cert-core` storage traits over sqlx. Serial uniqueness is
//! guaranteed by a unique index on the normalized serial; SQLSTATE 23505 is
//! translated into the typed duplicate error the pipeline understands.

pub mod schema;

use async_trait::async_trait;
use cert_core::{
    normalize_serial, CertificateRecord, CertificateStore, CertificateType, Employee,
    EmployeeDirectory, NewCertificate, StoreError,
};
use chrono::{Duration, NaiveDate};
use schema::{CertificateRow, CertificateTypeRow, EmployeeRow};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";

const INSERT_CERTIFICATE: &str = "INSERT INTO certificates \
    (id, employee_id, certificate_type_id, serial, serial_normalized, fingerprint, \
     valid_from, expiry_date, carrier_serial, certificate_file, status, notes) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)";

const CERTIFICATE_COLUMNS: &str = "id, employee_id, certificate_type_id, serial, \
    serial_normalized, fingerprint, valid_from, expiry_date, carrier_serial, \
    status, notes, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(backend)?;
        info!("connected to certificate inventory database");
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        debug!("database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Certificates expiring within the given window, soonest first. Backs
    /// the expiring-certificates listing.
    pub async fn list_expiring(
        &self,
        today: NaiveDate,
        within_days: i64,
    ) -> Result<Vec<CertificateRecord>, StoreError> {
        let until = today + Duration::days(within_days);
        let rows = sqlx::query_as::<_, CertificateRow>(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates \
             WHERE expiry_date >= $1 AND expiry_date <= $2 ORDER BY expiry_date"
        ))
        .bind(today)
        .bind(until)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(CertificateRow::into_model).collect()
    }

    /// One record by id, without the file blob.
    pub async fn get(&self, id: Uuid) -> Result<CertificateRecord, StoreError> {
        let row = sqlx::query_as::<_, CertificateRow>(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(StoreError::NotFound)?;

        row.into_model()
    }

    async fn existing_by_serial(&self, serial: &str) -> Result<Uuid, StoreError> {
        match self.find_by_serial(serial).await? {
            Some(existing_id) => Ok(existing_id),
            // The colliding row was deleted between the violation and this
            // lookup; surface the raw failure instead of a bogus reference.
            None => Err(StoreError::Backend(
                "serial collided but the existing record is gone".into(),
            )),
        }
    }
}

#[async_trait]
impl EmployeeDirectory for PgStore {
    async fn find_by_name(
        &self,
        surname: &str,
        given_name: &str,
    ) -> Result<Vec<Employee>, StoreError> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            "SELECT id, last_name, first_name, middle_name, is_active FROM employees \
             WHERE lower(last_name) = lower($1) AND lower(first_name) = lower($2)",
        )
        .bind(surname)
        .bind(given_name)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(EmployeeRow::into_model).collect())
    }
}

#[async_trait]
impl CertificateStore for PgStore {
    async fn find_type_by_label(
        &self,
        label: &str,
    ) -> Result<Option<CertificateType>, StoreError> {
        let row = sqlx::query_as::<_, CertificateTypeRow>(
            "SELECT id, name, is_active FROM certificate_types \
             WHERE name = $1 AND is_active",
        )
        .bind(label.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(CertificateTypeRow::into_model))
    }

    async fn find_by_serial(&self, serial: &str) -> Result<Option<Uuid>, StoreError> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM certificates WHERE serial_normalized = $1",
        )
        .bind(normalize_serial(serial))
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)
    }

    async fn insert(&self, certificate: NewCertificate) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let result = sqlx::query(INSERT_CERTIFICATE)
            .bind(id)
            .bind(certificate.employee_id)
            .bind(certificate.certificate_type_id)
            .bind(&certificate.serial)
            .bind(normalize_serial(&certificate.serial))
            .bind(&certificate.fingerprint)
            .bind(certificate.valid_from)
            .bind(certificate.expiry_date)
            .bind(&certificate.carrier_serial)
            .bind(&certificate.file)
            .bind(certificate.status.as_str())
            .bind(&certificate.notes)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(id),
            Err(e) if is_unique_violation(&e) => {
                let existing_id = self.existing_by_serial(&certificate.serial).await?;
                Err(StoreError::Duplicate { existing_id })
            }
            Err(e) => Err(backend(e)),
        }
    }

    async fn insert_bulk(
        &self,
        certificates: Vec<NewCertificate>,
    ) -> Result<Vec<Uuid>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let mut ids = Vec::with_capacity(certificates.len());

        for certificate in &certificates {
            let id = Uuid::new_v4();
            let result = sqlx::query(INSERT_CERTIFICATE)
                .bind(id)
                .bind(certificate.employee_id)
                .bind(certificate.certificate_type_id)
                .bind(&certificate.serial)
                .bind(normalize_serial(&certificate.serial))
                .bind(&certificate.fingerprint)
                .bind(certificate.valid_from)
                .bind(certificate.expiry_date)
                .bind(&certificate.carrier_serial)
                .bind(&certificate.file)
                .bind(certificate.status.as_str())
                .bind(&certificate.notes)
                .execute(&mut *tx)
                .await;

            match result {
                Ok(_) => ids.push(id),
                Err(e) if is_unique_violation(&e) => {
                    // The failed statement aborted the transaction; roll it
                    // back before looking up the surviving row.
                    drop(tx);
                    let existing_id = self.existing_by_serial(&certificate.serial).await?;
                    return Err(StoreError::Duplicate { existing_id });
                }
                Err(e) => return Err(backend(e)),
            }
        }

        tx.commit().await.map_err(backend)?;
        debug!(inserted = ids.len(), "bulk certificate insert committed");
        Ok(ids)
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}
