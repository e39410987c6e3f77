//! Ingestion orchestration
//!
//! Three operations share one shape (decode, match the owner, check for a
//! duplicate, derive the lifecycle status, persist) and classify every
//! input item into exactly one [`IngestionOutcome`]. A failure in one item
//! never aborts the batch.
//!
//! Persistence scope differs on purpose: file batches commit item by item
//! (partial success), the portal import writes its accepted subset as one
//! transaction at the end.

use crate::matching::{self, MatchOutcome, NameQuery, TieBreakPolicy};
use crate::model::{CertificateType, LifecycleStatus, NewCertificate, Prefill};
use crate::store::{normalize_serial, CertificateStore, EmployeeDirectory, StoreError};
use crate::CoreResult;
use cert_parsers::{decode_certificate, extract_stubs};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One uploaded certificate file.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Per-item classification of an ingestion attempt. `source` is the
/// uploaded filename or the portal certificate number, enough context to
/// remediate by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestionOutcome {
    Imported {
        source: String,
        serial: String,
        owner_name: String,
        record_id: Uuid,
    },
    Duplicate {
        source: String,
        serial: String,
        /// Persisted record the serial collided with; `None` when the
        /// collision was with an earlier, not yet persisted item of the
        /// same portal batch.
        existing_id: Option<Uuid>,
    },
    EmployeeNotFound {
        source: String,
        owner_name: String,
    },
    TypeNotFound {
        source: String,
        label: String,
    },
    ParseError {
        source: String,
        error: String,
    },
}

/// Batch result: the ordered outcomes plus per-bucket counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub duplicates: usize,
    pub employees_not_found: usize,
    pub types_not_found: usize,
    pub parse_errors: usize,
    pub outcomes: Vec<IngestionOutcome>,
}

impl ImportSummary {
    pub fn from_outcomes(outcomes: Vec<IngestionOutcome>) -> Self {
        let mut summary = Self::default();
        for outcome in &outcomes {
            match outcome {
                IngestionOutcome::Imported { .. } => summary.imported += 1,
                IngestionOutcome::Duplicate { .. } => summary.duplicates += 1,
                IngestionOutcome::EmployeeNotFound { .. } => summary.employees_not_found += 1,
                IngestionOutcome::TypeNotFound { .. } => summary.types_not_found += 1,
                IngestionOutcome::ParseError { .. } => summary.parse_errors += 1,
            }
        }
        summary.outcomes = outcomes;
        summary
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Runs the decode, match, dedup and persist stages over a directory and a
/// certificate store.
pub struct ImportPipeline<D, S> {
    directory: D,
    store: S,
    policy: TieBreakPolicy,
}

impl<D, S> ImportPipeline<D, S>
where
    D: EmployeeDirectory,
    S: CertificateStore,
{
    pub fn new(directory: D, store: S) -> Self {
        Self {
            directory,
            store,
            policy: TieBreakPolicy::PreferEmptyPatronymic,
        }
    }

    pub fn with_policy(directory: D, store: S, policy: TieBreakPolicy) -> Self {
        Self {
            directory,
            store,
            policy,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Import a batch of uploaded certificate files under one certificate
    /// type. Accepted items are persisted one by one as they are processed;
    /// a storage failure mid-batch leaves earlier items committed.
    pub async fn import_files(
        &self,
        files: &[UploadedFile],
        certificate_type: &CertificateType,
        today: NaiveDate,
    ) -> CoreResult<ImportSummary> {
        info!(files = files.len(), "starting certificate file import");

        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            outcomes.push(self.import_one_file(file, certificate_type, today).await?);
        }

        let summary = ImportSummary::from_outcomes(outcomes);
        info!(
            imported = summary.imported,
            duplicates = summary.duplicates,
            errors = summary.parse_errors,
            "certificate file import finished"
        );
        Ok(summary)
    }

    async fn import_one_file(
        &self,
        file: &UploadedFile,
        certificate_type: &CertificateType,
        today: NaiveDate,
    ) -> CoreResult<IngestionOutcome> {
        let decoded = match decode_certificate(&file.bytes, Some(&file.name)) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(file = %file.name, "certificate decode failed: {e}");
                return Ok(IngestionOutcome::ParseError {
                    source: file.name.clone(),
                    error: e.to_string(),
                });
            }
        };

        let owner_name = decoded.subject_name.clone().unwrap_or_default();
        let employee = match self.match_owner(&owner_name).await? {
            MatchOutcome::Matched(employee) => employee,
            _ => {
                return Ok(IngestionOutcome::EmployeeNotFound {
                    source: file.name.clone(),
                    owner_name,
                })
            }
        };

        if let Some(existing_id) = self.store.find_by_serial(&decoded.serial).await? {
            return Ok(IngestionOutcome::Duplicate {
                source: file.name.clone(),
                serial: decoded.serial,
                existing_id: Some(existing_id),
            });
        }

        let record = NewCertificate {
            employee_id: employee.id,
            certificate_type_id: certificate_type.id,
            serial: decoded.serial.clone(),
            fingerprint: Some(decoded.fingerprint),
            valid_from: Some(decoded.valid_from),
            expiry_date: decoded.expiry_date,
            carrier_serial: None,
            file: Some(file.bytes.clone()),
            status: LifecycleStatus::from_expiry(decoded.expiry_date, today),
            notes: String::new(),
        };

        match self.store.insert(record).await {
            Ok(record_id) => Ok(IngestionOutcome::Imported {
                source: file.name.clone(),
                serial: decoded.serial,
                owner_name,
                record_id,
            }),
            // The unique index is the authority; a pre-check miss that still
            // collides here is a concurrent import.
            Err(StoreError::Duplicate { existing_id }) => Ok(IngestionOutcome::Duplicate {
                source: file.name.clone(),
                serial: decoded.serial,
                existing_id: Some(existing_id),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Import a CA-portal HTML export. Every accepted stub is persisted in a
    /// single transaction at the end, all-or-nothing for the accepted
    /// subset; rejected stubs are classified individually either way.
    pub async fn import_portal_export(
        &self,
        html: &[u8],
        today: NaiveDate,
    ) -> CoreResult<ImportSummary> {
        let stubs = extract_stubs(html)?;
        info!(stubs = stubs.len(), "portal export parsed");

        enum Slot {
            Done(IngestionOutcome),
            Accepted {
                source: String,
                owner_name: String,
                record: NewCertificate,
            },
        }

        let mut slots = Vec::with_capacity(stubs.len());
        let mut seen_normalized: HashSet<String> = HashSet::new();
        let mut seen_literal: HashSet<String> = HashSet::new();

        for stub in stubs {
            let certificate_type = match self.store.find_type_by_label(&stub.type_label).await? {
                Some(t) => t,
                None => {
                    debug!(number = %stub.number, label = %stub.type_label, "unknown certificate type");
                    slots.push(Slot::Done(IngestionOutcome::TypeNotFound {
                        source: stub.number,
                        label: stub.type_label,
                    }));
                    continue;
                }
            };

            let employee = match self.match_owner(&stub.owner_name).await? {
                MatchOutcome::Matched(employee) => employee,
                _ => {
                    slots.push(Slot::Done(IngestionOutcome::EmployeeNotFound {
                        source: stub.number.clone(),
                        owner_name: stub.owner_name,
                    }));
                    continue;
                }
            };

            let normalized = normalize_serial(&stub.number);
            if seen_normalized.contains(&normalized) || seen_literal.contains(&stub.number) {
                slots.push(Slot::Done(IngestionOutcome::Duplicate {
                    source: stub.number.clone(),
                    serial: stub.number,
                    existing_id: None,
                }));
                continue;
            }
            if let Some(existing_id) = self.store.find_by_serial(&stub.number).await? {
                slots.push(Slot::Done(IngestionOutcome::Duplicate {
                    source: stub.number.clone(),
                    serial: stub.number,
                    existing_id: Some(existing_id),
                }));
                continue;
            }
            seen_normalized.insert(normalized);
            seen_literal.insert(stub.number.clone());

            let record = NewCertificate {
                employee_id: employee.id,
                certificate_type_id: certificate_type.id,
                serial: stub.number.clone(),
                fingerprint: None,
                valid_from: None,
                expiry_date: stub.expiry_date,
                carrier_serial: None,
                file: None,
                status: LifecycleStatus::from_expiry(stub.expiry_date, today),
                notes: String::new(),
            };
            slots.push(Slot::Accepted {
                source: stub.number.clone(),
                owner_name: stub.owner_name,
                record,
            });
        }

        let accepted: Vec<NewCertificate> = slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Accepted { record, .. } => Some(record.clone()),
                Slot::Done(_) => None,
            })
            .collect();
        let mut ids = if accepted.is_empty() {
            Vec::new()
        } else {
            self.store.insert_bulk(accepted).await?
        }
        .into_iter();

        let outcomes = slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Done(outcome) => outcome,
                Slot::Accepted {
                    source,
                    owner_name,
                    record,
                } => {
                    let record_id = ids.next().unwrap_or_default();
                    IngestionOutcome::Imported {
                        source,
                        serial: record.serial,
                        owner_name,
                        record_id,
                    }
                }
            })
            .collect();

        let summary = ImportSummary::from_outcomes(outcomes);
        info!(
            imported = summary.imported,
            duplicates = summary.duplicates,
            unmatched = summary.employees_not_found,
            "portal import finished"
        );
        Ok(summary)
    }

    /// Decode one file and derive the field set for pre-populating a
    /// certificate form. Nothing is persisted; decode failures propagate
    /// since there is no batch to keep alive.
    pub async fn prefill(&self, file: &UploadedFile, today: NaiveDate) -> CoreResult<Prefill> {
        let decoded = decode_certificate(&file.bytes, Some(&file.name))?;

        let employee_id = match decoded.subject_name.as_deref() {
            Some(name) => self.match_owner(name).await?.into_employee().map(|e| e.id),
            None => None,
        };

        Ok(Prefill {
            serial: decoded.serial,
            fingerprint: decoded.fingerprint,
            valid_from: decoded.valid_from,
            expiry_date: decoded.expiry_date,
            status: LifecycleStatus::from_expiry(decoded.expiry_date, today),
            subject_name: decoded.subject_name,
            issuer_name: decoded.issuer_name,
            employee_id,
        })
    }

    async fn match_owner(&self, raw_name: &str) -> CoreResult<MatchOutcome> {
        let Some(query) = NameQuery::parse(raw_name) else {
            return Ok(MatchOutcome::NotFound);
        };
        let candidates = self
            .directory
            .find_by_name(&query.surname, &query.given_name)
            .await?;
        Ok(matching::resolve(&query, &candidates, self.policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CertificateType, Employee};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MemDirectory {
        employees: Vec<Employee>,
    }

    #[async_trait]
    impl EmployeeDirectory for MemDirectory {
        async fn find_by_name(
            &self,
            surname: &str,
            given_name: &str,
        ) -> Result<Vec<Employee>, StoreError> {
            Ok(self
                .employees
                .iter()
                .filter(|e| {
                    e.last_name.to_lowercase() == surname.to_lowercase()
                        && e.first_name.to_lowercase() == given_name.to_lowercase()
                })
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct MemStore {
        types: Vec<CertificateType>,
        records: Mutex<Vec<(Uuid, NewCertificate)>>,
    }

    impl MemStore {
        fn record_count(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CertificateStore for MemStore {
        async fn find_type_by_label(
            &self,
            label: &str,
        ) -> Result<Option<CertificateType>, StoreError> {
            Ok(self
                .types
                .iter()
                .find(|t| t.is_active && t.name == label.trim())
                .cloned())
        }

        async fn find_by_serial(&self, serial: &str) -> Result<Option<Uuid>, StoreError> {
            let normalized = normalize_serial(serial);
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .find(|(_, r)| normalize_serial(&r.serial) == normalized)
                .map(|(id, _)| *id))
        }

        async fn insert(&self, certificate: NewCertificate) -> Result<Uuid, StoreError> {
            let mut records = self.records.lock().unwrap();
            let normalized = normalize_serial(&certificate.serial);
            if let Some((id, _)) = records
                .iter()
                .find(|(_, r)| normalize_serial(&r.serial) == normalized)
            {
                return Err(StoreError::Duplicate { existing_id: *id });
            }
            let id = Uuid::new_v4();
            records.push((id, certificate));
            Ok(id)
        }

        async fn insert_bulk(
            &self,
            certificates: Vec<NewCertificate>,
        ) -> Result<Vec<Uuid>, StoreError> {
            let mut records = self.records.lock().unwrap();
            for certificate in &certificates {
                let normalized = normalize_serial(&certificate.serial);
                if let Some((id, _)) = records
                    .iter()
                    .find(|(_, r)| normalize_serial(&r.serial) == normalized)
                {
                    return Err(StoreError::Duplicate { existing_id: *id });
                }
            }
            Ok(certificates
                .into_iter()
                .map(|certificate| {
                    let id = Uuid::new_v4();
                    records.push((id, certificate));
                    id
                })
                .collect())
        }
    }

    /// Store whose duplicate pre-check always misses, so only the insert
    /// constraint can catch collisions; models the concurrent-import race.
    struct BlindPrecheckStore(MemStore);

    #[async_trait]
    impl CertificateStore for BlindPrecheckStore {
        async fn find_type_by_label(
            &self,
            label: &str,
        ) -> Result<Option<CertificateType>, StoreError> {
            self.0.find_type_by_label(label).await
        }

        async fn find_by_serial(&self, _serial: &str) -> Result<Option<Uuid>, StoreError> {
            Ok(None)
        }

        async fn insert(&self, certificate: NewCertificate) -> Result<Uuid, StoreError> {
            self.0.insert(certificate).await
        }

        async fn insert_bulk(
            &self,
            certificates: Vec<NewCertificate>,
        ) -> Result<Vec<Uuid>, StoreError> {
            self.0.insert_bulk(certificates).await
        }
    }

    fn employee(last: &str, first: &str, middle: &str) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            last_name: last.into(),
            first_name: first.into(),
            middle_name: middle.into(),
            is_active: true,
        }
    }

    fn officer_type() -> CertificateType {
        CertificateType {
            id: Uuid::new_v4(),
            name: "Officer certificate".into(),
            is_active: true,
        }
    }

    fn cert_der(cn: &str, serial: &[u8], expires: (i32, u8, u8)) -> Vec<u8> {
        let mut params = rcgen::CertificateParams::new(vec![]).unwrap();
        params.distinguished_name = rcgen::DistinguishedName::new();
        params.distinguished_name.push(rcgen::DnType::CommonName, cn);
        params.serial_number = Some(rcgen::SerialNumber::from(serial.to_vec()));
        params.not_before = rcgen::date_time_ymd(2024, 1, 1);
        params.not_after = rcgen::date_time_ymd(expires.0, expires.1, expires.2);
        let key = rcgen::KeyPair::generate().unwrap();
        params.self_signed(&key).unwrap().der().to_vec()
    }

    fn upload(name: &str, bytes: Vec<u8>) -> UploadedFile {
        UploadedFile {
            name: name.into(),
            bytes,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn portal_block(type_label: &str, number: &str, owner: &str, expiry: &str) -> String {
        format!(
            r#"<div class="cert-item">
              <div class="contWidth1"><div>
                <div><b>{type_label}</b></div>
                <div>№ {number}</div>
              </div></div>
              <div class="contWidth2"><div class="owner-name"><b>{owner}</b></div></div>
              <div class="cert-item-content-right"><table>
                <tr><td>Valid until</td><td><b>{expiry}</b></td></tr>
              </table></div>
            </div>"#
        )
    }

    #[tokio::test]
    async fn corrupt_file_is_classified_not_fatal() {
        let directory = MemDirectory {
            employees: vec![
                employee("Ivanova", "Anna", ""),
                employee("Petrov", "Pyotr", ""),
                employee("Sidorov", "Semyon", ""),
                employee("Orlova", "Olga", ""),
            ],
        };
        let pipeline = ImportPipeline::new(directory, MemStore::default());

        let files = vec![
            upload("a.cer", cert_der("Ivanova Anna", &[1], (2026, 1, 1))),
            upload("b.cer", cert_der("Petrov Pyotr", &[2], (2026, 1, 1))),
            upload("broken.cer", vec![0xFF, 0x00, 0x13]),
            upload("c.cer", cert_der("Sidorov Semyon", &[3], (2026, 1, 1))),
            upload("d.cer", cert_der("Orlova Olga", &[4], (2026, 1, 1))),
        ];

        let summary = pipeline
            .import_files(&files, &officer_type(), today())
            .await
            .unwrap();

        assert_eq!(summary.total(), 5);
        assert_eq!(summary.parse_errors, 1);
        assert_eq!(summary.imported, 4);
        assert_eq!(pipeline.store().record_count(), 4);
        assert!(matches!(
            &summary.outcomes[2],
            IngestionOutcome::ParseError { source, .. } if source == "broken.cer"
        ));
    }

    #[tokio::test]
    async fn repeated_serial_in_batch_references_first_record() {
        let directory = MemDirectory {
            employees: vec![employee("Ivanova", "Anna", ""), employee("Petrov", "Pyotr", "")],
        };
        let pipeline = ImportPipeline::new(directory, MemStore::default());

        let files = vec![
            upload("first.cer", cert_der("Ivanova Anna", &[0xA7, 0x01], (2026, 1, 1))),
            upload("again.cer", cert_der("Petrov Pyotr", &[0xA7, 0x01], (2026, 1, 1))),
        ];

        let summary = pipeline
            .import_files(&files, &officer_type(), today())
            .await
            .unwrap();

        let first_id = match &summary.outcomes[0] {
            IngestionOutcome::Imported { record_id, .. } => *record_id,
            other => panic!("expected import, got {other:?}"),
        };
        match &summary.outcomes[1] {
            IngestionOutcome::Duplicate { existing_id, .. } => {
                assert_eq!(*existing_id, Some(first_id));
            }
            other => panic!("expected duplicate, got {other:?}"),
        }
        assert_eq!(pipeline.store().record_count(), 1);
    }

    #[tokio::test]
    async fn insert_constraint_is_authoritative_when_precheck_misses() {
        let directory = MemDirectory {
            employees: vec![employee("Ivanova", "Anna", ""), employee("Petrov", "Pyotr", "")],
        };
        let pipeline = ImportPipeline::new(directory, BlindPrecheckStore(MemStore::default()));

        let files = vec![
            upload("first.cer", cert_der("Ivanova Anna", &[0x42], (2026, 1, 1))),
            upload("racing.cer", cert_der("Petrov Pyotr", &[0x42], (2026, 1, 1))),
        ];

        let summary = pipeline
            .import_files(&files, &officer_type(), today())
            .await
            .unwrap();

        assert_eq!(summary.imported, 1);
        assert_eq!(summary.duplicates, 1);
        assert!(matches!(
            &summary.outcomes[1],
            IngestionOutcome::Duplicate { existing_id: Some(_), .. }
        ));
    }

    #[tokio::test]
    async fn unknown_owner_goes_to_not_found_bucket() {
        let directory = MemDirectory { employees: vec![] };
        let pipeline = ImportPipeline::new(directory, MemStore::default());

        let files = vec![upload("x.cer", cert_der("Stranger Person", &[9], (2026, 1, 1)))];
        let summary = pipeline
            .import_files(&files, &officer_type(), today())
            .await
            .unwrap();

        assert_eq!(summary.employees_not_found, 1);
        assert!(matches!(
            &summary.outcomes[0],
            IngestionOutcome::EmployeeNotFound { owner_name, .. } if owner_name == "Stranger Person"
        ));
    }

    #[tokio::test]
    async fn portal_import_classifies_and_bulk_persists() {
        let directory = MemDirectory {
            employees: vec![employee("Ivanova", "Anna", "Petrovna")],
        };
        let store = MemStore {
            types: vec![officer_type()],
            ..Default::default()
        };
        let pipeline = ImportPipeline::new(directory, store);

        let html = format!(
            "<html><body>{}{}{}</body></html>",
            portal_block("Officer certificate", "11 22 33", "Ivanova Anna Petrovna", "01.08.2026"),
            portal_block("Notary certificate", "44 55", "Ivanova Anna Petrovna", "01.08.2026"),
            portal_block("Officer certificate", "66 77", "Nobody Known", "01.08.2026"),
        );

        let summary = pipeline
            .import_portal_export(html.as_bytes(), today())
            .await
            .unwrap();

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.types_not_found, 1);
        assert_eq!(summary.employees_not_found, 1);
        assert_eq!(pipeline.store().record_count(), 1);

        match &summary.outcomes[0] {
            IngestionOutcome::Imported { serial, record_id, .. } => {
                assert_eq!(serial, "112233");
                assert_ne!(*record_id, Uuid::nil());
            }
            other => panic!("expected import, got {other:?}"),
        }
        let records = pipeline.store().records.lock().unwrap();
        assert_eq!(records[0].1.fingerprint, None);
        assert_eq!(records[0].1.file, None);
    }

    #[tokio::test]
    async fn portal_batch_internal_duplicate_has_no_existing_id() {
        let directory = MemDirectory {
            employees: vec![employee("Ivanova", "Anna", "")],
        };
        let store = MemStore {
            types: vec![officer_type()],
            ..Default::default()
        };
        let pipeline = ImportPipeline::new(directory, store);

        let html = format!(
            "<html><body>{}{}</body></html>",
            portal_block("Officer certificate", "99 88", "Ivanova Anna", "01.08.2026"),
            portal_block("Officer certificate", "9988", "Ivanova Anna", "01.08.2026"),
        );

        let summary = pipeline
            .import_portal_export(html.as_bytes(), today())
            .await
            .unwrap();

        assert_eq!(summary.imported, 1);
        assert_eq!(summary.duplicates, 1);
        assert!(matches!(
            &summary.outcomes[1],
            IngestionOutcome::Duplicate { existing_id: None, .. }
        ));
        assert_eq!(pipeline.store().record_count(), 1);
    }

    #[tokio::test]
    async fn portal_duplicate_against_storage_references_record() {
        let directory = MemDirectory {
            employees: vec![employee("Ivanova", "Anna", "")],
        };
        let store = MemStore {
            types: vec![officer_type()],
            ..Default::default()
        };
        let existing = NewCertificate {
            employee_id: Uuid::new_v4(),
            certificate_type_id: Uuid::new_v4(),
            serial: "554433".into(),
            fingerprint: None,
            valid_from: None,
            expiry_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            carrier_serial: None,
            file: None,
            status: LifecycleStatus::Active,
            notes: String::new(),
        };
        let existing_id = store.insert(existing).await.unwrap();
        let pipeline = ImportPipeline::new(directory, store);

        let html = format!(
            "<html><body>{}</body></html>",
            portal_block("Officer certificate", "55 44 33", "Ivanova Anna", "01.08.2026"),
        );

        let summary = pipeline
            .import_portal_export(html.as_bytes(), today())
            .await
            .unwrap();

        assert!(matches!(
            &summary.outcomes[0],
            IngestionOutcome::Duplicate { existing_id: Some(id), .. } if *id == existing_id
        ));
    }

    #[tokio::test]
    async fn prefill_derives_fields_and_matches_employee() {
        let anna = employee("Ivanova", "Anna", "");
        let anna_id = anna.id;
        let directory = MemDirectory {
            employees: vec![anna],
        };
        let pipeline = ImportPipeline::new(directory, MemStore::default());

        let file = upload("anna.cer", cert_der("Ivanova Anna", &[0x1A, 0x2B, 0x3C], (2024, 6, 20)));
        let prefill = pipeline.prefill(&file, today()).await.unwrap();

        assert_eq!(prefill.serial, "1A2B3C");
        assert_eq!(prefill.fingerprint.len(), 40);
        assert_eq!(prefill.status, LifecycleStatus::NeedsUpdate);
        assert_eq!(prefill.employee_id, Some(anna_id));
        assert_eq!(prefill.subject_name.as_deref(), Some("Ivanova Anna"));
    }

    #[tokio::test]
    async fn prefill_propagates_decode_failure() {
        let pipeline = ImportPipeline::new(
            MemDirectory { employees: vec![] },
            MemStore::default(),
        );
        let err = pipeline
            .prefill(&upload("junk.cer", vec![0x00]), today())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::CoreError::Parse(_)));
    }
}
