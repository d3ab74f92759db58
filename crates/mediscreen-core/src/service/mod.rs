//! Patient service: business rules over the patient store.
//!
//! Rules: one patient per (last name, first name) pair, checked on every
//! create and update against every *other* record; ids are assigned by the
//! store and never change; reports are fetched from the rapport service and
//! passed through untouched.

mod report;

pub use report::*;

use std::fmt;

use thiserror::Error;

use crate::db::{DbError, PatientStore};
use crate::models::{Patient, PatientId, Rapport, ValidationError};

/// The key a failed lookup was made with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatientKey {
    Id(PatientId),
    Name { last_name: String, first_name: String },
    LastName(String),
}

impl fmt::Display for PatientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatientKey::Id(id) => write!(f, "id {}", id),
            PatientKey::Name {
                last_name,
                first_name,
            } => write!(f, "{} {}", last_name, first_name),
            PatientKey::LastName(last_name) => write!(f, "last name {}", last_name),
        }
    }
}

/// Service errors.
///
/// `NotFound` and `AlreadyExists` are expected business outcomes;
/// `Storage` and `RapportUnavailable` mean a collaborator failed.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Patient not found: {0}")]
    NotFound(PatientKey),

    #[error("Patient already exists: {last_name} {first_name}")]
    AlreadyExists {
        last_name: String,
        first_name: String,
    },

    #[error("Invalid patient: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    #[error("Rapport service error: {0}")]
    RapportUnavailable(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

fn already_exists(patient: &Patient) -> ServiceError {
    ServiceError::AlreadyExists {
        last_name: patient.last_name.clone(),
        first_name: patient.first_name.clone(),
    }
}

/// Fetch a risk report and translate remote failures into service errors.
///
/// Needs no store, so callers can run it without holding a store lock.
pub fn fetch_report<R: RapportClient + ?Sized>(
    rapport: &R,
    id: PatientId,
) -> ServiceResult<Rapport> {
    rapport.get_report_by_id(id).map_err(|e| match e {
        RapportError::NotFound(missing) => {
            tracing::warn!(id = missing, "rapport service has no such patient");
            ServiceError::NotFound(PatientKey::Id(missing))
        }
        RapportError::Unavailable(msg) => {
            tracing::warn!(id, error = %msg, "rapport request failed");
            ServiceError::RapportUnavailable(msg)
        }
    })
}

/// Patient record service.
pub struct PatientService<S, R> {
    store: S,
    rapport: R,
}

impl<S: PatientStore, R: RapportClient> PatientService<S, R> {
    /// Create a service over a store and a rapport client.
    pub fn new(store: S, rapport: R) -> Self {
        Self { store, rapport }
    }

    /// Find a patient by id.
    pub fn find_by_id(&self, id: PatientId) -> ServiceResult<Patient> {
        tracing::debug!(id, "find patient by id");
        self.store
            .get(id)?
            .ok_or(ServiceError::NotFound(PatientKey::Id(id)))
    }

    /// Find the patient with exactly this last and first name.
    pub fn find_by_last_and_first_name(
        &self,
        last_name: &str,
        first_name: &str,
    ) -> ServiceResult<Patient> {
        tracing::debug!(last_name, first_name, "find patient by name");
        self.store
            .get_by_name(last_name, first_name)?
            .ok_or_else(|| {
                ServiceError::NotFound(PatientKey::Name {
                    last_name: last_name.to_string(),
                    first_name: first_name.to_string(),
                })
            })
    }

    /// Find every patient with exactly this last name. Empty is `NotFound`.
    pub fn find_by_last_name(&self, last_name: &str) -> ServiceResult<Vec<Patient>> {
        tracing::debug!(last_name, "find patients by last name");
        let patients = self.store.get_by_last_name(last_name)?;
        if patients.is_empty() {
            return Err(ServiceError::NotFound(PatientKey::LastName(
                last_name.to_string(),
            )));
        }
        Ok(patients)
    }

    /// All patients in store order.
    pub fn find_all(&self) -> ServiceResult<Vec<Patient>> {
        tracing::debug!("find all patients");
        Ok(self.store.get_all()?)
    }

    /// Create a patient from a draft. Any id on the draft is ignored.
    pub fn create(&self, draft: Patient) -> ServiceResult<Patient> {
        draft.validate()?;
        if draft.is_persisted() {
            tracing::debug!(id = ?draft.id, "ignoring id on create draft");
        }

        if self
            .store
            .get_by_name(&draft.last_name, &draft.first_name)?
            .is_some()
        {
            tracing::warn!(
                last_name = %draft.last_name,
                first_name = %draft.first_name,
                "create rejected: name already taken"
            );
            return Err(already_exists(&draft));
        }

        let created = self.save(&Patient { id: None, ..draft })?;
        tracing::info!(id = ?created.id, "patient created");
        Ok(created)
    }

    /// Replace every field of an existing patient except its id.
    ///
    /// Keeping the same name is allowed; taking another patient's name is not.
    pub fn update(&self, patient: Patient) -> ServiceResult<Patient> {
        let id = patient.id.ok_or(ValidationError::MissingId)?;
        patient.validate()?;

        let Some(current) = self.store.get(id)? else {
            tracing::warn!(id, "update rejected: unknown patient");
            return Err(ServiceError::NotFound(PatientKey::Id(id)));
        };

        // A record keeping its own name cannot collide
        if !current.has_name(&patient.last_name, &patient.first_name) {
            if let Some(existing) = self
                .store
                .get_by_name(&patient.last_name, &patient.first_name)?
            {
                if existing.id != Some(id) {
                    tracing::warn!(
                        id,
                        holder = ?existing.id,
                        "update rejected: name held by another patient"
                    );
                    return Err(already_exists(&patient));
                }
            }
        }

        let updated = self.save(&patient)?;
        tracing::info!(id, "patient updated");
        Ok(updated)
    }

    /// Fetch the risk report for a patient from the rapport service.
    ///
    /// Local existence is not checked; the remote service decides.
    pub fn get_patient_report(&self, id: PatientId) -> ServiceResult<Rapport> {
        fetch_report(&self.rapport, id)
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The underlying rapport client.
    pub fn rapport_client(&self) -> &R {
        &self.rapport
    }

    /// Single write path; a store-level duplicate means a concurrent writer won.
    fn save(&self, patient: &Patient) -> ServiceResult<Patient> {
        self.store.save(patient).map_err(|e| match (e, patient.id) {
            (DbError::Duplicate(_), _) => already_exists(patient),
            (DbError::NotFound(_), Some(id)) => ServiceError::NotFound(PatientKey::Id(id)),
            (other, _) => ServiceError::Storage(other),
        })
    }
}
