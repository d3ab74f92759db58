//! Mediscreen Core Library
//!
//! Patient demographic records for the diabetes risk assessment platform.
//!
//! # Architecture
//!
//! ```text
//!                    Host app (UniFFI)
//!                           │
//!                  ┌────────▼────────┐
//!                  │  MediscreenCore │   one Mutex around the store
//!                  └────────┬────────┘
//!                           │
//!                  ┌────────▼────────┐
//!                  │ PatientService  │   uniqueness of (last, first) name
//!                  └───┬─────────┬───┘
//!                      │         │
//!          ┌───────────▼──┐   ┌──▼─────────────────┐
//!          │ PatientStore │   │   RapportClient    │
//!          │   (SQLite)   │   │ GET /assess/id?id= │
//!          └──────────────┘   └────────────────────┘
//! ```
//!
//! # Core Principle
//!
//! **One patient per (last name, first name).** The service checks it before
//! every write and the SQLite unique index backs it up.
//!
//! # Modules
//!
//! - [`db`]: SQLite patient store
//! - [`models`]: Domain types (Patient, Sex, Rapport, Assessment)
//! - [`service`]: Patient service and rapport client capability
//! - [`config`]: Startup configuration

pub mod config;
pub mod db;
pub mod models;
pub mod service;

// Re-export commonly used types
pub use config::{ConfigError, CoreConfig};
pub use db::{Database, DbError, PatientStore};
pub use models::{Assessment, Patient, PatientId, Rapport, Sex, ValidationError, DATE_FORMAT};
pub use service::{
    PatientKey, PatientService, RapportClient, RapportError, ServiceError, ServiceResult,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use mediscreen_rapport::RapportHttpClient;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MediscreenError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Rapport error: {0}")]
    RapportError(String),
}

impl From<ServiceError> for MediscreenError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(key) => MediscreenError::NotFound(key.to_string()),
            ServiceError::AlreadyExists {
                last_name,
                first_name,
            } => MediscreenError::AlreadyExists(format!("{} {}", last_name, first_name)),
            ServiceError::Invalid(e) => MediscreenError::InvalidInput(e.to_string()),
            ServiceError::Storage(e) => MediscreenError::DatabaseError(e.to_string()),
            ServiceError::RapportUnavailable(msg) => MediscreenError::RapportError(msg),
        }
    }
}

impl From<DbError> for MediscreenError {
    fn from(e: DbError) -> Self {
        MediscreenError::DatabaseError(e.to_string())
    }
}

impl From<ValidationError> for MediscreenError {
    fn from(e: ValidationError) -> Self {
        MediscreenError::InvalidInput(e.to_string())
    }
}

impl From<ConfigError> for MediscreenError {
    fn from(e: ConfigError) -> Self {
        MediscreenError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for MediscreenError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MediscreenError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions
// =========================================================================

/// Open or create the patient database and connect to the rapport service.
#[uniffi::export]
pub fn open_core(
    database_path: String,
    rapport_base_url: String,
    rapport_timeout_secs: u64,
) -> Result<Arc<MediscreenCore>, MediscreenError> {
    let config = CoreConfig::new(
        database_path.into(),
        rapport_base_url,
        std::time::Duration::from_secs(rapport_timeout_secs),
    )?;
    open_core_with_config(&config)
}

/// Open using `MEDISCREEN_*` environment variables (and `.env`).
#[uniffi::export]
pub fn open_core_from_env() -> Result<Arc<MediscreenCore>, MediscreenError> {
    let config = CoreConfig::from_env()?;
    open_core_with_config(&config)
}

/// Create a core over an in-memory database (for testing).
#[uniffi::export]
pub fn open_core_in_memory(rapport_base_url: String) -> Result<Arc<MediscreenCore>, MediscreenError> {
    let config = CoreConfig::from_lookup(|name| match name {
        config::ENV_RAPPORT_URL => Some(rapport_base_url.clone()),
        _ => None,
    })?;
    let db = Database::open_in_memory()?;
    Ok(MediscreenCore::new(db, &config))
}

/// Open a core from an already resolved configuration.
pub fn open_core_with_config(config: &CoreConfig) -> Result<Arc<MediscreenCore>, MediscreenError> {
    let db = Database::open(config.database_path())?;
    let patients = db.count_patients()?;
    tracing::info!(
        path = %config.database_path().display(),
        patients,
        rapport = config.rapport_base_url(),
        "patient database opened"
    );
    Ok(MediscreenCore::new(db, config))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe service wrapper for FFI.
///
/// Store access goes through one lock; report requests never take it.
#[derive(uniffi::Object)]
pub struct MediscreenCore {
    db: Mutex<Database>,
    rapport: RapportHttpClient,
}

impl MediscreenCore {
    fn new(db: Database, config: &CoreConfig) -> Arc<Self> {
        let rapport =
            RapportHttpClient::new(config.rapport_base_url(), config.rapport_timeout());
        Arc::new(Self {
            db: Mutex::new(db),
            rapport,
        })
    }

    /// Run a service operation with the store lock held.
    fn with_service<T, F>(&self, op: F) -> Result<T, MediscreenError>
    where
        F: FnOnce(&PatientService<&Database, &RapportHttpClient>) -> ServiceResult<T>,
    {
        let db = self.db.lock()?;
        let service = PatientService::new(&*db, &self.rapport);
        Ok(op(&service)?)
    }
}

#[uniffi::export]
impl MediscreenCore {
    // =========================================================================
    // Lookups
    // =========================================================================

    /// Get a patient by id.
    pub fn find_patient_by_id(&self, id: i64) -> Result<FfiPatient, MediscreenError> {
        let patient = self.with_service(|service| service.find_by_id(id))?;
        Ok(patient.into())
    }

    /// Get a patient by exact last and first name.
    pub fn find_patient_by_name(
        &self,
        last_name: String,
        first_name: String,
    ) -> Result<FfiPatient, MediscreenError> {
        let patient = self.with_service(|service| {
            service.find_by_last_and_first_name(&last_name, &first_name)
        })?;
        Ok(patient.into())
    }

    /// Get every patient with this exact last name.
    pub fn find_patients_by_last_name(
        &self,
        last_name: String,
    ) -> Result<Vec<FfiPatient>, MediscreenError> {
        let patients = self.with_service(|service| service.find_by_last_name(&last_name))?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// List all patients.
    pub fn find_all_patients(&self) -> Result<Vec<FfiPatient>, MediscreenError> {
        let patients = self.with_service(|service| service.find_all())?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Create a patient. Any id on the input is ignored.
    pub fn create_patient(&self, patient: FfiPatient) -> Result<FfiPatient, MediscreenError> {
        let draft = Patient::try_from(patient)?;
        let created = self.with_service(move |service| service.create(draft))?;
        Ok(created.into())
    }

    /// Replace an existing patient's fields.
    pub fn update_patient(&self, patient: FfiPatient) -> Result<FfiPatient, MediscreenError> {
        let patient = Patient::try_from(patient)?;
        let updated = self.with_service(move |service| service.update(patient))?;
        Ok(updated.into())
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Fetch the diabetes risk report for a patient.
    pub fn get_patient_report(&self, id: i64) -> Result<FfiRapport, MediscreenError> {
        let rapport = service::fetch_report(&self.rapport, id)?;
        Ok(rapport.into())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient. Dates are `YYYY-MM-DD`, sex is `M` or `F`.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiPatient {
    pub id: Option<i64>,
    pub last_name: String,
    pub first_name: String,
    pub date_of_birth: String,
    pub sex: String,
    pub home_address: Option<String>,
    pub phone_number: Option<String>,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            last_name: patient.last_name,
            first_name: patient.first_name,
            date_of_birth: patient.date_of_birth.format(DATE_FORMAT).to_string(),
            sex: patient.sex.code().to_string(),
            home_address: patient.home_address,
            phone_number: patient.phone_number,
        }
    }
}

impl TryFrom<FfiPatient> for Patient {
    type Error = ValidationError;

    fn try_from(patient: FfiPatient) -> Result<Self, Self::Error> {
        let date_of_birth = NaiveDate::parse_from_str(&patient.date_of_birth, DATE_FORMAT)
            .map_err(|_| ValidationError::BadDate(patient.date_of_birth.clone()))?;
        let sex = Sex::from_code(&patient.sex)?;

        Ok(Patient {
            id: patient.id,
            last_name: patient.last_name,
            first_name: patient.first_name,
            date_of_birth,
            sex,
            home_address: patient.home_address,
            phone_number: patient.phone_number,
        })
    }
}

/// FFI-safe risk report.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiRapport {
    pub last_name: String,
    pub first_name: String,
    pub sex: String,
    pub age: u32,
    pub assessment: String,
}

impl From<Rapport> for FfiRapport {
    fn from(rapport: Rapport) -> Self {
        Self {
            last_name: rapport.last_name,
            first_name: rapport.first_name,
            sex: rapport.sex.code().to_string(),
            age: rapport.age,
            assessment: rapport.assessment.as_str().to_string(),
        }
    }
}
