//! Storage capability consumed by the patient service.

use super::DbResult;
use crate::models::{Patient, PatientId};

/// Exact-match patient lookups plus insert-or-update.
///
/// Implementations signal absence with `None` or an empty list, never with a
/// default record.
pub trait PatientStore {
    /// Get a patient by identifier.
    fn get(&self, id: PatientId) -> DbResult<Option<Patient>>;

    /// Get the patient with exactly this (last name, first name) pair.
    fn get_by_name(&self, last_name: &str, first_name: &str) -> DbResult<Option<Patient>>;

    /// All patients with exactly this last name, ascending id.
    fn get_by_last_name(&self, last_name: &str) -> DbResult<Vec<Patient>>;

    /// All patients, ascending id.
    fn get_all(&self) -> DbResult<Vec<Patient>>;

    /// Insert when `patient.id` is `None`, otherwise replace the row.
    ///
    /// Returns the persisted state including any assigned id.
    fn save(&self, patient: &Patient) -> DbResult<Patient>;
}

impl<S: PatientStore + ?Sized> PatientStore for &S {
    fn get(&self, id: PatientId) -> DbResult<Option<Patient>> {
        (**self).get(id)
    }

    fn get_by_name(&self, last_name: &str, first_name: &str) -> DbResult<Option<Patient>> {
        (**self).get_by_name(last_name, first_name)
    }

    fn get_by_last_name(&self, last_name: &str) -> DbResult<Vec<Patient>> {
        (**self).get_by_last_name(last_name)
    }

    fn get_all(&self) -> DbResult<Vec<Patient>> {
        (**self).get_all()
    }

    fn save(&self, patient: &Patient) -> DbResult<Patient> {
        (**self).save(patient)
    }
}
