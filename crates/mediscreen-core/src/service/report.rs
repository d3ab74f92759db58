//! Rapport client capability and its HTTP-backed implementation.

use mediscreen_rapport::{ClientError, RapportHttpClient, RapportResponse};
use thiserror::Error;

use crate::models::{Assessment, PatientId, Rapport, Sex};

/// Rapport lookup errors.
#[derive(Error, Debug)]
pub enum RapportError {
    #[error("No rapport for patient {0}")]
    NotFound(PatientId),

    #[error("Rapport service unavailable: {0}")]
    Unavailable(String),
}

/// Source of risk reports keyed by patient id.
pub trait RapportClient {
    fn get_report_by_id(&self, id: PatientId) -> Result<Rapport, RapportError>;
}

impl<R: RapportClient + ?Sized> RapportClient for &R {
    fn get_report_by_id(&self, id: PatientId) -> Result<Rapport, RapportError> {
        (**self).get_report_by_id(id)
    }
}

impl RapportClient for RapportHttpClient {
    fn get_report_by_id(&self, id: PatientId) -> Result<Rapport, RapportError> {
        let response = self.fetch(id).map_err(|e| match e {
            ClientError::NotFound(id) => RapportError::NotFound(id),
            other => RapportError::Unavailable(other.to_string()),
        })?;
        response.try_into()
    }
}

impl TryFrom<RapportResponse> for Rapport {
    type Error = RapportError;

    fn try_from(response: RapportResponse) -> Result<Self, Self::Error> {
        let sex = Sex::from_code(&response.sex)
            .map_err(|e| RapportError::Unavailable(e.to_string()))?;
        let assessment = Assessment::parse(&response.assessment).ok_or_else(|| {
            RapportError::Unavailable(format!("Unknown assessment: {}", response.assessment))
        })?;

        Ok(Rapport {
            last_name: response.last_name,
            first_name: response.first_name,
            sex,
            age: response.age,
            assessment,
        })
    }
}
