//! Patient models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store-assigned patient identifier.
pub type PatientId = i64;

/// Date of birth format in storage and on the FFI boundary.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Maximum length of a last or first name.
pub const MAX_NAME_LEN: usize = 125;

/// Maximum length of a home address.
pub const MAX_ADDRESS_LEN: usize = 255;

/// Field-level validation failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} is mandatory")]
    Blank(&'static str),

    #[error("{field} exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("patient id is required")]
    MissingId,

    #[error("invalid sex code: {0}")]
    UnknownSex(String),

    #[error("invalid date of birth: {0}")]
    BadDate(String),
}

/// Administrative sex.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// One-letter code used in storage and on the wire.
    pub fn code(self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }

    /// Parse a one-letter code.
    pub fn from_code(code: &str) -> Result<Self, ValidationError> {
        match code {
            "M" => Ok(Sex::Male),
            "F" => Ok(Sex::Female),
            other => Err(ValidationError::UnknownSex(other.to_string())),
        }
    }
}

/// A patient demographic record.
///
/// `id` is `None` until the store assigns one on first save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: Option<PatientId>,
    pub last_name: String,
    pub first_name: String,
    pub date_of_birth: NaiveDate,
    pub sex: Sex,
    /// Home address (max 255 chars)
    pub home_address: Option<String>,
    /// Free-form phone number
    pub phone_number: Option<String>,
}

impl Patient {
    /// Create a draft patient with required fields.
    pub fn new(last_name: String, first_name: String, date_of_birth: NaiveDate, sex: Sex) -> Self {
        Self {
            id: None,
            last_name,
            first_name,
            date_of_birth,
            sex,
            home_address: None,
            phone_number: None,
        }
    }

    /// Builder-style address setter.
    pub fn with_home_address(mut self, address: impl Into<String>) -> Self {
        self.home_address = Some(address.into());
        self
    }

    /// Builder-style phone setter.
    pub fn with_phone_number(mut self, phone: impl Into<String>) -> Self {
        self.phone_number = Some(phone.into());
        self
    }

    /// Check if the store has assigned an identifier.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Whether this record carries the given name pair (exact match).
    pub fn has_name(&self, last_name: &str, first_name: &str) -> bool {
        self.last_name == last_name && self.first_name == first_name
    }

    /// Check the field rules for names and address.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required("last name", &self.last_name, MAX_NAME_LEN)?;
        check_required("first name", &self.first_name, MAX_NAME_LEN)?;
        if let Some(address) = &self.home_address {
            check_max("home address", address, MAX_ADDRESS_LEN)?;
        }
        Ok(())
    }
}

fn check_required(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank(field));
    }
    check_max(field, value, max)
}

fn check_max(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}
