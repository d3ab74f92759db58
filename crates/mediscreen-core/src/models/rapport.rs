//! Diabetes risk report models.

use serde::{Deserialize, Serialize};

use super::patient::Sex;

/// Risk assessment level, ordered by severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Assessment {
    None,
    Borderline,
    InDanger,
    EarlyOnset,
}

impl Assessment {
    /// Name as sent by the rapport service.
    pub fn as_str(self) -> &'static str {
        match self {
            Assessment::None => "None",
            Assessment::Borderline => "Borderline",
            Assessment::InDanger => "InDanger",
            Assessment::EarlyOnset => "EarlyOnset",
        }
    }

    /// Parse a level name. Returns `None` for unknown names.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "None" => Some(Assessment::None),
            "Borderline" => Some(Assessment::Borderline),
            "InDanger" => Some(Assessment::InDanger),
            "EarlyOnset" => Some(Assessment::EarlyOnset),
            _ => None,
        }
    }
}

/// A risk report for one patient. Computed remotely, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rapport {
    pub last_name: String,
    pub first_name: String,
    pub sex: Sex,
    /// Age in whole years at report time
    pub age: u32,
    pub assessment: Assessment,
}
