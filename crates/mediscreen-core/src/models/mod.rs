//! Domain models for the patient service.

mod patient;
mod rapport;

pub use patient::*;
pub use rapport::*;
