//! Blocking HTTP client for the rapport microservice.
//!
//! The rapport service computes a patient's diabetes risk assessment from
//! their demographics and practitioner notes. This crate only fetches the
//! finished report; it knows nothing about how it is scored.

pub mod client;

pub use client::*;
