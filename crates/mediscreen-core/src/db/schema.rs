//! SQLite schema definition.

/// Complete database schema for the patient store.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Patients
-- ============================================================================

-- AUTOINCREMENT keeps ids monotonic: a deleted row's id is never handed out again.
CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    last_name TEXT NOT NULL,
    first_name TEXT NOT NULL,
    date_of_birth TEXT NOT NULL,                 -- ISO date, YYYY-MM-DD
    sex TEXT NOT NULL CHECK (sex IN ('M', 'F')),
    home_address TEXT,
    phone_number TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One patient per (last_name, first_name); backs the service-level check.
CREATE UNIQUE INDEX IF NOT EXISTS idx_patients_full_name ON patients(last_name, first_name);
CREATE INDEX IF NOT EXISTS idx_patients_last_name ON patients(last_name);
"#;
