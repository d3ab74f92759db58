//! Patient database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult, PatientStore};
use crate::models::{Patient, PatientId, Sex, DATE_FORMAT};

const SELECT_COLUMNS: &str = r#"
    SELECT id, last_name, first_name, date_of_birth, sex,
           home_address, phone_number
    FROM patients
"#;

impl Database {
    /// Insert a new patient and return its assigned id.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<PatientId> {
        self.conn
            .execute(
                r#"
                INSERT INTO patients (
                    last_name, first_name, date_of_birth, sex,
                    home_address, phone_number
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    patient.last_name,
                    patient.first_name,
                    patient.date_of_birth.format(DATE_FORMAT).to_string(),
                    patient.sex.code(),
                    patient.home_address,
                    patient.phone_number,
                ],
            )
            .map_err(|e| classify_write_error(e, patient))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Replace every field of an existing patient.
    pub fn update_patient(&self, id: PatientId, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute(
                r#"
                UPDATE patients SET
                    last_name = ?2,
                    first_name = ?3,
                    date_of_birth = ?4,
                    sex = ?5,
                    home_address = ?6,
                    phone_number = ?7,
                    updated_at = datetime('now')
                WHERE id = ?1
                "#,
                params![
                    id,
                    patient.last_name,
                    patient.first_name,
                    patient.date_of_birth.format(DATE_FORMAT).to_string(),
                    patient.sex.code(),
                    patient.home_address,
                    patient.phone_number,
                ],
            )
            .map_err(|e| classify_write_error(e, patient))?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by id.
    pub fn get_patient(&self, id: PatientId) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(&format!("{SELECT_COLUMNS} WHERE id = ?"), [id], read_row)
            .optional()?
            .map(Patient::try_from)
            .transpose()
    }

    /// Get a patient by exact last and first name.
    pub fn get_patient_by_name(&self, last_name: &str, first_name: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE last_name = ?1 AND first_name = ?2"),
                params![last_name, first_name],
                read_row,
            )
            .optional()?
            .map(Patient::try_from)
            .transpose()
    }

    /// List patients sharing an exact last name.
    pub fn list_patients_by_last_name(&self, last_name: &str) -> DbResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} WHERE last_name = ? ORDER BY id"))?;
        let rows = stmt.query_map([last_name], read_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// List all patients.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id"))?;
        let rows = stmt.query_map([], read_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// Count stored patients.
    pub fn count_patients(&self) -> DbResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl PatientStore for Database {
    fn get(&self, id: PatientId) -> DbResult<Option<Patient>> {
        self.get_patient(id)
    }

    fn get_by_name(&self, last_name: &str, first_name: &str) -> DbResult<Option<Patient>> {
        self.get_patient_by_name(last_name, first_name)
    }

    fn get_by_last_name(&self, last_name: &str) -> DbResult<Vec<Patient>> {
        self.list_patients_by_last_name(last_name)
    }

    fn get_all(&self) -> DbResult<Vec<Patient>> {
        self.list_patients()
    }

    fn save(&self, patient: &Patient) -> DbResult<Patient> {
        let id = match patient.id {
            None => self.insert_patient(patient)?,
            Some(id) => {
                if !self.update_patient(id, patient)? {
                    return Err(DbError::NotFound(format!("patient {}", id)));
                }
                id
            }
        };

        Ok(Patient {
            id: Some(id),
            ..patient.clone()
        })
    }
}

/// Intermediate row struct for database mapping.
struct PatientRow {
    id: PatientId,
    last_name: String,
    first_name: String,
    date_of_birth: String,
    sex: String,
    home_address: Option<String>,
    phone_number: Option<String>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok(PatientRow {
        id: row.get(0)?,
        last_name: row.get(1)?,
        first_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        sex: row.get(4)?,
        home_address: row.get(5)?,
        phone_number: row.get(6)?,
    })
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let date_of_birth = NaiveDate::parse_from_str(&row.date_of_birth, DATE_FORMAT).map_err(|_| {
            DbError::Constraint(format!("Invalid date_of_birth: {}", row.date_of_birth))
        })?;
        let sex = Sex::from_code(&row.sex)
            .map_err(|_| DbError::Constraint(format!("Unknown sex code: {}", row.sex)))?;

        Ok(Patient {
            id: Some(row.id),
            last_name: row.last_name,
            first_name: row.first_name,
            date_of_birth,
            sex,
            home_address: row.home_address,
            phone_number: row.phone_number,
        })
    }
}

/// Surface the (last_name, first_name) unique index as `Duplicate`.
fn classify_write_error(err: rusqlite::Error, patient: &Patient) -> DbError {
    if let rusqlite::Error::SqliteFailure(e, _) = &err {
        if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
            return DbError::Duplicate(format!("{} {}", patient.last_name, patient.first_name));
        }
    }
    DbError::Sqlite(err)
}
