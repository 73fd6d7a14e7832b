use chrono::Utc;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{NewPatient, Page, Pagination, Patient};

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        sex: row
            .get::<_, String>(4)?
            .parse()
            .unwrap_or(crate::models::Sex::Other),
        phone: row.get(5)?,
        email: row.get(6)?,
        address: row.get(7)?,
        city: row.get(8)?,
        blood_type: row.get(9)?,
        years_exposure: row.get::<_, i64>(10)?.max(0) as u32,
        smoker: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

const PATIENT_COLUMNS: &str = "id, first_name, last_name, date_of_birth, sex, phone, email, \
                               address, city, blood_type, years_exposure, smoker, \
                               created_at, updated_at";

/// Insert a new patient row and return the stored record.
pub fn create_patient(conn: &Connection, new: &NewPatient) -> Result<Patient, DatabaseError> {
    let now = Utc::now();
    let patient = Patient {
        id: Uuid::new_v4(),
        first_name: new.first_name.clone(),
        last_name: new.last_name.clone(),
        date_of_birth: new.date_of_birth,
        sex: new.sex,
        phone: new.phone.clone(),
        email: new.email.clone(),
        address: new.address.clone(),
        city: new.city.clone(),
        blood_type: new.blood_type.clone(),
        years_exposure: new.years_exposure,
        smoker: new.smoker,
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO patients (id, first_name, last_name, date_of_birth, sex, phone, email,
                               address, city, blood_type, years_exposure, smoker,
                               created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            patient.id.to_string(),
            patient.first_name,
            patient.last_name,
            patient.date_of_birth,
            patient.sex.as_str(),
            patient.phone,
            patient.email,
            patient.address,
            patient.city,
            patient.blood_type,
            i64::from(patient.years_exposure),
            patient.smoker,
            patient.created_at,
            patient.updated_at,
        ],
    )?;

    Ok(patient)
}

/// Fetch one patient by id.
pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Patient, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1");
    conn.query_row(&sql, params![id.to_string()], patient_from_row)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
                entity_type: "Patient".into(),
                id: id.to_string(),
            },
            other => other.into(),
        })
}

/// Paginated patient listing with an optional name filter.
pub fn list_patients(
    conn: &Connection,
    search: Option<&str>,
    pagination: Pagination,
) -> Result<Page<Patient>, DatabaseError> {
    let pattern = search.map(|s| format!("%{s}%"));

    let total: u64 = match &pattern {
        Some(p) => conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE first_name LIKE ?1 OR last_name LIKE ?1",
            params![p],
            |row| row.get::<_, i64>(0),
        )? as u64,
        None => conn.query_row("SELECT COUNT(*) FROM patients", [], |row| {
            row.get::<_, i64>(0)
        })? as u64,
    };

    let items = match &pattern {
        Some(p) => {
            let sql = format!(
                "SELECT {PATIENT_COLUMNS} FROM patients
                 WHERE first_name LIKE ?1 OR last_name LIKE ?1
                 ORDER BY last_name ASC, first_name ASC
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params![p, pagination.limit(), pagination.offset()],
                patient_from_row,
            )?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
        None => {
            let sql = format!(
                "SELECT {PATIENT_COLUMNS} FROM patients
                 ORDER BY last_name ASC, first_name ASC
                 LIMIT ?1 OFFSET ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params![pagination.limit(), pagination.offset()],
                patient_from_row,
            )?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(Page::new(items, total, pagination))
}

/// Overwrite a patient's editable fields.
pub fn update_patient(
    conn: &Connection,
    id: &Uuid,
    new: &NewPatient,
) -> Result<Patient, DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients
         SET first_name = ?1, last_name = ?2, date_of_birth = ?3, sex = ?4, phone = ?5,
             email = ?6, address = ?7, city = ?8, blood_type = ?9, years_exposure = ?10,
             smoker = ?11, updated_at = ?12
         WHERE id = ?13",
        params![
            new.first_name,
            new.last_name,
            new.date_of_birth,
            new.sex.as_str(),
            new.phone,
            new.email,
            new.address,
            new.city,
            new.blood_type,
            i64::from(new.years_exposure),
            new.smoker,
            Utc::now(),
            id.to_string(),
        ],
    )?;

    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: id.to_string(),
        });
    }
    get_patient(conn, id)
}

/// Delete a patient. Dependent rows cascade via foreign keys.
pub fn delete_patient(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM patients WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn count_patients(conn: &Connection) -> Result<u64, DatabaseError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
    Ok(count as u64)
}
