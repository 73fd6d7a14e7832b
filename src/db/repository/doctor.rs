use chrono::Utc;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Doctor, NewDoctor, Page, Pagination};

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        name: row.get(1)?,
        specialty: row.get(2)?,
        institution: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn create_doctor(conn: &Connection, new: &NewDoctor) -> Result<Doctor, DatabaseError> {
    let doctor = Doctor {
        id: Uuid::new_v4(),
        name: new.name.clone(),
        specialty: new.specialty.clone(),
        institution: new.institution.clone(),
        email: new.email.clone(),
        phone: new.phone.clone(),
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO doctors (id, name, specialty, institution, email, phone, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            doctor.id.to_string(),
            doctor.name,
            doctor.specialty,
            doctor.institution,
            doctor.email,
            doctor.phone,
            doctor.created_at,
        ],
    )?;

    Ok(doctor)
}

pub fn get_doctor(conn: &Connection, id: &Uuid) -> Result<Doctor, DatabaseError> {
    conn.query_row(
        "SELECT id, name, specialty, institution, email, phone, created_at
         FROM doctors WHERE id = ?1",
        params![id.to_string()],
        doctor_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
            entity_type: "Doctor".into(),
            id: id.to_string(),
        },
        other => other.into(),
    })
}

pub fn list_doctors(
    conn: &Connection,
    pagination: Pagination,
) -> Result<Page<Doctor>, DatabaseError> {
    let total: u64 =
        conn.query_row("SELECT COUNT(*) FROM doctors", [], |row| row.get::<_, i64>(0))? as u64;

    let mut stmt = conn.prepare(
        "SELECT id, name, specialty, institution, email, phone, created_at
         FROM doctors ORDER BY name ASC LIMIT ?1 OFFSET ?2",
    )?;
    let rows = stmt.query_map(
        params![pagination.limit(), pagination.offset()],
        doctor_from_row,
    )?;
    let items = rows.collect::<Result<Vec<_>, _>>()?;

    Ok(Page::new(items, total, pagination))
}

pub fn delete_doctor(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM doctors WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Doctor".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn count_doctors(conn: &Connection) -> Result<u64, DatabaseError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM doctors", [], |row| row.get(0))?;
    Ok(count as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn new_doctor(name: &str) -> NewDoctor {
        NewDoctor {
            name: name.into(),
            specialty: Some("Pulmonology".into()),
            institution: None,
            email: None,
            phone: None,
        }
    }

    #[test]
    fn create_and_get_round_trip() {
        let conn = open_memory_database().unwrap();
        let created = create_doctor(&conn, &new_doctor("Dr. Ada Eze")).unwrap();
        let fetched = get_doctor(&conn, &created.id).unwrap();
        assert_eq!(fetched.name, "Dr. Ada Eze");
        assert_eq!(fetched.specialty.as_deref(), Some("Pulmonology"));
    }

    #[test]
    fn list_orders_by_name() {
        let conn = open_memory_database().unwrap();
        create_doctor(&conn, &new_doctor("Dr. Zane")).unwrap();
        create_doctor(&conn, &new_doctor("Dr. Abel")).unwrap();

        let page = list_doctors(&conn, Pagination::default()).unwrap();
        assert_eq!(page.items[0].name, "Dr. Abel");
        assert_eq!(page.total, 2);
    }

    #[test]
    fn delete_missing_is_not_found() {
        let conn = open_memory_database().unwrap();
        assert!(matches!(
            delete_doctor(&conn, &Uuid::new_v4()),
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
