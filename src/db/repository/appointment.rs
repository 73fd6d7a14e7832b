use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{
    Appointment, AppointmentStatus, AppointmentView, NewAppointment, Page, Pagination,
};

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        patient_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        doctor_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap_or_default(),
        scheduled_at: row.get(3)?,
        status: row
            .get::<_, String>(4)?
            .parse()
            .unwrap_or(AppointmentStatus::Scheduled),
        reason: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn view_from_row(row: &Row<'_>) -> rusqlite::Result<AppointmentView> {
    Ok(AppointmentView {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        patient_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        patient_name: row.get(2)?,
        doctor_id: Uuid::parse_str(&row.get::<_, String>(3)?).unwrap_or_default(),
        doctor_name: row.get(4)?,
        scheduled_at: row.get(5)?,
        status: row
            .get::<_, String>(6)?
            .parse()
            .unwrap_or(AppointmentStatus::Scheduled),
        reason: row.get(7)?,
        notes: row.get(8)?,
    })
}

const VIEW_SELECT: &str = "SELECT a.id, a.patient_id, pt.last_name || ', ' || pt.first_name,
                                  a.doctor_id, d.name, a.scheduled_at, a.status, a.reason, a.notes
                           FROM appointments a
                           JOIN patients pt ON a.patient_id = pt.id
                           JOIN doctors d ON a.doctor_id = d.id";

/// Create a scheduled appointment. Foreign keys reject unknown patient/doctor ids.
pub fn create_appointment(
    conn: &Connection,
    new: &NewAppointment,
) -> Result<Appointment, DatabaseError> {
    let appointment = Appointment {
        id: Uuid::new_v4(),
        patient_id: new.patient_id,
        doctor_id: new.doctor_id,
        scheduled_at: new.scheduled_at,
        status: AppointmentStatus::Scheduled,
        reason: new.reason.clone(),
        notes: None,
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO appointments (id, patient_id, doctor_id, scheduled_at, status, reason,
                                   notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            appointment.id.to_string(),
            appointment.patient_id.to_string(),
            appointment.doctor_id.to_string(),
            appointment.scheduled_at,
            appointment.status.as_str(),
            appointment.reason,
            appointment.notes,
            appointment.created_at,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation("unknown patient or doctor id".into())
        }
        other => other.into(),
    })?;

    Ok(appointment)
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Appointment, DatabaseError> {
    conn.query_row(
        "SELECT id, patient_id, doctor_id, scheduled_at, status, reason, notes, created_at
         FROM appointments WHERE id = ?1",
        params![id.to_string()],
        appointment_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        },
        other => other.into(),
    })
}

/// Optional filters for the appointment list.
#[derive(Debug, Default, Clone)]
pub struct AppointmentFilter {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
}

/// Paginated, joined appointment listing, newest first.
pub fn list_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
    pagination: Pagination,
) -> Result<Page<AppointmentView>, DatabaseError> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut args: Vec<String> = Vec::new();

    if let Some(pid) = &filter.patient_id {
        clauses.push("a.patient_id = ?");
        args.push(pid.to_string());
    }
    if let Some(did) = &filter.doctor_id {
        clauses.push("a.doctor_id = ?");
        args.push(did.to_string());
    }
    if let Some(status) = &filter.status {
        clauses.push("a.status = ?");
        args.push(status.as_str().to_string());
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM appointments a{where_sql}");
    let total: u64 = conn.query_row(
        &count_sql,
        rusqlite::params_from_iter(args.iter()),
        |row| row.get::<_, i64>(0),
    )? as u64;

    let list_sql = format!(
        "{VIEW_SELECT}{where_sql} ORDER BY a.scheduled_at DESC LIMIT {} OFFSET {}",
        pagination.limit(),
        pagination.offset()
    );
    let mut stmt = conn.prepare(&list_sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), view_from_row)?;
    let items = rows.collect::<Result<Vec<_>, _>>()?;

    Ok(Page::new(items, total, pagination))
}

/// Set a new status. The caller has already validated the transition.
pub fn update_appointment_status(
    conn: &Connection,
    id: &Uuid,
    status: AppointmentStatus,
    notes: Option<&str>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments
         SET status = ?1, notes = COALESCE(?2, notes)
         WHERE id = ?3",
        params![status.as_str(), notes, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Scheduled appointments inside the next `days` days, soonest first.
pub fn upcoming_appointments(
    conn: &Connection,
    now: DateTime<Utc>,
    days: i64,
    limit: u32,
) -> Result<Vec<AppointmentView>, DatabaseError> {
    let until = now + Duration::days(days);
    let sql = format!(
        "{VIEW_SELECT}
         WHERE a.status = 'scheduled' AND a.scheduled_at >= ?1 AND a.scheduled_at < ?2
         ORDER BY a.scheduled_at ASC
         LIMIT ?3"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![now, until, limit], view_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Appointment counts grouped by status.
pub fn count_appointments_by_status(
    conn: &Connection,
) -> Result<Vec<(AppointmentStatus, u64)>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT status, COUNT(*) FROM appointments GROUP BY status")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counts = Vec::new();
    for row in rows {
        let (status, count) = row?;
        counts.push((status.parse()?, count as u64));
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::{create_doctor, create_patient};
    use crate::models::{NewDoctor, NewPatient, Sex};
    use chrono::NaiveDate;

    fn seed(conn: &Connection) -> (Uuid, Uuid) {
        let patient = create_patient(
            conn,
            &NewPatient {
                first_name: "Ife".into(),
                last_name: "Bello".into(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                sex: Sex::Female,
                phone: None,
                email: None,
                address: None,
                city: None,
                blood_type: None,
                years_exposure: 0,
                smoker: false,
            },
        )
        .unwrap();
        let doctor = create_doctor(
            conn,
            &NewDoctor {
                name: "Dr. Mensah".into(),
                specialty: None,
                institution: None,
                email: None,
                phone: None,
            },
        )
        .unwrap();
        (patient.id, doctor.id)
    }

    fn schedule(conn: &Connection, patient_id: Uuid, doctor_id: Uuid) -> Appointment {
        create_appointment(
            conn,
            &NewAppointment {
                patient_id,
                doctor_id,
                scheduled_at: Utc::now() + Duration::days(2),
                reason: Some("follow-up".into()),
            },
        )
        .unwrap()
    }

    #[test]
    fn create_starts_scheduled() {
        let conn = open_memory_database().unwrap();
        let (pid, did) = seed(&conn);
        let appt = schedule(&conn, pid, did);
        assert_eq!(appt.status, AppointmentStatus::Scheduled);
        let fetched = get_appointment(&conn, &appt.id).unwrap();
        assert_eq!(fetched.reason.as_deref(), Some("follow-up"));
    }

    #[test]
    fn unknown_patient_rejected_by_foreign_key() {
        let conn = open_memory_database().unwrap();
        let (_, did) = seed(&conn);
        let err = create_appointment(
            &conn,
            &NewAppointment {
                patient_id: Uuid::new_v4(),
                doctor_id: did,
                scheduled_at: Utc::now(),
                reason: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn list_joins_names_and_filters_by_status() {
        let conn = open_memory_database().unwrap();
        let (pid, did) = seed(&conn);
        let appt = schedule(&conn, pid, did);
        update_appointment_status(&conn, &appt.id, AppointmentStatus::Completed, Some("seen"))
            .unwrap();
        schedule(&conn, pid, did);

        let completed = list_appointments(
            &conn,
            &AppointmentFilter {
                status: Some(AppointmentStatus::Completed),
                ..Default::default()
            },
            Pagination::default(),
        )
        .unwrap();
        assert_eq!(completed.total, 1);
        assert_eq!(completed.items[0].patient_name, "Bello, Ife");
        assert_eq!(completed.items[0].doctor_name, "Dr. Mensah");
        assert_eq!(completed.items[0].notes.as_deref(), Some("seen"));
    }

    #[test]
    fn upcoming_excludes_past_and_cancelled() {
        let conn = open_memory_database().unwrap();
        let (pid, did) = seed(&conn);

        // In window
        schedule(&conn, pid, did);
        // Cancelled — excluded
        let cancelled = schedule(&conn, pid, did);
        update_appointment_status(&conn, &cancelled.id, AppointmentStatus::Cancelled, None)
            .unwrap();
        // Outside the 7-day window
        create_appointment(
            &conn,
            &NewAppointment {
                patient_id: pid,
                doctor_id: did,
                scheduled_at: Utc::now() + Duration::days(30),
                reason: None,
            },
        )
        .unwrap();

        let upcoming = upcoming_appointments(&conn, Utc::now(), 7, 10).unwrap();
        assert_eq!(upcoming.len(), 1);
    }

    #[test]
    fn counts_group_by_status() {
        let conn = open_memory_database().unwrap();
        let (pid, did) = seed(&conn);
        schedule(&conn, pid, did);
        schedule(&conn, pid, did);
        let done = schedule(&conn, pid, did);
        update_appointment_status(&conn, &done.id, AppointmentStatus::Completed, None).unwrap();

        let counts = count_appointments_by_status(&conn).unwrap();
        let scheduled = counts
            .iter()
            .find(|(s, _)| *s == AppointmentStatus::Scheduled)
            .map(|(_, c)| *c);
        assert_eq!(scheduled, Some(2));
    }
}
