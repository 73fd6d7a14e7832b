//! Dashboard aggregation: one pass over the clinic tables assembled
//! into a single payload for the dashboard endpoint.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::repository::{
    count_appointments_by_status, count_doctors, count_high_risk_patients, count_patients,
    latest_predictions, upcoming_appointments,
};
use crate::db::DatabaseError;
use crate::models::{AppointmentStatus, AppointmentView, Prediction};

/// Upcoming-appointment window shown on the dashboard.
const UPCOMING_DAYS: i64 = 7;
const UPCOMING_LIMIT: u32 = 10;
const LATEST_PREDICTIONS_LIMIT: u32 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ClinicCounts {
    pub patients: u64,
    pub doctors: u64,
    pub appointments_scheduled: u64,
    pub appointments_completed: u64,
    pub appointments_cancelled: u64,
    pub high_risk_patients: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub counts: ClinicCounts,
    pub upcoming_appointments: Vec<AppointmentView>,
    pub latest_predictions: Vec<Prediction>,
}

/// Assemble the dashboard from the clinic tables.
pub fn fetch_dashboard(
    conn: &Connection,
    now: DateTime<Utc>,
) -> Result<DashboardData, DatabaseError> {
    let by_status = count_appointments_by_status(conn)?;
    let count_for = |status: AppointmentStatus| {
        by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    };

    let counts = ClinicCounts {
        patients: count_patients(conn)?,
        doctors: count_doctors(conn)?,
        appointments_scheduled: count_for(AppointmentStatus::Scheduled),
        appointments_completed: count_for(AppointmentStatus::Completed),
        appointments_cancelled: count_for(AppointmentStatus::Cancelled),
        high_risk_patients: count_high_risk_patients(conn)?,
    };

    Ok(DashboardData {
        counts,
        upcoming_appointments: upcoming_appointments(conn, now, UPCOMING_DAYS, UPCOMING_LIMIT)?,
        latest_predictions: latest_predictions(conn, LATEST_PREDICTIONS_LIMIT)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::{
        create_appointment, create_doctor, create_patient, insert_prediction,
        update_appointment_status,
    };
    use crate::models::{
        NewAppointment, NewDoctor, NewPatient, Prediction, RiskLevel, Sex,
    };
    use chrono::{Duration, NaiveDate};
    use uuid::Uuid;

    #[test]
    fn empty_database_yields_zero_counts() {
        let conn = open_memory_database().unwrap();
        let data = fetch_dashboard(&conn, Utc::now()).unwrap();
        assert_eq!(data.counts.patients, 0);
        assert_eq!(data.counts.doctors, 0);
        assert!(data.upcoming_appointments.is_empty());
        assert!(data.latest_predictions.is_empty());
    }

    #[test]
    fn counts_reflect_seeded_rows() {
        let conn = open_memory_database().unwrap();
        let patient = create_patient(
            &conn,
            &NewPatient {
                first_name: "Dash".into(),
                last_name: "Board".into(),
                date_of_birth: NaiveDate::from_ymd_opt(1966, 6, 6).unwrap(),
                sex: Sex::Male,
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
            &conn,
            &NewDoctor {
                name: "Dr. Count".into(),
                specialty: None,
                institution: None,
                email: None,
                phone: None,
            },
        )
        .unwrap();

        let in_window = create_appointment(
            &conn,
            &NewAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                scheduled_at: Utc::now() + Duration::days(2),
                reason: None,
            },
        )
        .unwrap();
        let done = create_appointment(
            &conn,
            &NewAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                scheduled_at: Utc::now() - Duration::days(3),
                reason: None,
            },
        )
        .unwrap();
        update_appointment_status(&conn, &done.id, AppointmentStatus::Completed, None).unwrap();

        insert_prediction(
            &conn,
            &Prediction {
                id: Uuid::new_v4(),
                patient_id: patient.id,
                condition: "copd".into(),
                score: 0.8,
                risk_level: RiskLevel::High,
                factors: vec![],
                differential: vec![],
                summary: "High.".into(),
                created_at: Utc::now(),
            },
        )
        .unwrap();

        let data = fetch_dashboard(&conn, Utc::now()).unwrap();
        assert_eq!(data.counts.patients, 1);
        assert_eq!(data.counts.doctors, 1);
        assert_eq!(data.counts.appointments_scheduled, 1);
        assert_eq!(data.counts.appointments_completed, 1);
        assert_eq!(data.counts.high_risk_patients, 1);
        assert_eq!(data.upcoming_appointments.len(), 1);
        assert_eq!(data.upcoming_appointments[0].id, in_window.id);
        assert_eq!(data.latest_predictions.len(), 1);
    }
}
