use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::repository::{
    get_patient, list_appointments, list_predictions_for_patient, AppointmentFilter,
};
use crate::models::{AppointmentView, Pagination, Patient, Prediction};

use super::ReportError;

/// Most recent predictions included in a report.
const REPORT_PREDICTION_LIMIT: u32 = 10;

/// Everything a report renderer needs, assembled once.
#[derive(Debug, Clone, Serialize)]
pub struct PatientReport {
    pub patient: Patient,
    /// Reference date used for age computation.
    pub as_of: NaiveDate,
    pub appointments: Vec<AppointmentView>,
    pub predictions: Vec<Prediction>,
}

impl PatientReport {
    pub fn title(&self) -> String {
        format!("Patient summary — {}", self.patient.display_name())
    }
}

/// Fetch one patient's records for rendering.
pub fn assemble_report(
    conn: &Connection,
    patient_id: &Uuid,
    as_of: NaiveDate,
) -> Result<PatientReport, ReportError> {
    let patient = get_patient(conn, patient_id)?;

    let appointments = list_appointments(
        conn,
        &AppointmentFilter {
            patient_id: Some(*patient_id),
            ..Default::default()
        },
        Pagination { page: 1, per_page: 100 },
    )?
    .items;

    let predictions = list_predictions_for_patient(
        conn,
        patient_id,
        Pagination {
            page: 1,
            per_page: REPORT_PREDICTION_LIMIT,
        },
    )?
    .items;

    Ok(PatientReport {
        patient,
        as_of,
        appointments,
        predictions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::{create_appointment, create_doctor, create_patient, insert_prediction};
    use crate::models::{NewAppointment, NewDoctor, NewPatient, Prediction, RiskLevel, Sex};
    use chrono::Utc;

    #[test]
    fn assemble_includes_all_sections() {
        let conn = open_memory_database().unwrap();
        let patient = create_patient(
            &conn,
            &NewPatient {
                first_name: "Rita".into(),
                last_name: "Said".into(),
                date_of_birth: NaiveDate::from_ymd_opt(1969, 9, 9).unwrap(),
                sex: Sex::Female,
                phone: None,
                email: None,
                address: None,
                city: None,
                blood_type: None,
                years_exposure: 3,
                smoker: false,
            },
        )
        .unwrap();
        let doctor = create_doctor(
            &conn,
            &NewDoctor {
                name: "Dr. Idris".into(),
                specialty: None,
                institution: None,
                email: None,
                phone: None,
            },
        )
        .unwrap();
        create_appointment(
            &conn,
            &NewAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                scheduled_at: Utc::now(),
                reason: Some("checkup".into()),
            },
        )
        .unwrap();
        insert_prediction(
            &conn,
            &Prediction {
                id: Uuid::new_v4(),
                patient_id: patient.id,
                condition: "copd".into(),
                score: 0.4,
                risk_level: RiskLevel::Moderate,
                factors: vec![],
                differential: vec![],
                summary: "Moderate.".into(),
                created_at: Utc::now(),
            },
        )
        .unwrap();

        let report = assemble_report(
            &conn,
            &patient.id,
            NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
        )
        .unwrap();
        assert_eq!(report.appointments.len(), 1);
        assert_eq!(report.predictions.len(), 1);
        assert_eq!(report.title(), "Patient summary — Said, Rita");
    }

    #[test]
    fn assemble_unknown_patient_fails() {
        let conn = open_memory_database().unwrap();
        let err = assemble_report(
            &conn,
            &Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::Database(_)));
    }
}
