use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Page, Pagination, Prediction, RiskLevel};

fn prediction_from_row(row: &Row<'_>) -> rusqlite::Result<Prediction> {
    let factors_json: String = row.get(5)?;
    let differential_json: String = row.get(6)?;
    Ok(Prediction {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        patient_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        condition: row.get(2)?,
        score: row.get(3)?,
        risk_level: row
            .get::<_, String>(4)?
            .parse()
            .unwrap_or(RiskLevel::Low),
        factors: serde_json::from_str(&factors_json).unwrap_or_default(),
        differential: serde_json::from_str(&differential_json).unwrap_or_default(),
        summary: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const PREDICTION_COLUMNS: &str =
    "id, patient_id, condition, score, risk_level, factors_json, differential_json, \
     summary, created_at";

/// Persist a prediction produced by the scoring module.
pub fn insert_prediction(conn: &Connection, p: &Prediction) -> Result<(), DatabaseError> {
    let factors_json = serde_json::to_string(&p.factors)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("JSON serialization: {e}")))?;
    let differential_json = serde_json::to_string(&p.differential)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("JSON serialization: {e}")))?;

    conn.execute(
        "INSERT INTO predictions (id, patient_id, condition, score, risk_level, factors_json,
                                  differential_json, summary, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            p.id.to_string(),
            p.patient_id.to_string(),
            p.condition,
            p.score,
            p.risk_level.as_str(),
            factors_json,
            differential_json,
            p.summary,
            p.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_prediction(conn: &Connection, id: &Uuid) -> Result<Prediction, DatabaseError> {
    let sql = format!("SELECT {PREDICTION_COLUMNS} FROM predictions WHERE id = ?1");
    conn.query_row(&sql, params![id.to_string()], prediction_from_row)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
                entity_type: "Prediction".into(),
                id: id.to_string(),
            },
            other => other.into(),
        })
}

/// Paginated prediction history for one patient, newest first.
pub fn list_predictions_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
    pagination: Pagination,
) -> Result<Page<Prediction>, DatabaseError> {
    let total: u64 = conn.query_row(
        "SELECT COUNT(*) FROM predictions WHERE patient_id = ?1",
        params![patient_id.to_string()],
        |row| row.get::<_, i64>(0),
    )? as u64;

    let sql = format!(
        "SELECT {PREDICTION_COLUMNS} FROM predictions
         WHERE patient_id = ?1
         ORDER BY created_at DESC
         LIMIT ?2 OFFSET ?3"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![
            patient_id.to_string(),
            pagination.limit(),
            pagination.offset()
        ],
        prediction_from_row,
    )?;
    let items = rows.collect::<Result<Vec<_>, _>>()?;

    Ok(Page::new(items, total, pagination))
}

/// Most recent predictions across all patients (dashboard feed).
pub fn latest_predictions(conn: &Connection, limit: u32) -> Result<Vec<Prediction>, DatabaseError> {
    let sql = format!(
        "SELECT {PREDICTION_COLUMNS} FROM predictions ORDER BY created_at DESC LIMIT ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit], prediction_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Number of distinct patients whose most recent prediction is high risk.
pub fn count_high_risk_patients(conn: &Connection) -> Result<u64, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM (
             SELECT patient_id, risk_level,
                    ROW_NUMBER() OVER (PARTITION BY patient_id ORDER BY created_at DESC) AS rn
             FROM predictions
         ) WHERE rn = 1 AND risk_level = 'high'",
        [],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::create_patient;
    use crate::models::{DifferentialEntry, NewPatient, RiskFactor, Sex};
    use chrono::{NaiveDate, Utc};

    fn seed_patient(conn: &Connection) -> Uuid {
        create_patient(
            conn,
            &NewPatient {
                first_name: "Test".into(),
                last_name: "Patient".into(),
                date_of_birth: NaiveDate::from_ymd_opt(1960, 5, 5).unwrap(),
                sex: Sex::Male,
                phone: None,
                email: None,
                address: None,
                city: None,
                blood_type: None,
                years_exposure: 20,
                smoker: true,
            },
        )
        .unwrap()
        .id
    }

    fn sample(patient_id: Uuid, level: RiskLevel, score: f64) -> Prediction {
        Prediction {
            id: Uuid::new_v4(),
            patient_id,
            condition: "copd".into(),
            score,
            risk_level: level,
            factors: vec![RiskFactor {
                label: "smoker".into(),
                weight: 0.2,
                detail: "Current smoker".into(),
            }],
            differential: vec![DifferentialEntry {
                condition: "asthma".into(),
                probability: 0.3,
            }],
            summary: "Elevated risk.".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_get_round_trip_json_columns() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn);
        let p = sample(pid, RiskLevel::High, 0.82);
        insert_prediction(&conn, &p).unwrap();

        let fetched = get_prediction(&conn, &p.id).unwrap();
        assert_eq!(fetched.condition, "copd");
        assert_eq!(fetched.factors.len(), 1);
        assert_eq!(fetched.factors[0].label, "smoker");
        assert_eq!(fetched.differential[0].condition, "asthma");
    }

    #[test]
    fn score_outside_unit_interval_rejected_by_check() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn);
        let mut p = sample(pid, RiskLevel::High, 1.7);
        p.score = 1.7;
        assert!(insert_prediction(&conn, &p).is_err());
    }

    #[test]
    fn high_risk_count_uses_latest_prediction_only() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn);

        let mut older = sample(pid, RiskLevel::High, 0.9);
        older.created_at = Utc::now() - chrono::Duration::days(2);
        insert_prediction(&conn, &older).unwrap();

        // Newer low-risk result supersedes the high one
        insert_prediction(&conn, &sample(pid, RiskLevel::Low, 0.1)).unwrap();

        assert_eq!(count_high_risk_patients(&conn).unwrap(), 0);
    }

    #[test]
    fn list_for_patient_pages() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn);
        for _ in 0..5 {
            insert_prediction(&conn, &sample(pid, RiskLevel::Moderate, 0.5)).unwrap();
        }
        let page =
            list_predictions_for_patient(&conn, &pid, Pagination { page: 1, per_page: 2 })
                .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_pages, 3);
    }
}
