use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{ArtifactKind, CaseArtifact, ComparisonResult};

fn artifact_from_row(row: &Row<'_>) -> rusqlite::Result<CaseArtifact> {
    Ok(CaseArtifact {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        patient_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        file_name: row.get(2)?,
        kind: row
            .get::<_, String>(3)?
            .parse()
            .unwrap_or(ArtifactKind::Document),
        byte_size: row.get::<_, i64>(4)?.max(0) as u64,
        checksum: row.get(5)?,
        uploaded_at: row.get(6)?,
    })
}

fn comparison_from_row(row: &Row<'_>) -> rusqlite::Result<ComparisonResult> {
    let regions_json: String = row.get(4)?;
    Ok(ComparisonResult {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        left_artifact_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        right_artifact_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap_or_default(),
        similarity: row.get(3)?,
        regions: serde_json::from_str(&regions_json).unwrap_or_default(),
        compared_at: row.get(5)?,
    })
}

pub fn insert_artifact(conn: &Connection, artifact: &CaseArtifact) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO case_artifacts (id, patient_id, file_name, kind, byte_size, checksum,
                                     uploaded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            artifact.id.to_string(),
            artifact.patient_id.to_string(),
            artifact.file_name,
            artifact.kind.as_str(),
            artifact.byte_size as i64,
            artifact.checksum,
            artifact.uploaded_at,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation("unknown patient id".into())
        }
        other => other.into(),
    })?;
    Ok(())
}

pub fn get_artifact(conn: &Connection, id: &Uuid) -> Result<CaseArtifact, DatabaseError> {
    conn.query_row(
        "SELECT id, patient_id, file_name, kind, byte_size, checksum, uploaded_at
         FROM case_artifacts WHERE id = ?1",
        params![id.to_string()],
        artifact_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
            entity_type: "CaseArtifact".into(),
            id: id.to_string(),
        },
        other => other.into(),
    })
}

pub fn list_artifacts_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<CaseArtifact>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, file_name, kind, byte_size, checksum, uploaded_at
         FROM case_artifacts WHERE patient_id = ?1 ORDER BY uploaded_at DESC",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string()], artifact_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn insert_comparison(
    conn: &Connection,
    result: &ComparisonResult,
) -> Result<(), DatabaseError> {
    let regions_json = serde_json::to_string(&result.regions)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("JSON serialization: {e}")))?;

    conn.execute(
        "INSERT INTO comparison_results (id, left_artifact_id, right_artifact_id, similarity,
                                         regions_json, compared_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            result.id.to_string(),
            result.left_artifact_id.to_string(),
            result.right_artifact_id.to_string(),
            result.similarity,
            regions_json,
            result.compared_at,
        ],
    )?;
    Ok(())
}

pub fn get_comparison(conn: &Connection, id: &Uuid) -> Result<ComparisonResult, DatabaseError> {
    conn.query_row(
        "SELECT id, left_artifact_id, right_artifact_id, similarity, regions_json, compared_at
         FROM comparison_results WHERE id = ?1",
        params![id.to_string()],
        comparison_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
            entity_type: "ComparisonResult".into(),
            id: id.to_string(),
        },
        other => other.into(),
    })
}

/// Comparisons touching the given artifact on either side, newest first.
pub fn list_comparisons_for_artifact(
    conn: &Connection,
    artifact_id: &Uuid,
) -> Result<Vec<ComparisonResult>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, left_artifact_id, right_artifact_id, similarity, regions_json, compared_at
         FROM comparison_results
         WHERE left_artifact_id = ?1 OR right_artifact_id = ?1
         ORDER BY compared_at DESC",
    )?;
    let rows = stmt.query_map(params![artifact_id.to_string()], comparison_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::create_patient;
    use crate::models::{NewPatient, Region, Sex};
    use chrono::{NaiveDate, Utc};

    fn seed_patient(conn: &Connection) -> Uuid {
        create_patient(
            conn,
            &NewPatient {
                first_name: "Art".into(),
                last_name: "Holder".into(),
                date_of_birth: NaiveDate::from_ymd_opt(1970, 2, 2).unwrap(),
                sex: Sex::Other,
                phone: None,
                email: None,
                address: None,
                city: None,
                blood_type: None,
                years_exposure: 0,
                smoker: false,
            },
        )
        .unwrap()
        .id
    }

    fn sample_artifact(patient_id: Uuid, checksum: &str) -> CaseArtifact {
        CaseArtifact {
            id: Uuid::new_v4(),
            patient_id,
            file_name: "chest.png".into(),
            kind: ArtifactKind::Image,
            byte_size: 2048,
            checksum: checksum.into(),
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn artifact_round_trip() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn);
        let artifact = sample_artifact(pid, "abc123");
        insert_artifact(&conn, &artifact).unwrap();

        let fetched = get_artifact(&conn, &artifact.id).unwrap();
        assert_eq!(fetched.file_name, "chest.png");
        assert_eq!(fetched.kind, ArtifactKind::Image);
        assert_eq!(fetched.checksum, "abc123");
    }

    #[test]
    fn artifact_for_unknown_patient_rejected() {
        let conn = open_memory_database().unwrap();
        let artifact = sample_artifact(Uuid::new_v4(), "abc");
        assert!(matches!(
            insert_artifact(&conn, &artifact),
            Err(DatabaseError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn comparison_round_trip_and_lookup_by_side() {
        let conn = open_memory_database().unwrap();
        let pid = seed_patient(&conn);
        let left = sample_artifact(pid, "left");
        let right = sample_artifact(pid, "right");
        insert_artifact(&conn, &left).unwrap();
        insert_artifact(&conn, &right).unwrap();

        let result = ComparisonResult {
            id: Uuid::new_v4(),
            left_artifact_id: left.id,
            right_artifact_id: right.id,
            similarity: 0.75,
            regions: vec![Region { row: 1, col: 2, intensity: 200 }],
            compared_at: Utc::now(),
        };
        insert_comparison(&conn, &result).unwrap();

        let fetched = get_comparison(&conn, &result.id).unwrap();
        assert_eq!(fetched.similarity, 0.75);
        assert_eq!(fetched.regions.len(), 1);

        // Found from either side
        assert_eq!(list_comparisons_for_artifact(&conn, &left.id).unwrap().len(), 1);
        assert_eq!(list_comparisons_for_artifact(&conn, &right.id).unwrap().len(), 1);
    }
}
