use rusqlite::{params, Connection};

use crate::db::DatabaseError;

/// One flushed audit row: (timestamp, source, action, entity, user_id).
pub type AuditRow = (String, String, String, String, Option<String>);

/// Batch-insert buffered audit entries inside one transaction.
pub fn insert_audit_entries(conn: &Connection, entries: &[AuditRow]) -> Result<(), DatabaseError> {
    conn.execute_batch("BEGIN")?;
    let result = (|| -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(
            "INSERT INTO audit_log (timestamp, source, action, entity, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (timestamp, source, action, entity, user_id) in entries {
            stmt.execute(params![timestamp, source, action, entity, user_id])?;
        }
        Ok(())
    })();

    match result {
        Ok(()) => {
            conn.execute_batch("COMMIT")?;
            Ok(())
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

/// Delete audit entries older than `days`. Returns the number removed.
pub fn prune_audit_log(conn: &Connection, days: u32) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM audit_log WHERE timestamp < datetime('now', ?1)",
        params![format!("-{days} days")],
    )?;
    Ok(deleted)
}

/// Most recent audit entries, newest first.
pub fn recent_audit_entries(
    conn: &Connection,
    limit: u32,
) -> Result<Vec<AuditRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT timestamp, source, action, entity, user_id
         FROM audit_log ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
        ))
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
