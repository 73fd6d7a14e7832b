use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Role, User};

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        username: row.get(1)?,
        password_hash: row.get(2)?,
        salt: row.get(3)?,
        role: row.get::<_, String>(4)?.parse().unwrap_or(Role::Clinician),
        created_at: row.get(5)?,
    })
}

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, username, password_hash, salt, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.id.to_string(),
            user.username,
            user.password_hash,
            user.salt,
            user.role.as_str(),
            user.created_at,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(format!(
                "username already taken: {}",
                user.username
            ))
        }
        other => other.into(),
    })?;
    Ok(())
}

pub fn find_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<User>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, username, password_hash, salt, role, created_at
         FROM users WHERE username = ?1",
        params![username],
        user_from_row,
    );
    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password_hash, salt, role, created_at
         FROM users ORDER BY username ASC",
    )?;
    let rows = stmt.query_map([], user_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// True if at least one admin account exists (bootstrap check).
pub fn any_admin_exists(conn: &Connection) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = 'admin'",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use chrono::Utc;

    fn sample(username: &str, role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: "hash".into(),
            salt: "salt".into(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_find_round_trip() {
        let conn = open_memory_database().unwrap();
        insert_user(&conn, &sample("admin", Role::Admin)).unwrap();

        let found = find_user_by_username(&conn, "admin").unwrap().unwrap();
        assert_eq!(found.role, Role::Admin);
        assert!(find_user_by_username(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_rejected() {
        let conn = open_memory_database().unwrap();
        insert_user(&conn, &sample("nurse", Role::Clinician)).unwrap();
        let err = insert_user(&conn, &sample("nurse", Role::Clinician)).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn admin_bootstrap_check() {
        let conn = open_memory_database().unwrap();
        assert!(!any_admin_exists(&conn).unwrap());
        insert_user(&conn, &sample("root", Role::Admin)).unwrap();
        assert!(any_admin_exists(&conn).unwrap());
    }
}
