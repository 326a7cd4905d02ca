use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::User;

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, display_name, token_hash, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            user.id.to_string(),
            user.display_name,
            user.token_hash,
            user.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Look up a user by the hex-encoded SHA-256 hash of their bearer token.
pub fn get_user_by_token_hash(
    conn: &Connection,
    token_hash: &str,
) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, display_name, token_hash, created_at
             FROM users WHERE token_hash = ?1",
            params![token_hash],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    Ok(row.map(|(id, display_name, token_hash, created_at)| User {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        display_name,
        token_hash,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|d| d.with_timezone(&chrono::Utc))
            .unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn insert_and_lookup_by_token_hash() {
        let conn = open_memory_database().unwrap();
        let user = User::new("Layla".into(), "abc123".into());
        insert_user(&conn, &user).unwrap();

        let found = get_user_by_token_hash(&conn, "abc123").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.display_name, "Layla");
    }

    #[test]
    fn unknown_token_hash_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_user_by_token_hash(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn duplicate_token_hash_rejected() {
        let conn = open_memory_database().unwrap();
        insert_user(&conn, &User::new("A".into(), "same".into())).unwrap();
        let result = insert_user(&conn, &User::new("B".into(), "same".into()));
        assert!(result.is_err());
    }
}
