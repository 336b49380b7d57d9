//! Profile repository: CRUD operations for the `profiles` table.
//!
//! `username` is declared `COLLATE NOCASE`, so every equality lookup here
//! is case-insensitive.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{format_timestamp, like_pattern, timestamp_column, Database, DatabaseError};
use crate::models::Profile;

fn from_row(row: &Row<'_>) -> Result<Profile, rusqlite::Error> {
    Ok(Profile {
        id: row.get("id")?,
        username: row.get("username")?,
        display_name: row.get("display_name")?,
        avatar_url: row.get("avatar_url")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

/// Inserts a new profile row.
pub fn insert(db: &Database, profile: &Profile) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO profiles (id, username, display_name, avatar_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                profile.id,
                profile.username,
                profile.display_name,
                profile.avatar_url,
                format_timestamp(profile.created_at),
                format_timestamp(profile.updated_at),
            ],
        )?;
        Ok(())
    })
}

/// Overwrites every field except `id` and `created_at`.
pub fn update(db: &Database, profile: &Profile) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE profiles SET username = ?2, display_name = ?3, avatar_url = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                profile.id,
                profile.username,
                profile.display_name,
                profile.avatar_url,
                format_timestamp(profile.updated_at),
            ],
        )?;
        Ok(())
    })
}

/// Finds a profile by user id.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<Profile>, DatabaseError> {
    db.with_conn(|conn| find_by_id_on(conn, id))
}

pub fn find_by_id_on(conn: &Connection, id: &str) -> Result<Option<Profile>, DatabaseError> {
    Ok(conn
        .query_row("SELECT * FROM profiles WHERE id = ?1", params![id], from_row)
        .optional()?)
}

/// Finds a profile by username (case-insensitive).
pub fn find_by_username(db: &Database, username: &str) -> Result<Option<Profile>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM profiles WHERE username = ?1",
                params![username],
                from_row,
            )
            .optional()?)
    })
}

/// Whether `username` belongs to a profile other than `exclude_id`.
pub fn username_taken(
    db: &Database,
    username: &str,
    exclude_id: Option<&str>,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM profiles WHERE username = ?1 AND (?2 IS NULL OR id != ?2)",
            params![username, exclude_id],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    })
}

/// Profiles whose username contains `query`, alphabetical, at most `limit`.
pub fn search(db: &Database, query: &str, limit: u32) -> Result<Vec<Profile>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM profiles WHERE username LIKE ?1 ESCAPE '\\'
             ORDER BY username LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![like_pattern(query), limit], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Profiles whose `column` value is in `values`.
fn find_in(
    db: &Database,
    column: &'static str,
    values: &[String],
) -> Result<Vec<Profile>, DatabaseError> {
    if values.is_empty() {
        return Ok(Vec::new());
    }

    db.with_conn(|conn| {
        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "SELECT * FROM profiles WHERE {} IN ({}) ORDER BY username",
            column,
            placeholders.join(", ")
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Profiles for the given user ids. Unknown ids are skipped.
pub fn find_by_ids(db: &Database, ids: &[String]) -> Result<Vec<Profile>, DatabaseError> {
    find_in(db, "id", ids)
}

/// Profiles for the given usernames. Unknown names are skipped.
pub fn find_by_usernames(
    db: &Database,
    usernames: &[String],
) -> Result<Vec<Profile>, DatabaseError> {
    find_in(db, "username", usernames)
}
