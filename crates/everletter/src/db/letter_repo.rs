//! Letter repository: CRUD operations for the `letters` table.

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{
    encode_tags, format_timestamp, optional_timestamp_column, tags_column, timestamp_column,
    Database, DatabaseError,
};
use crate::models::{DeliveryFrequency, Letter, Schedule};

fn from_row(row: &Row<'_>) -> Result<Letter, rusqlite::Error> {
    let scheduled_date = optional_timestamp_column(row, "scheduled_date")?;
    let frequency: Option<String> = row.get("delivery_frequency")?;
    let end_date = optional_timestamp_column(row, "delivery_end_date")?;

    let schedule = match scheduled_date {
        Some(date) => {
            let frequency = match frequency {
                Some(f) => f.parse::<DeliveryFrequency>().map_err(|e| {
                    let idx = row.as_ref().column_index("delivery_frequency").unwrap_or(0);
                    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
                })?,
                None => DeliveryFrequency::Once,
            };
            Some(Schedule {
                date,
                frequency,
                end_date,
            })
        }
        None => None,
    };

    Ok(Letter {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        recipient_username: row.get("recipient_username")?,
        recipient_id: row.get("recipient_id")?,
        is_draft: row.get("is_draft")?,
        schedule,
        tags: tags_column(row, "tags")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

/// Splits a schedule into its three nullable columns.
fn schedule_columns(schedule: Option<&Schedule>) -> (Option<String>, Option<&str>, Option<String>) {
    match schedule {
        Some(s) => (
            Some(format_timestamp(s.date)),
            Some(s.frequency.as_str()),
            s.end_date.map(format_timestamp),
        ),
        None => (None, None, None),
    }
}

/// Inserts a new letter row.
pub fn insert(db: &Database, letter: &Letter) -> Result<(), DatabaseError> {
    db.with_conn(|conn| insert_on(conn, letter))
}

/// Same as [`insert`], on a connection (or transaction) the caller holds.
pub fn insert_on(conn: &Connection, letter: &Letter) -> Result<(), DatabaseError> {
    let tags = encode_tags(&letter.tags)?;
    let (scheduled_date, frequency, end_date) = schedule_columns(letter.schedule.as_ref());
    conn.execute(
        "INSERT INTO letters (id, user_id, title, content, recipient_username, recipient_id,
         is_draft, scheduled_date, delivery_frequency, delivery_end_date, tags, created_at,
         updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            letter.id,
            letter.user_id,
            letter.title,
            letter.content,
            letter.recipient_username,
            letter.recipient_id,
            letter.is_draft,
            scheduled_date,
            frequency,
            end_date,
            tags,
            format_timestamp(letter.created_at),
            format_timestamp(letter.updated_at),
        ],
    )?;
    Ok(())
}

/// Overwrites every field except `id`, `user_id` and `created_at`.
pub fn update(db: &Database, letter: &Letter) -> Result<(), DatabaseError> {
    db.with_conn(|conn| update_on(conn, letter))
}

/// Same as [`update`], on a connection (or transaction) the caller holds.
pub fn update_on(conn: &Connection, letter: &Letter) -> Result<(), DatabaseError> {
    let tags = encode_tags(&letter.tags)?;
    let (scheduled_date, frequency, end_date) = schedule_columns(letter.schedule.as_ref());
    conn.execute(
        "UPDATE letters SET title = ?2, content = ?3, recipient_username = ?4, recipient_id = ?5,
         is_draft = ?6, scheduled_date = ?7, delivery_frequency = ?8, delivery_end_date = ?9,
         tags = ?10, updated_at = ?11
         WHERE id = ?1",
        params![
            letter.id,
            letter.title,
            letter.content,
            letter.recipient_username,
            letter.recipient_id,
            letter.is_draft,
            scheduled_date,
            frequency,
            end_date,
            tags,
            format_timestamp(letter.updated_at),
        ],
    )?;
    Ok(())
}

/// Finds a letter by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<Letter>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row("SELECT * FROM letters WHERE id = ?1", params![id], from_row)
            .optional()?)
    })
}

/// Deletes a letter. The foreign key refuses letters that already have
/// delivery records. Returns whether a row was removed.
pub fn delete(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let count = conn.execute("DELETE FROM letters WHERE id = ?1", params![id])?;
        Ok(count > 0)
    })
}

/// Letters written by `user_id`, newest first. `is_draft` narrows to drafts
/// or sent letters.
pub fn list_by_author(
    db: &Database,
    user_id: &str,
    is_draft: Option<bool>,
) -> Result<Vec<Letter>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM letters WHERE user_id = ?1 AND (?2 IS NULL OR is_draft = ?2)
             ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map(params![user_id, is_draft], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts letters by author and draft state.
pub fn count_by_author(db: &Database, user_id: &str, is_draft: bool) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM letters WHERE user_id = ?1 AND is_draft = ?2",
            params![user_id, is_draft],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

/// Sent letters whose first delivery is at or before `until` (RFC 3339).
pub fn list_deliverable(db: &Database, until: &str) -> Result<Vec<Letter>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM letters
             WHERE is_draft = 0 AND scheduled_date IS NOT NULL AND scheduled_date <= ?1
             ORDER BY scheduled_date",
        )?;
        let rows = stmt
            .query_map(params![until], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn sample_letter(id: &str, is_draft: bool) -> Letter {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Letter {
            id: id.to_string(),
            user_id: "u1".to_string(),
            title: "Letter to Anna".to_string(),
            content: "Thinking of you".to_string(),
            recipient_username: "anna".to_string(),
            recipient_id: (!is_draft).then(|| "u2".to_string()),
            is_draft,
            schedule: None,
            tags: vec!["family".to_string()],
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        insert(&db, &sample_letter("l1", true)).unwrap();

        let found = find_by_id(&db, "l1").unwrap().unwrap();
        assert_eq!(found, sample_letter("l1", true));
        assert!(find_by_id(&db, "nope").unwrap().is_none());
    }

    #[test]
    fn test_update_with_schedule() {
        let db = test_db();
        let mut letter = sample_letter("l2", true);
        insert(&db, &letter).unwrap();

        let start = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        letter.is_draft = false;
        letter.recipient_id = Some("u2".to_string());
        letter.schedule = Some(Schedule {
            date: start,
            frequency: DeliveryFrequency::Weekly,
            end_date: Some(start + Duration::days(30)),
        });
        letter.tags.push("birthday".to_string());
        update(&db, &letter).unwrap();

        let found = find_by_id(&db, "l2").unwrap().unwrap();
        assert!(!found.is_draft);
        assert_eq!(found.recipient_id.as_deref(), Some("u2"));
        assert_eq!(found.schedule, letter.schedule);
        assert_eq!(found.tags, vec!["family", "birthday"]);
    }

    #[test]
    fn test_list_and_count_by_author() {
        let db = test_db();
        let mut older = sample_letter("a", false);
        older.created_at = Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap();
        insert(&db, &older).unwrap();
        insert(&db, &sample_letter("b", false)).unwrap();
        insert(&db, &sample_letter("c", true)).unwrap();

        let sent = list_by_author(&db, "u1", Some(false)).unwrap();
        let ids: Vec<_> = sent.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        assert_eq!(list_by_author(&db, "u1", None).unwrap().len(), 3);
        assert_eq!(count_by_author(&db, "u1", true).unwrap(), 1);
        assert_eq!(count_by_author(&db, "u1", false).unwrap(), 2);
        assert_eq!(count_by_author(&db, "u9", false).unwrap(), 0);
    }

    #[test]
    fn test_delete() {
        let db = test_db();
        insert(&db, &sample_letter("d1", true)).unwrap();
        assert!(delete(&db, "d1").unwrap());
        assert!(!delete(&db, "d1").unwrap());
    }

    #[test]
    fn test_list_deliverable_skips_drafts_and_future() {
        let db = test_db();
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();

        let mut due = sample_letter("due", false);
        due.schedule = Some(Schedule::immediate(now - Duration::days(1)));
        insert(&db, &due).unwrap();

        let mut future = sample_letter("future", false);
        future.schedule = Some(Schedule::immediate(now + Duration::days(1)));
        insert(&db, &future).unwrap();

        let mut draft = sample_letter("draft", true);
        draft.schedule = Some(Schedule::immediate(now - Duration::days(1)));
        insert(&db, &draft).unwrap();

        let found = list_deliverable(&db, &format_timestamp(now)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "due");
    }
}
