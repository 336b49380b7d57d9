//! Delivery repository: the append-only `received_letters` table and the
//! `received_letters_view` join used to read it.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{format_timestamp, like_pattern, tags_column, timestamp_column, Database, DatabaseError};
use crate::models::{ReceivedLetter, SortDirection};

/// A delivery record to be appended.
#[derive(Debug, Clone)]
pub struct NewDelivery {
    pub id: String,
    pub original_letter_id: String,
    pub recipient_id: String,
    pub sender_id: String,
    pub received_at: DateTime<Utc>,
    pub delivery_sequence: u32,
}

/// Sort column for received letters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceivedSort {
    #[default]
    ReceivedAt,
    Title,
    SenderDisplayName,
}

impl ReceivedSort {
    fn order_expr(&self) -> &'static str {
        match self {
            ReceivedSort::ReceivedAt => "received_at",
            ReceivedSort::Title => "title COLLATE NOCASE",
            ReceivedSort::SenderDisplayName => "sender_display_name COLLATE NOCASE",
        }
    }
}

/// Read-state filter for received letters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadFilter {
    #[default]
    All,
    Read,
    Unread,
}

/// Query parameters for listing a recipient's letters.
#[derive(Debug, Clone, Default)]
pub struct ReceivedFilter {
    pub sort: ReceivedSort,
    pub direction: SortDirection,
    pub read: ReadFilter,
    /// Case-insensitive substring over title, content and sender names.
    pub search: Option<String>,
}

fn from_row(row: &Row<'_>) -> Result<ReceivedLetter, rusqlite::Error> {
    Ok(ReceivedLetter {
        id: row.get("id")?,
        original_letter_id: row.get("original_letter_id")?,
        recipient_id: row.get("recipient_id")?,
        sender_id: row.get("sender_id")?,
        received_at: timestamp_column(row, "received_at")?,
        read: row.get("read")?,
        delivery_sequence: row.get("delivery_sequence")?,
        title: row.get("title")?,
        content: row.get("content")?,
        tags: tags_column(row, "tags")?,
        recipient_username: row.get("recipient_username")?,
        sender_username: row.get("sender_username")?,
        sender_display_name: row.get("sender_display_name")?,
    })
}

/// Appends delivery records in one transaction, skipping any whose
/// `(original_letter_id, delivery_sequence)` already exists.
/// Returns the number of records actually created.
pub fn insert_missing(db: &Database, deliveries: &[NewDelivery]) -> Result<usize, DatabaseError> {
    if deliveries.is_empty() {
        return Ok(0);
    }

    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        let created = insert_missing_on(&tx, deliveries)?;
        tx.commit()?;
        Ok(created)
    })
}

/// Same as [`insert_missing`] without opening a transaction; the caller owns it.
pub fn insert_missing_on(
    conn: &Connection,
    deliveries: &[NewDelivery],
) -> Result<usize, DatabaseError> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO received_letters
         (id, original_letter_id, recipient_id, sender_id, received_at, read, delivery_sequence)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
    )?;
    let mut created = 0;
    for d in deliveries {
        created += stmt.execute(params![
            d.id,
            d.original_letter_id,
            d.recipient_id,
            d.sender_id,
            format_timestamp(d.received_at),
            d.delivery_sequence,
        ])?;
    }
    Ok(created)
}

/// Highest delivery sequence recorded for a letter, 0 if none.
pub fn max_sequence(db: &Database, letter_id: &str) -> Result<u32, DatabaseError> {
    db.with_conn(|conn| max_sequence_on(conn, letter_id))
}

pub fn max_sequence_on(conn: &Connection, letter_id: &str) -> Result<u32, DatabaseError> {
    let max: u32 = conn.query_row(
        "SELECT COALESCE(MAX(delivery_sequence), 0) FROM received_letters
         WHERE original_letter_id = ?1",
        params![letter_id],
        |r| r.get(0),
    )?;
    Ok(max)
}

/// Finds one received letter through the view.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<ReceivedLetter>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM received_letters_view WHERE id = ?1",
                params![id],
                from_row,
            )
            .optional()?)
    })
}

/// Lists letters delivered to `recipient_id`.
pub fn query_received(
    db: &Database,
    recipient_id: &str,
    filter: &ReceivedFilter,
) -> Result<Vec<ReceivedLetter>, DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = vec!["recipient_id = ?1".to_string()];
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> =
            vec![Box::new(recipient_id.to_string())];

        match filter.read {
            ReadFilter::All => {}
            ReadFilter::Read => conditions.push("read = 1".to_string()),
            ReadFilter::Unread => conditions.push("read = 0".to_string()),
        }

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let n = param_values.len() + 1;
            conditions.push(format!(
                "(title LIKE ?{n} ESCAPE '\\' OR content LIKE ?{n} ESCAPE '\\'
                  OR sender_display_name LIKE ?{n} ESCAPE '\\'
                  OR sender_username LIKE ?{n} ESCAPE '\\')"
            ));
            param_values.push(Box::new(like_pattern(search.trim())));
        }

        let direction = match filter.direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        let sql = format!(
            "SELECT * FROM received_letters_view WHERE {} ORDER BY {} {}, delivery_sequence {}",
            conditions.join(" AND "),
            filter.sort.order_expr(),
            direction,
            direction
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_ref.as_slice(), from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Sets the read flag on a delivery owned by `recipient_id`.
/// Returns false when no such delivery exists for that recipient.
pub fn mark_read(db: &Database, id: &str, recipient_id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let count = conn.execute(
            "UPDATE received_letters SET read = 1 WHERE id = ?1 AND recipient_id = ?2",
            params![id, recipient_id],
        )?;
        Ok(count > 0)
    })
}

/// Counts deliveries received by a user.
pub fn count_by_recipient(db: &Database, recipient_id: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM received_letters WHERE recipient_id = ?1",
            params![recipient_id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
