//! Turns sent letters into delivery records.
//!
//! Each occurrence of a letter's schedule that has come due becomes one
//! append-only row in `received_letters`, numbered by its 1-based sequence.
//! Passes are idempotent: the `(letter, sequence)` key is unique.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::db::delivery_repo::{self, NewDelivery};
use crate::db::{format_timestamp, letter_repo, profile_repo, Database, DatabaseError};
use crate::error::Result;
use crate::models::Letter;

/// Outcome of one delivery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub letters_checked: usize,
    pub deliveries_created: usize,
    /// Letters whose recipient profile no longer exists.
    pub recipients_missing: usize,
}

#[derive(Clone)]
pub struct DeliveryScheduler {
    db: Database,
}

impl DeliveryScheduler {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Delivers every occurrence due at `now` across all sent letters.
    pub fn deliver_due(&self, now: DateTime<Utc>) -> Result<DeliveryReport> {
        let _span = info_span!("delivery.deliver_due").entered();

        let letters = letter_repo::list_deliverable(&self.db, &format_timestamp(now))?;
        let mut report = DeliveryReport {
            letters_checked: letters.len(),
            ..Default::default()
        };

        for letter in &letters {
            match self.deliver_letter(letter, now)? {
                Some(created) => report.deliveries_created += created,
                None => report.recipients_missing += 1,
            }
        }

        if report.deliveries_created > 0 {
            info!(
                created = report.deliveries_created,
                checked = report.letters_checked,
                "Delivery pass complete"
            );
        } else {
            debug!(checked = report.letters_checked, "Delivery pass found nothing due");
        }
        Ok(report)
    }

    /// Delivers the due occurrences of one letter in its own transaction.
    ///
    /// Returns the number of records created, or `None` when the recipient
    /// profile is gone.
    pub fn deliver_letter(&self, letter: &Letter, now: DateTime<Utc>) -> Result<Option<usize>> {
        Ok(self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let created = deliver_letter_on(&tx, letter, now)?;
            tx.commit()?;
            Ok(created)
        })?)
    }
}

/// Appends the due, not yet delivered occurrences of `letter` using a
/// connection the caller holds, so the write can share the caller's
/// transaction.
///
/// Deliveries go to the profile id stored when the letter was sent, never to
/// whoever holds the username now.
pub fn deliver_letter_on(
    conn: &Connection,
    letter: &Letter,
    now: DateTime<Utc>,
) -> std::result::Result<Option<usize>, DatabaseError> {
    let schedule = match (&letter.schedule, letter.is_draft) {
        (Some(schedule), false) => schedule,
        _ => return Ok(Some(0)),
    };

    let recipient = match letter.recipient_id.as_deref() {
        Some(id) => profile_repo::find_by_id_on(conn, id)?,
        None => None,
    };
    let Some(recipient) = recipient else {
        warn!(
            letter_id = %letter.id,
            recipient_id = ?letter.recipient_id,
            "Skipping delivery: recipient profile not found"
        );
        return Ok(None);
    };

    let delivered = delivery_repo::max_sequence_on(conn, &letter.id)?;
    let pending: Vec<NewDelivery> = schedule
        .due_occurrences(now)
        .into_iter()
        .filter(|(sequence, _)| *sequence > delivered)
        .map(|(sequence, at)| NewDelivery {
            id: uuid::Uuid::new_v4().to_string(),
            original_letter_id: letter.id.clone(),
            recipient_id: recipient.id.clone(),
            sender_id: letter.user_id.clone(),
            received_at: at,
            delivery_sequence: sequence,
        })
        .collect();

    let created = delivery_repo::insert_missing_on(conn, &pending)?;
    if created > 0 {
        debug!(letter_id = %letter.id, created, "Delivered letter occurrences");
    }
    Ok(Some(created))
}
