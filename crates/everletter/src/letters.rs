//! Letter accessor: drafting, sending, scheduling and reading letters.
//!
//! Every write that leaves a letter non-draft resolves its recipient first
//! and aborts before touching the store if the username is unknown. The
//! resolved profile id is stored with the letter and all deliveries go there.

use chrono::{DateTime, Utc};
use tracing::{debug, info, info_span};

use crate::auth::{AuthState, Session};
use crate::db::delivery_repo::{self, ReceivedFilter};
use crate::db::{letter_repo, Database};
use crate::delivery::deliver_letter_on;
use crate::error::{EverletterError, Result};
use crate::mailroom::{MailItem, MailSource, ReadMarker};
use crate::models::{
    DeliveryFrequency, Letter, LetterUpdate, NewLetter, ReceivedLetter, Schedule,
};
use crate::profiles::resolve_recipient;

fn ensure_sendable(title: &str, content: &str) -> Result<()> {
    if title.trim().is_empty() || content.trim().is_empty() {
        return Err(EverletterError::InvalidLetter {
            reason: "A letter needs a title and content before it can be sent".to_string(),
        });
    }
    Ok(())
}

#[derive(Clone)]
pub struct LetterService {
    db: Database,
    auth: AuthState,
}

impl LetterService {
    pub fn new(db: Database, auth: AuthState) -> Self {
        Self { db, auth }
    }

    /// A letter authored by the caller. Other users' letters look missing.
    fn owned_letter(&self, session: &Session, id: &str) -> Result<Letter> {
        match letter_repo::find_by_id(&self.db, id)? {
            Some(letter) if letter.user_id == session.user_id => Ok(letter),
            _ => Err(EverletterError::LetterNotFound(id.to_string())),
        }
    }

    fn owned_draft(&self, session: &Session, id: &str) -> Result<Letter> {
        let letter = self.owned_letter(session, id)?;
        if !letter.is_draft {
            return Err(EverletterError::LetterAlreadySent);
        }
        Ok(letter)
    }

    /// Stores `letter` as sent and runs its first delivery pass in the same
    /// transaction. If either step fails nothing is written.
    fn commit_sent(&self, letter: &Letter, now: DateTime<Utc>, insert: bool) -> Result<()> {
        let created = self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            if insert {
                letter_repo::insert_on(&tx, letter)?;
            } else {
                letter_repo::update_on(&tx, letter)?;
            }
            let created = deliver_letter_on(&tx, letter, now)?;
            tx.commit()?;
            Ok(created)
        })?;
        info!(
            letter_id = %letter.id,
            recipient = %letter.recipient_username,
            delivered = created.unwrap_or(0),
            "Letter sent"
        );
        Ok(())
    }

    /// Creates a letter. A non-draft letter is validated, its recipient
    /// resolved, and it is delivered per its schedule (now if none).
    pub fn create_letter(&self, new: NewLetter) -> Result<Letter> {
        let session = self.auth.current_user()?;
        let _span = info_span!("letters.create", user_id = %session.user_id).entered();

        let recipient = if new.is_draft {
            None
        } else {
            ensure_sendable(&new.title, &new.content)?;
            Some(resolve_recipient(&self.db, &new.recipient_username)?)
        };

        let now = Utc::now();
        let schedule = match (new.schedule, new.is_draft) {
            (None, false) => Some(Schedule::immediate(now)),
            (schedule, _) => schedule,
        };
        let letter = Letter {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: session.user_id,
            title: new.title,
            content: new.content,
            recipient_username: match &recipient {
                Some(profile) => profile.username.clone(),
                None => new.recipient_username.trim().to_string(),
            },
            recipient_id: recipient.map(|profile| profile.id),
            is_draft: new.is_draft,
            schedule,
            tags: new.tags,
            created_at: now,
            updated_at: now,
        };

        if letter.is_draft {
            letter_repo::insert(&self.db, &letter)?;
            debug!(letter_id = %letter.id, "Draft created");
        } else {
            self.commit_sent(&letter, now, true)?;
        }
        Ok(letter)
    }

    /// Creates a draft regardless of `new.is_draft`.
    pub fn save_draft(&self, new: NewLetter) -> Result<Letter> {
        self.create_letter(NewLetter {
            is_draft: true,
            ..new
        })
    }

    /// Sends a draft to `recipient_username` right away.
    pub fn send_letter(&self, id: &str, recipient_username: &str) -> Result<Letter> {
        let session = self.auth.current_user()?;
        let _span = info_span!("letters.send", user_id = %session.user_id, letter_id = %id).entered();

        let mut letter = self.owned_draft(&session, id)?;
        ensure_sendable(&letter.title, &letter.content)?;
        let recipient = resolve_recipient(&self.db, recipient_username)?;

        let now = Utc::now();
        letter.recipient_username = recipient.username;
        letter.recipient_id = Some(recipient.id);
        letter.is_draft = false;
        letter.schedule = Some(Schedule::immediate(now));
        letter.updated_at = now;

        self.commit_sent(&letter, now, false)?;
        Ok(letter)
    }

    /// Schedules a draft for delivery to its stored recipient. Occurrences
    /// already due are delivered immediately.
    pub fn schedule_letter(
        &self,
        id: &str,
        date: DateTime<Utc>,
        frequency: DeliveryFrequency,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Letter> {
        let session = self.auth.current_user()?;
        let _span =
            info_span!("letters.schedule", user_id = %session.user_id, letter_id = %id).entered();

        let schedule = Schedule::new(date, frequency, end_date)?;
        let mut letter = self.owned_draft(&session, id)?;
        ensure_sendable(&letter.title, &letter.content)?;
        let recipient = resolve_recipient(&self.db, &letter.recipient_username)?;

        let now = Utc::now();
        letter.recipient_username = recipient.username;
        letter.recipient_id = Some(recipient.id);
        letter.is_draft = false;
        letter.schedule = Some(schedule);
        letter.updated_at = now;

        self.commit_sent(&letter, now, false)?;
        Ok(letter)
    }

    /// Applies `update` to a draft. If the result is no longer a draft it is
    /// validated and delivered like a freshly sent letter.
    pub fn update_letter(&self, id: &str, update: LetterUpdate) -> Result<Letter> {
        let session = self.auth.current_user()?;
        let _span =
            info_span!("letters.update", user_id = %session.user_id, letter_id = %id).entered();

        let mut letter = self.owned_draft(&session, id)?;
        if let Some(title) = update.title {
            letter.title = title;
        }
        if let Some(content) = update.content {
            letter.content = content;
        }
        if let Some(recipient) = update.recipient_username {
            letter.recipient_username = recipient.trim().to_string();
        }
        if let Some(schedule) = update.schedule {
            letter.schedule = schedule;
        }
        if let Some(tags) = update.tags {
            letter.tags = tags;
        }
        if let Some(is_draft) = update.is_draft {
            letter.is_draft = is_draft;
        }

        let now = Utc::now();
        letter.updated_at = now;

        if letter.is_draft {
            letter_repo::update(&self.db, &letter)?;
            debug!(letter_id = %letter.id, "Draft updated");
            return Ok(letter);
        }

        ensure_sendable(&letter.title, &letter.content)?;
        let recipient = resolve_recipient(&self.db, &letter.recipient_username)?;
        letter.recipient_username = recipient.username;
        letter.recipient_id = Some(recipient.id);
        if letter.schedule.is_none() {
            letter.schedule = Some(Schedule::immediate(now));
        }
        self.commit_sent(&letter, now, false)?;
        Ok(letter)
    }

    /// Deletes one of the caller's drafts. Sent letters stay, since their
    /// deliveries are permanent.
    pub fn delete_letter(&self, id: &str) -> Result<()> {
        let session = self.auth.current_user()?;
        let letter = self.owned_draft(&session, id)?;
        letter_repo::delete(&self.db, &letter.id)?;
        info!(letter_id = %id, "Letter deleted");
        Ok(())
    }

    pub fn get_letter(&self, id: &str) -> Result<Letter> {
        let session = self.auth.current_user()?;
        self.owned_letter(&session, id)
    }

    /// The caller's drafts, newest first.
    pub fn get_drafts(&self) -> Result<Vec<Letter>> {
        let session = self.auth.current_user()?;
        Ok(letter_repo::list_by_author(&self.db, &session.user_id, Some(true))?)
    }

    /// The caller's sent letters, newest first.
    pub fn get_sent_letters(&self) -> Result<Vec<Letter>> {
        let session = self.auth.current_user()?;
        Ok(letter_repo::list_by_author(&self.db, &session.user_id, Some(false))?)
    }

    /// Letters delivered to the caller.
    pub fn get_received_letters(&self, filter: &ReceivedFilter) -> Result<Vec<ReceivedLetter>> {
        let session = self.auth.current_user()?;
        Ok(delivery_repo::query_received(&self.db, &session.user_id, filter)?)
    }

    /// Marks one of the caller's deliveries read. Repeating the call is a
    /// no-op.
    pub fn mark_as_read(&self, delivery_id: &str) -> Result<()> {
        let session = self.auth.current_user()?;
        if !delivery_repo::mark_read(&self.db, delivery_id, &session.user_id)? {
            return Err(EverletterError::DeliveryNotFound(delivery_id.to_string()));
        }
        debug!(delivery_id = %delivery_id, "Marked as read");
        Ok(())
    }

    /// Authored letters (drafts included) followed by received ones.
    pub fn get_all_letters(&self) -> Result<Vec<MailItem>> {
        let session = self.auth.current_user()?;
        let authored = letter_repo::list_by_author(&self.db, &session.user_id, None)?;
        let received =
            delivery_repo::query_received(&self.db, &session.user_id, &ReceivedFilter::default())?;

        Ok(authored
            .into_iter()
            .map(MailItem::from)
            .chain(received.into_iter().map(MailItem::from))
            .collect())
    }
}

impl ReadMarker for LetterService {
    fn mark_as_read(&self, delivery_id: &str) -> Result<()> {
        LetterService::mark_as_read(self, delivery_id)
    }
}

impl MailSource for LetterService {
    fn fetch_mail(&self) -> Result<Vec<MailItem>> {
        self.get_all_letters()
    }
}
