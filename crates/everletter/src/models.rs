//! Records shared by the store accessors and the mailroom.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{EverletterError, Result};

/// A user's public profile. `id` is the authenticated user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub display_name: Option<String>,
    /// `Some(None)` clears the avatar.
    pub avatar_url: Option<Option<String>>,
}

/// Letter counts shown on the profile page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub sent_letters: u64,
    pub received_letters: u64,
    pub drafts: u64,
}

#[derive(Debug, Error)]
#[error("Unknown delivery frequency: {0}")]
pub struct UnknownFrequency(pub String);

/// How often a sent letter is delivered again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryFrequency {
    #[default]
    Once,
    Daily,
    Weekly,
    Monthly,
}

impl DeliveryFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryFrequency::Once => "once",
            DeliveryFrequency::Daily => "daily",
            DeliveryFrequency::Weekly => "weekly",
            DeliveryFrequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for DeliveryFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryFrequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "once" => Ok(DeliveryFrequency::Once),
            "daily" => Ok(DeliveryFrequency::Daily),
            "weekly" => Ok(DeliveryFrequency::Weekly),
            "monthly" => Ok(DeliveryFrequency::Monthly),
            other => Err(UnknownFrequency(other.to_string())),
        }
    }
}

/// When a letter is delivered: a first date, a recurrence, and an optional
/// last date after which no further occurrence is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub date: DateTime<Utc>,
    pub frequency: DeliveryFrequency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl Schedule {
    /// Builds a validated schedule. A one-off delivery never keeps an end date.
    pub fn new(
        date: DateTime<Utc>,
        frequency: DeliveryFrequency,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let end_date = match frequency {
            DeliveryFrequency::Once => None,
            _ => end_date,
        };
        if let Some(end) = end_date {
            if end < date {
                return Err(EverletterError::InvalidSchedule {
                    reason: "end date precedes the first delivery date".to_string(),
                });
            }
        }
        Ok(Self {
            date,
            frequency,
            end_date,
        })
    }

    /// One delivery, right now.
    pub fn immediate(now: DateTime<Utc>) -> Self {
        Self {
            date: now,
            frequency: DeliveryFrequency::Once,
            end_date: None,
        }
    }

    /// Delivery time of the 1-based `sequence`-th occurrence, if it exists.
    ///
    /// Every occurrence is computed from `date` directly, so monthly schedules
    /// starting on the 31st clamp per month instead of drifting.
    pub fn occurrence(&self, sequence: u32) -> Option<DateTime<Utc>> {
        let steps = sequence.checked_sub(1)?;
        let at = match self.frequency {
            DeliveryFrequency::Once if steps == 0 => Some(self.date),
            DeliveryFrequency::Once => None,
            DeliveryFrequency::Daily => self
                .date
                .checked_add_signed(Duration::days(i64::from(steps))),
            DeliveryFrequency::Weekly => self
                .date
                .checked_add_signed(Duration::weeks(i64::from(steps))),
            DeliveryFrequency::Monthly => self.date.checked_add_months(Months::new(steps)),
        }?;
        match self.end_date {
            Some(end) if at > end => None,
            _ => Some(at),
        }
    }

    /// All occurrences at or before `now`, as `(sequence, delivery time)`.
    pub fn due_occurrences(&self, now: DateTime<Utc>) -> Vec<(u32, DateTime<Utc>)> {
        let mut due = Vec::new();
        let mut sequence = 1;
        while let Some(at) = self.occurrence(sequence) {
            if at > now {
                break;
            }
            due.push((sequence, at));
            sequence += 1;
        }
        due
    }
}

/// A letter as stored for its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Letter {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub recipient_username: String,
    /// Profile id resolved when the letter was sent. Deliveries go here even
    /// if the username later changes hands. `None` for drafts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    pub is_draft: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new letter.
#[derive(Debug, Clone, Default)]
pub struct NewLetter {
    pub title: String,
    pub content: String,
    pub recipient_username: String,
    pub schedule: Option<Schedule>,
    pub tags: Vec<String>,
    pub is_draft: bool,
}

/// Partial letter update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct LetterUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub recipient_username: Option<String>,
    /// `Some(None)` removes the schedule.
    pub schedule: Option<Option<Schedule>>,
    pub tags: Option<Vec<String>>,
    pub is_draft: Option<bool>,
}

/// One delivery of a letter to its recipient, joined with the letter body and
/// the sender's profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceivedLetter {
    pub id: String,
    pub original_letter_id: String,
    pub recipient_id: String,
    pub sender_id: String,
    pub received_at: DateTime<Utc>,
    pub read: bool,
    pub delivery_sequence: u32,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub recipient_username: String,
    pub sender_username: Option<String>,
    pub sender_display_name: Option<String>,
}

impl ReceivedLetter {
    /// Display name, then username, then "Unknown".
    pub fn sender_name(&self) -> &str {
        [&self.sender_display_name, &self.sender_username]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or("Unknown")
    }
}

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}
