//! Mailroom view model.
//!
//! Holds every letter visible to the signed-in user (authored ones, drafts
//! included, plus deliveries addressed to them) and derives the visible list
//! from a tab, a free-text query and a sort. The derivation is a pure
//! function of its inputs; the only side effect is marking a received letter
//! read when it is first selected.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Letter, ReceivedLetter, Schedule, SortDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailKind {
    Sent,
    Received,
}

/// One row of the mailroom list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MailItem {
    /// Letter id for authored letters, delivery id for received ones.
    pub id: String,
    pub letter_id: String,
    pub kind: MailKind,
    pub title: String,
    pub content: String,
    /// Recipient username for authored letters, sender name for received.
    pub correspondent: String,
    /// Creation time for authored letters, delivery time for received.
    pub date: DateTime<Utc>,
    pub is_draft: bool,
    pub read: bool,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_sequence: Option<u32>,
}

impl From<Letter> for MailItem {
    fn from(letter: Letter) -> Self {
        Self {
            letter_id: letter.id.clone(),
            id: letter.id,
            kind: MailKind::Sent,
            title: letter.title,
            content: letter.content,
            correspondent: letter.recipient_username,
            date: letter.created_at,
            is_draft: letter.is_draft,
            read: true,
            tags: letter.tags,
            schedule: letter.schedule,
            delivery_sequence: None,
        }
    }
}

impl From<ReceivedLetter> for MailItem {
    fn from(received: ReceivedLetter) -> Self {
        let correspondent = received.sender_name().to_string();
        Self {
            id: received.id,
            letter_id: received.original_letter_id,
            kind: MailKind::Received,
            title: received.title,
            content: received.content,
            correspondent,
            date: received.received_at,
            is_draft: false,
            read: received.read,
            tags: received.tags,
            schedule: None,
            delivery_sequence: Some(received.delivery_sequence),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    All,
    Sent,
    Received,
    Drafts,
}

impl Tab {
    pub fn includes(&self, item: &MailItem) -> bool {
        match self {
            Tab::All => true,
            Tab::Sent => item.kind == MailKind::Sent && !item.is_draft,
            Tab::Received => item.kind == MailKind::Received,
            Tab::Drafts => item.kind == MailKind::Sent && item.is_draft,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Date,
    Title,
    Correspondent,
}

/// What the user picked in the mailroom toolbar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailroomQuery {
    pub tab: Tab,
    pub query: String,
    pub sort: SortKey,
    pub direction: SortDirection,
}

fn matches_query(item: &MailItem, needle: &str) -> bool {
    needle.is_empty()
        || item.title.to_lowercase().contains(needle)
        || item.correspondent.to_lowercase().contains(needle)
        || item.content.to_lowercase().contains(needle)
}

fn compare(a: &MailItem, b: &MailItem, key: SortKey) -> Ordering {
    match key {
        SortKey::Date => a.date.cmp(&b.date),
        SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::Correspondent => a
            .correspondent
            .to_lowercase()
            .cmp(&b.correspondent.to_lowercase()),
    }
}

/// Applies tab, query and sort. Items that compare equal keep their input
/// order in either direction.
pub fn filter_mail<'a>(items: &'a [MailItem], query: &MailroomQuery) -> Vec<&'a MailItem> {
    let needle = query.query.trim().to_lowercase();
    let mut visible: Vec<&MailItem> = items
        .iter()
        .filter(|item| query.tab.includes(item))
        .filter(|item| matches_query(item, &needle))
        .collect();

    // `sort_by` is stable.
    visible.sort_by(|a, b| match query.direction {
        SortDirection::Ascending => compare(a, b, query.sort),
        SortDirection::Descending => compare(b, a, query.sort),
    });
    visible
}

/// Backend call that flags a delivery as read.
pub trait ReadMarker {
    fn mark_as_read(&self, delivery_id: &str) -> Result<()>;
}

/// Source of the full mailroom list.
pub trait MailSource {
    fn fetch_mail(&self) -> Result<Vec<MailItem>>;
}

#[derive(Debug, Clone, Default)]
pub struct Mailroom {
    items: Vec<MailItem>,
}

impl Mailroom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<MailItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[MailItem] {
        &self.items
    }

    /// Replaces the held list wholesale.
    pub fn replace(&mut self, items: Vec<MailItem>) {
        self.items = items;
    }

    /// Fetches and replaces the held list. On error the old list is kept.
    pub fn refresh<S: MailSource + ?Sized>(&mut self, source: &S) -> Result<()> {
        let items = source.fetch_mail()?;
        tracing::debug!(count = items.len(), "Mailroom refreshed");
        self.replace(items);
        Ok(())
    }

    pub fn view(&self, query: &MailroomQuery) -> Vec<&MailItem> {
        filter_mail(&self.items, query)
    }

    pub fn unread_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.kind == MailKind::Received && !i.read)
            .count()
    }

    /// Opens an item. An unread received letter is marked read through
    /// `marker` the first time; later selections make no call.
    pub fn select<M: ReadMarker + ?Sized>(
        &mut self,
        id: &str,
        marker: &M,
    ) -> Result<Option<&MailItem>> {
        let Some(index) = self.items.iter().position(|i| i.id == id) else {
            return Ok(None);
        };

        let item = &mut self.items[index];
        if item.kind == MailKind::Received && !item.read {
            marker.mark_as_read(&item.id)?;
            item.read = true;
        }
        Ok(Some(&self.items[index]))
    }
}
