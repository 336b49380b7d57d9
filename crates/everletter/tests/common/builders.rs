//! Builder patterns for creating test data programmatically.
//!
//! These builders allow creating letters and configurations without
//! repetitive boilerplate code.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use everletter::config::{AvatarConfig, LogFormat, LoggingConfig, SearchConfig};
use everletter::{Config, DeliveryFrequency, NewLetter, Schedule};

/// Builder for creating `Config` instances rooted in a temp directory.
pub struct ConfigBuilder {
    database_path: PathBuf,
    avatars: AvatarConfig,
    search: SearchConfig,
    logging: LoggingConfig,
}

impl ConfigBuilder {
    /// Create a new builder with sensible defaults for testing.
    pub fn new(root: &Path) -> Self {
        Self {
            database_path: root.join("data").join("everletter.db"),
            avatars: AvatarConfig {
                directory: root.join("objects"),
                public_base_url: "https://cdn.example.com/storage".to_string(),
                max_bytes: 1024,
                allowed_extensions: vec!["png".to_string(), "jpg".to_string()],
            },
            search: SearchConfig::default(),
            logging: LoggingConfig {
                level: "warn".to_string(),
                format: LogFormat::Text,
            },
        }
    }

    /// Set the avatar size limit.
    pub fn max_avatar_bytes(mut self, bytes: usize) -> Self {
        self.avatars.max_bytes = bytes;
        self
    }

    /// Set the user search limits.
    pub fn search(mut self, min_query_length: usize, limit: u32) -> Self {
        self.search = SearchConfig {
            min_query_length,
            limit,
        };
        self
    }

    /// Build the config.
    pub fn build(self) -> Config {
        Config {
            version: "1.0".to_string(),
            database_path: Some(self.database_path),
            avatars: self.avatars,
            search: self.search,
            logging: self.logging,
        }
    }
}

/// Builder for creating `NewLetter` instances.
pub struct LetterBuilder {
    letter: NewLetter,
}

impl LetterBuilder {
    /// A sendable draft with a title and content.
    pub fn new(title: &str) -> Self {
        Self {
            letter: NewLetter {
                title: title.to_string(),
                content: format!("Content of {}", title),
                is_draft: true,
                ..Default::default()
            },
        }
    }

    /// Set the content.
    pub fn content(mut self, content: &str) -> Self {
        self.letter.content = content.to_string();
        self
    }

    /// Set the recipient username.
    pub fn to(mut self, username: &str) -> Self {
        self.letter.recipient_username = username.to_string();
        self
    }

    /// Add a tag.
    pub fn tag(mut self, tag: &str) -> Self {
        self.letter.tags.push(tag.to_string());
        self
    }

    /// Mark as ready to send instead of a draft.
    pub fn sent(mut self) -> Self {
        self.letter.is_draft = false;
        self
    }

    /// Attach a schedule.
    pub fn scheduled(
        mut self,
        date: DateTime<Utc>,
        frequency: DeliveryFrequency,
        end_date: Option<DateTime<Utc>>,
    ) -> Self {
        self.letter.schedule =
            Some(Schedule::new(date, frequency, end_date).expect("Invalid schedule"));
        self
    }

    /// Build the letter input.
    pub fn build(self) -> NewLetter {
        self.letter
    }
}
