//! Test harness for isolated test execution.
//!
//! The `TestHarness` struct owns a temporary directory holding an on-disk
//! SQLite database and an avatar store, and the fully wired services on top.

#![allow(dead_code)]

use std::path::Path;

use tempfile::TempDir;

use everletter::{Config, Everletter, MailItem, Profile, Session};

use super::builders::ConfigBuilder;

/// Test harness providing isolated execution environment for integration tests.
pub struct TestHarness {
    /// Temporary directory containing the database and avatar objects.
    temp_dir: TempDir,
    /// The wired application.
    pub app: Everletter,
}

impl TestHarness {
    /// Create a new harness with a default configuration.
    pub fn new() -> Self {
        Self::with_config(|builder| builder)
    }

    /// Create a harness, letting the caller adjust the configuration.
    pub fn with_config<F>(configure: F) -> Self
    where
        F: FnOnce(ConfigBuilder) -> ConfigBuilder,
    {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config: Config = configure(ConfigBuilder::new(temp_dir.path())).build();
        let app = Everletter::open(config).expect("Failed to open everletter");
        Self { temp_dir, app }
    }

    /// Get the base temp directory path.
    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Sign in as `user_id` without touching profiles.
    pub fn sign_in(&self, user_id: &str) {
        self.app.auth.sign_in(Session::new(user_id, None));
    }

    /// Sign in as `user_id` and create their profile.
    pub fn register(&self, user_id: &str, username: &str) -> Profile {
        self.sign_in(user_id);
        self.app
            .profiles
            .create_profile(username, "")
            .expect("Failed to create profile")
    }

    /// Register with a display name.
    pub fn register_named(&self, user_id: &str, username: &str, display_name: &str) -> Profile {
        self.sign_in(user_id);
        self.app
            .profiles
            .create_profile(username, display_name)
            .expect("Failed to create profile")
    }

    /// Everything the signed-in user would see in the mailroom.
    pub fn mailroom_items(&self) -> Vec<MailItem> {
        self.app
            .letters
            .get_all_letters()
            .expect("Failed to fetch letters")
    }

    /// Counts rows in the letters table, bypassing ownership rules.
    pub fn letter_row_count(&self) -> i64 {
        self.app
            .db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM letters", [], |r| r.get(0))?)
            })
            .expect("Failed to count letters")
    }

    /// Counts rows in the received_letters table.
    pub fn delivery_row_count(&self) -> i64 {
        self.app
            .db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM received_letters", [], |r| r.get(0))?)
            })
            .expect("Failed to count deliveries")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
