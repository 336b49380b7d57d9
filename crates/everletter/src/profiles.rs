//! Profile accessor: lookups, signup profile setup, updates with username
//! rules, user search, avatars and per-user statistics.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, info_span, warn};

use crate::auth::AuthState;
use crate::config::SearchConfig;
use crate::db::{delivery_repo, letter_repo, profile_repo, Database, DatabaseError};
use crate::error::{EverletterError, Result};
use crate::models::{Profile, ProfileUpdate, UserStats};
use crate::storage::AvatarStore;
use crate::validation::{is_placeholder_username, validate_username};

/// Resolves a recipient username to a profile.
///
/// Every path that turns a letter into a non-draft goes through here before
/// touching the store.
pub fn resolve_recipient(db: &Database, username: &str) -> Result<Profile> {
    let username = username.trim();
    if username.is_empty() {
        return Err(EverletterError::RecipientNotFound);
    }
    profile_repo::find_by_username(db, username)?.ok_or(EverletterError::RecipientNotFound)
}

fn map_unique_violation(e: DatabaseError) -> EverletterError {
    if e.is_constraint_violation() {
        EverletterError::UsernameTaken
    } else {
        EverletterError::Database(e)
    }
}

#[derive(Clone)]
pub struct ProfileService {
    db: Database,
    auth: AuthState,
    avatars: Arc<AvatarStore>,
    search: SearchConfig,
}

impl ProfileService {
    pub fn new(
        db: Database,
        auth: AuthState,
        avatars: Arc<AvatarStore>,
        search: SearchConfig,
    ) -> Self {
        Self {
            db,
            auth,
            avatars,
            search,
        }
    }

    /// Profile of the signed-in user.
    pub fn get_current_profile(&self) -> Result<Profile> {
        let session = self.auth.current_user()?;
        self.get_profile_by_id(&session.user_id)
    }

    pub fn get_profile_by_id(&self, user_id: &str) -> Result<Profile> {
        profile_repo::find_by_id(&self.db, user_id)?.ok_or(EverletterError::UserNotFound)
    }

    pub fn get_profile_by_username(&self, username: &str) -> Result<Profile> {
        profile_repo::find_by_username(&self.db, username)?.ok_or(EverletterError::UserNotFound)
    }

    /// See [`resolve_recipient`].
    pub fn resolve_recipient(&self, username: &str) -> Result<Profile> {
        resolve_recipient(&self.db, username)
    }

    /// Creates the signed-in user's profile during signup.
    pub fn create_profile(&self, username: &str, display_name: &str) -> Result<Profile> {
        let session = self.auth.current_user()?;
        let _span = info_span!("profiles.create", user_id = %session.user_id).entered();

        validate_username(username)?;
        if profile_repo::find_by_id(&self.db, &session.user_id)?.is_some() {
            return Err(EverletterError::ProfileExists);
        }
        if profile_repo::username_taken(&self.db, username, None)? {
            return Err(EverletterError::UsernameTaken);
        }

        let now = Utc::now();
        let display_name = display_name.trim();
        let profile = Profile {
            id: session.user_id.clone(),
            username: username.to_string(),
            display_name: if display_name.is_empty() {
                username.to_string()
            } else {
                display_name.to_string()
            },
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        profile_repo::insert(&self.db, &profile).map_err(map_unique_violation)?;

        info!(username = %profile.username, "Profile created");
        Ok(profile)
    }

    /// Applies `update` to the signed-in user's profile.
    ///
    /// A new username must pass the format rules and be free (ignoring the
    /// user's own profile) before anything is written.
    pub fn update_profile(&self, update: ProfileUpdate) -> Result<Profile> {
        let session = self.auth.current_user()?;
        let _span = info_span!("profiles.update", user_id = %session.user_id).entered();

        if let Some(username) = &update.username {
            validate_username(username)?;
            if profile_repo::username_taken(&self.db, username, Some(&session.user_id))? {
                return Err(EverletterError::UsernameTaken);
            }
        }

        let mut profile = self.get_profile_by_id(&session.user_id)?;
        if let Some(username) = update.username {
            profile.username = username;
        }
        if let Some(display_name) = update.display_name {
            profile.display_name = display_name.trim().to_string();
        }
        if let Some(avatar_url) = update.avatar_url {
            profile.avatar_url = avatar_url;
        }
        profile.updated_at = Utc::now();

        profile_repo::update(&self.db, &profile).map_err(map_unique_violation)?;
        debug!(username = %profile.username, "Profile updated");
        Ok(profile)
    }

    /// Usernames containing `query`. Queries shorter than the configured
    /// minimum return nothing without a store call.
    pub fn search_users(&self, query: &str) -> Result<Vec<Profile>> {
        let query = query.trim();
        if query.chars().count() < self.search.min_query_length {
            return Ok(Vec::new());
        }
        Ok(profile_repo::search(&self.db, query, self.search.limit)?)
    }

    /// False for names that could never be registered.
    pub fn is_username_available(&self, username: &str) -> Result<bool> {
        if validate_username(username).is_err() {
            return Ok(false);
        }
        Ok(!profile_repo::username_taken(&self.db, username, None)?)
    }

    pub fn get_profiles_by_ids(&self, user_ids: &[String]) -> Result<Vec<Profile>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(profile_repo::find_by_ids(&self.db, user_ids)?)
    }

    pub fn get_profiles_by_usernames(&self, usernames: &[String]) -> Result<Vec<Profile>> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }
        Ok(profile_repo::find_by_usernames(&self.db, usernames)?)
    }

    /// Uploads an avatar for the signed-in user and returns its public URL.
    /// The profile itself is not changed; pass the URL to `update_profile`.
    pub fn upload_avatar(&self, file_name: &str, content: &[u8]) -> Result<String> {
        let session = self.auth.current_user()?;
        let _span = info_span!("profiles.upload_avatar", user_id = %session.user_id).entered();
        Ok(self.avatars.upload(&session.user_id, file_name, content)?)
    }

    /// Deletes one of the signed-in user's avatars by URL.
    pub fn delete_avatar(&self, avatar_url: &str) -> Result<()> {
        let session = self.auth.current_user()?;
        Ok(self.avatars.delete(&session.user_id, avatar_url)?)
    }

    /// Letter counts for any user.
    pub fn user_stats(&self, user_id: &str) -> Result<UserStats> {
        Ok(UserStats {
            sent_letters: letter_repo::count_by_author(&self.db, user_id, false)?,
            received_letters: delivery_repo::count_by_recipient(&self.db, user_id)?,
            drafts: letter_repo::count_by_author(&self.db, user_id, true)?,
        })
    }

    /// Whether the signed-in user still has to pick a username.
    ///
    /// Signed-out callers get `false`; lookup failures count as "needs setup".
    pub fn needs_profile_setup(&self) -> bool {
        let Some(session) = self.auth.session() else {
            return false;
        };
        match profile_repo::find_by_id(&self.db, &session.user_id) {
            Ok(Some(profile)) => is_placeholder_username(
                &profile.username,
                &session.user_id,
                session.email.as_deref(),
            ),
            Ok(None) => true,
            Err(e) => {
                warn!("Error checking profile setup status: {}", e);
                true
            }
        }
    }
}
