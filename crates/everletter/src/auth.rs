//! Authenticated session state.
//!
//! Sign-in itself happens at the hosted identity provider; this only keeps
//! the resulting session so that every accessor can ask who is calling.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{EverletterError, Result};

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email,
        }
    }
}

/// Shared handle to the current session. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    session: Arc<RwLock<Option<Session>>>,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State that starts signed in.
    pub fn signed_in(session: Session) -> Self {
        let state = Self::new();
        state.sign_in(session);
        state
    }

    pub fn sign_in(&self, session: Session) {
        tracing::info!(user_id = %session.user_id, "Signed in");
        match self.session.write() {
            Ok(mut guard) => *guard = Some(session),
            Err(poisoned) => *poisoned.into_inner() = Some(session),
        }
    }

    pub fn sign_out(&self) {
        match self.session.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    /// The signed-in user, if any.
    pub fn session(&self) -> Option<Session> {
        match self.session.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The signed-in user, or `NotAuthenticated`.
    pub fn current_user(&self) -> Result<Session> {
        self.session().ok_or(EverletterError::NotAuthenticated)
    }
}
