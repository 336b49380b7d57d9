//! Wiring of the services around one database and session.

use std::sync::Arc;

use crate::auth::AuthState;
use crate::config::Config;
use crate::db::Database;
use crate::delivery::DeliveryScheduler;
use crate::error::{ConfigError, Result};
use crate::letters::LetterService;
use crate::profiles::ProfileService;
use crate::storage::AvatarStore;

/// Everything a front end needs, sharing one store and one session.
#[derive(Clone)]
pub struct Everletter {
    pub config: Config,
    pub db: Database,
    pub auth: AuthState,
    pub profiles: ProfileService,
    pub letters: LetterService,
    pub scheduler: DeliveryScheduler,
}

impl Everletter {
    /// Opens the configured database (running migrations) and builds the
    /// services.
    pub fn open(config: Config) -> Result<Self> {
        let path = config
            .resolved_database_path()
            .ok_or_else(|| ConfigError::Validation {
                message: "database_path is not set and no home directory was found".to_string(),
            })?;
        let db = Database::open(&path)?;
        Ok(Self::with_database(config, db))
    }

    /// Builds the services on an already opened database.
    pub fn with_database(config: Config, db: Database) -> Self {
        let auth = AuthState::new();
        let avatars = Arc::new(AvatarStore::new(&config.avatars));
        let profiles = ProfileService::new(
            db.clone(),
            auth.clone(),
            avatars,
            config.search.clone(),
        );
        let letters = LetterService::new(db.clone(), auth.clone());
        let scheduler = DeliveryScheduler::new(db.clone());

        Self {
            config,
            db,
            auth,
            profiles,
            letters,
            scheduler,
        }
    }
}
