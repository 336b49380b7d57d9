pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod delivery;
pub mod error;
pub mod letters;
pub mod mailroom;
pub mod models;
pub mod profiles;
pub mod storage;
pub mod telemetry;
pub mod validation;

pub use app::Everletter;
pub use auth::{AuthState, Session};
pub use config::{load_config, load_config_from_str, Config};
pub use db::delivery_repo::{ReadFilter, ReceivedFilter, ReceivedSort};
pub use db::{Database, DatabaseError};
pub use delivery::{DeliveryReport, DeliveryScheduler};
pub use error::{ConfigError, EverletterError, Result, StorageError};
pub use letters::LetterService;
pub use mailroom::{
    filter_mail, MailItem, MailKind, MailSource, Mailroom, MailroomQuery, ReadMarker, SortKey,
    Tab,
};
pub use models::{
    DeliveryFrequency, Letter, LetterUpdate, NewLetter, Profile, ProfileUpdate, ReceivedLetter,
    Schedule, SortDirection, UserStats,
};
pub use profiles::{resolve_recipient, ProfileService};
pub use storage::AvatarStore;
pub use telemetry::init_logging;
pub use validation::{validate_username, UsernameError};
