use std::path::PathBuf;
use thiserror::Error;

use crate::validation::UsernameError;

/// Every failure a caller can see. The `Display` text is shown to the user as-is.
#[derive(Error, Debug)]
pub enum EverletterError {
    #[error("User not authenticated")]
    NotAuthenticated,

    #[error("User not found")]
    UserNotFound,

    #[error("Recipient username does not exist")]
    RecipientNotFound,

    #[error("{0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Profile already exists for this user")]
    ProfileExists,

    #[error("Letter not found: {0}")]
    LetterNotFound(String),

    #[error("Received letter not found: {0}")]
    DeliveryNotFound(String),

    #[error("Letter has already been sent")]
    LetterAlreadySent,

    #[error("{reason}")]
    InvalidLetter { reason: String },

    #[error("Invalid schedule: {reason}")]
    InvalidSchedule { reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidLogFilter { filter: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete file '{path}': {source}")]
    DeleteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported avatar file type: {0}")]
    UnsupportedExtension(String),

    #[error("Avatar is too large ({size} bytes, limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("Invalid avatar URL: {0}")]
    InvalidUrl(String),

    #[error("Avatar does not belong to the current user")]
    NotOwner,
}

pub type Result<T> = std::result::Result<T, EverletterError>;
