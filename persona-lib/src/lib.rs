//! Personal profiles with an address history.
//!
//! Everything goes through a [`Repository`]: it creates, reads, updates and deletes the
//! single profile belonging to an [`Identity`], keeping exactly one of the profile's
//! addresses flagged as current.

use std::path::PathBuf;

use thiserror::Error;

pub mod forms;
pub mod fs;
mod identity;
pub mod repository;

pub use identity::Identity;
pub use repository::Repository;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Entity(#[from] repository::entities::Error),
    #[error(transparent)]
    Config(#[from] repository::config::Error),
    #[error("Database error {0}")]
    Database(#[from] agdb::DbError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("'{0}' doesn't have a profile")]
    ProfileNotFound(String),
    #[error("An identity must not be empty")]
    InvalidIdentity,
    #[error("Path is not valid UTF-8: {}", .0.display())]
    InvalidPath(PathBuf),
    #[error("Database model version {found} is not supported (expected {expected})")]
    UnsupportedModelVersion { found: u64, expected: u64 },
}
