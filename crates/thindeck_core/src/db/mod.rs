//! Backing file for the local region.
//!
//! [`crate::dynamo::SqliteRegion`] keeps every logical table in two SQLite
//! tables (`items`, `item_attributes`). This module opens connections to
//! that file and brings its layout up to date; `SqliteRegion::try_new`
//! refuses connections that skipped this step.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the item store.
#[derive(Debug)]
pub enum DbError {
    /// Driver-level failure (I/O, locking, constraint); surfaces as a
    /// transport error to region callers.
    Sqlite(rusqlite::Error),
    /// The file was written by a newer build with an item layout this one
    /// cannot read.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "item store layout v{db_version} is newer than this build supports (v{latest_supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
