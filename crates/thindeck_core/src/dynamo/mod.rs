//! Wide-column table client abstraction.
//!
//! # Responsibility
//! - Define the [`Region`] capability that repositories are built on.
//! - Provide attribute/item types and lazy query frames over a table.
//! - Ship [`SqliteRegion`], a local implementation of the region contract.
//!
//! # Invariants
//! - Attribute names are the on-the-wire contract with stored data.
//! - Conditional puts are atomic: a failed condition writes nothing.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod attributes;
mod frame;
mod sqlite_region;
mod valve;

pub use attributes::{AttributeValue, Attributes, Item};
pub use frame::{Frame, FrameIter};
pub use sqlite_region::SqliteRegion;
pub use valve::{Condition, Cursor, Page, PutCondition, QueryRequest, QueryValve, Select};

pub type RegionResult<T> = Result<T, RegionError>;

/// Errors raised by region implementations.
#[derive(Debug)]
pub enum RegionError {
    Db(DbError),
    /// A conditional put found an existing item and wrote nothing.
    ConditionalCheckFailed {
        table: String,
        attribute: String,
    },
    /// The store or caller produced an item shape the region cannot handle.
    InvalidData(String),
    /// Connection schema does not match the version this build expects.
    UninitializedStore {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RegionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ConditionalCheckFailed { table, attribute } => write!(
                f,
                "conditional check failed on `{table}`: attribute `{attribute}` already taken"
            ),
            Self::InvalidData(message) => write!(f, "invalid item data: {message}"),
            Self::UninitializedStore {
                expected_version,
                actual_version,
            } => write!(
                f,
                "store schema version {actual_version} does not match expected {expected_version}; open it with db::open_db"
            ),
        }
    }
}

impl Error for RegionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::ConditionalCheckFailed { .. } => None,
            Self::InvalidData(_) => None,
            Self::UninitializedStore { .. } => None,
        }
    }
}

impl From<DbError> for RegionError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RegionError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Injected handle to a wide-column store.
///
/// Implementations must be usable through a shared reference; all state
/// lives on the remote (or local) store side.
pub trait Region {
    /// Inserts a new item built from `attributes` into `table`.
    ///
    /// Returns the stored item. With [`PutCondition::AttributeNotExists`] the
    /// insert fails with [`RegionError::ConditionalCheckFailed`] when another
    /// item in `table` already carries the same value for that attribute.
    fn put(
        &self,
        table: &str,
        attributes: &Attributes,
        condition: &PutCondition,
    ) -> RegionResult<Item>;

    /// Reads one page of items from `table`.
    fn query(&self, table: &str, request: &QueryRequest) -> RegionResult<Page>;

    /// Starts a lazy frame over `table`.
    fn frame(&self, table: &str) -> Frame<'_, Self>
    where
        Self: Sized,
    {
        Frame::new(self, table)
    }
}

impl<R: Region + ?Sized> Region for &R {
    fn put(
        &self,
        table: &str,
        attributes: &Attributes,
        condition: &PutCondition,
    ) -> RegionResult<Item> {
        (**self).put(table, attributes, condition)
    }

    fn query(&self, table: &str, request: &QueryRequest) -> RegionResult<Page> {
        (**self).query(table, request)
    }
}
