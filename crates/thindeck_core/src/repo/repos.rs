//! `Repos` contract and its region-backed implementation.
//!
//! # Invariants
//! - Stored items use table [`TABLE`] with attributes [`ATTR_NAME`] and
//!   [`ATTR_UPDATED`]; these names must not change for existing data.
//! - `add` never leaves two items with the same name: the pre-check is a
//!   fast path, the conditional put is what guarantees uniqueness.

use crate::dynamo::{Attributes, Item, PutCondition, QueryValve, Region, RegionError, Select};
use crate::model::repo::{validate_repo_name, Repo, RepoValidationError};
use crate::time::now_epoch_ms;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Table holding repo items.
pub const TABLE: &str = "repos";
/// Repo name attribute (string).
pub const ATTR_NAME: &str = "name";
/// Last-updated attribute (number, epoch milliseconds).
pub const ATTR_UPDATED: &str = "updated";

pub type RepoResult<T> = Result<T, RepoError>;

/// Lazy sequence of repos; each step may fail with a region error.
pub type RepoIter<'a> = Box<dyn Iterator<Item = RepoResult<Repo>> + 'a>;

#[derive(Debug)]
pub enum RepoError {
    Validation(RepoValidationError),
    /// A repo with this name already exists; pick another name.
    AlreadyExists(String),
    NotFound(String),
    /// Store or transport failure; not retried.
    Region(RegionError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::AlreadyExists(name) => write!(f, "repo already exists: {name}"),
            Self::NotFound(name) => write!(f, "repo not found: {name}"),
            Self::Region(err) => write!(f, "repo store failure: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted repo data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Region(err) => Some(err),
            Self::AlreadyExists(_) | Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<RepoValidationError> for RepoError {
    fn from(value: RepoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RegionError> for RepoError {
    fn from(value: RegionError) -> Self {
        Self::Region(value)
    }
}

/// Collection of named repos.
pub trait Repos {
    /// Fetches the repo called `name`.
    fn get(&self, name: &str) -> RepoResult<Repo>;
    /// Creates a repo called `name`, stamped with the current time.
    fn add(&self, name: &str) -> RepoResult<Repo>;
    /// Lazily scans every repo. Order is unspecified and reads are eventually
    /// consistent; calling again starts a new scan.
    fn iterate(&self) -> RepoIter<'_>;
}

/// Region-backed [`Repos`].
pub struct DyRepos<R: Region> {
    region: R,
    clock: fn() -> i64,
}

impl<R: Region> DyRepos<R> {
    pub fn new(region: R) -> Self {
        Self::with_clock(region, now_epoch_ms)
    }

    /// Uses `clock` (epoch milliseconds) to stamp created repos.
    pub fn with_clock(region: R, clock: fn() -> i64) -> Self {
        Self { region, clock }
    }

    /// Limit-1 lookup by name shared by `get` and `add`.
    fn find(&self, name: &str) -> RepoResult<Option<Item>> {
        let first = self
            .region
            .frame(TABLE)
            .where_eq(ATTR_NAME, name)
            .through(QueryValve::new().with_limit(1))
            .into_iter()
            .next();
        first.transpose().map_err(RepoError::from)
    }
}

impl<R: Region> Repos for DyRepos<R> {
    fn get(&self, name: &str) -> RepoResult<Repo> {
        let item = self
            .find(name)?
            .ok_or_else(|| RepoError::NotFound(name.to_string()))?;
        debug!("event=repo_get module=repo status=ok name={name}");
        parse_repo_item(&item)
    }

    fn add(&self, name: &str) -> RepoResult<Repo> {
        validate_repo_name(name)?;

        if self.find(name)?.is_some() {
            warn!("event=repo_add module=repo status=duplicate name={name}");
            return Err(RepoError::AlreadyExists(name.to_string()));
        }

        let attributes = Attributes::new()
            .with(ATTR_NAME, name)
            .with(ATTR_UPDATED, (self.clock)());
        let condition = PutCondition::AttributeNotExists(ATTR_NAME.to_string());
        let item = match self.region.put(TABLE, &attributes, &condition) {
            Ok(item) => item,
            Err(RegionError::ConditionalCheckFailed { .. }) => {
                warn!("event=repo_add module=repo status=duplicate stage=put name={name}");
                return Err(RepoError::AlreadyExists(name.to_string()));
            }
            Err(err) => {
                error!(
                    "event=repo_add module=repo status=error error_code=region_put_failed name={name} error={err}"
                );
                return Err(err.into());
            }
        };

        let repo = parse_repo_item(&item)?;
        info!(
            "event=repo_add module=repo status=ok name={} updated={}",
            repo.name, repo.updated
        );
        Ok(repo)
    }

    fn iterate(&self) -> RepoIter<'_> {
        let frame = self.region.frame(TABLE).through(
            QueryValve::new()
                .with_consistent_read(false)
                .with_select(Select::AllProjectedAttributes),
        );
        Box::new(frame.into_iter().map(|item| -> RepoResult<Repo> {
            let item = item?;
            parse_repo_item(&item)
        }))
    }
}

fn parse_repo_item(item: &Item) -> RepoResult<Repo> {
    let name = item
        .string(ATTR_NAME)
        .map_err(|err| RepoError::InvalidData(err.to_string()))?;
    let updated = item
        .number(ATTR_UPDATED)
        .map_err(|err| RepoError::InvalidData(err.to_string()))?;
    Ok(Repo::new(name, updated))
}
