//! Core storage logic for Thindeck.
//! Repositories are kept in a wide-column region behind the `Repos` contract.

pub mod db;
pub mod dynamo;
pub mod logging;
pub mod model;
pub mod repo;
pub mod time;

pub use dynamo::{
    AttributeValue, Attributes, Frame, Item, PutCondition, QueryValve, Region, RegionError,
    RegionResult, Select, SqliteRegion,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::repo::{validate_repo_name, Repo, RepoValidationError};
pub use repo::repos::{
    DyRepos, RepoError, RepoIter, RepoResult, Repos, ATTR_NAME, ATTR_UPDATED, TABLE,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
