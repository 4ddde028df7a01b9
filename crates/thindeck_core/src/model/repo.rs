//! Repo domain record and name validation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum accepted repo name length, in characters.
pub const MAX_REPO_NAME_CHARS: usize = 128;

static REPO_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("repo name pattern must compile")
});

/// Named repository record with its last-updated stamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repo {
    /// Unique name, also the lookup key in storage.
    pub name: String,
    /// Unix epoch milliseconds of the last update (creation time for now).
    pub updated: i64,
}

impl Repo {
    pub fn new(name: impl Into<String>, updated: i64) -> Self {
        Self {
            name: name.into(),
            updated,
        }
    }
}

/// Validation failures for repo names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoValidationError {
    EmptyName,
    NameTooLong { max: usize, actual: usize },
    InvalidName(String),
}

impl Display for RepoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "repo name cannot be empty"),
            Self::NameTooLong { max, actual } => {
                write!(f, "repo name cannot exceed {max} characters (got {actual})")
            }
            Self::InvalidName(name) => write!(
                f,
                "repo name `{name}` must start with a letter or digit and contain only letters, digits, `.`, `_` or `-`"
            ),
        }
    }
}

impl Error for RepoValidationError {}

/// Checks a candidate repo name before it reaches storage.
pub fn validate_repo_name(name: &str) -> Result<(), RepoValidationError> {
    if name.trim().is_empty() {
        return Err(RepoValidationError::EmptyName);
    }
    let actual = name.chars().count();
    if actual > MAX_REPO_NAME_CHARS {
        return Err(RepoValidationError::NameTooLong {
            max: MAX_REPO_NAME_CHARS,
            actual,
        });
    }
    if !REPO_NAME_PATTERN.is_match(name) {
        return Err(RepoValidationError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_repo_name, Repo, RepoValidationError, MAX_REPO_NAME_CHARS};

    #[test]
    fn accepts_typical_names() {
        for name in ["repo-a", "thindeck", "my_repo.v2", "9lives"] {
            assert!(validate_repo_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_blank_and_oversized_names() {
        assert_eq!(validate_repo_name("  "), Err(RepoValidationError::EmptyName));

        let long = "a".repeat(MAX_REPO_NAME_CHARS + 1);
        assert_eq!(
            validate_repo_name(&long),
            Err(RepoValidationError::NameTooLong {
                max: MAX_REPO_NAME_CHARS,
                actual: MAX_REPO_NAME_CHARS + 1
            })
        );
    }

    #[test]
    fn rejects_names_with_separators_or_leading_punctuation() {
        assert!(matches!(
            validate_repo_name("a/b"),
            Err(RepoValidationError::InvalidName(_))
        ));
        assert!(matches!(
            validate_repo_name("-repo"),
            Err(RepoValidationError::InvalidName(_))
        ));
        assert!(matches!(
            validate_repo_name("has space"),
            Err(RepoValidationError::InvalidName(_))
        ));
    }

    #[test]
    fn repo_serializes_with_store_field_names() {
        let json = serde_json::to_value(Repo::new("repo-a", 1_700_000_000_000)).unwrap();
        assert_eq!(json["name"], "repo-a");
        assert_eq!(json["updated"], 1_700_000_000_000_i64);
    }
}
