//! Attribute values, attribute sets and stored items.

use super::{RegionError, RegionResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Single attribute value, tagged the way the hosted store encodes them.
///
/// Numbers travel as decimal text (`{"N": "42"}`), strings verbatim
/// (`{"S": "repo-a"}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    N(String),
}

impl AttributeValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self::S(value.into())
    }

    pub fn number(value: i64) -> Self {
        Self::N(value.to_string())
    }

    /// Short type tag used for storage (`S` or `N`).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
        }
    }

    /// Raw textual payload regardless of type.
    pub fn raw(&self) -> &str {
        match self {
            Self::S(value) | Self::N(value) => value,
        }
    }

    /// Rebuilds a value from its storage tag and text.
    ///
    /// `N` text is kept verbatim; stored numbers may be decimals, so integer
    /// parsing is left to readers such as [`Item::number`].
    pub fn from_parts(kind: &str, raw: String) -> RegionResult<Self> {
        match kind {
            "S" => Ok(Self::S(raw)),
            "N" => Ok(Self::N(raw)),
            other => Err(RegionError::InvalidData(format!(
                "unsupported attribute type `{other}`"
            ))),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::S(value) => Some(value),
            Self::N(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::N(value) => value.parse().ok(),
            Self::S(_) => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::S(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::number(value)
    }
}

/// Named attribute set written on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes(BTreeMap<String, AttributeValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; a repeated name overwrites the earlier value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub(crate) fn insert(&mut self, name: String, value: AttributeValue) {
        self.0.insert(name, value);
    }
}

/// Item read back from (or just written to) a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    table: String,
    attributes: Attributes,
}

impl Item {
    pub fn new(table: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            table: table.into(),
            attributes,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn has(&self, name: &str) -> bool {
        self.attributes.get(name).is_some()
    }

    /// Reads a string attribute, failing when it is absent or not a string.
    pub fn string(&self, name: &str) -> RegionResult<&str> {
        self.attributes
            .get(name)
            .and_then(AttributeValue::as_str)
            .ok_or_else(|| self.missing(name, "string"))
    }

    /// Reads a number attribute, failing when it is absent or not a number.
    pub fn number(&self, name: &str) -> RegionResult<i64> {
        self.attributes
            .get(name)
            .and_then(AttributeValue::as_i64)
            .ok_or_else(|| self.missing(name, "number"))
    }

    fn missing(&self, name: &str, expected: &str) -> RegionError {
        RegionError::InvalidData(format!(
            "item in `{}` has no {expected} attribute `{name}`",
            self.table
        ))
    }
}
