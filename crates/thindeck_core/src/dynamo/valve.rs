//! Query options and page types shared by frames and region implementations.

use super::{AttributeValue, Item};

/// Attribute projection applied to returned items.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Select {
    #[default]
    AllAttributes,
    /// Attributes projected into the queried index; for base tables this is
    /// every attribute.
    AllProjectedAttributes,
    SpecificAttributes(Vec<String>),
}

impl Select {
    pub fn includes(&self, attribute: &str) -> bool {
        match self {
            Self::AllAttributes | Self::AllProjectedAttributes => true,
            Self::SpecificAttributes(names) => names.iter().any(|name| name == attribute),
        }
    }
}

/// Read options for a frame: page size, total limit, consistency and projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryValve {
    limit: Option<u32>,
    page_size: u32,
    consistent_read: bool,
    select: Select,
}

impl QueryValve {
    pub const DEFAULT_PAGE_SIZE: u32 = 100;

    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the total number of items a frame yields. A limit also shrinks
    /// the page size so that a limit-1 frame costs a single one-item read.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_consistent_read(mut self, consistent: bool) -> Self {
        self.consistent_read = consistent;
        self
    }

    pub fn with_select(mut self, select: Select) -> Self {
        self.select = select;
        self
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn consistent_read(&self) -> bool {
        self.consistent_read
    }

    pub fn select(&self) -> &Select {
        &self.select
    }

    /// Page size actually requested from the region.
    pub fn effective_page_size(&self) -> u32 {
        match self.limit {
            Some(limit) => limit.clamp(1, self.page_size),
            None => self.page_size,
        }
    }
}

impl Default for QueryValve {
    fn default() -> Self {
        Self {
            limit: None,
            page_size: Self::DEFAULT_PAGE_SIZE,
            consistent_read: true,
            select: Select::AllAttributes,
        }
    }
}

/// Equality condition on one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub attribute: String,
    pub value: AttributeValue,
}

/// Write guard for [`super::Region::put`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PutCondition {
    #[default]
    None,
    /// Insert only when no item in the table carries the same value for
    /// this attribute.
    AttributeNotExists(String),
}

/// Opaque position after the last item of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor(pub(crate) i64);

/// Single page read request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub conditions: Vec<Condition>,
    pub page_size: u32,
    pub consistent_read: bool,
    pub select: Select,
    pub exclusive_start: Option<Cursor>,
}

/// One page of items plus the position to resume from.
///
/// `last_evaluated` is `None` once the region knows no more items follow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    pub items: Vec<Item>,
    pub last_evaluated: Option<Cursor>,
}

#[cfg(test)]
mod tests {
    use super::{QueryValve, Select};

    #[test]
    fn limit_shrinks_effective_page_size() {
        assert_eq!(QueryValve::new().with_limit(1).effective_page_size(), 1);
        assert_eq!(
            QueryValve::new()
                .with_page_size(10)
                .with_limit(500)
                .effective_page_size(),
            10
        );
        assert_eq!(
            QueryValve::new().effective_page_size(),
            QueryValve::DEFAULT_PAGE_SIZE
        );
    }

    #[test]
    fn specific_select_only_includes_listed_attributes() {
        let select = Select::SpecificAttributes(vec!["name".to_string()]);
        assert!(select.includes("name"));
        assert!(!select.includes("updated"));
        assert!(Select::AllProjectedAttributes.includes("updated"));
    }
}
