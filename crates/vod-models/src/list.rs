//! Listing, pagination, and filtering types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default page size when the caller does not specify one.
pub const DEFAULT_LIMIT: u32 = 50;
/// Hard ceiling on page size.
pub const MAX_LIMIT: u32 = 200;

/// Offset pagination for list queries.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema)]
pub struct Pagination {
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

impl Pagination {
    /// Clamp the limit into `1..=MAX_LIMIT`, applying the default for zero.
    pub fn normalize(&mut self) {
        if self.limit == 0 {
            self.limit = DEFAULT_LIMIT;
        }
        if self.limit > MAX_LIMIT {
            self.limit = MAX_LIMIT;
        }
    }
}

/// Status filter for video listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListFilter {
    #[default]
    All,
    /// Not archived
    Active,
    /// Archived only
    Archived,
}

impl ListFilter {
    /// Parse a query-string value. Empty input means `All`; unknown input is
    /// rejected so callers can 400 on typos instead of silently listing
    /// everything.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Some(ListFilter::All),
            "active" => Some(ListFilter::Active),
            "archived" => Some(ListFilter::Archived),
            _ => None,
        }
    }
}

/// A page of results plus the unpaginated total.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListPayload<T> {
    pub data: Vec<T>,
    pub total_count: u64,
}
