//! Data view parameters passed to the data source

use serde::{Deserialize, Serialize};

use crate::row::Row;
use crate::types::Value;

/// Page window, 0-based page index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
}

impl Pagination {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// Offset of the first record on this page
    pub fn offset(&self) -> usize {
        self.page * self.page_size
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(0, crate::config::DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
}

/// A single field filter; interpretation is up to the data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Everything the data source needs to produce one page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQuery {
    pub pagination: Pagination,
    pub sort: Vec<SortSpec>,
    pub filters: Vec<Filter>,
}

/// One page of records returned by the data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPage<M> {
    pub total_count: usize,
    pub data: Vec<M>,
}

/// Read view of the materialised rows
#[derive(Debug, Clone, PartialEq)]
pub struct DataState<M> {
    pub total_count: usize,
    pub data: Vec<Row<M>>,
}
