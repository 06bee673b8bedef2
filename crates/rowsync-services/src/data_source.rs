//! Record source for grid pages

use async_trait::async_trait;
use rowsync_core::{DataPage, DataQuery, GridModel};

/// Produces one page of records for a query.
///
/// Implementations own all interpretation of sorting and filtering; the grid
/// passes the query through untouched.
#[async_trait]
pub trait DataSource<M: GridModel>: Send + Sync {
    async fn fetch(&self, query: &DataQuery) -> anyhow::Result<DataPage<M>>;
}
