//! Executable read queries.

use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value;

use super::{build_read_query, QueryError, ReadQuery};
use crate::catalogue::{ModelKey, ModelManager};
use crate::storage::{GraphDriver, StorageError};

/// A read query bound to a driver.
///
/// Immutable after construction; clones share the plan and the driver, so
/// one template serves any number of concurrent reads.
#[derive(Clone)]
pub struct QueryTemplate {
    query: Arc<ReadQuery>,
    driver: Arc<dyn GraphDriver>,
}

impl QueryTemplate {
    pub fn new(query: ReadQuery, driver: Arc<dyn GraphDriver>) -> Self {
        Self {
            query: Arc::new(query),
            driver,
        }
    }

    /// Build the read query of `key` and bind it to `driver`.
    pub fn build<'k>(
        manager: &ModelManager,
        key: impl Into<ModelKey<'k>>,
        driver: Arc<dyn GraphDriver>,
    ) -> Result<Self, QueryError> {
        Ok(Self::new(build_read_query(manager, key)?, driver))
    }

    pub fn query(&self) -> &ReadQuery {
        &self.query
    }

    /// Fetch one document; `None` when no node of this type has `uid`.
    pub async fn fetch(&self, uid: &str) -> Result<Option<Value>, StorageError> {
        self.driver.read(&self.query, uid).await
    }

    /// Fetch several documents concurrently, in the order given.
    pub async fn fetch_many(&self, uids: &[&str]) -> Result<Vec<Option<Value>>, StorageError> {
        try_join_all(uids.iter().map(|uid| self.fetch(uid))).await
    }
}

impl fmt::Debug for QueryTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryTemplate")
            .field("model", &self.query.model_name)
            .finish_non_exhaustive()
    }
}
