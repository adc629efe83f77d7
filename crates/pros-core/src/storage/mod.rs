//! Graph storage drivers.
//!
//! The core only ever reads through [`GraphDriver`]: it hands over query text
//! and a `{"uid": ...}` parameter map and expects one row whose single
//! column is the nested document.

mod error;
mod memory;
mod neo4j;

pub use error::StorageError;
pub use memory::MemoryGraph;
pub use neo4j::Neo4jDriver;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::query::ReadQuery;

/// One result row, column values in order.
pub type Row = Vec<Value>;

/// Executes statements against a graph store.
#[async_trait]
pub trait GraphDriver: Send + Sync {
    /// Run one statement and return every row.
    async fn execute(
        &self,
        statement: &str,
        parameters: Map<String, Value>,
    ) -> Result<Vec<Row>, StorageError>;

    /// Run a read query for one identifier.
    ///
    /// Returns `None` when nothing matched; not-found is not an error here.
    async fn read(&self, query: &ReadQuery, uid: &str) -> Result<Option<Value>, StorageError> {
        let rows = self.execute(query.text(), query.parameters(uid)).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .filter(|document| !document.is_null()))
    }
}
