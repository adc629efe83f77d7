use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{GraphDriver, Row, StorageError};
use crate::config::DatabaseConfig;

/// Neo4j client over the HTTP transactional endpoint.
///
/// Each call runs in its own auto-committed transaction
/// (`POST {url}/db/{database}/tx/commit`).
pub struct Neo4jDriver {
    endpoint: String,
    username: String,
    password: String,
    client: Client,
}

impl Neo4jDriver {
    /// Creates a driver.
    ///
    /// # Arguments
    /// * `url` - Server base URL (e.g., "http://localhost:7474")
    /// * `database` - Database name (e.g., "neo4j")
    /// * `username` / `password` - Basic auth credentials; an empty username
    ///   disables auth
    pub fn new(
        url: impl AsRef<str>,
        database: impl AsRef<str>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: format!(
                "{}/db/{}/tx/commit",
                url.as_ref().trim_end_matches('/'),
                database.as_ref()
            ),
            username: username.into(),
            password: password.into(),
            client: Client::new(),
        }
    }

    /// Creates a driver from the `[database]` config section.
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new(
            &config.url,
            &config.database,
            config.username.clone(),
            config.password.clone(),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GraphDriver for Neo4jDriver {
    async fn execute(
        &self,
        statement: &str,
        parameters: Map<String, Value>,
    ) -> Result<Vec<Row>, StorageError> {
        let request = TransactionRequest {
            statements: vec![Statement {
                statement,
                parameters,
            }],
        };

        let mut req = self
            .client
            .post(&self.endpoint)
            .header("accept", "application/json");
        if !self.username.is_empty() {
            req = req.basic_auth(&self.username, Some(&self.password));
        }

        debug!(endpoint = %self.endpoint, "executing statement");
        let response = req.json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: TransactionResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Decode(e.to_string()))?;
        rows_from_response(body)
    }
}

fn rows_from_response(body: TransactionResponse) -> Result<Vec<Row>, StorageError> {
    if let Some(error) = body.errors.into_iter().next() {
        return Err(StorageError::Database {
            code: error.code,
            message: error.message,
        });
    }

    let Some(result) = body.results.into_iter().next() else {
        warn!("transaction response carried no result");
        return Ok(Vec::new());
    };
    Ok(result.data.into_iter().map(|data| data.row).collect())
}

#[derive(Debug, Serialize)]
struct TransactionRequest<'a> {
    statements: Vec<Statement<'a>>,
}

#[derive(Debug, Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<DatabaseError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    data: Vec<ResultRow>,
}

#[derive(Debug, Deserialize)]
struct ResultRow {
    row: Row,
}

#[derive(Debug, Deserialize)]
struct DatabaseError {
    code: String,
    message: String,
}
