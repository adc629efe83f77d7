pub mod apps;
pub mod catalogue;
pub mod config;
pub mod model;
pub mod query;
pub mod registry;
pub mod schema;
pub mod setup;
pub mod storage;

pub use apps::{load_declarations, LoadError};
pub use catalogue::{AppModel, ModelKey, ModelManager, ModelManagerError, NodeRecord, RecordError};
pub use config::{Config, ConfigError, DatabaseConfig, ProjectConfig, ServerConfig};
pub use model::{
    Cardinality, DeclarationError, EdgeKind, Generator, NodeKind, NodeTypeDecl, PropertyDecl,
    PropertyKind, RelationshipDecl,
};
pub use query::{build_read_query, QueryError, QueryTemplate, ReadQuery};
pub use registry::{Hierarchy, NodeTypeId, TypeRegistry};
pub use schema::{build_schema, ResponseSchema, SchemaError, SchemaSet};
pub use setup::{setup, setup_from_declarations, SetupError};
pub use storage::{GraphDriver, MemoryGraph, Neo4jDriver, StorageError};
