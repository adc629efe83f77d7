//! One-shot startup: load, declare, resolve, catalogue.

use thiserror::Error;

use crate::apps::{load_declarations, LoadError};
use crate::catalogue::ModelManager;
use crate::config::{Config, ConfigError};
use crate::model::{DeclarationError, NodeTypeDecl};
use crate::registry::TypeRegistry;
use crate::schema::SchemaError;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Declaration files could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The declaration set is invalid.
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    /// A response schema could not be derived.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Build the catalogue for every installed app.
pub fn setup(config: &Config) -> Result<ModelManager, SetupError> {
    let decls = load_declarations(config)?;
    setup_from_declarations(decls)
}

/// Build the catalogue from declarations already in memory.
pub fn setup_from_declarations(
    decls: impl IntoIterator<Item = NodeTypeDecl>,
) -> Result<ModelManager, SetupError> {
    let mut registry = TypeRegistry::new();
    registry.declare_all(decls)?;

    let hierarchy = registry.resolve()?;
    Ok(ModelManager::build(&hierarchy)?)
}
