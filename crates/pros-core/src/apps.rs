//! Declaration-file discovery for installed apps.
//!
//! Each app directory holds one `models.{toml,yaml,yml,json}` file with a
//! top-level `types` list of node type declarations.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{Config, DEFAULT_MODEL_FILES};
use crate::model::{ModelsFile, NodeTypeDecl};

/// Errors raised while loading declaration files.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No declaration file exists for an installed app.
    #[error("App '{app}' has no declaration file in {}", dir.display())]
    MissingModels { app: String, dir: PathBuf },

    /// A declaration file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A declaration file could not be parsed.
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

/// Load every installed app's declarations, in install order.
///
/// Each declaration is stamped with the app it came from.
pub fn load_declarations(config: &Config) -> Result<Vec<NodeTypeDecl>, LoadError> {
    let mut decls = Vec::new();
    for app in &config.project.installed_apps {
        let dir = config.project.app_path(app);
        let path = find_models_file(&dir).ok_or_else(|| LoadError::MissingModels {
            app: app.clone(),
            dir: dir.clone(),
        })?;

        let file = read_models_file(&path)?;
        debug!(app = %app, path = %path.display(), count = file.types.len(), "loaded declarations");
        decls.extend(file.types.into_iter().map(|decl| decl.in_app(app)));
    }

    info!(
        apps = config.project.installed_apps.len(),
        types = decls.len(),
        "loaded app declarations"
    );
    Ok(decls)
}

/// First declaration file present in `dir`.
pub fn find_models_file(dir: &Path) -> Option<PathBuf> {
    DEFAULT_MODEL_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Parse one declaration file, choosing the format by extension.
pub fn read_models_file(path: &Path) -> Result<ModelsFile, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_error = |message: String| LoadError::Parse {
        path: path.to_path_buf(),
        message,
    };

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))
        }
        Some("json") => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
        _ => toml::from_str(&content).map_err(|e| parse_error(e.to_string())),
    }
}
