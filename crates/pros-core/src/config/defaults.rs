//! Default values for pros configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Project Defaults
// ============================================================================

/// Project name reported by the CLI and server.
pub const DEFAULT_PROJECT_NAME: &str = "pros";

/// Directory holding one subdirectory per installed app.
pub const DEFAULT_APPS_DIR: &str = "apps";

/// Declaration file names tried inside each app directory, in order.
pub const DEFAULT_MODEL_FILES: &[&str] = &["models.toml", "models.yaml", "models.yml", "models.json"];

// ============================================================================
// Database Defaults
// ============================================================================

/// Neo4j HTTP endpoint.
pub const DEFAULT_DATABASE_URL: &str = "http://localhost:7474";

/// Neo4j database name.
pub const DEFAULT_DATABASE_NAME: &str = "neo4j";

/// Neo4j user.
pub const DEFAULT_DATABASE_USER: &str = "neo4j";

// ============================================================================
// Server Defaults
// ============================================================================

/// Address the HTTP server binds to.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Port the HTTP server listens on.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

// ============================================================================
// File Locations
// ============================================================================

/// Project-local config file.
pub const PROJECT_CONFIG_FILE: &str = "pros.toml";

/// Subdirectory of the user config directory.
pub const USER_CONFIG_DIR: &str = "pros";

/// File name inside [`USER_CONFIG_DIR`].
pub const USER_CONFIG_FILE: &str = "config.toml";
