// ⚙️ Server configuration - environment variables with defaults

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to (`HOST`, default 0.0.0.0)
    pub host: String,
    /// Port to bind to (`PORT`, default 8000)
    pub port: u16,
    /// Tracing filter (`RUST_LOG`, default "info")
    pub log_level: String,
    /// Start with the demo members, books and loans (`LIBRARY_SEED_SAMPLE_DATA`)
    pub seed_sample_data: bool,
    /// Catalog CSV imported at startup (`LIBRARY_CATALOG_CSV`)
    pub catalog_csv: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            seed_sample_data: true,
            catalog_csv: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_vars(env::vars().collect())
    }

    /// Load configuration from an explicit variable map. Unparseable
    /// values fall back to the defaults.
    pub fn from_vars(vars: HashMap<String, String>) -> Self {
        let defaults = ServerConfig::default();

        ServerConfig {
            host: vars.get("HOST").cloned().unwrap_or(defaults.host),
            port: vars
                .get("PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            log_level: vars.get("RUST_LOG").cloned().unwrap_or(defaults.log_level),
            seed_sample_data: vars
                .get("LIBRARY_SEED_SAMPLE_DATA")
                .and_then(|s| parse_flag(s))
                .unwrap_or(defaults.seed_sample_data),
            catalog_csv: vars
                .get("LIBRARY_CATALOG_CSV")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
