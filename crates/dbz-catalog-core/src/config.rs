//! Catalog configuration loaded from file and environment.
//!
//! | Key (env `CATALOG_*`) | Default | Description |
//! |-----|---------|-------------|
//! | BIND_ADDR | 127.0.0.1:8000 | Gateway listen address. |
//! | PUBLIC_API_URL | https://dragonball-api.com/api | Third-party REST API base. |
//! | BACKEND_URL | http://127.0.0.1:8001/backend | First-party backend, reached through its proxy prefix. |
//! | FETCH_LIMIT | 1000 | `limit` used when pulling the whole public character list. |
//! | PAGE_SIZE | 12 | Default page size for list views. |
//! | REQUEST_TIMEOUT_SECS | 15 | Per-request timeout for both clients. |
//! | PLACEHOLDER_IMAGE | assets/placeholder-dbz.png | Image used when a record has none. |
//! | USE_BACKEND_TRANSFORMATIONS | false | Transformations screen reads the backend instead of demo chips. |

use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_PUBLIC_API_URL: &str = "https://dragonball-api.com/api";
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8001/backend";
pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "assets/placeholder-dbz.png";

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_public_api_url() -> String {
    DEFAULT_PUBLIC_API_URL.to_string()
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_fetch_limit() -> u32 {
    1000
}

fn default_page_size() -> usize {
    12
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_placeholder_image() -> String {
    DEFAULT_PLACEHOLDER_IMAGE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_public_api_url")]
    pub public_api_url: String,
    /// Base of the first-party backend including its proxy prefix; `/api/personajes/` is appended.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: String,
    #[serde(default)]
    pub use_backend_transformations: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            public_api_url: default_public_api_url(),
            backend_url: default_backend_url(),
            fetch_limit: default_fetch_limit(),
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
            placeholder_image: default_placeholder_image(),
            use_backend_transformations: false,
        }
    }
}

impl CatalogConfig {
    /// Load config from file and environment. Precedence: env `CATALOG_*` > file
    /// (`CATALOG_CONFIG` path, else `config/catalog`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CATALOG_CONFIG").unwrap_or_else(|_| "config/catalog".to_string());
        let builder = config::Config::builder()
            .set_default("bind_addr", DEFAULT_BIND_ADDR)?
            .set_default("public_api_url", DEFAULT_PUBLIC_API_URL)?
            .set_default("backend_url", DEFAULT_BACKEND_URL)?
            .set_default("fetch_limit", 1000_i64)?
            .set_default("page_size", 12_i64)?
            .set_default("request_timeout_secs", 15_i64)?
            .set_default("placeholder_image", DEFAULT_PLACEHOLDER_IMAGE)?
            .set_default("use_backend_transformations", false)?;

        // `config` resolves the extension itself when the path has none.
        let path = Path::new(&config_path);
        let with_ext = path.with_extension("toml");
        let builder = if path.exists() || with_ext.exists() {
            builder.add_source(config::File::with_name(&config_path))
        } else {
            builder
        };

        let built = builder
            .add_source(
                config::Environment::with_prefix("CATALOG")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut cfg: Self = built.try_deserialize()?;
        cfg.page_size = cfg.page_size.max(1);
        Ok(cfg)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let cfg = CatalogConfig::default();
        assert_eq!(cfg.bind_addr, "127.0.0.1:8000");
        assert_eq!(cfg.fetch_limit, 1000);
        assert_eq!(cfg.page_size, 12);
        assert!(!cfg.use_backend_transformations);
        assert_eq!(cfg.request_timeout().as_secs(), 15);
    }

    #[test]
    fn test_deserializes_partial_document_with_defaults() {
        let cfg: CatalogConfig =
            serde_json::from_str(r#"{"page_size": 24, "use_backend_transformations": true}"#).unwrap();
        assert_eq!(cfg.page_size, 24);
        assert!(cfg.use_backend_transformations);
        assert_eq!(cfg.public_api_url, DEFAULT_PUBLIC_API_URL);
    }
}
