//! Configuration shared by the core and the gateway.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of recent messages returned with each chat reply.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Which conversation store backs the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sled,
    Memory,
}

/// Global application configuration. Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Service name reported by the health endpoint.
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Base directory for Sled DBs (the conversation store path is derived from this).
    pub storage_path: String,
    #[serde(default)]
    pub storage_backend: StorageBackend,
    /// How many recent messages (user and assistant) to echo back per turn.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            app_name: "customer-service-chatbot".to_string(),
            port: 8000,
            storage_path: "./data".to_string(),
            storage_backend: StorageBackend::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl CoreConfig {
    /// Load config from file and environment. Precedence: env `SUPPORT_*` vars >
    /// file at env `SUPPORT_CONFIG` (default `config/gateway`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("SUPPORT_CONFIG").unwrap_or_else(|_| "config/gateway".to_string());
        Self::load_from(&config_path)
    }

    /// Same as [`CoreConfig::load`] with an explicit file path. A missing file is not an error.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("app_name", defaults.app_name)?
            .set_default("port", defaults.port as i64)?
            .set_default("storage_path", defaults.storage_path)?
            .set_default("storage_backend", "sled")?
            .set_default("history_limit", defaults.history_limit as i64)?;

        let path = Path::new(config_path);
        let toml_path = path.with_extension("toml");
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else if toml_path.exists() {
            builder.add_source(config::File::from(toml_path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("SUPPORT").separator("__"))
            .build()?;

        built.try_deserialize()
    }

    /// Path of the Sled conversation store.
    pub fn conversation_store_path(&self) -> std::path::PathBuf {
        Path::new(&self.storage_path).join("support_conversations")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};

    // Loading reads SUPPORT__* variables; tests that load or set them run one at a time.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_guard() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write_config(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("gateway.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "{}", body).unwrap();
        // Extension is optional, as with `config/gateway`.
        dir.join("gateway")
    }

    #[test]
    fn missing_file_yields_defaults() {
        let _env = env_guard();
        let cfg = CoreConfig::load_from("/nonexistent/support/gateway").unwrap();
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.history_limit, DEFAULT_HISTORY_LIMIT);
        assert_eq!(cfg.storage_backend, StorageBackend::Sled);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let _env = env_guard();
        let dir = tempfile::tempdir().unwrap();
        let stem = write_config(
            dir.path(),
            "app_name = \"Help Desk\"\nport = 9100\nstorage_backend = \"memory\"\nhistory_limit = 4",
        );
        let cfg = CoreConfig::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(cfg.app_name, "Help Desk");
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.storage_backend, StorageBackend::Memory);
        assert_eq!(cfg.history_limit, 4);
        assert_eq!(cfg.storage_path, "./data");
    }

    #[test]
    fn environment_overrides_file() {
        let _env = env_guard();
        let dir = tempfile::tempdir().unwrap();
        let stem = write_config(dir.path(), "port = 9100\nhistory_limit = 4");
        std::env::set_var("SUPPORT__HISTORY_LIMIT", "7");
        let loaded = CoreConfig::load_from(stem.to_str().unwrap());
        std::env::remove_var("SUPPORT__HISTORY_LIMIT");
        let cfg = loaded.unwrap();
        assert_eq!(cfg.history_limit, 7);
        assert_eq!(cfg.port, 9100);
    }

    #[test]
    fn store_path_is_under_storage_path() {
        let cfg = CoreConfig {
            storage_path: "/var/lib/support".to_string(),
            ..CoreConfig::default()
        };
        assert_eq!(
            cfg.conversation_store_path(),
            std::path::PathBuf::from("/var/lib/support/support_conversations")
        );
    }
}
