//! Client configuration loaded from environment variables.
//!
//! Every setting has a default so the client starts with zero configuration;
//! without a backend URL it simply runs in offline mode.

use std::path::PathBuf;
use std::time::Duration;

use sheep_shared::constants::{CHAT_WINDOW, CLICK_FLUSH_DELAY_MS};

/// Where the relational backend lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendTarget {
    SqliteFile(PathBuf),
    SqliteMemory,
}

/// Where the offline key-value store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalStorageLocation {
    /// `local.db` in the platform data directory.
    Default,
    Path(PathBuf),
    Memory,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend connection string.
    /// Env: `SHEEP_BACKEND_URL` (`sqlite://<path>` or `sqlite::memory:`)
    /// Default: none, which selects offline mode.
    pub backend_url: Option<String>,

    /// Env: `SHEEP_LOCAL_STORAGE` (a path, or `:memory:`)
    /// Default: platform data directory.
    pub local_storage: LocalStorageLocation,

    /// Quiet period after the last click before the batch is written.
    /// Env: `SHEEP_FLUSH_DELAY_MS`
    /// Default: 300 ms
    pub flush_delay: Duration,

    /// Number of chat messages kept in memory.
    /// Env: `SHEEP_CHAT_WINDOW`
    /// Default: 50
    pub chat_window: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            local_storage: LocalStorageLocation::Default,
            flush_delay: Duration::from_millis(CLICK_FLUSH_DELAY_MS),
            chat_window: CHAT_WINDOW,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("SHEEP_BACKEND_URL") {
            let url = url.trim().to_string();
            if !url.is_empty() {
                config.backend_url = Some(url);
            }
        }

        if let Some(val) = lookup("SHEEP_LOCAL_STORAGE") {
            config.local_storage = match val.trim() {
                "" => LocalStorageLocation::Default,
                ":memory:" => LocalStorageLocation::Memory,
                path => LocalStorageLocation::Path(PathBuf::from(path)),
            };
        }

        if let Some(val) = lookup("SHEEP_FLUSH_DELAY_MS") {
            match val.trim().parse::<u64>() {
                Ok(ms) => config.flush_delay = Duration::from_millis(ms),
                Err(_) => tracing::warn!(value = %val, "Invalid SHEEP_FLUSH_DELAY_MS, using default"),
            }
        }

        if let Some(val) = lookup("SHEEP_CHAT_WINDOW") {
            match val.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.chat_window = n,
                _ => tracing::warn!(value = %val, "Invalid SHEEP_CHAT_WINDOW, using default"),
            }
        }

        config
    }

    /// The backend to connect to, or `None` when offline mode is forced:
    /// no URL, a placeholder URL, or a scheme this client cannot open.
    pub fn backend_target(&self) -> Option<BackendTarget> {
        let url = self.backend_url.as_deref()?;
        if url.contains("placeholder") {
            tracing::warn!("backend URL is a placeholder, running offline");
            return None;
        }
        if url == "sqlite::memory:" {
            return Some(BackendTarget::SqliteMemory);
        }
        match url.strip_prefix("sqlite://") {
            Some(path) if !path.is_empty() => Some(BackendTarget::SqliteFile(PathBuf::from(path))),
            _ => {
                tracing::warn!(url = %url, "unsupported backend URL, running offline");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> ClientConfig {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = config(&[]);
        assert_eq!(config.flush_delay, Duration::from_millis(300));
        assert_eq!(config.chat_window, 50);
        assert_eq!(config.local_storage, LocalStorageLocation::Default);
        assert!(config.backend_target().is_none());
    }

    #[test]
    fn test_backend_urls() {
        let file = config(&[("SHEEP_BACKEND_URL", "sqlite:///tmp/sheep.db")]);
        assert_eq!(file.backend_target(), Some(BackendTarget::SqliteFile("/tmp/sheep.db".into())));

        let memory = config(&[("SHEEP_BACKEND_URL", "sqlite::memory:")]);
        assert_eq!(memory.backend_target(), Some(BackendTarget::SqliteMemory));

        let placeholder = config(&[("SHEEP_BACKEND_URL", "https://placeholder.example")]);
        assert!(placeholder.backend_target().is_none());

        let unknown = config(&[("SHEEP_BACKEND_URL", "postgres://db")]);
        assert!(unknown.backend_target().is_none());
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = config(&[
            ("SHEEP_FLUSH_DELAY_MS", "soon"),
            ("SHEEP_CHAT_WINDOW", "0"),
            ("SHEEP_LOCAL_STORAGE", ":memory:"),
        ]);
        assert_eq!(config.flush_delay, Duration::from_millis(300));
        assert_eq!(config.chat_window, 50);
        assert_eq!(config.local_storage, LocalStorageLocation::Memory);
    }
}
