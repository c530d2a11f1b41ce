//! Runtime configuration.
//!
//! Read from the environment, with command-line flags layered on top in `main`:
//! - `SPIRAL_DB_PATH` - SQLite database file (default: platform data directory)
//! - `SPIRAL_PORT` - Port for the HTTP API (default: `17020`)
//! - `SPIRAL_CHAT_URL` - Generation endpoint (default: `http://localhost:3000/api/chat`)
//! - `SPIRAL_CHAT_API_KEY` - Bearer token for the generation endpoint (optional)
//!
//! API security settings live in [`crate::api::SecurityConfig`].

use std::path::PathBuf;

use anyhow::Result;

use crate::db::Database;

pub const DEFAULT_PORT: u16 = 17020;
pub const DEFAULT_CHAT_URL: &str = "http://localhost:3000/api/chat";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: Option<PathBuf>,
    pub port: u16,
    pub chat_url: String,
    pub chat_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("SPIRAL_PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            db_path: lookup("SPIRAL_DB_PATH").map(PathBuf::from),
            port,
            chat_url: lookup("SPIRAL_CHAT_URL").unwrap_or_else(|| DEFAULT_CHAT_URL.to_string()),
            chat_api_key: lookup("SPIRAL_CHAT_API_KEY"),
        }
    }

    /// Open the configured database and bring its schema up to date.
    pub fn open_database(&self) -> Result<Database> {
        let db = match &self.db_path {
            Some(path) => Database::open(path.clone())?,
            None => Database::open_default()?,
        };
        db.migrate()?;
        Ok(db)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.chat_url, DEFAULT_CHAT_URL);
        assert!(config.db_path.is_none());
        assert!(config.chat_api_key.is_none());
    }

    #[test]
    fn variables_override_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SPIRAL_PORT", "8080"),
            ("SPIRAL_DB_PATH", "/tmp/spiral/test.db"),
            ("SPIRAL_CHAT_URL", "http://chat.internal/api/chat"),
            ("SPIRAL_CHAT_API_KEY", "secret"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.port, 8080);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/spiral/test.db")));
        assert_eq!(config.chat_url, "http://chat.internal/api/chat");
        assert_eq!(config.chat_api_key, Some("secret".to_string()));
    }

    #[test]
    fn invalid_port_falls_back_to_default() {
        let config = Config::from_lookup(|key| (key == "SPIRAL_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn open_database_creates_file_and_migrates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("spiral.db");
        let config = Config {
            db_path: Some(path.clone()),
            ..Config::from_lookup(|_| None)
        };

        let db = config.open_database().unwrap();
        assert!(path.exists());
        assert!(db.list_sessions_by_owner("nobody").unwrap().is_empty());
    }
}
