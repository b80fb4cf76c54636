// ABOUTME: Configuration loading for aidm.
// ABOUTME: Reads ~/.aidm/config.toml and merges CLI overrides into a session context.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::address::ServerAddress;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Backend server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub socket_path: String,
    pub connect_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "http://localhost:5000".to_string(),
            socket_path: "/socket.io".to_string(),
            connect_timeout_seconds: 10,
        }
    }
}

/// Default session identifiers; any of them can be overridden on the command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub campaign_id: Option<i64>,
    pub session_id: Option<i64>,
    pub world_id: Option<i64>,
    pub player_id: Option<i64>,
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Values given on the command line, layered over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server: Option<String>,
    pub campaign_id: Option<i64>,
    pub session_id: Option<i64>,
    pub world_id: Option<i64>,
    pub player_id: Option<i64>,
    pub log_level: Option<String>,
}

/// Session identifiers after merging file and CLI values. `world_id` may
/// still need resolving against the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSession {
    pub server: ServerAddress,
    pub campaign_id: i64,
    pub session_id: Option<i64>,
    pub world_id: Option<i64>,
    pub player_id: i64,
}

impl Config {
    /// Load config from ~/.aidm/config.toml, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a specific file; a missing file yields defaults.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Directory holding config and logs.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".aidm")
    }

    /// Path to the config file.
    pub fn config_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Directory for log files.
    pub fn logs_dir() -> PathBuf {
        Self::home_dir().join("logs")
    }

    /// Apply CLI overrides.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(server) = &overrides.server {
            self.server.address = server.clone();
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
        let session = &mut self.session;
        session.campaign_id = overrides.campaign_id.or(session.campaign_id);
        session.session_id = overrides.session_id.or(session.session_id);
        session.world_id = overrides.world_id.or(session.world_id);
        session.player_id = overrides.player_id.or(session.player_id);
    }

    /// Validate the address and require the identifiers a chat cannot run without.
    pub fn resolve_session(&self) -> anyhow::Result<ResolvedSession> {
        let server = ServerAddress::parse(&self.server.address)?;
        let campaign_id = self
            .session
            .campaign_id
            .context("no campaign selected (pass --campaign or set session.campaign_id)")?;
        let player_id = self
            .session
            .player_id
            .context("no player selected (pass --player or set session.player_id)")?;
        Ok(ResolvedSession {
            server,
            campaign_id,
            session_id: self.session.session_id,
            world_id: self.session.world_id,
            player_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.server.address, "http://localhost:5000");
        assert_eq!(config.server.socket_path, "/socket.io");
        assert_eq!(config.logging.level, "info");
        assert!(config.session.campaign_id.is_none());
    }

    #[test]
    fn parse_config_toml() {
        let toml_str = r#"
[server]
address = "https://dm.example.com"
connect_timeout_seconds = 3

[session]
campaign_id = 2
session_id = 8
player_id = 5

[logging]
level = "debug"
file = "/tmp/aidm.log"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.address, "https://dm.example.com");
        assert_eq!(config.server.connect_timeout_seconds, 3);
        assert_eq!(config.server.socket_path, "/socket.io");
        assert_eq!(config.session.campaign_id, Some(2));
        assert_eq!(config.session.session_id, Some(8));
        assert_eq!(config.session.world_id, None);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/aidm.log")));
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut config = Config::default();
        config.session.campaign_id = Some(1);
        config.session.player_id = Some(1);
        config.apply(&Overrides {
            server: Some("http://10.0.0.2:5000".to_string()),
            player_id: Some(7),
            ..Default::default()
        });
        assert_eq!(config.server.address, "http://10.0.0.2:5000");
        assert_eq!(config.session.campaign_id, Some(1));
        assert_eq!(config.session.player_id, Some(7));
    }

    #[test]
    fn resolve_requires_campaign_and_player() {
        let mut config = Config::default();
        let err = config.resolve_session().unwrap_err();
        assert!(err.to_string().contains("campaign"));

        config.session.campaign_id = Some(1);
        let err = config.resolve_session().unwrap_err();
        assert!(err.to_string().contains("player"));

        config.session.player_id = Some(3);
        let resolved = config.resolve_session().unwrap();
        assert_eq!(resolved.player_id, 3);
        assert_eq!(resolved.session_id, None);
    }

    #[test]
    fn resolve_rejects_bad_address() {
        let mut config = Config::default();
        config.server.address = "   ".to_string();
        config.session.campaign_id = Some(1);
        config.session.player_id = Some(1);
        assert!(config.resolve_session().is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.address, "http://localhost:5000");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\naddress = 1").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("parsing"));
    }
}
