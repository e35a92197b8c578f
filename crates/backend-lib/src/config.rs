//! Configuration management.
//!
//! Settings are loaded from an optional `config/default` file and then
//! overridden by `APP_`-prefixed environment variables.

use config::{Config, ConfigError};
use serde::{Deserialize, Serialize};

/// Registry capacity used when nothing else is configured.
pub const DEFAULT_MAX_ROOMS: usize = 2500;

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub room: RoomSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomSettings {
    #[serde(default = "default_max_rooms")]
    pub max_rooms: usize,
}

impl Settings {
    /// Load configuration from the default file location and environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;
        config.try_deserialize()
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;
        config.try_deserialize()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_rooms() -> usize {
    DEFAULT_MAX_ROOMS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            room: RoomSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            max_rooms: default_max_rooms(),
        }
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.room.max_rooms, DEFAULT_MAX_ROOMS);
    }

    #[test]
    fn file_overrides() {
        let toml = r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [room]
            max_rooms = 500000
        "#;
        let settings: Settings = Config::builder()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.room.max_rooms, 500_000);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let toml = r#"
            [room]
            max_rooms = 2
        "#;
        let settings: Settings = Config::builder()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.room.max_rooms, 2);
        assert_eq!(settings.server.port, 8080);
    }
}
