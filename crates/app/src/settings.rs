//! Application settings loaded from `settings.toml`.

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
}

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level for the env filter (`trace`..`error`).
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

/// Database target: the literal string `memory`, or a sqlite file path.
#[derive(Clone, Debug, Deserialize)]
#[serde(from = "String")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl From<String> for Database {
    fn from(value: String) -> Self {
        match value.as_str() {
            "memory" => Self::Memory,
            _ => Self::Sqlite(value),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("settings"))
            .build()?
            .try_deserialize()
    }
}
