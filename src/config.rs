use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// HTTP port to listen on.
    pub port: u16,

    /// Log level for tracing (e.g. "info", "debug").
    pub log_level: String,

    /// Path to the SQLite database file.
    pub database_path: String,

    pub server_version: String,

    /// Capacity of the update broadcast channel.
    ///
    /// A WebSocket subscriber that falls more than this many events behind
    /// is disconnected and has to reconnect for a fresh snapshot.
    pub channel_capacity: usize,
}

impl AppConfig {
    pub fn load_from_file(path: &str) -> Self {
        let file = fs::read_to_string(Path::new(path))
            .expect("Failed to read config.json");

        serde_json::from_str::<AppConfig>(&file)
            .expect("Invalid config.json")
    }
}
