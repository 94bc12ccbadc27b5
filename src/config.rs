use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use ::config::{Config, ConfigError, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "trivia.toml";

#[derive(Deserialize, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
}

#[derive(Deserialize, Debug)]
pub struct DatabaseSettings {
    /// Connection string, e.g. `sqlite:trivia.db`
    pub url: SecretString,
    pub max_connections: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl ServerSettings {
    pub fn address(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Layers defaults, the optional TOML file, `TRIVIA_*` variables and finally `DATABASE_URL`.
///
/// An explicitly passed file must exist, the default one may be absent.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    dotenv::dotenv().ok();
    let file = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    Config::builder()
        .set_default("database.url", "sqlite:trivia.db")?
        .set_default("database.max_connections", 5)?
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("server.request_timeout_secs", 30)?
        .add_source(File::from(file).required(path.is_some()))
        .add_source(
            Environment::with_prefix("TRIVIA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("database.url", dotenv::var("DATABASE_URL").ok())?
        .build()?
        .try_deserialize()
}
