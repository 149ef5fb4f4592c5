use config::{Config, ConfigError};
use serde::Deserialize;

pub mod domain;
pub mod infrastructure;

#[derive(Clone, Debug, Deserialize)]
pub struct BooklineConfig {
    pub database: Database,
    pub server: Server,
    pub logger: Logger,
}

impl BooklineConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("database.url", "sqlite:reservations.db")?
            .set_default("server.port", 5000)?
            .set_default("logger.level", "INFO")?
            .add_source(config::File::with_name("bookline").required(false))
            .add_source(config::Environment::with_prefix("BOOKLINE").separator("_"))
            .build()?
            .try_deserialize::<BooklineConfig>()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Database {
    pub url: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    pub port: u16,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Logger {
    pub level: Level,
}

#[derive(Clone, Debug, Deserialize)]
pub enum Level {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl From<&Level> for tracing::Level {
    fn from(value: &Level) -> Self {
        match value {
            Level::TRACE => tracing::Level::TRACE,
            Level::DEBUG => tracing::Level::DEBUG,
            Level::INFO => tracing::Level::INFO,
            Level::WARN => tracing::Level::WARN,
            Level::ERROR => tracing::Level::ERROR,
        }
    }
}
