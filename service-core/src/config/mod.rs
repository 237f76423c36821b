use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

/// Settings every service shares, loaded under that service's env prefix.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Layered load: an optional `configuration` file, overridden by
    /// `<PREFIX>_*` environment variables (e.g. `ESCROW_PORT`).
    pub fn load(env_prefix: &str) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix(env_prefix).separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
