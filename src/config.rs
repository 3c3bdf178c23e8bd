// src/config.rs
//! Runtime configuration.
//!
//! Values come from built-in defaults, overridden by process environment
//! variables. A `.env` file in the working directory is loaded into the
//! environment first.

use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};

const ENV_KEYS: &[&str] = &[
    "DATABASE_URL",
    "PORT",
    "MAX_CONNECTIONS",
    "LOG_LEVEL",
    "BINANCE_URL",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub max_connections: u32,
    pub log_level: String,
    pub binance_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            port: 3030,
            max_connections: 5,
            log_level: "info".to_string(),
            binance_url: "https://api.binance.com".to_string(),
        }
    }
}

impl Config {
    /// Defaults merged with the recognised environment variables.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Env::raw().only(ENV_KEYS))
    }

    /// Load `.env`, extract, and validate.
    pub fn load() -> Result<Self, figment::Error> {
        dotenvy::dotenv().ok();
        let config: Config = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), figment::Error> {
        if self.database_url.trim().is_empty() {
            return Err(figment::Error::from("DATABASE_URL must be set"));
        }
        if self.max_connections == 0 {
            return Err(figment::Error::from("MAX_CONNECTIONS must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn environment_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("DATABASE_URL", "postgres://localhost/polls");
            jail.set_env("PORT", "8080");
            jail.set_env("MAX_CONNECTIONS", "12");
            jail.set_env("LOG_LEVEL", "debug");
            jail.set_env("BINANCE_URL", "http://127.0.0.1:9000");

            let config: Config = Config::figment().extract()?;
            assert_eq!(config.database_url, "postgres://localhost/polls");
            assert_eq!(config.port, 8080);
            assert_eq!(config.max_connections, 12);
            assert_eq!(config.log_level, "debug");
            assert_eq!(config.binance_url, "http://127.0.0.1:9000");
            Ok(())
        });
    }

    #[test]
    fn unrelated_variables_are_ignored() {
        Jail::expect_with(|jail| {
            jail.set_env("DATABASE_URL", "postgres://localhost/polls");
            jail.set_env("POLL_SCHEMA_UNRELATED", "1");

            let config: Config = Config::figment().extract()?;
            assert_eq!(config.port, 3030);
            assert_eq!(config.max_connections, 5);
            Ok(())
        });
    }

    #[test]
    fn bad_port_fails_extraction() {
        Jail::expect_with(|jail| {
            jail.set_env("DATABASE_URL", "postgres://localhost/polls");
            jail.set_env("PORT", "not-a-port");
            assert!(Config::figment().extract::<Config>().is_err());
            Ok(())
        });
    }

    #[test]
    fn missing_database_url_is_rejected() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn zero_connections_is_rejected() {
        let config = Config {
            database_url: "postgres://localhost/polls".into(),
            max_connections: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
