// ABOUTME: Environment-driven server configuration
// ABOUTME: Port, CORS origin, and database path with validated parsing

use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
}

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub cors_origin: String,
    pub database_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_str = env::var("PORT").unwrap_or_else(|_| "4600".to_string());

        let port = port_str.parse::<u16>()?;
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let cors_origin =
            env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let database_path = env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/taskhive.db"));

        Ok(Config {
            port,
            cors_origin,
            database_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env mutation is process-wide, so both cases run inside one test.
    #[test]
    fn test_from_env() {
        std::env::remove_var("PORT");
        std::env::remove_var("CORS_ORIGIN");
        std::env::remove_var("DATABASE_PATH");

        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 4600);
        assert_eq!(config.database_path, PathBuf::from("data/taskhive.db"));

        std::env::set_var("PORT", "0");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::PortOutOfRange(0)));
        std::env::remove_var("PORT");
    }
}
