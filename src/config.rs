use std::env;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: Option<String>,
    pub public_base_url: Option<String>,
    pub store_backend: StoreBackend,
    pub bind_host: String,
    pub bind_port: u16,
    pub db_max_connections: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            public_base_url: None,
            store_backend: StoreBackend::Postgres,
            bind_host: "127.0.0.1".to_string(),
            bind_port: 8080,
            db_max_connections: 5,
        }
    }
}

impl Settings {
    /// Reads the process environment. Call `dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let store_backend = match non_empty("STORE_BACKEND").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(AppError::ConfigurationError(format!(
                    "STORE_BACKEND must be 'postgres' or 'memory', got '{}'",
                    other
                )))
            }
        };
        let database_url = non_empty("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(AppError::ConfigurationError(
                "DATABASE_URL is required for the postgres store".to_string(),
            ));
        }
        let bind_port = match non_empty("BIND_PORT") {
            Some(v) => v
                .parse()
                .map_err(|_| AppError::ConfigurationError(format!("BIND_PORT is not a port number: '{}'", v)))?,
            None => defaults.bind_port,
        };
        let db_max_connections = match non_empty("DB_MAX_CONNECTIONS") {
            Some(v) => v.parse().map_err(|_| {
                AppError::ConfigurationError(format!("DB_MAX_CONNECTIONS is not a number: '{}'", v))
            })?,
            None => defaults.db_max_connections,
        };

        Ok(Self {
            database_url,
            public_base_url: non_empty("PUBLIC_BASE_URL").map(|url| url.trim_end_matches('/').to_string()),
            store_backend,
            bind_host: non_empty("BIND_HOST").unwrap_or(defaults.bind_host),
            bind_port,
            db_max_connections,
        })
    }

    pub fn base_url(&self) -> Result<&str, AppError> {
        self.public_base_url
            .as_deref()
            .ok_or_else(|| AppError::ConfigurationError("PUBLIC_BASE_URL is not set".to_string()))
    }
}
