//! Warehouse connection settings read from the environment.

use std::fmt;
use std::str::FromStr;

use sqlx::postgres::PgSslMode;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5439;
pub const DEFAULT_DATABASE: &str = "dev";
pub const DEFAULT_TABLE: &str = "insurance_ai.ai_claim_explanations";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

pub mod env_keys {
    pub const HOST: &str = "REDSHIFT_HOST";
    pub const PORT: &str = "REDSHIFT_PORT";
    pub const DATABASE: &str = "REDSHIFT_DB";
    pub const USER: &str = "REDSHIFT_USER";
    pub const PASSWORD: &str = "REDSHIFT_PASSWORD";
    pub const SSL_MODE: &str = "REDSHIFT_SSLMODE";
    pub const MAX_CONNECTIONS: &str = "REDSHIFT_MAX_CONNECTIONS";
    pub const TABLE: &str = "CLAIMS_TABLE";
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Clone)]
pub struct RedshiftConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    /// Fully qualified claims table, e.g. `schema.table`.
    pub table: String,
    pub max_connections: u32,
    pub ssl_mode: PgSslMode,
}

impl RedshiftConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let host = required(env_keys::HOST)?;
        let port = match get(env_keys::PORT) {
            Some(raw) => parse_number(env_keys::PORT, &raw)?,
            None => DEFAULT_PORT,
        };
        let database = get(env_keys::DATABASE).unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let user = required(env_keys::USER)?;
        let password = required(env_keys::PASSWORD)?;

        let table = get(env_keys::TABLE).unwrap_or_else(|| DEFAULT_TABLE.to_string());
        validate_table_name(&table)?;

        let max_connections = match get(env_keys::MAX_CONNECTIONS) {
            Some(raw) => parse_number(env_keys::MAX_CONNECTIONS, &raw)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                name: env_keys::MAX_CONNECTIONS,
                reason: "must be at least 1".to_string(),
            });
        }

        let ssl_mode = match get(env_keys::SSL_MODE) {
            Some(raw) => PgSslMode::from_str(raw.trim()).map_err(|e| ConfigError::Invalid {
                name: env_keys::SSL_MODE,
                reason: e.to_string(),
            })?,
            None => PgSslMode::Prefer,
        };

        Ok(Self {
            host,
            port,
            database,
            user,
            password,
            table,
            max_connections,
            ssl_mode,
        })
    }
}

impl fmt::Debug for RedshiftConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedshiftConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("table", &self.table)
            .field("max_connections", &self.max_connections)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

fn parse_number<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        name,
        reason: format!("{raw:?}: {e}"),
    })
}

/// The table name is spliced into SQL text, so only plain `table` or
/// `schema.table` identifiers are accepted.
pub fn validate_table_name(table: &str) -> Result<(), ConfigError> {
    let segments: Vec<&str> = table.split('.').collect();
    let valid = segments.len() <= 2
        && segments.iter().all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });

    if valid {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            name: env_keys::TABLE,
            reason: format!("{table:?} is not a valid table identifier"),
        })
    }
}
