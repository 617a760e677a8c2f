use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum ClaimsError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("Database connection failed: {0}")]
    Connectivity(String),

    #[error("Database query failed: {0}")]
    Query(String),

    #[error("Claim not found: {0}")]
    NotFound(i64),
}

impl ClaimsError {
    /// Failure to obtain a connection from the pool.
    pub fn connectivity(err: sqlx::Error) -> Self {
        Self::Connectivity(err.to_string())
    }

    /// Failure while executing a statement or decoding its rows.
    pub fn query(err: sqlx::Error) -> Self {
        Self::Query(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClaimsError>;
