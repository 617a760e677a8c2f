use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Postgres;
use tracing::{debug, warn};

use crate::config::{ConfigError, RedshiftConfig, validate_table_name};
use crate::error::{ClaimsError, Result};

/// Hands out pooled warehouse connections.
///
/// The pool is created lazily, so building a provider never touches the
/// network. A provider built without valid configuration keeps the
/// configuration error and reports it on every `acquire`.
pub struct ConnectionProvider {
    pool: std::result::Result<PgPool, ConfigError>,
    table: String,
}

impl ConnectionProvider {
    pub fn new(config: &RedshiftConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(config.ssl_mode);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy_with(options);

        debug!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            max_connections = config.max_connections,
            "Created lazy warehouse connection pool"
        );

        Self {
            pool: Ok(pool),
            table: config.table.clone(),
        }
    }

    /// Provider over an existing pool. `table` is validated the same way as
    /// `CLAIMS_TABLE`.
    pub fn with_pool(
        pool: PgPool,
        table: impl Into<String>,
    ) -> std::result::Result<Self, ConfigError> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self {
            pool: Ok(pool),
            table,
        })
    }

    /// Provider that fails every acquisition with `err`.
    pub fn unconfigured(err: ConfigError) -> Self {
        Self {
            pool: Err(err),
            table: crate::config::DEFAULT_TABLE.to_string(),
        }
    }

    /// Read the configuration from the environment. Configuration problems
    /// are deferred to request time instead of aborting the process.
    pub fn from_env() -> Self {
        match RedshiftConfig::from_env() {
            Ok(config) => Self::new(&config),
            Err(e) => {
                warn!(error = %e, "Warehouse configuration incomplete; queries will fail");
                Self::unconfigured(e)
            }
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Borrow a connection. It returns to the pool when dropped.
    pub async fn acquire(&self) -> Result<PoolConnection<Postgres>> {
        let pool = self
            .pool
            .as_ref()
            .map_err(|e| ClaimsError::Configuration(e.clone()))?;
        pool.acquire().await.map_err(ClaimsError::connectivity)
    }

    /// Close the pool, waiting for borrowed connections to come back.
    pub async fn close(&self) {
        if let Ok(pool) = &self.pool {
            pool.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_provider_reports_the_missing_variable() {
        let provider = ConnectionProvider::unconfigured(ConfigError::Missing("REDSHIFT_HOST"));

        let err = provider.acquire().await.unwrap_err();
        assert!(matches!(
            err,
            ClaimsError::Configuration(ConfigError::Missing("REDSHIFT_HOST"))
        ));
        assert!(err.to_string().contains("REDSHIFT_HOST"));
    }

    #[tokio::test]
    async fn configured_provider_does_not_connect_eagerly() {
        let config = RedshiftConfig::from_lookup(|key| match key {
            "REDSHIFT_HOST" => Some("warehouse.invalid".to_string()),
            "REDSHIFT_USER" => Some("analyst".to_string()),
            "REDSHIFT_PASSWORD" => Some("secret".to_string()),
            "CLAIMS_TABLE" => Some("claims".to_string()),
            _ => None,
        })
        .unwrap();

        let provider = ConnectionProvider::new(&config);
        assert_eq!(provider.table(), "claims");
        provider.close().await;
    }

    #[tokio::test]
    async fn injected_pool_rejects_unsafe_table_names() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://analyst@warehouse.invalid/dev")
            .unwrap();
        let err = ConnectionProvider::with_pool(pool.clone(), "claims; DROP TABLE claims")
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::Invalid { name: "CLAIMS_TABLE", .. }));

        let provider = ConnectionProvider::with_pool(pool, "insurance_ai.claims").unwrap();
        assert_eq!(provider.table(), "insurance_ai.claims");
        provider.close().await;
    }
}
