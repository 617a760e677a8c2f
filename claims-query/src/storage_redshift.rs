use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, Postgres};
use tracing::debug;

use crate::{
    claim::{CLAIM_COLUMNS, Claim, ClaimSummary, SUMMARY_COLUMNS},
    connection::ConnectionProvider,
    error::{ClaimsError, Result},
    filter::{BindValue, ClaimFilter, select_sql},
    storage::ClaimStore,
};

/// ClaimStore backed by the analytic warehouse over the Postgres wire protocol.
pub struct RedshiftClaimStore {
    provider: ConnectionProvider,
}

impl RedshiftClaimStore {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self { provider }
    }

    async fn fetch<T>(&self, columns: &[&str], filter: &ClaimFilter) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let (sql, binds) = select_sql(self.provider.table(), columns, filter);
        debug!(sql = %sql, binds = binds.len(), "Executing claims query");

        let mut conn = self.provider.acquire().await?;
        let rows = bind_all(sqlx::query_as::<_, T>(&sql), binds)
            .fetch_all(&mut *conn)
            .await
            .map_err(ClaimsError::query)?;

        debug!(rows = rows.len(), "Claims query returned");
        Ok(rows)
    }
}

fn bind_all<'q, T>(
    mut query: QueryAs<'q, Postgres, T, PgArguments>,
    binds: Vec<BindValue>,
) -> QueryAs<'q, Postgres, T, PgArguments> {
    for value in binds {
        query = match value {
            BindValue::Int(v) => query.bind(v),
            BindValue::Text(v) => query.bind(v),
        };
    }
    query
}

#[async_trait]
impl ClaimStore for RedshiftClaimStore {
    async fn fetch_summaries(&self, filter: &ClaimFilter) -> Result<Vec<ClaimSummary>> {
        self.fetch(&SUMMARY_COLUMNS, filter).await
    }

    async fn fetch_claims(&self, filter: &ClaimFilter) -> Result<Vec<Claim>> {
        self.fetch(&CLAIM_COLUMNS, filter).await
    }

    async fn fetch_claim(&self, id: i64) -> Result<Option<Claim>> {
        let (sql, binds) = select_sql(self.provider.table(), &CLAIM_COLUMNS, &ClaimFilter::ById(id));
        debug!(sql = %sql, claim_id = id, "Fetching claim");

        let mut conn = self.provider.acquire().await?;
        bind_all(sqlx::query_as::<_, Claim>(&sql), binds)
            .fetch_optional(&mut *conn)
            .await
            .map_err(ClaimsError::query)
    }

    async fn close(&self) {
        debug!("Closing warehouse connection pool");
        self.provider.close().await;
    }
}
