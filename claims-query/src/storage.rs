use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    claim::{Claim, ClaimSummary},
    error::Result,
    filter::ClaimFilter,
};

/// Read access to the claims table.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Rows matching `filter`, reading only the summary columns.
    async fn fetch_summaries(&self, filter: &ClaimFilter) -> Result<Vec<ClaimSummary>>;

    /// Full rows matching `filter`, in the store's natural order.
    async fn fetch_claims(&self, filter: &ClaimFilter) -> Result<Vec<Claim>>;

    /// First row whose `claim_id` equals `id`.
    async fn fetch_claim(&self, id: i64) -> Result<Option<Claim>> {
        Ok(self
            .fetch_claims(&ClaimFilter::ById(id))
            .await?
            .into_iter()
            .next())
    }

    /// Release backend resources. Called once, after the last request.
    async fn close(&self) {}
}

/// In-memory implementation of ClaimStore, preserving insertion order.
#[derive(Clone, Default)]
pub struct InMemoryClaimStore {
    claims: Arc<Vec<Claim>>,
}

impl InMemoryClaimStore {
    pub fn new(claims: Vec<Claim>) -> Self {
        Self {
            claims: Arc::new(claims),
        }
    }
}

#[async_trait]
impl ClaimStore for InMemoryClaimStore {
    async fn fetch_summaries(&self, filter: &ClaimFilter) -> Result<Vec<ClaimSummary>> {
        Ok(self
            .claims
            .iter()
            .filter(|claim| filter.matches(claim))
            .cloned()
            .map(ClaimSummary::from)
            .collect())
    }

    async fn fetch_claims(&self, filter: &ClaimFilter) -> Result<Vec<Claim>> {
        Ok(self
            .claims
            .iter()
            .filter(|claim| filter.matches(claim))
            .cloned()
            .collect())
    }
}
