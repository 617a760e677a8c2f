use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    claim::{Claim, ClaimSummary, RiskyClaim},
    error::{ClaimsError, Result},
    filter::{ClaimFilter, SearchParams},
    storage::ClaimStore,
};

/// The five read operations over the claims table.
#[derive(Clone)]
pub struct ClaimsQueryService {
    store: Arc<dyn ClaimStore>,
}

impl ClaimsQueryService {
    pub fn new(store: Arc<dyn ClaimStore>) -> Self {
        Self { store }
    }

    /// Every claim, summary columns only.
    pub async fn list_claims(&self) -> Result<Vec<ClaimSummary>> {
        let claims = self.store.fetch_summaries(&ClaimFilter::All).await?;
        debug!(count = claims.len(), "Listed claims");
        Ok(claims)
    }

    /// The full record for `claim_id`. When several rows share the id the
    /// first one returned wins.
    pub async fn get_claim_by_id(&self, claim_id: i64) -> Result<Claim> {
        self.store
            .fetch_claim(claim_id)
            .await?
            .ok_or(ClaimsError::NotFound(claim_id))
    }

    pub async fn list_risky_claims(&self) -> Result<Vec<RiskyClaim>> {
        self.project(&ClaimFilter::Risky).await
    }

    pub async fn list_suspicious_claims(&self) -> Result<Vec<RiskyClaim>> {
        self.project(&ClaimFilter::Suspicious).await
    }

    pub async fn search_claims(&self, params: SearchParams) -> Result<Vec<ClaimSummary>> {
        info!(
            location = ?params.location(),
            status = ?params.status(),
            "Searching claims"
        );
        self.project(&ClaimFilter::Search(params)).await
    }

    /// Shut the backing store down once the server has drained.
    pub async fn close(&self) {
        info!("Closing claim store");
        self.store.close().await;
    }

    async fn project<T: From<Claim>>(&self, filter: &ClaimFilter) -> Result<Vec<T>> {
        let claims = self.store.fetch_claims(filter).await?;
        debug!(count = claims.len(), filter = ?filter, "Fetched claims");
        Ok(claims.into_iter().map(T::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::connection::ConnectionProvider;
    use crate::storage::InMemoryClaimStore;
    use crate::storage_redshift::RedshiftClaimStore;
    use crate::test_support::{claim, scenario_claims};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn service(claims: Vec<Claim>) -> ClaimsQueryService {
        ClaimsQueryService::new(Arc::new(InMemoryClaimStore::new(claims)))
    }

    fn search(location: Option<&str>, status: Option<&str>) -> SearchParams {
        SearchParams::new(location.map(str::to_string), status.map(str::to_string))
    }

    fn ids<T>(rows: &[T], id: impl Fn(&T) -> i64) -> Vec<i64> {
        rows.iter().map(id).collect()
    }

    #[tokio::test]
    async fn risky_claims_scenario() {
        let svc = service(scenario_claims());
        let risky = svc.list_risky_claims().await.unwrap();
        assert_eq!(ids(&risky, |c| c.claim_id), vec![2]);
        assert_eq!(risky[0].suspicious_claim_score, Some(Decimal::from(3)));
        assert_eq!(risky[0].risk_level.as_deref(), Some("Suspicious"));
    }

    #[tokio::test]
    async fn search_scenario() {
        let svc = service(scenario_claims());

        let by_location = svc.search_claims(search(Some("NY"), None)).await.unwrap();
        assert_eq!(ids(&by_location, |c| c.claim_id), vec![1, 2]);

        let both = svc.search_claims(search(Some("NY"), Some("open"))).await.unwrap();
        assert_eq!(ids(&both, |c| c.claim_id), vec![1]);

        let none = svc.search_claims(search(Some("NY"), Some("pending"))).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn unfiltered_search_equals_the_listing() {
        let svc = service(scenario_claims());
        let listed = svc.list_claims().await.unwrap();
        let searched = svc.search_claims(SearchParams::default()).await.unwrap();
        assert_eq!(listed, searched);
    }

    #[tokio::test]
    async fn missing_claim_is_not_found() {
        let svc = service(scenario_claims());
        let err = svc.get_claim_by_id(999).await.unwrap_err();
        assert!(matches!(err, ClaimsError::NotFound(999)));
    }

    #[tokio::test]
    async fn get_claim_returns_the_stored_row() {
        let claims = scenario_claims();
        let svc = service(claims.clone());
        for stored in claims {
            let fetched = svc.get_claim_by_id(stored.claim_id).await.unwrap();
            assert_eq!(fetched, stored);
        }
    }

    #[tokio::test]
    async fn risky_result_is_exactly_the_matching_set() {
        let claims = vec![
            claim(1, "NY", "open", "Low", 0, 0),
            claim(2, "NY", "open", "Low", 1, 0),
            claim(3, "LA", "closed", "Medium", 0, 2),
            claim(4, "LA", "closed", "Medium", 0, 1),
            claim(5, "SF", "pending", "High", 1, 5),
        ];
        let svc = service(claims.clone());
        let risky: Vec<i64> = ids(&svc.list_risky_claims().await.unwrap(), |c| c.claim_id);

        for c in &claims {
            let qualifies = c.high_claim_flag == Some(1)
                || c.suspicious_claim_score.is_some_and(|s| s >= Decimal::from(2));
            assert_eq!(risky.contains(&c.claim_id), qualifies, "claim {}", c.claim_id);
        }
    }

    #[tokio::test]
    async fn fractional_scores_are_compared_against_the_threshold() {
        let mut above = claim(1, "NY", "open", "Low", 0, 0);
        above.suspicious_claim_score = Some(Decimal::new(25, 1));
        let mut below = claim(2, "NY", "open", "Low", 0, 0);
        below.suspicious_claim_score = Some(Decimal::new(15, 1));
        let svc = service(vec![above, below]);

        let risky = svc.list_risky_claims().await.unwrap();
        assert_eq!(ids(&risky, |c| c.claim_id), vec![1]);
        assert_eq!(risky[0].suspicious_claim_score, Some(Decimal::new(25, 1)));
    }

    #[derive(Default)]
    struct ClosingStore {
        closed: AtomicBool,
    }

    #[async_trait]
    impl ClaimStore for ClosingStore {
        async fn fetch_summaries(&self, _filter: &ClaimFilter) -> Result<Vec<ClaimSummary>> {
            Ok(Vec::new())
        }

        async fn fetch_claims(&self, _filter: &ClaimFilter) -> Result<Vec<Claim>> {
            Ok(Vec::new())
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn close_reaches_the_store() {
        let store = Arc::new(ClosingStore::default());
        let svc = ClaimsQueryService::new(store.clone());
        assert!(!store.closed.load(Ordering::SeqCst));
        svc.close().await;
        assert!(store.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn suspicious_listing_ignores_other_casings() {
        let svc = service(vec![
            claim(1, "NY", "open", "Suspicious", 0, 0),
            claim(2, "NY", "open", "suspicious", 0, 0),
            claim(3, "NY", "open", "Low", 1, 4),
        ]);
        let suspicious = svc.list_suspicious_claims().await.unwrap();
        assert_eq!(ids(&suspicious, |c| c.claim_id), vec![1]);
    }

    #[tokio::test]
    async fn configuration_errors_reach_every_operation() {
        let store = RedshiftClaimStore::new(ConnectionProvider::unconfigured(
            ConfigError::Missing("REDSHIFT_USER"),
        ));
        let svc = ClaimsQueryService::new(Arc::new(store));

        let errors = [
            svc.list_claims().await.unwrap_err(),
            svc.get_claim_by_id(1).await.unwrap_err(),
            svc.list_risky_claims().await.unwrap_err(),
            svc.list_suspicious_claims().await.unwrap_err(),
            svc.search_claims(SearchParams::default()).await.unwrap_err(),
        ];
        for err in errors {
            assert!(matches!(err, ClaimsError::Configuration(_)));
            assert!(err.to_string().contains("REDSHIFT_USER"));
        }
    }
}
