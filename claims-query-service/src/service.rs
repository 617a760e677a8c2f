use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderValue, Request},
    middleware::{Next, from_fn},
    response::Json,
    routing::get,
};
use claims_query::{
    Claim, ClaimStore, ClaimSummary, ClaimsQueryService, ConnectionProvider, InMemoryClaimStore,
    RedshiftClaimStore, RiskyClaim, SearchParams,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, info};
use uuid::Uuid;

use crate::error::ApiResult;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct AppState {
    pub claims: ClaimsQueryService,
}

impl AppState {
    pub fn new(store: Arc<dyn ClaimStore>) -> Self {
        Self {
            claims: ClaimsQueryService::new(store),
        }
    }
}

/// State over the store selected by `STORE_BACKEND` (`redshift`, the
/// default, or `memory`).
pub fn create_app_state() -> AppState {
    let backend = std::env::var("STORE_BACKEND").unwrap_or_else(|_| "redshift".to_string());
    let store: Arc<dyn ClaimStore> = match backend.as_str() {
        "memory" => {
            info!("Using empty in-memory claim store");
            Arc::new(InMemoryClaimStore::default())
        }
        _ => {
            info!("Using warehouse claim store");
            Arc::new(RedshiftClaimStore::new(ConnectionProvider::from_env()))
        }
    };
    AppState::new(store)
}

/// Literal `/claims/*` routes are registered ahead of `/claims/{claim_id}`.
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/claims", get(list_claims))
        .route("/claims/risky", get(list_risky_claims))
        .route("/claims/suspicious", get(list_suspicious_claims))
        .route("/claims/search", get(search_claims))
        .route("/claims/{claim_id}", get(get_claim))
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(correlation_id_middleware))
                .layer(TraceLayer::new_for_http()),
        )
}

/// Tag every request with a correlation id and run it inside a span carrying it.
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, value.clone());
        let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
        let mut response = next.run(request).instrument(span).await;
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
        response
    } else {
        next.run(request).await
    }
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Claims API is working!" }))
}

async fn list_claims(State(state): State<AppState>) -> ApiResult<Vec<ClaimSummary>> {
    info!("Listing all claims");
    Ok(Json(state.claims.list_claims().await?))
}

async fn list_risky_claims(State(state): State<AppState>) -> ApiResult<Vec<RiskyClaim>> {
    info!("Listing risky claims");
    Ok(Json(state.claims.list_risky_claims().await?))
}

async fn list_suspicious_claims(State(state): State<AppState>) -> ApiResult<Vec<RiskyClaim>> {
    info!("Listing suspicious claims");
    Ok(Json(state.claims.list_suspicious_claims().await?))
}

async fn search_claims(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<ClaimSummary>> {
    Ok(Json(state.claims.search_claims(params).await?))
}

async fn get_claim(
    State(state): State<AppState>,
    Path(claim_id): Path<i64>,
) -> ApiResult<Claim> {
    info!(claim_id, "Getting claim");
    Ok(Json(state.claims.get_claim_by_id(claim_id).await?))
}
