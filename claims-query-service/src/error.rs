//! Translation of query failures into HTTP responses.
//!
//! | Failure        | Status | Body detail                          |
//! |----------------|--------|--------------------------------------|
//! | NotFound       | 404    | `Claim not found`                    |
//! | Configuration  | 500    | `Missing environment variable: NAME` |
//! | Connectivity   | 500    | `Database connection failed`         |
//! | Query          | 500    | `Database query failed`              |
//!
//! Database messages are logged, never returned to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use claims_query::ClaimsError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
#[error(transparent)]
pub struct ApiError(#[from] ClaimsError);

pub type ApiResult<T> = Result<Json<T>, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ClaimsError::NotFound(_) => StatusCode::NOT_FOUND,
            ClaimsError::Configuration(_)
            | ClaimsError::Connectivity(_)
            | ClaimsError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message.
    pub fn detail(&self) -> String {
        match &self.0 {
            ClaimsError::NotFound(_) => "Claim not found".to_string(),
            ClaimsError::Configuration(e) => e.to_string(),
            ClaimsError::Connectivity(_) => "Database connection failed".to_string(),
            ClaimsError::Query(_) => "Database query failed".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            info!(status = status.as_u16(), error = %self.0, "Request rejected");
        }

        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}
