pub mod error;
pub mod service;

pub use error::{ApiError, ApiResult};
pub use service::{AppState, CORRELATION_ID_HEADER, build_router, create_app_state};
