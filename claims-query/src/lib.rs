pub mod claim;
pub mod config;
pub mod connection;
pub mod error;
pub mod filter;
pub mod service;
pub mod storage;
pub mod storage_redshift;

// Re-export commonly used types
pub use claim::{CLAIM_COLUMNS, Claim, ClaimSummary, RiskyClaim, SUMMARY_COLUMNS};
pub use config::{ConfigError, RedshiftConfig};
pub use connection::ConnectionProvider;
pub use error::{ClaimsError, Result};
pub use filter::{ClaimFilter, SearchParams};
pub use service::ClaimsQueryService;
pub use storage::{ClaimStore, InMemoryClaimStore};
pub use storage_redshift::RedshiftClaimStore;
