//! Row filters and the SQL they render to.
//!
//! Every filter has two readings that must agree: [`ClaimFilter::predicate`]
//! renders a parameterized `WHERE` clause for the warehouse, and
//! [`ClaimFilter::matches`] evaluates the same condition against a decoded
//! [`Claim`] for the in-memory store.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::claim::Claim;

/// Risk level that marks a claim as suspicious. Compared case-sensitively.
pub const SUSPICIOUS_RISK_LEVEL: &str = "Suspicious";

/// Minimum `suspicious_claim_score` for a claim to count as risky.
pub const RISKY_SCORE_THRESHOLD: i64 = 2;

/// Optional equality filters for the search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchParams {
    pub location: Option<String>,
    pub status: Option<String>,
}

impl SearchParams {
    pub fn new(location: Option<String>, status: Option<String>) -> Self {
        Self { location, status }
    }

    /// Location filter, if one was supplied and is non-empty.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref().filter(|value| !value.is_empty())
    }

    /// Status filter, if one was supplied and is non-empty.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref().filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimFilter {
    All,
    ById(i64),
    /// `high_claim_flag = 1 OR suspicious_claim_score >= 2`
    Risky,
    /// `risk_level = 'Suspicious'`
    Suspicious,
    Search(SearchParams),
}

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Int(i64),
    Text(String),
}

/// Rendered `WHERE` clause with its positional bind values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub clause: Option<String>,
    pub binds: Vec<BindValue>,
}

impl ClaimFilter {
    pub fn predicate(&self) -> Predicate {
        match self {
            ClaimFilter::All => Predicate {
                clause: None,
                binds: Vec::new(),
            },
            ClaimFilter::ById(id) => Predicate {
                clause: Some("claim_id = $1".to_string()),
                binds: vec![BindValue::Int(*id)],
            },
            ClaimFilter::Risky => Predicate {
                clause: Some(format!(
                    "high_claim_flag = 1 OR suspicious_claim_score >= {RISKY_SCORE_THRESHOLD}"
                )),
                binds: Vec::new(),
            },
            ClaimFilter::Suspicious => Predicate {
                clause: Some(format!("risk_level = '{SUSPICIOUS_RISK_LEVEL}'")),
                binds: Vec::new(),
            },
            ClaimFilter::Search(params) => {
                let mut clause = String::from("1=1");
                let mut binds = Vec::new();
                // location before status
                for (column, value) in [("location", params.location()), ("status", params.status())] {
                    if let Some(value) = value {
                        binds.push(BindValue::Text(value.to_string()));
                        clause.push_str(&format!(" AND {column} = ${}", binds.len()));
                    }
                }
                Predicate {
                    clause: Some(clause),
                    binds,
                }
            }
        }
    }

    /// Evaluate the filter against a decoded claim. NULL never matches, as in SQL.
    pub fn matches(&self, claim: &Claim) -> bool {
        match self {
            ClaimFilter::All => true,
            ClaimFilter::ById(id) => claim.claim_id == *id,
            ClaimFilter::Risky => {
                claim.high_claim_flag == Some(1)
                    || claim
                        .suspicious_claim_score
                        .is_some_and(|score| score >= Decimal::from(RISKY_SCORE_THRESHOLD))
            }
            ClaimFilter::Suspicious => claim.risk_level.as_deref() == Some(SUSPICIOUS_RISK_LEVEL),
            ClaimFilter::Search(params) => {
                let location_ok = params
                    .location()
                    .is_none_or(|wanted| claim.location.as_deref() == Some(wanted));
                let status_ok = params
                    .status()
                    .is_none_or(|wanted| claim.status.as_deref() == Some(wanted));
                location_ok && status_ok
            }
        }
    }
}

/// Render `SELECT <columns> FROM <table> [WHERE ...]` for a filter.
///
/// `table` must already be a validated identifier; it is the only piece of
/// text not supplied by this module.
pub fn select_sql(table: &str, columns: &[&str], filter: &ClaimFilter) -> (String, Vec<BindValue>) {
    let Predicate { clause, binds } = filter.predicate();
    let mut sql = format!("SELECT {} FROM {}", columns.join(", "), table);
    if let Some(clause) = clause {
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
    }
    (sql, binds)
}
