//! The claim record and the projections served to clients.
//!
//! Rows are decoded positionally: the column order in [`CLAIM_COLUMNS`] is the
//! layout of the claims table and every projection is derived from the decoded
//! [`Claim`] rather than from raw row indices.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{Column, FromRow, Row, TypeInfo};

/// Full positional layout of the claims table.
pub const CLAIM_COLUMNS: [&str; 13] = [
    "claim_id",
    "customer_id",
    "claim_amount",
    "location",
    "claim_type",
    "status",
    "is_zero_amount",
    "is_missing_location",
    "high_claim_flag",
    "duplicate_claim_flag",
    "suspicious_claim_score",
    "risk_level",
    "ai_explanation",
];

/// Columns read by the plain listing.
pub const SUMMARY_COLUMNS: [&str; 7] = [
    "claim_id",
    "customer_id",
    "claim_amount",
    "location",
    "claim_type",
    "status",
    "risk_level",
];

/// A claim row with its derived risk signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_id: i64,
    pub customer_id: Option<i64>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub claim_amount: Option<Decimal>,
    pub location: Option<String>,
    pub claim_type: Option<String>,
    pub status: Option<String>,
    pub is_zero_amount: Option<i64>,
    pub is_missing_location: Option<i64>,
    pub high_claim_flag: Option<i64>,
    pub duplicate_claim_flag: Option<i64>,
    #[serde(with = "score")]
    pub suspicious_claim_score: Option<Decimal>,
    pub risk_level: Option<String>,
    pub ai_explanation: Option<String>,
}

/// Seven-field view used by the listing and search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSummary {
    pub claim_id: i64,
    pub customer_id: Option<i64>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub claim_amount: Option<Decimal>,
    pub location: Option<String>,
    pub claim_type: Option<String>,
    pub status: Option<String>,
    pub risk_level: Option<String>,
}

/// Eight-field view used by the risky and suspicious endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskyClaim {
    pub claim_id: i64,
    pub customer_id: Option<i64>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub claim_amount: Option<Decimal>,
    pub location: Option<String>,
    pub claim_type: Option<String>,
    pub status: Option<String>,
    pub risk_level: Option<String>,
    #[serde(with = "score")]
    pub suspicious_claim_score: Option<Decimal>,
}

impl From<Claim> for ClaimSummary {
    fn from(claim: Claim) -> Self {
        Self {
            claim_id: claim.claim_id,
            customer_id: claim.customer_id,
            claim_amount: claim.claim_amount,
            location: claim.location,
            claim_type: claim.claim_type,
            status: claim.status,
            risk_level: claim.risk_level,
        }
    }
}

impl From<Claim> for RiskyClaim {
    fn from(claim: Claim) -> Self {
        Self {
            claim_id: claim.claim_id,
            customer_id: claim.customer_id,
            claim_amount: claim.claim_amount,
            location: claim.location,
            claim_type: claim.claim_type,
            status: claim.status,
            risk_level: claim.risk_level,
            suspicious_claim_score: claim.suspicious_claim_score,
        }
    }
}

impl<'r> FromRow<'r, PgRow> for Claim {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            claim_id: required_int(row, 0)?,
            customer_id: int_at(row, 1)?,
            claim_amount: decimal_at(row, 2)?,
            location: row.try_get(3)?,
            claim_type: row.try_get(4)?,
            status: row.try_get(5)?,
            is_zero_amount: int_at(row, 6)?,
            is_missing_location: int_at(row, 7)?,
            high_claim_flag: int_at(row, 8)?,
            duplicate_claim_flag: int_at(row, 9)?,
            suspicious_claim_score: decimal_at(row, 10)?,
            risk_level: row.try_get(11)?,
            ai_explanation: row.try_get(12)?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for ClaimSummary {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            claim_id: required_int(row, 0)?,
            customer_id: int_at(row, 1)?,
            claim_amount: decimal_at(row, 2)?,
            location: row.try_get(3)?,
            claim_type: row.try_get(4)?,
            status: row.try_get(5)?,
            risk_level: row.try_get(6)?,
        })
    }
}

fn type_name(row: &PgRow, index: usize) -> Result<String, sqlx::Error> {
    let column = row.try_column(index)?;
    Ok(column.type_info().name().to_ascii_uppercase())
}

fn decode_error(row: &PgRow, index: usize, message: String) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: row
            .try_column(index)
            .map(|c| c.name().to_string())
            .unwrap_or_else(|_| index.to_string()),
        source: message.into(),
    }
}

/// Integer-like column; the warehouse may store flags and ids at any width.
fn int_at(row: &PgRow, index: usize) -> Result<Option<i64>, sqlx::Error> {
    match type_name(row, index)?.as_str() {
        "INT2" => Ok(row.try_get::<Option<i16>, _>(index)?.map(i64::from)),
        "INT4" => Ok(row.try_get::<Option<i32>, _>(index)?.map(i64::from)),
        "INT8" => row.try_get::<Option<i64>, _>(index),
        "BOOL" => Ok(row.try_get::<Option<bool>, _>(index)?.map(i64::from)),
        "NUMERIC" => match row.try_get::<Option<Decimal>, _>(index)? {
            Some(value) if value.fract().is_zero() => value
                .to_i64()
                .map(Some)
                .ok_or_else(|| decode_error(row, index, format!("{value} out of range"))),
            Some(value) => Err(decode_error(
                row,
                index,
                format!("expected an integral value, found {value}"),
            )),
            None => Ok(None),
        },
        other => Err(decode_error(
            row,
            index,
            format!("unsupported SQL type {other} for an integer column"),
        )),
    }
}

fn required_int(row: &PgRow, index: usize) -> Result<i64, sqlx::Error> {
    int_at(row, index)?.ok_or_else(|| decode_error(row, index, "unexpected NULL".to_string()))
}

/// Any numeric column, carried exactly as a decimal.
fn decimal_at(row: &PgRow, index: usize) -> Result<Option<Decimal>, sqlx::Error> {
    match type_name(row, index)?.as_str() {
        "NUMERIC" => row.try_get::<Option<Decimal>, _>(index),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|v| float_to_decimal(row, index, f64::from(v)))
            .transpose(),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(index)?
            .map(|v| float_to_decimal(row, index, v))
            .transpose(),
        "INT2" | "INT4" | "INT8" => Ok(int_at(row, index)?.map(Decimal::from)),
        other => Err(decode_error(
            row,
            index,
            format!("unsupported SQL type {other} for a numeric column"),
        )),
    }
}

fn float_to_decimal(row: &PgRow, index: usize, value: f64) -> Result<Decimal, sqlx::Error> {
    Decimal::try_from(value).map_err(|e| decode_error(row, index, e.to_string()))
}

/// Scores serialize as JSON integers when whole and as floats otherwise.
mod score {
    use rust_decimal::Decimal;
    use rust_decimal::prelude::ToPrimitive;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(score) if score.fract().is_zero() => match score.to_i64() {
                Some(whole) => serializer.serialize_i64(whole),
                None => rust_decimal::serde::float_option::serialize(value, serializer),
            },
            _ => rust_decimal::serde::float_option::serialize(value, serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        rust_decimal::serde::float_option::deserialize(deserializer)
    }
}
