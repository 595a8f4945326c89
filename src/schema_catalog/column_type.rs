//! Column type classification for inferred schemas
//!
//! This module provides the minimal set of column types that discovered
//! tables are built from, plus the inference rules mapping JSON values
//! onto them.
//!
//! # Supported Types
//!
//! - `boolean` - True/False
//! - `integer` - Whole numbers within 32-bit range
//! - `bigint` - Whole numbers beyond 32-bit range
//! - `float` - Decimal numbers
//! - `timestamp` - Date/time values
//! - `json` - Irregular substructures kept inline as a blob
//! - `text` - Strings above the long-text threshold
//! - `string` - Short strings and anything else

use serde::{Deserialize, Serialize};
use std::fmt;

/// Magnitude above which a whole number no longer fits a 32-bit column
const INT32_MAX: i128 = (1 << 31) - 1;

/// Column type for a discovered table
///
/// Inference is a pure function of the sampled value (plus the configured
/// long-text threshold), so re-running discovery over the same corpus
/// always reproduces the same schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// True/False
    Boolean,

    /// Whole numbers within 32-bit range
    Integer,

    /// Whole numbers whose magnitude exceeds 2^31 - 1
    #[serde(rename = "bigint")]
    BigInteger,

    /// Decimal numbers
    Float,

    /// Date/time values (RFC 3339 or common date formats)
    Timestamp,

    /// Nested object/array kept inline as a blob column
    Json,

    /// Strings longer than the configured threshold
    Text,

    /// Short strings and null samples
    String,
}

impl ColumnType {
    /// Stable lowercase name used in schema exports and drift reports
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "boolean",
            ColumnType::Integer => "integer",
            ColumnType::BigInteger => "bigint",
            ColumnType::Float => "float",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Json => "json",
            ColumnType::Text => "text",
            ColumnType::String => "string",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Infer the column type for a sampled JSON value
///
/// Rules, in priority order:
/// 1. Booleans classify before numerics (a boolean is never an integer).
/// 2. Whole numbers with magnitude above 2^31 - 1 are `bigint`, else `integer`.
/// 3. Floating-point numbers are `float`.
/// 4. Strings recognized as a date/time representation are `timestamp`.
/// 5. Objects and arrays that stay inline are `json`.
/// 6. Strings longer than `long_text_threshold` are `text`, else `string`.
///
/// Null samples fall through to `string`, matching the nullable default
/// for columns first seen without a value.
pub fn infer_column_type(value: &serde_json::Value, long_text_threshold: usize) -> ColumnType {
    match value {
        serde_json::Value::Bool(_) => ColumnType::Boolean,
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                if (i as i128).abs() > INT32_MAX {
                    ColumnType::BigInteger
                } else {
                    ColumnType::Integer
                }
            } else if let Some(u) = n.as_u64() {
                if (u as i128) > INT32_MAX {
                    ColumnType::BigInteger
                } else {
                    ColumnType::Integer
                }
            } else {
                ColumnType::Float
            }
        }
        serde_json::Value::String(s) => {
            if is_timestamp_like(s) {
                ColumnType::Timestamp
            } else if s.chars().count() > long_text_threshold {
                ColumnType::Text
            } else {
                ColumnType::String
            }
        }
        serde_json::Value::Object(_) | serde_json::Value::Array(_) => ColumnType::Json,
        serde_json::Value::Null => ColumnType::String,
    }
}

/// Check whether a string is a recognizable date/time representation
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DD HH:MM:SS`, and bare
/// `YYYY-MM-DD` dates.
fn is_timestamp_like(s: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
        || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}
