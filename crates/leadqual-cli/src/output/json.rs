//! JSON output formatter

use leadqual_core::QualificationResult;
use serde::Serialize;

pub fn to_pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string()) + "\n"
}

/// Same shape the HTTP `/query` endpoint returns
pub fn format_qualification(result: &QualificationResult) -> String {
    to_pretty(result)
}
