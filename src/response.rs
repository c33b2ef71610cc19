//! Response envelopes.

use serde::Serialize;
use serde_json::Value;

/// List envelope: the requested window plus the unfiltered total.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub data: Vec<Value>,
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Result of one ad hoc statement. Read statements fill the tabular fields, writes fill
/// `rows_affected`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlExecutionResult {
    pub has_tabular_result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Vec<Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<u64>,
    pub elapsed_ms: u64,
}
