//! Ad hoc SQL gateway: store resolution, read/write classification, timed execution.

use crate::error::AppError;
use crate::response::SqlExecutionResult;
use crate::store::StoreRegistry;
use regex::Regex;
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatementKind {
    Read,
    Write,
}

const READ_PREFIX: &str = r"(?i)^\s*(select|with|show|describe|explain)\b";

/// Leading keyword decides: SELECT, WITH, SHOW, DESCRIBE, EXPLAIN read; anything else writes.
pub fn classify(sql: &str) -> Result<StatementKind, AppError> {
    let re = Regex::new(READ_PREFIX).map_err(|e| AppError::Validation(format!("statement classifier: {}", e)))?;
    Ok(if re.is_match(sql) {
        StatementKind::Read
    } else {
        StatementKind::Write
    })
}

pub struct SqlGateway;

impl SqlGateway {
    pub async fn execute(stores: &StoreRegistry, sql: &str, store_id: Option<&str>) -> Result<SqlExecutionResult, AppError> {
        if sql.trim().is_empty() {
            return Err(AppError::Validation("sql must not be empty".into()));
        }
        let (resolved, store) = stores.resolve(store_id)?;
        let kind = classify(sql)?;
        tracing::info!(store_id = %resolved, kind = ?kind, "executing ad hoc sql");
        let started = Instant::now();
        let result = match kind {
            StatementKind::Read => {
                let table = store.query(sql).await?;
                let row_count = table.rows.len();
                SqlExecutionResult {
                    has_tabular_result: true,
                    columns: Some(table.columns),
                    rows: Some(table.rows),
                    row_count: Some(row_count),
                    rows_affected: None,
                    elapsed_ms: 0,
                }
            }
            StatementKind::Write => SqlExecutionResult {
                has_tabular_result: false,
                columns: None,
                rows: None,
                row_count: None,
                rows_affected: Some(store.execute(sql).await?),
                elapsed_ms: 0,
            },
        };
        Ok(SqlExecutionResult {
            elapsed_ms: started.elapsed().as_millis() as u64,
            ..result
        })
    }
}
