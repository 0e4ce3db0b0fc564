//! Per-engine driver implementations.

pub mod galaxy;
pub mod mysql;
pub mod postgres;

/// Check if the query is a SELECT-type query.
///
/// Used by the driver engines to decide between fetch and execute paths;
/// the envelope's `affected_rows` stays 0 for everything matched here.
pub(crate) fn is_select_query(sql: &str) -> bool {
    let lower = sql.to_lowercase();
    let trimmed = lower.trim_start();
    trimmed.starts_with("select")
        || trimmed.starts_with("with")
        || trimmed.starts_with("show")
        || trimmed.starts_with("describe")
        || trimmed.starts_with("desc")
        || trimmed.starts_with("explain")
}
