//! Normalized query results.
//!
//! This module contains:
//! - `Value` - A unified value type covering all supported engines
//! - `Cell` / `Row` - An ordered mapping of column name to value
//! - `ExecutionMetadata` - Timing and shape metadata for one execution
//! - `ResultEnvelope` - The result shape every executor returns

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unified value type that can represent any result value across all
/// supported engines, with NULL represented explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// 16-bit signed integer
    Int16(i16),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 32-bit floating point
    Float32(f32),
    /// 64-bit floating point
    Float64(f64),
    /// Decimal/numeric with arbitrary precision
    Decimal(Decimal),
    /// Text/string value
    Text(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Date without time
    Date(NaiveDate),
    /// Time without date
    Time(NaiveTime),
    /// Date and time without timezone
    DateTime(NaiveDateTime),
    /// Date and time with timezone (stored as UTC)
    DateTimeTz(DateTime<Utc>),
    /// UUID
    Uuid(Uuid),
    /// JSON value
    Json(serde_json::Value),
    /// Engine-specific type that doesn't map to a standard type.
    Other {
        /// The engine-specific type name
        type_name: String,
        /// String representation for display
        display: String,
    },
}

impl Value {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert this value to a canonical display string.
    ///
    /// Temporal values render in ISO-like forms so history snapshots are
    /// stable across engines.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int16(v) => v.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::Float32(v) => v.to_string(),
            Value::Float64(v) => v.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bytes(b) => format!("\\x{}", hex::encode(b)),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Time(t) => t.format("%H:%M:%S%.f").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            Value::DateTimeTz(dt) => dt.format("%Y-%m-%d %H:%M:%S%.f %Z").to_string(),
            Value::Uuid(u) => u.to_string(),
            Value::Json(j) => serde_json::to_string(j).unwrap_or_else(|_| "{}".to_string()),
            Value::Other { display, .. } => display.clone(),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// One named cell in a result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Column name
    pub column: String,
    /// The value of this cell
    pub value: Value,
}

impl Cell {
    pub fn new(column: impl Into<String>, value: Value) -> Self {
        Self { column: column.into(), value }
    }
}

/// A row of named cells, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Build a row from (column, value) pairs
    pub fn from_pairs(pairs: Vec<(String, Value)>) -> Self {
        Self {
            cells: pairs.into_iter().map(|(column, value)| Cell { column, value }).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Look up a value by column name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.iter().find(|c| c.column == column).map(|c| &c.value)
    }

    /// Column names in row order
    pub fn columns(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.column.clone()).collect()
    }
}

/// Timing and shape metadata for one query execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Number of result rows (equals the row list length for reads)
    pub row_count: usize,
    /// Wall-clock time around the query call only, in milliseconds
    pub execution_time_ms: u128,
    /// Engine-reported write count; 0 for reads
    pub affected_rows: u64,
    /// Ordered column names
    pub columns: Vec<String>,
}

/// The normalized result every executor returns, regardless of engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Result rows; empty for write queries
    pub rows: Vec<Row>,
    /// Execution metadata
    pub metadata: ExecutionMetadata,
}

impl ResultEnvelope {
    /// Build an envelope for a read query.
    ///
    /// `row_count` is derived from the row list, never supplied by the
    /// caller, so the two cannot drift apart.
    pub fn select(columns: Vec<String>, rows: Vec<Row>, execution_time_ms: u128) -> Self {
        let row_count = rows.len();
        Self {
            rows,
            metadata: ExecutionMetadata {
                row_count,
                execution_time_ms,
                affected_rows: 0,
                columns,
            },
        }
    }

    /// Build an envelope for a modification query (INSERT, UPDATE, DELETE).
    pub fn modified(affected_rows: u64, execution_time_ms: u128) -> Self {
        Self {
            rows: Vec::new(),
            metadata: ExecutionMetadata {
                row_count: 0,
                execution_time_ms,
                affected_rows,
                columns: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_null_check() {
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(true).is_null());
        assert!(!Value::Text("hello".to_string()).is_null());
    }

    #[test]
    fn test_value_display_string() {
        assert_eq!(Value::Null.to_display_string(), "NULL");
        assert_eq!(Value::Int64(-123).to_display_string(), "-123");
        assert_eq!(Value::Text("hello".to_string()).to_display_string(), "hello");
        assert_eq!(
            Value::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]).to_display_string(),
            "\\xdeadbeef"
        );
    }

    #[test]
    fn test_date_display_is_canonical() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Value::Date(date).to_display_string(), "2024-03-09");
    }

    #[test]
    fn test_value_from_option() {
        let some_val: Value = Some(42i64).into();
        assert_eq!(some_val, Value::Int64(42));
        let none_val: Value = Option::<i64>::None.into();
        assert_eq!(none_val, Value::Null);
    }

    #[test]
    fn test_row_lookup_by_column() {
        let row = Row::from_pairs(vec![
            ("id".to_string(), Value::Int64(1)),
            ("email".to_string(), Value::Text("a@b.c".to_string())),
        ]);
        assert_eq!(row.get("id"), Some(&Value::Int64(1)));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.columns(), vec!["id", "email"]);
    }

    #[test]
    fn test_select_envelope_row_count_matches_rows() {
        let rows = vec![
            Row::from_pairs(vec![("n".to_string(), Value::Int64(1))]),
            Row::from_pairs(vec![("n".to_string(), Value::Int64(2))]),
        ];
        let envelope = ResultEnvelope::select(vec!["n".to_string()], rows, 7);
        assert_eq!(envelope.metadata.row_count, envelope.rows.len());
        assert_eq!(envelope.metadata.affected_rows, 0);
        for row in &envelope.rows {
            assert_eq!(row.columns(), envelope.metadata.columns);
        }
    }

    #[test]
    fn test_modified_envelope() {
        let envelope = ResultEnvelope::modified(5, 12);
        assert!(envelope.rows.is_empty());
        assert_eq!(envelope.metadata.row_count, 0);
        assert_eq!(envelope.metadata.affected_rows, 5);
    }
}
