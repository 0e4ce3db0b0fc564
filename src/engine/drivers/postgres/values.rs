//! PostgreSQL type conversion utilities.
//!
//! Converts sqlx PostgreSQL rows into the engine-agnostic `Row`/`Value`
//! shapes used by the result envelope.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use uuid::Uuid;

use crate::engine::envelope::{Cell, Row, Value};

/// Converter for PostgreSQL values to the unified `Value` type.
pub(crate) struct PgValueConverter;

impl PgValueConverter {
    /// Convert a PostgreSQL row into a row of named cells.
    pub fn convert_row(pg_row: &PgRow) -> Row {
        let cells = pg_row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let value = Self::extract_value(pg_row, idx, col.type_info().name());
                Cell::new(col.name().to_string(), value)
            })
            .collect();
        Row::new(cells)
    }

    /// Ordered column names from a row's field descriptors.
    pub fn column_names(pg_row: &PgRow) -> Vec<String> {
        pg_row.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn extract_value(row: &PgRow, index: usize, type_name: &str) -> Value {
        // Check for NULL first
        match row.try_get_raw(index) {
            Ok(raw) if raw.is_null() => return Value::Null,
            Err(_) => return Value::Null,
            _ => {}
        }
        Self::decode_by_type(row, index, type_name)
    }

    /// Decode a value based on its PostgreSQL type name.
    fn decode_by_type(row: &PgRow, index: usize, type_name: &str) -> Value {
        match type_name {
            "BOOL" => row
                .try_get::<bool, _>(index)
                .map(Value::Bool)
                .unwrap_or(Value::Null),

            "INT2" | "SMALLINT" | "SMALLSERIAL" => row
                .try_get::<i16, _>(index)
                .map(Value::Int16)
                .unwrap_or(Value::Null),

            "INT4" | "INT" | "INTEGER" | "SERIAL" => row
                .try_get::<i32, _>(index)
                .map(Value::Int32)
                .unwrap_or(Value::Null),

            "INT8" | "BIGINT" | "BIGSERIAL" => row
                .try_get::<i64, _>(index)
                .map(Value::Int64)
                .unwrap_or(Value::Null),

            "FLOAT4" | "REAL" => row
                .try_get::<f32, _>(index)
                .map(Value::Float32)
                .unwrap_or(Value::Null),

            "FLOAT8" | "DOUBLE PRECISION" => row
                .try_get::<f64, _>(index)
                .map(Value::Float64)
                .unwrap_or(Value::Null),

            "NUMERIC" | "DECIMAL" => row
                .try_get::<Decimal, _>(index)
                .map(Value::Decimal)
                .unwrap_or(Value::Null),

            "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
                .try_get::<String, _>(index)
                .map(Value::Text)
                .unwrap_or(Value::Null),

            "BYTEA" => row
                .try_get::<Vec<u8>, _>(index)
                .map(Value::Bytes)
                .unwrap_or(Value::Null),

            "DATE" => row
                .try_get::<NaiveDate, _>(index)
                .map(Value::Date)
                .unwrap_or(Value::Null),

            "TIME" | "TIMETZ" => row
                .try_get::<NaiveTime, _>(index)
                .map(Value::Time)
                .unwrap_or(Value::Null),

            "TIMESTAMP" => row
                .try_get::<NaiveDateTime, _>(index)
                .map(Value::DateTime)
                .unwrap_or(Value::Null),

            "TIMESTAMPTZ" => row
                .try_get::<DateTime<Utc>, _>(index)
                .map(Value::DateTimeTz)
                .unwrap_or(Value::Null),

            "UUID" => row
                .try_get::<Uuid, _>(index)
                .map(Value::Uuid)
                .unwrap_or(Value::Null),

            "JSON" | "JSONB" => row
                .try_get::<serde_json::Value, _>(index)
                .map(Value::Json)
                .unwrap_or(Value::Null),

            // For unknown types, fall back to a string representation.
            _ => Self::decode_as_string_fallback(row, index, type_name),
        }
    }

    fn decode_as_string_fallback(row: &PgRow, index: usize, type_name: &str) -> Value {
        if let Ok(s) = row.try_get::<String, _>(index) {
            return Value::Other { type_name: type_name.to_string(), display: s };
        }
        if let Ok(v) = row.try_get::<i64, _>(index) {
            return Value::Other { type_name: type_name.to_string(), display: v.to_string() };
        }
        Value::Other {
            type_name: type_name.to_string(),
            display: "<unknown>".to_string(),
        }
    }
}
