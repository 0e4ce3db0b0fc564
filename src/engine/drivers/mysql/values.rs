//! MySQL type conversion utilities.
//!
//! Converts sqlx MySQL rows into the engine-agnostic `Row`/`Value` shapes
//! used by the result envelope. Unsigned integer columns are widened to the
//! next signed size; `BIGINT UNSIGNED` cannot be widened and is carried as
//! a display value.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

use crate::engine::envelope::{Cell, Row, Value};

/// Converter for MySQL values to the unified `Value` type.
pub(crate) struct MySqlValueConverter;

impl MySqlValueConverter {
    /// Convert a MySQL row into a row of named cells.
    pub fn convert_row(mysql_row: &MySqlRow) -> Row {
        let cells = mysql_row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let value = Self::extract_value(mysql_row, idx, col.type_info().name());
                Cell::new(col.name().to_string(), value)
            })
            .collect();
        Row::new(cells)
    }

    /// Ordered column names from a row's field descriptors.
    pub fn column_names(mysql_row: &MySqlRow) -> Vec<String> {
        mysql_row.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn extract_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
        // Check for NULL first
        match row.try_get_raw(index) {
            Ok(raw) if raw.is_null() => return Value::Null,
            Err(_) => return Value::Null,
            _ => {}
        }
        Self::decode_by_type(row, index, type_name)
    }

    /// Decode a value based on its MySQL type name.
    fn decode_by_type(row: &MySqlRow, index: usize, type_name: &str) -> Value {
        match type_name {
            "BOOLEAN" => row
                .try_get::<bool, _>(index)
                .map(Value::Bool)
                .unwrap_or(Value::Null),

            "TINYINT" => row
                .try_get::<i8, _>(index)
                .map(|v| Value::Int16(i16::from(v)))
                .unwrap_or(Value::Null),

            "SMALLINT" => row
                .try_get::<i16, _>(index)
                .map(Value::Int16)
                .unwrap_or(Value::Null),

            "TINYINT UNSIGNED" => row
                .try_get::<u8, _>(index)
                .map(|v| Value::Int16(i16::from(v)))
                .unwrap_or(Value::Null),

            "SMALLINT UNSIGNED" => row
                .try_get::<u16, _>(index)
                .map(|v| Value::Int32(i32::from(v)))
                .unwrap_or(Value::Null),

            "INT" | "MEDIUMINT" => row
                .try_get::<i32, _>(index)
                .map(Value::Int32)
                .unwrap_or(Value::Null),

            "INT UNSIGNED" | "MEDIUMINT UNSIGNED" => row
                .try_get::<u32, _>(index)
                .map(|v| Value::Int64(i64::from(v)))
                .unwrap_or(Value::Null),

            "BIGINT" => row
                .try_get::<i64, _>(index)
                .map(Value::Int64)
                .unwrap_or(Value::Null),

            // Does not fit in i64; keep the textual form.
            "BIGINT UNSIGNED" => row
                .try_get::<u64, _>(index)
                .map(|v| Value::Other {
                    type_name: type_name.to_string(),
                    display: v.to_string(),
                })
                .unwrap_or(Value::Null),

            "FLOAT" => row
                .try_get::<f32, _>(index)
                .map(Value::Float32)
                .unwrap_or(Value::Null),

            "DOUBLE" => row
                .try_get::<f64, _>(index)
                .map(Value::Float64)
                .unwrap_or(Value::Null),

            "DECIMAL" => row
                .try_get::<Decimal, _>(index)
                .map(Value::Decimal)
                .unwrap_or(Value::Null),

            "VARCHAR" | "CHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" => row
                .try_get::<String, _>(index)
                .map(Value::Text)
                .unwrap_or(Value::Null),

            "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "VARBINARY" | "BINARY" => row
                .try_get::<Vec<u8>, _>(index)
                .map(Value::Bytes)
                .unwrap_or(Value::Null),

            "DATE" => row
                .try_get::<NaiveDate, _>(index)
                .map(Value::Date)
                .unwrap_or(Value::Null),

            "TIME" => row
                .try_get::<NaiveTime, _>(index)
                .map(Value::Time)
                .unwrap_or(Value::Null),

            "DATETIME" => row
                .try_get::<NaiveDateTime, _>(index)
                .map(Value::DateTime)
                .unwrap_or(Value::Null),

            "TIMESTAMP" => row
                .try_get::<DateTime<Utc>, _>(index)
                .map(Value::DateTimeTz)
                .unwrap_or(Value::Null),

            "JSON" => row
                .try_get::<serde_json::Value, _>(index)
                .map(Value::Json)
                .unwrap_or(Value::Null),

            // For unknown types, fall back to a string representation.
            _ => Self::decode_as_string_fallback(row, index, type_name),
        }
    }

    fn decode_as_string_fallback(row: &MySqlRow, index: usize, type_name: &str) -> Value {
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
