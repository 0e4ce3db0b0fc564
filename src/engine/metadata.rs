//! Normalized schema metadata.
//!
//! Every extractor translates its engine's native catalog representation
//! into these shapes. One `DatabaseMetadata` document exists per
//! (user, connection) pair and is fully replaced on re-extraction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Normalized description of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name
    pub name: String,
    /// Engine-reported type tag
    pub data_type: String,
    /// Whether NULL values are allowed
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Whether the column carries a unique constraint
    #[serde(default)]
    pub unique: bool,
    /// Whether the column is covered by a non-unique secondary index
    #[serde(default)]
    pub indexed: bool,
    /// Default value expression, if any
    #[serde(default)]
    pub default_value: Option<String>,
    /// Column description
    #[serde(default)]
    pub description: String,
    /// Foreign-key reference target (`table.column`), if any
    #[serde(default)]
    pub references: Option<String>,
}

fn default_true() -> bool {
    true
}

impl ColumnMetadata {
    /// Create column metadata with minimal info
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        let data_type = data_type.into();
        Self {
            name: name.into(),
            description: format!("Column of type {}", data_type),
            data_type,
            nullable: true,
            unique: false,
            indexed: false,
            default_value: None,
            references: None,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn with_indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }

    pub fn with_default(mut self, default_value: Option<String>) -> Self {
        self.default_value = default_value;
        self
    }
}

/// Normalized description of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Table name (for galaxy engines: `catalog.schema.table`)
    pub name: String,
    /// Column metadata in catalog order
    #[serde(default)]
    pub columns: Vec<ColumnMetadata>,
    /// Name of the primary key column, if detected
    #[serde(default)]
    pub primary_key: Option<String>,
    /// Table description
    #[serde(default)]
    pub description: String,
}

impl TableMetadata {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnMetadata>) -> Self {
        Self {
            name: name.into(),
            columns,
            primary_key: None,
            description: String::new(),
        }
    }

    pub fn with_primary_key(mut self, primary_key: Option<String>) -> Self {
        self.primary_key = primary_key;
        self
    }
}

/// The metadata document persisted for one connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    /// Owning user
    pub user_id: Uuid,
    /// Owning connection
    pub connection_id: Uuid,
    /// Logical database name
    pub db_name: String,
    /// Tables in extraction order
    pub tables: Vec<TableMetadata>,
    /// When the tables were last (re-)extracted
    pub last_updated: DateTime<Utc>,
    /// When this document was first created
    pub created_at: DateTime<Utc>,
}

impl DatabaseMetadata {
    /// Create a fresh document for a just-extracted schema.
    pub fn new(
        user_id: Uuid,
        connection_id: Uuid,
        db_name: impl Into<String>,
        tables: Vec<TableMetadata>,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            connection_id,
            db_name: db_name.into(),
            tables,
            last_updated: now,
            created_at: now,
        }
    }

    /// Get a table by name
    pub fn get_table(&self, name: &str) -> Option<&TableMetadata> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_metadata_builder() {
        let col = ColumnMetadata::new("email", "varchar(255)")
            .with_nullable(false)
            .with_unique(true);
        assert_eq!(col.name, "email");
        assert!(!col.nullable);
        assert!(col.unique);
        assert!(!col.indexed);
        assert_eq!(col.description, "Column of type varchar(255)");
    }

    #[test]
    fn test_get_table() {
        let metadata = DatabaseMetadata::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "shop",
            vec![
                TableMetadata::new("users", vec![]),
                TableMetadata::new("orders", vec![]),
            ],
        );
        assert!(metadata.get_table("users").is_some());
        assert!(metadata.get_table("payments").is_none());
    }

    #[test]
    fn test_metadata_serialization_round_trip() {
        let metadata = DatabaseMetadata::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "shop",
            vec![TableMetadata::new(
                "users",
                vec![ColumnMetadata::new("id", "integer").with_unique(true)],
            )
            .with_primary_key(Some("id".to_string()))],
        );
        let json = serde_json::to_string(&metadata).unwrap();
        let parsed: DatabaseMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tables, metadata.tables);
        assert_eq!(parsed.db_name, "shop");
    }
}
