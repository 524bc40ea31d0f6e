//! Relational table definition inferred from a [`Dataset`].
//!
//! Each dataset column maps to one SQL column. Column names are kept verbatim
//! (spaces, ampersands and quotes included) and quoted whenever they are used
//! as identifiers.

use std::fmt;

use serde::Serialize;

use crate::dataset::{ColumnType, Dataset};

/// Name of the table every store holds.
pub const TABLE_NAME: &str = "data";

impl ColumnType {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SchemaColumn {
    pub name: String,
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TableSchema {
    pub columns: Vec<SchemaColumn>,
}

impl TableSchema {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn create_table_sql(&self, table: &str) -> String {
        let definitions = self
            .columns
            .iter()
            .map(|column| {
                format!(
                    "{} {}",
                    quote_identifier(&column.name),
                    column.column_type.sql_type()
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({definitions})",
            quote_identifier(table)
        )
    }

    pub fn insert_sql(&self, table: &str) -> String {
        let names = self
            .columns
            .iter()
            .map(|column| quote_identifier(&column.name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=self.columns.len())
            .map(|idx| format!("?{idx}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({names}) VALUES ({placeholders})",
            quote_identifier(table)
        )
    }
}

impl fmt::Display for TableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self
            .columns
            .iter()
            .map(|c| format!("{}: {}", c.name, c.column_type.sql_type()))
            .collect::<Vec<_>>();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Derives one storage column per dataset column, in column order.
pub fn infer_schema(dataset: &Dataset) -> TableSchema {
    let columns = dataset
        .columns()
        .iter()
        .map(|column| SchemaColumn {
            name: column.name.clone(),
            column_type: column.column_type,
        })
        .collect();
    TableSchema { columns }
}

/// Quotes an SQL identifier, doubling embedded double quotes.
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
