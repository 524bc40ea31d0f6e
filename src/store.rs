//! SQLite-backed table store.
//!
//! A store is a single `<name>.db` file holding the `data` table. Persisting
//! is a full replace: the table is dropped, recreated from the current schema
//! and refilled inside one transaction, so a failed write leaves the previous
//! contents in place.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail, ensure};
use log::{debug, info};
use rusqlite::{
    Connection, ToSql, params_from_iter,
    types::{ToSqlOutput, Value as SqlValue, ValueRef},
};

use crate::{
    dataset::{Dataset, Value},
    schema::{TABLE_NAME, TableSchema, quote_identifier},
};

pub const STORE_EXTENSION: &str = "db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistSummary {
    pub path: PathBuf,
    pub table: String,
    pub columns: usize,
    pub rows_written: usize,
}

/// Columns and rows read back from a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTable {
    pub columns: Vec<(String, String)>,
    pub rows: Vec<Vec<Value>>,
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Real(f) => ToSqlOutput::from(*f),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

/// Resolves the file a store name refers to inside `directory`.
pub fn store_path(directory: &Path, name: &str) -> Result<PathBuf> {
    let trimmed = name.trim();
    ensure!(!trimmed.is_empty(), "Store name cannot be empty");
    if trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
        bail!("Store name '{trimmed}' must be a plain file name");
    }
    Ok(directory.join(format!("{trimmed}.{STORE_EXTENSION}")))
}

pub fn persist(dataset: &Dataset, schema: &TableSchema, target: &Path) -> Result<PersistSummary> {
    ensure!(
        !schema.is_empty(),
        "Cannot persist a dataset without columns"
    );
    ensure!(
        schema.len() == dataset.column_count(),
        "Schema describes {} column(s) but the dataset has {}",
        schema.len(),
        dataset.column_count()
    );

    let mut conn =
        Connection::open(target).with_context(|| format!("Opening store {target:?}"))?;
    let tx = conn.transaction().context("Starting store transaction")?;
    tx.execute(
        &format!("DROP TABLE IF EXISTS {}", quote_identifier(TABLE_NAME)),
        [],
    )
    .context("Dropping previous table")?;
    let create = schema.create_table_sql(TABLE_NAME);
    debug!("{create}");
    tx.execute(&create, []).context("Creating table")?;

    let mut rows_written = 0usize;
    {
        let mut insert = tx
            .prepare(&schema.insert_sql(TABLE_NAME))
            .context("Preparing insert statement")?;
        for (row_idx, row) in dataset.rows().iter().enumerate() {
            insert
                .execute(params_from_iter(row.iter()))
                .with_context(|| format!("Inserting row {}", row_idx + 1))?;
            rows_written += 1;
        }
    }
    tx.commit().context("Committing store transaction")?;

    info!(
        "Persisted {rows_written} row(s) across {} column(s) into {target:?}",
        schema.len()
    );
    Ok(PersistSummary {
        path: target.to_path_buf(),
        table: TABLE_NAME.to_string(),
        columns: schema.len(),
        rows_written,
    })
}

pub fn read_table(target: &Path) -> Result<StoredTable> {
    ensure!(target.exists(), "Store {target:?} does not exist");
    let conn = Connection::open(target).with_context(|| format!("Opening store {target:?}"))?;
    let table = quote_identifier(TABLE_NAME);

    let mut info = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let columns = info
        .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Reading table columns")?;

    let mut select = conn.prepare(&format!("SELECT * FROM {table}"))?;
    let width = columns.len();
    let rows = select
        .query_map([], |row| {
            (0..width)
                .map(|idx| row.get_ref(idx).map(value_from_sql))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Reading table rows")?;

    Ok(StoredTable { columns, rows })
}

fn value_from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
