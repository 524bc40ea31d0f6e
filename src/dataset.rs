//! In-memory dataset model and delimited-text loading.
//!
//! A [`Dataset`] is the typed table an administrator uploads for a session.
//! Column types are decided once, at load time, from the observed cells:
//!
//! - every non-missing cell is a whole number → [`ColumnType::Integer`]
//! - every non-missing cell is numeric, some fractional → [`ColumnType::Real`]
//! - anything else, including a column with no values → [`ColumnType::Text`]
//!
//! Cells are then converted to the declared type so each column only holds
//! values representable in its type. Missing cells (empty fields and the
//! usual spreadsheet placeholders such as `NA` or `NaN`) become [`Value::Null`].

use std::{collections::HashSet, fmt, io::Read, path::Path};

use anyhow::{Context, Result, anyhow, bail, ensure};
use encoding_rs::{Encoding, UTF_8};
use serde::{Deserialize, Serialize};

use crate::io_utils;

const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "#N/A", "<NA>",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Real)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnType::Integer => "integer",
            ColumnType::Real => "real",
            ColumnType::Text => "text",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Real(f) => f.to_string(),
            Value::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

/// Parsing options for delimited input.
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: io_utils::DEFAULT_CSV_DELIMITER,
            encoding: UTF_8,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Loads a delimited file (or stdin for `-`) with a header row.
    pub fn load(path: &Path, options: CsvOptions) -> Result<Self> {
        let reader = io_utils::open_decoded_input(path, options.encoding)?;
        Self::from_reader(reader, options).with_context(|| format!("Loading dataset from {path:?}"))
    }

    pub fn from_reader<R: Read>(reader: R, options: CsvOptions) -> Result<Self> {
        let mut csv_reader = io_utils::open_csv_reader(reader, options.delimiter);
        let headers = csv_reader
            .headers()
            .context("Reading header row")?
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                if name.trim().is_empty() {
                    format!("Unnamed: {idx}")
                } else {
                    name.to_string()
                }
            })
            .collect::<Vec<_>>();
        ensure!(
            !headers.is_empty(),
            "No columns to parse from input (missing header row)"
        );
        ensure_unique_headers(&headers)?;

        let mut raw_rows = Vec::new();
        for (row_idx, record) in csv_reader.records().enumerate() {
            let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
            raw_rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let mut candidates = vec![TypeCandidate::new(); headers.len()];
        for row in &raw_rows {
            for (candidate, cell) in candidates.iter_mut().zip(row) {
                candidate.observe(cell);
            }
        }

        let columns = headers
            .into_iter()
            .zip(&candidates)
            .map(|(name, candidate)| Column {
                name,
                column_type: candidate.decide(),
            })
            .collect::<Vec<_>>();

        let rows = raw_rows
            .iter()
            .enumerate()
            .map(|(row_idx, raw)| {
                columns
                    .iter()
                    .zip(raw)
                    .map(|(column, cell)| parse_cell(cell, column.column_type))
                    .collect::<Result<Vec<_>>>()
                    .with_context(|| format!("Parsing row {}", row_idx + 2))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { columns, rows })
    }

    /// Builds a dataset from already-typed values, deciding each column's type
    /// from the values it holds.
    pub fn from_rows<S: AsRef<str>>(headers: &[S], rows: Vec<Vec<Value>>) -> Result<Self> {
        let headers = headers
            .iter()
            .map(|h| h.as_ref().to_string())
            .collect::<Vec<_>>();
        ensure_unique_headers(&headers)?;
        for (row_idx, row) in rows.iter().enumerate() {
            ensure!(
                row.len() == headers.len(),
                "Row {} has {} value(s) but {} column(s) are declared",
                row_idx + 1,
                row.len(),
                headers.len()
            );
        }

        let columns = headers
            .into_iter()
            .enumerate()
            .map(|(idx, name)| Column {
                column_type: decide_from_values(rows.iter().map(|row| &row[idx])),
                name,
            })
            .collect::<Vec<_>>();

        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&columns)
                    .map(|(value, column)| coerce_value(value, column.column_type))
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }
}

/// A derived tabular view over a dataset, such as a projection or ranking.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Frame {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Frame {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Values of one column, in row order.
    pub fn column_values(&self, name: &str) -> Vec<&Value> {
        match self.column_index(name) {
            Some(idx) => self.rows.iter().filter_map(|row| row.get(idx)).collect(),
            None => Vec::new(),
        }
    }
}

pub fn is_missing_token(value: &str) -> bool {
    MISSING_TOKENS.contains(&value.trim())
}

fn ensure_unique_headers(headers: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for header in headers {
        if !seen.insert(header.as_str()) {
            bail!("Duplicate column name '{header}' in header row");
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct TypeCandidate {
    observed: bool,
    possible_integer: bool,
    possible_real: bool,
}

impl TypeCandidate {
    fn new() -> Self {
        Self {
            observed: false,
            possible_integer: true,
            possible_real: true,
        }
    }

    fn observe(&mut self, cell: &str) {
        if is_missing_token(cell) {
            return;
        }
        self.observed = true;
        let trimmed = cell.trim();
        if self.possible_integer && trimmed.parse::<i64>().is_err() {
            self.possible_integer = false;
        }
        if self.possible_real && trimmed.parse::<f64>().is_err() {
            self.possible_real = false;
        }
    }

    fn decide(&self) -> ColumnType {
        if !self.observed {
            ColumnType::Text
        } else if self.possible_integer {
            ColumnType::Integer
        } else if self.possible_real {
            ColumnType::Real
        } else {
            ColumnType::Text
        }
    }
}

fn parse_cell(cell: &str, column_type: ColumnType) -> Result<Value> {
    if is_missing_token(cell) {
        return Ok(Value::Null);
    }
    let trimmed = cell.trim();
    let value = match column_type {
        ColumnType::Integer => Value::Integer(
            trimmed
                .parse()
                .map_err(|_| anyhow!("Failed to parse '{cell}' as integer"))?,
        ),
        ColumnType::Real => Value::Real(
            trimmed
                .parse()
                .map_err(|_| anyhow!("Failed to parse '{cell}' as real"))?,
        ),
        ColumnType::Text => Value::Text(cell.to_string()),
    };
    Ok(value)
}

fn decide_from_values<'a, I>(values: I) -> ColumnType
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut decided: Option<ColumnType> = None;
    for value in values {
        let observed = match value {
            Value::Null => continue,
            Value::Real(f) if f.is_nan() => continue,
            Value::Integer(_) => ColumnType::Integer,
            Value::Real(_) => ColumnType::Real,
            Value::Text(_) => return ColumnType::Text,
        };
        decided = Some(match (decided, observed) {
            (Some(ColumnType::Real), _) | (_, ColumnType::Real) => ColumnType::Real,
            _ => ColumnType::Integer,
        });
    }
    decided.unwrap_or(ColumnType::Text)
}

fn coerce_value(value: Value, column_type: ColumnType) -> Value {
    match (value, column_type) {
        (Value::Real(f), _) if f.is_nan() => Value::Null,
        (Value::Integer(i), ColumnType::Real) => Value::Real(i as f64),
        (Value::Integer(i), ColumnType::Text) => Value::Text(i.to_string()),
        (Value::Real(f), ColumnType::Text) => Value::Text(f.to_string()),
        (value, _) => value,
    }
}
