//! In-memory flat table
//!
//! The CSV is read once into typed columns. Each column's type is inferred
//! from its non-empty cells: all integers → Int, all numbers → Float,
//! anything else → Text. Empty cells are null.

use facemeta_common::Result;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// Column holding the identity name
pub const NAME_COLUMN: &str = "name";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Int,
    Float,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// JSON value; non-finite floats have no JSON form and become null
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Int(v) => Value::from(*v),
            Cell::Float(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Text(s) => Value::String(s.clone()),
        }
    }

    /// Text used for name listing and search; `None` for null
    pub fn text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Int(v) => Some(v.to_string()),
            Cell::Float(v) => Some(v.to_string()),
            Cell::Text(s) => Some(s.clone()),
        }
    }
}

fn infer_type<'a>(values: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut kind = ColumnType::Int;
    for value in values.filter(|v| !v.is_empty()) {
        if kind == ColumnType::Int && value.parse::<i64>().is_err() {
            kind = ColumnType::Float;
        }
        if kind == ColumnType::Float && value.parse::<f64>().is_err() {
            return ColumnType::Text;
        }
    }
    kind
}

fn parse_cell(raw: &str, kind: ColumnType) -> Cell {
    if raw.is_empty() {
        return Cell::Null;
    }
    match kind {
        ColumnType::Int => raw.parse().map(Cell::Int).unwrap_or(Cell::Null),
        ColumnType::Float => raw.parse().map(Cell::Float).unwrap_or(Cell::Null),
        ColumnType::Text => Cell::Text(raw.to_string()),
    }
}

/// Read-only table with typed columns
#[derive(Debug, Clone, Default)]
pub struct FlatTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl FlatTable {
    /// Table with no columns and no rows
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a CSV file with a header row
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let columns: Vec<String> = reader.headers()?.iter().map(String::from).collect();

        let mut records = Vec::new();
        for record in reader.records() {
            records.push(record?);
        }

        let table = Self::build(columns, records.iter().map(|r| r.iter().collect()));
        info!(
            "Loaded {} rows x {} columns from {}",
            table.len(),
            table.columns.len(),
            path.display()
        );
        Ok(table)
    }

    /// Build from header names and string rows (short rows are padded with nulls)
    pub fn from_raw<R, S>(columns: Vec<String>, raw_rows: &[R]) -> Self
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        Self::build(
            columns,
            raw_rows
                .iter()
                .map(|r| r.as_ref().iter().map(|s| s.as_ref()).collect()),
        )
    }

    fn build<'a>(columns: Vec<String>, raw_rows: impl Iterator<Item = Vec<&'a str>>) -> Self {
        let raw: Vec<Vec<&'a str>> = raw_rows.collect();
        let cell = |row: &Vec<&'a str>, c: usize| -> &'a str { row.get(c).copied().unwrap_or("") };

        let types: Vec<ColumnType> = (0..columns.len())
            .map(|c| infer_type(raw.iter().map(|row| cell(row, c))))
            .collect();
        let rows = raw
            .iter()
            .map(|row| {
                types
                    .iter()
                    .enumerate()
                    .map(|(c, kind)| parse_cell(cell(row, c), *kind))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Distinct non-null names, sorted; `None` when there is no name column
    pub fn distinct_names(&self) -> Option<Vec<String>> {
        let c = self.column_index(NAME_COLUMN)?;
        let names: BTreeSet<String> = self.rows.iter().filter_map(|row| row[c].text()).collect();
        Some(names.into_iter().collect())
    }

    /// Indices of rows whose name contains `search`, ignoring case
    ///
    /// No search (or an empty one) selects every row. A table without a
    /// name column matches nothing.
    pub fn filter_by_name(&self, search: Option<&str>) -> Vec<usize> {
        let needle = match search {
            Some(s) if !s.is_empty() => s.to_lowercase(),
            _ => return (0..self.rows.len()).collect(),
        };
        let Some(c) = self.column_index(NAME_COLUMN) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                row[c]
                    .text()
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Row `i` as a JSON object keyed by column name
    pub fn row_json(&self, i: usize) -> Option<Value> {
        let row = self.rows.get(i)?;
        let object: Map<String, Value> = self
            .columns
            .iter()
            .zip(row)
            .map(|(name, cell)| (name.clone(), cell.to_json()))
            .collect();
        Some(Value::Object(object))
    }
}
