// src/process/consolidate.rs

use std::collections::HashSet;

use super::schema::{ColumnKind, ColumnSchema};
use super::utils::parse_number;
use super::{RawDataset, Row};
use crate::error::{Result, ScrapeError};

/// A typed cell of the normalized dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Number(_) => None,
        }
    }

    /// Text form used by the CSV sink. Numbers are plain decimals that
    /// always carry a decimal point (`1200.0`, `1234.5`), never exponents.
    pub fn to_field(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(v) => {
                let mut out = v.to_string();
                if v.is_finite() && !out.contains('.') {
                    out.push_str(".0");
                }
                out
            }
        }
    }
}

/// Header plus typed rows. Every row has exactly `header.len()` values and
/// `kinds[i]` describes column `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDataset {
    pub header: Vec<String>,
    pub kinds: Vec<ColumnKind>,
    pub rows: Vec<Vec<Value>>,
}

impl NormalizedDataset {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Look up one cell by row number and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The dataset together with the counts that produced it.
#[derive(Debug)]
pub struct Consolidation {
    pub dataset: NormalizedDataset,
    pub raw_rows: usize,
    pub duplicates: usize,
}

/// Merge every fetched page into one dataset:
/// 1. concatenate pages in order
/// 2. drop exact-duplicate rows, keeping the first occurrence
/// 3. promote the first remaining row to the header
/// 4. drop the ordinal column if the schema names one and it is present
/// 5. parse the schema's numeric columns
///
/// Any cell of a numeric column that does not parse fails the whole run.
pub fn consolidate(raw: RawDataset, schema: &ColumnSchema) -> Result<Consolidation> {
    let raw_rows: usize = raw.iter().map(Vec::len).sum();

    let mut seen: HashSet<Row> = HashSet::with_capacity(raw_rows);
    let mut unique: Vec<Row> = Vec::with_capacity(raw_rows);
    for row in raw.into_iter().flatten() {
        if seen.insert(row.clone()) {
            unique.push(row);
        }
    }
    drop(seen);
    let duplicates = raw_rows - unique.len();

    let mut rows = unique.into_iter();
    let header = rows
        .next()
        .ok_or_else(|| ScrapeError::Schema("no rows to promote to a header".into()))?;
    let data: Vec<Row> = rows.collect();

    let mut names = HashSet::new();
    for name in &header {
        if !names.insert(name.as_str()) {
            return Err(ScrapeError::Schema(format!(
                "duplicate column {:?} in header",
                name
            )));
        }
    }

    for (i, row) in data.iter().enumerate() {
        if row.len() != header.len() {
            return Err(ScrapeError::Schema(format!(
                "row {} has {} cells but the header has {}",
                i + 1,
                row.len(),
                header.len()
            )));
        }
    }

    let ordinal = schema
        .ordinal_column
        .as_deref()
        .and_then(|name| header.iter().position(|h| h == name));
    let keep: Vec<usize> = (0..header.len()).filter(|i| Some(*i) != ordinal).collect();

    let out_header: Vec<String> = keep.iter().map(|&i| header[i].clone()).collect();
    for declared in schema.columns.keys() {
        if !out_header.contains(declared) {
            return Err(ScrapeError::Schema(format!(
                "declared column {:?} not found in header {:?}",
                declared, out_header
            )));
        }
    }
    let kinds: Vec<ColumnKind> = out_header.iter().map(|h| schema.kind_of(h)).collect();

    let mut out_rows = Vec::with_capacity(data.len());
    for (row_no, row) in data.into_iter().enumerate() {
        let mut cells: Vec<Option<String>> = row.into_iter().map(Some).collect();
        let mut values = Vec::with_capacity(keep.len());
        for (&col, kind) in keep.iter().zip(&kinds) {
            let cell = cells[col].take().unwrap_or_default();
            let value = match kind {
                ColumnKind::Raw => Value::Text(cell),
                ColumnKind::Numeric => match parse_number(&cell) {
                    Some(v) => Value::Number(v),
                    None => {
                        return Err(ScrapeError::TypeCoercion {
                            column: header[col].clone(),
                            value: cell,
                            row: row_no + 1,
                        })
                    }
                },
            };
            values.push(value);
        }
        out_rows.push(values);
    }

    Ok(Consolidation {
        dataset: NormalizedDataset {
            header: out_header,
            kinds,
            rows: out_rows,
        },
        raw_rows,
        duplicates,
    })
}
