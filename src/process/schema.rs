// src/process/schema.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a column's cells end up in the normalized dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Kept as the cleaned cell text.
    #[default]
    Raw,
    /// Thousands separators stripped and parsed to `f64`.
    Numeric,
}

/// Declarative per-target column schema. Columns not listed are `Raw`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Row-number column to drop after header promotion, if present.
    #[serde(default)]
    pub ordinal_column: Option<String>,
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnKind>,
}

impl ColumnSchema {
    pub fn kind_of(&self, column: &str) -> ColumnKind {
        self.columns.get(column).copied().unwrap_or_default()
    }

    pub fn numeric(names: &[&str]) -> Self {
        Self {
            ordinal_column: None,
            columns: names
                .iter()
                .map(|n| (n.to_string(), ColumnKind::Numeric))
                .collect(),
        }
    }

    pub fn with_ordinal(mut self, name: &str) -> Self {
        self.ordinal_column = Some(name.to_string());
        self
    }
}
