// src/process/mod.rs

pub mod consolidate;
pub mod schema;
pub mod utils;

pub use consolidate::{consolidate, Consolidation, NormalizedDataset, Value};
pub use schema::{ColumnKind, ColumnSchema};

/// Raw cell text of one table row, in document order.
pub type Row = Vec<String>;

/// Every row of one rendered view of the table. Header and data rows are
/// not told apart at this stage.
pub type Page = Vec<Row>;

/// Pages in the order they were fetched.
pub type RawDataset = Vec<Page>;
