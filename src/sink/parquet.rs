// src/sink/parquet.rs

use ::arrow::array::{ArrayRef, Float64Array, StringArray};
use ::arrow::datatypes::{DataType, Field, Schema};
use ::arrow::record_batch::RecordBatch;
use ::parquet::arrow::ArrowWriter;
use ::parquet::basic::Compression;
use ::parquet::file::properties::WriterProperties;
use std::{fs::File, io, path::Path, sync::Arc};

use crate::error::{Result, ScrapeError};
use crate::process::{ColumnKind, NormalizedDataset, Value};

/// Arrow schema for the dataset: `Float64` for numeric columns, `Utf8`
/// otherwise. Nothing is nullable.
pub fn arrow_schema(dataset: &NormalizedDataset) -> Schema {
    let fields: Vec<Field> = dataset
        .header
        .iter()
        .zip(&dataset.kinds)
        .map(|(name, kind)| {
            let dtype = match kind {
                ColumnKind::Numeric => DataType::Float64,
                ColumnKind::Raw => DataType::Utf8,
            };
            Field::new(name, dtype, false)
        })
        .collect();
    Schema::new(fields)
}

fn column(dataset: &NormalizedDataset, idx: usize) -> ArrayRef {
    let cells = dataset.rows.iter().map(|r| &r[idx]);
    match dataset.kinds[idx] {
        ColumnKind::Numeric => Arc::new(Float64Array::from_iter_values(
            cells.map(|v| v.as_number().unwrap_or(f64::NAN)),
        )),
        ColumnKind::Raw => Arc::new(StringArray::from_iter_values(cells.map(|v| match v {
            Value::Text(s) => s.clone(),
            other => other.to_field(),
        }))),
    }
}

fn other_err(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

/// One SNAPPY-compressed row group holding the whole dataset.
pub fn write(dataset: &NormalizedDataset, path: &Path) -> Result<()> {
    let to_persist = |e: io::Error| ScrapeError::persist(path, e);

    let schema = Arc::new(arrow_schema(dataset));
    let columns: Vec<ArrayRef> = (0..dataset.header.len())
        .map(|i| column(dataset, i))
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), columns)
        .map_err(|e| to_persist(other_err(e)))?;

    let file = File::create(path).map_err(to_persist)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))
        .map_err(|e| to_persist(other_err(e)))?;
    writer
        .write(&batch)
        .map_err(|e| to_persist(other_err(e)))?;
    writer.close().map_err(|e| to_persist(other_err(e)))?;
    Ok(())
}
