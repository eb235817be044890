// src/sink/csv.rs

use std::path::Path;

use crate::error::{Result, ScrapeError};
use crate::process::NormalizedDataset;

/// Header line, then one record per row. Numbers always carry a decimal point.
pub fn write(dataset: &NormalizedDataset, path: &Path) -> Result<()> {
    let to_persist = |e: ::csv::Error| ScrapeError::persist(path, e.into());

    let mut writer = ::csv::Writer::from_path(path).map_err(to_persist)?;
    writer.write_record(&dataset.header).map_err(to_persist)?;
    for row in &dataset.rows {
        writer
            .write_record(row.iter().map(|v| v.to_field()))
            .map_err(to_persist)?;
    }
    writer
        .flush()
        .map_err(|e| ScrapeError::persist(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ColumnKind, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn writes_header_and_typed_rows() -> anyhow::Result<()> {
        let dataset = NormalizedDataset {
            header: vec!["Symbol".into(), "Rate".into(), "Amount".into()],
            kinds: vec![ColumnKind::Raw, ColumnKind::Numeric, ColumnKind::Numeric],
            rows: vec![
                vec![
                    Value::Text("NABIL".into()),
                    Value::Number(1234.5),
                    Value::Number(1200.0),
                ],
                vec![
                    Value::Text("NICA, Ltd".into()),
                    Value::Number(0.25),
                    Value::Number(13345.0),
                ],
            ],
        };
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.csv");
        write(&dataset, &path)?;

        let text = std::fs::read_to_string(&path)?;
        assert_eq!(
            text,
            "Symbol,Rate,Amount\nNABIL,1234.5,1200.0\n\"NICA, Ltd\",0.25,13345.0\n"
        );
        Ok(())
    }
}
