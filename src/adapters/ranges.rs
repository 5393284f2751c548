//! Local stand-in for the spreadsheet backend: each sheet name maps to a CSV
//! file inside one directory. Cell addressing only carries meaning on the
//! real spreadsheet side, so the range arguments are accepted and ignored.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::ports::RangeStore;
use crate::utils::error::Result;

#[derive(Debug, Clone)]
pub struct CsvRangeStore {
    dir: PathBuf,
}

impl CsvRangeStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    fn sheet_path(&self, sheet: &str) -> PathBuf {
        self.dir.join(format!("{sheet}.csv"))
    }
}

#[async_trait]
impl RangeStore for CsvRangeStore {
    async fn read_range(&self, sheet: &str, _range: &str) -> Result<Vec<Vec<String>>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(self.sheet_path(sheet))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(String::from).collect());
        }
        Ok(rows)
    }

    async fn write_range(
        &self,
        sheet: &str,
        _first_cell: &str,
        values: Vec<Vec<String>>,
    ) -> Result<()> {
        let mut writer = csv::Writer::from_path(self.sheet_path(sheet))?;
        for row in &values {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}
