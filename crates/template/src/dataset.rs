//! Tabular data bound to the template's fields
//!
//! A dataset always has at least one row and its columns follow the field
//! list: renaming or deleting a field renames or drops the column. Rows are
//! stored by column name, so a row can hold values for columns that are no
//! longer shown; they are simply not written out.

use crate::schema::{row_value, Row};
use crate::Result;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

const BOM: char = '\u{feff}';

/// Rows of field values keyed by column name
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    /// A dataset with the given columns and one blank row
    pub fn new(columns: Vec<String>) -> Self {
        let mut dataset = Self {
            columns,
            rows: Vec::new(),
        };
        dataset.add_empty_row();
        dataset
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, filling in any missing columns with `""`
    pub fn push_row(&mut self, mut row: Row) {
        for column in &self.columns {
            row.entry(column.clone()).or_default();
        }
        self.rows.push(row);
    }

    /// Append a row with every column blank
    pub fn add_empty_row(&mut self) {
        self.push_row(Row::new());
    }

    /// Remove the row at `index`
    ///
    /// Removing the last remaining row replaces it with a blank one.
    pub fn remove_row(&mut self, index: usize) -> Option<Row> {
        if index >= self.rows.len() {
            return None;
        }
        let removed = self.rows.remove(index);
        if self.rows.is_empty() {
            self.add_empty_row();
        }
        Some(removed)
    }

    /// Adopt a new column list; every row gains the columns it lacks
    pub fn sync_columns(&mut self, columns: Vec<String>) {
        self.columns = columns;
        for row in &mut self.rows {
            for column in &self.columns {
                row.entry(column.clone()).or_default();
            }
        }
    }

    /// Rename a column in the header and in every row
    ///
    /// A row that already has a value under `new` keeps it and loses `old`.
    pub fn rename_column(&mut self, old: &str, new: &str) {
        if old == new {
            return;
        }

        if self.columns.iter().any(|c| c == new) {
            self.columns.retain(|c| c != old);
        } else if let Some(column) = self.columns.iter_mut().find(|c| *c == old) {
            *column = new.to_string();
        }

        for row in &mut self.rows {
            let Some(value) = row.remove(old) else {
                continue;
            };
            row.entry(new.to_string()).or_insert(value);
        }
    }

    /// Drop a column from the header and every row
    pub fn remove_column(&mut self, name: &str) {
        self.columns.retain(|c| c != name);
        for row in &mut self.rows {
            row.remove(name);
        }
    }

    /// Load a CSV file, keeping only `columns`
    pub fn read_csv(path: impl AsRef<Path>, columns: Vec<String>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let dataset = Self::from_csv_reader(file, columns)?;
        debug!(path = %path.as_ref().display(), rows = dataset.len(), "read dataset");
        Ok(dataset)
    }

    /// Read CSV with a header line from `reader`
    ///
    /// Values are matched to `columns` by header name; columns absent from
    /// the file are blank and extra CSV columns are ignored. Short records
    /// are allowed. A file without data rows yields one blank row.
    pub fn from_csv_reader<R: Read>(reader: R, columns: Vec<String>) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);

        let headers = clean_headers(csv.headers()?);
        let positions: Vec<Option<usize>> = columns
            .iter()
            .map(|column| headers.iter().position(|h| h == column))
            .collect();

        let mut dataset = Self {
            columns,
            rows: Vec::new(),
        };
        for record in csv.records() {
            let record = record?;
            let row = dataset
                .columns
                .iter()
                .zip(&positions)
                .map(|(column, position)| {
                    let value = position.and_then(|i| record.get(i)).unwrap_or("");
                    (column.clone(), value.to_string())
                })
                .collect();
            dataset.rows.push(row);
        }

        if dataset.rows.is_empty() {
            dataset.add_empty_row();
        }
        Ok(dataset)
    }

    /// Header names of a CSV file
    pub fn read_csv_headers(path: impl AsRef<Path>) -> Result<Vec<String>> {
        let mut csv = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path.as_ref())?;
        Ok(clean_headers(csv.headers()?))
    }

    /// Write the dataset as CSV with the columns as header
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        self.to_csv_writer(file)?;
        debug!(path = %path.as_ref().display(), rows = self.len(), "wrote dataset");
        Ok(())
    }

    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&self.columns)?;
        for row in &self.rows {
            csv.write_record(self.columns.iter().map(|c| row_value(row, c)))?;
        }
        csv.flush()?;
        Ok(())
    }
}

fn clean_headers(headers: &csv::StringRecord) -> Vec<String> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = if i == 0 { h.trim_start_matches(BOM) } else { h };
            h.trim().to_string()
        })
        .collect()
}
