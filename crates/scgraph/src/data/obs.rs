//! The per-cell observation table.

use std::path::Path;

/// A table of string annotations with one row per cell.
///
/// Values are stored column by column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Obs {
    /// The column names.
    names: Vec<String>,
    /// The values of each column.
    columns: Vec<Vec<String>>,
    /// The number of rows.
    n_rows: usize,
}

impl Obs {
    /// Creates an empty table with the given number of rows.
    #[must_use]
    pub const fn with_rows(n_rows: usize) -> Self {
        Self {
            names: Vec::new(),
            columns: Vec::new(),
            n_rows,
        }
    }

    /// Adds a column to the table.
    ///
    /// # Errors
    ///
    /// * If a column with the same name exists.
    /// * If the column length does not match the number of rows.
    pub fn with_column<S: ToString>(mut self, name: &str, values: &[S]) -> Result<Self, String> {
        if self.names.iter().any(|n| n == name) {
            return Err(format!("Column {name} already exists."));
        }
        if values.len() != self.n_rows {
            return Err(format!(
                "Column {name} has {} values but the table has {} rows.",
                values.len(),
                self.n_rows
            ));
        }
        self.names.push(name.to_string());
        self.columns.push(values.iter().map(ToString::to_string).collect());
        Ok(self)
    }

    /// The values of the named column.
    ///
    /// # Errors
    ///
    /// * If there is no such column.
    pub fn column(&self, name: &str) -> Result<&[String], String> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
            .ok_or_else(|| format!("Column {name} not found. Available columns: {:?}", self.names))
    }

    /// The column names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The number of rows.
    #[must_use]
    pub const fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Keeps only the given rows, in the given order.
    #[must_use]
    pub fn select(&self, rows: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| rows.iter().map(|&i| c[i].clone()).collect())
                .collect(),
            n_rows: rows.len(),
        }
    }

    /// Reads the table from a `.csv` file with a header row.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read.
    /// * If a record has the wrong number of fields.
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| e.to_string())?;

        let names = reader
            .headers()
            .map_err(|e| e.to_string())?
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();

        let mut columns = vec![Vec::new(); names.len()];
        let mut n_rows = 0;
        for record in reader.records() {
            let record = record.map_err(|e| e.to_string())?;
            for (column, field) in columns.iter_mut().zip(record.iter()) {
                column.push(field.to_string());
            }
            n_rows += 1;
        }

        Ok(Self { names, columns, n_rows })
    }

    /// Writes the table to a `.csv` file with a header row.
    ///
    /// # Errors
    ///
    /// * If the file cannot be created or written.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let mut writer = csv::Writer::from_path(path).map_err(|e| e.to_string())?;
        writer.write_record(&self.names).map_err(|e| e.to_string())?;
        for i in 0..self.n_rows {
            writer
                .write_record(self.columns.iter().map(|c| c[i].as_str()))
                .map_err(|e| e.to_string())?;
        }
        writer.flush().map_err(|e| e.to_string())
    }
}
