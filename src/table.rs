//! Header-plus-rows shape used to read and write whole worksheets.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A worksheet's contents with the first row split off as column names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "TableData")]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Unvalidated wire form of [`Table`].
#[derive(Deserialize)]
struct TableData {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<String>>,
}

impl TryFrom<TableData> for Table {
    type Error = anyhow::Error;

    fn try_from(data: TableData) -> Result<Self> {
        Table::new(data.columns, data.rows)
    }
}

impl Table {
    /// Builds a table, rejecting rows wider than the header.
    /// Shorter rows are padded with empty cells.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let width = columns.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() > width) {
            bail!(
                "Row {} has {} cells but the table has {} columns",
                i + 1,
                row.len(),
                width
            );
        }

        Ok(Self::padded(columns, rows))
    }

    /// Builds a table from a value grid using the first row as header.
    ///
    /// The service omits trailing empty cells, so short rows are padded and
    /// the header is widened to the longest row.
    pub fn from_values(values: Vec<Vec<String>>) -> Self {
        let mut iter = values.into_iter();
        let Some(mut columns) = iter.next() else {
            return Self::default();
        };
        let rows: Vec<Vec<String>> = iter.collect();

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns.len() < width {
            columns.resize(width, String::new());
        }

        Self::padded(columns, rows)
    }

    fn padded(columns: Vec<String>, mut rows: Vec<Vec<String>>) -> Self {
        for row in &mut rows {
            row.resize(columns.len(), String::new());
        }
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// `(rows, columns)`, header excluded.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells of the first column named `name`.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// Header followed by the data rows, ready to be written back.
    pub fn to_values(&self) -> Vec<Vec<Value>> {
        std::iter::once(&self.columns)
            .chain(self.rows.iter())
            .map(|row| row.iter().cloned().map(Value::String).collect())
            .collect()
    }

    /// One JSON object per row keyed by column name.
    ///
    /// Duplicate column names keep the last cell, like a JSON object would.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned().map(Value::String))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_from_values_uses_first_row_as_header() {
        let table = Table::from_values(grid(&[
            &["name", "qty"],
            &["apple", "3"],
            &["pear", "5"],
        ]));

        assert_eq!(table.columns(), ["name", "qty"]);
        assert_eq!(table.shape(), (2, 2));
        assert_eq!(table.rows()[1], ["pear", "5"]);
    }

    #[test]
    fn test_from_values_pads_trimmed_rows() {
        let table = Table::from_values(grid(&[&["a", "b", "c"], &["1"], &["1", "2", "3"]]));
        assert_eq!(table.rows()[0], ["1", "", ""]);
    }

    #[test]
    fn test_from_values_widens_header() {
        let table = Table::from_values(grid(&[&["a"], &["1", "2"]]));
        assert_eq!(table.columns(), ["a", ""]);
        assert_eq!(table.shape(), (1, 2));
    }

    #[test]
    fn test_from_values_empty() {
        let table = Table::from_values(Vec::new());
        assert!(table.is_empty());
        assert_eq!(table.shape(), (0, 0));

        let header_only = Table::from_values(grid(&[&["a", "b"]]));
        assert!(header_only.is_empty());
        assert_eq!(header_only.shape(), (0, 2));
    }

    #[test]
    fn test_new_rejects_wide_rows() {
        let err = Table::new(
            vec!["a".into()],
            vec![vec!["1".into(), "2".into()]],
        )
        .unwrap_err();
        assert!(err.to_string().contains("Row 1 has 2 cells"));
    }

    #[test]
    fn test_column_lookup() {
        let table = Table::from_values(grid(&[&["name", "qty"], &["apple", "3"]]));
        assert_eq!(table.column("qty"), Some(vec!["3"]));
        assert_eq!(table.column("missing"), None);
    }

    #[test]
    fn test_to_values_includes_header() {
        let table = Table::from_values(grid(&[&["name"], &["apple"]]));
        assert_eq!(
            table.to_values(),
            vec![
                vec![Value::String("name".into())],
                vec![Value::String("apple".into())]
            ]
        );
    }

    #[test]
    fn test_to_records() {
        let table = Table::from_values(grid(&[&["name", "qty"], &["apple", "3"]]));
        let records = table.to_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "apple");
        assert_eq!(records[0]["qty"], "3");
    }

    #[test]
    fn test_deserialize_without_rows() {
        let table: Table = serde_json::from_str(r#"{"columns": ["a", "b"]}"#).unwrap();
        assert_eq!(table.shape(), (0, 2));
    }

    #[test]
    fn test_deserialize_validates_rows() {
        let table: Table =
            serde_json::from_str(r#"{"columns": ["a", "b"], "rows": [["1"]]}"#).unwrap();
        assert_eq!(table.rows()[0], ["1", ""]);

        let result = serde_json::from_str::<Table>(r#"{"columns": ["a"], "rows": [["1", "2"]]}"#);
        assert!(result.is_err());
    }
}
