//! Spreadsheet service abstraction.
//!
//! Each [`Spreadsheets`] method maps to exactly one remote call so that the
//! workbook layer can wrap every call in its own retry loop.

mod google;
mod requests;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub use google::{DEFAULT_DRIVE_URL, DEFAULT_SHEETS_URL, GoogleSheets};
pub use requests::{
    CellFormat, Color, Dimension, GridRange, HorizontalAlignment, Request, TextFormat,
};

/// Properties of one worksheet (tab) inside a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
    pub index: usize,
    pub row_count: usize,
    pub column_count: usize,
}

/// Spreadsheet metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spreadsheet {
    pub id: String,
    pub title: String,
    pub url: String,
    pub sheets: Vec<SheetProperties>,
}

/// A resolved worksheet together with its owning spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    pub spreadsheet_id: String,
    pub spreadsheet_url: String,
    pub properties: SheetProperties,
}

impl Worksheet {
    pub fn id(&self) -> i64 {
        self.properties.sheet_id
    }

    pub fn title(&self) -> &str {
        &self.properties.title
    }

    /// Browser URL that opens this tab.
    pub fn url(&self) -> String {
        format!("{}#gid={}", self.spreadsheet_url, self.properties.sheet_id)
    }
}

/// Which way a value grid is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MajorDimension {
    #[default]
    Rows,
    Columns,
}

impl fmt::Display for MajorDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MajorDimension::Rows => write!(f, "ROWS"),
            MajorDimension::Columns => write!(f, "COLUMNS"),
        }
    }
}

/// A worksheet given by name, by numeric id, or already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetRef {
    Name(String),
    Id(i64),
    Sheet(Worksheet),
}

impl From<&str> for SheetRef {
    fn from(name: &str) -> Self {
        SheetRef::Name(name.to_string())
    }
}

impl From<String> for SheetRef {
    fn from(name: String) -> Self {
        SheetRef::Name(name)
    }
}

impl From<i64> for SheetRef {
    fn from(id: i64) -> Self {
        SheetRef::Id(id)
    }
}

impl From<Worksheet> for SheetRef {
    fn from(sheet: Worksheet) -> Self {
        SheetRef::Sheet(sheet)
    }
}

impl FromStr for SheetRef {
    type Err = anyhow::Error;

    /// `id:<n>` selects by sheet id, anything else by name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("id:") {
            Some(id) => {
                let id = id
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| anyhow::anyhow!("Invalid sheet id '{}'", id))?;
                Ok(SheetRef::Id(id))
            }
            None if s.is_empty() => anyhow::bail!("Sheet name must not be empty"),
            None => Ok(SheetRef::Name(s.to_string())),
        }
    }
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetRef::Name(name) => write!(f, "{}", name),
            SheetRef::Id(id) => write!(f, "id:{}", id),
            SheetRef::Sheet(sheet) => write!(f, "{}", sheet.title()),
        }
    }
}

/// Lookups that cannot succeed on retry.
#[derive(Debug)]
pub enum LookupError {
    SpreadsheetNotFound(String),
    WorksheetNotFound {
        requested: String,
        available: Vec<String>,
    },
    WorksheetIdNotFound(i64),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::SpreadsheetNotFound(title) => {
                write!(f, "Spreadsheet '{}' not found or not shared with you", title)
            }
            LookupError::WorksheetNotFound {
                requested,
                available,
            } => {
                write!(
                    f,
                    "Worksheet '{}' not found. Worksheet name must be one of {:?}",
                    requested, available
                )
            }
            LookupError::WorksheetIdNotFound(id) => {
                write!(f, "No worksheet with id {}", id)
            }
        }
    }
}

impl std::error::Error for LookupError {}

/// Remote calls against a spreadsheet service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Spreadsheets: Send + Sync {
    /// Finds a spreadsheet by exact title and returns its id.
    async fn find_spreadsheet(&self, title: &str) -> Result<String>;

    /// Fetches spreadsheet metadata including every sheet's properties.
    async fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<Spreadsheet>;

    /// Reads the formatted values of `range` (A1 notation, sheet-qualified).
    async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        dimension: MajorDimension,
    ) -> Result<Vec<Vec<String>>>;

    /// Overwrites `range` with `values`, entered as-is.
    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<Value>],
    ) -> Result<()>;

    /// Appends `values` after the last row of the table found in `range`.
    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<Value>],
    ) -> Result<()>;

    /// Clears the values of `range`, keeping formatting.
    async fn clear_values(&self, spreadsheet_id: &str, range: &str) -> Result<()>;

    /// Clears several ranges in one call.
    async fn batch_clear(&self, spreadsheet_id: &str, ranges: &[String]) -> Result<()>;

    /// Applies structural and formatting requests in one call.
    async fn batch_update(&self, spreadsheet_id: &str, requests: &[Request]) -> Result<()>;
}
