//! Workbook facade: locate worksheets and move tables in and out of them.
//!
//! Every remote call is wrapped in [`with_retry`] using the workbook's
//! [`RetryPolicy`].

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use log::{debug, info};
use serde_json::Value;

use crate::a1::{self, qualified_range};
use crate::retry::{RetryPolicy, with_retry};
use crate::sheets::{
    CellFormat, GridRange, LookupError, MajorDimension, Request, SheetRef, Spreadsheet,
    Spreadsheets, Worksheet,
};
use crate::table::Table;

/// An opened spreadsheet.
pub struct Workbook<S: Spreadsheets> {
    service: S,
    policy: RetryPolicy,
    spreadsheet: Spreadsheet,
}

impl<S: Spreadsheets> Workbook<S> {
    /// Opens the spreadsheet whose title is exactly `title`.
    #[tracing::instrument(skip(service, policy))]
    pub async fn open(service: S, title: &str, policy: RetryPolicy) -> Result<Self> {
        let id = with_retry(&policy, "Opening workbook", || service.find_spreadsheet(title)).await?;
        Self::open_by_key(service, &id, policy).await
    }

    /// Opens a spreadsheet by its id.
    #[tracing::instrument(skip(service, policy))]
    pub async fn open_by_key(
        service: S,
        spreadsheet_id: &str,
        policy: RetryPolicy,
    ) -> Result<Self> {
        let spreadsheet = with_retry(&policy, "Fetching workbook", || {
            service.get_spreadsheet(spreadsheet_id)
        })
        .await?;
        debug!(
            "Opened '{}' ({}) with {} worksheet(s)",
            spreadsheet.title,
            spreadsheet.id,
            spreadsheet.sheets.len()
        );

        Ok(Self {
            service,
            policy,
            spreadsheet,
        })
    }

    pub fn id(&self) -> &str {
        &self.spreadsheet.id
    }

    pub fn title(&self) -> &str {
        &self.spreadsheet.title
    }

    pub fn url(&self) -> &str {
        &self.spreadsheet.url
    }

    /// Re-reads the sheet list so lookups see tabs added or renamed elsewhere.
    async fn worksheets(&mut self) -> Result<Vec<Worksheet>> {
        let id = self.spreadsheet.id.clone();
        let service = &self.service;
        self.spreadsheet =
            with_retry(&self.policy, "Listing worksheets", || service.get_spreadsheet(&id)).await?;

        Ok(self
            .spreadsheet
            .sheets
            .iter()
            .cloned()
            .map(|properties| Worksheet {
                spreadsheet_id: self.spreadsheet.id.clone(),
                spreadsheet_url: self.spreadsheet.url.clone(),
                properties,
            })
            .collect())
    }

    /// Worksheet titles mapped to their sheet ids.
    pub async fn worksheet_map(&mut self) -> Result<BTreeMap<String, i64>> {
        Ok(self
            .worksheets()
            .await?
            .into_iter()
            .map(|ws| (ws.properties.title, ws.properties.sheet_id))
            .collect())
    }

    /// Finds a worksheet by title, ignoring case.
    pub async fn sheet_by_name(&mut self, name: &str) -> Result<Worksheet> {
        let wanted = name.to_lowercase();
        let sheets = self.worksheets().await?;

        let available: Vec<String> = sheets.iter().map(|ws| ws.title().to_lowercase()).collect();
        match sheets
            .into_iter()
            .find(|ws| ws.title().to_lowercase() == wanted)
        {
            Some(ws) => Ok(ws),
            None => Err(LookupError::WorksheetNotFound {
                requested: name.to_string(),
                available,
            }
            .into()),
        }
    }

    /// Finds a worksheet by its numeric sheet id.
    pub async fn sheet_by_id(&mut self, sheet_id: i64) -> Result<Worksheet> {
        self.worksheets()
            .await?
            .into_iter()
            .find(|ws| ws.id() == sheet_id)
            .ok_or_else(|| LookupError::WorksheetIdNotFound(sheet_id).into())
    }

    /// Resolves a name, id or worksheet to a worksheet.
    pub async fn resolve(&mut self, sheet: impl Into<SheetRef>) -> Result<Worksheet> {
        match sheet.into() {
            SheetRef::Sheet(ws) => Ok(ws),
            SheetRef::Name(name) => self.sheet_by_name(&name).await,
            SheetRef::Id(id) => self.sheet_by_id(id).await,
        }
    }

    async fn batch_update(&self, operation_name: &str, requests: Vec<Request>) -> Result<()> {
        with_retry(&self.policy, operation_name, || {
            self.service.batch_update(&self.spreadsheet.id, &requests)
        })
        .await
    }

    /// Replaces the whole worksheet with `table`: header in row 1, data below,
    /// data rows formatted plainly and the header row frozen.
    #[tracing::instrument(skip(self, table))]
    pub async fn replace_with_table(&mut self, name: &str, table: &Table) -> Result<Worksheet> {
        if table.columns().is_empty() {
            bail!("Cannot write a table without columns to '{}'", name);
        }
        let ws = self.sheet_by_name(name).await?;
        let sheet_id = ws.id();

        self.batch_update("Clearing basic filter", vec![Request::clear_basic_filter(sheet_id)])
            .await?;
        self.batch_update("Unfreezing worksheet", vec![Request::freeze(sheet_id, 0, 0)])
            .await?;

        let whole_sheet = qualified_range(ws.title(), "");
        with_retry(&self.policy, "Clearing worksheet", || {
            self.service.clear_values(&self.spreadsheet.id, &whole_sheet)
        })
        .await?;

        let values = table.to_values();
        let (_, width) = table.shape();
        let height = values.len();
        let range = qualified_range(ws.title(), &a1::block_range(1, height, width));
        with_retry(&self.policy, "Writing table", || {
            self.service
                .update_values(&self.spreadsheet.id, &range, &values)
        })
        .await?;

        if height > 1 {
            let data_rows = GridRange {
                sheet_id,
                start_row_index: 1,
                end_row_index: height,
                start_column_index: 0,
                end_column_index: width,
            };
            self.batch_update(
                "Formatting data rows",
                vec![Request::format(data_rows, CellFormat::plain_centered())],
            )
            .await?;
        }

        self.batch_update("Freezing header row", vec![Request::freeze_rows(sheet_id, 1)])
            .await?;

        info!(
            "Replaced '{}' with {} row(s) x {} column(s)",
            ws.title(),
            height - 1,
            width
        );
        Ok(ws)
    }

    /// Writes `values` into `range` (A1 notation, relative to the sheet).
    pub async fn update_range(
        &mut self,
        sheet: impl Into<SheetRef>,
        range: &str,
        values: &[Vec<Value>],
    ) -> Result<Worksheet> {
        let ws = self.resolve(sheet).await?;
        let range = qualified_range(ws.title(), range);
        with_retry(&self.policy, "Updating range", || {
            self.service.update_values(&self.spreadsheet.id, &range, values)
        })
        .await?;
        Ok(ws)
    }

    /// Reads the worksheet using its first row as header.
    pub async fn to_table(&mut self, sheet: impl Into<SheetRef>) -> Result<Table> {
        let ws = self.resolve(sheet).await?;
        let range = qualified_range(ws.title(), "");
        let values = with_retry(&self.policy, "Reading worksheet", || {
            self.service
                .get_values(&self.spreadsheet.id, &range, MajorDimension::Rows)
        })
        .await?;
        Ok(Table::from_values(values))
    }

    /// Appends one row after the last non-empty row.
    pub async fn append_row(
        &mut self,
        sheet: impl Into<SheetRef>,
        row: Vec<Value>,
    ) -> Result<Worksheet> {
        let ws = self.resolve(sheet).await?;
        let range = qualified_range(ws.title(), "");
        let values = [row];
        with_retry(&self.policy, "Appending row", || {
            self.service
                .append_values(&self.spreadsheet.id, &range, &values)
        })
        .await?;
        Ok(ws)
    }

    /// Browser URL of the worksheet.
    pub async fn sheet_url(&mut self, sheet: impl Into<SheetRef>) -> Result<String> {
        Ok(self.resolve(sheet).await?.url())
    }

    /// All values of the 1-based column `index`, trailing blanks trimmed by the service.
    pub async fn column_values(
        &mut self,
        sheet: impl Into<SheetRef>,
        index: usize,
    ) -> Result<Vec<String>> {
        if index == 0 {
            bail!("Column index is 1-based; 0 is not a column");
        }
        let ws = self.resolve(sheet).await?;
        let letter = a1::column_letter(index);
        let range = qualified_range(ws.title(), &format!("{}:{}", letter, letter));

        let columns = with_retry(&self.policy, "Reading column", || {
            self.service
                .get_values(&self.spreadsheet.id, &range, MajorDimension::Columns)
        })
        .await?;
        Ok(columns.into_iter().next().unwrap_or_default())
    }

    /// Clears the values of `range`, keeping formatting.
    pub async fn batch_clear(&mut self, sheet: impl Into<SheetRef>, range: &str) -> Result<()> {
        let ws = self.resolve(sheet).await?;
        let ranges = [qualified_range(ws.title(), range)];
        with_retry(&self.policy, "Clearing range", || {
            self.service.batch_clear(&self.spreadsheet.id, &ranges)
        })
        .await
    }

    /// Removes the worksheet's basic filter, if any.
    pub async fn clear_basic_filter(&mut self, sheet: impl Into<SheetRef>) -> Result<()> {
        let ws = self.resolve(sheet).await?;
        self.batch_update("Clearing basic filter", vec![Request::clear_basic_filter(ws.id())])
            .await
    }

    /// Deletes rows `start..=end` (1-based, inclusive). Without `end` only
    /// row `start` is deleted.
    pub async fn delete_rows(
        &mut self,
        sheet: impl Into<SheetRef>,
        start: usize,
        end: Option<usize>,
    ) -> Result<()> {
        let end = end.unwrap_or(start);
        if start == 0 {
            bail!("Row indexes are 1-based; 0 is not a row");
        }
        if end < start {
            bail!("End row {} is before start row {}", end, start);
        }
        let ws = self.resolve(sheet).await?;
        self.batch_update("Deleting rows", vec![Request::delete_rows(ws.id(), start, end)])
            .await
    }
}
