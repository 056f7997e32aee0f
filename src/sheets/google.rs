//! Google Sheets v4 implementation of [`Spreadsheets`].

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::debug;
use reqwest::{Method, Url};
use serde::de::IgnoredAny;
use serde_json::{Value, json};

use crate::http::HttpClient;

use super::{
    LookupError, MajorDimension, Request, SheetProperties, Spreadsheet, Spreadsheets,
};

pub const DEFAULT_SHEETS_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_DRIVE_URL: &str = "https://www.googleapis.com";

const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// Sheets/Drive API response types (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct FileList {
        #[serde(default)]
        pub files: Vec<File>,
    }

    #[derive(Deserialize, Debug)]
    pub struct File {
        pub id: String,
        pub name: String,
    }

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Spreadsheet {
        pub spreadsheet_id: String,
        pub properties: SpreadsheetProperties,
        pub spreadsheet_url: Option<String>,
        #[serde(default)]
        pub sheets: Vec<Sheet>,
    }

    #[derive(Deserialize, Debug)]
    pub struct SpreadsheetProperties {
        pub title: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct Sheet {
        pub properties: SheetProperties,
    }

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct SheetProperties {
        #[serde(default)]
        pub sheet_id: i64,
        pub title: String,
        #[serde(default)]
        pub index: usize,
        #[serde(default)]
        pub grid_properties: Option<GridProperties>,
    }

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct GridProperties {
        #[serde(default)]
        pub row_count: usize,
        #[serde(default)]
        pub column_count: usize,
    }

    #[derive(Deserialize, Debug)]
    pub struct ValueRange {
        #[serde(default)]
        pub values: Vec<Vec<serde_json::Value>>,
    }
}

/// Google Sheets REST client.
pub struct GoogleSheets {
    http_client: HttpClient,
    api_url: String,
    drive_url: String,
}

impl GoogleSheets {
    /// Create from an existing HttpClient.
    pub fn from_http_client(http_client: HttpClient, api_url: &str, drive_url: &str) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            drive_url: drive_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// `<base>/<segments...>` with each segment percent-encoded.
    fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(base)?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Invalid base URL: {}", base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn spreadsheet_url(&self, spreadsheet_id: &str, suffix: &str) -> Result<Url> {
        let last = format!("{}{}", spreadsheet_id, suffix);
        Self::endpoint(&self.api_url, &["v4", "spreadsheets", &last])
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str, suffix: &str) -> Result<Url> {
        let last = format!("{}{}", range, suffix);
        Self::endpoint(
            &self.api_url,
            &["v4", "spreadsheets", spreadsheet_id, "values", &last],
        )
    }

    fn browser_url(spreadsheet_id: &str) -> String {
        format!("https://docs.google.com/spreadsheets/d/{}", spreadsheet_id)
    }
}

/// Drive query literal: backslashes and single quotes escaped.
fn drive_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Renders a cell the way the service formats it for display.
fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl From<api::SheetProperties> for SheetProperties {
    fn from(p: api::SheetProperties) -> Self {
        let (row_count, column_count) = p
            .grid_properties
            .map(|g| (g.row_count, g.column_count))
            .unwrap_or_default();
        SheetProperties {
            sheet_id: p.sheet_id,
            title: p.title,
            index: p.index,
            row_count,
            column_count,
        }
    }
}

#[async_trait]
impl Spreadsheets for GoogleSheets {
    #[tracing::instrument(skip(self))]
    async fn find_spreadsheet(&self, title: &str) -> Result<String> {
        let mut url = Self::endpoint(&self.drive_url, &["drive", "v3", "files"])?;
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            drive_literal(title),
            SPREADSHEET_MIME_TYPE
        );
        url.query_pairs_mut()
            .append_pair("q", &query)
            .append_pair("fields", "files(id,name)")
            .append_pair("supportsAllDrives", "true")
            .append_pair("includeItemsFromAllDrives", "true");

        debug!("Looking up spreadsheet '{}'...", title);
        let list: api::FileList = self.http_client.get_json(url).await?;

        list.files
            .into_iter()
            .find(|f| f.name == title)
            .map(|f| f.id)
            .ok_or_else(|| LookupError::SpreadsheetNotFound(title.to_string()).into())
    }

    #[tracing::instrument(skip(self))]
    async fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<Spreadsheet> {
        let url = self.spreadsheet_url(spreadsheet_id, "")?;
        let raw: api::Spreadsheet = self.http_client.get_json(url).await?;

        let url = raw
            .spreadsheet_url
            .unwrap_or_else(|| Self::browser_url(&raw.spreadsheet_id));

        Ok(Spreadsheet {
            id: raw.spreadsheet_id,
            title: raw.properties.title,
            url,
            sheets: raw
                .sheets
                .into_iter()
                .map(|s| SheetProperties::from(s.properties))
                .collect(),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        dimension: MajorDimension,
    ) -> Result<Vec<Vec<String>>> {
        let mut url = self.values_url(spreadsheet_id, range, "")?;
        url.query_pairs_mut()
            .append_pair("majorDimension", &dimension.to_string());

        let raw: api::ValueRange = self.http_client.get_json(url).await?;

        Ok(raw
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    #[tracing::instrument(skip(self, values))]
    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<Value>],
    ) -> Result<()> {
        let mut url = self.values_url(spreadsheet_id, range, "")?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": values,
        });
        let _: IgnoredAny = self.http_client.send_json(Method::PUT, url, &body).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, values))]
    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<Value>],
    ) -> Result<()> {
        let mut url = self.values_url(spreadsheet_id, range, ":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": values,
        });
        let _: IgnoredAny = self.http_client.send_json(Method::POST, url, &body).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn clear_values(&self, spreadsheet_id: &str, range: &str) -> Result<()> {
        let url = self.values_url(spreadsheet_id, range, ":clear")?;
        let _: IgnoredAny = self
            .http_client
            .send_json(Method::POST, url, &json!({}))
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn batch_clear(&self, spreadsheet_id: &str, ranges: &[String]) -> Result<()> {
        let url = Self::endpoint(
            &self.api_url,
            &["v4", "spreadsheets", spreadsheet_id, "values:batchClear"],
        )?;
        let _: IgnoredAny = self
            .http_client
            .send_json(Method::POST, url, &json!({ "ranges": ranges }))
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, requests))]
    async fn batch_update(&self, spreadsheet_id: &str, requests: &[Request]) -> Result<()> {
        debug!(
            "Sending {} request(s) to spreadsheet {}",
            requests.len(),
            spreadsheet_id
        );
        let url = self.spreadsheet_url(spreadsheet_id, ":batchUpdate")?;
        let _: IgnoredAny = self
            .http_client
            .send_json(Method::POST, url, &json!({ "requests": requests }))
            .await?;
        Ok(())
    }
}
