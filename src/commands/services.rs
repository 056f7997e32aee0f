//! Service factory for building the spreadsheet client.
//!
//! Construction of the HTTP client and the Sheets service is kept apart from
//! the configuration; services are built from configuration values.

use anyhow::Result;
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use crate::{
    http::HttpClient,
    sheets::GoogleSheets,
    workbook::Workbook,
};

use super::config::{Config, WorkbookTarget};

/// Build an HTTP client with optional bearer token
pub fn build_http_client(token: Option<&str>) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();

    if let Some(token) = token {
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        debug!("HTTP client configured with authentication");
    }

    let client = Client::builder()
        .user_agent(concat!("sheetwrap/", env!("SHEETWRAP_VERSION")))
        .default_headers(headers)
        .build()?;

    Ok(HttpClient::new(client))
}

/// Build the Google Sheets service from configuration
pub fn build_sheets(config: &Config) -> Result<GoogleSheets> {
    let http_client = build_http_client(config.token.as_deref())?;
    Ok(GoogleSheets::from_http_client(
        http_client,
        &config.api_url,
        &config.drive_url,
    ))
}

/// Open the configured workbook
pub async fn open_workbook(config: &Config) -> Result<Workbook<GoogleSheets>> {
    let sheets = build_sheets(config)?;
    match config.target()? {
        WorkbookTarget::Title(title) => Workbook::open(sheets, title, config.retry).await,
        WorkbookTarget::Key(key) => Workbook::open_by_key(sheets, key, config.retry).await,
    }
}
