use std::time::Duration;

use anyhow::{Result, bail};

use crate::retry::{MAX_ATTEMPTS, RETRY_DELAY, RetryPolicy};
use crate::sheets::{DEFAULT_DRIVE_URL, DEFAULT_SHEETS_URL};

/// Which spreadsheet to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkbookTarget {
    /// Exact spreadsheet title, looked up through Drive.
    Title(String),
    /// Spreadsheet id as it appears in the URL.
    Key(String),
}

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Config {
    pub workbook: Option<WorkbookTarget>,
    pub token: Option<String>,
    pub api_url: String,
    pub drive_url: String,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workbook: None,
            token: None,
            api_url: DEFAULT_SHEETS_URL.to_string(),
            drive_url: DEFAULT_DRIVE_URL.to_string(),
            retry: RetryPolicy::new(MAX_ATTEMPTS, RETRY_DELAY),
        }
    }
}

impl Config {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        workbook: Option<String>,
        key: Option<String>,
        token: Option<String>,
        api_url: Option<String>,
        drive_url: Option<String>,
        max_attempts: Option<usize>,
        retry_delay_secs: Option<u64>,
    ) -> Result<Self> {
        let workbook = match (workbook, key) {
            (Some(_), Some(_)) => bail!("Use either --workbook or --key, not both"),
            (Some(title), None) => Some(WorkbookTarget::Title(title)),
            (None, Some(key)) => Some(WorkbookTarget::Key(key)),
            (None, None) => None,
        };

        let defaults = Config::default();
        let retry = RetryPolicy::new(
            max_attempts.unwrap_or(MAX_ATTEMPTS),
            retry_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(RETRY_DELAY),
        );

        Ok(Self {
            workbook,
            token: token.filter(|t| !t.is_empty()),
            api_url: api_url.unwrap_or(defaults.api_url),
            drive_url: drive_url.unwrap_or(defaults.drive_url),
            retry,
        })
    }

    /// The spreadsheet to open, required by every command that talks to the service.
    pub fn target(&self) -> Result<&WorkbookTarget> {
        match &self.workbook {
            Some(target) => Ok(target),
            None => bail!("No workbook given. Pass --workbook <TITLE> or --key <ID>."),
        }
    }
}
