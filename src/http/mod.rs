//! HTTP client module with typed service errors.

mod client;
mod error;

pub use client::HttpClient;
pub use error::{ApiError, check_status};
