//! Error types for the import CLI

use thiserror::Error;

#[cfg(test)]
mod tests;

pub type Result<T> = std::result::Result<T, ImportError>;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Missing required environment variable {var}")]
    MissingEnv { var: String },

    #[error("Failed to parse number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Datastore rejected request on {table} (status {status}): {message}")]
    Store {
        table: String,
        status: u16,
        message: String,
    },

    #[error("Unknown table: {table}")]
    UnknownTable { table: String },

    #[error("API returned no data for {endpoint}")]
    NoData { endpoint: String },

    #[error("Import aborted: {reason}")]
    Aborted { reason: String },
}

impl ImportError {
    /// Shorten the error text for one-line failure listings.
    pub fn short_message(&self, max_chars: usize) -> String {
        let text = self.to_string();
        text.chars().take(max_chars).collect()
    }
}
