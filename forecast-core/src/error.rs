use thiserror::Error;

use crate::codes::Category;

pub type Result<T> = std::result::Result<T, ForecastError>;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Forecast provider error: {0}")]
    Provider(String),

    #[error("Cannot aggregate an empty forecast batch")]
    EmptyBatch,

    #[error("Unknown {kind} code: {code}")]
    UnknownCode { kind: &'static str, code: i64 },

    #[error("Malformed {category} value: '{value}'")]
    Parse { category: Category, value: String },

    #[error("Store error: {0}")]
    Store(String),
}

impl From<reqwest::Error> for ForecastError {
    fn from(e: reqwest::Error) -> Self {
        ForecastError::Provider(e.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(e: serde_json::Error) -> Self {
        ForecastError::Provider(format!("json document error: {e}"))
    }
}
