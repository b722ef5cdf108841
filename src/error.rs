use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider error {code}: {message}")]
    Provider { code: i64, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Submission failed: {message}")]
    Submission { message: String, suggestion: String },

    #[error("Mint failed: {0}")]
    Mint(String),

    #[error("All strategies failed for {label}: {summary}")]
    Exhausted { label: String, summary: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl WalletError {
    /// Stable machine-readable code for the error class.
    pub fn code(&self) -> &'static str {
        match self {
            WalletError::Connection(_) => "CONNECTION_ERROR",
            WalletError::Validation(_) => "VALIDATION_ERROR",
            WalletError::Transport(_) | WalletError::Exhausted { .. } => "TRANSPORT_ERROR",
            WalletError::Provider { .. } => "PROVIDER_ERROR",
            WalletError::Decode(_) | WalletError::Json(_) => "DECODE_ERROR",
            WalletError::Submission { .. } => "SUBMISSION_ERROR",
            WalletError::Mint(_) => "MINT_ERROR",
        }
    }

    /// RPC error code when the failure came back from the provider.
    pub fn provider_code(&self) -> Option<i64> {
        match self {
            WalletError::Provider { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn detail(&self) -> ErrorDetail {
        let suggestion = match self {
            WalletError::Submission { suggestion, .. } => Some(suggestion.clone()),
            _ => None,
        };
        ErrorDetail {
            code: self.code().to_string(),
            message: self.to_string(),
            suggestion,
        }
    }
}

pub type Result<T> = std::result::Result<T, WalletError>;
