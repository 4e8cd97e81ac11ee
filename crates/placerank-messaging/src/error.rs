use thiserror::Error;

use crate::campaign::CampaignState;

#[derive(Debug, Error)]
pub enum MessagingError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid backend base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("campaign cannot move from {from} to {to}")]
    InvalidTransition {
        from: CampaignState,
        to: CampaignState,
    },

    #[error("invalid campaign plan: {0}")]
    InvalidPlan(String),

    #[error("failed to read campaign plan {path}: {source}")]
    PlanFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse campaign plan: {0}")]
    PlanFileParse(#[from] serde_yaml::Error),
}
