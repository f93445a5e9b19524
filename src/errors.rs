use thiserror::Error;

use crate::constants::{FETCH_FAILED_MSG, NO_CANTEEN_MSG};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("OpenMensa request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("OpenMensa returned HTTP {status}")]
    Remote { status: u16 },
    #[error("OpenMensa response could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum MensaError {
    #[error("no canteen ID configured")]
    ConfigMissing,
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("config store: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("settings response is not valid JSON: {0}")]
    Settings(#[from] serde_json::Error),
}

impl MensaError {
    /// Text shown on the watch for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ConfigMissing => NO_CANTEEN_MSG,
            Self::Fetch(_) | Self::Storage(_) | Self::Settings(_) => FETCH_FAILED_MSG,
        }
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("unknown message key: {0}")]
    UnknownKey(String),
    #[error("message carries no key")]
    EmptyMessage,
    #[error("expected one key per message, got {0}")]
    MultipleKeys(usize),
    #[error("malformed value for {key}")]
    MalformedValue { key: &'static str },
    #[error("message is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),
    #[error("transport: {0}")]
    Io(#[from] std::io::Error),
}
