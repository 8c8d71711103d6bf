//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror. Only
//! [`Error::InvalidInput`] ever reaches callers of the generate command;
//! everything else is logged and degraded to an empty result.

use crate::models::MirrorId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Mirror {mirror} returned status {status}: {body}")]
    MirrorStatus {
        mirror: MirrorId,
        status: u16,
        body: String,
    },

    #[error("Error parsing mirror {mirror} image response into JSON: {source}")]
    ResponseParseFailed {
        mirror: MirrorId,
        #[source]
        source: serde_json::Error,
    },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Could not read persisted data: {0}")]
    PersistenceRead(String),

    #[error("Could not write persisted data: {0}")]
    PersistenceWrite(String),

    #[error("No persisted data for {0}")]
    SnapshotMissing(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command error: {0}")]
    Command(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for failures talking to a mirror (transport or non-2xx status).
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Http(_) | Error::MirrorStatus { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
