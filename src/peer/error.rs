//! Transport-level peer failures.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("connection to {0} failed")]
    Connect(String),

    #[error("{op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("peer rejected request: {0}")]
    Rejected(String),
}

impl PeerError {
    /// Whether the connection is still usable after this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PeerError::Rejected(_))
    }
}
