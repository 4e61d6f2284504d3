//! Downstream aggregation peers: the RPC contract every transport implements,
//! the per-peer `ServiceLink`, and the websocket and dry-run transports.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::tree::Descriptor;

pub mod dry_run;
pub mod error;
pub mod link;
pub mod websocket;

pub use dry_run::DryRunConnector;
pub use error::PeerError;
pub use link::ServiceLink;
pub use websocket::WebSocketConnector;

/// Which of the two aggregation services a link talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerKind {
    /// Sensor-reporting service: receives FRUs and their sensors.
    Sensor,
    /// FRU-inventory service: receives FRUs only.
    Fru,
}

impl PeerKind {
    pub fn carries_sensors(self) -> bool {
        matches!(self, PeerKind::Sensor)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PeerKind::Sensor => "sensor",
            PeerKind::Fru => "fru",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sensor" => Some(PeerKind::Sensor),
            "fru" => Some(PeerKind::Fru),
            _ => None,
        }
    }
}

impl fmt::Display for PeerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Remote operations on a connected peer. Peers treat repeated identical calls
/// as no-ops. `Ok(false)` means the peer refused the request.
#[async_trait]
pub trait PeerRpc: Send + Sync {
    /// Drop the peer's whole view of our tree.
    async fn reset(&self) -> Result<bool, PeerError>;

    async fn add_fru(&self, parent_path: &str, descriptor: &Descriptor) -> Result<bool, PeerError>;

    async fn add_sensors(&self, fru_path: &str, descriptors: &[Descriptor]) -> Result<bool, PeerError>;

    /// Remove the FRU at `path`; the peer deletes its own subtree under it.
    async fn remove_fru(&self, path: &str) -> Result<bool, PeerError>;
}

/// Establishes connections to one peer.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn PeerRpc>, PeerError>;

    /// Endpoint description for logs.
    fn endpoint(&self) -> String;
}
