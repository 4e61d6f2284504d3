//! Handle to one remote aggregation peer.
//!
//! A `ServiceLink` is only ever stored behind its peer's mutex in the engine, so
//! every remote operation below needs `&mut ServiceLink`, i.e. a held lock.
//! Availability is the presence of a live connection; there is no separate flag
//! that could disagree with it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{PeerConnector, PeerError, PeerKind, PeerRpc};
use crate::tree::Descriptor;

pub struct ServiceLink {
    kind: PeerKind,
    connector: Arc<dyn PeerConnector>,
    connection: Option<Arc<dyn PeerRpc>>,
    call_timeout: Duration,
}

impl ServiceLink {
    pub fn new(kind: PeerKind, connector: Arc<dyn PeerConnector>, call_timeout: Duration) -> Self {
        Self {
            kind,
            connector,
            connection: None,
            call_timeout,
        }
    }

    pub fn kind(&self) -> PeerKind {
        self.kind
    }

    pub fn is_available(&self) -> bool {
        self.connection.is_some()
    }

    /// Connect or disconnect. Returns false if the connection attempt failed, in
    /// which case the link stays unavailable.
    pub async fn set_available(&mut self, available: bool) -> bool {
        if available == self.is_available() {
            return true;
        }

        if !available {
            self.connection = None;
            info!("{} peer marked unavailable", self.kind);
            return true;
        }

        let endpoint = self.connector.endpoint();
        match tokio::time::timeout(self.call_timeout, self.connector.connect()).await {
            Ok(Ok(connection)) => {
                self.connection = Some(connection);
                info!("✅ {} peer connected ({})", self.kind, endpoint);
                true
            }
            Ok(Err(e)) => {
                warn!("Failed to connect to {} peer at {}: {}", self.kind, endpoint, e);
                false
            }
            Err(_) => {
                warn!(
                    "Connecting to {} peer at {} timed out after {:?}",
                    self.kind, endpoint, self.call_timeout
                );
                false
            }
        }
    }

    pub async fn reset(&mut self) -> bool {
        let Some(conn) = self.connection.clone() else {
            return false;
        };
        self.settle("reset", conn.reset()).await
    }

    pub async fn add_fru(&mut self, parent_path: &str, descriptor: &Descriptor) -> bool {
        let Some(conn) = self.connection.clone() else {
            return false;
        };
        self.settle("add_fru", conn.add_fru(parent_path, descriptor)).await
    }

    pub async fn add_sensors(&mut self, fru_path: &str, descriptors: &[Descriptor]) -> bool {
        let Some(conn) = self.connection.clone() else {
            return false;
        };
        self.settle("add_sensors", conn.add_sensors(fru_path, descriptors)).await
    }

    pub async fn remove_fru(&mut self, path: &str) -> bool {
        let Some(conn) = self.connection.clone() else {
            return false;
        };
        self.settle("remove_fru", conn.remove_fru(path)).await
    }

    /// Run one remote call under the call timeout. Timeouts and transport
    /// failures count as the peer going away.
    async fn settle<F>(&mut self, op: &'static str, call: F) -> bool
    where
        F: Future<Output = Result<bool, PeerError>>,
    {
        let error = match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(accepted)) => {
                if !accepted {
                    debug!("{} peer refused {}", self.kind, op);
                }
                return accepted;
            }
            Ok(Err(e)) => e,
            Err(_) => PeerError::Timeout {
                op,
                after: self.call_timeout,
            },
        };

        if error.is_fatal() {
            warn!("{} peer failed during {}: {}. Dropping connection", self.kind, op, error);
            self.connection = None;
        } else {
            debug!("{} peer {}: {}", self.kind, op, error);
        }
        false
    }
}
