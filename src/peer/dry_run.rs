//! Transport that only logs what would be sent. Used with `--dry-run`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{PeerConnector, PeerError, PeerKind, PeerRpc};
use crate::tree::Descriptor;

pub struct DryRunConnector {
    kind: PeerKind,
}

impl DryRunConnector {
    pub fn new(kind: PeerKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl PeerConnector for DryRunConnector {
    async fn connect(&self) -> Result<Arc<dyn PeerRpc>, PeerError> {
        Ok(Arc::new(DryRunPeer { kind: self.kind }))
    }

    fn endpoint(&self) -> String {
        format!("dry-run:{}", self.kind)
    }
}

struct DryRunPeer {
    kind: PeerKind,
}

#[async_trait]
impl PeerRpc for DryRunPeer {
    async fn reset(&self) -> Result<bool, PeerError> {
        info!("[DRY RUN] {} peer: reset", self.kind);
        Ok(true)
    }

    async fn add_fru(&self, parent_path: &str, descriptor: &Descriptor) -> Result<bool, PeerError> {
        info!(
            "[DRY RUN] {} peer: add_fru under {} ({} bytes)",
            self.kind,
            parent_path,
            descriptor.len()
        );
        Ok(true)
    }

    async fn add_sensors(&self, fru_path: &str, descriptors: &[Descriptor]) -> Result<bool, PeerError> {
        info!(
            "[DRY RUN] {} peer: add_sensors to {} ({} sensors)",
            self.kind,
            fru_path,
            descriptors.len()
        );
        Ok(true)
    }

    async fn remove_fru(&self, path: &str) -> Result<bool, PeerError> {
        info!("[DRY RUN] {} peer: remove_fru {}", self.kind, path);
        Ok(true)
    }
}
