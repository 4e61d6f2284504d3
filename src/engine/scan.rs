//! Walks over FRUs with internal presence detection.

use tracing::info;

use super::InventoryEngine;
use crate::tree::{NodeId, NodeKind};

impl InventoryEngine {
    /// Sample every internally detected FRU under the platform root and
    /// propagate the ones whose presence changed. Children of an unavailable
    /// FRU are not visited. Returns the number of transitions seen.
    pub async fn check_internal_hotplug_frus(&self) -> usize {
        let mut transitions = 0;
        let mut pending = vec![self.platform_root];

        while let Some(current) = pending.pop() {
            let mechanism = {
                let tree = self.tree.read().await;
                match tree.node(current).map(|node| node.kind()) {
                    Some(NodeKind::Fru(fru)) => fru.hotplug().mechanism(),
                    Some(NodeKind::Container) => None,
                    Some(NodeKind::Sensor(_)) | None => continue,
                }
            };

            if let Some(mechanism) = mechanism {
                let present = mechanism.sample();
                let changed = {
                    let mut tree = self.tree.write().await;
                    match tree.fru_mut(current) {
                        Some(fru) if fru.is_available() != present => {
                            fru.set_available(present);
                            let path = tree.relative_path(self.platform_root, current).unwrap_or_default();
                            Some((tree.ancestors_available(current), path))
                        }
                        _ => None,
                    }
                };

                if let Some((propagate, path)) = changed {
                    transitions += 1;
                    info!(
                        "Hot-plug: FRU {} is now {} ({})",
                        path,
                        if present { "present" } else { "absent" },
                        mechanism.describe()
                    );
                    if propagate {
                        self.availability_changed(current, present).await;
                    }
                }
            }

            let tree = self.tree.read().await;
            if let Some(fru) = tree.fru(current) {
                if !fru.is_available() {
                    continue;
                }
            }
            pending.extend(tree.children(current).into_iter().rev());
        }
        transitions
    }

    /// Number of FRUs under the platform root whose presence is sampled locally.
    pub async fn count_internally_detectable_frus(&self) -> usize {
        let tree = self.tree.read().await;
        let mut count = 0;
        let mut pending: Vec<NodeId> = vec![self.platform_root];
        while let Some(current) = pending.pop() {
            if let Some(fru) = tree.fru(current) {
                if fru.hotplug().is_internally_detectable() {
                    count += 1;
                }
            }
            pending.extend(tree.children(current));
        }
        count
    }
}
