//! Engine construction, the two inbound entry points and read-only queries.

use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

use super::propagation::{push_fru, resync_plan};
use crate::peer::{PeerKind, ServiceLink};
use crate::sensor::{read_with_retry, AccessCondition, ReadOutcome, SensorAccess, MAX_READ_RETRY};
use crate::tree::{NodeId, NodeKind, SensorObject, Tree, TreeError};

pub struct InventoryEngine {
    pub(super) tree: RwLock<Tree>,
    pub(super) platform_root: NodeId,
    sensor_peer: Mutex<ServiceLink>,
    fru_peer: Mutex<ServiceLink>,
}

impl InventoryEngine {
    /// Build an engine over `tree`. Peer-facing paths are relative to the node
    /// at `platform_root` (which is `/` to the peers).
    pub fn new(
        tree: Tree,
        platform_root: &str,
        sensor_peer: ServiceLink,
        fru_peer: ServiceLink,
    ) -> Result<Self, TreeError> {
        let root = tree
            .lookup(platform_root)
            .ok_or_else(|| TreeError::NotFound(platform_root.to_string()))?;
        debug_assert_eq!(sensor_peer.kind(), PeerKind::Sensor);
        debug_assert_eq!(fru_peer.kind(), PeerKind::Fru);

        Ok(Self {
            tree: RwLock::new(tree),
            platform_root: root,
            sensor_peer: Mutex::new(sensor_peer),
            fru_peer: Mutex::new(fru_peer),
        })
    }

    pub(super) fn link(&self, peer: PeerKind) -> &Mutex<ServiceLink> {
        match peer {
            PeerKind::Sensor => &self.sensor_peer,
            PeerKind::Fru => &self.fru_peer,
        }
    }

    /// Read access to the tree, for inspection and tests.
    pub async fn tree(&self) -> RwLockReadGuard<'_, Tree> {
        self.tree.read().await
    }

    pub fn platform_root(&self) -> NodeId {
        self.platform_root
    }

    pub async fn is_peer_available(&self, peer: PeerKind) -> bool {
        self.link(peer).lock().await.is_available()
    }

    /// Availability of the FRU at `path` (relative to the platform root).
    pub async fn fru_available(&self, path: &str) -> Option<bool> {
        let tree = self.tree.read().await;
        let id = tree.lookup_from(self.platform_root, path)?;
        tree.fru(id).map(|fru| fru.is_available())
    }

    /// Handle "peer appeared / vanished".
    ///
    /// On appearance the peer is reset and the whole available subtree is pushed,
    /// parents before children. The peer's lock is held for the entire resync so
    /// no per-FRU update can interleave with the reset. Returns false if the
    /// connection could not be established, the peer refused the reset, or the
    /// connection was lost during the resync.
    pub async fn set_peer_available(&self, peer: PeerKind, available: bool) -> bool {
        let mut link = self.link(peer).lock().await;
        if link.is_available() == available {
            return true;
        }

        if !available {
            return link.set_available(false).await;
        }

        if !link.set_available(true).await {
            return false;
        }

        // Left unavailable so the next "peer appeared" retries the full resync.
        if !link.reset().await {
            warn!("{} peer reset failed; marking it unavailable", peer);
            link.set_available(false).await;
            return false;
        }

        let plan = {
            let tree = self.tree.read().await;
            resync_plan(&tree, self.platform_root)
        };

        let mut pushed = 0;
        for entry in &plan {
            if !link.is_available() {
                break;
            }
            if push_fru(&mut link, entry).await {
                pushed += 1;
            }
        }

        info!("{} peer resynced: {}/{} FRUs pushed", peer, pushed, plan.len());
        link.is_available()
    }

    /// Handle "FRU presence changed" for an externally detected FRU.
    ///
    /// `path` is relative to the platform root, e.g. `/A/B`. Fails for paths that
    /// are not FRUs and for FRUs whose presence is sampled internally.
    pub async fn set_fru_available(&self, path: &str, available: bool) -> bool {
        let (fru, propagate) = {
            let mut tree = self.tree.write().await;
            let Some(id) = tree.lookup_from(self.platform_root, path) else {
                warn!("set_fru_available: {} not found", path);
                return false;
            };
            let Some(fru) = tree.fru_mut(id) else {
                warn!("set_fru_available: {} is not a FRU", path);
                return false;
            };
            if fru.hotplug().is_internally_detectable() {
                warn!("set_fru_available: {} is driven by its internal detector", path);
                return false;
            }
            if fru.is_available() == available {
                debug!("FRU {} already {}", path, if available { "available" } else { "unavailable" });
                return true;
            }
            fru.set_available(available);
            (id, tree.ancestors_available(id))
        };

        info!("FRU {} is now {}", path, if available { "available" } else { "unavailable" });
        if propagate {
            self.availability_changed(fru, available).await;
        } else {
            debug!("FRU {} has an unavailable ancestor; propagation deferred", path);
        }
        true
    }

    /// Read every sensor whose owning FRU chain is available and store the
    /// result on the sensor. Returns how many reads succeeded.
    pub async fn refresh_sensors(&self, access: &dyn SensorAccess, conditions: AccessCondition) -> usize {
        let targets = {
            let tree = self.tree.read().await;
            let mut targets = Vec::new();
            let mut pending = vec![self.platform_root];
            while let Some(current) = pending.pop() {
                let Some(node) = tree.node(current) else { continue };
                match node.kind() {
                    NodeKind::Sensor(sensor) => {
                        if let Some(path) = tree.path(current) {
                            targets.push((current, path, sensor.clone()));
                        }
                        continue;
                    }
                    NodeKind::Fru(fru) if !fru.is_available() => continue,
                    _ => {}
                }
                pending.extend(tree.children(current).into_iter().rev());
            }
            targets
        };

        let readings: Vec<_> = targets
            .into_iter()
            .map(|(id, path, sensor)| {
                let reading = read_with_retry(access, &path, &sensor, conditions, MAX_READ_RETRY);
                (id, reading)
            })
            .collect();

        let mut tree = self.tree.write().await;
        let mut succeeded = 0;
        for (id, reading) in readings {
            if reading.outcome == ReadOutcome::Success {
                succeeded += 1;
            }
            if let Some(sensor) = tree.sensor_mut(id) {
                sensor.record_reading(reading);
            }
        }
        succeeded
    }

    pub async fn fru_list(&self) -> Vec<String> {
        self.tree.read().await.fru_list(self.platform_root)
    }

    pub async fn fru_path_by_name(&self, name: &str) -> Option<String> {
        self.tree.read().await.fru_path_by_name(self.platform_root, name)
    }

    pub async fn fru_path_by_id(&self, id: u8) -> Option<String> {
        self.tree.read().await.fru_path_by_id(self.platform_root, id)
    }

    pub async fn sensor_path_by_name(&self, name: &str) -> Option<String> {
        self.tree.read().await.sensor_path_by_name(self.platform_root, name)
    }

    pub async fn sensor_path_by_id(&self, id: u8) -> Option<String> {
        self.tree.read().await.sensor_path_by_id(self.platform_root, id)
    }

    pub async fn sensor_objects(&self) -> Vec<SensorObject> {
        self.tree.read().await.sensor_objects(self.platform_root)
    }
}
