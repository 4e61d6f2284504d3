//! Pushing FRU availability changes out to the peers.

use tracing::{debug, warn};

use super::{InventoryEngine, PEER_ORDER};
use crate::peer::ServiceLink;
use crate::tree::{Descriptor, NodeId, Tree};

/// Everything a peer needs to learn about one FRU, copied out of the tree so
/// that no tree lock is held while talking to the peer.
#[derive(Debug, Clone)]
pub(super) struct FruPush {
    pub parent_path: String,
    pub fru_path: String,
    pub descriptor: Descriptor,
    pub sensors: Vec<Descriptor>,
}

/// Snapshot `fru` for pushing, or `None` if it is gone, unavailable, or gated
/// by an unavailable ancestor.
pub(super) fn snapshot(tree: &Tree, base: NodeId, fru: NodeId) -> Option<FruPush> {
    let node = tree.node(fru)?;
    let state = node.as_fru()?;
    if !state.is_available() || !tree.ancestors_available(fru) {
        return None;
    }

    let sensors = tree
        .direct_sensors(fru)
        .into_iter()
        .filter_map(|id| tree.sensor(id).map(|s| s.descriptor().clone()))
        .collect();

    Some(FruPush {
        parent_path: tree.relative_path(base, node.parent()?)?,
        fru_path: tree.relative_path(base, fru)?,
        descriptor: state.descriptor().clone(),
        sensors,
    })
}

/// Every pushable FRU under `base`, parents before children. Subtrees below an
/// unavailable FRU are skipped.
pub(super) fn resync_plan(tree: &Tree, base: NodeId) -> Vec<FruPush> {
    let mut plan = Vec::new();
    let mut pending = tree.child_frus(base);
    pending.reverse();

    while let Some(current) = pending.pop() {
        let Some(push) = snapshot(tree, base, current) else {
            continue;
        };
        plan.push(push);
        pending.extend(tree.child_frus(current).into_iter().rev());
    }
    plan
}

/// Send one FRU (and, for the sensor peer, its direct sensors) over `link`.
/// Taking `&mut ServiceLink` means the caller holds that peer's lock.
pub(super) async fn push_fru(link: &mut ServiceLink, push: &FruPush) -> bool {
    if !link.is_available() {
        return false;
    }
    if !link.add_fru(&push.parent_path, &push.descriptor).await {
        warn!("{} peer did not accept FRU {}", link.kind(), push.fru_path);
        return false;
    }
    if link.kind().carries_sensors() && !push.sensors.is_empty() {
        return link.add_sensors(&push.fru_path, &push.sensors).await;
    }
    true
}

impl InventoryEngine {
    /// Propagate a change of `fru`'s availability. The caller has already
    /// updated the flag and checked that the ancestor chain is available.
    pub(super) async fn availability_changed(&self, fru: NodeId, available: bool) {
        if available {
            self.push_subtree(fru).await;
        } else {
            self.remove_everywhere(fru).await;
        }
    }

    /// Push `fru`, then its available child FRUs, one FRU and one peer lock at
    /// a time.
    async fn push_subtree(&self, fru: NodeId) {
        let mut pending = vec![fru];
        while let Some(current) = pending.pop() {
            for peer in PEER_ORDER {
                let mut link = self.link(peer).lock().await;
                if !link.is_available() {
                    continue;
                }
                let push = {
                    let tree = self.tree.read().await;
                    snapshot(&tree, self.platform_root, current)
                };
                match push {
                    Some(push) => {
                        push_fru(&mut link, &push).await;
                    }
                    None => debug!("FRU {:?} no longer pushable; skipping {} peer", current, peer),
                }
            }

            let tree = self.tree.read().await;
            let still_available = tree.fru(current).map(|f| f.is_available()).unwrap_or(false);
            if !still_available {
                continue;
            }
            pending.extend(
                tree.child_frus(current)
                    .into_iter()
                    .rev()
                    .filter(|child| tree.fru(*child).map(|f| f.is_available()).unwrap_or(false)),
            );
        }
    }

    /// Issue `remove_fru` to both peers. Peers drop the whole subtree themselves.
    ///
    /// The tree is re-read inside each peer round: a concurrent update may have
    /// made the FRU available again and pushed it before this round got the lock.
    async fn remove_everywhere(&self, fru: NodeId) {
        for peer in PEER_ORDER {
            let mut link = self.link(peer).lock().await;
            if !link.is_available() {
                continue;
            }
            let path = {
                let tree = self.tree.read().await;
                if removal_superseded(&tree, fru) {
                    None
                } else {
                    Some(tree.relative_path(self.platform_root, fru))
                }
            };
            match path {
                None => debug!("FRU {:?} is available again; skipping removal on {} peer", fru, peer),
                Some(None) => warn!("FRU {:?} is outside the platform root; nothing to remove", fru),
                Some(Some(path)) => {
                    link.remove_fru(&path).await;
                }
            }
        }
    }
}

/// True when `fru` and its whole ancestor chain are available, so a pending
/// removal no longer reflects the tree.
fn removal_superseded(tree: &Tree, fru: NodeId) -> bool {
    tree.fru(fru).map(|f| f.is_available()).unwrap_or(false) && tree.ancestors_available(fru)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotplug::HotplugDetector;
    use crate::tree::{Fru, NodeKind, Sensor};

    fn fru(desc: &str, hotplug: HotplugDetector) -> NodeKind {
        NodeKind::Fru(Fru::new(desc, hotplug))
    }

    fn build() -> Tree {
        let mut tree = Tree::new("org").unwrap();
        tree.insert("/org", "mb", fru("mb", HotplugDetector::None)).unwrap();
        tree.insert("/org/mb", "t0", NodeKind::Sensor(Sensor::new("t0"))).unwrap();
        tree.insert("/org/mb", "slots", NodeKind::Container).unwrap();
        tree.insert("/org/mb/slots", "nic", fru("nic", HotplugDetector::External)).unwrap();
        tree.insert("/org/mb/slots", "gpu", fru("gpu", HotplugDetector::None)).unwrap();
        tree.insert("/org", "psu", fru("psu", HotplugDetector::None)).unwrap();
        tree
    }

    #[test]
    fn test_snapshot_uses_paths_relative_to_base() {
        let tree = build();
        let mb = tree.lookup("/org/mb").unwrap();
        let push = snapshot(&tree, tree.root(), mb).unwrap();
        assert_eq!(push.parent_path, "/");
        assert_eq!(push.fru_path, "/mb");
        assert_eq!(push.descriptor, Descriptor::from("mb"));
        assert_eq!(push.sensors, vec![Descriptor::from("t0")]);

        let gpu = tree.lookup("/org/mb/slots/gpu").unwrap();
        assert_eq!(snapshot(&tree, tree.root(), gpu).unwrap().parent_path, "/mb/slots");
    }

    #[test]
    fn test_resync_plan_skips_unavailable_frus() {
        let tree = build();
        let plan: Vec<_> = resync_plan(&tree, tree.root())
            .into_iter()
            .map(|p| p.fru_path)
            .collect();
        // nic starts unavailable (external hot-plug)
        assert_eq!(plan, vec!["/mb", "/mb/slots/gpu", "/psu"]);
    }

    #[test]
    fn test_resync_plan_gates_on_ancestors() {
        let mut tree = build();
        let mb = tree.lookup("/org/mb").unwrap();
        tree.fru_mut(mb).unwrap().set_available(false);
        let plan: Vec<_> = resync_plan(&tree, tree.root())
            .into_iter()
            .map(|p| p.fru_path)
            .collect();
        assert_eq!(plan, vec!["/psu"]);

        let gpu = tree.lookup("/org/mb/slots/gpu").unwrap();
        assert!(snapshot(&tree, tree.root(), gpu).is_none());
    }

    #[test]
    fn test_removal_superseded_only_when_chain_available() {
        let mut tree = build();
        let nic = tree.lookup("/org/mb/slots/nic").unwrap();
        assert!(!removal_superseded(&tree, nic));

        tree.fru_mut(nic).unwrap().set_available(true);
        assert!(removal_superseded(&tree, nic));

        let mb = tree.lookup("/org/mb").unwrap();
        tree.fru_mut(mb).unwrap().set_available(false);
        assert!(!removal_superseded(&tree, nic));
    }
}
