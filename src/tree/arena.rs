//! Path-addressed tree of nodes stored in a slab.
//!
//! Parent links are plain `NodeId`s into the slab, never ownership. Paths are
//! not stored anywhere: they are rebuilt from the parent chain on demand, so a
//! node's path cannot drift from its position in the tree.

use tracing::{debug, warn};

use super::error::TreeError;
use super::node::{Fru, Node, NodeId, NodeKind, Sensor};

#[derive(Debug)]
pub struct Tree {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    root: NodeId,
}

fn validate_name(name: &str) -> Result<(), TreeError> {
    if name.is_empty() || name.contains('/') {
        return Err(TreeError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

impl Tree {
    /// Create a tree whose root is a generic container named `root_name`
    /// (its path is `/<root_name>`).
    pub fn new(root_name: &str) -> Result<Self, TreeError> {
        validate_name(root_name)?;
        let root = Node::new(root_name.to_string(), None, NodeKind::Container);
        Ok(Self {
            slots: vec![Some(root)],
            free: Vec::new(),
            root: NodeId(0),
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(|s| s.as_ref())
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.0).and_then(|s| s.as_mut())
    }

    pub fn fru(&self, id: NodeId) -> Option<&Fru> {
        self.node(id).and_then(Node::as_fru)
    }

    pub(crate) fn fru_mut(&mut self, id: NodeId) -> Option<&mut Fru> {
        self.node_mut(id).and_then(Node::as_fru_mut)
    }

    pub fn sensor(&self, id: NodeId) -> Option<&Sensor> {
        self.node(id).and_then(Node::as_sensor)
    }

    pub(crate) fn sensor_mut(&mut self, id: NodeId) -> Option<&mut Sensor> {
        self.node_mut(id).and_then(Node::as_sensor_mut)
    }

    /// Absolute path of `id`, e.g. `/org/openbmc/mb`.
    pub fn path(&self, id: NodeId) -> Option<String> {
        let mut names = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current)?;
            names.push(node.name.as_str());
            cursor = node.parent;
        }
        names.reverse();
        Some(format!("/{}", names.join("/")))
    }

    /// Path of `id` as seen from `base`: `/` for `base` itself, `/a/b` for a
    /// grandchild. `None` if `id` is not in the subtree of `base`.
    pub fn relative_path(&self, base: NodeId, id: NodeId) -> Option<String> {
        let mut names = Vec::new();
        let mut cursor = id;
        while cursor != base {
            let node = self.node(cursor)?;
            names.push(node.name.as_str());
            cursor = node.parent?;
        }
        names.reverse();
        Some(format!("/{}", names.join("/")))
    }

    /// Resolve an absolute path. The first segment must name the root.
    pub fn lookup(&self, path: &str) -> Option<NodeId> {
        let mut parts = segments(path);
        let root = self.node(self.root)?;
        if parts.next()? != root.name {
            return None;
        }
        self.walk(self.root, parts)
    }

    /// Resolve `path` relative to `base`; `/` and the empty string name `base`.
    pub fn lookup_from(&self, base: NodeId, path: &str) -> Option<NodeId> {
        self.node(base)?;
        self.walk(base, segments(path))
    }

    fn walk<'a>(&self, start: NodeId, parts: impl Iterator<Item = &'a str>) -> Option<NodeId> {
        let mut cursor = start;
        for part in parts {
            cursor = self.node(cursor)?.child(part)?;
        }
        Some(cursor)
    }

    /// Insert `kind` as a child named `name` of the node at `parent_path`.
    pub fn insert(&mut self, parent_path: &str, name: &str, kind: NodeKind) -> Result<NodeId, TreeError> {
        let parent = self
            .lookup(parent_path)
            .ok_or_else(|| TreeError::ParentNotFound(parent_path.to_string()))?;
        self.insert_under(parent, name, kind)
    }

    pub fn insert_under(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> Result<NodeId, TreeError> {
        validate_name(name)?;
        let parent_path = self
            .path(parent)
            .ok_or_else(|| TreeError::ParentNotFound(format!("{:?}", parent)))?;

        let parent_node = self
            .node(parent)
            .ok_or_else(|| TreeError::ParentNotFound(parent_path.clone()))?;
        if parent_node.is_sensor() {
            return Err(TreeError::ParentIsSensor(parent_path));
        }
        if parent_node.children.contains_key(name) {
            return Err(TreeError::DuplicateName {
                parent: parent_path,
                name: name.to_string(),
            });
        }
        if matches!(kind, NodeKind::Sensor(_)) && self.owning_fru(parent).is_none() {
            return Err(TreeError::SensorOutsideFru(parent_path));
        }

        let label = kind.label();
        let node = Node::new(name.to_string(), Some(parent), kind);
        let id = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                NodeId(index)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        };

        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.insert(name.to_string(), id);
        }
        debug!("Added {} {}/{}", label, parent_path, name);
        Ok(id)
    }

    /// Remove the node at `path` and everything below it, children before parents.
    /// Returns how many nodes were removed.
    pub fn delete_subtree(&mut self, path: &str) -> Result<usize, TreeError> {
        let Some(id) = self.lookup(path) else {
            warn!("Cannot delete {}: path not found", path);
            return Err(TreeError::NotFound(path.to_string()));
        };
        self.delete_subtree_at(id)
    }

    pub fn delete_subtree_at(&mut self, id: NodeId) -> Result<usize, TreeError> {
        if id == self.root {
            return Err(TreeError::CannotDeleteRoot);
        }
        let node = self
            .node(id)
            .ok_or_else(|| TreeError::NotFound(format!("{:?}", id)))?;
        let name = node.name.clone();
        let parent = node.parent;

        // Post-order: every node is released after all of its descendants.
        let mut pending = vec![(id, false)];
        let mut removed = 0;
        while let Some((current, expanded)) = pending.pop() {
            if expanded {
                self.slots[current.0] = None;
                self.free.push(current.0);
                removed += 1;
                continue;
            }
            pending.push((current, true));
            if let Some(node) = self.node(current) {
                pending.extend(node.children().map(|child| (child, false)));
            }
        }

        if let Some(parent_node) = parent.and_then(|p| self.node_mut(p)) {
            parent_node.children.remove(&name);
        }
        debug!("Deleted subtree {} ({} nodes)", name, removed);
        Ok(removed)
    }

    /// Children of the node at `path`, ordered by name.
    pub fn children_of(&self, path: &str) -> Option<Vec<NodeId>> {
        let id = self.lookup(path)?;
        Some(self.children(id))
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|node| node.children().collect())
            .unwrap_or_default()
    }

    /// Nearest FRU at or above `id`.
    pub fn owning_fru(&self, id: NodeId) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current)?;
            if node.is_fru() {
                return Some(current);
            }
            cursor = node.parent;
        }
        None
    }

    /// True when every FRU strictly above `id` is available.
    pub fn ancestors_available(&self, id: NodeId) -> bool {
        let mut cursor = self.node(id).and_then(Node::parent);
        while let Some(current) = cursor {
            let Some(node) = self.node(current) else {
                return false;
            };
            if let Some(fru) = node.as_fru() {
                if !fru.is_available() {
                    return false;
                }
            }
            cursor = node.parent;
        }
        true
    }

    /// FRUs directly owned by `id`: its FRU children, plus FRUs reached through
    /// generic containers. Does not descend into FRUs or sensors.
    pub fn child_frus(&self, id: NodeId) -> Vec<NodeId> {
        let mut frus = Vec::new();
        let mut pending: Vec<NodeId> = self.children(id).into_iter().rev().collect();
        while let Some(current) = pending.pop() {
            let Some(node) = self.node(current) else {
                continue;
            };
            match node.kind() {
                NodeKind::Fru(_) => frus.push(current),
                NodeKind::Container => pending.extend(self.children(current).into_iter().rev()),
                NodeKind::Sensor(_) => {}
            }
        }
        frus
    }

    /// Sensors that are direct children of `id`, ordered by name.
    pub fn direct_sensors(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .into_iter()
            .filter(|child| self.node(*child).map(Node::is_sensor).unwrap_or(false))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotplug::HotplugDetector;

    fn fru(desc: &str) -> NodeKind {
        NodeKind::Fru(Fru::new(desc, HotplugDetector::None))
    }

    fn sensor(desc: &str) -> NodeKind {
        NodeKind::Sensor(Sensor::new(desc))
    }

    fn sample_tree() -> Tree {
        let mut tree = Tree::new("org").unwrap();
        tree.insert("/org", "openbmc", NodeKind::Container).unwrap();
        tree.insert("/org/openbmc", "mb", fru("mb")).unwrap();
        tree.insert("/org/openbmc/mb", "temp", sensor("temp")).unwrap();
        tree.insert("/org/openbmc/mb", "nic", fru("nic")).unwrap();
        tree
    }

    #[test]
    fn test_paths_are_rebuilt_from_parents() {
        let tree = sample_tree();
        let nic = tree.lookup("/org/openbmc/mb/nic").unwrap();
        assert_eq!(tree.path(nic).unwrap(), "/org/openbmc/mb/nic");

        let base = tree.lookup("/org/openbmc").unwrap();
        assert_eq!(tree.relative_path(base, nic).unwrap(), "/mb/nic");
        assert_eq!(tree.relative_path(base, base).unwrap(), "/");
        assert_eq!(tree.relative_path(nic, base), None);
        assert_eq!(tree.lookup_from(base, "/mb/nic"), Some(nic));
        assert_eq!(tree.lookup_from(base, "/"), Some(base));
    }

    #[test]
    fn test_insert_rejects_missing_parent_and_duplicates() {
        let mut tree = sample_tree();
        assert_eq!(
            tree.insert("/orgg", "x", NodeKind::Container),
            Err(TreeError::ParentNotFound("/orgg".to_string()))
        );
        assert!(matches!(
            tree.insert("/org/openbmc", "mb", fru("again")),
            Err(TreeError::DuplicateName { .. })
        ));
        assert!(matches!(
            tree.insert("/org/openbmc", "a/b", NodeKind::Container),
            Err(TreeError::InvalidName(_))
        ));
    }

    #[test]
    fn test_sensor_needs_fru_owner() {
        let mut tree = sample_tree();
        assert_eq!(
            tree.insert("/org/openbmc", "loose", sensor("loose")),
            Err(TreeError::SensorOutsideFru("/org/openbmc".to_string()))
        );
        assert_eq!(
            tree.insert("/org/openbmc/mb/temp", "child", NodeKind::Container),
            Err(TreeError::ParentIsSensor("/org/openbmc/mb/temp".to_string()))
        );

        // Transitive ownership through a container is fine.
        tree.insert("/org/openbmc/mb", "vr", NodeKind::Container).unwrap();
        assert!(tree.insert("/org/openbmc/mb/vr", "vin", sensor("vin")).is_ok());
    }

    #[test]
    fn test_delete_subtree_removes_descendants() {
        let mut tree = sample_tree();
        let before = tree.node_count();
        assert_eq!(tree.delete_subtree("/org/openbmc/mb").unwrap(), 3);
        assert_eq!(tree.node_count(), before - 3);
        assert!(tree.lookup("/org/openbmc/mb/temp").is_none());
        assert!(tree.children_of("/org/openbmc").unwrap().is_empty());

        assert_eq!(
            tree.delete_subtree("/org/openbmc/mb"),
            Err(TreeError::NotFound("/org/openbmc/mb".to_string()))
        );
        assert_eq!(tree.delete_subtree("/org"), Err(TreeError::CannotDeleteRoot));

        // Freed slots are reused.
        let id = tree.insert("/org/openbmc", "mb", fru("mb")).unwrap();
        assert_eq!(tree.path(id).unwrap(), "/org/openbmc/mb");
    }

    #[test]
    fn test_children_are_ordered_by_name() {
        let mut tree = Tree::new("sys").unwrap();
        for name in ["c", "a", "b"] {
            tree.insert("/sys", name, NodeKind::Container).unwrap();
        }
        let names: Vec<_> = tree
            .children_of("/sys")
            .unwrap()
            .into_iter()
            .map(|id| tree.node(id).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_ancestor_gating_and_child_frus() {
        let mut tree = sample_tree();
        let mb = tree.lookup("/org/openbmc/mb").unwrap();
        let nic = tree.lookup("/org/openbmc/mb/nic").unwrap();
        assert!(tree.ancestors_available(nic));
        tree.fru_mut(mb).unwrap().set_available(false);
        assert!(!tree.ancestors_available(nic));
        assert!(tree.ancestors_available(mb));

        tree.insert("/org/openbmc/mb", "slots", NodeKind::Container).unwrap();
        let riser = tree.insert("/org/openbmc/mb/slots", "riser", fru("riser")).unwrap();
        assert_eq!(tree.child_frus(mb), vec![nic, riser]);
        assert_eq!(tree.direct_sensors(mb).len(), 1);
    }
}
