//! Inventory loader: reads an inventory document and inserts its objects into
//! the tree, parents before children.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde_json::json;
use tracing::{debug, info, warn};

use super::types::{HotplugSpec, InventoryDocument, InventoryObject, ObjectType};
use crate::hotplug::{HotplugDetector, SysfsPresence};
use crate::sensor::AccessCondition;
use crate::tree::{Descriptor, Fru, NodeId, NodeKind, Sensor, Tree};

fn descriptor(object: &InventoryObject) -> Result<Descriptor> {
    let value = match &object.descriptor {
        Some(value) => value.clone(),
        None => json!({ "name": object.name, "id": object.id }),
    };
    Ok(Descriptor::new(serde_json::to_vec(&value)?))
}

fn detector(spec: &HotplugSpec) -> HotplugDetector {
    match spec {
        HotplugSpec::None => HotplugDetector::None,
        HotplugSpec::External => HotplugDetector::External,
        HotplugSpec::Internal { path, present_value } => {
            HotplugDetector::internal(SysfsPresence::new(path, present_value.as_str()))
        }
    }
}

fn access_conditions(names: &[String]) -> Result<AccessCondition> {
    names.iter().try_fold(AccessCondition::ALWAYS, |acc, name| {
        AccessCondition::from_config_name(name)
            .map(|cond| acc | cond)
            .ok_or_else(|| anyhow!("Unknown access condition {:?}", name))
    })
}

fn node_kind(object: &InventoryObject) -> Result<NodeKind> {
    if object.kind != ObjectType::Fru && object.hotplug != HotplugSpec::None {
        warn!("Ignoring hotplug settings on non-FRU object {:?}", object.name);
    }

    Ok(match object.kind {
        ObjectType::Container => NodeKind::Container,
        ObjectType::Fru => {
            let mut fru = Fru::new(descriptor(object)?, detector(&object.hotplug));
            if let Some(id) = object.id {
                fru = fru.with_id(id);
            }
            NodeKind::Fru(fru)
        }
        ObjectType::Sensor => {
            let mut sensor = Sensor::new(descriptor(object)?)
                .with_access(access_conditions(&object.access)?);
            if let Some(id) = object.id {
                sensor = sensor.with_id(id);
            }
            if let Some(unit) = &object.unit {
                sensor = sensor.with_unit(unit.as_str());
            }
            if let Some(source) = &object.source {
                sensor = sensor.with_source(source.as_str(), object.scale.unwrap_or(1.0));
            }
            NodeKind::Sensor(sensor)
        }
    })
}

/// Create a tree whose containers spell out `root_path`, e.g. `/org/openbmc`.
pub fn platform_tree(root_path: &str) -> Result<Tree> {
    let mut segments = root_path.split('/').filter(|s| !s.is_empty());
    let first = segments
        .next()
        .ok_or_else(|| anyhow!("Platform root path {:?} is empty", root_path))?;
    let mut tree = Tree::new(first)?;
    let mut parent = tree.root();
    for segment in segments {
        parent = tree.insert_under(parent, segment, NodeKind::Container)?;
    }
    Ok(tree)
}

/// Insert every object of `document` under `parent_path`. Stops at the first
/// failure; objects inserted before it stay in the tree. Returns the number of
/// nodes inserted.
pub fn apply_inventory(document: &InventoryDocument, tree: &mut Tree, parent_path: &str) -> Result<usize> {
    let parent = tree
        .lookup(parent_path)
        .ok_or_else(|| anyhow!("Inventory parent {} does not exist", parent_path))?;

    let mut pending: Vec<(NodeId, &InventoryObject)> =
        document.objects.iter().rev().map(|object| (parent, object)).collect();
    let mut inserted = 0;

    while let Some((parent, object)) = pending.pop() {
        let parent_path = tree.path(parent).unwrap_or_default();
        let kind = node_kind(object)
            .with_context(|| format!("Invalid object {}/{}", parent_path, object.name))?;
        let id = tree
            .insert_under(parent, &object.name, kind)
            .with_context(|| format!("Failed to insert {}/{}", parent_path, object.name))?;
        inserted += 1;
        pending.extend(object.children.iter().rev().map(|child| (id, child)));
    }

    debug!("Inserted {} inventory objects under {}", inserted, parent_path);
    Ok(inserted)
}

/// Load an inventory file and insert its objects under `parent_path`.
pub fn load_inventory(path: &Path, tree: &mut Tree, parent_path: &str) -> Result<usize> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read inventory: {:?}", path))?;
    let document: InventoryDocument = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse inventory JSON: {:?}", path))?;

    let inserted = apply_inventory(&document, tree, parent_path)
        .with_context(|| format!("Failed to load inventory {:?}", path))?;
    info!("Loaded inventory from {:?}: {} objects", path, inserted);
    Ok(inserted)
}
