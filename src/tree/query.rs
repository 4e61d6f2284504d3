//! Read-only lookups over a subtree: FRU listing, FRU/sensor path resolution
//! by name or id, and sensor value dumps.
//!
//! FRU searches descend through FRUs and the containers between them. Sensor
//! searches look at the direct sensors of a node first, then recurse into its
//! child FRUs.

use serde::Serialize;

use super::arena::Tree;
use super::node::{Node, NodeId};
use crate::sensor::ReadOutcome;

/// Flattened view of one sensor for status dumps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorObject {
    pub name: String,
    pub id: Option<u8>,
    pub status: Option<ReadOutcome>,
    pub value: Option<f32>,
    pub unit: String,
}

impl Tree {
    /// Names of every FRU under `start`, each FRU listed before its descendants.
    pub fn fru_list(&self, start: NodeId) -> Vec<String> {
        let mut names = Vec::new();
        let mut pending: Vec<NodeId> = self.child_frus(start).into_iter().rev().collect();
        while let Some(current) = pending.pop() {
            if let Some(node) = self.node(current) {
                names.push(node.name().to_string());
            }
            pending.extend(self.child_frus(current).into_iter().rev());
        }
        names
    }

    fn find_fru(&self, start: NodeId, matches: &dyn Fn(&Node) -> bool) -> Option<NodeId> {
        for child in self.child_frus(start) {
            let node = self.node(child)?;
            if matches(node) {
                return Some(child);
            }
            if let Some(found) = self.find_fru(child, matches) {
                return Some(found);
            }
        }
        None
    }

    pub fn fru_path_by_name(&self, start: NodeId, name: &str) -> Option<String> {
        let found = self.find_fru(start, &|node: &Node| node.name() == name)?;
        self.path(found)
    }

    pub fn fru_path_by_id(&self, start: NodeId, id: u8) -> Option<String> {
        let found = self.find_fru(start, &|node: &Node| {
            node.as_fru().and_then(|fru| fru.id()) == Some(id)
        })?;
        self.path(found)
    }

    fn find_sensor(&self, start: NodeId, matches: &dyn Fn(&Node) -> bool) -> Option<NodeId> {
        for child in self.children(start) {
            let node = self.node(child)?;
            if node.is_sensor() && matches(node) {
                return Some(child);
            }
        }
        for child in self.child_frus(start) {
            if let Some(found) = self.find_sensor(child, matches) {
                return Some(found);
            }
        }
        None
    }

    pub fn sensor_path_by_name(&self, start: NodeId, name: &str) -> Option<String> {
        let found = self.find_sensor(start, &|node: &Node| node.name() == name)?;
        self.path(found)
    }

    pub fn sensor_path_by_id(&self, start: NodeId, id: u8) -> Option<String> {
        let found = self.find_sensor(start, &|node: &Node| {
            node.as_sensor().and_then(|sensor| sensor.id()) == Some(id)
        })?;
        self.path(found)
    }

    /// Every sensor under `start` with its last reading.
    pub fn sensor_objects(&self, start: NodeId) -> Vec<SensorObject> {
        let mut objects = Vec::new();
        self.collect_sensor_objects(start, &mut objects);
        objects
    }

    fn collect_sensor_objects(&self, id: NodeId, out: &mut Vec<SensorObject>) {
        for child in self.direct_sensors(id) {
            let Some(node) = self.node(child) else { continue };
            let Some(sensor) = node.as_sensor() else { continue };
            let reading = sensor.last_reading();
            out.push(SensorObject {
                name: node.name().to_string(),
                id: sensor.id(),
                status: reading.map(|r| r.outcome),
                value: reading.and_then(|r| r.value),
                unit: sensor.unit().to_string(),
            });
        }
        for child in self.child_frus(id) {
            self.collect_sensor_objects(child, out);
        }
    }
}
