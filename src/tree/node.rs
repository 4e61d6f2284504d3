//! Node kinds stored in the tree: generic containers, FRUs and sensors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::hotplug::HotplugDetector;
use crate::sensor::{AccessCondition, SensorReading};

/// Index of a node inside the tree's slab. Only meaningful for the tree that
/// handed it out; stale ids resolve to `None` after the node is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Opaque serialized representation of a FRU or sensor, forwarded verbatim to peers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Descriptor(Vec<u8>);

impl Descriptor {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Descriptor {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for Descriptor {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

/// A field-replaceable unit.
#[derive(Debug, Clone)]
pub struct Fru {
    id: Option<u8>,
    available: bool,
    descriptor: Descriptor,
    hotplug: HotplugDetector,
}

impl Fru {
    /// Hot-plug capable FRUs start out absent; everything else is present.
    pub fn new(descriptor: impl Into<Descriptor>, hotplug: HotplugDetector) -> Self {
        Self {
            id: None,
            available: !hotplug.is_hotplug(),
            descriptor: descriptor.into(),
            hotplug,
        }
    }

    pub fn with_id(mut self, id: u8) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<u8> {
        self.id
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Only the engine flips availability.
    pub(crate) fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn hotplug(&self) -> &HotplugDetector {
        &self.hotplug
    }
}

/// A sensor owned (directly or transitively) by a FRU.
#[derive(Debug, Clone)]
pub struct Sensor {
    id: Option<u8>,
    unit: String,
    descriptor: Descriptor,
    access: AccessCondition,
    source: Option<PathBuf>,
    scale: f32,
    last_reading: Option<SensorReading>,
}

impl Sensor {
    pub fn new(descriptor: impl Into<Descriptor>) -> Self {
        Self {
            id: None,
            unit: String::new(),
            descriptor: descriptor.into(),
            access: AccessCondition::ALWAYS,
            source: None,
            scale: 1.0,
            last_reading: None,
        }
    }

    pub fn with_id(mut self, id: u8) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_access(mut self, access: AccessCondition) -> Self {
        self.access = access;
        self
    }

    /// Read the value from a hwmon-style file, multiplied by `scale`
    /// (`0.001` turns millidegrees into degrees).
    pub fn with_source(mut self, path: impl Into<PathBuf>, scale: f32) -> Self {
        self.source = Some(path.into());
        self.scale = scale;
        self
    }

    pub fn id(&self) -> Option<u8> {
        self.id
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn access(&self) -> AccessCondition {
        self.access
    }

    pub fn last_reading(&self) -> Option<&SensorReading> {
        self.last_reading.as_ref()
    }

    pub(crate) fn record_reading(&mut self, reading: SensorReading) {
        self.last_reading = Some(reading);
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Container,
    Fru(Fru),
    Sensor(Sensor),
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Container => "container",
            NodeKind::Fru(_) => "fru",
            NodeKind::Sensor(_) => "sensor",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: BTreeMap<String, NodeId>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(name: String, parent: Option<NodeId>, kind: NodeKind) -> Self {
        Self {
            name,
            parent,
            children: BTreeMap::new(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Children ordered by name.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.values().copied()
    }

    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.children.get(name).copied()
    }

    pub fn as_fru(&self) -> Option<&Fru> {
        match &self.kind {
            NodeKind::Fru(fru) => Some(fru),
            _ => None,
        }
    }

    pub(crate) fn as_fru_mut(&mut self) -> Option<&mut Fru> {
        match &mut self.kind {
            NodeKind::Fru(fru) => Some(fru),
            _ => None,
        }
    }

    pub fn as_sensor(&self) -> Option<&Sensor> {
        match &self.kind {
            NodeKind::Sensor(sensor) => Some(sensor),
            _ => None,
        }
    }

    pub(crate) fn as_sensor_mut(&mut self) -> Option<&mut Sensor> {
        match &mut self.kind {
            NodeKind::Sensor(sensor) => Some(sensor),
            _ => None,
        }
    }

    pub fn is_fru(&self) -> bool {
        matches!(self.kind, NodeKind::Fru(_))
    }

    pub fn is_sensor(&self) -> bool {
        matches!(self.kind, NodeKind::Sensor(_))
    }
}
