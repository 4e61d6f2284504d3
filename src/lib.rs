//! FRU/sensor inventory for a BMC: an object tree of FRUs and sensors, hot-plug
//! detection, and propagation of availability changes to the sensor and FRU
//! aggregation peers.

pub mod app;
pub mod config;
pub mod engine;
pub mod hotplug;
pub mod inventory;
pub mod ipc;
pub mod peer;
pub mod sensor;
pub mod tree;

pub use engine::InventoryEngine;
pub use peer::PeerKind;
pub use tree::{Tree, TreeError};
