//! FRU/sensor object tree: slab-backed node storage, node kinds, structural errors
//! and the read-only lookups exposed over IPC.

pub mod arena;
pub mod error;
pub mod node;
pub mod query;

pub use arena::Tree;
pub use error::TreeError;
pub use node::{Descriptor, Fru, Node, NodeId, NodeKind, Sensor};
pub use query::SensorObject;
