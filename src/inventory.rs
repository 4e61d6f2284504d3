//! Inventory description files: the JSON shape of a platform and the loader
//! that turns it into tree inserts.

pub mod loader;
pub mod types;

pub use loader::{apply_inventory, load_inventory, platform_tree};
pub use types::{HotplugSpec, InventoryDocument, InventoryObject, ObjectType};
