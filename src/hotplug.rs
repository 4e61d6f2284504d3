//! Hot-plug detection: per-FRU detectors, the sysfs-backed presence signal and
//! the polling monitor that feeds transitions into the engine.

pub mod detector;
pub mod monitor;
pub mod sysfs;

pub use detector::{HotplugDetector, PresenceMechanism};
pub use monitor::{HotplugMonitor, MonitorState, DEFAULT_POLL_INTERVAL};
pub use sysfs::SysfsPresence;
