//! Daemon configuration: types, defaults, load and save.

pub mod persistence;
pub mod types;

pub use persistence::{load_config, save_config};
pub use types::{
    DaemonConfig, HotplugSettings, IpcSettings, LoggingSettings, PeerEndpoint, PeerSettings,
    PlatformSettings, SensorSettings,
};
