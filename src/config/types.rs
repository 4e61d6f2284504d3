//! Daemon configuration structs and defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sensor::AccessCondition;

/// Upper bound for every interval and timeout setting (one day).
pub const MAX_DURATION_SECS: f64 = 86_400.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub platform: PlatformSettings,
    pub peers: PeerSettings,
    pub hotplug: HotplugSettings,
    pub sensors: SensorSettings,
    pub ipc: IpcSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSettings {
    /// Absolute tree path of the node peers see as `/`.
    pub root_path: String,
    pub inventory_file: String,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            root_path: "/org/openbmc".to_string(),
            inventory_file: "/etc/bmc-inventory/inventory.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerEndpoint {
    pub url: String,
    #[serde(default = "default_connect_on_start")]
    pub connect_on_start: bool,
}

pub fn default_connect_on_start() -> bool { true }

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerSettings {
    pub sensor: PeerEndpoint,
    pub fru: PeerEndpoint,
    pub call_timeout_secs: f64,
}

impl PeerSettings {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.call_timeout_secs)
    }
}

impl Default for PeerSettings {
    fn default() -> Self {
        Self {
            sensor: PeerEndpoint {
                url: "ws://127.0.0.1:7701/sensors".to_string(),
                connect_on_start: true,
            },
            fru: PeerEndpoint {
                url: "ws://127.0.0.1:7702/frus".to_string(),
                connect_on_start: true,
            },
            call_timeout_secs: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotplugSettings {
    pub poll_interval_secs: f64,
}

impl HotplugSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval_secs)
    }
}

impl Default for HotplugSettings {
    fn default() -> Self {
        Self { poll_interval_secs: 5.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    pub refresh_interval_secs: f64,
    /// Access conditions assumed to hold while refreshing, e.g. `["power_on"]`.
    pub conditions: Vec<String>,
}

impl SensorSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs_f64(self.refresh_interval_secs)
    }

    /// Combined condition set, or the first unknown name.
    pub fn access_conditions(&self) -> Result<AccessCondition, String> {
        self.conditions.iter().try_fold(AccessCondition::ALWAYS, |acc, name| {
            AccessCondition::from_config_name(name)
                .map(|cond| acc | cond)
                .ok_or_else(|| name.clone())
        })
    }
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 10.0,
            conditions: vec!["power_on".to_string(), "post_complete".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpcSettings {
    pub socket_path: String,
}

impl Default for IpcSettings {
    fn default() -> Self {
        Self {
            socket_path: "/run/bmc-inventory.sock".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub log_level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
        }
    }
}
