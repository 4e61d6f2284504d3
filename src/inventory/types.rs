//! Serde structs for the inventory JSON document.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryDocument {
    #[serde(default)]
    pub objects: Vec<InventoryObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryObject {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ObjectType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub hotplug: HotplugSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access: Vec<String>,
    /// Sensor value file, e.g. `/sys/class/hwmon/hwmon0/temp1_input`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Multiplier applied to the raw `source` value. Defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    /// Forwarded to peers verbatim. Defaults to `{"name":..,"id":..}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<InventoryObject>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Container,
    Fru,
    Sensor,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HotplugSpec {
    #[default]
    None,
    External,
    Internal {
        path: String,
        #[serde(default = "default_present_value")]
        present_value: String,
    },
}

pub fn default_present_value() -> String { "1".to_string() }
