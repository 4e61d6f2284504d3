//! Wire shapes for the IPC socket.
//!
//! Request:  `{"type":"setFruAvailable","payload":{"path":"/mb/nic","available":true}}`
//! Response: `{"success":true,"error":null,"data":{...}}`

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub error: Option<String>,
    pub data: Value,
}

impl Response {
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: Value::Object(Default::default()),
        }
    }
}

impl From<(bool, Option<String>, Value)> for Response {
    fn from((success, error, data): (bool, Option<String>, Value)) -> Self {
        Self { success, error, data }
    }
}
