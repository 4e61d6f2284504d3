//! IPC command dispatch onto the inventory engine.

use serde_json::{json, Value};
use tracing::debug;

use super::messages::Response;
use crate::engine::InventoryEngine;
use crate::peer::PeerKind;

fn id_arg(payload: &Value) -> Option<u8> {
    payload
        .get("id")
        .and_then(|v| v.as_u64())
        .and_then(|id| u8::try_from(id).ok())
}

fn path_result(path: Option<String>, what: &str) -> (bool, Option<String>, Value) {
    match path {
        Some(path) => (true, None, json!({ "path": path })),
        None => (false, Some(format!("{} not found", what)), json!({})),
    }
}

/// Run one request against the engine.
pub async fn handle_request(engine: &InventoryEngine, request: &Value) -> Response {
    let Some(command_type) = request.get("type").and_then(|v| v.as_str()) else {
        return Response::fail("Missing or invalid command type");
    };
    let empty = json!({});
    let payload = request.get("payload").unwrap_or(&empty);

    debug!("Processing command: {} with payload: {}", command_type, payload);

    let outcome: (bool, Option<String>, Value) = match command_type {
        "setPeerAvailable" => {
            let peer = payload
                .get("peer")
                .and_then(|v| v.as_str())
                .and_then(PeerKind::from_name);
            match (peer, payload.get("available").and_then(|v| v.as_bool())) {
                (Some(peer), Some(available)) => {
                    if engine.set_peer_available(peer, available).await {
                        (true, None, json!({ "peer": peer, "available": available }))
                    } else {
                        (false, Some(format!("Failed to connect to {} peer", peer)), json!({}))
                    }
                }
                _ => (false, Some("Missing or invalid peer/available".to_string()), json!({})),
            }
        }
        "setFruAvailable" => {
            match (
                payload.get("path").and_then(|v| v.as_str()),
                payload.get("available").and_then(|v| v.as_bool()),
            ) {
                (Some(path), Some(available)) => {
                    if engine.set_fru_available(path, available).await {
                        (true, None, json!({ "path": path, "available": available }))
                    } else {
                        (
                            false,
                            Some(format!("{} is not an externally detected FRU", path)),
                            json!({}),
                        )
                    }
                }
                _ => (false, Some("Missing or invalid path/available".to_string()), json!({})),
            }
        }
        "getFruList" => (true, None, json!({ "frus": engine.fru_list().await })),
        "getFruPathByName" => match payload.get("name").and_then(|v| v.as_str()) {
            Some(name) => path_result(engine.fru_path_by_name(name).await, "FRU"),
            None => (false, Some("Missing name".to_string()), json!({})),
        },
        "getFruPathById" => match id_arg(payload) {
            Some(id) => path_result(engine.fru_path_by_id(id).await, "FRU"),
            None => (false, Some("Missing or invalid id".to_string()), json!({})),
        },
        "getSensorPathByName" => match payload.get("name").and_then(|v| v.as_str()) {
            Some(name) => path_result(engine.sensor_path_by_name(name).await, "Sensor"),
            None => (false, Some("Missing name".to_string()), json!({})),
        },
        "getSensorPathById" => match id_arg(payload) {
            Some(id) => path_result(engine.sensor_path_by_id(id).await, "Sensor"),
            None => (false, Some("Missing or invalid id".to_string()), json!({})),
        },
        "getSensorObjects" => (true, None, json!({ "sensors": engine.sensor_objects().await })),
        other => (false, Some(format!("Unknown command: {}", other)), json!({})),
    };

    outcome.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::hotplug::HotplugDetector;
    use crate::peer::{DryRunConnector, ServiceLink};
    use crate::tree::{Fru, NodeKind, Sensor, Tree};

    fn engine() -> InventoryEngine {
        let mut tree = Tree::new("org").unwrap();
        tree.insert("/org", "mb", NodeKind::Fru(Fru::new("mb", HotplugDetector::None).with_id(1)))
            .unwrap();
        tree.insert("/org/mb", "nic", NodeKind::Fru(Fru::new("nic", HotplugDetector::External).with_id(2)))
            .unwrap();
        tree.insert("/org/mb", "inlet", NodeKind::Sensor(Sensor::new("inlet").with_id(9)))
            .unwrap();
        let link = |kind| ServiceLink::new(kind, Arc::new(DryRunConnector::new(kind)), Duration::from_secs(1));
        InventoryEngine::new(tree, "/org", link(PeerKind::Sensor), link(PeerKind::Fru)).unwrap()
    }

    #[tokio::test]
    async fn test_queries() {
        let engine = engine();
        let response = handle_request(&engine, &json!({"type": "getFruList"})).await;
        assert!(response.success);
        assert_eq!(response.data["frus"], json!(["mb", "nic"]));

        let response = handle_request(&engine, &json!({"type": "getFruPathById", "payload": {"id": 2}})).await;
        assert_eq!(response.data["path"], "/org/mb/nic");

        let response =
            handle_request(&engine, &json!({"type": "getSensorPathByName", "payload": {"name": "inlet"}})).await;
        assert_eq!(response.data["path"], "/org/mb/inlet");

        let response = handle_request(&engine, &json!({"type": "getFruPathByName", "payload": {"name": "gpu"}})).await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("FRU not found"));
    }

    #[tokio::test]
    async fn test_availability_commands() {
        let engine = engine();
        let response = handle_request(
            &engine,
            &json!({"type": "setPeerAvailable", "payload": {"peer": "sensor", "available": true}}),
        )
        .await;
        assert!(response.success);
        assert!(engine.is_peer_available(PeerKind::Sensor).await);

        let response = handle_request(
            &engine,
            &json!({"type": "setFruAvailable", "payload": {"path": "/mb/nic", "available": true}}),
        )
        .await;
        assert!(response.success);
        assert_eq!(engine.fru_available("/mb/nic").await, Some(true));

        let response = handle_request(
            &engine,
            &json!({"type": "setFruAvailable", "payload": {"path": "/mb/inlet", "available": true}}),
        )
        .await;
        assert!(!response.success);
    }

    #[tokio::test]
    async fn test_malformed_requests() {
        let engine = engine();
        assert!(!handle_request(&engine, &json!({})).await.success);
        assert!(!handle_request(&engine, &json!({"type": "reboot"})).await.success);
        assert!(
            !handle_request(&engine, &json!({"type": "setPeerAvailable", "payload": {"peer": "bogus", "available": true}}))
                .await
                .success
        );
        assert!(!handle_request(&engine, &json!({"type": "getFruPathById", "payload": {"id": 300}})).await.success);
    }
}
