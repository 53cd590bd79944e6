//! Network map widget over the NDJSON bridge

use serde_json::json;

use gridwidget::WidgetMode;

use super::host_harness::BridgeHarness;
use crate::map_state;

#[tokio::test]
async fn test_centering_handshake_on_start() {
    let harness = BridgeHarness::start(WidgetMode::Map, map_state());
    let state = harness.wait_for(|e| e["event"] == "map_state").await;

    assert_eq!(state["center_on"], "S1");
    assert_eq!(state["options"]["labels_zoom_threshold"], 9);
    assert_eq!(state["options"]["filtered_nominal_voltages"], json!([400.0, 63.0]));

    let buffer = harness.quit().await;
    let sync = buffer
        .events()
        .into_iter()
        .find(|e| e["event"] == "state_sync")
        .expect("params written back");
    assert_eq!(sync["writes"][0]["field"], "params");
    assert_eq!(sync["writes"][0]["value"], json!({"subId": "S1", "centered": true}));
}

#[tokio::test]
async fn test_voltage_level_choice_and_selection() {
    let harness = BridgeHarness::start(WidgetMode::Map, map_state());
    harness.wait_for(|e| e["event"] == "map_state").await;

    harness.send(json!({
        "type": "map",
        "kind": "substation_clicked",
        "substation_id": "S1",
        "position": {"x": 200.0, "y": 150.0}
    }));
    let opened = harness
        .wait_for(|e| e["event"] == "map_state" && !e["choice"].is_null())
        .await;
    let entries = opened["choice"]["entries"].as_array().unwrap();
    assert_eq!(entries[0]["voltage_level_id"], "S1_400");
    assert_eq!(entries[0]["color"], json!([255, 0, 0]));
    assert_eq!(entries[1]["color"], json!([160, 32, 240]));

    harness.send(json!({
        "type": "map",
        "kind": "voltage_level_chosen",
        "voltage_level_id": "S1_63"
    }));
    harness.wait_for(|e| e["event"] == "host_message").await;

    let buffer = harness.quit().await;
    let events = buffer.events();
    let selected = events
        .iter()
        .find(|e| e["event"] == "state_sync" && e["writes"][0]["field"] == "selected_vl")
        .expect("selected_vl written");
    assert_eq!(selected["writes"][0]["value"], "S1_63");
    let last_state = events
        .iter()
        .rev()
        .find(|e| e["event"] == "map_state")
        .unwrap();
    assert!(last_state["choice"].is_null());
}

#[tokio::test]
async fn test_malformed_equipment_update_is_reported() {
    let harness = BridgeHarness::start(WidgetMode::Map, map_state());
    harness.wait_for(|e| e["event"] == "map_state").await;

    harness.send(json!({"type": "update", "field": "lmap", "value": "[{"}));
    let error = harness.wait_for(|e| e["event"] == "error").await;
    assert_eq!(error["fatal"], false);
    assert!(error["message"].as_str().unwrap().contains("lmap"));

    harness.quit().await;
}
