//! Diagram widgets over the NDJSON bridge

use serde_json::json;

use gridwidget::WidgetMode;
use gridwidget_app::renderer::DiagramKind;

use super::host_harness::BridgeHarness;
use crate::{nad_payload, nad_state};

fn nad() -> WidgetMode {
    WidgetMode::Diagram(DiagramKind::NetworkArea)
}

#[tokio::test]
async fn test_initial_mount_is_reported() {
    let harness = BridgeHarness::start(nad(), nad_state(false, &[]));
    let mounted = harness
        .wait_for(|e| e["event"] == "session_mounted")
        .await;

    assert_eq!(mounted["session_id"], 1);
    assert_eq!(mounted["kind"], "network-area");
    assert_eq!(
        mounted["viewbox"],
        json!({"x": 0.0, "y": 0.0, "width": 800.0, "height": 600.0})
    );
    assert_eq!(mounted["options"]["enable_drag"], true);
    assert_eq!(
        mounted["callbacks"],
        json!(["move_node", "move_text_node", "select_node"])
    );

    let buffer = harness.quit().await;
    assert_eq!(buffer.event_names()[0], "ready");
}

#[tokio::test]
async fn test_select_node_writes_then_notifies() {
    let harness = BridgeHarness::start(nad(), nad_state(false, &[]));
    harness.wait_for(|e| e["event"] == "session_mounted").await;

    harness.send(json!({
        "type": "callback",
        "session_id": 1,
        "callback": "select_node",
        "equipment_id": "VL1",
        "node_id": "0"
    }));
    harness.wait_for(|e| e["event"] == "host_message").await;

    let names = harness.quit().await.event_names();
    let sync = names.iter().position(|n| n == "state_sync").unwrap();
    let message = names.iter().position(|n| n == "host_message").unwrap();
    assert!(sync < message);
}

#[tokio::test]
async fn test_payload_change_remounts_and_echoes_metadata() {
    let harness = BridgeHarness::start(nad(), nad_state(false, &[]));
    harness.wait_for(|e| e["event"] == "session_mounted").await;

    harness.send(json!({
        "type": "update",
        "field": "diagram_data",
        "value": nad_payload("<svg viewBox=\"0 0 10 10\"/>")
    }));
    harness.wait_for(|e| e["event"] == "session_unmounted").await;

    let buffer = harness.quit().await;
    let events = buffer.events();
    let mounts: Vec<_> = events
        .iter()
        .filter(|e| e["event"] == "session_mounted")
        .collect();
    assert_eq!(mounts.len(), 2);
    assert_eq!(mounts[1]["session_id"], 2);

    // attach new before detaching old
    let names = buffer.event_names();
    let second_mount = names
        .iter()
        .enumerate()
        .filter(|(_, n)| *n == "session_mounted")
        .map(|(i, _)| i)
        .nth(1)
        .unwrap();
    let unmount = names.iter().position(|n| n == "session_unmounted").unwrap();
    assert!(second_mount < unmount);

    let echo = events
        .iter()
        .find(|e| e["event"] == "state_sync")
        .expect("metadata echo");
    let writes = echo["writes"].as_array().unwrap();
    assert_eq!(writes[0]["field"], "current_nad_metadata");
    assert_eq!(writes[0]["value"], "");
    assert_eq!(writes[1]["field"], "current_nad_metadata");
}

#[tokio::test]
async fn test_context_menu_keyboard_selection() {
    let harness = BridgeHarness::start(nad(), nad_state(false, &["Open SLD", "Expand"]));
    harness.wait_for(|e| e["event"] == "session_mounted").await;

    harness.send(json!({
        "type": "callback",
        "session_id": 1,
        "callback": "right_click",
        "svg_id": "0",
        "equipment_id": "VL1",
        "equipment_type": "VOLTAGE_LEVEL",
        "position": {"x": 120.0, "y": 80.0}
    }));
    harness
        .wait_for(|e| e["event"] == "menu" && !e["view"].is_null())
        .await;

    harness.send(json!({"type": "key", "key": "ArrowDown"}));
    harness.send(json!({"type": "key", "key": "Enter"}));
    let selected = harness
        .wait_for(|e| e["event"] == "state_sync" && e["writes"][0]["field"] == "selected_menu")
        .await;

    assert_eq!(
        selected["writes"][0]["value"],
        json!({"equipment_id": "VL1", "selection": 0})
    );

    let buffer = harness.quit().await;
    let menus: Vec<_> = buffer
        .events()
        .into_iter()
        .filter(|e| e["event"] == "menu")
        .collect();
    assert!(menus.last().unwrap()["view"].is_null());
}

#[tokio::test]
async fn test_right_click_on_other_element_opens_nothing() {
    let harness = BridgeHarness::start(nad(), nad_state(false, &["Open SLD"]));
    harness.wait_for(|e| e["event"] == "session_mounted").await;

    harness.send(json!({
        "type": "callback",
        "session_id": 1,
        "callback": "right_click",
        "svg_id": "7",
        "equipment_id": "L1",
        "equipment_type": "LINE",
        "position": {"x": 1.0, "y": 1.0}
    }));
    harness.send(json!({"type": "key", "key": "Enter"}));

    let buffer = harness.quit().await;
    assert!(buffer
        .events()
        .iter()
        .filter(|e| e["event"] == "menu")
        .all(|e| e["view"].is_null()));
    assert!(!buffer.event_names().contains(&"host_message".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_hover_info_round_trip_through_invoke() {
    let harness = BridgeHarness::start(nad(), nad_state(true, &[]));
    harness.wait_for(|e| e["event"] == "session_mounted").await;

    harness.send(json!({
        "type": "callback",
        "session_id": 1,
        "callback": "toggle_hover",
        "should_display": true,
        "position": {"x": 40.0, "y": 30.0},
        "equipment_id": "L1",
        "equipment_type": "LINE"
    }));

    let request = harness
        .wait_for(|e| e["event"] == "invoke_request")
        .await;
    assert_eq!(request["method"], "_get_on_hover_info");
    assert_eq!(request["args"], json!({"id": "L1", "type": "LINE"}));

    harness.send(json!({
        "type": "invoke_result",
        "call_id": request["call_id"],
        "result": "<b>Line 1</b>"
    }));

    let info = harness
        .wait_for(|e| e["event"] == "info_box" && e["visible"] == true)
        .await;
    assert_eq!(info["content"], "<b>Line 1</b>");
    assert_eq!(info["position"], json!({"x": 50.0, "y": 40.0}));

    harness.quit().await;
}

#[tokio::test(start_paused = true)]
async fn test_hover_error_is_shown_with_prefix() {
    let harness = BridgeHarness::start(nad(), nad_state(true, &[]));
    harness.wait_for(|e| e["event"] == "session_mounted").await;

    harness.send(json!({
        "type": "callback",
        "session_id": 1,
        "callback": "toggle_hover",
        "should_display": true,
        "position": {"x": 0.0, "y": 0.0},
        "equipment_id": "L9",
        "equipment_type": "LINE"
    }));
    let request = harness
        .wait_for(|e| e["event"] == "invoke_request")
        .await;
    harness.send(json!({
        "type": "invoke_result",
        "call_id": request["call_id"],
        "error": "KeyError: 'L9'"
    }));

    let info = harness
        .wait_for(|e| e["event"] == "info_box" && e["visible"] == true)
        .await;
    let content = info["content"].as_str().unwrap();
    assert!(content.starts_with("Error retrieving hover info"));
    assert!(content.contains("KeyError"));

    harness.quit().await;
}

#[tokio::test]
async fn test_stale_session_callback_is_dropped() {
    let harness = BridgeHarness::start(nad(), nad_state(false, &[]));
    harness.wait_for(|e| e["event"] == "session_mounted").await;

    harness.send(json!({
        "type": "callback",
        "session_id": 42,
        "callback": "select_node",
        "equipment_id": "VL1",
        "node_id": "0"
    }));

    let buffer = harness.quit().await;
    assert!(!buffer.event_names().contains(&"host_message".to_string()));
}
