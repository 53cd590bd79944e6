//! Engine flows with the recording doubles from `test-helpers`

use serde_json::{json, Map, Value};

use gridwidget_app::renderer::{DiagramKind, RenderSession, RendererEvent};
use gridwidget_app::test_utils::{FakeRenderer, RecordingTransport, ScriptedFetcher};
use gridwidget_app::{Settings, WidgetEngine};
use gridwidget_core::{ClickedFeeder, ClickedSwitch};

type TestEngine = WidgetEngine<FakeRenderer, RecordingTransport, ScriptedFetcher>;

fn state(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn sld_engine(metadata: Option<&str>) -> TestEngine {
    let mut engine = WidgetEngine::new(
        DiagramKind::SingleLine,
        FakeRenderer::default(),
        RecordingTransport::default(),
        state(json!({
            "value": "<svg/>",
            "value_meta": metadata,
            "branch_states": [{"branchId": "L1", "connected1": false}],
        })),
        ScriptedFetcher::default(),
        Settings::default(),
    );
    engine.start();
    engine
}

/// Fire an event through the mounted session's own callback slot
fn fire(engine: &TestEngine, event: RendererEvent) -> bool {
    engine
        .controller()
        .session()
        .expect("a mounted session")
        .spec()
        .callbacks
        .dispatch(event)
}

#[tokio::test]
async fn test_sld_switch_and_feeder_clicks() {
    let mut engine = sld_engine(Some("{\"nodes\":[]}"));

    assert!(fire(
        &engine,
        RendererEvent::SwitchClicked(ClickedSwitch {
            id: "BRK1".into(),
            switch_status: true,
        })
    ));
    assert!(fire(
        &engine,
        RendererEvent::FeederClicked(ClickedFeeder {
            id: "LOAD1".into(),
            feeder_type: Some("LOAD".into()),
        })
    ));
    engine.drain_pending_messages();

    let transport = engine.store().transport();
    assert_eq!(
        transport.log(),
        vec![
            "sync:clicked_switch",
            "send:click_switch",
            "sync:clicked_feeder",
            "send:click_feeder"
        ]
    );
    assert_eq!(
        transport.writes_to("clicked_feeder"),
        vec![json!({"id": "LOAD1", "feederType": "LOAD"})]
    );
}

#[tokio::test]
async fn test_sld_without_metadata_has_no_callbacks() {
    let engine = sld_engine(None);
    assert!(!fire(
        &engine,
        RendererEvent::NextVoltageLevelClicked { id: "VL2".into() }
    ));
    assert!(engine.store().transport().log().is_empty());
}

#[tokio::test]
async fn test_branch_states_reapplied_after_remount() {
    let mut engine = sld_engine(Some("{}"));
    assert_eq!(
        engine.controller().session().unwrap().branch_states().len(),
        1
    );

    engine
        .sender()
        .send(gridwidget_app::Message::HostFieldUpdate {
            field: "value".into(),
            value: json!("<svg id='b'/>"),
        })
        .unwrap();
    engine.drain_pending_messages();

    let session = engine.controller().session().unwrap();
    assert_eq!(session.id(), 2);
    assert_eq!(session.branch_states()[0].branch_id, "L1");
    // single-line diagrams have no echo field
    assert!(engine.store().transport().batches().is_empty());
}

#[tokio::test]
async fn test_retrieve_metadata_ignored_for_sld() {
    let mut engine = sld_engine(Some("{}"));
    engine
        .sender()
        .send(gridwidget_app::Message::HostCustomMessage(
            json!({"type": "triggerRetrieveMetadata"}),
        ))
        .unwrap();
    engine.drain_pending_messages();
    assert!(engine.store().transport().batches().is_empty());
}
