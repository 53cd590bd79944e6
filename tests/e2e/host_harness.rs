//! In-process host driving the bridge over channels
//!
//! Frames go in through an unbounded channel, events are collected from an
//! in-memory NDJSON buffer. No stdin/stdout is involved.

use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use gridwidget::headless::SharedBuffer;
use gridwidget::{run_bridge, EventWriter, HostFrame, WidgetMode};
use gridwidget_app::Settings;

/// Default wait for an expected event
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

pub struct BridgeHarness {
    tx: mpsc::UnboundedSender<HostFrame>,
    buffer: SharedBuffer,
    task: JoinHandle<gridwidget_core::Result<()>>,
}

impl BridgeHarness {
    pub fn start(mode: WidgetMode, initial: Map<String, Value>) -> Self {
        let (writer, buffer) = EventWriter::memory();
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_bridge(mode, Settings::default(), initial, rx, writer));
        Self { tx, buffer, task }
    }

    /// Send a frame given as JSON
    pub fn send(&self, frame: Value) {
        let frame: HostFrame =
            serde_json::from_value(frame).expect("test frame should be well formed");
        self.tx.send(frame).expect("bridge should be running");
    }

    pub fn events(&self) -> Vec<Value> {
        self.buffer.events()
    }

    pub fn events_named(&self, name: &str) -> Vec<Value> {
        self.events()
            .into_iter()
            .filter(|e| e["event"] == name)
            .collect()
    }

    /// Wait until an event matches `pred`, returning it
    pub async fn wait_for(&self, pred: impl Fn(&Value) -> bool) -> Value {
        let deadline = tokio::time::Instant::now() + EVENT_TIMEOUT;
        loop {
            if let Some(event) = self.events().into_iter().find(|e| pred(e)) {
                return event;
            }
            if tokio::time::Instant::now() > deadline {
                panic!("timed out waiting for event, got: {:#?}", self.events());
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Ask the bridge to quit and wait for it
    pub async fn quit(self) -> SharedBuffer {
        self.send(serde_json::json!({"type": "quit"}));
        tokio::time::timeout(EVENT_TIMEOUT, self.task)
            .await
            .expect("bridge should stop")
            .expect("bridge task should not panic")
            .expect("bridge should exit cleanly");
        self.buffer
    }
}
