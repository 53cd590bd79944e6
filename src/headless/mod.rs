//! Headless mode - NDJSON host bridge
//!
//! The widget runs without a browser: host frames arrive on stdin, one JSON
//! object per line, and everything the widget would show or send is written
//! to stdout as NDJSON events.
//!
//! # Event Format
//!
//! Each event has an "event" field indicating its type and a millisecond
//! "timestamp", along with event-specific data.
//!
//! ```json
//! {"event":"ready","kind":"network-area","timestamp":1704700001000}
//! {"event":"session_mounted","session_id":1,"kind":"network-area",...}
//! {"event":"state_sync","writes":[{"field":"selected_node","value":{...}}],...}
//! {"event":"host_message","content":{"event":"select_node"},...}
//! ```

pub mod frames;
pub mod renderer;
pub mod runner;
pub mod transport;

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use gridwidget_app::invoke::InvokeCall;
use gridwidget_app::network_map::{MapViewOptions, VoltageLevelChoice};
use gridwidget_app::popup_menu::MenuView;
use gridwidget_app::renderer::{CallbackSlot, DiagramKind, SessionId, ViewerOptions};
use gridwidget_app::{FieldWrite, InfoBox};
use gridwidget_core::ViewBox;

pub use frames::HostFrame;
pub use runner::run_headless;

/// Events emitted in headless mode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// Bridge started and is reading frames
    Ready { kind: String },

    /// A persisted batch of field writes
    StateSync { writes: Vec<FieldWrite> },

    /// Custom message sent to the host
    HostMessage { content: Value },

    /// A render session was attached to the container
    SessionMounted {
        session_id: SessionId,
        kind: DiagramKind,
        viewbox: Option<ViewBox>,
        invalid_lf: bool,
        grayout: bool,
        options: ViewerOptions,
        callbacks: Vec<CallbackSlot>,
    },

    /// A render session was detached and released
    SessionUnmounted { session_id: SessionId },

    /// Hover popup changed
    InfoBox {
        #[serde(flatten)]
        info: InfoBox,
    },

    /// Context menu opened, changed or closed
    Menu { view: Option<MenuView> },

    /// Invoke the host must answer with an `invoke_result` frame
    InvokeRequest {
        #[serde(flatten)]
        call: InvokeCall,
    },

    /// Network map state changed
    MapState {
        center_on: Option<String>,
        choice: Option<VoltageLevelChoice>,
        options: MapViewOptions,
    },

    /// Error occurred
    Error { message: String, fatal: bool },
}

#[derive(Serialize)]
struct Envelope<'a> {
    #[serde(flatten)]
    event: &'a HeadlessEvent,
    timestamp: i64,
}

impl HeadlessEvent {
    pub fn ready(kind: &str) -> Self {
        Self::Ready {
            kind: kind.to_string(),
        }
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error { message, fatal }
    }

    /// Serialize as one NDJSON line, without the trailing newline
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(&Envelope {
            event: self,
            timestamp: Utc::now().timestamp_millis(),
        })
    }
}

/// Shared NDJSON output.
///
/// Cloned into the transport, the renderer and the invoke channel so that
/// all of them write to the same stream in call order.
#[derive(Clone)]
pub struct EventWriter {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl std::fmt::Debug for EventWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventWriter").finish_non_exhaustive()
    }
}

impl EventWriter {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(out))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Writer backed by an in-memory buffer, for tests and embedding
    pub fn memory() -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Self::new(buffer.clone()), buffer)
    }

    /// Write one event line and flush
    pub fn emit(&self, event: &HeadlessEvent) {
        let line = match event.to_line() {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        let Ok(mut out) = self.out.lock() else {
            error!("Headless output poisoned, dropping event");
            return;
        };
        if let Err(e) = writeln!(out, "{}", line) {
            error!("Failed to write headless event: {}", e);
            return;
        }
        if let Err(e) = out.flush() {
            error!("Failed to flush headless output: {}", e);
        }
    }
}

/// Cloneable in-memory sink
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Every line written so far, parsed
    pub fn events(&self) -> Vec<Value> {
        let bytes = match self.bytes.lock() {
            Ok(bytes) => bytes.clone(),
            Err(_) => return Vec::new(),
        };
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// The "event" field of every line, in order
    pub fn event_names(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|e| e.get("event").and_then(Value::as_str).map(str::to_string))
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.bytes.lock() {
            Ok(mut bytes) => {
                bytes.extend_from_slice(buf);
                Ok(buf.len())
            }
            Err(_) => Err(io::Error::new(io::ErrorKind::Other, "buffer poisoned")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
