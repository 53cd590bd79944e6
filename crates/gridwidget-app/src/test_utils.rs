//! Test doubles for the host transport, the renderer and the hover fetcher
//!
//! Available to this crate's unit tests and, with the `test-helpers`
//! feature, to integration tests of dependent crates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::hover_info::{HoverInfoFetcher, HoverInfoRequest};
use crate::renderer::{DiagramRenderer, RenderSession, SessionId, SessionSpec};
use crate::state_store::{FieldWrite, HostTransport};
use gridwidget_core::prelude::*;
use gridwidget_core::{BranchState, Point, ViewBox};

// ─────────────────────────────────────────────────────────────────
// Host transport
// ─────────────────────────────────────────────────────────────────

/// Records every batch and message delivered to the host
#[derive(Debug, Default)]
pub struct RecordingTransport {
    batches: Vec<Vec<FieldWrite>>,
    sent: Vec<Value>,
    log: Vec<String>,
}

impl RecordingTransport {
    pub fn batches(&self) -> &[Vec<FieldWrite>] {
        &self.batches
    }

    pub fn sent(&self) -> &[Value] {
        &self.sent
    }

    /// Deliveries in order, as `sync:<field>` and `send:<event>`
    pub fn log(&self) -> Vec<String> {
        self.log.clone()
    }

    /// All values written to `field`, across batches
    pub fn writes_to(&self, field: &str) -> Vec<Value> {
        self.batches
            .iter()
            .flatten()
            .filter(|w| w.field == field)
            .map(|w| w.value.clone())
            .collect()
    }
}

impl HostTransport for RecordingTransport {
    fn sync(&mut self, writes: Vec<FieldWrite>) {
        for write in &writes {
            self.log.push(format!("sync:{}", write.field));
        }
        self.batches.push(writes);
    }

    fn send(&mut self, content: Value) {
        let label = content
            .get("event")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| content.to_string());
        self.log.push(format!("send:{}", label));
        self.sent.push(content);
    }
}

// ─────────────────────────────────────────────────────────────────
// Renderer
// ─────────────────────────────────────────────────────────────────

/// In-memory render session
#[derive(Debug)]
pub struct FakeSession {
    spec: SessionSpec,
    viewbox: Option<ViewBox>,
    live_metadata: Option<String>,
    origin: Point,
    branch_states: Vec<BranchState>,
    branch_state_calls: usize,
}

impl FakeSession {
    fn new(spec: SessionSpec) -> Self {
        Self {
            viewbox: spec
                .initial_viewbox
                .or_else(|| Some(ViewBox::new(0.0, 0.0, 800.0, 600.0))),
            live_metadata: spec.metadata.as_ref().map(|m| m.0.to_string()),
            origin: Point::default(),
            branch_states: Vec::new(),
            branch_state_calls: 0,
            spec,
        }
    }

    pub fn spec(&self) -> &SessionSpec {
        &self.spec
    }

    /// Simulate the user panning or zooming
    pub fn pan_to(&mut self, viewbox: ViewBox) {
        self.viewbox = Some(viewbox);
    }

    /// Simulate the renderer updating its metadata (e.g. after a drag)
    pub fn set_live_metadata(&mut self, metadata: &str) {
        self.live_metadata = Some(metadata.to_string());
    }

    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    pub fn branch_states(&self) -> &[BranchState] {
        &self.branch_states
    }

    pub fn branch_state_calls(&self) -> usize {
        self.branch_state_calls
    }
}

impl RenderSession for FakeSession {
    fn id(&self) -> SessionId {
        self.spec.session_id
    }

    fn current_markup(&self) -> String {
        self.spec.markup.clone()
    }

    fn viewbox(&self) -> Option<ViewBox> {
        self.viewbox
    }

    fn metadata_snapshot(&self) -> Option<String> {
        self.live_metadata.clone()
    }

    fn set_branch_states(&mut self, states: &[BranchState]) {
        self.branch_states = states.to_vec();
        self.branch_state_calls += 1;
    }

    fn surface_origin(&self) -> Point {
        self.origin
    }
}

/// Renderer that keeps track of what is attached to the container
#[derive(Debug, Default)]
pub struct FakeRenderer {
    attached: Vec<SessionId>,
    specs: Vec<SessionSpec>,
    history: Vec<String>,
}

impl FakeRenderer {
    /// Sessions currently in the container
    pub fn attached(&self) -> Vec<SessionId> {
        self.attached.clone()
    }

    /// Every spec the renderer was asked to build
    pub fn specs(&self) -> &[SessionSpec] {
        &self.specs
    }

    pub fn last_spec(&self) -> Option<&SessionSpec> {
        self.specs.last()
    }

    /// `attach:<id>` / `detach:<id>` in call order
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl DiagramRenderer for FakeRenderer {
    type Session = FakeSession;

    fn create_session(&mut self, spec: SessionSpec) -> FakeSession {
        self.specs.push(spec.clone());
        FakeSession::new(spec)
    }

    fn attach(&mut self, session: &FakeSession) {
        self.attached.push(session.id());
        self.history.push(format!("attach:{}", session.id()));
    }

    fn detach(&mut self, session: FakeSession) {
        self.attached.retain(|id| *id != session.id());
        self.history.push(format!("detach:{}", session.id()));
    }
}

// ─────────────────────────────────────────────────────────────────
// Hover fetcher
// ─────────────────────────────────────────────────────────────────

/// Fetcher answering from a script, keyed by element id.
///
/// Unknown ids answer with an empty string.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    responses: HashMap<String, std::result::Result<String, String>>,
    delays: HashMap<String, Duration>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedFetcher {
    pub fn respond(mut self, id: &str, content: &str) -> Self {
        self.responses.insert(id.to_string(), Ok(content.to_string()));
        self
    }

    pub fn fail_on(mut self, id: &str, message: &str) -> Self {
        self.responses.insert(id.to_string(), Err(message.to_string()));
        self
    }

    /// Delay the answer for `id`
    pub fn delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Shared call counter, still readable once the fetcher is moved away
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl HoverInfoFetcher for ScriptedFetcher {
    async fn fetch_info(&self, request: &HoverInfoRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&request.id) {
            tokio::time::sleep(*delay).await;
        }
        match self.responses.get(&request.id) {
            Some(Ok(content)) => Ok(content.clone()),
            Some(Err(message)) => Err(Error::hover_fetch(message.clone())),
            None => Ok(String::new()),
        }
    }
}
