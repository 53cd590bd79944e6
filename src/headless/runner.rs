//! Headless mode runner - event loops without a browser
//!
//! Host frames are read on a blocking stdin thread and forwarded over a
//! channel. Diagram widgets run through the [`WidgetEngine`]; the network
//! map runs its own small loop around [`NetworkMapController`].

use std::str::FromStr;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use gridwidget_app::invoke::{InvokeHoverFetcher, RequestTracker};
use gridwidget_app::network_map::NetworkMapController;
use gridwidget_app::renderer::{DiagramKind, RenderSession, SessionId};
use gridwidget_app::{Settings, StateStore, WidgetEngine};
use gridwidget_core::prelude::{Error, Result, ResultExt};

use super::renderer::{HeadlessRenderer, HeadlessSession};
use super::transport::{NdjsonInvokeChannel, NdjsonTransport};
use super::{EventWriter, HeadlessEvent, HostFrame};

type HeadlessEngine =
    WidgetEngine<HeadlessRenderer, NdjsonTransport, InvokeHoverFetcher<NdjsonInvokeChannel>>;

/// Which widget the bridge hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetMode {
    Diagram(DiagramKind),
    Map,
}

impl WidgetMode {
    pub fn label(&self) -> String {
        match self {
            Self::Diagram(kind) => kind.to_string(),
            Self::Map => "map".to_string(),
        }
    }
}

impl FromStr for WidgetMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "map" | "network-map" => Ok(Self::Map),
            other => other.parse().map(Self::Diagram),
        }
    }
}

/// Run in headless mode on stdin/stdout
pub async fn run_headless(
    mode: WidgetMode,
    settings: Settings,
    initial: Map<String, Value>,
) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("gridwidget starting in HEADLESS mode ({})", mode.label());
    info!("═══════════════════════════════════════════════════════");

    let writer = EventWriter::stdout();
    let (frame_tx, frame_rx) = mpsc::unbounded_channel();

    let reader_writer = writer.clone();
    std::thread::spawn(move || {
        spawn_stdin_reader_blocking(frame_tx, reader_writer);
    });

    let result = run_bridge(mode, settings, initial, frame_rx, writer).await;
    info!("gridwidget headless mode exiting");
    result
}

/// Run the bridge over an arbitrary frame source and event sink
pub async fn run_bridge(
    mode: WidgetMode,
    settings: Settings,
    initial: Map<String, Value>,
    frames: mpsc::UnboundedReceiver<HostFrame>,
    writer: EventWriter,
) -> Result<()> {
    match mode {
        WidgetMode::Diagram(kind) => {
            diagram_event_loop(kind, settings, initial, frames, writer).await
        }
        WidgetMode::Map => map_event_loop(settings, initial, frames, writer).await,
    }
}

/// Last emitted transient UI, to report only changes
#[derive(Default)]
struct ViewTracker {
    info_box: Option<HeadlessEvent>,
    menu: Option<HeadlessEvent>,
}

impl ViewTracker {
    fn emit_changes(&mut self, engine: &HeadlessEngine, writer: &EventWriter) {
        let controller = engine.controller();

        if let Some(hover) = controller.hover() {
            let event = HeadlessEvent::InfoBox {
                info: hover.info_box().clone(),
            };
            emit_if_changed(&mut self.info_box, event, writer);
        }

        if let Some(menu) = controller.menu() {
            let event = HeadlessEvent::Menu { view: menu.view() };
            emit_if_changed(&mut self.menu, event, writer);
        }
    }
}

fn emit_if_changed(last: &mut Option<HeadlessEvent>, event: HeadlessEvent, writer: &EventWriter) {
    if last.as_ref() != Some(&event) {
        writer.emit(&event);
        *last = Some(event);
    }
}

async fn diagram_event_loop(
    kind: DiagramKind,
    settings: Settings,
    initial: Map<String, Value>,
    mut frames: mpsc::UnboundedReceiver<HostFrame>,
    writer: EventWriter,
) -> Result<()> {
    let tracker = Arc::new(RequestTracker::new());
    let fetcher = InvokeHoverFetcher::new(
        NdjsonInvokeChannel::new(writer.clone()),
        tracker.clone(),
        settings.bridge.invoke_timeout(),
    );

    let mut engine = WidgetEngine::new(
        kind,
        HeadlessRenderer::new(writer.clone()),
        NdjsonTransport::new(writer.clone()),
        initial,
        fetcher,
        settings,
    );

    writer.emit(&HeadlessEvent::ready(&kind.to_string()));
    engine.start();

    let mut views = ViewTracker::default();
    views.emit_changes(&engine, &writer);

    loop {
        tokio::select! {
            frame = frames.recv() => {
                let Some(frame) = frame else {
                    info!("Host input closed");
                    break;
                };
                if !apply_frame(&mut engine, &tracker, frame).await {
                    info!("Quit requested");
                    break;
                }
            }
            keep_running = engine.step() => {
                if !keep_running {
                    break;
                }
            }
        }

        // Follow-up messages queued by the frame or the step
        engine.drain_pending_messages();
        views.emit_changes(&engine, &writer);
    }

    tracker.cancel_all().await;
    Ok(())
}

/// Apply one host frame. Returns false when the host asked to quit.
async fn apply_frame(
    engine: &mut HeadlessEngine,
    tracker: &RequestTracker,
    frame: HostFrame,
) -> bool {
    match frame {
        HostFrame::InvokeResult {
            call_id,
            result,
            error,
        } => {
            tracker.handle_response(call_id, result, error).await;
            true
        }
        HostFrame::Viewport {
            session_id,
            viewbox,
        } => {
            with_session(engine, session_id, |session| session.set_viewbox(viewbox));
            true
        }
        HostFrame::SurfaceMoved { session_id, origin } => {
            with_session(engine, session_id, |session| session.set_origin(origin));
            true
        }
        HostFrame::LiveMetadata {
            session_id,
            metadata,
        } => {
            with_session(engine, session_id, |session| {
                session.set_live_metadata(metadata)
            });
            true
        }
        HostFrame::Map { event } => {
            warn!("Map gesture {:?} sent to a diagram widget", event);
            true
        }
        other => match other.into_message() {
            Some(message) => engine.process_message(message),
            None => true,
        },
    }
}

fn with_session(
    engine: &mut HeadlessEngine,
    session_id: SessionId,
    f: impl FnOnce(&mut HeadlessSession),
) {
    match engine.controller_mut().session_mut() {
        Some(session) if session.id() == session_id => f(session),
        _ => trace!("Frame for stale session {} dropped", session_id),
    }
}

async fn map_event_loop(
    settings: Settings,
    initial: Map<String, Value>,
    mut frames: mpsc::UnboundedReceiver<HostFrame>,
    writer: EventWriter,
) -> Result<()> {
    let mut store = StateStore::with_values(NdjsonTransport::new(writer.clone()), initial);
    let mut controller = NetworkMapController::new(settings.map.clone());

    writer.emit(&HeadlessEvent::ready("map"));
    if let Err(e) = controller.load(&mut store).context("Failed to load map data") {
        writer.emit(&HeadlessEvent::error(e.to_string(), false));
    }

    let mut last_state = None;
    emit_map_state(&controller, &store, &mut last_state, &writer);

    while let Some(frame) = frames.recv().await {
        match frame {
            HostFrame::Update { field, value } => {
                if store.apply_host_update(&field, value) {
                    if let Err(e) = controller.on_field_changed(&mut store, &field) {
                        warn!("Map field '{}' rejected: {}", field, e);
                        writer.emit(&HeadlessEvent::error(e.to_string(), false));
                    }
                }
            }
            HostFrame::Custom { content } => {
                debug!("Map widget ignores custom message {}", content);
            }
            HostFrame::Map { event } => controller.handle_event(&mut store, event),
            HostFrame::Quit => {
                info!("Quit requested");
                break;
            }
            other => trace!("Frame {:?} has no meaning for the map", other),
        }
        emit_map_state(&controller, &store, &mut last_state, &writer);
    }

    Ok(())
}

fn emit_map_state(
    controller: &NetworkMapController,
    store: &StateStore<NdjsonTransport>,
    last: &mut Option<HeadlessEvent>,
    writer: &EventWriter,
) {
    let event = HeadlessEvent::MapState {
        center_on: controller.center_on().map(str::to_string),
        choice: controller.choice().cloned(),
        options: controller.view_options(store),
    };
    emit_if_changed(last, event, writer);
}

/// Read host frames from stdin until EOF (blocking version)
fn spawn_stdin_reader_blocking(frame_tx: mpsc::UnboundedSender<HostFrame>, writer: EventWriter) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    let reader = stdin.lock();

    for line in reader.lines() {
        match line {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match HostFrame::parse(trimmed) {
                    Ok(frame) => {
                        let quit = frame == HostFrame::Quit;
                        if frame_tx.send(frame).is_err() || quit {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Stdin: {}", e);
                        writer.emit(&HeadlessEvent::error(e.to_string(), false));
                    }
                }
            }
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    info!("Stdin reader exiting");
}
