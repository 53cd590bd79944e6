//! Render session lifecycle
//!
//! [`RenderController`] owns at most one mounted session together with the
//! transient UI that belongs to it (context menu, hover popup). Every
//! diagram payload change builds a fresh session, attaches it, and only
//! then detaches the previous one, so the container is never empty and
//! never holds more than the two surfaces of a swap.
//!
//! Events carry the id of the session that produced them. Anything that
//! arrives for a session that is no longer mounted is dropped.

use tokio::sync::mpsc;

use crate::actions::UpdateAction;
use crate::config::Settings;
use crate::hover_info::{HoverAction, HoverInfoService, HoverIntent};
use crate::input_key::InputKey;
use crate::interaction::InteractionBridge;
use crate::message::Message;
use crate::popup_menu::{MenuSelection, PopupMenu};
use crate::renderer::{
    CallbackSink, DiagramKind, DiagramRenderer, RenderSession, RendererCallbacks, RendererEvent,
    SessionId, SessionSpec, ViewerOptions,
};
use crate::state_store::{HostTransport, StateStore};
use gridwidget_core::prelude::*;
use gridwidget_core::{
    fields, BranchState, DiagramMetadata, DiagramPayload, ViewBox, VOLTAGE_LEVEL_TYPE,
};

/// The mounted session and the UI state that lives and dies with it
#[derive(Debug)]
pub struct MountedSession<S> {
    pub session: S,
    pub callbacks: RendererCallbacks,
    pub menu: Option<PopupMenu>,
    pub hover: Option<HoverInfoService>,
}

/// Markup, metadata and framing chosen for the next session
struct SessionSource {
    markup: String,
    metadata: Option<DiagramMetadata>,
    viewbox: Option<ViewBox>,
}

pub struct RenderController<R: DiagramRenderer> {
    kind: DiagramKind,
    renderer: R,
    mounted: Option<MountedSession<R::Session>>,
    next_session_id: SessionId,
    bridge: InteractionBridge,
    settings: Settings,
    msg_tx: mpsc::UnboundedSender<Message>,
}

impl<R: DiagramRenderer> std::fmt::Debug for RenderController<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderController")
            .field("kind", &self.kind)
            .field("mounted", &self.mounted.as_ref().map(|m| m.session.id()))
            .field("next_session_id", &self.next_session_id)
            .finish()
    }
}

impl<R: DiagramRenderer> RenderController<R> {
    pub fn new(
        kind: DiagramKind,
        renderer: R,
        settings: Settings,
        msg_tx: mpsc::UnboundedSender<Message>,
    ) -> Self {
        Self {
            kind,
            renderer,
            mounted: None,
            next_session_id: 1,
            bridge: InteractionBridge::new(),
            settings,
            msg_tx,
        }
    }

    /// First mount at widget construction; the echo field is left alone
    pub fn mount_initial<T: HostTransport>(&mut self, store: &mut StateStore<T>) {
        let payload = read_payload(self.kind, store).unwrap_or_default();
        let source = SessionSource {
            markup: payload.svg_data.clone(),
            metadata: payload.parsed_metadata(),
            viewbox: None,
        };
        self.mount(store, &payload, source);
    }

    /// Rebuild the session after the host changed a payload field
    pub fn on_diagram_data_changed<T: HostTransport>(&mut self, store: &mut StateStore<T>) {
        let Some(payload) = read_payload(self.kind, store) else {
            warn!("Keeping the current diagram, new payload is unusable");
            return;
        };

        let kept = match (payload.keep_viewbox, self.mounted.as_ref()) {
            (true, Some(mounted)) => Some(SessionSource {
                markup: mounted.session.current_markup(),
                metadata: mounted
                    .session
                    .metadata_snapshot()
                    .and_then(|raw| DiagramMetadata::parse(&raw).ok()),
                viewbox: mounted.session.viewbox(),
            }),
            (true, None) => {
                debug!("keep_viewbox without a mounted session, using the payload");
                None
            }
            (false, _) => None,
        };

        let source = match kept {
            Some(source) => source,
            None => {
                if let Some(raw) = payload.raw_metadata() {
                    self.write_echo(store, raw);
                }
                SessionSource {
                    markup: payload.svg_data.clone(),
                    metadata: payload.parsed_metadata(),
                    viewbox: None,
                }
            }
        };

        self.mount(store, &payload, source);
    }

    /// Echo the live metadata of the mounted session (empty if none)
    pub fn retrieve_metadata<T: HostTransport>(&mut self, store: &mut StateStore<T>) {
        if self.kind.echo_field().is_none() {
            debug!("{} diagrams have no metadata echo, ignoring request", self.kind);
            return;
        }
        let metadata = self
            .mounted
            .as_ref()
            .and_then(|m| m.session.metadata_snapshot())
            .unwrap_or_default();
        self.write_echo(store, &metadata);
    }

    /// Push `branch_states` into the mounted session; empty lists are skipped
    pub fn apply_branch_states<T: HostTransport>(&mut self, store: &StateStore<T>) {
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };
        let states: Vec<BranchState> = store.get_as(fields::BRANCH_STATES).unwrap_or_default();
        if states.is_empty() {
            return;
        }
        debug!(
            "Applying {} branch state(s) to session {}",
            states.len(),
            mounted.session.id()
        );
        mounted.session.set_branch_states(&states);
    }

    /// Route a renderer gesture
    pub fn handle_renderer_event<T: HostTransport>(
        &mut self,
        store: &mut StateStore<T>,
        session_id: SessionId,
        event: RendererEvent,
    ) -> Option<UpdateAction> {
        let mounted = self.current_mut(session_id)?;
        if !mounted.callbacks.is_enabled(event.slot()) {
            trace!("Callback {:?} disabled for session {}", event.slot(), session_id);
            return None;
        }
        let origin = mounted.session.surface_origin();

        match event {
            RendererEvent::HoverToggled {
                should_display,
                position,
                element_id,
                element_type,
            } => {
                let hover = mounted.hover.as_mut()?;
                let intent = HoverIntent {
                    should_display,
                    position: position.map(|p| p.relative_to(origin)),
                    element_id,
                    element_type,
                };
                hover
                    .handle_hover(intent)
                    .map(|action| hover_update(session_id, action))
            }
            RendererEvent::RightClicked {
                equipment_id,
                equipment_type,
                position,
                ..
            } => {
                if equipment_type != VOLTAGE_LEVEL_TYPE {
                    trace!("No menu for {} '{}'", equipment_type, equipment_id);
                    return None;
                }
                let menu = mounted.menu.as_mut()?;
                let anchor = position.relative_to(origin);
                let token = menu.display_menu(anchor.x, anchor.y, &equipment_id)?;
                // Queued behind everything already pending: the opening click
                // is fully handled before the listeners go live.
                if self
                    .msg_tx
                    .send(Message::MenuListenersArmed { session_id, token })
                    .is_err()
                {
                    debug!("Engine gone, menu listeners not armed");
                }
                None
            }
            other => {
                self.bridge.handle_event(store, &other);
                None
            }
        }
    }

    pub fn hover_timer_fired(&mut self, session_id: SessionId, request_id: u64) -> Option<UpdateAction> {
        let hover = self.current_mut(session_id)?.hover.as_mut()?;
        hover
            .timer_fired(request_id)
            .map(|action| hover_update(session_id, action))
    }

    /// Returns true if the result reached the popup
    pub fn hover_info_fetched(
        &mut self,
        session_id: SessionId,
        request_id: u64,
        result: std::result::Result<String, String>,
    ) -> bool {
        match self.current_mut(session_id).and_then(|m| m.hover.as_mut()) {
            Some(hover) => hover.fetch_completed(request_id, result),
            None => false,
        }
    }

    pub fn menu_listeners_armed(&mut self, session_id: SessionId, token: u64) {
        if let Some(menu) = self.current_mut(session_id).and_then(|m| m.menu.as_mut()) {
            menu.listeners_armed(token);
        }
    }

    /// Returns true if the menu consumed the key
    pub fn handle_key(&mut self, key: &InputKey) -> bool {
        self.menu_mut().is_some_and(|menu| menu.handle_key(key))
    }

    pub fn pointer_down(&mut self, inside_menu: bool) {
        if let Some(menu) = self.menu_mut() {
            menu.handle_pointer_down(inside_menu);
        }
    }

    pub fn menu_item_hovered(&mut self, index: usize) {
        if let Some(menu) = self.menu_mut() {
            menu.item_hovered(index);
        }
    }

    pub fn menu_item_left(&mut self, index: usize) {
        if let Some(menu) = self.menu_mut() {
            menu.item_left(index);
        }
    }

    pub fn menu_item_clicked(&mut self, index: usize) {
        if let Some(menu) = self.menu_mut() {
            menu.item_clicked(index);
        }
    }

    /// Persist a menu choice
    pub fn menu_selected<T: HostTransport>(
        &mut self,
        store: &mut StateStore<T>,
        selection: &MenuSelection,
    ) {
        self.bridge
            .select_menu(store, &selection.target_id, selection.index);
    }

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn mounted(&self) -> Option<&MountedSession<R::Session>> {
        self.mounted.as_ref()
    }

    pub fn session(&self) -> Option<&R::Session> {
        self.mounted.as_ref().map(|m| &m.session)
    }

    pub fn session_mut(&mut self) -> Option<&mut R::Session> {
        self.mounted.as_mut().map(|m| &mut m.session)
    }

    pub fn menu(&self) -> Option<&PopupMenu> {
        self.mounted.as_ref().and_then(|m| m.menu.as_ref())
    }

    pub fn hover(&self) -> Option<&HoverInfoService> {
        self.mounted.as_ref().and_then(|m| m.hover.as_ref())
    }

    fn menu_mut(&mut self) -> Option<&mut PopupMenu> {
        self.mounted.as_mut().and_then(|m| m.menu.as_mut())
    }

    fn current_mut(&mut self, session_id: SessionId) -> Option<&mut MountedSession<R::Session>> {
        match self.mounted.as_mut() {
            Some(mounted) if mounted.session.id() == session_id => Some(mounted),
            _ => {
                trace!("Dropping event for stale session {}", session_id);
                None
            }
        }
    }

    fn mount<T: HostTransport>(
        &mut self,
        store: &mut StateStore<T>,
        payload: &DiagramPayload,
        source: SessionSource,
    ) {
        let session_id = self.next_session_id;
        self.next_session_id += 1;

        let menu_items: Vec<String> = store.get_as(fields::POPUP_MENU_ITEMS).unwrap_or_default();
        let hover_enabled = store.get_bool(fields::HOVER_ENABLED);
        let callbacks = self.callbacks_for(
            session_id,
            source.metadata.is_some(),
            !menu_items.is_empty(),
            hover_enabled,
        );

        let spec = SessionSpec {
            session_id,
            kind: self.kind,
            markup: source.markup,
            metadata: source.metadata,
            initial_viewbox: source.viewbox,
            invalid_lf: payload.invalid_lf,
            grayout: payload.grayout,
            options: ViewerOptions::for_kind(
                self.kind,
                &self.settings.viewer,
                payload.drag_enabled,
            ),
            callbacks: callbacks.clone(),
        };

        let session = self.renderer.create_session(spec);
        self.renderer.attach(&session);

        let menu = (!menu_items.is_empty()).then(|| {
            let tx = self.msg_tx.clone();
            PopupMenu::new(menu_items, move |selection| {
                if tx.send(Message::MenuSelected(selection)).is_err() {
                    debug!("Engine gone, dropping menu selection");
                }
            })
        });
        let hover = hover_enabled.then(|| HoverInfoService::new(&self.settings.hover));

        let previous = self.mounted.replace(MountedSession {
            session,
            callbacks,
            menu,
            hover,
        });
        if let Some(previous) = previous {
            debug!(
                "Replacing session {} with {}",
                previous.session.id(),
                session_id
            );
            self.renderer.detach(previous.session);
        } else {
            debug!("Mounted session {}", session_id);
        }

        self.apply_branch_states(store);
    }

    fn callbacks_for(
        &self,
        session_id: SessionId,
        has_metadata: bool,
        has_menu: bool,
        hover_enabled: bool,
    ) -> RendererCallbacks {
        let sink = || Some(CallbackSink::new(session_id, self.msg_tx.clone()));
        match self.kind {
            DiagramKind::NetworkArea => RendererCallbacks {
                on_move_node: sink(),
                on_move_text_node: sink(),
                on_select_node: sink(),
                on_toggle_hover: if hover_enabled { sink() } else { None },
                on_right_click: if has_menu { sink() } else { None },
                ..Default::default()
            },
            DiagramKind::SingleLine if has_metadata => RendererCallbacks {
                on_next_voltage_level: sink(),
                on_switch: sink(),
                on_feeder: sink(),
                on_bus: sink(),
                ..Default::default()
            },
            DiagramKind::SingleLine => RendererCallbacks::default(),
        }
    }

    /// Clear then rewrite the echo field in one persisted batch, so the host
    /// sees a change even when the value equals the previous one
    fn write_echo<T: HostTransport>(&self, store: &mut StateStore<T>, metadata: &str) {
        let Some(field) = self.kind.echo_field() else {
            return;
        };
        store.set(field, "");
        store.set(field, metadata);
        store.persist();
    }
}

fn read_payload<T: HostTransport>(
    kind: DiagramKind,
    store: &StateStore<T>,
) -> Option<DiagramPayload> {
    let payload = match kind {
        DiagramKind::NetworkArea => {
            DiagramPayload::from_value(store.get(fields::DIAGRAM_DATA).unwrap_or(&serde_json::Value::Null))
        }
        DiagramKind::SingleLine => DiagramPayload::from_split_fields(
            store.get(fields::SLD_MARKUP),
            store.get(fields::SLD_METADATA),
        ),
    };
    match payload {
        Ok(payload) => Some(payload),
        Err(e) => {
            warn!("Malformed diagram payload: {}", e);
            None
        }
    }
}

fn hover_update(session_id: SessionId, action: HoverAction) -> UpdateAction {
    match action {
        HoverAction::ScheduleFetch { request_id, delay } => UpdateAction::ScheduleHoverTimer {
            session_id,
            request_id,
            delay,
        },
        HoverAction::Fetch {
            request_id,
            request,
        } => UpdateAction::FetchHoverInfo {
            session_id,
            request_id,
            request,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hover_info::HoverInfoRequest;
    use crate::test_utils::{FakeRenderer, RecordingTransport};
    use gridwidget_core::Point;
    use serde_json::{json, Map, Value};
    use std::time::Duration;

    const META: &str = r#"{"nodes":[{"equipmentId":"VL1"}]}"#;

    fn store_with(values: Value) -> StateStore<RecordingTransport> {
        let values: Map<String, Value> = serde_json::from_value(values).unwrap();
        StateStore::with_values(RecordingTransport::default(), values)
    }

    fn controller(
        kind: DiagramKind,
    ) -> (
        RenderController<FakeRenderer>,
        mpsc::UnboundedReceiver<Message>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            RenderController::new(kind, FakeRenderer::default(), Settings::default(), tx),
            rx,
        )
    }

    fn nad_store() -> StateStore<RecordingTransport> {
        store_with(json!({
            "diagram_data": {"svg_data": "<svg id='a'/>", "metadata": META},
            "popup_menu_items": ["Open", "Close"],
            "hover_enabled": true,
        }))
    }

    fn set_payload(store: &mut StateStore<RecordingTransport>, payload: Value) {
        store.apply_host_update("diagram_data", payload);
    }

    #[test]
    fn test_initial_mount_does_not_echo() {
        let (mut controller, _rx) = controller(DiagramKind::NetworkArea);
        let mut store = nad_store();
        controller.mount_initial(&mut store);

        assert_eq!(controller.renderer().attached(), vec![1]);
        assert!(store.transport().batches().is_empty());
        let spec = controller.renderer().last_spec().unwrap();
        assert_eq!(spec.markup, "<svg id='a'/>");
        assert!(spec.metadata.is_some());
    }

    #[test]
    fn test_payload_change_swaps_sessions_and_echoes_once() {
        let (mut controller, _rx) = controller(DiagramKind::NetworkArea);
        let mut store = nad_store();
        controller.mount_initial(&mut store);

        set_payload(
            &mut store,
            json!({"svg_data": "<svg id='b'/>", "metadata": META}),
        );
        controller.on_diagram_data_changed(&mut store);

        let renderer = controller.renderer();
        assert_eq!(renderer.attached(), vec![2]);
        assert_eq!(renderer.history(), &["attach:1", "attach:2", "detach:1"]);

        let batches = store.transport().batches();
        assert_eq!(batches.len(), 1);
        let echo: Vec<&Value> = batches[0].iter().map(|w| &w.value).collect();
        assert_eq!(echo, vec![&json!(""), &json!(META)]);
        assert!(batches[0].iter().all(|w| w.field == "current_nad_metadata"));
    }

    #[test]
    fn test_no_session_leak_over_many_changes() {
        let (mut controller, _rx) = controller(DiagramKind::NetworkArea);
        let mut store = nad_store();
        controller.mount_initial(&mut store);
        for i in 0..10 {
            set_payload(&mut store, json!({"svg_data": format!("<svg id='{i}'/>")}));
            controller.on_diagram_data_changed(&mut store);
            assert_eq!(controller.renderer().attached().len(), 1);
        }
        assert_eq!(controller.session().unwrap().id(), 11);
    }

    #[test]
    fn test_keep_viewbox_reuses_current_surface() {
        let (mut controller, _rx) = controller(DiagramKind::NetworkArea);
        let mut store = nad_store();
        controller.mount_initial(&mut store);

        let panned = ViewBox::new(120.0, 80.0, 400.0, 300.0);
        controller.session_mut().unwrap().pan_to(panned);

        set_payload(
            &mut store,
            json!({"svg_data": "<svg id='ignored'/>", "metadata": "{}", "keep_viewbox": true}),
        );
        controller.on_diagram_data_changed(&mut store);

        let spec = controller.renderer().last_spec().unwrap();
        assert_eq!(spec.initial_viewbox, Some(panned));
        assert_eq!(spec.markup, "<svg id='a'/>");
        assert_eq!(controller.session().unwrap().viewbox(), Some(panned));
        assert!(store.transport().batches().is_empty());
    }

    #[test]
    fn test_keep_viewbox_without_session_uses_payload() {
        let (mut controller, _rx) = controller(DiagramKind::NetworkArea);
        let mut store = nad_store();
        set_payload(
            &mut store,
            json!({"svg_data": "<svg id='n'/>", "metadata": META, "keep_viewbox": true}),
        );
        controller.on_diagram_data_changed(&mut store);

        assert_eq!(controller.renderer().last_spec().unwrap().markup, "<svg id='n'/>");
        assert_eq!(store.transport().batches().len(), 1);
    }

    #[test]
    fn test_malformed_payload_keeps_session() {
        let (mut controller, _rx) = controller(DiagramKind::NetworkArea);
        let mut store = nad_store();
        controller.mount_initial(&mut store);

        set_payload(&mut store, json!({"svg_data": 42}));
        controller.on_diagram_data_changed(&mut store);

        assert_eq!(controller.renderer().attached(), vec![1]);
    }

    #[test]
    fn test_malformed_metadata_renders_non_interactive() {
        let (mut controller, _rx) = controller(DiagramKind::SingleLine);
        let mut store = store_with(json!({"value": "<svg/>", "value_meta": "{broken"}));
        controller.mount_initial(&mut store);

        let spec = controller.renderer().last_spec().unwrap();
        assert!(spec.metadata.is_none());
        assert!(spec.callbacks.enabled_slots().is_empty());
    }

    #[test]
    fn test_single_line_callbacks_need_metadata() {
        let (mut controller, _rx) = controller(DiagramKind::SingleLine);
        let mut store = store_with(json!({"value": "<svg id='sld'/>", "value_meta": META}));
        controller.mount_initial(&mut store);
        let spec = controller.renderer().last_spec().unwrap();
        assert_eq!(spec.markup, "<svg id='sld'/>");
        assert_eq!(spec.callbacks.enabled_slots().len(), 4);
    }

    #[test]
    fn test_single_line_ignores_network_area_payload() {
        let (mut controller, _rx) = controller(DiagramKind::SingleLine);
        let mut store = store_with(json!({
            "diagram_data": {"svg_data": "<svg/>", "metadata": META}
        }));
        controller.mount_initial(&mut store);

        let spec = controller.renderer().last_spec().unwrap();
        assert!(spec.markup.is_empty());
        assert!(spec.callbacks.enabled_slots().is_empty());
    }

    #[test]
    fn test_single_line_metadata_change_remounts() {
        let (mut controller, _rx) = controller(DiagramKind::SingleLine);
        let mut store = store_with(json!({"value": "<svg/>"}));
        controller.mount_initial(&mut store);
        assert!(controller.renderer().last_spec().unwrap().metadata.is_none());

        store.apply_host_update("value_meta", json!(META));
        controller.on_diagram_data_changed(&mut store);

        let spec = controller.renderer().last_spec().unwrap();
        assert_eq!(controller.renderer().attached(), vec![2]);
        assert!(spec.metadata.is_some());
        assert!(store.transport().batches().is_empty());
    }

    #[test]
    fn test_feature_toggles_shape_callbacks() {
        let (mut controller, _rx) = controller(DiagramKind::NetworkArea);
        let mut store = store_with(json!({
            "diagram_data": {"svg_data": "<svg/>"},
            "popup_menu_items": [],
            "hover_enabled": false,
        }));
        controller.mount_initial(&mut store);

        let callbacks = &controller.renderer().last_spec().unwrap().callbacks;
        assert!(callbacks.on_right_click.is_none());
        assert!(callbacks.on_toggle_hover.is_none());
        assert!(callbacks.on_select_node.is_some());
        assert!(controller.menu().is_none());
        assert!(controller.hover().is_none());
    }

    #[test]
    fn test_retrieve_metadata_without_session_echoes_empty() {
        let (mut controller, _rx) = controller(DiagramKind::NetworkArea);
        let mut store = store_with(json!({}));
        controller.retrieve_metadata(&mut store);

        let batch = &store.transport().batches()[0];
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].value, json!(""));
    }

    #[test]
    fn test_retrieve_metadata_reads_live_session() {
        let (mut controller, _rx) = controller(DiagramKind::NetworkArea);
        let mut store = nad_store();
        controller.mount_initial(&mut store);
        controller
            .session_mut()
            .unwrap()
            .set_live_metadata(r#"{"moved":true}"#);

        controller.retrieve_metadata(&mut store);
        assert_eq!(
            store.get("current_nad_metadata"),
            Some(&json!(r#"{"moved":true}"#))
        );
    }

    #[test]
    fn test_branch_states_applied_after_each_mount() {
        let (mut controller, _rx) = controller(DiagramKind::NetworkArea);
        let mut store = nad_store();
        store.apply_host_update(
            "branch_states",
            json!([{"branchId": "L1", "value1": 10.5, "connected1": true}]),
        );
        controller.mount_initial(&mut store);
        assert_eq!(controller.session().unwrap().branch_states().len(), 1);

        set_payload(&mut store, json!({"svg_data": "<svg id='b'/>"}));
        controller.on_diagram_data_changed(&mut store);
        let states = controller.session().unwrap().branch_states();
        assert_eq!(states[0].branch_id, "L1");
    }

    #[test]
    fn test_empty_branch_states_not_applied() {
        let (mut controller, _rx) = controller(DiagramKind::NetworkArea);
        let mut store = nad_store();
        store.apply_host_update("branch_states", json!([]));
        controller.mount_initial(&mut store);
        assert_eq!(controller.session().unwrap().branch_state_calls(), 0);
    }

    #[test]
    fn test_right_click_opens_menu_in_widget_coordinates() {
        let (mut controller, mut rx) = controller(DiagramKind::NetworkArea);
        let mut store = nad_store();
        controller.mount_initial(&mut store);
        controller
            .session_mut()
            .unwrap()
            .set_origin(Point::new(100.0, 50.0));

        let action = controller.handle_renderer_event(
            &mut store,
            1,
            RendererEvent::RightClicked {
                svg_id: "svg-1".into(),
                equipment_id: "VL1".into(),
                equipment_type: "VOLTAGE_LEVEL".into(),
                position: Point::new(110.0, 70.0),
            },
        );
        assert!(action.is_none());

        let view = controller.menu().unwrap().view().unwrap();
        assert_eq!(view.anchor, Point::new(10.0, 20.0));
        assert_eq!(view.target_id, "VL1");
        assert!(matches!(
            rx.try_recv().unwrap(),
            Message::MenuListenersArmed { session_id: 1, .. }
        ));
    }

    #[test]
    fn test_right_click_on_other_types_is_ignored() {
        let (mut controller, _rx) = controller(DiagramKind::NetworkArea);
        let mut store = nad_store();
        controller.mount_initial(&mut store);

        controller.handle_renderer_event(
            &mut store,
            1,
            RendererEvent::RightClicked {
                svg_id: "svg-2".into(),
                equipment_id: "L1".into(),
                equipment_type: "LINE".into(),
                position: Point::new(0.0, 0.0),
            },
        );
        assert!(!controller.menu().unwrap().is_open());
    }

    #[test]
    fn test_hover_toggle_schedules_timer() {
        let (mut controller, _rx) = controller(DiagramKind::NetworkArea);
        let mut store = nad_store();
        controller.mount_initial(&mut store);

        let action = controller.handle_renderer_event(
            &mut store,
            1,
            RendererEvent::HoverToggled {
                should_display: true,
                position: Some(Point::new(5.0, 5.0)),
                element_id: "L1".into(),
                element_type: "LINE".into(),
            },
        );
        assert_eq!(
            action,
            Some(UpdateAction::ScheduleHoverTimer {
                session_id: 1,
                request_id: 1,
                delay: Duration::from_millis(200),
            })
        );
        assert_eq!(
            controller.hover_timer_fired(1, 1),
            Some(UpdateAction::FetchHoverInfo {
                session_id: 1,
                request_id: 1,
                request: HoverInfoRequest::new("L1", "LINE"),
            })
        );
    }

    #[test]
    fn test_events_for_replaced_session_are_dropped() {
        let (mut controller, _rx) = controller(DiagramKind::NetworkArea);
        let mut store = nad_store();
        controller.mount_initial(&mut store);
        set_payload(&mut store, json!({"svg_data": "<svg id='b'/>"}));
        controller.on_diagram_data_changed(&mut store);

        controller.handle_renderer_event(
            &mut store,
            1,
            RendererEvent::NodeSelected {
                equipment_id: "VL1".into(),
                node_id: "0".into(),
            },
        );
        assert!(store.get("selected_node").is_none());
        assert!(controller.hover_timer_fired(1, 1).is_none());
        assert!(!controller.hover_info_fetched(1, 1, Ok("x".into())));
    }

    #[test]
    fn test_disabled_slot_event_is_dropped() {
        let (mut controller, _rx) = controller(DiagramKind::NetworkArea);
        let mut store = store_with(json!({
            "diagram_data": {"svg_data": "<svg/>"},
            "popup_menu_items": ["Open"],
        }));
        controller.mount_initial(&mut store);

        let action = controller.handle_renderer_event(
            &mut store,
            1,
            RendererEvent::HoverToggled {
                should_display: true,
                position: Some(Point::new(5.0, 5.0)),
                element_id: "L1".into(),
                element_type: "LINE".into(),
            },
        );
        assert!(action.is_none());
    }

    #[test]
    fn test_menu_selected_writes_selection() {
        let (mut controller, _rx) = controller(DiagramKind::NetworkArea);
        let mut store = nad_store();
        controller.menu_selected(
            &mut store,
            &MenuSelection {
                index: 1,
                target_id: "VL4".into(),
            },
        );
        assert_eq!(
            store.get("selected_menu"),
            Some(&json!({"equipment_id": "VL4", "selection": 1}))
        );
    }
}
