//! Boundary with the external diagram renderer
//!
//! The renderer turns markup and metadata into an on-screen surface and
//! reports user gestures back. The controller never looks inside a session:
//! it creates one from a [`SessionSpec`], attaches it, asks it for its live
//! viewport, markup and metadata, and eventually detaches it.
//!
//! Callbacks are configured through [`RendererCallbacks`], one independently
//! nullable slot per gesture. An empty slot means the feature is disabled for
//! that session.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::{ViewerSettings, ViewerSize};
use crate::message::Message;
use gridwidget_core::prelude::*;
use gridwidget_core::{
    fields, BranchState, ClickedBus, ClickedFeeder, ClickedSwitch, DiagramMetadata, MovedNode,
    MovedTextNode, Point, ViewBox,
};

/// Unique identifier for a render session
pub type SessionId = u64;

/// Diagram flavour handled by a widget instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagramKind {
    NetworkArea,
    SingleLine,
}

impl DiagramKind {
    /// Field the live metadata is echoed into, if this kind has one
    pub fn echo_field(&self) -> Option<&'static str> {
        match self {
            Self::NetworkArea => Some(fields::CURRENT_NAD_METADATA),
            Self::SingleLine => None,
        }
    }

    /// Fields carrying the diagram payload; a change to any of them remounts
    pub fn payload_fields(&self) -> &'static [&'static str] {
        match self {
            Self::NetworkArea => &[fields::DIAGRAM_DATA],
            Self::SingleLine => &[fields::SLD_MARKUP, fields::SLD_METADATA],
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkArea => write!(f, "nad"),
            Self::SingleLine => write!(f, "sld"),
        }
    }
}

impl FromStr for DiagramKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "nad" | "network-area" => Ok(Self::NetworkArea),
            "sld" | "single-line" => Ok(Self::SingleLine),
            other => Err(Error::config(format!("unknown diagram kind '{}'", other))),
        }
    }
}

/// Presentation options handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerOptions {
    #[serde(flatten)]
    pub size: ViewerSize,
    pub enable_drag: bool,
    pub add_buttons: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrows_color: Option<String>,
}

impl ViewerOptions {
    pub fn for_kind(kind: DiagramKind, settings: &ViewerSettings, drag_enabled: bool) -> Self {
        match kind {
            DiagramKind::NetworkArea => Self {
                size: settings.nad,
                enable_drag: drag_enabled,
                add_buttons: settings.add_buttons,
                arrows_color: None,
            },
            DiagramKind::SingleLine => Self {
                size: settings.sld,
                enable_drag: false,
                add_buttons: false,
                arrows_color: Some(settings.arrows_color.clone()),
            },
        }
    }
}

/// Gesture reported by a render session.
///
/// Pointer positions are page-relative, as the renderer sees them.
#[derive(Debug, Clone, PartialEq)]
pub enum RendererEvent {
    NodeMoved(MovedNode),
    TextNodeMoved(MovedTextNode),
    NodeSelected {
        equipment_id: String,
        node_id: String,
    },
    HoverToggled {
        should_display: bool,
        position: Option<Point>,
        element_id: String,
        element_type: String,
    },
    RightClicked {
        svg_id: String,
        equipment_id: String,
        equipment_type: String,
        position: Point,
    },
    NextVoltageLevelClicked {
        id: String,
    },
    SwitchClicked(ClickedSwitch),
    FeederClicked(ClickedFeeder),
    BusClicked(ClickedBus),
}

impl RendererEvent {
    /// Callback slot that delivers this event
    pub fn slot(&self) -> CallbackSlot {
        match self {
            Self::NodeMoved(_) => CallbackSlot::MoveNode,
            Self::TextNodeMoved(_) => CallbackSlot::MoveTextNode,
            Self::NodeSelected { .. } => CallbackSlot::SelectNode,
            Self::HoverToggled { .. } => CallbackSlot::ToggleHover,
            Self::RightClicked { .. } => CallbackSlot::RightClick,
            Self::NextVoltageLevelClicked { .. } => CallbackSlot::NextVoltageLevel,
            Self::SwitchClicked(_) => CallbackSlot::Switch,
            Self::FeederClicked(_) => CallbackSlot::Feeder,
            Self::BusClicked(_) => CallbackSlot::Bus,
        }
    }
}

/// Renderer callback slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackSlot {
    MoveNode,
    MoveTextNode,
    SelectNode,
    ToggleHover,
    RightClick,
    NextVoltageLevel,
    Switch,
    Feeder,
    Bus,
}

/// Routes the gestures of one session back to the engine
#[derive(Debug, Clone)]
pub struct CallbackSink {
    session_id: SessionId,
    tx: mpsc::UnboundedSender<Message>,
}

impl CallbackSink {
    pub fn new(session_id: SessionId, tx: mpsc::UnboundedSender<Message>) -> Self {
        Self { session_id, tx }
    }

    pub fn emit(&self, event: RendererEvent) {
        if self
            .tx
            .send(Message::Renderer {
                session_id: self.session_id,
                event,
            })
            .is_err()
        {
            debug!("Engine gone, dropping renderer event");
        }
    }
}

/// Callback configuration of a session
#[derive(Debug, Clone, Default)]
pub struct RendererCallbacks {
    pub on_move_node: Option<CallbackSink>,
    pub on_move_text_node: Option<CallbackSink>,
    pub on_select_node: Option<CallbackSink>,
    pub on_toggle_hover: Option<CallbackSink>,
    pub on_right_click: Option<CallbackSink>,
    pub on_next_voltage_level: Option<CallbackSink>,
    pub on_switch: Option<CallbackSink>,
    pub on_feeder: Option<CallbackSink>,
    pub on_bus: Option<CallbackSink>,
}

impl RendererCallbacks {
    pub fn slot(&self, slot: CallbackSlot) -> Option<&CallbackSink> {
        match slot {
            CallbackSlot::MoveNode => self.on_move_node.as_ref(),
            CallbackSlot::MoveTextNode => self.on_move_text_node.as_ref(),
            CallbackSlot::SelectNode => self.on_select_node.as_ref(),
            CallbackSlot::ToggleHover => self.on_toggle_hover.as_ref(),
            CallbackSlot::RightClick => self.on_right_click.as_ref(),
            CallbackSlot::NextVoltageLevel => self.on_next_voltage_level.as_ref(),
            CallbackSlot::Switch => self.on_switch.as_ref(),
            CallbackSlot::Feeder => self.on_feeder.as_ref(),
            CallbackSlot::Bus => self.on_bus.as_ref(),
        }
    }

    pub fn is_enabled(&self, slot: CallbackSlot) -> bool {
        self.slot(slot).is_some()
    }

    pub fn enabled_slots(&self) -> Vec<CallbackSlot> {
        [
            CallbackSlot::MoveNode,
            CallbackSlot::MoveTextNode,
            CallbackSlot::SelectNode,
            CallbackSlot::ToggleHover,
            CallbackSlot::RightClick,
            CallbackSlot::NextVoltageLevel,
            CallbackSlot::Switch,
            CallbackSlot::Feeder,
            CallbackSlot::Bus,
        ]
        .into_iter()
        .filter(|slot| self.is_enabled(*slot))
        .collect()
    }

    /// Deliver `event` through its slot. Returns false if the slot is empty.
    pub fn dispatch(&self, event: RendererEvent) -> bool {
        match self.slot(event.slot()) {
            Some(sink) => {
                sink.emit(event);
                true
            }
            None => false,
        }
    }
}

/// Everything the renderer needs to build one session
#[derive(Debug, Clone)]
pub struct SessionSpec {
    pub session_id: SessionId,
    pub kind: DiagramKind,
    pub markup: String,
    pub metadata: Option<DiagramMetadata>,
    /// Viewport to restore instead of the default framing
    pub initial_viewbox: Option<ViewBox>,
    pub invalid_lf: bool,
    pub grayout: bool,
    pub options: ViewerOptions,
    pub callbacks: RendererCallbacks,
}

/// One mounted diagram instance
pub trait RenderSession: Send {
    fn id(&self) -> SessionId;

    /// Markup as currently shown, including pan/zoom and user edits
    fn current_markup(&self) -> String;

    /// Viewport as currently shown
    fn viewbox(&self) -> Option<ViewBox>;

    /// Live metadata serialized by the renderer, if it has any
    fn metadata_snapshot(&self) -> Option<String>;

    fn set_branch_states(&mut self, states: &[BranchState]);

    /// Page position of the surface, for pointer coordinate conversion
    fn surface_origin(&self) -> Point;
}

/// Factory and container of render sessions
pub trait DiagramRenderer: Send {
    type Session: RenderSession;

    fn create_session(&mut self, spec: SessionSpec) -> Self::Session;

    /// Insert the session's surface into the widget container
    fn attach(&mut self, session: &Self::Session);

    /// Remove the session's surface and release it
    fn detach(&mut self, session: Self::Session);
}
