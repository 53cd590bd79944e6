//! Host frames read from stdin

use serde::Deserialize;
use serde_json::Value;

use gridwidget_app::network_map::MapEvent;
use gridwidget_app::renderer::{RendererEvent, SessionId};
use gridwidget_app::{InputKey, Message};
use gridwidget_core::prelude::*;
use gridwidget_core::{
    ClickedBus, ClickedFeeder, ClickedSwitch, MovedNode, MovedTextNode, Point, ViewBox,
};

/// One line of host input
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostFrame {
    /// The host changed a synchronized field
    Update { field: String, value: Value },

    /// Custom message pushed by the host
    Custom { content: Value },

    /// Renderer callback fired by the page
    Callback {
        session_id: SessionId,
        #[serde(flatten)]
        callback: CallbackFrame,
    },

    /// The user panned or zoomed the mounted diagram
    Viewport { session_id: SessionId, viewbox: ViewBox },

    /// Page position of the mounted surface changed
    SurfaceMoved { session_id: SessionId, origin: Point },

    /// Renderer re-serialized its live metadata
    LiveMetadata {
        session_id: SessionId,
        metadata: String,
    },

    MenuItemHovered { index: usize },
    MenuItemLeft { index: usize },
    MenuItemClicked { index: usize },
    PointerDown { inside_menu: bool },

    /// DOM `KeyboardEvent.key` value
    Key { key: String },

    /// Reply to an `invoke_request` event
    InvokeResult {
        call_id: u64,
        #[serde(default)]
        result: Option<Value>,
        #[serde(default)]
        error: Option<Value>,
    },

    /// Network map gesture
    Map {
        #[serde(flatten)]
        event: MapEvent,
    },

    Quit,
}

/// Renderer callbacks, named after the renderer's hooks
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "callback", rename_all = "snake_case")]
pub enum CallbackFrame {
    MoveNode(MovedNode),
    MoveTextNode(MovedTextNode),
    SelectNode {
        equipment_id: String,
        node_id: String,
    },
    ToggleHover {
        should_display: bool,
        #[serde(default)]
        position: Option<Point>,
        equipment_id: String,
        equipment_type: String,
    },
    RightClick {
        svg_id: String,
        equipment_id: String,
        equipment_type: String,
        position: Point,
    },
    NextVoltageLevel { id: String },
    Switch(ClickedSwitch),
    Feeder(ClickedFeeder),
    Bus(ClickedBus),
}

impl From<CallbackFrame> for RendererEvent {
    fn from(frame: CallbackFrame) -> Self {
        match frame {
            CallbackFrame::MoveNode(moved) => Self::NodeMoved(moved),
            CallbackFrame::MoveTextNode(moved) => Self::TextNodeMoved(moved),
            CallbackFrame::SelectNode {
                equipment_id,
                node_id,
            } => Self::NodeSelected {
                equipment_id,
                node_id,
            },
            CallbackFrame::ToggleHover {
                should_display,
                position,
                equipment_id,
                equipment_type,
            } => Self::HoverToggled {
                should_display,
                position,
                element_id: equipment_id,
                element_type: equipment_type,
            },
            CallbackFrame::RightClick {
                svg_id,
                equipment_id,
                equipment_type,
                position,
            } => Self::RightClicked {
                svg_id,
                equipment_id,
                equipment_type,
                position,
            },
            CallbackFrame::NextVoltageLevel { id } => Self::NextVoltageLevelClicked { id },
            CallbackFrame::Switch(clicked) => Self::SwitchClicked(clicked),
            CallbackFrame::Feeder(clicked) => Self::FeederClicked(clicked),
            CallbackFrame::Bus(clicked) => Self::BusClicked(clicked),
        }
    }
}

impl HostFrame {
    pub fn parse(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| Error::protocol(format!("bad host frame: {}", e)))
    }

    /// Engine message for this frame, if it maps to one directly
    pub fn into_message(self) -> Option<Message> {
        match self {
            Self::Update { field, value } => Some(Message::HostFieldUpdate { field, value }),
            Self::Custom { content } => Some(Message::HostCustomMessage(content)),
            Self::Callback {
                session_id,
                callback,
            } => Some(Message::Renderer {
                session_id,
                event: callback.into(),
            }),
            Self::MenuItemHovered { index } => Some(Message::MenuItemHovered { index }),
            Self::MenuItemLeft { index } => Some(Message::MenuItemLeft { index }),
            Self::MenuItemClicked { index } => Some(Message::MenuItemClicked { index }),
            Self::PointerDown { inside_menu } => Some(Message::PointerDown { inside_menu }),
            Self::Key { key } => Some(Message::Key(InputKey::from_dom_key(&key))),
            Self::Quit => Some(Message::Shutdown),
            Self::Viewport { .. }
            | Self::SurfaceMoved { .. }
            | Self::LiveMetadata { .. }
            | Self::InvokeResult { .. }
            | Self::Map { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update() {
        let frame =
            HostFrame::parse(r#"{"type":"update","field":"hover_enabled","value":true}"#).unwrap();
        assert_eq!(
            frame,
            HostFrame::Update {
                field: "hover_enabled".into(),
                value: Value::Bool(true)
            }
        );
    }

    #[test]
    fn test_parse_move_node_callback() {
        let frame = HostFrame::parse(
            r#"{"type":"callback","session_id":2,"callback":"move_node",
                "equipment_id":"VL1","node_id":"0","x":1.5,"y":2.5,"x_orig":0.0,"y_orig":0.0}"#,
        )
        .unwrap();

        match frame.into_message() {
            Some(Message::Renderer {
                session_id,
                event: RendererEvent::NodeMoved(moved),
            }) => {
                assert_eq!(session_id, 2);
                assert_eq!(moved.equipment_id, "VL1");
                assert_eq!(moved.x, 1.5);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_hover_callback_without_position() {
        let frame = HostFrame::parse(
            r#"{"type":"callback","session_id":1,"callback":"toggle_hover",
                "should_display":false,"equipment_id":"L1","equipment_type":"LINE"}"#,
        )
        .unwrap();
        match frame.into_message() {
            Some(Message::Renderer {
                event:
                    RendererEvent::HoverToggled {
                        should_display,
                        position,
                        ..
                    },
                ..
            }) => {
                assert!(!should_display);
                assert!(position.is_none());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_key_frame_converts_dom_key() {
        let frame = HostFrame::parse(r#"{"type":"key","key":"ArrowDown"}"#).unwrap();
        assert!(matches!(
            frame.into_message(),
            Some(Message::Key(InputKey::Down))
        ));
    }

    #[test]
    fn test_invoke_result_has_no_message() {
        let frame =
            HostFrame::parse(r#"{"type":"invoke_result","call_id":7,"result":"<b>x</b>"}"#)
                .unwrap();
        assert_eq!(
            frame,
            HostFrame::InvokeResult {
                call_id: 7,
                result: Some(Value::String("<b>x</b>".into())),
                error: None
            }
        );
        assert!(frame.clone().into_message().is_none());
    }

    #[test]
    fn test_map_frame() {
        let frame = HostFrame::parse(
            r#"{"type":"map","kind":"voltage_level_chosen","voltage_level_id":"S1_400"}"#,
        )
        .unwrap();
        assert_eq!(
            frame,
            HostFrame::Map {
                event: MapEvent::VoltageLevelChosen {
                    voltage_level_id: "S1_400".into()
                }
            }
        );
    }

    #[test]
    fn test_bad_frame_is_protocol_error() {
        let err = HostFrame::parse(r#"{"type":"nope"}"#).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }
}
