//! Domain records shared between the widget state, the renderer boundary
//! and the host protocol.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Element type reported by the renderer for voltage level nodes
pub const VOLTAGE_LEVEL_TYPE: &str = "VOLTAGE_LEVEL";

/// Names of the synchronized widget state fields
pub mod fields {
    // Diagram payload
    pub const DIAGRAM_DATA: &str = "diagram_data";
    pub const CURRENT_NAD_METADATA: &str = "current_nad_metadata";
    pub const SLD_MARKUP: &str = "value";
    pub const SLD_METADATA: &str = "value_meta";

    // Feature toggles
    pub const POPUP_MENU_ITEMS: &str = "popup_menu_items";
    pub const HOVER_ENABLED: &str = "hover_enabled";
    pub const ENABLE_CALLBACKS: &str = "enable_callbacks";
    pub const USE_NAME: &str = "use_name";
    pub const BRANCH_STATES: &str = "branch_states";

    // Interaction outputs (network area)
    pub const SELECTED_NODE: &str = "selected_node";
    pub const SELECTED_MENU: &str = "selected_menu";
    pub const MOVED_NODE: &str = "moved_node";
    pub const MOVED_TEXT_NODE: &str = "moved_text_node";

    // Interaction outputs (single line)
    pub const CLICKED_NEXTVL: &str = "clicked_nextvl";
    pub const CLICKED_SWITCH: &str = "clicked_switch";
    pub const CLICKED_FEEDER: &str = "clicked_feeder";
    pub const CLICKED_BUS: &str = "clicked_bus";

    // Network map
    pub const SELECTED_VL: &str = "selected_vl";
    pub const PARAMS: &str = "params";
    pub const NVLS: &str = "nvls";
    pub const SUBSTATION_MAP: &str = "smap";
    pub const LINE_MAP: &str = "lmap";
    pub const TIE_LINE_MAP: &str = "tlmap";
    pub const HVDC_LINE_MAP: &str = "hlmap";
    pub const SUBSTATION_POSITIONS: &str = "spos";
    pub const LINE_POSITIONS: &str = "lpos";
}

// ─────────────────────────────────────────────────────────────────
// Geometry
// ─────────────────────────────────────────────────────────────────

/// A position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by a fixed offset
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Express this page position relative to `origin`
    pub fn relative_to(self, origin: Point) -> Self {
        Self::new(self.x - origin.x, self.y - origin.y)
    }
}

/// Viewport descriptor (pan/zoom framing) of a rendered diagram
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Parse an SVG `viewBox` attribute value ("x y w h", comma or space separated)
    pub fn parse(attr: &str) -> Option<Self> {
        let parts: Vec<f64> = attr
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<std::result::Result<_, _>>()
            .ok()?;
        match parts.as_slice() {
            [x, y, w, h] => Some(Self::new(*x, *y, *w, *h)),
            _ => None,
        }
    }

    /// Format as an SVG `viewBox` attribute value
    pub fn to_attr(&self) -> String {
        format!("{} {} {} {}", self.x, self.y, self.width, self.height)
    }
}

// ─────────────────────────────────────────────────────────────────
// Diagram payload
// ─────────────────────────────────────────────────────────────────

/// Structured diagram metadata, kept opaque for the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramMetadata(pub Value);

impl DiagramMetadata {
    /// Parse the serialized metadata
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map(Self)
            .map_err(|e| Error::metadata(e.to_string()))
    }
}

/// Diagram markup, metadata and per-render flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramPayload {
    #[serde(default)]
    pub svg_data: String,

    /// Serialized metadata; `None` or empty means a non-interactive diagram
    #[serde(default)]
    pub metadata: Option<String>,

    #[serde(default)]
    pub invalid_lf: bool,

    #[serde(default)]
    pub grayout: bool,

    #[serde(default)]
    pub drag_enabled: bool,

    #[serde(default)]
    pub keep_viewbox: bool,
}

impl DiagramPayload {
    /// Decode the payload from its synchronized JSON value
    pub fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone()).map_err(|e| Error::payload(e.to_string()))
    }

    /// Payload of a single-line widget, synced as two string fields
    pub fn from_split_fields(markup: Option<&Value>, metadata: Option<&Value>) -> Result<Self> {
        let text = |field: &str, value: Option<&Value>| match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(Error::payload(format!(
                "{}: expected a string, got {}",
                field, other
            ))),
        };
        Ok(Self {
            svg_data: text(fields::SLD_MARKUP, markup)?.unwrap_or_default(),
            metadata: text(fields::SLD_METADATA, metadata)?,
            ..Default::default()
        })
    }

    /// Raw metadata if present and non-empty
    pub fn raw_metadata(&self) -> Option<&str> {
        self.metadata.as_deref().filter(|m| !m.is_empty())
    }

    /// Parse metadata lazily; malformed metadata is treated as absent
    pub fn parsed_metadata(&self) -> Option<DiagramMetadata> {
        let raw = self.raw_metadata()?;
        match DiagramMetadata::parse(raw) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!("Ignoring diagram metadata: {}", e);
                None
            }
        }
    }
}

/// Per-edge state pushed by the host and applied after every mount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchState {
    pub branch_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value1: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected1: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected2: Option<bool>,

    /// Renderer-specific attributes passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ─────────────────────────────────────────────────────────────────
// Interaction outputs
// ─────────────────────────────────────────────────────────────────

/// Last selected node (`selected_node`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedNode {
    pub equipment_id: String,
    pub node_id: String,
}

/// Last chosen context-menu entry (`selected_menu`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedMenu {
    pub equipment_id: String,
    pub selection: usize,
}

/// Last node drag (`moved_node`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovedNode {
    pub equipment_id: String,
    pub node_id: String,
    pub x: f64,
    pub y: f64,
    pub x_orig: f64,
    pub y_orig: f64,
}

/// Last label drag (`moved_text_node`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovedTextNode {
    pub equipment_id: String,
    pub node_id: String,
    pub text_node_id: String,
    pub shift_x: f64,
    pub shift_y: f64,
    pub shift_x_orig: f64,
    pub shift_y_orig: f64,
    pub connection_shift_x: f64,
    pub connection_shift_y: f64,
    pub connection_shift_x_orig: f64,
    pub connection_shift_y_orig: f64,
}

/// Switch clicked in a single-line diagram (`clicked_switch`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickedSwitch {
    pub id: String,
    pub switch_status: bool,
}

/// Feeder clicked in a single-line diagram (`clicked_feeder`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickedFeeder {
    pub id: String,
    #[serde(rename = "feederType")]
    pub feeder_type: Option<String>,
}

/// Bus clicked in a single-line diagram (`clicked_bus`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickedBus {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_point_relative_to_origin() {
        let p = Point::new(110.0, 220.0).relative_to(Point::new(100.0, 200.0));
        assert_eq!(p, Point::new(10.0, 20.0));
        assert_eq!(p.offset(10.0, 10.0), Point::new(20.0, 30.0));
    }

    #[test]
    fn test_viewbox_parse() {
        assert_eq!(
            ViewBox::parse("0 -10.5 800 600"),
            Some(ViewBox::new(0.0, -10.5, 800.0, 600.0))
        );
        assert_eq!(
            ViewBox::parse("1,2, 3,4"),
            Some(ViewBox::new(1.0, 2.0, 3.0, 4.0))
        );
        assert_eq!(ViewBox::parse("1 2 3"), None);
        assert_eq!(ViewBox::parse("a b c d"), None);
    }

    #[test]
    fn test_payload_defaults() {
        let payload = DiagramPayload::from_value(&json!({"svg_data": "<svg/>"})).unwrap();
        assert_eq!(payload.svg_data, "<svg/>");
        assert!(payload.metadata.is_none());
        assert!(!payload.keep_viewbox);
        assert!(!payload.drag_enabled);

        let empty = DiagramPayload::from_value(&Value::Null).unwrap();
        assert_eq!(empty, DiagramPayload::default());
    }

    #[test]
    fn test_payload_rejects_wrong_types() {
        let err = DiagramPayload::from_value(&json!({"svg_data": 12})).unwrap_err();
        assert!(matches!(err, Error::Payload { .. }));
    }

    #[test]
    fn test_split_fields_payload() {
        let payload =
            DiagramPayload::from_split_fields(Some(&json!("<svg/>")), Some(&json!("{}"))).unwrap();
        assert_eq!(payload.svg_data, "<svg/>");
        assert_eq!(payload.raw_metadata(), Some("{}"));

        let bare = DiagramPayload::from_split_fields(None, Some(&Value::Null)).unwrap();
        assert_eq!(bare, DiagramPayload::default());

        let err = DiagramPayload::from_split_fields(Some(&json!(3)), None).unwrap_err();
        assert!(matches!(err, Error::Payload { .. }));
    }

    #[test]
    fn test_malformed_metadata_is_absent() {
        let payload = DiagramPayload {
            svg_data: "<svg/>".into(),
            metadata: Some("{oops".into()),
            ..Default::default()
        };
        assert_eq!(payload.raw_metadata(), Some("{oops"));
        assert!(payload.parsed_metadata().is_none());
    }

    #[test]
    fn test_empty_metadata_is_absent() {
        let payload = DiagramPayload {
            metadata: Some(String::new()),
            ..Default::default()
        };
        assert!(payload.raw_metadata().is_none());
        assert!(payload.parsed_metadata().is_none());
    }

    #[test]
    fn test_moved_text_node_field_names() {
        let record = MovedTextNode {
            equipment_id: "VL1".into(),
            node_id: "0".into(),
            text_node_id: "0-textnode".into(),
            shift_x: 1.0,
            shift_y: 2.0,
            shift_x_orig: 0.0,
            shift_y_orig: 0.0,
            connection_shift_x: 3.0,
            connection_shift_y: 4.0,
            connection_shift_x_orig: 0.0,
            connection_shift_y_orig: 0.0,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["text_node_id"], "0-textnode");
        assert_eq!(value["connection_shift_y"], 4.0);
    }

    #[test]
    fn test_feeder_type_is_camel_case() {
        let value = serde_json::to_value(ClickedFeeder {
            id: "L1".into(),
            feeder_type: Some("LINE".into()),
        })
        .unwrap();
        assert_eq!(value, json!({"id": "L1", "feederType": "LINE"}));
    }

    #[test]
    fn test_branch_state_keeps_extra_attributes() {
        let state: BranchState = serde_json::from_value(json!({
            "branchId": "L1",
            "value1": 12.5,
            "connected1": true,
            "connectedBus1": "B1"
        }))
        .unwrap();
        assert_eq!(state.branch_id, "L1");
        assert_eq!(state.connected1, Some(true));
        assert_eq!(state.extra["connectedBus1"], "B1");
    }
}
