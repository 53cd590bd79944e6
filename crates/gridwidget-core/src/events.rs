//! Notifications exchanged with the host besides field synchronization
//!
//! Outbound: every interaction that writes an output field is followed by a
//! named event (`{"event": "select_node"}`) so the host can react without
//! diffing state. Inbound: the host may push tagged custom messages.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};

/// Named notification sent to the host after an output field write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundEvent {
    SelectNode,
    SelectMenu,
    MoveNode,
    MoveTextNode,
    ClickNextVl,
    ClickSwitch,
    ClickFeeder,
    ClickBus,
    SelectVl,
}

impl OutboundEvent {
    /// Event name as seen by the host
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectNode => "select_node",
            Self::SelectMenu => "select_menu",
            Self::MoveNode => "move_node",
            Self::MoveTextNode => "move_text_node",
            Self::ClickNextVl => "click_nextvl",
            Self::ClickSwitch => "click_switch",
            Self::ClickFeeder => "click_feeder",
            Self::ClickBus => "click_bus",
            Self::SelectVl => "select_vl",
        }
    }

    /// Message content carried over the custom message channel
    pub fn content(&self) -> Value {
        json!({ "event": self.name() })
    }
}

/// Custom message pushed by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CustomMessage {
    /// Ask the widget to echo the live metadata of the mounted diagram
    #[serde(rename = "triggerRetrieveMetadata")]
    TriggerRetrieveMetadata,
}

impl CustomMessage {
    /// Decode a host message; unknown types are a protocol error
    pub fn from_value(content: &Value) -> Result<Self> {
        serde_json::from_value(content.clone())
            .map_err(|e| Error::protocol(format!("unsupported custom message {content}: {e}")))
    }
}
