//! Message types for the widget engine (TEA pattern)

use serde_json::Value;

use crate::input_key::InputKey;
use crate::popup_menu::MenuSelection;
use crate::renderer::{RendererEvent, SessionId};

/// Everything the engine reacts to, processed one at a time in arrival order
#[derive(Debug, Clone)]
pub enum Message {
    // ─────────────────────────────────────────────────────────
    // Host
    // ─────────────────────────────────────────────────────────
    /// The host changed a synchronized field
    HostFieldUpdate { field: String, value: Value },

    /// The host pushed a custom message
    HostCustomMessage(Value),

    /// A watched field changed value (queued by the store's change handlers)
    FieldChanged { field: String },

    /// The host asked for the live metadata of the mounted diagram
    RetrieveMetadata,

    // ─────────────────────────────────────────────────────────
    // Renderer
    // ─────────────────────────────────────────────────────────
    /// Gesture reported by a render session
    Renderer {
        session_id: SessionId,
        event: RendererEvent,
    },

    // ─────────────────────────────────────────────────────────
    // Context menu
    // ─────────────────────────────────────────────────────────
    /// Pointer entered a menu item
    MenuItemHovered { index: usize },

    /// Pointer left a menu item
    MenuItemLeft { index: usize },

    /// Menu item clicked
    MenuItemClicked { index: usize },

    /// Pointer pressed anywhere on the page
    PointerDown { inside_menu: bool },

    /// Keyboard event on the page
    Key(InputKey),

    /// Deferred listener registration of a freshly opened menu
    MenuListenersArmed { session_id: SessionId, token: u64 },

    /// The menu reported a chosen item
    MenuSelected(MenuSelection),

    // ─────────────────────────────────────────────────────────
    // Hover info
    // ─────────────────────────────────────────────────────────
    /// Debounce timer elapsed
    HoverTimerFired {
        session_id: SessionId,
        request_id: u64,
    },

    /// Hover info fetch finished
    HoverInfoFetched {
        session_id: SessionId,
        request_id: u64,
        result: Result<String, String>,
    },

    /// Stop the engine loop
    Shutdown,
}
