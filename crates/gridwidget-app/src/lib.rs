//! gridwidget-app - Widget state synchronization and interaction engine
//!
//! This crate implements the TEA (The Elm Architecture) pattern for the
//! diagram widgets: the host-synchronized state store, render session
//! lifecycle, the debounced hover info pipeline, the context menu state
//! machine, network map state, and settings loading.

pub mod actions;
pub mod config;
pub mod engine;
pub mod handler;
pub mod hover_info;
pub mod input_key;
pub mod interaction;
pub mod invoke;
pub mod message;
pub mod network_map;
pub mod popup_menu;
pub mod render_controller;
pub mod renderer;
pub mod state_store;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

// Re-export primary types
pub use actions::UpdateAction;
pub use config::Settings;
pub use engine::WidgetEngine;
pub use handler::UpdateResult;
pub use hover_info::{HoverInfoFetcher, HoverInfoRequest, HoverInfoService, InfoBox};
pub use input_key::InputKey;
pub use interaction::InteractionBridge;
pub use invoke::{InvokeCall, InvokeChannel, InvokeHoverFetcher, RequestTracker};
pub use message::Message;
pub use network_map::{MapEvent, NetworkMapController};
pub use popup_menu::{MenuSelection, MenuView, PopupMenu};
pub use render_controller::RenderController;
pub use renderer::{
    DiagramKind, DiagramRenderer, RenderSession, RendererCallbacks, RendererEvent, SessionId,
    SessionSpec,
};
pub use state_store::{FieldWrite, HostTransport, StateStore};
