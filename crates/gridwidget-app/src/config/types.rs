//! Configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Widget settings (.gridwidget/config.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub hover: HoverSettings,

    #[serde(default)]
    pub viewer: ViewerSettings,

    #[serde(default)]
    pub map: MapSettings,

    #[serde(default)]
    pub bridge: BridgeSettings,
}

/// Hover info popup settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HoverSettings {
    /// Quiet period before the hover info is fetched, in milliseconds
    #[serde(default = "default_hover_debounce_ms")]
    pub debounce_ms: u64,

    /// Horizontal popup offset from the pointer, in pixels
    #[serde(default = "default_popup_offset")]
    pub offset_x: f64,

    /// Vertical popup offset from the pointer, in pixels
    #[serde(default = "default_popup_offset")]
    pub offset_y: f64,

    /// Prefix of the message shown when the fetch fails
    #[serde(default = "default_error_prefix")]
    pub error_prefix: String,
}

impl Default for HoverSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_hover_debounce_ms(),
            offset_x: default_popup_offset(),
            offset_y: default_popup_offset(),
            error_prefix: default_error_prefix(),
        }
    }
}

impl HoverSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_hover_debounce_ms() -> u64 {
    200
}

fn default_popup_offset() -> f64 {
    10.0
}

fn default_error_prefix() -> String {
    "Error retrieving hover info".to_string()
}

/// Size bounds handed to the diagram renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ViewerSize {
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
}

/// Diagram viewer settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ViewerSettings {
    /// Network-area diagram bounds
    #[serde(default = "default_nad_size")]
    pub nad: ViewerSize,

    /// Single-line diagram bounds
    #[serde(default = "default_sld_size")]
    pub sld: ViewerSize,

    /// Show the renderer's zoom/pan buttons
    #[serde(default = "default_true")]
    pub add_buttons: bool,

    /// Colour of the single-line navigation arrows
    #[serde(default = "default_arrows_color")]
    pub arrows_color: String,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            nad: default_nad_size(),
            sld: default_sld_size(),
            add_buttons: true,
            arrows_color: default_arrows_color(),
        }
    }
}

fn default_nad_size() -> ViewerSize {
    ViewerSize {
        min_width: 800,
        min_height: 600,
        max_width: 800,
        max_height: 600,
    }
}

fn default_sld_size() -> ViewerSize {
    ViewerSize {
        min_width: 500,
        min_height: 600,
        max_width: 1000,
        max_height: 1200,
    }
}

fn default_arrows_color() -> String {
    "lightblue".to_string()
}

fn default_true() -> bool {
    true
}

/// Geographic network map settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MapSettings {
    #[serde(default)]
    pub initial_zoom: u32,

    /// Zoom level from which labels are drawn
    #[serde(default = "default_labels_zoom_threshold")]
    pub labels_zoom_threshold: u32,

    /// Zoom level from which flow arrows are drawn
    #[serde(default = "default_arrows_zoom_threshold")]
    pub arrows_zoom_threshold: u32,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            initial_zoom: 0,
            labels_zoom_threshold: default_labels_zoom_threshold(),
            arrows_zoom_threshold: default_arrows_zoom_threshold(),
        }
    }
}

fn default_labels_zoom_threshold() -> u32 {
    9
}

fn default_arrows_zoom_threshold() -> u32 {
    7
}

/// Host bridge settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BridgeSettings {
    /// How long a host invoke may stay unanswered, in milliseconds
    #[serde(default = "default_invoke_timeout_ms")]
    pub invoke_timeout_ms: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            invoke_timeout_ms: default_invoke_timeout_ms(),
        }
    }
}

impl BridgeSettings {
    pub fn invoke_timeout(&self) -> Duration {
        Duration::from_millis(self.invoke_timeout_ms)
    }
}

fn default_invoke_timeout_ms() -> u64 {
    5000
}
