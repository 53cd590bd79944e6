//! Configuration file parsing for the grid diagram widgets
//!
//! Supports:
//! - `.gridwidget/config.toml` - Hover, viewer, map and bridge settings

pub mod settings;
pub mod types;

pub use settings::{load_settings, load_settings_file};
pub use types::*;
