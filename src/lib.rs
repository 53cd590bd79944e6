//! gridwidget host bridge library
//!
//! Hosts a diagram or network map widget without a browser, speaking NDJSON
//! on stdin/stdout.

pub mod headless;

pub use headless::runner::{run_bridge, WidgetMode};
pub use headless::{run_headless, EventWriter, HeadlessEvent, HostFrame};
