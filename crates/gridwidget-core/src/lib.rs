//! # gridwidget-core - Core Domain Types
//!
//! Foundation crate for the grid diagram widgets. Provides the records
//! exchanged with the host, error handling and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`DiagramPayload`] - Markup, optional metadata and per-render flags
//! - [`DiagramMetadata`] - Lazily parsed structured metadata
//! - [`Point`], [`ViewBox`] - Pointer positions and viewport descriptors
//! - [`SelectedNode`], [`SelectedMenu`], [`MovedNode`], [`MovedTextNode`] -
//!   Network-area interaction outputs
//! - [`ClickedSwitch`], [`ClickedFeeder`], [`ClickedBus`] - Single-line outputs
//! - [`BranchState`] - Per-edge state re-applied after every mount
//!
//! ### Events (`events`)
//! - [`OutboundEvent`] - Named notifications paired with output field writes
//! - [`CustomMessage`] - Tagged messages pushed by the host
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use gridwidget_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod prelude;
pub mod types;

pub use error::{Error, Result, ResultExt};
pub use events::{CustomMessage, OutboundEvent};
pub use types::{
    fields, BranchState, ClickedBus, ClickedFeeder, ClickedSwitch, DiagramMetadata,
    DiagramPayload, MovedNode, MovedTextNode, Point, SelectedMenu, SelectedNode, ViewBox,
    VOLTAGE_LEVEL_TYPE,
};
