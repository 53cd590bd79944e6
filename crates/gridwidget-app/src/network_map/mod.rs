//! Geographic network map support
//!
//! - [`equipments`] - substations, lines and positions parsed from the host payloads
//! - [`voltage_level_choice`] - per-substation voltage level menu
//! - [`controller`] - map state driven by host fields and map gestures

pub mod controller;
pub mod equipments;
pub mod voltage_level_choice;

pub use controller::{MapEvent, MapViewOptions, NetworkMapController, NominalVoltageFilter};
pub use equipments::{
    name_or_id, Coordinate, GeoData, LinePosition, MapBranch, MapEquipments, Named, Substation,
    SubstationPosition, VoltageLevel,
};
pub use voltage_level_choice::{nominal_voltage_color, ChoiceEntry, VoltageLevelChoice};
