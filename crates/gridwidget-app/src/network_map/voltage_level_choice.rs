//! Voltage level choice menu for a clicked substation

use serde::Serialize;

use super::equipments::{name_or_id, Substation};
use gridwidget_core::Point;

/// Colour of a nominal voltage band, as an RGB triple
pub fn nominal_voltage_color(nominal_v: f64) -> [u8; 3] {
    if nominal_v >= 300.0 {
        [255, 0, 0]
    } else if nominal_v >= 170.0 {
        [34, 139, 34]
    } else if nominal_v >= 120.0 {
        [1, 175, 175]
    } else if nominal_v >= 70.0 {
        [204, 85, 0]
    } else if nominal_v >= 50.0 {
        [160, 32, 240]
    } else if nominal_v >= 30.0 {
        [255, 130, 144]
    } else {
        [171, 175, 40]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceEntry {
    pub voltage_level_id: String,
    pub label: String,
    pub nominal_v: f64,
    pub color: [u8; 3],
}

/// Menu listing the voltage levels of one substation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoltageLevelChoice {
    pub substation_id: String,
    pub position: Point,
    pub entries: Vec<ChoiceEntry>,
}

impl VoltageLevelChoice {
    /// Entries sorted by nominal voltage, highest first
    pub fn for_substation(substation: &Substation, position: Point, use_name: bool) -> Self {
        let mut entries: Vec<ChoiceEntry> = substation
            .voltage_levels
            .iter()
            .map(|vl| ChoiceEntry {
                voltage_level_id: vl.id.clone(),
                label: name_or_id(vl, use_name).to_string(),
                nominal_v: vl.nominal_v,
                color: nominal_voltage_color(vl.nominal_v),
            })
            .collect();
        entries.sort_by(|a, b| b.nominal_v.total_cmp(&a.nominal_v));

        Self {
            substation_id: substation.id.clone(),
            position,
            entries,
        }
    }

    pub fn contains(&self, voltage_level_id: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.voltage_level_id == voltage_level_id)
    }
}
