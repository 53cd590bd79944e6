//! Map equipment collections and geographic positions
//!
//! The host ships four equipment payloads (substations, lines, tie lines,
//! HVDC lines) and two position payloads, each as a JSON string field.
//! [`MapEquipments::from_payloads`] builds the indexed collection in one go.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use gridwidget_core::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoltageLevel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub substation_id: Option<String>,
    pub nominal_v: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substation {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub voltage_levels: Vec<VoltageLevel>,
}

/// A line, tie line or HVDC line between two voltage levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapBranch {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub voltage_level_id1: String,
    pub voltage_level_id2: String,
    #[serde(default)]
    pub terminal1_connected: Option<bool>,
    #[serde(default)]
    pub terminal2_connected: Option<bool>,
    /// Flows and currents, passed through to the map renderer
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Anything that has an id and may have a display name
pub trait Named {
    fn id(&self) -> &str;
    fn name(&self) -> Option<&str>;
}

impl Named for VoltageLevel {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Named for Substation {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Named for MapBranch {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Display label: the name when preferred and not blank, the id otherwise
pub fn name_or_id<N: Named>(item: &N, use_name: bool) -> &str {
    match item.name() {
        Some(name) if use_name && !name.trim().is_empty() => name,
        _ => item.id(),
    }
}

/// Indexed map equipments
#[derive(Debug, Clone, Default)]
pub struct MapEquipments {
    substations: Vec<Substation>,
    substation_index: HashMap<String, usize>,
    voltage_level_index: HashMap<String, (usize, usize)>,
    lines: Vec<MapBranch>,
    tie_lines: Vec<MapBranch>,
    hvdc_lines: Vec<MapBranch>,
    nominal_voltages: Vec<f64>,
}

impl MapEquipments {
    pub fn from_payloads(
        substations: Vec<Substation>,
        lines: Vec<MapBranch>,
        tie_lines: Vec<MapBranch>,
        hvdc_lines: Vec<MapBranch>,
    ) -> Self {
        let mut substation_index = HashMap::with_capacity(substations.len());
        let mut voltage_level_index = HashMap::new();
        let mut nominal_voltages: Vec<f64> = Vec::new();

        for (s, substation) in substations.iter().enumerate() {
            substation_index.insert(substation.id.clone(), s);
            for (v, vl) in substation.voltage_levels.iter().enumerate() {
                voltage_level_index.insert(vl.id.clone(), (s, v));
                if !nominal_voltages.contains(&vl.nominal_v) {
                    nominal_voltages.push(vl.nominal_v);
                }
            }
        }
        nominal_voltages.sort_by(|a, b| b.total_cmp(a));

        debug!(
            "Map equipments: {} substations, {} lines, {} tie lines, {} hvdc lines",
            substations.len(),
            lines.len(),
            tie_lines.len(),
            hvdc_lines.len()
        );

        Self {
            substations,
            substation_index,
            voltage_level_index,
            lines,
            tie_lines,
            hvdc_lines,
            nominal_voltages,
        }
    }

    /// Build from the serialized `smap`, `lmap`, `tlmap` and `hlmap` fields.
    ///
    /// An empty string stands for an empty collection.
    pub fn from_json(smap: &str, lmap: &str, tlmap: &str, hlmap: &str) -> Result<Self> {
        Ok(Self::from_payloads(
            parse_collection(smap, "smap")?,
            parse_collection(lmap, "lmap")?,
            parse_collection(tlmap, "tlmap")?,
            parse_collection(hlmap, "hlmap")?,
        ))
    }

    pub fn substations(&self) -> &[Substation] {
        &self.substations
    }

    pub fn lines(&self) -> &[MapBranch] {
        &self.lines
    }

    pub fn tie_lines(&self) -> &[MapBranch] {
        &self.tie_lines
    }

    pub fn hvdc_lines(&self) -> &[MapBranch] {
        &self.hvdc_lines
    }

    pub fn substation(&self, id: &str) -> Option<&Substation> {
        self.substation_index
            .get(id)
            .map(|&index| &self.substations[index])
    }

    pub fn voltage_level(&self, id: &str) -> Option<&VoltageLevel> {
        self.voltage_level_index
            .get(id)
            .map(|&(s, v)| &self.substations[s].voltage_levels[v])
    }

    /// Distinct nominal voltages, highest first
    pub fn nominal_voltages(&self) -> &[f64] {
        &self.nominal_voltages
    }

    pub fn is_empty(&self) -> bool {
        self.substations.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstationPosition {
    pub id: String,
    pub coordinate: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinePosition {
    pub id: String,
    pub coordinates: Vec<Coordinate>,
}

/// Substation and line positions
#[derive(Debug, Clone, Default)]
pub struct GeoData {
    substation_positions: HashMap<String, Coordinate>,
    line_positions: HashMap<String, Vec<Coordinate>>,
}

impl GeoData {
    pub fn new(substations: Vec<SubstationPosition>, lines: Vec<LinePosition>) -> Self {
        Self {
            substation_positions: substations
                .into_iter()
                .map(|p| (p.id, p.coordinate))
                .collect(),
            line_positions: lines.into_iter().map(|p| (p.id, p.coordinates)).collect(),
        }
    }

    /// Build from the serialized `spos` and `lpos` fields
    pub fn from_json(spos: &str, lpos: &str) -> Result<Self> {
        Ok(Self::new(
            parse_collection(spos, "spos")?,
            parse_collection(lpos, "lpos")?,
        ))
    }

    pub fn substation_position(&self, id: &str) -> Option<Coordinate> {
        self.substation_positions.get(id).copied()
    }

    pub fn line_positions(&self, id: &str) -> Option<&[Coordinate]> {
        self.line_positions.get(id).map(Vec::as_slice)
    }

    pub fn substation_count(&self) -> usize {
        self.substation_positions.len()
    }
}

fn parse_collection<T: serde::de::DeserializeOwned>(raw: &str, field: &str) -> Result<Vec<T>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|e| Error::payload(format!("{}: {}", field, e)))
}
