//! Network map widget state
//!
//! Owns the parsed equipments and positions, the centring target, the
//! nominal-voltage filter and the open voltage-level choice. Host field
//! changes arrive through [`NetworkMapController::on_field_changed`], user
//! gestures through [`NetworkMapController::handle_event`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::equipments::{GeoData, MapEquipments};
use super::voltage_level_choice::VoltageLevelChoice;
use crate::config::MapSettings;
use crate::interaction::InteractionBridge;
use crate::state_store::{HostTransport, StateStore};
use gridwidget_core::prelude::*;
use gridwidget_core::{fields, Point};

const CENTERED_KEY: &str = "centered";
const SUBSTATION_ID_KEY: &str = "subId";

/// Gestures coming from the map renderer and its overlays
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapEvent {
    /// Click on a substation with a single voltage level
    VoltageLevelClicked { voltage_level_id: String },
    /// Click on a substation with several voltage levels
    SubstationClicked { substation_id: String, position: Point },
    /// Entry picked in the voltage level choice
    VoltageLevelChosen { voltage_level_id: String },
    ChoiceClosed,
    NominalVoltageToggled { nominal_v: f64 },
}

/// Options handed to the map renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapViewOptions {
    pub initial_zoom: u32,
    pub labels_zoom_threshold: u32,
    pub arrows_zoom_threshold: u32,
    pub use_name: bool,
    pub filtered_nominal_voltages: Vec<f64>,
}

/// Nominal voltages currently displayed on the map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NominalVoltageFilter {
    selected: Vec<f64>,
}

impl NominalVoltageFilter {
    pub fn new(selected: Vec<f64>) -> Self {
        Self { selected }
    }

    pub fn is_shown(&self, nominal_v: f64) -> bool {
        self.selected.contains(&nominal_v)
    }

    /// Show a hidden voltage or hide a shown one
    pub fn toggle(&mut self, nominal_v: f64) {
        if let Some(pos) = self.selected.iter().position(|v| *v == nominal_v) {
            self.selected.remove(pos);
        } else {
            self.selected.push(nominal_v);
            self.selected.sort_by(|a, b| b.total_cmp(a));
        }
    }

    pub fn selected(&self) -> &[f64] {
        &self.selected
    }
}

#[derive(Debug, Default)]
pub struct NetworkMapController {
    settings: MapSettings,
    equipments: MapEquipments,
    geo: GeoData,
    filter: NominalVoltageFilter,
    center_on: Option<String>,
    choice: Option<VoltageLevelChoice>,
    bridge: InteractionBridge,
}

impl NetworkMapController {
    pub fn new(settings: MapSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Load everything from the store, as on first display
    pub fn load<T: HostTransport>(&mut self, store: &mut StateStore<T>) -> Result<()> {
        self.reload_equipments(store)?;
        self.reload_filter(store);
        self.apply_params(store);
        Ok(())
    }

    /// React to a host-side field change
    pub fn on_field_changed<T: HostTransport>(
        &mut self,
        store: &mut StateStore<T>,
        field: &str,
    ) -> Result<()> {
        match field {
            fields::SUBSTATION_MAP
            | fields::LINE_MAP
            | fields::TIE_LINE_MAP
            | fields::HVDC_LINE_MAP
            | fields::SUBSTATION_POSITIONS
            | fields::LINE_POSITIONS => {
                self.reload_equipments(store)?;
                if self.explicit_nvls(store).is_none() {
                    self.reload_filter(store);
                }
            }
            fields::NVLS => self.reload_filter(store),
            fields::PARAMS => self.apply_params(store),
            other => trace!("Map ignores change of '{}'", other),
        }
        Ok(())
    }

    pub fn handle_event<T: HostTransport>(&mut self, store: &mut StateStore<T>, event: MapEvent) {
        match event {
            MapEvent::VoltageLevelClicked { voltage_level_id } => {
                self.bridge.select_voltage_level(store, &voltage_level_id);
            }
            MapEvent::SubstationClicked {
                substation_id,
                position,
            } => self.choose_voltage_level_for_substation(store, &substation_id, position),
            MapEvent::VoltageLevelChosen { voltage_level_id } => {
                self.voltage_level_chosen(store, &voltage_level_id)
            }
            MapEvent::ChoiceClosed => self.close_choice(),
            MapEvent::NominalVoltageToggled { nominal_v } => self.filter.toggle(nominal_v),
        }
    }

    /// Open the voltage level choice for a substation
    pub fn choose_voltage_level_for_substation<T: HostTransport>(
        &mut self,
        store: &StateStore<T>,
        substation_id: &str,
        position: Point,
    ) {
        let Some(substation) = self.equipments.substation(substation_id) else {
            warn!("Voltage level choice for unknown substation '{}'", substation_id);
            return;
        };
        let use_name = store.get_bool(fields::USE_NAME);
        debug!("Voltage level choice opened for '{}'", substation_id);
        self.choice = Some(VoltageLevelChoice::for_substation(
            substation, position, use_name,
        ));
    }

    /// Close the choice, then propagate the picked voltage level
    pub fn voltage_level_chosen<T: HostTransport>(
        &mut self,
        store: &mut StateStore<T>,
        voltage_level_id: &str,
    ) {
        self.close_choice();
        self.bridge.select_voltage_level(store, voltage_level_id);
    }

    pub fn close_choice(&mut self) {
        if self.choice.take().is_some() {
            debug!("Voltage level choice closed");
        }
    }

    pub fn choice(&self) -> Option<&VoltageLevelChoice> {
        self.choice.as_ref()
    }

    pub fn equipments(&self) -> &MapEquipments {
        &self.equipments
    }

    pub fn geo_data(&self) -> &GeoData {
        &self.geo
    }

    pub fn filter(&self) -> &NominalVoltageFilter {
        &self.filter
    }

    /// Substation the map should centre on, if the host asked for one
    pub fn center_on(&self) -> Option<&str> {
        self.center_on.as_deref()
    }

    pub fn view_options<T: HostTransport>(&self, store: &StateStore<T>) -> MapViewOptions {
        MapViewOptions {
            initial_zoom: self.settings.initial_zoom,
            labels_zoom_threshold: self.settings.labels_zoom_threshold,
            arrows_zoom_threshold: self.settings.arrows_zoom_threshold,
            use_name: store.get_bool(fields::USE_NAME),
            filtered_nominal_voltages: self.filter.selected().to_vec(),
        }
    }

    fn reload_equipments<T: HostTransport>(&mut self, store: &StateStore<T>) -> Result<()> {
        let text = |field: &str| store.get(field).and_then(Value::as_str).unwrap_or("");

        self.equipments = MapEquipments::from_json(
            text(fields::SUBSTATION_MAP),
            text(fields::LINE_MAP),
            text(fields::TIE_LINE_MAP),
            text(fields::HVDC_LINE_MAP),
        )?;
        self.geo = GeoData::from_json(
            text(fields::SUBSTATION_POSITIONS),
            text(fields::LINE_POSITIONS),
        )?;

        if let Some(choice) = &self.choice {
            if self.equipments.substation(&choice.substation_id).is_none() {
                self.choice = None;
            }
        }
        Ok(())
    }

    /// Non-empty `nvls` list set by the host
    fn explicit_nvls<T: HostTransport>(&self, store: &StateStore<T>) -> Option<Vec<f64>> {
        store
            .get_as::<Vec<f64>>(fields::NVLS)
            .filter(|nvls| !nvls.is_empty())
    }

    /// Filter from `nvls`; every known nominal voltage when absent or empty
    fn reload_filter<T: HostTransport>(&mut self, store: &StateStore<T>) {
        let selected = self
            .explicit_nvls(store)
            .unwrap_or_else(|| self.equipments.nominal_voltages().to_vec());
        self.filter = NominalVoltageFilter::new(selected);
    }

    /// One-shot centring: consume `subId` and mark `params` as centred
    fn apply_params<T: HostTransport>(&mut self, store: &mut StateStore<T>) {
        let Some(Value::Object(params)) = store.get(fields::PARAMS).cloned() else {
            return;
        };
        if params.contains_key(CENTERED_KEY) {
            return;
        }

        self.center_on = params
            .get(SUBSTATION_ID_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);
        debug!("Centering map on {:?}", self.center_on);

        let mut params = params;
        params.insert(CENTERED_KEY.to_string(), Value::Bool(true));
        store.set(fields::PARAMS, Value::Object(params));
        store.persist();
    }
}
