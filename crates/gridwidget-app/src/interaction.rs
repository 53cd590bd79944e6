//! Renderer gestures to host state
//!
//! Every interaction output follows the same three steps, in order: write
//! the record, persist, send the named event. The host therefore always
//! sees the new value before the notification that refers to it.

use serde::Serialize;

use crate::renderer::RendererEvent;
use crate::state_store::{HostTransport, StateStore};
use gridwidget_core::prelude::*;
use gridwidget_core::{
    fields, ClickedBus, ClickedFeeder, ClickedSwitch, MovedNode, MovedTextNode, OutboundEvent,
    SelectedMenu, SelectedNode,
};

/// Writes interaction outputs into a [`StateStore`]
#[derive(Debug, Clone, Copy, Default)]
pub struct InteractionBridge;

impl InteractionBridge {
    pub fn new() -> Self {
        Self
    }

    pub fn select_node<T: HostTransport>(
        &self,
        store: &mut StateStore<T>,
        equipment_id: &str,
        node_id: &str,
    ) {
        let record = SelectedNode {
            equipment_id: equipment_id.to_string(),
            node_id: node_id.to_string(),
        };
        self.emit(store, fields::SELECTED_NODE, &record, OutboundEvent::SelectNode);
    }

    pub fn select_menu<T: HostTransport>(
        &self,
        store: &mut StateStore<T>,
        equipment_id: &str,
        selection: usize,
    ) {
        let record = SelectedMenu {
            equipment_id: equipment_id.to_string(),
            selection,
        };
        self.emit(store, fields::SELECTED_MENU, &record, OutboundEvent::SelectMenu);
    }

    pub fn move_node<T: HostTransport>(&self, store: &mut StateStore<T>, moved: &MovedNode) {
        self.emit(store, fields::MOVED_NODE, moved, OutboundEvent::MoveNode);
    }

    pub fn move_text_node<T: HostTransport>(
        &self,
        store: &mut StateStore<T>,
        moved: &MovedTextNode,
    ) {
        self.emit(store, fields::MOVED_TEXT_NODE, moved, OutboundEvent::MoveTextNode);
    }

    pub fn click_next_voltage_level<T: HostTransport>(&self, store: &mut StateStore<T>, id: &str) {
        self.emit(store, fields::CLICKED_NEXTVL, &id, OutboundEvent::ClickNextVl);
    }

    pub fn click_switch<T: HostTransport>(&self, store: &mut StateStore<T>, clicked: &ClickedSwitch) {
        self.emit(store, fields::CLICKED_SWITCH, clicked, OutboundEvent::ClickSwitch);
    }

    pub fn click_feeder<T: HostTransport>(&self, store: &mut StateStore<T>, clicked: &ClickedFeeder) {
        self.emit(store, fields::CLICKED_FEEDER, clicked, OutboundEvent::ClickFeeder);
    }

    pub fn click_bus<T: HostTransport>(&self, store: &mut StateStore<T>, clicked: &ClickedBus) {
        self.emit(store, fields::CLICKED_BUS, clicked, OutboundEvent::ClickBus);
    }

    /// Voltage level picked on the network map; gated by `enable_callbacks`
    pub fn select_voltage_level<T: HostTransport>(
        &self,
        store: &mut StateStore<T>,
        voltage_level_id: &str,
    ) -> bool {
        if !store.get_bool(fields::ENABLE_CALLBACKS) {
            debug!(
                "Callbacks disabled, not propagating voltage level '{}'",
                voltage_level_id
            );
            return false;
        }
        self.emit(
            store,
            fields::SELECTED_VL,
            &voltage_level_id,
            OutboundEvent::SelectVl,
        );
        true
    }

    /// Apply a write-through renderer event.
    ///
    /// Hover and right-click gestures drive transient UI instead and are
    /// not handled here; returns false for them.
    pub fn handle_event<T: HostTransport>(
        &self,
        store: &mut StateStore<T>,
        event: &RendererEvent,
    ) -> bool {
        match event {
            RendererEvent::NodeMoved(moved) => self.move_node(store, moved),
            RendererEvent::TextNodeMoved(moved) => self.move_text_node(store, moved),
            RendererEvent::NodeSelected {
                equipment_id,
                node_id,
            } => self.select_node(store, equipment_id, node_id),
            RendererEvent::NextVoltageLevelClicked { id } => {
                self.click_next_voltage_level(store, id)
            }
            RendererEvent::SwitchClicked(clicked) => self.click_switch(store, clicked),
            RendererEvent::FeederClicked(clicked) => self.click_feeder(store, clicked),
            RendererEvent::BusClicked(clicked) => self.click_bus(store, clicked),
            RendererEvent::HoverToggled { .. } | RendererEvent::RightClicked { .. } => {
                return false
            }
        }
        true
    }

    fn emit<T: HostTransport, S: Serialize + ?Sized>(
        &self,
        store: &mut StateStore<T>,
        field: &str,
        record: &S,
        event: OutboundEvent,
    ) {
        store.set_record(field, record);
        store.persist();
        store.send(event);
        debug!("{} -> {}", event.name(), field);
    }
}
