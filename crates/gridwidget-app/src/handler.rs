//! TEA update function for the widget engine

use crate::actions::UpdateAction;
use crate::message::Message;
use crate::render_controller::RenderController;
use crate::renderer::DiagramRenderer;
use crate::state_store::{HostTransport, StateStore};
use gridwidget_core::fields;
use gridwidget_core::prelude::*;

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Optional action for the event loop to perform
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: Message) -> Self {
        Self {
            message: Some(msg),
            action: None,
        }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            message: None,
            action: Some(action),
        }
    }

    fn maybe_action(action: Option<UpdateAction>) -> Self {
        Self {
            message: None,
            action,
        }
    }
}

/// Apply one message to the widget state
pub fn update<R, T>(
    store: &mut StateStore<T>,
    controller: &mut RenderController<R>,
    message: Message,
) -> UpdateResult
where
    R: DiagramRenderer,
    T: HostTransport,
{
    match message {
        Message::HostFieldUpdate { field, value } => {
            store.apply_host_update(&field, value);
            UpdateResult::none()
        }

        Message::HostCustomMessage(content) => {
            store.receive_message(&content);
            UpdateResult::none()
        }

        Message::FieldChanged { field } => {
            match field.as_str() {
                f if controller.kind().payload_fields().contains(&f) => {
                    controller.on_diagram_data_changed(store)
                }
                fields::BRANCH_STATES => controller.apply_branch_states(store),
                other => trace!("No reaction to change of '{}'", other),
            }
            UpdateResult::none()
        }

        Message::RetrieveMetadata => {
            controller.retrieve_metadata(store);
            UpdateResult::none()
        }

        Message::Renderer { session_id, event } => {
            UpdateResult::maybe_action(controller.handle_renderer_event(store, session_id, event))
        }

        Message::MenuItemHovered { index } => {
            controller.menu_item_hovered(index);
            UpdateResult::none()
        }

        Message::MenuItemLeft { index } => {
            controller.menu_item_left(index);
            UpdateResult::none()
        }

        Message::MenuItemClicked { index } => {
            controller.menu_item_clicked(index);
            UpdateResult::none()
        }

        Message::PointerDown { inside_menu } => {
            controller.pointer_down(inside_menu);
            UpdateResult::none()
        }

        Message::Key(key) => {
            if controller.handle_key(&key) {
                trace!("Menu consumed {:?}", key);
            }
            UpdateResult::none()
        }

        Message::MenuListenersArmed { session_id, token } => {
            controller.menu_listeners_armed(session_id, token);
            UpdateResult::none()
        }

        Message::MenuSelected(selection) => {
            controller.menu_selected(store, &selection);
            UpdateResult::none()
        }

        Message::HoverTimerFired {
            session_id,
            request_id,
        } => UpdateResult::maybe_action(controller.hover_timer_fired(session_id, request_id)),

        Message::HoverInfoFetched {
            session_id,
            request_id,
            result,
        } => {
            controller.hover_info_fetched(session_id, request_id, result);
            UpdateResult::none()
        }

        Message::Shutdown => UpdateResult::none(),
    }
}
