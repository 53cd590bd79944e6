//! Engine - single actor owning the widget state
//!
//! The engine owns the [`StateStore`], the [`RenderController`] and the
//! message channel. Host updates, renderer gestures, menu input, timers and
//! fetch completions all arrive as [`Message`]s and are applied one at a
//! time, so no state needs locking.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::actions::handle_action;
use crate::config::Settings;
use crate::handler;
use crate::hover_info::HoverInfoFetcher;
use crate::message::Message;
use crate::render_controller::RenderController;
use crate::renderer::{DiagramKind, DiagramRenderer};
use crate::state_store::{HostTransport, StateStore};
use gridwidget_core::prelude::*;
use gridwidget_core::{fields, CustomMessage};


pub struct WidgetEngine<R, T, F>
where
    R: DiagramRenderer,
    T: HostTransport,
    F: HoverInfoFetcher + Sync + 'static,
{
    store: StateStore<T>,
    controller: RenderController<R>,
    fetcher: Arc<F>,

    /// Sender half of the message channel.
    /// Clone this to give to input sources (host reader, renderer, timers).
    msg_tx: mpsc::UnboundedSender<Message>,

    /// Receiver half of the message channel
    msg_rx: mpsc::UnboundedReceiver<Message>,

    settings: Settings,
}

impl<R, T, F> WidgetEngine<R, T, F>
where
    R: DiagramRenderer,
    T: HostTransport,
    F: HoverInfoFetcher + Sync + 'static,
{
    /// Create an engine seeded with the host's initial field record.
    ///
    /// Nothing is mounted until [`start`](Self::start).
    pub fn new(
        kind: DiagramKind,
        renderer: R,
        transport: T,
        initial: Map<String, Value>,
        fetcher: F,
        settings: Settings,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();

        let mut store = StateStore::with_values(transport, initial);
        let watched = kind.payload_fields().iter().copied();
        for field in watched.chain([fields::BRANCH_STATES]) {
            let tx = msg_tx.clone();
            store.on_change(field, move |_| {
                let _ = tx.send(Message::FieldChanged {
                    field: field.to_string(),
                });
            });
        }

        let tx = msg_tx.clone();
        store.on_message(move |content| match CustomMessage::from_value(content) {
            Ok(CustomMessage::TriggerRetrieveMetadata) => {
                let _ = tx.send(Message::RetrieveMetadata);
            }
            Err(e) => warn!("Ignoring host message: {}", e),
        });

        let controller = RenderController::new(kind, renderer, settings.clone(), msg_tx.clone());

        Self {
            store,
            controller,
            fetcher: Arc::new(fetcher),
            msg_tx,
            msg_rx,
            settings,
        }
    }

    /// Mount the initial diagram
    pub fn start(&mut self) {
        info!("Starting {} widget", self.controller.kind());
        self.controller.mount_initial(&mut self.store);
    }

    /// Sender for feeding messages into the engine
    pub fn sender(&self) -> mpsc::UnboundedSender<Message> {
        self.msg_tx.clone()
    }

    /// Process a single message through the TEA update cycle.
    ///
    /// Returns false if the message asked the engine to stop.
    pub fn process_message(&mut self, message: Message) -> bool {
        let keep_running = !matches!(message, Message::Shutdown);

        let mut msg = Some(message);
        while let Some(m) = msg {
            let result = handler::update(&mut self.store, &mut self.controller, m);
            if let Some(action) = result.action {
                handle_action(action, self.msg_tx.clone(), self.fetcher.clone());
            }
            msg = result.message;
        }

        keep_running
    }

    /// Drain and process all pending messages without waiting.
    ///
    /// Returns the number of messages processed.
    pub fn drain_pending_messages(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            count += 1;
            if !self.process_message(msg) {
                break;
            }
        }
        count
    }

    /// Wait for the next message and process it.
    ///
    /// Returns false on shutdown.
    pub async fn step(&mut self) -> bool {
        match self.msg_rx.recv().await {
            Some(msg) => self.process_message(msg),
            None => false,
        }
    }

    /// Run until [`Message::Shutdown`]
    pub async fn run(&mut self) {
        while self.step().await {}
        info!("Widget engine stopped");
    }

    pub fn store(&self) -> &StateStore<T> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut StateStore<T> {
        &mut self.store
    }

    pub fn controller(&self) -> &RenderController<R> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut RenderController<R> {
        &mut self.controller
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
