//! Host-synchronized widget state
//!
//! [`StateStore`] holds the widget's field record and mirrors it to the host
//! through a [`HostTransport`]. Local writes are staged by [`StateStore::set`]
//! and delivered as one ordered batch by [`StateStore::persist`], so an echo
//! field and its real counterpart always reach the host together.
//!
//! Host-side changes enter through [`StateStore::apply_host_update`], which
//! notifies the handlers registered with [`StateStore::on_change`] only when
//! the value actually differs. That is the change-detection rule the
//! clear-then-set echo rewrite works around.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use gridwidget_core::prelude::*;
use gridwidget_core::OutboundEvent;

/// A single staged field write
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldWrite {
    pub field: String,
    pub value: Value,
}

/// Delivery side of the host channel.
///
/// Neither method reports failure: reaching the host is the transport's
/// concern, and the widget keeps running whatever happens to a write.
pub trait HostTransport: Send {
    /// Deliver one persisted batch of writes, in the order they were made
    fn sync(&mut self, writes: Vec<FieldWrite>);

    /// Fire-and-forget custom message
    fn send(&mut self, content: Value);
}

/// Handler invoked with the new value of a field changed by the host
pub type ChangeHandler = Box<dyn FnMut(&Value) + Send>;

/// Handler invoked with the content of a host-pushed custom message
pub type MessageHandler = Box<dyn FnMut(&Value) + Send>;

/// Typed state container synchronized with the host
pub struct StateStore<T> {
    values: Map<String, Value>,
    staged: Vec<FieldWrite>,
    transport: T,
    change_handlers: HashMap<String, Vec<ChangeHandler>>,
    message_handlers: Vec<MessageHandler>,
}

impl<T: fmt::Debug> fmt::Debug for StateStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("values", &self.values)
            .field("staged", &self.staged)
            .field("transport", &self.transport)
            .field("watched_fields", &self.change_handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: HostTransport> StateStore<T> {
    /// Create an empty store
    pub fn new(transport: T) -> Self {
        Self::with_values(transport, Map::new())
    }

    /// Create a store seeded with the host's initial record
    pub fn with_values(transport: T, values: Map<String, Value>) -> Self {
        Self {
            values,
            staged: Vec::new(),
            transport,
            change_handlers: HashMap::new(),
            message_handlers: Vec::new(),
        }
    }

    /// Current value of a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Decode a field; missing or malformed values yield `None`
    pub fn get_as<D: DeserializeOwned>(&self, field: &str) -> Option<D> {
        let value = self.values.get(field)?;
        if value.is_null() {
            return None;
        }
        match serde_json::from_value(value.clone()) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Ignoring malformed field '{}': {}", field, e);
                None
            }
        }
    }

    /// Boolean toggle, `false` when missing
    pub fn get_bool(&self, field: &str) -> bool {
        self.values
            .get(field)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Write a field locally and stage it for the next [`persist`](Self::persist)
    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        let value = value.into();
        self.values.insert(field.to_string(), value.clone());
        self.staged.push(FieldWrite {
            field: field.to_string(),
            value,
        });
    }

    /// Write a structured record
    pub fn set_record<S: Serialize + ?Sized>(&mut self, field: &str, record: &S) {
        match serde_json::to_value(record) {
            Ok(value) => self.set(field, value),
            Err(e) => error!("Failed to serialize record for '{}': {}", field, e),
        }
    }

    /// Flush staged writes to the host as one batch
    pub fn persist(&mut self) {
        if self.staged.is_empty() {
            return;
        }
        let writes = std::mem::take(&mut self.staged);
        debug!("Persisting {} field write(s)", writes.len());
        self.transport.sync(writes);
    }

    /// Check if writes are waiting for [`persist`](Self::persist)
    pub fn has_staged(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Send a named outbound event
    pub fn send(&mut self, event: OutboundEvent) {
        self.send_content(event.content());
    }

    /// Send arbitrary message content
    pub fn send_content(&mut self, content: Value) {
        self.transport.send(content);
    }

    /// Register a handler for host-side changes of `field`
    pub fn on_change(&mut self, field: &str, handler: impl FnMut(&Value) + Send + 'static) {
        self.change_handlers
            .entry(field.to_string())
            .or_default()
            .push(Box::new(handler));
    }

    /// Register a handler for host-pushed custom messages
    pub fn on_message(&mut self, handler: impl FnMut(&Value) + Send + 'static) {
        self.message_handlers.push(Box::new(handler));
    }

    /// Apply a value pushed by the host.
    ///
    /// Returns true if the value changed and handlers were notified.
    pub fn apply_host_update(&mut self, field: &str, value: Value) -> bool {
        if self.values.get(field) == Some(&value) {
            trace!("Host update for '{}' unchanged, not notifying", field);
            return false;
        }
        self.values.insert(field.to_string(), value.clone());
        if let Some(handlers) = self.change_handlers.get_mut(field) {
            for handler in handlers.iter_mut() {
                handler(&value);
            }
        }
        true
    }

    /// Dispatch a custom message pushed by the host
    pub fn receive_message(&mut self, content: &Value) {
        for handler in self.message_handlers.iter_mut() {
            handler(content);
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
