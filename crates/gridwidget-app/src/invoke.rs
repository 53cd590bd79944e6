//! Host invoke calls and request tracking
//!
//! This module provides:
//! - Call id tracking for matching host replies to pending invokes
//! - Timeout handling for invokes the host never answers
//! - [`InvokeHoverFetcher`], the hover info source backed by the host's
//!   `_get_on_hover_info` handler

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{oneshot, RwLock};

use crate::hover_info::{HoverInfoFetcher, HoverInfoRequest};
use gridwidget_core::prelude::*;

/// Host-side handler answering hover info requests
pub const HOVER_INFO_METHOD: &str = "_get_on_hover_info";

/// An invoke posted to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvokeCall {
    pub call_id: u64,
    pub method: String,
    pub args: Value,
}

/// Outgoing side of the invoke channel
pub trait InvokeChannel: Send + Sync {
    fn post(&self, call: InvokeCall) -> Result<()>;
}

/// A pending invoke awaiting its reply
struct PendingInvoke {
    /// Channel to send the reply
    response_tx: oneshot::Sender<InvokeResponse>,
    /// Description for logging
    description: String,
}

/// Reply from the host
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeResponse {
    pub id: u64,
    pub success: bool,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl InvokeResponse {
    pub fn from_host_reply(id: u64, result: Option<Value>, error: Option<Value>) -> Self {
        Self {
            id,
            success: error.is_none(),
            result,
            error: error.map(|e| match e {
                Value::String(s) => s,
                other => other.to_string(),
            }),
        }
    }

    /// Create an error response
    pub fn error(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            result: None,
            error: Some(message.into()),
        }
    }
}

/// Tracks pending invokes and matches replies
#[derive(Default)]
pub struct RequestTracker {
    /// Map of call id to pending invoke
    pending: RwLock<HashMap<u64, PendingInvoke>>,
    next_id: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending invoke.
    /// Returns (call_id, receiver for the reply)
    pub async fn register(&self, description: &str) -> (u64, oneshot::Receiver<InvokeResponse>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = oneshot::channel();

        let pending = PendingInvoke {
            response_tx: tx,
            description: description.to_string(),
        };

        self.pending.write().await.insert(id, pending);

        (id, rx)
    }

    /// Handle a reply from the host.
    /// Returns true if the reply was matched to a pending invoke
    pub async fn handle_response(&self, id: u64, result: Option<Value>, error: Option<Value>) -> bool {
        if let Some(pending) = self.pending.write().await.remove(&id) {
            trace!("Reply to invoke {} ({})", id, pending.description);
            let _ = pending
                .response_tx
                .send(InvokeResponse::from_host_reply(id, result, error));
            true
        } else {
            debug!("Reply to unknown or expired invoke {}", id);
            false
        }
    }

    /// Drop a pending invoke without answering it
    pub async fn forget(&self, id: u64) {
        self.pending.write().await.remove(&id);
    }

    /// Cancel all pending invokes (e.g., on shutdown)
    pub async fn cancel_all(&self) {
        let mut pending = self.pending.write().await;
        for (id, req) in pending.drain() {
            let _ = req
                .response_tx
                .send(InvokeResponse::error(id, "Invoke cancelled"));
        }
    }

    /// Get the number of pending invokes
    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.len()
    }
}

/// Hover info fetched from the host through an invoke
pub struct InvokeHoverFetcher<C> {
    channel: C,
    tracker: Arc<RequestTracker>,
    timeout: Duration,
}

impl<C: InvokeChannel> InvokeHoverFetcher<C> {
    pub fn new(channel: C, tracker: Arc<RequestTracker>, timeout: Duration) -> Self {
        Self {
            channel,
            tracker,
            timeout,
        }
    }

    pub fn tracker(&self) -> &Arc<RequestTracker> {
        &self.tracker
    }
}

impl<C: InvokeChannel> HoverInfoFetcher for InvokeHoverFetcher<C> {
    async fn fetch_info(&self, request: &HoverInfoRequest) -> Result<String> {
        let (call_id, rx) = self.tracker.register(HOVER_INFO_METHOD).await;
        let call = InvokeCall {
            call_id,
            method: HOVER_INFO_METHOD.to_string(),
            args: serde_json::to_value(request)?,
        };

        if let Err(e) = self.channel.post(call) {
            self.tracker.forget(call_id).await;
            return Err(e);
        }

        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(Error::hover_fetch("invoke dropped before reply")),
            Err(_) => {
                self.tracker.forget(call_id).await;
                return Err(Error::invoke_timeout(
                    HOVER_INFO_METHOD,
                    self.timeout.as_millis() as u64,
                ));
            }
        };

        if !response.success {
            return Err(Error::hover_fetch(
                response.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        match response.result {
            Some(Value::String(content)) => Ok(content),
            None | Some(Value::Null) => Ok(String::new()),
            Some(other) => Err(Error::protocol(format!(
                "{} returned a non-string value: {}",
                HOVER_INFO_METHOD, other
            ))),
        }
    }
}
