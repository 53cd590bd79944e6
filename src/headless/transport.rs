//! Host transport and invoke channel over NDJSON stdout

use serde_json::Value;

use gridwidget_app::invoke::{InvokeCall, InvokeChannel};
use gridwidget_app::{FieldWrite, HostTransport};
use gridwidget_core::prelude::*;

use super::{EventWriter, HeadlessEvent};

/// Writes persisted batches as `state_sync` and messages as `host_message`
#[derive(Debug, Clone)]
pub struct NdjsonTransport {
    writer: EventWriter,
}

impl NdjsonTransport {
    pub fn new(writer: EventWriter) -> Self {
        Self { writer }
    }
}

impl HostTransport for NdjsonTransport {
    fn sync(&mut self, writes: Vec<FieldWrite>) {
        self.writer.emit(&HeadlessEvent::StateSync { writes });
    }

    fn send(&mut self, content: Value) {
        self.writer.emit(&HeadlessEvent::HostMessage { content });
    }
}

/// Posts invokes as `invoke_request` events
#[derive(Debug, Clone)]
pub struct NdjsonInvokeChannel {
    writer: EventWriter,
}

impl NdjsonInvokeChannel {
    pub fn new(writer: EventWriter) -> Self {
        Self { writer }
    }
}

impl InvokeChannel for NdjsonInvokeChannel {
    fn post(&self, call: InvokeCall) -> Result<()> {
        trace!("Posting invoke {} ({})", call.call_id, call.method);
        self.writer.emit(&HeadlessEvent::InvokeRequest { call });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sync_and_send_keep_order() {
        let (writer, buffer) = EventWriter::memory();
        let mut transport = NdjsonTransport::new(writer);

        transport.sync(vec![FieldWrite {
            field: "selected_node".into(),
            value: json!({"equipment_id": "VL1", "node_id": "3"}),
        }]);
        transport.send(json!({"event": "select_node"}));

        let events = buffer.events();
        assert_eq!(buffer.event_names(), vec!["state_sync", "host_message"]);
        assert_eq!(events[0]["writes"][0]["field"], "selected_node");
        assert_eq!(events[1]["content"]["event"], "select_node");
    }

    #[test]
    fn test_invoke_channel_posts_request() {
        let (writer, buffer) = EventWriter::memory();
        let channel = NdjsonInvokeChannel::new(writer);
        channel
            .post(InvokeCall {
                call_id: 1,
                method: "_get_on_hover_info".into(),
                args: json!({"id": "L1", "type": "LINE"}),
            })
            .unwrap();

        let events = buffer.events();
        assert_eq!(events[0]["event"], "invoke_request");
        assert_eq!(events[0]["call_id"], 1);
    }
}
