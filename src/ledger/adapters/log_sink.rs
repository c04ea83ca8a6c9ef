//! Event sink that forwards ledger events to `tracing`.

use async_trait::async_trait;
use tracing::info;

use crate::ledger::{domain::LedgerEvent, ports::EventSink};

/// Event sink that writes each event as a structured `tracing` record.
///
/// The full payload is attached as JSON under the `payload` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl TracingEventSink {
    /// Creates a tracing event sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: &LedgerEvent) {
        let payload = serde_json::to_string(event.kind())
            .unwrap_or_else(|err| format!("{{\"serialization_error\":\"{err}\"}}"));
        info!(
            target: "escrow_ledger::events",
            event_id = %event.id(),
            event = event.name(),
            occurred_at = %event.occurred_at(),
            payload = %payload,
            "ledger event"
        );
    }
}
