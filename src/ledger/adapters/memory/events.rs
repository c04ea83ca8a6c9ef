//! In-memory event sink that records every emitted event.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::ledger::{domain::LedgerEvent, ports::EventSink};

/// Thread-safe recording event sink.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventSink {
    events: Arc<RwLock<Vec<LedgerEvent>>>,
}

impl InMemoryEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns recorded events in emission order.
    ///
    /// A poisoned lock yields whatever was recorded before the panic.
    #[must_use]
    pub fn events(&self) -> Vec<LedgerEvent> {
        match self.events.read() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns recorded event type names in emission order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(LedgerEvent::name).collect()
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn emit(&self, event: &LedgerEvent) {
        match self.events.write() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
