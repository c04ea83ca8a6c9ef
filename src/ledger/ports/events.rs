//! Event sink port for observing committed ledger transitions.

use crate::ledger::domain::LedgerEvent;
use async_trait::async_trait;

/// Receives ledger events after their transition has committed.
///
/// Events arrive in commit order: the service delivers them while it still
/// holds the ledger lock, and a withdrawal's event follows its completed
/// release. Sinks are purely observational: they cannot fail an operation
/// and must not call back into the service.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers one event.
    async fn emit(&self, event: &LedgerEvent);
}
