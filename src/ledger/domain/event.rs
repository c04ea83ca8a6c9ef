//! Records emitted after committed ledger transitions.

use super::{EventId, PartyId, Side, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// What happened in a committed ledger transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEventKind {
    /// A task was opened with funds in escrow.
    TaskCreated {
        /// Task identifier.
        task_id: TaskId,
        /// Escrowed amount.
        amount: u64,
        /// Funder identity.
        funder: PartyId,
        /// Worker identity.
        worker: PartyId,
        /// Approver identity.
        approver: PartyId,
    },
    /// Escrow moved to the worker's balance.
    TaskApproved {
        /// Task identifier.
        task_id: TaskId,
        /// Credited worker.
        worker: PartyId,
        /// Amount credited.
        amount: u64,
    },
    /// Escrow moved back to the funder's balance.
    TaskRejected {
        /// Task identifier.
        task_id: TaskId,
        /// Credited funder.
        funder: PartyId,
        /// Amount credited.
        amount: u64,
    },
    /// One side proposed a new escrow amount.
    UpdateProposed {
        /// Task identifier.
        task_id: TaskId,
        /// Proposing side.
        proposer: Side,
        /// Proposed amount.
        proposed_amount: u64,
    },
    /// One side approved the live proposal.
    UpdateApproved {
        /// Task identifier.
        task_id: TaskId,
        /// Approving side.
        side: Side,
    },
    /// Both sides approved and the escrowed amount was rewritten.
    TaskAmountUpdated {
        /// Task identifier.
        task_id: TaskId,
        /// Amount before the rewrite.
        previous_amount: u64,
        /// Amount after the rewrite.
        new_amount: u64,
    },
    /// The dispute resolver blocked the task.
    DisputeOpened {
        /// Task identifier.
        task_id: TaskId,
    },
    /// The dispute resolver returned the task to pending.
    DisputeCleared {
        /// Task identifier.
        task_id: TaskId,
    },
    /// A withdrawal was released to its party.
    FundsWithdrawn {
        /// Receiving party.
        party: PartyId,
        /// Amount released.
        amount: u64,
    },
}

/// Timestamped, uniquely identified ledger event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    id: EventId,
    occurred_at: DateTime<Utc>,
    kind: LedgerEventKind,
}

impl LedgerEvent {
    /// Stamps `kind` with a fresh identifier and the current clock time.
    #[must_use]
    pub fn new(kind: LedgerEventKind, clock: &impl Clock) -> Self {
        Self {
            id: EventId::new(),
            occurred_at: clock.utc(),
            kind,
        }
    }

    /// Returns the event identifier.
    #[must_use]
    pub const fn id(&self) -> EventId {
        self.id
    }

    /// Returns when the event was recorded.
    #[must_use]
    pub const fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Returns the event payload.
    #[must_use]
    pub const fn kind(&self) -> &LedgerEventKind {
        &self.kind
    }

    /// Returns the event type name used in logs and serialized payloads.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self.kind {
            LedgerEventKind::TaskCreated { .. } => "task_created",
            LedgerEventKind::TaskApproved { .. } => "task_approved",
            LedgerEventKind::TaskRejected { .. } => "task_rejected",
            LedgerEventKind::UpdateProposed { .. } => "update_proposed",
            LedgerEventKind::UpdateApproved { .. } => "update_approved",
            LedgerEventKind::TaskAmountUpdated { .. } => "task_amount_updated",
            LedgerEventKind::DisputeOpened { .. } => "dispute_opened",
            LedgerEventKind::DisputeCleared { .. } => "dispute_cleared",
            LedgerEventKind::FundsWithdrawn { .. } => "funds_withdrawn",
        }
    }
}
