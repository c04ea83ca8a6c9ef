//! Escrowed task record and its lifecycle status.

use super::{LedgerError, ParseTaskStatusError, PartyId, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Funds are held in escrow awaiting a decision.
    Pending,
    /// Escrow was released to the worker's balance.
    Approved,
    /// Escrow was returned to the funder's balance.
    Rejected,
    /// Blocked until the external dispute resolver clears it.
    Disputed,
}

impl TaskStatus {
    /// Returns the canonical text representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Disputed => "disputed",
        }
    }

    /// Returns whether escrow has been moved out of the task.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "disputed" => Ok(Self::Disputed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Validated input for opening a new escrowed task.
///
/// Construction enforces the party and amount invariants; authorization and
/// uniqueness are checked by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    id: TaskId,
    amount: u64,
    funder: PartyId,
    worker: PartyId,
    approver: PartyId,
}

impl NewTask {
    /// Validates task creation input.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidParties`] when the funder equals the
    /// worker, or [`LedgerError::InvalidAmount`] when the amount is zero.
    pub fn new(
        id: TaskId,
        amount: u64,
        funder: PartyId,
        worker: PartyId,
        approver: PartyId,
    ) -> Result<Self, LedgerError> {
        if funder == worker {
            return Err(LedgerError::InvalidParties);
        }
        if amount == 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        Ok(Self {
            id,
            amount,
            funder,
            worker,
            approver,
        })
    }

    /// Returns the requested task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the amount to place in escrow.
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.amount
    }

    /// Returns the funder identity.
    #[must_use]
    pub const fn funder(&self) -> &PartyId {
        &self.funder
    }

    /// Returns the worker identity.
    #[must_use]
    pub const fn worker(&self) -> &PartyId {
        &self.worker
    }

    /// Returns the approver identity.
    #[must_use]
    pub const fn approver(&self) -> &PartyId {
        &self.approver
    }
}

/// Escrowed unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    amount: u64,
    funder: PartyId,
    worker: PartyId,
    approver: PartyId,
    status: TaskStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Opens a pending task from validated input.
    #[must_use]
    pub fn open(new_task: NewTask, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: new_task.id,
            amount: new_task.amount,
            funder: new_task.funder,
            worker: new_task.worker,
            approver: new_task.approver,
            status: TaskStatus::Pending,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the escrowed amount; zero once the task is resolved.
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.amount
    }

    /// Returns the funder identity.
    #[must_use]
    pub const fn funder(&self) -> &PartyId {
        &self.funder
    }

    /// Returns the worker identity.
    #[must_use]
    pub const fn worker(&self) -> &PartyId {
        &self.worker
    }

    /// Returns the approver identity.
    #[must_use]
    pub const fn approver(&self) -> &PartyId {
        &self.approver
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether the task still holds funds awaiting a decision.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.status, TaskStatus::Pending) && self.amount > 0
    }

    /// Fails with [`LedgerError::InvalidState`] unless the task is open.
    pub(crate) const fn ensure_open(&self) -> Result<(), LedgerError> {
        if self.is_open() {
            return Ok(());
        }
        Err(LedgerError::InvalidState {
            task_id: self.id,
            status: self.status,
        })
    }

    /// Drains escrow into a final status and returns the drained amount.
    pub(crate) fn finalize(&mut self, status: TaskStatus, clock: &impl Clock) -> u64 {
        let drained = self.amount;
        self.amount = 0;
        self.status = status;
        self.touch(clock);
        drained
    }

    pub(crate) fn set_amount(&mut self, amount: u64, clock: &impl Clock) {
        self.amount = amount;
        self.touch(clock);
    }

    pub(crate) fn set_status(&mut self, status: TaskStatus, clock: &impl Clock) {
        self.status = status;
        self.touch(clock);
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
