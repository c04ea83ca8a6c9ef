//! Two-party consent record for renegotiating a pending task's amount.

use super::{LedgerError, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Party side taking part in an amount renegotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The party that funded the escrow.
    Funder,
    /// The party performing the work.
    Worker,
}

impl Side {
    /// Returns the canonical text representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Funder => "funder",
            Self::Worker => "worker",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live proposal to change a pending task's escrowed amount.
///
/// A request exists only while renegotiation is in flight; the ledger drops
/// it the moment both sides have approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    task_id: TaskId,
    proposed_amount: u64,
    funder_approved: bool,
    worker_approved: bool,
}

impl UpdateRequest {
    /// Creates a request pre-approved by the proposing side.
    #[must_use]
    pub const fn propose(task_id: TaskId, proposed_amount: u64, proposer: Side) -> Self {
        Self {
            task_id,
            proposed_amount,
            funder_approved: matches!(proposer, Side::Funder),
            worker_approved: matches!(proposer, Side::Worker),
        }
    }

    /// Returns the task this request belongs to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the proposed amount.
    #[must_use]
    pub const fn proposed_amount(&self) -> u64 {
        self.proposed_amount
    }

    /// Returns whether the given side has approved.
    #[must_use]
    pub const fn approved_by(&self, side: Side) -> bool {
        match side {
            Side::Funder => self.funder_approved,
            Side::Worker => self.worker_approved,
        }
    }

    /// Checks `side`'s approval against the proposer's and returns the
    /// amount both sides now agree to.
    ///
    /// The proposer's side is flagged at proposal time, so the only approval
    /// that can succeed comes from the other side and completes consent.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AlreadyApprovedBySide`] when that side has
    /// already approved.
    pub const fn approve(self, side: Side) -> Result<u64, LedgerError> {
        if self.approved_by(side) {
            return Err(LedgerError::AlreadyApprovedBySide {
                task_id: self.task_id,
                side,
            });
        }
        Ok(self.proposed_amount)
    }
}
