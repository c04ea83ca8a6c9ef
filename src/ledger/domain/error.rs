//! Error types for escrow ledger transitions and parsing.

use super::{PartyId, Side, TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned when a ledger operation's preconditions do not hold.
///
/// Every variant is raised before any state is mutated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// No task exists with the given identifier.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The caller lacks the role required for this operation.
    #[error("{caller} is not authorized to {action}")]
    Unauthorized {
        /// Identity of the refused caller.
        caller: PartyId,
        /// Operation that was attempted.
        action: &'static str,
    },

    /// The task's status does not permit the operation.
    #[error("task {task_id} is {status}, operation requires a pending unresolved task")]
    InvalidState {
        /// Task identifier.
        task_id: TaskId,
        /// Status observed when the operation was refused.
        status: TaskStatus,
    },

    /// The amount is zero or otherwise unusable for the operation.
    #[error("invalid amount: {0}")]
    InvalidAmount(u64),

    /// A party identity is null, or the funder and worker coincide.
    #[error("funder, worker and approver must be non-null and funder must differ from worker")]
    InvalidParties,

    /// The task identifier is the reserved zero value.
    #[error("task identifier must be non-zero")]
    InvalidTaskId,

    /// A task with the identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTaskId(TaskId),

    /// The party's withdrawable balance does not cover the request.
    #[error("insufficient balance for {party}: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Party attempting the withdrawal.
        party: PartyId,
        /// Requested amount.
        requested: u64,
        /// Balance at the time of the request.
        available: u64,
    },

    /// An update request is already live for the task.
    #[error("an amount update is already proposed for task {0}")]
    UpdateAlreadyProposed(TaskId),

    /// No update request is live for the task.
    #[error("no amount update is proposed for task {0}")]
    NoUpdateProposed(TaskId),

    /// The caller's side has already approved the live update request.
    #[error("the {side} side already approved the update for task {task_id}")]
    AlreadyApprovedBySide {
        /// Task identifier.
        task_id: TaskId,
        /// Side that attempted to approve twice.
        side: Side,
    },

    /// Crediting the party would overflow its balance.
    #[error("balance overflow for {0}")]
    BalanceOverflow(PartyId),
}

/// Error returned while parsing task statuses from text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
