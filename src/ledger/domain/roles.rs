//! Role predicates evaluated before any ledger mutation.
//!
//! Each check is a pure function of the caller identity and the record it
//! acts on, returning [`LedgerError::Unauthorized`] on refusal.

use super::{CreationPolicy, LedgerError, NewTask, PartyId, Side, Task};

/// Checks that `caller` may create `new_task` under `policy`.
///
/// # Errors
///
/// Returns [`LedgerError::Unauthorized`] when the caller is not the manager
/// (manager policy) or not the task's funder (funder policy).
pub fn ensure_creator(
    policy: &CreationPolicy,
    caller: &PartyId,
    new_task: &NewTask,
) -> Result<(), LedgerError> {
    let permitted = match policy {
        CreationPolicy::Manager { manager } => caller == manager,
        CreationPolicy::Funder => caller == new_task.funder(),
    };
    permit(permitted, caller, "create tasks")
}

/// Checks that `caller` is the task's approver.
///
/// # Errors
///
/// Returns [`LedgerError::Unauthorized`] for any other caller.
pub fn ensure_approver(task: &Task, caller: &PartyId) -> Result<(), LedgerError> {
    permit(caller == task.approver(), caller, "resolve this task")
}

/// Resolves which renegotiation side `caller` speaks for.
///
/// # Errors
///
/// Returns [`LedgerError::Unauthorized`] when the caller is neither the
/// funder nor the worker.
pub fn side_of(task: &Task, caller: &PartyId) -> Result<Side, LedgerError> {
    if caller == task.funder() {
        return Ok(Side::Funder);
    }
    if caller == task.worker() {
        return Ok(Side::Worker);
    }
    Err(unauthorized(caller, "renegotiate this task"))
}

/// Checks that `caller` is the configured dispute resolver.
///
/// # Errors
///
/// Returns [`LedgerError::Unauthorized`] when no resolver is configured or
/// the caller is a different party.
pub fn ensure_dispute_resolver(
    resolver: Option<&PartyId>,
    caller: &PartyId,
) -> Result<(), LedgerError> {
    permit(resolver == Some(caller), caller, "change dispute status")
}

fn permit(permitted: bool, caller: &PartyId, action: &'static str) -> Result<(), LedgerError> {
    if permitted {
        Ok(())
    } else {
        Err(unauthorized(caller, action))
    }
}

fn unauthorized(caller: &PartyId, action: &'static str) -> LedgerError {
    LedgerError::Unauthorized {
        caller: caller.clone(),
        action,
    }
}
