//! Ledger aggregate owning tasks, party balances and update requests.

use super::{
    CreationPolicy, FailedRelease, LedgerError, LedgerEventKind, NewTask, PartyId, Side,
    Task, TaskId, TaskStatus, UpdateRequest, roles,
};
use mockable::Clock;
use std::collections::HashMap;

/// Single owned aggregate holding all escrow state.
///
/// Every mutating method validates its preconditions first and only then
/// writes, so a returned error always leaves the ledger untouched.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    tasks: HashMap<TaskId, Task>,
    balances: HashMap<PartyId, u64>,
    update_requests: HashMap<TaskId, UpdateRequest>,
    failed_releases: Vec<FailedRelease>,
}

/// Validated plan for the approval that completes a live update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateApproval {
    task_id: TaskId,
    side: Side,
    proposed_amount: u64,
    funder: PartyId,
    current_amount: u64,
}

impl UpdateApproval {
    /// Returns the approving side.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Returns the amount both sides agreed to.
    #[must_use]
    pub const fn proposed_amount(&self) -> u64 {
        self.proposed_amount
    }

    /// Returns the funder and the amount that must enter escrow before an
    /// agreed increase can be applied.
    #[must_use]
    pub fn top_up(&self) -> Option<(&PartyId, u64)> {
        self.proposed_amount
            .checked_sub(self.current_amount)
            .filter(|difference| *difference > 0)
            .map(|difference| (&self.funder, difference))
    }
}

#[derive(Debug, Clone, Copy)]
enum Resolution {
    Approve,
    Reject,
}

impl Ledger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the task with the given identifier.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Returns the party's withdrawable balance; zero when never credited.
    #[must_use]
    pub fn balance_of(&self, party: &PartyId) -> u64 {
        self.balances.get(party).copied().unwrap_or_default()
    }

    /// Returns the live update request for a task.
    #[must_use]
    pub fn update_request(&self, id: TaskId) -> Option<&UpdateRequest> {
        self.update_requests.get(&id)
    }

    /// Returns recorded release failures awaiting reconciliation.
    #[must_use]
    pub fn failed_releases(&self) -> &[FailedRelease] {
        &self.failed_releases
    }

    /// Sums the escrow still held by tasks.
    #[must_use]
    pub fn total_escrowed(&self) -> u128 {
        self.tasks.values().map(|task| u128::from(task.amount())).sum()
    }

    /// Sums every party's withdrawable balance.
    #[must_use]
    pub fn total_balances(&self) -> u128 {
        self.balances.values().copied().map(u128::from).sum()
    }

    /// Checks authorization and uniqueness for a task about to be funded.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unauthorized`] when `caller` may not create the
    /// task, or [`LedgerError::DuplicateTaskId`] when the identifier is taken.
    pub fn ensure_can_create(
        &self,
        new_task: &NewTask,
        caller: &PartyId,
        policy: &CreationPolicy,
    ) -> Result<(), LedgerError> {
        roles::ensure_creator(policy, caller, new_task)?;
        self.ensure_unused(new_task.id())
    }

    /// Inserts a funded task in the pending state.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateTaskId`] when the identifier is taken.
    pub fn open_task(
        &mut self,
        new_task: NewTask,
        clock: &impl Clock,
    ) -> Result<(Task, LedgerEventKind), LedgerError> {
        self.ensure_unused(new_task.id())?;
        let task = Task::open(new_task, clock);
        let event = LedgerEventKind::TaskCreated {
            task_id: task.id(),
            amount: task.amount(),
            funder: task.funder().clone(),
            worker: task.worker().clone(),
            approver: task.approver().clone(),
        };
        self.tasks.insert(task.id(), task.clone());
        Ok((task, event))
    }

    /// Releases a task's escrow to the worker's balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::TaskNotFound`], [`LedgerError::Unauthorized`]
    /// when `caller` is not the approver, or [`LedgerError::InvalidState`]
    /// when the task is not pending or was already resolved.
    pub fn approve_task(
        &mut self,
        id: TaskId,
        caller: &PartyId,
        clock: &impl Clock,
    ) -> Result<LedgerEventKind, LedgerError> {
        self.resolve(id, caller, Resolution::Approve, clock)
    }

    /// Returns a task's escrow to the funder's balance.
    ///
    /// # Errors
    ///
    /// Same as [`Ledger::approve_task`].
    pub fn reject_task(
        &mut self,
        id: TaskId,
        caller: &PartyId,
        clock: &impl Clock,
    ) -> Result<LedgerEventKind, LedgerError> {
        self.resolve(id, caller, Resolution::Reject, clock)
    }

    fn resolve(
        &mut self,
        id: TaskId,
        caller: &PartyId,
        resolution: Resolution,
        clock: &impl Clock,
    ) -> Result<LedgerEventKind, LedgerError> {
        let task = self.find(id)?;
        roles::ensure_approver(task, caller)?;
        task.ensure_open()?;

        let (beneficiary, status) = match resolution {
            Resolution::Approve => (task.worker().clone(), TaskStatus::Approved),
            Resolution::Reject => (task.funder().clone(), TaskStatus::Rejected),
        };
        let credited = self.checked_credit(&beneficiary, task.amount())?;

        let amount = self.find_mut(id)?.finalize(status, clock);
        self.balances.insert(beneficiary.clone(), credited);
        self.update_requests.remove(&id);

        Ok(match resolution {
            Resolution::Approve => LedgerEventKind::TaskApproved {
                task_id: id,
                worker: beneficiary,
                amount,
            },
            Resolution::Reject => LedgerEventKind::TaskRejected {
                task_id: id,
                funder: beneficiary,
                amount,
            },
        })
    }

    /// Opens a renegotiation of a pending task's amount, pre-approved by the
    /// proposer's side.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::TaskNotFound`], [`LedgerError::InvalidState`]
    /// when the task is not pending, [`LedgerError::Unauthorized`] when the
    /// caller is neither funder nor worker, [`LedgerError::InvalidAmount`]
    /// for a zero or unchanged amount, or
    /// [`LedgerError::UpdateAlreadyProposed`] when a request is live.
    pub fn propose_update(
        &mut self,
        id: TaskId,
        new_amount: u64,
        caller: &PartyId,
    ) -> Result<LedgerEventKind, LedgerError> {
        let task = self.find(id)?;
        task.ensure_open()?;
        let proposer = roles::side_of(task, caller)?;
        if new_amount == 0 || new_amount == task.amount() {
            return Err(LedgerError::InvalidAmount(new_amount));
        }
        if self.update_requests.contains_key(&id) {
            return Err(LedgerError::UpdateAlreadyProposed(id));
        }

        self.update_requests
            .insert(id, UpdateRequest::propose(id, new_amount, proposer));
        Ok(LedgerEventKind::UpdateProposed {
            task_id: id,
            proposer,
            proposed_amount: new_amount,
        })
    }

    /// Validates `caller`'s approval of the live update without mutating.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::TaskNotFound`], [`LedgerError::InvalidState`],
    /// [`LedgerError::Unauthorized`], [`LedgerError::NoUpdateProposed`] or
    /// [`LedgerError::AlreadyApprovedBySide`].
    pub fn plan_update_approval(
        &self,
        id: TaskId,
        caller: &PartyId,
    ) -> Result<UpdateApproval, LedgerError> {
        let task = self.find(id)?;
        task.ensure_open()?;
        let side = roles::side_of(task, caller)?;
        let request = self
            .update_requests
            .get(&id)
            .copied()
            .ok_or(LedgerError::NoUpdateProposed(id))?;
        let proposed_amount = request.approve(side)?;

        Ok(UpdateApproval {
            task_id: id,
            side,
            proposed_amount,
            funder: task.funder().clone(),
            current_amount: task.amount(),
        })
    }

    /// Records `caller`'s approval of the live update, rewriting the escrowed
    /// amount and dropping the request in the same step.
    ///
    /// An agreed decrease refunds the difference to the funder's balance. An
    /// agreed increase assumes the difference has already been collected
    /// into custody.
    ///
    /// # Errors
    ///
    /// Same as [`Ledger::plan_update_approval`], plus
    /// [`LedgerError::BalanceOverflow`] when a refund cannot be credited.
    pub fn approve_update(
        &mut self,
        id: TaskId,
        caller: &PartyId,
        clock: &impl Clock,
    ) -> Result<Vec<LedgerEventKind>, LedgerError> {
        let approval = self.plan_update_approval(id, caller)?;
        let approved = LedgerEventKind::UpdateApproved {
            task_id: approval.task_id,
            side: approval.side,
        };

        let proposed_amount = approval.proposed_amount;
        let previous_amount = approval.current_amount;
        let refund = previous_amount.saturating_sub(proposed_amount);
        let refunded_balance = if refund > 0 {
            Some(self.checked_credit(&approval.funder, refund)?)
        } else {
            None
        };

        self.find_mut(id)?.set_amount(proposed_amount, clock);
        self.update_requests.remove(&id);
        if let Some(balance) = refunded_balance {
            self.balances.insert(approval.funder, balance);
        }

        Ok(vec![
            approved,
            LedgerEventKind::TaskAmountUpdated {
                task_id: id,
                previous_amount,
                new_amount: proposed_amount,
            },
        ])
    }

    /// Marks a pending task as disputed on behalf of the dispute resolver.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::TaskNotFound`], [`LedgerError::Unauthorized`]
    /// when `caller` is not the resolver, or [`LedgerError::InvalidState`]
    /// when the task is not pending.
    pub fn open_dispute(
        &mut self,
        id: TaskId,
        caller: &PartyId,
        resolver: Option<&PartyId>,
        clock: &impl Clock,
    ) -> Result<LedgerEventKind, LedgerError> {
        let task = self.find(id)?;
        roles::ensure_dispute_resolver(resolver, caller)?;
        task.ensure_open()?;
        self.find_mut(id)?.set_status(TaskStatus::Disputed, clock);
        Ok(LedgerEventKind::DisputeOpened { task_id: id })
    }

    /// Returns a disputed task to pending on behalf of the dispute resolver.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::TaskNotFound`], [`LedgerError::Unauthorized`]
    /// when `caller` is not the resolver, or [`LedgerError::InvalidState`]
    /// when the task is not disputed.
    pub fn clear_dispute(
        &mut self,
        id: TaskId,
        caller: &PartyId,
        resolver: Option<&PartyId>,
        clock: &impl Clock,
    ) -> Result<LedgerEventKind, LedgerError> {
        let task = self.find(id)?;
        roles::ensure_dispute_resolver(resolver, caller)?;
        if task.status() != TaskStatus::Disputed {
            return Err(LedgerError::InvalidState {
                task_id: id,
                status: task.status(),
            });
        }
        self.find_mut(id)?.set_status(TaskStatus::Pending, clock);
        Ok(LedgerEventKind::DisputeCleared { task_id: id })
    }

    /// Decrements `party`'s balance ahead of a release and returns what is
    /// left.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] for a zero amount or
    /// [`LedgerError::InsufficientBalance`] when the balance is too small.
    pub fn debit(&mut self, party: &PartyId, amount: u64) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let available = self.balance_of(party);
        let remaining =
            available
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::InsufficientBalance {
                    party: party.clone(),
                    requested: amount,
                    available,
                })?;
        self.balances.insert(party.clone(), remaining);
        Ok(remaining)
    }

    /// Appends a release failure for later reconciliation.
    pub fn record_failed_release(&mut self, failure: FailedRelease) {
        self.failed_releases.push(failure);
    }

    fn ensure_unused(&self, id: TaskId) -> Result<(), LedgerError> {
        if self.tasks.contains_key(&id) {
            return Err(LedgerError::DuplicateTaskId(id));
        }
        Ok(())
    }

    fn checked_credit(&self, party: &PartyId, amount: u64) -> Result<u64, LedgerError> {
        self.balance_of(party)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::BalanceOverflow(party.clone()))
    }

    fn find(&self, id: TaskId) -> Result<&Task, LedgerError> {
        self.tasks.get(&id).ok_or(LedgerError::TaskNotFound(id))
    }

    fn find_mut(&mut self, id: TaskId) -> Result<&mut Task, LedgerError> {
        self.tasks.get_mut(&id).ok_or(LedgerError::TaskNotFound(id))
    }
}
