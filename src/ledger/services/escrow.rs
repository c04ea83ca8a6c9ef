//! Service layer driving the escrow ledger against its ports.

use std::sync::Arc;

use mockable::Clock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{EscrowServiceError, EscrowServiceResult, LedgerConfig, WithdrawalGuard};
use crate::ledger::{
    domain::{
        FailedRelease, FundingMode, Ledger, LedgerError, LedgerEvent, LedgerEventKind, NewTask,
        PartyId, Task, TaskId, UpdateRequest,
    },
    ports::{EventSink, FundTransfer, FundTransferError},
};

/// Request payload for opening an escrowed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    task_id: u64,
    amount: u64,
    funder: String,
    worker: String,
    approver: String,
    attached_value: u64,
}

impl CreateTaskRequest {
    /// Creates a request with the required task fields and nothing attached.
    #[must_use]
    pub fn new(
        task_id: u64,
        amount: u64,
        funder: impl Into<String>,
        worker: impl Into<String>,
        approver: impl Into<String>,
    ) -> Self {
        Self {
            task_id,
            amount,
            funder: funder.into(),
            worker: worker.into(),
            approver: approver.into(),
            attached_value: 0,
        }
    }

    /// Sets the value attached to the call in native funding mode.
    #[must_use]
    pub const fn with_attached_value(mut self, attached_value: u64) -> Self {
        self.attached_value = attached_value;
        self
    }

    /// Attaches exactly the task amount.
    #[must_use]
    pub const fn fully_funded(self) -> Self {
        let amount = self.amount;
        self.with_attached_value(amount)
    }

    fn validate(&self) -> Result<NewTask, EscrowServiceError> {
        let id = TaskId::new(self.task_id)?;
        let funder = PartyId::new(self.funder.as_str())?;
        let worker = PartyId::new(self.worker.as_str())?;
        let approver = PartyId::new(self.approver.as_str())?;
        Ok(NewTask::new(id, self.amount, funder, worker, approver)?)
    }
}

/// Escrow ledger orchestration service.
///
/// Every operation runs as one transaction under the ledger lock, and its
/// events are delivered before the lock is released. Withdrawals go through
/// the [`WithdrawalGuard`], which releases the lock between the debit and the
/// release effect.
pub struct EscrowLedgerService<F, E, C>
where
    F: FundTransfer,
    E: EventSink,
    C: Clock + Send + Sync,
{
    ledger: Arc<Mutex<Ledger>>,
    config: LedgerConfig,
    funds: Arc<F>,
    events: Arc<E>,
    clock: Arc<C>,
    withdrawals: WithdrawalGuard<F, C>,
}

impl<F, E, C> EscrowLedgerService<F, E, C>
where
    F: FundTransfer,
    E: EventSink,
    C: Clock + Send + Sync,
{
    /// Creates a service over an empty ledger.
    #[must_use]
    pub fn new(config: LedgerConfig, funds: Arc<F>, events: Arc<E>, clock: Arc<C>) -> Self {
        let ledger = Arc::new(Mutex::new(Ledger::new()));
        let withdrawals = WithdrawalGuard::new(ledger.clone(), funds.clone(), clock.clone());
        Self {
            ledger,
            config,
            funds,
            events,
            clock,
            withdrawals,
        }
    }

    /// Returns the deployment configuration.
    #[must_use]
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Opens a task and takes its amount into escrow.
    ///
    /// Funding is part of the transaction: if the attached value is wrong or
    /// the pull fails, no task is created.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowServiceError::Ledger`] for invalid input, an
    /// unauthorized caller or a duplicate identifier, and
    /// [`EscrowServiceError::FundTransferFailed`] when escrow could not be
    /// collected.
    pub async fn create_task(
        &self,
        request: CreateTaskRequest,
        caller: &PartyId,
    ) -> EscrowServiceResult<Task> {
        let new_task = request.validate()?;
        let mut ledger = self.ledger.lock().await;
        ledger.ensure_can_create(&new_task, caller, &self.config.creation)?;
        self.collect(
            new_task.id(),
            new_task.funder(),
            new_task.amount(),
            request.attached_value,
        )
        .await?;
        let (task, created) = ledger.open_task(new_task, &*self.clock)?;
        info!(
            task_id = %task.id(),
            amount = task.amount(),
            funder = %task.funder(),
            worker = %task.worker(),
            "task created"
        );
        self.emit([created]).await;
        Ok(task)
    }

    /// Brings `amount` into custody for `task_id`: native mode checks the
    /// attached value, token mode pulls from `funder`.
    async fn collect(
        &self,
        task_id: TaskId,
        funder: &PartyId,
        amount: u64,
        attached_value: u64,
    ) -> EscrowServiceResult<()> {
        match self.config.funding {
            FundingMode::Native => {
                if attached_value != amount {
                    warn!(
                        task_id = %task_id,
                        attached_value,
                        amount,
                        "attached value does not match amount due"
                    );
                    return Err(EscrowServiceError::FundTransferFailed(
                        FundTransferError::Rejected(format!(
                            "attached value {attached_value} does not match amount due {amount}"
                        )),
                    ));
                }
                Ok(())
            }
            FundingMode::Token => {
                if attached_value != 0 {
                    return Err(LedgerError::InvalidAmount(attached_value).into());
                }
                if amount == 0 {
                    return Ok(());
                }
                self.funds.pull(funder, amount).await.map_err(|err| {
                    warn!(party = %funder, amount, error = %err, "pull into escrow failed");
                    EscrowServiceError::FundTransferFailed(err)
                })
            }
        }
    }

    /// Approves a task, crediting its escrow to the worker.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowServiceError::Ledger`] when the task is missing, the
    /// caller is not its approver, or the task is not pending.
    pub async fn approve_task(
        &self,
        task_id: TaskId,
        caller: &PartyId,
    ) -> EscrowServiceResult<Task> {
        let mut ledger = self.ledger.lock().await;
        let approved = ledger.approve_task(task_id, caller, &*self.clock)?;
        let task = snapshot(&ledger, task_id)?;
        info!(task_id = %task_id, worker = %task.worker(), "task approved");
        self.emit([approved]).await;
        Ok(task)
    }

    /// Rejects a task, crediting its escrow back to the funder.
    ///
    /// # Errors
    ///
    /// Same as [`EscrowLedgerService::approve_task`].
    pub async fn reject_task(
        &self,
        task_id: TaskId,
        caller: &PartyId,
    ) -> EscrowServiceResult<Task> {
        let mut ledger = self.ledger.lock().await;
        let rejected = ledger.reject_task(task_id, caller, &*self.clock)?;
        let task = snapshot(&ledger, task_id)?;
        info!(task_id = %task_id, funder = %task.funder(), "task rejected");
        self.emit([rejected]).await;
        Ok(task)
    }

    /// Proposes a new escrow amount for a pending task.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowServiceError::Ledger`] when the task is missing or not
    /// pending, the caller is neither funder nor worker, the amount is zero or
    /// unchanged, or a proposal is already live.
    pub async fn propose_update(
        &self,
        task_id: TaskId,
        new_amount: u64,
        caller: &PartyId,
    ) -> EscrowServiceResult<UpdateRequest> {
        let mut ledger = self.ledger.lock().await;
        let proposed = ledger.propose_update(task_id, new_amount, caller)?;
        let request = ledger
            .update_request(task_id)
            .copied()
            .ok_or(LedgerError::NoUpdateProposed(task_id))?;
        debug!(task_id = %task_id, new_amount, proposer = %caller, "amount update proposed");
        self.emit([proposed]).await;
        Ok(request)
    }

    /// Approves the live proposal with nothing attached.
    ///
    /// In native funding mode an agreed increase needs the difference
    /// attached; use [`EscrowLedgerService::approve_update_with_value`].
    ///
    /// # Errors
    ///
    /// Same as [`EscrowLedgerService::approve_update_with_value`].
    pub async fn approve_update(
        &self,
        task_id: TaskId,
        caller: &PartyId,
    ) -> EscrowServiceResult<Task> {
        self.approve_update_with_value(task_id, caller, 0).await
    }

    /// Records the caller's approval of the live proposal and applies it.
    ///
    /// An agreed increase must bring the difference into custody before the
    /// amount is rewritten: in native mode `attached_value` must equal it, in
    /// token mode it is pulled from the funder. An agreed decrease credits
    /// the difference to the funder's balance and takes nothing attached.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowServiceError::Ledger`] when the task is missing or not
    /// pending, the caller is neither funder nor worker, no proposal is live,
    /// the caller's side already approved, or value is attached in token
    /// mode; returns [`EscrowServiceError::FundTransferFailed`] when the
    /// attached value is wrong or the pull fails. On any error the approval
    /// is not recorded.
    pub async fn approve_update_with_value(
        &self,
        task_id: TaskId,
        caller: &PartyId,
        attached_value: u64,
    ) -> EscrowServiceResult<Task> {
        let mut ledger = self.ledger.lock().await;
        let approval = ledger.plan_update_approval(task_id, caller)?;
        let (funder, due) = approval.top_up().unwrap_or((caller, 0));
        self.collect(task_id, funder, due, attached_value).await?;
        let events = ledger.approve_update(task_id, caller, &*self.clock)?;
        let task = snapshot(&ledger, task_id)?;
        info!(
            task_id = %task_id,
            approver = %caller,
            amount = task.amount(),
            "amount update applied"
        );
        self.emit(events).await;
        Ok(task)
    }

    /// Blocks a pending task on behalf of the configured dispute resolver.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowServiceError::Ledger`] when the task is missing, the
    /// caller is not the resolver, or the task is not pending.
    pub async fn open_dispute(
        &self,
        task_id: TaskId,
        caller: &PartyId,
    ) -> EscrowServiceResult<Task> {
        let mut ledger = self.ledger.lock().await;
        let opened = ledger.open_dispute(
            task_id,
            caller,
            self.config.dispute_resolver.as_ref(),
            &*self.clock,
        )?;
        let task = snapshot(&ledger, task_id)?;
        info!(task_id = %task_id, "dispute opened");
        self.emit([opened]).await;
        Ok(task)
    }

    /// Returns a disputed task to pending on behalf of the dispute resolver.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowServiceError::Ledger`] when the task is missing, the
    /// caller is not the resolver, or the task is not disputed.
    pub async fn clear_dispute(
        &self,
        task_id: TaskId,
        caller: &PartyId,
    ) -> EscrowServiceResult<Task> {
        let mut ledger = self.ledger.lock().await;
        let cleared = ledger.clear_dispute(
            task_id,
            caller,
            self.config.dispute_resolver.as_ref(),
            &*self.clock,
        )?;
        let task = snapshot(&ledger, task_id)?;
        info!(task_id = %task_id, "dispute cleared");
        self.emit([cleared]).await;
        Ok(task)
    }

    /// Withdraws `amount` from the caller's balance and releases it to them.
    ///
    /// Returns the balance left right after the debit. The withdrawal event
    /// is delivered once the release effect has completed.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowServiceError::Ledger`] when the amount is zero or the
    /// balance is insufficient, and [`EscrowServiceError::ReleaseFailed`]
    /// when the release effect fails after the debit committed.
    pub async fn withdraw(&self, amount: u64, caller: &PartyId) -> EscrowServiceResult<u64> {
        let remaining = self.withdrawals.withdraw(caller, amount).await?;
        let _ledger = self.ledger.lock().await;
        self.emit([LedgerEventKind::FundsWithdrawn {
            party: caller.clone(),
            amount,
        }])
        .await;
        Ok(remaining)
    }

    /// Returns a snapshot of a task.
    pub async fn task(&self, task_id: TaskId) -> Option<Task> {
        self.ledger.lock().await.task(task_id).cloned()
    }

    /// Returns a party's withdrawable balance.
    pub async fn balance_of(&self, party: &PartyId) -> u64 {
        self.ledger.lock().await.balance_of(party)
    }

    /// Returns the live update request for a task.
    pub async fn update_request(&self, task_id: TaskId) -> Option<UpdateRequest> {
        self.ledger.lock().await.update_request(task_id).copied()
    }

    /// Returns the sum of escrow held by tasks.
    pub async fn total_escrowed(&self) -> u128 {
        self.ledger.lock().await.total_escrowed()
    }

    /// Returns the sum of all withdrawable balances.
    pub async fn total_balances(&self) -> u128 {
        self.ledger.lock().await.total_balances()
    }

    /// Returns release failures awaiting reconciliation.
    pub async fn failed_releases(&self) -> Vec<FailedRelease> {
        self.ledger.lock().await.failed_releases().to_vec()
    }

    /// Delivers events in order; callers hold the ledger lock.
    async fn emit(&self, kinds: impl IntoIterator<Item = LedgerEventKind>) {
        for kind in kinds {
            let event = LedgerEvent::new(kind, &*self.clock);
            self.events.emit(&event).await;
        }
    }
}

fn snapshot(ledger: &Ledger, task_id: TaskId) -> EscrowServiceResult<Task> {
    ledger
        .task(task_id)
        .cloned()
        .ok_or_else(|| LedgerError::TaskNotFound(task_id).into())
}
