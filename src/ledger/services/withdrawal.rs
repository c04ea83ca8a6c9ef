//! Debit-before-release guard for withdrawals.

use std::sync::Arc;

use mockable::Clock;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::{EscrowServiceError, EscrowServiceResult};
use crate::ledger::{
    domain::{FailedRelease, Ledger, PartyId},
    ports::FundTransfer,
};

/// Runs withdrawals so that a balance can never be consumed twice.
///
/// The debit is committed and the ledger lock released before the release
/// effect is invoked. Anything the release effect does, including calling
/// back into the ledger, observes the already-decremented balance.
pub struct WithdrawalGuard<F, C>
where
    F: FundTransfer,
    C: Clock + Send + Sync,
{
    ledger: Arc<Mutex<Ledger>>,
    funds: Arc<F>,
    clock: Arc<C>,
}

impl<F, C> WithdrawalGuard<F, C>
where
    F: FundTransfer,
    C: Clock + Send + Sync,
{
    /// Creates a guard over a shared ledger.
    #[must_use]
    pub const fn new(ledger: Arc<Mutex<Ledger>>, funds: Arc<F>, clock: Arc<C>) -> Self {
        Self {
            ledger,
            funds,
            clock,
        }
    }

    /// Debits `party` by `amount`, then releases it exactly once.
    ///
    /// Returns the balance left immediately after the debit.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowServiceError::Ledger`] when the amount is zero or
    /// exceeds the balance (nothing changes), or
    /// [`EscrowServiceError::ReleaseFailed`] when the release effect fails
    /// after the debit committed.
    pub async fn withdraw(&self, party: &PartyId, amount: u64) -> EscrowServiceResult<u64> {
        let remaining = self.ledger.lock().await.debit(party, amount)?;

        if let Err(source) = self.funds.release(party, amount).await {
            error!(
                party = %party,
                amount,
                error = %source,
                "release failed after debit, reconciliation required"
            );
            let failure =
                FailedRelease::new(party.clone(), amount, source.to_string(), &*self.clock);
            self.ledger.lock().await.record_failed_release(failure);
            return Err(EscrowServiceError::ReleaseFailed {
                party: party.clone(),
                amount,
                source,
            });
        }

        info!(party = %party, amount, remaining, "funds released");
        Ok(remaining)
    }
}
