//! In-memory fund transfer backend for ledger tests and local runs.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::ledger::{
    domain::PartyId,
    ports::{FundTransfer, FundTransferError, FundTransferResult},
};

/// One completed transfer observed by the in-memory backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// Counterparty of the transfer.
    pub party: PartyId,
    /// Transferred amount.
    pub amount: u64,
}

/// Thread-safe in-memory fund backend.
///
/// Models every party's external account as a plain number. Pulls debit the
/// account and releases credit it; both are logged so tests can assert how
/// often value crossed the ledger boundary.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFundTransfer {
    state: Arc<RwLock<InMemoryFundState>>,
}

#[derive(Debug, Default)]
struct InMemoryFundState {
    accounts: HashMap<PartyId, u64>,
    pulls: Vec<Transfer>,
    releases: Vec<Transfer>,
    failing_recipients: HashSet<PartyId>,
}

fn lock_error(err: impl std::fmt::Display) -> FundTransferError {
    FundTransferError::backend(std::io::Error::other(err.to_string()))
}

impl InMemoryFundTransfer {
    /// Creates a backend with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to `party`'s external account.
    ///
    /// # Errors
    ///
    /// Returns a backend error when lock acquisition fails or the account
    /// would overflow.
    pub fn deposit(&self, party: &PartyId, amount: u64) -> FundTransferResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        credit(&mut state.accounts, party, amount)
    }

    /// Returns `party`'s external account balance.
    ///
    /// # Errors
    ///
    /// Returns a backend error when lock acquisition fails.
    pub fn external_balance(&self, party: &PartyId) -> FundTransferResult<u64> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.accounts.get(party).copied().unwrap_or_default())
    }

    /// Makes every later release to `party` fail.
    ///
    /// # Errors
    ///
    /// Returns a backend error when lock acquisition fails.
    pub fn fail_releases_to(&self, party: &PartyId) -> FundTransferResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.failing_recipients.insert(party.clone());
        Ok(())
    }

    /// Returns all successful pulls in order.
    ///
    /// # Errors
    ///
    /// Returns a backend error when lock acquisition fails.
    pub fn pulls(&self) -> FundTransferResult<Vec<Transfer>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.pulls.clone())
    }

    /// Returns all successful releases in order.
    ///
    /// # Errors
    ///
    /// Returns a backend error when lock acquisition fails.
    pub fn releases(&self) -> FundTransferResult<Vec<Transfer>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.releases.clone())
    }
}

fn credit(
    accounts: &mut HashMap<PartyId, u64>,
    party: &PartyId,
    amount: u64,
) -> FundTransferResult<()> {
    let balance = accounts.entry(party.clone()).or_default();
    *balance = balance
        .checked_add(amount)
        .ok_or_else(|| FundTransferError::Rejected(format!("account overflow for {party}")))?;
    Ok(())
}

#[async_trait]
impl FundTransfer for InMemoryFundTransfer {
    async fn pull(&self, from: &PartyId, amount: u64) -> FundTransferResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let available = state.accounts.get(from).copied().unwrap_or_default();
        let remaining =
            available
                .checked_sub(amount)
                .ok_or_else(|| FundTransferError::InsufficientFunds {
                    party: from.clone(),
                    requested: amount,
                    available,
                })?;
        state.accounts.insert(from.clone(), remaining);
        state.pulls.push(Transfer {
            party: from.clone(),
            amount,
        });
        Ok(())
    }

    async fn release(&self, to: &PartyId, amount: u64) -> FundTransferResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.failing_recipients.contains(to) {
            return Err(FundTransferError::Rejected(format!(
                "recipient {to} refused the transfer"
            )));
        }
        credit(&mut state.accounts, to, amount)?;
        state.releases.push(Transfer {
            party: to.clone(),
            amount,
        });
        Ok(())
    }
}
