//! Fund transfer port for moving value across the ledger boundary.

use crate::ledger::domain::PartyId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for fund transfer operations.
pub type FundTransferResult<T> = Result<T, FundTransferError>;

/// Backend that moves value into and out of the ledger's custody.
#[async_trait]
pub trait FundTransfer: Send + Sync {
    /// Pulls `amount` from `from`'s external balance into custody.
    ///
    /// # Errors
    ///
    /// Returns [`FundTransferError`] when the backend refuses or fails the
    /// transfer. No value has moved in that case.
    async fn pull(&self, from: &PartyId, amount: u64) -> FundTransferResult<()>;

    /// Releases `amount` from custody to `to`.
    ///
    /// Implementations may run arbitrary code on behalf of the receiving
    /// party, including calls back into the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`FundTransferError`] when the release did not happen.
    async fn release(&self, to: &PartyId, amount: u64) -> FundTransferResult<()>;
}

/// Errors returned by fund transfer backends.
#[derive(Debug, Clone, Error)]
pub enum FundTransferError {
    /// The source account cannot cover the transfer.
    #[error(
        "insufficient external funds for {party}: requested {requested}, available {available}"
    )]
    InsufficientFunds {
        /// Account that was debited.
        party: PartyId,
        /// Requested amount.
        requested: u64,
        /// Amount available in the account.
        available: u64,
    },

    /// The backend declined the transfer.
    #[error("transfer rejected: {0}")]
    Rejected(String),

    /// Backend failure.
    #[error("fund backend error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl FundTransferError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}
