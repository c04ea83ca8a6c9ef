//! Service-level errors for escrow ledger operations.

use crate::ledger::{domain::LedgerError, domain::PartyId, ports::FundTransferError};
use thiserror::Error;

/// Errors returned by [`super::EscrowLedgerService`].
#[derive(Debug, Error)]
pub enum EscrowServiceError {
    /// A precondition failed; the ledger is unchanged.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Funds could not be brought into custody; the ledger is unchanged.
    #[error("fund transfer failed: {0}")]
    FundTransferFailed(#[source] FundTransferError),

    /// The release effect failed after the balance debit committed.
    ///
    /// The debited amount is not re-credited. It is recorded as a failed
    /// release and needs out-of-band reconciliation, not a retry.
    #[error("release of {amount} to {party} failed after debit: {source}")]
    ReleaseFailed {
        /// Party whose balance was debited.
        party: PartyId,
        /// Debited amount.
        amount: u64,
        /// Backend failure.
        #[source]
        source: FundTransferError,
    },
}

impl EscrowServiceError {
    /// Returns whether the failure left committed state that needs manual
    /// reconciliation.
    #[must_use]
    pub const fn requires_reconciliation(&self) -> bool {
        matches!(self, Self::ReleaseFailed { .. })
    }

    /// Returns the domain error, when this is a precondition failure.
    #[must_use]
    pub const fn as_ledger_error(&self) -> Option<&LedgerError> {
        match self {
            Self::Ledger(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for escrow ledger service operations.
pub type EscrowServiceResult<T> = Result<T, EscrowServiceError>;
