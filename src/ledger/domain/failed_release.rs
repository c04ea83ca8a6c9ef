//! Withdrawals whose release effect failed after the debit committed.

use super::PartyId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Debited amount that never reached its party.
///
/// The ledger keeps these for administrative reconciliation; the balance is
/// never re-credited automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRelease {
    party: PartyId,
    amount: u64,
    reason: String,
    failed_at: DateTime<Utc>,
}

impl FailedRelease {
    /// Records a failed release for `party`.
    #[must_use]
    pub fn new(party: PartyId, amount: u64, reason: impl Into<String>, clock: &impl Clock) -> Self {
        Self {
            party,
            amount,
            reason: reason.into(),
            failed_at: clock.utc(),
        }
    }

    /// Returns the party that was debited.
    #[must_use]
    pub const fn party(&self) -> &PartyId {
        &self.party
    }

    /// Returns the debited amount.
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.amount
    }

    /// Returns the backend's failure description.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns when the release failed.
    #[must_use]
    pub const fn failed_at(&self) -> DateTime<Utc> {
        self.failed_at
    }
}
