//! Deployment-mode policies for task creation and funding.

use super::PartyId;
use serde::{Deserialize, Serialize};

/// Who may create tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CreationPolicy {
    /// Only the configured manager may create tasks.
    Manager {
        /// Manager identity.
        manager: PartyId,
    },
    /// A task may only be created by its own funder.
    Funder,
}

/// How escrow enters the ledger at task creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingMode {
    /// The caller attaches value to the creation call.
    #[default]
    Native,
    /// The ledger pulls the amount from the funder's external token balance.
    Token,
}
