//! Application services for escrow ledger orchestration.

mod config;
mod error;
mod escrow;
mod withdrawal;

pub use config::{LedgerConfig, LedgerConfigError};
pub use error::{EscrowServiceError, EscrowServiceResult};
pub use escrow::{CreateTaskRequest, EscrowLedgerService};
pub use withdrawal::WithdrawalGuard;
