//! Port contracts for the escrow ledger.
//!
//! Ports define the external collaborators the ledger services drive.

pub mod events;
pub mod funds;

pub use events::EventSink;
pub use funds::{FundTransfer, FundTransferError, FundTransferResult};
