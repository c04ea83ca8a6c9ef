//! Domain model for the escrow ledger.
//!
//! The domain holds the task state machine, balance accounting and the
//! two-party renegotiation record. It performs no I/O: fund movements and
//! event delivery live behind the ports.

mod error;
mod event;
mod failed_release;
mod ids;
mod ledger;
mod policy;
pub mod roles;
mod task;
mod update_request;

pub use error::{LedgerError, ParseTaskStatusError};
pub use event::{LedgerEvent, LedgerEventKind};
pub use failed_release::FailedRelease;
pub use ids::{EventId, PartyId, TaskId};
pub use ledger::{Ledger, UpdateApproval};
pub use policy::{CreationPolicy, FundingMode};
pub use task::{NewTask, Task, TaskStatus};
pub use update_request::{Side, UpdateRequest};
