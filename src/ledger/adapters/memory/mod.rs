//! In-memory adapters for the fund transfer and event sink ports.

mod events;
mod funds;

pub use events::InMemoryEventSink;
pub use funds::{InMemoryFundTransfer, Transfer};
