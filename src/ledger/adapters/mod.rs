//! Adapter implementations for the escrow ledger ports.

pub mod memory;

mod log_sink;

pub use log_sink::TracingEventSink;
