//! Escrow ledger for funded units of work.
//!
//! A custodian holds funds per task and releases them to the worker or back
//! to the funder once the task's approver decides. Funder and worker can
//! renegotiate a pending task's amount by mutual consent, and withdrawals
//! debit a party's balance before any value leaves the ledger. The module
//! follows hexagonal architecture:
//!
//! - Domain types and the ledger aggregate in [`domain`]
//! - Port contracts for fund movement and event delivery in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
