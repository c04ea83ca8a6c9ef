//! Escrow ledger: custody and release of funds for discrete units of work.
//!
//! This crate tracks funds escrowed per task, moves them into a withdrawable
//! balance for the worker or the funder once an approver resolves the task,
//! and releases balances through an external fund transfer backend.
//!
//! # Architecture
//!
//! The ledger follows hexagonal architecture principles:
//!
//! - **Domain**: Pure ledger state and authorization rules
//! - **Ports**: Abstract trait interfaces for fund movement and events
//! - **Adapters**: Concrete implementations of ports (in-memory, tracing)
//!
//! # Modules
//!
//! - [`ledger`]: Task lifecycle, renegotiation and withdrawal

pub mod ledger;
