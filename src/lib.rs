//! SMC Sniper: periodic structure-break / fair-value-gap market scanner.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod market;
pub mod notify;
pub mod strategy;
pub mod engine;
pub mod dashboard;
