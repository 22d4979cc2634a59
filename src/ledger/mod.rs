//! Ledger integration module for the Sui full node
//!
//! This module provides the event source abstraction consumed by the sync scheduler, the Sui
//! JSON-RPC client that implements it, and the raw event types returned by `suix_queryEvents`.

/// JSON-RPC client for querying domain-service events
mod client;
/// Event source trait and cursor bookkeeping
mod source;
/// Type definitions for ledger data structures
mod types;

pub use client::SuiEventClient;
pub use source::EventSource;
pub use types::*;
