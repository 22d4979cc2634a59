//! Event synchronization
//!
//! This module turns ledger events into store writes:
//!
//! - `events`: decodes raw ledger events into the closed `DomainEvent` set.
//! - `reconciler`: applies decoded events to the record store with keyed upserts.
//! - `progress_tracker`: per-cycle counts, logged as a summary line.
//! - `scheduler`: the single-flight loop that drives fetch, decode and reconcile on an interval.

/// Raw event decoding
pub mod events;
/// Cycle statistics
pub mod progress_tracker;
/// Store reconciliation rules
pub mod reconciler;
/// The sync loop
pub mod scheduler;
/// Error types
pub mod types;

pub use scheduler::SyncScheduler;
