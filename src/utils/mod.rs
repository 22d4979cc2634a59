//! Utility module for the sync service.
//!
//! Re-exports formatting helpers and the lenient JSON decoders shared by the ledger client
//! and the event decoder.

/// Sui address validation
pub mod address;
/// Utility functions for formatting and display
pub mod format;
/// Serde helpers for values the Sui JSON-RPC encodes loosely
pub mod json;

pub use address::normalize_sui_address;
pub use format::{SUI_DECIMALS, format_token_amount};
