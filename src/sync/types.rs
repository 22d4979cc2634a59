//! Error types for decoding and reconciling ledger events.

use crate::ledger::EventKind;
use crate::store::StoreError;

/// Reasons a raw event cannot become a typed domain event
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
	#[error("Unknown event type {0}")]
	UnknownEventType(String),

	#[error("Malformed {kind} payload: {source}")]
	MalformedPayload {
		kind: EventKind,
		#[source]
		source: serde_json::Error,
	},

	#[error("{kind} field `{field}` is empty")]
	EmptyField {
		kind: EventKind,
		field: &'static str,
	},

	#[error("Event has no transaction digest")]
	MissingDigest,

	#[error("Event timestamp {0}ms is out of range")]
	InvalidTimestamp(u64),
}

/// Failures while applying a decoded event to the store
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
	#[error("Store write failed: {0}")]
	StoreWriteError(#[from] StoreError),
}
