//! The event source seam between the sync scheduler and the ledger.
//!
//! The scheduler only ever talks to an [`EventSource`]; the Sui JSON-RPC client is the
//! production implementation and tests substitute scripted sources. Any cursor state belongs to
//! the source, tracked with a [`CursorBook`] that only moves when the scheduler commits.

use super::types::{EventId, EventKind, FetchPolicy, LedgerError, RawEvent};
use std::collections::HashMap;

/// A ledger that can be queried for domain-registry events by kind.
#[async_trait::async_trait]
pub trait EventSource: Send + Sync {
	/// Fetch the currently available events of one kind, in ledger order.
	///
	/// Fetching never moves the source's position; only [`EventSource::commit`] does.
	async fn fetch_events(&mut self, kind: EventKind) -> Result<Vec<RawEvent>, LedgerError>;

	/// Mark every fetched event of `kind` up to and including `through` as handled.
	///
	/// Events after `through` are returned again by the next fetch.
	fn commit(&mut self, kind: EventKind, through: &EventId);

	/// Verify the source is reachable. Called once at start-up.
	async fn check_connection(&self) -> Result<(), LedgerError>;

	/// Get the name of this source for logging.
	fn name(&self) -> &'static str;
}

/// Per-kind query cursors, interpreted according to a [`FetchPolicy`].
#[derive(Debug, Clone)]
pub struct CursorBook {
	policy: FetchPolicy,
	cursors: HashMap<EventKind, EventId>,
}

impl CursorBook {
	pub fn new(policy: FetchPolicy) -> Self {
		Self {
			policy,
			cursors: HashMap::new(),
		}
	}

	pub fn policy(&self) -> FetchPolicy {
		self.policy
	}

	/// Cursor the next query for `kind` should start after. `None` means the beginning.
	pub fn start_cursor(&self, kind: EventKind) -> Option<EventId> {
		match self.policy {
			FetchPolicy::Rescan => None,
			FetchPolicy::Incremental => self.cursors.get(&kind).cloned(),
		}
	}

	/// Move the position for `kind` to just after `cursor`.
	pub fn advance(&mut self, kind: EventKind, cursor: EventId) {
		if self.policy == FetchPolicy::Incremental {
			self.cursors.insert(kind, cursor);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn id(digest: &str) -> EventId {
		EventId {
			tx_digest: digest.to_string(),
			event_seq: "0".to_string(),
		}
	}

	#[test]
	fn rescan_always_starts_from_the_beginning() {
		let mut book = CursorBook::new(FetchPolicy::Rescan);
		book.advance(EventKind::DomainAssigned, id("A"));
		assert_eq!(book.start_cursor(EventKind::DomainAssigned), None);
	}

	#[test]
	fn incremental_resumes_per_kind() {
		let mut book = CursorBook::new(FetchPolicy::Incremental);
		assert_eq!(book.start_cursor(EventKind::DomainPurchased), None);

		book.advance(EventKind::DomainPurchased, id("A"));
		book.advance(EventKind::IpAllotted, id("B"));
		assert_eq!(book.start_cursor(EventKind::DomainPurchased), Some(id("A")));
		assert_eq!(book.start_cursor(EventKind::IpAllotted), Some(id("B")));
		assert_eq!(book.start_cursor(EventKind::DomainAssigned), None);
	}

	#[test]
	fn later_commit_replaces_cursor() {
		let mut book = CursorBook::new(FetchPolicy::Incremental);
		book.advance(EventKind::DomainAssigned, id("A"));
		book.advance(EventKind::DomainAssigned, id("B"));
		assert_eq!(book.start_cursor(EventKind::DomainAssigned), Some(id("B")));
	}
}
