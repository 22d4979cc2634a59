//! Per-cycle statistics for the sync scheduler.
//!
//! A `CycleReport` is filled in while a cycle runs and logged as a one-line summary when it ends.
//! The scheduler's tests also use it to observe what a cycle did.

use super::reconciler::ReconcileResult;
use crate::ledger::EventKind;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Outcome counts for one event kind within a cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindStats {
	pub fetched: usize,
	pub applied: usize,
	pub records_created: usize,
	pub transactions_recorded: usize,
	pub decode_failures: usize,
	pub store_failures: usize,
	/// Whether the fetch for this kind failed, skipping it for the cycle
	pub fetch_failed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CycleReport {
	pub cycle: u64,
	pub kinds: BTreeMap<EventKind, KindStats>,
	pub elapsed: Duration,
}

impl CycleReport {
	pub fn new(cycle: u64) -> Self {
		Self {
			cycle,
			..Default::default()
		}
	}

	pub fn stats(&self, kind: EventKind) -> KindStats {
		self.kinds.get(&kind).cloned().unwrap_or_default()
	}

	fn entry(&mut self, kind: EventKind) -> &mut KindStats {
		self.kinds.entry(kind).or_default()
	}

	pub fn record_fetched(&mut self, kind: EventKind, count: usize) {
		self.entry(kind).fetched += count;
	}

	pub fn record_fetch_failure(&mut self, kind: EventKind) {
		self.entry(kind).fetch_failed = true;
	}

	pub fn record_applied(&mut self, kind: EventKind, result: ReconcileResult) {
		let stats = self.entry(kind);
		stats.applied += 1;
		match result {
			ReconcileResult::DomainAssigned { created } | ReconcileResult::IpAllotted { created } => {
				stats.records_created += usize::from(created);
			}
			ReconcileResult::DomainPurchased {
				domain_created,
				transaction_recorded,
			} => {
				stats.records_created += usize::from(domain_created);
				stats.transactions_recorded += usize::from(transaction_recorded);
			}
		}
	}

	pub fn record_decode_failure(&mut self, kind: EventKind) {
		self.entry(kind).decode_failures += 1;
	}

	pub fn record_store_failure(&mut self, kind: EventKind) {
		self.entry(kind).store_failures += 1;
	}

	pub fn total_applied(&self) -> usize {
		self.kinds.values().map(|s| s.applied).sum()
	}

	pub fn total_failures(&self) -> usize {
		self.kinds
			.values()
			.map(|s| s.decode_failures + s.store_failures + usize::from(s.fetch_failed))
			.sum()
	}

	/// A cycle in which at least one fetch, decode or write failed.
	pub fn is_degraded(&self) -> bool {
		self.total_failures() > 0
	}

	pub fn summary(&self) -> String {
		self.to_string()
	}
}

impl fmt::Display for CycleReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Sync cycle {} finished in {:.2?}:", self.cycle, self.elapsed)?;
		for kind in EventKind::ALL {
			let stats = self.stats(kind);
			if stats.fetch_failed {
				write!(f, " {} fetch failed;", kind)?;
				continue;
			}
			write!(
				f,
				" {} {}/{} applied ({} new",
				kind, stats.applied, stats.fetched, stats.records_created
			)?;
			if kind == EventKind::DomainPurchased {
				write!(f, ", {} transactions", stats.transactions_recorded)?;
			}
			if stats.decode_failures + stats.store_failures > 0 {
				write!(
					f,
					", {} undecodable, {} store errors",
					stats.decode_failures, stats.store_failures
				)?;
			}
			write!(f, ");")?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counts_outcomes_per_kind() {
		let mut report = CycleReport::new(3);
		report.record_fetched(EventKind::DomainPurchased, 3);
		report.record_applied(
			EventKind::DomainPurchased,
			ReconcileResult::DomainPurchased {
				domain_created: true,
				transaction_recorded: true,
			},
		);
		report.record_applied(
			EventKind::DomainPurchased,
			ReconcileResult::DomainPurchased {
				domain_created: false,
				transaction_recorded: false,
			},
		);
		report.record_decode_failure(EventKind::DomainPurchased);
		report.record_fetch_failure(EventKind::IpAllotted);

		let purchased = report.stats(EventKind::DomainPurchased);
		assert_eq!(purchased.fetched, 3);
		assert_eq!(purchased.applied, 2);
		assert_eq!(purchased.records_created, 1);
		assert_eq!(purchased.transactions_recorded, 1);
		assert_eq!(report.stats(EventKind::DomainAssigned), KindStats::default());
		assert_eq!(report.total_applied(), 2);
		assert_eq!(report.total_failures(), 2);
		assert!(report.is_degraded());
	}

	#[test]
	fn summary_mentions_every_kind() {
		let mut report = CycleReport::new(1);
		report.record_fetch_failure(EventKind::DomainAssigned);
		let summary = report.summary();

		assert!(summary.starts_with("Sync cycle 1 finished"));
		assert!(summary.contains("DomainAssigned fetch failed"));
		assert!(summary.contains("IPAllotted 0/0 applied"));
		assert!(summary.contains("DomainPurchased 0/0 applied (0 new, 0 transactions)"));
	}
}
