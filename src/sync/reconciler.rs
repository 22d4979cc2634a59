//! Applies decoded registry events to the record store.
//!
//! Every rule is an upsert keyed by the event's natural key that writes only the fields the event
//! governs, so replaying an event, or a whole history, converges on the same records.

use super::events::{DomainEvent, LedgerEvent};
use super::types::ReconcileError;
use crate::store::{
	DomainPatch, IpPatch, RecordStore, TransactionRecord, TransactionStatus, TransactionType,
};
use crate::utils::{SUI_DECIMALS, format_token_amount};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// What applying one event changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileResult {
	DomainAssigned {
		created: bool,
	},
	IpAllotted {
		created: bool,
	},
	DomainPurchased {
		domain_created: bool,
		/// `false` when the purchase transaction was already stored.
		transaction_recorded: bool,
	},
}

pub struct Reconciler {
	store: Arc<dyn RecordStore>,
}

impl Reconciler {
	pub fn new(store: Arc<dyn RecordStore>) -> Self {
		Self { store }
	}

	pub async fn apply(&self, event: &LedgerEvent) -> Result<ReconcileResult, ReconcileError> {
		let now = Utc::now();

		match &event.event {
			DomainEvent::DomainAssigned {
				domain_name,
				ip_address,
				owner,
			} => {
				let outcome = self
					.store
					.upsert_domain(
						domain_name,
						DomainPatch {
							owner_address: owner.clone(),
							ip_address: Some(ip_address.clone()),
							purchase_date: None,
							transaction_hash: None,
							updated_at: now,
						},
					)
					.await?;
				info!(
					"Domain {} assigned to {} (owner {}){}",
					domain_name,
					ip_address,
					owner,
					if outcome.created { ", new record" } else { "" }
				);
				Ok(ReconcileResult::DomainAssigned {
					created: outcome.created,
				})
			}

			DomainEvent::IpAllotted { ip_address, owner } => {
				let outcome = self
					.store
					.upsert_ip(
						ip_address,
						IpPatch {
							owner_address: owner.clone(),
							updated_at: now,
						},
					)
					.await?;
				info!(
					"IP {} allotted to {}{}",
					ip_address,
					owner,
					if outcome.created { ", new record" } else { "" }
				);
				Ok(ReconcileResult::IpAllotted {
					created: outcome.created,
				})
			}

			DomainEvent::DomainPurchased {
				domain_name,
				new_owner,
				price,
			} => {
				let purchased_at = event.timestamp.unwrap_or(now);

				let outcome = self
					.store
					.upsert_domain(
						domain_name,
						DomainPatch {
							owner_address: new_owner.clone(),
							ip_address: None,
							purchase_date: Some(purchased_at),
							transaction_hash: Some(event.tx_digest.clone()),
							updated_at: now,
						},
					)
					.await?;

				let transaction = TransactionRecord {
					transaction_hash: event.tx_digest.clone(),
					transaction_type: TransactionType::Purchase,
					from_address: None,
					to_address: Some(new_owner.clone()),
					domain_name: Some(domain_name.clone()),
					amount: *price,
					status: TransactionStatus::Confirmed,
					timestamp: purchased_at,
				};
				let recorded = self.store.insert_transaction_if_absent(&transaction).await?;
				if !recorded {
					debug!(
						"Transaction {} already recorded, leaving it unchanged",
						event.tx_digest
					);
				}

				info!(
					"Domain {} purchased by {} for {} MIST ({} SUI) in {}",
					domain_name,
					new_owner,
					price,
					format_token_amount(*price, SUI_DECIMALS),
					event.tx_digest
				);
				Ok(ReconcileResult::DomainPurchased {
					domain_created: outcome.created,
					transaction_recorded: recorded,
				})
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::MemoryStore;
	use chrono::{DateTime, TimeZone};

	fn ledger_event(digest: &str, event: DomainEvent) -> LedgerEvent {
		LedgerEvent {
			tx_digest: digest.to_string(),
			event_seq: "0".to_string(),
			timestamp: None,
			event,
		}
	}

	fn purchased(domain: &str, owner: &str, price: u64) -> DomainEvent {
		DomainEvent::DomainPurchased {
			domain_name: domain.to_string(),
			new_owner: owner.to_string(),
			price,
		}
	}

	fn setup() -> (Arc<MemoryStore>, Reconciler) {
		let store = Arc::new(MemoryStore::new());
		let reconciler = Reconciler::new(store.clone());
		(store, reconciler)
	}

	#[tokio::test]
	async fn replayed_purchase_is_idempotent() {
		let (store, reconciler) = setup();
		let event = ledger_event("T1", purchased("a.sui", "0xa", 10));

		let first = reconciler.apply(&event).await.unwrap();
		let second = reconciler.apply(&event).await.unwrap();

		assert_eq!(
			first,
			ReconcileResult::DomainPurchased {
				domain_created: true,
				transaction_recorded: true,
			}
		);
		assert_eq!(
			second,
			ReconcileResult::DomainPurchased {
				domain_created: false,
				transaction_recorded: false,
			}
		);
		assert_eq!(store.transactions_for_domain("a.sui").await.unwrap().len(), 1);
		assert_eq!(
			store.find_domain("a.sui").await.unwrap().unwrap().owner_address,
			"0xa"
		);
	}

	#[tokio::test]
	async fn later_purchase_wins_and_both_are_recorded() {
		let (store, reconciler) = setup();
		let at = |secs: i64| -> DateTime<Utc> { Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap() };

		let mut first = ledger_event("T1", purchased("a.sui", "0xa", 10));
		first.timestamp = Some(at(1));
		let mut second = ledger_event("T2", purchased("a.sui", "0xb", 20));
		second.timestamp = Some(at(2));
		reconciler.apply(&first).await.unwrap();
		reconciler.apply(&second).await.unwrap();

		let domain = store.find_domain("a.sui").await.unwrap().unwrap();
		assert_eq!(domain.owner_address, "0xb");
		assert_eq!(domain.transaction_hash.as_deref(), Some("T2"));
		assert_eq!(domain.purchase_date, Some(at(2)));

		let transactions = store.transactions_for_domain("a.sui").await.unwrap();
		assert_eq!(
			transactions
				.iter()
				.map(|tx| (tx.transaction_hash.as_str(), tx.amount))
				.collect::<Vec<_>>(),
			vec![("T1", 10), ("T2", 20)]
		);
		assert!(transactions.iter().all(|tx| {
			tx.transaction_type == TransactionType::Purchase
				&& tx.status == TransactionStatus::Confirmed
				&& tx.from_address.is_none()
		}));
	}

	#[tokio::test]
	async fn domain_assignment_does_not_touch_ip_record() {
		let (store, reconciler) = setup();

		reconciler
			.apply(&ledger_event(
				"T1",
				DomainEvent::IpAllotted {
					ip_address: "1.2.3.4".to_string(),
					owner: "0xa".to_string(),
				},
			))
			.await
			.unwrap();
		reconciler
			.apply(&ledger_event(
				"T2",
				DomainEvent::DomainAssigned {
					domain_name: "b.sui".to_string(),
					ip_address: "1.2.3.4".to_string(),
					owner: "0xb".to_string(),
				},
			))
			.await
			.unwrap();

		let ip = store.find_ip("1.2.3.4").await.unwrap().unwrap();
		assert_eq!(ip.owner_address, "0xa");
		let domain = store.find_domain("b.sui").await.unwrap().unwrap();
		assert_eq!(domain.owner_address, "0xb");
		assert!(store.transactions_for_domain("b.sui").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn purchase_of_unseen_domain_creates_it_without_ip() {
		let (store, reconciler) = setup();

		let result = reconciler
			.apply(&ledger_event("T9", purchased("new.sui", "0xc", 5)))
			.await
			.unwrap();
		assert!(matches!(
			result,
			ReconcileResult::DomainPurchased {
				domain_created: true,
				..
			}
		));

		let domain = store.find_domain("new.sui").await.unwrap().unwrap();
		assert_eq!(domain.owner_address, "0xc");
		assert_eq!(domain.ip_address, None);
		assert_eq!(domain.website_code, None);
	}

	#[tokio::test]
	async fn assignment_after_purchase_keeps_purchase_details() {
		let (store, reconciler) = setup();

		reconciler
			.apply(&ledger_event("T1", purchased("c.sui", "0xa", 7)))
			.await
			.unwrap();
		let result = reconciler
			.apply(&ledger_event(
				"T2",
				DomainEvent::DomainAssigned {
					domain_name: "c.sui".to_string(),
					ip_address: "9.9.9.9".to_string(),
					owner: "0xa".to_string(),
				},
			))
			.await
			.unwrap();

		assert_eq!(result, ReconcileResult::DomainAssigned { created: false });
		let domain = store.find_domain("c.sui").await.unwrap().unwrap();
		assert_eq!(domain.ip_address.as_deref(), Some("9.9.9.9"));
		assert_eq!(domain.transaction_hash.as_deref(), Some("T1"));
		assert!(domain.purchase_date.is_some());
	}
}
