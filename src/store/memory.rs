//! Process-local record store.
//!
//! Used with `STORE_URL=memory://` for dry runs and as the reference backend in tests.

use super::repositories::RecordStore;
use super::types::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
	domains: HashMap<String, DomainRecord>,
	ips: HashMap<String, IpRecord>,
	transactions: BTreeMap<String, TransactionRecord>,
}

/// In-memory implementation of RecordStore
#[derive(Default)]
pub struct MemoryStore {
	tables: Mutex<Tables>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
		self.tables.lock().map_err(|_| StoreError::LockPoisoned)
	}
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
	async fn upsert_domain(
		&self,
		domain_name: &str,
		patch: DomainPatch,
	) -> Result<UpsertOutcome<DomainRecord>, StoreError> {
		let mut tables = self.lock()?;
		match tables.domains.get_mut(domain_name) {
			Some(record) => {
				patch.apply_to(record);
				Ok(UpsertOutcome {
					record: record.clone(),
					created: false,
				})
			}
			None => {
				let record = patch.into_record(domain_name);
				tables
					.domains
					.insert(domain_name.to_string(), record.clone());
				Ok(UpsertOutcome {
					record,
					created: true,
				})
			}
		}
	}

	async fn upsert_ip(
		&self,
		ip_address: &str,
		patch: IpPatch,
	) -> Result<UpsertOutcome<IpRecord>, StoreError> {
		let mut tables = self.lock()?;
		match tables.ips.get_mut(ip_address) {
			Some(record) => {
				patch.apply_to(record);
				Ok(UpsertOutcome {
					record: record.clone(),
					created: false,
				})
			}
			None => {
				let record = patch.into_record(ip_address);
				tables.ips.insert(ip_address.to_string(), record.clone());
				Ok(UpsertOutcome {
					record,
					created: true,
				})
			}
		}
	}

	async fn insert_transaction_if_absent(
		&self,
		record: &TransactionRecord,
	) -> Result<bool, StoreError> {
		let mut tables = self.lock()?;
		if tables.transactions.contains_key(&record.transaction_hash) {
			return Ok(false);
		}
		tables
			.transactions
			.insert(record.transaction_hash.clone(), record.clone());
		Ok(true)
	}

	async fn find_domain(&self, domain_name: &str) -> Result<Option<DomainRecord>, StoreError> {
		Ok(self.lock()?.domains.get(domain_name).cloned())
	}

	async fn find_ip(&self, ip_address: &str) -> Result<Option<IpRecord>, StoreError> {
		Ok(self.lock()?.ips.get(ip_address).cloned())
	}

	async fn find_transaction(
		&self,
		transaction_hash: &str,
	) -> Result<Option<TransactionRecord>, StoreError> {
		Ok(self.lock()?.transactions.get(transaction_hash).cloned())
	}

	async fn transactions_for_domain(
		&self,
		domain_name: &str,
	) -> Result<Vec<TransactionRecord>, StoreError> {
		let tables = self.lock()?;
		let mut matching: Vec<TransactionRecord> = tables
			.transactions
			.values()
			.filter(|tx| tx.domain_name.as_deref() == Some(domain_name))
			.cloned()
			.collect();
		matching.sort_by(|a, b| {
			a.timestamp
				.cmp(&b.timestamp)
				.then_with(|| a.transaction_hash.cmp(&b.transaction_hash))
		});
		Ok(matching)
	}

	async fn ping(&self) -> Result<(), StoreError> {
		self.lock().map(|_| ())
	}

	fn name(&self) -> &'static str {
		"MemoryStore"
	}
}
