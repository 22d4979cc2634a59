use super::types::*;

/// Keyed record storage for the registry mirror.
///
/// Upserts find a record by its unique key, create it if absent, and otherwise change only the
/// fields carried by the patch. Transactions are append-only. Implementations make each call
/// atomic per key; callers hold no locks of their own.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
	async fn upsert_domain(
		&self,
		domain_name: &str,
		patch: DomainPatch,
	) -> Result<UpsertOutcome<DomainRecord>, StoreError>;

	async fn upsert_ip(
		&self,
		ip_address: &str,
		patch: IpPatch,
	) -> Result<UpsertOutcome<IpRecord>, StoreError>;

	/// Append a transaction unless its hash is already stored.
	///
	/// Returns `false`, leaving the stored row untouched, when the hash exists.
	async fn insert_transaction_if_absent(
		&self,
		record: &TransactionRecord,
	) -> Result<bool, StoreError>;

	// Lookups below serve the query layer; the sync loop only writes.
	#[allow(dead_code)]
	async fn find_domain(&self, domain_name: &str) -> Result<Option<DomainRecord>, StoreError>;

	#[allow(dead_code)]
	async fn find_ip(&self, ip_address: &str) -> Result<Option<IpRecord>, StoreError>;

	#[allow(dead_code)]
	async fn find_transaction(
		&self,
		transaction_hash: &str,
	) -> Result<Option<TransactionRecord>, StoreError>;

	/// Transactions naming `domain_name`, oldest first.
	#[allow(dead_code)]
	async fn transactions_for_domain(
		&self,
		domain_name: &str,
	) -> Result<Vec<TransactionRecord>, StoreError>;

	/// Verify the store is usable. Called once at start-up.
	async fn ping(&self) -> Result<(), StoreError>;

	/// Get the name of this store for logging.
	fn name(&self) -> &'static str;
}
