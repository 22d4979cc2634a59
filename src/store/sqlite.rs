//! Durable record store on SQLite.
//!
//! One table per collection, keyed by the record's unique field. Each upsert runs in an
//! immediate transaction so the find-then-write pair is atomic per key, and transactions are
//! appended with `ON CONFLICT DO NOTHING` so an existing row can never be overwritten.
//! Amounts are stored as decimal text because MIST values may exceed `i64`.

use super::repositories::RecordStore;
use super::types::*;
use rusqlite::{
	Connection, OpenFlags, OptionalExtension, Row, TransactionBehavior, params,
};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// SQLite implementation of RecordStore
pub struct SqliteStore {
	conn: Mutex<Connection>,
}

impl SqliteStore {
	/// Open (or create) the database at `path` and initialize its schema.
	pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
		let path = path.as_ref();
		info!("Opening SQLite store at {}", path.display());

		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			std::fs::create_dir_all(parent)?;
		}

		let conn = Connection::open_with_flags(
			path,
			OpenFlags::SQLITE_OPEN_READ_WRITE
				| OpenFlags::SQLITE_OPEN_CREATE
				| OpenFlags::SQLITE_OPEN_NO_MUTEX,
		)?;
		conn.pragma_update(None, "journal_mode", "WAL")?;
		conn.pragma_update(None, "synchronous", "NORMAL")?;

		Self::from_connection(conn)
	}

	/// Open a private in-memory database.
	#[cfg(test)]
	pub fn open_in_memory() -> Result<Self, StoreError> {
		Self::from_connection(Connection::open_in_memory()?)
	}

	fn from_connection(conn: Connection) -> Result<Self, StoreError> {
		Self::init_schema(&conn)?;
		Ok(Self {
			conn: Mutex::new(conn),
		})
	}

	fn init_schema(conn: &Connection) -> Result<(), StoreError> {
		conn.execute_batch(
			r#"
			CREATE TABLE IF NOT EXISTS domains (
				domain_name TEXT PRIMARY KEY,
				ip_address TEXT,
				owner_address TEXT NOT NULL,
				website_code TEXT,
				purchase_date TEXT,
				transaction_hash TEXT,
				last_updated TEXT NOT NULL
			);

			CREATE TABLE IF NOT EXISTS ip_records (
				ip_address TEXT PRIMARY KEY,
				owner_address TEXT NOT NULL,
				website_code TEXT,
				creation_date TEXT NOT NULL,
				last_updated TEXT NOT NULL
			);

			CREATE TABLE IF NOT EXISTS transactions (
				transaction_hash TEXT PRIMARY KEY,
				transaction_type TEXT NOT NULL,
				from_address TEXT,
				to_address TEXT,
				domain_name TEXT,
				amount TEXT NOT NULL,
				status TEXT NOT NULL,
				timestamp TEXT NOT NULL
			);

			CREATE INDEX IF NOT EXISTS idx_domains_owner ON domains(owner_address);
			CREATE INDEX IF NOT EXISTS idx_ip_records_owner ON ip_records(owner_address);
			CREATE INDEX IF NOT EXISTS idx_transactions_domain ON transactions(domain_name);
			"#,
		)?;
		Ok(())
	}

	fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
		self.conn.lock().map_err(|_| StoreError::LockPoisoned)
	}

	fn read_domain(conn: &Connection, domain_name: &str) -> Result<Option<DomainRecord>, StoreError> {
		let record = conn
			.query_row(
				"SELECT domain_name, ip_address, owner_address, website_code, purchase_date,
				        transaction_hash, last_updated
				 FROM domains WHERE domain_name = ?1",
				params![domain_name],
				|row| {
					Ok(DomainRecord {
						domain_name: row.get(0)?,
						ip_address: row.get(1)?,
						owner_address: row.get(2)?,
						website_code: row.get(3)?,
						purchase_date: row.get(4)?,
						transaction_hash: row.get(5)?,
						last_updated: row.get(6)?,
					})
				},
			)
			.optional()?;
		Ok(record)
	}

	fn read_ip(conn: &Connection, ip_address: &str) -> Result<Option<IpRecord>, StoreError> {
		let record = conn
			.query_row(
				"SELECT ip_address, owner_address, website_code, creation_date, last_updated
				 FROM ip_records WHERE ip_address = ?1",
				params![ip_address],
				|row| {
					Ok(IpRecord {
						ip_address: row.get(0)?,
						owner_address: row.get(1)?,
						website_code: row.get(2)?,
						creation_date: row.get(3)?,
						last_updated: row.get(4)?,
					})
				},
			)
			.optional()?;
		Ok(record)
	}
}

const TRANSACTION_COLUMNS: &str = "transaction_hash, transaction_type, from_address, to_address, \
	domain_name, amount, status, timestamp";

/// Columns of a `transactions` row before the text-encoded fields are parsed.
struct TransactionRow {
	record: TransactionRecord,
	transaction_type: String,
	amount: String,
	status: String,
}

impl TransactionRow {
	fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
		Ok(Self {
			record: TransactionRecord {
				transaction_hash: row.get(0)?,
				transaction_type: TransactionType::Purchase,
				from_address: row.get(2)?,
				to_address: row.get(3)?,
				domain_name: row.get(4)?,
				amount: 0,
				status: TransactionStatus::Pending,
				timestamp: row.get(7)?,
			},
			transaction_type: row.get(1)?,
			amount: row.get(5)?,
			status: row.get(6)?,
		})
	}

	fn into_record(self) -> Result<TransactionRecord, StoreError> {
		let corrupt = |reason: String| StoreError::CorruptRecord {
			table: "transactions",
			reason,
		};
		let mut record = self.record;
		record.transaction_type = self.transaction_type.parse().map_err(corrupt)?;
		record.status = self.status.parse().map_err(corrupt)?;
		record.amount = self
			.amount
			.parse()
			.map_err(|_| corrupt(format!("amount `{}` is not a u64", self.amount)))?;
		Ok(record)
	}
}

#[async_trait::async_trait]
impl RecordStore for SqliteStore {
	async fn upsert_domain(
		&self,
		domain_name: &str,
		patch: DomainPatch,
	) -> Result<UpsertOutcome<DomainRecord>, StoreError> {
		let mut conn = self.lock()?;
		let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

		let updated = tx.execute(
			"UPDATE domains SET
				owner_address = ?2,
				ip_address = COALESCE(?3, ip_address),
				purchase_date = COALESCE(?4, purchase_date),
				transaction_hash = COALESCE(?5, transaction_hash),
				last_updated = ?6
			 WHERE domain_name = ?1",
			params![
				domain_name,
				patch.owner_address,
				patch.ip_address,
				patch.purchase_date,
				patch.transaction_hash,
				patch.updated_at,
			],
		)?;

		let created = updated == 0;
		if created {
			let record = patch.into_record(domain_name);
			tx.execute(
				"INSERT INTO domains (domain_name, ip_address, owner_address, website_code,
				                      purchase_date, transaction_hash, last_updated)
				 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
				params![
					record.domain_name,
					record.ip_address,
					record.owner_address,
					record.website_code,
					record.purchase_date,
					record.transaction_hash,
					record.last_updated,
				],
			)?;
		}

		let record = Self::read_domain(&tx, domain_name)?.ok_or_else(|| StoreError::CorruptRecord {
			table: "domains",
			reason: format!("{} vanished during upsert", domain_name),
		})?;
		tx.commit()?;

		Ok(UpsertOutcome { record, created })
	}

	async fn upsert_ip(
		&self,
		ip_address: &str,
		patch: IpPatch,
	) -> Result<UpsertOutcome<IpRecord>, StoreError> {
		let mut conn = self.lock()?;
		let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

		let updated = tx.execute(
			"UPDATE ip_records SET owner_address = ?2, last_updated = ?3 WHERE ip_address = ?1",
			params![ip_address, patch.owner_address, patch.updated_at],
		)?;

		let created = updated == 0;
		if created {
			let record = patch.into_record(ip_address);
			tx.execute(
				"INSERT INTO ip_records (ip_address, owner_address, website_code, creation_date,
				                         last_updated)
				 VALUES (?1, ?2, ?3, ?4, ?5)",
				params![
					record.ip_address,
					record.owner_address,
					record.website_code,
					record.creation_date,
					record.last_updated,
				],
			)?;
		}

		let record = Self::read_ip(&tx, ip_address)?.ok_or_else(|| StoreError::CorruptRecord {
			table: "ip_records",
			reason: format!("{} vanished during upsert", ip_address),
		})?;
		tx.commit()?;

		Ok(UpsertOutcome { record, created })
	}

	async fn insert_transaction_if_absent(
		&self,
		record: &TransactionRecord,
	) -> Result<bool, StoreError> {
		let conn = self.lock()?;
		let inserted = conn.execute(
			&format!(
				"INSERT INTO transactions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
				 ON CONFLICT(transaction_hash) DO NOTHING",
				TRANSACTION_COLUMNS
			),
			params![
				record.transaction_hash,
				record.transaction_type.as_str(),
				record.from_address,
				record.to_address,
				record.domain_name,
				record.amount.to_string(),
				record.status.as_str(),
				record.timestamp,
			],
		)?;
		Ok(inserted == 1)
	}

	async fn find_domain(&self, domain_name: &str) -> Result<Option<DomainRecord>, StoreError> {
		let conn = self.lock()?;
		Self::read_domain(&conn, domain_name)
	}

	async fn find_ip(&self, ip_address: &str) -> Result<Option<IpRecord>, StoreError> {
		let conn = self.lock()?;
		Self::read_ip(&conn, ip_address)
	}

	async fn find_transaction(
		&self,
		transaction_hash: &str,
	) -> Result<Option<TransactionRecord>, StoreError> {
		let conn = self.lock()?;
		let row = conn
			.query_row(
				&format!(
					"SELECT {} FROM transactions WHERE transaction_hash = ?1",
					TRANSACTION_COLUMNS
				),
				params![transaction_hash],
				TransactionRow::from_row,
			)
			.optional()?;
		row.map(TransactionRow::into_record).transpose()
	}

	async fn transactions_for_domain(
		&self,
		domain_name: &str,
	) -> Result<Vec<TransactionRecord>, StoreError> {
		let conn = self.lock()?;
		let mut stmt = conn.prepare(&format!(
			"SELECT {} FROM transactions WHERE domain_name = ?1
			 ORDER BY timestamp ASC, transaction_hash ASC",
			TRANSACTION_COLUMNS
		))?;
		let rows = stmt
			.query_map(params![domain_name], TransactionRow::from_row)?
			.collect::<rusqlite::Result<Vec<_>>>()?;
		rows.into_iter().map(TransactionRow::into_record).collect()
	}

	async fn ping(&self) -> Result<(), StoreError> {
		let conn = self.lock()?;
		conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
		Ok(())
	}

	fn name(&self) -> &'static str {
		"SqliteStore"
	}
}
