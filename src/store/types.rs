//! Records mirrored from the domain registry, and the partial updates applied to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A registered domain name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
	pub domain_name: String,
	/// Empty until a `DomainAssigned` event is seen for the domain.
	pub ip_address: Option<String>,
	/// Most recent owner observed on chain.
	pub owner_address: String,
	/// Website payload managed by the HTTP layer; preserved, never written here.
	pub website_code: Option<String>,
	pub purchase_date: Option<DateTime<Utc>>,
	/// Digest of the latest purchase transaction.
	pub transaction_hash: Option<String>,
	pub last_updated: DateTime<Utc>,
}

/// An allotted IP address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpRecord {
	pub ip_address: String,
	pub owner_address: String,
	pub website_code: Option<String>,
	pub creation_date: DateTime<Utc>,
	pub last_updated: DateTime<Utc>,
}

/// An immutable record of a value-carrying ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
	pub transaction_hash: String,
	pub transaction_type: TransactionType,
	pub from_address: Option<String>,
	pub to_address: Option<String>,
	pub domain_name: Option<String>,
	/// Amount in MIST.
	pub amount: u64,
	pub status: TransactionStatus,
	pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
	Purchase,
	Transfer,
	AllotIp,
	AssignDomain,
	WithdrawFees,
}

impl TransactionType {
	pub fn as_str(self) -> &'static str {
		match self {
			TransactionType::Purchase => "PURCHASE",
			TransactionType::Transfer => "TRANSFER",
			TransactionType::AllotIp => "ALLOT_IP",
			TransactionType::AssignDomain => "ASSIGN_DOMAIN",
			TransactionType::WithdrawFees => "WITHDRAW_FEES",
		}
	}
}

impl FromStr for TransactionType {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"PURCHASE" => Ok(TransactionType::Purchase),
			"TRANSFER" => Ok(TransactionType::Transfer),
			"ALLOT_IP" => Ok(TransactionType::AllotIp),
			"ASSIGN_DOMAIN" => Ok(TransactionType::AssignDomain),
			"WITHDRAW_FEES" => Ok(TransactionType::WithdrawFees),
			other => Err(format!("unknown transaction type `{}`", other)),
		}
	}
}

impl fmt::Display for TransactionType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
	Pending,
	Confirmed,
	Failed,
}

impl TransactionStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			TransactionStatus::Pending => "PENDING",
			TransactionStatus::Confirmed => "CONFIRMED",
			TransactionStatus::Failed => "FAILED",
		}
	}
}

impl FromStr for TransactionStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"PENDING" => Ok(TransactionStatus::Pending),
			"CONFIRMED" => Ok(TransactionStatus::Confirmed),
			"FAILED" => Ok(TransactionStatus::Failed),
			other => Err(format!("unknown transaction status `{}`", other)),
		}
	}
}

/// The domain fields an event governs. `None` leaves the stored value untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainPatch {
	pub owner_address: String,
	pub ip_address: Option<String>,
	pub purchase_date: Option<DateTime<Utc>>,
	pub transaction_hash: Option<String>,
	pub updated_at: DateTime<Utc>,
}

impl DomainPatch {
	/// Materialize a new record for a domain that is not stored yet.
	pub fn into_record(self, domain_name: &str) -> DomainRecord {
		DomainRecord {
			domain_name: domain_name.to_string(),
			ip_address: self.ip_address,
			owner_address: self.owner_address,
			website_code: None,
			purchase_date: self.purchase_date,
			transaction_hash: self.transaction_hash,
			last_updated: self.updated_at,
		}
	}

	/// Merge into an existing record, touching only the governed fields.
	pub fn apply_to(self, record: &mut DomainRecord) {
		record.owner_address = self.owner_address;
		if let Some(ip_address) = self.ip_address {
			record.ip_address = Some(ip_address);
		}
		if let Some(purchase_date) = self.purchase_date {
			record.purchase_date = Some(purchase_date);
		}
		if let Some(transaction_hash) = self.transaction_hash {
			record.transaction_hash = Some(transaction_hash);
		}
		record.last_updated = self.updated_at;
	}
}

/// The IP record fields an `IPAllotted` event governs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpPatch {
	pub owner_address: String,
	pub updated_at: DateTime<Utc>,
}

impl IpPatch {
	pub fn into_record(self, ip_address: &str) -> IpRecord {
		IpRecord {
			ip_address: ip_address.to_string(),
			owner_address: self.owner_address,
			website_code: None,
			creation_date: self.updated_at,
			last_updated: self.updated_at,
		}
	}

	pub fn apply_to(self, record: &mut IpRecord) {
		record.owner_address = self.owner_address;
		record.last_updated = self.updated_at;
	}
}

/// Result of a keyed upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome<T> {
	/// The record as stored after the upsert.
	pub record: T,
	/// Whether the key was absent before the upsert.
	pub created: bool,
}

/// Where records are persisted, parsed from a store connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
	/// A SQLite database file.
	Sqlite(PathBuf),
	/// A process-local store that is lost on exit.
	Memory,
}

impl FromStr for StoreBackend {
	type Err = String;

	/// Accepts `sqlite://<path>`, a bare file path, or `memory://`.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s == "memory" || s == "memory://" {
			return Ok(StoreBackend::Memory);
		}
		if let Some(path) = s.strip_prefix("sqlite://") {
			if path.is_empty() {
				return Err("sqlite store URL has no path".to_string());
			}
			return Ok(StoreBackend::Sqlite(PathBuf::from(path)));
		}
		if let Some((scheme, _)) = s.split_once("://") {
			return Err(format!("unsupported store scheme `{}`", scheme));
		}
		Ok(StoreBackend::Sqlite(PathBuf::from(s)))
	}
}

impl fmt::Display for StoreBackend {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StoreBackend::Sqlite(path) => write!(f, "sqlite://{}", path.display()),
			StoreBackend::Memory => f.write_str("memory://"),
		}
	}
}

/// Error types for store operations
#[allow(clippy::enum_variant_names)]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("Database error: {0}")]
	DatabaseError(#[from] rusqlite::Error),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	#[error("Corrupt {table} row: {reason}")]
	CorruptRecord { table: &'static str, reason: String },

	#[error("Store lock poisoned")]
	LockPoisoned,
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use serde_json::json;

	fn at(secs: i64) -> DateTime<Utc> {
		Utc.timestamp_opt(secs, 0).unwrap()
	}

	#[test]
	fn domain_patch_leaves_unmentioned_fields_alone() {
		let mut record = DomainPatch {
			owner_address: "0x1".to_string(),
			ip_address: Some("10.0.0.1".to_string()),
			purchase_date: None,
			transaction_hash: None,
			updated_at: at(1),
		}
		.into_record("a.sui");
		record.website_code = Some("<html/>".to_string());

		DomainPatch {
			owner_address: "0x2".to_string(),
			ip_address: None,
			purchase_date: Some(at(2)),
			transaction_hash: Some("T1".to_string()),
			updated_at: at(2),
		}
		.apply_to(&mut record);

		assert_eq!(record.owner_address, "0x2");
		assert_eq!(record.ip_address.as_deref(), Some("10.0.0.1"));
		assert_eq!(record.website_code.as_deref(), Some("<html/>"));
		assert_eq!(record.transaction_hash.as_deref(), Some("T1"));
		assert_eq!(record.last_updated, at(2));
	}

	#[test]
	fn ip_patch_keeps_creation_date() {
		let mut record = IpPatch {
			owner_address: "0x1".to_string(),
			updated_at: at(1),
		}
		.into_record("1.2.3.4");
		IpPatch {
			owner_address: "0x2".to_string(),
			updated_at: at(5),
		}
		.apply_to(&mut record);

		assert_eq!(record.creation_date, at(1));
		assert_eq!(record.last_updated, at(5));
		assert_eq!(record.owner_address, "0x2");
	}

	#[test]
	fn records_serialize_for_the_query_layer() {
		let record = TransactionRecord {
			transaction_hash: "T1".to_string(),
			transaction_type: TransactionType::AllotIp,
			from_address: None,
			to_address: Some("0x2".to_string()),
			domain_name: Some("a.sui".to_string()),
			amount: 10,
			status: TransactionStatus::Confirmed,
			timestamp: at(0),
		};
		let value = serde_json::to_value(&record).unwrap();
		assert_eq!(value["transactionHash"], json!("T1"));
		assert_eq!(value["transactionType"], json!("ALLOT_IP"));
		assert_eq!(value["status"], json!("CONFIRMED"));
		assert_eq!(value["toAddress"], json!("0x2"));
	}

	#[test]
	fn enum_names_round_trip_through_strings() {
		for t in [
			TransactionType::Purchase,
			TransactionType::Transfer,
			TransactionType::AllotIp,
			TransactionType::AssignDomain,
			TransactionType::WithdrawFees,
		] {
			assert_eq!(t.as_str().parse::<TransactionType>(), Ok(t));
		}
		assert_eq!("FAILED".parse::<TransactionStatus>(), Ok(TransactionStatus::Failed));
		assert!("LOST".parse::<TransactionStatus>().is_err());
	}

	#[test]
	fn parses_store_urls() {
		assert_eq!("memory://".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
		assert_eq!(
			"sqlite://data/sui-dns.db".parse::<StoreBackend>(),
			Ok(StoreBackend::Sqlite(PathBuf::from("data/sui-dns.db")))
		);
		assert_eq!(
			"sui-dns.db".parse::<StoreBackend>(),
			Ok(StoreBackend::Sqlite(PathBuf::from("sui-dns.db")))
		);
		assert!("mongodb://localhost:27017/sui-dns".parse::<StoreBackend>().is_err());
		assert!("sqlite://".parse::<StoreBackend>().is_err());
	}
}
