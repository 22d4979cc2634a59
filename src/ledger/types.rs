//! Types for Sui JSON-RPC event queries.

use crate::utils::json::opt_u64_from_str_or_num;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Move module that emits the domain-service events.
pub const DOMAIN_SERVICE_MODULE: &str = "domainservice";

/// Domain-registry events tracked by the sync service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
	DomainAssigned,
	IpAllotted,
	DomainPurchased,
}

impl EventKind {
	/// Every tracked kind, in the order a sync cycle processes them.
	pub const ALL: [EventKind; 3] = [
		EventKind::DomainAssigned,
		EventKind::IpAllotted,
		EventKind::DomainPurchased,
	];

	/// The event struct name declared in the Move module.
	pub fn event_name(self) -> &'static str {
		match self {
			EventKind::DomainAssigned => "DomainAssigned",
			EventKind::IpAllotted => "IPAllotted",
			EventKind::DomainPurchased => "DomainPurchased",
		}
	}

	/// Fully qualified Move event type used as the query selector.
	pub fn selector(self, package_id: &str) -> String {
		format!(
			"{}::{}::{}",
			package_id,
			DOMAIN_SERVICE_MODULE,
			self.event_name()
		)
	}

	/// Resolve the kind from an event type tag such as `0x2a::domainservice::DomainAssigned`.
	///
	/// Type arguments are ignored. Events from any other module are not recognised.
	pub fn from_type_tag(tag: &str) -> Option<Self> {
		let base = tag.split('<').next().unwrap_or(tag).trim();
		let mut segments = base.rsplitn(3, "::");
		let name = segments.next()?;
		let module = segments.next()?;
		if module != DOMAIN_SERVICE_MODULE {
			return None;
		}
		EventKind::ALL
			.into_iter()
			.find(|kind| kind.event_name() == name)
	}
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.event_name())
	}
}

/// Identifier of an emitted event, also used as the pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventId {
	/// Digest of the transaction that emitted the event.
	pub tx_digest: String,
	/// Position of the event within its transaction.
	pub event_seq: String,
}

/// An event as returned by `suix_queryEvents`, payload still untyped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
	pub id: EventId,
	/// Fully qualified Move event type.
	#[serde(rename = "type")]
	pub event_type: String,
	#[serde(default)]
	pub sender: Option<String>,
	/// The event's fields rendered as JSON by the full node.
	#[serde(default)]
	pub parsed_json: serde_json::Value,
	/// Checkpoint timestamp in milliseconds, when the node reports one.
	#[serde(default, deserialize_with = "opt_u64_from_str_or_num")]
	pub timestamp_ms: Option<u64>,
}

/// One page of `suix_queryEvents` results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
	pub data: Vec<RawEvent>,
	#[serde(default)]
	pub next_cursor: Option<EventId>,
	#[serde(default)]
	pub has_next_page: bool,
}

/// How the event source positions each cycle's query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
	/// Re-read the full event history every cycle and rely on idempotent reconciliation.
	#[default]
	Rescan,
	/// Resume from the last cursor seen for each event kind.
	Incremental,
}

impl FromStr for FetchPolicy {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"rescan" | "full" => Ok(FetchPolicy::Rescan),
			"incremental" | "cursor" => Ok(FetchPolicy::Incremental),
			other => Err(format!("expected `rescan` or `incremental`, got `{}`", other)),
		}
	}
}

/// Public Sui networks with a well-known full node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiNetwork {
	Mainnet,
	Testnet,
	Devnet,
	Localnet,
}

impl SuiNetwork {
	/// JSON-RPC endpoint of the network's public full node.
	pub fn fullnode_url(self) -> &'static str {
		match self {
			SuiNetwork::Mainnet => "https://fullnode.mainnet.sui.io:443",
			SuiNetwork::Testnet => "https://fullnode.testnet.sui.io:443",
			SuiNetwork::Devnet => "https://fullnode.devnet.sui.io:443",
			SuiNetwork::Localnet => "http://127.0.0.1:9000",
		}
	}
}

impl FromStr for SuiNetwork {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"mainnet" => Ok(SuiNetwork::Mainnet),
			"testnet" => Ok(SuiNetwork::Testnet),
			"devnet" => Ok(SuiNetwork::Devnet),
			"localnet" => Ok(SuiNetwork::Localnet),
			other => Err(format!("unknown Sui network `{}`", other)),
		}
	}
}

/// Error types for ledger RPC operations
#[allow(clippy::enum_variant_names)]
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
	#[error("HTTP error: {0}")]
	HttpError(#[from] reqwest::Error),

	#[error("HTTP status {0}")]
	StatusError(reqwest::StatusCode),

	#[error("JSON-RPC error {code}: {message}")]
	RpcError { code: i64, message: String },

	#[error("JSON parse error: {0}")]
	JsonError(#[from] serde_json::Error),

	#[error("No data returned")]
	NoData,

	#[error("Object {0} not found on chain")]
	ObjectNotFound(String),
}
