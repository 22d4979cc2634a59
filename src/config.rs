//! Service configuration read from the environment.

use crate::ledger::{FetchPolicy, SuiNetwork};
use crate::store::StoreBackend;
use crate::utils::normalize_sui_address;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_STORE_URL: &str = "sqlite://sui-dns.db";
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 60;
const DEFAULT_PAGE_SIZE: u32 = 50;
/// Upper bound the full node enforces on `suix_queryEvents` page size.
const MAX_PAGE_SIZE: u32 = 50;
const DEFAULT_MAX_PAGES_PER_CYCLE: u32 = 100;
const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RPC_MAX_RETRY_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Missing required environment variable {0}")]
	Missing(&'static str),

	#[error("Invalid value {value:?} for {key}: {reason}")]
	Invalid {
		key: &'static str,
		value: String,
		reason: String,
	},
}

#[derive(Debug, Clone)]
pub struct Config {
	/// Package whose `domainservice` events are tracked.
	pub package_id: String,
	pub domain_registry_id: Option<String>,
	pub ip_registry_id: Option<String>,
	pub rpc_url: String,
	pub store: StoreBackend,
	pub sync_interval: Duration,
	pub fetch_policy: FetchPolicy,
	pub page_size: u32,
	/// Page cap per event kind per cycle, applied to incremental fetches.
	pub max_pages_per_cycle: u32,
	pub rpc_timeout: Duration,
	pub rpc_max_retry: Duration,
}

impl Config {
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Build the configuration from an arbitrary variable lookup. Blank values count as unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| {
			lookup(key)
				.map(|value| value.trim().to_string())
				.filter(|value| !value.is_empty())
		};

		let package_id = sui_object_id(
			"DOMAIN_SERVICE_PACKAGE_ID",
			get("DOMAIN_SERVICE_PACKAGE_ID")
				.ok_or(ConfigError::Missing("DOMAIN_SERVICE_PACKAGE_ID"))?,
		)?;
		let domain_registry_id = get("DOMAIN_REGISTRY_ID")
			.map(|value| sui_object_id("DOMAIN_REGISTRY_ID", value))
			.transpose()?;
		let ip_registry_id = get("IP_REGISTRY_ID")
			.map(|value| sui_object_id("IP_REGISTRY_ID", value))
			.transpose()?;

		let network: SuiNetwork = parse_or("SUI_NETWORK", get("SUI_NETWORK"), SuiNetwork::Testnet)?;
		let rpc_url = get("SUI_RPC_URL").unwrap_or_else(|| network.fullnode_url().to_string());

		let store_url = get("STORE_URL").unwrap_or_else(|| DEFAULT_STORE_URL.to_string());
		let store: StoreBackend = store_url
			.parse()
			.map_err(|e: String| invalid("STORE_URL", &store_url, &e))?;

		let sync_interval_secs: u64 = parse_or(
			"SYNC_INTERVAL_SECS",
			get("SYNC_INTERVAL_SECS"),
			DEFAULT_SYNC_INTERVAL_SECS,
		)?;
		if sync_interval_secs == 0 {
			return Err(invalid("SYNC_INTERVAL_SECS", "0", "must be at least 1"));
		}

		let fetch_policy = parse_or(
			"SYNC_FETCH_POLICY",
			get("SYNC_FETCH_POLICY"),
			FetchPolicy::default(),
		)?;

		let page_size: u32 = parse_or("EVENT_PAGE_SIZE", get("EVENT_PAGE_SIZE"), DEFAULT_PAGE_SIZE)?;
		if page_size == 0 || page_size > MAX_PAGE_SIZE {
			return Err(invalid(
				"EVENT_PAGE_SIZE",
				&page_size.to_string(),
				&format!("must be between 1 and {}", MAX_PAGE_SIZE),
			));
		}

		let max_pages_per_cycle: u32 = parse_or(
			"MAX_PAGES_PER_CYCLE",
			get("MAX_PAGES_PER_CYCLE"),
			DEFAULT_MAX_PAGES_PER_CYCLE,
		)?;
		if max_pages_per_cycle == 0 {
			return Err(invalid("MAX_PAGES_PER_CYCLE", "0", "must be at least 1"));
		}

		let rpc_timeout_secs: u64 = parse_or(
			"RPC_TIMEOUT_SECS",
			get("RPC_TIMEOUT_SECS"),
			DEFAULT_RPC_TIMEOUT_SECS,
		)?;
		let rpc_max_retry_secs: u64 = parse_or(
			"RPC_MAX_RETRY_SECS",
			get("RPC_MAX_RETRY_SECS"),
			DEFAULT_RPC_MAX_RETRY_SECS,
		)?;

		Ok(Config {
			package_id,
			domain_registry_id,
			ip_registry_id,
			rpc_url,
			store,
			sync_interval: Duration::from_secs(sync_interval_secs),
			fetch_policy,
			page_size,
			max_pages_per_cycle,
			rpc_timeout: Duration::from_secs(rpc_timeout_secs),
			rpc_max_retry: Duration::from_secs(rpc_max_retry_secs),
		})
	}

	/// Registry objects that must exist on chain at start-up.
	pub fn registry_ids(&self) -> impl Iterator<Item = &str> {
		self.domain_registry_id
			.iter()
			.chain(self.ip_registry_id.iter())
			.map(String::as_str)
	}
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
	ConfigError::Invalid {
		key,
		value: value.to_string(),
		reason: reason.to_string(),
	}
}

fn parse_or<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	match value {
		None => Ok(default),
		Some(value) => value
			.parse()
			.map_err(|e: T::Err| invalid(key, &value, &e.to_string())),
	}
}

fn sui_object_id(key: &'static str, value: String) -> Result<String, ConfigError> {
	normalize_sui_address(&value).ok_or_else(|| invalid(key, &value, "not a 0x-prefixed hex object id"))
}
