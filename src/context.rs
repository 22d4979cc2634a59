//! Everything a sync run needs, assembled once at start-up.

use crate::config::Config;
use crate::ledger::{EventSource, LedgerError, SuiEventClient};
use crate::store::{RecordStore, StoreError, open_store};
use std::sync::Arc;
use tracing::info;

/// Start-up failures. Any of these stops the process.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
	#[error("Store unavailable: {0}")]
	StoreError(#[from] StoreError),

	#[error("Ledger unavailable: {0}")]
	LedgerError(#[from] LedgerError),
}

pub struct SyncContext {
	pub config: Config,
	pub source: Box<dyn EventSource>,
	pub store: Arc<dyn RecordStore>,
}

impl SyncContext {
	/// Open the store and the Sui client, verifying both are reachable.
	pub async fn connect(config: Config) -> Result<Self, StartupError> {
		let store = open_store(&config.store)?;
		store.ping().await?;

		let client = SuiEventClient::new(&config)?;
		client.check_connection().await?;
		info!(
			"{} ready for package {} ({:?} fetch policy)",
			client.name(),
			config.package_id,
			config.fetch_policy
		);

		Ok(Self::from_parts(config, Box::new(client), store))
	}

	pub fn from_parts(
		config: Config,
		source: Box<dyn EventSource>,
		store: Arc<dyn RecordStore>,
	) -> Self {
		Self {
			config,
			source,
			store,
		}
	}
}
