mod config;
mod context;
mod ledger;
mod store;
mod sync;
mod utils;

use std::process;
use tracing::{error, info};

use crate::config::Config;
use crate::context::SyncContext;
use crate::sync::SyncScheduler;

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env()
				.add_directive(tracing::Level::INFO.into()),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	info!("Starting Sui domain registry sync service");

	let config = match Config::from_env() {
		Ok(config) => config,
		Err(e) => {
			error!("Invalid configuration: {}", e);
			process::exit(1);
		}
	};
	info!(
		"Using RPC {} and store {}, syncing every {:?}",
		config.rpc_url, config.store, config.sync_interval
	);

	let context = match SyncContext::connect(config).await {
		Ok(context) => context,
		Err(e) => {
			error!("Startup failed: {}", e);
			process::exit(1);
		}
	};

	let mut scheduler = SyncScheduler::new(context);
	scheduler.run_until(shutdown_signal()).await;

	info!("Sync service stopped");
}

async fn shutdown_signal() {
	match tokio::signal::ctrl_c().await {
		Ok(()) => info!("Received Ctrl-C, shutting down"),
		Err(e) => {
			error!("Failed to listen for Ctrl-C: {}", e);
			std::future::pending::<()>().await;
		}
	}
}
