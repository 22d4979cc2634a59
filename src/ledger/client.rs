//! JSON-RPC client for a Sui full node.
//!
//! This module provides the production [`EventSource`]: it queries `suix_queryEvents` for the
//! domain-service events of one package, pages through the results, and retries transient
//! transport failures with exponential backoff. Every request carries a timeout.

use super::source::{CursorBook, EventSource};
use super::types::*;
use crate::config::Config;
use backoff::{ExponentialBackoffBuilder, future::retry};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sui JSON-RPC event client
#[derive(Clone)]
pub struct SuiEventClient {
	/// The underlying HTTP client for JSON-RPC calls.
	http_client: Client,
	/// The full node JSON-RPC endpoint.
	rpc_url: String,
	/// Package whose `domainservice` events are queried.
	package_id: String,
	/// Registry objects that must exist on chain.
	registry_ids: Vec<String>,
	page_size: u32,
	max_pages_per_cycle: u32,
	/// Upper bound on time spent retrying a single RPC.
	max_retry_elapsed: Duration,
	cursors: CursorBook,
}

impl SuiEventClient {
	/// Create a new client from the service configuration.
	///
	/// # Errors
	/// Returns `LedgerError::HttpError` if the HTTP client cannot be constructed.
	pub fn new(config: &Config) -> Result<Self, LedgerError> {
		let http_client = Client::builder().timeout(config.rpc_timeout).build()?;

		Ok(Self {
			http_client,
			rpc_url: config.rpc_url.clone(),
			package_id: config.package_id.clone(),
			registry_ids: config.registry_ids().map(str::to_string).collect(),
			page_size: config.page_size,
			max_pages_per_cycle: config.max_pages_per_cycle,
			max_retry_elapsed: config.rpc_max_retry,
			cursors: CursorBook::new(config.fetch_policy),
		})
	}

	/// Execute a JSON-RPC call, retrying transient failures.
	///
	/// Transport errors and HTTP 429/5xx responses are retried until `max_retry_elapsed` has
	/// passed. JSON-RPC error objects and other HTTP statuses fail immediately.
	///
	/// # Returns
	/// The `result` member of the response.
	pub async fn execute_rpc(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
		let request_body = json!({
			"jsonrpc": "2.0",
			"id": 1,
			"method": method,
			"params": params,
		});

		let policy = ExponentialBackoffBuilder::new()
			.with_max_elapsed_time(Some(self.max_retry_elapsed))
			.build();

		let http_client = &self.http_client;
		let rpc_url = self.rpc_url.as_str();
		let request_body = &request_body;

		let response_json = retry(policy, move || async move {
			let response = http_client
				.post(rpc_url)
				.json(request_body)
				.send()
				.await
				.map_err(|e| {
					warn!("RPC {} send error (will retry): {}", method, e);
					backoff::Error::transient(LedgerError::HttpError(e))
				})?;

			let status = response.status();
			if is_transient_status(status) {
				warn!("RPC {} returned {} (will retry)", method, status);
				return Err(backoff::Error::transient(LedgerError::StatusError(status)));
			}
			if !status.is_success() {
				return Err(backoff::Error::permanent(LedgerError::StatusError(status)));
			}

			response.json::<Value>().await.map_err(|e| {
				if e.is_decode() {
					backoff::Error::permanent(LedgerError::HttpError(e))
				} else {
					backoff::Error::transient(LedgerError::HttpError(e))
				}
			})
		})
		.await?;

		extract_rpc_result(response_json)
	}

	/// Query a single page of events of one kind, starting after `cursor`.
	pub async fn query_events_page(
		&self,
		kind: EventKind,
		cursor: Option<&EventId>,
	) -> Result<EventPage, LedgerError> {
		let selector = kind.selector(&self.package_id);
		let params = query_events_params(&selector, cursor, self.page_size);
		let result = self.execute_rpc("suix_queryEvents", params).await?;
		Ok(serde_json::from_value(result)?)
	}
}

#[async_trait::async_trait]
impl EventSource for SuiEventClient {
	async fn fetch_events(&mut self, kind: EventKind) -> Result<Vec<RawEvent>, LedgerError> {
		let policy = self.cursors.policy();
		let mut cursor = self.cursors.start_cursor(kind);
		let mut events = Vec::new();
		let mut pages = 0u32;

		loop {
			let page = self.query_events_page(kind, cursor.as_ref()).await?;
			pages += 1;
			debug!(
				"Fetched page {} of {} events: {} events, has_next_page={}",
				pages,
				kind,
				page.data.len(),
				page.has_next_page
			);

			events.extend(page.data);
			if !page.has_next_page {
				break;
			}
			match page.next_cursor {
				Some(next) => cursor = Some(next),
				None => {
					warn!(
						"Node reported more {} events without a next cursor; ending fetch after {} pages",
						kind, pages
					);
					break;
				}
			}
			// A full re-scan must reach the newest events, so only incremental fetches are capped.
			if policy == FetchPolicy::Incremental && pages >= self.max_pages_per_cycle {
				info!(
					"Reached {} pages of {} events; remaining events deferred to the next cycle",
					pages, kind
				);
				break;
			}
		}

		Ok(events)
	}

	fn commit(&mut self, kind: EventKind, through: &EventId) {
		if self.cursors.policy() == FetchPolicy::Incremental {
			debug!(
				"Committing {} cursor at {}:{}",
				kind, through.tx_digest, through.event_seq
			);
		}
		self.cursors.advance(kind, through.clone());
	}

	async fn check_connection(&self) -> Result<(), LedgerError> {
		let chain_id = self
			.execute_rpc("sui_getChainIdentifier", json!([]))
			.await?;
		info!("Connected to Sui RPC {} (chain {})", self.rpc_url, chain_id);

		for object_id in &self.registry_ids {
			let object = self
				.execute_rpc("sui_getObject", json!([object_id, { "showType": true }]))
				.await?;
			let data = object.get("data").filter(|data| !data.is_null());
			let Some(data) = data else {
				return Err(LedgerError::ObjectNotFound(object_id.clone()));
			};
			let object_type = data
				.get("type")
				.and_then(serde_json::Value::as_str)
				.unwrap_or("unknown");
			debug!("Registry object {} present with type {}", object_id, object_type);
		}

		Ok(())
	}

	fn name(&self) -> &'static str {
		"SuiEventClient"
	}
}

/// Positional parameters for `suix_queryEvents`, ascending order.
fn query_events_params(selector: &str, cursor: Option<&EventId>, limit: u32) -> Value {
	json!([{ "MoveEventType": selector }, cursor, limit, false])
}

fn is_transient_status(status: StatusCode) -> bool {
	status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Pull the `result` out of a JSON-RPC response, surfacing an `error` object as `RpcError`.
fn extract_rpc_result(mut response: Value) -> Result<Value, LedgerError> {
	if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
		return Err(LedgerError::RpcError {
			code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
			message: error
				.get("message")
				.and_then(Value::as_str)
				.unwrap_or("Unknown RPC error")
				.to_string(),
		});
	}

	match response.get_mut("result").map(Value::take) {
		None | Some(Value::Null) => Err(LedgerError::NoData),
		Some(result) => Ok(result),
	}
}
