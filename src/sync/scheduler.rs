//! The sync loop.
//!
//! Each cycle walks the event kinds in a fixed order, fetching everything the source currently
//! returns for a kind and passing the events one at a time through the decoder and the
//! reconciler. Failures are contained: a failed fetch skips that kind, a bad event skips that
//! event, and the loop carries on with the next cycle regardless. After a kind is processed the
//! source is told how far it got; events from the first failed store write onwards are fetched
//! again next cycle.
//!
//! Cycles never overlap. The next cycle starts one interval after the previous one started, or
//! immediately if that cycle overran.

use super::events::decode_event;
use super::progress_tracker::CycleReport;
use super::reconciler::Reconciler;
use crate::context::SyncContext;
use crate::ledger::{EventKind, EventSource, RawEvent};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
	Idle,
	Fetching(EventKind),
	Processing(EventKind),
	/// The last cycle finished with at least one failure.
	FailedCycle,
}

pub struct SyncScheduler {
	source: Box<dyn EventSource>,
	reconciler: Reconciler,
	interval: Duration,
	state: SchedulerState,
	cycles: u64,
	events_applied: usize,
}

impl SyncScheduler {
	pub fn new(context: SyncContext) -> Self {
		let SyncContext {
			config,
			source,
			store,
		} = context;

		Self {
			source,
			reconciler: Reconciler::new(store),
			interval: config.sync_interval,
			state: SchedulerState::Idle,
			cycles: 0,
			events_applied: 0,
		}
	}

	/// Run one full pass over every event kind.
	pub async fn run_cycle(&mut self) -> CycleReport {
		self.cycles += 1;
		let started = Instant::now();
		let mut report = CycleReport::new(self.cycles);

		for kind in EventKind::ALL {
			self.state = SchedulerState::Fetching(kind);
			let events = match self.source.fetch_events(kind).await {
				Ok(events) => events,
				Err(e) => {
					error!(
						"Failed to fetch {} events from {}: {}",
						kind,
						self.source.name(),
						e
					);
					report.record_fetch_failure(kind);
					continue;
				}
			};
			report.record_fetched(kind, events.len());

			self.state = SchedulerState::Processing(kind);
			let mut committable = None;
			let mut held_back = false;
			for raw in &events {
				let stored = self.process_event(kind, raw, &mut report).await;
				if !stored {
					held_back = true;
				} else if !held_back {
					committable = Some(&raw.id);
				}
			}
			if let Some(through) = committable {
				self.source.commit(kind, through);
			}
			if held_back {
				debug!(
					"Holding back {} events from the first failed write until the next cycle",
					kind
				);
			}
		}

		report.elapsed = started.elapsed();
		self.state = if report.is_degraded() {
			SchedulerState::FailedCycle
		} else {
			SchedulerState::Idle
		};
		report
	}

	/// Decode and apply one event. Returns `false` only when the store write failed, since a
	/// retry may succeed; undecodable events count as handled.
	async fn process_event(&self, kind: EventKind, raw: &RawEvent, report: &mut CycleReport) -> bool {
		debug!(
			"Processing {} event {}:{} from {}: {}",
			kind,
			raw.id.tx_digest,
			raw.id.event_seq,
			raw.sender.as_deref().unwrap_or("unknown sender"),
			raw.parsed_json
		);

		let event = match decode_event(raw) {
			Ok(event) => event,
			Err(e) => {
				warn!("Skipping event from {}: {}", raw.id.tx_digest, e);
				report.record_decode_failure(kind);
				return true;
			}
		};

		match self.reconciler.apply(&event).await {
			Ok(result) => {
				report.record_applied(kind, result);
				true
			}
			Err(e) => {
				warn!(
					"Skipping {} event {}:{}: {}",
					event.event.kind(),
					event.tx_digest,
					event.event_seq,
					e
				);
				report.record_store_failure(kind);
				false
			}
		}
	}

	/// Run cycles until `shutdown` resolves. The first cycle starts immediately.
	pub async fn run_until<F>(&mut self, shutdown: F)
	where
		F: Future<Output = ()>,
	{
		tokio::pin!(shutdown);
		info!("Sync loop started, running every {:?}", self.interval);

		loop {
			let next_tick = Instant::now() + self.interval;

			tokio::select! {
				biased;
				_ = &mut shutdown => break,
				report = self.run_cycle() => {
					self.events_applied += report.total_applied();
					if report.is_degraded() {
						warn!("{}", report.summary());
					} else {
						info!("{}", report.summary());
					}
				}
			}
			if self.state == SchedulerState::FailedCycle {
				self.state = SchedulerState::Idle;
			}

			tokio::select! {
				biased;
				_ = &mut shutdown => break,
				_ = sleep_until(next_tick) => {}
			}
		}

		if let SchedulerState::Fetching(kind) | SchedulerState::Processing(kind) = self.state {
			warn!(
				"Shutdown interrupted cycle {} while handling {} events",
				self.cycles, kind
			);
		}
		self.state = SchedulerState::Idle;
		info!(
			"Sync loop stopped after {} cycles, {} events applied",
			self.cycles, self.events_applied
		);
	}
}
