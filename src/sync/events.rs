//! Decoding of raw ledger events into typed domain events.
//!
//! The decoder is the only place that reads event payloads. Everything downstream works with the
//! closed [`DomainEvent`] enum, so a payload that does not match its event's shape is rejected
//! here as a [`DecodeError`] and never reaches the store. Field values are kept exactly as the
//! ledger reports them.

use super::types::DecodeError;
use crate::ledger::{EventKind, RawEvent};
use crate::utils::json::{string_or_utf8_bytes, u64_from_str_or_num};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Registry events the service reconciles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
	/// A domain was pointed at an IP address
	DomainAssigned {
		domain_name: String,
		ip_address: String,
		owner: String,
	},
	/// An IP address was allotted to an owner
	IpAllotted { ip_address: String, owner: String },
	/// A domain changed hands for `price` MIST
	DomainPurchased {
		domain_name: String,
		new_owner: String,
		price: u64,
	},
}

impl DomainEvent {
	pub fn kind(&self) -> EventKind {
		match self {
			DomainEvent::DomainAssigned { .. } => EventKind::DomainAssigned,
			DomainEvent::IpAllotted { .. } => EventKind::IpAllotted,
			DomainEvent::DomainPurchased { .. } => EventKind::DomainPurchased,
		}
	}
}

/// A decoded event together with where and when it happened on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEvent {
	pub tx_digest: String,
	pub event_seq: String,
	pub timestamp: Option<DateTime<Utc>>,
	pub event: DomainEvent,
}

#[derive(Deserialize)]
struct DomainAssignedPayload {
	#[serde(deserialize_with = "string_or_utf8_bytes")]
	domain_name: String,
	#[serde(deserialize_with = "string_or_utf8_bytes")]
	ip_address: String,
	owner: String,
}

#[derive(Deserialize)]
struct IpAllottedPayload {
	#[serde(deserialize_with = "string_or_utf8_bytes")]
	ip_address: String,
	owner: String,
}

#[derive(Deserialize)]
struct DomainPurchasedPayload {
	#[serde(deserialize_with = "string_or_utf8_bytes")]
	domain_name: String,
	new_owner: String,
	#[serde(deserialize_with = "u64_from_str_or_num")]
	price: u64,
}

/// Decode a raw event into a [`LedgerEvent`].
pub fn decode_event(raw: &RawEvent) -> Result<LedgerEvent, DecodeError> {
	let kind = EventKind::from_type_tag(&raw.event_type)
		.ok_or_else(|| DecodeError::UnknownEventType(raw.event_type.clone()))?;

	if raw.id.tx_digest.trim().is_empty() {
		return Err(DecodeError::MissingDigest);
	}

	let timestamp = raw
		.timestamp_ms
		.map(|ms| {
			i64::try_from(ms)
				.ok()
				.and_then(DateTime::<Utc>::from_timestamp_millis)
				.ok_or(DecodeError::InvalidTimestamp(ms))
		})
		.transpose()?;

	let event = match kind {
		EventKind::DomainAssigned => {
			let payload: DomainAssignedPayload = parse_payload(kind, raw)?;
			DomainEvent::DomainAssigned {
				domain_name: non_empty(kind, "domain_name", payload.domain_name)?,
				ip_address: non_empty(kind, "ip_address", payload.ip_address)?,
				owner: non_empty(kind, "owner", payload.owner)?,
			}
		}
		EventKind::IpAllotted => {
			let payload: IpAllottedPayload = parse_payload(kind, raw)?;
			DomainEvent::IpAllotted {
				ip_address: non_empty(kind, "ip_address", payload.ip_address)?,
				owner: non_empty(kind, "owner", payload.owner)?,
			}
		}
		EventKind::DomainPurchased => {
			let payload: DomainPurchasedPayload = parse_payload(kind, raw)?;
			DomainEvent::DomainPurchased {
				domain_name: non_empty(kind, "domain_name", payload.domain_name)?,
				new_owner: non_empty(kind, "new_owner", payload.new_owner)?,
				price: payload.price,
			}
		}
	};

	Ok(LedgerEvent {
		tx_digest: raw.id.tx_digest.clone(),
		event_seq: raw.id.event_seq.clone(),
		timestamp,
		event,
	})
}

fn parse_payload<T: DeserializeOwned>(kind: EventKind, raw: &RawEvent) -> Result<T, DecodeError> {
	T::deserialize(&raw.parsed_json).map_err(|source| DecodeError::MalformedPayload { kind, source })
}

fn non_empty(kind: EventKind, field: &'static str, value: String) -> Result<String, DecodeError> {
	if value.trim().is_empty() {
		Err(DecodeError::EmptyField { kind, field })
	} else {
		Ok(value)
	}
}
