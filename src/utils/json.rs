//! Serde helpers for ledger JSON.
//!
//! Sui renders Move `u64` values as decimal strings and Move `vector<u8>` strings as byte
//! arrays. These helpers accept both the strict and the loose encodings and reject anything
//! else, so a malformed field always surfaces as a deserialization error.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn u64_from_value(value: Value) -> Result<u64, String> {
	match value {
		Value::Number(n) => n
			.as_u64()
			.ok_or_else(|| format!("expected a non-negative integer, got {}", n)),
		Value::String(s) => s
			.parse::<u64>()
			.map_err(|_| format!("expected a decimal integer string, got {:?}", s)),
		other => Err(format!("expected an integer, got {}", other)),
	}
}

/// Deserialize a `u64` encoded either as a JSON integer or as a decimal string.
pub fn u64_from_str_or_num<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
	D: Deserializer<'de>,
{
	u64_from_value(Value::deserialize(deserializer)?).map_err(D::Error::custom)
}

/// Like [`u64_from_str_or_num`], but `null` (or an absent field with `#[serde(default)]`) is `None`.
pub fn opt_u64_from_str_or_num<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
	D: Deserializer<'de>,
{
	match Option::<Value>::deserialize(deserializer)? {
		None | Some(Value::Null) => Ok(None),
		Some(value) => u64_from_value(value).map(Some).map_err(D::Error::custom),
	}
}

/// Deserialize a string given either as a JSON string or as an array of UTF-8 bytes.
pub fn string_or_utf8_bytes<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	match Value::deserialize(deserializer)? {
		Value::String(s) => Ok(s),
		Value::Array(items) => {
			let bytes = items
				.iter()
				.map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
				.collect::<Option<Vec<u8>>>()
				.ok_or_else(|| D::Error::custom("byte array contains a value outside 0..=255"))?;
			String::from_utf8(bytes).map_err(D::Error::custom)
		}
		other => Err(D::Error::custom(format!("expected a string, got {}", other))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[derive(Debug, Deserialize)]
	struct Sample {
		#[serde(deserialize_with = "u64_from_str_or_num")]
		amount: u64,
		#[serde(default, deserialize_with = "opt_u64_from_str_or_num")]
		timestamp: Option<u64>,
		#[serde(deserialize_with = "string_or_utf8_bytes")]
		name: String,
	}

	#[test]
	fn accepts_numbers_and_decimal_strings() {
		let a: Sample = serde_json::from_value(json!({"amount": 10, "name": "x"})).unwrap();
		let b: Sample =
			serde_json::from_value(json!({"amount": "18446744073709551615", "name": "x"}))
				.unwrap();
		assert_eq!(a.amount, 10);
		assert_eq!(b.amount, u64::MAX);
		assert_eq!(a.timestamp, None);
	}

	#[test]
	fn rejects_negative_fractional_and_garbage_amounts() {
		for bad in [json!(-1), json!(1.5), json!("ten"), json!(true), json!(null)] {
			let result = serde_json::from_value::<Sample>(json!({"amount": bad, "name": "x"}));
			assert!(result.is_err(), "accepted {:?}", bad);
		}
	}

	#[test]
	fn optional_timestamp_handles_null_and_strings() {
		let s: Sample = serde_json::from_value(
			json!({"amount": 1, "timestamp": "1700000000000", "name": "x"}),
		)
		.unwrap();
		assert_eq!(s.timestamp, Some(1_700_000_000_000));

		let s: Sample =
			serde_json::from_value(json!({"amount": 1, "timestamp": null, "name": "x"})).unwrap();
		assert_eq!(s.timestamp, None);
	}

	#[test]
	fn strings_may_arrive_as_byte_vectors() {
		let s: Sample =
			serde_json::from_value(json!({"amount": 1, "name": [97, 46, 115, 117, 105]})).unwrap();
		assert_eq!(s.name, "a.sui");

		let invalid_utf8 = json!({"amount": 1, "name": [255, 254]});
		assert!(serde_json::from_value::<Sample>(invalid_utf8).is_err());

		let out_of_range = json!({"amount": 1, "name": [300]});
		assert!(serde_json::from_value::<Sample>(out_of_range).is_err());
	}
}
