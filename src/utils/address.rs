/// Maximum number of hex digits in a Sui address (32 bytes).
const SUI_ADDRESS_HEX_DIGITS: usize = 64;

/// Validate a `0x`-prefixed Sui address or object id and return it lower-cased.
///
/// Short addresses such as `0x2` are accepted as-is; they are not zero-padded.
pub fn normalize_sui_address(raw: &str) -> Option<String> {
	let digits = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))?;
	if digits.is_empty() || digits.len() > SUI_ADDRESS_HEX_DIGITS {
		return None;
	}
	if digits.len() % 2 == 0 {
		hex::decode(digits).ok()?;
	} else {
		hex::decode(format!("0{}", digits)).ok()?;
	}
	Some(format!("0x{}", digits.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lowercases_full_length_addresses() {
		let raw = format!("0x{}", "AB".repeat(32));
		assert_eq!(normalize_sui_address(&raw), Some(format!("0x{}", "ab".repeat(32))));
	}

	#[test]
	fn accepts_short_addresses() {
		assert_eq!(normalize_sui_address("0x2").as_deref(), Some("0x2"));
	}

	#[test]
	fn rejects_malformed_addresses() {
		let too_long = format!("0x{}", "1".repeat(65));
		for bad in ["", "0x", "abcdef", "0xzz", "0xabc-", too_long.as_str()] {
			assert_eq!(normalize_sui_address(bad), None, "accepted {:?}", bad);
		}
	}
}
