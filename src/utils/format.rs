/// Number of decimal places for SUI (1 SUI = 10^9 MIST).
pub const SUI_DECIMALS: u32 = 9;

/// Render an amount in the smallest unit as a decimal string with `decimals` places.
///
/// Integer arithmetic only, so large MIST amounts are rendered exactly.
pub fn format_token_amount(amount: u64, decimals: u32) -> String {
	if decimals == 0 {
		return amount.to_string();
	}
	let scale = 10u128.pow(decimals);
	let amount = u128::from(amount);
	format!(
		"{}.{:0width$}",
		amount / scale,
		amount % scale,
		width = decimals as usize
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn formats_mist_as_sui() {
		assert_eq!(format_token_amount(1_500_000_000, SUI_DECIMALS), "1.500000000");
		assert_eq!(format_token_amount(7, SUI_DECIMALS), "0.000000007");
		assert_eq!(format_token_amount(0, SUI_DECIMALS), "0.000000000");
	}

	#[test]
	fn zero_decimals_is_plain_integer() {
		assert_eq!(format_token_amount(42, 0), "42");
	}

	#[test]
	fn max_amount_is_exact() {
		assert_eq!(
			format_token_amount(u64::MAX, SUI_DECIMALS),
			"18446744073.709551615"
		);
	}
}
