//! Hex encoding of caller-supplied values.

use alloy_primitives::U256;

/// A value to be rendered as a `0x`-prefixed hex string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HexValue {
	Number(U256),
	/// Text is passed through when it is already hex, read as a number when
	/// it is a decimal literal, and UTF-8 encoded otherwise.
	Text(String),
	Bytes(Vec<u8>),
	Bool(bool),
}

/// Renders `value` as lowercase `0x`-prefixed hex.
pub fn to_hex(value: &HexValue) -> String {
	match value {
		HexValue::Number(n) => format!("{:#x}", n),
		HexValue::Text(text) => {
			if is_hex_strict(text) {
				text.to_lowercase()
			} else if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
				match U256::from_str_radix(text, 10) {
					Ok(n) => format!("{:#x}", n),
					Err(_) => format!("0x{}", hex::encode(text.as_bytes())),
				}
			} else {
				format!("0x{}", hex::encode(text.as_bytes()))
			}
		},
		HexValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
		HexValue::Bool(true) => "0x01".to_string(),
		HexValue::Bool(false) => "0x00".to_string(),
	}
}

fn is_hex_strict(text: &str) -> bool {
	text.strip_prefix("0x")
		.or_else(|| text.strip_prefix("0X"))
		.is_some_and(|digits| digits.bytes().all(|b| b.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_numbers() {
		assert_eq!(to_hex(&HexValue::Number(U256::ZERO)), "0x0");
		assert_eq!(to_hex(&HexValue::Number(U256::from(8217u64))), "0x2019");
		assert_eq!(to_hex(&HexValue::Text("1001".to_string())), "0x3e9");
	}

	#[test]
	fn test_text() {
		assert_eq!(to_hex(&HexValue::Text("klaytn".to_string())), "0x6b6c6179746e");
		assert_eq!(to_hex(&HexValue::Text("0xABCD".to_string())), "0xabcd");
		assert_eq!(to_hex(&HexValue::Text(String::new())), "0x");
	}

	#[test]
	fn test_bytes_and_bools() {
		assert_eq!(to_hex(&HexValue::Bytes(vec![0x00, 0xff])), "0x00ff");
		assert_eq!(to_hex(&HexValue::Bool(true)), "0x01");
		assert_eq!(to_hex(&HexValue::Bool(false)), "0x00");
	}
}
