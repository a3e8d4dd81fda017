//! Conversion between KLAY denominations and peb.
//!
//! Amounts cross the facade boundary as decimal strings. Scaling goes through
//! alloy's unit helpers over `U256`, never through floating point, so a value
//! converted to peb and back reproduces the original string.

use alloy_primitives::utils::{format_units, parse_units};
use alloy_primitives::U256;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while converting amounts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitError {
	/// The amount is not a non-negative decimal number.
	#[error("Invalid amount: {0}")]
	InvalidAmount(String),
	/// The amount has more fractional digits than the unit can express in peb.
	#[error("Too many decimal places in {amount} for unit {unit}")]
	TooManyDecimals { amount: String, unit: Unit },
	/// The amount does not fit in 256 bits of peb.
	#[error("Amount overflows: {0}")]
	Overflow(String),
	/// The unit name is not recognised.
	#[error("Unknown unit: {0}")]
	UnknownUnit(String),
}

/// Denominations of the native currency, from peb up to TKLAY.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Unit {
	Peb,
	KPeb,
	MPeb,
	/// Also known as Gpeb.
	Ston,
	UKlay,
	MilliKlay,
	#[default]
	Klay,
	KKlay,
	MegaKlay,
	GKlay,
	TKlay,
}

impl Unit {
	/// Power of ten between this unit and peb.
	pub const fn decimals(self) -> u8 {
		match self {
			Unit::Peb => 0,
			Unit::KPeb => 3,
			Unit::MPeb => 6,
			Unit::Ston => 9,
			Unit::UKlay => 12,
			Unit::MilliKlay => 15,
			Unit::Klay => 18,
			Unit::KKlay => 21,
			Unit::MegaKlay => 24,
			Unit::GKlay => 27,
			Unit::TKlay => 30,
		}
	}

	pub const fn symbol(self) -> &'static str {
		match self {
			Unit::Peb => "peb",
			Unit::KPeb => "kpeb",
			Unit::MPeb => "Mpeb",
			Unit::Ston => "ston",
			Unit::UKlay => "uKLAY",
			Unit::MilliKlay => "mKLAY",
			Unit::Klay => "KLAY",
			Unit::KKlay => "kKLAY",
			Unit::MegaKlay => "MKLAY",
			Unit::GKlay => "GKLAY",
			Unit::TKlay => "TKLAY",
		}
	}
}

impl fmt::Display for Unit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.symbol())
	}
}

impl FromStr for Unit {
	type Err = UnitError;

	// Case matters: "mKLAY" and "MKLAY" differ by nine orders of magnitude.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"peb" => Ok(Unit::Peb),
			"kpeb" => Ok(Unit::KPeb),
			"Mpeb" => Ok(Unit::MPeb),
			"Gpeb" | "ston" => Ok(Unit::Ston),
			"uKLAY" => Ok(Unit::UKlay),
			"mKLAY" => Ok(Unit::MilliKlay),
			"KLAY" => Ok(Unit::Klay),
			"kKLAY" => Ok(Unit::KKlay),
			"MKLAY" => Ok(Unit::MegaKlay),
			"GKLAY" => Ok(Unit::GKlay),
			"TKLAY" => Ok(Unit::TKlay),
			other => Err(UnitError::UnknownUnit(other.to_string())),
		}
	}
}

/// Converts a decimal amount expressed in `unit` into peb.
///
/// Trailing fractional zeros are ignored, so `"1.500"` KLAY is accepted even
/// though only the first digit after the point is significant.
pub fn to_peb(amount: &str, unit: Unit) -> Result<U256, UnitError> {
	let amount = amount.trim();
	let (integer, fraction) = amount.split_once('.').unwrap_or((amount, ""));

	let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
	if (integer.is_empty() && fraction.is_empty()) || !is_digits(integer) || !is_digits(fraction) {
		return Err(UnitError::InvalidAmount(amount.to_string()));
	}
	// parse_units truncates excess digits, only zeros may be dropped.
	let fraction = fraction.trim_end_matches('0');
	if fraction.len() > unit.decimals() as usize {
		return Err(UnitError::TooManyDecimals {
			amount: amount.to_string(),
			unit,
		});
	}

	let peb: U256 = parse_units(amount, unit.decimals())
		.map_err(|_| UnitError::Overflow(amount.to_string()))?
		.into();

	// Scaling wraps on overflow, which shows up as a value that does not
	// format back to the input.
	let integer = match integer.trim_start_matches('0') {
		"" => "0",
		digits => digits,
	};
	let canonical = if fraction.is_empty() {
		integer.to_string()
	} else {
		format!("{}.{}", integer, fraction)
	};
	if format_peb(peb, unit)? != canonical {
		return Err(UnitError::Overflow(amount.to_string()));
	}
	Ok(peb)
}

/// Converts a peb amount into a decimal string expressed in `unit`.
///
/// The peb amount may be decimal or `0x`-prefixed hex.
pub fn from_peb(amount: &str, unit: Unit) -> Result<String, UnitError> {
	let amount = amount.trim();
	let parsed = match amount
		.strip_prefix("0x")
		.or_else(|| amount.strip_prefix("0X"))
	{
		Some(hex_digits) if !hex_digits.is_empty() => U256::from_str_radix(hex_digits, 16),
		Some(_) => return Err(UnitError::InvalidAmount(amount.to_string())),
		None if !amount.is_empty() && amount.bytes().all(|b| b.is_ascii_digit()) => {
			U256::from_str_radix(amount, 10)
		},
		None => return Err(UnitError::InvalidAmount(amount.to_string())),
	};
	let peb = parsed.map_err(|_| UnitError::Overflow(amount.to_string()))?;

	format_peb(peb, unit)
}

/// Formats a peb value in `unit`, dropping trailing fractional zeros.
pub fn format_peb(peb: U256, unit: Unit) -> Result<String, UnitError> {
	let formatted = format_units(peb, unit.decimals())
		.map_err(|e| UnitError::InvalidAmount(e.to_string()))?;
	Ok(formatted
		.trim_end_matches('0')
		.trim_end_matches('.')
		.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_to_peb() {
		assert_eq!(to_peb("1", Unit::Klay).unwrap(), U256::from(10u64.pow(18)));
		assert_eq!(to_peb("0.5", Unit::Klay).unwrap(), U256::from(5 * 10u64.pow(17)));
		assert_eq!(to_peb(".5", Unit::Klay).unwrap(), U256::from(5 * 10u64.pow(17)));
		assert_eq!(to_peb("25", Unit::Ston).unwrap(), U256::from(25_000_000_000u64));
		assert_eq!(to_peb("1.500", Unit::KPeb).unwrap(), U256::from(1500u64));
		assert_eq!(to_peb("0", Unit::TKlay).unwrap(), U256::ZERO);
	}

	#[test]
	fn test_to_peb_rejects_bad_amounts() {
		assert!(matches!(to_peb("", Unit::Klay), Err(UnitError::InvalidAmount(_))));
		assert!(matches!(to_peb(".", Unit::Klay), Err(UnitError::InvalidAmount(_))));
		assert!(matches!(to_peb("-1", Unit::Klay), Err(UnitError::InvalidAmount(_))));
		assert!(matches!(to_peb("1.2.3", Unit::Klay), Err(UnitError::InvalidAmount(_))));
		assert!(matches!(to_peb("1e18", Unit::Klay), Err(UnitError::InvalidAmount(_))));
		assert!(matches!(
			to_peb("0.1", Unit::Peb),
			Err(UnitError::TooManyDecimals { .. })
		));
		assert!(matches!(
			to_peb(&"9".repeat(80), Unit::Klay),
			Err(UnitError::Overflow(_))
		));
		// Parses as a U256 but overflows once scaled to peb.
		assert!(matches!(
			to_peb(&format!("1{}", "0".repeat(70)), Unit::Klay),
			Err(UnitError::Overflow(_))
		));
	}

	#[test]
	fn test_format_peb() {
		assert_eq!(format_peb(U256::ZERO, Unit::Klay).unwrap(), "0");
		assert_eq!(format_peb(U256::from(1000u64), Unit::Peb).unwrap(), "1000");
		assert_eq!(format_peb(U256::from(10_500u64), Unit::KPeb).unwrap(), "10.5");
	}

	#[test]
	fn test_from_peb() {
		assert_eq!(from_peb("1000000000000000000", Unit::Klay).unwrap(), "1");
		assert_eq!(from_peb("1500000000000000000", Unit::Klay).unwrap(), "1.5");
		assert_eq!(from_peb("25000000000", Unit::Ston).unwrap(), "25");
		assert_eq!(from_peb("0xde0b6b3a7640000", Unit::Klay).unwrap(), "1");
		assert_eq!(from_peb("1", Unit::Klay).unwrap(), "0.000000000000000001");
		assert_eq!(from_peb("42", Unit::Peb).unwrap(), "42");
		assert!(from_peb("0x", Unit::Klay).is_err());
		assert!(from_peb("12.5", Unit::Klay).is_err());
	}

	#[test]
	fn test_round_trip_preserves_the_amount() {
		for amount in ["0", "0.123456", "1", "250.75", "10000000000"] {
			let peb = to_peb(amount, Unit::Klay).unwrap();
			let back = from_peb(&peb.to_string(), Unit::Klay).unwrap();
			assert_eq!(back, amount);
		}
	}

	#[test]
	fn test_unit_names() {
		assert_eq!("mKLAY".parse::<Unit>().unwrap(), Unit::MilliKlay);
		assert_eq!("MKLAY".parse::<Unit>().unwrap(), Unit::MegaKlay);
		assert_eq!("Gpeb".parse::<Unit>().unwrap(), Unit::Ston);
		assert_eq!(Unit::Klay.to_string(), "KLAY");
		assert!(matches!("klay".parse::<Unit>(), Err(UnitError::UnknownUnit(_))));
	}
}
