//! Utility functions for hex and string formatting.
//!
//! This module provides helpers used across the workspace for managing `0x`
//! prefixes, shortening identifiers in logs and hex-encoding caller values.

pub mod formatting;
pub mod encoding;

pub use encoding::{to_hex, HexValue};
pub use formatting::{truncate_id, with_0x_prefix, without_0x_prefix};
