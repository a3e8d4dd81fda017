//! Common types module for the Klaytn facade workspace.
//!
//! This module defines the data types shared by the account, transaction,
//! delivery and facade crates. It provides a centralized location for
//! primitives, node descriptors, receipts and unit conversion so that every
//! crate agrees on the same representation.

/// Signatures and account keys shared by keyrings and transactions.
pub mod account;
/// Transaction delivery types for broadcast and receipt handling.
pub mod delivery;
/// Node connection descriptors (direct endpoint or managed service).
pub mod node;
/// Conversion between KLAY denominations and peb.
pub mod units;
/// Utility functions for hex and string formatting.
pub mod utils;

pub use alloy_primitives::{keccak256, Address, Bytes, B256, U256, U64};
pub use account::*;
pub use delivery::*;
pub use node::*;
pub use units::{format_peb, from_peb, to_peb, Unit, UnitError};
pub use utils::{to_hex, truncate_id, with_0x_prefix, without_0x_prefix, HexValue};
