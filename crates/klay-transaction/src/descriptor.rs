//! Caller-supplied transaction fields.

use klay_types::{AccountKey, Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// The fields a caller supplies to build a transaction.
///
/// A descriptor is shared by every kind; which optional fields must or may
/// be present depends on the kind it is built into. Nonce and gas price may
/// be left unset and are filled from the node before signing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDescriptor {
	pub from: Address,
	pub gas: u64,
	#[serde(default)]
	pub chain_id: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub nonce: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub gas_price: Option<U256>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub to: Option<Address>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<U256>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub input: Option<Bytes>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub account_key: Option<AccountKey>,
	/// Set by variant selection, only for partially delegated variants.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fee_ratio: Option<i64>,
}

impl TransactionDescriptor {
	pub fn new(from: Address, gas: u64) -> Self {
		Self {
			from,
			gas,
			..Default::default()
		}
	}

	pub fn with_chain_id(mut self, chain_id: u64) -> Self {
		self.chain_id = chain_id;
		self
	}

	pub fn with_nonce(mut self, nonce: u64) -> Self {
		self.nonce = Some(nonce);
		self
	}

	pub fn with_gas_price(mut self, gas_price: U256) -> Self {
		self.gas_price = Some(gas_price);
		self
	}

	pub fn with_to(mut self, to: Address) -> Self {
		self.to = Some(to);
		self
	}

	pub fn with_value(mut self, value: U256) -> Self {
		self.value = Some(value);
		self
	}

	pub fn with_input(mut self, input: impl Into<Bytes>) -> Self {
		self.input = Some(input.into());
		self
	}

	pub fn with_account_key(mut self, account_key: AccountKey) -> Self {
		self.account_key = Some(account_key);
		self
	}
}
