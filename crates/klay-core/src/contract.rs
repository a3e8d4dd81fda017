//! Contract handles built from a JSON ABI.

use crate::{FacadeError, KlayFacade};
use alloy_json_abi::JsonAbi;
use alloy_primitives::Selector;
use klay_types::Address;

/// A contract ABI, optionally bound to a deployed address.
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
	abi: JsonAbi,
	address: Option<Address>,
}

impl Contract {
	/// Parses `abi_json` into an unbound contract.
	pub fn new(abi_json: &str) -> Result<Self, FacadeError> {
		let abi: JsonAbi = serde_json::from_str(abi_json)
			.map_err(|e| FacadeError::Contract(format!("invalid ABI: {}", e)))?;
		Ok(Self { abi, address: None })
	}

	/// Parses `abi_json` and binds it to the contract at `address`.
	pub fn at(abi_json: &str, address: Address) -> Result<Self, FacadeError> {
		Ok(Self::new(abi_json)?.with_address(address))
	}

	pub fn with_address(mut self, address: Address) -> Self {
		self.address = Some(address);
		self
	}

	pub fn address(&self) -> Option<Address> {
		self.address
	}

	pub fn abi(&self) -> &JsonAbi {
		&self.abi
	}

	/// Selector of the function `name`.
	///
	/// Overloaded functions are rejected; there is no signature to choose
	/// between them.
	pub fn selector(&self, name: &str) -> Result<Selector, FacadeError> {
		match self.abi.function(name).map(Vec::as_slice) {
			Some([function]) => Ok(function.selector()),
			Some([]) | None => Err(FacadeError::Contract(format!(
				"function '{}' not found in ABI",
				name
			))),
			Some(overloads) => Err(FacadeError::Contract(format!(
				"function '{}' is overloaded {} times",
				name,
				overloads.len()
			))),
		}
	}
}

impl KlayFacade {
	/// Creates a contract handle from its ABI, bound to `address` when given.
	pub fn create_contract(
		&self,
		abi_json: &str,
		address: Option<Address>,
	) -> Result<Contract, FacadeError> {
		let contract = Contract::new(abi_json)?;
		let contract = match address {
			Some(address) => contract.with_address(address),
			None => contract,
		};

		tracing::info!(
			address = ?contract.address,
			functions = contract.abi.functions.len(),
			"Created contract"
		);
		Ok(contract)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::*;
	use klay_account::MockWalletInterface;
	use klay_delivery::MockNodeInterface;

	const TOKEN_ABI: &str = r#"[
		{"type":"function","name":"transfer","stateMutability":"nonpayable",
		 "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
		 "outputs":[{"name":"","type":"bool"}]},
		{"type":"function","name":"balanceOf","stateMutability":"view",
		 "inputs":[{"name":"owner","type":"address"}],
		 "outputs":[{"name":"","type":"uint256"}]},
		{"type":"function","name":"mint","stateMutability":"nonpayable",
		 "inputs":[{"name":"amount","type":"uint256"}],"outputs":[]},
		{"type":"function","name":"mint","stateMutability":"nonpayable",
		 "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[]}
	]"#;

	#[test]
	fn test_selectors() {
		let contract = Contract::new(TOKEN_ABI).unwrap();
		assert_eq!(hex::encode(contract.selector("transfer").unwrap()), "a9059cbb");
		assert_eq!(hex::encode(contract.selector("balanceOf").unwrap()), "70a08231");
		assert!(matches!(
			contract.selector("approve"),
			Err(FacadeError::Contract(_))
		));
		assert!(matches!(
			contract.selector("mint"),
			Err(FacadeError::Contract(e)) if e.contains("overloaded")
		));
	}

	#[test]
	fn test_create_contract_binds_address() {
		let facade = facade(MockNodeInterface::new(), MockWalletInterface::new());

		let unbound = facade.create_contract(TOKEN_ABI, None).unwrap();
		assert_eq!(unbound.address(), None);

		let bound = facade.create_contract(TOKEN_ABI, Some(recipient())).unwrap();
		assert_eq!(bound.address(), Some(recipient()));
		assert_eq!(bound, Contract::at(TOKEN_ABI, recipient()).unwrap());
	}

	#[test]
	fn test_malformed_abi() {
		assert!(matches!(
			Contract::new("{not json"),
			Err(FacadeError::Contract(_))
		));
	}
}
