//! Account queries and value conversions.

use crate::{FacadeError, KlayFacade};
use klay_types::{Address, HexValue, Unit, U256};
use tracing::instrument;

impl KlayFacade {
	/// Returns the on-chain account record, `None` for unknown accounts.
	#[instrument(skip_all, fields(%address))]
	pub async fn get_account(
		&self,
		address: Address,
	) -> Result<Option<serde_json::Value>, FacadeError> {
		Ok(self.node.get_account(address).await?)
	}

	/// Balance of `address` in peb.
	#[instrument(skip_all, fields(%address))]
	pub async fn get_balance(&self, address: Address) -> Result<U256, FacadeError> {
		let balance = self.node.get_balance(address).await?;
		tracing::debug!(%balance, "Fetched balance");
		Ok(balance)
	}

	/// Next nonce of `address`, counting pending transactions.
	#[instrument(skip_all, fields(%address))]
	pub async fn get_nonce(&self, address: Address) -> Result<u64, FacadeError> {
		Ok(self.node.get_nonce(address).await?)
	}

	/// Converts `amount` in `unit` to a decimal peb string.
	pub fn to_peb(&self, amount: &str, unit: Unit) -> Result<String, FacadeError> {
		Ok(klay_types::to_peb(amount, unit)?.to_string())
	}

	/// Converts a decimal peb string to `unit`.
	pub fn from_peb(&self, amount: &str, unit: Unit) -> Result<String, FacadeError> {
		Ok(klay_types::from_peb(amount, unit)?)
	}

	pub fn to_hex(&self, value: &HexValue) -> String {
		klay_types::to_hex(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::*;
	use klay_account::MockWalletInterface;
	use klay_delivery::{DeliveryError, MockNodeInterface};

	fn offline() -> KlayFacade {
		facade(MockNodeInterface::new(), MockWalletInterface::new())
	}

	#[test]
	fn test_unit_round_trips() {
		let facade = offline();
		for amount in ["0", "0.123456", "10000000000"] {
			let peb = facade.to_peb(amount, Unit::Klay).unwrap();
			assert_eq!(facade.from_peb(&peb, Unit::Klay).unwrap(), amount);
		}
		assert_eq!(facade.to_peb("0.123456", Unit::Klay).unwrap(), "123456000000000000");
	}

	#[test]
	fn test_unit_errors_surface() {
		let facade = offline();
		assert!(matches!(
			facade.to_peb("1.2.3", Unit::Klay),
			Err(FacadeError::Unit(_))
		));
		assert!(matches!(
			facade.from_peb("-1", Unit::Ston),
			Err(FacadeError::Unit(_))
		));
	}

	#[test]
	fn test_to_hex() {
		let facade = offline();
		assert_eq!(facade.to_hex(&HexValue::Number(U256::from(255))), "0xff");
		assert_eq!(facade.to_hex(&HexValue::Text("100".into())), "0x64");
		assert_eq!(facade.to_hex(&HexValue::Bool(true)), "0x01");
	}

	#[tokio::test]
	async fn test_queries_pass_through() {
		let mut node = MockNodeInterface::new();
		node.expect_get_balance()
			.withf(|address| *address == recipient())
			.returning(|_| Ok(U256::from(10u64).pow(U256::from(18))));
		node.expect_get_nonce().returning(|_| Ok(12));
		node.expect_get_account().returning(|_| Ok(None));

		let facade = facade(node, MockWalletInterface::new());
		assert_eq!(
			facade.get_balance(recipient()).await.unwrap(),
			U256::from(1_000_000_000_000_000_000u64)
		);
		assert_eq!(facade.get_nonce(recipient()).await.unwrap(), 12);
		assert_eq!(facade.get_account(recipient()).await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_query_failure_is_a_delivery_error() {
		let mut node = MockNodeInterface::new();
		node.expect_get_balance().returning(|_| {
			Err(DeliveryError::Rpc {
				method: "klay_getBalance",
				message: "invalid address".into(),
			})
		});

		let facade = facade(node, MockWalletInterface::new());
		assert!(matches!(
			facade.get_balance(recipient()).await,
			Err(FacadeError::Delivery(DeliveryError::Rpc { .. }))
		));
	}
}
