//! Failure-to-sentinel adapter.
//!
//! [`SentinelFacade`] exposes the same operations as [`KlayFacade`] for
//! callers that never want an error value. Any failure is logged with the
//! operation name and the error, whose message carries its causes. It is
//! then reported as `None`, `false` or an empty list depending on the
//! operation's return shape, so failure kinds cannot be told apart through
//! this adapter.

use crate::{BroadcastCallbacks, Contract, FacadeError, KlayFacade};
use klay_account::{Keyring, Role, SignedMessage};
use klay_transaction::{Transaction, TransactionDescriptor, TransactionKind};
use klay_types::{AccountKey, Address, Bytes, HexValue, TransactionReceipt, Unit, U256};
use std::path::{Path, PathBuf};

/// Returned by the key access stubs in place of key material.
pub const KEY_PLACEHOLDER: &str = "0x";

/// [`KlayFacade`] with every failure logged and reported as a sentinel.
pub struct SentinelFacade {
	inner: KlayFacade,
}

impl SentinelFacade {
	pub fn new(inner: KlayFacade) -> Self {
		Self { inner }
	}

	pub fn inner(&self) -> &KlayFacade {
		&self.inner
	}

	pub fn into_inner(self) -> KlayFacade {
		self.inner
	}

	pub fn generate_keyring(&self) -> Keyring {
		self.inner.generate_keyring()
	}

	pub fn create_single_keyring(&self, address: &str, private_key: &str) -> Option<Keyring> {
		sentinel(
			"create_single_keyring",
			self.inner.create_single_keyring(address, private_key),
		)
	}

	pub fn create_multiple_keyring(
		&self,
		address: &str,
		private_keys: &[String],
	) -> Option<Keyring> {
		sentinel(
			"create_multiple_keyring",
			self.inner.create_multiple_keyring(address, private_keys),
		)
	}

	pub fn create_role_based_keyring(
		&self,
		address: &str,
		role_keys: &[Vec<String>],
	) -> Option<Keyring> {
		sentinel(
			"create_role_based_keyring",
			self.inner.create_role_based_keyring(address, role_keys),
		)
	}

	pub async fn add_to_wallet(&self, keyring: Keyring) -> Option<Keyring> {
		sentinel("add_to_wallet", self.inner.add_to_wallet(keyring).await)
	}

	pub async fn remove_from_wallet(&self, address: Address) -> bool {
		sentinel("remove_from_wallet", self.inner.remove_from_wallet(address).await)
			.unwrap_or(false)
	}

	pub async fn update_wallet(&self, keyring: Keyring) -> Option<Keyring> {
		sentinel("update_wallet", self.inner.update_wallet(keyring).await)
	}

	pub async fn is_existed(&self, address: Address) -> bool {
		sentinel("is_existed", self.inner.is_existed(address).await).unwrap_or(false)
	}

	pub async fn wallet_addresses(&self) -> Vec<Address> {
		sentinel("wallet_addresses", self.inner.wallet_addresses().await).unwrap_or_default()
	}

	pub async fn sign_message(
		&self,
		address: Address,
		message: &[u8],
		role: Role,
	) -> Option<SignedMessage> {
		sentinel(
			"sign_message",
			self.inner.sign_message(address, message, role).await,
		)
	}

	pub async fn sign_transaction(&self, tx: Transaction) -> Option<Transaction> {
		sentinel("sign_transaction", self.inner.sign_transaction(tx).await)
	}

	pub async fn sign_as_fee_payer(&self, fee_payer: Address, tx: Transaction) -> Option<Transaction> {
		sentinel(
			"sign_as_fee_payer",
			self.inner.sign_as_fee_payer(fee_payer, tx).await,
		)
	}

	pub fn import_keystore(&self, path: &Path, password: &str) -> Option<Keyring> {
		sentinel("import_keystore", self.inner.import_keystore(path, password))
	}

	pub async fn export_keystore(
		&self,
		address: Address,
		password: &str,
		dir: &Path,
	) -> Option<PathBuf> {
		sentinel(
			"export_keystore",
			self.inner.export_keystore(address, password, dir).await,
		)
	}

	pub fn to_peb(&self, amount: &str, unit: Unit) -> Option<String> {
		sentinel("to_peb", self.inner.to_peb(amount, unit))
	}

	pub fn from_peb(&self, amount: &str, unit: Unit) -> Option<String> {
		sentinel("from_peb", self.inner.from_peb(amount, unit))
	}

	pub fn to_hex(&self, value: &HexValue) -> String {
		self.inner.to_hex(value)
	}

	pub fn decode_raw_transaction(&self, raw: &str) -> Option<Transaction> {
		sentinel("decode_raw_transaction", self.inner.decode_raw_transaction(raw))
	}

	pub async fn send_raw_transaction(
		&self,
		raw: &str,
		callbacks: BroadcastCallbacks,
	) -> Option<TransactionReceipt> {
		sentinel(
			"send_raw_transaction",
			self.inner.send_raw_transaction(raw, callbacks).await,
		)
	}

	pub fn create_contract(&self, abi_json: &str, address: Option<Address>) -> Option<Contract> {
		sentinel("create_contract", self.inner.create_contract(abi_json, address))
	}

	pub async fn get_account(&self, address: Address) -> Option<serde_json::Value> {
		sentinel("get_account", self.inner.get_account(address).await).flatten()
	}

	pub async fn get_balance(&self, address: Address) -> Option<U256> {
		sentinel("get_balance", self.inner.get_balance(address).await)
	}

	pub async fn get_nonce(&self, address: Address) -> Option<u64> {
		sentinel("get_nonce", self.inner.get_nonce(address).await)
	}

	pub fn build_transaction(
		&self,
		kind: TransactionKind,
		descriptor: TransactionDescriptor,
		ratio: i64,
	) -> Option<Transaction> {
		sentinel(
			"build_transaction",
			self.inner.build_transaction(kind, descriptor, ratio),
		)
	}

	pub fn value_transfer(
		&self,
		from: Address,
		to: Address,
		value: U256,
		gas: u64,
		ratio: i64,
	) -> Option<Transaction> {
		sentinel(
			"value_transfer",
			self.inner.value_transfer(from, to, value, gas, ratio),
		)
	}

	pub fn value_transfer_memo(
		&self,
		from: Address,
		to: Address,
		value: U256,
		memo: Bytes,
		gas: u64,
		ratio: i64,
	) -> Option<Transaction> {
		sentinel(
			"value_transfer_memo",
			self.inner.value_transfer_memo(from, to, value, memo, gas, ratio),
		)
	}

	pub fn smart_contract_deploy(
		&self,
		from: Address,
		bytecode: Bytes,
		value: Option<U256>,
		gas: u64,
		ratio: i64,
	) -> Option<Transaction> {
		sentinel(
			"smart_contract_deploy",
			self.inner.smart_contract_deploy(from, bytecode, value, gas, ratio),
		)
	}

	pub fn smart_contract_execution(
		&self,
		from: Address,
		to: Address,
		input: Bytes,
		value: Option<U256>,
		gas: u64,
		ratio: i64,
	) -> Option<Transaction> {
		sentinel(
			"smart_contract_execution",
			self.inner
				.smart_contract_execution(from, to, input, value, gas, ratio),
		)
	}

	pub fn account_update(
		&self,
		from: Address,
		account_key: AccountKey,
		gas: u64,
		ratio: i64,
	) -> Option<Transaction> {
		sentinel(
			"account_update",
			self.inner.account_update(from, account_key, gas, ratio),
		)
	}

	pub fn cancel(&self, from: Address, nonce: u64, gas: u64, ratio: i64) -> Option<Transaction> {
		sentinel("cancel", self.inner.cancel(from, nonce, gas, ratio))
	}

	pub fn chain_data_anchoring(
		&self,
		from: Address,
		data: Bytes,
		gas: u64,
		ratio: i64,
	) -> Option<Transaction> {
		sentinel(
			"chain_data_anchoring",
			self.inner.chain_data_anchoring(from, data, gas, ratio),
		)
	}

	/// Always [`KEY_PLACEHOLDER`]; no key material is returned.
	pub fn get_private_key(&self, address: Address) -> String {
		sentinel("get_private_key", self.inner.get_private_key(address))
			.unwrap_or_else(|| KEY_PLACEHOLDER.to_string())
	}

	/// Always [`KEY_PLACEHOLDER`]; no key material is returned.
	pub fn get_wallet_key(&self, address: Address) -> String {
		sentinel("get_wallet_key", self.inner.get_wallet_key(address))
			.unwrap_or_else(|| KEY_PLACEHOLDER.to_string())
	}
}

fn sentinel<T>(operation: &'static str, result: Result<T, FacadeError>) -> Option<T> {
	match result {
		Ok(value) => Some(value),
		Err(e) => {
			tracing::error!(operation, error = %e, "Operation failed");
			None
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::*;
	use klay_account::{AccountError, MockWalletInterface};
	use klay_delivery::{DeliveryError, MockNodeInterface};

	fn failing_node() -> MockNodeInterface {
		let down = || DeliveryError::Network("node unreachable".into());
		let mut node = MockNodeInterface::new();
		node.expect_get_account().returning(move |_| Err(down()));
		node.expect_get_balance().returning(move |_| Err(down()));
		node.expect_get_nonce().returning(move |_| Err(down()));
		node.expect_get_gas_price().returning(move || Err(down()));
		node.expect_send_raw_transaction().returning(move |_| Err(down()));
		node.expect_get_receipt().returning(move |_| Err(down()));
		node
	}

	fn failing_wallet() -> MockWalletInterface {
		let broken = || AccountError::Implementation("wallet unavailable".into());
		let mut wallet = MockWalletInterface::new();
		wallet.expect_add().returning(move |_| Err(broken()));
		wallet.expect_remove().returning(move |_| Err(broken()));
		wallet.expect_update().returning(move |_| Err(broken()));
		wallet.expect_is_existed().returning(move |_| Err(broken()));
		wallet.expect_get().returning(move |_| Err(broken()));
		wallet.expect_addresses().returning(move || Err(broken()));
		wallet
	}

	fn failing() -> SentinelFacade {
		SentinelFacade::new(facade(failing_node(), failing_wallet()))
	}

	#[tokio::test]
	async fn test_wallet_and_node_failures_become_sentinels() {
		let facade = failing();
		let keyring = facade.generate_keyring();
		let address = keyring.address();
		let dir = tempfile::tempdir().unwrap();

		assert!(facade.add_to_wallet(keyring.clone()).await.is_none());
		assert!(!facade.remove_from_wallet(address).await);
		assert!(facade.update_wallet(keyring).await.is_none());
		assert!(!facade.is_existed(address).await);
		assert!(facade.wallet_addresses().await.is_empty());
		assert!(facade
			.sign_message(address, b"hello", Role::Transaction)
			.await
			.is_none());
		assert!(facade
			.export_keystore(address, "password", dir.path())
			.await
			.is_none());

		assert!(facade.get_account(address).await.is_none());
		assert!(facade.get_balance(address).await.is_none());
		assert!(facade.get_nonce(address).await.is_none());
		assert!(facade
			.send_raw_transaction("0x08c0", BroadcastCallbacks::new())
			.await
			.is_none());

		let tx = facade
			.value_transfer(address, recipient(), U256::from(1), 21_000, 100)
			.unwrap();
		assert!(facade.sign_transaction(tx.clone()).await.is_none());
		assert!(facade.sign_as_fee_payer(recipient(), tx).await.is_none());
	}

	#[tokio::test]
	async fn test_argument_failures_become_sentinels() {
		let facade = failing();
		let from = recipient();
		let dir = tempfile::tempdir().unwrap();

		assert!(facade.create_single_keyring("0x1234", SENDER_KEY).is_none());
		assert!(facade.create_multiple_keyring(RECIPIENT, &[]).is_none());
		assert!(facade.create_role_based_keyring(RECIPIENT, &[]).is_none());
		assert!(facade
			.import_keystore(&dir.path().join("absent.json"), "password")
			.is_none());
		assert!(facade.to_peb("one", Unit::Klay).is_none());
		assert!(facade.from_peb("0x", Unit::Klay).is_none());
		assert!(facade.decode_raw_transaction("0x").is_none());
		assert!(facade.create_contract("[{", None).is_none());

		assert!(facade
			.value_transfer(from, recipient(), U256::from(1), 21_000, 150)
			.is_none());
		assert!(facade
			.value_transfer_memo(from, recipient(), U256::from(1), Bytes::new(), 21_000, -1)
			.is_none());
		assert!(facade
			.smart_contract_deploy(from, Bytes::new(), None, 21_000, 101)
			.is_none());
		assert!(facade
			.smart_contract_execution(from, recipient(), Bytes::new(), None, 21_000, 200)
			.is_none());
		assert!(facade
			.account_update(from, AccountKey::Legacy, 21_000, 100_000)
			.is_none());
		assert!(facade.cancel(from, 0, 21_000, -100).is_none());
		assert!(facade
			.chain_data_anchoring(from, Bytes::new(), 21_000, 1000)
			.is_none());
		assert!(facade
			.build_transaction(
				TransactionKind::ValueTransfer,
				TransactionDescriptor::new(from, 21_000),
				0
			)
			.is_none());
	}

	#[test]
	fn test_key_stubs_return_placeholder() {
		let facade = failing();
		assert_eq!(facade.get_private_key(recipient()), KEY_PLACEHOLDER);
		assert_eq!(facade.get_wallet_key(recipient()), KEY_PLACEHOLDER);
	}

	#[test]
	fn test_successful_operations_pass_through() {
		let facade = failing();
		assert_eq!(
			facade.to_peb("1", Unit::Ston).as_deref(),
			Some("1000000000")
		);
		assert_eq!(facade.to_hex(&HexValue::Bytes(vec![0xca, 0xfe])), "0xcafe");
		assert!(facade
			.cancel(recipient(), 0, 21_000, 0)
			.is_some());
	}
}
