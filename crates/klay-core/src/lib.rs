//! Klaytn SDK facade.
//!
//! [`KlayFacade`] gathers keyring and wallet management, transaction
//! construction for every kind and fee-delegation variant, signing,
//! broadcast and account queries behind one handle bound to a chain.
//! Every operation returns a typed `Result`. [`SentinelFacade`] wraps it for
//! callers that want failures logged and reported as `None`, `false` or an
//! empty list instead.

use klay_account::{implementations::memory::MemoryWallet, AccountError, WalletInterface};
use klay_config::{Config, ConfigError};
use klay_delivery::{DeliveryError, DeliveryService, NodeInterface, RpcNode};
use klay_transaction::TransactionError;
use klay_types::{Address, UnitError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod broadcast;
pub mod contract;
pub mod queries;
pub mod sentinel;
pub mod transactions;
pub mod wallet;

pub use broadcast::BroadcastCallbacks;
pub use contract::Contract;
pub use sentinel::{SentinelFacade, KEY_PLACEHOLDER};

pub use klay_account::{Keyring, Role, SignedMessage};
pub use klay_transaction::{
	FeeDelegation, Payload, Transaction, TransactionDescriptor, TransactionKind,
	TransactionVariant,
};
pub use klay_types::{
	AccountKey, BroadcastEvent, Bytes, HexValue, TransactionReceipt, Unit, B256, U256,
};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors returned by facade operations.
#[derive(Debug, Error)]
pub enum FacadeError {
	/// The signer or fee payer has no keyring in the wallet.
	#[error("Address {0} is not in the wallet")]
	NotInWallet(Address),
	/// A caller-supplied value could not be interpreted.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Account error: {0}")]
	Account(#[from] AccountError),
	#[error("Transaction error: {0}")]
	Transaction(#[from] TransactionError),
	#[error("Delivery error: {0}")]
	Delivery(#[from] DeliveryError),
	#[error("Unit conversion error: {0}")]
	Unit(#[from] UnitError),
	#[error("Configuration error: {0}")]
	Config(#[from] ConfigError),
	/// The contract ABI is malformed or lacks the requested item.
	#[error("Contract error: {0}")]
	Contract(String),
	/// The broadcast ended without a successful receipt.
	#[error("Broadcast error: {0}")]
	Broadcast(String),
	/// The operation exists for compatibility but has no implementation.
	#[error("{0} is not implemented")]
	Unimplemented(&'static str),
}

/// Facade over a Klaytn node and an in-process wallet.
///
/// The chain id and both collaborators are fixed at construction; nothing
/// else is shared between calls.
pub struct KlayFacade {
	/// Chain transactions are built and signed for.
	chain_id: u64,
	/// Node used for queries.
	node: Arc<dyn NodeInterface>,
	/// Registry of keyrings available for signing.
	wallet: Arc<dyn WalletInterface>,
	/// Submits raw transactions and follows them to their receipt.
	delivery: DeliveryService,
}

impl KlayFacade {
	/// Creates a facade with default broadcast timing.
	pub fn new(
		chain_id: u64,
		node: Arc<dyn NodeInterface>,
		wallet: Arc<dyn WalletInterface>,
	) -> Self {
		Self::with_broadcast_timing(
			chain_id,
			node,
			wallet,
			DEFAULT_POLL_INTERVAL,
			DEFAULT_RECEIPT_TIMEOUT,
		)
	}

	pub fn with_broadcast_timing(
		chain_id: u64,
		node: Arc<dyn NodeInterface>,
		wallet: Arc<dyn WalletInterface>,
		poll_interval: Duration,
		receipt_timeout: Duration,
	) -> Self {
		let delivery = DeliveryService::new(node.clone(), poll_interval, receipt_timeout);
		Self {
			chain_id,
			node,
			wallet,
			delivery,
		}
	}

	/// Connects to the configured node with an empty in-memory wallet.
	pub async fn from_config(config: &Config) -> Result<Self, FacadeError> {
		config.validate()?;
		let node_config = config.node_config()?;
		let node = RpcNode::connect(&node_config).await?;

		tracing::info!(
			chain_id = node_config.chain_id,
			transport = %node_config.transport,
			provider = node_config.provider.kind(),
			"Initialized facade"
		);
		Ok(Self::with_broadcast_timing(
			node_config.chain_id,
			Arc::new(node),
			Arc::new(MemoryWallet::new()),
			node_config.poll_interval,
			node_config.receipt_timeout,
		))
	}

	pub fn chain_id(&self) -> u64 {
		self.chain_id
	}

	pub fn node(&self) -> &Arc<dyn NodeInterface> {
		&self.node
	}

	pub fn wallet(&self) -> &Arc<dyn WalletInterface> {
		&self.wallet
	}
}

/// Parses a hex string with or without the `0x` prefix.
pub(crate) fn decode_hex(value: &str) -> Result<Vec<u8>, FacadeError> {
	hex::decode(klay_types::without_0x_prefix(value))
		.map_err(|e| FacadeError::InvalidArgument(format!("invalid hex '{}': {}", value, e)))
}

#[cfg(test)]
pub(crate) mod test_support {
	use super::*;
	use klay_account::MockWalletInterface;
	use klay_delivery::MockNodeInterface;

	pub const CHAIN_ID: u64 = 1001;
	pub const SENDER_KEY: &str =
		"0x45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8";
	pub const RECIPIENT: &str = "0x7b65b75d204abed71587c9e519a89277766ee1d0";

	pub fn facade(node: MockNodeInterface, wallet: MockWalletInterface) -> KlayFacade {
		KlayFacade::with_broadcast_timing(
			CHAIN_ID,
			Arc::new(node),
			Arc::new(wallet),
			Duration::from_millis(5),
			Duration::from_millis(100),
		)
	}

	pub fn facade_with_memory_wallet(node: MockNodeInterface) -> KlayFacade {
		KlayFacade::with_broadcast_timing(
			CHAIN_ID,
			Arc::new(node),
			Arc::new(MemoryWallet::new()),
			Duration::from_millis(5),
			Duration::from_millis(100),
		)
	}

	pub fn recipient() -> Address {
		RECIPIENT.parse().unwrap()
	}
}
