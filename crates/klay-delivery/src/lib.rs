//! Transaction delivery module for the Klaytn facade.
//!
//! This module handles node queries and the submission of signed raw
//! transactions. A node is reached through the [`NodeInterface`] capability;
//! the [`DeliveryService`] turns a submission into a stream of broadcast
//! events by polling the node for the receipt.

use async_trait::async_trait;
use klay_types::{truncate_id, Address, BroadcastEvent, Bytes, TransactionReceipt, B256, U256};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Re-export implementations
pub mod implementations {
	pub mod rpc;
}

pub use implementations::rpc::{create_node, RpcNode};

/// Errors that can occur during node queries and transaction delivery.
#[derive(Debug, Error)]
pub enum DeliveryError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// Error reported by the node for a JSON-RPC call.
	#[error("RPC error in {method}: {message}")]
	Rpc {
		method: &'static str,
		message: String,
	},
	/// Error that occurs when a transaction execution fails.
	#[error("Transaction failed: {0}")]
	TransactionFailed(String),
	/// No receipt arrived before the configured timeout.
	#[error("Timeout waiting for receipt of {0} after {1:?}")]
	Timeout(B256, Duration),
	/// Error that occurs when the node descriptor cannot be used.
	#[error("Invalid node configuration: {0}")]
	Configuration(String),
}

/// Trait defining the node capability.
///
/// Implementations answer account queries and accept signed raw transactions.
/// Every method is a single round trip; retries and receipt polling belong to
/// the caller.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NodeInterface: Send + Sync {
	/// Returns the on-chain account record, or `None` for unknown accounts.
	async fn get_account(&self, address: Address)
		-> Result<Option<serde_json::Value>, DeliveryError>;

	/// Returns the balance of `address` in peb.
	async fn get_balance(&self, address: Address) -> Result<U256, DeliveryError>;

	/// Returns the next nonce for `address`, counting pending transactions.
	async fn get_nonce(&self, address: Address) -> Result<u64, DeliveryError>;

	/// Returns the gas price the node suggests, in peb.
	async fn get_gas_price(&self) -> Result<U256, DeliveryError>;

	/// Submits a signed raw transaction and returns its hash.
	async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, DeliveryError>;

	/// Returns the receipt for `hash` if the transaction has been mined.
	async fn get_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>, DeliveryError>;
}

/// Service that submits raw transactions and reports their progress.
///
/// Each broadcast runs on its own task and feeds an unbounded channel. The
/// hash is always sent before the receipt; a failure ends the stream with an
/// error event.
pub struct DeliveryService {
	/// Node the transactions are submitted to.
	node: Arc<dyn NodeInterface>,
	/// Interval between receipt polls.
	poll_interval: Duration,
	/// Give up waiting for a receipt after this long.
	receipt_timeout: Duration,
}

impl DeliveryService {
	pub fn new(
		node: Arc<dyn NodeInterface>,
		poll_interval: Duration,
		receipt_timeout: Duration,
	) -> Self {
		Self {
			node,
			poll_interval,
			receipt_timeout,
		}
	}

	pub fn node(&self) -> &Arc<dyn NodeInterface> {
		&self.node
	}

	/// Broadcasts `raw` and returns the stream of events it produces.
	///
	/// A mined transaction whose status reports failure yields its receipt
	/// followed by an error event.
	pub fn broadcast(&self, raw: Bytes) -> mpsc::UnboundedReceiver<BroadcastEvent> {
		let (events, receiver) = mpsc::unbounded_channel();
		let node = self.node.clone();
		let poll_interval = self.poll_interval;
		let receipt_timeout = self.receipt_timeout;

		tokio::spawn(async move {
			let hash = match node.send_raw_transaction(raw).await {
				Ok(hash) => hash,
				Err(e) => {
					tracing::warn!(error = %e, "Node rejected raw transaction");
					let _ = events.send(BroadcastEvent::Error(e.to_string()));
					return;
				},
			};

			tracing::info!(tx_hash = %truncate_id(&hash.to_string()), "Submitted transaction");
			if events.send(BroadcastEvent::TransactionHash(hash)).is_err() {
				// Receiver dropped; nobody is listening for the receipt.
				return;
			}

			match wait_for_receipt(node.as_ref(), hash, poll_interval, receipt_timeout).await {
				Ok(receipt) => {
					let success = receipt.success();
					let _ = events.send(BroadcastEvent::Receipt(receipt));
					if !success {
						let error = DeliveryError::TransactionFailed(format!(
							"transaction {} reverted",
							hash
						));
						let _ = events.send(BroadcastEvent::Error(error.to_string()));
					}
				},
				Err(e) => {
					let _ = events.send(BroadcastEvent::Error(e.to_string()));
				},
			}
		});

		receiver
	}

	/// Waits until the receipt of `hash` is available.
	pub async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, DeliveryError> {
		wait_for_receipt(
			self.node.as_ref(),
			hash,
			self.poll_interval,
			self.receipt_timeout,
		)
		.await
	}
}

async fn wait_for_receipt(
	node: &dyn NodeInterface,
	hash: B256,
	poll_interval: Duration,
	receipt_timeout: Duration,
) -> Result<TransactionReceipt, DeliveryError> {
	let start_time = tokio::time::Instant::now();

	loop {
		if let Some(receipt) = node.get_receipt(hash).await? {
			tracing::info!(
				tx_hash = %truncate_id(&hash.to_string()),
				block_number = receipt.block_number(),
				success = receipt.success(),
				"Transaction mined"
			);
			return Ok(receipt);
		}

		if start_time.elapsed() >= receipt_timeout {
			return Err(DeliveryError::Timeout(hash, receipt_timeout));
		}

		tracing::debug!(tx_hash = %truncate_id(&hash.to_string()), "Receipt not available yet");
		tokio::time::sleep(poll_interval).await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use klay_types::U64;
	use mockall::Sequence;

	fn receipt(hash: B256, status: u64) -> TransactionReceipt {
		TransactionReceipt {
			transaction_hash: hash,
			block_number: U64::from(120),
			status: U64::from(status),
			other: Default::default(),
		}
	}

	fn service(node: MockNodeInterface) -> DeliveryService {
		DeliveryService::new(
			Arc::new(node),
			Duration::from_millis(10),
			Duration::from_millis(200),
		)
	}

	async fn collect(mut receiver: mpsc::UnboundedReceiver<BroadcastEvent>) -> Vec<BroadcastEvent> {
		let mut events = Vec::new();
		while let Some(event) = receiver.recv().await {
			events.push(event);
		}
		events
	}

	#[tokio::test]
	async fn test_hash_then_receipt() {
		let hash = B256::repeat_byte(0xab);
		let mut node = MockNodeInterface::new();
		let mut seq = Sequence::new();
		node.expect_send_raw_transaction()
			.times(1)
			.in_sequence(&mut seq)
			.returning(move |_| Ok(hash));
		// Pending on the first poll, mined on the second.
		let mut polls = 0;
		node.expect_get_receipt()
			.times(2)
			.in_sequence(&mut seq)
			.returning(move |h| {
				polls += 1;
				Ok((polls > 1).then(|| receipt(h, 1)))
			});

		let events = collect(service(node).broadcast(Bytes::from(vec![0x08]))).await;
		assert_eq!(
			events,
			vec![
				BroadcastEvent::TransactionHash(hash),
				BroadcastEvent::Receipt(receipt(hash, 1)),
			]
		);
	}

	#[tokio::test]
	async fn test_rejected_submission_only_errors() {
		let mut node = MockNodeInterface::new();
		node.expect_send_raw_transaction()
			.times(1)
			.returning(|_| {
				Err(DeliveryError::Rpc {
					method: "klay_sendRawTransaction",
					message: "nonce too low".to_string(),
				})
			});
		node.expect_get_receipt().never();

		let events = collect(service(node).broadcast(Bytes::from(vec![0x08]))).await;
		assert_eq!(events.len(), 1);
		assert!(matches!(&events[0], BroadcastEvent::Error(msg) if msg.contains("nonce too low")));
	}

	#[tokio::test]
	async fn test_reverted_transaction_reports_receipt_and_error() {
		let hash = B256::repeat_byte(0x01);
		let mut node = MockNodeInterface::new();
		node.expect_send_raw_transaction()
			.returning(move |_| Ok(hash));
		node.expect_get_receipt()
			.returning(move |h| Ok(Some(receipt(h, 0))));

		let events = collect(service(node).broadcast(Bytes::new())).await;
		assert_eq!(events.len(), 3);
		assert!(matches!(events[1], BroadcastEvent::Receipt(_)));
		assert!(matches!(&events[2], BroadcastEvent::Error(msg) if msg.contains("reverted")));
	}

	#[tokio::test(start_paused = true)]
	async fn test_receipt_timeout() {
		let hash = B256::repeat_byte(0x02);
		let mut node = MockNodeInterface::new();
		node.expect_get_receipt().returning(|_| Ok(None));

		let result = service(node).wait_for_receipt(hash).await;
		assert!(matches!(result, Err(DeliveryError::Timeout(h, _)) if h == hash));
	}
}
