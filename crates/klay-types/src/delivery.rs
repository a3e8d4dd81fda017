//! Transaction delivery types.
//!
//! This module defines what a node hands back after a raw transaction is
//! broadcast: the receipt record and the events emitted while the network
//! processes the transaction.

use alloy_primitives::{B256, U64};
use serde::{Deserialize, Serialize};

/// Receipt returned by the node once a transaction is included in a block.
///
/// Only the fields the facade reasons about are typed; everything else the
/// node reports is kept verbatim in `other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub transaction_hash: B256,
	/// The block number where the transaction was included.
	pub block_number: U64,
	/// Execution status, `1` on success.
	pub status: U64,
	/// Remaining receipt fields as reported by the node.
	#[serde(flatten)]
	pub other: serde_json::Map<String, serde_json::Value>,
}

impl TransactionReceipt {
	/// Whether the transaction executed successfully.
	pub fn success(&self) -> bool {
		self.status == U64::from(1)
	}

	pub fn block_number(&self) -> u64 {
		self.block_number.to::<u64>()
	}
}

/// Events emitted while a broadcast transaction is processed.
///
/// The producer decides the ordering: the hash is known before the receipt,
/// and an error may arrive instead of, or alongside, either of them.
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastEvent {
	/// The node accepted the transaction and issued its hash.
	TransactionHash(B256),
	/// The transaction was included in a block.
	Receipt(TransactionReceipt),
	/// The node or the transport reported a failure.
	Error(String),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_receipt_from_node_json() {
		let json = serde_json::json!({
			"transactionHash": "0x2f2e4d5f0c6e8a3c1b1d8b8b7c2c6d1a9e4f3b2a1c0d9e8f7a6b5c4d3e2f1a0b",
			"blockNumber": "0x1a",
			"status": "0x1",
			"gasUsed": "0x5208",
			"feePayer": "0x0000000000000000000000000000000000000000"
		});

		let receipt: TransactionReceipt = serde_json::from_value(json).unwrap();
		assert!(receipt.success());
		assert_eq!(receipt.block_number(), 26);
		assert_eq!(receipt.other.get("gasUsed").unwrap(), "0x5208");
		assert!(receipt.other.contains_key("feePayer"));
	}

	#[test]
	fn test_failed_receipt_status() {
		let json = serde_json::json!({
			"transactionHash": "0x2f2e4d5f0c6e8a3c1b1d8b8b7c2c6d1a9e4f3b2a1c0d9e8f7a6b5c4d3e2f1a0b",
			"blockNumber": "0x2",
			"status": "0x0"
		});

		let receipt: TransactionReceipt = serde_json::from_value(json).unwrap();
		assert!(!receipt.success());
		assert!(receipt.other.is_empty());
	}
}
