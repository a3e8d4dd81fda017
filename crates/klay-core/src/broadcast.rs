//! Raw transaction broadcast with caller callbacks.

use crate::{decode_hex, FacadeError, KlayFacade};
use klay_types::{truncate_id, BroadcastEvent, Bytes, TransactionReceipt, B256};
use tracing::instrument;

type HashCallback = Box<dyn FnMut(B256) + Send>;
type ReceiptCallback = Box<dyn FnMut(&TransactionReceipt) + Send>;
type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Optional callbacks invoked as a broadcast progresses, once per event.
#[derive(Default)]
pub struct BroadcastCallbacks {
	on_transaction_hash: Option<HashCallback>,
	on_receipt: Option<ReceiptCallback>,
	on_error: Option<ErrorCallback>,
}

impl BroadcastCallbacks {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn on_transaction_hash(mut self, callback: impl FnMut(B256) + Send + 'static) -> Self {
		self.on_transaction_hash = Some(Box::new(callback));
		self
	}

	pub fn on_receipt(
		mut self,
		callback: impl FnMut(&TransactionReceipt) + Send + 'static,
	) -> Self {
		self.on_receipt = Some(Box::new(callback));
		self
	}

	pub fn on_error(mut self, callback: impl FnMut(&str) + Send + 'static) -> Self {
		self.on_error = Some(Box::new(callback));
		self
	}

	fn dispatch(&mut self, event: &BroadcastEvent) {
		match event {
			BroadcastEvent::TransactionHash(hash) => {
				if let Some(callback) = self.on_transaction_hash.as_mut() {
					callback(*hash);
				}
			},
			BroadcastEvent::Receipt(receipt) => {
				if let Some(callback) = self.on_receipt.as_mut() {
					callback(receipt);
				}
			},
			BroadcastEvent::Error(error) => {
				if let Some(callback) = self.on_error.as_mut() {
					callback(error);
				}
			},
		}
	}
}

impl KlayFacade {
	/// Broadcasts a hex raw transaction and waits until it is mined.
	///
	/// Callbacks fire in event order: the hash first, then the receipt. A
	/// rejected or reverted transaction fires the error callback and returns
	/// [`FacadeError::Broadcast`].
	#[instrument(skip_all, fields(size = raw.len()))]
	pub async fn send_raw_transaction(
		&self,
		raw: &str,
		mut callbacks: BroadcastCallbacks,
	) -> Result<TransactionReceipt, FacadeError> {
		let raw = Bytes::from(decode_hex(raw)?);
		let mut events = self.delivery.broadcast(raw);

		let mut receipt = None;
		let mut failure = None;
		while let Some(event) = events.recv().await {
			callbacks.dispatch(&event);
			match event {
				BroadcastEvent::TransactionHash(hash) => {
					tracing::debug!(tx_hash = %truncate_id(&hash.to_string()), "Broadcast accepted");
				},
				BroadcastEvent::Receipt(mined) => {
					tracing::info!(
						tx_hash = %truncate_id(&mined.transaction_hash.to_string()),
						block = mined.block_number(),
						success = mined.success(),
						"Transaction mined"
					);
					receipt = Some(mined);
				},
				BroadcastEvent::Error(error) => {
					tracing::warn!(%error, "Broadcast failed");
					failure = Some(error);
				},
			}
		}

		match (failure, receipt) {
			(Some(error), _) => Err(FacadeError::Broadcast(error)),
			(None, Some(receipt)) => Ok(receipt),
			(None, None) => Err(FacadeError::Broadcast(
				"event stream ended without a receipt".to_string(),
			)),
		}
	}
}
