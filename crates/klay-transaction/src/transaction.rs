//! Typed Klaytn transactions.

use crate::{
	codec, FeeDelegation, TransactionDescriptor, TransactionError, TransactionKind,
	TransactionVariant,
};
use klay_types::{keccak256, AccountKey, Address, Bytes, SignatureData, B256, U256};

/// Kind-specific transaction fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
	ValueTransfer {
		to: Address,
		value: U256,
	},
	ValueTransferMemo {
		to: Address,
		value: U256,
		input: Bytes,
	},
	SmartContractDeploy {
		value: U256,
		input: Bytes,
		human_readable: bool,
		code_format: u8,
	},
	SmartContractExecution {
		to: Address,
		value: U256,
		input: Bytes,
	},
	AccountUpdate {
		key: AccountKey,
	},
	Cancel,
	ChainDataAnchoring {
		input: Bytes,
	},
}

impl Payload {
	pub fn kind(&self) -> TransactionKind {
		match self {
			Payload::ValueTransfer { .. } => TransactionKind::ValueTransfer,
			Payload::ValueTransferMemo { .. } => TransactionKind::ValueTransferMemo,
			Payload::SmartContractDeploy { .. } => TransactionKind::SmartContractDeploy,
			Payload::SmartContractExecution { .. } => TransactionKind::SmartContractExecution,
			Payload::AccountUpdate { .. } => TransactionKind::AccountUpdate,
			Payload::Cancel => TransactionKind::Cancel,
			Payload::ChainDataAnchoring { .. } => TransactionKind::ChainDataAnchoring,
		}
	}
}

/// A Klaytn transaction of one of the 21 variants.
///
/// Signature lists hold only real signatures; the empty placeholder is
/// written by the codec when a list is empty and dropped again on decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
	pub variant: TransactionVariant,
	pub from: Address,
	pub nonce: Option<u64>,
	pub gas_price: Option<U256>,
	pub gas: u64,
	pub chain_id: u64,
	pub payload: Payload,
	/// Share of the fee paid by the fee payer, only for partial delegation.
	pub fee_ratio: Option<u8>,
	pub signatures: Vec<SignatureData>,
	pub fee_payer: Option<Address>,
	pub fee_payer_signatures: Vec<SignatureData>,
}

impl Transaction {
	/// Builds a transaction of `variant` from a shaped descriptor.
	///
	/// Fails when a field the kind requires is missing, when a field the kind
	/// does not carry is present, or when a partially delegated variant has a
	/// fee ratio outside 1 to 99.
	pub fn from_descriptor(
		variant: TransactionVariant,
		descriptor: TransactionDescriptor,
	) -> Result<Self, TransactionError> {
		let kind = variant.kind;
		let TransactionDescriptor {
			from,
			gas,
			chain_id,
			nonce,
			gas_price,
			to,
			value,
			input,
			account_key,
			fee_ratio,
		} = descriptor;

		let required = |field: &'static str| TransactionError::MissingField { kind, field };
		let reject = |present: bool, field: &'static str| {
			if present {
				Err(TransactionError::UnexpectedField { kind, field })
			} else {
				Ok(())
			}
		};

		let payload = match kind {
			TransactionKind::ValueTransfer => {
				reject(input.is_some(), "input")?;
				reject(account_key.is_some(), "account_key")?;
				Payload::ValueTransfer {
					to: to.ok_or_else(|| required("to"))?,
					value: value.ok_or_else(|| required("value"))?,
				}
			},
			TransactionKind::ValueTransferMemo => {
				reject(account_key.is_some(), "account_key")?;
				Payload::ValueTransferMemo {
					to: to.ok_or_else(|| required("to"))?,
					value: value.ok_or_else(|| required("value"))?,
					input: input.ok_or_else(|| required("input"))?,
				}
			},
			TransactionKind::SmartContractDeploy => {
				reject(to.is_some(), "to")?;
				reject(account_key.is_some(), "account_key")?;
				Payload::SmartContractDeploy {
					value: value.unwrap_or_default(),
					input: input.ok_or_else(|| required("input"))?,
					human_readable: false,
					code_format: 0,
				}
			},
			TransactionKind::SmartContractExecution => {
				reject(account_key.is_some(), "account_key")?;
				Payload::SmartContractExecution {
					to: to.ok_or_else(|| required("to"))?,
					value: value.unwrap_or_default(),
					input: input.ok_or_else(|| required("input"))?,
				}
			},
			TransactionKind::AccountUpdate => {
				reject(to.is_some(), "to")?;
				reject(value.is_some(), "value")?;
				reject(input.is_some(), "input")?;
				Payload::AccountUpdate {
					key: account_key.ok_or_else(|| required("account_key"))?,
				}
			},
			TransactionKind::Cancel => {
				reject(to.is_some(), "to")?;
				reject(value.is_some(), "value")?;
				reject(input.is_some(), "input")?;
				reject(account_key.is_some(), "account_key")?;
				Payload::Cancel
			},
			TransactionKind::ChainDataAnchoring => {
				reject(to.is_some(), "to")?;
				reject(value.is_some(), "value")?;
				reject(account_key.is_some(), "account_key")?;
				Payload::ChainDataAnchoring {
					input: input.ok_or_else(|| required("input"))?,
				}
			},
		};

		let fee_ratio = match variant.delegation {
			FeeDelegation::FeeDelegatedWithRatio => {
				let ratio = fee_ratio.ok_or_else(|| required("fee_ratio"))?;
				match u8::try_from(ratio) {
					Ok(valid @ 1..=99) => Some(valid),
					_ => return Err(TransactionError::InvalidFeeRatio(ratio)),
				}
			},
			FeeDelegation::Basic | FeeDelegation::FeeDelegated => {
				reject(fee_ratio.is_some(), "fee_ratio")?;
				None
			},
		};

		Ok(Self {
			variant,
			from,
			nonce,
			gas_price,
			gas,
			chain_id,
			payload,
			fee_ratio,
			signatures: Vec::new(),
			fee_payer: None,
			fee_payer_signatures: Vec::new(),
		})
	}

	pub fn kind(&self) -> TransactionKind {
		self.variant.kind
	}

	pub fn type_tag(&self) -> u8 {
		self.variant.type_tag()
	}

	/// Whether the sender signs with its account-update role key.
	pub fn is_account_update(&self) -> bool {
		self.kind() == TransactionKind::AccountUpdate
	}

	/// The RLP the sender signs.
	pub fn signature_rlp(&self) -> Result<Vec<u8>, TransactionError> {
		codec::encode_sender_signature_rlp(self)
	}

	pub fn signature_hash(&self) -> Result<B256, TransactionError> {
		Ok(keccak256(self.signature_rlp()?))
	}

	/// The RLP `fee_payer` signs. Only fee-delegated variants have one.
	pub fn fee_payer_signature_rlp(&self, fee_payer: Address) -> Result<Vec<u8>, TransactionError> {
		if !self.variant.is_fee_delegated() {
			return Err(TransactionError::NotFeeDelegated(self.variant));
		}
		codec::encode_fee_payer_signature_rlp(self, fee_payer)
	}

	pub fn fee_payer_signature_hash(&self, fee_payer: Address) -> Result<B256, TransactionError> {
		Ok(keccak256(self.fee_payer_signature_rlp(fee_payer)?))
	}

	/// Appends sender signatures, skipping empty placeholders.
	pub fn append_signatures(&mut self, signatures: impl IntoIterator<Item = SignatureData>) {
		self.signatures
			.extend(signatures.into_iter().filter(|sig| !sig.is_empty()));
	}

	/// Sets the fee payer and appends its signatures.
	///
	/// A different fee payer replaces the previous one and its signatures.
	pub fn append_fee_payer_signatures(
		&mut self,
		fee_payer: Address,
		signatures: impl IntoIterator<Item = SignatureData>,
	) -> Result<(), TransactionError> {
		if !self.variant.is_fee_delegated() {
			return Err(TransactionError::NotFeeDelegated(self.variant));
		}
		if self.fee_payer != Some(fee_payer) {
			self.fee_payer = Some(fee_payer);
			self.fee_payer_signatures.clear();
		}
		self.fee_payer_signatures
			.extend(signatures.into_iter().filter(|sig| !sig.is_empty()));
		Ok(())
	}

	/// Type-prefixed RLP encoding, ready for `klay_sendRawTransaction`.
	pub fn raw_transaction(&self) -> Result<Bytes, TransactionError> {
		codec::encode_raw(self).map(Bytes::from)
	}

	pub fn transaction_hash(&self) -> Result<B256, TransactionError> {
		Ok(keccak256(codec::encode_raw(self)?))
	}

	/// Decodes a raw transaction produced by [`Transaction::raw_transaction`].
	pub fn decode(raw: &[u8]) -> Result<Self, TransactionError> {
		codec::decode_raw(raw)
	}
}
