//! Transaction construction module for the Klaytn facade.
//!
//! Every transaction kind comes in three variants that differ only in who
//! pays the fee: the sender, a fee payer, or both split by ratio. This module
//! selects the variant from the fee-delegation ratio, builds typed
//! transactions from a descriptor, and implements the RLP codec used for
//! signing, broadcasting and decoding them.

use thiserror::Error;

pub mod codec;
pub mod descriptor;
pub mod kind;
pub mod transaction;

pub use descriptor::TransactionDescriptor;
pub use kind::{select_variant, FeeDelegation, TransactionKind, TransactionVariant};
pub use transaction::{Payload, Transaction};

/// Errors that can occur while building, encoding or decoding transactions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
	/// A field the transaction kind requires was not supplied.
	#[error("Missing field for {kind}: {field}")]
	MissingField {
		kind: TransactionKind,
		field: &'static str,
	},
	/// A field that has no meaning for the transaction kind was supplied.
	#[error("Field {field} is not applicable to {kind}")]
	UnexpectedField {
		kind: TransactionKind,
		field: &'static str,
	},
	/// A field needed for encoding has not been filled yet.
	#[error("Transaction is not ready for encoding: {0} is unset")]
	Incomplete(&'static str),
	/// The fee ratio of a partially delegated transaction is out of range.
	#[error("Invalid fee ratio {0}: expected 1 to 99")]
	InvalidFeeRatio(i64),
	/// A fee-payer operation was attempted on a variant without a fee payer.
	#[error("{0} is not a fee-delegated transaction")]
	NotFeeDelegated(TransactionVariant),
	/// The raw transaction starts with an unknown type tag.
	#[error("Unknown transaction type 0x{0:02x}")]
	UnknownType(u8),
	/// The raw transaction is not valid RLP for its type.
	#[error("Decode error: {0}")]
	Decode(String),
}

impl From<alloy_rlp::Error> for TransactionError {
	fn from(err: alloy_rlp::Error) -> Self {
		TransactionError::Decode(err.to_string())
	}
}
