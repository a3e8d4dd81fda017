//! Transaction kinds and fee-delegation variant selection.

use crate::TransactionDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The seven transaction kinds the facade can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
	ValueTransfer,
	ValueTransferMemo,
	SmartContractDeploy,
	SmartContractExecution,
	AccountUpdate,
	Cancel,
	ChainDataAnchoring,
}

impl TransactionKind {
	pub const ALL: [TransactionKind; 7] = [
		TransactionKind::ValueTransfer,
		TransactionKind::ValueTransferMemo,
		TransactionKind::SmartContractDeploy,
		TransactionKind::SmartContractExecution,
		TransactionKind::AccountUpdate,
		TransactionKind::Cancel,
		TransactionKind::ChainDataAnchoring,
	];

	/// Type tag of the basic variant; the delegated variants follow it.
	const fn base_tag(self) -> u8 {
		match self {
			TransactionKind::ValueTransfer => 0x08,
			TransactionKind::ValueTransferMemo => 0x10,
			TransactionKind::AccountUpdate => 0x20,
			TransactionKind::SmartContractDeploy => 0x28,
			TransactionKind::SmartContractExecution => 0x30,
			TransactionKind::Cancel => 0x38,
			TransactionKind::ChainDataAnchoring => 0x48,
		}
	}

	pub const fn name(self) -> &'static str {
		match self {
			TransactionKind::ValueTransfer => "ValueTransfer",
			TransactionKind::ValueTransferMemo => "ValueTransferMemo",
			TransactionKind::SmartContractDeploy => "SmartContractDeploy",
			TransactionKind::SmartContractExecution => "SmartContractExecution",
			TransactionKind::AccountUpdate => "AccountUpdate",
			TransactionKind::Cancel => "Cancel",
			TransactionKind::ChainDataAnchoring => "ChainDataAnchoring",
		}
	}
}

impl fmt::Display for TransactionKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Who pays the transaction fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeDelegation {
	/// The sender pays the whole fee.
	Basic,
	/// A fee payer covers the whole fee.
	FeeDelegated,
	/// Sender and fee payer split the fee by ratio.
	FeeDelegatedWithRatio,
}

impl FeeDelegation {
	/// Band a fee-delegation ratio falls in.
	///
	/// Only 0 and 100 are matched exactly; every other value, in range or
	/// not, is a partial delegation and is not validated here.
	pub const fn for_ratio(ratio: i64) -> Self {
		match ratio {
			0 => FeeDelegation::Basic,
			100 => FeeDelegation::FeeDelegated,
			_ => FeeDelegation::FeeDelegatedWithRatio,
		}
	}

	const fn tag_offset(self) -> u8 {
		match self {
			FeeDelegation::Basic => 0,
			FeeDelegation::FeeDelegated => 1,
			FeeDelegation::FeeDelegatedWithRatio => 2,
		}
	}
}

/// A concrete transaction type: a kind together with its fee delegation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionVariant {
	pub kind: TransactionKind,
	pub delegation: FeeDelegation,
}

impl TransactionVariant {
	pub const fn new(kind: TransactionKind, delegation: FeeDelegation) -> Self {
		Self { kind, delegation }
	}

	/// The Klaytn transaction type tag.
	pub const fn type_tag(self) -> u8 {
		self.kind.base_tag() + self.delegation.tag_offset()
	}

	pub fn from_type_tag(tag: u8) -> Option<Self> {
		TransactionKind::ALL.into_iter().find_map(|kind| {
			let delegation = match tag.checked_sub(kind.base_tag())? {
				0 => FeeDelegation::Basic,
				1 => FeeDelegation::FeeDelegated,
				2 => FeeDelegation::FeeDelegatedWithRatio,
				_ => return None,
			};
			Some(Self::new(kind, delegation))
		})
	}

	pub const fn is_fee_delegated(self) -> bool {
		!matches!(self.delegation, FeeDelegation::Basic)
	}
}

impl fmt::Display for TransactionVariant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.delegation {
			FeeDelegation::Basic => write!(f, "{}", self.kind),
			FeeDelegation::FeeDelegated => write!(f, "FeeDelegated{}", self.kind),
			FeeDelegation::FeeDelegatedWithRatio => write!(f, "FeeDelegated{}WithRatio", self.kind),
		}
	}
}

/// Picks the variant for `kind` from the fee-delegation ratio and shapes the
/// descriptor for it.
///
/// The descriptor leaves with a fee ratio only when the ratio selects the
/// partially delegated variant; any ratio it carried before is dropped.
pub fn select_variant(
	kind: TransactionKind,
	ratio: i64,
	mut descriptor: TransactionDescriptor,
) -> (TransactionVariant, TransactionDescriptor) {
	let delegation = FeeDelegation::for_ratio(ratio);
	descriptor.fee_ratio = match delegation {
		FeeDelegation::FeeDelegatedWithRatio => Some(ratio),
		FeeDelegation::Basic | FeeDelegation::FeeDelegated => None,
	};
	(TransactionVariant::new(kind, delegation), descriptor)
}
