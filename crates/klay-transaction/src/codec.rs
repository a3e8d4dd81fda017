//! RLP codec for Klaytn typed transactions.
//!
//! The sender signs `rlp([rlp([tag, fields..]), chain_id, 0, 0])` and a fee
//! payer signs `rlp([rlp([tag, fields..]), fee_payer, chain_id, 0, 0])`. The
//! raw form is the type tag followed by `rlp([fields.., signatures])`, with
//! the fee payer and its signatures appended for delegated variants.

use crate::{
	FeeDelegation, Payload, Transaction, TransactionError, TransactionKind, TransactionVariant,
};
use alloy_rlp::{Decodable, Encodable, Header};
use klay_types::{AccountKey, Address, Bytes, SignatureData, U256};

/// Incrementally encoded RLP list.
struct RlpList {
	payload: Vec<u8>,
}

impl RlpList {
	fn new() -> Self {
		Self {
			payload: Vec::new(),
		}
	}

	fn push<T: Encodable + ?Sized>(&mut self, item: &T) -> &mut Self {
		item.encode(&mut self.payload);
		self
	}

	fn push_list<T: Encodable>(&mut self, items: &[T]) -> &mut Self {
		alloy_rlp::encode_list::<T, T>(items, &mut self.payload);
		self
	}

	fn finish(self) -> Vec<u8> {
		let header = Header {
			list: true,
			payload_length: self.payload.len(),
		};
		let mut out = Vec::with_capacity(header.length() + self.payload.len());
		header.encode(&mut out);
		out.extend_from_slice(&self.payload);
		out
	}
}

fn push_fields(list: &mut RlpList, tx: &Transaction) -> Result<(), TransactionError> {
	let nonce = tx.nonce.ok_or(TransactionError::Incomplete("nonce"))?;
	let gas_price = tx.gas_price.ok_or(TransactionError::Incomplete("gas_price"))?;
	list.push(&nonce).push(&gas_price).push(&tx.gas);

	match &tx.payload {
		Payload::ValueTransfer { to, value } => {
			list.push(to).push(value).push(&tx.from);
		},
		Payload::ValueTransferMemo { to, value, input }
		| Payload::SmartContractExecution { to, value, input } => {
			list.push(to).push(value).push(&tx.from).push(input);
		},
		Payload::SmartContractDeploy {
			value,
			input,
			human_readable,
			code_format,
		} => {
			// Deploys carry an empty recipient.
			list.push(&Bytes::new())
				.push(value)
				.push(&tx.from)
				.push(input)
				.push(human_readable)
				.push(code_format);
		},
		Payload::AccountUpdate { key } => {
			list.push(&tx.from).push(&Bytes::from(key.encode()));
		},
		Payload::Cancel => {
			list.push(&tx.from);
		},
		Payload::ChainDataAnchoring { input } => {
			list.push(&tx.from).push(input);
		},
	}

	if tx.variant.delegation == FeeDelegation::FeeDelegatedWithRatio {
		let ratio = tx.fee_ratio.ok_or(TransactionError::Incomplete("fee_ratio"))?;
		list.push(&ratio);
	}
	Ok(())
}

fn push_signatures(list: &mut RlpList, signatures: &[SignatureData]) {
	if signatures.is_empty() {
		list.push_list(&[SignatureData::EMPTY]);
	} else {
		list.push_list(signatures);
	}
}

/// `rlp([tag, fields..])`, shared by both signature forms.
fn encode_tagged_fields(tx: &Transaction) -> Result<Vec<u8>, TransactionError> {
	let mut list = RlpList::new();
	list.push(&tx.type_tag());
	push_fields(&mut list, tx)?;
	Ok(list.finish())
}

pub(crate) fn encode_sender_signature_rlp(tx: &Transaction) -> Result<Vec<u8>, TransactionError> {
	let fields = encode_tagged_fields(tx)?;
	let mut list = RlpList::new();
	list.push(fields.as_slice())
		.push(&tx.chain_id)
		.push(&0u8)
		.push(&0u8);
	Ok(list.finish())
}

pub(crate) fn encode_fee_payer_signature_rlp(
	tx: &Transaction,
	fee_payer: Address,
) -> Result<Vec<u8>, TransactionError> {
	let fields = encode_tagged_fields(tx)?;
	let mut list = RlpList::new();
	list.push(fields.as_slice())
		.push(&fee_payer)
		.push(&tx.chain_id)
		.push(&0u8)
		.push(&0u8);
	Ok(list.finish())
}

pub(crate) fn encode_raw(tx: &Transaction) -> Result<Vec<u8>, TransactionError> {
	let mut list = RlpList::new();
	push_fields(&mut list, tx)?;
	push_signatures(&mut list, &tx.signatures);

	if tx.variant.is_fee_delegated() {
		match &tx.fee_payer {
			Some(fee_payer) => list.push(fee_payer),
			None => list.push(&Bytes::new()),
		};
		push_signatures(&mut list, &tx.fee_payer_signatures);
	}

	let body = list.finish();
	let mut out = Vec::with_capacity(1 + body.len());
	out.push(tx.type_tag());
	out.extend_from_slice(&body);
	Ok(out)
}

fn decode_signatures(buf: &mut &[u8]) -> Result<Vec<SignatureData>, TransactionError> {
	Ok(Vec::<SignatureData>::decode(buf)?
		.into_iter()
		.filter(|sig| !sig.is_empty())
		.collect())
}

/// Chain id recovered from an EIP-155 style `v`.
fn chain_id_from_v(v: u64) -> Option<u64> {
	v.checked_sub(35).map(|n| n / 2)
}

pub(crate) fn decode_raw(raw: &[u8]) -> Result<Transaction, TransactionError> {
	let (tag, rest) = raw
		.split_first()
		.ok_or_else(|| TransactionError::Decode("empty input".to_string()))?;
	let variant = TransactionVariant::from_type_tag(*tag).ok_or(TransactionError::UnknownType(*tag))?;
	let kind = variant.kind;

	let mut buf = rest;
	let mut body = Header::decode_bytes(&mut buf, true)?;
	if !buf.is_empty() {
		return Err(TransactionError::Decode(
			"trailing bytes after transaction".to_string(),
		));
	}

	let nonce = u64::decode(&mut body)?;
	let gas_price = U256::decode(&mut body)?;
	let gas = u64::decode(&mut body)?;

	let (from, payload) = match kind {
		TransactionKind::ValueTransfer => {
			let to = Address::decode(&mut body)?;
			let value = U256::decode(&mut body)?;
			let from = Address::decode(&mut body)?;
			(from, Payload::ValueTransfer { to, value })
		},
		TransactionKind::ValueTransferMemo | TransactionKind::SmartContractExecution => {
			let to = Address::decode(&mut body)?;
			let value = U256::decode(&mut body)?;
			let from = Address::decode(&mut body)?;
			let input = Bytes::decode(&mut body)?;
			let payload = if kind == TransactionKind::ValueTransferMemo {
				Payload::ValueTransferMemo { to, value, input }
			} else {
				Payload::SmartContractExecution { to, value, input }
			};
			(from, payload)
		},
		TransactionKind::SmartContractDeploy => {
			if !Bytes::decode(&mut body)?.is_empty() {
				return Err(TransactionError::UnexpectedField { kind, field: "to" });
			}
			let value = U256::decode(&mut body)?;
			let from = Address::decode(&mut body)?;
			let input = Bytes::decode(&mut body)?;
			let human_readable = bool::decode(&mut body)?;
			let code_format = u8::decode(&mut body)?;
			(
				from,
				Payload::SmartContractDeploy {
					value,
					input,
					human_readable,
					code_format,
				},
			)
		},
		TransactionKind::AccountUpdate => {
			let from = Address::decode(&mut body)?;
			let encoded_key = Bytes::decode(&mut body)?;
			let key = AccountKey::decode(&encoded_key)?;
			(from, Payload::AccountUpdate { key })
		},
		TransactionKind::Cancel => (Address::decode(&mut body)?, Payload::Cancel),
		TransactionKind::ChainDataAnchoring => {
			let from = Address::decode(&mut body)?;
			let input = Bytes::decode(&mut body)?;
			(from, Payload::ChainDataAnchoring { input })
		},
	};

	let fee_ratio = match variant.delegation {
		FeeDelegation::FeeDelegatedWithRatio => match u8::decode(&mut body)? {
			ratio @ 1..=99 => Some(ratio),
			ratio => return Err(TransactionError::InvalidFeeRatio(ratio.into())),
		},
		FeeDelegation::Basic | FeeDelegation::FeeDelegated => None,
	};

	let signatures = decode_signatures(&mut body)?;

	let (fee_payer, fee_payer_signatures) = if variant.is_fee_delegated() {
		let encoded = Bytes::decode(&mut body)?;
		let fee_payer = match encoded.len() {
			0 => None,
			20 => Some(Address::from_slice(&encoded)),
			n => {
				return Err(TransactionError::Decode(format!(
					"fee payer must be 20 bytes, got {}",
					n
				)))
			},
		};
		(fee_payer, decode_signatures(&mut body)?)
	} else {
		(None, Vec::new())
	};

	if !body.is_empty() {
		return Err(TransactionError::Decode(format!(
			"unexpected trailing fields in {}",
			variant
		)));
	}

	let chain_id = signatures
		.iter()
		.chain(fee_payer_signatures.iter())
		.find_map(|sig| chain_id_from_v(sig.v))
		.unwrap_or_default();

	Ok(Transaction {
		variant,
		from,
		nonce: Some(nonce),
		gas_price: Some(gas_price),
		gas,
		chain_id,
		payload,
		fee_ratio,
		signatures,
		fee_payer,
		fee_payer_signatures,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{select_variant, TransactionDescriptor};
	use klay_account::{Keyring, Role};

	const SENDER_KEY: &str = "0x45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8";
	const SENDER: &str = "0xa94f5374fce5edbc8e2a8697c15331677e6ebf0b";
	const RECIPIENT: &str = "0x7b65b75d204abed71587c9e519a89277766ee1d0";
	const FEE_PAYER: &str = "0x5a0043070275d9f6054307ee7348bd660849d90f";

	fn build(kind: TransactionKind, ratio: i64, descriptor: TransactionDescriptor) -> Transaction {
		let descriptor = descriptor
			.with_nonce(1234)
			.with_gas_price(U256::from(25))
			.with_chain_id(1);
		let (variant, descriptor) = select_variant(kind, ratio, descriptor);
		Transaction::from_descriptor(variant, descriptor).unwrap()
	}

	fn descriptor() -> TransactionDescriptor {
		TransactionDescriptor::new(SENDER.parse().unwrap(), 1_000_000)
	}

	#[test]
	fn test_value_transfer_signature_rlp() {
		let tx = build(
			TransactionKind::ValueTransfer,
			0,
			descriptor()
				.with_to(RECIPIENT.parse().unwrap())
				.with_value(U256::from(10)),
		);

		assert_eq!(
			hex::encode(tx.signature_rlp().unwrap()),
			"f839b5f4088204d219830f4240947b65b75d204abed71587c9e519a89277766ee1d00a94a94f5374fce5edbc8e2a8697c15331677e6ebf0b018080"
		);
	}

	#[test]
	fn test_cancel_signature_rlp() {
		let tx = build(TransactionKind::Cancel, 0, descriptor());
		assert_eq!(
			hex::encode(tx.signature_rlp().unwrap()),
			"e39fde388204d219830f424094a94f5374fce5edbc8e2a8697c15331677e6ebf0b018080"
		);
	}

	#[test]
	fn test_partial_delegation_signature_rlps() {
		let tx = build(TransactionKind::Cancel, 30, descriptor());
		assert_eq!(tx.type_tag(), 0x3a);

		assert_eq!(
			hex::encode(tx.signature_rlp().unwrap()),
			"e4a0df3a8204d219830f424094a94f5374fce5edbc8e2a8697c15331677e6ebf0b1e018080"
		);
		assert_eq!(
			hex::encode(tx.fee_payer_signature_rlp(FEE_PAYER.parse().unwrap()).unwrap()),
			"f839a0df3a8204d219830f424094a94f5374fce5edbc8e2a8697c15331677e6ebf0b1e945a0043070275d9f6054307ee7348bd660849d90f018080"
		);
	}

	#[test]
	fn test_unsigned_raw_uses_placeholders() {
		let tx = build(TransactionKind::Cancel, 30, descriptor());
		assert_eq!(
			hex::encode(tx.raw_transaction().unwrap()),
			"3ae98204d219830f424094a94f5374fce5edbc8e2a8697c15331677e6ebf0b1ec4c301808080c4c3018080"
		);

		let decoded = Transaction::decode(&tx.raw_transaction().unwrap()).unwrap();
		assert!(decoded.signatures.is_empty());
		assert_eq!(decoded.fee_payer, None);
		assert_eq!(decoded.fee_ratio, Some(30));
	}

	#[test]
	fn test_signed_transfer_decodes_to_the_same_transaction() {
		let keyring = Keyring::from_private_key(SENDER_KEY).unwrap();
		assert_eq!(keyring.address(), SENDER.parse::<Address>().unwrap());

		let mut tx = build(
			TransactionKind::ValueTransfer,
			0,
			descriptor()
				.with_to(RECIPIENT.parse().unwrap())
				.with_value(U256::from(10)),
		);
		let hash = tx.signature_hash().unwrap();
		let signatures = keyring
			.sign_transaction_hash(&hash, tx.chain_id, Role::Transaction)
			.unwrap();
		tx.append_signatures(signatures);

		let raw = tx.raw_transaction().unwrap();
		assert_eq!(raw[0], 0x08);
		assert!(matches!(tx.signatures[0].v, 37 | 38));

		let decoded = Transaction::decode(&raw).unwrap();
		assert_eq!(decoded, tx);
		assert_eq!(decoded.transaction_hash().unwrap(), tx.transaction_hash().unwrap());
	}

	#[test]
	fn test_fee_delegated_execution_with_both_signatures() {
		let sender = Keyring::from_private_key(SENDER_KEY).unwrap();
		let fee_payer = Keyring::generate();

		let mut tx = build(
			TransactionKind::SmartContractExecution,
			100,
			descriptor()
				.with_to(RECIPIENT.parse().unwrap())
				.with_input(hex::decode("a9059cbb").unwrap()),
		);
		let signatures = sender
			.sign_transaction_hash(&tx.signature_hash().unwrap(), 1, Role::Transaction)
			.unwrap();
		tx.append_signatures(signatures);

		let hash = tx.fee_payer_signature_hash(fee_payer.address()).unwrap();
		let signatures = fee_payer
			.sign_transaction_hash(&hash, 1, Role::FeePayer)
			.unwrap();
		tx.append_fee_payer_signatures(fee_payer.address(), signatures)
			.unwrap();

		let decoded = Transaction::decode(&tx.raw_transaction().unwrap()).unwrap();
		assert_eq!(decoded.type_tag(), 0x31);
		assert_eq!(decoded.fee_payer, Some(fee_payer.address()));
		assert_eq!(decoded.fee_payer_signatures.len(), 1);
		assert_eq!(decoded, tx);
	}

	#[test]
	fn test_deploy_encodes_empty_recipient() {
		let tx = build(
			TransactionKind::SmartContractDeploy,
			0,
			descriptor().with_input(vec![0x60, 0x80, 0x60, 0x40]),
		);
		let raw = tx.raw_transaction().unwrap();

		let mut expected = Vec::new();
		expected.extend_from_slice(&hex::decode("8204d219830f4240").unwrap());
		// empty recipient and zero value
		expected.extend_from_slice(&[0x80, 0x80]);
		// type tag and a single-byte list header
		let body_start = 2;
		assert_eq!(&raw[body_start..body_start + expected.len()], expected.as_slice());

		let decoded = Transaction::decode(&raw).unwrap();
		assert_eq!(decoded.payload, tx.payload);
	}

	#[test]
	fn test_account_update_round_trips_key() {
		let key = AccountKey::RoleBased(vec![AccountKey::Legacy, AccountKey::Nil, AccountKey::Fail]);
		let tx = build(
			TransactionKind::AccountUpdate,
			0,
			descriptor().with_account_key(key.clone()),
		);

		let decoded = Transaction::decode(&tx.raw_transaction().unwrap()).unwrap();
		assert_eq!(decoded.payload, Payload::AccountUpdate { key });
	}

	#[test]
	fn test_rejects_malformed_input() {
		assert!(matches!(
			Transaction::decode(&[]),
			Err(TransactionError::Decode(_))
		));
		assert_eq!(
			Transaction::decode(&[0x02, 0xc0]),
			Err(TransactionError::UnknownType(0x02))
		);

		let tx = build(TransactionKind::Cancel, 0, descriptor());
		let mut raw = tx.raw_transaction().unwrap().to_vec();
		raw.push(0x00);
		assert!(matches!(
			Transaction::decode(&raw),
			Err(TransactionError::Decode(_))
		));
		assert!(Transaction::decode(&raw[..raw.len() - 4]).is_err());
	}

	#[test]
	fn test_rejects_out_of_band_fee_ratio() {
		let tx = build(TransactionKind::Cancel, 30, descriptor());
		let mut raw = tx.raw_transaction().unwrap().to_vec();
		// The ratio sits just before the two placeholder signature lists.
		let at = raw.len() - 12;
		assert_eq!(raw[at], 30);

		raw[at] = 100;
		assert_eq!(
			Transaction::decode(&raw),
			Err(TransactionError::InvalidFeeRatio(100))
		);
		// RLP zero
		raw[at] = 0x80;
		assert_eq!(
			Transaction::decode(&raw),
			Err(TransactionError::InvalidFeeRatio(0))
		);
	}

	#[test]
	fn test_rejects_nested_role_based_key() {
		let mut tx = build(
			TransactionKind::AccountUpdate,
			0,
			descriptor().with_account_key(AccountKey::Legacy),
		);
		tx.payload = Payload::AccountUpdate {
			key: AccountKey::RoleBased(vec![AccountKey::RoleBased(vec![AccountKey::Nil])]),
		};

		assert!(matches!(
			Transaction::decode(&tx.raw_transaction().unwrap()),
			Err(TransactionError::Decode(_))
		));
	}
}
