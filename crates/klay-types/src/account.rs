//! Account-related types shared by keyrings and transactions.
//!
//! Signatures are produced by keyrings and carried by transactions; account
//! keys are derived from keyrings and carried by account-update
//! transactions. Both live here so neither crate depends on the other.

use alloy_primitives::{Bytes, U256};
use alloy_rlp::{Decodable, Encodable, Header, RlpDecodable, RlpEncodable};
use serde::{Deserialize, Serialize};

/// A single `(v, r, s)` signature as carried in Klaytn transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, RlpEncodable, RlpDecodable)]
pub struct SignatureData {
	pub v: u64,
	pub r: U256,
	pub s: U256,
}

impl SignatureData {
	/// Placeholder used where a signature list is still empty.
	pub const EMPTY: SignatureData = SignatureData {
		v: 1,
		r: U256::ZERO,
		s: U256::ZERO,
	};

	pub fn is_empty(&self) -> bool {
		*self == Self::EMPTY
	}
}

/// A public key with its weight inside a weighted multisig account key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, RlpEncodable, RlpDecodable)]
pub struct WeightedPublicKey {
	pub weight: u64,
	/// SEC1 compressed public key.
	pub key: Bytes,
}

/// The key configuration an account-update transaction installs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKey {
	/// Leaves a role unchanged inside a role-based key.
	Nil,
	/// The address is derived from the key.
	Legacy,
	/// A single SEC1 compressed public key.
	Public(Bytes),
	/// No transaction from the account can be valid.
	Fail,
	WeightedMultiSig {
		threshold: u64,
		keys: Vec<WeightedPublicKey>,
	},
	/// Transaction, account-update and fee-payer roles, in that order.
	RoleBased(Vec<AccountKey>),
}

const ACCOUNT_KEY_NIL: u8 = 0x80;
const ACCOUNT_KEY_LEGACY: u8 = 0x01;
const ACCOUNT_KEY_PUBLIC: u8 = 0x02;
const ACCOUNT_KEY_FAIL: u8 = 0x03;
const ACCOUNT_KEY_WEIGHTED_MULTISIG: u8 = 0x04;
const ACCOUNT_KEY_ROLE_BASED: u8 = 0x05;
const EMPTY_LIST: u8 = 0xc0;
/// Transaction, account update and fee payer.
const MAX_ROLES: usize = 3;

impl AccountKey {
	/// Type-prefixed RLP encoding as expected inside an account update.
	pub fn encode(&self) -> Vec<u8> {
		match self {
			AccountKey::Nil => vec![ACCOUNT_KEY_NIL],
			AccountKey::Legacy => vec![ACCOUNT_KEY_LEGACY, EMPTY_LIST],
			AccountKey::Fail => vec![ACCOUNT_KEY_FAIL, EMPTY_LIST],
			AccountKey::Public(key) => {
				let mut out = vec![ACCOUNT_KEY_PUBLIC];
				key.encode(&mut out);
				out
			},
			AccountKey::WeightedMultiSig { threshold, keys } => {
				let mut payload = Vec::new();
				threshold.encode(&mut payload);
				alloy_rlp::encode_list::<WeightedPublicKey, WeightedPublicKey>(
					keys.as_slice(),
					&mut payload,
				);
				prefixed_list(ACCOUNT_KEY_WEIGHTED_MULTISIG, &payload)
			},
			AccountKey::RoleBased(roles) => {
				let mut payload = Vec::new();
				for role in roles {
					Bytes::from(role.encode()).encode(&mut payload);
				}
				prefixed_list(ACCOUNT_KEY_ROLE_BASED, &payload)
			},
		}
	}

	/// Parses the type-prefixed encoding produced by [`AccountKey::encode`].
	pub fn decode(bytes: &[u8]) -> alloy_rlp::Result<Self> {
		match bytes.split_first() {
			Some((&ACCOUNT_KEY_ROLE_BASED, rest)) => {
				let mut buf = rest;
				let mut payload = Header::decode_bytes(&mut buf, true)?;
				ensure_consumed(buf)?;
				let mut roles = Vec::new();
				while !payload.is_empty() {
					if roles.len() == MAX_ROLES {
						return Err(alloy_rlp::Error::Custom("too many roles in role-based key"));
					}
					let encoded = Bytes::decode(&mut payload)?;
					roles.push(Self::decode_role_key(&encoded)?);
				}
				Ok(AccountKey::RoleBased(roles))
			},
			_ => Self::decode_role_key(bytes),
		}
	}

	/// Decodes any key that may sit inside a role-based key.
	fn decode_role_key(bytes: &[u8]) -> alloy_rlp::Result<Self> {
		let (tag, rest) = bytes
			.split_first()
			.ok_or(alloy_rlp::Error::InputTooShort)?;

		match *tag {
			ACCOUNT_KEY_NIL if rest.is_empty() => Ok(AccountKey::Nil),
			ACCOUNT_KEY_LEGACY if rest == [EMPTY_LIST] => Ok(AccountKey::Legacy),
			ACCOUNT_KEY_FAIL if rest == [EMPTY_LIST] => Ok(AccountKey::Fail),
			ACCOUNT_KEY_PUBLIC => {
				let mut buf = rest;
				let key = Bytes::decode(&mut buf)?;
				ensure_consumed(buf)?;
				Ok(AccountKey::Public(key))
			},
			ACCOUNT_KEY_WEIGHTED_MULTISIG => {
				let mut buf = rest;
				let mut payload = Header::decode_bytes(&mut buf, true)?;
				ensure_consumed(buf)?;
				let threshold = u64::decode(&mut payload)?;
				let keys = Vec::<WeightedPublicKey>::decode(&mut payload)?;
				ensure_consumed(payload)?;
				Ok(AccountKey::WeightedMultiSig { threshold, keys })
			},
			ACCOUNT_KEY_ROLE_BASED => Err(alloy_rlp::Error::Custom("nested role-based key")),
			_ => Err(alloy_rlp::Error::Custom("unknown account key type")),
		}
	}
}

fn prefixed_list(tag: u8, payload: &[u8]) -> Vec<u8> {
	let mut out = vec![tag];
	Header {
		list: true,
		payload_length: payload.len(),
	}
	.encode(&mut out);
	out.extend_from_slice(payload);
	out
}

fn ensure_consumed(buf: &[u8]) -> alloy_rlp::Result<()> {
	if buf.is_empty() {
		Ok(())
	} else {
		Err(alloy_rlp::Error::Custom("trailing bytes after account key"))
	}
}
