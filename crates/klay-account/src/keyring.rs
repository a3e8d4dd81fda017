//! Keyrings and signing.
//!
//! A keyring binds one or more secp256k1 keys to an address. Three shapes
//! exist: a single key, several keys sharing every role, and separate key
//! lists for the transaction, account-update and fee-payer roles.

use crate::AccountError;
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_signer_local::PrivateKeySigner;
use klay_types::{without_0x_prefix, AccountKey, SignatureData, WeightedPublicKey};
use std::fmt;

/// Largest number of keys a single role may hold.
pub const MAX_KEYS_PER_ROLE: usize = 10;

const MESSAGE_PREFIX: &str = "\x19Klaytn Signed Message:\n";

/// Role a key signs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
	Transaction = 0,
	AccountUpdate = 1,
	FeePayer = 2,
}

impl Role {
	pub const ALL: [Role; 3] = [Role::Transaction, Role::AccountUpdate, Role::FeePayer];
}

/// Result of signing an arbitrary message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
	pub message: Bytes,
	pub message_hash: B256,
	pub signatures: Vec<SignatureData>,
}

/// A bundle of private keys bound to an address.
#[derive(Clone)]
pub enum Keyring {
	Single {
		address: Address,
		key: PrivateKeySigner,
	},
	Multiple {
		address: Address,
		keys: Vec<PrivateKeySigner>,
	},
	RoleBased {
		address: Address,
		roles: [Vec<PrivateKeySigner>; 3],
	},
}

impl Keyring {
	/// Creates a single-key keyring from a freshly generated key.
	pub fn generate() -> Self {
		let key = PrivateKeySigner::random();
		Keyring::Single {
			address: key.address(),
			key,
		}
	}

	/// Creates a single-key keyring whose address is derived from the key.
	pub fn from_private_key(private_key: &str) -> Result<Self, AccountError> {
		let key = parse_key(private_key)?;
		Ok(Keyring::Single {
			address: key.address(),
			key,
		})
	}

	pub fn single(address: &str, private_key: &str) -> Result<Self, AccountError> {
		Ok(Keyring::Single {
			address: parse_address(address)?,
			key: parse_key(private_key)?,
		})
	}

	/// Creates a keyring whose keys all sign for every role.
	pub fn multiple(address: &str, private_keys: &[String]) -> Result<Self, AccountError> {
		if private_keys.is_empty() || private_keys.len() > MAX_KEYS_PER_ROLE {
			return Err(AccountError::InvalidKeyCount(format!(
				"expected 1 to {} keys, got {}",
				MAX_KEYS_PER_ROLE,
				private_keys.len()
			)));
		}

		Ok(Keyring::Multiple {
			address: parse_address(address)?,
			keys: parse_keys(private_keys)?,
		})
	}

	/// Creates a keyring with a key list per role.
	///
	/// Up to three roles are accepted in transaction, account-update,
	/// fee-payer order; missing trailing roles are left empty.
	pub fn role_based(address: &str, role_keys: &[Vec<String>]) -> Result<Self, AccountError> {
		if role_keys.len() > Role::ALL.len() {
			return Err(AccountError::InvalidKeyCount(format!(
				"expected at most {} roles, got {}",
				Role::ALL.len(),
				role_keys.len()
			)));
		}
		if role_keys.iter().all(|keys| keys.is_empty()) {
			return Err(AccountError::InvalidKeyCount(
				"at least one role must hold a key".to_string(),
			));
		}

		let mut roles: [Vec<PrivateKeySigner>; 3] = Default::default();
		for (index, keys) in role_keys.iter().enumerate() {
			if keys.len() > MAX_KEYS_PER_ROLE {
				return Err(AccountError::InvalidKeyCount(format!(
					"role {:?} holds {} keys, at most {} allowed",
					Role::ALL[index],
					keys.len(),
					MAX_KEYS_PER_ROLE
				)));
			}
			roles[index] = parse_keys(keys)?;
		}

		Ok(Keyring::RoleBased {
			address: parse_address(address)?,
			roles,
		})
	}

	pub fn address(&self) -> Address {
		match self {
			Keyring::Single { address, .. }
			| Keyring::Multiple { address, .. }
			| Keyring::RoleBased { address, .. } => *address,
		}
	}

	/// Keys used to sign for `role`.
	///
	/// An empty non-transaction role of a role-based keyring falls back to
	/// the transaction role.
	pub fn keys_for(&self, role: Role) -> Result<&[PrivateKeySigner], AccountError> {
		match self {
			Keyring::Single { key, .. } => Ok(std::slice::from_ref(key)),
			Keyring::Multiple { keys, .. } => Ok(keys),
			Keyring::RoleBased { roles, .. } => {
				let keys = &roles[role as usize];
				if !keys.is_empty() {
					return Ok(keys);
				}
				let default = &roles[Role::Transaction as usize];
				if role != Role::Transaction && !default.is_empty() {
					tracing::debug!(?role, "Role has no key, signing with the transaction role");
					return Ok(default);
				}
				Err(AccountError::MissingRoleKey(role))
			},
		}
	}

	/// Signs a transaction signature hash with every key of `role`.
	///
	/// `v` follows EIP-155: `recovery_id + 2 * chain_id + 35`.
	pub fn sign_transaction_hash(
		&self,
		hash: &B256,
		chain_id: u64,
		role: Role,
	) -> Result<Vec<SignatureData>, AccountError> {
		self.keys_for(role)?
			.iter()
			.map(|key| {
				let (r, s, recovery_id) = sign_prehash(key, hash)?;
				Ok(SignatureData {
					v: u64::from(recovery_id) + chain_id * 2 + 35,
					r,
					s,
				})
			})
			.collect()
	}

	/// Signs `message` under the Klaytn message prefix with every key of `role`.
	pub fn sign_message(&self, message: &[u8], role: Role) -> Result<SignedMessage, AccountError> {
		let message_hash = hash_message(message);
		let signatures = self
			.keys_for(role)?
			.iter()
			.map(|key| {
				let (r, s, recovery_id) = sign_prehash(key, &message_hash)?;
				Ok(SignatureData {
					v: 27 + u64::from(recovery_id),
					r,
					s,
				})
			})
			.collect::<Result<Vec<_>, AccountError>>()?;

		Ok(SignedMessage {
			message: Bytes::copy_from_slice(message),
			message_hash,
			signatures,
		})
	}

	/// The account key that registers this keyring's keys on chain.
	///
	/// Multiple keys become a weighted multisig with threshold 1 and weight
	/// 1 per key; empty roles stay unchanged.
	pub fn to_account_key(&self) -> AccountKey {
		match self {
			Keyring::Single { key, .. } => AccountKey::Public(compressed_public_key(key)),
			Keyring::Multiple { keys, .. } => role_account_key(keys),
			Keyring::RoleBased { roles, .. } => {
				AccountKey::RoleBased(roles.iter().map(|keys| role_account_key(keys)).collect())
			},
		}
	}

	/// Whether the address differs from the address of the keyring's key.
	pub fn is_decoupled(&self) -> bool {
		match self {
			Keyring::Single { address, key } => *address != key.address(),
			_ => true,
		}
	}

	fn kind(&self) -> &'static str {
		match self {
			Keyring::Single { .. } => "single",
			Keyring::Multiple { .. } => "multiple",
			Keyring::RoleBased { .. } => "role_based",
		}
	}

	fn key_counts(&self) -> [usize; 3] {
		match self {
			Keyring::Single { .. } => [1, 1, 1],
			Keyring::Multiple { keys, .. } => [keys.len(); 3],
			Keyring::RoleBased { roles, .. } => [roles[0].len(), roles[1].len(), roles[2].len()],
		}
	}

	fn key_bytes(&self) -> Vec<B256> {
		match self {
			Keyring::Single { key, .. } => vec![key.to_bytes()],
			Keyring::Multiple { keys, .. } => keys.iter().map(|k| k.to_bytes()).collect(),
			Keyring::RoleBased { roles, .. } => {
				roles.iter().flatten().map(|k| k.to_bytes()).collect()
			},
		}
	}
}

impl PartialEq for Keyring {
	fn eq(&self, other: &Self) -> bool {
		self.address() == other.address()
			&& self.kind() == other.kind()
			&& self.key_counts() == other.key_counts()
			&& self.key_bytes() == other.key_bytes()
	}
}

impl Eq for Keyring {}

impl fmt::Debug for Keyring {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Keyring")
			.field("address", &self.address())
			.field("kind", &self.kind())
			.field("keys", &self.key_counts())
			.finish()
	}
}

/// Hashes `message` under the Klaytn signed-message prefix.
pub fn hash_message(message: &[u8]) -> B256 {
	let mut prefixed = Vec::with_capacity(MESSAGE_PREFIX.len() + 20 + message.len());
	prefixed.extend_from_slice(MESSAGE_PREFIX.as_bytes());
	prefixed.extend_from_slice(message.len().to_string().as_bytes());
	prefixed.extend_from_slice(message);
	keccak256(prefixed)
}

fn sign_prehash(key: &PrivateKeySigner, hash: &B256) -> Result<(U256, U256, u8), AccountError> {
	let (signature, recovery_id) = key
		.credential()
		.sign_prehash_recoverable(hash.as_slice())
		.map_err(|e| AccountError::SigningFailed(e.to_string()))?;
	let bytes = signature.to_bytes();
	Ok((
		U256::from_be_slice(&bytes[..32]),
		U256::from_be_slice(&bytes[32..]),
		recovery_id.to_byte(),
	))
}

fn compressed_public_key(key: &PrivateKeySigner) -> Bytes {
	let point = key.credential().verifying_key().to_encoded_point(true);
	Bytes::copy_from_slice(point.as_bytes())
}

fn role_account_key(keys: &[PrivateKeySigner]) -> AccountKey {
	match keys {
		[] => AccountKey::Nil,
		[key] => AccountKey::Public(compressed_public_key(key)),
		keys => AccountKey::WeightedMultiSig {
			threshold: 1,
			keys: keys
				.iter()
				.map(|key| WeightedPublicKey {
					weight: 1,
					key: compressed_public_key(key),
				})
				.collect(),
		},
	}
}

fn parse_address(address: &str) -> Result<Address, AccountError> {
	address
		.parse()
		.map_err(|e| AccountError::InvalidAddress(format!("{}: {}", address, e)))
}

fn parse_key(private_key: &str) -> Result<PrivateKeySigner, AccountError> {
	without_0x_prefix(private_key.trim())
		.parse()
		.map_err(|_| AccountError::InvalidKey("malformed private key".to_string()))
}

fn parse_keys(private_keys: &[String]) -> Result<Vec<PrivateKeySigner>, AccountError> {
	private_keys.iter().map(|key| parse_key(key)).collect()
}
