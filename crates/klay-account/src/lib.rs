//! Account management module for the Klaytn facade.
//!
//! This module provides keyrings (bundles of private keys bound to an
//! address), the wallet capability that registers keyrings for signing, and
//! keystore import/export. Keyrings are decoupled from their keys: the
//! address a keyring signs for need not be derived from any of its keys.

use async_trait::async_trait;
use klay_types::Address;
use thiserror::Error;

pub mod keyring;
pub mod keystore;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

pub use keyring::{hash_message, Keyring, Role, SignedMessage, MAX_KEYS_PER_ROLE};

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// Error that occurs when an address cannot be parsed.
	#[error("Invalid address: {0}")]
	InvalidAddress(String),
	/// Error that occurs when a key array has the wrong length.
	#[error("Invalid key count: {0}")]
	InvalidKeyCount(String),
	/// Error that occurs when neither the role nor the default role has keys.
	#[error("No key for role {0:?} and no default transaction key")]
	MissingRoleKey(Role),
	/// Error that occurs when a keyring is already registered.
	#[error("Keyring for {0} already exists in the wallet")]
	Duplicate(Address),
	/// Error that occurs when a keyring is not registered.
	#[error("Keyring for {0} not found in the wallet")]
	NotFound(Address),
	/// Error that occurs while reading or writing a keystore.
	#[error("Keystore error: {0}")]
	Keystore(String),
	/// Error that occurs when interacting with the wallet implementation.
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Trait defining the wallet capability.
///
/// A wallet is an in-process registry mapping addresses to the keyrings
/// available for signing. Implementations decide where keyrings are held;
/// the facade only relies on this registry contract.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait WalletInterface: Send + Sync {
	/// Registers a keyring. Fails with [`AccountError::Duplicate`] when the
	/// address is already registered.
	async fn add(&self, keyring: Keyring) -> Result<Keyring, AccountError>;

	/// Removes the keyring for `address`, returning whether one was removed.
	async fn remove(&self, address: Address) -> Result<bool, AccountError>;

	/// Replaces a registered keyring. Fails with [`AccountError::NotFound`]
	/// when the address is not registered.
	async fn update(&self, keyring: Keyring) -> Result<Keyring, AccountError>;

	/// Whether a keyring is registered for `address`.
	async fn is_existed(&self, address: Address) -> Result<bool, AccountError>;

	/// Returns the keyring registered for `address`.
	async fn get(&self, address: Address) -> Result<Keyring, AccountError>;

	/// Returns every registered address.
	async fn addresses(&self) -> Result<Vec<Address>, AccountError>;
}
