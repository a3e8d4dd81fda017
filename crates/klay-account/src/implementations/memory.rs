//! In-memory wallet implementation.
//!
//! This module provides a memory-based implementation of the WalletInterface
//! trait. Keyrings live only as long as the process.

use crate::{AccountError, Keyring, WalletInterface};
use async_trait::async_trait;
use klay_types::Address;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory wallet.
///
/// Keyrings are kept in a HashMap keyed by address behind a read-write lock.
#[derive(Clone, Default)]
pub struct MemoryWallet {
	keyrings: Arc<RwLock<HashMap<Address, Keyring>>>,
}

impl MemoryWallet {
	/// Creates an empty MemoryWallet.
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl WalletInterface for MemoryWallet {
	async fn add(&self, keyring: Keyring) -> Result<Keyring, AccountError> {
		let mut keyrings = self.keyrings.write().await;
		let address = keyring.address();
		if keyrings.contains_key(&address) {
			return Err(AccountError::Duplicate(address));
		}
		keyrings.insert(address, keyring.clone());
		Ok(keyring)
	}

	async fn remove(&self, address: Address) -> Result<bool, AccountError> {
		let mut keyrings = self.keyrings.write().await;
		Ok(keyrings.remove(&address).is_some())
	}

	async fn update(&self, keyring: Keyring) -> Result<Keyring, AccountError> {
		let mut keyrings = self.keyrings.write().await;
		let address = keyring.address();
		match keyrings.get_mut(&address) {
			Some(existing) => {
				*existing = keyring.clone();
				Ok(keyring)
			},
			None => Err(AccountError::NotFound(address)),
		}
	}

	async fn is_existed(&self, address: Address) -> Result<bool, AccountError> {
		let keyrings = self.keyrings.read().await;
		Ok(keyrings.contains_key(&address))
	}

	async fn get(&self, address: Address) -> Result<Keyring, AccountError> {
		let keyrings = self.keyrings.read().await;
		keyrings
			.get(&address)
			.cloned()
			.ok_or(AccountError::NotFound(address))
	}

	async fn addresses(&self) -> Result<Vec<Address>, AccountError> {
		let keyrings = self.keyrings.read().await;
		let mut addresses: Vec<Address> = keyrings.keys().copied().collect();
		addresses.sort();
		Ok(addresses)
	}
}
