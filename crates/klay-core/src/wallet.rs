//! Keyring, wallet and keystore operations.

use crate::{FacadeError, KlayFacade};
use klay_account::{keystore, AccountError, Keyring, Role, SignedMessage};
use klay_types::Address;
use std::path::{Path, PathBuf};
use tracing::instrument;

impl KlayFacade {
	pub fn generate_keyring(&self) -> Keyring {
		let keyring = Keyring::generate();
		tracing::info!(address = %keyring.address(), "Generated keyring");
		keyring
	}

	pub fn create_single_keyring(
		&self,
		address: &str,
		private_key: &str,
	) -> Result<Keyring, FacadeError> {
		tracing::info!(address, "Creating single-key keyring");
		Ok(Keyring::single(address, private_key)?)
	}

	pub fn create_multiple_keyring(
		&self,
		address: &str,
		private_keys: &[String],
	) -> Result<Keyring, FacadeError> {
		tracing::info!(address, keys = private_keys.len(), "Creating multiple-key keyring");
		Ok(Keyring::multiple(address, private_keys)?)
	}

	/// Creates a keyring with one key list per role, in transaction,
	/// account-update, fee-payer order.
	pub fn create_role_based_keyring(
		&self,
		address: &str,
		role_keys: &[Vec<String>],
	) -> Result<Keyring, FacadeError> {
		tracing::info!(address, roles = role_keys.len(), "Creating role-based keyring");
		Ok(Keyring::role_based(address, role_keys)?)
	}

	/// Registers `keyring` unless its address is already registered, in
	/// which case the registered keyring is returned untouched.
	#[instrument(skip_all, fields(address = %keyring.address()))]
	pub async fn add_to_wallet(&self, keyring: Keyring) -> Result<Keyring, FacadeError> {
		let address = keyring.address();
		if self.wallet.is_existed(address).await? {
			tracing::debug!("Keyring already registered");
			return Ok(self.wallet.get(address).await?);
		}

		let added = self.wallet.add(keyring).await?;
		tracing::info!("Added keyring to wallet");
		Ok(added)
	}

	#[instrument(skip_all, fields(%address))]
	pub async fn remove_from_wallet(&self, address: Address) -> Result<bool, FacadeError> {
		let removed = self.wallet.remove(address).await?;
		tracing::info!(removed, "Removed keyring from wallet");
		Ok(removed)
	}

	/// Replaces the registered keyring for the keyring's address.
	#[instrument(skip_all, fields(address = %keyring.address()))]
	pub async fn update_wallet(&self, keyring: Keyring) -> Result<Keyring, FacadeError> {
		let address = keyring.address();
		if !self.wallet.is_existed(address).await? {
			return Err(FacadeError::NotInWallet(address));
		}

		let updated = self.wallet.update(keyring).await?;
		tracing::info!("Updated keyring in wallet");
		Ok(updated)
	}

	pub async fn is_existed(&self, address: Address) -> Result<bool, FacadeError> {
		Ok(self.wallet.is_existed(address).await?)
	}

	pub async fn wallet_addresses(&self) -> Result<Vec<Address>, FacadeError> {
		Ok(self.wallet.addresses().await?)
	}

	/// Returns the keyring for `address`, failing before anything else is
	/// attempted when it is not registered.
	pub(crate) async fn require_keyring(&self, address: Address) -> Result<Keyring, FacadeError> {
		if !self.wallet.is_existed(address).await? {
			tracing::warn!(%address, "Signer is not in the wallet");
			return Err(FacadeError::NotInWallet(address));
		}
		Ok(self.wallet.get(address).await?)
	}

	#[instrument(skip_all, fields(%address, ?role))]
	pub async fn sign_message(
		&self,
		address: Address,
		message: &[u8],
		role: Role,
	) -> Result<SignedMessage, FacadeError> {
		let keyring = self.require_keyring(address).await?;
		let signed = keyring.sign_message(message, role)?;
		tracing::info!(signatures = signed.signatures.len(), "Signed message");
		Ok(signed)
	}

	/// Decrypts a keystore file into a keyring. The keyring is not added to
	/// the wallet.
	#[instrument(skip_all, fields(path = %path.display()))]
	pub fn import_keystore(&self, path: &Path, password: &str) -> Result<Keyring, FacadeError> {
		Ok(keystore::import_keystore(path, password)?)
	}

	/// Encrypts the registered keyring for `address` into a keystore file
	/// under `dir`.
	///
	/// Key derivation and the file writes run on the blocking pool.
	#[instrument(skip_all, fields(%address, dir = %dir.display()))]
	pub async fn export_keystore(
		&self,
		address: Address,
		password: &str,
		dir: &Path,
	) -> Result<PathBuf, FacadeError> {
		let keyring = self.require_keyring(address).await?;
		let password = password.to_string();
		let dir = dir.to_path_buf();

		let path = tokio::task::spawn_blocking(move || {
			keystore::export_keystore(&keyring, &password, &dir)
		})
		.await
		.map_err(|e| AccountError::Keystore(format!("Task join error: {}", e)))??;
		Ok(path)
	}

	/// Raw key access is not offered; keys stay inside their keyrings.
	pub fn get_private_key(&self, _address: Address) -> Result<String, FacadeError> {
		Err(FacadeError::Unimplemented("get_private_key"))
	}

	/// Raw key access is not offered; keys stay inside their keyrings.
	pub fn get_wallet_key(&self, _address: Address) -> Result<String, FacadeError> {
		Err(FacadeError::Unimplemented("get_wallet_key"))
	}
}
