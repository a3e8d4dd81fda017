//! Keystore import and export.
//!
//! Keystores are Web3 secret-storage v3 files. Because a keyring's address
//! may be decoupled from its key, exported files carry the keyring address
//! in their `address` field and imports honour it when present.

use crate::{AccountError, Keyring};
use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use std::path::{Path, PathBuf};

/// Encrypts a single-key keyring into a new keystore file under `dir`.
///
/// Returns the path of the written file.
pub fn export_keystore(
	keyring: &Keyring,
	password: &str,
	dir: &Path,
) -> Result<PathBuf, AccountError> {
	let (address, key) = match keyring {
		Keyring::Single { address, key } => (*address, key),
		_ => {
			return Err(AccountError::Keystore(
				"only single-key keyrings can be exported".to_string(),
			))
		},
	};

	let mut rng = rand::thread_rng();
	let (_, file_name) =
		PrivateKeySigner::encrypt_keystore(dir, &mut rng, key.to_bytes(), password, None)
			.map_err(|e| AccountError::Keystore(e.to_string()))?;
	let path = dir.join(file_name);

	// Record the keyring address so decoupled keyrings survive a round trip.
	record_address_or_remove(&path, address)?;

	tracing::info!(address = %address, path = %path.display(), "Exported keystore");
	Ok(path)
}

/// A file left with the key-derived address would import as another
/// account, so it is removed when the rewrite fails.
fn record_address_or_remove(path: &Path, address: Address) -> Result<(), AccountError> {
	let result = record_address(path, address);
	if result.is_err() {
		if let Err(e) = std::fs::remove_file(path) {
			tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial keystore");
		}
	}
	result
}

fn record_address(path: &Path, address: Address) -> Result<(), AccountError> {
	let contents =
		std::fs::read_to_string(path).map_err(|e| AccountError::Keystore(e.to_string()))?;
	let mut json: serde_json::Value =
		serde_json::from_str(&contents).map_err(|e| AccountError::Keystore(e.to_string()))?;
	let object = json
		.as_object_mut()
		.ok_or_else(|| AccountError::Keystore("keystore is not a JSON object".to_string()))?;
	object.insert(
		"address".to_string(),
		serde_json::Value::String(hex::encode(address.as_slice())),
	);
	let contents =
		serde_json::to_string(&json).map_err(|e| AccountError::Keystore(e.to_string()))?;
	std::fs::write(path, contents).map_err(|e| AccountError::Keystore(e.to_string()))
}

/// Decrypts a keystore file into a single-key keyring.
pub fn import_keystore(path: &Path, password: &str) -> Result<Keyring, AccountError> {
	let key = PrivateKeySigner::decrypt_keystore(path, password)
		.map_err(|e| AccountError::Keystore(e.to_string()))?;

	let contents =
		std::fs::read_to_string(path).map_err(|e| AccountError::Keystore(e.to_string()))?;
	let json: serde_json::Value =
		serde_json::from_str(&contents).map_err(|e| AccountError::Keystore(e.to_string()))?;

	let address = match json.get("address").and_then(|v| v.as_str()) {
		Some(address) => klay_types::with_0x_prefix(address)
			.parse::<Address>()
			.map_err(|e| AccountError::Keystore(format!("invalid address field: {}", e)))?,
		None => key.address(),
	};

	tracing::info!(address = %address, path = %path.display(), "Imported keystore");
	Ok(Keyring::Single { address, key })
}

#[cfg(test)]
mod tests {
	use super::*;

	const KEY: &str = "0x0e4ca6d38096ad99324de0dde108587e5d7c600165ae4cd6c2462c597458c2b8";
	const DECOUPLED_ADDRESS: &str = "0xa94f5374fce5edbc8e2a8697c15331677e6ebf0b";

	#[test]
	fn test_round_trip_keeps_decoupled_address() {
		let dir = tempfile::tempdir().unwrap();
		let keyring = Keyring::single(DECOUPLED_ADDRESS, KEY).unwrap();

		let path = export_keystore(&keyring, "password", dir.path()).unwrap();
		assert!(path.exists());

		let imported = import_keystore(&path, "password").unwrap();
		assert_eq!(imported, keyring);
		assert!(imported.is_decoupled());
	}

	#[test]
	fn test_wrong_password_fails() {
		let dir = tempfile::tempdir().unwrap();
		let keyring = Keyring::from_private_key(KEY).unwrap();
		let path = export_keystore(&keyring, "password", dir.path()).unwrap();

		assert!(matches!(
			import_keystore(&path, "not-the-password"),
			Err(AccountError::Keystore(_))
		));
	}

	#[test]
	fn test_failed_address_rewrite_removes_the_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("keystore");
		std::fs::write(&path, "[]").unwrap();

		assert!(matches!(
			record_address_or_remove(&path, DECOUPLED_ADDRESS.parse().unwrap()),
			Err(AccountError::Keystore(_))
		));
		assert!(!path.exists());
	}

	#[test]
	fn test_multiple_key_keyrings_are_not_exported() {
		let dir = tempfile::tempdir().unwrap();
		let keyring =
			Keyring::multiple(DECOUPLED_ADDRESS, &[KEY.to_string(), KEY.to_string()]).unwrap();

		assert!(matches!(
			export_keystore(&keyring, "password", dir.path()),
			Err(AccountError::Keystore(_))
		));
	}
}
