//! Configuration module for the Klaytn facade.
//!
//! This module loads the facade configuration from TOML: the chain the
//! facade signs for, how the node is reached, and how broadcasts wait for
//! their receipts. Values may reference environment variables with
//! `${VAR}` or `${VAR:-default}`, which keeps managed-service secrets out of
//! the file itself.
//!
//! ## Modular Configuration Support
//!
//! A file may pull in others with `include = ["file.toml"]`. Each top-level
//! section must be defined in exactly one file.

mod loader;

#[cfg(any(test, feature = "testing"))]
pub mod builders;

use klay_types::{NodeConfig, ProviderDescriptor, Transport};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message only; the default rendering repeats the input.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the facade.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Chain and node connection.
	pub chain: ChainConfig,
	/// Receipt polling after a broadcast.
	#[serde(default)]
	pub broadcast: BroadcastConfig,
}

/// Chain and node connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
	/// Chain id as a decimal string, e.g. `"1001"` for Kairos.
	pub chain_id: String,
	/// Transport used to reach the node.
	#[serde(default)]
	pub transport: Transport,
	/// A node endpoint string, or an `access_key_id` / `secret_access_key`
	/// table for the managed node service.
	pub provider: ProviderDescriptor,
	/// Overrides the managed node service URL.
	pub managed_url: Option<String>,
}

impl ChainConfig {
	pub fn chain_id(&self) -> Result<u64, ConfigError> {
		self.chain_id.trim().parse().map_err(|_| {
			ConfigError::Validation(format!(
				"chain_id must be a decimal integer, got '{}'",
				self.chain_id
			))
		})
	}
}

/// Receipt polling settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BroadcastConfig {
	/// Milliseconds between receipt polls.
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	/// Seconds to wait for a receipt before reporting an error.
	#[serde(default = "default_receipt_timeout_seconds")]
	pub receipt_timeout_seconds: u64,
}

impl Default for BroadcastConfig {
	fn default() -> Self {
		Self {
			poll_interval_ms: default_poll_interval_ms(),
			receipt_timeout_seconds: default_receipt_timeout_seconds(),
		}
	}
}

/// Klaytn produces a block every second.
fn default_poll_interval_ms() -> u64 {
	1000
}

fn default_receipt_timeout_seconds() -> u64 {
	300
}

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of `VAR_NAME` and
/// `${VAR_NAME:-default}` with the value or the default when unset.
/// Inputs are capped at 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut missing = None;
	let resolved = re.replace_all(input, |caps: &regex::Captures<'_>| {
		let name = &caps[1];
		match (std::env::var(name), caps.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				missing.get_or_insert_with(|| name.to_string());
				String::new()
			},
		}
	});

	match missing {
		Some(name) => Err(ConfigError::Validation(format!(
			"Environment variable '{}' not found",
			name
		))),
		None => Ok(resolved.into_owned()),
	}
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let config = loader::load(path.as_ref()).await?;
		tracing::info!(
			path = %path.as_ref().display(),
			chain_id = %config.chain.chain_id,
			transport = %config.chain.transport,
			provider = config.chain.provider.kind(),
			"Loaded configuration"
		);
		Ok(config)
	}

	/// Validates the configuration.
	///
	/// Checks that the chain id parses, that the provider descriptor carries
	/// a non-empty endpoint or credential pair, and that the broadcast
	/// intervals are positive with the poll interval below the timeout.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.chain.chain_id()?;

		match &self.chain.provider {
			ProviderDescriptor::Endpoint(endpoint) => {
				if endpoint.trim().is_empty() {
					return Err(ConfigError::Validation(
						"provider endpoint cannot be empty".into(),
					));
				}
			},
			ProviderDescriptor::Managed(credentials) => {
				if credentials.access_key_id.is_empty() {
					return Err(ConfigError::Validation(
						"provider access_key_id cannot be empty".into(),
					));
				}
				if credentials.secret_access_key.is_empty() {
					return Err(ConfigError::Validation(
						"provider secret_access_key cannot be empty".into(),
					));
				}
			},
		}

		if let Some(url) = &self.chain.managed_url {
			if !matches!(self.chain.provider, ProviderDescriptor::Managed(_)) {
				return Err(ConfigError::Validation(format!(
					"managed_url '{}' requires managed service credentials",
					url
				)));
			}
		}

		if self.broadcast.poll_interval_ms == 0 {
			return Err(ConfigError::Validation(
				"broadcast poll_interval_ms must be greater than 0".into(),
			));
		}
		if self.broadcast.receipt_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"broadcast receipt_timeout_seconds must be greater than 0".into(),
			));
		}
		let poll_interval = Duration::from_millis(self.broadcast.poll_interval_ms);
		if poll_interval >= Duration::from_secs(self.broadcast.receipt_timeout_seconds) {
			return Err(ConfigError::Validation(
				"broadcast poll_interval_ms must be shorter than receipt_timeout_seconds".into(),
			));
		}

		Ok(())
	}

	/// Connection settings for a node implementation.
	pub fn node_config(&self) -> Result<NodeConfig, ConfigError> {
		Ok(NodeConfig {
			chain_id: self.chain.chain_id()?,
			transport: self.chain.transport,
			provider: self.chain.provider.clone(),
			managed_url: self.chain.managed_url.clone(),
			poll_interval: Duration::from_millis(self.broadcast.poll_interval_ms),
			receipt_timeout: Duration::from_secs(self.broadcast.receipt_timeout_seconds),
		})
	}
}

/// Parses a configuration from TOML, resolving environment variables and
/// validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use klay_types::Credentials;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("KLAY_TEST_HOST", "localhost");
		std::env::set_var("KLAY_TEST_PORT", "8551");

		let input = "provider = \"http://${KLAY_TEST_HOST}:${KLAY_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "provider = \"http://localhost:8551\"");

		std::env::remove_var("KLAY_TEST_HOST");
		std::env::remove_var("KLAY_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "chain_id = \"${KLAY_MISSING_CHAIN:-1001}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "chain_id = \"1001\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "secret_access_key = \"${KLAY_MISSING_SECRET}\"";
		let result = resolve_env_vars(input);
		assert!(result.unwrap_err().to_string().contains("KLAY_MISSING_SECRET"));
	}

	#[test]
	fn test_oversized_input_rejected() {
		let input = "#".repeat(1024 * 1024 + 1);
		assert!(matches!(
			resolve_env_vars(&input),
			Err(ConfigError::Validation(_))
		));
	}

	#[test]
	fn test_endpoint_config() {
		let config: Config = r#"
[chain]
chain_id = "1001"
provider = "https://public-en-kairos.node.kaia.io"
"#
		.parse()
		.unwrap();

		let node = config.node_config().unwrap();
		assert_eq!(node.chain_id, 1001);
		assert_eq!(node.transport, Transport::Http);
		assert_eq!(node.poll_interval, Duration::from_millis(1000));
		assert_eq!(node.receipt_timeout, Duration::from_secs(300));
	}

	#[test]
	fn test_long_receipt_timeout() {
		let config: Config = r#"
[chain]
chain_id = "1001"
provider = "http://localhost:8551"

[broadcast]
poll_interval_ms = 1000
receipt_timeout_seconds = 9223372036854775807
"#
		.parse()
		.unwrap();

		assert_eq!(
			config.node_config().unwrap().receipt_timeout,
			Duration::from_secs(i64::MAX as u64)
		);
	}

	#[test]
	fn test_managed_config_with_env_secret() {
		std::env::set_var("KLAY_TEST_SECRET", "s3cr3t");

		let config: Config = r#"
[chain]
chain_id = "8217"
transport = "ws"
provider = { access_key_id = "KASKEY", secret_access_key = "${KLAY_TEST_SECRET}" }

[broadcast]
poll_interval_ms = 500
receipt_timeout_seconds = 30
"#
		.parse()
		.unwrap();

		assert_eq!(config.chain.transport, Transport::Ws);
		assert_eq!(
			config.chain.provider,
			ProviderDescriptor::Managed(Credentials {
				access_key_id: "KASKEY".to_string(),
				secret_access_key: "s3cr3t".to_string(),
			})
		);
		assert_eq!(
			config.node_config().unwrap().poll_interval,
			Duration::from_millis(500)
		);

		std::env::remove_var("KLAY_TEST_SECRET");
	}

	#[test]
	fn test_invalid_configs_rejected() {
		let cases = [
			// chain id is not decimal
			r#"
[chain]
chain_id = "0x3e9"
provider = "http://localhost:8551"
"#,
			// incomplete credential pair
			r#"
[chain]
chain_id = "1001"
provider = { access_key_id = "KASKEY" }
"#,
			// provider of the wrong type
			r#"
[chain]
chain_id = "1001"
provider = 42
"#,
			r#"
[chain]
chain_id = "1001"
provider = ""
"#,
			r#"
[chain]
chain_id = "1001"
provider = "http://localhost:8551"
managed_url = "http://localhost:8080"
"#,
			r#"
[chain]
chain_id = "1001"
provider = "http://localhost:8551"

[broadcast]
poll_interval_ms = 0
"#,
			r#"
[chain]
chain_id = "1001"
provider = "http://localhost:8551"

[broadcast]
poll_interval_ms = 5000
receipt_timeout_seconds = 5
"#,
		];

		for case in cases {
			assert!(case.parse::<Config>().is_err(), "accepted: {}", case);
		}
	}
}
