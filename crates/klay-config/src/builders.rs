//! Configuration builder for tests and local development.

use crate::{BroadcastConfig, ChainConfig, Config};
use klay_types::{Credentials, ProviderDescriptor, Transport};

/// Builder for creating `Config` instances with a fluent API.
///
/// Defaults to the Kairos test network over a local HTTP endpoint with
/// short broadcast intervals.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	chain_id: String,
	transport: Transport,
	provider: ProviderDescriptor,
	managed_url: Option<String>,
	broadcast: BroadcastConfig,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			chain_id: "1001".to_string(),
			transport: Transport::Http,
			provider: ProviderDescriptor::Endpoint("http://localhost:8551".to_string()),
			managed_url: None,
			broadcast: BroadcastConfig {
				poll_interval_ms: 10,
				receipt_timeout_seconds: 1,
			},
		}
	}

	pub fn chain_id(mut self, chain_id: impl Into<String>) -> Self {
		self.chain_id = chain_id.into();
		self
	}

	pub fn transport(mut self, transport: Transport) -> Self {
		self.transport = transport;
		self
	}

	pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.provider = ProviderDescriptor::Endpoint(endpoint.into());
		self
	}

	/// Uses the managed node service, optionally at a custom URL.
	pub fn managed(
		mut self,
		access_key_id: impl Into<String>,
		secret_access_key: impl Into<String>,
		managed_url: Option<String>,
	) -> Self {
		self.provider = ProviderDescriptor::Managed(Credentials {
			access_key_id: access_key_id.into(),
			secret_access_key: secret_access_key.into(),
		});
		self.managed_url = managed_url;
		self
	}

	pub fn broadcast(mut self, poll_interval_ms: u64, receipt_timeout_seconds: u64) -> Self {
		self.broadcast = BroadcastConfig {
			poll_interval_ms,
			receipt_timeout_seconds,
		};
		self
	}

	/// Builds the configuration without validating it.
	pub fn build(self) -> Config {
		Config {
			chain: ChainConfig {
				chain_id: self.chain_id,
				transport: self.transport,
				provider: self.provider,
				managed_url: self.managed_url,
			},
			broadcast: self.broadcast,
		}
	}
}
