//! Node connection descriptors.
//!
//! A facade talks either to a node directly through its endpoint, or to a
//! managed node service authenticated with an access key pair. The choice is
//! made once, at initialization, from the provider descriptor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Transport used to reach the node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
	/// JSON-RPC over HTTP(S).
	#[default]
	Http,
	/// JSON-RPC over WebSocket.
	Ws,
}

impl fmt::Display for Transport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Transport::Http => write!(f, "http"),
			Transport::Ws => write!(f, "ws"),
		}
	}
}

/// Access key pair for a managed node service.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Credentials {
	pub access_key_id: String,
	pub secret_access_key: String,
}

impl fmt::Debug for Credentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credentials")
			.field("access_key_id", &self.access_key_id)
			.field("secret_access_key", &"***REDACTED***")
			.finish()
	}
}

/// Which backend serves RPC requests.
///
/// A bare string is a direct node endpoint. A table carrying both
/// `access_key_id` and `secret_access_key` selects the managed service.
/// Any other shape fails to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ProviderDescriptor {
	Endpoint(String),
	Managed(Credentials),
}

impl ProviderDescriptor {
	/// Short label for logs, never containing secrets.
	pub fn kind(&self) -> &'static str {
		match self {
			ProviderDescriptor::Endpoint(_) => "endpoint",
			ProviderDescriptor::Managed(_) => "managed",
		}
	}
}

/// Everything a node implementation needs to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
	/// Chain the facade signs for and, for managed services, routes to.
	pub chain_id: u64,
	pub transport: Transport,
	pub provider: ProviderDescriptor,
	/// Overrides the managed service base URL.
	pub managed_url: Option<String>,
	/// Interval between receipt polls after a broadcast.
	pub poll_interval: Duration,
	/// Give up waiting for a receipt after this long.
	pub receipt_timeout: Duration,
}
