//! JSON-RPC node implementation.
//!
//! This module implements [`NodeInterface`] over alloy's JSON-RPC client,
//! speaking the `klay_` namespace. A node is either reached directly through
//! its endpoint or through the managed node service, which authenticates with
//! an access key pair and routes by chain id.

use crate::{DeliveryError, NodeInterface};
use alloy_rpc_client::{ClientBuilder, RpcClient};
use alloy_transport::{Authorization, BoxTransport, TransportError};
use alloy_transport_http::Http;
use alloy_transport_ws::WsConnect;
use async_trait::async_trait;
use klay_types::{
	Address, Bytes, Credentials, NodeConfig, ProviderDescriptor, TransactionReceipt, Transport,
	B256, U256, U64,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Url;

/// Managed node service endpoint for JSON-RPC over HTTP.
pub const MANAGED_HTTP_URL: &str = "https://node-api.klaytnapi.com/v1/klaytn";
/// Managed node service endpoint for JSON-RPC over WebSocket.
pub const MANAGED_WS_URL: &str = "wss://node-api.klaytnapi.com/v1/ws/open";

/// Header the managed service routes HTTP requests by.
const CHAIN_ID_HEADER: &str = "x-chain-id";

/// Node reached over JSON-RPC.
pub struct RpcNode {
	client: RpcClient<BoxTransport>,
}

impl RpcNode {
	/// Connects to the node described by `config`.
	///
	/// HTTP clients are created without a round trip; WebSocket clients
	/// complete the handshake before returning.
	pub async fn connect(config: &NodeConfig) -> Result<Self, DeliveryError> {
		let client = match &config.provider {
			ProviderDescriptor::Endpoint(endpoint) => {
				connect_direct(endpoint, config.transport).await?
			},
			ProviderDescriptor::Managed(credentials) => connect_managed(config, credentials).await?,
		};

		tracing::info!(
			chain_id = config.chain_id,
			transport = %config.transport,
			provider = config.provider.kind(),
			"Connected node client"
		);
		Ok(Self { client })
	}
}

async fn connect_direct(
	endpoint: &str,
	transport: Transport,
) -> Result<RpcClient<BoxTransport>, DeliveryError> {
	if endpoint.trim().is_empty() {
		return Err(DeliveryError::Configuration(
			"node endpoint cannot be empty".to_string(),
		));
	}

	match transport {
		Transport::Http => {
			let url: Url = endpoint.parse().map_err(|e| {
				DeliveryError::Configuration(format!("Invalid node endpoint {}: {}", endpoint, e))
			})?;
			Ok(ClientBuilder::default().http(url).boxed())
		},
		Transport::Ws => {
			let client = ClientBuilder::default()
				.ws(WsConnect::new(endpoint))
				.await
				.map_err(|e| DeliveryError::Network(format!("WebSocket connect failed: {}", e)))?;
			Ok(client.boxed())
		},
	}
}

async fn connect_managed(
	config: &NodeConfig,
	credentials: &Credentials,
) -> Result<RpcClient<BoxTransport>, DeliveryError> {
	if credentials.access_key_id.is_empty() || credentials.secret_access_key.is_empty() {
		return Err(DeliveryError::Configuration(
			"managed service credentials cannot be empty".to_string(),
		));
	}

	let url = managed_endpoint(config)?;
	let auth = Authorization::basic(&credentials.access_key_id, &credentials.secret_access_key);

	match config.transport {
		Transport::Http => {
			let client = reqwest::Client::builder()
				.default_headers(managed_headers(&auth, config.chain_id)?)
				.build()
				.map_err(|e| DeliveryError::Network(format!("Failed to build HTTP client: {}", e)))?;
			let http = Http::with_client(client, url);
			Ok(RpcClient::new(http, false).boxed())
		},
		Transport::Ws => {
			let client = ClientBuilder::default()
				.ws(WsConnect::new(url.to_string()).with_auth(auth))
				.await
				.map_err(|e| DeliveryError::Network(format!("WebSocket connect failed: {}", e)))?;
			Ok(client.boxed())
		},
	}
}

/// Managed service URL for the configured transport.
///
/// WebSocket connections carry the chain id in the query string because
/// they cannot set per-request headers.
fn managed_endpoint(config: &NodeConfig) -> Result<Url, DeliveryError> {
	let base = match (&config.managed_url, config.transport) {
		(Some(url), _) => url.as_str(),
		(None, Transport::Http) => MANAGED_HTTP_URL,
		(None, Transport::Ws) => MANAGED_WS_URL,
	};

	let mut url: Url = base.parse().map_err(|e| {
		DeliveryError::Configuration(format!("Invalid managed service URL {}: {}", base, e))
	})?;
	if config.transport == Transport::Ws {
		url.query_pairs_mut()
			.append_pair("chain-id", &config.chain_id.to_string());
	}
	Ok(url)
}

fn managed_headers(auth: &Authorization, chain_id: u64) -> Result<HeaderMap, DeliveryError> {
	let mut headers = HeaderMap::new();
	let mut value = HeaderValue::from_str(&auth.to_string())
		.map_err(|e| DeliveryError::Configuration(format!("Invalid credentials: {}", e)))?;
	value.set_sensitive(true);
	headers.insert(AUTHORIZATION, value);
	headers.insert(CHAIN_ID_HEADER, HeaderValue::from(chain_id));
	Ok(headers)
}

fn rpc_error(method: &'static str, err: TransportError) -> DeliveryError {
	match err.as_error_resp() {
		Some(payload) => DeliveryError::Rpc {
			method,
			message: payload.message.to_string(),
		},
		None => DeliveryError::Network(format!("{} failed: {}", method, err)),
	}
}

#[async_trait]
impl NodeInterface for RpcNode {
	async fn get_account(
		&self,
		address: Address,
	) -> Result<Option<serde_json::Value>, DeliveryError> {
		self.client
			.request("klay_getAccount", (address, "latest"))
			.await
			.map_err(|e| rpc_error("klay_getAccount", e))
	}

	async fn get_balance(&self, address: Address) -> Result<U256, DeliveryError> {
		self.client
			.request("klay_getBalance", (address, "latest"))
			.await
			.map_err(|e| rpc_error("klay_getBalance", e))
	}

	async fn get_nonce(&self, address: Address) -> Result<u64, DeliveryError> {
		let nonce: U64 = self
			.client
			.request("klay_getTransactionCount", (address, "pending"))
			.await
			.map_err(|e| rpc_error("klay_getTransactionCount", e))?;
		Ok(nonce.to::<u64>())
	}

	async fn get_gas_price(&self) -> Result<U256, DeliveryError> {
		self.client
			.request_noparams("klay_gasPrice")
			.await
			.map_err(|e| rpc_error("klay_gasPrice", e))
	}

	async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, DeliveryError> {
		tracing::debug!(size = raw.len(), "Sending raw transaction");
		self.client
			.request("klay_sendRawTransaction", (raw,))
			.await
			.map_err(|e| rpc_error("klay_sendRawTransaction", e))
	}

	async fn get_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>, DeliveryError> {
		self.client
			.request("klay_getTransactionReceipt", (hash,))
			.await
			.map_err(|e| rpc_error("klay_getTransactionReceipt", e))
	}
}

/// Factory function to create a node client from its configuration.
pub async fn create_node(config: &NodeConfig) -> Result<Box<dyn NodeInterface>, DeliveryError> {
	Ok(Box::new(RpcNode::connect(config).await?))
}
