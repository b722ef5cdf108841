use super::{EventHub, ProviderEvent, Subscription, WalletProvider};
use crate::{
    error::{Result, WalletError},
    utils::{parse_address, parse_hex_u64},
};
use async_trait::async_trait;
use ethers::types::Address;
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

fn rpc_request(id: u64, method: &str, params: Value) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": id
    })
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl RpcResponse {
    fn into_result(self, method: &str) -> Result<Value> {
        if let Some(error) = self.error {
            return Err(WalletError::Provider {
                code: error.code,
                message: format!("{}: {}", method, error.message),
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// JSON-RPC 2.0 provider over HTTP. Used both as the signing wallet (a dev
/// node with unlocked accounts) and as the plain node transport.
pub struct HttpProvider {
    label: String,
    rpc_url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
    events: EventHub,
}

impl HttpProvider {
    pub fn new(label: impl Into<String>, rpc_url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            rpc_url: rpc_url.into(),
            client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
            events: EventHub::default(),
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Poll accounts and chain id, broadcasting changes to subscribers.
    /// The first poll only records the baseline.
    pub fn watch(self: &Arc<Self>, every: Duration) -> WatchHandle {
        let provider = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut observed = Observed::default();

            loop {
                ticker.tick().await;
                let accounts = match provider.poll_accounts().await {
                    Ok(accounts) => accounts,
                    Err(e) => {
                        tracing::warn!("{}: account poll failed: {}", provider.label, e);
                        continue;
                    }
                };
                let chain_id = match provider.poll_chain_id().await {
                    Ok(chain_id) => Some(chain_id),
                    Err(e) => {
                        tracing::warn!("{}: chain id poll failed: {}", provider.label, e);
                        None
                    }
                };

                for event in observed.record(accounts, chain_id) {
                    provider.events.emit(event);
                }
            }
        });
        tracing::info!("{}: watching {} every {:?}", self.label, self.rpc_url, every);
        WatchHandle {
            handle: Some(handle),
        }
    }

    async fn poll_accounts(&self) -> Result<Vec<Address>> {
        let value = self.request("eth_accounts", serde_json::json!([])).await?;
        parse_accounts(&value)
    }

    async fn poll_chain_id(&self) -> Result<u64> {
        let value = self.request("eth_chainId", serde_json::json!([])).await?;
        value
            .as_str()
            .and_then(parse_hex_u64)
            .ok_or_else(|| WalletError::Decode(format!("Invalid chain id: {}", value)))
    }
}

#[async_trait]
impl WalletProvider for HttpProvider {
    fn label(&self) -> &str {
        &self.label
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = rpc_request(id, method, params);
        tracing::trace!("{} -> {}", self.label, request);

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| WalletError::Transport(format!("{} {}: {}", self.label, method, e)))?;

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| WalletError::Transport(format!("{} {}: {}", self.label, method, e)))?;

        body.into_result(method)
    }

    fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }
}

/// Parse an `eth_accounts` style result.
pub fn parse_accounts(value: &Value) -> Result<Vec<Address>> {
    let Some(items) = value.as_array() else {
        return Err(WalletError::Decode(format!(
            "Expected an account list, got {}",
            value
        )));
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .ok_or_else(|| WalletError::Decode(format!("Invalid account entry: {}", item)))
                .and_then(|text| {
                    parse_address(text).map_err(|e| WalletError::Decode(e.to_string()))
                })
        })
        .collect()
}

/// Accounts and chain id seen by the previous poll.
#[derive(Debug, Default)]
struct Observed {
    baseline: Option<(Vec<Address>, Option<u64>)>,
}

impl Observed {
    /// Record one poll and return what changed since the last one. A failed
    /// chain poll (`None`) keeps the previously known chain id.
    fn record(&mut self, accounts: Vec<Address>, polled_chain: Option<u64>) -> Vec<ProviderEvent> {
        let (events, chain_id) = match &self.baseline {
            Some((previous_accounts, previous_chain)) => {
                let chain_id = polled_chain.or(*previous_chain);
                let events = diff_events(previous_accounts, *previous_chain, &accounts, chain_id);
                (events, chain_id)
            }
            None => (Vec::new(), polled_chain),
        };
        self.baseline = Some((accounts, chain_id));
        events
    }
}

fn diff_events(
    previous_accounts: &[Address],
    previous_chain: Option<u64>,
    accounts: &[Address],
    chain_id: Option<u64>,
) -> Vec<ProviderEvent> {
    let mut events = Vec::new();
    if previous_accounts != accounts {
        events.push(ProviderEvent::AccountsChanged(accounts.to_vec()));
    }
    if let (Some(previous), Some(current)) = (previous_chain, chain_id) {
        if previous != current {
            events.push(ProviderEvent::ChainChanged(current));
        }
    }
    events
}

/// Owns the polling task; stopping or dropping it ends the task.
#[derive(Debug)]
pub struct WatchHandle {
    handle: Option<JoinHandle<()>>,
}

impl WatchHandle {
    pub fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
