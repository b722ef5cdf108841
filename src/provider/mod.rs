pub mod http;

#[cfg(test)]
pub mod devnet;

pub use http::HttpProvider;

use crate::error::{Result, WalletError};
use async_trait::async_trait;
use ethers::types::Address;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Notifications pushed by a wallet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

/// Injected-wallet style interface: one request entry point plus change
/// notifications.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Label used in logs ("wallet", "node", ...).
    fn label(&self) -> &str;

    async fn request(&self, method: &str, params: Value) -> Result<Value>;

    fn subscribe(&self) -> Subscription;
}

/// Issue a request and deserialize its result.
pub async fn request_as<T: DeserializeOwned>(
    provider: &dyn WalletProvider,
    method: &str,
    params: Value,
) -> Result<T> {
    let value = provider.request(method, params).await?;
    serde_json::from_value(value).map_err(|e| {
        WalletError::Decode(format!(
            "{} via {}: unexpected result shape: {}",
            method,
            provider.label(),
            e
        ))
    })
}

/// Fan-out of provider events to any number of subscriptions.
#[derive(Debug, Clone)]
pub struct EventHub {
    sender: broadcast::Sender<ProviderEvent>,
}

impl Default for EventHub {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }
}

impl EventHub {
    /// Returns the number of live subscriptions that received the event.
    pub fn emit(&self, event: ProviderEvent) -> usize {
        tracing::debug!("Provider event: {:?}", event);
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: Some(self.sender.subscribe()),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Listener handle. Dropping it or calling [`Subscription::unsubscribe`]
/// detaches it from the provider.
#[derive(Debug)]
pub struct Subscription {
    receiver: Option<broadcast::Receiver<ProviderEvent>>,
}

impl Subscription {
    /// Next event, or `None` once unsubscribed or the provider is gone.
    pub async fn next(&mut self) -> Option<ProviderEvent> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Subscription lagged, skipped {} provider events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    pub fn unsubscribe(&mut self) {
        self.receiver = None;
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }
}
