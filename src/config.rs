use crate::constants::{
    DEFAULT_RECEIPT_POLL_ATTEMPTS, DEFAULT_RECEIPT_POLL_INTERVAL_MS,
    DEFAULT_WATCH_POLL_INTERVAL_MS, LOCAL_RPC_URL,
};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub environment: String,

    // Transports
    pub wallet_rpc_url: String,
    pub node_rpc_url: String,

    // Deployment
    pub deployment_info_path: String,
    pub contract_address: Option<String>,

    // Polling
    pub receipt_poll_interval_ms: u64,
    pub receipt_poll_attempts: u32,
    pub watch_poll_interval_ms: u64,

    // Mint unit convention
    pub mint_accepts_whole_tokens: bool,
}

// Internal helper that checks conditions for `is_env_flag_enabled`.
fn is_env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .map(|value| {
            let normalized = value.trim().to_ascii_lowercase();
            normalized == "1" || normalized == "true" || normalized == "yes" || normalized == "on"
        })
        .unwrap_or(false)
}

fn env_non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            wallet_rpc_url: LOCAL_RPC_URL.to_string(),
            node_rpc_url: LOCAL_RPC_URL.to_string(),
            deployment_info_path: "deploymentInfo.json".to_string(),
            contract_address: None,
            receipt_poll_interval_ms: DEFAULT_RECEIPT_POLL_INTERVAL_MS,
            receipt_poll_attempts: DEFAULT_RECEIPT_POLL_ATTEMPTS,
            watch_poll_interval_ms: DEFAULT_WATCH_POLL_INTERVAL_MS,
            mint_accepts_whole_tokens: false,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let wallet_rpc_url =
            env_non_empty("WALLET_RPC_URL").unwrap_or_else(|| LOCAL_RPC_URL.to_string());

        Ok(Config {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            node_rpc_url: env_non_empty("NODE_RPC_URL").unwrap_or_else(|| wallet_rpc_url.clone()),
            wallet_rpc_url,

            deployment_info_path: env::var("DEPLOYMENT_INFO_PATH")
                .unwrap_or_else(|_| "deploymentInfo.json".to_string()),
            contract_address: env_non_empty("CONTRACT_ADDRESS"),

            receipt_poll_interval_ms: env::var("RECEIPT_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| DEFAULT_RECEIPT_POLL_INTERVAL_MS.to_string())
                .parse()?,
            receipt_poll_attempts: env::var("RECEIPT_POLL_ATTEMPTS")
                .unwrap_or_else(|_| DEFAULT_RECEIPT_POLL_ATTEMPTS.to_string())
                .parse()?,
            watch_poll_interval_ms: env::var("WATCH_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| DEFAULT_WATCH_POLL_INTERVAL_MS.to_string())
                .parse()?,

            mint_accepts_whole_tokens: is_env_flag_enabled("MINT_ACCEPTS_WHOLE_TOKENS"),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("WALLET_RPC_URL", &self.wallet_rpc_url),
            ("NODE_RPC_URL", &self.node_rpc_url),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{} is empty", name);
            }
            url::Url::parse(value)
                .map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
        }

        if self.deployment_info_path.trim().is_empty() {
            anyhow::bail!("DEPLOYMENT_INFO_PATH is empty");
        }
        if self.receipt_poll_interval_ms == 0 || self.watch_poll_interval_ms == 0 {
            anyhow::bail!("Poll intervals must be > 0");
        }
        if self.receipt_poll_attempts == 0 {
            anyhow::bail!("RECEIPT_POLL_ATTEMPTS must be > 0");
        }

        if let Some(address) = &self.contract_address {
            tracing::warn!(
                "CONTRACT_ADDRESS override set to {}; it must match the deployment descriptor",
                address
            );
        }
        if self.mint_accepts_whole_tokens {
            tracing::warn!("Whole-token mint compatibility strategy is enabled");
        }

        Ok(())
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    pub fn watch_poll_interval(&self) -> Duration {
        Duration::from_millis(self.watch_poll_interval_ms)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development" || self.environment == "localhost"
    }
}
