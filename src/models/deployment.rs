use crate::{
    constants::{
        DEFAULT_CONTRACT_ADDRESS, DEFAULT_NETWORK, DEFAULT_OWNER_ADDRESS, DEFAULT_TOTAL_SUPPLY,
        TOKEN_DECIMALS, TOKEN_NAME, TOKEN_SYMBOL,
    },
    error::Result,
    utils::{now_unix, parse_address, parse_rfc3339_secs},
};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Static description of the deployed token, written by the deploy script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentDescriptor {
    pub contract_address: Address,
    pub owner_address: Address,
    pub name: String,
    pub symbol: String,
    pub total_supply: U256,
    pub decimals: u8,
    /// Unix seconds; `None` when the file omitted or mangled it.
    pub deployment_time: Option<u64>,
    pub network: String,
}

/// On-disk shape (`deploymentInfo.json`). Numbers may arrive as strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentInfoFile {
    contract_address: Option<String>,
    owner_address: Option<String>,
    name: Option<String>,
    symbol: Option<String>,
    total_supply: Option<Value>,
    decimals: Option<Value>,
    deployment_time: Option<String>,
    network: Option<String>,
}

fn default_address(raw: &str) -> Address {
    parse_address(raw).unwrap_or_default()
}

fn default_total_supply() -> U256 {
    U256::from_dec_str(DEFAULT_TOTAL_SUPPLY).unwrap_or_default()
}

fn value_as_u256(value: &Value) -> Option<U256> {
    match value {
        Value::String(text) => {
            let text = text.trim();
            match text.strip_prefix("0x") {
                Some(hex) => U256::from_str_radix(hex, 16).ok(),
                None => U256::from_dec_str(text).ok(),
            }
        }
        Value::Number(number) => number.as_u64().map(U256::from),
        _ => None,
    }
}

fn value_as_u8(value: &Value) -> Option<u8> {
    match value {
        Value::String(text) => text.trim().parse().ok(),
        Value::Number(number) => number.as_u64().and_then(|n| u8::try_from(n).ok()),
        _ => None,
    }
}

impl Default for DeploymentDescriptor {
    fn default() -> Self {
        Self {
            contract_address: default_address(DEFAULT_CONTRACT_ADDRESS),
            owner_address: default_address(DEFAULT_OWNER_ADDRESS),
            name: TOKEN_NAME.to_string(),
            symbol: TOKEN_SYMBOL.to_string(),
            total_supply: default_total_supply(),
            decimals: TOKEN_DECIMALS as u8,
            deployment_time: Some(now_unix()),
            network: DEFAULT_NETWORK.to_string(),
        }
    }
}

impl DeploymentDescriptor {
    /// Load the descriptor from disk, falling back to the built-in defaults
    /// when the file is missing or unreadable.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(raw) => match Self::from_json_str(&raw) {
                Ok(descriptor) => {
                    tracing::info!(
                        "Loaded deployment info from {} (contract {:?})",
                        path.display(),
                        descriptor.contract_address
                    );
                    descriptor
                }
                Err(e) => {
                    tracing::warn!(
                        "Deployment info at {} is invalid ({}), using default values",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!(
                    "Deployment info not found at {}, using default values",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Parse the JSON document. Individual malformed fields fall back to the
    /// defaults; only a document that is not a JSON object is an error.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: DeploymentInfoFile = serde_json::from_str(raw)?;
        let defaults = Self::default();

        let contract_address = match file.contract_address.as_deref().map(parse_address) {
            Some(Ok(address)) => address,
            Some(Err(e)) => {
                tracing::warn!("Could not parse contractAddress: {}", e);
                defaults.contract_address
            }
            None => defaults.contract_address,
        };
        let owner_address = match file.owner_address.as_deref().map(parse_address) {
            Some(Ok(address)) => address,
            Some(Err(e)) => {
                tracing::warn!("Could not parse ownerAddress: {}", e);
                defaults.owner_address
            }
            None => defaults.owner_address,
        };

        let total_supply = match file.total_supply.as_ref() {
            Some(value) => value_as_u256(value).unwrap_or_else(|| {
                tracing::warn!("Could not parse totalSupply {}, using default", value);
                defaults.total_supply
            }),
            None => defaults.total_supply,
        };

        Ok(Self {
            contract_address,
            owner_address,
            name: file.name.unwrap_or(defaults.name),
            symbol: file.symbol.unwrap_or(defaults.symbol),
            total_supply,
            decimals: file
                .decimals
                .as_ref()
                .and_then(value_as_u8)
                .unwrap_or(defaults.decimals),
            deployment_time: file.deployment_time.as_deref().and_then(parse_rfc3339_secs),
            network: file.network.unwrap_or(defaults.network),
        })
    }

    pub fn is_owner(&self, account: &Address) -> bool {
        &self.owner_address == account
    }
}
