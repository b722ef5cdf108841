//! In-memory development chain with the ESLSCA token deployed, for tests.
//!
//! One [`Devnet`] holds the shared chain state and hands out two providers
//! over it: the signing wallet and the plain node. Faults are configured per
//! provider role so fallback paths can be exercised one transport at a time.

use super::{EventHub, ProviderEvent, Subscription, WalletProvider};
use crate::{
    constants::{
        ERC20_TRANSFER_SIGNATURE, PRIMARY_CHAIN_ID, RPC_METHOD_NOT_FOUND, RPC_UNRECOGNIZED_CHAIN,
        RPC_USER_REJECTED, TOKENS_MINTED_SIGNATURE, TOKEN_NAME, TOKEN_SYMBOL,
        TRANSFER_EXECUTED_SIGNATURE,
    },
    contract::abi::token_abi,
    crypto::hash::event_topic,
    error::{Result, WalletError},
    utils::parse_hex_u64,
};
use async_trait::async_trait;
use ethers::abi::{encode, Abi, Token};
use ethers::types::{Address, Block, Bytes, Log, TransactionReceipt, H160, H256, U256, U64};
use ethers::utils::keccak256;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// First Hardhat dev account; deploys the token and owns it.
pub const DEV_OWNER: Address = H160([
    0xf3, 0x9f, 0xd6, 0xe5, 0x1a, 0xad, 0x88, 0xf6, 0xf4, 0xce, 0x6a, 0xb8, 0x82, 0x72, 0x79, 0xcf,
    0xff, 0xb9, 0x22, 0x66,
]);

/// Second Hardhat dev account.
pub const DEV_ALICE: Address = H160([
    0x70, 0x99, 0x79, 0x70, 0xc5, 0x18, 0x12, 0xdc, 0x3a, 0x01, 0x0c, 0x7d, 0x01, 0xb5, 0x0e, 0x0d,
    0x17, 0xdc, 0x79, 0xc8,
]);

pub const DEV_CONTRACT: Address = H160([
    0x5f, 0xbd, 0xb2, 0x31, 0x56, 0x78, 0xaf, 0xec, 0xb3, 0x67, 0xf0, 0x32, 0xd9, 0x3f, 0x64, 0x2f,
    0x64, 0x18, 0x0a, 0xa3,
]);

pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;
const BLOCK_TIME: u64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Wallet,
    Node,
}

#[derive(Debug, Clone)]
struct Fault {
    code: i64,
    message: String,
}

impl Fault {
    fn error(&self, method: &str) -> WalletError {
        WalletError::Provider {
            code: self.code,
            message: format!("{}: {}", method, self.message),
        }
    }
}

fn reverted(reason: &str) -> WalletError {
    WalletError::Provider {
        code: -32603,
        message: format!("execution reverted: {}", reason),
    }
}

#[derive(Debug)]
struct Chain {
    chain_id: u64,
    known_chains: HashSet<u64>,
    reject_chain_add: bool,
    accounts: Vec<Address>,
    deployed: bool,
    custom_events: bool,
    mint_scales_whole_tokens: bool,
    owner: Address,
    total_supply: U256,
    balances: HashMap<Address, U256>,
    block_number: u64,
    logs: Vec<Log>,
    receipts: HashMap<H256, Value>,
    pending_receipt_polls: u32,
    filters: HashMap<String, Value>,
    next_filter: u64,
    tx_count: u64,
    method_faults: HashMap<(Role, String), Fault>,
    selector_faults: HashSet<(Role, [u8; 4])>,
    reject_sends: u32,
    revert_sends: u32,
    calls: Vec<(Role, String)>,
    transactions: Vec<Value>,
    watched_assets: Vec<Value>,
}

impl Chain {
    fn block_timestamp(&self, block: u64) -> u64 {
        GENESIS_TIMESTAMP + block * BLOCK_TIME
    }

    fn balance(&self, account: &Address) -> U256 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn matching_logs(&self, filter: &Value) -> Vec<Log> {
        let address = filter
            .get("address")
            .and_then(|v| serde_json::from_value::<Address>(v.clone()).ok());
        let topic0 = filter
            .get("topics")
            .and_then(|v| v.get(0))
            .and_then(|v| serde_json::from_value::<H256>(v.clone()).ok());
        let block_bound = |key: &str, default: u64| {
            match filter.get(key).and_then(Value::as_str) {
                None | Some("latest") | Some("pending") => default,
                Some("earliest") => 0,
                Some(text) => parse_hex_u64(text).unwrap_or(default),
            }
        };
        let from = block_bound("fromBlock", self.block_number);
        let to = block_bound("toBlock", self.block_number);

        self.logs
            .iter()
            .filter(|log| address.map_or(true, |a| log.address == a))
            .filter(|log| topic0.map_or(true, |t| log.topics.first() == Some(&t)))
            .filter(|log| {
                let block = log.block_number.map(|b| b.as_u64()).unwrap_or_default();
                block >= from && block <= to
            })
            .cloned()
            .collect()
    }
}

struct Shared {
    chain: Mutex<Chain>,
    events: EventHub,
    abi: Abi,
}

/// Shared in-memory chain plus its wallet and node providers.
#[derive(Clone)]
pub struct Devnet {
    shared: Arc<Shared>,
    wallet: Arc<DevnetProvider>,
    node: Arc<DevnetProvider>,
}

impl Default for Devnet {
    fn default() -> Self {
        Self::new()
    }
}

impl Devnet {
    /// Token deployed by [`DEV_OWNER`] with the whole initial supply on the
    /// owner, chain id 1337, wallet unlocked on the owner and Alice.
    pub fn new() -> Self {
        let supply = U256::exp10(24);
        let mut balances = HashMap::new();
        balances.insert(DEV_OWNER, supply);
        let chain = Chain {
            chain_id: PRIMARY_CHAIN_ID,
            known_chains: [PRIMARY_CHAIN_ID, 1].into_iter().collect(),
            reject_chain_add: false,
            accounts: vec![DEV_OWNER, DEV_ALICE],
            deployed: true,
            custom_events: true,
            mint_scales_whole_tokens: false,
            owner: DEV_OWNER,
            total_supply: supply,
            balances,
            block_number: 1,
            logs: Vec::new(),
            receipts: HashMap::new(),
            pending_receipt_polls: 0,
            filters: HashMap::new(),
            next_filter: 1,
            tx_count: 0,
            method_faults: HashMap::new(),
            selector_faults: HashSet::new(),
            reject_sends: 0,
            revert_sends: 0,
            calls: Vec::new(),
            transactions: Vec::new(),
            watched_assets: Vec::new(),
        };
        let shared = Arc::new(Shared {
            chain: Mutex::new(chain),
            events: EventHub::default(),
            abi: token_abi().expect("token ABI parses"),
        });
        Self {
            wallet: Arc::new(DevnetProvider {
                role: Role::Wallet,
                shared: Arc::clone(&shared),
            }),
            node: Arc::new(DevnetProvider {
                role: Role::Node,
                shared: Arc::clone(&shared),
            }),
            shared,
        }
    }

    fn chain(&self) -> MutexGuard<'_, Chain> {
        self.shared.chain.lock().expect("devnet state poisoned")
    }

    pub fn wallet(&self) -> Arc<dyn WalletProvider> {
        self.wallet.clone()
    }

    pub fn node(&self) -> Arc<dyn WalletProvider> {
        self.node.clone()
    }

    pub fn contract(&self) -> Address {
        DEV_CONTRACT
    }

    pub fn initial_supply(&self) -> U256 {
        U256::exp10(24)
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.chain().balance(&account)
    }

    pub fn set_balance(&self, account: Address, amount: U256) {
        self.chain().balances.insert(account, amount);
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.chain().accounts = accounts;
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        let mut chain = self.chain();
        chain.chain_id = chain_id;
        chain.known_chains.insert(chain_id);
    }

    pub fn chain_id(&self) -> u64 {
        self.chain().chain_id
    }

    /// Make the wallet unaware of `chain_id`, so switching to it fails with 4902.
    pub fn forget_chain(&self, chain_id: u64) {
        self.chain().known_chains.remove(&chain_id);
    }

    pub fn reject_chain_add(&self) {
        self.chain().reject_chain_add = true;
    }

    /// No code at the contract address: calls return `0x`.
    pub fn undeploy(&self) {
        self.chain().deployed = false;
    }

    /// Contract emits only the standard ERC-20 `Transfer` event.
    pub fn standard_events_only(&self) {
        self.chain().custom_events = false;
    }

    /// `mint` interprets its amount as whole tokens and scales it itself.
    pub fn mint_scales_whole_tokens(&self) {
        self.chain().mint_scales_whole_tokens = true;
    }

    pub fn fail_method(&self, role: Role, method: &str, code: i64, message: &str) {
        self.chain().method_faults.insert(
            (role, method.to_string()),
            Fault {
                code,
                message: message.to_string(),
            },
        );
    }

    pub fn clear_fault(&self, role: Role, method: &str) {
        self.chain().method_faults.remove(&(role, method.to_string()));
    }

    /// Reverts any call or transaction with this selector through `role`.
    pub fn fail_selector(&self, role: Role, selector: [u8; 4]) {
        self.chain().selector_faults.insert((role, selector));
    }

    /// The next `count` transaction requests are rejected by the user.
    pub fn reject_next_sends(&self, count: u32) {
        self.chain().reject_sends = count;
    }

    /// The next `count` transactions are mined with a failed status.
    pub fn revert_next_sends(&self, count: u32) {
        self.chain().revert_sends = count;
    }

    /// Receipt polls return `null` this many times before the receipt shows up.
    pub fn delay_receipts(&self, polls: u32) {
        self.chain().pending_receipt_polls = polls;
    }

    /// Push a provider notification to every subscriber.
    pub fn emit(&self, event: ProviderEvent) {
        self.shared.events.emit(event);
    }

    pub fn listener_count(&self) -> usize {
        self.shared.events.listener_count()
    }

    /// Methods requested through `role`, in order.
    pub fn calls(&self, role: Role) -> Vec<String> {
        self.chain()
            .calls
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, method)| method.clone())
            .collect()
    }

    pub fn call_count(&self, role: Role, method: &str) -> usize {
        self.calls(role).iter().filter(|m| *m == method).count()
    }

    pub fn transactions(&self) -> Vec<Value> {
        self.chain().transactions.clone()
    }

    pub fn last_transaction(&self) -> Option<Value> {
        self.chain().transactions.last().cloned()
    }

    pub fn watched_assets(&self) -> Vec<Value> {
        self.chain().watched_assets.clone()
    }

    pub fn log_count(&self) -> usize {
        self.chain().logs.len()
    }
}

pub struct DevnetProvider {
    role: Role,
    shared: Arc<Shared>,
}

impl DevnetProvider {
    fn chain(&self) -> MutexGuard<'_, Chain> {
        self.shared.chain.lock().expect("devnet state poisoned")
    }

    fn selector_blocked(&self, chain: &Chain, selector: [u8; 4]) -> bool {
        chain.selector_faults.contains(&(self.role, selector))
    }

    fn eth_call(&self, params: &Value) -> Result<Value> {
        let chain = self.chain();
        let call = params.get(0).cloned().unwrap_or(Value::Null);
        let data = call
            .get("data")
            .and_then(|v| serde_json::from_value::<Bytes>(v.clone()).ok())
            .map(|bytes| bytes.to_vec())
            .unwrap_or_default();
        let to = call
            .get("to")
            .and_then(|v| serde_json::from_value::<Address>(v.clone()).ok());

        if to != Some(DEV_CONTRACT) || !chain.deployed {
            return Ok(json!("0x"));
        }
        if data.len() < 4 {
            return Err(reverted("missing selector"));
        }
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&data[..4]);
        if self.selector_blocked(&chain, selector) {
            return Err(reverted("function not available"));
        }

        let function = self
            .shared
            .abi
            .functions()
            .find(|f| f.short_signature() == selector)
            .ok_or_else(|| reverted("unknown selector"))?;
        let inputs = function
            .decode_input(&data[4..])
            .map_err(|e| reverted(&e.to_string()))?;
        let account = |index: usize| inputs.get(index).cloned().and_then(Token::into_address);

        let output = match function.name.as_str() {
            "name" => encode(&[Token::String(TOKEN_NAME.to_string())]),
            "symbol" => encode(&[Token::String(TOKEN_SYMBOL.to_string())]),
            "decimals" => encode(&[Token::Uint(U256::from(18))]),
            "totalSupply" => encode(&[Token::Uint(chain.total_supply)]),
            "owner" => encode(&[Token::Address(chain.owner)]),
            "balanceOf" | "getBalance" => {
                let holder = account(0).unwrap_or_default();
                encode(&[Token::Uint(chain.balance(&holder))])
            }
            "getContractInfo" => encode(&[
                Token::String(TOKEN_NAME.to_string()),
                Token::String(TOKEN_SYMBOL.to_string()),
                Token::Uint(chain.total_supply),
                Token::Uint(U256::from(18)),
                Token::Address(chain.owner),
            ]),
            other => return Err(reverted(&format!("{} is not a view", other))),
        };
        Ok(json!(Bytes::from(output)))
    }

    fn send_transaction(&self, params: &Value) -> Result<Value> {
        let mut chain = self.chain();
        if chain.reject_sends > 0 {
            chain.reject_sends -= 1;
            return Err(WalletError::Provider {
                code: RPC_USER_REJECTED,
                message: "User rejected the request.".to_string(),
            });
        }

        let tx = params.get(0).cloned().unwrap_or(Value::Null);
        chain.transactions.push(tx.clone());
        let from: Address = tx
            .get("from")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .ok_or_else(|| reverted("missing sender"))?;
        if !chain.accounts.contains(&from) {
            return Err(WalletError::Provider {
                code: 4100,
                message: "The requested account has not been authorized".to_string(),
            });
        }
        let to: Option<Address> = tx
            .get("to")
            .and_then(|v| serde_json::from_value(v.clone()).ok());
        let data = tx
            .get("data")
            .and_then(|v| serde_json::from_value::<Bytes>(v.clone()).ok())
            .map(|bytes| bytes.to_vec())
            .unwrap_or_default();

        let tx_hash = H256::from(keccak256(format!("devnet-tx-{}", chain.tx_count)));
        chain.tx_count += 1;

        if to == Some(DEV_CONTRACT) && chain.deployed && data.len() >= 4 {
            let mut selector = [0u8; 4];
            selector.copy_from_slice(&data[..4]);
            if self.selector_blocked(&chain, selector) {
                return Err(reverted("function not available"));
            }
            if chain.revert_sends > 0 {
                chain.revert_sends -= 1;
                mine(&mut chain, tx_hash, false, Vec::new());
                return Ok(json!(tx_hash));
            }
            let function = self
                .shared
                .abi
                .functions()
                .find(|f| f.short_signature() == selector)
                .ok_or_else(|| reverted("unknown selector"))?;
            let mut inputs = function
                .decode_input(&data[4..])
                .map_err(|e| reverted(&e.to_string()))?
                .into_iter();
            let recipient = inputs.next().and_then(Token::into_address);
            let amount = inputs.next().and_then(Token::into_uint);

            match (function.name.as_str(), recipient, amount) {
                ("transfer", Some(recipient), Some(amount)) => {
                    let balance = chain.balance(&from);
                    if balance < amount {
                        return Err(reverted("ERC20InsufficientBalance"));
                    }
                    chain.balances.insert(from, balance - amount);
                    let received = chain.balance(&recipient) + amount;
                    chain.balances.insert(recipient, received);
                    let logs = transfer_logs(&chain, from, recipient, amount);
                    mine(&mut chain, tx_hash, true, logs);
                }
                ("mint", Some(recipient), Some(amount)) => {
                    if from != chain.owner {
                        return Err(reverted("OwnableUnauthorizedAccount"));
                    }
                    let amount = if chain.mint_scales_whole_tokens {
                        amount * U256::exp10(18)
                    } else {
                        amount
                    };
                    chain.total_supply += amount;
                    let received = chain.balance(&recipient) + amount;
                    chain.balances.insert(recipient, received);
                    let logs = mint_logs(&chain, recipient, amount);
                    mine(&mut chain, tx_hash, true, logs);
                }
                (name, _, _) => return Err(reverted(&format!("{} is not callable", name))),
            }
        } else {
            mine(&mut chain, tx_hash, true, Vec::new());
        }

        Ok(json!(tx_hash))
    }

    fn switch_chain(&self, params: &Value) -> Result<Value> {
        let requested = params
            .get(0)
            .and_then(|v| v.get("chainId"))
            .and_then(Value::as_str)
            .and_then(parse_hex_u64)
            .ok_or_else(|| WalletError::Provider {
                code: -32602,
                message: "Invalid chainId".to_string(),
            })?;
        let mut chain = self.chain();
        if !chain.known_chains.contains(&requested) {
            return Err(WalletError::Provider {
                code: RPC_UNRECOGNIZED_CHAIN,
                message: format!("Unrecognized chain ID {:#x}", requested),
            });
        }
        chain.chain_id = requested;
        drop(chain);
        self.shared.events.emit(ProviderEvent::ChainChanged(requested));
        Ok(Value::Null)
    }

    fn add_chain(&self, params: &Value) -> Result<Value> {
        let requested = params
            .get(0)
            .and_then(|v| v.get("chainId"))
            .and_then(Value::as_str)
            .and_then(parse_hex_u64)
            .ok_or_else(|| WalletError::Provider {
                code: -32602,
                message: "Invalid chainId".to_string(),
            })?;
        let mut chain = self.chain();
        if chain.reject_chain_add {
            return Err(WalletError::Provider {
                code: RPC_USER_REJECTED,
                message: "User rejected the request.".to_string(),
            });
        }
        chain.known_chains.insert(requested);
        chain.chain_id = requested;
        drop(chain);
        self.shared.events.emit(ProviderEvent::ChainChanged(requested));
        Ok(Value::Null)
    }

    fn receipt(&self, params: &Value) -> Result<Value> {
        let hash: H256 = params
            .get(0)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .ok_or_else(|| WalletError::Provider {
                code: -32602,
                message: "Invalid transaction hash".to_string(),
            })?;
        let mut chain = self.chain();
        if chain.pending_receipt_polls > 0 {
            chain.pending_receipt_polls -= 1;
            return Ok(Value::Null);
        }
        Ok(chain.receipts.get(&hash).cloned().unwrap_or(Value::Null))
    }

    fn new_filter(&self, params: &Value) -> Value {
        let mut chain = self.chain();
        let id = format!("{:#x}", chain.next_filter);
        chain.next_filter += 1;
        chain
            .filters
            .insert(id.clone(), params.get(0).cloned().unwrap_or(Value::Null));
        json!(id)
    }

    fn filter_logs(&self, params: &Value) -> Result<Value> {
        let chain = self.chain();
        let id = params.get(0).and_then(Value::as_str).unwrap_or_default();
        let filter = chain.filters.get(id).ok_or_else(|| WalletError::Provider {
            code: -32000,
            message: "filter not found".to_string(),
        })?;
        Ok(serde_json::to_value(chain.matching_logs(filter))?)
    }
}

fn indexed_address(address: Address) -> H256 {
    H256::from(address)
}

fn transfer_logs(chain: &Chain, from: Address, to: Address, amount: U256) -> Vec<(Vec<H256>, Vec<u8>)> {
    let mut logs = vec![(
        vec![
            event_topic(ERC20_TRANSFER_SIGNATURE),
            indexed_address(from),
            indexed_address(to),
        ],
        encode(&[Token::Uint(amount)]),
    )];
    if chain.custom_events {
        let timestamp = chain.block_timestamp(chain.block_number + 1);
        logs.push((
            vec![
                event_topic(TRANSFER_EXECUTED_SIGNATURE),
                indexed_address(from),
                indexed_address(to),
            ],
            encode(&[Token::Uint(amount), Token::Uint(U256::from(timestamp))]),
        ));
    }
    logs
}

fn mint_logs(chain: &Chain, to: Address, amount: U256) -> Vec<(Vec<H256>, Vec<u8>)> {
    let mut logs = vec![(
        vec![
            event_topic(ERC20_TRANSFER_SIGNATURE),
            indexed_address(Address::zero()),
            indexed_address(to),
        ],
        encode(&[Token::Uint(amount)]),
    )];
    if chain.custom_events {
        let timestamp = chain.block_timestamp(chain.block_number + 1);
        logs.push((
            vec![event_topic(TOKENS_MINTED_SIGNATURE), indexed_address(to)],
            encode(&[Token::Uint(amount), Token::Uint(U256::from(timestamp))]),
        ));
    }
    logs
}

/// Mine one block holding a single transaction.
fn mine(chain: &mut Chain, tx_hash: H256, success: bool, logs: Vec<(Vec<H256>, Vec<u8>)>) {
    chain.block_number += 1;
    let block = chain.block_number;
    let first_index = chain.logs.len();
    for (offset, (topics, data)) in logs.into_iter().enumerate() {
        chain.logs.push(Log {
            address: DEV_CONTRACT,
            topics,
            data: Bytes::from(data),
            block_number: Some(U64::from(block)),
            transaction_hash: Some(tx_hash),
            transaction_index: Some(U64::zero()),
            log_index: Some(U256::from(first_index + offset)),
            removed: Some(false),
            ..Default::default()
        });
    }
    let receipt = TransactionReceipt {
        transaction_hash: tx_hash,
        block_number: Some(U64::from(block)),
        status: Some(U64::from(success as u64)),
        ..Default::default()
    };
    chain.receipts.insert(tx_hash, json!(receipt));
}

#[async_trait]
impl WalletProvider for DevnetProvider {
    fn label(&self) -> &str {
        match self.role {
            Role::Wallet => "devnet-wallet",
            Role::Node => "devnet-node",
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        {
            let mut chain = self.chain();
            chain.calls.push((self.role, method.to_string()));
            if let Some(fault) = chain.method_faults.get(&(self.role, method.to_string())) {
                return Err(fault.error(method));
            }
        }

        let is_wallet_method = method.starts_with("wallet_") || method == "eth_requestAccounts";
        if is_wallet_method && self.role == Role::Node {
            return Err(WalletError::Provider {
                code: RPC_METHOD_NOT_FOUND,
                message: format!("Method {} not found", method),
            });
        }

        match method {
            "eth_requestAccounts" | "eth_accounts" => Ok(json!(self.chain().accounts)),
            "eth_chainId" => Ok(json!(format!("{:#x}", self.chain().chain_id))),
            "eth_blockNumber" => Ok(json!(format!("{:#x}", self.chain().block_number))),
            "eth_getBlockByNumber" => {
                let chain = self.chain();
                let block = params
                    .get(0)
                    .and_then(Value::as_str)
                    .and_then(parse_hex_u64)
                    .unwrap_or(chain.block_number);
                if block > chain.block_number {
                    return Ok(Value::Null);
                }
                let block = Block::<H256> {
                    number: Some(U64::from(block)),
                    timestamp: U256::from(chain.block_timestamp(block)),
                    ..Default::default()
                };
                Ok(serde_json::to_value(block)?)
            }
            "eth_call" => self.eth_call(&params),
            "eth_sendTransaction" => self.send_transaction(&params),
            "eth_getTransactionReceipt" => self.receipt(&params),
            "eth_getLogs" => {
                let chain = self.chain();
                let filter = params.get(0).cloned().unwrap_or(Value::Null);
                Ok(serde_json::to_value(chain.matching_logs(&filter))?)
            }
            "eth_newFilter" => Ok(self.new_filter(&params)),
            "eth_getFilterLogs" => self.filter_logs(&params),
            "eth_uninstallFilter" => {
                let id = params.get(0).and_then(Value::as_str).unwrap_or_default();
                Ok(json!(self.chain().filters.remove(id).is_some()))
            }
            "wallet_switchEthereumChain" => self.switch_chain(&params),
            "wallet_addEthereumChain" => self.add_chain(&params),
            "wallet_watchAsset" => {
                self.chain().watched_assets.push(params);
                Ok(json!(true))
            }
            other => Err(WalletError::Provider {
                code: RPC_METHOD_NOT_FOUND,
                message: format!("Method {} not found", other),
            }),
        }
    }

    fn subscribe(&self) -> Subscription {
        self.shared.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::request_as;
    use crate::utils::parse_address;

    #[test]
    fn dev_addresses_match_hardhat_defaults() {
        assert_eq!(
            DEV_OWNER,
            parse_address("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap()
        );
        assert_eq!(
            DEV_ALICE,
            parse_address("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").unwrap()
        );
        assert_eq!(
            DEV_CONTRACT,
            parse_address("0x5FbDB2315678afecb367f032d93F642f64180aa3").unwrap()
        );
    }

    #[tokio::test]
    async fn node_does_not_expose_wallet_methods() {
        let devnet = Devnet::new();
        let err = devnet
            .node()
            .request("eth_requestAccounts", json!([]))
            .await
            .unwrap_err();
        assert_eq!(err.provider_code(), Some(RPC_METHOD_NOT_FOUND));
        let accounts: Vec<Address> = request_as(devnet.node().as_ref(), "eth_accounts", json!([]))
            .await
            .unwrap();
        assert_eq!(accounts, vec![DEV_OWNER, DEV_ALICE]);
    }

    #[tokio::test]
    async fn method_faults_apply_per_role() {
        let devnet = Devnet::new();
        devnet.fail_method(Role::Wallet, "eth_chainId", -32000, "boom");
        assert!(devnet.wallet().request("eth_chainId", json!([])).await.is_err());
        assert!(devnet.node().request("eth_chainId", json!([])).await.is_ok());
        assert_eq!(devnet.call_count(Role::Wallet, "eth_chainId"), 1);

        devnet.clear_fault(Role::Wallet, "eth_chainId");
        assert!(devnet.wallet().request("eth_chainId", json!([])).await.is_ok());
    }

    #[tokio::test]
    async fn switching_to_unknown_chain_is_4902() {
        let devnet = Devnet::new();
        devnet.set_chain_id(5);
        devnet.forget_chain(PRIMARY_CHAIN_ID);
        let err = devnet
            .wallet()
            .request("wallet_switchEthereumChain", json!([{ "chainId": "0x539" }]))
            .await
            .unwrap_err();
        assert_eq!(err.provider_code(), Some(RPC_UNRECOGNIZED_CHAIN));
        assert_eq!(devnet.chain_id(), 5);
    }
}
