use super::abi::token_abi;
use crate::{
    constants::DEFAULT_RECEIPT_POLL_ATTEMPTS,
    error::{Result, WalletError},
    provider::{request_as, WalletProvider},
};
use ethers::abi::{Abi, Event, Token};
use ethers::types::{
    Address, Block, BlockNumber, Bytes, Eip1559TransactionRequest, Filter, Log,
    TransactionReceipt, TransactionRequest, H256, U256, U64,
};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Which transport a request goes through: the signing wallet itself, or the
/// node behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Signer,
    Node,
}

/// Explicit fee and gas parameters for a raw transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxOverrides {
    pub gas_limit: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractInfo {
    pub name: String,
    pub symbol: String,
    pub total_supply: U256,
    pub decimals: u8,
    pub owner: Address,
}

/// Typed handle over the deployed token for one signing account.
pub struct ContractBinding {
    address: Address,
    account: Address,
    abi: Abi,
    signer: Arc<dyn WalletProvider>,
    node: Option<Arc<dyn WalletProvider>>,
    receipt_poll_interval: Duration,
    receipt_poll_attempts: u32,
}

impl fmt::Debug for ContractBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractBinding")
            .field("address", &self.address)
            .field("account", &self.account)
            .field("signer", &self.signer.label())
            .field("node", &self.node.as_ref().map(|node| node.label().to_string()))
            .finish()
    }
}

fn token_to_uint(token: Token, what: &str) -> Result<U256> {
    token
        .into_uint()
        .ok_or_else(|| WalletError::Decode(format!("{} did not return a uint", what)))
}

fn token_to_string(token: Token, what: &str) -> Result<String> {
    token
        .into_string()
        .ok_or_else(|| WalletError::Decode(format!("{} did not return a string", what)))
}

fn token_to_address(token: Token, what: &str) -> Result<Address> {
    token
        .into_address()
        .ok_or_else(|| WalletError::Decode(format!("{} did not return an address", what)))
}

fn first_token(tokens: Vec<Token>, what: &str) -> Result<Token> {
    tokens
        .into_iter()
        .next()
        .ok_or_else(|| WalletError::Decode(format!("{} returned no values", what)))
}

impl ContractBinding {
    pub fn new(
        address: Address,
        account: Address,
        signer: Arc<dyn WalletProvider>,
        node: Option<Arc<dyn WalletProvider>>,
        receipt_poll_interval: Duration,
    ) -> Result<Self> {
        Ok(Self {
            address,
            account,
            abi: token_abi()?,
            signer,
            node,
            receipt_poll_interval,
            receipt_poll_attempts: DEFAULT_RECEIPT_POLL_ATTEMPTS,
        })
    }

    /// Cap on `eth_getTransactionReceipt` polls per transaction.
    pub fn with_receipt_poll_attempts(mut self, attempts: u32) -> Self {
        self.receipt_poll_attempts = attempts.max(1);
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn signer(&self) -> &Arc<dyn WalletProvider> {
        &self.signer
    }

    pub fn transport(&self, route: Route) -> Result<&dyn WalletProvider> {
        match route {
            Route::Signer => Ok(self.signer.as_ref()),
            Route::Node => self.node.as_deref().ok_or_else(|| {
                WalletError::Transport("No node transport behind the wallet provider".to_string())
            }),
        }
    }

    /// Node transport when present, otherwise the signer.
    fn read_transport(&self) -> &dyn WalletProvider {
        self.node.as_deref().unwrap_or(self.signer.as_ref())
    }

    pub fn event(&self, name: &str) -> Result<&Event> {
        self.abi
            .event(name)
            .map_err(|e| WalletError::Decode(format!("Unknown event {}: {}", name, e)))
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    async fn call_function(&self, name: &str, args: &[Token]) -> Result<Vec<Token>> {
        let function = self
            .abi
            .function(name)
            .map_err(|e| WalletError::Decode(format!("Unknown function {}: {}", name, e)))?;
        let data = function
            .encode_input(args)
            .map_err(|e| WalletError::Decode(format!("Could not encode {}: {}", name, e)))?;
        let output = self.raw_call(Route::Signer, data).await?;
        if output.is_empty() {
            return Err(WalletError::Decode(format!(
                "{} returned no data (is the contract deployed at {:?}?)",
                name, self.address
            )));
        }
        function
            .decode_output(&output)
            .map_err(|e| WalletError::Decode(format!("Could not decode {}: {}", name, e)))
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        let tokens = self
            .call_function("balanceOf", &[Token::Address(owner)])
            .await?;
        token_to_uint(first_token(tokens, "balanceOf")?, "balanceOf")
    }

    pub async fn get_balance(&self, owner: Address) -> Result<U256> {
        let tokens = self
            .call_function("getBalance", &[Token::Address(owner)])
            .await?;
        token_to_uint(first_token(tokens, "getBalance")?, "getBalance")
    }

    pub async fn symbol(&self) -> Result<String> {
        let tokens = self.call_function("symbol", &[]).await?;
        token_to_string(first_token(tokens, "symbol")?, "symbol")
    }

    pub async fn total_supply(&self) -> Result<U256> {
        let tokens = self.call_function("totalSupply", &[]).await?;
        token_to_uint(first_token(tokens, "totalSupply")?, "totalSupply")
    }

    pub async fn get_contract_info(&self) -> Result<ContractInfo> {
        let mut tokens = self.call_function("getContractInfo", &[]).await?.into_iter();
        let mut next = |what: &str| {
            tokens
                .next()
                .ok_or_else(|| WalletError::Decode(format!("getContractInfo is missing {}", what)))
        };
        let name = token_to_string(next("name")?, "name")?;
        let symbol = token_to_string(next("symbol")?, "symbol")?;
        let total_supply = token_to_uint(next("totalSupply")?, "totalSupply")?;
        let decimals = token_to_uint(next("decimals")?, "decimals")?;
        let owner = token_to_address(next("owner")?, "owner")?;
        Ok(ContractInfo {
            name,
            symbol,
            total_supply,
            decimals: decimals.low_u32().min(u8::MAX as u32) as u8,
            owner,
        })
    }

    /// `eth_call` against the contract with arbitrary calldata.
    pub async fn raw_call(&self, route: Route, data: Vec<u8>) -> Result<Vec<u8>> {
        let transport = self.transport(route)?;
        let call = TransactionRequest::new()
            .from(self.account)
            .to(self.address)
            .data(data);
        let output: Bytes = request_as(transport, "eth_call", json!([call, "latest"])).await?;
        Ok(output.to_vec())
    }

    // ---------------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------------

    fn encode(&self, name: &str, args: &[Token]) -> Result<Vec<u8>> {
        self.abi
            .function(name)
            .and_then(|function| function.encode_input(args))
            .map_err(|e| WalletError::Decode(format!("Could not encode {}: {}", name, e)))
    }

    pub async fn transfer(&self, to: Address, amount: U256) -> Result<H256> {
        let data = self.encode("transfer", &[Token::Address(to), Token::Uint(amount)])?;
        self.send_transaction(data, &TxOverrides::default()).await
    }

    pub async fn mint(&self, to: Address, amount: U256) -> Result<H256> {
        let data = self.encode("mint", &[Token::Address(to), Token::Uint(amount)])?;
        self.send_transaction(data, &TxOverrides::default()).await
    }

    /// Submit calldata to the contract as a transaction signed by the session
    /// account. Returns the transaction hash.
    pub async fn send_transaction(&self, data: Vec<u8>, overrides: &TxOverrides) -> Result<H256> {
        let mut tx = Eip1559TransactionRequest::new()
            .from(self.account)
            .to(self.address)
            .data(data);
        if let Some(gas) = overrides.gas_limit {
            tx = tx.gas(gas);
        }
        if let Some(fee) = overrides.max_fee_per_gas {
            tx = tx.max_fee_per_gas(fee);
        }
        if let Some(fee) = overrides.max_priority_fee_per_gas {
            tx = tx.max_priority_fee_per_gas(fee);
        }

        let hash: H256 = request_as(self.signer.as_ref(), "eth_sendTransaction", json!([tx])).await?;
        tracing::info!("Transaction sent: {:?}", hash);
        Ok(hash)
    }

    /// Poll until the transaction is mined, at most `receipt_poll_attempts`
    /// times. A reverted receipt is an error.
    pub async fn wait_for_receipt(&self, hash: H256) -> Result<TransactionReceipt> {
        for attempt in 0..self.receipt_poll_attempts {
            let receipt: Option<TransactionReceipt> = request_as(
                self.signer.as_ref(),
                "eth_getTransactionReceipt",
                json!([hash]),
            )
            .await?;

            let Some(receipt) = receipt else {
                if attempt + 1 < self.receipt_poll_attempts {
                    tokio::time::sleep(self.receipt_poll_interval).await;
                }
                continue;
            };

            if receipt.status == Some(U64::zero()) {
                return Err(WalletError::Transport(format!(
                    "Transaction {:?} reverted",
                    hash
                )));
            }
            tracing::info!(
                "Transaction confirmed: {:?} (block {:?})",
                hash,
                receipt.block_number
            );
            return Ok(receipt);
        }

        Err(WalletError::Transport(format!(
            "Transaction {:?} not mined after {} receipt polls",
            hash, self.receipt_poll_attempts
        )))
    }

    // ---------------------------------------------------------------------
    // Logs
    // ---------------------------------------------------------------------

    /// Full-range filter on one topic 0 for this contract.
    pub fn topic_filter(&self, topic0: H256) -> Filter {
        Filter::new()
            .address(self.address)
            .topic0(topic0)
            .from_block(0u64)
            .to_block(BlockNumber::Latest)
    }

    /// `eth_getLogs` on the given route.
    pub async fn get_logs(&self, route: Route, filter: &Filter) -> Result<Vec<Log>> {
        let transport = self.transport(route)?;
        request_as(transport, "eth_getLogs", json!([filter])).await
    }

    /// Install a filter and read its logs (`eth_newFilter` then
    /// `eth_getFilterLogs`). The filter is uninstalled afterwards, best effort.
    pub async fn get_filter_logs(&self, route: Route, filter: &Filter) -> Result<Vec<Log>> {
        let transport = self.transport(route)?;
        let filter_id: String = request_as(transport, "eth_newFilter", json!([filter])).await?;
        let logs = request_as(transport, "eth_getFilterLogs", json!([filter_id])).await;
        if let Err(e) = transport
            .request("eth_uninstallFilter", json!([filter_id]))
            .await
        {
            tracing::debug!("Could not uninstall filter {}: {}", filter_id, e);
        }
        logs
    }

    /// Typed event query: the topic comes from the ABI event definition and
    /// the block range is resolved to explicit numbers.
    pub async fn query_filter(&self, event_name: &str, from_block: u64) -> Result<Vec<Log>> {
        let topic0 = self.event(event_name)?.signature();
        let latest = self.block_number().await?;
        let filter = Filter::new()
            .address(self.address)
            .topic0(topic0)
            .from_block(from_block)
            .to_block(latest);
        request_as(self.read_transport(), "eth_getLogs", json!([filter])).await
    }

    pub async fn block_number(&self) -> Result<u64> {
        let number: U64 = request_as(self.read_transport(), "eth_blockNumber", json!([])).await?;
        Ok(number.as_u64())
    }

    pub async fn block_timestamp(&self, block_number: u64) -> Result<u64> {
        let block: Option<Block<H256>> = request_as(
            self.read_transport(),
            "eth_getBlockByNumber",
            json!([BlockNumber::Number(block_number.into()), false]),
        )
        .await?;
        match block {
            Some(block) if !block.timestamp.is_zero() => Ok(block.timestamp.low_u64()),
            _ => Err(WalletError::Decode(format!(
                "Block {} has no timestamp",
                block_number
            ))),
        }
    }
}
