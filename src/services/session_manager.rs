use super::{
    balance_resolver::BalanceResolver,
    transaction_history::TransactionHistoryService,
    transaction_submitter::{validate_mint, validate_transfer, Submitted, TransactionSubmitter},
};
use crate::{
    config::Config,
    constants::{
        ACCEPTED_CHAIN_IDS, LOCAL_CHAIN_NAME, LOCAL_RPC_URL, MSG_ADDRESS_MISMATCH, MSG_CONNECTED,
        MSG_TOKENS_MINTED, MSG_TOKENS_SENT, PRIMARY_CHAIN_ID, RPC_METHOD_NOT_FOUND,
        RPC_UNRECOGNIZED_CHAIN, TOKEN_NAME, TOKEN_SYMBOL,
    },
    contract::ContractBinding,
    error::{Result, WalletError},
    models::{DeploymentDescriptor, SessionSnapshot},
    provider::{http::parse_accounts, request_as, ProviderEvent, Subscription, WalletProvider},
    utils::{checksum, parse_address, parse_hex_u64},
};
use ethers::types::Address;
use serde_json::json;
use std::sync::Arc;

/// What the caller should do after a session transition.
#[derive(Debug, Clone)]
pub enum Transition {
    /// Display this snapshot.
    Ready(SessionSnapshot),
    /// Every cached binding is stale: drop the snapshot and connect again.
    ReloadRequired,
}

impl Transition {
    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        match self {
            Transition::Ready(snapshot) => Some(snapshot),
            Transition::ReloadRequired => None,
        }
    }
}

/// Drives the wallet session: connection, network reconciliation, refreshes
/// and reactions to provider notifications.
pub struct SessionManager {
    wallet: Arc<dyn WalletProvider>,
    node: Option<Arc<dyn WalletProvider>>,
    deployment: DeploymentDescriptor,
    config: Config,
}

impl SessionManager {
    pub fn new(
        wallet: Arc<dyn WalletProvider>,
        node: Option<Arc<dyn WalletProvider>>,
        deployment: DeploymentDescriptor,
        config: Config,
    ) -> Self {
        Self {
            wallet,
            node,
            deployment,
            config,
        }
    }

    pub fn deployment(&self) -> &DeploymentDescriptor {
        &self.deployment
    }

    pub fn subscribe(&self) -> Subscription {
        self.wallet.subscribe()
    }

    /// Connect, resetting to an empty snapshot carrying the error on failure.
    pub async fn connect_or_reset(&self) -> Transition {
        match self.connect().await {
            Ok(transition) => transition,
            Err(e) => {
                tracing::error!("Error connecting wallet: {}", e);
                Transition::Ready(SessionSnapshot::failed(format!(
                    "Failed to connect wallet: {}",
                    e
                )))
            }
        }
    }

    /// Authorize, reconcile the network and bind the contract. Every failure
    /// is reported as a connection error.
    pub async fn connect(&self) -> Result<Transition> {
        self.try_connect().await.map_err(|e| match e {
            WalletError::Connection(_) => e,
            other => WalletError::Connection(other.to_string()),
        })
    }

    async fn try_connect(&self) -> Result<Transition> {
        let account = self.request_account().await?;

        let Some(chain_id) = self.reconcile_network().await? else {
            return Ok(Transition::ReloadRequired);
        };

        let binding = Arc::new(self.bind(account)?);
        let symbol = match binding.symbol().await {
            Ok(symbol) => {
                tracing::info!("Contract symbol: {}", symbol);
                Some(symbol)
            }
            Err(e) => {
                tracing::warn!("Could not read contract symbol, proceeding anyway: {}", e);
                None
            }
        };

        let is_owner = self.deployment.is_owner(&account);
        tracing::info!(
            "Connected {} on chain {} (owner: {})",
            checksum(&account),
            chain_id,
            is_owner
        );

        let snapshot = SessionSnapshot::connected(account, chain_id, binding, is_owner)
            .with_symbol(symbol)
            .with_loading(true);
        let snapshot = self.refresh(snapshot).await.with_loading(false);
        if snapshot.error.is_some() {
            return Ok(Transition::Ready(snapshot));
        }
        Ok(Transition::Ready(snapshot.with_success(MSG_CONNECTED)))
    }

    async fn request_account(&self) -> Result<Address> {
        let accounts = match self.wallet.request("eth_requestAccounts", json!([])).await {
            Ok(value) => parse_accounts(&value)?,
            Err(e) if e.provider_code() == Some(RPC_METHOD_NOT_FOUND) => {
                tracing::debug!("eth_requestAccounts unsupported, reading eth_accounts");
                let value = self.wallet.request("eth_accounts", json!([])).await?;
                parse_accounts(&value)?
            }
            Err(e) => {
                return Err(WalletError::Connection(format!(
                    "Account authorization failed: {}",
                    e
                )))
            }
        };

        accounts
            .first()
            .copied()
            .ok_or_else(|| WalletError::Connection("No accounts returned from wallet".to_string()))
    }

    /// `Some(chain_id)` when already on an accepted network, `None` when the
    /// wallet was switched and the session must reload.
    async fn reconcile_network(&self) -> Result<Option<u64>> {
        let raw: String = request_as(self.wallet.as_ref(), "eth_chainId", json!([])).await?;
        let chain_id = parse_hex_u64(&raw)
            .ok_or_else(|| WalletError::Connection(format!("Invalid chain id: {}", raw)))?;
        if ACCEPTED_CHAIN_IDS.contains(&chain_id) {
            return Ok(Some(chain_id));
        }

        tracing::info!(
            "Chain {} is not the local network, switching to {}",
            chain_id,
            PRIMARY_CHAIN_ID
        );
        let primary = format!("{:#x}", PRIMARY_CHAIN_ID);
        match self
            .wallet
            .request("wallet_switchEthereumChain", json!([{ "chainId": primary }]))
            .await
        {
            Ok(_) => Ok(None),
            Err(e) if e.provider_code() == Some(RPC_UNRECOGNIZED_CHAIN) => {
                tracing::info!("Local network unknown to wallet, adding it");
                self.wallet
                    .request(
                        "wallet_addEthereumChain",
                        json!([{
                            "chainId": primary,
                            "chainName": LOCAL_CHAIN_NAME,
                            "rpcUrls": [LOCAL_RPC_URL],
                            "nativeCurrency": {
                                "name": TOKEN_NAME,
                                "symbol": TOKEN_SYMBOL,
                                "decimals": 18,
                            },
                        }]),
                    )
                    .await
                    .map_err(|e| {
                        WalletError::Connection(format!(
                            "Could not add Hardhat network to wallet: {}",
                            e
                        ))
                    })?;
                Ok(None)
            }
            Err(e) => Err(WalletError::Connection(format!(
                "Could not switch to Hardhat network: {}",
                e
            ))),
        }
    }

    fn bind(&self, account: Address) -> Result<ContractBinding> {
        let address = match self.config.contract_address.as_deref() {
            Some(raw) => parse_address(raw).map_err(|e| WalletError::Connection(e.to_string()))?,
            None => self.deployment.contract_address,
        };
        let binding = ContractBinding::new(
            address,
            account,
            Arc::clone(&self.wallet),
            self.node.clone(),
            self.config.receipt_poll_interval(),
        )?
        .with_receipt_poll_attempts(self.config.receipt_poll_attempts);
        if binding.address() != self.deployment.contract_address {
            return Err(WalletError::Connection(format!(
                "{}: binding targets {} but deployment is {}",
                MSG_ADDRESS_MISMATCH,
                checksum(&binding.address()),
                checksum(&self.deployment.contract_address)
            )));
        }
        Ok(binding)
    }

    /// Re-resolve balance and history for the active account.
    pub async fn refresh(&self, snapshot: SessionSnapshot) -> SessionSnapshot {
        let (Some(binding), Some(account)) = (snapshot.binding.clone(), snapshot.account) else {
            return snapshot;
        };
        let balance = BalanceResolver::new(&self.deployment)
            .resolve(&binding, account)
            .await;
        let history = TransactionHistoryService::new(&self.deployment)
            .load(&binding, account, snapshot.is_owner)
            .await;
        snapshot
            .with_balance(balance.amount)
            .with_history(history.records)
            .with_error(history.error)
    }

    /// Ask the wallet to track the token. Best effort.
    pub async fn register_token(&self, snapshot: SessionSnapshot) -> SessionSnapshot {
        let params = json!({
            "type": "ERC20",
            "options": {
                "address": checksum(&self.deployment.contract_address),
                "symbol": self.deployment.symbol,
                "decimals": self.deployment.decimals,
                "name": self.deployment.name,
            },
        });
        match self.wallet.request("wallet_watchAsset", params).await {
            Ok(value) if value.as_bool() == Some(true) => {
                tracing::info!("Token {} added to wallet", self.deployment.symbol);
                snapshot.with_token_registered(true)
            }
            Ok(value) => {
                tracing::warn!("Wallet declined to track the token: {}", value);
                snapshot
            }
            Err(e) => {
                tracing::warn!("Could not add token to wallet: {}", e);
                snapshot
            }
        }
    }

    pub async fn transfer(
        &self,
        snapshot: SessionSnapshot,
        to: &str,
        amount: &str,
    ) -> Result<(SessionSnapshot, Submitted)> {
        let binding = Arc::clone(snapshot.require_binding()?);
        validate_transfer(to, amount, snapshot.balance)?;
        let snapshot = self.ensure_token_registered(snapshot).await;
        let submitted = self
            .submitter()
            .transfer(&binding, snapshot.balance, to, amount)
            .await?;
        tracing::info!("Transfer confirmed: {:?}", submitted.hash);
        let snapshot = self.refresh(snapshot.clear_messages()).await;
        Ok((snapshot.with_success(MSG_TOKENS_SENT), submitted))
    }

    pub async fn mint(
        &self,
        snapshot: SessionSnapshot,
        to: &str,
        amount: &str,
    ) -> Result<(SessionSnapshot, Submitted)> {
        let binding = Arc::clone(snapshot.require_binding()?);
        validate_mint(to, amount)?;
        let snapshot = self.ensure_token_registered(snapshot).await;
        let submitted = self.submitter().mint(&binding, to, amount).await?;
        tracing::info!("Mint confirmed: {:?}", submitted.hash);
        let snapshot = self.refresh(snapshot.clear_messages()).await;
        Ok((snapshot.with_success(MSG_TOKENS_MINTED), submitted))
    }

    async fn ensure_token_registered(&self, snapshot: SessionSnapshot) -> SessionSnapshot {
        if snapshot.token_registered {
            snapshot
        } else {
            self.register_token(snapshot).await
        }
    }

    fn submitter(&self) -> TransactionSubmitter {
        TransactionSubmitter::new(self.config.mint_accepts_whole_tokens)
    }

    /// React to a provider notification.
    pub async fn on_event(&self, event: ProviderEvent) -> Transition {
        match event {
            ProviderEvent::AccountsChanged(accounts) if accounts.is_empty() => {
                tracing::info!("Wallet disconnected");
                Transition::Ready(SessionSnapshot::empty())
            }
            ProviderEvent::AccountsChanged(accounts) => {
                tracing::info!("Accounts changed to {:?}, reconnecting", accounts);
                self.connect_or_reset().await
            }
            ProviderEvent::ChainChanged(chain_id) => {
                tracing::info!("Chain changed to {}, reloading", chain_id);
                Transition::ReloadRequired
            }
        }
    }
}
