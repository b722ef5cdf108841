use super::transaction::TransactionRecord;
use crate::{
    constants::MSG_NOT_CONNECTED,
    contract::ContractBinding,
    error::{Result, WalletError},
    utils::{checksum, format_amount},
};
use ethers::types::{Address, U256};
use std::sync::Arc;

/// Immutable view of the wallet session. Every transition returns a new
/// snapshot; nothing is mutated in place.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
    pub is_owner: bool,
    pub balance: U256,
    pub symbol: Option<String>,
    pub binding: Option<Arc<ContractBinding>>,
    pub history: Vec<TransactionRecord>,
    pub error: Option<String>,
    pub success: Option<String>,
    pub loading: bool,
    pub token_registered: bool,
}

impl SessionSnapshot {
    /// Disconnected state.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Disconnected state carrying the error that caused the reset.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn connected(
        account: Address,
        chain_id: u64,
        binding: Arc<ContractBinding>,
        is_owner: bool,
    ) -> Self {
        Self {
            account: Some(account),
            chain_id: Some(chain_id),
            is_owner,
            binding: Some(binding),
            ..Self::default()
        }
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some() && self.binding.is_some()
    }

    pub fn require_binding(&self) -> Result<&Arc<ContractBinding>> {
        self.binding
            .as_ref()
            .ok_or_else(|| WalletError::Connection(MSG_NOT_CONNECTED.to_string()))
    }

    pub fn require_account(&self) -> Result<Address> {
        self.account
            .ok_or_else(|| WalletError::Connection(MSG_NOT_CONNECTED.to_string()))
    }

    pub fn with_symbol(self, symbol: Option<String>) -> Self {
        Self { symbol, ..self }
    }

    pub fn with_balance(self, balance: U256) -> Self {
        Self { balance, ..self }
    }

    pub fn with_history(self, history: Vec<TransactionRecord>) -> Self {
        Self { history, ..self }
    }

    pub fn with_loading(self, loading: bool) -> Self {
        Self { loading, ..self }
    }

    pub fn with_token_registered(self, token_registered: bool) -> Self {
        Self {
            token_registered,
            ..self
        }
    }

    /// Recoverable error; the session stays connected.
    pub fn with_error(self, error: Option<String>) -> Self {
        Self { error, ..self }
    }

    pub fn with_success(self, success: impl Into<String>) -> Self {
        Self {
            success: Some(success.into()),
            error: None,
            ..self
        }
    }

    pub fn clear_messages(self) -> Self {
        Self {
            error: None,
            success: None,
            ..self
        }
    }

    pub fn summary(&self) -> String {
        match self.account {
            Some(account) => format!(
                "{} | {} {}{}",
                checksum(&account),
                format_amount(self.balance),
                self.symbol.as_deref().unwrap_or("ESLSCA"),
                if self.is_owner { " | owner" } else { "" }
            ),
            None => "Not connected".to_string(),
        }
    }
}
