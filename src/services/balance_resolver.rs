use crate::{
    contract::{calldata, ContractBinding, Route},
    error::{Result, WalletError},
    models::DeploymentDescriptor,
    strategy::{attempt, first_success},
};
use ethers::types::{Address, U256};

pub const DEPLOYMENT_FALLBACK: &str = "deployment fallback";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBalance {
    pub amount: U256,
    /// Name of the strategy that produced the amount.
    pub source: &'static str,
}

/// Resolves token balances. Never fails: when every on-chain query errors the
/// result degrades to the deployment fallback.
pub struct BalanceResolver<'a> {
    deployment: &'a DeploymentDescriptor,
}

impl<'a> BalanceResolver<'a> {
    pub fn new(deployment: &'a DeploymentDescriptor) -> Self {
        Self { deployment }
    }

    pub async fn resolve(&self, binding: &ContractBinding, target: Address) -> ResolvedBalance {
        let attempts = vec![
            attempt("balanceOf", binding.balance_of(target)),
            attempt("getBalance", binding.get_balance(target)),
            attempt("raw balanceOf call", raw_balance_of(binding, target)),
        ];

        match first_success("balance", attempts).await {
            Ok(success) => {
                tracing::info!(
                    "Balance of {:?}: {} (via {})",
                    target,
                    success.value,
                    success.strategy
                );
                ResolvedBalance {
                    amount: success.value,
                    source: success.strategy,
                }
            }
            Err(e) => {
                let amount = self.terminal_fallback(&target);
                tracing::warn!(
                    "Balance queries for {:?} failed ({}), assuming {}",
                    target,
                    e,
                    amount
                );
                ResolvedBalance {
                    amount,
                    source: DEPLOYMENT_FALLBACK,
                }
            }
        }
    }

    /// The owner is assumed to still hold the initial supply; anyone else zero.
    /// Stale after any transfer, kept only as the last resort.
    fn terminal_fallback(&self, target: &Address) -> U256 {
        if self.deployment.is_owner(target) {
            self.deployment.total_supply
        } else {
            U256::zero()
        }
    }
}

/// Hand-encoded `balanceOf` through the signer, then through the node.
async fn raw_balance_of(binding: &ContractBinding, target: Address) -> Result<U256> {
    let data = calldata::balance_of(&target);
    let output = match binding.raw_call(Route::Signer, data.clone()).await {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!("Raw balanceOf via signer failed: {}", e);
            binding.raw_call(Route::Node, data).await?
        }
    };
    calldata::decode_uint_word(&output).ok_or_else(|| {
        WalletError::Decode(format!(
            "balanceOf returned {} bytes, expected a 32-byte word",
            output.len()
        ))
    })
}
