use crate::{
    constants::{
        FALLBACK_GAS_LIMIT, FALLBACK_MAX_FEE_PER_GAS_WEI, FALLBACK_MAX_PRIORITY_FEE_PER_GAS_WEI,
        MSG_AMOUNT_NOT_POSITIVE, MSG_FILL_ALL_FIELDS, MSG_INSUFFICIENT_BALANCE,
        MSG_INVALID_RECIPIENT, MSG_MINT_EXHAUSTED, MSG_REDEPLOY_HINT, MSG_TRANSFER_FAILED,
    },
    contract::{calldata, ContractBinding, TxOverrides},
    error::{Result, WalletError},
    strategy::{attempt, first_success},
    utils::{parse_address, parse_token_amount, parse_whole_tokens},
};
use ethers::types::{Address, TransactionReceipt, H256, U256};

/// A confirmed submission and the path that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub hash: H256,
    pub block_number: Option<u64>,
    pub strategy: &'static str,
}

impl Submitted {
    fn new(strategy: &'static str, receipt: TransactionReceipt) -> Self {
        Self {
            hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|n| n.as_u64()),
            strategy,
        }
    }
}

/// Validated transfer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub to: Address,
    pub amount: U256,
}

/// Validated mint request. `whole_tokens` is the unscaled count when the
/// input is a whole number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest {
    pub to: Address,
    pub amount: U256,
    pub whole_tokens: Option<U256>,
}

fn require_fields(to: &str, amount: &str) -> Result<()> {
    if to.trim().is_empty() || amount.trim().is_empty() {
        return Err(WalletError::Validation(MSG_FILL_ALL_FIELDS.to_string()));
    }
    Ok(())
}

fn positive_amount(amount: &str) -> Result<U256> {
    let amount = parse_token_amount(amount)?;
    if amount.is_zero() {
        return Err(WalletError::Validation(MSG_AMOUNT_NOT_POSITIVE.to_string()));
    }
    Ok(amount)
}

fn recipient(to: &str) -> Result<Address> {
    parse_address(to).map_err(|_| WalletError::Validation(MSG_INVALID_RECIPIENT.to_string()))
}

/// Client-side checks, in order: presence, positivity, balance, address.
/// The balance check is advisory; the contract re-validates.
pub fn validate_transfer(to: &str, amount: &str, balance: U256) -> Result<TransferRequest> {
    require_fields(to, amount)?;
    let amount = positive_amount(amount)?;
    if amount > balance {
        return Err(WalletError::Validation(MSG_INSUFFICIENT_BALANCE.to_string()));
    }
    let to = recipient(to)?;
    Ok(TransferRequest { to, amount })
}

pub fn validate_mint(to: &str, amount: &str) -> Result<MintRequest> {
    require_fields(to, amount)?;
    let scaled = positive_amount(amount)?;
    let to = recipient(to)?;
    let whole_tokens = match amount.trim().split_once('.') {
        Some((_, fraction)) if fraction.chars().any(|c| c != '0') => None,
        _ => parse_whole_tokens(amount).ok(),
    };
    Ok(MintRequest {
        to,
        amount: scaled,
        whole_tokens,
    })
}

fn fallback_overrides() -> TxOverrides {
    TxOverrides {
        gas_limit: Some(U256::from(FALLBACK_GAS_LIMIT)),
        max_fee_per_gas: Some(U256::from(FALLBACK_MAX_FEE_PER_GAS_WEI)),
        max_priority_fee_per_gas: Some(U256::from(FALLBACK_MAX_PRIORITY_FEE_PER_GAS_WEI)),
    }
}

/// Submits transfers and mints, each through an ordered list of submission
/// paths, and waits for confirmation.
pub struct TransactionSubmitter {
    mint_accepts_whole_tokens: bool,
}

impl TransactionSubmitter {
    pub fn new(mint_accepts_whole_tokens: bool) -> Self {
        Self {
            mint_accepts_whole_tokens,
        }
    }

    pub async fn transfer(
        &self,
        binding: &ContractBinding,
        balance: U256,
        to: &str,
        amount: &str,
    ) -> Result<Submitted> {
        let request = validate_transfer(to, amount, balance)?;
        tracing::info!(
            "Sending {} to {:?} from {:?}",
            request.amount,
            request.to,
            binding.account()
        );

        let attempts = vec![
            attempt("typed transfer", async {
                let hash = binding.transfer(request.to, request.amount).await?;
                binding.wait_for_receipt(hash).await
            }),
            attempt("raw transfer", async {
                let data = calldata::transfer(&request.to, request.amount);
                let hash = binding.send_transaction(data, &fallback_overrides()).await?;
                binding.wait_for_receipt(hash).await
            }),
        ];

        match first_success("transfer", attempts).await {
            Ok(success) => Ok(Submitted::new(success.strategy, success.value)),
            Err(e) => {
                tracing::error!("Transfer failed: {}", e);
                Err(WalletError::Submission {
                    message: format!("{} ({})", MSG_TRANSFER_FAILED, e),
                    suggestion: MSG_REDEPLOY_HINT.to_string(),
                })
            }
        }
    }

    pub async fn mint(&self, binding: &ContractBinding, to: &str, amount: &str) -> Result<Submitted> {
        let request = validate_mint(to, amount)?;
        tracing::info!("Minting {} to {:?}", request.amount, request.to);

        let mut attempts = Vec::new();
        if self.mint_accepts_whole_tokens {
            attempts.push(attempt("whole-token mint", async {
                let count = request.whole_tokens.ok_or_else(|| {
                    WalletError::Validation("Amount is not a whole token count".to_string())
                })?;
                let hash = binding.mint(request.to, count).await?;
                binding.wait_for_receipt(hash).await
            }));
        }
        attempts.push(attempt("typed mint", async {
            let hash = binding.mint(request.to, request.amount).await?;
            binding.wait_for_receipt(hash).await
        }));
        attempts.push(attempt("raw mint", async {
            let data = calldata::mint(&request.to, request.amount);
            let hash = binding
                .send_transaction(data, &TxOverrides::default())
                .await?;
            binding.wait_for_receipt(hash).await
        }));

        match first_success("mint", attempts).await {
            Ok(success) => Ok(Submitted::new(success.strategy, success.value)),
            Err(e) => {
                tracing::error!("Mint failed: {}", e);
                Err(WalletError::Mint(MSG_MINT_EXHAUSTED.to_string()))
            }
        }
    }
}
