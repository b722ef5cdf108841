use crate::{
    constants::MSG_HISTORY_FAILED,
    contract::ContractBinding,
    error::{Result, WalletError},
    indexer::{EventParser, LogSource},
    models::{DeploymentDescriptor, TransactionRecord},
    utils::now_unix,
};
use ethers::types::{Address, H256, Log};
use std::collections::{HashMap, HashSet};

/// Outcome of a history load. `error` is set when the history could not be
/// retrieved at all; `records` then holds at most the owner's genesis record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryOutcome {
    pub records: Vec<TransactionRecord>,
    pub error: Option<String>,
}

/// Reconciles the account's view of token activity from contract events.
pub struct TransactionHistoryService<'a> {
    deployment: &'a DeploymentDescriptor,
    parser: EventParser,
}

impl<'a> TransactionHistoryService<'a> {
    pub fn new(deployment: &'a DeploymentDescriptor) -> Self {
        Self {
            deployment,
            parser: EventParser::new(),
        }
    }

    /// Newest-first history visible to `account`; `is_admin` shows every
    /// participant. Never fails.
    pub async fn load(
        &self,
        binding: &ContractBinding,
        account: Address,
        is_admin: bool,
    ) -> HistoryOutcome {
        match self.reconcile(binding, account, is_admin).await {
            Ok(records) => HistoryOutcome {
                records,
                error: None,
            },
            Err(e) => {
                tracing::error!("Error loading transactions for {:?}: {}", account, e);
                HistoryOutcome {
                    records: self.genesis_for(&account).into_iter().collect(),
                    error: Some(MSG_HISTORY_FAILED.to_string()),
                }
            }
        }
    }

    async fn reconcile(
        &self,
        binding: &ContractBinding,
        account: Address,
        is_admin: bool,
    ) -> Result<Vec<TransactionRecord>> {
        let source = LogSource::new(binding);
        let mut records = Vec::new();
        let mut failures = Vec::new();
        let mut answered = false;

        match source.fetch("TransferExecuted").await {
            Ok(found) => {
                answered = true;
                for record in found
                    .value
                    .iter()
                    .filter_map(|log| self.parser.parse_log(log, &account))
                {
                    if is_admin || record.involves(&account) {
                        records.push(record);
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Transfer events unavailable: {}", e);
                failures.push(format!("TransferExecuted: {}", e));
            }
        }

        match source.fetch("TokensMinted").await {
            Ok(found) => {
                answered = true;
                for record in found
                    .value
                    .iter()
                    .filter_map(|log| self.parser.parse_log(log, &account))
                {
                    if is_admin || record.involves(&account) {
                        records.push(record);
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Mint events unavailable: {}", e);
                failures.push(format!("TokensMinted: {}", e));
            }
        }

        if records.is_empty() {
            tracing::info!("No custom events for {:?}, falling back to Transfer", account);
            match source.standard_transfers().await {
                Ok(logs) => {
                    answered = true;
                    let mut timestamps = HashMap::new();
                    for log in &logs {
                        let timestamp = block_time(binding, log, &mut timestamps).await;
                        let record = self.parser.parse_standard_transfer(log, &account, timestamp);
                        if is_admin || record.involves(&account) {
                            records.push(record);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Standard Transfer events unavailable: {}", e);
                    failures.push(format!("Transfer: {}", e));
                }
            }
        }

        if !answered {
            return Err(WalletError::Exhausted {
                label: "history".to_string(),
                summary: failures.join("; "),
            });
        }

        let mut records = dedupe(records);
        sort_newest_first(&mut records);

        if records.is_empty() {
            records.extend(self.genesis_for(&account));
        }

        tracing::info!("Loaded {} transactions for {:?}", records.len(), account);
        Ok(records)
    }

    /// Placeholder for the initial supply mint, which emits no custom event.
    /// Only the owner sees it.
    fn genesis_for(&self, account: &Address) -> Option<TransactionRecord> {
        self.deployment.is_owner(account).then(|| {
            TransactionRecord::mint(
                H256::zero(),
                self.deployment.owner_address,
                self.deployment.total_supply,
                self.deployment.deployment_time.unwrap_or_else(now_unix),
            )
        })
    }
}

async fn block_time(
    binding: &ContractBinding,
    log: &Log,
    cache: &mut HashMap<u64, u64>,
) -> u64 {
    let Some(block) = log.block_number.map(|n| n.as_u64()) else {
        return now_unix();
    };
    if let Some(timestamp) = cache.get(&block) {
        return *timestamp;
    }
    let timestamp = match binding.block_timestamp(block).await {
        Ok(timestamp) => timestamp,
        Err(e) => {
            tracing::warn!("Could not get block {} timestamp: {}", block, e);
            now_unix()
        }
    };
    cache.insert(block, timestamp);
    timestamp
}

/// Drop repeated observations of the same log, keeping the first.
fn dedupe(records: Vec<TransactionRecord>) -> Vec<TransactionRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| match record.dedup_key() {
            Some(key) => seen.insert(key),
            None => true,
        })
        .collect()
}

/// Stable, so equal timestamps keep retrieval order.
fn sort_newest_first(records: &mut [TransactionRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
