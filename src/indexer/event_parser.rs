use crate::{
    constants::{TOKENS_MINTED_SIGNATURE, TRANSFER_EXECUTED_SIGNATURE},
    crypto::hash::event_topic,
    models::transaction::TransactionRecord,
    utils::now_unix,
};
use ethers::abi::{decode, Event, ParamType, RawLog, Token};
use ethers::types::{Address, Log, H256, U256};

/// Event Parser - decodes token contract logs into transaction records
pub struct EventParser {
    transfer_executed: H256,
    tokens_minted: H256,
}

impl EventParser {
    pub fn new() -> Self {
        Self {
            transfer_executed: event_topic(TRANSFER_EXECUTED_SIGNATURE),
            tokens_minted: event_topic(TOKENS_MINTED_SIGNATURE),
        }
    }

    /// Route a custom-event log by topic 0. Standard `Transfer` logs need a
    /// block time and go through [`Self::parse_standard_transfer`] instead.
    pub fn parse_log(&self, log: &Log, viewer: &Address) -> Option<TransactionRecord> {
        let topic0 = log.topics.first()?;
        if *topic0 == self.transfer_executed {
            return Some(self.parse_transfer_executed(log, viewer));
        }
        if *topic0 == self.tokens_minted {
            return Some(self.parse_tokens_minted(log));
        }
        None
    }

    /// `TransferExecuted(address indexed from, address indexed to, uint256 amount, uint256 timestamp)`.
    /// Topic 0 is not re-validated here.
    pub fn parse_transfer_executed(&self, log: &Log, viewer: &Address) -> TransactionRecord {
        let from = topic_address(log, 1);
        let to = topic_address(log, 2);
        let (amount, timestamp) = amount_and_timestamp(log);
        TransactionRecord::transfer(log_hash(log), from, to, amount, timestamp, viewer)
            .at_position(block_number(log), log_index(log))
    }

    /// `TokensMinted(address indexed to, uint256 amount, uint256 timestamp)`.
    pub fn parse_tokens_minted(&self, log: &Log) -> TransactionRecord {
        let to = topic_address(log, 1);
        let (amount, timestamp) = amount_and_timestamp(log);
        TransactionRecord::mint(log_hash(log), to, amount, timestamp)
            .at_position(block_number(log), log_index(log))
    }

    /// Standard ERC-20 `Transfer(from, to, value)`. The log carries no time, so
    /// the caller resolves it from the containing block and passes it in.
    pub fn parse_standard_transfer(
        &self,
        log: &Log,
        viewer: &Address,
        timestamp: u64,
    ) -> TransactionRecord {
        let (from, to, value) = standard_transfer_fields(log);
        TransactionRecord::transfer(log_hash(log), from, to, value, timestamp, viewer)
            .at_position(block_number(log), log_index(log))
    }
}

impl Default for EventParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Low 20 bytes of an indexed address topic; zero address when absent.
fn topic_address(log: &Log, index: usize) -> Address {
    log.topics
        .get(index)
        .map(|topic| Address::from_slice(&topic.as_bytes()[12..]))
        .unwrap_or_default()
}

/// Two non-indexed uint256 words. Falls back to zero amount at the current time.
fn amount_and_timestamp(log: &Log) -> (U256, u64) {
    let decoded = decode(&[ParamType::Uint(256), ParamType::Uint(256)], &log.data);
    match decoded.as_deref() {
        Ok([Token::Uint(amount), Token::Uint(timestamp)]) => {
            (*amount, timestamp.min(&U256::from(u64::MAX)).as_u64())
        }
        _ => {
            tracing::warn!(
                "Could not decode event data for {:?}, using zero amount",
                log.transaction_hash
            );
            (U256::zero(), now_unix())
        }
    }
}

fn standard_transfer_fields(log: &Log) -> (Address, Address, U256) {
    let event = standard_transfer_event();
    let raw = RawLog {
        topics: log.topics.clone(),
        data: log.data.to_vec(),
    };
    let Ok(parsed) = event.parse_log(raw) else {
        tracing::warn!(
            "Could not decode Transfer log {:?}, using zero values",
            log.transaction_hash
        );
        return (Address::zero(), Address::zero(), U256::zero());
    };

    let mut from = Address::zero();
    let mut to = Address::zero();
    let mut value = U256::zero();
    for param in parsed.params {
        match (param.name.as_str(), param.value) {
            ("from", Token::Address(address)) => from = address,
            ("to", Token::Address(address)) => to = address,
            ("value", Token::Uint(amount)) => value = amount,
            _ => {}
        }
    }
    (from, to, value)
}

fn standard_transfer_event() -> Event {
    use ethers::abi::EventParam;
    let param = |name: &str, kind: ParamType, indexed: bool| EventParam {
        name: name.to_string(),
        kind,
        indexed,
    };
    Event {
        name: "Transfer".to_string(),
        inputs: vec![
            param("from", ParamType::Address, true),
            param("to", ParamType::Address, true),
            param("value", ParamType::Uint(256), false),
        ],
        anonymous: false,
    }
}

fn log_hash(log: &Log) -> H256 {
    log.transaction_hash.unwrap_or_default()
}

fn block_number(log: &Log) -> Option<u64> {
    log.block_number.map(|n| n.as_u64())
}

fn log_index(log: &Log) -> Option<u64> {
    log.log_index.map(|i| i.low_u64())
}
