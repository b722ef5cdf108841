use crate::utils::{format_amount, format_timestamp, short_address};
use ethers::types::{Address, H256, U256};
use serde::Serialize;
use std::fmt;

/// Which contract event produced the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Transfer,
    Mint,
}

/// Classification relative to the viewing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
    Minted,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Direction::Sent => "sent",
            Direction::Received => "received",
            Direction::Minted => "minted",
        };
        f.pad(label)
    }
}

/// One observed ledger event. Built once by decoding or synthesis, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub hash: H256,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    /// Unix seconds, `0` when unknown.
    pub timestamp: u64,
    pub direction: Direction,
    pub kind: EventKind,
    pub block_number: Option<u64>,
    pub log_index: Option<u64>,
}

impl TransactionRecord {
    /// Transfer-kind record classified from the viewer's point of view.
    pub fn transfer(
        hash: H256,
        from: Address,
        to: Address,
        amount: U256,
        timestamp: u64,
        viewer: &Address,
    ) -> Self {
        let direction = if &from == viewer {
            Direction::Sent
        } else {
            Direction::Received
        };
        Self {
            hash,
            from,
            to,
            amount,
            timestamp,
            direction,
            kind: EventKind::Transfer,
            block_number: None,
            log_index: None,
        }
    }

    /// Mint-kind record; the sender is always the zero address.
    pub fn mint(hash: H256, to: Address, amount: U256, timestamp: u64) -> Self {
        Self {
            hash,
            from: Address::zero(),
            to,
            amount,
            timestamp,
            direction: Direction::Minted,
            kind: EventKind::Mint,
            block_number: None,
            log_index: None,
        }
    }

    pub fn at_position(mut self, block_number: Option<u64>, log_index: Option<u64>) -> Self {
        self.block_number = block_number;
        self.log_index = log_index;
        self
    }

    /// Whether `viewer` may see this record without admin rights.
    pub fn involves(&self, viewer: &Address) -> bool {
        match self.kind {
            EventKind::Transfer => &self.from == viewer || &self.to == viewer,
            EventKind::Mint => &self.to == viewer,
        }
    }

    /// Identity used to drop duplicate observations of the same log.
    pub fn dedup_key(&self) -> Option<(H256, Option<u64>, EventKind)> {
        if self.hash.is_zero() {
            return None;
        }
        Some((self.hash, self.log_index, self.kind))
    }

    pub fn display_line(&self) -> String {
        let counterparty = match self.direction {
            Direction::Sent => format!("to {}", short_address(&self.to)),
            Direction::Received => format!("from {}", short_address(&self.from)),
            Direction::Minted => format!("to {}", short_address(&self.to)),
        };
        format!(
            "{:<8} {:>24} {} at {} ({})",
            self.direction,
            format_amount(self.amount),
            counterparty,
            format_timestamp(self.timestamp),
            hash_hex(&self.hash)
        )
    }
}

fn hash_hex(hash: &H256) -> String {
    format!("{:?}", hash)
}
