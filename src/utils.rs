// Utility modules

use crate::{
    constants::{MSG_AMOUNT_NOT_POSITIVE, TOKEN_DECIMALS},
    error::{Result, WalletError},
};
use chrono::{DateTime, TimeZone, Utc};
use ethers::types::{Address, U256};
use ethers::utils::{format_units, parse_units, to_checksum, ParseUnits};
use std::str::FromStr;

/// Parse a `0x`-prefixed, 20-byte hex address.
pub fn parse_address(value: &str) -> Result<Address> {
    let trimmed = value.trim();
    let Some(body) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    else {
        return Err(WalletError::Validation(format!(
            "Invalid address (missing 0x prefix): {}",
            trimmed
        )));
    };
    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(WalletError::Validation(format!(
            "Invalid address: {}",
            trimmed
        )));
    }
    Address::from_str(body)
        .map_err(|e| WalletError::Validation(format!("Invalid address {}: {}", trimmed, e)))
}

/// EIP-55 checksum rendering.
pub fn checksum(address: &Address) -> String {
    to_checksum(address, None)
}

/// `0x1234...abcd`
pub fn short_address(address: &Address) -> String {
    let full = checksum(address);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Parse a decimal token amount into its 18-decimal integer representation.
pub fn parse_token_amount(input: &str) -> Result<U256> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(WalletError::Validation("Amount is required".to_string()));
    }
    match parse_units(trimmed, TOKEN_DECIMALS) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(_)) => Err(WalletError::Validation(
            MSG_AMOUNT_NOT_POSITIVE.to_string(),
        )),
        Err(e) => Err(WalletError::Validation(format!(
            "Invalid amount {}: {}",
            trimmed, e
        ))),
    }
}

/// Integer part of a decimal amount, unscaled.
pub fn parse_whole_tokens(input: &str) -> Result<U256> {
    let trimmed = input.trim();
    let integer_part = trimmed.split('.').next().unwrap_or_default();
    let integer_part = if integer_part.is_empty() { "0" } else { integer_part };
    U256::from_dec_str(integer_part)
        .map_err(|e| WalletError::Validation(format!("Invalid amount {}: {}", trimmed, e)))
}

/// Render a raw amount divided by 10^18, keeping at least one fractional digit.
pub fn format_amount(amount: U256) -> String {
    let Ok(rendered) = format_units(amount, TOKEN_DECIMALS) else {
        return amount.to_string();
    };
    match rendered.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => format!("{}.0", rendered),
    }
}

pub fn format_timestamp(timestamp: u64) -> String {
    if timestamp == 0 {
        return "Unknown".to_string();
    }
    match Utc.timestamp_opt(timestamp as i64, 0).single() {
        Some(time) => time.to_rfc3339(),
        None => "Unknown".to_string(),
    }
}

pub fn now_unix() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Parse an RFC 3339 time (as written by the deploy script) into Unix seconds.
pub fn parse_rfc3339_secs(value: &str) -> Option<u64> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|time| time.timestamp().max(0) as u64)
}

/// Parse an RPC hex quantity such as `0x539`.
pub fn parse_hex_u64(value: &str) -> Option<u64> {
    let trimmed = value.trim();
    let body = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if body.is_empty() {
        return None;
    }
    u64::from_str_radix(body, 16).ok()
}
