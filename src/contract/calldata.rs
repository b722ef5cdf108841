//! Hand-encoded calldata for the low-level fallback paths: a fixed 4-byte
//! selector followed by each argument left padded to a 32-byte word.

use crate::constants::{SELECTOR_BALANCE_OF, SELECTOR_MINT, SELECTOR_TRANSFER};
use ethers::types::{Address, U256};

pub const WORD: usize = 32;

pub fn pad_address(address: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 20..].copy_from_slice(address.as_bytes());
    word
}

pub fn pad_uint(value: U256) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    value.to_big_endian(&mut word);
    word
}

fn with_selector(selector: [u8; 4], words: &[[u8; WORD]]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + WORD * words.len());
    data.extend_from_slice(&selector);
    for word in words {
        data.extend_from_slice(word);
    }
    data
}

pub fn balance_of(owner: &Address) -> Vec<u8> {
    with_selector(SELECTOR_BALANCE_OF, &[pad_address(owner)])
}

pub fn transfer(to: &Address, amount: U256) -> Vec<u8> {
    with_selector(SELECTOR_TRANSFER, &[pad_address(to), pad_uint(amount)])
}

pub fn mint(to: &Address, amount: U256) -> Vec<u8> {
    with_selector(SELECTOR_MINT, &[pad_address(to), pad_uint(amount)])
}

/// Interpret a raw call result as a single uint256 word.
pub fn decode_uint_word(data: &[u8]) -> Option<U256> {
    if data.len() < WORD {
        return None;
    }
    Some(U256::from_big_endian(&data[..WORD]))
}
