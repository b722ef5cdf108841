use crate::error::{Result, WalletError};
use ethers::abi::{parse_abi, Abi};

/// Human-readable interface of the ESLSCA token.
pub const TOKEN_ABI: &[&str] = &[
    "function name() view returns (string)",
    "function symbol() view returns (string)",
    "function decimals() view returns (uint8)",
    "function totalSupply() view returns (uint256)",
    "function owner() view returns (address)",
    "function balanceOf(address account) view returns (uint256)",
    "function getBalance(address account) view returns (uint256)",
    "function getContractInfo() view returns (string, string, uint256, uint8, address)",
    "function transfer(address to, uint256 amount) returns (bool)",
    "function mint(address to, uint256 amount)",
    "event Transfer(address indexed from, address indexed to, uint256 value)",
    "event TransferExecuted(address indexed from, address indexed to, uint256 amount, uint256 timestamp)",
    "event TokensMinted(address indexed to, uint256 amount, uint256 timestamp)",
];

pub fn token_abi() -> Result<Abi> {
    parse_abi(TOKEN_ABI).map_err(|e| WalletError::Decode(format!("Invalid token ABI: {}", e)))
}
