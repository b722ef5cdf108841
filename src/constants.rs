/// Application constants

// Network
pub const PRIMARY_CHAIN_ID: u64 = 1337;
pub const LEGACY_CHAIN_ID: u64 = 31337;
pub const ACCEPTED_CHAIN_IDS: [u64; 2] = [PRIMARY_CHAIN_ID, LEGACY_CHAIN_ID];
pub const LOCAL_RPC_URL: &str = "http://127.0.0.1:8545/";
pub const LOCAL_CHAIN_NAME: &str = "Hardhat Local";

// Token
pub const TOKEN_NAME: &str = "ESLSCA Coin";
pub const TOKEN_SYMBOL: &str = "ESLSCA";
pub const TOKEN_DECIMALS: u32 = 18;

// Deployment defaults (Hardhat first deployment from the first dev account)
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const DEFAULT_OWNER_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const DEFAULT_TOTAL_SUPPLY: &str = "1000000000000000000000000"; // 1M * 10^18
pub const DEFAULT_NETWORK: &str = "localhost";

// Function selectors
pub const SELECTOR_BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
pub const SELECTOR_TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
pub const SELECTOR_MINT: [u8; 4] = [0x40, 0xc1, 0x0f, 0x19];

// Event signatures
pub const TRANSFER_EXECUTED_SIGNATURE: &str = "TransferExecuted(address,address,uint256,uint256)";
pub const TOKENS_MINTED_SIGNATURE: &str = "TokensMinted(address,uint256,uint256)";
pub const ERC20_TRANSFER_SIGNATURE: &str = "Transfer(address,address,uint256)";

// Raw transfer fallback fees
pub const FALLBACK_GAS_LIMIT: u64 = 300_000;
pub const FALLBACK_MAX_FEE_PER_GAS_WEI: u64 = 50_000_000_000; // 50 gwei
pub const FALLBACK_MAX_PRIORITY_FEE_PER_GAS_WEI: u64 = 1_500_000_000; // 1.5 gwei

// Provider error codes
pub const RPC_USER_REJECTED: i64 = 4001;
pub const RPC_UNRECOGNIZED_CHAIN: i64 = 4902;
pub const RPC_METHOD_NOT_FOUND: i64 = -32601;

// Polling
pub const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_RECEIPT_POLL_ATTEMPTS: u32 = 240;
pub const DEFAULT_WATCH_POLL_INTERVAL_MS: u64 = 2000;

// User-facing messages
pub const MSG_CONNECTED: &str = "Wallet connected successfully!";
pub const MSG_TOKENS_SENT: &str = "Tokens sent successfully!";
pub const MSG_TOKENS_MINTED: &str = "Tokens minted successfully!";
pub const MSG_HISTORY_FAILED: &str = "Failed to load transaction history. Please try again later.";
pub const MSG_MINT_EXHAUSTED: &str = "All mint methods failed. Make sure you are the contract owner.";
pub const MSG_REDEPLOY_HINT: &str = "Restart the local node with \"npx hardhat node\" and redeploy with \"npx hardhat run scripts/deploy.js --network localhost\", then retry.";
pub const MSG_FILL_ALL_FIELDS: &str = "Please fill in all fields";
pub const MSG_AMOUNT_NOT_POSITIVE: &str = "Amount must be greater than 0";
pub const MSG_INSUFFICIENT_BALANCE: &str = "Insufficient balance";
pub const MSG_INVALID_RECIPIENT: &str = "Invalid recipient address. Please check and try again.";
pub const MSG_TRANSFER_FAILED: &str = "Transfer failed. Please try again later or contact support.";
pub const MSG_ADDRESS_MISMATCH: &str = "Contract address mismatch";
pub const MSG_NOT_CONNECTED: &str = "Wallet not connected";
