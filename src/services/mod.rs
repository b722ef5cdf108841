// All service modules
pub mod balance_resolver;
pub mod session_manager;
pub mod transaction_history;
pub mod transaction_submitter;

// Re-export for convenience
pub use balance_resolver::{BalanceResolver, ResolvedBalance};
pub use session_manager::{SessionManager, Transition};
pub use transaction_history::{HistoryOutcome, TransactionHistoryService};
pub use transaction_submitter::{Submitted, TransactionSubmitter};
