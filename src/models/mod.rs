// src/models/mod.rs
pub mod deployment;
pub mod session;
pub mod transaction;

pub use deployment::DeploymentDescriptor;
pub use session::SessionSnapshot;
pub use transaction::{Direction, EventKind, TransactionRecord};
