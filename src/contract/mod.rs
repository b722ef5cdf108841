pub mod abi;
pub mod binding;
pub mod calldata;

pub use binding::{ContractBinding, ContractInfo, Route, TxOverrides};
