//! Transaction receipts as returned by `eth_getTransactionReceipt`

pub mod types;

pub use types::{Log, RpcLog, RpcReceipt, TransactionReceipt, TransactionStatus};
