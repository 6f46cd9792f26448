pub mod abi;
pub mod client;
pub mod rpc;

pub use client::{LedgerClient, RawLedgerError, RegistrationEvent, TxReceipt, WriteRequest};
pub use rpc::JsonRpcLedger;
