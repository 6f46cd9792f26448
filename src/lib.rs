pub mod app;
pub mod domain;
pub mod infra;

// Convenience re-exports (keeps call-sites clean)
pub use app::ledger_service::{LedgerService, ServiceConfig};
pub use app::transactions::{TransactionDescriptor, WriteAction, WriteReceipt};
pub use domain::enumeration::{EnumerationSource, ManufacturerEnumeration};
pub use domain::errors::{classify, ClassifiedError, ErrorCategory};
pub use domain::records::{
    BatchRecord, BatchVerification, ContractStats, ExpiredScanReport, ManufacturerRecord,
    ManufacturerStatus,
};
pub use infra::config::LedgerConfig;
pub use infra::ledger::{JsonRpcLedger, LedgerClient, RawLedgerError};
