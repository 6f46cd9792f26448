//! Canonical records built from raw contract reads.
//!
//! Every record kind has its own explicit extraction function; each attribute
//! is looked up by position first and by name second (see [`extract::field`]).
//! A record is either fully populated or the read fails.

pub mod batch;
pub mod extract;
pub mod manufacturer;
pub mod stats;

pub use batch::{BatchRecord, BatchVerification, ExpiredScanReport};
pub use manufacturer::{ManufacturerRecord, ManufacturerStatus};
pub use stats::ContractStats;
