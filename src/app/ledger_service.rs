//! The Ledger Service.
//!
//! This is what routing code talks to. It is responsible for:
//! 1.  Reading batches, manufacturers and aggregate stats as canonical records.
//! 2.  Enumerating manufacturers through the tiered resolver.
//! 3.  Preparing unsigned transactions, or submitting them directly when
//!     dev writes are enabled.
//!
//! Built once at startup and shared; it holds no mutable state.

use std::sync::Arc;
use tracing::debug;

use crate::app::transactions::{self, DirectWriter, TransactionDescriptor, WriteAction, WriteReceipt};
use crate::domain::enumeration::{ManufacturerEnumeration, ManufacturerResolver};
use crate::domain::errors::ClassifiedError;
use crate::domain::reads;
use crate::domain::records::{
    BatchRecord, BatchVerification, ContractStats, ExpiredScanReport, ManufacturerRecord,
};
use crate::infra::config::{LedgerConfig, WriteSettings};
use crate::infra::ledger::LedgerClient;

/// The subset of [`LedgerConfig`] the service itself needs.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub contract_address: String,
    pub event_scan_window: u64,
    pub explorer_base_url: String,
    pub writes: WriteSettings,
}

impl From<&LedgerConfig> for ServiceConfig {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            contract_address: config.contract_address.clone(),
            event_scan_window: config.event_scan_window,
            explorer_base_url: config.explorer_base_url.clone(),
            writes: config.writes.clone(),
        }
    }
}

pub struct LedgerService<L: LedgerClient + ?Sized> {
    ledger: Arc<L>,
    config: ServiceConfig,
}

impl<L: LedgerClient + ?Sized> Clone for LedgerService<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            config: self.config.clone(),
        }
    }
}

impl<L: LedgerClient + ?Sized> LedgerService<L> {
    pub fn new(ledger: Arc<L>, config: ServiceConfig) -> Self {
        Self { ledger, config }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn writes_enabled(&self) -> bool {
        self.config.writes.enabled
    }

    pub async fn read_manufacturer(&self, address: &str) -> Result<ManufacturerRecord, ClassifiedError> {
        reads::manufacturer(self.ledger.as_ref(), address).await
    }

    pub async fn read_batch(&self, batch_id: &str) -> Result<BatchRecord, ClassifiedError> {
        reads::batch(self.ledger.as_ref(), batch_id).await
    }

    /// Batch record with the contract's validity and expiry verdicts.
    pub async fn verify_batch(&self, batch_id: &str) -> Result<BatchVerification, ClassifiedError> {
        reads::batch_verification(self.ledger.as_ref(), batch_id).await
    }

    pub async fn read_contract_stats(&self) -> Result<ContractStats, ClassifiedError> {
        reads::contract_stats(self.ledger.as_ref()).await
    }

    pub async fn batches_by_manufacturer(&self, address: &str) -> Result<Vec<String>, ClassifiedError> {
        reads::batches_by_manufacturer(self.ledger.as_ref(), address).await
    }

    pub async fn expired_scan_reports(&self) -> Result<Vec<ExpiredScanReport>, ClassifiedError> {
        reads::expired_scan_reports(self.ledger.as_ref()).await
    }

    pub async fn enumerate_manufacturers(&self) -> Result<Vec<ManufacturerRecord>, ClassifiedError> {
        Ok(self.enumerate_manufacturers_detailed().await?.manufacturers)
    }

    /// Same as [`Self::enumerate_manufacturers`] but also reports which tier answered.
    pub async fn enumerate_manufacturers_detailed(
        &self,
    ) -> Result<ManufacturerEnumeration, ClassifiedError> {
        let resolver = ManufacturerResolver::new(
            self.ledger.as_ref(),
            self.config.event_scan_window,
            &self.config.contract_address,
        );
        let enumeration = resolver.resolve().await?;
        debug!(
            source = ?enumeration.source,
            count = enumeration.manufacturers.len(),
            "manufacturers enumerated"
        );
        Ok(enumeration)
    }

    pub fn prepare(&self, action: &WriteAction) -> TransactionDescriptor {
        transactions::prepare(&self.config.contract_address, action)
    }

    /// Direct write under the service account. Fails with `WritesDisabled`
    /// without any ledger call when the flag is off.
    pub async fn dev_write(&self, action: &WriteAction) -> Result<WriteReceipt, ClassifiedError> {
        DirectWriter::new(
            self.ledger.as_ref(),
            &self.config.writes,
            &self.config.explorer_base_url,
        )
        .execute(action)
        .await
    }
}
