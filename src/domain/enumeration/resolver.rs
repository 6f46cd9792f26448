//! Lists every registered manufacturer even when the deployed contract has no
//! enumeration primitive.
//!
//! Tiers are tried in order and each reports its own `Result`:
//! 1. `getAllManufacturerAddresses()` + hydration
//! 2. `ManufacturerRegistered` event scan over a trailing block window + hydration
//! 3. a single `enumeration_limited` placeholder carrying the total from stats
//!
//! Only a tier-level error moves on to the next tier. An empty list from a
//! working tier is a valid answer.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::domain::errors::{classify, ClassifiedError};
use crate::domain::reads;
use crate::domain::records::ManufacturerRecord;
use crate::infra::ledger::LedgerClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumerationSource {
    Direct,
    EventScan,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturerEnumeration {
    pub source: EnumerationSource,
    pub manufacturers: Vec<ManufacturerRecord>,
}

pub struct ManufacturerResolver<'a, L: LedgerClient + ?Sized> {
    ledger: &'a L,
    event_scan_window: u64,
    contract_address: &'a str,
}

impl<'a, L: LedgerClient + ?Sized> ManufacturerResolver<'a, L> {
    pub fn new(ledger: &'a L, event_scan_window: u64, contract_address: &'a str) -> Self {
        Self {
            ledger,
            event_scan_window,
            contract_address,
        }
    }

    /// Fails only when all three tiers fail; the error is the one from the last tier.
    pub async fn resolve(&self) -> Result<ManufacturerEnumeration, ClassifiedError> {
        match self.direct().await {
            Ok(manufacturers) => {
                return Ok(ManufacturerEnumeration {
                    source: EnumerationSource::Direct,
                    manufacturers,
                })
            }
            Err(e) => warn!(
                category = ?e.category,
                error = %e.message,
                "direct manufacturer enumeration failed, falling back to event scan"
            ),
        }

        match self.event_scan().await {
            Ok(manufacturers) => {
                return Ok(ManufacturerEnumeration {
                    source: EnumerationSource::EventScan,
                    manufacturers,
                })
            }
            Err(e) => warn!(
                category = ?e.category,
                error = %e.message,
                "event-scan enumeration failed, falling back to summary"
            ),
        }

        let stats = reads::contract_stats(self.ledger).await.map_err(|e| {
            warn!(error = %e.message, "summary fallback failed; manufacturers cannot be enumerated");
            e
        })?;
        info!(
            total = stats.total_manufacturers,
            "returning enumeration-limited manufacturer summary"
        );
        Ok(ManufacturerEnumeration {
            source: EnumerationSource::Summary,
            manufacturers: vec![ManufacturerRecord::enumeration_limited(
                stats.total_manufacturers,
                self.contract_address,
            )],
        })
    }

    async fn direct(&self) -> Result<Vec<ManufacturerRecord>, ClassifiedError> {
        let addresses = reads::all_manufacturer_addresses(self.ledger).await?;
        debug!(count = addresses.len(), "ledger listed manufacturer addresses");
        Ok(self.hydrate(addresses).await)
    }

    async fn event_scan(&self) -> Result<Vec<ManufacturerRecord>, ClassifiedError> {
        let latest = self.ledger.latest_block().await.map_err(|e| classify(&e))?;
        let from_block = latest.saturating_sub(self.event_scan_window);
        let events = self
            .ledger
            .registration_events(from_block, latest)
            .await
            .map_err(|e| classify(&e))?;

        let mut seen = HashSet::new();
        let addresses: Vec<String> = events
            .into_iter()
            .map(|e| e.manufacturer)
            .filter(|a| seen.insert(a.to_lowercase()))
            .collect();
        debug!(
            from_block,
            to_block = latest,
            count = addresses.len(),
            "registration events scanned"
        );
        Ok(self.hydrate(addresses).await)
    }

    /// Hydrates every address concurrently. A failed address is logged and
    /// dropped without affecting the others. Result is newest registration first.
    async fn hydrate(&self, addresses: Vec<String>) -> Vec<ManufacturerRecord> {
        let results = join_all(
            addresses
                .iter()
                .map(|address| reads::manufacturer(self.ledger, address)),
        )
        .await;

        let mut records: Vec<ManufacturerRecord> = addresses
            .iter()
            .zip(results)
            .filter_map(|(address, result)| match result {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(
                        address = %address,
                        category = ?e.category,
                        error = %e.message,
                        "skipping manufacturer that failed to hydrate"
                    );
                    None
                }
            })
            .collect();

        records.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        records
    }
}
