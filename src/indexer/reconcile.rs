use super::EpochIndexer;
use crate::models::{to_i64, NewValidator, NewValidatorGroup};
use crate::source::{ChainData, Explorer};
use crate::store::Store;

use anyhow::Context;
use log::info;
use std::collections::HashSet;

/// Rows created by one reconciliation pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reconciled {
    pub groups: usize,
    pub validators: usize,
}

impl<C: ChainData, E: Explorer, S: Store> EpochIndexer<C, E, S> {
    /// Inserts a row for every validator group in the explorer's roster that
    /// we haven't seen before, along with its validators. Existing rows are
    /// never touched.
    pub(super) async fn reconcile_entities(&self) -> anyhow::Result<Reconciled> {
        let roster = self
            .explorer
            .basic_roster()
            .await
            .context("Error fetching validator groups")?;
        info!("Fetched {} validator groups", roster.len());

        // addresses already looked up during this pass
        let mut seen_groups = HashSet::new();
        let mut seen_validators = HashSet::new();
        let mut created = Reconciled::default();

        for remote in roster.iter() {
            if !seen_groups.insert(remote.address.as_str()) {
                continue;
            }
            let existing = self
                .store
                .find_group(&remote.address)
                .with_context(|| format!("Error looking up validator group {}", remote.address))?;
            if existing.is_some() {
                continue;
            }

            let registered = self
                .chain
                .epoch_registered(&remote.address)
                .await
                .with_context(|| {
                    format!(
                        "Error fetching the registration epoch of validator group {}",
                        remote.address
                    )
                })?;
            let group = self
                .store
                .insert_group(&NewValidatorGroup {
                    address: remote.address.clone(),
                    name: remote.name.clone(),
                    epoch_registered_at: to_i64(registered.epoch),
                    epochs_served: 0,
                })
                .with_context(|| format!("Error inserting validator group {}", remote.address))?;
            info!(
                "Added validator group {}({}) registered at epoch #{}",
                group.name, group.address, registered.epoch
            );
            created.groups += 1;

            for affiliate in remote.affiliates.iter() {
                if !seen_validators.insert(affiliate.address.as_str()) {
                    continue;
                }
                let existing = self
                    .store
                    .find_validator(&affiliate.address)
                    .with_context(|| format!("Error looking up validator {}", affiliate.address))?;
                if existing.is_some() {
                    continue;
                }
                self.store
                    .insert_validator(&NewValidator {
                        address: affiliate.address.clone(),
                        name: affiliate.name.clone(),
                        validator_group_id: group.id,
                    })
                    .with_context(|| format!("Error inserting validator {}", affiliate.address))?;
                created.validators += 1;
            }
        }

        info!(
            "Finished reconciling validator groups: {} new groups, {} new validators",
            created.groups, created.validators
        );
        Ok(created)
    }
}
