use super::EpochIndexer;
use crate::epochs;
use crate::models::{NewEpoch, ValidatorGroup};
use crate::source::{ChainData, Explorer};
use crate::store::Store;

use anyhow::Context;
use log::{info, warn};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, PartialEq)]
enum Backlog {
    Epochs,
    // the last indexed epoch is the previous one, or the current one once an
    // earlier run in this epoch has synced it
    CaughtUp,
    Ahead,
}

impl Backlog {
    fn between(from: u64, current_epoch: u64) -> Self {
        if from < current_epoch {
            Backlog::Epochs
        } else if from <= current_epoch + 1 {
            Backlog::CaughtUp
        } else {
            Backlog::Ahead
        }
    }
}

impl<C: ChainData, E: Explorer, S: Store> EpochIndexer<C, E, S> {
    /// Indexes every epoch between the last one saved and `current_epoch`
    /// (exclusive), crediting each group that had a validator elected with
    /// one more epoch served. Returns the number of epochs indexed.
    ///
    /// Any error stops the loop. Nothing is saved for the failing epoch
    /// before its elected set has been fetched, so running again picks up
    /// where this left off.
    pub(super) async fn catch_up(&self, current_epoch: u64) -> anyhow::Result<u64> {
        let last_indexed = self
            .store
            .last_epoch()
            .context("Error reading the last indexed epoch")?;
        let from = match last_indexed {
            Some(epoch) => u64::try_from(epoch.number).unwrap_or(0) + 1,
            None => 1,
        };
        info!("Epoch to index from: #{}", from);

        match Backlog::between(from, current_epoch) {
            Backlog::CaughtUp => {
                info!("Already caught up to epoch #{}. Nothing to backfill.", current_epoch);
                return Ok(0);
            }
            Backlog::Ahead => {
                warn!(
                    "Current epoch #{} is behind what has already been indexed (#{})",
                    current_epoch,
                    from - 1
                );
                return Ok(0);
            }
            Backlog::Epochs => {}
        }
        info!(
            "There are new epochs to index. Current epoch = #{}. Last indexed = #{}.",
            current_epoch,
            from - 1
        );

        let mut groups: HashMap<String, ValidatorGroup> = self
            .store
            .load_groups()
            .context("Error loading validator groups")?
            .into_iter()
            .map(|g| (g.address.clone(), g))
            .collect();

        for epoch in from..current_epoch {
            let bounds = epochs::bounds(epoch);
            let elected = self
                .explorer
                .elected_at(epochs::election_sample_block(epoch))
                .await
                .with_context(|| format!("Error fetching elected validators for epoch #{}", epoch))?;

            self.store
                .insert_epoch(&NewEpoch::new(epoch))
                .with_context(|| format!("Error saving epoch #{}", epoch))?;

            // a group serves the epoch once, however many of its validators were elected
            let served: BTreeSet<&str> = elected
                .iter()
                .filter_map(|v| v.group_address.as_deref())
                .collect();
            for address in served {
                let group = match groups.get_mut(address) {
                    Some(group) => group,
                    None => {
                        warn!(
                            "Validator group {} was elected in epoch #{} but isn't indexed",
                            address, epoch
                        );
                        continue;
                    }
                };
                group.epochs_served += 1;
                self.store.update_group(group).with_context(|| {
                    format!(
                        "Error crediting validator group {} for epoch #{}",
                        address, epoch
                    )
                })?;
            }

            info!(
                "Successfully indexed epoch #{}, starting at #{} ending at #{}",
                epoch, bounds.start_block, bounds.end_block
            );
            std::thread::sleep(self.options.catch_up_delay);
        }
        Ok(current_epoch - from)
    }
}
