mod catch_up;
mod current;
mod reconcile;

#[cfg(test)]
mod fake;

use crate::source::{ChainData, Explorer};
use crate::store::Store;

use anyhow::{anyhow, Context};
use log::info;
use std::time::Duration;

pub use reconcile::Reconciled;

#[derive(Clone, Debug)]
pub struct Options {
    /// Pause between catch-up iterations, to go easy on the explorer.
    pub catch_up_delay: Duration,
}

/// One indexing pass: discover new groups and validators, fill in missing
/// epoch history, then refresh the current epoch's stats and scores.
pub struct EpochIndexer<C, E, S> {
    options: Options,
    chain: C,
    explorer: E,
    store: S,
}

impl<C: ChainData, E: Explorer, S: Store> EpochIndexer<C, E, S> {
    pub fn new(options: &Options, chain: C, explorer: E, store: S) -> Self {
        Self {
            options: options.clone(),
            chain,
            explorer,
            store,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        info!("Start indexing...");
        self.reconcile_entities().await?;

        let current_epoch = self
            .chain
            .current_epoch()
            .await
            .context("Error fetching current epoch")?;
        if current_epoch < 1 {
            return Err(anyhow!(
                "Chain data source reported current epoch #{}",
                current_epoch
            ));
        }
        info!("Current epoch: #{}", current_epoch);

        self.catch_up(current_epoch).await?;
        self.sync_current_epoch(current_epoch).await?;
        info!("Finished indexing epoch #{}", current_epoch);
        Ok(())
    }
}
