use super::EpochIndexer;
use crate::epochs;
use crate::fixed::{self, Decimal};
use crate::models::{
    to_i64, Epoch, GroupWithValidators, NewEpoch, NewValidatorGroupStats, NewValidatorStats,
};
use crate::score;
use crate::source::{ChainData, Explorer, GroupDetail};
use crate::store::Store;

use anyhow::Context;
use log::{error, info, warn};
use std::collections::HashMap;

struct CurrentEpoch<'a> {
    row: &'a Epoch,
    number: u64,
    // false if an earlier run already indexed this epoch
    first_visit: bool,
    target_yield: &'a Decimal,
}

impl<C: ChainData, E: Explorer, S: Store> EpochIndexer<C, E, S> {
    /// Snapshots every group's and validator's stats for `current_epoch`,
    /// refreshes their live fields and recomputes scores and rankings.
    ///
    /// Failing to fetch anything stops the run. Failing to save one group is
    /// logged and that group is skipped.
    pub(super) async fn sync_current_epoch(&self, current_epoch: u64) -> anyhow::Result<()> {
        info!("Indexing the current epoch #{}", current_epoch);
        let (row, first_visit) = match self
            .store
            .find_epoch(current_epoch)
            .with_context(|| format!("Error looking up epoch #{}", current_epoch))?
        {
            Some(row) => (row, false),
            None => {
                let row = self
                    .store
                    .insert_epoch(&NewEpoch::new(current_epoch))
                    .with_context(|| format!("Error saving epoch #{}", current_epoch))?;
                (row, true)
            }
        };

        let target_yield = fixed::from_fixidity_decimal(
            &self
                .chain
                .target_apy()
                .await
                .context("Error fetching target APY")?,
        );
        info!("Target APY: {}", target_yield.to_f64());

        let details = self
            .explorer
            .full_detail()
            .await
            .context("Error fetching validator group details")?;
        let mut groups = self
            .store
            .load_groups_with_validators()
            .context("Error loading validator groups")?;
        let index: HashMap<String, usize> = groups
            .iter()
            .enumerate()
            .map(|(i, g)| (g.group.address.clone(), i))
            .collect();

        let epoch = CurrentEpoch {
            row: &row,
            number: current_epoch,
            first_visit,
            target_yield: &target_yield,
        };
        for detail in details.iter() {
            let slot = match index.get(&detail.address) {
                Some(&slot) => slot,
                None => {
                    warn!(
                        "Validator group {} isn't indexed yet. Skipping...",
                        detail.address
                    );
                    continue;
                }
            };
            let slashing = self
                .chain
                .slashing_multiplier(&detail.address)
                .await
                .with_context(|| {
                    format!(
                        "Error fetching slashing multiplier of validator group {}",
                        detail.address
                    )
                })?;

            match self.sync_group(&groups[slot], detail, &slashing, &epoch) {
                Ok(updated) => groups[slot] = updated,
                Err(e) => error!("Error updating validator group {}: {:#}", detail.address, e),
            }
        }

        score::rank_groups(&mut groups, current_epoch);
        for entry in groups.iter() {
            if let Err(e) = self.store.update_group(&entry.group) {
                error!(
                    "Error saving ranking of validator group {}: {}",
                    entry.group.address, e
                );
            }
        }
        info!("Ranked {} validator groups", groups.len());
        Ok(())
    }

    /// Saves this epoch's snapshots for one group and returns the group with
    /// its live fields brought up to date.
    fn sync_group(
        &self,
        entry: &GroupWithValidators,
        detail: &GroupDetail,
        slashing: &str,
        epoch: &CurrentEpoch<'_>,
    ) -> anyhow::Result<GroupWithValidators> {
        let mut updated = entry.clone();
        info!("{}({})", updated.group.name, updated.group.address);

        let mut elected_scores = Vec::new();
        let mut attestation_ratios = Vec::new();
        for affiliate in detail.affiliates.iter() {
            let validator = match updated
                .validators
                .iter_mut()
                .find(|v| v.address == affiliate.address)
            {
                Some(v) => v,
                None => {
                    warn!(
                        "Validator {} isn't indexed under group {}. Skipping...",
                        affiliate.address, detail.address
                    );
                    continue;
                }
            };

            let score = fixed::from_fixidity(&affiliate.score);
            self.store
                .insert_validator_stats(&NewValidatorStats {
                    validator_id: validator.id,
                    epoch_id: epoch.row.id,
                    attestations_requested: to_i64(affiliate.attestations_requested),
                    attestations_fulfilled: to_i64(affiliate.attestations_fulfilled),
                    last_elected: to_i64(affiliate.last_elected),
                    score,
                })
                .with_context(|| format!("Error saving stats of validator {}", validator.address))?;

            validator.currently_elected =
                epochs::block_to_epoch(affiliate.last_elected) == epoch.number;
            if validator.currently_elected {
                elected_scores.push(score);
            }
            if affiliate.attestations_fulfilled > 0 && affiliate.attestations_requested > 0 {
                attestation_ratios.push(
                    affiliate.attestations_fulfilled as f64
                        / affiliate.attestations_requested as f64,
                );
            }

            self.store
                .update_validator(validator)
                .with_context(|| format!("Error updating validator {}", validator.address))?;
        }

        let group = &mut updated.group;
        group.currently_elected = !elected_scores.is_empty();
        if group.currently_elected && epoch.first_visit {
            group.epochs_served += 1;
        }
        if let Some((website, verified)) = score::website_from_claims(&detail.claims) {
            group.website_url = website.to_string();
            group.verified_dns = verified;
        }

        let locked_celo = fixed::from_wei(&detail.locked_gold) as i64;
        let votes = fixed::from_wei(&detail.votes) as i64;
        let voting_cap = votes.saturating_add(fixed::from_wei(&detail.receivable_votes) as i64);
        let group_share = fixed::from_fixidity(&detail.commission);
        let slashing_score = fixed::from_fixidity(slashing);
        let group_score = score::mean(&elected_scores);
        let attestation_score = score::mean(&attestation_ratios);
        let estimated_apy = score::estimated_apy(epoch.target_yield, group_score);

        group.locked_celo = locked_celo;
        group.received_votes = votes;
        group.available_votes = voting_cap - votes;
        group.group_share = group_share;
        group.slashing_penalty_score = slashing_score;
        group.group_score = group_score;
        group.attestation_score = attestation_score;
        group.estimated_apy = estimated_apy;
        group.transparency_score = score::transparency_score(group);

        self.store
            .insert_group_stats(&NewValidatorGroupStats {
                validator_group_id: group.id,
                epoch_id: epoch.row.id,
                locked_celo,
                group_share,
                votes,
                voting_cap,
                attestation_percentage: attestation_score,
                slashing_score,
                estimated_apy,
            })
            .context("Error saving group stats")?;
        self.store
            .update_group(group)
            .context("Error saving group")?;
        Ok(updated)
    }
}
