//! Derived per-group metrics. Everything here is pure.

use crate::fixed::Decimal;
use crate::models::{GroupWithValidators, ValidatorGroup};
use crate::source::Claim;

use std::collections::HashMap;

// Transparency weights, 1.0 when every profile field is filled in.
const NAME_WEIGHT: f64 = 0.15;
const WEBSITE_WEIGHT: f64 = 0.15;
const VERIFIED_DNS_WEIGHT: f64 = 0.25;
const EMAIL_WEIGHT: f64 = 0.1;
const GEOGRAPHIC_LOCATION_WEIGHT: f64 = 0.1;
const TWITTER_WEIGHT: f64 = 0.1;
const DISCORD_WEIGHT: f64 = 0.15;

// Performance weights. The service terms and headcount terms are described
// on `performance_score`.
const SLASHING_WEIGHT: f64 = 0.3;
const GROUP_SCORE_WEIGHT: f64 = 0.3;
const LIFETIME_SERVICE_WEIGHT: f64 = 0.1;
const SERVICE_SINCE_REGISTRATION_WEIGHT: f64 = 0.1;
const LOCKED_CELO_PERCENTILE_WEIGHT: f64 = 0.06;
const ELECTED_RATIO_WEIGHT: f64 = 0.06;
const ATTESTATION_WEIGHT: f64 = 0.06;
const ELECTED_HEADCOUNT_WEIGHT: f64 = 0.004;

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `target_yield * group_score`, multiplied at full precision.
pub fn estimated_apy(target_yield: &Decimal, group_score: f64) -> f64 {
    if group_score <= 0.0 {
        return 0.0;
    }
    match Decimal::from_f64(group_score) {
        Ok(score) => target_yield.mul(&score).to_f64(),
        Err(_) => 0.0,
    }
}

pub fn celo_per_validator(locked_celo: i64, validator_count: usize) -> f64 {
    if locked_celo == 0 || validator_count == 0 {
        return 0.0;
    }
    locked_celo as f64 / validator_count as f64
}

pub fn transparency_score(group: &ValidatorGroup) -> f64 {
    let mut score = 0.0;
    if !group.name.is_empty() {
        score += NAME_WEIGHT;
    }
    if !group.website_url.is_empty() {
        score += WEBSITE_WEIGHT;
        if group.verified_dns {
            score += VERIFIED_DNS_WEIGHT;
        }
    }
    if !group.email.is_empty() {
        score += EMAIL_WEIGHT;
    }
    if !group.geographic_location.is_empty() {
        score += GEOGRAPHIC_LOCATION_WEIGHT;
    }
    if !group.twitter_username.is_empty() {
        score += TWITTER_WEIGHT;
    }
    if !group.discord_tag.is_empty() {
        score += DISCORD_WEIGHT;
    }
    score
}

/// Website and its DNS verification from the last "domain" claim, if any.
pub fn website_from_claims(claims: &[Claim]) -> Option<(&str, bool)> {
    claims
        .iter()
        .rev()
        .find(|c| c.kind == "domain")
        .map(|c| (c.element.as_str(), c.verified))
}

/// Weighted sum of:
/// - slashing penalty score and group score
/// - epochs served over all elapsed epochs, and over the epochs elapsed since
///   registration (capped at 1)
/// - locked celo percentile, elected/total validator ratio, attestation score
/// - a small bonus per elected validator, uncapped
pub fn performance_score(entry: &GroupWithValidators, total_epochs: u64) -> f64 {
    let group = &entry.group;
    let served = group.epochs_served as f64;
    let elected = entry.elected_count() as f64;

    let mut score = group.slashing_penalty_score * SLASHING_WEIGHT
        + group.group_score * GROUP_SCORE_WEIGHT;

    if total_epochs > 0 {
        score += served / total_epochs as f64 * LIFETIME_SERVICE_WEIGHT;
    }
    let since_registration = total_epochs as f64 - group.epoch_registered_at as f64;
    if since_registration > 0.0 {
        score += (served / since_registration).min(1.0) * SERVICE_SINCE_REGISTRATION_WEIGHT;
    }

    score += group.locked_celo_percentile * LOCKED_CELO_PERCENTILE_WEIGHT;
    if !entry.validators.is_empty() {
        score += elected / entry.validators.len() as f64 * ELECTED_RATIO_WEIGHT;
    }
    score += group.attestation_score * ATTESTATION_WEIGHT;
    score + elected * ELECTED_HEADCOUNT_WEIGHT
}

/// Sets `locked_celo_percentile` and then `performance_score` on every group.
/// The percentile is relative to the largest locked celo per validator across
/// all of `groups`.
pub fn rank_groups(groups: &mut [GroupWithValidators], total_epochs: u64) {
    let per_validator: HashMap<i32, f64> = groups
        .iter()
        .map(|g| {
            (
                g.group.id,
                celo_per_validator(g.group.locked_celo, g.validators.len()),
            )
        })
        .collect();
    let max = per_validator.values().cloned().fold(0.0, f64::max);

    for entry in groups.iter_mut() {
        let value = per_validator.get(&entry.group.id).cloned().unwrap_or(0.0);
        entry.group.locked_celo_percentile = if max > 0.0 { value / max } else { 0.0 };
        entry.group.performance_score = performance_score(entry, total_epochs);
    }
}
