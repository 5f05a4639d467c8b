use crate::schema::{epochs, validator_group_stats, validator_groups, validator_stats, validators};

use chrono::NaiveDateTime;

pub(crate) fn to_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

#[derive(Clone, Debug, Identifiable, Queryable)]
pub struct Epoch {
    pub id: i32,
    pub number: i64,
    pub start_block: i64,
    pub end_block: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "epochs"]
pub struct NewEpoch {
    pub number: i64,
    pub start_block: i64,
    pub end_block: i64,
}

impl NewEpoch {
    pub(crate) fn new(number: u64) -> Self {
        let bounds = crate::epochs::bounds(number);
        Self {
            number: to_i64(number),
            start_block: to_i64(bounds.start_block),
            end_block: to_i64(bounds.end_block),
        }
    }
}

#[derive(Clone, Debug, Identifiable, Queryable, AsChangeset)]
pub struct ValidatorGroup {
    pub id: i32,
    pub address: String,
    pub name: String,
    pub email: String,
    pub geographic_location: String,
    pub twitter_username: String,
    pub discord_tag: String,
    pub website_url: String,
    pub verified_dns: bool,
    pub epoch_registered_at: i64,
    pub epochs_served: i64,
    pub currently_elected: bool,
    pub locked_celo: i64,
    pub received_votes: i64,
    pub available_votes: i64,
    pub group_share: f64,
    pub group_score: f64,
    pub attestation_score: f64,
    pub slashing_penalty_score: f64,
    pub estimated_apy: f64,
    pub transparency_score: f64,
    pub locked_celo_percentile: f64,
    pub performance_score: f64,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "validator_groups"]
pub struct NewValidatorGroup {
    pub address: String,
    pub name: String,
    pub epoch_registered_at: i64,
    pub epochs_served: i64,
}

#[derive(Clone, Debug, Identifiable, Queryable, Associations, AsChangeset)]
#[belongs_to(ValidatorGroup)]
pub struct Validator {
    pub id: i32,
    pub address: String,
    pub name: String,
    pub validator_group_id: i32,
    pub currently_elected: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "validators"]
pub struct NewValidator {
    pub address: String,
    pub name: String,
    pub validator_group_id: i32,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "validator_stats"]
pub struct NewValidatorStats {
    pub validator_id: i32,
    pub epoch_id: i32,
    pub attestations_requested: i64,
    pub attestations_fulfilled: i64,
    pub last_elected: i64,
    pub score: f64,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "validator_group_stats"]
pub struct NewValidatorGroupStats {
    pub validator_group_id: i32,
    pub epoch_id: i32,
    pub locked_celo: i64,
    pub group_share: f64,
    pub votes: i64,
    pub voting_cap: i64,
    pub attestation_percentage: f64,
    pub slashing_score: f64,
    pub estimated_apy: f64,
}

/// A group row together with the validator rows that reference it.
#[derive(Clone, Debug)]
pub struct GroupWithValidators {
    pub group: ValidatorGroup,
    pub validators: Vec<Validator>,
}

impl GroupWithValidators {
    pub fn elected_count(&self) -> usize {
        self.validators.iter().filter(|v| v.currently_elected).count()
    }
}
