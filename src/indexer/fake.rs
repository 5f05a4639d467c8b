//! In-memory stand-ins for the data sources and the database.

use super::Options;
use crate::models::{
    Epoch, GroupWithValidators, NewEpoch, NewValidator, NewValidatorGroup,
    NewValidatorGroupStats, NewValidatorStats, Validator, ValidatorGroup,
};
use crate::source::{
    Affiliate, AffiliateDetail, ChainData, ElectedValidator, EpochRegistered, Explorer,
    GroupDetail, RosterGroup,
};
use crate::store::Store;

use anyhow::anyhow;
use async_trait::async_trait;
use diesel::result::{DatabaseErrorKind, Error as DieselError, QueryResult};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

pub const SCORE_ONE: &str = "1000000000000000000000000";

pub fn test_options() -> Options {
    Options {
        catch_up_delay: Duration::from_millis(0),
    }
}

fn db_error(kind: DatabaseErrorKind, msg: &str) -> DieselError {
    DieselError::DatabaseError(kind, Box::new(msg.to_string()))
}

pub struct FakeChain {
    current: u64,
    registered: RefCell<HashMap<String, u64>>,
    slashing: RefCell<HashMap<String, String>>,
    target_apy: RefCell<String>,
}

impl FakeChain {
    pub fn new(current: u64) -> Self {
        Self {
            current,
            registered: Default::default(),
            slashing: Default::default(),
            target_apy: RefCell::new("0".to_string()),
        }
    }

    pub fn register(&self, group: &str, epoch: u64) {
        self.registered.borrow_mut().insert(group.to_string(), epoch);
    }

    pub fn set_slashing(&self, group: &str, multiplier: &str) {
        self.slashing
            .borrow_mut()
            .insert(group.to_string(), multiplier.to_string());
    }

    pub fn set_target_apy(&self, apy: &str) {
        *self.target_apy.borrow_mut() = apy.to_string();
    }
}

#[async_trait(?Send)]
impl ChainData for FakeChain {
    async fn current_epoch(&self) -> anyhow::Result<u64> {
        Ok(self.current)
    }

    async fn slashing_multiplier(&self, address: &str) -> anyhow::Result<String> {
        Ok(self
            .slashing
            .borrow()
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn target_apy(&self) -> anyhow::Result<String> {
        Ok(self.target_apy.borrow().clone())
    }

    async fn epoch_registered(&self, address: &str) -> anyhow::Result<EpochRegistered> {
        match self.registered.borrow().get(address) {
            Some(&epoch) => Ok(EpochRegistered {
                block: crate::epochs::bounds(epoch).start_block,
                epoch,
            }),
            None => Err(anyhow!("GET epoch-vg-registered/{} returned HTTP 500", address)),
        }
    }
}

#[derive(Default)]
pub struct FakeExplorer {
    roster: RefCell<Vec<RosterGroup>>,
    elected: RefCell<Vec<ElectedValidator>>,
    elected_at: RefCell<HashMap<u64, Vec<ElectedValidator>>>,
    failing_blocks: RefCell<HashSet<u64>>,
    requested_blocks: RefCell<Vec<u64>>,
    details: RefCell<Vec<GroupDetail>>,
}

impl FakeExplorer {
    pub fn add_roster_group(&self, group: &str, affiliates: &[&str]) {
        self.roster.borrow_mut().push(RosterGroup {
            address: group.to_string(),
            name: format!("{} name", group),
            affiliates: affiliates
                .iter()
                .map(|a| Affiliate {
                    address: a.to_string(),
                    name: format!("{} name", a),
                })
                .collect(),
        });
    }

    fn elected_list(validators: &[&str], group: &str) -> Vec<ElectedValidator> {
        validators
            .iter()
            .map(|v| ElectedValidator {
                address: v.to_string(),
                group_address: Some(group.to_string()).filter(|g| !g.is_empty()),
            })
            .collect()
    }

    /// Elected at every block without a more specific answer.
    pub fn elect(&self, validators: &[&str], group: &str) {
        self.elected
            .borrow_mut()
            .extend(Self::elected_list(validators, group));
    }

    pub fn elect_at(&self, block: u64, validators: &[&str], group: &str) {
        self.elected_at
            .borrow_mut()
            .entry(block)
            .or_default()
            .extend(Self::elected_list(validators, group));
    }

    pub fn fail_at(&self, block: u64) {
        self.failing_blocks.borrow_mut().insert(block);
    }

    pub fn clear_failures(&self) {
        self.failing_blocks.borrow_mut().clear();
    }

    pub fn requested_blocks(&self) -> Vec<u64> {
        self.requested_blocks.borrow().clone()
    }

    /// Adds detail for a group; each validator gets a score of 1 and 10/10
    /// attestations.
    pub fn add_detail(&self, group: &str, validators: &[(&str, u64)]) {
        self.details.borrow_mut().push(GroupDetail {
            address: group.to_string(),
            name: format!("{} name", group),
            affiliates: validators
                .iter()
                .map(|&(address, last_elected)| AffiliateDetail {
                    address: address.to_string(),
                    score: SCORE_ONE.to_string(),
                    last_elected,
                    attestations_requested: 10,
                    attestations_fulfilled: 10,
                })
                .collect(),
            ..Default::default()
        });
    }

    pub fn edit_detail<F: FnOnce(&mut GroupDetail)>(&self, group: &str, f: F) {
        let mut details = self.details.borrow_mut();
        if let Some(detail) = details.iter_mut().find(|d| d.address == group) {
            f(detail);
        }
    }
}

#[async_trait(?Send)]
impl Explorer for FakeExplorer {
    async fn basic_roster(&self) -> anyhow::Result<Vec<RosterGroup>> {
        Ok(self.roster.borrow().clone())
    }

    async fn elected_at(&self, block: u64) -> anyhow::Result<Vec<ElectedValidator>> {
        self.requested_blocks.borrow_mut().push(block);
        if self.failing_blocks.borrow().contains(&block) {
            return Err(anyhow!("context deadline exceeded at block #{}", block));
        }
        match self.elected_at.borrow().get(&block) {
            Some(elected) => Ok(elected.clone()),
            None => Ok(self.elected.borrow().clone()),
        }
    }

    async fn full_detail(&self) -> anyhow::Result<Vec<GroupDetail>> {
        Ok(self.details.borrow().clone())
    }
}

#[derive(Default)]
struct FakeDb {
    next_id: i32,
    groups: Vec<ValidatorGroup>,
    validators: Vec<Validator>,
    epochs: Vec<Epoch>,
    validator_stats: Vec<NewValidatorStats>,
    group_stats: Vec<NewValidatorGroupStats>,
    failing_groups: HashSet<String>,
    lookups: usize,
}

impl FakeDb {
    fn id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct FakeStore {
    db: RefCell<FakeDb>,
}

impl FakeStore {
    /// Every update of this group fails.
    pub fn fail_updates_for(&self, group: &str) {
        self.db.borrow_mut().failing_groups.insert(group.to_string());
    }

    pub fn lookups(&self) -> usize {
        self.db.borrow().lookups
    }

    pub fn epoch_numbers(&self) -> Vec<i64> {
        let mut numbers: Vec<i64> = self.db.borrow().epochs.iter().map(|e| e.number).collect();
        numbers.sort_unstable();
        numbers
    }

    pub fn groups(&self) -> Vec<ValidatorGroup> {
        self.db.borrow().groups.clone()
    }

    pub fn group(&self, address: &str) -> ValidatorGroup {
        self.groups()
            .into_iter()
            .find(|g| g.address == address)
            .unwrap_or_else(|| panic!("no group {}", address))
    }

    pub fn validators(&self) -> Vec<Validator> {
        self.db.borrow().validators.clone()
    }

    pub fn validator(&self, address: &str) -> Validator {
        self.validators()
            .into_iter()
            .find(|v| v.address == address)
            .unwrap_or_else(|| panic!("no validator {}", address))
    }

    pub fn validator_stats(&self) -> Vec<NewValidatorStats> {
        self.db.borrow().validator_stats.clone()
    }

    pub fn group_stats(&self) -> Vec<NewValidatorGroupStats> {
        self.db.borrow().group_stats.clone()
    }

    pub fn seed_group(&self, address: &str, validators: &[&str]) -> ValidatorGroup {
        let group = self
            .insert_group(&NewValidatorGroup {
                address: address.to_string(),
                name: format!("{} name", address),
                epoch_registered_at: 1,
                epochs_served: 0,
            })
            .unwrap();
        for v in validators {
            self.insert_validator(&NewValidator {
                address: v.to_string(),
                name: format!("{} name", v),
                validator_group_id: group.id,
            })
            .unwrap();
        }
        group
    }

    pub fn seed_epochs(&self, numbers: std::ops::RangeInclusive<u64>) {
        for n in numbers {
            self.insert_epoch(&NewEpoch::new(n)).unwrap();
        }
    }
}

impl Store for FakeStore {
    fn find_group(&self, address: &str) -> QueryResult<Option<ValidatorGroup>> {
        let mut db = self.db.borrow_mut();
        db.lookups += 1;
        Ok(db.groups.iter().find(|g| g.address == address).cloned())
    }

    fn insert_group(&self, group: &NewValidatorGroup) -> QueryResult<ValidatorGroup> {
        let mut db = self.db.borrow_mut();
        if db.groups.iter().any(|g| g.address == group.address) {
            return Err(db_error(
                DatabaseErrorKind::UniqueViolation,
                "duplicate key value violates unique constraint \"validator_groups_address_key\"",
            ));
        }
        let mut row = crate::score::tests::group(db.id());
        row.address = group.address.clone();
        row.name = group.name.clone();
        row.epoch_registered_at = group.epoch_registered_at;
        row.epochs_served = group.epochs_served;
        db.groups.push(row.clone());
        Ok(row)
    }

    fn update_group(&self, group: &ValidatorGroup) -> QueryResult<()> {
        let mut db = self.db.borrow_mut();
        if db.failing_groups.contains(&group.address) {
            return Err(db_error(
                DatabaseErrorKind::UnableToSendCommand,
                "server closed the connection unexpectedly",
            ));
        }
        match db.groups.iter_mut().find(|g| g.id == group.id) {
            Some(row) => {
                *row = group.clone();
                Ok(())
            }
            None => Err(DieselError::NotFound),
        }
    }

    fn load_groups(&self) -> QueryResult<Vec<ValidatorGroup>> {
        let mut groups = self.db.borrow().groups.clone();
        groups.sort_by_key(|g| g.id);
        Ok(groups)
    }

    fn load_groups_with_validators(&self) -> QueryResult<Vec<GroupWithValidators>> {
        let validators = self.db.borrow().validators.clone();
        Ok(self
            .load_groups()?
            .into_iter()
            .map(|group| GroupWithValidators {
                validators: validators
                    .iter()
                    .filter(|v| v.validator_group_id == group.id)
                    .cloned()
                    .collect(),
                group,
            })
            .collect())
    }

    fn find_validator(&self, address: &str) -> QueryResult<Option<Validator>> {
        let mut db = self.db.borrow_mut();
        db.lookups += 1;
        Ok(db.validators.iter().find(|v| v.address == address).cloned())
    }

    fn insert_validator(&self, validator: &NewValidator) -> QueryResult<Validator> {
        let mut db = self.db.borrow_mut();
        if db.validators.iter().any(|v| v.address == validator.address) {
            return Err(db_error(
                DatabaseErrorKind::UniqueViolation,
                "duplicate key value violates unique constraint \"validators_address_key\"",
            ));
        }
        let row = Validator {
            id: db.id(),
            address: validator.address.clone(),
            name: validator.name.clone(),
            validator_group_id: validator.validator_group_id,
            currently_elected: false,
            created_at: chrono::Utc::now().naive_utc(),
        };
        db.validators.push(row.clone());
        Ok(row)
    }

    fn update_validator(&self, validator: &Validator) -> QueryResult<()> {
        let mut db = self.db.borrow_mut();
        match db.validators.iter_mut().find(|v| v.id == validator.id) {
            Some(row) => {
                *row = validator.clone();
                Ok(())
            }
            None => Err(DieselError::NotFound),
        }
    }

    fn last_epoch(&self) -> QueryResult<Option<Epoch>> {
        Ok(self.db.borrow().epochs.iter().max_by_key(|e| e.number).cloned())
    }

    fn find_epoch(&self, number: u64) -> QueryResult<Option<Epoch>> {
        Ok(self
            .db
            .borrow()
            .epochs
            .iter()
            .find(|e| e.number == number as i64)
            .cloned())
    }

    fn insert_epoch(&self, epoch: &NewEpoch) -> QueryResult<Epoch> {
        let mut db = self.db.borrow_mut();
        if db.epochs.iter().any(|e| e.number == epoch.number) {
            return Err(db_error(
                DatabaseErrorKind::UniqueViolation,
                "duplicate key value violates unique constraint \"epochs_number_key\"",
            ));
        }
        let row = Epoch {
            id: db.id(),
            number: epoch.number,
            start_block: epoch.start_block,
            end_block: epoch.end_block,
            created_at: chrono::Utc::now().naive_utc(),
        };
        db.epochs.push(row.clone());
        Ok(row)
    }

    fn insert_validator_stats(&self, stats: &NewValidatorStats) -> QueryResult<()> {
        self.db.borrow_mut().validator_stats.push(stats.clone());
        Ok(())
    }

    fn insert_group_stats(&self, stats: &NewValidatorGroupStats) -> QueryResult<()> {
        self.db.borrow_mut().group_stats.push(stats.clone());
        Ok(())
    }
}
