use crate::models::{
    Epoch, GroupWithValidators, NewEpoch, NewValidator, NewValidatorGroup,
    NewValidatorGroupStats, NewValidatorStats, Validator, ValidatorGroup,
};
use crate::schema;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::QueryResult;

/// The relational store the indexer writes to. Lookups return `Ok(None)`
/// when no row matches; every `Err` is a real failure.
///
/// Each call commits on its own, there are no transactions spanning calls.
pub trait Store {
    fn find_group(&self, address: &str) -> QueryResult<Option<ValidatorGroup>>;
    fn insert_group(&self, group: &NewValidatorGroup) -> QueryResult<ValidatorGroup>;
    fn update_group(&self, group: &ValidatorGroup) -> QueryResult<()>;
    fn load_groups(&self) -> QueryResult<Vec<ValidatorGroup>>;
    fn load_groups_with_validators(&self) -> QueryResult<Vec<GroupWithValidators>>;

    fn find_validator(&self, address: &str) -> QueryResult<Option<Validator>>;
    fn insert_validator(&self, validator: &NewValidator) -> QueryResult<Validator>;
    fn update_validator(&self, validator: &Validator) -> QueryResult<()>;

    fn last_epoch(&self) -> QueryResult<Option<Epoch>>;
    fn find_epoch(&self, number: u64) -> QueryResult<Option<Epoch>>;
    fn insert_epoch(&self, epoch: &NewEpoch) -> QueryResult<Epoch>;

    fn insert_validator_stats(&self, stats: &NewValidatorStats) -> QueryResult<()>;
    fn insert_group_stats(&self, stats: &NewValidatorGroupStats) -> QueryResult<()>;
}

pub struct PgStore {
    db: PgConnection,
}

impl PgStore {
    pub fn new(db: PgConnection) -> Self {
        Self { db }
    }
}

impl Store for PgStore {
    fn find_group(&self, address: &str) -> QueryResult<Option<ValidatorGroup>> {
        schema::validator_groups::table
            .filter(schema::validator_groups::address.eq(address))
            .first::<ValidatorGroup>(&self.db)
            .optional()
    }

    fn insert_group(&self, group: &NewValidatorGroup) -> QueryResult<ValidatorGroup> {
        diesel::insert_into(schema::validator_groups::table)
            .values(group)
            .get_result(&self.db)
    }

    fn update_group(&self, group: &ValidatorGroup) -> QueryResult<()> {
        diesel::update(group).set(group).execute(&self.db)?;
        Ok(())
    }

    fn load_groups(&self) -> QueryResult<Vec<ValidatorGroup>> {
        schema::validator_groups::table
            .order_by(schema::validator_groups::id)
            .load::<ValidatorGroup>(&self.db)
    }

    fn load_groups_with_validators(&self) -> QueryResult<Vec<GroupWithValidators>> {
        let groups = self.load_groups()?;
        let validators = Validator::belonging_to(&groups)
            .order_by(schema::validators::id)
            .load::<Validator>(&self.db)?
            .grouped_by(&groups);
        Ok(groups
            .into_iter()
            .zip(validators)
            .map(|(group, validators)| GroupWithValidators { group, validators })
            .collect())
    }

    fn find_validator(&self, address: &str) -> QueryResult<Option<Validator>> {
        schema::validators::table
            .filter(schema::validators::address.eq(address))
            .first::<Validator>(&self.db)
            .optional()
    }

    fn insert_validator(&self, validator: &NewValidator) -> QueryResult<Validator> {
        diesel::insert_into(schema::validators::table)
            .values(validator)
            .get_result(&self.db)
    }

    fn update_validator(&self, validator: &Validator) -> QueryResult<()> {
        diesel::update(validator).set(validator).execute(&self.db)?;
        Ok(())
    }

    fn last_epoch(&self) -> QueryResult<Option<Epoch>> {
        schema::epochs::table
            .order_by(schema::epochs::number.desc())
            .first::<Epoch>(&self.db)
            .optional()
    }

    fn find_epoch(&self, number: u64) -> QueryResult<Option<Epoch>> {
        schema::epochs::table
            .filter(schema::epochs::number.eq(crate::models::to_i64(number)))
            .first::<Epoch>(&self.db)
            .optional()
    }

    fn insert_epoch(&self, epoch: &NewEpoch) -> QueryResult<Epoch> {
        diesel::insert_into(schema::epochs::table)
            .values(epoch)
            .get_result(&self.db)
    }

    fn insert_validator_stats(&self, stats: &NewValidatorStats) -> QueryResult<()> {
        diesel::insert_into(schema::validator_stats::table)
            .values(stats)
            .execute(&self.db)?;
        Ok(())
    }

    fn insert_group_stats(&self, stats: &NewValidatorGroupStats) -> QueryResult<()> {
        diesel::insert_into(schema::validator_group_stats::table)
            .values(stats)
            .execute(&self.db)?;
        Ok(())
    }
}
