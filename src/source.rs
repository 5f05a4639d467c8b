//! The two remote data sources the indexer reads from.
//!
//! Numeric on-chain values are handed over as the decimal strings the sources
//! return; scaling them is up to the caller (see `crate::fixed`).

use async_trait::async_trait;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpochRegistered {
    pub block: u64,
    pub epoch: u64,
}

/// Chain-data REST service.
#[async_trait(?Send)]
pub trait ChainData {
    async fn current_epoch(&self) -> anyhow::Result<u64>;
    /// Downtime slashing multiplier of a group, 24 decimals. May be empty.
    async fn slashing_multiplier(&self, address: &str) -> anyhow::Result<String>;
    async fn target_apy(&self) -> anyhow::Result<String>;
    async fn epoch_registered(&self, address: &str) -> anyhow::Result<EpochRegistered>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Affiliate {
    pub address: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RosterGroup {
    pub address: String,
    pub name: String,
    pub affiliates: Vec<Affiliate>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElectedValidator {
    pub address: String,
    /// `None` when the explorer knows of no group for the validator.
    pub group_address: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Claim {
    pub kind: String,
    pub element: String,
    pub verified: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AffiliateDetail {
    pub address: String,
    /// 24 decimals
    pub score: String,
    /// Block number, 0 if never elected.
    pub last_elected: u64,
    pub attestations_requested: u64,
    pub attestations_fulfilled: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupDetail {
    pub address: String,
    pub name: String,
    /// 24 decimals
    pub commission: String,
    /// 18 decimals
    pub locked_gold: String,
    /// 18 decimals
    pub votes: String,
    /// 18 decimals
    pub receivable_votes: String,
    pub claims: Vec<Claim>,
    pub affiliates: Vec<AffiliateDetail>,
}

/// Chain-explorer GraphQL service.
#[async_trait(?Send)]
pub trait Explorer {
    async fn basic_roster(&self) -> anyhow::Result<Vec<RosterGroup>>;
    async fn elected_at(&self, block: u64) -> anyhow::Result<Vec<ElectedValidator>>;
    async fn full_detail(&self) -> anyhow::Result<Vec<GroupDetail>>;
}
