use crate::client::post_json;
use crate::source::{
    Affiliate, AffiliateDetail, Claim, ElectedValidator, Explorer, GroupDetail, RosterGroup,
};

use actix_web::client::Client;
use async_trait::async_trait;
use log::info;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

const BODY_LIMIT: usize = 8 << 20;

const ROSTER_QUERY: &str = r#"{
  celoValidatorGroups {
    account { address name }
    affiliates(first: 10) { edges { node { name address } } }
  }
}"#;

const ELECTED_QUERY: &str = r#"query($block: Int!) {
  celoElectedValidators(blockNumber: $block) {
    celoAccount {
      address
      validator { groupInfo { address } }
    }
  }
}"#;

const DETAIL_QUERY: &str = r#"{
  celoValidatorGroups {
    account {
      address
      name
      group { commission lockedGold receivableVotes votes }
      claims(first: 10) { edges { node { element type verified } } }
    }
    affiliates(first: 5) {
      edges {
        node { address lastElected score attestationsFulfilled attestationsRequested }
      }
    }
  }
}"#;

#[derive(Debug, Deserialize, Serialize)]
pub struct GraphQLErrorEntry {
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<Value>,
}

#[derive(Debug)]
pub enum GraphQLError {
    Query(Vec<GraphQLErrorEntry>),
    Parse,
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphQLError::Query(errors) => match serde_json::ser::to_string(errors) {
                Ok(json) => f.write_str(&json),
                Err(_) => write!(f, "{:?}", errors),
            },
            GraphQLError::Parse => {
                write!(
                    f,
                    "Received bad GraphQL response: no \"data\" or \"errors\" given"
                )
            }
        }
    }
}

impl std::error::Error for GraphQLError {}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorEntry>>,
}

impl<T> GraphQLResponse<T> {
    fn into_result(self) -> Result<T, GraphQLError> {
        match self.errors {
            Some(errors) if !errors.is_empty() => Err(GraphQLError::Query(errors)),
            _ => self.data.ok_or(GraphQLError::Parse),
        }
    }
}

// Wei and Fixidity values come back as strings, but tolerate plain numbers.
fn decimal_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

impl<T> Connection<T> {
    fn nodes(self) -> impl Iterator<Item = T> {
        self.edges.into_iter().map(|e| e.node)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RosterData {
    celo_validator_groups: Vec<RosterGroupNode>,
}

#[derive(Debug, Deserialize)]
struct RosterGroupNode {
    account: AccountNode,
    affiliates: Connection<AccountNode>,
}

#[derive(Debug, Deserialize)]
struct AccountNode {
    address: String,
    name: Option<String>,
}

impl From<RosterGroupNode> for RosterGroup {
    fn from(node: RosterGroupNode) -> Self {
        Self {
            address: node.account.address,
            name: node.account.name.unwrap_or_default(),
            affiliates: node
                .affiliates
                .nodes()
                .map(|a| Affiliate {
                    address: a.address,
                    name: a.name.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElectedData {
    celo_elected_validators: Vec<ElectedNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElectedNode {
    celo_account: ElectedAccount,
}

#[derive(Debug, Deserialize)]
struct ElectedAccount {
    address: String,
    validator: Option<ElectedValidatorNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElectedValidatorNode {
    group_info: Option<GroupInfoNode>,
}

#[derive(Debug, Deserialize)]
struct GroupInfoNode {
    address: String,
}

impl From<ElectedNode> for ElectedValidator {
    fn from(node: ElectedNode) -> Self {
        let group_address = node
            .celo_account
            .validator
            .and_then(|v| v.group_info)
            .map(|g| g.address)
            .filter(|a| !a.is_empty());
        Self {
            address: node.celo_account.address,
            group_address,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailData {
    celo_validator_groups: Vec<DetailGroupNode>,
}

#[derive(Debug, Deserialize)]
struct DetailGroupNode {
    account: DetailAccountNode,
    affiliates: Connection<DetailAffiliateNode>,
}

#[derive(Debug, Deserialize)]
struct DetailAccountNode {
    address: String,
    name: Option<String>,
    group: Option<GroupFieldsNode>,
    claims: Connection<ClaimNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupFieldsNode {
    #[serde(default, deserialize_with = "decimal_string")]
    commission: String,
    #[serde(default, deserialize_with = "decimal_string")]
    locked_gold: String,
    #[serde(default, deserialize_with = "decimal_string")]
    receivable_votes: String,
    #[serde(default, deserialize_with = "decimal_string")]
    votes: String,
}

#[derive(Debug, Deserialize)]
struct ClaimNode {
    #[serde(default)]
    element: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    verified: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailAffiliateNode {
    address: String,
    #[serde(default, deserialize_with = "decimal_string")]
    score: String,
    last_elected: Option<u64>,
    attestations_requested: Option<u64>,
    attestations_fulfilled: Option<u64>,
}

impl From<DetailGroupNode> for GroupDetail {
    fn from(node: DetailGroupNode) -> Self {
        let group = node.account.group.unwrap_or_default();
        Self {
            address: node.account.address,
            name: node.account.name.unwrap_or_default(),
            commission: group.commission,
            locked_gold: group.locked_gold,
            votes: group.votes,
            receivable_votes: group.receivable_votes,
            claims: node
                .account
                .claims
                .nodes()
                .map(|c| Claim {
                    kind: c.kind,
                    element: c.element,
                    verified: c.verified,
                })
                .collect(),
            affiliates: node
                .affiliates
                .nodes()
                .map(|a| AffiliateDetail {
                    address: a.address,
                    score: a.score,
                    last_elected: a.last_elected.unwrap_or(0),
                    attestations_requested: a.attestations_requested.unwrap_or(0),
                    attestations_fulfilled: a.attestations_fulfilled.unwrap_or(0),
                })
                .collect(),
        }
    }
}

/// GraphQL client for the Celo block explorer.
pub struct GraphQLExplorer {
    client: Client,
    url: String,
    query_timeout: Duration,
    detail_timeout: Duration,
}

impl GraphQLExplorer {
    pub fn new(url: &str, query_timeout: Duration, detail_timeout: Duration) -> Self {
        Self {
            client: Default::default(),
            url: url.to_string(),
            query_timeout,
            detail_timeout,
        }
    }

    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
        timeout: Duration,
    ) -> anyhow::Result<T> {
        let res: GraphQLResponse<T> = post_json(
            &self.client,
            &self.url,
            &json!({
                "query": query,
                "variables": variables,
            }),
            timeout,
            BODY_LIMIT,
        )
        .await?;
        Ok(res.into_result()?)
    }
}

#[async_trait(?Send)]
impl Explorer for GraphQLExplorer {
    async fn basic_roster(&self) -> anyhow::Result<Vec<RosterGroup>> {
        let data: RosterData = self
            .query(ROSTER_QUERY, Value::Null, self.query_timeout)
            .await?;
        Ok(data
            .celo_validator_groups
            .into_iter()
            .map(RosterGroup::from)
            .collect())
    }

    async fn elected_at(&self, block: u64) -> anyhow::Result<Vec<ElectedValidator>> {
        info!("Finding elected validators at block #{}", block);
        let data: ElectedData = self
            .query(ELECTED_QUERY, json!({ "block": block }), self.query_timeout)
            .await?;
        Ok(data
            .celo_elected_validators
            .into_iter()
            .map(ElectedValidator::from)
            .collect())
    }

    async fn full_detail(&self) -> anyhow::Result<Vec<GroupDetail>> {
        let data: DetailData = self
            .query(DETAIL_QUERY, Value::Null, self.detail_timeout)
            .await?;
        Ok(data
            .celo_validator_groups
            .into_iter()
            .map(GroupDetail::from)
            .collect())
    }
}
