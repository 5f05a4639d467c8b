use crate::client::get_json;
use crate::source::{ChainData, EpochRegistered};

use actix_web::client::Client;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const BODY_LIMIT: usize = 1 << 16;

#[derive(Debug, Deserialize)]
struct CurrentEpochResponse {
    epoch: u64,
}

#[derive(Debug, Deserialize)]
struct SlashingMultiplierResponse {
    #[serde(default)]
    multiplier: String,
}

#[derive(Debug, Deserialize)]
struct TargetApyResponse {
    #[serde(default)]
    target_apy: String,
}

#[derive(Debug, Deserialize)]
struct EpochRegisteredResponse {
    block: u64,
    epoch: u64,
}

/// REST client for the on-chain data service.
pub struct RestChainData {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl RestChainData {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: Default::default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait(?Send)]
impl ChainData for RestChainData {
    async fn current_epoch(&self) -> anyhow::Result<u64> {
        let res: CurrentEpochResponse = get_json(
            &self.client,
            &self.url("current-epoch"),
            self.timeout,
            BODY_LIMIT,
        )
        .await?;
        Ok(res.epoch)
    }

    async fn slashing_multiplier(&self, address: &str) -> anyhow::Result<String> {
        let res: SlashingMultiplierResponse = get_json(
            &self.client,
            &self.url(&format!("downtime-score/{}", address)),
            self.timeout,
            BODY_LIMIT,
        )
        .await?;
        Ok(res.multiplier)
    }

    async fn target_apy(&self) -> anyhow::Result<String> {
        let res: TargetApyResponse = get_json(
            &self.client,
            &self.url("target-apy"),
            self.timeout,
            BODY_LIMIT,
        )
        .await?;
        Ok(res.target_apy)
    }

    async fn epoch_registered(&self, address: &str) -> anyhow::Result<EpochRegistered> {
        let res: EpochRegisteredResponse = get_json(
            &self.client,
            &self.url(&format!("epoch-vg-registered/{}", address)),
            self.timeout,
            BODY_LIMIT,
        )
        .await?;
        Ok(EpochRegistered {
            block: res.block,
            epoch: res.epoch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_responses() {
        let epoch: CurrentEpochResponse = serde_json::from_str(r#"{"epoch": 512}"#).unwrap();
        assert_eq!(epoch.epoch, 512);

        let apy: TargetApyResponse =
            serde_json::from_str(r#"{"target_apy": "60000000000000000000000"}"#).unwrap();
        assert_eq!(apy.target_apy, "60000000000000000000000");

        let multiplier: SlashingMultiplierResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(multiplier.multiplier, "");

        let registered: EpochRegisteredResponse =
            serde_json::from_str(r#"{"block": 17500, "epoch": 2}"#).unwrap();
        assert_eq!((registered.block, registered.epoch), (17500, 2));
    }
}
