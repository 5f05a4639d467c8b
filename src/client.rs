use actix_web::client::Client;
use anyhow::{anyhow, Context};
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const USER_AGENT: &str = "celo-validator-indexer";

// SendRequestError is not Send or Sync, so can't be made into an anyhow::Error :(
fn anyhow_from_actix(e: actix_http::client::SendRequestError) -> anyhow::Error {
    anyhow!("{}", e)
}

fn parse_body<T: DeserializeOwned>(url: &str, body: &[u8]) -> anyhow::Result<T> {
    serde_json::from_slice::<T>(body).with_context(|| {
        format!(
            "Parsing {} body:\n{}",
            url,
            String::from_utf8_lossy(body)
        )
    })
}

pub async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    timeout: Duration,
    limit: usize,
) -> anyhow::Result<T> {
    let mut res = match client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .timeout(timeout)
        .send()
        .await
    {
        Ok(r) => match r.status() {
            StatusCode::OK => r,
            code => return Err(anyhow!("GET {} returned HTTP {}", url, code)),
        },
        Err(e) => return Err(anyhow_from_actix(e).context(format!("GET {}", url))),
    };
    let body = res.body().limit(limit).await?;
    parse_body(url, body.as_ref())
}

pub async fn post_json<B: Serialize, T: DeserializeOwned>(
    client: &Client,
    url: &str,
    payload: &B,
    timeout: Duration,
    limit: usize,
) -> anyhow::Result<T> {
    let mut res = match client
        .post(url)
        .header("User-Agent", USER_AGENT)
        .timeout(timeout)
        .send_json(payload)
        .await
    {
        Ok(r) => match r.status() {
            StatusCode::OK => r,
            code => return Err(anyhow!("POST {} returned HTTP {}", url, code)),
        },
        Err(e) => return Err(anyhow_from_actix(e).context(format!("POST {}", url))),
    };
    let body = res.body().limit(limit).await?;
    parse_body(url, body.as_ref())
}
