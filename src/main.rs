use anyhow::Context;
use clap::{value_t, App, Arg};
use diesel::pg::PgConnection;
use log::error;
use std::time::Duration;

#[macro_use]
extern crate diesel;

use diesel::prelude::*;

pub mod chain_data;
pub mod client;
pub mod epochs;
pub mod explorer;
pub mod fixed;
pub mod indexer;
pub mod models;
pub mod schema;
pub mod score;
pub mod source;
pub mod store;

use chain_data::RestChainData;
use explorer::GraphQLExplorer;
use indexer::{EpochIndexer, Options};
use store::PgStore;

#[derive(Clone, Debug)]
struct Config {
    chain_data_url: String,
    explorer_url: String,
    catch_up_delay: Duration,
    http_timeout: Duration,
    query_timeout: Duration,
    detail_timeout: Duration,
}

fn parse_args() -> anyhow::Result<Config> {
    let matches = App::new("celo-validator-indexer")
        .arg(
            Arg::with_name("chain-data-url")
                .long("chain-data-url")
                .takes_value(true)
                .default_value("https://celo-on-chain-data-service.onrender.com")
                .value_name("url"),
        )
        .arg(
            Arg::with_name("explorer-url")
                .long("explorer-url")
                .takes_value(true)
                .default_value("https://explorer.celo.org/graphiql")
                .value_name("url")
                .help("GraphQL endpoint of the block explorer"),
        )
        .arg(
            Arg::with_name("catch-up-delay-ms")
                .long("catch-up-delay-ms")
                .takes_value(true)
                .value_name("ms")
                .default_value("3000")
                .help("pause between epochs while catching up, to go easy on the explorer"),
        )
        .arg(
            Arg::with_name("http-timeout-secs")
                .long("http-timeout-secs")
                .takes_value(true)
                .value_name("secs")
                .default_value("30"),
        )
        .arg(
            Arg::with_name("query-timeout-secs")
                .long("query-timeout-secs")
                .takes_value(true)
                .value_name("secs")
                .default_value("30"),
        )
        .arg(
            Arg::with_name("detail-timeout-secs")
                .long("detail-timeout-secs")
                .takes_value(true)
                .value_name("secs")
                .default_value("90")
                .help("deadline for the query fetching every group's full details"),
        )
        .get_matches();

    Ok(Config {
        chain_data_url: matches
            .value_of("chain-data-url")
            .context("missing --chain-data-url")?
            .to_string(),
        explorer_url: matches
            .value_of("explorer-url")
            .context("missing --explorer-url")?
            .to_string(),
        catch_up_delay: Duration::from_millis(value_t!(matches, "catch-up-delay-ms", u64)?),
        http_timeout: Duration::from_secs(value_t!(matches, "http-timeout-secs", u64)?),
        query_timeout: Duration::from_secs(value_t!(matches, "query-timeout-secs", u64)?),
        detail_timeout: Duration::from_secs(value_t!(matches, "detail-timeout-secs", u64)?),
    })
}

async fn run(config: Config) -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = PgConnection::establish(&database_url)
        .with_context(|| format!("Error connecting to {}", database_url))?;

    let options = Options {
        catch_up_delay: config.catch_up_delay,
    };
    let mut indexer = EpochIndexer::new(
        &options,
        RestChainData::new(&config.chain_data_url, config.http_timeout),
        GraphQLExplorer::new(
            &config.explorer_url,
            config.query_timeout,
            config.detail_timeout,
        ),
        PgStore::new(db),
    );
    indexer.run().await
}

#[actix_web::main]
async fn main() {
    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()
    {
        eprintln!("Error initializing logger: {}", e);
    }

    let config = match parse_args() {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(2);
        }
    };
    if let Err(e) = run(config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
