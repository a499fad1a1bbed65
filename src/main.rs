mod cli;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use galileo_scan::eth::RpcReader;
use galileo_scan::poller::{spawn_poller, PollHandle};
use galileo_scan::{Config, Explorer, PageRequest};

use crate::cli::{Cli, Commands, WatchTarget};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    let explorer = Explorer::from_config(&config).context("failed to build explorer client")?;

    match cli.command {
        Commands::Block { id } => print_json(&explorer.find_block(&id).await)?,
        Commands::BlockTxs { hash, page } => {
            print_json(&explorer.block_transactions(&hash, page.window()).await)?
        }
        Commands::Tx { hash } => {
            let rpc = rpc_reader(&config)?;
            print_json(&rpc.transaction_with_receipt(&hash).await)?
        }
        Commands::Address { address } => print_json(&explorer.address_overview(&address).await)?,
        Commands::AddressTxs { address, page } => {
            print_json(&explorer.address_transactions(&address, page.window()).await)?
        }
        Commands::Erc20Transfers { address, page } => {
            print_json(&explorer.erc20_transfers(&address, page.window()).await)?
        }
        Commands::Token { contract } => print_json(&explorer.token_overview(&contract).await)?,
        Commands::TokenHolders { contract, page } => {
            print_json(&explorer.token_holders(&contract, page.window()).await)?
        }
        Commands::TokenTransfers { contract, page } => {
            print_json(&explorer.token_transfers(&contract, page.window()).await)?
        }
        Commands::LatestTxs { page, rpc: true } => {
            let rpc = rpc_reader(&config)?;
            let count = usize::try_from(page.limit).unwrap_or(usize::MAX);
            print_json(&rpc.recent_transactions(count).await)?
        }
        Commands::LatestTxs { page, rpc: false } => {
            print_json(&explorer.latest_transactions(page.window()).await)?
        }
        Commands::Miners { page } => print_json(&explorer.top_miners(page.window()).await)?,
        Commands::MinerRank { address } => {
            let rank = explorer.miner_rank(&address).await;
            print_json(&serde_json::json!({ "address": address, "rank": rank }))?
        }
        Commands::StorageTxs { address } => {
            let hex = explorer.resolver().resolve(&address).await;
            let count = explorer.storage_tx_count(&hex).await;
            print_json(&serde_json::json!({ "address": hex, "storageTxCount": count }))?
        }
        Commands::LatestBlocks { count, chart: false } => {
            print_json(&rpc_reader(&config)?.latest_blocks(count).await)?
        }
        Commands::LatestBlocks { count, chart: true } => {
            print_json(&rpc_reader(&config)?.tx_chart(count).await)?
        }
        Commands::Stats => print_json(&explorer.network_stats().await)?,
        Commands::Charts => print_json(&explorer.charts().await)?,
        Commands::Watch {
            target,
            interval_secs,
        } => {
            let interval = interval_secs
                .map(Duration::from_secs)
                .unwrap_or(config.poll_interval);
            tracing::info!("watching {:?} every {:?}", target, interval);
            match target {
                WatchTarget::Stats => {
                    let handle = spawn_poller(interval, move || {
                        let explorer = explorer.clone();
                        async move { explorer.network_stats().await }
                    });
                    watch(handle).await?
                }
                WatchTarget::LatestTxs => {
                    let handle = spawn_poller(interval, move || {
                        let explorer = explorer.clone();
                        async move { explorer.latest_transactions(PageRequest::default()).await }
                    });
                    watch(handle).await?
                }
            }
            return Ok(());
        }
    }

    tracing::debug!("upstream calls: {:?}", explorer.client().stats());
    Ok(())
}

fn rpc_reader(config: &Config) -> anyhow::Result<RpcReader> {
    RpcReader::new(&config.eth_rpc_url, config.http_timeout)
}

async fn watch<T: Serialize>(mut handle: PollHandle<T>) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, stopping poller");
                break;
            }
            next = handle.next() => match next {
                Some(value) => print_json(&value)?,
                None => break,
            },
        }
    }
    handle.stop().await;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{}", rendered);
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
