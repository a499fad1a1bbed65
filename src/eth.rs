use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use ethers_core::types::{Block, BlockId, Transaction, TransactionReceipt, H160, H256, U256};
use ethers_providers::{Http, Middleware, Provider};
use futures_util::future::join_all;
use url::Url;

use crate::error::{Fallback, FetchError, FetchResult};
use crate::models::{RpcBlock, RpcReceipt, RpcTransaction, TxChartPoint, TxWithReceipt};

/// Upper bound on blocks walked back when collecting recent transactions.
pub const MAX_BLOCK_WALK: u64 = 100;

/// Read-only view of the chain through a JSON-RPC node.
#[derive(Clone)]
pub struct RpcReader {
    provider: Provider<Http>,
}

impl RpcReader {
    /// Every call is bounded by `timeout`; an expired call is a transport
    /// failure like any other.
    pub fn new(rpc_url: &Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;
        let transport = Http::new_with_client(rpc_url.clone(), client);
        let provider = Provider::new(transport);
        Ok(Self { provider })
    }

    async fn fetch_block_number(&self) -> FetchResult<u64> {
        Ok(self.provider.get_block_number().await?.as_u64())
    }

    pub async fn latest_block_number(&self) -> Option<u64> {
        self.fetch_block_number()
            .await
            .map(Some)
            .or_default_logged("eth_blockNumber")
    }

    async fn fetch_block(&self, number: u64) -> FetchResult<Option<RpcBlock>> {
        let block = self
            .provider
            .get_block(BlockId::Number(number.into()))
            .await?;
        Ok(block.and_then(normalize_block))
    }

    pub async fn block_by_number(&self, number: u64) -> Option<RpcBlock> {
        self.fetch_block(number)
            .await
            .or_default_logged("eth_getBlockByNumber")
    }

    /// The newest `count` blocks, newest first. Blocks the node cannot
    /// serve are left out.
    pub async fn latest_blocks(&self, count: u64) -> Vec<RpcBlock> {
        let latest = match self.latest_block_number().await {
            Some(latest) if count > 0 => latest,
            _ => return Vec::new(),
        };
        let oldest = latest.saturating_sub(count - 1);
        let blocks = join_all((oldest..=latest).rev().map(|n| self.block_by_number(n))).await;
        blocks.into_iter().flatten().collect()
    }

    async fn fetch_transaction(&self, hash: &str) -> FetchResult<Option<TxWithReceipt>> {
        let hash: H256 = hash
            .parse()
            .map_err(|_| FetchError::Malformed(format!("invalid transaction hash {}", hash)))?;
        let (tx, receipt) = tokio::join!(
            self.provider.get_transaction(hash),
            self.provider.get_transaction_receipt(hash),
        );
        let tx = match tx? {
            Some(tx) => tx,
            None => return Ok(None),
        };
        let receipt = receipt
            .map_err(FetchError::from)
            .or_default_logged("eth_getTransactionReceipt");
        let block_number = tx.block_number.map(|n| n.as_u64() as i64);
        Ok(Some(TxWithReceipt {
            tx: normalize_tx(tx, block_number, None),
            receipt: receipt.map(normalize_receipt),
        }))
    }

    /// A transaction and its receipt, fetched together. The receipt is
    /// `None` while the transaction is pending.
    pub async fn transaction_with_receipt(&self, hash: &str) -> Option<TxWithReceipt> {
        self.fetch_transaction(hash)
            .await
            .or_default_logged("eth_getTransactionByHash")
    }

    /// Up to `count` transactions from the head of the chain backwards,
    /// walking at most [`MAX_BLOCK_WALK`] blocks.
    pub async fn recent_transactions(&self, count: usize) -> Vec<RpcTransaction> {
        let mut out = Vec::new();
        let latest = match self.latest_block_number().await {
            Some(latest) if count > 0 => latest,
            _ => return out,
        };

        for number in (0..=latest).rev().take(MAX_BLOCK_WALK as usize) {
            let block = match self
                .provider
                .get_block_with_txs(BlockId::Number(number.into()))
                .await
            {
                Ok(Some(block)) => block,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("failed to fetch block {} with transactions: {}", number, e);
                    break;
                }
            };
            let timestamp = u256_to_i64_lossy(block.timestamp);
            out.extend(
                block
                    .transactions
                    .into_iter()
                    .map(|tx| normalize_tx(tx, Some(number as i64), Some(timestamp))),
            );
            if out.len() >= count {
                break;
            }
        }

        out.truncate(count);
        out
    }

    /// Transactions per block over the newest `blocks` blocks, oldest first.
    pub async fn tx_chart(&self, blocks: u64) -> Vec<TxChartPoint> {
        let mut recent = self.latest_blocks(blocks).await;
        recent.reverse();
        recent.iter().map(chart_point).collect()
    }
}

fn chart_point(block: &RpcBlock) -> TxChartPoint {
    let timestamp = Utc
        .timestamp_opt(block.timestamp, 0)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();
    TxChartPoint {
        block: block.number,
        txs: block.tx_count,
        timestamp,
    }
}

fn normalize_block<TX>(block: Block<TX>) -> Option<RpcBlock> {
    let number = block.number?.as_u64() as i64;
    let hash: H256 = block.hash?;
    Some(RpcBlock {
        number,
        hash: format!("0x{:x}", hash),
        parent_hash: format!("0x{:x}", block.parent_hash),
        timestamp: u256_to_i64_lossy(block.timestamp),
        gas_used: block.gas_used.into(),
        gas_limit: block.gas_limit.into(),
        tx_count: block.transactions.len(),
        miner: block.author.map(address_to_lower_hex).unwrap_or_default(),
    })
}

fn normalize_tx(tx: Transaction, block_number: Option<i64>, timestamp: Option<i64>) -> RpcTransaction {
    RpcTransaction {
        hash: format!("0x{:x}", tx.hash),
        from: address_to_lower_hex(tx.from),
        to: tx.to.map(address_to_lower_hex),
        value_wei: tx.value.into(),
        gas: u256_to_i64_lossy(tx.gas),
        gas_price_wei: tx.gas_price.map(Into::into),
        max_fee_per_gas_wei: tx.max_fee_per_gas.map(Into::into),
        nonce: u256_to_i64_lossy(tx.nonce),
        block_number,
        timestamp,
        input: tx.input.to_string(),
    }
}

fn normalize_receipt(receipt: TransactionReceipt) -> RpcReceipt {
    RpcReceipt {
        success: receipt.status.map(|s| s.as_u64() == 1),
        gas_used: receipt.gas_used.map(Into::into),
        effective_gas_price: receipt.effective_gas_price.map(Into::into),
        contract_address: receipt.contract_address.map(address_to_lower_hex),
    }
}

fn address_to_lower_hex(addr: H160) -> String {
    format!("0x{:x}", addr)
}

fn u256_to_i64_opt(value: U256) -> Option<i64> {
    let as_u128: u128 = value.try_into().ok()?;
    i64::try_from(as_u128).ok()
}

fn u256_to_i64_lossy(value: U256) -> i64 {
    u256_to_i64_opt(value).unwrap_or(i64::MAX)
}
