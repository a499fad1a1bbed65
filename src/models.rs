use std::fmt;

use ethers_core::types::U256;
use serde::{Serialize, Serializer};

use crate::pagination::Page;

/// An integer amount in the smallest unit of its asset (wei, token base units).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(U256);

impl Amount {
    pub fn zero() -> Self {
        Amount(U256::zero())
    }

    /// Parses a decimal or `0x`-prefixed hex integer.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let parsed = match raw.strip_prefix("0x") {
            Some(hex) => U256::from_str_radix(hex, 16).ok(),
            None => U256::from_dec_str(raw).ok(),
        };
        parsed.map(Amount)
    }

    pub fn parse_or_zero(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_default()
    }

    pub fn raw(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Renders the amount divided by `10^decimals` without rounding.
    pub fn scaled(&self, decimals: u32) -> String {
        let digits = self.0.to_string();
        let decimals = decimals as usize;
        if decimals == 0 {
            return digits;
        }
        let padded = if digits.len() <= decimals {
            format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.is_empty() {
            int_part.to_string()
        } else {
            format!("{}.{}", int_part, frac_part)
        }
    }
}

impl From<U256> for Amount {
    fn from(value: U256) -> Self {
        Amount(value)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(U256::from(value))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub height: u64,
    pub hash: String,
    pub parent_hash: String,
    pub nonce: String,
    pub gas_limit: Amount,
    pub gas_used: Amount,
    pub size: u64,
    pub difficulty: String,
    pub timestamp: i64,
    pub transaction_count: u64,
    pub miner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeTx {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value: Amount,
    pub gas_fee: Amount,
    pub gas_price: Amount,
    pub nonce: u64,
    pub block_height: Option<u64>,
    pub timestamp: i64,
    pub method: Option<String>,
    pub status: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenMeta {
    pub contract: Option<String>,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenTransfer {
    pub tx_hash: String,
    pub block_height: u64,
    pub from: String,
    pub to: String,
    pub value: Amount,
    pub token: TokenMeta,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenHolding {
    pub contract: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub amount: Amount,
    pub icon_url: Option<String>,
    pub price: Option<String>,
    pub total_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenHolder {
    pub address: String,
    pub balance: Amount,
    pub percentage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenInfo {
    pub contract: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u32>,
    pub icon_url: Option<String>,
    pub holder_count: Option<u64>,
    pub transfer_count: Option<u64>,
    pub price: Option<String>,
    pub total_price: Option<String>,
    pub total_supply: Option<Amount>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTokenStat {
    pub day: String,
    pub transfer_count: u64,
    pub unique_sender: u64,
    pub unique_receiver: u64,
    pub holder_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddressDetail {
    pub address: Option<String>,
    pub balance: Amount,
    pub nonce: u64,
    pub native_transfer_count: u64,
    pub erc20_transfer_count: u64,
    pub erc721_transfer_count: u64,
    pub erc1155_transfer_count: u64,
    pub staking_balance: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinerRecord {
    pub address: String,
    pub rank: Option<u64>,
    pub total_reward: Amount,
    pub win_count: u64,
    pub attempts: u64,
}

impl MinerRecord {
    /// Share of mining attempts that won, in percent.
    pub fn win_rate(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.win_count as f64 / self.attempts as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressOverview {
    pub address: String,
    pub detail: Option<AddressDetail>,
    pub holdings: Vec<TokenHolding>,
    pub storage_tx_count: u64,
    pub miner_reward: Amount,
    pub miner_rank: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenOverview {
    pub contract: String,
    pub info: Option<TokenInfo>,
    pub holders: Page<TokenHolder>,
    pub transfers: Page<TokenTransfer>,
    pub daily_stats: Vec<DailyTokenStat>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkDashboard {
    pub block_number: u64,
    pub epoch_number: u64,
    pub address_count: u64,
    pub transaction_count: u64,
    pub contract_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlotSample {
    pub tps: Option<f64>,
    pub block_time: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GasPriceInfo {
    pub min: Option<Amount>,
    pub tp50: Option<Amount>,
    pub max: Option<Amount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkStats {
    pub dashboard: Option<NetworkDashboard>,
    pub plot: Option<PlotSample>,
    pub gas: Option<GasPriceInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub stat_time: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Charts {
    pub transactions: Vec<ChartPoint>,
    pub account_growth: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcTransaction {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value_wei: Amount,
    pub gas: i64,
    pub gas_price_wei: Option<Amount>,
    pub max_fee_per_gas_wei: Option<Amount>,
    pub nonce: i64,
    pub block_number: Option<i64>,
    pub timestamp: Option<i64>,
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcBlock {
    pub number: i64,
    pub hash: String,
    pub parent_hash: String,
    pub timestamp: i64,
    pub gas_used: Amount,
    pub gas_limit: Amount,
    pub tx_count: usize,
    pub miner: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcReceipt {
    pub success: Option<bool>,
    pub gas_used: Option<Amount>,
    pub effective_gas_price: Option<Amount>,
    pub contract_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TxWithReceipt {
    pub tx: RpcTransaction,
    pub receipt: Option<RpcReceipt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TxChartPoint {
    pub block: i64,
    pub txs: usize,
    pub timestamp: String,
}
