//! Wire shapes of the upstream APIs, one per endpoint family. They never leave
//! the `api` boundary: each converts into its domain type from `models`.

use serde::Deserialize;

use super::de;
use crate::models::{
    AddressDetail, Amount, Block, ChartPoint, DailyTokenStat, GasPriceInfo, MinerRecord,
    NativeTx, NetworkDashboard, PlotSample, TokenHolder, TokenHolding, TokenInfo, TokenMeta,
    TokenTransfer,
};
use crate::pagination::Page;

const DEFAULT_TOKEN_DECIMALS: u32 = 18;
/// Largest power of ten that fits in a `U256`. Served decimals are capped here
/// so scaling an amount never builds a string longer than the number itself.
pub const MAX_TOKEN_DECIMALS: u32 = 77;

/// `{ list, total }` payload shared by the paged scan endpoints.
#[derive(Debug, Deserialize)]
pub struct RawList<T> {
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub total: u64,
}

impl<T> RawList<T> {
    pub fn into_page<U>(self, convert: impl FnMut(T) -> U) -> Page<U> {
        Page {
            list: self.list.into_iter().map(convert).collect(),
            total: self.total,
        }
    }
}

fn amount(raw: &str) -> Amount {
    Amount::parse_or_zero(raw)
}

fn bounded_decimals(raw: Option<u64>) -> Option<u32> {
    raw.map(|d| d.min(u64::from(MAX_TOKEN_DECIMALS)) as u32)
}

fn decimals(raw: Option<u64>) -> u32 {
    bounded_decimals(raw).unwrap_or(DEFAULT_TOKEN_DECIMALS)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccount {
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "de::amount_lenient")]
    pub balance: String,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub nonce: u64,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub cfx_transfer_count: u64,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub erc20_transfer_count: u64,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub erc721_transfer_count: u64,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub erc1155_transfer_count: u64,
    #[serde(default, deserialize_with = "de::amount_lenient")]
    pub staking_balance: String,
}

impl From<RawAccount> for AddressDetail {
    fn from(raw: RawAccount) -> Self {
        AddressDetail {
            address: raw.address,
            balance: amount(&raw.balance),
            nonce: raw.nonce,
            native_transfer_count: raw.cfx_transfer_count,
            erc20_transfer_count: raw.erc20_transfer_count,
            erc721_transfer_count: raw.erc721_transfer_count,
            erc1155_transfer_count: raw.erc1155_transfer_count,
            staking_balance: amount(&raw.staking_balance),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTx {
    pub hash: String,
    #[serde(default, deserialize_with = "de::string_lenient")]
    pub from: String,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "de::amount_lenient")]
    pub value: String,
    #[serde(default, deserialize_with = "de::amount_lenient")]
    pub gas_fee: String,
    #[serde(default, deserialize_with = "de::amount_lenient")]
    pub gas_price: String,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub nonce: u64,
    #[serde(default, deserialize_with = "de::opt_u64_lenient")]
    pub epoch_number: Option<u64>,
    #[serde(default, deserialize_with = "de::i64_lenient")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i64_lenient")]
    pub status: Option<i64>,
}

impl From<RawTx> for NativeTx {
    fn from(raw: RawTx) -> Self {
        NativeTx {
            hash: raw.hash,
            from: raw.from,
            to: raw.to,
            value: amount(&raw.value),
            gas_fee: amount(&raw.gas_fee),
            gas_price: amount(&raw.gas_price),
            nonce: raw.nonce,
            block_height: raw.epoch_number,
            timestamp: raw.timestamp,
            method: raw.method,
            status: raw.status,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenRef {
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "de::string_lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string_lenient")]
    pub symbol: String,
    #[serde(default, deserialize_with = "de::opt_u64_lenient")]
    pub decimals: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransfer {
    pub transaction_hash: String,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub epoch_number: u64,
    #[serde(default, deserialize_with = "de::string_lenient")]
    pub from: String,
    #[serde(default, deserialize_with = "de::string_lenient")]
    pub to: String,
    #[serde(default, deserialize_with = "de::amount_lenient")]
    pub value: String,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub address: Option<String>,
    #[serde(default)]
    pub transfer_token_info: Option<RawTokenRef>,
    #[serde(default, deserialize_with = "de::i64_lenient")]
    pub timestamp: i64,
}

impl From<RawTransfer> for TokenTransfer {
    fn from(raw: RawTransfer) -> Self {
        let info = raw.transfer_token_info.unwrap_or_default();
        TokenTransfer {
            tx_hash: raw.transaction_hash,
            block_height: raw.epoch_number,
            from: raw.from,
            to: raw.to,
            value: amount(&raw.value),
            token: TokenMeta {
                contract: info.address.or(raw.address),
                name: info.name,
                symbol: info.symbol,
                decimals: decimals(info.decimals),
            },
            timestamp: raw.timestamp,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHolding {
    pub address: String,
    #[serde(default, deserialize_with = "de::string_lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string_lenient")]
    pub symbol: String,
    #[serde(default, deserialize_with = "de::opt_u64_lenient")]
    pub decimals: Option<u64>,
    #[serde(default, deserialize_with = "de::amount_lenient")]
    pub amount: String,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub icon_url: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub total_price: Option<String>,
}

impl From<RawHolding> for TokenHolding {
    fn from(raw: RawHolding) -> Self {
        TokenHolding {
            contract: raw.address,
            name: raw.name,
            symbol: raw.symbol,
            decimals: decimals(raw.decimals),
            amount: amount(&raw.amount),
            icon_url: raw.icon_url,
            price: raw.price,
            total_value: raw.total_price,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawAccountRef {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct RawHolder {
    #[serde(default)]
    pub account: Option<RawAccountRef>,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "de::amount_lenient")]
    pub balance: String,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub percentage: Option<String>,
}

impl From<RawHolder> for TokenHolder {
    fn from(raw: RawHolder) -> Self {
        TokenHolder {
            address: raw
                .account
                .map(|a| a.address)
                .or(raw.address)
                .unwrap_or_default(),
            balance: amount(&raw.balance),
            percentage: raw.percentage,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenInfo {
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "de::opt_u64_lenient")]
    pub decimals: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub icon_url: Option<String>,
    #[serde(default, deserialize_with = "de::opt_u64_lenient")]
    pub holder_count: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_u64_lenient")]
    pub transfer_count: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub total_price: Option<String>,
    #[serde(default, deserialize_with = "de::opt_amount_lenient")]
    pub total_supply: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub website: Option<String>,
}

impl RawTokenInfo {
    pub fn into_token_info(self, requested: &str) -> TokenInfo {
        TokenInfo {
            contract: self.address.unwrap_or_else(|| requested.to_string()),
            name: self.name,
            symbol: self.symbol,
            decimals: bounded_decimals(self.decimals),
            icon_url: self.icon_url,
            holder_count: self.holder_count,
            transfer_count: self.transfer_count,
            price: self.price,
            total_price: self.total_price,
            total_supply: self.total_supply.as_deref().and_then(Amount::parse),
            website: self.website,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDailyStat {
    #[serde(default, alias = "statTime", deserialize_with = "de::string_lenient")]
    pub day: String,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub transfer_count: u64,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub unique_sender: u64,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub unique_receiver: u64,
    #[serde(default, deserialize_with = "de::opt_u64_lenient")]
    pub holder_count: Option<u64>,
}

impl From<RawDailyStat> for DailyTokenStat {
    fn from(raw: RawDailyStat) -> Self {
        DailyTokenStat {
            day: raw.day,
            transfer_count: raw.transfer_count,
            unique_sender: raw.unique_sender,
            unique_receiver: raw.unique_receiver,
            holder_count: raw.holder_count,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBlock {
    #[serde(default, alias = "blockNumber", deserialize_with = "de::u64_lenient")]
    pub epoch_number: u64,
    pub hash: String,
    #[serde(default, deserialize_with = "de::string_lenient")]
    pub parent_hash: String,
    #[serde(default, deserialize_with = "de::string_lenient")]
    pub nonce: String,
    #[serde(default, deserialize_with = "de::amount_lenient")]
    pub gas_limit: String,
    #[serde(default, deserialize_with = "de::amount_lenient")]
    pub gas_used: String,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub size: u64,
    #[serde(default, deserialize_with = "de::string_lenient")]
    pub difficulty: String,
    #[serde(default, deserialize_with = "de::i64_lenient")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub transaction_count: u64,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub miner: Option<String>,
}

impl From<RawBlock> for Block {
    fn from(raw: RawBlock) -> Self {
        Block {
            height: raw.epoch_number,
            hash: raw.hash,
            parent_hash: raw.parent_hash,
            nonce: raw.nonce,
            gas_limit: amount(&raw.gas_limit),
            gas_used: amount(&raw.gas_used),
            size: raw.size,
            difficulty: raw.difficulty,
            timestamp: raw.timestamp,
            transaction_count: raw.transaction_count,
            miner: raw.miner,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDashboard {
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub block_number: u64,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub epoch_number: u64,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub address_count: u64,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub transaction_count: u64,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub contract_count: u64,
}

impl From<RawDashboard> for NetworkDashboard {
    fn from(raw: RawDashboard) -> Self {
        NetworkDashboard {
            block_number: raw.block_number,
            epoch_number: raw.epoch_number,
            address_count: raw.address_count,
            transaction_count: raw.transaction_count,
            contract_count: raw.contract_count,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlot {
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub tps: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub block_time: Option<String>,
}

impl From<RawPlot> for PlotSample {
    fn from(raw: RawPlot) -> Self {
        PlotSample {
            tps: raw.tps.and_then(|v| v.parse().ok()),
            block_time: raw.block_time.and_then(|v| v.parse().ok()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RawGasPriceInfo {
    #[serde(default, deserialize_with = "de::opt_amount_lenient")]
    pub min: Option<String>,
    #[serde(default, deserialize_with = "de::opt_amount_lenient")]
    pub tp50: Option<String>,
    #[serde(default, deserialize_with = "de::opt_amount_lenient")]
    pub max: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGasTracker {
    #[serde(default)]
    pub gas_price_info: Option<RawGasPriceInfo>,
}

impl From<RawGasTracker> for GasPriceInfo {
    fn from(raw: RawGasTracker) -> Self {
        let info = raw.gas_price_info.unwrap_or_default();
        GasPriceInfo {
            min: info.min.as_deref().and_then(Amount::parse),
            tp50: info.tp50.as_deref().and_then(Amount::parse),
            max: info.max.as_deref().and_then(Amount::parse),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChartEntry {
    #[serde(default, deserialize_with = "de::string_lenient")]
    pub stat_time: String,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub count: u64,
}

impl From<RawChartEntry> for ChartPoint {
    fn from(raw: RawChartEntry) -> Self {
        ChartPoint {
            stat_time: raw.stat_time,
            count: raw.count,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMinerDetail {
    #[serde(default, deserialize_with = "de::amount_lenient")]
    pub total_reward: String,
}

impl RawMinerDetail {
    pub fn reward(&self) -> Amount {
        amount(&self.total_reward)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMinerEntry {
    #[serde(default, deserialize_with = "de::opt_u64_lenient")]
    pub rank: Option<u64>,
    pub miner: String,
    #[serde(default, deserialize_with = "de::amount_lenient")]
    pub total_reward: String,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub win_count: u64,
    #[serde(default, deserialize_with = "de::u64_lenient")]
    pub mining_attempts: u64,
}

impl From<RawMinerEntry> for MinerRecord {
    fn from(raw: RawMinerEntry) -> Self {
        MinerRecord {
            address: raw.miner,
            rank: raw.rank,
            total_reward: amount(&raw.total_reward),
            win_count: raw.win_count,
            attempts: raw.mining_attempts,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawMinerList {
    #[serde(default = "Vec::new")]
    pub list: Vec<RawMinerEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_falls_back_to_default_decimals() {
        let raw: RawTransfer = serde_json::from_str(
            r#"{
                "transactionHash": "0xfeed",
                "epochNumber": "812",
                "from": "0xaaa",
                "to": "0xbbb",
                "value": "2500000",
                "address": "0xtoken",
                "transferTokenInfo": {"name": "Test", "symbol": "TST", "decimals": null},
                "timestamp": 1700000000
            }"#,
        )
        .unwrap();
        let transfer = TokenTransfer::from(raw);
        assert_eq!(transfer.block_height, 812);
        assert_eq!(transfer.token.decimals, 18);
        assert_eq!(transfer.token.contract.as_deref(), Some("0xtoken"));
        assert_eq!(transfer.value, Amount::from(2_500_000));
    }

    #[test]
    fn holder_address_comes_from_nested_account() {
        let raw: RawHolder = serde_json::from_str(
            r#"{"account": {"address": "0xholder"}, "balance": "10", "percentage": 1.5}"#,
        )
        .unwrap();
        let holder = TokenHolder::from(raw);
        assert_eq!(holder.address, "0xholder");
        assert_eq!(holder.percentage.as_deref(), Some("1.5"));
    }

    #[test]
    fn tx_without_hash_is_rejected() {
        let raw = serde_json::from_str::<RawTx>(r#"{"from": "0xaaa", "value": "1"}"#);
        assert!(raw.is_err());
    }

    #[test]
    fn raw_list_keeps_server_total() {
        let raw: RawList<RawChartEntry> = serde_json::from_str(
            r#"{"list": [{"statTime": "2025-06-01", "count": "12"}], "total": "340"}"#,
        )
        .unwrap();
        let page = raw.into_page(ChartPoint::from);
        assert_eq!(page.total, 340);
        assert_eq!(page.list[0].count, 12);
    }

    #[test]
    fn hostile_decimals_are_bounded() {
        let raw: RawHolding = serde_json::from_str(
            r#"{"address": "0xtoken", "decimals": 4294967295, "amount": "5"}"#,
        )
        .unwrap();
        let holding = TokenHolding::from(raw);
        assert_eq!(holding.decimals, MAX_TOKEN_DECIMALS);
        assert_eq!(holding.amount.scaled(holding.decimals), format!("0.{}5", "0".repeat(76)));

        let info: RawTokenInfo =
            serde_json::from_str(r#"{"decimals": "99999999999"}"#).unwrap();
        assert_eq!(info.into_token_info("0xt").decimals, Some(MAX_TOKEN_DECIMALS));
    }
}
