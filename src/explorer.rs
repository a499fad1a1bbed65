use anyhow::Result;
use serde::de::DeserializeOwned;

use crate::api::raw::{
    RawAccount, RawBlock, RawChartEntry, RawDailyStat, RawDashboard, RawGasTracker, RawHolding,
    RawList, RawMinerDetail, RawPlot, RawTokenInfo,
};
use crate::api::{ScanClient, Service};
use crate::config::{Config, StorageScanConfig};
use crate::error::{Fallback, FetchError, FetchResult};
use crate::models::{
    AddressDetail, Amount, Block, ChartPoint, Charts, DailyTokenStat, GasPriceInfo,
    NetworkDashboard, PlotSample, TokenHolding, TokenInfo,
};
use crate::resolver::AddressResolver;

const ACCOUNT_FIELDS: [&str; 5] = [
    "cfxTransferCount",
    "erc20TransferCount",
    "erc721TransferCount",
    "erc1155TransferCount",
    "stakingBalance",
];

/// A user-supplied block identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRef {
    Hash(String),
    Height(u64),
}

impl BlockRef {
    /// Accepts `0x` followed by 64 hex digits, or a plain decimal height.
    pub fn parse(value: &str) -> Option<Self> {
        if let Some(hex) = value.strip_prefix("0x") {
            if hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Some(BlockRef::Hash(value.to_string()));
            }
            return None;
        }
        if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
            return value.parse().ok().map(BlockRef::Height);
        }
        None
    }

    fn segment(&self) -> String {
        match self {
            BlockRef::Hash(hash) => hash.clone(),
            BlockRef::Height(height) => height.to_string(),
        }
    }
}

/// Typed entry point to the explorer's upstreams. Construct one per
/// application and pass it to whatever renders the results.
#[derive(Clone)]
pub struct Explorer {
    pub(crate) client: ScanClient,
    pub(crate) resolver: AddressResolver,
    pub(crate) storage_scan: StorageScanConfig,
    pub(crate) miner_network: String,
}

impl Explorer {
    pub fn new(
        client: ScanClient,
        native_prefix: &str,
        storage_scan: StorageScanConfig,
        miner_network: &str,
    ) -> Self {
        Self {
            resolver: AddressResolver::new(client.clone(), native_prefix),
            client,
            storage_scan,
            miner_network: miner_network.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ScanClient::from_config(config)?;
        Ok(Self::new(
            client,
            &config.native_prefix,
            config.storage_scan.clone(),
            &config.miner_network,
        ))
    }

    pub fn client(&self) -> &ScanClient {
        &self.client
    }

    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    pub(crate) async fn fetch_address_detail(&self, address: &str) -> FetchResult<AddressDetail> {
        let query: Vec<(&str, String)> = ACCOUNT_FIELDS
            .iter()
            .map(|field| ("fields", field.to_string()))
            .collect();
        let account: RawAccount = self
            .client
            .scan(&["v1", "account", address], &query, "account")
            .await?;
        Ok(account.into())
    }

    pub async fn address_detail(&self, address: &str) -> Option<AddressDetail> {
        self.fetch_address_detail(address)
            .await
            .map(Some)
            .or_default_logged("address detail")
    }

    pub(crate) async fn fetch_token_holdings(&self, address: &str) -> FetchResult<Vec<TokenHolding>> {
        let raw: RawList<RawHolding> = self
            .client
            .scan(
                &["v1", "token"],
                &[
                    ("accountAddress", address.to_string()),
                    ("fields", "iconUrl".to_string()),
                ],
                "token holdings",
            )
            .await?;
        Ok(raw.list.into_iter().map(TokenHolding::from).collect())
    }

    pub async fn token_holdings(&self, address: &str) -> Vec<TokenHolding> {
        self.fetch_token_holdings(address)
            .await
            .or_default_logged("token holdings")
    }

    pub(crate) async fn fetch_miner_reward(&self, address: &str) -> FetchResult<Amount> {
        let detail: RawMinerDetail = self
            .client
            .data(
                Service::StorageScan,
                &["api", "miners", address],
                &[("network", self.miner_network.clone())],
                "miner",
            )
            .await?;
        Ok(detail.reward())
    }

    /// Cumulative storage-mining reward of `address`, zero when unknown.
    pub async fn miner_reward(&self, address: &str) -> Amount {
        self.fetch_miner_reward(address)
            .await
            .or_default_logged("miner reward")
    }

    pub(crate) async fn fetch_token_info(&self, contract: &str) -> FetchResult<TokenInfo> {
        let raw: RawTokenInfo = self
            .client
            .scan(
                &["stat", "tokens", "by-address"],
                &[
                    ("address", contract.to_string()),
                    ("fields", "iconUrl".to_string()),
                    ("fields", "transferCount".to_string()),
                    ("fields", "price".to_string()),
                    ("fields", "totalPrice".to_string()),
                    ("fields", "quoteUrl".to_string()),
                ],
                "token",
            )
            .await?;
        Ok(raw.into_token_info(contract))
    }

    pub async fn token_info(&self, contract: &str) -> Option<TokenInfo> {
        self.fetch_token_info(contract)
            .await
            .map(Some)
            .or_default_logged("token info")
    }

    pub(crate) async fn fetch_token_daily_stats(
        &self,
        contract: &str,
    ) -> FetchResult<Vec<DailyTokenStat>> {
        let raw: RawList<RawDailyStat> = self
            .client
            .scan(
                &["stat", "daily-token-stat"],
                &[
                    ("limit", "365".to_string()),
                    ("intervalType", "day".to_string()),
                    ("base32", contract.to_string()),
                ],
                "daily token stats",
            )
            .await?;
        // served newest first
        Ok(raw.list.into_iter().rev().map(DailyTokenStat::from).collect())
    }

    /// Daily transfer statistics of a token, oldest day first.
    pub async fn token_daily_stats(&self, contract: &str) -> Vec<DailyTokenStat> {
        self.fetch_token_daily_stats(contract)
            .await
            .or_default_logged("token daily stats")
    }

    pub async fn block(&self, block: &BlockRef) -> Option<Block> {
        let segment = block.segment();
        let result: FetchResult<RawBlock> = self
            .client
            .scan(&["v1", "block", &segment], &[], "block")
            .await;
        result.map(|raw| Some(raw.into())).or_default_logged("block detail")
    }

    /// Looks up a block from free-form input; `None` without a call when the
    /// input is neither a block hash nor a height.
    pub async fn find_block(&self, value: &str) -> Option<Block> {
        match BlockRef::parse(value.trim()) {
            Some(block) => self.block(&block).await,
            None => {
                tracing::debug!("{:?} is not a block hash or height", value);
                None
            }
        }
    }

    async fn scan_single<R, T>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        what: &str,
    ) -> FetchResult<T>
    where
        R: DeserializeOwned,
        T: From<R>,
    {
        let raw: R = self.client.scan(segments, query, what).await?;
        Ok(T::from(raw))
    }

    pub(crate) async fn fetch_dashboard(&self) -> FetchResult<NetworkDashboard> {
        self.scan_single::<RawDashboard, _>(&["v1", "homeDashboard"], &[], "dashboard")
            .await
    }

    pub(crate) async fn fetch_latest_plot(&self) -> FetchResult<PlotSample> {
        let raw: RawList<RawPlot> = self
            .client
            .scan(
                &["v1", "plot"],
                &[("interval", "133".to_string()), ("limit", "7".to_string())],
                "plot",
            )
            .await?;
        raw.list
            .into_iter()
            .last()
            .map(PlotSample::from)
            .ok_or_else(|| FetchError::NotFound("plot sample".to_string()))
    }

    pub(crate) async fn fetch_gas_price_info(&self) -> FetchResult<GasPriceInfo> {
        self.scan_single::<RawGasTracker, _>(&["stat", "gasprice", "tracker"], &[], "gas price")
            .await
    }

    async fn fetch_chart(&self, segments: &[&str], what: &str) -> FetchResult<Vec<ChartPoint>> {
        let raw: RawList<RawChartEntry> = self
            .client
            .scan(
                segments,
                &[("limit", "30".to_string()), ("intervalType", "day".to_string())],
                what,
            )
            .await?;
        Ok(raw.list.into_iter().rev().map(ChartPoint::from).collect())
    }

    /// Daily transaction counts for the last 30 days, oldest first.
    pub async fn transaction_chart(&self) -> Vec<ChartPoint> {
        self.fetch_chart(&["open", "statistics", "transaction"], "transaction chart")
            .await
            .or_default_logged("transaction chart")
    }

    /// Daily new-account counts for the last 30 days, oldest first.
    pub async fn account_growth_chart(&self) -> Vec<ChartPoint> {
        self.fetch_chart(&["open", "statistics", "account", "growth"], "account growth chart")
            .await
            .or_default_logged("account growth chart")
    }

    pub async fn charts(&self) -> Charts {
        let (transactions, account_growth) =
            tokio::join!(self.transaction_chart(), self.account_growth_chart());
        Charts {
            transactions,
            account_growth,
        }
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::test_support::*;
    use super::*;
    use crate::api::test_support::*;
    use crate::api::MockHttpTransport;

    #[test]
    fn block_ref_accepts_hashes_and_heights_only() {
        let hash = format!("0x{}", "aB".repeat(32));
        assert_eq!(BlockRef::parse(&hash), Some(BlockRef::Hash(hash.clone())));
        assert_eq!(BlockRef::parse("12345"), Some(BlockRef::Height(12345)));
        assert_eq!(BlockRef::parse("0x1234"), None);
        assert_eq!(BlockRef::parse(&format!("0x{}", "g".repeat(64))), None);
        assert_eq!(BlockRef::parse("-5"), None);
        assert_eq!(BlockRef::parse(""), None);
        assert_eq!(BlockRef::parse("latest"), None);
    }

    #[tokio::test]
    async fn find_block_skips_the_network_for_garbage() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get().never();
        let explorer = explorer_with(mock);

        assert_eq!(explorer.find_block("not-a-block").await, None);
    }

    #[tokio::test]
    async fn block_by_height_maps_fields() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .withf(|url| url.path() == "/v1/block/812")
            .times(1)
            .returning(|_| {
                scan_ok(json!({
                    "epochNumber": 812,
                    "hash": "0xbeef",
                    "parentHash": "0xdead",
                    "gasLimit": "30000000",
                    "gasUsed": "21000",
                    "size": "512",
                    "timestamp": 1700000000,
                    "transactionCount": 1
                }))
            });
        let explorer = explorer_with(mock);

        let block = explorer.find_block("812").await.unwrap();
        assert_eq!(block.height, 812);
        assert_eq!(block.gas_used, Amount::from(21_000));
        assert_eq!(block.size, 512);
        assert_eq!(block.transaction_count, 1);
    }

    #[tokio::test]
    async fn address_detail_requests_counters_and_defaults_to_none() {
        let mut mock = MockHttpTransport::new();
        let mut call = 0;
        mock.expect_get()
            .withf(|url| {
                url.path() == "/v1/account/0xaaa"
                    && url.query_pairs().filter(|(k, _)| k == "fields").count() == 5
            })
            .times(2)
            .returning(move |_| {
                call += 1;
                if call == 1 {
                    scan_ok(json!({ "balance": "2000000000000000000", "nonce": 4 }))
                } else {
                    Err(FetchError::Transport("refused".into()))
                }
            });
        let explorer = explorer_with(mock);

        let detail = explorer.address_detail("0xaaa").await.unwrap();
        assert_eq!(detail.balance.scaled(18), "2");
        assert_eq!(detail.nonce, 4);
        assert_eq!(explorer.address_detail("0xaaa").await, None);
    }

    #[tokio::test]
    async fn charts_are_returned_oldest_first() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .withf(|url| url.path() == "/open/statistics/transaction")
            .returning(|_| {
                scan_ok(json!({ "list": [
                    { "statTime": "2025-06-02", "count": 20 },
                    { "statTime": "2025-06-01", "count": 10 }
                ]}))
            });
        mock.expect_get()
            .withf(|url| url.path() == "/open/statistics/account/growth")
            .returning(|_| Ok(json!({ "status": "0", "result": null }).to_string()));
        let explorer = explorer_with(mock);

        let charts = explorer.charts().await;
        assert_eq!(charts.transactions[0].stat_time, "2025-06-01");
        assert_eq!(charts.transactions[1].count, 20);
        assert!(charts.account_growth.is_empty());
    }

    #[tokio::test]
    async fn latest_plot_takes_last_sample() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .withf(|url| url.path() == "/v1/plot")
            .returning(|_| {
                scan_ok(json!({ "list": [
                    { "tps": "1.5", "blockTime": "0.4" },
                    { "tps": "2.25", "blockTime": "0.35" }
                ]}))
            });
        let explorer = explorer_with(mock);

        let plot = explorer.fetch_latest_plot().await.unwrap();
        assert_eq!(plot.tps, Some(2.25));
        assert_eq!(plot.block_time, Some(0.35));
    }
}
