use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::raw::{RawHolder, RawList, RawTransfer, RawTx};
use crate::error::{Fallback, FetchResult};
use crate::explorer::Explorer;
use crate::models::{NativeTx, TokenHolder, TokenTransfer};

pub const DEFAULT_LIMIT: u64 = 10;

/// A zero-based `limit`/`skip` window over a list resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u64,
    pub skip: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            skip: 0,
        }
    }
}

impl PageRequest {
    pub fn new(limit: u64, skip: u64) -> Self {
        Self {
            limit: limit.max(1),
            skip,
        }
    }

    /// Window for the zero-based page `index`.
    pub fn page(index: u64, limit: u64) -> Self {
        let limit = limit.max(1);
        Self {
            limit,
            skip: index.saturating_mul(limit),
        }
    }

    pub fn index(&self) -> u64 {
        self.skip / self.limit.max(1)
    }

    pub fn next(&self) -> Self {
        Self {
            limit: self.limit,
            skip: self.skip.saturating_add(self.limit),
        }
    }

    pub fn has_previous(&self) -> bool {
        self.skip > 0
    }

    fn query(&self) -> [(&'static str, String); 2] {
        [
            ("limit", self.limit.to_string()),
            ("skip", self.skip.to_string()),
        ]
    }
}

/// One page of a list resource plus the server-reported total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub list: Vec<T>,
    pub total: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            list: Vec::new(),
            total: 0,
        }
    }

    pub fn page_count(&self, limit: u64) -> u64 {
        self.total.div_ceil(limit.max(1))
    }

    pub fn has_next(&self, window: &PageRequest) -> bool {
        window.skip.saturating_add(window.limit) < self.total
    }

    /// Pages an already-fetched list on the client side.
    pub fn from_slice(items: &[T], window: &PageRequest) -> Self
    where
        T: Clone,
    {
        let start = usize::try_from(window.skip).unwrap_or(usize::MAX);
        let list = items
            .iter()
            .skip(start)
            .take(usize::try_from(window.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Self {
            list,
            total: items.len() as u64,
        }
    }
}

/// Milliseconds at 00:00 UTC of the day containing `now`.
fn start_of_day_millis(now: DateTime<Utc>) -> i64 {
    now.timestamp().div_euclid(86_400) * 86_400_000
}

impl Explorer {
    async fn fetch_page<R, T>(
        &self,
        segments: &[&str],
        filters: Vec<(&str, String)>,
        window: &PageRequest,
        what: &str,
    ) -> FetchResult<Page<T>>
    where
        R: DeserializeOwned,
        T: From<R>,
    {
        let mut query = filters;
        query.extend(window.query());
        let raw: RawList<R> = self.client.scan(segments, &query, what).await?;
        Ok(raw.into_page(T::from))
    }

    pub async fn address_transactions(&self, address: &str, window: PageRequest) -> Page<NativeTx> {
        self.fetch_page::<RawTx, NativeTx>(
            &["v1", "transaction"],
            vec![
                ("accountAddress", address.to_string()),
                ("tab", "transaction".to_string()),
            ],
            &window,
            "transactions",
        )
        .await
        .or_default_logged("address transactions")
    }

    pub async fn erc20_transfers(&self, address: &str, window: PageRequest) -> Page<TokenTransfer> {
        self.fetch_page::<RawTransfer, TokenTransfer>(
            &["v1", "transfer"],
            vec![
                ("accountAddress", address.to_string()),
                ("tab", "transfers-ERC20".to_string()),
                ("transferType", "ERC20".to_string()),
            ],
            &window,
            "transfers",
        )
        .await
        .or_default_logged("ERC20 transfers")
    }

    pub async fn token_transfers(&self, contract: &str, window: PageRequest) -> Page<TokenTransfer> {
        self.fetch_page::<RawTransfer, TokenTransfer>(
            &["v1", "transfer"],
            vec![
                ("address", contract.to_string()),
                ("tab", "transfers".to_string()),
                ("transferType", "ERC20".to_string()),
            ],
            &window,
            "transfers",
        )
        .await
        .or_default_logged("token transfers")
    }

    /// Holders of a token ordered by balance, largest first.
    pub async fn token_holders(&self, contract: &str, window: PageRequest) -> Page<TokenHolder> {
        self.fetch_page::<RawHolder, TokenHolder>(
            &["stat", "tokens", "holder-rank"],
            vec![
                ("address", contract.to_string()),
                ("orderBy", "balance".to_string()),
                ("reverse", "true".to_string()),
                ("tab", "holders".to_string()),
            ],
            &window,
            "holders",
        )
        .await
        .or_default_logged("token holders")
    }

    /// Network-wide transactions since 00:00 UTC today, newest first.
    pub async fn latest_transactions(&self, window: PageRequest) -> Page<NativeTx> {
        self.fetch_page::<RawTx, NativeTx>(
            &["v1", "transaction"],
            vec![
                ("t", start_of_day_millis(Utc::now()).to_string()),
                ("tab", "transactions".to_string()),
            ],
            &window,
            "transactions",
        )
        .await
        .or_default_logged("latest transactions")
    }

    /// Transactions of one block with `from`/`to` resolved to hex.
    pub async fn block_transactions(&self, block_hash: &str, window: PageRequest) -> Page<NativeTx> {
        let page = match self
            .fetch_page::<RawTx, NativeTx>(
                &["v1", "transaction"],
                vec![
                    ("blockHash", block_hash.to_string()),
                    ("tab", "transactions".to_string()),
                ],
                &window,
                "transactions",
            )
            .await
        {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!("block transactions for {} failed: {}", block_hash, err);
                return Page::empty();
            }
        };

        let list = join_all(page.list.into_iter().map(|tx| self.resolve_tx(tx))).await;
        Page {
            list,
            total: page.total,
        }
    }

    /// One page of `account`'s transactions sent to `counterparty`. Failures
    /// are returned, not swallowed, so the scanner can stop on them.
    pub(crate) async fn counterparty_page(
        &self,
        account: &str,
        counterparty: &str,
        window: &PageRequest,
    ) -> FetchResult<Page<NativeTx>> {
        self.fetch_page::<RawTx, NativeTx>(
            &["v1", "transaction"],
            vec![
                ("accountAddress", account.to_string()),
                ("to", counterparty.to_string()),
                ("reverse", "true".to_string()),
            ],
            window,
            "transactions",
        )
        .await
    }

    async fn resolve_tx(&self, mut tx: NativeTx) -> NativeTx {
        let (from, to) = tokio::join!(
            self.resolver.resolve(&tx.from),
            self.resolver.resolve_opt(tx.to.as_deref()),
        );
        tx.from = from;
        tx.to = to;
        tx
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::api::test_support::*;
    use crate::api::MockHttpTransport;
    use crate::error::FetchError;
    use crate::explorer::test_support::explorer_with;

    #[test]
    fn windows_are_zero_based() {
        let window = PageRequest::page(2, 10);
        assert_eq!(window.skip, 20);
        assert_eq!(window.index(), 2);
        assert_eq!(window.next().skip, 30);
        assert!(!PageRequest::default().has_previous());
        assert_eq!(PageRequest::new(0, 5).limit, 1);
    }

    #[test]
    fn page_count_uses_server_total() {
        let page = Page {
            list: vec![1, 2, 3],
            total: 23,
        };
        assert_eq!(page.page_count(10), 3);
        assert!(page.has_next(&PageRequest::page(1, 10)));
        assert!(!page.has_next(&PageRequest::page(2, 10)));
        assert_eq!(Page::<u8>::empty().page_count(10), 0);
    }

    #[test]
    fn client_side_paging_reports_full_length() {
        let items: Vec<u32> = (0..25).collect();
        let page = Page::from_slice(&items, &PageRequest::page(2, 10));
        assert_eq!(page.list, vec![20, 21, 22, 23, 24]);
        assert_eq!(page.total, 25);
        assert!(Page::from_slice(&items, &PageRequest::page(5, 10)).list.is_empty());
    }

    #[test]
    fn day_start_is_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 17, 45, 3).unwrap();
        let midnight = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(start_of_day_millis(now), midnight.timestamp_millis());
    }

    #[tokio::test]
    async fn address_transactions_map_list_and_total() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .withf(|url| {
                url.path() == "/v1/transaction"
                    && url.query()
                        == Some("accountAddress=0xaaa&tab=transaction&limit=10&skip=20")
            })
            .times(1)
            .returning(|_| {
                scan_ok(json!({
                    "total": 57,
                    "list": [
                        { "hash": "0x01", "from": "0xaaa", "to": "0xbbb", "value": "5",
                          "gasFee": "21000", "epochNumber": 100, "timestamp": 1700000000,
                          "method": "0xa9059cbb", "status": 0 }
                    ]
                }))
            });
        let explorer = explorer_with(mock);

        let page = explorer
            .address_transactions("0xaaa", PageRequest::page(2, 10))
            .await;
        assert_eq!(page.total, 57);
        assert_eq!(page.list.len(), 1);
        assert_eq!(page.list[0].block_height, Some(100));
        assert_eq!(page.list[0].method.as_deref(), Some("0xa9059cbb"));
    }

    #[tokio::test]
    async fn failures_yield_exactly_the_empty_page() {
        let mut mock = MockHttpTransport::new();
        let mut call = 0;
        mock.expect_get().times(6).returning(move |_| {
            call += 1;
            match call {
                1 | 5 => Err(FetchError::Transport("timed out".into())),
                2 => Err(FetchError::HttpStatus(500)),
                3 | 6 => Ok(json!({ "status": "0", "message": "busy", "result": null }).to_string()),
                _ => Ok("not json".to_string()),
            }
        });
        let explorer = explorer_with(mock);

        assert_eq!(
            explorer.erc20_transfers("0xaaa", PageRequest::default()).await,
            Page::empty()
        );
        assert_eq!(
            explorer.token_transfers("0xt", PageRequest::default()).await,
            Page::empty()
        );
        assert_eq!(
            explorer.token_holders("0xt", PageRequest::default()).await,
            Page::empty()
        );
        assert_eq!(
            explorer.latest_transactions(PageRequest::default()).await,
            Page::empty()
        );
        assert_eq!(
            explorer.address_transactions("0xaaa", PageRequest::default()).await,
            Page::empty()
        );
        // a failed listing resolves no addresses
        assert_eq!(
            explorer.block_transactions("0xblock", PageRequest::default()).await,
            Page::empty()
        );
    }

    #[tokio::test]
    async fn block_transactions_resolve_native_addresses() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .withf(|url| url.path() == "/v1/transaction")
            .times(1)
            .returning(|_| {
                scan_ok(json!({
                    "total": 2,
                    "list": [
                        { "hash": "0x01", "from": "net16601:aaa", "to": "0x0000000000000000000000000000000000000002" },
                        { "hash": "0x02", "from": "0x0000000000000000000000000000000000000003", "to": "net16601:bbb" }
                    ]
                }))
            });
        mock.expect_get()
            .withf(|url| url.path() == "/v1/account/net16601:aaa")
            .times(1)
            .returning(|_| scan_ok(json!({ "address": "0x0000000000000000000000000000000000000001" })));
        mock.expect_get()
            .withf(|url| url.path() == "/v1/account/net16601:bbb")
            .times(1)
            .returning(|_| Err(FetchError::Transport("reset".into())));
        let explorer = explorer_with(mock);

        let page = explorer
            .block_transactions("0xblock", PageRequest::default())
            .await;
        assert_eq!(page.total, 2);
        assert_eq!(page.list[0].from, "0x0000000000000000000000000000000000000001");
        assert_eq!(
            page.list[0].to.as_deref(),
            Some("0x0000000000000000000000000000000000000002")
        );
        // failed resolution keeps the native form
        assert_eq!(page.list[1].to.as_deref(), Some("net16601:bbb"));
    }
}
