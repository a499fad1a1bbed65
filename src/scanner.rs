use async_trait::async_trait;

use crate::error::FetchResult;
use crate::explorer::Explorer;
use crate::models::NativeTx;
use crate::pagination::PageRequest;

/// Something that serves a list one window at a time.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    async fn fetch_page(&self, window: &PageRequest) -> FetchResult<Vec<Self::Item>>;
}

/// Walks `source` one page after another, counting items accepted by
/// `predicate`. The walk ends on a short page, once `cap` items have been
/// scanned, or on the first failed page; the count gathered so far is
/// returned in every case.
///
/// `cap` is exact: the last window shrinks to what is left of it, and items
/// served past a window's limit are ignored.
pub async fn count_matching<S, F>(source: &S, page_size: u64, cap: u64, predicate: F) -> u64
where
    S: PageSource + ?Sized,
    F: Fn(&S::Item) -> bool,
{
    let page_size = page_size.max(1);
    let mut scanned = 0u64;
    let mut matched = 0u64;

    while scanned < cap {
        let window = PageRequest::new(page_size.min(cap - scanned), scanned);
        let items = match source.fetch_page(&window).await {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(
                    "scan aborted at skip={} after {} items: {}",
                    window.skip,
                    scanned,
                    err
                );
                break;
            }
        };
        let served = items.len().min(window.limit as usize);
        matched += items[..served].iter().filter(|item| predicate(*item)).count() as u64;
        scanned += served as u64;
        if (served as u64) < window.limit {
            break;
        }
    }

    tracing::debug!("scanned {} items, {} matched", scanned, matched);
    matched
}

/// Matches transactions that called `selector` and finished with `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageTxFilter {
    pub selector: String,
    pub status: i64,
}

impl StorageTxFilter {
    pub fn matches(&self, tx: &NativeTx) -> bool {
        let method_matches = tx
            .method
            .as_deref()
            .map_or(false, |method| method.eq_ignore_ascii_case(&self.selector));
        method_matches && tx.status == Some(self.status)
    }
}

struct CounterpartyTxs<'a> {
    explorer: &'a Explorer,
    account: &'a str,
    counterparty: &'a str,
}

#[async_trait]
impl PageSource for CounterpartyTxs<'_> {
    type Item = NativeTx;

    async fn fetch_page(&self, window: &PageRequest) -> FetchResult<Vec<NativeTx>> {
        let page = self
            .explorer
            .counterparty_page(self.account, self.counterparty, window)
            .await?;
        Ok(page.list)
    }
}

impl Explorer {
    /// Number of storage submissions `account` sent to the flow contract.
    pub async fn storage_tx_count(&self, account: &str) -> u64 {
        let scan = &self.storage_scan;
        let source = CounterpartyTxs {
            explorer: self,
            account,
            counterparty: &scan.counterparty,
        };
        let filter = StorageTxFilter {
            selector: scan.method_selector.clone(),
            status: scan.status,
        };
        count_matching(&source, scan.page_size, scan.cap, |tx| filter.matches(tx)).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::api::test_support::*;
    use crate::api::MockHttpTransport;
    use crate::config::StorageScanConfig;
    use crate::error::FetchError;
    use crate::explorer::test_support::explorer_with_scan;

    /// Serves `sizes[i]` items for the i-th page, ignoring the window limit
    /// the way a misbehaving server might.
    struct Pages {
        sizes: Vec<u64>,
        fail_at: Option<usize>,
        calls: AtomicU64,
        windows: Mutex<Vec<PageRequest>>,
    }

    impl Pages {
        fn new(sizes: &[u64]) -> Self {
            Self {
                sizes: sizes.to_vec(),
                fail_at: None,
                calls: AtomicU64::new(0),
                windows: Mutex::new(Vec::new()),
            }
        }

        fn windows(&self) -> Vec<PageRequest> {
            self.windows.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for Pages {
        type Item = u64;

        async fn fetch_page(&self, window: &PageRequest) -> FetchResult<Vec<u64>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            self.windows.lock().unwrap().push(*window);
            if self.fail_at == Some(call) {
                return Err(FetchError::Transport("reset by peer".into()));
            }
            let size = self.sizes.get(call).copied().unwrap_or(0);
            Ok((0..size).collect())
        }
    }

    #[tokio::test]
    async fn stops_after_a_short_page() {
        let pages = Pages::new(&[100, 100, 40, 100]);
        let count = count_matching(&pages, 100, 10_000, |_| true).await;
        assert_eq!(count, 240);
        assert_eq!(
            pages.windows(),
            [
                PageRequest::new(100, 0),
                PageRequest::new(100, 100),
                PageRequest::new(100, 200)
            ]
        );
    }

    #[tokio::test]
    async fn cap_is_exact() {
        let pages = Pages::new(&[100; 10]);
        let count = count_matching(&pages, 100, 250, |_| true).await;
        assert_eq!(count, 250);
        assert_eq!(
            pages.windows(),
            [
                PageRequest::new(100, 0),
                PageRequest::new(100, 100),
                PageRequest::new(50, 200)
            ]
        );
    }

    #[tokio::test]
    async fn oversized_pages_count_only_the_window() {
        let pages = Pages::new(&[150, 150]);
        let count = count_matching(&pages, 100, 10_000, |_| true).await;
        assert_eq!(count, 200);
        assert_eq!(pages.windows()[1], PageRequest::new(100, 100));
        assert_eq!(pages.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_cap_fetches_nothing() {
        let pages = Pages::new(&[100]);
        assert_eq!(count_matching(&pages, 100, 0, |_| true).await, 0);
        assert!(pages.windows().is_empty());
    }

    #[tokio::test]
    async fn failure_keeps_the_partial_count() {
        let mut pages = Pages::new(&[100, 100, 100]);
        pages.fail_at = Some(1);
        let count = count_matching(&pages, 100, 10_000, |n| *n % 2 == 0).await;
        assert_eq!(count, 50);
        assert_eq!(pages.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn first_page_failure_counts_zero() {
        let mut pages = Pages::new(&[100]);
        pages.fail_at = Some(0);
        assert_eq!(count_matching(&pages, 100, 10_000, |_| true).await, 0);
    }

    fn tx(method: Option<&str>, status: Option<i64>) -> NativeTx {
        NativeTx {
            hash: "0x01".into(),
            from: "0xaaa".into(),
            to: Some("0xflow".into()),
            value: Default::default(),
            gas_fee: Default::default(),
            gas_price: Default::default(),
            nonce: 0,
            block_height: None,
            timestamp: 0,
            method: method.map(str::to_string),
            status,
        }
    }

    #[test]
    fn filter_needs_selector_and_status() {
        let filter = StorageTxFilter {
            selector: "0xef3e12dc".into(),
            status: 0,
        };
        assert!(filter.matches(&tx(Some("0xEF3E12DC"), Some(0))));
        assert!(!filter.matches(&tx(Some("0xef3e12dc"), Some(1))));
        assert!(!filter.matches(&tx(Some("0xa9059cbb"), Some(0))));
        assert!(!filter.matches(&tx(None, Some(0))));
        assert!(!filter.matches(&tx(Some("0xef3e12dc"), None)));
    }

    #[tokio::test]
    async fn storage_tx_count_queries_the_flow_contract() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .withf(|url| {
                let query = url.query().unwrap_or_default();
                url.path() == "/v1/transaction"
                    && query.contains("accountAddress=0xaaa")
                    && query.contains("to=0xflow")
                    && query.contains("limit=5")
            })
            .times(1)
            .returning(|_| {
                scan_ok(json!({ "total": 3, "list": [
                    { "hash": "0x1", "method": "0xef3e12dc", "status": 0 },
                    { "hash": "0x2", "method": "0xef3e12dc", "status": 1 },
                    { "hash": "0x3", "method": "0xef3e12dc", "status": "0" }
                ]}))
            });
        let scan = StorageScanConfig {
            counterparty: "0xflow".into(),
            page_size: 5,
            ..StorageScanConfig::default()
        };
        let explorer = explorer_with_scan(mock, scan);

        assert_eq!(explorer.storage_tx_count("0xaaa").await, 2);
    }
}
