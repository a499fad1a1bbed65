pub mod de;
pub mod envelope;
pub mod raw;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Config;
use crate::error::{FetchError, FetchResult};
use crate::fetch_stats::{FetchSnapshot, FetchStats};
use envelope::{DataEnvelope, ScanEnvelope};

/// Raw HTTP GET against an upstream. Implementations return the body of a 2xx
/// response and map everything else into a [FetchError].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: Url) -> FetchResult<String>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("galileo-scan/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: Url) -> FetchResult<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// The three upstream services the explorer talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Explorer,
    StorageScan,
    MinerStats,
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub explorer: Url,
    pub storage_scan: Url,
    pub miner_stats: Url,
}

impl Endpoints {
    pub fn from_config(config: &Config) -> Self {
        Self {
            explorer: config.explorer_api_url.clone(),
            storage_scan: config.storage_scan_url.clone(),
            miner_stats: config.miner_stats_url.clone(),
        }
    }

    /// All services behind one base URL, as in a local mock upstream.
    pub fn single(base: Url) -> Self {
        Self {
            explorer: base.clone(),
            storage_scan: base.clone(),
            miner_stats: base,
        }
    }

    fn base(&self, service: Service) -> &Url {
        match service {
            Service::Explorer => &self.explorer,
            Service::StorageScan => &self.storage_scan,
            Service::MinerStats => &self.miner_stats,
        }
    }
}

/// Query string pairs; repeated keys are allowed (`fields=a&fields=b`).
pub type Query<'a> = [(&'a str, String)];

#[derive(Clone)]
pub struct ScanClient {
    transport: Arc<dyn HttpTransport>,
    endpoints: Endpoints,
    stats: Arc<FetchStats>,
}

impl ScanClient {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
            stats: Arc::new(FetchStats::new()),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(config.http_timeout)?;
        Ok(Self::new(Arc::new(transport), Endpoints::from_config(config)))
    }

    pub fn stats(&self) -> FetchSnapshot {
        self.stats.snapshot()
    }

    pub fn url(&self, service: Service, segments: &[&str], query: &Query<'_>) -> FetchResult<Url> {
        let mut url = self.endpoints.base(service).clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Malformed("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> FetchResult<T> {
        tracing::debug!("GET {}", url);
        self.stats.inc_requests();
        let body = self.transport.get(url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn observe<T>(&self, result: FetchResult<T>) -> FetchResult<T> {
        if let Err(err) = &result {
            self.stats.record_failure(err.kind());
        }
        result
    }

    /// GET a chain-scan endpoint and unwrap its `{ status, result }` envelope.
    pub async fn scan<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &Query<'_>,
        what: &str,
    ) -> FetchResult<T> {
        let result = async {
            let url = self.url(Service::Explorer, segments, query)?;
            let envelope: ScanEnvelope<T> = self.get_json(url).await?;
            envelope.into_result(what)
        }
        .await;
        self.observe(result)
    }

    /// GET a storage-scan or miner-stats endpoint and unwrap its `{ code, data }` envelope.
    pub async fn data<T: DeserializeOwned>(
        &self,
        service: Service,
        segments: &[&str],
        query: &Query<'_>,
        what: &str,
    ) -> FetchResult<T> {
        let result = async {
            let url = self.url(service, segments, query)?;
            let envelope: DataEnvelope<T> = self.get_json(url).await?;
            envelope.into_result(what)
        }
        .await;
        self.observe(result)
    }
}
