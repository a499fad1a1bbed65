use std::env;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

pub const DEFAULT_EXPLORER_API_URL: &str = "https://chainscan-galileo.0g.ai/";
pub const DEFAULT_STORAGE_SCAN_URL: &str = "https://storagescan-galileo.0g.ai/";
pub const DEFAULT_MINER_STATS_URL: &str = "https://scan-devnet.0g.ai/";
pub const DEFAULT_ETH_RPC_URL: &str = "https://0g-testnet-rpc.astrostake.xyz";
pub const DEFAULT_NATIVE_PREFIX: &str = "net16601:";
pub const DEFAULT_MINER_NETWORK: &str = "turbo";
pub const DEFAULT_STORAGE_FLOW_ADDRESS: &str = "0x3A0d1d67497Ad770d6f72e7f4B8F0BAbaa2A649C";
pub const DEFAULT_STORAGE_TX_SELECTOR: &str = "0xef3e12dc";
pub const DEFAULT_STORAGE_TX_STATUS: i64 = 0;

#[derive(Debug, Clone)]
pub struct Config {
    pub explorer_api_url: Url,
    pub storage_scan_url: Url,
    pub miner_stats_url: Url,
    pub eth_rpc_url: Url,
    pub native_prefix: String,
    pub miner_network: String,
    pub storage_scan: StorageScanConfig,
    pub http_timeout: Duration,
    pub poll_interval: Duration,
}

/// Parameters of the storage-transaction scan run against the flow contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageScanConfig {
    pub counterparty: String,
    pub method_selector: String,
    pub status: i64,
    pub page_size: u64,
    pub cap: u64,
}

impl Default for StorageScanConfig {
    fn default() -> Self {
        Self {
            counterparty: DEFAULT_STORAGE_FLOW_ADDRESS.to_string(),
            method_selector: DEFAULT_STORAGE_TX_SELECTOR.to_string(),
            status: DEFAULT_STORAGE_TX_STATUS,
            page_size: 100,
            cap: 10_000,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid URL in {var}: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid value {value:?} for {var}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let explorer_api_url = url_var("EXPLORER_API_URL", DEFAULT_EXPLORER_API_URL)?;
        let storage_scan_url = url_var("STORAGE_SCAN_URL", DEFAULT_STORAGE_SCAN_URL)?;
        let miner_stats_url = url_var("MINER_STATS_URL", DEFAULT_MINER_STATS_URL)?;
        let eth_rpc_url = url_var("ETH_RPC_URL", DEFAULT_ETH_RPC_URL)?;

        let native_prefix =
            env::var("NATIVE_ADDRESS_PREFIX").unwrap_or_else(|_| DEFAULT_NATIVE_PREFIX.to_string());
        let miner_network =
            env::var("MINER_NETWORK").unwrap_or_else(|_| DEFAULT_MINER_NETWORK.to_string());

        let defaults = StorageScanConfig::default();
        let storage_scan = StorageScanConfig {
            counterparty: env::var("STORAGE_FLOW_ADDRESS").unwrap_or(defaults.counterparty),
            method_selector: env::var("STORAGE_TX_SELECTOR")
                .map(|s| s.trim().to_lowercase())
                .unwrap_or(defaults.method_selector),
            status: number_var("STORAGE_TX_STATUS", defaults.status)?,
            page_size: positive_var("STORAGE_SCAN_PAGE_SIZE", defaults.page_size)?,
            cap: positive_var("STORAGE_SCAN_CAP", defaults.cap)?,
        };

        let http_timeout = Duration::from_secs(positive_var("HTTP_TIMEOUT_SECS", 15)?);
        let poll_interval = Duration::from_secs(positive_var("POLL_INTERVAL_SECS", 3)?);

        Ok(Self {
            explorer_api_url,
            storage_scan_url,
            miner_stats_url,
            eth_rpc_url,
            native_prefix,
            miner_network,
            storage_scan,
            http_timeout,
            poll_interval,
        })
    }
}

fn url_var(var: &'static str, default: &str) -> Result<Url, ConfigError> {
    let raw = env::var(var).unwrap_or_else(|_| default.to_string());
    parse_base_url(&raw).map_err(|source| ConfigError::InvalidUrl { var, source })
}

/// Parses a base URL, forcing a trailing slash so relative joins keep the path.
pub fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("{}/", trimmed))
    }
}

fn number_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
        Err(_) => Ok(default),
    }
}

fn positive_var(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    let value = number_var(var, default)?;
    if value == 0 {
        return Err(ConfigError::Zero { var });
    }
    Ok(value)
}
