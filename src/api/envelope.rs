use serde::Deserialize;

use super::de;
use crate::error::{FetchError, FetchResult};

/// Envelope served by the chain-scan API: `{ status: "1" | "0", message, result }`.
#[derive(Debug, Deserialize)]
pub struct ScanEnvelope<T> {
    #[serde(default, deserialize_with = "de::string_lenient")]
    pub status: String,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub message: Option<String>,
    pub result: Option<T>,
}

impl<T> ScanEnvelope<T> {
    pub fn into_result(self, what: &str) -> FetchResult<T> {
        if self.status != "1" {
            return Err(FetchError::Upstream(
                self.message
                    .unwrap_or_else(|| format!("status {:?}", self.status)),
            ));
        }
        self.result.ok_or_else(|| FetchError::NotFound(what.to_string()))
    }
}

/// Envelope served by the storage-scan and miner-stats APIs: `{ code, message, data }`.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    #[serde(default, deserialize_with = "de::i64_lenient")]
    pub code: i64,
    #[serde(default, deserialize_with = "de::opt_string_lenient")]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> DataEnvelope<T> {
    pub fn into_result(self, what: &str) -> FetchResult<T> {
        if self.code != 0 {
            return Err(FetchError::Upstream(
                self.message
                    .unwrap_or_else(|| format!("code {}", self.code)),
            ));
        }
        self.data.ok_or_else(|| FetchError::NotFound(what.to_string()))
    }
}
