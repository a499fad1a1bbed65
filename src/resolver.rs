use crate::api::raw::RawAccount;
use crate::api::ScanClient;
use crate::error::{FetchError, FetchResult};

/// Maps native-encoded account identifiers (`net16601:aa…`) onto their EVM hex
/// form by asking the account endpoint. Every call hits the network; callers
/// that want a cache can wrap this type.
#[derive(Clone)]
pub struct AddressResolver {
    client: ScanClient,
    native_prefix: String,
}

impl AddressResolver {
    pub fn new(client: ScanClient, native_prefix: impl Into<String>) -> Self {
        Self {
            client,
            native_prefix: native_prefix.into(),
        }
    }

    pub fn is_native(&self, address: &str) -> bool {
        !self.native_prefix.is_empty() && address.starts_with(&self.native_prefix)
    }

    /// Returns the hex form of `address`, or `address` itself when it is
    /// already hex or the lookup fails.
    pub async fn resolve(&self, address: &str) -> String {
        if !self.is_native(address) {
            return address.to_string();
        }
        match self.lookup(address).await {
            Ok(hex) => hex,
            Err(err) => {
                tracing::warn!("address resolution for {} failed: {}", address, err);
                address.to_string()
            }
        }
    }

    /// Like [`resolve`](Self::resolve) for optional fields such as a
    /// contract-creation `to`.
    pub async fn resolve_opt(&self, address: Option<&str>) -> Option<String> {
        match address {
            Some(address) => Some(self.resolve(address).await),
            None => None,
        }
    }

    async fn lookup(&self, address: &str) -> FetchResult<String> {
        let account: RawAccount = self
            .client
            .scan(
                &["v1", "account", address],
                &[("fields", "cfxTransferCount".to_string())],
                "account",
            )
            .await?;
        account
            .address
            .filter(|hex| hex.starts_with("0x"))
            .ok_or_else(|| FetchError::Malformed(format!("no hex address for {}", address)))
    }
}
