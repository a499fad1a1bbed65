use crate::error::Fallback;
use crate::explorer::Explorer;
use crate::models::{AddressOverview, NetworkStats, TokenOverview};
use crate::pagination::PageRequest;

impl Explorer {
    /// Everything the address page shows, fetched concurrently. A facet
    /// that fails renders as its default and never blocks the others.
    pub async fn address_overview(&self, address: &str) -> AddressOverview {
        let hex = self.resolver.resolve(address).await;
        let (detail, holdings, storage_tx_count, miner_reward, miner_rank) = tokio::join!(
            self.fetch_address_detail(&hex),
            self.fetch_token_holdings(&hex),
            self.storage_tx_count(&hex),
            self.fetch_miner_reward(&hex),
            self.fetch_miner_rank(&hex),
        );

        AddressOverview {
            address: hex,
            detail: detail.map(Some).or_default_logged("address detail"),
            holdings: holdings.or_default_logged("token holdings"),
            storage_tx_count,
            miner_reward: miner_reward.or_default_logged("miner reward"),
            miner_rank: miner_rank.or_default_logged("miner rank"),
        }
    }

    pub async fn token_overview(&self, contract: &str) -> TokenOverview {
        let (info, holders, transfers, daily_stats) = tokio::join!(
            self.token_info(contract),
            self.token_holders(contract, PageRequest::default()),
            self.token_transfers(contract, PageRequest::default()),
            self.token_daily_stats(contract),
        );

        TokenOverview {
            contract: contract.to_string(),
            info,
            holders,
            transfers,
            daily_stats,
        }
    }

    pub async fn network_stats(&self) -> NetworkStats {
        let (dashboard, plot, gas) = tokio::join!(
            self.fetch_dashboard(),
            self.fetch_latest_plot(),
            self.fetch_gas_price_info(),
        );

        NetworkStats {
            dashboard: dashboard.map(Some).or_default_logged("dashboard"),
            plot: plot.map(Some).or_default_logged("plot"),
            gas: gas.map(Some).or_default_logged("gas price tracker"),
        }
    }
}
