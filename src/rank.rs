use crate::api::raw::RawMinerList;
use crate::api::Service;
use crate::error::{Fallback, FetchResult};
use crate::explorer::Explorer;
use crate::models::MinerRecord;
use crate::pagination::{Page, PageRequest};

/// Orders miners by total reward, largest first. Equal rewards keep their
/// snapshot order.
pub fn sort_by_reward_desc(miners: &mut [MinerRecord]) {
    miners.sort_by(|a, b| b.total_reward.cmp(&a.total_reward));
}

/// 1-based position of `address` in `miners`, compared case-insensitively.
pub fn rank_of(miners: &[MinerRecord], address: &str) -> Option<u64> {
    miners
        .iter()
        .position(|m| m.address.eq_ignore_ascii_case(address))
        .map(|idx| idx as u64 + 1)
}

impl Explorer {
    pub(crate) async fn fetch_leaderboard(&self) -> FetchResult<Vec<MinerRecord>> {
        let raw: RawMinerList = self
            .client
            .data(
                Service::MinerStats,
                &["api", "stats", "top", "reward"],
                &[("network", self.miner_network.clone())],
                "miner leaderboard",
            )
            .await?;
        Ok(raw.list.into_iter().map(MinerRecord::from).collect())
    }

    pub(crate) async fn fetch_miner_rank(&self, hex_address: &str) -> FetchResult<Option<u64>> {
        let mut miners = self.fetch_leaderboard().await?;
        sort_by_reward_desc(&mut miners);
        Ok(rank_of(&miners, hex_address))
    }

    /// Reward rank of `address` in a fresh leaderboard snapshot.
    pub async fn miner_rank(&self, address: &str) -> Option<u64> {
        let hex = self.resolver.resolve(address).await;
        self.fetch_miner_rank(&hex)
            .await
            .or_default_logged("miner rank")
    }

    /// The leaderboard as served, ordered by the server-assigned rank with
    /// unranked entries last, paged locally.
    pub async fn top_miners(&self, window: PageRequest) -> Page<MinerRecord> {
        let mut miners = self
            .fetch_leaderboard()
            .await
            .or_default_logged("miner leaderboard");
        miners.sort_by_key(|m| (m.rank.is_none(), m.rank));
        Page::from_slice(&miners, &window)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::test_support::*;
    use crate::api::MockHttpTransport;
    use crate::error::FetchError;
    use crate::explorer::test_support::explorer_with;
    use crate::models::Amount;

    fn miner(address: &str, reward: &str) -> MinerRecord {
        MinerRecord {
            address: address.into(),
            rank: None,
            total_reward: Amount::parse_or_zero(reward),
            win_count: 0,
            attempts: 0,
        }
    }

    #[test]
    fn rewards_compare_as_big_integers() {
        let mut miners = vec![
            miner("0xa", "100"),
            miner("0xb", "9999999999999999999"),
            miner("0xc", "50"),
            miner("0xd", "340282366920938463463374607431768211456"),
        ];
        sort_by_reward_desc(&mut miners);
        let order: Vec<_> = miners.iter().map(|m| m.address.as_str()).collect();
        assert_eq!(order, ["0xd", "0xb", "0xa", "0xc"]);
        assert_eq!(rank_of(&miners, "0xB"), Some(2));
    }

    #[test]
    fn ranking_is_idempotent_and_stable() {
        let mut miners = vec![
            miner("0x1", "7"),
            miner("0x2", "not a number"),
            miner("0x3", "7"),
            miner("0x4", "0"),
        ];
        sort_by_reward_desc(&mut miners);
        let once = miners.clone();
        sort_by_reward_desc(&mut miners);
        assert_eq!(miners, once);
        let order: Vec<_> = miners.iter().map(|m| m.address.as_str()).collect();
        assert_eq!(order, ["0x1", "0x3", "0x2", "0x4"]);
    }

    #[test]
    fn absent_address_has_no_rank() {
        let miners = vec![miner("0xa", "1")];
        assert_eq!(rank_of(&miners, "0xz"), None);
        assert_eq!(rank_of(&[], "0xa"), None);
    }

    #[tokio::test]
    async fn miner_rank_reads_a_fresh_snapshot() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .withf(|url| url.path() == "/api/stats/top/reward" && url.query() == Some("network=turbo"))
            .times(2)
            .returning(|_| {
                data_ok(json!({ "list": [
                    { "rank": 1, "miner": "0xAAA", "totalReward": "100" },
                    { "rank": 2, "miner": "0xbbb", "totalReward": "9999999999999999999" },
                    { "rank": 3, "miner": "0xccc", "totalReward": "50" }
                ]}))
            });
        let explorer = explorer_with(mock);

        assert_eq!(explorer.miner_rank("0xaaa").await, Some(2));
        assert_eq!(explorer.miner_rank("0xddd").await, None);
    }

    #[tokio::test]
    async fn leaderboard_failure_yields_no_rank() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get()
            .returning(|_| Err(FetchError::HttpStatus(502)));
        let explorer = explorer_with(mock);

        assert_eq!(explorer.miner_rank("0xaaa").await, None);
        assert_eq!(explorer.top_miners(PageRequest::default()).await, Page::empty());
    }

    #[tokio::test]
    async fn top_miners_follow_server_rank() {
        let mut mock = MockHttpTransport::new();
        mock.expect_get().returning(|_| {
            data_ok(json!({ "list": [
                { "miner": "0xnone", "totalReward": "1" },
                { "rank": "2", "miner": "0xtwo", "totalReward": "5" },
                { "rank": 1, "miner": "0xone", "totalReward": "3" }
            ]}))
        });
        let explorer = explorer_with(mock);

        let page = explorer.top_miners(PageRequest::new(2, 0)).await;
        assert_eq!(page.total, 3);
        let order: Vec<_> = page.list.iter().map(|m| m.address.as_str()).collect();
        assert_eq!(order, ["0xone", "0xtwo"]);
    }

    #[tokio::test]
    async fn rewards_past_u64_rank_exactly_or_not_at_all() {
        let mut mock = MockHttpTransport::new();
        let mut call = 0;
        mock.expect_get().times(2).returning(move |_| {
            call += 1;
            if call == 1 {
                data_ok(json!({ "list": [
                    { "miner": "0xsmall", "totalReward": 50 },
                    { "miner": "0xbig", "totalReward": "100000000000000000000" }
                ]}))
            } else {
                // a bare number this large has lost digits in transit
                Ok(r#"{"code":0,"data":{"list":[
                    {"miner":"0xbig","totalReward":100000000000000000000},
                    {"miner":"0xsmall","totalReward":"50"}
                ]}}"#
                    .to_string())
            }
        });
        let explorer = explorer_with(mock);

        assert_eq!(explorer.miner_rank("0xbig").await, Some(1));
        assert_eq!(explorer.miner_rank("0xbig").await, None);
    }
}
