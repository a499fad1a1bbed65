use clap::{Args, Parser, Subcommand, ValueEnum};

use galileo_scan::pagination::DEFAULT_LIMIT;
use galileo_scan::PageRequest;

#[derive(Parser, Debug)]
#[command(name = "galileo-scan", version, about = "Chain explorer data client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Items per page
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: u64,
    /// Zero-based page index
    #[arg(long, default_value_t = 0)]
    pub page: u64,
}

impl PageArgs {
    pub fn window(&self) -> PageRequest {
        PageRequest::page(self.page, self.limit)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum WatchTarget {
    Stats,
    LatestTxs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Block detail by hash or height
    Block { id: String },
    /// Transactions included in a block
    BlockTxs {
        hash: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Transaction and receipt from the RPC node
    Tx { hash: String },
    /// Address overview: balance, tokens, storage txs, mining
    Address { address: String },
    /// Transactions of an address
    AddressTxs {
        address: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// ERC-20 transfers of an address
    Erc20Transfers {
        address: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Token overview: info, holders, transfers, daily stats
    Token { contract: String },
    /// Holders of a token, largest balance first
    TokenHolders {
        contract: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Transfers of a token
    TokenTransfers {
        contract: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Transactions since 00:00 UTC today
    LatestTxs {
        #[command(flatten)]
        page: PageArgs,
        /// Read from the RPC node instead of the scan API
        #[arg(long)]
        rpc: bool,
    },
    /// Storage miner leaderboard
    Miners {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Reward rank of a miner
    MinerRank { address: String },
    /// Number of storage submissions sent by an address
    StorageTxs { address: String },
    /// Newest blocks from the RPC node
    LatestBlocks {
        #[arg(long, default_value_t = 10)]
        count: u64,
        /// Print per-block transaction counts, oldest first
        #[arg(long)]
        chart: bool,
    },
    /// Network dashboard, TPS and gas prices
    Stats,
    /// Daily transaction and account-growth series
    Charts,
    /// Poll and print until Ctrl-C
    Watch {
        #[arg(value_enum, default_value_t = WatchTarget::Stats)]
        target: WatchTarget,
        /// Override POLL_INTERVAL_SECS
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}
