//! Data-access layer for a chain explorer: typed fetches against the
//! explorer's HTTP APIs and a JSON-RPC node, with every failure turned into
//! an empty default at the public boundary.

pub mod aggregator;
pub mod api;
pub mod config;
pub mod error;
pub mod eth;
pub mod explorer;
pub mod fetch_stats;
pub mod models;
pub mod pagination;
pub mod poller;
pub mod rank;
pub mod resolver;
pub mod scanner;

pub use config::Config;
pub use explorer::{BlockRef, Explorer};
pub use pagination::{Page, PageRequest};
