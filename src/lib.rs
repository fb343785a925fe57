pub mod config;
pub mod database_ops;
pub mod logging;
pub mod normalization;
pub mod orchestrator;

pub mod util {
    pub mod db;
    pub mod env;
    pub mod http;
    pub mod pace;
}

#[cfg(test)]
pub(crate) mod testing;

pub use config::EtlConfig;
pub use orchestrator::{MoviePipeline, RunStatus, RunSummary, SteamPipeline};

/// User agent sent with every upstream request.
pub const USER_AGENT: &str = concat!("catalog-sync/", env!("CARGO_PKG_VERSION"));
