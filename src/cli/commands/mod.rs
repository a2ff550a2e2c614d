//! CLI command implementations.

mod ask;
mod backfill;
mod config;
mod ingest;
mod search;
mod serve;
mod stats;

pub use ask::run_ask;
pub use backfill::run_backfill;
pub use config::run_config;
pub use ingest::run_ingest;
pub use search::run_search;
pub use serve::{router, run_serve, AppState};
pub use stats::run_stats;
