mod config;
mod manager;
mod shared;
mod signal;
mod stats;
mod worker;

pub use config::*;
pub use manager::*;
pub use stats::StatsSnapshot;
