pub mod stats;

pub use stats::{live_stats, DashboardStats, DashboardStatsError, DashboardStatsQuery};
