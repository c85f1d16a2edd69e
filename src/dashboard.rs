//! Static dashboard served at `/`. It only polls `/data` and renders.

pub const DASHBOARD_HTML: &str = include_str!("../assets/dashboard.html");

/// Interval the page uses to poll `/data`.
pub const POLL_INTERVAL_MS: u64 = 500;
