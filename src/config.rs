//! Dashboard configuration from flags and environment.

use std::time::Duration;

use clap::Parser;

/// Hard bounds on the auto-refresh interval.
const MIN_REFRESH_SECS: u64 = 1;
const MAX_REFRESH_SECS: u64 = 300;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "arbwatch",
    about = "Terminal monitor for the cross-exchange arbitrage engine"
)]
pub struct AppConfig {
    /// Engine REST API base URL
    #[arg(long, env = "ARBWATCH_BASE_URL", default_value = "http://localhost:8000")]
    pub base_url: String,

    /// Auto-refresh interval in seconds (clamped to 1..=300)
    #[arg(long, default_value_t = 15)]
    pub refresh_secs: u64,

    /// Order book levels to show per side
    #[arg(long, default_value_t = 10)]
    pub depth: u32,

    /// Run against a synthetic offline feed instead of the engine
    #[arg(long)]
    pub mock: bool,

    /// Log level when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Exchanges to monitor
    #[arg(long, value_delimiter = ',', default_value = "bitbank,bittrade,zaif,gmocoin")]
    pub exchanges: Vec<String>,

    /// Symbols to monitor
    #[arg(long, value_delimiter = ',', default_value = "MONA/JPY,LTC/JPY,XRP/JPY")]
    pub symbols: Vec<String>,
}

impl AppConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.clamp(MIN_REFRESH_SECS, MAX_REFRESH_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_monitored_universe() {
        let config = AppConfig::parse_from(["arbwatch"]);
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.refresh_interval(), Duration::from_secs(15));
        assert_eq!(config.depth, 10);
        assert!(!config.mock);
        assert_eq!(
            config.exchanges,
            vec!["bitbank", "bittrade", "zaif", "gmocoin"]
        );
        assert_eq!(config.symbols, vec!["MONA/JPY", "LTC/JPY", "XRP/JPY"]);
    }

    #[test]
    fn refresh_interval_is_clamped() {
        let fast = AppConfig::parse_from(["arbwatch", "--refresh-secs", "0"]);
        assert_eq!(fast.refresh_interval(), Duration::from_secs(1));

        let slow = AppConfig::parse_from(["arbwatch", "--refresh-secs", "900"]);
        assert_eq!(slow.refresh_interval(), Duration::from_secs(300));
    }

    #[test]
    fn universe_flags_split_on_commas() {
        let config = AppConfig::parse_from([
            "arbwatch",
            "--exchanges",
            "bitbank,zaif",
            "--symbols",
            "XRP/JPY",
        ]);
        assert_eq!(config.exchanges, vec!["bitbank", "zaif"]);
        assert_eq!(config.symbols, vec!["XRP/JPY"]);
    }
}
