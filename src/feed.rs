//! Data feed selection: the real engine or the synthetic generator.
//!
//! The dashboard refresh path talks to this enum and nothing else, so the
//! mock is a first-class feed rather than a test hack. Live calls degrade
//! to empty values on failure (see [`crate::client`]); the mock never
//! fails.

use crate::client::ApiClient;
use crate::mock::MockFeed;
use crate::models::{
    EngineStats, ExecutionSummary, OpportunityRaw, OrderBookSnapshot, PortfolioRaw,
};

pub enum DataFeed {
    Live(ApiClient),
    Mock(MockFeed),
}

impl DataFeed {
    /// One step of mock time. A no-op on the live feed, where the engine
    /// advances on its own.
    pub fn advance(&mut self) {
        if let DataFeed::Mock(mock) = self {
            mock.advance();
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, DataFeed::Mock(_))
    }

    /// Where the data comes from, for the status line.
    pub fn source_label(&self) -> String {
        match self {
            DataFeed::Live(client) => client.base_url().to_string(),
            DataFeed::Mock(_) => "mock feed".to_string(),
        }
    }

    pub async fn healthy(&mut self) -> bool {
        match self {
            DataFeed::Live(client) => client.health().await.is_some(),
            DataFeed::Mock(_) => true,
        }
    }

    pub async fn orderbook(
        &mut self,
        exchange: &str,
        symbol: &str,
        depth: u32,
    ) -> Option<OrderBookSnapshot> {
        match self {
            DataFeed::Live(client) => client.orderbook(exchange, symbol, depth).await,
            DataFeed::Mock(mock) => Some(mock.orderbook(exchange, symbol, depth)),
        }
    }

    pub async fn opportunities(
        &mut self,
        min_spread_pct: f64,
        min_profit_jpy: f64,
    ) -> Vec<OpportunityRaw> {
        match self {
            DataFeed::Live(client) => client.opportunities(min_spread_pct, min_profit_jpy).await,
            DataFeed::Mock(mock) => mock.opportunities(min_spread_pct, min_profit_jpy),
        }
    }

    pub async fn opportunity_history(&mut self, limit: u32) -> Vec<OpportunityRaw> {
        match self {
            DataFeed::Live(client) => client.opportunity_history(limit).await,
            DataFeed::Mock(mock) => mock.opportunity_history(limit),
        }
    }

    pub async fn portfolio(&mut self) -> Option<PortfolioRaw> {
        match self {
            DataFeed::Live(client) => client.portfolio().await,
            DataFeed::Mock(mock) => Some(mock.portfolio()),
        }
    }

    pub async fn execution_summary(&mut self) -> Option<ExecutionSummary> {
        match self {
            DataFeed::Live(client) => client.execution_summary().await,
            DataFeed::Mock(mock) => Some(mock.execution_summary()),
        }
    }

    pub async fn stats(&mut self) -> Option<EngineStats> {
        match self {
            DataFeed::Live(client) => client.stats().await,
            DataFeed::Mock(mock) => Some(mock.stats()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_feed() -> DataFeed {
        DataFeed::Mock(MockFeed::new(
            1,
            vec!["bitbank".into(), "zaif".into()],
            vec!["XRP/JPY".into()],
        ))
    }

    #[tokio::test]
    async fn mock_feed_is_always_healthy() {
        let mut feed = mock_feed();
        assert!(feed.is_mock());
        assert!(feed.healthy().await);
        assert_eq!(feed.source_label(), "mock feed");
    }

    #[tokio::test]
    async fn mock_feed_serves_every_entity() {
        let mut feed = mock_feed();
        feed.advance();
        assert!(feed.orderbook("bitbank", "XRP/JPY", 5).await.is_some());
        assert!(!feed.opportunities(0.0, 0.0).await.is_empty());
        assert!(!feed.opportunity_history(30).await.is_empty());
        assert!(feed.portfolio().await.is_some());
        assert!(feed.execution_summary().await.is_some());
        assert!(feed.stats().await.is_some());
    }
}
