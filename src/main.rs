//! Terminal dashboard for the arbitrage engine.

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arbwatch::client::ApiClient;
use arbwatch::config::AppConfig;
use arbwatch::feed::DataFeed;
use arbwatch::mock::MockFeed;
use arbwatch::tui::{self, app::App};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    let config = AppConfig::parse();
    init_tracing(&config);

    info!("🚀 arbwatch starting");

    let feed = if config.mock {
        info!("mock feed active, no engine required");
        DataFeed::Mock(MockFeed::new(
            rand::random(),
            config.exchanges.clone(),
            config.symbols.clone(),
        ))
    } else {
        let client =
            ApiClient::new(&config.base_url).context("failed to build the API client")?;
        info!(base_url = %config.base_url, "connecting to the engine");
        DataFeed::Live(client)
    };

    let mut app = App::new(feed, &config);

    let mut terminal = tui::init_terminal().context("failed to initialize the terminal")?;
    let result = tui::run(&mut terminal, &mut app).await;
    tui::restore_terminal(&mut terminal).context("failed to restore the terminal")?;
    result
}

fn init_tracing(config: &AppConfig) {
    // raw mode owns stdout, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
