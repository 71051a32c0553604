//! Engine API contract checker.
//!
//! Probes every dashboard-facing endpoint of a running engine and prints
//! one `[OK]`/`[NG]` line per check. All checks run to completion; the
//! exit code reports the overall verdict, so the binary slots into CI
//! and pre-deploy scripts.
//!
//! Usage:
//!   api_check --base-url http://0.0.0.0:8000 --mode openapi
//!
//! Exit Codes:
//!   - 0: every check passed
//!   - 1: at least one check failed

use clap::Parser;

use arbwatch::client::ApiClient;
use arbwatch::contract::{self, EndpointCheck};

#[derive(Parser, Debug)]
#[command(name = "api_check")]
#[command(about = "Contract checks for the arbitrage engine REST API")]
struct Args {
    /// Engine base URL
    #[arg(long, env = "ARBWATCH_BASE_URL", default_value = "http://0.0.0.0:8000")]
    base_url: String,

    /// API surface to probe
    #[arg(long, default_value = "arbgui", value_parser = ["arbgui", "openapi"])]
    mode: String,

    /// Exchange used for the single order-book probe
    #[arg(long, default_value = "bitbank")]
    exchange: String,

    /// Symbol used for the single order-book probe
    #[arg(long, default_value = "XRP/JPY")]
    symbol: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // check lines own stdout; client logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = ApiClient::new(&args.base_url)?;
    let checks: Vec<EndpointCheck> = match args.mode.as_str() {
        "openapi" => contract::openapi_checks(&args.exchange, &args.symbol),
        _ => contract::arbgui_checks(&args.exchange, &args.symbol),
    };

    println!(
        "checking {} ({} mode, {} endpoints)\n",
        client.base_url(),
        args.mode,
        checks.len()
    );

    let mut failures = 0usize;
    for check in &checks {
        let report = contract::run_check(&client, check).await;
        println!("{}", report.line());
        if !report.ok {
            failures += 1;
        }
    }

    if failures > 0 {
        println!("\nFAILED: {} check(s) failed.", failures);
        std::process::exit(1);
    }
    println!("\nSUCCESS: all checks passed.");
    Ok(())
}
