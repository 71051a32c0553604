//! Integration tests for the api_check CLI.
//!
//! Each test serves a stub engine on an ephemeral port, runs the built
//! binary against it, and asserts the printed verdict lines and the exit
//! code. The stub routers intentionally cover the pass path, a contract
//! break, and an unreachable engine.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{}", addr)
}

async fn run_api_check(args: &[&str]) -> std::process::Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_api_check"))
        .args(args)
        .output()
        .await
        .expect("run api_check")
}

fn orderbook_payload() -> Value {
    json!({
        "exchange": "bitbank",
        "symbol": "XRP/JPY",
        "timestamp": "2024-01-01T00:00:00Z",
        "bids": [{"price": 85.0, "amount": 1000.0}],
        "asks": [{"price": 85.5, "amount": 800.0}]
    })
}

fn opportunity_payload() -> Value {
    json!({
        "symbol": "XRP/JPY",
        "buy_exchange": "bitbank",
        "sell_exchange": "zaif",
        "buy_price": 85.0,
        "sell_price": 85.5,
        "spread_jpy": 0.5,
        "spread_pct": 0.0059,
        "timestamp": "2024-01-01T00:00:00Z"
    })
}

/// A stub that satisfies every check of the documented surface.
fn passing_openapi_router() -> Router {
    Router::new()
        .route(
            "/api/v1/health",
            get(|| async { Json(json!({"status": "healthy"})) }),
        )
        .route(
            "/api/v1/orderbooks",
            get(|| async { Json(json!([orderbook_payload()])) }),
        )
        .route(
            "/api/v1/orderbooks/history",
            get(|| async { Json(json!([orderbook_payload()])) }),
        )
        .route(
            "/api/v1/orderbooks/:exchange/:symbol",
            get(|| async { Json(orderbook_payload()) }),
        )
        .route(
            "/api/v1/opportunities",
            get(|| async { Json(json!([opportunity_payload()])) }),
        )
        .route(
            "/api/v1/opportunities/history",
            get(|| async { Json(json!([opportunity_payload()])) }),
        )
        .route(
            "/api/v1/portfolio",
            get(|| async {
                Json(json!({
                    "balances": {},
                    "total_value_jpy": 1_250_000.0,
                    "last_updated": "2024-01-01T00:00:00Z"
                }))
            }),
        )
        .route(
            "/api/v1/executions/summary",
            get(|| async {
                Json(json!({
                    "active_orders": 0,
                    "recent_executions": 0,
                    "total_trades": 40,
                    "successful_trades": 36,
                    "failed_trades": 4,
                    "total_profit_jpy": 15000.0
                }))
            }),
        )
        .route(
            "/api/v1/executions/history",
            get(|| async {
                Json(json!([{
                    "id": "exec-1",
                    "opportunity": {},
                    "buy_order_id": "b-1",
                    "sell_order_id": "s-1",
                    "status": "completed",
                    "created_at": "2024-01-01T00:00:00Z",
                    "one_sided_risk": false
                }]))
            }),
        )
        .route(
            "/api/v1/stats",
            get(|| async {
                Json(json!({
                    "total_orderbooks": 8,
                    "orderbook_history_size": 100,
                    "current_opportunities": 3,
                    "opportunity_history_size": 50,
                    "active_orders": 0,
                    "execution_history_size": 12,
                    "total_trades": 40,
                    "successful_trades": 36,
                    "failed_trades": 4,
                    "total_profit_jpy": 15000.0
                }))
            }),
        )
        .route(
            "/api/v1/data/all",
            get(|| async {
                Json(json!({
                    "orderbooks": [],
                    "opportunities": [],
                    "execution_summary": {},
                    "timestamp": "2024-01-01T00:00:00Z"
                }))
            }),
        )
}

fn legacy_book_full() -> Value {
    json!({
        "exchange": "bitbank",
        "symbol": "XRP/JPY",
        "timestamp": "2024-01-01T00:00:00Z",
        "bids": [[85.0, 1000.0]],
        "asks": [[85.5, 800.0]],
        "best_bid": 85.0,
        "best_ask": 85.5,
        "mid_price": 85.25,
        "spread": 0.5
    })
}

fn legacy_router(book: Value) -> Router {
    Router::new()
        .route(
            "/v1/orderbook/:exchange/:symbol/latest",
            get(move || {
                let book = book.clone();
                async move { Json(book) }
            }),
        )
        .route("/v1/opportunities/latest", get(|| async { Json(json!([])) }))
        .route(
            "/v1/portfolio",
            get(|| async {
                Json(json!({
                    "updated_at": "2024-01-01T00:00:00Z",
                    "total_value_jpy": 1_250_000.0,
                    "exchanges": {}
                }))
            }),
        )
}

#[tokio::test]
async fn openapi_mode_passes_against_a_conforming_engine() {
    let base = serve(passing_openapi_router()).await;
    let output = run_api_check(&["--base-url", &base, "--mode", "openapi"]).await;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stdout:\n{}", stdout);
    assert!(stdout.contains("[OK] health: status=200"));
    assert!(stdout.contains("[OK] orderbooks keys"));
    assert!(stdout.contains("[OK] orderbooks single keys"));
    assert!(stdout.contains("[OK] opportunities keys"));
    assert!(stdout.contains("[OK] portfolio keys"));
    assert!(stdout.contains("[OK] executions summary keys"));
    assert!(stdout.contains("[OK] stats keys"));
    assert!(stdout.contains("[OK] data all keys"));
    assert!(stdout.contains("SUCCESS: all checks passed."));
    assert!(!stdout.contains("[NG]"));
}

#[tokio::test]
async fn arbgui_mode_passes_when_the_legacy_surface_is_complete() {
    let base = serve(legacy_router(legacy_book_full())).await;
    // arbgui is the default mode
    let output = run_api_check(&["--base-url", &base]).await;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stdout:\n{}", stdout);
    assert!(stdout.contains("[OK] orderbook latest keys"));
    assert!(stdout.contains("[OK] opportunities latest: empty list"));
    assert!(stdout.contains("[OK] portfolio keys"));
    assert!(stdout.contains("SUCCESS: all checks passed."));
}

#[tokio::test]
async fn arbgui_mode_reports_a_missing_key_and_exits_nonzero() {
    let mut book = legacy_book_full();
    book.as_object_mut()
        .expect("book is an object")
        .remove("mid_price");
    let base = serve(legacy_router(book)).await;

    let output = run_api_check(&["--base-url", &base, "--mode", "arbgui"]).await;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("[NG] orderbook latest keys: mid_price"));
    assert!(stdout.contains("[OK] opportunities latest: empty list"));
    assert!(stdout.contains("FAILED: 1 check(s) failed."));
}

#[tokio::test]
async fn unreachable_engine_fails_every_check_with_status_zero() {
    // nothing listens on port 1
    let output =
        run_api_check(&["--base-url", "http://127.0.0.1:1", "--mode", "openapi"]).await;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("[NG] health: status=0"));
    assert!(stdout.contains("[NG] stats: status=0"));
    assert!(stdout.contains("FAILED: 11 check(s) failed."));
}
