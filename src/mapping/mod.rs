//! Data-mapping layer: raw engine payloads to display-ready rows.

pub mod metrics;
pub mod rows;

pub use metrics::{estimated_size_jpy, expected_profit_jpy, min_available, nearest_level, spread_bps};
pub use rows::{
    build_opportunity_rows, build_portfolio_positions, exchange_subtotals, format_datetime_label,
    format_time_label, highlight_for, portfolio_matrix, Highlight, HighlightRole, MatrixRow,
    OpportunityRow, PortfolioMatrix, PortfolioPosition,
};
