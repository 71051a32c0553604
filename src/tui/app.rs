//! Dashboard state and rendering.
//!
//! All fetched data flows through per-entity [`RefreshCache`]s stamped with
//! the current refresh generation. Rendering only reads plain display
//! fields, so redraws between refreshes never touch the network, and
//! pausing freezes the screen on whatever the caches last held.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::cache::RefreshCache;
use crate::config::AppConfig;
use crate::feed::DataFeed;
use crate::mapping::{self, OpportunityRow, PortfolioMatrix, PortfolioPosition};
use crate::models::{EngineStats, ExecutionSummary, OrderBookSnapshot, PortfolioRaw};

use super::widgets::{
    fmt_bps, fmt_jpy, fmt_opt_jpy, fmt_price, MetricCard, OpportunityTable, OrderBookLadder,
    PortfolioMatrixTable, SparklinePanel, Status, StatusIndicator, ACCENT_CYAN, ACCENT_GREEN,
    ACCENT_PURPLE, ACCENT_RED, ACCENT_YELLOW, BORDER_DIM, DASH, TEXT_BRIGHT, TEXT_DIM,
};

const MIN_SPREAD_DEFAULT_BPS: f64 = 5.0;
const SPREAD_STEP_BPS: f64 = 0.5;
const SPREAD_FLOOR_BPS: f64 = -10.0;
const SPREAD_CAP_BPS: f64 = 100.0;
const MIN_PROFIT_DEFAULT_JPY: f64 = 500.0;
const PROFIT_STEP_JPY: f64 = 100.0;
const PROFIT_FLOOR_JPY: f64 = 0.0;
const PROFIT_CAP_JPY: f64 = 50_000.0;

/// Rows shown in the overview preview table.
const PREVIEW_ROWS: usize = 12;
/// Selectable opportunities per symbol on the order-book tab.
const SYMBOL_ROWS: usize = 5;
/// Points kept per sparkline series.
const HISTORY_POINTS: usize = 120;
const HISTORY_FETCH_LIMIT: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    OrderBooks,
    Opportunities,
    Portfolio,
}

impl Tab {
    pub fn all() -> [Tab; 4] {
        [
            Tab::Overview,
            Tab::OrderBooks,
            Tab::Opportunities,
            Tab::Portfolio,
        ]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Overview => "OVERVIEW",
            Tab::OrderBooks => "ORDER BOOKS",
            Tab::Opportunities => "OPPORTUNITIES",
            Tab::Portfolio => "PORTFOLIO",
        }
    }
}

pub struct App {
    pub running: bool,
    current_tab: Tab,
    show_help: bool,

    feed: DataFeed,
    depth: u32,
    refresh_interval: Duration,

    // refresh bookkeeping
    generation: u64,
    last_refresh: Option<Instant>,
    paused: bool,
    force_refresh: bool,
    needs_populate: bool,

    // universe and selection
    exchanges: Vec<String>,
    symbols: Vec<String>,
    symbol_idx: usize,
    selected_idx: usize,

    // filters, in display units
    min_spread_bps: f64,
    min_profit_jpy: f64,

    // per-entity caches stamped by refresh generation
    health_cache: RefreshCache<bool>,
    orderbook_cache: RefreshCache<Option<OrderBookSnapshot>>,
    opportunity_cache: RefreshCache<Vec<OpportunityRow>>,
    history_cache: RefreshCache<Vec<u64>>,
    portfolio_cache: RefreshCache<Option<PortfolioRaw>>,
    summary_cache: RefreshCache<Option<ExecutionSummary>>,
    stats_cache: RefreshCache<Option<EngineStats>>,

    // current display state
    connected: bool,
    orderbooks: Vec<(String, Option<OrderBookSnapshot>)>,
    opportunities: Vec<OpportunityRow>,
    history_bps: Vec<u64>,
    positions: Vec<PortfolioPosition>,
    matrix: PortfolioMatrix,
    subtotals: Vec<(String, f64)>,
    portfolio_total: Option<f64>,
    portfolio_updated: Option<String>,
    summary: Option<ExecutionSummary>,
    stats: Option<EngineStats>,
    value_history: Vec<u64>,
    value_history_generation: u64,
}

impl App {
    pub fn new(feed: DataFeed, config: &AppConfig) -> Self {
        Self {
            running: true,
            current_tab: Tab::Overview,
            show_help: false,
            feed,
            depth: config.depth,
            refresh_interval: config.refresh_interval(),
            generation: 0,
            last_refresh: None,
            paused: false,
            force_refresh: false,
            needs_populate: false,
            exchanges: config.exchanges.clone(),
            symbols: config.symbols.clone(),
            symbol_idx: 0,
            selected_idx: 0,
            min_spread_bps: MIN_SPREAD_DEFAULT_BPS,
            min_profit_jpy: MIN_PROFIT_DEFAULT_JPY,
            health_cache: RefreshCache::new(),
            orderbook_cache: RefreshCache::new(),
            opportunity_cache: RefreshCache::new(),
            history_cache: RefreshCache::new(),
            portfolio_cache: RefreshCache::new(),
            summary_cache: RefreshCache::new(),
            stats_cache: RefreshCache::new(),
            connected: false,
            orderbooks: Vec::new(),
            opportunities: Vec::new(),
            history_bps: Vec::new(),
            positions: Vec::new(),
            matrix: PortfolioMatrix::default(),
            subtotals: Vec::new(),
            portfolio_total: None,
            portfolio_updated: None,
            summary: None,
            stats: None,
            value_history: Vec::new(),
            value_history_generation: 0,
        }
    }

    fn current_symbol(&self) -> &str {
        self.symbols
            .get(self.symbol_idx)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Opportunities for the current symbol, capped to the selector rows.
    fn symbol_rows(&self) -> Vec<&OpportunityRow> {
        let symbol = self.current_symbol();
        self.opportunities
            .iter()
            .filter(|row| row.symbol == symbol)
            .take(SYMBOL_ROWS)
            .collect()
    }

    fn selected_row(&self) -> Option<&OpportunityRow> {
        let rows = self.symbol_rows();
        if rows.is_empty() {
            return None;
        }
        Some(rows[self.selected_idx.min(rows.len() - 1)])
    }

    fn selection_cap(&self) -> usize {
        match self.current_tab {
            Tab::OrderBooks => self.symbol_rows().len(),
            Tab::Opportunities => self.opportunities.len(),
            _ => 0,
        }
    }

    // ---- input ----------------------------------------------------------

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('?') => self.show_help = !self.show_help,
            KeyCode::Tab | KeyCode::Right => self.step_tab(1),
            KeyCode::BackTab | KeyCode::Left => self.step_tab(-1),
            KeyCode::Char('1') => self.jump_tab(Tab::Overview),
            KeyCode::Char('2') => self.jump_tab(Tab::OrderBooks),
            KeyCode::Char('3') => self.jump_tab(Tab::Opportunities),
            KeyCode::Char('4') => self.jump_tab(Tab::Portfolio),
            KeyCode::Char('r') => self.force_refresh = true,
            KeyCode::Char('p') => self.paused = !self.paused,
            KeyCode::Char(']') => self.step_symbol(1),
            KeyCode::Char('[') => self.step_symbol(-1),
            KeyCode::Up => self.selected_idx = self.selected_idx.saturating_sub(1),
            KeyCode::Down => {
                let cap = self.selection_cap();
                self.selected_idx = (self.selected_idx + 1).min(cap.saturating_sub(1));
            }
            KeyCode::Char('-') => self.adjust_spread_filter(-SPREAD_STEP_BPS),
            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_spread_filter(SPREAD_STEP_BPS),
            KeyCode::Char('<') | KeyCode::Char(',') => self.adjust_profit_filter(-PROFIT_STEP_JPY),
            KeyCode::Char('>') | KeyCode::Char('.') => self.adjust_profit_filter(PROFIT_STEP_JPY),
            _ => {}
        }
    }

    fn step_tab(&mut self, delta: isize) {
        let tabs = Tab::all();
        let idx = tabs
            .iter()
            .position(|t| *t == self.current_tab)
            .unwrap_or(0);
        let next = (idx as isize + delta).rem_euclid(tabs.len() as isize) as usize;
        self.current_tab = tabs[next];
        self.needs_populate = true;
    }

    fn jump_tab(&mut self, tab: Tab) {
        if self.current_tab != tab {
            self.current_tab = tab;
            self.needs_populate = true;
        }
    }

    fn step_symbol(&mut self, delta: isize) {
        if self.symbols.is_empty() {
            return;
        }
        let len = self.symbols.len() as isize;
        self.symbol_idx = (self.symbol_idx as isize + delta).rem_euclid(len) as usize;
        self.selected_idx = 0;
        self.needs_populate = true;
    }

    fn adjust_spread_filter(&mut self, delta: f64) {
        self.min_spread_bps = (self.min_spread_bps + delta).clamp(SPREAD_FLOOR_BPS, SPREAD_CAP_BPS);
        // a filter change invalidates cached rows, so refetch
        self.force_refresh = true;
    }

    fn adjust_profit_filter(&mut self, delta: f64) {
        self.min_profit_jpy = (self.min_profit_jpy + delta).clamp(PROFIT_FLOOR_JPY, PROFIT_CAP_JPY);
        self.force_refresh = true;
    }

    // ---- refresh --------------------------------------------------------

    /// Advance the refresh generation when due (interval elapsed or forced)
    /// and refetch what the current tab shows. A plain tab switch reuses
    /// the current generation: cached entities stay as they are, uncached
    /// ones are fetched, and when paused only stale cache reads happen.
    pub async fn maybe_refresh(&mut self) {
        let timer_due = !self.paused
            && self
                .last_refresh
                .map_or(true, |at| at.elapsed() >= self.refresh_interval);
        if self.force_refresh || timer_due {
            self.force_refresh = false;
            self.needs_populate = false;
            self.generation += 1;
            self.feed.advance();
            self.last_refresh = Some(Instant::now());
            self.refresh_visible().await;
        } else if self.needs_populate {
            self.needs_populate = false;
            if self.paused {
                self.populate_stale();
            } else {
                self.refresh_visible().await;
            }
        }
    }

    async fn refresh_visible(&mut self) {
        let generation = self.generation;

        let feed = &mut self.feed;
        self.connected = self
            .health_cache
            .get_or_compute("health", generation, || async move {
                feed.healthy().await
            })
            .await;

        match self.current_tab {
            Tab::Overview => {
                self.refresh_summary(generation).await;
                self.refresh_stats(generation).await;
                self.refresh_opportunities(generation).await;
            }
            Tab::OrderBooks => {
                self.refresh_opportunities(generation).await;
                self.refresh_orderbooks(generation).await;
            }
            Tab::Opportunities => {
                self.refresh_opportunities(generation).await;
                self.refresh_history(generation).await;
            }
            Tab::Portfolio => {
                self.refresh_portfolio(generation).await;
            }
        }
    }

    async fn refresh_opportunities(&mut self, generation: u64) {
        // negative bps means "show everything", the engine only takes >= 0
        let min_spread_pct = self.min_spread_bps.max(0.0) / 100.0;
        let min_profit = self.min_profit_jpy;
        let min_bps = self.min_spread_bps;
        let feed = &mut self.feed;
        self.opportunities = self
            .opportunity_cache
            .get_or_compute("opportunities", generation, || async move {
                let raw = feed.opportunities(min_spread_pct, min_profit).await;
                mapping::build_opportunity_rows(&raw)
                    .into_iter()
                    // re-assert the filters locally; rows without the
                    // metric stay visible
                    .filter(|row| {
                        row.spread_bps.map_or(true, |bps| bps >= min_bps)
                            && row
                                .expected_profit_jpy
                                .map_or(true, |profit| profit >= min_profit)
                    })
                    .collect()
            })
            .await;
    }

    async fn refresh_orderbooks(&mut self, generation: u64) {
        let symbol = self.current_symbol().to_string();
        let depth = self.depth;
        let exchanges = self.exchanges.clone();
        let mut books = Vec::with_capacity(exchanges.len());
        for exchange in exchanges {
            let key = format!("{}:{}", exchange, symbol);
            let feed = &mut self.feed;
            let target_exchange = exchange.clone();
            let target_symbol = symbol.clone();
            let book = self
                .orderbook_cache
                .get_or_compute(&key, generation, || async move {
                    feed.orderbook(&target_exchange, &target_symbol, depth).await
                })
                .await;
            books.push((exchange, book));
        }
        self.orderbooks = books;
    }

    async fn refresh_history(&mut self, generation: u64) {
        let feed = &mut self.feed;
        self.history_bps = self
            .history_cache
            .get_or_compute("opportunity_history", generation, || async move {
                feed.opportunity_history(HISTORY_FETCH_LIMIT)
                    .await
                    .iter()
                    // history arrives newest first; the sparkline reads left to right
                    .rev()
                    .filter_map(|o| mapping::spread_bps(o.spread_pct))
                    .map(|bps| (bps * 100.0).max(0.0) as u64)
                    .collect()
            })
            .await;
    }

    async fn refresh_summary(&mut self, generation: u64) {
        let feed = &mut self.feed;
        self.summary = self
            .summary_cache
            .get_or_compute("executions", generation, || async move {
                feed.execution_summary().await
            })
            .await;
    }

    async fn refresh_stats(&mut self, generation: u64) {
        let feed = &mut self.feed;
        self.stats = self
            .stats_cache
            .get_or_compute("stats", generation, || async move { feed.stats().await })
            .await;
    }

    async fn refresh_portfolio(&mut self, generation: u64) {
        let feed = &mut self.feed;
        let portfolio = self
            .portfolio_cache
            .get_or_compute("portfolio", generation, || async move {
                feed.portfolio().await
            })
            .await;
        self.apply_portfolio(portfolio, generation);
    }

    fn apply_portfolio(&mut self, portfolio: Option<PortfolioRaw>, generation: u64) {
        match &portfolio {
            Some(p) => {
                let positions = mapping::build_portfolio_positions(p);
                self.matrix = mapping::portfolio_matrix(&positions, p.total_value_jpy);
                self.subtotals = mapping::exchange_subtotals(&positions);
                self.portfolio_total = p.total_value_jpy;
                self.portfolio_updated = p.last_updated.clone();
                self.positions = positions;
            }
            None => {
                self.positions = Vec::new();
                self.matrix = PortfolioMatrix::default();
                self.subtotals = Vec::new();
                self.portfolio_total = None;
                self.portfolio_updated = None;
            }
        }
        // one history point per generation, and only when a total exists
        if generation != self.value_history_generation {
            if let Some(total) = self.portfolio_total {
                self.value_history_generation = generation;
                self.value_history.push(total.max(0.0) as u64);
                if self.value_history.len() > HISTORY_POINTS {
                    self.value_history.remove(0);
                }
            }
        }
    }

    /// Paused tab switch: show whatever the caches hold, fetch nothing.
    fn populate_stale(&mut self) {
        if let Some(connected) = self.health_cache.peek("health") {
            self.connected = connected;
        }
        match self.current_tab {
            Tab::Overview => {
                if let Some(summary) = self.summary_cache.peek("executions") {
                    self.summary = summary;
                }
                if let Some(stats) = self.stats_cache.peek("stats") {
                    self.stats = stats;
                }
                if let Some(rows) = self.opportunity_cache.peek("opportunities") {
                    self.opportunities = rows;
                }
            }
            Tab::OrderBooks => {
                if let Some(rows) = self.opportunity_cache.peek("opportunities") {
                    self.opportunities = rows;
                }
                let symbol = self.current_symbol().to_string();
                self.orderbooks = self
                    .exchanges
                    .iter()
                    .map(|exchange| {
                        let key = format!("{}:{}", exchange, symbol);
                        (exchange.clone(), self.orderbook_cache.peek(&key).flatten())
                    })
                    .collect();
            }
            Tab::Opportunities => {
                if let Some(rows) = self.opportunity_cache.peek("opportunities") {
                    self.opportunities = rows;
                }
                if let Some(history) = self.history_cache.peek("opportunity_history") {
                    self.history_bps = history;
                }
            }
            Tab::Portfolio => {
                if let Some(portfolio) = self.portfolio_cache.peek("portfolio") {
                    // reuse the stored generation so no history point is added
                    let generation = self.value_history_generation;
                    self.apply_portfolio(portfolio, generation);
                }
            }
        }
    }

    // ---- rendering ------------------------------------------------------

    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(1),
            ])
            .split(frame.size());

        self.render_header(frame, chunks[0]);
        match self.current_tab {
            Tab::Overview => self.render_overview(frame, chunks[1]),
            Tab::OrderBooks => self.render_orderbooks(frame, chunks[1]),
            Tab::Opportunities => self.render_opportunities(frame, chunks[1]),
            Tab::Portfolio => self.render_portfolio(frame, chunks[1]),
        }
        self.render_footer(frame, chunks[2]);

        if self.show_help {
            self.render_help(frame);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<&str> = Tab::all().iter().map(|t| t.title()).collect();
        let selected = Tab::all()
            .iter()
            .position(|t| *t == self.current_tab)
            .unwrap_or(0);
        let tabs = Tabs::new(titles)
            .block(
                Block::default()
                    .title(" ARBWATCH ENGINE MONITOR ")
                    .title_style(
                        Style::default()
                            .fg(ACCENT_CYAN)
                            .add_modifier(Modifier::BOLD),
                    )
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(BORDER_DIM)),
            )
            .select(selected)
            .style(Style::default().fg(TEXT_DIM))
            .highlight_style(
                Style::default()
                    .fg(ACCENT_CYAN)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            );
        frame.render_widget(tabs, area);
    }

    fn render_overview(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(4),
                Constraint::Min(8),
            ])
            .split(area);

        self.render_status_row(frame, chunks[0]);
        self.render_summary_cards(frame, chunks[1]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
            .split(chunks[2]);

        let preview = &self.opportunities[..self.opportunities.len().min(PREVIEW_ROWS)];
        frame.render_widget(OpportunityTable::new("TOP OPPORTUNITIES", preview), bottom[0]);

        let stats_block = Block::default()
            .title(" ENGINE STATS ")
            .title_style(
                Style::default()
                    .fg(ACCENT_PURPLE)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_style(Style::default().fg(BORDER_DIM));
        frame.render_widget(Paragraph::new(self.stats_lines()).block(stats_block), bottom[1]);
    }

    fn render_status_row(&self, frame: &mut Frame, area: Rect) {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 4),
                Constraint::Ratio(1, 4),
                Constraint::Ratio(1, 4),
                Constraint::Ratio(1, 4),
            ])
            .split(area);

        let (engine_status, engine_detail) = if self.connected {
            (Status::Ok, "healthy")
        } else {
            (Status::Disconnected, "unreachable")
        };
        frame.render_widget(
            StatusIndicator::new("engine", engine_status).with_detail(engine_detail),
            cells[0],
        );

        let source = self.feed.source_label();
        let feed_status = if self.feed.is_mock() {
            Status::Warning
        } else {
            Status::Ok
        };
        frame.render_widget(
            StatusIndicator::new("feed", feed_status).with_detail(&source),
            cells[1],
        );

        let opp_detail = format!("{} rows", self.opportunities.len());
        let opp_status = if self.opportunities.is_empty() {
            Status::Warning
        } else {
            Status::Ok
        };
        frame.render_widget(
            StatusIndicator::new("opportunities", opp_status).with_detail(&opp_detail),
            cells[2],
        );

        let refresh_detail = if self.paused {
            "paused".to_string()
        } else {
            format!(
                "every {}s, gen {}",
                self.refresh_interval.as_secs(),
                self.generation
            )
        };
        let refresh_status = if self.paused {
            Status::Warning
        } else {
            Status::Ok
        };
        frame.render_widget(
            StatusIndicator::new("refresh", refresh_status).with_detail(&refresh_detail),
            cells[3],
        );
    }

    fn render_summary_cards(&self, frame: &mut Frame, area: Rect) {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 4),
                Constraint::Ratio(1, 4),
                Constraint::Ratio(1, 4),
                Constraint::Ratio(1, 4),
            ])
            .split(area);

        let summary = self.summary.clone().unwrap_or_default();

        frame.render_widget(
            MetricCard::new("ACTIVE ORDERS", count(summary.active_orders)).color(ACCENT_CYAN),
            cells[0],
        );
        frame.render_widget(
            MetricCard::new("RECENT EXECUTIONS", count(summary.recent_executions))
                .color(ACCENT_CYAN),
            cells[1],
        );

        let trades_detail = format!(
            "{} ok / {} ng",
            count(summary.successful_trades),
            count(summary.failed_trades)
        );
        frame.render_widget(
            MetricCard::new("TRADES", count(summary.total_trades)).detail(trades_detail),
            cells[2],
        );

        let profit_color = match summary.total_profit_jpy {
            Some(profit) if profit < 0.0 => ACCENT_RED,
            Some(_) => ACCENT_GREEN,
            None => TEXT_DIM,
        };
        frame.render_widget(
            MetricCard::new("TOTAL PROFIT", fmt_opt_jpy(summary.total_profit_jpy))
                .color(profit_color),
            cells[3],
        );
    }

    fn stats_lines(&self) -> Vec<Line<'static>> {
        let Some(stats) = &self.stats else {
            return vec![Line::from(Span::styled(
                "no stats",
                Style::default().fg(TEXT_DIM),
            ))];
        };
        let trades = match (stats.successful_trades, stats.failed_trades) {
            (Some(ok), Some(ng)) => {
                format!("{} ({} ok / {} ng)", count(stats.total_trades), ok, ng)
            }
            _ => count(stats.total_trades),
        };
        vec![
            stat_line("orderbooks", count(stats.total_orderbooks)),
            stat_line("ob history", count(stats.orderbook_history_size)),
            stat_line("opportunities", count(stats.current_opportunities)),
            stat_line("opp history", count(stats.opportunity_history_size)),
            stat_line("active orders", count(stats.active_orders)),
            stat_line("exec history", count(stats.execution_history_size)),
            stat_line("trades", trades),
            stat_line("profit", fmt_opt_jpy(stats.total_profit_jpy)),
        ]
    }

    fn render_orderbooks(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(SYMBOL_ROWS as u16 + 2),
                Constraint::Min(8),
            ])
            .split(area);

        self.render_symbol_selector(frame, chunks[0]);

        if self.orderbooks.is_empty() {
            let block = Block::default()
                .title(" ORDER BOOKS ")
                .title_style(
                    Style::default()
                        .fg(ACCENT_CYAN)
                        .add_modifier(Modifier::BOLD),
                )
                .borders(Borders::ALL)
                .border_style(Style::default().fg(BORDER_DIM));
            frame.render_widget(
                Paragraph::new("no data yet")
                    .style(Style::default().fg(TEXT_DIM))
                    .block(block),
                chunks[1],
            );
            return;
        }

        let selected = self.selected_row();
        let constraints: Vec<Constraint> = self
            .orderbooks
            .iter()
            .map(|_| Constraint::Ratio(1, self.orderbooks.len() as u32))
            .collect();
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(chunks[1]);

        for (idx, (exchange, book)) in self.orderbooks.iter().enumerate() {
            let title = match book {
                Some(b) if !b.timestamp.is_empty() => {
                    format!("{} {}", exchange, mapping::format_time_label(&b.timestamp))
                }
                _ => exchange.clone(),
            };
            let highlight = selected.and_then(|row| mapping::highlight_for(exchange, row));
            let ladder = OrderBookLadder::new(title, book.as_ref())
                .depth(self.depth as usize)
                .highlight(highlight);
            frame.render_widget(ladder, columns[idx]);
        }
    }

    fn render_symbol_selector(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" {}  [ / ] symbol  up/down pick ", self.current_symbol()))
            .title_style(
                Style::default()
                    .fg(ACCENT_YELLOW)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_style(Style::default().fg(BORDER_DIM));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = self.symbol_rows();
        if rows.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    format!("no opportunities for {}", self.current_symbol()),
                    Style::default().fg(TEXT_DIM),
                ))),
                inner,
            );
            return;
        }

        let selected_idx = self.selected_idx.min(rows.len() - 1);
        let lines: Vec<Line> = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let text = format!(
                    "{} {} @ {}  ->  {} @ {}   {} bps   profit {}",
                    if idx == selected_idx { ">" } else { " " },
                    row.buy_exchange,
                    fmt_price(row.buy_price),
                    row.sell_exchange,
                    fmt_price(row.sell_price),
                    fmt_bps(row.spread_bps),
                    fmt_opt_jpy(row.expected_profit_jpy),
                );
                if idx == selected_idx {
                    Line::from(Span::styled(
                        text,
                        Style::default()
                            .fg(ACCENT_YELLOW)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(text, Style::default().fg(TEXT_DIM)))
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_opportunities(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(6),
                Constraint::Length(6),
            ])
            .split(area);

        let key = Style::default().fg(ACCENT_CYAN);
        let dim = Style::default().fg(TEXT_DIM);
        let bright = Style::default()
            .fg(TEXT_BRIGHT)
            .add_modifier(Modifier::BOLD);
        let filter_line = Line::from(vec![
            Span::styled(" min spread ", dim),
            Span::styled(format!("{:.1} bps", self.min_spread_bps), bright),
            Span::styled("  [-/+]", key),
            Span::styled("    min profit ", dim),
            Span::styled(fmt_jpy(self.min_profit_jpy), bright),
            Span::styled("  [</>]", key),
            Span::styled(format!("    {} rows", self.opportunities.len()), dim),
        ]);
        frame.render_widget(Paragraph::new(filter_line), chunks[0]);

        let selected = if self.opportunities.is_empty() {
            None
        } else {
            Some(self.selected_idx.min(self.opportunities.len() - 1))
        };
        frame.render_widget(
            OpportunityTable::new("OPPORTUNITIES", &self.opportunities).selected(selected),
            chunks[1],
        );

        frame.render_widget(
            SparklinePanel::new("SPREAD HISTORY (0.01 bps)", &self.history_bps)
                .color(ACCENT_PURPLE),
            chunks[2],
        );
    }

    fn render_portfolio(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(6),
                Constraint::Length(7),
            ])
            .split(area);

        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 4),
                Constraint::Ratio(1, 4),
                Constraint::Ratio(1, 4),
                Constraint::Ratio(1, 4),
            ])
            .split(chunks[0]);

        frame.render_widget(
            MetricCard::new("TOTAL VALUE", fmt_opt_jpy(self.portfolio_total)).color(ACCENT_GREEN),
            cards[0],
        );
        frame.render_widget(
            MetricCard::new("ASSETS", self.matrix.rows.len().to_string()),
            cards[1],
        );
        frame.render_widget(
            MetricCard::new("POSITIONS", self.positions.len().to_string()),
            cards[2],
        );
        let updated = self
            .portfolio_updated
            .as_deref()
            .map(mapping::format_datetime_label)
            .unwrap_or_else(|| DASH.to_string());
        frame.render_widget(MetricCard::new("UPDATED", updated).color(TEXT_DIM), cards[3]);

        frame.render_widget(PortfolioMatrixTable::new(&self.matrix), chunks[1]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);

        let sub_lines: Vec<Line> = if self.subtotals.is_empty() {
            vec![Line::from(Span::styled(
                "no balances",
                Style::default().fg(TEXT_DIM),
            ))]
        } else {
            self.subtotals
                .iter()
                .map(|(exchange, value)| {
                    Line::from(vec![
                        Span::styled(format!("{:<12}", exchange), Style::default().fg(TEXT_DIM)),
                        Span::styled(fmt_jpy(*value), Style::default().fg(ACCENT_GREEN)),
                    ])
                })
                .collect()
        };
        let sub_block = Block::default()
            .title(" PER-EXCHANGE VALUE ")
            .title_style(
                Style::default()
                    .fg(ACCENT_CYAN)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_style(Style::default().fg(BORDER_DIM));
        frame.render_widget(Paragraph::new(sub_lines).block(sub_block), bottom[0]);
        frame.render_widget(
            SparklinePanel::new("TOTAL VALUE HISTORY", &self.value_history).color(ACCENT_GREEN),
            bottom[1],
        );
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let key = Style::default().fg(ACCENT_CYAN);
        let dim = Style::default().fg(TEXT_DIM);
        let mut spans = vec![
            Span::styled(" [Q]", key),
            Span::styled(" Quit ", dim),
            Span::styled("[Tab]", key),
            Span::styled(" Switch ", dim),
            Span::styled("[R]", key),
            Span::styled(" Refresh ", dim),
            Span::styled("[P]", key),
            Span::styled(" Pause ", dim),
            Span::styled("[?]", key),
            Span::styled(" Help ", dim),
            Span::styled("| ", Style::default().fg(BORDER_DIM)),
            Span::styled(format!("gen {} ", self.generation), dim),
        ];
        if self.paused {
            spans.push(Span::styled(
                "PAUSED ",
                Style::default()
                    .fg(ACCENT_YELLOW)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        if self.feed.is_mock() {
            spans.push(Span::styled(
                "MOCK ",
                Style::default()
                    .fg(ACCENT_PURPLE)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        spans.push(Span::styled("| ", Style::default().fg(BORDER_DIM)));
        spans.push(Span::styled(self.feed.source_label(), dim));
        spans.push(Span::raw(" "));
        spans.push(if self.connected {
            Span::styled("●", Style::default().fg(ACCENT_GREEN))
        } else {
            Span::styled("○", Style::default().fg(ACCENT_RED))
        });
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_help(&self, frame: &mut Frame) {
        let area = centered_rect(60, 60, frame.size());
        frame.render_widget(Clear, area);

        let bindings = [
            ("q / Esc", "quit"),
            ("Tab / Right", "next tab"),
            ("S-Tab / Left", "previous tab"),
            ("1-4", "jump to tab"),
            ("r", "refresh now"),
            ("p", "pause / resume auto refresh"),
            ("[ / ]", "previous / next symbol"),
            ("Up / Down", "select opportunity"),
            ("- / +", "min spread filter (bps)"),
            ("< / >", "min profit filter (yen)"),
            ("?", "toggle this help"),
        ];
        let lines: Vec<Line> = bindings
            .iter()
            .map(|(keys, what)| {
                Line::from(vec![
                    Span::styled(
                        format!(" {:<14}", keys),
                        Style::default()
                            .fg(ACCENT_CYAN)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(*what, Style::default().fg(TEXT_BRIGHT)),
                ])
            })
            .collect();

        let block = Block::default()
            .title(" HELP ")
            .title_style(
                Style::default()
                    .fg(ACCENT_CYAN)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_style(Style::default().fg(BORDER_DIM))
            .style(Style::default().bg(Color::Rgb(16, 16, 16)));
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

fn count(value: Option<u64>) -> String {
    value
        .map(|n| n.to_string())
        .unwrap_or_else(|| DASH.to_string())
}

fn stat_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {:<16}", label), Style::default().fg(TEXT_DIM)),
        Span::styled(value, Style::default().fg(TEXT_BRIGHT)),
    ])
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockFeed;
    use clap::Parser;
    use crossterm::event::KeyModifiers;

    fn test_app() -> App {
        let config = AppConfig::parse_from([
            "arbwatch",
            "--mock",
            "--exchanges",
            "bitbank,zaif",
            "--symbols",
            "XRP/JPY,MONA/JPY",
        ]);
        let feed = DataFeed::Mock(MockFeed::new(
            3,
            config.exchanges.clone(),
            config.symbols.clone(),
        ));
        App::new(feed, &config)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn tab_keys_cycle_and_wrap() {
        let mut app = test_app();
        assert_eq!(app.current_tab, Tab::Overview);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.current_tab, Tab::OrderBooks);
        app.handle_key(key(KeyCode::BackTab));
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.current_tab, Tab::Portfolio);
        app.handle_key(key(KeyCode::Char('3')));
        assert_eq!(app.current_tab, Tab::Opportunities);
    }

    #[test]
    fn quit_help_and_pause_keys() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::Char('?')));
        assert!(app.show_help);
        app.handle_key(key(KeyCode::Char('p')));
        assert!(app.paused);
        app.handle_key(key(KeyCode::Char('p')));
        assert!(!app.paused);
        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.running);
        app.running = true;
        app.handle_key(key(KeyCode::Esc));
        assert!(!app.running);
    }

    #[test]
    fn filters_step_and_clamp() {
        let mut app = test_app();
        for _ in 0..40 {
            app.handle_key(key(KeyCode::Char('-')));
        }
        assert_eq!(app.min_spread_bps, SPREAD_FLOOR_BPS);
        assert!(app.force_refresh);

        for _ in 0..300 {
            app.handle_key(key(KeyCode::Char('+')));
        }
        assert_eq!(app.min_spread_bps, SPREAD_CAP_BPS);

        for _ in 0..600 {
            app.handle_key(key(KeyCode::Char('>')));
        }
        assert_eq!(app.min_profit_jpy, PROFIT_CAP_JPY);
        for _ in 0..600 {
            app.handle_key(key(KeyCode::Char('<')));
        }
        assert_eq!(app.min_profit_jpy, PROFIT_FLOOR_JPY);
    }

    #[test]
    fn symbol_cycle_wraps_and_resets_selection() {
        let mut app = test_app();
        app.selected_idx = 3;
        app.handle_key(key(KeyCode::Char(']')));
        assert_eq!(app.current_symbol(), "MONA/JPY");
        assert_eq!(app.selected_idx, 0);
        app.handle_key(key(KeyCode::Char(']')));
        assert_eq!(app.current_symbol(), "XRP/JPY");
        app.handle_key(key(KeyCode::Char('[')));
        assert_eq!(app.current_symbol(), "MONA/JPY");
        assert!(app.needs_populate);
    }

    #[test]
    fn selection_clamps_to_visible_rows() {
        let mut app = test_app();
        app.current_tab = Tab::Opportunities;
        app.opportunities = vec![OpportunityRow::default(), OpportunityRow::default()];
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.selected_idx, 1);
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.selected_idx, 0);
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.selected_idx, 0);
    }

    #[tokio::test]
    async fn first_refresh_populates_the_overview() {
        let mut app = test_app();
        // widen the filters so the assertion does not depend on the rng
        app.min_spread_bps = 0.0;
        app.min_profit_jpy = 0.0;
        app.maybe_refresh().await;
        assert_eq!(app.generation, 1);
        assert!(app.connected);
        assert!(app.summary.is_some());
        assert!(app.stats.is_some());
        assert!(!app.opportunities.is_empty());
    }

    #[tokio::test]
    async fn refresh_waits_for_the_interval_unless_forced() {
        let mut app = test_app();
        app.maybe_refresh().await;
        assert_eq!(app.generation, 1);
        app.maybe_refresh().await;
        assert_eq!(app.generation, 1);
        app.handle_key(key(KeyCode::Char('r')));
        app.maybe_refresh().await;
        assert_eq!(app.generation, 2);
    }

    #[tokio::test]
    async fn pause_blocks_the_timer_but_not_manual_refresh() {
        let mut app = test_app();
        app.maybe_refresh().await;
        assert_eq!(app.generation, 1);
        app.last_refresh = Some(Instant::now() - Duration::from_secs(600));
        app.paused = true;
        app.maybe_refresh().await;
        assert_eq!(app.generation, 1);
        app.force_refresh = true;
        app.maybe_refresh().await;
        assert_eq!(app.generation, 2);
    }

    #[tokio::test]
    async fn tab_switch_fetches_within_the_same_generation() {
        let mut app = test_app();
        app.maybe_refresh().await;
        assert_eq!(app.generation, 1);
        assert!(app.orderbooks.is_empty());

        app.handle_key(key(KeyCode::Tab));
        app.maybe_refresh().await;
        assert_eq!(app.generation, 1);
        assert_eq!(app.orderbooks.len(), 2);
        assert!(app.orderbooks.iter().all(|(_, book)| book.is_some()));
    }

    #[tokio::test]
    async fn paused_tab_switch_reads_only_the_cache() {
        let mut app = test_app();
        app.maybe_refresh().await;
        app.handle_key(key(KeyCode::Tab));
        app.maybe_refresh().await;
        assert!(app.orderbooks.iter().all(|(_, book)| book.is_some()));

        // cycling to a symbol that was never fetched while paused must not
        // hit the feed, so every ladder goes empty
        app.paused = true;
        app.handle_key(key(KeyCode::Char(']')));
        app.maybe_refresh().await;
        assert_eq!(app.generation, 1);
        assert_eq!(app.orderbooks.len(), 2);
        assert!(app.orderbooks.iter().all(|(_, book)| book.is_none()));
        assert!(app.connected);
    }
}
