//! Custom widgets for the arbitrage dashboard.
//!
//! AMOLED-black theme: bids green, asks red, highlights yellow. Absent
//! values render as "-", never as zero.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Sparkline, Table, Widget},
};

use crate::mapping::{nearest_level, Highlight, HighlightRole, OpportunityRow, PortfolioMatrix};
use crate::models::{OrderBookSnapshot, PriceLevel};

// Color palette (AMOLED-black theme)
pub const BG_BLACK: Color = Color::Rgb(0, 0, 0);
pub const ACCENT_CYAN: Color = Color::Rgb(0, 255, 255);
pub const ACCENT_GREEN: Color = Color::Rgb(0, 255, 136);
pub const ACCENT_RED: Color = Color::Rgb(255, 68, 68);
pub const ACCENT_YELLOW: Color = Color::Rgb(255, 204, 0);
pub const ACCENT_PURPLE: Color = Color::Rgb(168, 85, 247);
pub const TEXT_DIM: Color = Color::Rgb(128, 128, 128);
pub const TEXT_BRIGHT: Color = Color::Rgb(255, 255, 255);
pub const BORDER_DIM: Color = Color::Rgb(48, 48, 48);

/// Placeholder for values the engine did not provide.
pub const DASH: &str = "-";

fn bordered(title: &str, title_color: Color) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title))
        .title_style(
            Style::default()
                .fg(title_color)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER_DIM))
}

/// Status line entry with a colored dot.
pub struct StatusIndicator<'a> {
    label: &'a str,
    status: Status,
    detail: Option<&'a str>,
}

#[derive(Clone, Copy, PartialEq)]
pub enum Status {
    Ok,
    Warning,
    Error,
    Disconnected,
}

impl<'a> StatusIndicator<'a> {
    pub fn new(label: &'a str, status: Status) -> Self {
        Self {
            label,
            status,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: &'a str) -> Self {
        self.detail = Some(detail);
        self
    }
}

impl<'a> Widget for StatusIndicator<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (icon, color) = match self.status {
            Status::Ok => ("●", ACCENT_GREEN),
            Status::Warning => ("●", ACCENT_YELLOW),
            Status::Error => ("●", ACCENT_RED),
            Status::Disconnected => ("○", TEXT_DIM),
        };

        let line = Line::from(vec![
            Span::styled(icon, Style::default().fg(color)),
            Span::raw(" "),
            Span::styled(self.label, Style::default().fg(TEXT_BRIGHT)),
            Span::raw(" "),
            Span::styled(self.detail.unwrap_or(""), Style::default().fg(TEXT_DIM)),
        ]);

        Paragraph::new(line).render(area, buf);
    }
}

/// Bordered card with one big value and an optional detail line.
pub struct MetricCard<'a> {
    title: &'a str,
    value: String,
    color: Color,
    detail: Option<String>,
}

impl<'a> MetricCard<'a> {
    pub fn new(title: &'a str, value: String) -> Self {
        Self {
            title,
            value,
            color: TEXT_BRIGHT,
            detail: None,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }
}

impl<'a> Widget for MetricCard<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = bordered(self.title, TEXT_DIM);
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 {
            return;
        }

        let mut lines = vec![Line::from(Span::styled(
            self.value,
            Style::default()
                .fg(self.color)
                .add_modifier(Modifier::BOLD),
        ))];
        if let Some(detail) = self.detail {
            lines.push(Line::from(Span::styled(
                detail,
                Style::default().fg(TEXT_DIM),
            )));
        }
        Paragraph::new(lines).render(inner, buf);
    }
}

/// Two-sided depth ladder: asks on top (reversed, best at the bottom of
/// the block), a mid/spread divider, bids below. An optional highlight
/// marks the level nearest the selected opportunity's leg price on the
/// side that leg would execute against.
pub struct OrderBookLadder<'a> {
    title: String,
    book: Option<&'a OrderBookSnapshot>,
    highlight: Option<Highlight>,
    depth: usize,
}

impl<'a> OrderBookLadder<'a> {
    pub fn new(title: String, book: Option<&'a OrderBookSnapshot>) -> Self {
        Self {
            title,
            book,
            highlight: None,
            depth: 10,
        }
    }

    pub fn highlight(mut self, highlight: Option<Highlight>) -> Self {
        self.highlight = highlight;
        self
    }

    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }
}

impl<'a> Widget for OrderBookLadder<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = bordered(&self.title, ACCENT_CYAN);
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height < 3 {
            return;
        }

        let Some(book) = self.book else {
            Paragraph::new(Line::from(Span::styled(
                "no data",
                Style::default().fg(TEXT_DIM),
            )))
            .render(inner, buf);
            return;
        };

        // Hits are computed on the natural (best-first) ordering; display
        // order is a presentation detail.
        let ask_hit = match self.highlight {
            Some(h) if h.role == HighlightRole::Buy => {
                nearest_level(&book.asks, Some(h.target_price))
            }
            _ => None,
        };
        let bid_hit = match self.highlight {
            Some(h) if h.role == HighlightRole::Sell => {
                nearest_level(&book.bids, Some(h.target_price))
            }
            _ => None,
        };

        let per_side = ((inner.height as usize).saturating_sub(1)) / 2;
        let shown = self.depth.min(per_side);
        let shown_asks = shown.min(book.asks.len());
        let shown_bids = shown.min(book.bids.len());

        let mut lines = Vec::with_capacity(shown_asks + shown_bids + 1);
        for idx in (0..shown_asks).rev() {
            lines.push(level_line(
                &book.asks[idx],
                ACCENT_RED,
                ask_hit == Some(idx),
                "BUY",
            ));
        }
        lines.push(mid_line(book));
        for idx in 0..shown_bids {
            lines.push(level_line(
                &book.bids[idx],
                ACCENT_GREEN,
                bid_hit == Some(idx),
                "SELL",
            ));
        }

        Paragraph::new(lines).render(inner, buf);
    }
}

fn level_line(level: &PriceLevel, side_color: Color, hit: bool, marker: &str) -> Line<'static> {
    let price = format!("{:>12.2}", level.price);
    let amount = format!("{:>14}", fmt_qty(level.amount));
    if hit {
        Line::from(Span::styled(
            format!("{}{}  ◀ {}", price, amount, marker),
            Style::default()
                .fg(BG_BLACK)
                .bg(ACCENT_YELLOW)
                .add_modifier(Modifier::BOLD),
        ))
    } else {
        Line::from(vec![
            Span::styled(price, Style::default().fg(side_color)),
            Span::styled(amount, Style::default().fg(TEXT_DIM)),
        ])
    }
}

fn mid_line(book: &OrderBookSnapshot) -> Line<'static> {
    Line::from(Span::styled(
        format!(
            " mid {}  spread {} ",
            fmt_price(book.mid_price),
            fmt_price(book.spread)
        ),
        Style::default()
            .fg(ACCENT_CYAN)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Opportunity rows as a table, optionally with one row emphasized.
pub struct OpportunityTable<'a> {
    title: &'a str,
    rows: &'a [OpportunityRow],
    selected: Option<usize>,
}

impl<'a> OpportunityTable<'a> {
    pub fn new(title: &'a str, rows: &'a [OpportunityRow]) -> Self {
        Self {
            title,
            rows,
            selected: None,
        }
    }

    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }
}

impl<'a> Widget for OpportunityTable<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = bordered(self.title, ACCENT_PURPLE);

        if self.rows.is_empty() {
            let inner = block.inner(area);
            block.render(area, buf);
            Paragraph::new(Line::from(Span::styled(
                "no opportunities",
                Style::default().fg(TEXT_DIM),
            )))
            .render(inner, buf);
            return;
        }

        let header = Row::new(vec![
            "TIME", "SYMBOL", "BUY AT", "SELL AT", "BUY PX", "SELL PX", "BPS", "SPR ¥", "SIZE ¥",
            "PROFIT ¥",
        ])
        .style(Style::default().fg(TEXT_DIM).add_modifier(Modifier::BOLD));

        let rows = self.rows.iter().enumerate().map(|(idx, row)| {
            let profit_color = match row.expected_profit_jpy {
                Some(profit) if profit > 0.0 => ACCENT_GREEN,
                Some(_) => ACCENT_RED,
                None => TEXT_DIM,
            };
            let cells = vec![
                Span::styled(row.time_label.clone(), Style::default().fg(TEXT_DIM)),
                Span::styled(row.symbol.clone(), Style::default().fg(TEXT_BRIGHT)),
                Span::styled(row.buy_exchange.clone(), Style::default().fg(ACCENT_GREEN)),
                Span::styled(row.sell_exchange.clone(), Style::default().fg(ACCENT_RED)),
                Span::styled(fmt_price(row.buy_price), Style::default().fg(TEXT_BRIGHT)),
                Span::styled(fmt_price(row.sell_price), Style::default().fg(TEXT_BRIGHT)),
                Span::styled(fmt_bps(row.spread_bps), Style::default().fg(ACCENT_CYAN)),
                Span::styled(fmt_price(row.spread_jpy), Style::default().fg(TEXT_BRIGHT)),
                Span::styled(fmt_opt_jpy(row.estimated_size_jpy), Style::default().fg(TEXT_BRIGHT)),
                Span::styled(fmt_opt_jpy(row.expected_profit_jpy), Style::default().fg(profit_color)),
            ];
            let table_row = Row::new(cells);
            if self.selected == Some(idx) {
                table_row.style(
                    Style::default()
                        .bg(Color::Rgb(40, 40, 0))
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                table_row
            }
        });

        let widths = [
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(11),
            Constraint::Length(11),
        ];
        Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(1)
            .render(area, buf);
    }
}

/// Asset-by-exchange holdings grid.
pub struct PortfolioMatrixTable<'a> {
    matrix: &'a PortfolioMatrix,
}

impl<'a> PortfolioMatrixTable<'a> {
    pub fn new(matrix: &'a PortfolioMatrix) -> Self {
        Self { matrix }
    }
}

impl<'a> Widget for PortfolioMatrixTable<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = bordered("HOLDINGS", ACCENT_CYAN);

        if self.matrix.rows.is_empty() {
            let inner = block.inner(area);
            block.render(area, buf);
            Paragraph::new(Line::from(Span::styled(
                "no portfolio data",
                Style::default().fg(TEXT_DIM),
            )))
            .render(inner, buf);
            return;
        }

        let mut header_cells = vec!["ASSET".to_string()];
        header_cells.extend(self.matrix.exchanges.iter().map(|e| e.to_uppercase()));
        header_cells.extend(["TOTAL", "PRICE ¥", "VALUE ¥", "SHARE"].map(String::from));
        let header = Row::new(header_cells)
            .style(Style::default().fg(TEXT_DIM).add_modifier(Modifier::BOLD));

        let rows = self.matrix.rows.iter().map(|row| {
            let mut cells = vec![Span::styled(
                row.asset.clone(),
                Style::default()
                    .fg(ACCENT_CYAN)
                    .add_modifier(Modifier::BOLD),
            )];
            cells.extend(row.per_exchange.iter().map(|amount| {
                Span::styled(
                    amount.map(fmt_qty).unwrap_or_else(|| DASH.to_string()),
                    Style::default().fg(TEXT_BRIGHT),
                )
            }));
            cells.push(Span::styled(
                fmt_qty(row.total_amount),
                Style::default().fg(TEXT_BRIGHT),
            ));
            cells.push(Span::styled(
                fmt_price(row.unit_price_jpy),
                Style::default().fg(TEXT_DIM),
            ));
            cells.push(Span::styled(
                fmt_opt_jpy(row.value_jpy),
                Style::default().fg(ACCENT_GREEN),
            ));
            cells.push(Span::styled(
                row.share_pct
                    .map(|s| format!("{:.1}%", s))
                    .unwrap_or_else(|| DASH.to_string()),
                Style::default().fg(TEXT_DIM),
            ));
            Row::new(cells)
        });

        let mut widths = vec![Constraint::Length(7)];
        widths.extend(std::iter::repeat(Constraint::Min(10)).take(self.matrix.exchanges.len()));
        widths.extend([
            Constraint::Min(10),
            Constraint::Length(11),
            Constraint::Length(12),
            Constraint::Length(7),
        ]);

        Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(1)
            .render(area, buf);
    }
}

/// Titled sparkline that always shows the most recent points.
pub struct SparklinePanel<'a> {
    title: &'a str,
    data: &'a [u64],
    color: Color,
}

impl<'a> SparklinePanel<'a> {
    pub fn new(title: &'a str, data: &'a [u64]) -> Self {
        Self {
            title,
            data,
            color: ACCENT_CYAN,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

impl<'a> Widget for SparklinePanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = bordered(self.title, self.color);
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 || self.data.is_empty() {
            return;
        }

        // keep the newest points when the panel is narrower than the series
        let window = self.data.len().saturating_sub(inner.width as usize);
        Sparkline::default()
            .data(&self.data[window..])
            .style(Style::default().fg(self.color))
            .render(inner, buf);
    }
}

/// Whole-yen amount with thousands separators, e.g. `¥85,000`.
pub fn fmt_jpy(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}¥{}", sign, group_thousands(&format!("{:.0}", rounded.abs())))
}

pub fn fmt_opt_jpy(value: Option<f64>) -> String {
    value.map(fmt_jpy).unwrap_or_else(|| DASH.to_string())
}

/// Price with two decimals, or the dash placeholder.
pub fn fmt_price(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| DASH.to_string())
}

pub fn fmt_bps(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| DASH.to_string())
}

/// Quantity with grouping and up to three decimals, trailing zeros trimmed.
pub fn fmt_qty(value: f64) -> String {
    let formatted = format!("{:.3}", value.abs());
    let (int_part, frac_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), ""));
    let sign = if value < 0.0 { "-" } else { "" };
    let grouped = group_thousands(int_part);
    let frac = frac_part.trim_end_matches('0');
    if frac.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac)
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpy_amounts_are_grouped() {
        assert_eq!(fmt_jpy(85_000.0), "¥85,000");
        assert_eq!(fmt_jpy(500.4), "¥500");
        assert_eq!(fmt_jpy(1_234_567.0), "¥1,234,567");
        assert_eq!(fmt_jpy(-1_234.0), "-¥1,234");
        assert_eq!(fmt_jpy(0.0), "¥0");
    }

    #[test]
    fn quantities_trim_trailing_zeros() {
        assert_eq!(fmt_qty(1234.5), "1,234.5");
        assert_eq!(fmt_qty(1000.0), "1,000");
        assert_eq!(fmt_qty(0.125), "0.125");
        assert_eq!(fmt_qty(-2.5), "-2.5");
    }

    #[test]
    fn absent_values_render_as_dash() {
        assert_eq!(fmt_price(None), DASH);
        assert_eq!(fmt_bps(None), DASH);
        assert_eq!(fmt_opt_jpy(None), DASH);
        assert_eq!(fmt_price(Some(85.5)), "85.50");
    }
}
