//! Market price dashboard screen rendering
//!
//! Renders the header, the filter bar with commodity family tabs, the price
//! table for the current page, and the pagination footer.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs},
    Frame,
};

use crate::app::{App, InputMode};
use crate::i18n::Translator;
use crate::market::{CommodityFamily, MarketView, PriceRecord, PAGE_SIZE};

/// Formats a rupee amount with Indian digit grouping (12,34,567.5)
pub fn format_inr(price: f64) -> String {
    let rounded = (price.max(0.0) * 100.0).round() / 100.0;
    let whole = rounded.trunc() as u64;
    let paise = ((rounded - rounded.trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut groups = Vec::new();
        let mut rest = head;
        while rest.len() > 2 {
            let (front, back) = rest.split_at(rest.len() - 2);
            groups.push(back);
            rest = front;
        }
        groups.push(rest);
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    };

    if paise == 0 {
        grouped
    } else {
        let fraction = format!("{:02}", paise);
        format!("{}.{}", grouped, fraction.trim_end_matches('0'))
    }
}

/// Arrival dates are shown as sent (DD/MM/YYYY); blank becomes "-"
fn format_date(date: &str) -> &str {
    if date.trim().is_empty() {
        "-"
    } else {
        date
    }
}

/// Renders the full dashboard
pub fn render<S>(frame: &mut Frame, app: &App<S>) {
    let view = app.prices.view();
    let t = &app.translator;

    let refreshing = app.refresh_requested || view.loading;
    let banner_height = if view.error.is_some() || view.is_stale || refreshing {
        1
    } else {
        0
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Header
            Constraint::Length(banner_height), // Error / stale banner
            Constraint::Length(3),             // Filters
            Constraint::Length(1),             // Family tabs
            Constraint::Min(5),                // Table
            Constraint::Length(2),             // Footer
        ])
        .split(frame.area());

    render_header(frame, chunks[0], &view, t);
    if banner_height > 0 {
        render_banner(frame, chunks[1], &view, refreshing, t);
    }
    render_filters(frame, chunks[2], &view, app.input_mode, t);
    render_family_tabs(frame, chunks[3], view.selected_family, t);
    render_table(frame, chunks[4], &view.records, t);
    render_footer(frame, chunks[5], &view, t);
}

fn render_header(frame: &mut Frame, area: Rect, view: &MarketView, t: &Translator) {
    let mut right = vec![Span::styled(
        format!("{} {}", view.total_records, t.translate("status.total")),
        Style::default().fg(Color::Gray),
    )];
    if let Some(updated) = &view.last_updated {
        right.push(Span::raw("  "));
        right.push(Span::styled(
            format!("{}: {}", t.translate("status.last_updated"), updated),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(inner);

    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            t.translate("app.title"),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            t.translate("app.subtitle"),
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    frame.render_widget(title, columns[0]);
    frame.render_widget(
        Paragraph::new(Line::from(right)).alignment(Alignment::Right),
        columns[1],
    );
}

fn render_banner(
    frame: &mut Frame,
    area: Rect,
    view: &MarketView,
    refreshing: bool,
    t: &Translator,
) {
    let (text, color) = if refreshing {
        (t.translate("status.refreshing").to_string(), Color::Cyan)
    } else if let Some(error) = &view.error {
        let color = if view.is_stale { Color::Yellow } else { Color::Red };
        (format!("⚠ {}", error), color)
    } else {
        (format!("⚠ {}", t.translate("status.stale")), Color::Yellow)
    };
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(color)),
        area,
    );
}

fn render_filters(
    frame: &mut Frame,
    area: Rect,
    view: &MarketView,
    mode: InputMode,
    t: &Translator,
) {
    let state = if view.selected_state.is_empty() {
        t.translate("filter.all_states")
    } else {
        view.selected_state.as_str()
    };
    let district = if view.selected_district.is_empty() {
        t.translate("filter.all_districts")
    } else {
        view.selected_district.as_str()
    };

    let search_style = if mode == InputMode::Search {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let search = if view.search_query.is_empty() && mode == InputMode::Normal {
        Span::styled(
            t.translate("filter.search").to_string(),
            Style::default().fg(Color::DarkGray),
        )
    } else if mode == InputMode::Search {
        Span::styled(format!("{}▏", view.search_query), search_style)
    } else {
        Span::styled(view.search_query.clone(), search_style)
    };

    let label = Style::default().fg(Color::DarkGray);
    let line = Line::from(vec![
        Span::styled("[s] ", label),
        Span::styled(state.to_string(), Style::default().fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled("[d] ", label),
        Span::styled(district.to_string(), Style::default().fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled("[/] ", label),
        search,
        Span::raw("   "),
        Span::styled("[L] ", label),
        Span::styled(
            t.language().native_name().to_string(),
            Style::default().fg(Color::Cyan),
        ),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_family_tabs(frame: &mut Frame, area: Rect, selected: CommodityFamily, t: &Translator) {
    let tabs = CommodityFamily::tabs();
    let titles: Vec<Line> = tabs
        .iter()
        .map(|f| Line::from(t.translate(f.label_key()).to_string()))
        .collect();
    let index = tabs.iter().position(|f| *f == selected).unwrap_or(0);

    let widget = Tabs::new(titles)
        .select(index)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
        .divider("|");
    frame.render_widget(widget, area);
}

fn render_table(frame: &mut Frame, area: Rect, records: &[PriceRecord], t: &Translator) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} ", t.translate("table.per_quintal")));

    if records.is_empty() {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                t.translate("table.no_data"),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                t.translate("table.no_data_hint"),
                Style::default().fg(Color::DarkGray),
            )),
        ];
        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let header = Row::new(
        [
            "table.commodity",
            "table.variety",
            "table.market",
            "table.district",
            "table.min_price",
            "table.max_price",
            "table.modal_price",
            "table.date",
        ]
        .map(|key| Cell::from(t.translate(key).to_string())),
    )
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = records
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.commodity.clone()),
                Cell::from(r.variety.clone()),
                Cell::from(r.market.clone()),
                Cell::from(r.district.clone()),
                Cell::from(format_inr(r.min_price)),
                Cell::from(format_inr(r.max_price)),
                Cell::from(Span::styled(
                    format_inr(r.modal_price),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )),
                Cell::from(format_date(&r.arrival_date).to_string()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(18),
        Constraint::Percentage(12),
        Constraint::Percentage(16),
        Constraint::Percentage(12),
        Constraint::Percentage(10),
        Constraint::Percentage(10),
        Constraint::Percentage(10),
        Constraint::Percentage(12),
    ];

    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

fn render_footer(frame: &mut Frame, area: Rect, view: &MarketView, t: &Translator) {
    let (first, last) = if view.filtered_count == 0 {
        (0, 0)
    } else {
        let first = (view.current_page.saturating_sub(1)) * PAGE_SIZE + 1;
        (first, (first + view.records.len()).saturating_sub(1))
    };

    let summary = format!(
        "{} {}-{} {} {} {}",
        t.translate("status.showing"),
        first,
        last,
        t.translate("status.of"),
        view.filtered_count,
        t.translate("status.results"),
    );
    let page = format!(
        "‹ {} {} {} {} ›",
        t.translate("pagination.page"),
        view.current_page,
        t.translate("pagination.of"),
        view.total_pages.max(1),
    );

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let left = Paragraph::new(vec![
        Line::from(summary),
        Line::from(Span::styled(
            t.translate("app.source"),
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    let right = Paragraph::new(vec![
        Line::from(Span::styled(page, Style::default().fg(Color::Cyan))),
        Line::from(Span::styled(
            "f:family  r:refresh  ?:help  q:quit",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Right);

    frame.render_widget(left, columns[0]);
    frame.render_widget(right, columns[1]);
}

/// Renders a loading message while the first fetch is in flight
pub fn render_loading(frame: &mut Frame, t: &Translator) {
    let area = frame.area();

    // Center the loading message vertically
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ])
        .split(area);

    let loading_text = Paragraph::new(t.translate("status.loading"))
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);

    frame.render_widget(loading_text, chunks[1]);
}
