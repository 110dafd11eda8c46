//! Widgets for the dashboard screen

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Row, Table, Tabs,
};
use ratatui::Frame;

use super::state::{DashboardState, Mode, TabView};

/// Draw the whole dashboard
pub fn draw(frame: &mut Frame, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Length(3), // Tabs
            Constraint::Length(3), // Filter
            Constraint::Min(5),    // Body
        ])
        .split(frame.area());

    render_header(frame, chunks[0], state);
    render_tabs(frame, chunks[1], state);
    render_filter(frame, chunks[2], state);

    let tab = state.current();
    if tab.def.chart.is_some() {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[3]);
        render_table(frame, body[0], tab);
        render_chart(frame, body[1], tab);
    } else {
        render_table(frame, chunks[3], tab);
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let lines = vec![
        Line::from(vec![
            Span::styled(" ● ", Style::default().fg(Color::Green)),
            Span::styled(
                state.totals.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw("   "),
            Span::styled(state.status.as_str(), Style::default().fg(Color::Gray)),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Back-office Dashboard ")
        .border_style(Style::default().fg(Color::Blue));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_tabs(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let titles: Vec<String> = state
        .tabs
        .iter()
        .map(|t| t.def.label.to_string())
        .collect();

    let tabs = Tabs::new(titles)
        .select(state.selected)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

fn render_filter(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let tab = state.current();
    let editing = state.mode == Mode::Filter;

    let mut spans = vec![Span::raw(" "), Span::raw(tab.filter.as_str())];
    if editing {
        spans.push(Span::styled("▏", Style::default().fg(Color::Cyan)));
    }

    let border = if editing { Color::Cyan } else { Color::Blue };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Search this tab ")
        .border_style(Style::default().fg(border));

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_table(frame: &mut Frame, area: Rect, tab: &TabView) {
    let visible = tab.visible();
    let title = format!(
        " {} ({} of {} rows) ",
        tab.def.label,
        visible.len(),
        tab.table.len()
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Blue));

    if visible.columns.is_empty() {
        frame.render_widget(Paragraph::new(" No data").block(block), area);
        return;
    }

    // -3 for borders and header
    let height = area.height.saturating_sub(3) as usize;
    let rows: Vec<Row> = (tab.offset..visible.len())
        .take(height)
        .map(|idx| Row::new(visible.rendered_row(idx)))
        .collect();

    let count = visible.columns.len() as u32;
    let widths: Vec<Constraint> = visible
        .columns
        .iter()
        .map(|_| Constraint::Ratio(1, count))
        .collect();

    let header = Row::new(visible.columns.clone()).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

fn render_chart(frame: &mut Frame, area: Rect, tab: &TabView) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Chart ")
        .border_style(Style::default().fg(Color::Blue));

    let Some((x, y)) = tab.def.chart else {
        return;
    };
    let series = tab.visible().series(x, y);
    if series.is_empty() {
        frame.render_widget(Paragraph::new(" Nothing to plot").block(block), area);
        return;
    }

    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .map(|(i, (_, value))| (i as f64, *value))
        .collect();

    let y_max = series.iter().map(|(_, v)| *v).fold(f64::MIN, f64::max);
    let y_min = series.iter().map(|(_, v)| *v).fold(f64::MAX, f64::min).min(0.0);
    let y_top = if y_max > y_min { y_max * 1.1 } else { y_min + 1.0 };
    let x_max = (points.len().saturating_sub(1) as f64).max(1.0);

    let first = series.first().map(|(m, _)| m.clone()).unwrap_or_default();
    let last = series.last().map(|(m, _)| m.clone()).unwrap_or_default();

    let dataset = Dataset::default()
        .name(y)
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .title(x)
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(vec![first, last]),
        )
        .y_axis(
            Axis::default()
                .title(y)
                .style(Style::default().fg(Color::Gray))
                .bounds([y_min, y_top])
                .labels(vec![format!("{:.2}", y_min), format!("{:.2}", y_top)]),
        );

    frame.render_widget(chart, area);
}
