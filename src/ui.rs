use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::{self, AppState};
use crate::chart;
use crate::orchestrator::ChartPhase;
use crate::types::TimeWindow;

pub fn render(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    match &app.phase {
        ChartPhase::Idle | ChartPhase::Loading => {
            render_message(f, chunks[1], "loading market history…", Color::Yellow)
        }
        ChartPhase::Error(cause) => render_message(
            f,
            chunks[1],
            &format!("✗ {cause} — press r to retry"),
            Color::Red,
        ),
        ChartPhase::Ready(_) => render_ready(f, app, chunks[1]),
    }
    render_footer(f, app, chunks[2]);
}

// ---------------------------------------------------------------------------
// Header: title, phase status, window selector
// ---------------------------------------------------------------------------

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let (status_text, status_color) = match &app.phase {
        ChartPhase::Idle | ChartPhase::Loading => ("◌ loading", Color::Yellow),
        ChartPhase::Ready(_) => ("● ready", Color::Green),
        ChartPhase::Error(_) => ("✗ error", Color::Red),
    };

    let disabled: Vec<TimeWindow> = app.disabled_windows().iter().map(|&(w, _)| w).collect();
    let have_data = app.data().is_some();

    let mut spans = vec![
        Span::styled(
            " Polymarket Charts  ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │ "),
    ];
    for &w in &TimeWindow::ALL {
        let style = if w == app.window {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else if have_data && !disabled.contains(&w) {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {} ", w.label()), style));
        spans.push(Span::raw(" "));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Ready body: summary tiles, chart, crosshair readout
// ---------------------------------------------------------------------------

fn render_ready(f: &mut Frame, app: &AppState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // summary tiles
            Constraint::Min(0),    // chart
            Constraint::Length(1), // crosshair readout
        ])
        .split(area);

    render_tiles(f, app, chunks[0]);
    render_chart(f, app, chunks[1]);
    render_crosshair(f, app, chunks[2]);
}

fn render_tiles(f: &mut Frame, app: &AppState, area: Rect) {
    let Some(data) = app.data() else { return };
    let stats = app.stats();

    let constraints: Vec<Constraint> = data
        .series
        .iter()
        .map(|_| Constraint::Ratio(1, data.series.len() as u32))
        .collect();
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (i, (series, stat)) in data.series.iter().zip(&stats).enumerate() {
        let color = chart::series_color(i);
        let is_active = i == app.active;
        let border_style = if is_active {
            Style::default().fg(color)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let change_color = if stat.is_positive { Color::Green } else { Color::Red };

        // Synthetic fallback series are marked so degraded data is visible.
        let mut title = app::truncate(&series.label, (cols[i].width as usize).saturating_sub(6));
        if series.synthetic {
            title.push_str(" ~");
        }

        let line = Line::from(vec![
            Span::styled(
                app::format_value(stat.current_value),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(app::format_change(stat), Style::default().fg(change_color)),
        ]);
        let paragraph = Paragraph::new(line).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(format!(" {title} "), border_style)),
        );
        f.render_widget(paragraph, cols[i]);
    }
}

fn render_chart(f: &mut Frame, app: &AppState, area: Rect) {
    let Some(data) = app.data() else { return };
    let filtered = app.filtered();
    if filtered.is_empty() {
        render_message(f, area, "no points in range", Color::DarkGray);
        return;
    }

    let series_data: Vec<Vec<(f64, f64)>> = (0..data.series.len())
        .map(|i| chart::series_points(filtered, i))
        .collect();
    let crosshair: Vec<(f64, f64)> = app
        .cursor
        .and_then(|i| filtered.get(i))
        .map(|p| vec![(p.ts_ms as f64, 0.0), (p.ts_ms as f64, 100.0)])
        .unwrap_or_default();

    // Active series at full emphasis, the rest dimmed but never hidden.
    let mut datasets: Vec<Dataset> = data
        .series
        .iter()
        .zip(&series_data)
        .enumerate()
        .map(|(i, (series, points))| {
            let style = if i == app.active {
                Style::default()
                    .fg(chart::series_color(i))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
                    .fg(chart::series_color(i))
                    .add_modifier(Modifier::DIM)
            };
            Dataset::default()
                .name(series.label.clone())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(style)
                .data(points)
        })
        .collect();
    if !crosshair.is_empty() {
        datasets.push(
            Dataset::default()
                .marker(Marker::Bar)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::White))
                .data(&crosshair),
        );
    }

    let x_labels: Vec<Line> = chart::x_labels(filtered, app.window)
        .into_iter()
        .map(Line::from)
        .collect();

    let chart_widget = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds(chart::x_bounds(filtered))
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, 100.0])
                .labels(["0%", "50%", "100%"]),
        );
    f.render_widget(chart_widget, area);
}

fn render_crosshair(f: &mut Frame, app: &AppState, area: Rect) {
    let Some(data) = app.data() else { return };
    let filtered = app.filtered();

    let line = match app.cursor.and_then(|i| filtered.get(i)) {
        Some(point) => {
            let mut spans = vec![
                Span::styled(
                    format!(" {} ", chart::format_tick(point.ts_ms, app.window)),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::raw("│ "),
            ];
            for (idx, series) in data.series.iter().enumerate() {
                let value = point.values.get(idx).copied().flatten();
                let text = value.map(app::format_value).unwrap_or_else(|| "—".to_string());
                spans.push(Span::styled(
                    "● ",
                    Style::default().fg(chart::series_color(idx)),
                ));
                spans.push(Span::raw(format!(
                    "{}: {}  ",
                    app::truncate(&series.label, 14),
                    text
                )));
            }
            Line::from(spans)
        }
        None => Line::from(Span::styled(
            " ←/→ inspect points",
            Style::default().fg(Color::DarkGray),
        )),
    };
    f.render_widget(Paragraph::new(line), area);
}

// ---------------------------------------------------------------------------
// Footer & centered messages
// ---------------------------------------------------------------------------

fn render_footer(f: &mut Frame, app: &AppState, area: Rect) {
    let key_style = Style::default().fg(Color::Yellow);
    let mut spans = vec![
        Span::styled(" [q] ", key_style),
        Span::raw("quit  "),
        Span::styled("[r] ", key_style),
        Span::raw("refetch  "),
        Span::styled("[d/w/m/a] ", key_style),
        Span::raw("window  "),
        Span::styled("[tab] ", key_style),
        Span::raw("series  "),
        Span::styled("[←→] ", key_style),
        Span::raw("inspect  "),
    ];
    if let Some((w, reason)) = app.disabled_windows().first() {
        spans.push(Span::styled(
            format!("│ {} disabled: {reason}", w.label()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_message(f: &mut Frame, area: Rect, text: &str, color: Color) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);
    let paragraph = Paragraph::new(Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(color),
    )))
    .alignment(Alignment::Center);
    f.render_widget(paragraph, rows[1]);
}
