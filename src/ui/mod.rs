//! UI module for mapwatch-tui
//!
//! This module contains the rendering functions for the TUI interface:
//! the header with stat cards, the three views and the input overlay.

mod browse;
mod helpers;
mod history;
mod stats;
mod tracked;

use std::time::Instant;

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::App;
use crate::models::View;
use crate::theme::{
    get_pulse_color, level_color, ACCENT, ACCENT_DIM, BG_PRIMARY, BG_SECONDARY, BORDER_SUBTLE,
    GREEN_SUCCESS, ROUNDED_BORDERS, TEXT_MUTED, TEXT_PRIMARY, TEXT_SECONDARY,
};

use browse::render_browse;
use history::render_history;
use stats::{render_stat_cards, Stats};
use tracked::{render_detail, render_item_list};

/// Draw one frame
pub fn draw(frame: &mut Frame, app: &App) {
    frame.render_widget(
        Block::default().style(Style::default().bg(BG_PRIMARY)),
        frame.area(),
    );

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header: title + stat cards
            Constraint::Length(1), // View tabs
            Constraint::Min(3),    // Main content area
            Constraint::Length(1), // Key hints
            Constraint::Length(1), // Status line
        ])
        .split(frame.area());

    render_header(main_layout[0], app, frame);
    render_tabs(main_layout[1], app.view, frame);

    let offset = app.history_offset();
    match app.view {
        View::Tracked => {
            let panels = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(main_layout[2]);
            render_item_list(
                panels[0],
                app.registry.list(),
                app.selected_index,
                app.animation_tick,
                app.monitoring,
                frame,
            );
            render_detail(panels[1], app.selected_item(), offset, frame);
        }
        View::History => render_history(
            main_layout[2],
            &app.filtered_history(),
            app.history.len(),
            &app.history_filter,
            app.history_scroll,
            offset,
            frame,
        ),
        View::Browse => render_browse(
            main_layout[2],
            &app.browse,
            |id| app.registry.contains(id),
            app.animation_tick,
            frame,
        ),
    }

    render_key_hints(main_layout[3], app.view, frame);
    render_status_line(main_layout[4], app, frame);

    if app.input.is_some() {
        render_input(frame.area(), app, frame);
    }
}

fn render_header(area: Rect, app: &App, frame: &mut Frame) {
    let header = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(ROUNDED_BORDERS)
        .border_style(Style::default().fg(BORDER_SUBTLE))
        .style(Style::default().bg(BG_SECONDARY));

    let (state_text, state_color) = if app.monitoring {
        let next = app
            .schedule
            .time_until_next(Instant::now())
            .map(|d| format!("next check in {:.1}s", d.as_secs_f64()))
            .unwrap_or_else(|| "checking...".to_string());
        (
            format!("● TRACKING  {next}"),
            get_pulse_color(app.animation_tick, GREEN_SUCCESS, ACCENT_DIM),
        )
    } else {
        ("○ IDLE  press s to start".to_string(), TEXT_MUTED)
    };

    let content = vec![
        Line::from(vec![
            Span::styled(
                " MAPWATCH",
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  v{}", crate::cli::VERSION),
                Style::default().fg(TEXT_MUTED),
            ),
        ]),
        Line::from(Span::styled(
            format!(" {state_text}"),
            Style::default().fg(state_color),
        )),
    ];

    frame.render_widget(Paragraph::new(content).block(block), header[0]);

    let stats = Stats {
        tracked: app.registry.len(),
        enabled: app.registry.enabled_count(),
        settled: app
            .registry
            .list()
            .iter()
            .filter(|item| item.status.is_final())
            .count(),
        history: app.history.len(),
    };
    render_stat_cards(header[1], stats, frame);
}

fn render_tabs(area: Rect, current: View, frame: &mut Frame) {
    let mut spans = vec![Span::raw(" ")];
    for view in [View::Tracked, View::History, View::Browse] {
        let style = if view == current {
            Style::default()
                .fg(BG_PRIMARY)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT_SECONDARY)
        };
        spans.push(Span::styled(format!(" {} ", view.label()), style));
        spans.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_key_hints(area: Rect, view: View, frame: &mut Frame) {
    let view_keys: &[(&str, &str)] = match view {
        View::Tracked => &[("a", "add"), ("d", "remove"), ("space", "toggle")],
        View::History => &[
            ("/", "filter"),
            ("f", "status"),
            ("m", "mode"),
            ("d", "delete"),
            ("x", "export"),
            ("i", "import"),
            ("C", "clear"),
        ],
        View::Browse => &[
            ("/", "search"),
            ("f", "status"),
            ("m", "mode"),
            ("o", "sort"),
            ("enter", "track"),
            ("n", "more"),
        ],
    };
    let common: &[(&str, &str)] = &[
        ("s", "start/stop"),
        ("r", "refresh"),
        ("tab", "view"),
        ("q", "quit"),
    ];

    let mut spans = vec![Span::raw(" ")];
    for (key, action) in view_keys.iter().chain(common) {
        spans.push(Span::styled(
            *key,
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" {action}  "),
            Style::default().fg(TEXT_MUTED),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_status_line(area: Rect, app: &App, frame: &mut Frame) {
    let mut spans = vec![Span::styled(
        format!(" {}", app.status.text),
        Style::default().fg(level_color(app.status.level)),
    )];
    if let Some(last_check) = app.last_check {
        spans.push(Span::styled(
            format!(
                "  (last check {})",
                last_check.with_timezone(&app.history_offset()).format("%H:%M:%S")
            ),
            Style::default().fg(TEXT_MUTED),
        ));
    }
    if !app.pending_lookups.is_empty() {
        spans.push(Span::styled(
            format!("  ({} lookup(s) pending)", app.pending_lookups.len()),
            Style::default().fg(TEXT_MUTED),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Centered rect of fixed height and `percent_x` of the width
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height: height.min(area.height),
    }
}

fn render_input(area: Rect, app: &App, frame: &mut Frame) {
    let Some(prompt) = &app.input else {
        return;
    };
    let popup = centered_rect(60, 3, area);

    let block = Block::default()
        .title(format!(" {} ", prompt.kind.prompt()))
        .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_set(ROUNDED_BORDERS)
        .border_style(Style::default().fg(ACCENT))
        .style(Style::default().bg(BG_SECONDARY));

    let cursor = get_pulse_color(app.animation_tick, ACCENT, BG_SECONDARY);
    let line = Line::from(vec![
        Span::styled(prompt.buffer.clone(), Style::default().fg(TEXT_PRIMARY)),
        Span::styled("▏", Style::default().fg(cursor)),
    ]);

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(line).block(block), popup);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = centered_rect(60, 3, area);
        assert_eq!(rect, Rect::new(20, 18, 60, 3));
    }

    #[test]
    fn test_centered_rect_small_area() {
        let area = Rect::new(0, 0, 10, 2);
        let rect = centered_rect(50, 3, area);
        assert_eq!(rect.height, 2);
        assert_eq!(rect.width, 5);
    }
}
