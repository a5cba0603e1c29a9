//! Tracked beatmapset cards and the detail panel

use std::time::Duration;

use chrono::FixedOffset;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use super::helpers::wrap_text;
use crate::models::{ItemState, TrackedItem};
use crate::theme::{
    get_pulse_color, status_color, star_color, ACCENT, ACCENT_DIM, BG_SECONDARY, BG_TERTIARY,
    BORDER_SUBTLE, GREEN_SUCCESS, ROUNDED_BORDERS, TEXT_MUTED, TEXT_PRIMARY, TEXT_SECONDARY,
};
use crate::utils::{format_duration, format_timestamp, truncate};

pub const CARD_HEIGHT: u16 = 3;

/// First card index to draw so that `selected` stays visible
pub fn scroll_start(selected: usize, total: usize, visible: usize) -> usize {
    if visible == 0 || total <= visible {
        return 0;
    }
    selected.saturating_sub(visible - 1).min(total - visible)
}

/// Render a single tracked item card (3 lines: border + content + border)
pub fn render_item_card(
    area: Rect,
    item: &TrackedItem,
    tick: u64,
    monitoring: bool,
    selected: bool,
    frame: &mut Frame,
) {
    let state = ItemState::of(item.enabled, item.status.is_final());

    // Watching items pulse while monitoring is running
    let (indicator, indicator_color, text_color) = match state {
        ItemState::Settled => ("●", GREEN_SUCCESS, TEXT_PRIMARY),
        ItemState::Watching if monitoring => ("●", get_pulse_color(tick, ACCENT, ACCENT_DIM), TEXT_PRIMARY),
        ItemState::Watching => ("●", ACCENT_DIM, TEXT_PRIMARY),
        ItemState::Paused => ("○", TEXT_MUTED, TEXT_SECONDARY),
    };

    let border_color = if selected { ACCENT } else { BORDER_SUBTLE };
    let bg_color = if selected { BG_TERTIARY } else { BG_SECONDARY };

    let card_block = Block::default()
        .borders(Borders::ALL)
        .border_set(ROUNDED_BORDERS)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(bg_color));

    let status_label = format!(" {} ", item.status.label());
    let inner_width = area.width.saturating_sub(4) as usize;
    let prefix = format!("{} #{} ", indicator, item.id);
    let available = inner_width
        .saturating_sub(prefix.chars().count())
        .saturating_sub(status_label.chars().count());

    let line = Line::from(vec![
        Span::styled(format!("{} ", indicator), Style::default().fg(indicator_color)),
        Span::styled(
            format!("#{} ", item.id),
            Style::default().fg(text_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{:<width$}", truncate(&item.display_title(), available), width = available),
            Style::default().fg(text_color),
        ),
        Span::styled(
            status_label,
            Style::default()
                .fg(status_color(item.status))
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(card_block), area);
}

/// Render the list of tracked items, scrolled to keep the selection visible
pub fn render_item_list(
    area: Rect,
    items: &[TrackedItem],
    selected: usize,
    tick: u64,
    monitoring: bool,
    frame: &mut Frame,
) {
    if items.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No beatmapsets tracked yet",
                Style::default().fg(TEXT_SECONDARY),
            )),
            Line::from(Span::styled(
                "Press a to add one by id or URL, or Tab to browse qualified maps",
                Style::default().fg(TEXT_MUTED),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(empty, area);
        return;
    }

    let visible = (area.height / CARD_HEIGHT) as usize;
    let start = scroll_start(selected, items.len(), visible);

    for (row, (index, item)) in items.iter().enumerate().skip(start).take(visible).enumerate() {
        let card_area = Rect {
            x: area.x,
            y: area.y + row as u16 * CARD_HEIGHT,
            width: area.width,
            height: CARD_HEIGHT,
        };
        render_item_card(card_area, item, tick, monitoring, index == selected, frame);
    }
}

/// Render the detail panel for the selected item
pub fn render_detail(area: Rect, item: Option<&TrackedItem>, offset: FixedOffset, frame: &mut Frame) {
    let block = Block::default()
        .title(" Details ")
        .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_set(ROUNDED_BORDERS)
        .border_style(Style::default().fg(BORDER_SUBTLE))
        .style(Style::default().bg(BG_SECONDARY));

    let Some(item) = item else {
        frame.render_widget(block, area);
        return;
    };

    let label = Style::default().fg(TEXT_MUTED);
    let value = Style::default().fg(TEXT_PRIMARY);
    let inner_width = area.width.saturating_sub(4) as usize;

    let mut lines: Vec<Line> = wrap_text(&item.display_title(), inner_width)
        .into_iter()
        .map(|l| Line::from(Span::styled(l, value.add_modifier(Modifier::BOLD))))
        .collect();

    lines.push(Line::from(vec![
        Span::styled("Mapped by ", label),
        Span::styled(item.creator.clone(), value),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Status   ", label),
        Span::styled(
            item.status.label(),
            Style::default()
                .fg(status_color(item.status))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            if item.enabled { "" } else { "  (paused)" },
            Style::default().fg(TEXT_MUTED),
        ),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Mode     ", label),
        Span::styled(item.mode.label(), value),
    ]));
    if let Some(date) = &item.ranked_date {
        lines.push(Line::from(vec![
            Span::styled("Date     ", label),
            Span::styled(date.clone(), value),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("Checked  ", label),
        Span::styled(
            item.last_checked
                .map(|ts| format_timestamp(ts, offset))
                .unwrap_or_else(|| "never".to_string()),
            value,
        ),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Link     ", label),
        Span::styled(item.url(), Style::default().fg(ACCENT_DIM)),
    ]));

    if !item.difficulties.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("DIFFICULTIES ({})", item.difficulties.len()),
            label,
        )));
        for diff in &item.difficulties {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:>5.2}★ ", diff.stars),
                    Style::default().fg(star_color(diff.stars)),
                ),
                Span::styled(
                    truncate(&diff.name, inner_width.saturating_sub(16)),
                    value,
                ),
                Span::styled(
                    format!(" {}", format_duration(Duration::from_secs(diff.length_secs.into()))),
                    label,
                ),
            ]));
        }
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
