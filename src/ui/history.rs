//! Status change history table

use chrono::FixedOffset;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

use crate::models::{HistoryEntry, HistoryFilter};
use crate::theme::{
    status_color, ACCENT, BG_SECONDARY, BG_TERTIARY, BORDER_SUBTLE, ROUNDED_BORDERS, TEXT_MUTED,
    TEXT_PRIMARY, TEXT_SECONDARY,
};
use crate::utils::format_timestamp;

/// `entries` are the ones passing `filter`, out of `total` in the log
pub fn render_history(
    area: Rect,
    entries: &[&HistoryEntry],
    total: usize,
    filter: &HistoryFilter,
    scroll: usize,
    offset: FixedOffset,
    frame: &mut Frame,
) {
    let title = if filter.is_active() {
        format!(" History ({}/{total}): {} ", entries.len(), filter.describe())
    } else {
        format!(" History ({total}) ")
    };
    let block = Block::default()
        .title(title)
        .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_set(ROUNDED_BORDERS)
        .border_style(Style::default().fg(BORDER_SUBTLE))
        .style(Style::default().bg(BG_SECONDARY));

    if entries.is_empty() {
        let text = if total == 0 {
            "No status changes recorded yet"
        } else {
            "No entries match the filter"
        };
        let empty = Paragraph::new(Line::from(Span::styled(
            text,
            Style::default().fg(TEXT_SECONDARY),
        )))
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(["Time", "ID", "Beatmapset", "Change"])
        .style(Style::default().fg(TEXT_MUTED).add_modifier(Modifier::BOLD));

    // borders + header row
    let visible = area.height.saturating_sub(3) as usize;
    let start = scroll.min(entries.len().saturating_sub(visible.max(1)));

    let rows = entries
        .iter()
        .enumerate()
        .skip(start)
        .take(visible)
        .map(|(index, entry)| {
            let bg = if index == scroll { BG_TERTIARY } else { BG_SECONDARY };
            Row::new(vec![
                Cell::from(format_timestamp(entry.timestamp, offset))
                    .style(Style::default().fg(TEXT_SECONDARY)),
                Cell::from(entry.beatmapset_id.to_string()).style(Style::default().fg(TEXT_MUTED)),
                Cell::from(entry.title.clone()).style(Style::default().fg(TEXT_PRIMARY)),
                Cell::from(Line::from(vec![
                    Span::styled(
                        entry.old_status.label(),
                        Style::default().fg(status_color(entry.old_status)),
                    ),
                    Span::styled(" → ", Style::default().fg(TEXT_MUTED)),
                    Span::styled(
                        entry.new_status.label(),
                        Style::default()
                            .fg(status_color(entry.new_status))
                            .add_modifier(Modifier::BOLD),
                    ),
                ])),
            ])
            .style(Style::default().bg(bg))
        });

    let widths = [
        Constraint::Length(19),
        Constraint::Length(9),
        Constraint::Min(20),
        Constraint::Length(24),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .block(block);

    frame.render_widget(table, area);
}
