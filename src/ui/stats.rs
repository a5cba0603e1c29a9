//! Stat card rendering functions

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::theme::{ACCENT, BG_SECONDARY, BORDER_SUBTLE, GREEN_SUCCESS, ROUNDED_BORDERS, TEXT_MUTED};

/// Counts shown in the header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub tracked: usize,
    pub enabled: usize,
    pub settled: usize,
    pub history: usize,
}

fn stat_card(value: String, label: &'static str, color: Color) -> Paragraph<'static> {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(ROUNDED_BORDERS)
        .border_style(Style::default().fg(BORDER_SUBTLE))
        .style(Style::default().bg(BG_SECONDARY));

    let content = vec![
        Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(label, Style::default().fg(TEXT_MUTED))),
    ];

    Paragraph::new(content)
        .block(block)
        .alignment(Alignment::Center)
}

/// Render the tracked / watching / settled / history cards in a given area
pub fn render_stat_cards(area: Rect, stats: Stats, frame: &mut Frame) {
    let card_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let settled_color = if stats.tracked > 0 && stats.settled == stats.tracked {
        GREEN_SUCCESS
    } else {
        ACCENT
    };

    let cards = [
        stat_card(stats.tracked.to_string(), "TRACKED", ACCENT),
        stat_card(
            format!("{}/{}", stats.enabled, stats.tracked),
            "WATCHING",
            ACCENT,
        ),
        stat_card(stats.settled.to_string(), "SETTLED", settled_color),
        stat_card(stats.history.to_string(), "CHANGES", ACCENT),
    ];

    for (card, slot) in cards.into_iter().zip(card_layout.iter()) {
        frame.render_widget(card, *slot);
    }
}
