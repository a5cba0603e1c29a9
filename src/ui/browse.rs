//! Search results with status, mode and sort filters

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use super::tracked::scroll_start;
use crate::app::BrowseState;
use crate::theme::{
    get_pulse_color, star_color, status_color, ACCENT, ACCENT_DIM, BG_SECONDARY, BG_TERTIARY,
    BORDER_SUBTLE, ROUNDED_BORDERS, TEXT_MUTED, TEXT_PRIMARY, TEXT_SECONDARY,
};
use crate::utils::truncate;

pub fn render_browse(
    area: Rect,
    browse: &BrowseState,
    is_tracked: impl Fn(u64) -> bool,
    tick: u64,
    frame: &mut Frame,
) {
    let query = &browse.query;
    let filter = format!(
        "{}, {}, by {}",
        query.status_label(),
        query.mode_label(),
        query.sort_label()
    );
    let title = if query.text.is_empty() {
        format!(" Browse: {filter} ")
    } else {
        format!(" Browse: \"{}\" ({filter}) ", query.text)
    };

    let block = Block::default()
        .title(title)
        .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_set(ROUNDED_BORDERS)
        .border_style(Style::default().fg(BORDER_SUBTLE))
        .style(Style::default().bg(BG_SECONDARY));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if browse.results.is_empty() {
        let (text, color) = if browse.loading {
            ("Searching...", get_pulse_color(tick, ACCENT, ACCENT_DIM))
        } else {
            ("Press / to search, Enter on a result to track it", TEXT_SECONDARY)
        };
        let empty = Paragraph::new(Line::from(Span::styled(text, Style::default().fg(color))))
            .alignment(Alignment::Center);
        frame.render_widget(empty, inner);
        return;
    }

    // Last line is reserved for the paging hint
    let visible = inner.height.saturating_sub(1) as usize;
    let start = scroll_start(browse.selected, browse.results.len(), visible);
    let width = inner.width as usize;

    let mut lines: Vec<Line> = browse
        .results
        .iter()
        .enumerate()
        .skip(start)
        .take(visible)
        .map(|(index, info)| {
            let selected = index == browse.selected;
            let marker = if is_tracked(info.id) { "✓" } else { " " };
            let stars = format!("{:>5.2}★", info.max_stars());
            let status = format!("{:<10}", info.status.label());
            let fixed = 2 + 10 + stars.chars().count() + status.chars().count() + 2;
            let title = truncate(
                &format!("{} ({})", info.display_title(), info.creator),
                width.saturating_sub(fixed),
            );

            let bg = if selected { BG_TERTIARY } else { BG_SECONDARY };
            let fg = if selected { TEXT_PRIMARY } else { TEXT_SECONDARY };
            Line::from(vec![
                Span::styled(format!("{marker} "), Style::default().fg(ACCENT)),
                Span::styled(format!("{:<10}", info.id), Style::default().fg(TEXT_MUTED)),
                Span::styled(status, Style::default().fg(status_color(info.status))),
                Span::styled(stars, Style::default().fg(star_color(info.max_stars()))),
                Span::styled(format!("  {title}"), Style::default().fg(fg)),
            ])
            .style(Style::default().bg(bg))
        })
        .collect();

    let hint = if browse.loading {
        "Loading more...".to_string()
    } else if browse.next_cursor.is_some() {
        format!("{} shown, n for more", browse.results.len())
    } else {
        format!("{} shown, end of results", browse.results.len())
    };
    while lines.len() < visible {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(hint, Style::default().fg(TEXT_MUTED))));

    frame.render_widget(Paragraph::new(lines), inner);
}
