//! Theme module for mapwatch-tui
//!
//! This module provides a centralized color palette and styling constants:
//! a dark background with a teal accent and one color per ranked status.

use ratatui::style::Color;
use ratatui::symbols::border;

use crate::models::{RankStatus, StatusLevel};

// ============================================================================
// Background Colors
// ============================================================================

/// Primary background color (#0a0e14)
pub const BG_PRIMARY: Color = Color::Rgb(10, 14, 20);

/// Secondary background color, used for cards (#141922)
pub const BG_SECONDARY: Color = Color::Rgb(20, 25, 34);

/// Tertiary background color, used for the selected card (#1a2332)
pub const BG_TERTIARY: Color = Color::Rgb(26, 35, 50);

/// Subtle border color (#1e2530)
pub const BORDER_SUBTLE: Color = Color::Rgb(30, 37, 48);

// ============================================================================
// Accent Colors
// ============================================================================

/// Primary teal accent color (#39c5bb)
pub const ACCENT: Color = Color::Rgb(57, 197, 187);

/// Dimmed accent for secondary elements (#2d9d92)
pub const ACCENT_DIM: Color = Color::Rgb(45, 157, 146);

// ============================================================================
// Message Colors
// ============================================================================

/// Green success color (#2ecc71)
pub const GREEN_SUCCESS: Color = Color::Rgb(46, 204, 113);

/// Amber warning color (#f1c40f)
pub const AMBER_WARNING: Color = Color::Rgb(241, 196, 15);

/// Red error color (#ff6b6b)
pub const RED_ERROR: Color = Color::Rgb(255, 107, 107);

// ============================================================================
// Text Colors
// ============================================================================

/// Primary text color (#e6e6e6)
pub const TEXT_PRIMARY: Color = Color::Rgb(230, 230, 230);

/// Secondary text color (#8892a6)
pub const TEXT_SECONDARY: Color = Color::Rgb(136, 146, 166);

/// Muted text color, for labels and hints (#64748b)
pub const TEXT_MUTED: Color = Color::Rgb(100, 116, 139);

/// Rounded border set used by every card
pub const ROUNDED_BORDERS: border::Set = border::ROUNDED;

pub fn status_color(status: RankStatus) -> Color {
    match status {
        RankStatus::Graveyard => Color::Rgb(99, 110, 114),
        RankStatus::Wip => Color::Rgb(230, 126, 34),
        RankStatus::Pending => Color::Rgb(241, 196, 15),
        RankStatus::Qualified => Color::Rgb(0, 210, 211),
        RankStatus::Ranked => Color::Rgb(46, 204, 113),
        RankStatus::Approved => Color::Rgb(39, 174, 96),
        RankStatus::Loved => Color::Rgb(255, 159, 243),
    }
}

pub fn level_color(level: StatusLevel) -> Color {
    match level {
        StatusLevel::Info => TEXT_SECONDARY,
        StatusLevel::Success => GREEN_SUCCESS,
        StatusLevel::Warning => AMBER_WARNING,
        StatusLevel::Error => RED_ERROR,
    }
}

/// Alternate between two colors every few animation ticks
pub fn get_pulse_color(tick: u64, bright: Color, dim: Color) -> Color {
    if (tick / 4) % 2 == 0 { bright } else { dim }
}

/// Color for a star rating, bluish for easy up to red for extreme
pub fn star_color(stars: f64) -> Color {
    if stars < 2.0 {
        Color::Rgb(79, 192, 255)
    } else if stars < 2.7 {
        Color::Rgb(124, 255, 79)
    } else if stars < 4.0 {
        Color::Rgb(246, 240, 92)
    } else if stars < 5.3 {
        Color::Rgb(255, 78, 111)
    } else if stars < 6.5 {
        Color::Rgb(198, 69, 184)
    } else {
        Color::Rgb(101, 99, 222)
    }
}
