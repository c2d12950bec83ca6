use anyhow::Error;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};

use crate::models::ClientStatus;
use crate::sort::parse_instant;

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

pub(crate) fn rect_contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

/// `Jan 15, 2024`, or with `with_time` `Jan 20, 2024, 02:45 PM`. Values that
/// do not parse are shown verbatim.
pub(crate) fn format_date(raw: &str, with_time: bool) -> String {
    match parse_instant(raw) {
        Some(instant) if with_time => instant.format("%b %-d, %Y, %I:%M %p").to_string(),
        Some(instant) => instant.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

pub(crate) fn status_style(status: ClientStatus) -> Style {
    match status {
        ClientStatus::Active => Style::default().fg(Color::Green),
        ClientStatus::Inactive => Style::default().fg(Color::DarkGray),
    }
}
