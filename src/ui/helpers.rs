use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::Item;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Count rendered as a right-aligned pill so labels line up in the list.
pub(crate) fn count_badge(count: i64) -> Span<'static> {
    Span::styled(
        format!(" {count:>4} "),
        Style::default()
            .fg(Color::White)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
}

/// One list row: badge, label, and the per-row key hints.
pub(crate) fn item_line(item: &Item, selected: bool) -> Line<'static> {
    let label_style = if selected {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let mut spans = vec![
        count_badge(item.count),
        Span::raw("  "),
        Span::styled(item.label.clone(), label_style),
    ];
    if selected {
        spans.push(Span::styled(
            "   [+] [DEL]",
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}
