//! Shared chrome: header bar, notification banner, status bar and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_duration;
use crate::sequence::Notification;

/// Render the header bar with link state and frame count.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let rate = app
        .history
        .frame_rate()
        .map(|r| format!("{:.1} fps", r))
        .unwrap_or_else(|| "- fps".to_string());

    let mut spans = vec![
        Span::styled(" ● ", app.theme.link_style(app.link)),
        Span::styled("TELEWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::raw(app.endpoint().to_string()),
        Span::raw(" │ "),
        Span::styled(app.link.label(), app.theme.link_style(app.link)),
        Span::raw(" │ "),
        Span::styled(
            format_count(app.snapshot.frames),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" frames │ "),
        Span::raw(rate),
    ];
    if app.paused {
        spans.push(Span::styled(
            " │ PAUSED",
            Style::default().fg(app.theme.pending).add_modifier(Modifier::BOLD),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the active notification.
pub fn render_banner(frame: &mut Frame, app: &App, notification: &Notification, area: Rect) {
    let mut title = format!(" {} ", notification.title);
    if let Some(sound) = &notification.sound {
        title.push_str(&format!("♪ {} ", sound));
    }

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .style(app.theme.banner);

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(notification.message.as_str()).block(block), area);
}

/// Render the status bar at the bottom.
///
/// Shows settings, time since the last frame and the available controls,
/// or a temporary status message when one is set.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let settings = app.settings();
    let updated = match app.snapshot.updated_at {
        Some(at) => format!("Updated {} ago", format_duration(at.elapsed())),
        None => "Waiting for data".to_string(),
    };
    let controls = if app.filter_active {
        "Type to search | Enter:apply Esc:cancel"
    } else {
        "/:search p:pause n:notify s:sound ?:help q:quit"
    };

    let status = format!(
        " {} | {} | notify:{} sound:{} vol:{} | {}",
        updated,
        settings.refresh_rate,
        if settings.notifications { "on" } else { "off" },
        if settings.sounds { "on" } else { "off" },
        settings.volume,
        controls,
    );

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |name: &'static str| {
        Line::from(vec![Span::styled(name, Style::default().add_modifier(Modifier::BOLD))])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  ↑/↓ j/k     Move selection"),
        Line::from("  PgUp/PgDn   Jump 10 fields"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  /           Filter fields"),
        Line::from("  Esc         Clear filter"),
        Line::from(""),
        section(" Settings"),
        Line::from("  n           Toggle notifications"),
        Line::from("  s           Toggle sounds"),
        Line::from("  +/-         Volume up/down"),
        Line::from("  t           Cycle theme"),
        Line::from(""),
        section(" General"),
        Line::from("  p / Space   Pause display"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 40u16.min(area.width.saturating_sub(4));
    let help_height = 22u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

/// Format a count for display (e.g., 1234 -> "1.2K", 1234567 -> "1.2M").
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_234), "1.2K");
        assert_eq!(format_count(2_500_000), "2.5M");
    }
}
