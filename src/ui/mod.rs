//! Terminal UI rendering using ratatui.
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Banner (common::render_banner)       │  only while a notification is up
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ Field table (fields::render)         │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Help overlay rendered on top (common::render_help)
//! ```

pub mod common;
pub mod fields;
pub mod theme;

pub use theme::Theme;

use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::App;

/// Minimum terminal size for usable display
const MIN_WIDTH: u16 = 50;
const MIN_HEIGHT: u16 = 10;

/// Draw one full frame.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5.min(area.height));
        frame.render_widget(paragraph, centered);
        return;
    }

    let banner_height = if app.banner().is_some() { 3 } else { 0 };
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(banner_height),
        Constraint::Min(5),
        Constraint::Length(1),
    ])
    .split(area);

    common::render_header(frame, app, chunks[0]);
    if let Some(notification) = app.banner() {
        common::render_banner(frame, app, notification, chunks[1]);
    }
    fields::render(frame, app, chunks[2]);
    common::render_status_bar(frame, app, chunks[3]);

    if app.show_help {
        common::render_help(frame, app, area);
    }
}
