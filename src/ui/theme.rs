//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::client::LinkState;
use crate::store::ThemeMode;

/// Color and style theme for the TUI.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Link is streaming.
    pub live: Color,
    /// Link is mid-handshake.
    pub pending: Color,
    /// Link is down.
    pub down: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    /// Notification banner.
    pub banner: Style,
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            live: Color::Green,
            pending: Color::Yellow,
            down: Color::Red,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            banner: Style::default().fg(Color::Black).bg(Color::Yellow),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            live: Color::Green,
            pending: Color::Magenta,
            down: Color::Red,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            banner: Style::default().fg(Color::White).bg(Color::Blue),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Resolve a configured mode.
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Auto => Self::auto_detect(),
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }

    /// Get style for a link state
    pub fn link_style(&self, state: LinkState) -> Style {
        match state {
            LinkState::Streaming => Style::default().fg(self.live).add_modifier(Modifier::BOLD),
            LinkState::Disconnected => Style::default().fg(self.down).add_modifier(Modifier::BOLD),
            _ => Style::default().fg(self.pending),
        }
    }
}
