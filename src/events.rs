use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::App;

/// Rows skipped by PageUp/PageDown.
const PAGE: usize = 10;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.filter_active {
        handle_filter_input(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_prev_n(PAGE),
        KeyCode::PageDown => app.select_next_n(PAGE),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),

        KeyCode::Char('/') => app.start_filter(),
        KeyCode::Esc => {
            if !app.filter_text.is_empty() {
                app.clear_filter();
            }
        }

        KeyCode::Char('p') | KeyCode::Char(' ') => app.toggle_pause(),
        KeyCode::Char('?') => app.toggle_help(),

        // Settings
        KeyCode::Char('n') => app.toggle_notifications(),
        KeyCode::Char('s') => app.toggle_sounds(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_volume(true),
        KeyCode::Char('-') => app.adjust_volume(false),
        KeyCode::Char('t') => app.cycle_theme(),

        _ => {}
    }
}

/// Handle key input while filter is active
fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.cancel_filter(),
        KeyCode::Esc => app.clear_filter(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.clear_filter(),
        KeyCode::Backspace => {
            app.filter_pop();
            if app.filter_text.is_empty() {
                app.cancel_filter();
            }
        }
        KeyCode::Char(c) => app.filter_push(c),
        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use crate::store::TelemetrySink;
    use crossterm::event::KeyEventKind;
    use telewatch_types::TelemetryData;

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[tokio::test]
    async fn test_filter_keys() {
        let (mut app, dashboard, _server) = test_app();
        dashboard
            .telemetry()
            .update(TelemetryData::new().with("battery", 90.0).with("speed", 1.0));
        app.refresh();

        press(&mut app, KeyCode::Char('/'));
        assert!(app.filter_active);
        // While filtering, 'q' is text rather than quit.
        press(&mut app, KeyCode::Char('q'));
        assert!(app.running);
        press(&mut app, KeyCode::Backspace);
        assert!(!app.filter_active);

        press(&mut app, KeyCode::Char('/'));
        for c in "spe".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.visible_fields().len(), 1);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.visible_fields().len(), 2);
    }

    #[tokio::test]
    async fn test_help_swallows_next_key() {
        let (mut app, _dashboard, _server) = test_app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);

        press(&mut app, KeyCode::Char('q'));
        assert!(!app.show_help);
        assert!(app.running);

        let mut ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        ctrl_c.kind = KeyEventKind::Press;
        handle_key_event(&mut app, ctrl_c);
        assert!(!app.running);
    }

    #[tokio::test]
    async fn test_setting_keys() {
        let (mut app, _dashboard, _server) = test_app();
        press(&mut app, KeyCode::Char('s'));
        assert!(!app.settings().sounds);
        press(&mut app, KeyCode::Char('-'));
        assert_eq!(app.settings().volume, 70);
        press(&mut app, KeyCode::Char('p'));
        assert!(app.paused);
    }
}
